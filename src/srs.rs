//! Spatial reference handling.
//!
//! [`SrsLibrary`] is the seam to a geodetic library; [`BuiltinSrs`] is a
//! self-contained implementation that classifies EPSG codes, PROJ strings and
//! WKT by their headers. [`resolve_reference_frame`] decides whether an export
//! keeps absolute coordinates or is re-based onto a local ENU frame.

use std::fmt;

use glam::DVec3;
use log::info;
use serde::Serialize;

use crate::error::{LodTreeError, Result};

/// Broad class of a coordinate reference system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FrameKind {
    /// Latitude/longitude, angular units.
    Geographic,
    /// Metric map projection.
    Projected,
    /// Earth-centered cartesian.
    Geocentric,
}

/// A resolved spatial reference.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ReferenceFrame {
    /// Reference taken verbatim from the export.
    Defined { definition: String, kind: FrameKind },
    /// East-North-Up tangent frame anchored at a point of a geographic base.
    Enu { anchor: DVec3, base: String },
}

impl ReferenceFrame {
    pub fn kind(&self) -> FrameKind {
        match self {
            Self::Defined { kind, .. } => *kind,
            Self::Enu { .. } => FrameKind::Projected,
        }
    }
}

impl fmt::Display for ReferenceFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Defined { definition, .. } => f.write_str(definition),
            Self::Enu { anchor, base } => write!(
                f,
                "+proj=ortho +lat_0={} +lon_0={} +h_0={} +x_0=0 +y_0=0 +units=m +base=\"{}\" +no_defs",
                anchor.y, anchor.x, anchor.z, base
            ),
        }
    }
}

/// Geodetic operations needed by the importer.
pub trait SrsLibrary: Sync {
    fn parse(&self, text: &str) -> Result<ReferenceFrame>;

    fn is_geographic(&self, frame: &ReferenceFrame) -> bool {
        frame.kind() == FrameKind::Geographic
    }

    /// Local tangent frame whose origin is `origin`, given in `frame` coordinates.
    fn enu_anchored_at(&self, origin: DVec3, frame: &ReferenceFrame) -> ReferenceFrame;
}

/// Header-based classifier that needs no external data.
#[derive(Debug, Default, Clone, Copy)]
pub struct BuiltinSrs;

const GEOGRAPHIC_EPSG: &[u32] = &[4019, 4258, 4267, 4269, 4283, 4326, 4612, 4617, 4937, 4979];
const GEOCENTRIC_EPSG: &[u32] = &[4936, 4978];

impl SrsLibrary for BuiltinSrs {
    fn parse(&self, text: &str) -> Result<ReferenceFrame> {
        let text = text.trim();
        let kind = if let Some(code) = parse_epsg_code(text) {
            classify_epsg(code)
        } else if text.starts_with('+') {
            classify_proj(text)?
        } else {
            classify_wkt(text)?
        };
        Ok(ReferenceFrame::Defined {
            definition: text.to_string(),
            kind,
        })
    }

    fn enu_anchored_at(&self, origin: DVec3, frame: &ReferenceFrame) -> ReferenceFrame {
        ReferenceFrame::Enu {
            anchor: origin,
            base: frame.to_string(),
        }
    }
}

/// PROJ-backed library. Validates every definition and classifies EPSG codes
/// and definitions outside the builtin tables by transforming a sample point
/// to WGS84.
#[cfg(feature = "proj")]
#[derive(Debug, Default, Clone, Copy)]
pub struct ProjSrs;

#[cfg(feature = "proj")]
impl SrsLibrary for ProjSrs {
    fn parse(&self, text: &str) -> Result<ReferenceFrame> {
        use proj::Proj;

        let text = text.trim();
        let to_wgs84 = Proj::new_known_crs(text, "EPSG:4326", None)
            .map_err(|e| LodTreeError::Srs(format!("{text}: {e}")))?;

        let kind = match parse_epsg_code(text) {
            Some(code) => match classify_epsg(code) {
                FrameKind::Projected => sample_kind(&to_wgs84),
                known => known,
            },
            None => BuiltinSrs
                .parse(text)
                .map(|frame| frame.kind())
                .unwrap_or_else(|_| sample_kind(&to_wgs84)),
        };
        Ok(ReferenceFrame::Defined {
            definition: text.to_string(),
            kind,
        })
    }

    fn enu_anchored_at(&self, origin: DVec3, frame: &ReferenceFrame) -> ReferenceFrame {
        BuiltinSrs.enu_anchored_at(origin, frame)
    }
}

/// A geographic source maps a lon/lat sample onto itself up to a datum shift.
#[cfg(feature = "proj")]
fn sample_kind(to_wgs84: &proj::Proj) -> FrameKind {
    const SAMPLE: (f64, f64) = (10.0, 45.0);
    match to_wgs84.convert(SAMPLE) {
        Ok((lon, lat)) if (lon - SAMPLE.0).abs() < 0.1 && (lat - SAMPLE.1).abs() < 0.1 => {
            FrameKind::Geographic
        }
        _ => FrameKind::Projected,
    }
}

/// EPSG code from `EPSG:NNNN` (any case) or a bare number.
pub fn parse_epsg_code(text: &str) -> Option<u32> {
    let upper = text.to_uppercase();
    let digits = upper.strip_prefix("EPSG:").unwrap_or(&upper);
    digits.trim().parse::<u32>().ok()
}

fn classify_epsg(code: u32) -> FrameKind {
    if GEOGRAPHIC_EPSG.contains(&code) {
        FrameKind::Geographic
    } else if GEOCENTRIC_EPSG.contains(&code) {
        FrameKind::Geocentric
    } else {
        FrameKind::Projected
    }
}

fn classify_proj(text: &str) -> Result<FrameKind> {
    let proj = text
        .split_whitespace()
        .find_map(|token| token.strip_prefix("+proj="))
        .ok_or_else(|| LodTreeError::Srs(format!("no +proj in \"{text}\"")))?;
    Ok(match proj {
        "longlat" | "latlong" | "lonlat" | "latlon" => FrameKind::Geographic,
        "geocent" => FrameKind::Geocentric,
        _ => FrameKind::Projected,
    })
}

fn classify_wkt(text: &str) -> Result<FrameKind> {
    let keyword = text
        .split(|c| c == '[' || c == '(')
        .next()
        .unwrap_or_default()
        .trim()
        .to_uppercase();
    match keyword.as_str() {
        "GEOGCS" | "GEOGCRS" | "GEOGRAPHICCRS" => Ok(FrameKind::Geographic),
        "PROJCS" | "PROJCRS" | "PROJECTEDCRS" => Ok(FrameKind::Projected),
        "GEOCCS" | "GEODCRS" | "GEODETICCRS" => Ok(FrameKind::Geocentric),
        _ => Err(LodTreeError::Srs(format!("unrecognized definition \"{text}\""))),
    }
}

/// Reference frame and origin after optional re-basing.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedFrame {
    pub frame: Option<ReferenceFrame>,
    pub origin: DVec3,
}

/// Interprets `srs_text` relative to `origin`.
///
/// Empty text means no reference frame. Geographic frames are replaced by an
/// ENU frame anchored at `origin`, and the origin becomes zero. The caller adds
/// its global offset afterwards.
pub fn resolve_reference_frame(
    library: &dyn SrsLibrary,
    srs_text: &str,
    origin: DVec3,
) -> Result<ResolvedFrame> {
    let srs_text = srs_text.trim();
    if srs_text.is_empty() {
        return Ok(ResolvedFrame { frame: None, origin });
    }

    let frame = library.parse(srs_text)?;
    if library.is_geographic(&frame) {
        info!("Geographic reference; re-basing onto ENU frame at {origin}.");
        return Ok(ResolvedFrame {
            frame: Some(library.enu_anchored_at(origin, &frame)),
            origin: DVec3::ZERO,
        });
    }

    Ok(ResolvedFrame {
        frame: Some(frame),
        origin,
    })
}
