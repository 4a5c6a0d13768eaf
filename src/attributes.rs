//! Required-value accessors over parsed XML elements.
//!
//! Absence is always an error here; nothing is defaulted.

use crate::error::{LodTreeError, Result};
use crate::parse_xml::XmlNode;
use glam::DVec3;

/// First child element called `name`.
pub fn require_child<'a>(node: &'a XmlNode, name: &str) -> Result<&'a XmlNode> {
    node.first_child_named(name)
        .ok_or_else(|| LodTreeError::schema(&node.name, name))
}

pub fn require_text_attr<'a>(elem: &'a XmlNode, name: &str) -> Result<&'a str> {
    elem.attribute(name)
        .ok_or_else(|| LodTreeError::schema(&elem.name, name))
}

/// Attribute coerced to `f64`. A present but non-numeric value counts as missing.
pub fn require_double_attr(elem: &XmlNode, name: &str) -> Result<f64> {
    require_text_attr(elem, name)?
        .trim()
        .parse::<f64>()
        .map_err(|_| LodTreeError::schema(&elem.name, name))
}

/// Element text coerced to `f64`.
pub fn require_double_text(elem: &XmlNode) -> Result<f64> {
    elem.text()
        .and_then(|t| t.trim().parse::<f64>().ok())
        .ok_or_else(|| LodTreeError::schema(&elem.name, "#text"))
}

/// Element text, trimmed.
pub fn require_text(elem: &XmlNode) -> Result<&str> {
    elem.text()
        .map(str::trim)
        .ok_or_else(|| LodTreeError::schema(&elem.name, "#text"))
}

/// `x`, `y` and `z` attributes of a point element such as `Center` or `Local`.
pub fn require_point_attrs(elem: &XmlNode) -> Result<DVec3> {
    Ok(DVec3::new(
        require_double_attr(elem, "x")?,
        require_double_attr(elem, "y")?,
        require_double_attr(elem, "z")?,
    ))
}
