//! CLI tool for inspecting a LOD tree export without a viewer
//!
//! Usage:
//!   cargo run --release --bin lodtree_dump -- <export_dir> [options]
//!
//! Options:
//!   --offset <x,y,z>    Global offset added to the export origin
//!   --config <file>     Import options as JSON
//!   --json              Print the whole tree as JSON
//!   --verbose           List every node

use std::env;
use std::path::PathBuf;

use anyhow::{bail, Context};
use lodtree::flat_listing::parse_origin_triple;
use lodtree::{DirectoryStorage, ImportOptions, LodTreeExport};

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <export_dir> [options]", args[0]);
        eprintln!();
        eprintln!("Options:");
        eprintln!("  --offset <x,y,z>    Global offset added to the export origin");
        eprintln!("  --config <file>     Import options as JSON");
        eprintln!("  --json              Print the whole tree as JSON");
        eprintln!("  --verbose           List every node");
        return Ok(());
    }

    let export_dir = PathBuf::from(&args[1]);
    let mut config_path: Option<PathBuf> = None;
    let mut offset_arg: Option<String> = None;
    let mut json = false;
    let mut verbose = false;

    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "--offset" => {
                i += 1;
                match args.get(i) {
                    Some(value) => offset_arg = Some(value.clone()),
                    None => bail!("--offset needs a value"),
                }
            }
            "--config" => {
                i += 1;
                match args.get(i) {
                    Some(value) => config_path = Some(PathBuf::from(value)),
                    None => bail!("--config needs a value"),
                }
            }
            "--json" => json = true,
            "--verbose" => verbose = true,
            other => bail!("unknown option {other}"),
        }
        i += 1;
    }

    let mut options = match &config_path {
        Some(path) => ImportOptions::from_json_file(path)
            .with_context(|| format!("loading options from {}", path.display()))?,
        None => ImportOptions::default(),
    };
    if let Some(offset) = &offset_arg {
        options.offset = parse_origin_triple(offset).context("parsing --offset")?;
    }

    let storage = DirectoryStorage::new(&export_dir);
    #[cfg(feature = "proj")]
    let srs = lodtree::ProjSrs;
    #[cfg(not(feature = "proj"))]
    let srs = lodtree::BuiltinSrs;
    let export = LodTreeExport::load_with(&storage, &options, &srs)
        .with_context(|| format!("importing {}", export_dir.display()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&export)?);
        return Ok(());
    }

    println!("=== LOD tree export: {} ===", export_dir.display());
    match &export.reference_frame {
        Some(frame) => println!("Reference frame: {frame}"),
        None => println!("Reference frame: none"),
    }
    println!("Origin: {}", export.origin);
    println!("Blocks: {}", export.blocks.len());
    println!("Nodes: {}", export.node_count());
    if !export.skipped.is_empty() {
        println!("Skipped entries: {}", export.skipped.len());
        for entry in &export.skipped {
            println!("  {} ({:?})", entry.path.display(), entry.reason);
        }
    }

    if verbose {
        for node in export.flatten() {
            let model = node
                .model_path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "-".to_string());
            println!(
                "{}level {} radius {:.3} minRange {:.3} origin {} {}",
                "  ".repeat(node.level.min(16)),
                node.level,
                node.radius,
                node.min_range,
                node.origin,
                model
            );
        }
    }

    Ok(())
}
