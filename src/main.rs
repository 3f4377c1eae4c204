use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::Parser;
use log::info;
use sprite_comp::{
    batch::{run_batch, BatchOptions},
    manifest::Manifest,
};

/// Composite sprite layers into flattened PNGs, as described by a JSON manifest
#[derive(Debug, Parser)]
#[command(version)]
struct Args {
    /// Path to the JSON manifest
    manifest: PathBuf,
    /// Regenerate outputs which already exist
    #[arg(long)]
    overwrite: bool,
    /// Number of worker threads (defaults to one per core)
    #[arg(long)]
    threads: Option<usize>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let manifest = Manifest::from_path(&args.manifest)
        .with_context(|| format!("loading {:?}", args.manifest))?;
    info!(
        "Loaded {} outputs from {:?}",
        manifest.outputs.len(),
        args.manifest
    );

    let options = BatchOptions {
        overwrite: args.overwrite,
        threads: args.threads,
    };
    let summary = run_batch(&manifest, &options)?;
    info!(
        "{} written, {} skipped, {} failed",
        summary.written, summary.skipped, summary.failed
    );
    if !summary.is_success() {
        bail!("{} of {} outputs failed", summary.failed, manifest.outputs.len());
    }
    Ok(())
}
