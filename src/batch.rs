//! Best-effort batch processing of a [`Manifest`].
//!
//! Every output image is an independent job.  Jobs run in parallel and a failing job is logged
//! and counted, but never stops the others.

use std::path::Path;

use cgmath::{Point2, Vector2, Zero};
use image::ImageError;
use itertools::Itertools;
use log::{debug, info, warn};
use rayon::prelude::*;
use thiserror::Error;

use crate::{
    error::CompositeError,
    layer::{negate, Layer},
    manifest::{Manifest, OutputSpec},
    render::composite_stack,
};

/// Run-wide settings for [`run_batch`]
#[derive(Debug, Clone, Default)]
pub struct BatchOptions {
    /// Regenerate outputs which already exist on disk
    pub overwrite: bool,
    /// Number of worker threads (`None` lets rayon decide)
    pub threads: Option<usize>,
}

/// How many jobs ended in each state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub written: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl BatchSummary {
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }
}

#[derive(Debug, Error)]
pub enum JobError {
    #[error(transparent)]
    Composite(#[from] CompositeError),
    #[error("couldn't write image: {0}")]
    Image(#[from] ImageError),
    #[error("couldn't create output directory: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum JobOutcome {
    Written,
    Skipped,
}

/// Composites every output of `manifest`, writing PNGs to disk.
pub fn run_batch(
    manifest: &Manifest,
    options: &BatchOptions,
) -> Result<BatchSummary, rayon::ThreadPoolBuildError> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(options.threads.unwrap_or(0)) // 0 means 'pick automatically'
        .build()?;
    let results = pool.install(|| {
        manifest
            .outputs
            .par_iter()
            .map(|spec| (spec, run_job(spec, options)))
            .collect::<Vec<_>>()
    });

    let mut summary = BatchSummary::default();
    for (spec, result) in results {
        match result {
            Ok(JobOutcome::Written) => summary.written += 1,
            Ok(JobOutcome::Skipped) => summary.skipped += 1,
            Err(e) => {
                warn!("Failed to produce {:?}: {}", spec.output, e);
                summary.failed += 1;
            }
        }
    }
    Ok(summary)
}

fn run_job(spec: &OutputSpec, options: &BatchOptions) -> Result<JobOutcome, JobError> {
    if !options.overwrite && spec.output.exists() {
        debug!("Skipping {:?}: already exists", spec.output);
        return Ok(JobOutcome::Skipped);
    }

    let layers = load_layers(spec);
    let image = composite_stack(&layers, spec.canvas_size)?;

    if let Some(parent) = spec.output.parent().filter(|p| *p != Path::new("")) {
        std::fs::create_dir_all(parent)?;
    }
    image.save(&spec.output)?;
    info!(
        "Wrote {:?} ({}x{}, {} layers)",
        spec.output,
        image.width(),
        image.height(),
        layers.len()
    );
    Ok(JobOutcome::Written)
}

/// Loads every layer of `spec` which can be loaded.  Layers which fail to load are logged and
/// dropped, so that one missing fragment doesn't cost the whole image.
fn load_layers(spec: &OutputSpec) -> Vec<Layer> {
    let rebase = match spec.layers.first() {
        Some(first) if spec.relative_to_first => negate(Point2::from(first.offset)),
        _ => Vector2::zero(),
    };
    spec.layers
        .iter()
        .filter_map(
            |layer| match Layer::from_file(&layer.path, layer.offset, layer.blend_mode) {
                Ok(l) => Some(l.translated(rebase)),
                Err(e) => {
                    warn!(
                        "Skipping layer {:?} of {:?}: {}",
                        layer.path, spec.output, e
                    );
                    None
                }
            },
        )
        .collect_vec()
}
