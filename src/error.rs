//! Error types returned by the compositor.

use thiserror::Error;

/// Errors that can occur while compositing a stack of layers.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum CompositeError {
    /// No layers were given, so there is nothing to size or draw a canvas from.
    #[error("cannot composite an empty set of layers")]
    EmptyLayerSet,
    /// The layers are spread so far apart that their bounding box doesn't fit in a `u32` canvas.
    #[error("layers span {width}x{height} pixels, which is too large for a canvas")]
    CanvasTooLarge { width: i64, height: i64 },
}
