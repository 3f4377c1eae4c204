//! Flattening of positioned sprite layers (body, face, mouth, effects, ...) into single images.
//!
//! Layers are straight-alpha RGBA images with an offset in a shared coordinate space.  They are
//! merged bottom to top onto a transparent [`Canvas`] using the premultiplied "over" operator,
//! which avoids the dark fringes that blending straight-alpha colours produces.

pub mod batch;
pub mod blend;
pub mod canvas;
pub mod layer;
pub mod manifest;
pub mod render;
pub mod utils;

mod error;

pub use blend::BlendMode;
pub use canvas::Canvas;
pub use error::CompositeError;
pub use layer::Layer;
pub use render::{composite_stack, compute_canvas_bounds, CanvasBounds};
