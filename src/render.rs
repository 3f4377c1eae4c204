//! Code for flattening a stack of layers into one image

use cgmath::{Point2, Vector2, Zero};
use image::RgbaImage;
use log::debug;

use crate::{canvas::Canvas, error::CompositeError, layer::Layer, utils::Rect};

/// The smallest canvas which can hold every layer of a stack
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanvasBounds {
    pub width: u32,
    pub height: u32,
    /// The minimum corner of the bounding box in the layers' shared coordinate space.  Subtracting
    /// this from a layer's offset gives its position on the canvas.
    pub origin: Point2<i32>,
}

impl CanvasBounds {
    /// The translation which moves a layer from shared coordinates onto the canvas
    pub fn shift(&self) -> Vector2<i64> {
        Vector2::new(-i64::from(self.origin.x), -i64::from(self.origin.y))
    }
}

/// Computes the minimal rectangle covering the placement of every layer in `layers`.
pub fn compute_canvas_bounds(layers: &[Layer]) -> Result<CanvasBounds, CompositeError> {
    let bbox = layers
        .iter()
        .map(Layer::placement)
        .reduce(Rect::union)
        .ok_or(CompositeError::EmptyLayerSet)?;
    debug!("Bounding box of {} layers is {:?}", layers.len(), bbox);
    let too_large = || CompositeError::CanvasTooLarge {
        width: bbox.width(),
        height: bbox.height(),
    };
    let width = u32::try_from(bbox.width()).map_err(|_| too_large())?;
    let height = u32::try_from(bbox.height()).map_err(|_| too_large())?;
    // The minimum corner is always some layer's offset, so it fits back into an `i32`
    let origin = Point2::new(
        i32::try_from(bbox.min().x).map_err(|_| too_large())?,
        i32::try_from(bbox.min().y).map_err(|_| too_large())?,
    );
    Ok(CanvasBounds {
        width,
        height,
        origin,
    })
}

/// Flattens `layers` (bottom to top) into a single straight-alpha image.
///
/// If `explicit_canvas_size` is given, the canvas has exactly that size and layer offsets are
/// taken to be relative to its top-left corner.  Otherwise the canvas is sized to the bounding box
/// of all the layers (see [`compute_canvas_bounds`]) and every layer is shifted accordingly.
pub fn composite_stack(
    layers: &[Layer],
    explicit_canvas_size: Option<(u32, u32)>,
) -> Result<RgbaImage, CompositeError> {
    if layers.is_empty() {
        return Err(CompositeError::EmptyLayerSet);
    }
    let (width, height, shift) = match explicit_canvas_size {
        Some((w, h)) => (w, h, Vector2::zero()),
        None => {
            let bounds = compute_canvas_bounds(layers)?;
            (bounds.width, bounds.height, bounds.shift())
        }
    };
    debug!(
        "Compositing {} layers onto a {}x{} canvas",
        layers.len(),
        width,
        height
    );

    let mut canvas = Canvas::new(width, height);
    for layer in layers {
        canvas.composite_shifted(layer, shift);
    }
    Ok(canvas.finish())
}
