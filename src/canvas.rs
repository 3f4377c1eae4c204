//! The output pixel buffer onto which layers are merged.

use std::fmt::{Debug, Formatter};

use cgmath::{Vector2, Zero};
use image::RgbaImage;
use log::{debug, trace};

use crate::{blend::blend_pixel, layer::Layer, utils::Rect};

/// A mutable straight-alpha RGBA buffer.  One `Canvas` is created per output image; layers are
/// merged onto it bottom to top and it is then turned into an [`RgbaImage`] with
/// [`Canvas::finish`].
pub struct Canvas {
    image: RgbaImage,
}

impl Canvas {
    /// Creates a fully transparent canvas
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbaImage::new(width, height),
        }
    }

    /// Wraps an existing straight-alpha image so that more layers can be merged onto it
    pub fn from_image(image: RgbaImage) -> Self {
        Self { image }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// The region covered by this canvas, in canvas coordinates
    pub fn rect(&self) -> Rect<i64> {
        Rect::from_origin(i64::from(self.width()), i64::from(self.height()))
    }

    /// Merges `layer` on top of the current contents.  The layer's offset is taken relative to
    /// the canvas' top-left corner; any part of the layer outside the canvas is dropped.
    pub fn composite(&mut self, layer: &Layer) {
        self.composite_shifted(layer, Vector2::zero());
    }

    /// Consuming version of [`Canvas::composite`]
    pub fn with_layer(mut self, layer: &Layer) -> Self {
        self.composite(layer);
        self
    }

    /// Merges `layer` as though its offset were `layer.offset() + shift`
    pub(crate) fn composite_shifted(&mut self, layer: &Layer, shift: Vector2<i64>) {
        let placement = layer.placement().translate(shift);
        let visible = self.rect().intersection(placement);
        if visible.is_empty() {
            debug!("Layer at {:?} lies entirely outside the canvas", placement);
            return;
        }
        trace!(
            "Compositing {:?} layer: placement {:?}, visible {:?}",
            layer.blend_mode(),
            placement,
            visible
        );

        let canvas_width = self.width() as usize;
        let src_width = layer.image().width() as usize;
        let src_pixels: &[[u8; 4]] = bytemuck::cast_slice(layer.image().as_raw().as_slice());
        let dst_pixels: &mut [[u8; 4]] = bytemuck::cast_slice_mut(&mut *self.image);

        // `visible` lies within both rects, so none of these subtractions can go negative
        let run_len = visible.width() as usize;
        let src_x = (visible.min().x - placement.min().x) as usize;
        let dst_x = visible.min().x as usize;
        for y in visible.min().y..visible.max().y {
            let src_y = (y - placement.min().y) as usize;
            let src_start = src_y * src_width + src_x;
            let dst_start = y as usize * canvas_width + dst_x;
            let src_row = &src_pixels[src_start..src_start + run_len];
            let dst_row = &mut dst_pixels[dst_start..dst_start + run_len];
            for (dst, src) in dst_row.iter_mut().zip(src_row) {
                *dst = blend_pixel(*dst, *src, layer.blend_mode());
            }
        }
    }

    /// Consumes the canvas, returning the straight-alpha result
    pub fn finish(self) -> RgbaImage {
        self.image
    }
}

impl Debug for Canvas {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Canvas({}x{})", self.width(), self.height())
    }
}
