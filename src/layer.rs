use std::{
    fmt::{Debug, Formatter},
    ops::Deref,
    path::Path,
};

use cgmath::{Point2, Vector2};
use image::{DynamicImage, ImageResult, RgbaImage};

use crate::{blend::BlendMode, utils::Rect};

/// One positioned image to be merged into a composite (e.g. a face, mouth or effect fragment of
/// a character sprite).
#[derive(Debug, Clone)]
pub struct Layer {
    image: DebuggableImage,
    /// Position of the image's top-left corner in a coordinate space shared by every layer of the
    /// same composite
    offset: Point2<i32>,
    blend_mode: BlendMode,
}

impl Layer {
    /// Creates a [`BlendMode::Normal`] layer from a straight-alpha RGBA image
    pub fn new(image: RgbaImage, offset: impl Into<Point2<i32>>) -> Self {
        Self {
            image: DebuggableImage(image),
            offset: offset.into(),
            blend_mode: BlendMode::Normal,
        }
    }

    pub fn with_blend_mode(mut self, blend_mode: BlendMode) -> Self {
        self.blend_mode = blend_mode;
        self
    }

    /// Loads a layer from an image file.  RGBA8 images are used unchanged; anything else is
    /// converted to RGBA8 (images without an alpha channel become fully opaque).
    pub fn from_file(
        path: impl AsRef<Path>,
        offset: impl Into<Point2<i32>>,
        blend_mode: BlendMode,
    ) -> ImageResult<Self> {
        // Sprite dumps often carry engine-specific extensions, so sniff the format from the data
        let dyn_image = image::io::Reader::open(path)?
            .with_guessed_format()?
            .decode()?;
        let rgba_image = match dyn_image {
            DynamicImage::ImageRgba8(i) => i,
            DynamicImage::ImageRgb8(rgb_img) => {
                // Copy the RGB image into an RGBA image with the same colours but full opacity
                let mut new_img = RgbaImage::new(rgb_img.width(), rgb_img.height());
                for (x, y, image::Rgb([r, g, b])) in rgb_img.enumerate_pixels() {
                    new_img.put_pixel(x, y, image::Rgba([*r, *g, *b, u8::MAX]));
                }
                new_img
            }
            other => other.to_rgba8(),
        };
        Ok(Self::new(rgba_image, offset).with_blend_mode(blend_mode))
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn offset(&self) -> Point2<i32> {
        self.offset
    }

    pub fn blend_mode(&self) -> BlendMode {
        self.blend_mode
    }

    pub fn size(&self) -> Vector2<i64> {
        let (w, h) = self.image.dimensions();
        Vector2::new(i64::from(w), i64::from(h))
    }

    /// The region covered by this layer, in the layers' shared coordinate space.  This is 64-bit
    /// so that any `i32` offset plus any `u32` size is representable.
    pub fn placement(&self) -> Rect<i64> {
        let min = Point2::new(i64::from(self.offset.x), i64::from(self.offset.y));
        Rect::from_min_size(min, self.size())
    }

    /// Moves this layer by `by`.  Offsets saturate at the limits of `i32`.
    pub fn translated(mut self, by: Vector2<i32>) -> Self {
        self.offset = Point2::new(
            self.offset.x.saturating_add(by.x),
            self.offset.y.saturating_add(by.y),
        );
        self
    }

    /// Returns a copy of this layer whose offset is expressed relative to `base`'s offset (so
    /// `base` itself would sit at `(0, 0)`).
    pub fn relative_to(&self, base: &Layer) -> Self {
        self.clone().translated(negate(base.offset))
    }
}

/// The vector which moves `p` to the origin, saturating for `i32::MIN`
pub(crate) fn negate(p: Point2<i32>) -> Vector2<i32> {
    Vector2::new(0i32.saturating_sub(p.x), 0i32.saturating_sub(p.y))
}

/// Wrapper of [`image::RgbaImage`] with a human-friendly [`Debug`] impl.
#[derive(Clone)]
#[repr(transparent)]
pub struct DebuggableImage(RgbaImage);

impl Deref for DebuggableImage {
    type Target = RgbaImage;

    fn deref(&self) -> &RgbaImage {
        &self.0
    }
}

impl Debug for DebuggableImage {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let (w, h) = self.0.dimensions();
        write!(f, "RgbaImage({}x{})", w, h)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placement_from_offset_and_size() {
        let layer = Layer::new(RgbaImage::new(30, 20), (-5, 7));
        let rect = layer.placement();
        assert_eq!(rect.min(), Point2::new(-5, 7));
        assert_eq!(rect.max(), Point2::new(25, 27));
    }

    #[test]
    fn relative_to_base() {
        let base = Layer::new(RgbaImage::new(1, 1), (100, 200));
        let face =
            Layer::new(RgbaImage::new(1, 1), (130, 250)).with_blend_mode(BlendMode::Multiply);
        let rel = face.relative_to(&base);
        assert_eq!(rel.offset(), Point2::new(30, 50));
        assert_eq!(rel.blend_mode(), BlendMode::Multiply);
        assert_eq!(base.relative_to(&base).offset(), Point2::new(0, 0));
    }

    #[test]
    fn debug_is_compact() {
        let layer = Layer::new(RgbaImage::new(640, 480), (0, 0));
        let s = format!("{:?}", layer);
        assert!(s.contains("RgbaImage(640x480)"), "{}", s);
    }

    #[test]
    fn rgb_file_becomes_opaque() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rgb.png");
        let rgb = image::RgbImage::from_pixel(2, 3, image::Rgb([10, 20, 30]));
        rgb.save(&path).unwrap();

        let layer = Layer::from_file(&path, (4, 5), BlendMode::Additive).unwrap();
        assert_eq!(layer.image().dimensions(), (2, 3));
        assert_eq!(*layer.image().get_pixel(1, 2), image::Rgba([10, 20, 30, 255]));
        assert_eq!(layer.offset(), Point2::new(4, 5));
        assert_eq!(layer.blend_mode(), BlendMode::Additive);
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.png");
        assert!(Layer::from_file(path, (0, 0), BlendMode::Normal).is_err());
    }

    #[test]
    fn format_is_sniffed_from_contents() {
        let dir = tempfile::tempdir().unwrap();
        let png_path = dir.path().join("face.png");
        let dat_path = dir.path().join("face.dat");
        RgbaImage::from_pixel(3, 1, image::Rgba([1, 2, 3, 4]))
            .save(&png_path)
            .unwrap();
        std::fs::rename(&png_path, &dat_path).unwrap();

        let layer = Layer::from_file(&dat_path, (0, 0), BlendMode::Normal).unwrap();
        assert_eq!(layer.image().dimensions(), (3, 1));
        assert_eq!(*layer.image().get_pixel(2, 0), image::Rgba([1, 2, 3, 4]));
    }

    #[test]
    fn extreme_offsets_saturate() {
        let layer = Layer::new(RgbaImage::new(10, 10), (i32::MAX - 5, i32::MIN));
        let rect = layer.placement();
        assert_eq!(rect.min(), Point2::new(i64::from(i32::MAX) - 5, i64::from(i32::MIN)));
        assert_eq!(rect.max(), Point2::new(i64::from(i32::MAX) + 5, i64::from(i32::MIN) + 10));

        let moved = layer.translated(Vector2::new(100, -100));
        assert_eq!(moved.offset(), Point2::new(i32::MAX, i32::MIN));

        let base = Layer::new(RgbaImage::new(1, 1), (i32::MIN, i32::MIN));
        let rel = Layer::new(RgbaImage::new(1, 1), (0, 0)).relative_to(&base);
        assert_eq!(rel.offset(), Point2::new(i32::MAX, i32::MAX));
    }
}
