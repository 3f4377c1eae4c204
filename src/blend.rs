//! Per-pixel blending maths.
//!
//! Pixels enter and leave as straight-alpha `[r, g, b, a]` bytes, but every blend is carried out
//! on premultiplied values so that semi-transparent edges don't pick up the colour of whatever
//! transparent pixels sit next to them.

use serde::Deserialize;

/// Below this output alpha a pixel is treated as fully transparent and carries no colour.
const EPSILON: f32 = 1e-6;

/// How a layer's colour is combined with the colour already on the canvas, before the usual
/// premultiplied "over" operator is applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlendMode {
    #[default]
    Normal,
    Multiply,
    Additive,
}

impl BlendMode {
    /// Maps the integer blend codes found in engine coordinate tables onto a [`BlendMode`].
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::Normal),
            3 => Some(Self::Multiply),
            10 => Some(Self::Additive),
            _ => None,
        }
    }

    /// Combine non-premultiplied foreground and background channel values (both in `0..=1`).
    /// The result can exceed `1.0` for [`BlendMode::Additive`]; it is clamped after
    /// un-premultiplying.
    #[inline]
    fn apply(self, fg: f32, bg: f32) -> f32 {
        match self {
            Self::Normal => fg,
            Self::Multiply => fg * bg,
            Self::Additive => fg + bg,
        }
    }
}

/// Composites one straight-alpha `src` pixel over one straight-alpha `dst` pixel, returning the
/// straight-alpha result.
#[inline]
pub fn blend_pixel(dst: [u8; 4], src: [u8; 4], mode: BlendMode) -> [u8; 4] {
    let fg_a = unorm(src[3]);
    if fg_a == 0.0 {
        // A fully transparent source can't change anything, whatever the blend mode
        return dst;
    }
    let bg_a = unorm(dst[3]);
    let inv_fg_a = 1.0 - fg_a;
    let out_a = fg_a + bg_a * inv_fg_a;

    let mut out = [0u8; 4];
    for c in 0..3 {
        let fg = unorm(src[c]);
        let bg = unorm(dst[c]);
        let blended_p = mode.apply(fg, bg) * fg_a;
        let out_p = blended_p + bg * bg_a * inv_fg_a;
        let straight = if out_a > EPSILON { out_p / out_a } else { 0.0 };
        out[c] = to_u8(straight);
    }
    out[3] = to_u8(out_a);
    out
}

#[inline]
fn unorm(v: u8) -> f32 {
    v as f32 / 255.0
}

#[inline]
fn to_u8(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}
