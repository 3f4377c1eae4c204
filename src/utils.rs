use std::fmt::{Debug, Formatter};

use cgmath::{BaseNum, Point2, Vector2};

//////////
// RECT //
//////////

/// An axis-aligned rectangular region in 2D space.  `min` is inclusive and `max` is exclusive, so
/// a `Rect` placed at `(x, y)` with size `(w, h)` covers pixels `x..x + w` and `y..y + h`.
// Invariant: max.x >= min.x && max.y >= min.y
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rect<S> {
    min: Point2<S>,
    max: Point2<S>,
}

impl<S: BaseNum> Rect<S> {
    /// Creates a [`Rect`] with a given size and where the minimum corner is the origin (i.e.
    /// `(0, 0)`)
    pub fn from_origin(width: S, height: S) -> Self {
        Self {
            min: Point2::new(S::zero(), S::zero()),
            max: Point2::new(width, height),
        }
    }

    pub fn from_min_size(min: Point2<S>, size: Vector2<S>) -> Self {
        Self {
            min,
            max: min + size,
        }
    }

    /// Translates a [`Rect`] by some amount, preserving the size
    pub fn translate(self, by: Vector2<S>) -> Self {
        Self {
            min: self.min + by,
            max: self.max + by,
        }
    }

    pub fn min(&self) -> Point2<S> {
        self.min
    }

    pub fn max(&self) -> Point2<S> {
        self.max
    }

    pub fn width(&self) -> S {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> S {
        self.max.y - self.min.y
    }

    pub fn size(&self) -> Vector2<S> {
        self.max - self.min
    }

    /// `true` if this `Rect` contains no pixels
    pub fn is_empty(&self) -> bool {
        self.max.x <= self.min.x || self.max.y <= self.min.y
    }
}

impl<S: PartialOrd + Copy> Rect<S> {
    /// Computes the region covered by both `self` and `other`.  If the two don't overlap, the
    /// result is an empty `Rect` (whose position is meaningless).
    pub fn intersection(self, other: Self) -> Self {
        let min_x = partial_max(self.min.x, other.min.x);
        let min_y = partial_max(self.min.y, other.min.y);
        // Clamp `max` so that disjoint rects give zero-sized (rather than inverted) results
        let max_x = partial_max(min_x, partial_min(self.max.x, other.max.x));
        let max_y = partial_max(min_y, partial_min(self.max.y, other.max.y));
        Self {
            min: Point2::new(min_x, min_y),
            max: Point2::new(max_x, max_y),
        }
    }

    /// Computes the smallest `Rect` to contain both `self` and `other`
    pub fn union(self, other: Self) -> Self {
        let min_x = partial_min(self.min.x, other.min.x);
        let min_y = partial_min(self.min.y, other.min.y);
        let max_x = partial_max(self.max.x, other.max.x);
        let max_y = partial_max(self.max.y, other.max.y);
        Self {
            min: Point2::new(min_x, min_y),
            max: Point2::new(max_x, max_y),
        }
    }
}

impl<S: Debug> Debug for Rect<S> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Rect(({:?}, {:?}) - ({:?}, {:?}))",
            self.min.x, self.min.y, self.max.x, self.max.y
        )
    }
}

fn partial_max<S: PartialOrd>(x: S, y: S) -> S {
    if x < y {
        y
    } else {
        x
    }
}

fn partial_min<S: PartialOrd>(x: S, y: S) -> S {
    if x < y {
        x
    } else {
        y
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(x: i32, y: i32, w: i32, h: i32) -> Rect<i32> {
        Rect::from_min_size(Point2::new(x, y), Vector2::new(w, h))
    }

    #[test]
    fn union_covers_both() {
        let r = rect(0, 0, 100, 100).union(rect(-10, -10, 50, 50));
        assert_eq!(r.min(), Point2::new(-10, -10));
        assert_eq!(r.max(), Point2::new(100, 100));
        assert_eq!(r.size(), Vector2::new(110, 110));
    }

    #[test]
    fn intersection_of_overlapping() {
        let r = rect(0, 0, 10, 10).intersection(rect(5, -5, 10, 10));
        assert_eq!(r, rect(5, 0, 5, 5));
        assert!(!r.is_empty());
    }

    #[test]
    fn intersection_of_disjoint_is_empty() {
        let r = rect(0, 0, 10, 10).intersection(rect(20, 20, 5, 5));
        assert!(r.is_empty());
        assert_eq!(r.width(), 0);
        assert_eq!(r.height(), 0);
    }

    #[test]
    fn translate_preserves_size() {
        let r = Rect::from_origin(3, 4).translate(Vector2::new(-7, 2));
        assert_eq!(r, rect(-7, 2, 3, 4));
    }

    #[test]
    fn debug_format() {
        assert_eq!(format!("{:?}", rect(1, 2, 3, 4)), "Rect((1, 2) - (4, 6))");
    }
}
