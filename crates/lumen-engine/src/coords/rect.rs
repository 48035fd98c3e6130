use super::{Vec2, Viewport};

/// Axis-aligned rectangle in target pixels (top-left origin).
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Rect {
    pub origin: Vec2,
    pub size: Vec2,
}

impl Rect {
    #[inline]
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self {
            origin: Vec2::new(x, y),
            size: Vec2::new(w, h),
        }
    }

    #[inline]
    pub const fn from_origin_size(origin: Vec2, size: Vec2) -> Self {
        Self { origin, size }
    }

    /// The full area of a viewport.
    #[inline]
    pub fn covering(viewport: Viewport) -> Self {
        Rect::new(0.0, 0.0, viewport.width as f32, viewport.height as f32)
    }

    #[inline]
    pub fn max(self) -> Vec2 {
        self.origin + self.size
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.size.x <= 0.0 || self.size.y <= 0.0
    }

    /// Overlapping area, or `None` when the rects only touch or are disjoint.
    /// Both rects are expected to have non-negative size.
    #[inline]
    pub fn intersect(self, other: Rect) -> Option<Rect> {
        let lo_x = self.origin.x.max(other.origin.x);
        let lo_y = self.origin.y.max(other.origin.y);
        let hi = Vec2::new(self.max().x.min(other.max().x), self.max().y.min(other.max().y));

        let clipped = Rect::new(lo_x, lo_y, hi.x - lo_x, hi.y - lo_y);
        (!clipped.is_empty()).then_some(clipped)
    }
}
