use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle in the shared virtual coordinate space.
///
/// All walls, zones, items, and car bounding boxes live in the same
/// fixed-size virtual space, so every peer resolves collisions against
/// identical geometry regardless of its screen dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl Rect {
    pub fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Square rect of the given half-extent centered on (cx, cy).
    pub fn around(cx: f32, cy: f32, half: f32) -> Self {
        Self {
            left: cx - half,
            top: cy - half,
            right: cx + half,
            bottom: cy + half,
        }
    }

    /// Strict overlap test: touching edges do not count as intersecting.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.left < other.right
            && other.left < self.right
            && self.top < other.bottom
            && other.top < self.bottom
    }

    pub fn center_x(&self) -> f32 {
        (self.left + self.right) / 2.0
    }

    pub fn center_y(&self) -> f32 {
        (self.top + self.bottom) / 2.0
    }

    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlapping_rects_intersect() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(5.0, 5.0, 15.0, 15.0);
        assert!(a.intersects(&b));
        assert!(b.intersects(&a));
    }

    #[test]
    fn touching_edges_do_not_intersect() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(10.0, 0.0, 20.0, 10.0);
        assert!(!a.intersects(&b));
    }

    #[test]
    fn disjoint_rects_do_not_intersect() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(50.0, 50.0, 60.0, 60.0);
        assert!(!a.intersects(&b));
    }

    #[test]
    fn around_is_centered() {
        let r = Rect::around(100.0, 200.0, 20.0);
        assert_eq!(r.center_x(), 100.0);
        assert_eq!(r.center_y(), 200.0);
        assert_eq!(r.width(), 40.0);
        assert_eq!(r.height(), 40.0);
    }
}
