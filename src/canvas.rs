use eframe::egui::{Pos2, Rect, Vec2};

use crate::options::Margin;

/// Uniform scale of the chart's content group about a fixed pivot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContainerTransform {
    /// Pivot in canvas space
    pub center: Pos2,
    pub scale: f32,
}

impl ContainerTransform {
    /// Pivot at the middle of the drawing area left after `margin`.
    pub fn centered(width: f32, height: f32, margin: &Margin) -> Self {
        let draw_width = width - margin.left - margin.right;
        let draw_height = height - margin.top - margin.bottom;
        Self {
            center: Pos2::new(margin.left + draw_width / 2.0, margin.top + draw_height / 2.0),
            scale: 1.0,
        }
    }

    pub fn with_scale(self, scale: f32) -> Self {
        Self { scale, ..self }
    }

    pub fn apply(&self, pos: Pos2) -> Pos2 {
        self.center + (pos - self.center) * self.scale
    }

    pub fn apply_rect(&self, rect: Rect) -> Rect {
        Rect::from_min_max(self.apply(rect.min), self.apply(rect.max))
    }

    /// Inverse of [`apply`](Self::apply); `None` while the content is collapsed to a point.
    pub fn invert(&self, pos: Pos2) -> Option<Pos2> {
        if self.scale <= f32::EPSILON {
            return None;
        }
        Some(self.center + (pos - self.center) / self.scale)
    }

    /// SVG `transform` attribute equivalent.
    pub fn to_svg(&self) -> String {
        let Vec2 { x, y } = self.center.to_vec2();
        format!("translate({x},{y}) scale({}) translate({},{})", self.scale, -x, -y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_center_from_margins() {
        let t = ContainerTransform::centered(1000.0, 800.0, &Margin::default());
        // 40 + 960 / 2, 30 + 740 / 2
        assert_eq!(t.center, Pos2::new(520.0, 400.0));
        assert_eq!(t.scale, 1.0);
    }

    #[test]
    fn test_identity_at_full_scale() {
        let t = ContainerTransform::centered(1000.0, 800.0, &Margin::default());
        let p = Pos2::new(123.0, 456.0);
        assert_eq!(t.apply(p), p);
    }

    #[test]
    fn test_pivot_is_fixed() {
        let t = ContainerTransform::centered(1000.0, 800.0, &Margin::default()).with_scale(0.01);
        assert_eq!(t.apply(t.center), t.center);
        let corner = t.apply(Pos2::ZERO);
        assert!((corner.x - 514.8).abs() < 1e-3);
        assert!((corner.y - 396.0).abs() < 1e-3);
    }

    #[test]
    fn test_roundtrip_conversion() {
        let t = ContainerTransform::centered(1000.0, 800.0, &Margin::default()).with_scale(0.37);
        let p = Pos2::new(123.45, 678.90);
        let back = t.invert(t.apply(p)).unwrap();
        assert!((back.x - p.x).abs() < 0.01);
        assert!((back.y - p.y).abs() < 0.01);
        assert!(t.with_scale(0.0).invert(p).is_none());
    }
}
