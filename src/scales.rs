//! Color encodings: a categorical palette for groups and a blue ramp for media richness.

use std::collections::HashMap;

use eframe::egui::Color32;

/// d3's `schemeCategory10`.
pub const SCHEME_CATEGORY10: [Color32; 10] = [
    Color32::from_rgb(0x1f, 0x77, 0xb4),
    Color32::from_rgb(0xff, 0x7f, 0x0e),
    Color32::from_rgb(0x2c, 0xa0, 0x2c),
    Color32::from_rgb(0xd6, 0x27, 0x28),
    Color32::from_rgb(0x94, 0x67, 0xbd),
    Color32::from_rgb(0x8c, 0x56, 0x4b),
    Color32::from_rgb(0xe3, 0x77, 0xc2),
    Color32::from_rgb(0x7f, 0x7f, 0x7f),
    Color32::from_rgb(0xbc, 0xbd, 0x22),
    Color32::from_rgb(0x17, 0xbe, 0xcf),
];

/// ColorBrewer "Blues", 9 classes, lightest first.
const BLUES: [[f64; 3]; 9] = [
    [247.0, 251.0, 255.0],
    [222.0, 235.0, 247.0],
    [198.0, 219.0, 239.0],
    [158.0, 202.0, 225.0],
    [107.0, 174.0, 214.0],
    [66.0, 146.0, 198.0],
    [33.0, 113.0, 181.0],
    [8.0, 81.0, 156.0],
    [8.0, 48.0, 107.0],
];

/// Lower and upper brightness bounds, away from near-white and near-black.
pub const BRIGHTNESS_RANGE: (f64, f64) = (0.2, 0.7);

/// Maps group keys to palette colors in first-seen order. Keys past the
/// palette length wrap around.
#[derive(Debug, Clone)]
pub struct OrdinalScale {
    index: HashMap<String, usize>,
    palette: &'static [Color32],
}

impl OrdinalScale {
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut index = HashMap::new();
        for key in keys {
            let next = index.len();
            index.entry(key.into()).or_insert(next);
        }
        Self {
            index,
            palette: &SCHEME_CATEGORY10,
        }
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Unknown keys fall back to the first palette entry.
    pub fn color(&self, key: &str) -> Color32 {
        let i = self.index.get(key).copied().unwrap_or(0);
        self.palette[i % self.palette.len()]
    }
}

/// Linear map from the adjusted-metric domain onto [`BRIGHTNESS_RANGE`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BrightnessScale {
    min: f64,
    max: f64,
}

impl BrightnessScale {
    pub fn new(values: impl IntoIterator<Item = f64>) -> Self {
        let (min, max) = values
            .into_iter()
            .filter(|v| v.is_finite())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                (lo.min(v), hi.max(v))
            });
        if min > max {
            // empty domain
            return Self { min: 0.0, max: 0.0 };
        }
        Self { min, max }
    }

    pub fn domain(&self) -> (f64, f64) {
        (self.min, self.max)
    }

    /// Interpolation parameter for `value`. A zero-width domain gives the midpoint.
    pub fn t(&self, value: f64) -> f64 {
        let (lo, hi) = BRIGHTNESS_RANGE;
        let span = self.max - self.min;
        let k = if span > 0.0 {
            (value - self.min) / span
        } else {
            0.5
        };
        lo + (hi - lo) * k
    }

    pub fn color(&self, value: f64) -> Color32 {
        interpolate_blues(self.t(value))
    }
}

fn basis(t1: f64, v0: f64, v1: f64, v2: f64, v3: f64) -> f64 {
    let t2 = t1 * t1;
    let t3 = t2 * t1;
    ((1.0 - 3.0 * t1 + 3.0 * t2 - t3) * v0
        + (4.0 - 6.0 * t2 + 3.0 * t3) * v1
        + (1.0 + 3.0 * t1 + 3.0 * t2 - 3.0 * t3) * v2
        + t3 * v3)
        / 6.0
}

/// Sequential blue ramp through the Blues stops using a uniform B-spline.
/// `t` is clamped to [0, 1]; NaN reads as 0.
pub fn interpolate_blues(t: f64) -> Color32 {
    let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
    let n = BLUES.len() - 1;
    let i = if t >= 1.0 {
        n - 1
    } else {
        (t * n as f64).floor() as usize
    };
    let local = (t - i as f64 / n as f64) * n as f64;

    let channel = |c: usize| {
        let v1 = BLUES[i][c];
        let v2 = BLUES[i + 1][c];
        let v0 = if i > 0 { BLUES[i - 1][c] } else { 2.0 * v1 - v2 };
        let v3 = if i < n - 1 { BLUES[i + 2][c] } else { 2.0 * v2 - v1 };
        basis(local, v0, v1, v2, v3).round().clamp(0.0, 255.0) as u8
    };

    Color32::from_rgb(channel(0), channel(1), channel(2))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn luminance(c: Color32) -> u32 {
        c.r() as u32 * 299 + c.g() as u32 * 587 + c.b() as u32 * 114
    }

    #[test]
    fn test_ordinal_first_seen_order() {
        let scale = OrdinalScale::new(["en", "es", "en", "fr"]);
        assert_eq!(scale.len(), 3);
        assert_eq!(scale.color("en"), SCHEME_CATEGORY10[0]);
        assert_eq!(scale.color("es"), SCHEME_CATEGORY10[1]);
        assert_eq!(scale.color("fr"), SCHEME_CATEGORY10[2]);
        assert_eq!(scale.color("en"), scale.color("en"));
    }

    #[test]
    fn test_ordinal_distinct_within_palette() {
        let keys: Vec<String> = (0..10).map(|i| format!("g{i}")).collect();
        let scale = OrdinalScale::new(keys.clone());
        let mut colors: Vec<_> = keys.iter().map(|k| scale.color(k)).collect();
        colors.dedup();
        assert_eq!(colors.len(), 10);
    }

    #[test]
    fn test_ordinal_wraps_past_palette() {
        let keys: Vec<String> = (0..11).map(|i| format!("g{i}")).collect();
        let scale = OrdinalScale::new(keys);
        assert_eq!(scale.len(), 11);
        assert_eq!(scale.color("g9"), SCHEME_CATEGORY10[9]);
        assert_eq!(scale.color("g10"), SCHEME_CATEGORY10[0]);
    }

    #[test]
    fn test_brightness_range() {
        let scale = BrightnessScale::new([1.0, 5.0, 9.0]);
        assert!((scale.t(1.0) - 0.2).abs() < 1e-9);
        assert!((scale.t(5.0) - 0.45).abs() < 1e-9);
        assert!((scale.t(9.0) - 0.7).abs() < 1e-9);
    }

    #[test]
    fn test_degenerate_domain_is_midpoint() {
        let scale = BrightnessScale::new([1.0, 1.0, 1.0]);
        let t = scale.t(1.0);
        assert!(!t.is_nan());
        assert!((t - 0.45).abs() < 1e-9);
        let c = scale.color(1.0);
        assert_eq!(c, scale.color(1.0));
        assert_eq!(c, interpolate_blues(0.45));
    }

    #[test]
    fn test_higher_value_is_darker() {
        let scale = BrightnessScale::new([1.0, 4.0, 20.0]);
        let light = scale.color(1.0);
        let mid = scale.color(4.0);
        let dark = scale.color(20.0);
        assert!(luminance(light) > luminance(mid));
        assert!(luminance(mid) > luminance(dark));
    }

    #[test]
    fn test_blues_endpoints() {
        assert_eq!(interpolate_blues(0.0), Color32::from_rgb(247, 251, 255));
        assert_eq!(interpolate_blues(1.0), Color32::from_rgb(8, 48, 107));
        assert_eq!(interpolate_blues(f64::NAN), interpolate_blues(0.0));
    }
}
