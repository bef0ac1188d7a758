use unicode_width::UnicodeWidthStr;

/// Appended whenever a label had to be shortened.
pub const ELLIPSIS: &str = "…";

/// Measures the rendered width of a single line of text.
pub trait TextMeasure {
    fn width(&self, text: &str) -> f32;
}

impl<F> TextMeasure for F
where
    F: Fn(&str) -> f32,
{
    fn width(&self, text: &str) -> f32 {
        self(text)
    }
}

/// Font-independent measurer: every column advances by `font_size * char_width_factor`.
/// Wide (CJK) characters count as two columns.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeterministicTextMeasure {
    pub font_size: f32,
    pub char_width_factor: f32,
}

impl Default for DeterministicTextMeasure {
    fn default() -> Self {
        Self {
            font_size: 14.0,
            char_width_factor: 0.6,
        }
    }
}

impl TextMeasure for DeterministicTextMeasure {
    fn width(&self, text: &str) -> f32 {
        text.width() as f32 * self.font_size * self.char_width_factor
    }
}

/// Shorten `text` one trailing character at a time until it fits in `max_width`.
///
/// The result is `text` itself when it already fits, otherwise the longest fitting prefix
/// followed by [`ELLIPSIS`]. When not even the ellipsis fits the loop still stops once the
/// prefix is empty.
pub fn fit_text(text: &str, max_width: f32, measure: &dyn TextMeasure) -> String {
    if measure.width(text) <= max_width {
        return text.to_string();
    }

    let mut truncated = text.to_string();
    loop {
        if truncated.pop().is_none() {
            break;
        }
        let candidate = format!("{truncated}{ELLIPSIS}");
        if measure.width(&candidate) <= max_width || truncated.is_empty() {
            return candidate;
        }
    }

    // empty input that still did not fit (negative width)
    String::new()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn monospace(advance: f32) -> impl Fn(&str) -> f32 {
        move |s: &str| s.chars().count() as f32 * advance
    }

    #[test]
    fn test_truncates_with_ellipsis() {
        let measure = monospace(10.0);
        let fitted = fit_text("Hello World", 60.0, &measure);
        assert!(fitted.ends_with(ELLIPSIS));
        assert!(measure.width(&fitted) <= 60.0);
        assert_eq!(fitted, "Hello…");
    }

    #[test]
    fn test_fits_unchanged() {
        let measure = monospace(10.0);
        assert_eq!(fit_text("Hello World", 110.0, &measure), "Hello World");
        assert_eq!(fit_text("Hello World", 500.0, &measure), "Hello World");
    }

    #[test]
    fn test_non_positive_width_terminates() {
        let measure = monospace(10.0);
        assert_eq!(fit_text("Hello World", 0.0, &measure), ELLIPSIS);
        assert_eq!(fit_text("Hello World", -5.0, &measure), ELLIPSIS);
        assert_eq!(fit_text("", -5.0, &measure), "");
        assert_eq!(fit_text("", 0.0, &measure), "");
    }

    #[test]
    fn test_multibyte_characters() {
        let measure = monospace(10.0);
        let fitted = fit_text("ñandú über straße", 50.0, &measure);
        assert_eq!(fitted, "ñand…");
    }

    #[test]
    fn test_deterministic_measure() {
        let measure = DeterministicTextMeasure::default();
        assert!((measure.width("abcde") - 42.0).abs() < 1e-4);
        assert!((measure.width("日本") - 4.0 * 8.4).abs() < 1e-4);
    }
}
