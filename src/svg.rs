use std::fmt::Write as _;

use eframe::egui::Color32;

use crate::animation::AnimRect;
use crate::chart::{TreemapChart, FILL_OPACITY, FONT_SIZE};

/// Serialize the chart as it looks at `now` into a standalone SVG document.
pub fn render_svg(chart: &TreemapChart, now: f64) -> String {
    let frame = chart.frame(now);
    let [min_x, min_y, width, height] = chart.view_box();

    let mut out = String::with_capacity(256 + chart.leaves().len() * 256);
    let _ = write!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{}" height="{}" viewBox="{} {} {} {}" font-family="sans-serif" font-size="{}" text-anchor="middle">"#,
        fmt_num(width),
        fmt_num(height),
        fmt_num(min_x),
        fmt_num(min_y),
        fmt_num(width),
        fmt_num(height),
        fmt_num(FONT_SIZE),
    );
    let _ = write!(out, r#"<g transform="{}">"#, frame.container.to_svg());

    for leaf in chart.leaves() {
        let grown = AnimRect::grown(leaf.size.x, leaf.size.y, frame.state.grow);

        out.push_str(r#"<g transform="translate("#);
        out.push_str(&fmt_num(leaf.origin.x));
        out.push(',');
        out.push_str(&fmt_num(leaf.origin.y));
        out.push_str(r#")" data-value=""#);
        escape_xml_into(&mut out, &leaf.value);
        out.push_str(r#"">"#);

        let _ = write!(
            out,
            r#"<rect x="{}" y="{}" width="{}" height="{}" fill="{}" fill-opacity="{}" stroke="{}" stroke-width="1"/>"#,
            fmt_num(grown.x),
            fmt_num(grown.y),
            fmt_num(grown.w),
            fmt_num(grown.h),
            hex(leaf.fill),
            fmt_num(FILL_OPACITY),
            hex(leaf.group_color),
        );
        let _ = write!(
            out,
            r#"<text x="{}" y="{}" dy="0.35em" opacity="{}">"#,
            fmt_num(leaf.size.x / 2.0),
            fmt_num(leaf.size.y / 2.0),
            fmt_num(frame.state.label_opacity),
        );
        escape_xml_into(&mut out, &leaf.label);
        out.push_str("</text></g>");
    }

    out.push_str("</g></svg>\n");
    out
}

fn hex(color: Color32) -> String {
    format!("#{:02x}{:02x}{:02x}", color.r(), color.g(), color.b())
}

/// Three decimals at most, trailing zeros dropped.
fn fmt_num(v: f32) -> String {
    let mut s = format!("{:.3}", v);
    if s.contains('.') {
        while s.ends_with('0') {
            s.pop();
        }
        if s.ends_with('.') {
            s.pop();
        }
    }
    if s == "-0" {
        s = "0".to_string();
    }
    s
}

fn escape_xml_into(out: &mut String, text: &str) {
    let mut start = 0usize;
    for (i, b) in text.bytes().enumerate() {
        let esc = match b {
            b'&' => "&amp;",
            b'<' => "&lt;",
            b'>' => "&gt;",
            b'"' => "&quot;",
            b'\'' => "&#39;",
            _ => continue,
        };
        out.push_str(&text[start..i]);
        out.push_str(esc);
        start = i + 1;
    }
    out.push_str(&text[start..]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Dataset, Document};
    use crate::options::RenderOptions;
    use crate::text_fit::DeterministicTextMeasure;

    fn chart(documents: Vec<Document>, play_animation: bool) -> TreemapChart {
        TreemapChart::render(
            Some(&Dataset { documents }),
            RenderOptions::default().with_play_animation(play_animation),
            &DeterministicTextMeasure::default(),
            0.0,
        )
        .unwrap()
    }

    fn titled(title: &str) -> Document {
        Document {
            title: title.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_document_shell() {
        let svg = render_svg(&chart(vec![titled("a"), titled("b")], false), 0.0);
        assert!(svg.starts_with("<svg "));
        assert!(svg.contains(r#"viewBox="0 0 1000 800""#));
        assert!(svg.contains(r#"font-family="sans-serif""#));
        assert!(svg.contains(r#"text-anchor="middle""#));
        assert!(svg.contains(r#"font-size="14""#));
        assert!(svg.contains(r#"transform="translate(520,400) scale(1) translate(-520,-400)""#));
        assert_eq!(svg.matches("<rect ").count(), 2);
        assert_eq!(svg.matches("<text ").count(), 2);
        assert!(svg.contains(r#"fill-opacity="0.8""#));
        assert!(svg.contains(r#"data-value="0""#));
    }

    #[test]
    fn test_labels_are_escaped() {
        let svg = render_svg(&chart(vec![titled("R&D <draft>")], false), 0.0);
        assert!(svg.contains("R&amp;D &lt;draft&gt;"));
        assert!(!svg.contains("R&D"));
    }

    #[test]
    fn test_first_animation_frame() {
        let svg = render_svg(&chart(vec![titled("a")], true), 0.0);
        assert!(svg.contains("scale(0.01)"));
        assert!(svg.contains(r#"width="0" height="0""#));
        assert!(svg.contains(r#"opacity="0""#));
    }

    #[test]
    fn test_number_formatting() {
        assert_eq!(fmt_num(2.0), "2");
        assert_eq!(fmt_num(0.35), "0.35");
        assert_eq!(fmt_num(1.0 / 3.0), "0.333");
        assert_eq!(fmt_num(-0.0001), "0");
        assert_eq!(hex(Color32::from_rgb(0x1f, 0x77, 0xb4)), "#1f77b4");
    }
}
