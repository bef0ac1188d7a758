use std::fmt;
use std::path::Path;
use std::sync::Arc;

use eframe::egui::Color32;
use serde::{Deserialize, Deserializer};

use crate::document::Document;
use crate::error::{Error, Result};
use crate::metrics::DerivedMetrics;

/// A document attribute that options can point at, named by its JSON path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
pub enum DocumentField {
    #[serde(rename = "title")]
    Title,
    #[serde(rename = "snippet")]
    Snippet,
    #[serde(rename = "link")]
    Link,
    #[serde(rename = "metrics.ranking")]
    Ranking,
    #[serde(rename = "metrics.language")]
    Language,
    #[serde(rename = "metrics.mediaCount")]
    MediaCount,
    #[serde(rename = "metrics.mediaCountAdjusted")]
    MediaCountAdjusted,
    #[serde(rename = "metrics.multimedia.img")]
    Images,
    #[serde(rename = "metrics.multimedia.video")]
    Videos,
    #[serde(rename = "metrics.multimedia.audio")]
    Audio,
}

impl DocumentField {
    /// Text value of the field; absent values read as the empty string.
    pub fn value(self, doc: &Document, metrics: &DerivedMetrics) -> String {
        match self {
            DocumentField::Title => doc.title.clone(),
            DocumentField::Snippet => doc.snippet.clone(),
            DocumentField::Link => doc.link.clone(),
            DocumentField::Ranking => doc.ranking(),
            DocumentField::Language => doc.language().to_string(),
            DocumentField::MediaCount => metrics.media_count.to_string(),
            DocumentField::MediaCountAdjusted => metrics.media_count_adjusted.to_string(),
            DocumentField::Images => doc.multimedia().images().to_string(),
            DocumentField::Videos => doc.multimedia().videos().to_string(),
            DocumentField::Audio => doc.multimedia().audio().to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Margin {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
}

impl Default for Margin {
    fn default() -> Self {
        Self {
            top: 30.0,
            right: 0.0,
            bottom: 30.0,
            left: 40.0,
        }
    }
}

/// Parse `#rrggbb` (the leading `#` is optional).
pub fn parse_hex_color(value: &str) -> Result<Color32> {
    let invalid = || Error::InvalidColor {
        value: value.to_string(),
    };
    let hex = value.strip_prefix('#').unwrap_or(value);
    if hex.len() != 6 || !hex.is_ascii() {
        return Err(invalid());
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| invalid());
    Ok(Color32::from_rgb(channel(0)?, channel(2)?, channel(4)?))
}

fn deserialize_color<'de, D>(deserializer: D) -> std::result::Result<Color32, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_hex_color(&raw).map_err(serde::de::Error::custom)
}

/// Look of the tooltip overlay. The overlay is never hit-testable and starts transparent.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TooltipStyle {
    pub width: f32,
    pub padding: f32,
    pub border_width: f32,
    pub rounding: f32,
    #[serde(deserialize_with = "deserialize_color")]
    pub background: Color32,
    #[serde(deserialize_with = "deserialize_color")]
    pub border: Color32,
    #[serde(deserialize_with = "deserialize_color")]
    pub text: Color32,
}

impl Default for TooltipStyle {
    fn default() -> Self {
        Self {
            width: 300.0,
            padding: 4.0,
            border_width: 1.0,
            rounding: 2.0,
            background: Color32::from_rgb(0xf9, 0xf9, 0xf9),
            border: Color32::BLACK,
            text: Color32::BLACK,
        }
    }
}

/// Structured tooltip body: a bold heading, a paragraph, a rule, then labelled rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TooltipContent {
    pub heading: String,
    pub body: String,
    pub rows: Vec<(String, String)>,
}

impl TooltipContent {
    pub fn lines(&self) -> Vec<String> {
        let mut lines = vec![self.heading.clone(), self.body.clone(), String::new()];
        lines.extend(self.rows.iter().map(|(k, v)| format!("{k}: {v}")));
        lines
    }
}

pub type ContentRenderer = Arc<dyn Fn(&Document, &DerivedMetrics) -> TooltipContent + Send + Sync>;
pub type ClickHandler = Arc<dyn Fn(&Document) + Send + Sync>;

pub fn default_tooltip_content(doc: &Document, metrics: &DerivedMetrics) -> TooltipContent {
    let m = doc.multimedia();
    TooltipContent {
        heading: format!("{}-{}", doc.ranking(), doc.title),
        body: doc.snippet.clone(),
        rows: vec![
            ("Images".to_string(), m.images().to_string()),
            ("Videos".to_string(), m.videos().to_string()),
            ("Audio".to_string(), m.audio().to_string()),
            ("Total Media".to_string(), metrics.media_count.to_string()),
        ],
    }
}

#[derive(Clone)]
pub struct TooltipOptions {
    pub style: TooltipStyle,
    pub content: ContentRenderer,
    /// `None` leaves the click to the host, which opens the document's link in a new tab.
    pub on_click: Option<ClickHandler>,
}

impl Default for TooltipOptions {
    fn default() -> Self {
        Self {
            style: TooltipStyle::default(),
            content: Arc::new(default_tooltip_content),
            on_click: None,
        }
    }
}

impl fmt::Debug for TooltipOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TooltipOptions")
            .field("style", &self.style)
            .field("on_click", &self.on_click.as_ref().map(|_| "<callback>"))
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub label_field: DocumentField,
    /// Informational only: area always comes from the adjusted media count.
    pub value_field: DocumentField,
    pub group_field: DocumentField,
    pub width: f32,
    pub height: f32,
    pub play_animation: bool,
    pub margin: Margin,
    pub tooltip: TooltipOptions,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            label_field: DocumentField::Ranking,
            value_field: DocumentField::MediaCount,
            group_field: DocumentField::Language,
            width: 1000.0,
            height: 800.0,
            play_animation: true,
            margin: Margin::default(),
            tooltip: TooltipOptions::default(),
        }
    }
}

impl RenderOptions {
    /// Shallow merge: every key present in `overrides` replaces the default wholesale.
    pub fn merged(mut self, overrides: RenderOverrides) -> Self {
        if let Some(v) = overrides.label_field {
            self.label_field = v;
        }
        if let Some(v) = overrides.value_field {
            self.value_field = v;
        }
        if let Some(v) = overrides.group_field {
            self.group_field = v;
        }
        if let Some(v) = overrides.width {
            self.width = v;
        }
        if let Some(v) = overrides.height {
            self.height = v;
        }
        if let Some(v) = overrides.play_animation {
            self.play_animation = v;
        }
        if let Some(v) = overrides.margin {
            self.margin = v;
        }
        if let Some(v) = overrides.tooltip {
            self.tooltip.style = v.style;
        }
        self
    }

    pub fn with_play_animation(mut self, play: bool) -> Self {
        self.play_animation = play;
        self
    }

    pub fn with_size(mut self, width: f32, height: f32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_tooltip_content(
        mut self,
        content: impl Fn(&Document, &DerivedMetrics) -> TooltipContent + Send + Sync + 'static,
    ) -> Self {
        self.tooltip.content = Arc::new(content);
        self
    }

    pub fn with_on_click(mut self, on_click: impl Fn(&Document) + Send + Sync + 'static) -> Self {
        self.tooltip.on_click = Some(Arc::new(on_click));
        self
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TooltipOverrides {
    #[serde(default)]
    pub style: TooltipStyle,
}

/// Caller options as read from JSON; absent keys keep their defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderOverrides {
    pub label_field: Option<DocumentField>,
    pub value_field: Option<DocumentField>,
    pub group_field: Option<DocumentField>,
    pub width: Option<f32>,
    pub height: Option<f32>,
    pub play_animation: Option<bool>,
    pub margin: Option<Margin>,
    pub tooltip: Option<TooltipOverrides>,
}

impl RenderOverrides {
    pub fn from_json_str(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text).map_err(|source| Error::Json {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Metrics, Multimedia, Ranking};

    #[test]
    fn test_shallow_merge_keeps_unspecified_keys() {
        let overrides =
            RenderOverrides::from_json_str(r#"{ "width": 640, "playAnimation": false }"#).unwrap();
        let options = RenderOptions::default().merged(overrides);

        assert_eq!(options.width, 640.0);
        assert!(!options.play_animation);
        assert_eq!(options.height, 800.0);
        assert_eq!(options.margin, Margin::default());
        assert_eq!(options.group_field, DocumentField::Language);
    }

    #[test]
    fn test_margin_replaced_wholesale() {
        let overrides = RenderOverrides::from_json_str(
            r#"{ "margin": { "top": 1, "right": 2, "bottom": 3, "left": 4 } }"#,
        )
        .unwrap();
        let options = RenderOptions::default().merged(overrides);
        assert_eq!(options.margin.left, 4.0);
        assert_eq!(options.margin.right, 2.0);
    }

    #[test]
    fn test_field_paths() {
        let overrides = RenderOverrides::from_json_str(
            r#"{ "groupField": "metrics.multimedia.video", "labelField": "title" }"#,
        )
        .unwrap();
        assert_eq!(overrides.group_field, Some(DocumentField::Videos));
        assert_eq!(overrides.label_field, Some(DocumentField::Title));
        assert!(RenderOverrides::from_json_str(r#"{ "groupField": "metrics.nope" }"#).is_err());
    }

    #[test]
    fn test_tooltip_style_colors() {
        let overrides = RenderOverrides::from_json_str(
            r##"{ "tooltip": { "style": { "width": 200, "background": "#102030" } } }"##,
        )
        .unwrap();
        let options = RenderOptions::default().merged(overrides);
        assert_eq!(options.tooltip.style.width, 200.0);
        assert_eq!(options.tooltip.style.background, Color32::from_rgb(0x10, 0x20, 0x30));
        assert_eq!(options.tooltip.style.padding, 4.0);

        assert!(parse_hex_color("#12345").is_err());
        assert!(parse_hex_color("zzzzzz").is_err());
    }

    #[test]
    fn test_field_values_default_to_empty() {
        let doc = Document::default();
        let metrics = DerivedMetrics::from_document(&doc);
        assert_eq!(DocumentField::Language.value(&doc, &metrics), "");
        assert_eq!(DocumentField::Ranking.value(&doc, &metrics), "");
        assert_eq!(DocumentField::MediaCountAdjusted.value(&doc, &metrics), "1");
    }

    #[test]
    fn test_default_tooltip_content() {
        let doc = Document {
            title: "Ferris".into(),
            snippet: "crab".into(),
            metrics: Some(Metrics {
                ranking: Some(Ranking::Number(2.0)),
                multimedia: Some(Multimedia {
                    img: Some(2.0),
                    video: None,
                    audio: Some(1.0),
                }),
                ..Default::default()
            }),
            ..Default::default()
        };
        let content = default_tooltip_content(&doc, &DerivedMetrics::from_document(&doc));
        assert_eq!(content.heading, "2-Ferris");
        assert_eq!(content.body, "crab");
        assert_eq!(content.rows[1], ("Videos".to_string(), "0".to_string()));
        assert_eq!(content.rows[3], ("Total Media".to_string(), "3".to_string()));
    }
}
