use std::fmt;
use std::path::Path;

use serde::{Deserialize, Deserializer};

use crate::error::{Error, Result};

/// Per-type media counts. Any JSON number is accepted; missing or `null` counts read as zero.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Multimedia {
    #[serde(default)]
    pub img: Option<f64>,
    #[serde(default)]
    pub video: Option<f64>,
    #[serde(default)]
    pub audio: Option<f64>,
}

impl Multimedia {
    pub fn images(&self) -> f64 {
        self.img.unwrap_or(0.0)
    }

    pub fn videos(&self) -> f64 {
        self.video.unwrap_or(0.0)
    }

    pub fn audio(&self) -> f64 {
        self.audio.unwrap_or(0.0)
    }
}

/// Search ranking as delivered by the backend: either a number or a free-form string.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Ranking {
    Number(f64),
    Text(String),
}

impl fmt::Display for Ranking {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // 3.0 prints as "3", like the browser would
            Ranking::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => write!(f, "{}", *n as i64),
            Ranking::Number(n) => write!(f, "{n}"),
            Ranking::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Metrics {
    #[serde(default)]
    pub ranking: Option<Ranking>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub multimedia: Option<Multimedia>,
}

/// Missing and `null` text both read as the empty string.
fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// One search result. Never mutated by the chart.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Document {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub snippet: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub link: String,
    #[serde(default)]
    pub metrics: Option<Metrics>,
}

impl Document {
    pub fn multimedia(&self) -> Multimedia {
        self.metrics
            .as_ref()
            .and_then(|m| m.multimedia.clone())
            .unwrap_or_default()
    }

    pub fn ranking(&self) -> String {
        self.metrics
            .as_ref()
            .and_then(|m| m.ranking.as_ref())
            .map(ToString::to_string)
            .unwrap_or_default()
    }

    pub fn language(&self) -> &str {
        self.metrics
            .as_ref()
            .and_then(|m| m.language.as_deref())
            .unwrap_or("")
    }
}

/// A pre-loaded query response: `{"documents": [...]}`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Dataset {
    pub documents: Vec<Document>,
}

impl Dataset {
    pub fn from_json_str(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let dataset = Self::from_json_str(&text).map_err(|source| Error::Json {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!(
            "Loaded {} documents from {}",
            dataset.documents.len(),
            path.display()
        );
        Ok(dataset)
    }
}
