//! Treemap view of query result documents: one rectangle per document, sized by its media
//! count, shaded by media richness, with a hover tooltip and an entrance animation.

pub mod animation;
pub mod canvas;
pub mod chart;
pub mod cli;
pub mod document;
pub mod error;
pub mod metrics;
pub mod options;
pub mod scales;
pub mod svg;
pub mod text_fit;
pub mod tooltip;
pub mod treemap;

pub use chart::{ClickOutcome, Leaf, TreemapChart};
pub use document::{Dataset, Document};
pub use error::{Error, Result};
pub use options::{RenderOptions, RenderOverrides};
