use crate::document::Document;

/// Values derived from a document's raw media counts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DerivedMetrics {
    /// img + video + audio
    pub media_count: f64,
    /// `media_count + 1`, so documents without media still get visible area.
    pub media_count_adjusted: f64,
}

impl DerivedMetrics {
    pub fn from_document(doc: &Document) -> Self {
        let m = doc.multimedia();
        let media_count = m.images() + m.videos() + m.audio();
        Self {
            media_count,
            media_count_adjusted: media_count + 1.0,
        }
    }
}

/// One record per document, in input order.
pub fn derive_metrics(documents: &[Document]) -> Vec<DerivedMetrics> {
    documents.iter().map(DerivedMetrics::from_document).collect()
}
