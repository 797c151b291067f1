//! Direct text-layer read via lopdf.

use lopdf::Document as PdfDoc;
use tracing::{debug, warn};

/// Read the embedded text layer of a PDF, page order preserved.
///
/// Returns `None` when the document has no usable text layer, including
/// when the PDF cannot be parsed at all. That is not an error here: the
/// caller falls back to rasterization + OCR, which may still succeed
/// through a different renderer.
pub fn read_text_layer(pdf: &[u8]) -> Option<String> {
    let doc = match PdfDoc::load_mem(pdf) {
        Ok(doc) => doc,
        Err(e) => {
            warn!(error = %e, "direct text extraction could not parse PDF");
            return None;
        }
    };

    let mut pages_text = Vec::new();
    for (page_num, _) in doc.get_pages() {
        match doc.extract_text(&[page_num]) {
            Ok(text) => pages_text.push(text),
            Err(e) => {
                debug!(page = page_num, error = %e, "no text on page");
            }
        }
    }

    let joined = pages_text.join("\n");
    let trimmed = joined.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
