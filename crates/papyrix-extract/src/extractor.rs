//! Two-path text extraction with deterministic fallback.

use std::sync::Arc;

use tracing::{info, instrument};

use papyrix_common::{PipelineError, Result, SourceDocument};

use crate::capability::OcrCapability;
use crate::raster_cache::RasterCache;
use crate::text_layer::read_text_layer;

/// Placeholder contributed by a page OCR recognized nothing on.
pub const NO_TEXT_PLACEHOLDER: &str = "[No text detected]";

/// The extracted text of one document plus which path produced it.
#[derive(Debug, Clone)]
pub struct ExtractedText {
    pub content: String,
    pub via_ocr: bool,
}

/// Per-document text extraction. Tries the embedded text layer first and
/// only rasterizes + OCRs when the layer is empty or absent. The OCR
/// capability is injected; the rasterizer is reached through the shared
/// [`RasterCache`] so chart detection reuses the same render.
pub struct PageExtractor {
    ocr: Arc<dyn OcrCapability>,
}

impl PageExtractor {
    pub fn new(ocr: Arc<dyn OcrCapability>) -> Self {
        Self { ocr }
    }

    #[instrument(skip_all, fields(document = %document.identity()))]
    pub async fn extract(
        &self,
        document: &SourceDocument,
        raster: &RasterCache,
    ) -> Result<ExtractedText> {
        if let Some(text) = read_text_layer(document.bytes()) {
            info!(chars = text.len(), "text layer found, OCR skipped");
            return Ok(ExtractedText { content: text, via_ocr: false });
        }

        info!("no embedded text layer, falling back to OCR");
        let pages = raster.pages(document.bytes()).await.map_err(|e| {
            PipelineError::ExtractionFailed {
                document: document.identity(),
                reason: format!("rasterization failed: {e:#}"),
            }
        })?;

        if pages.is_empty() {
            return Err(PipelineError::ExtractionFailed {
                document: document.identity(),
                reason: "document rasterized to zero pages".into(),
            });
        }

        let mut page_texts = Vec::with_capacity(pages.len());
        let mut recognized_pages = 0usize;
        for page in pages.iter() {
            let text = self.ocr.recognize(page).await.map_err(|e| {
                PipelineError::ExtractionFailed {
                    document: document.identity(),
                    reason: format!("OCR failed on page {}: {e:#}", page.ordinal),
                }
            })?;
            let trimmed = text.trim();
            if trimmed.is_empty() {
                page_texts.push(NO_TEXT_PLACEHOLDER.to_string());
            } else {
                recognized_pages += 1;
                page_texts.push(trimmed.to_string());
            }
        }

        // Placeholders keep page structure readable, but a document where
        // OCR recognized nothing at all has no extractable text: fail fast
        // rather than let placeholder noise flow downstream.
        if recognized_pages == 0 {
            return Err(PipelineError::ExtractionFailed {
                document: document.identity(),
                reason: format!("OCR recognized no text on any of {} pages", pages.len()),
            });
        }

        info!(
            pages = pages.len(),
            recognized_pages,
            "OCR extraction complete"
        );
        Ok(ExtractedText {
            content: page_texts.join("\n\n"),
            via_ocr: true,
        })
    }
}
