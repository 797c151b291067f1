//! papyrix-extract — PDF text extraction with OCR fallback.
//!
//! The direct path reads the PDF's embedded text layer. Documents without
//! one (scans) are rasterized and handed to the OCR capability, page by
//! page. Rasterization happens at most once per document per run even
//! though both OCR and chart detection consume page images; the shared
//! [`RasterCache`] owns that guarantee.

pub mod capability;
pub mod extractor;
pub mod raster_cache;
pub mod text_layer;

pub use capability::{OcrCapability, PdfRasterizer};
pub use extractor::{ExtractedText, PageExtractor};
pub use raster_cache::RasterCache;
