//! External capability contracts consumed by the extraction stage.
//!
//! Both are injected as explicitly constructed objects owned by the
//! pipeline runner; implementations must be stateless or internally
//! synchronized so one handle can serve concurrent documents.

use async_trait::async_trait;

use papyrix_common::PageImage;

/// Renders every page of a PDF to a raster image at the requested
/// resolution. Returned images are ordered and carry contiguous 1-based
/// ordinals matching page order in the source document.
#[async_trait]
pub trait PdfRasterizer: Send + Sync {
    async fn rasterize(&self, pdf: &[u8], dpi: u32) -> anyhow::Result<Vec<PageImage>>;
}

/// Recognizes text in one raster image. An empty string is a valid result
/// for a page with no recognizable text.
#[async_trait]
pub trait OcrCapability: Send + Sync {
    async fn recognize(&self, page: &PageImage) -> anyhow::Result<String>;
}
