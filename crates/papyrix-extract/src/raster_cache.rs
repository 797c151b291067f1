//! Rasterize-once cache shared by OCR and chart detection.

use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::info;

use papyrix_common::PageImage;

use crate::capability::PdfRasterizer;

/// Owns the "rasterization happens exactly once per document per run"
/// policy. Both consumers ask the cache for pages; the first request
/// renders, every later request gets the same shared, read-only list.
pub struct RasterCache {
    rasterizer: Arc<dyn PdfRasterizer>,
    dpi: u32,
    pages: OnceCell<Arc<Vec<PageImage>>>,
}

impl RasterCache {
    pub fn new(rasterizer: Arc<dyn PdfRasterizer>, dpi: u32) -> Self {
        Self {
            rasterizer,
            dpi,
            pages: OnceCell::new(),
        }
    }

    /// Page images for the document, rendering on first call only.
    pub async fn pages(&self, pdf: &[u8]) -> anyhow::Result<Arc<Vec<PageImage>>> {
        let pages = self
            .pages
            .get_or_try_init(|| async {
                let rendered = self.rasterizer.rasterize(pdf, self.dpi).await?;
                info!(pages = rendered.len(), dpi = self.dpi, "document rasterized");
                Ok::<_, anyhow::Error>(Arc::new(rendered))
            })
            .await?;
        Ok(Arc::clone(pages))
    }

    /// Whether rasterization has already run for this document.
    pub fn is_populated(&self) -> bool {
        self.pages.initialized()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use image::DynamicImage;

    struct CountingRasterizer {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl PdfRasterizer for CountingRasterizer {
        async fn rasterize(&self, _pdf: &[u8], _dpi: u32) -> anyhow::Result<Vec<PageImage>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![PageImage::new(1, DynamicImage::new_luma8(8, 8))])
        }
    }

    #[tokio::test]
    async fn renders_exactly_once_across_consumers() {
        let rasterizer = Arc::new(CountingRasterizer { calls: AtomicUsize::new(0) });
        let cache = RasterCache::new(rasterizer.clone(), 300);
        assert!(!cache.is_populated());

        let first = cache.pages(b"%PDF").await.unwrap();
        let second = cache.pages(b"%PDF").await.unwrap();
        assert_eq!(first.len(), 1);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(rasterizer.calls.load(Ordering::SeqCst), 1);
        assert!(cache.is_populated());
    }
}
