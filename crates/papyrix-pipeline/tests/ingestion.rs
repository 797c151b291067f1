//! End-to-end pipeline runs over fake capabilities: fallback routing,
//! rasterize-once reuse, per-image failure isolation, and fail-fast with
//! nothing persisted.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use image::{DynamicImage, GrayImage, Luma};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use tokio::sync::broadcast;

use papyrix_common::{PageImage, PipelineError, SourceDocument, Stage};
use papyrix_embed::EmbeddingCapability;
use papyrix_extract::{OcrCapability, PdfRasterizer};
use papyrix_nlp::LexiconNlp;
use papyrix_pipeline::{run_ingestion, Capabilities, InMemoryStore, PipelineConfig};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

// ── PDF fixtures ──────────────────────────────────────────────────────────

/// One-page PDF; empty `text` builds a scan-like document with no text
/// layer.
fn pdf_with_text(text: &str) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });
    let mut operations = Vec::new();
    if !text.is_empty() {
        operations.extend([
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 24.into()]),
            Operation::new("Td", vec![72.into(), 720.into()]),
            Operation::new("Tj", vec![Object::string_literal(text)]),
            Operation::new("ET", vec![]),
        ]);
    }
    let content_id = doc.add_object(Stream::new(
        dictionary! {},
        Content { operations }.encode().expect("encode content"),
    ));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
        "Resources" => resources_id,
        "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
        }),
    );
    let catalog_id = doc.add_object(dictionary! { "Type" => "Catalog", "Pages" => pages_id });
    doc.trailer.set("Root", catalog_id);
    let mut buf = Vec::new();
    doc.save_to(&mut buf).expect("serialize PDF");
    buf
}

// ── Raster fixtures ───────────────────────────────────────────────────────

const INK: Luma<u8> = Luma([0u8]);

fn blank_canvas() -> GrayImage {
    GrayImage::from_pixel(600, 600, Luma([255u8]))
}

/// Axes + gridlines + free-standing bars: classifies as a chart.
fn bar_chart_image() -> DynamicImage {
    let mut img = blank_canvas();
    for i in 0..6u32 {
        let y = 100 + i * 60;
        let x = 100 + i * 80;
        for t in 50..550u32 {
            img.put_pixel(t, y, INK);
            img.put_pixel(t, y + 1, INK);
            img.put_pixel(x, t, INK);
            img.put_pixel(x + 1, t, INK);
        }
    }
    for i in 0..6i32 {
        draw_filled_rect_mut(&mut img, Rect::at(110 + i * 80, 430).of_size(30, 40), INK);
    }
    DynamicImage::ImageLuma8(img)
}

/// Word-like blobs: shapes without long lines, never a chart.
fn text_like_image() -> DynamicImage {
    let mut img = blank_canvas();
    for row in 0..8i32 {
        for col in 0..5i32 {
            draw_filled_rect_mut(
                &mut img,
                Rect::at(40 + col * 110, 60 + row * 65).of_size(60, 8),
                INK,
            );
        }
    }
    DynamicImage::ImageLuma8(img)
}

fn blank_image() -> DynamicImage {
    DynamicImage::ImageLuma8(blank_canvas())
}

// ── Fake capabilities ─────────────────────────────────────────────────────

struct FakeRasterizer {
    images: Vec<DynamicImage>,
    calls: AtomicUsize,
}

impl FakeRasterizer {
    fn new(images: Vec<DynamicImage>) -> Arc<Self> {
        Arc::new(Self { images, calls: AtomicUsize::new(0) })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PdfRasterizer for FakeRasterizer {
    async fn rasterize(&self, _pdf: &[u8], _dpi: u32) -> anyhow::Result<Vec<PageImage>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .images
            .iter()
            .enumerate()
            .map(|(i, img)| PageImage::new(i as u32 + 1, img.clone()))
            .collect())
    }
}

struct FakeOcr {
    by_page: Vec<(u32, &'static str)>,
}

impl FakeOcr {
    fn new(by_page: Vec<(u32, &'static str)>) -> Arc<Self> {
        Arc::new(Self { by_page })
    }
}

#[async_trait]
impl OcrCapability for FakeOcr {
    async fn recognize(&self, page: &PageImage) -> anyhow::Result<String> {
        Ok(self
            .by_page
            .iter()
            .find(|(n, _)| *n == page.ordinal)
            .map(|(_, t)| t.to_string())
            .unwrap_or_default())
    }
}

/// Deterministic toy embedding keyed on sentence bytes.
struct HashEmbedder;

#[async_trait]
impl EmbeddingCapability for HashEmbedder {
    async fn embed(&self, sentences: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        Ok(sentences
            .iter()
            .map(|s| {
                let sum: u32 = s.bytes().map(u32::from).sum();
                vec![s.len() as f32, (sum % 97) as f32, (sum % 31) as f32]
            })
            .collect())
    }
}

struct FailingEmbedder;

#[async_trait]
impl EmbeddingCapability for FailingEmbedder {
    async fn embed(&self, _sentences: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        anyhow::bail!("embedding backend unavailable")
    }
}

fn capabilities(
    rasterizer: Arc<FakeRasterizer>,
    ocr: Arc<FakeOcr>,
    embedder: Arc<dyn EmbeddingCapability>,
) -> Capabilities {
    Capabilities {
        rasterizer,
        ocr,
        nlp: Arc::new(LexiconNlp::with_embedded_subset()),
        embedder,
    }
}

// ── Scenarios ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn direct_text_document_rasterizes_once_for_charts() {
    init_tracing();
    let rasterizer = FakeRasterizer::new(vec![text_like_image(), blank_image()]);
    let ocr = FakeOcr::new(vec![(1, "should never run")]);
    let caps = capabilities(rasterizer.clone(), ocr, Arc::new(HashEmbedder));
    let store = InMemoryStore::new();

    let doc = SourceDocument::from_bytes(
        "digital.pdf",
        pdf_with_text("Charts summarize results. We evaluate on MNIST."),
    );
    let result = run_ingestion(doc, &caps, &PipelineConfig::default(), &store, None)
        .await
        .unwrap();

    assert!(!result.via_ocr);
    // Text came from the layer, so the single render serves chart detection.
    assert_eq!(rasterizer.calls(), 1);
    assert_eq!(result.chart_verdicts.len(), 2);
    assert!(result.record.charts.is_empty());
    assert_eq!(result.record.sentences.len(), 2);
    assert_eq!(result.vectors.len(), 2);
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn scanned_three_pages_one_chart() {
    init_tracing();
    let rasterizer =
        FakeRasterizer::new(vec![text_like_image(), bar_chart_image(), blank_image()]);
    let ocr = FakeOcr::new(vec![(
        1,
        "Bar charts compare categories. The transformer beats the baseline.",
    )]);
    let caps = capabilities(rasterizer.clone(), ocr, Arc::new(HashEmbedder));
    let store = InMemoryStore::new();

    let doc = SourceDocument::from_bytes("scan.pdf", pdf_with_text(""));
    let result = run_ingestion(doc, &caps, &PipelineConfig::default(), &store, None)
        .await
        .unwrap();

    assert!(result.via_ocr);
    // OCR and chart detection both consumed images, but rendering ran once.
    assert_eq!(rasterizer.calls(), 1);
    assert_eq!(result.chart_verdicts.len(), 3);
    assert_eq!(result.record.charts.len(), 1);
    assert_eq!(result.record.charts[0].page, 2);
    assert_eq!(result.record.charts[0].features.confidence, 1.0);
    assert!(!result.record.sentences.is_empty());
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn unreadable_image_is_skipped_not_fatal() {
    let mut images = vec![
        text_like_image(),
        blank_image(),
        text_like_image(),
        blank_image(),
    ];
    images.insert(2, DynamicImage::ImageLuma8(GrayImage::new(0, 0)));
    let rasterizer = FakeRasterizer::new(images);
    let ocr = FakeOcr::new(vec![(1, "Readable prose on the first page.")]);
    let caps = capabilities(rasterizer, ocr, Arc::new(HashEmbedder));
    let store = InMemoryStore::new();

    let doc = SourceDocument::from_bytes("partially_broken.pdf", pdf_with_text(""));
    let result = run_ingestion(doc, &caps, &PipelineConfig::default(), &store, None)
        .await
        .unwrap();

    assert_eq!(result.chart_verdicts.len(), 4);
    assert_eq!(result.images_skipped, 1);
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn no_text_by_any_method_persists_nothing() {
    let rasterizer = FakeRasterizer::new(vec![blank_image(), blank_image()]);
    let ocr = FakeOcr::new(vec![]);
    let caps = capabilities(rasterizer, ocr, Arc::new(HashEmbedder));
    let store = InMemoryStore::new();

    let doc = SourceDocument::from_bytes("blank_scan.pdf", pdf_with_text(""));
    let err = run_ingestion(doc, &caps, &PipelineConfig::default(), &store, None)
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::ExtractionFailed { .. }));
    assert_eq!(err.stage(), Some(Stage::Extracting));
    assert!(store.is_empty());
}

#[tokio::test]
async fn embedding_failure_aborts_without_persisting() {
    let rasterizer = FakeRasterizer::new(vec![blank_image()]);
    let ocr = FakeOcr::new(vec![]);
    let caps = capabilities(rasterizer, ocr, Arc::new(FailingEmbedder));
    let store = InMemoryStore::new();

    let doc = SourceDocument::from_bytes(
        "digital.pdf",
        pdf_with_text("A sentence that will fail to embed."),
    );
    let err = run_ingestion(doc, &caps, &PipelineConfig::default(), &store, None)
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::EmbeddingFailed { .. }));
    assert!(store.is_empty());
}

#[tokio::test]
async fn progress_events_cover_every_stage() {
    let rasterizer = FakeRasterizer::new(vec![blank_image()]);
    let ocr = FakeOcr::new(vec![]);
    let caps = capabilities(rasterizer, ocr, Arc::new(HashEmbedder));
    let store = InMemoryStore::new();

    let (tx, mut rx) = broadcast::channel(64);
    let doc = SourceDocument::from_bytes(
        "digital.pdf",
        pdf_with_text("Progress is observable. Stages are announced."),
    );
    run_ingestion(doc, &caps, &PipelineConfig::default(), &store, Some(tx))
        .await
        .unwrap();

    let mut stages = Vec::new();
    while let Ok(event) = rx.try_recv() {
        stages.push(event.stage);
    }
    for expected in [
        Stage::Extracting,
        Stage::AnalyzingCharts,
        Stage::AnalyzingText,
        Stage::Embedding,
        Stage::Merging,
        Stage::Persisting,
    ] {
        assert!(stages.contains(&expected), "missing stage {expected}");
    }
}
