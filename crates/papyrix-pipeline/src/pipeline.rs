//! One-document ingestion run.
//!
//! Stage machine: `Extracting → Analyzing(Charts) ∥ Analyzing(Text) →
//! Merging → Done`, with `Failed` reachable from every stage. Chart and
//! text analysis are independent once extraction has produced text and the
//! raster cache holds the page images, so they run concurrently; embedding
//! strictly follows text analysis. A fatal failure anywhere aborts the
//! document: no record is emitted and nothing is persisted.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use rayon::prelude::*;
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use papyrix_common::{
    ChartRecord, PageImage, PipelineError, ProcessedRecord, Result, SourceDocument, Stage,
};
use papyrix_embed::{EmbeddingCapability, EmbeddingIndexer, FlatIndex};
use papyrix_extract::{OcrCapability, PageExtractor, PdfRasterizer, RasterCache};
use papyrix_nlp::{NlpCapability, TextAnalysis, TextAnalyzer};
use papyrix_vision::ChartDetector;

use crate::config::PipelineConfig;
use crate::store::RecordStore;

/// The external capability handles one run depends on. Constructed by the
/// runner and injected; every handle must be reentrant so independent
/// documents can share one set.
#[derive(Clone)]
pub struct Capabilities {
    pub rasterizer: Arc<dyn PdfRasterizer>,
    pub ocr: Arc<dyn OcrCapability>,
    pub nlp: Arc<dyn NlpCapability>,
    pub embedder: Arc<dyn EmbeddingCapability>,
}

/// Progress event emitted at stage transitions (cloneable for broadcast).
#[derive(Debug, Clone, Serialize)]
pub struct IngestionProgress {
    pub job_id: Uuid,
    pub stage: Stage,
    pub message: String,
}

/// Everything one successful run produces. The record has already been
/// handed to the store; vectors and index stay owned by the run for the
/// caller to query or discard.
#[derive(Debug)]
pub struct IngestionResult {
    pub job_id: Uuid,
    pub document_id: Uuid,
    pub record: ProcessedRecord,
    /// Every per-image verdict, charts and non-charts alike. The merged
    /// record keeps only the positive ones.
    pub chart_verdicts: Vec<ChartRecord>,
    pub vectors: Vec<Vec<f32>>,
    pub index: FlatIndex,
    pub via_ocr: bool,
    pub images_skipped: usize,
    pub duration_ms: u64,
}

/// Run the full ingestion pipeline for one document.
#[instrument(skip_all, fields(document = %document.identity()))]
pub async fn run_ingestion(
    document: SourceDocument,
    caps: &Capabilities,
    config: &PipelineConfig,
    store: &dyn RecordStore,
    progress_tx: Option<broadcast::Sender<IngestionProgress>>,
) -> Result<IngestionResult> {
    let job_id = Uuid::new_v4();
    let t0 = Instant::now();
    let identity = document.identity();

    let emit = |stage: Stage, message: &str| {
        if let Some(tx) = &progress_tx {
            let _ = tx.send(IngestionProgress {
                job_id,
                stage,
                message: message.to_string(),
            });
        }
    };

    // ── Extracting ────────────────────────────────────────────────────────
    emit(Stage::Extracting, "extracting text");
    let raster = RasterCache::new(Arc::clone(&caps.rasterizer), config.dpi);
    let extractor = PageExtractor::new(Arc::clone(&caps.ocr));
    let extracted = extractor.extract(&document, &raster).await?;

    // Chart detection always needs page images. When the text layer was
    // direct this is the first (and only) render; after OCR it reuses the
    // cached one.
    let pages = raster.pages(document.bytes()).await.map_err(|e| {
        PipelineError::StageFailed {
            document: identity.clone(),
            stage: Stage::AnalyzingCharts,
            source: e.context("rasterization for chart detection"),
        }
    })?;

    // ── Analyzing: charts ∥ text ──────────────────────────────────────────
    emit(Stage::AnalyzingCharts, "classifying page images");
    emit(Stage::AnalyzingText, "running text analysis");

    let chart_task = {
        let detector = ChartDetector::new(config.detector.clone());
        let pages = Arc::clone(&pages);
        tokio::task::spawn_blocking(move || analyze_pages(&detector, &pages))
    };
    let text_task = {
        let analyzer = TextAnalyzer::new(Arc::clone(&caps.nlp), config.analyzer.clone());
        let text = extracted.content.clone();
        tokio::task::spawn_blocking(move || analyzer.analyze(&text))
    };
    let (chart_out, text_out) = tokio::join!(chart_task, text_task);

    let (chart_verdicts, images_skipped) = chart_out.map_err(|e| PipelineError::StageFailed {
        document: identity.clone(),
        stage: Stage::AnalyzingCharts,
        source: anyhow::Error::new(e),
    })?;
    let analysis: TextAnalysis = text_out
        .map_err(|e| PipelineError::StageFailed {
            document: identity.clone(),
            stage: Stage::AnalyzingText,
            source: anyhow::Error::new(e),
        })?
        .map_err(|e| PipelineError::AnalysisFailed { document: identity.clone(), source: e })?;

    // ── Embedding (strictly after text analysis) ──────────────────────────
    emit(Stage::Embedding, "building sentence vectors");
    let indexer = EmbeddingIndexer::new(Arc::clone(&caps.embedder), config.embed_batch_size);
    let (vectors, index) = indexer
        .build(&analysis.sentences)
        .await
        .map_err(|e| PipelineError::EmbeddingFailed { document: identity.clone(), source: e })?;

    // ── Merging ───────────────────────────────────────────────────────────
    emit(Stage::Merging, "merging records");
    let record = ProcessedRecord {
        document: identity.clone(),
        sentences: analysis.sentences,
        entities: analysis.entities,
        keywords: analysis.keywords,
        charts: chart_verdicts
            .iter()
            .filter(|c| c.features.is_chart)
            .cloned()
            .collect(),
        created_at: Utc::now(),
    };

    // ── Done: hand off to storage ─────────────────────────────────────────
    emit(Stage::Persisting, "persisting record");
    let document_id = store.persist(&record).await.map_err(|e| PipelineError::StageFailed {
        document: identity.clone(),
        stage: Stage::Persisting,
        source: e,
    })?;

    let duration_ms = t0.elapsed().as_millis() as u64;
    info!(
        job_id = %job_id,
        document_id = %document_id,
        sentences = record.sentences.len(),
        charts = record.charts.len(),
        images_skipped,
        duration_ms,
        "ingestion complete"
    );

    Ok(IngestionResult {
        job_id,
        document_id,
        record,
        chart_verdicts,
        vectors,
        index,
        via_ocr: extracted.via_ocr,
        images_skipped,
        duration_ms,
    })
}

/// Per-image chart analysis over the worker pool. Each image is a pure,
/// independent unit of work; unreadable images are logged and skipped,
/// never escalated.
fn analyze_pages(detector: &ChartDetector, pages: &[PageImage]) -> (Vec<ChartRecord>, usize) {
    let outcomes: Vec<(u32, Result<papyrix_common::ChartFeatures>)> = pages
        .par_iter()
        .map(|page| (page.ordinal, detector.analyze(page)))
        .collect();

    let mut verdicts = Vec::with_capacity(outcomes.len());
    let mut skipped = 0usize;
    for (ordinal, outcome) in outcomes {
        match outcome {
            Ok(features) => verdicts.push(ChartRecord { page: ordinal, features }),
            Err(e) => {
                warn!(page = ordinal, error = %e, "skipping unreadable page image");
                skipped += 1;
            }
        }
    }
    (verdicts, skipped)
}
