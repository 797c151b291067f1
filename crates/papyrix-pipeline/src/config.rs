//! Pipeline configuration: component configs plus run-level knobs.

use std::path::Path;

use serde::{Deserialize, Serialize};

use papyrix_nlp::TextAnalyzerConfig;
use papyrix_vision::ChartDetectorConfig;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Rasterization resolution for OCR and chart detection.
    pub dpi: u32,

    /// Sentences per embedding batch.
    pub embed_batch_size: usize,

    pub detector: ChartDetectorConfig,

    pub analyzer: TextAnalyzerConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            dpi: 300,
            embed_batch_size: 32,
            detector: ChartDetectorConfig::default(),
            analyzer: TextAnalyzerConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Parse from a TOML document; missing keys fall back to defaults.
    pub fn from_toml_str(s: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(s)?)
    }

    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Apply environment overrides. A `.env` file is honored when present;
    /// recognized keys are `PAPYRIX_DPI` and `PAPYRIX_EMBED_BATCH_SIZE`.
    pub fn with_env_overrides(mut self) -> Self {
        dotenvy::dotenv().ok();
        if let Some(dpi) = env_parse("PAPYRIX_DPI") {
            self.dpi = dpi;
        }
        if let Some(batch) = env_parse("PAPYRIX_EMBED_BATCH_SIZE") {
            self.embed_batch_size = batch;
        }
        self
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_calibrated_thresholds() {
        let cfg = PipelineConfig::default();
        assert_eq!(cfg.dpi, 300);
        assert_eq!(cfg.detector.threshold_window, 11);
        assert_eq!(cfg.detector.hough_vote_threshold, 100);
        assert!(!cfg.analyzer.dedup_keywords);
    }

    #[test]
    fn toml_overrides_only_named_keys() {
        let cfg = PipelineConfig::from_toml_str(
            r#"
            dpi = 150

            [detector]
            min_line_length = 80
            "#,
        )
        .unwrap();
        assert_eq!(cfg.dpi, 150);
        assert_eq!(cfg.detector.min_line_length, 80);
        // Untouched keys keep their defaults.
        assert_eq!(cfg.detector.canny_high, 150.0);
        assert_eq!(cfg.embed_batch_size, 32);
    }
}
