//! Candle BERT sentence embedder.
//!
//! Loads a sentence-transformer checkpoint from the Hugging Face Hub and
//! runs batched CPU inference. Encoding is deterministic: identical input
//! and model always produce identical vectors, and batch boundaries never
//! leak into the output.

use std::path::Path;
use std::time::Instant;

use async_trait::async_trait;
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config, HiddenAct, PositionEmbeddingType};
use hf_hub::api::sync::{Api, ApiBuilder};
use tokenizers::models::wordpiece::WordPieceBuilder;
use tokenizers::Tokenizer;
use tracing::{debug, info};

use crate::capability::EmbeddingCapability;
use crate::config::EmbedderConfig;
use crate::error::EmbedError;
use crate::pooling::l2_normalize;

pub struct BertSentenceEmbedder {
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
    config: EmbedderConfig,
    dimension: usize,
}

impl BertSentenceEmbedder {
    /// Download (or reuse cached) model files and load them onto the CPU.
    pub async fn new(config: EmbedderConfig) -> Result<Self, EmbedError> {
        let start = Instant::now();
        info!(model = %config.model_id, "loading sentence embedding model");

        let device = Device::Cpu;
        let model_id = config.model_id.clone();
        let cache_dir = config.cache_dir.clone();

        // hf-hub's sync API does blocking I/O; keep it off the runtime.
        let (bert_config, tokenizer, weights_path) = tokio::task::spawn_blocking(move || {
            use hf_hub::{Repo, RepoType};

            let api = match cache_dir {
                Some(dir) => ApiBuilder::new()
                    .with_cache_dir(dir.into())
                    .build()
                    .map_err(|e| EmbedError::Download(format!("API init: {e}")))?,
                None => Api::new().map_err(|e| EmbedError::Download(format!("API init: {e}")))?,
            };
            let repo = api.repo(Repo::new(model_id, RepoType::Model));

            let config_path = repo
                .get("config.json")
                .map_err(|e| EmbedError::Download(format!("config.json: {e}")))?;
            let bert_config = load_bert_config(&config_path)?;

            // tokenizer.json is the modern format; older BERT checkpoints
            // only ship vocab.txt.
            let tokenizer = match repo.get("tokenizer.json") {
                Ok(path) => {
                    Tokenizer::from_file(&path).map_err(|e| EmbedError::Tokenizer(e.to_string()))?
                }
                Err(_) => {
                    let vocab_path = repo
                        .get("vocab.txt")
                        .map_err(|e| EmbedError::Download(format!("vocab.txt: {e}")))?;
                    wordpiece_from_vocab(&vocab_path)?
                }
            };

            let weights_path = repo
                .get("model.safetensors")
                .or_else(|_| repo.get("pytorch_model.bin"))
                .map_err(|e| EmbedError::Download(format!("model weights: {e}")))?;

            Ok::<_, EmbedError>((bert_config, tokenizer, weights_path))
        })
        .await
        .map_err(|e| EmbedError::Download(e.to_string()))??;

        let vb = if weights_path.extension().is_some_and(|e| e == "safetensors") {
            unsafe { VarBuilder::from_mmaped_safetensors(&[&weights_path], DType::F32, &device)? }
        } else {
            VarBuilder::from_pth(&weights_path, DType::F32, &device)?
        };
        let dimension = bert_config.hidden_size;
        let model = BertModel::load(vb, &bert_config)?;
        info!(
            dimension,
            elapsed_s = start.elapsed().as_secs_f32(),
            "embedding model loaded"
        );

        Ok(Self { model, tokenizer, device, config, dimension })
    }

    /// Output vector dimension, fixed by the loaded checkpoint.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn model_id(&self) -> &str {
        &self.config.model_id
    }

    fn encode_batch(&self, sentences: &[String]) -> Result<Vec<Vec<f32>>, EmbedError> {
        let refs: Vec<&str> = sentences.iter().map(String::as_str).collect();
        let encodings = self
            .tokenizer
            .encode_batch(refs, true)
            .map_err(|e| EmbedError::Tokenizer(e.to_string()))?;

        let max_allowed = self.config.max_length.min(512);
        let mut ids = Vec::with_capacity(sentences.len());
        let mut masks = Vec::with_capacity(sentences.len());
        let mut type_ids = Vec::with_capacity(sentences.len());
        for encoding in &encodings {
            let len = encoding.get_ids().len().min(max_allowed);
            ids.push(encoding.get_ids()[..len].to_vec());
            masks.push(encoding.get_attention_mask()[..len].to_vec());
            type_ids.push(encoding.get_type_ids()[..len].to_vec());
        }

        let max_len = ids.iter().map(Vec::len).max().unwrap_or(0);
        for ((id, mask), type_id) in ids.iter_mut().zip(masks.iter_mut()).zip(type_ids.iter_mut()) {
            let pad = max_len - id.len();
            id.extend(std::iter::repeat_n(0, pad));
            mask.extend(std::iter::repeat_n(0, pad));
            type_id.extend(std::iter::repeat_n(0, pad));
        }

        let batch = sentences.len();
        let input_ids = Tensor::new(ids, &self.device)?.reshape((batch, max_len))?;
        let attention_mask = Tensor::new(masks, &self.device)?
            .reshape((batch, max_len))?
            .to_dtype(DType::F32)?;
        let token_type_ids = Tensor::new(type_ids, &self.device)?.reshape((batch, max_len))?;

        let hidden = self
            .model
            .forward(&input_ids, &token_type_ids, Some(&attention_mask))?;
        let pooled = self.config.pooling.apply(&hidden, &attention_mask)?;
        let pooled = if self.config.normalize {
            l2_normalize(&pooled)?
        } else {
            pooled
        };
        Ok(pooled.to_vec2::<f32>()?)
    }
}

#[async_trait]
impl EmbeddingCapability for BertSentenceEmbedder {
    async fn embed(&self, sentences: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        if sentences.is_empty() {
            return Ok(Vec::new());
        }
        let start = Instant::now();
        let mut vectors = Vec::with_capacity(sentences.len());
        for batch in sentences.chunks(self.config.batch_size.max(1)) {
            vectors.extend(self.encode_batch(batch)?);
        }
        debug!(
            sentences = sentences.len(),
            elapsed_ms = start.elapsed().as_secs_f32() * 1000.0,
            "sentences embedded"
        );
        Ok(vectors)
    }
}

fn load_bert_config(path: &Path) -> Result<Config, EmbedError> {
    let content = std::fs::read_to_string(path)?;
    let json: serde_json::Value = serde_json::from_str(&content)?;

    let hidden_act = match json.get("hidden_act").and_then(|v| v.as_str()) {
        Some("relu") => HiddenAct::Relu,
        Some("gelu_new") | Some("gelu_approximate") => HiddenAct::GeluApproximate,
        _ => HiddenAct::Gelu,
    };
    let get_usize = |key: &str, default: u64| {
        json.get(key).and_then(|v| v.as_u64()).unwrap_or(default) as usize
    };
    let get_f64 =
        |key: &str, default: f64| json.get(key).and_then(|v| v.as_f64()).unwrap_or(default);

    Ok(Config {
        vocab_size: get_usize("vocab_size", 30522),
        hidden_size: get_usize("hidden_size", 384),
        num_hidden_layers: get_usize("num_hidden_layers", 6),
        num_attention_heads: get_usize("num_attention_heads", 12),
        intermediate_size: get_usize("intermediate_size", 1536),
        hidden_act,
        hidden_dropout_prob: get_f64("hidden_dropout_prob", 0.1),
        max_position_embeddings: get_usize("max_position_embeddings", 512),
        type_vocab_size: get_usize("type_vocab_size", 2),
        initializer_range: get_f64("initializer_range", 0.02),
        layer_norm_eps: get_f64("layer_norm_eps", 1e-12),
        pad_token_id: get_usize("pad_token_id", 0),
        position_embedding_type: PositionEmbeddingType::Absolute,
        use_cache: true,
        classifier_dropout: None,
        model_type: None,
    })
}

fn wordpiece_from_vocab(vocab_path: &Path) -> Result<Tokenizer, EmbedError> {
    let vocab_content = std::fs::read_to_string(vocab_path)?;
    let vocab: ahash::AHashMap<String, u32> = vocab_content
        .lines()
        .enumerate()
        .map(|(i, line)| (line.to_string(), i as u32))
        .collect();
    let wordpiece = WordPieceBuilder::new()
        .vocab(vocab)
        .continuing_subword_prefix("##".to_string())
        .max_input_chars_per_word(100)
        .unk_token("[UNK]".to_string())
        .build()
        .map_err(|e| EmbedError::Tokenizer(format!("WordPiece build: {e}")))?;
    Ok(Tokenizer::new(wordpiece))
}
