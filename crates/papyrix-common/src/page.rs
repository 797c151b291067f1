//! Source documents and rasterized page images.

use std::path::{Path, PathBuf};

use image::DynamicImage;

use crate::error::Result;

/// A PDF handed to the pipeline. Identity is the file path; the bytes are
/// read once by the caller and never mutated by the pipeline.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    path: PathBuf,
    bytes: Vec<u8>,
}

impl SourceDocument {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let bytes = std::fs::read(&path)?;
        Ok(Self { path, bytes })
    }

    /// Construct from in-memory bytes. The path is still the identity and
    /// need not exist on disk.
    pub fn from_bytes(path: impl Into<PathBuf>, bytes: Vec<u8>) -> Self {
        Self { path: path.into(), bytes }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Document identity as used in records and error context.
    pub fn identity(&self) -> String {
        self.path.display().to_string()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// One rasterized PDF page. Ordinals are 1-based, contiguous, and follow
/// page order in the source document.
#[derive(Debug, Clone)]
pub struct PageImage {
    pub ordinal: u32,
    pub image: DynamicImage,
}

impl PageImage {
    pub fn new(ordinal: u32, image: DynamicImage) -> Self {
        Self { ordinal, image }
    }
}
