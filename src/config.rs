//! Configuration for document reconstruction.
//!
//! [`ReconstructConfig`] can be built in code with the `with_*` setters or
//! loaded from a `config.json` file whose keys use camelCase
//! (`jaccardThreshold`, `hammingThreshold`, `embedToc`, ...). Missing keys keep
//! their defaults.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Reconstruction configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ReconstructConfig {
    /// Use embedding vectors for similarity when they are supplied.
    pub embeddings: bool,

    /// Use perceptual image signatures for duplicate detection when available.
    pub phash: bool,

    /// Insert a linked table of contents page in the exported document.
    pub embed_toc: bool,

    /// Minimum Jaccard similarity for two pages to count as text duplicates.
    pub jaccard_threshold: f32,

    /// Maximum Hamming distance for two signatures to count as image duplicates.
    pub hamming_threshold: u32,

    /// Fraction of numbered pages required to order by explicit numbers.
    pub numbering_threshold: f32,

    /// Fraction of classified pages required to order by structure.
    pub structure_threshold: f32,

    /// Fraction of numbered pages required before gaps are reported.
    pub missing_min_fraction: f32,

    /// Write human-readable and JSON reports next to the output.
    pub reports: bool,

    /// Emit per-page debug records.
    pub debug: bool,
}

impl Default for ReconstructConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl ReconstructConfig {
    /// Create new configuration with defaults.
    pub fn new() -> Self {
        Self {
            embeddings: true,
            phash: true,
            embed_toc: true,
            jaccard_threshold: 0.9,
            hamming_threshold: 6,
            numbering_threshold: 0.7,
            structure_threshold: 0.6,
            missing_min_fraction: 0.5,
            reports: true,
            debug: false,
        }
    }

    /// Load configuration from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&data)
    }

    /// Parse configuration from a JSON string and validate it.
    pub fn from_json_str(data: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(data)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that every fraction lies in [0, 1].
    pub fn validate(&self) -> Result<()> {
        let fractions = [
            ("jaccardThreshold", self.jaccard_threshold),
            ("numberingThreshold", self.numbering_threshold),
            ("structureThreshold", self.structure_threshold),
            ("missingMinFraction", self.missing_min_fraction),
        ];
        for (name, value) in fractions {
            if !(0.0..=1.0).contains(&value) {
                return Err(Error::Config(format!("{} must be within [0, 1], got {}", name, value)));
            }
        }
        Ok(())
    }

    /// Enable embedding-based similarity.
    pub fn with_embeddings(mut self, enable: bool) -> Self {
        self.embeddings = enable;
        self
    }

    /// Enable perceptual-hash duplicate detection.
    pub fn with_phash(mut self, enable: bool) -> Self {
        self.phash = enable;
        self
    }

    /// Enable the inserted TOC page.
    pub fn with_embed_toc(mut self, enable: bool) -> Self {
        self.embed_toc = enable;
        self
    }

    /// Set the text duplicate threshold.
    pub fn with_jaccard_threshold(mut self, threshold: f32) -> Self {
        self.jaccard_threshold = threshold;
        self
    }

    /// Set the image duplicate threshold.
    pub fn with_hamming_threshold(mut self, threshold: u32) -> Self {
        self.hamming_threshold = threshold;
        self
    }

    /// Set the explicit-numbering threshold.
    pub fn with_numbering_threshold(mut self, threshold: f32) -> Self {
        self.numbering_threshold = threshold;
        self
    }

    /// Set the structural-ordering threshold.
    pub fn with_structure_threshold(mut self, threshold: f32) -> Self {
        self.structure_threshold = threshold;
        self
    }

    /// Set the minimum numbered fraction for gap analysis.
    pub fn with_missing_min_fraction(mut self, fraction: f32) -> Self {
        self.missing_min_fraction = fraction;
        self
    }

    /// Enable report artifacts.
    pub fn with_reports(mut self, enable: bool) -> Self {
        self.reports = enable;
        self
    }

    /// Enable per-page debug records.
    pub fn with_debug(mut self, enable: bool) -> Self {
        self.debug = enable;
        self
    }
}
