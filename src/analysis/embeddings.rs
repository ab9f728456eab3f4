//! Per-page embedding vectors supplied by an external model.
//!
//! Two JSON layouts are accepted:
//!
//! ```json
//! {"0": [0.1, 0.2], "3": [0.0, 1.0]}
//! [[0.1, 0.2], null, null, [0.0, 1.0]]
//! ```
//!
//! Coverage may be partial; pages without a vector fall back to lexical
//! similarity.

use crate::corpus::Corpus;
use crate::error::{Error, Result};
use crate::pipeline::{Stage, StageLog};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Deserialize)]
#[serde(untagged)]
enum EmbeddingFile {
    Keyed(BTreeMap<String, Vec<f32>>),
    Positional(Vec<Option<Vec<f32>>>),
}

/// Embedding vectors keyed by original page index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmbeddingSet {
    vectors: BTreeMap<usize, Vec<f32>>,
}

impl EmbeddingSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the vector for a page.
    pub fn insert(&mut self, index: usize, vector: Vec<f32>) {
        self.vectors.insert(index, vector);
    }

    /// Vector for a page.
    pub fn get(&self, index: usize) -> Option<&[f32]> {
        self.vectors.get(&index).map(Vec::as_slice)
    }

    /// Number of vectors.
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    /// Whether the set holds no vectors.
    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Parse either JSON layout.
    pub fn from_json_str(data: &str) -> Result<Self> {
        let file: EmbeddingFile = serde_json::from_str(data)?;
        let vectors = match file {
            EmbeddingFile::Keyed(map) => map
                .into_iter()
                .map(|(key, vector)| {
                    key.trim()
                        .parse::<usize>()
                        .map(|index| (index, vector))
                        .map_err(|_| Error::Config(format!("invalid embedding page key '{}'", key)))
                })
                .collect::<Result<BTreeMap<_, _>>>()?,
            EmbeddingFile::Positional(list) => list
                .into_iter()
                .enumerate()
                .filter_map(|(index, vector)| vector.map(|v| (index, v)))
                .collect(),
        };
        Ok(Self { vectors })
    }

    /// Load from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        Self::from_json_str(&data)
    }

    /// Attach the vectors to matching pages.
    ///
    /// Vectors for pages outside the corpus, empty vectors and vectors whose
    /// dimension differs from the most common one are dropped with a warning.
    pub fn attach(&self, corpus: Corpus) -> Corpus {
        let log = StageLog::new(Stage::Similarity);

        for &index in self.vectors.keys().filter(|&&i| i >= corpus.len()) {
            log.page_warn(index, format_args!("embedding ignored: no such page"));
        }

        let dimension = self.dominant_dimension();
        let attached = corpus.map_pages(|page| match self.vectors.get(&page.index()) {
            Some(vector) if Some(vector.len()) == dimension => page.with_embedding(vector.clone()),
            Some(vector) => {
                log.page_warn(
                    page.index(),
                    format_args!("embedding ignored: dimension {} differs from {:?}", vector.len(), dimension),
                );
                page
            },
            None => page,
        });

        log.info(format_args!(
            "attached embeddings to {} of {} pages",
            attached.embedding_count(),
            attached.len()
        ));
        attached
    }

    /// Most common non-zero dimension; ties go to the smaller dimension.
    fn dominant_dimension(&self) -> Option<usize> {
        let mut counts: BTreeMap<usize, usize> = BTreeMap::new();
        for vector in self.vectors.values().filter(|v| !v.is_empty()) {
            *counts.entry(vector.len()).or_default() += 1;
        }
        let mut best: Option<(usize, usize)> = None;
        for (dimension, count) in counts {
            if best.map_or(true, |(_, c)| count > c) {
                best = Some((dimension, count));
            }
        }
        best.map(|(dimension, _)| dimension)
    }
}
