//! Pairwise page similarity.
//!
//! Two pages that both carry an embedding are compared by cosine similarity;
//! any other pair falls back to lexical token overlap. Values are clamped to
//! [0, 1] and the matrix is symmetric with a unit diagonal.

use crate::corpus::{Corpus, Page};
use crate::pipeline::{Stage, StageLog};
use std::collections::HashSet;

/// Symmetric N×N similarity matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityMatrix {
    size: usize,
    values: Vec<f32>,
}

impl SimilarityMatrix {
    /// Identity matrix of the given size.
    pub fn identity(size: usize) -> Self {
        let mut values = vec![0.0; size * size];
        for i in 0..size {
            values[i * size + i] = 1.0;
        }
        Self { size, values }
    }

    /// Number of pages covered.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Similarity between pages `a` and `b`.
    pub fn get(&self, a: usize, b: usize) -> f32 {
        self.values[a * self.size + b]
    }

    fn set_pair(&mut self, a: usize, b: usize, value: f32) {
        self.values[a * self.size + b] = value;
        self.values[b * self.size + a] = value;
    }

    /// Mean similarity of page `a` to every other page (0 for a single page).
    pub fn average(&self, a: usize) -> f32 {
        if self.size < 2 {
            return 0.0;
        }
        let sum: f32 = (0..self.size).filter(|&b| b != a).map(|b| self.get(a, b)).sum();
        sum / (self.size - 1) as f32
    }
}

/// Builds similarity matrices from a corpus.
#[derive(Debug, Clone)]
pub struct SimilarityEngine {
    use_embeddings: bool,
}

impl Default for SimilarityEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl SimilarityEngine {
    /// Engine that uses embeddings when both pages carry one.
    pub fn new() -> Self {
        Self {
            use_embeddings: true,
        }
    }

    /// Enable or disable the embedding path.
    pub fn with_embeddings(mut self, enable: bool) -> Self {
        self.use_embeddings = enable;
        self
    }

    /// Similarity of two pages.
    pub fn similarity(&self, a: &Page, b: &Page) -> f32 {
        if self.use_embeddings {
            if let (Some(ea), Some(eb)) = (a.embedding(), b.embedding()) {
                return cosine_similarity(ea, eb).max(0.0);
            }
        }
        token_overlap(a.text(), b.text())
    }

    /// Build the full matrix for a corpus.
    pub fn build(&self, corpus: &Corpus) -> SimilarityMatrix {
        let log = StageLog::new(Stage::Similarity);
        let n = corpus.len();
        let with_embeddings = corpus.embedding_count();
        if self.use_embeddings && with_embeddings < n {
            log.warn(format_args!(
                "{} of {} pages lack embeddings, using token overlap for them",
                n - with_embeddings,
                n
            ));
        }

        let tokens: Vec<HashSet<String>> = corpus.iter().map(|p| tokenize(p.text())).collect();
        let pages = corpus.pages();

        let mut matrix = SimilarityMatrix::identity(n);
        for a in 0..n {
            for b in (a + 1)..n {
                let value = match (self.use_embeddings, pages[a].embedding(), pages[b].embedding()) {
                    (true, Some(ea), Some(eb)) => cosine_similarity(ea, eb).max(0.0),
                    _ => jaccard(&tokens[a], &tokens[b]),
                };
                matrix.set_pair(a, b, value.clamp(0.0, 1.0));
            }
        }

        log.info(format_args!("built {}x{} similarity matrix", n, n));
        matrix
    }
}

/// Cosine similarity; 0 for zero vectors or mismatched lengths.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// Shared lowercase whitespace tokens divided by the union of tokens.
pub fn token_overlap(a: &str, b: &str) -> f32 {
    jaccard(&tokenize(a), &tokenize(b))
}

pub(crate) fn tokenize(text: &str) -> HashSet<String> {
    text.split_whitespace().map(str::to_lowercase).collect()
}

pub(crate) fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f32 {
    let union = a.union(b).count();
    if union == 0 {
        return 0.0;
    }
    a.intersection(b).count() as f32 / union as f32
}
