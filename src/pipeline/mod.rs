//! The reconstruction pipeline.
//!
//! ```text
//! PDF bytes
//!     ↓
//! [PageExtractor] (+ embeddings, thumbnail signatures)
//!     ↓
//! Corpus
//!     ├──────────────────────────────┐
//!     ↓                              ↓
//! [StructureClassifier]          [DuplicateDetector]
//! [SimilarityEngine]             [MissingPageAnalyzer]
//! [OrderPlanner]                     │ (scoped thread)
//!     ├──────────────────────────────┘
//!     ↓
//! [TocBuilder]
//!     ↓
//! [ReconstructionExporter] → reconstructed.pdf
//! [report::render_all]     → log.json, report.html, toc.json, duplicates_missing.json
//!     ↓
//! published together once every file is staged
//! ```
//!
//! Cancellation is checked before every stage. Fatal errors are attributed to
//! the stage that raised them; per-page problems only degrade the analysis.

mod stage;

pub use stage::{CancellationToken, Stage, StageLog, LOG_TARGET};

use crate::analysis::{
    attach_signatures, DuplicateDetector, DuplicateGroup, EmbeddingSet, MissingGap, MissingPageAnalyzer,
    ThumbnailSource,
};
use crate::classify::{Classification, StructureClassifier};
use crate::config::ReconstructConfig;
use crate::corpus::Corpus;
use crate::error::{Error, Result};
use crate::export::report::render_all;
use crate::export::{ReconstructionExporter, StagedFiles};
use crate::extract::PageExtractor;
use crate::order::{OrderPlanner, OrderResult};
use crate::similarity::SimilarityEngine;
use crate::toc::{TocBuilder, TocEntry};
use std::path::{Path, PathBuf};

/// File name of the reconstructed document inside the output directory.
pub const OUTPUT_FILE: &str = "reconstructed.pdf";

/// Everything a run derived from the corpus.
#[derive(Debug, Clone)]
pub struct ReconstructionOutcome {
    /// The analysed pages
    pub corpus: Corpus,
    /// Per-page roles and numbers, index-aligned with the corpus
    pub classifications: Vec<Classification>,
    /// Planned order
    pub order: OrderResult,
    /// Near-duplicate groups
    pub duplicates: Vec<DuplicateGroup>,
    /// Missing page numbers
    pub missing: Vec<MissingGap>,
    /// Outline in original index space
    pub toc: Vec<TocEntry>,
    /// Whether the exported document starts with a TOC page
    pub toc_embedded: bool,
}

impl ReconstructionOutcome {
    /// Number of pages inserted ahead of the content pages on export.
    pub fn toc_offset(&self) -> usize {
        usize::from(self.toc_embedded)
    }
}

/// Runs the full reconstruction of one document.
pub struct Reconstructor {
    config: ReconstructConfig,
    cancel: CancellationToken,
    embeddings: Option<EmbeddingSet>,
    thumbnails: Option<Box<dyn ThumbnailSource + Send + Sync>>,
}

impl Default for Reconstructor {
    fn default() -> Self {
        Self::new(ReconstructConfig::default())
    }
}

impl Reconstructor {
    /// Create a reconstructor with the given configuration.
    pub fn new(config: ReconstructConfig) -> Self {
        Self {
            config,
            cancel: CancellationToken::new(),
            embeddings: None,
            thumbnails: None,
        }
    }

    /// Share a cancellation token with the caller.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Supply per-page embedding vectors.
    pub fn with_embeddings(mut self, embeddings: EmbeddingSet) -> Self {
        self.embeddings = Some(embeddings);
        self
    }

    /// Supply page thumbnails for perceptual signatures.
    pub fn with_thumbnails(mut self, source: impl ThumbnailSource + Send + Sync + 'static) -> Self {
        self.thumbnails = Some(Box::new(source));
        self
    }

    /// The configuration in use.
    pub fn config(&self) -> &ReconstructConfig {
        &self.config
    }

    /// Token that cancels this reconstructor's runs.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    fn checkpoint(&self, stage: Stage) -> Result<()> {
        if self.cancel.is_cancelled() {
            StageLog::new(stage).warn(format_args!("cancelled"));
            return Err(Error::Cancelled { stage });
        }
        Ok(())
    }

    /// Extract the corpus from PDF bytes and attach the supplied page inputs.
    pub fn extract(&self, source: &[u8]) -> Result<Corpus> {
        self.checkpoint(Stage::Extraction)?;
        let mut corpus = PageExtractor::new()
            .extract(source)
            .map_err(|e| e.in_stage(Stage::Extraction))?;

        if self.config.embeddings {
            if let Some(embeddings) = &self.embeddings {
                corpus = embeddings.attach(corpus);
            }
        }
        if self.config.phash {
            if let Some(thumbnails) = &self.thumbnails {
                corpus = attach_signatures(corpus, thumbnails.as_ref());
            }
        }
        Ok(corpus)
    }

    /// Run every analysis stage over a corpus.
    pub fn analyze(&self, corpus: Corpus) -> Result<ReconstructionOutcome> {
        let config = &self.config;

        self.checkpoint(Stage::Classification)?;
        let classifications = StructureClassifier::new()
            .with_verbose(config.debug)
            .classify_corpus(&corpus);

        self.checkpoint(Stage::Similarity)?;
        let engine = SimilarityEngine::new().with_embeddings(config.embeddings);
        let planner = OrderPlanner::from_config(config);
        let detector = DuplicateDetector::new(config.hamming_threshold, config.jaccard_threshold)
            .with_signatures(config.phash);
        let analyzer = MissingPageAnalyzer::new(config.missing_min_fraction);

        let (order, duplicates, missing) = std::thread::scope(|scope| -> Result<_> {
            let side = scope.spawn(|| (detector.detect(&corpus), analyzer.analyze(&classifications)));

            let similarity = engine.build(&corpus);
            self.checkpoint(Stage::Ordering)?;
            let order = planner.plan(&classifications, &similarity);

            let (duplicates, missing) = side.join().unwrap_or_else(|_| {
                StageLog::new(Stage::Duplicates).warn(format_args!("analysis thread panicked; no results"));
                (Vec::new(), Vec::new())
            });
            Ok((order, duplicates, missing))
        })?;

        self.checkpoint(Stage::Toc)?;
        let toc = TocBuilder::new().build(&corpus);
        let toc_embedded = config.embed_toc && !toc.is_empty();

        Ok(ReconstructionOutcome {
            corpus,
            classifications,
            order,
            duplicates,
            missing,
            toc,
            toc_embedded,
        })
    }

    /// Analyse `source` and return the outcome with the reordered document.
    pub fn reconstruct_bytes(&self, source: &[u8]) -> Result<(ReconstructionOutcome, Vec<u8>)> {
        let outcome = self.analyze(self.extract(source)?)?;

        self.checkpoint(Stage::Export)?;
        let bytes = self
            .exporter(&outcome)
            .export_bytes(source, &outcome.order.order, &outcome.toc)
            .map_err(|e| e.in_stage(Stage::Export))?;
        Ok((outcome, bytes))
    }

    /// Analyse `source` and write `reconstructed.pdf` (and reports) into `output_dir`.
    ///
    /// The document and the reports are staged first and only published once
    /// all of them were written, so a failed or cancelled run leaves none of
    /// them behind. Returns the outcome and the path of the reconstructed
    /// document.
    pub fn reconstruct_to_dir(
        &self,
        source: &[u8],
        output_dir: impl AsRef<Path>,
    ) -> Result<(ReconstructionOutcome, PathBuf)> {
        let output_dir = output_dir.as_ref();
        let outcome = self.analyze(self.extract(source)?)?;

        self.checkpoint(Stage::Export)?;
        let bytes = self
            .exporter(&outcome)
            .export_bytes(source, &outcome.order.order, &outcome.toc)
            .map_err(|e| e.in_stage(Stage::Export))?;
        let mut staged = StagedFiles::new(output_dir).map_err(|e| e.in_stage(Stage::Export))?;
        let path = staged
            .add(OUTPUT_FILE, &bytes)
            .map_err(|e| e.in_stage(Stage::Export))?;

        if self.config.reports {
            self.checkpoint(Stage::Report)?;
            for (name, report) in render_all(&outcome).map_err(|e| e.in_stage(Stage::Report))? {
                staged
                    .add(name, &report)
                    .map_err(|e| e.in_stage(Stage::Report))?;
            }
        }

        let last_stage = if self.config.reports { Stage::Report } else { Stage::Export };
        let published = staged.commit().map_err(|e| e.in_stage(last_stage))?;
        StageLog::new(Stage::Report).info(format_args!(
            "published {} files; reconstructed {} pages with {} (confidence {:.2})",
            published.len(),
            outcome.corpus.len(),
            outcome.order.strategy.name(),
            outcome.order.confidence
        ));
        Ok((outcome, path))
    }

    fn exporter(&self, outcome: &ReconstructionOutcome) -> ReconstructionExporter {
        ReconstructionExporter::new().with_toc(outcome.toc_embedded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbered_corpus() -> Corpus {
        Corpus::from_texts([
            "second body\nPage 2",
            "first body\nPage 1",
            "third body\nPage 3",
        ])
    }

    #[test]
    fn test_analyze_orders_by_number() {
        let outcome = Reconstructor::default().analyze(numbered_corpus()).unwrap();
        assert_eq!(outcome.order.order, vec![1, 0, 2]);
        assert_eq!(outcome.classifications.len(), 3);
        assert!(outcome.missing.is_empty());
        assert!(outcome.toc_embedded);
        assert_eq!(outcome.toc_offset(), 1);
    }

    #[test]
    fn test_toc_not_embedded_when_disabled() {
        let reconstructor = Reconstructor::new(ReconstructConfig::new().with_embed_toc(false));
        let outcome = reconstructor.analyze(numbered_corpus()).unwrap();
        assert!(!outcome.toc.is_empty());
        assert_eq!(outcome.toc_offset(), 0);
    }

    #[test]
    fn test_cancelled_before_classification() {
        let token = CancellationToken::new();
        let reconstructor = Reconstructor::default().with_cancellation(token.clone());
        token.cancel();
        let err = reconstructor.analyze(numbered_corpus()).unwrap_err();
        assert!(matches!(
            err,
            Error::Cancelled {
                stage: Stage::Classification
            }
        ));
    }

    #[test]
    fn test_garbage_input_is_extraction_error() {
        let err = Reconstructor::default().extract(b"garbage").unwrap_err();
        assert_eq!(err.stage(), Some(Stage::Extraction));
    }
}
