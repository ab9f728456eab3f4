//! Pipeline stages, stage-scoped logging and cancellation.

use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Log target used for every pipeline record.
pub const LOG_TARGET: &str = "pdf_reconstruct";

/// A stage of the reconstruction pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Reading the source document into a corpus
    Extraction,
    /// Page role and explicit number classification
    Classification,
    /// Pairwise similarity matrix
    Similarity,
    /// Order planning
    Ordering,
    /// Near-duplicate grouping
    Duplicates,
    /// Gap analysis over explicit numbers
    MissingPages,
    /// Table of contents synthesis
    Toc,
    /// Writing the reordered document
    Export,
    /// Writing report artifacts
    Report,
}

impl Stage {
    /// Stable lowercase name used in log records and error messages.
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Extraction => "extraction",
            Stage::Classification => "classification",
            Stage::Similarity => "similarity",
            Stage::Ordering => "ordering",
            Stage::Duplicates => "duplicates",
            Stage::MissingPages => "missing_pages",
            Stage::Toc => "toc",
            Stage::Export => "export",
            Stage::Report => "report",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Stage-scoped logger.
///
/// Every record carries `stage=<name>` and, for per-page records,
/// `page=<index>`, so the log of a run can be filtered by either key.
#[derive(Debug, Clone, Copy)]
pub struct StageLog {
    stage: Stage,
    verbose: bool,
}

impl StageLog {
    /// Logger for `stage` with per-page debug records enabled.
    pub fn new(stage: Stage) -> Self {
        Self {
            stage,
            verbose: true,
        }
    }

    /// Enable or suppress per-page debug records.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// The stage this logger reports for.
    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Stage-level informational record.
    pub fn info(&self, message: fmt::Arguments<'_>) {
        log::info!(target: LOG_TARGET, "stage={} {}", self.stage, message);
    }

    /// Stage-level warning record.
    pub fn warn(&self, message: fmt::Arguments<'_>) {
        log::warn!(target: LOG_TARGET, "stage={} {}", self.stage, message);
    }

    /// Per-page debug record.
    pub fn page_debug(&self, page: usize, message: fmt::Arguments<'_>) {
        if self.verbose {
            log::debug!(target: LOG_TARGET, "stage={} page={} {}", self.stage, page, message);
        }
    }

    /// Per-page warning record; always emitted.
    pub fn page_warn(&self, page: usize, message: fmt::Arguments<'_>) {
        log::warn!(target: LOG_TARGET, "stage={} page={} {}", self.stage, page, message);
    }
}

/// Cooperative cancellation flag shared between a caller and a running pipeline.
///
/// The pipeline checks the token at each stage boundary.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a token that is not cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_names() {
        assert_eq!(Stage::MissingPages.to_string(), "missing_pages");
        assert_eq!(Stage::Toc.name(), "toc");
    }

    #[test]
    fn test_cancellation_is_shared() {
        let token = CancellationToken::new();
        let clone = token.clone();
        assert!(!token.is_cancelled());
        clone.cancel();
        assert!(token.is_cancelled());
    }
}
