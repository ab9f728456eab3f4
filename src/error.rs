//! Error types for the reconstruction pipeline.
//!
//! Only pipeline-fatal conditions are represented here. Per-page analysis
//! problems (missing embeddings, unreadable thumbnails, text that cannot be
//! extracted) are recovered where they happen and reported through the log.

use crate::pipeline::Stage;

/// Result type alias for reconstruction operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while reconstructing a document.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The input could not be read as a page corpus.
    #[error("Extraction failed: {0}")]
    Extraction(String),

    /// Writing the reconstructed document failed.
    #[error("Export failed: {0}")]
    Export(String),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Image decoding error
    #[error("Image error: {0}")]
    Image(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error raised by the PDF object layer
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A fatal error attributed to the pipeline stage that raised it.
    #[error("{stage} stage failed: {source}")]
    Stage {
        /// Stage that was running
        stage: Stage,
        /// Underlying cause
        #[source]
        source: Box<Error>,
    },

    /// The run was cancelled before the named stage started.
    #[error("Reconstruction cancelled before {stage} stage")]
    Cancelled {
        /// First stage that did not run
        stage: Stage,
    },
}

impl Error {
    /// Attribute this error to a pipeline stage.
    ///
    /// Errors that already carry a stage (or a cancellation) are returned as-is
    /// so the originating stage is never overwritten.
    pub fn in_stage(self, stage: Stage) -> Self {
        match self {
            Error::Stage { .. } | Error::Cancelled { .. } => self,
            other => Error::Stage {
                stage,
                source: Box::new(other),
            },
        }
    }

    /// The stage an error was attributed to, if any.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Error::Stage { stage, .. } | Error::Cancelled { stage } => Some(*stage),
            _ => None,
        }
    }
}
