// Allow some clippy lints that are too pedantic for this project
#![allow(clippy::needless_range_loop)]
#![allow(clippy::unnecessary_map_or)]

//! # PDF Reconstruct
//!
//! Reconstructs PDFs whose pages were scanned or extracted out of order.
//!
//! ## Core Features
//!
//! - **Page Classification**: coarse structural roles and printed page numbers
//!   (footer/header/middle bands before full-text matching)
//! - **Order Planning**: a pluggable strategy cascade (explicit numbering,
//!   structural buckets, greedy similarity chain) that always yields a
//!   permutation, with confidence and reasoning
//! - **Duplicate Detection**: perceptual signatures or token Jaccard, grouped
//!   transitively
//! - **Missing Pages**: gaps in the printed numbering
//! - **Table of Contents**: page-complete outline from headings, keyword
//!   sections and filler entries
//! - **Re-export**: flattened, reordered page tree with an optional linked TOC
//!   page, written atomically
//!
//! ## Quick Start
//!
//! ```ignore
//! use pdf_reconstruct::{ReconstructConfig, Reconstructor};
//!
//! let source = std::fs::read("scrambled.pdf")?;
//! let reconstructor = Reconstructor::new(ReconstructConfig::default());
//! let (outcome, path) = reconstructor.reconstruct_to_dir(&source, "out")?;
//!
//! println!("{} -> {:?}", path.display(), outcome.order.order);
//! println!("{}", outcome.order.reasoning);
//! # Ok::<(), pdf_reconstruct::Error>(())
//! ```
//!
//! Callers that run OCR themselves build the [`Corpus`] directly and call
//! [`Reconstructor::analyze`].

// Error handling
pub mod error;

// Configuration
pub mod config;

// Page model and extraction
pub mod corpus;
pub mod extract;

// Analysis
pub mod analysis;
pub mod classify;
pub mod similarity;

// Ordering
pub mod order;

// Outline
pub mod toc;

// Output
pub mod export;

// Orchestration
pub mod pipeline;

pub use analysis::{DuplicateDetector, DuplicateGroup, EmbeddingSet, MissingGap, MissingPageAnalyzer, ThumbnailDir};
pub use classify::{Classification, PageRole, StructureClassifier};
pub use config::ReconstructConfig;
pub use corpus::{Corpus, Page};
pub use error::{Error, Result};
pub use export::{exported_page_index, ReconstructionExporter, ReportWriter};
pub use extract::PageExtractor;
pub use order::{OrderPlanner, OrderResult, OrderStrategy, PlanStrategy};
pub use pipeline::{CancellationToken, ReconstructionOutcome, Reconstructor, Stage};
pub use similarity::{SimilarityEngine, SimilarityMatrix};
pub use toc::{TocBuilder, TocEntry, TocSource};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
