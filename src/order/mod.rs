//! Page order planning.
//!
//! The planner runs a cascade of pluggable strategies and keeps the first one
//! that qualifies for the document:
//!
//! - [`NumberingStrategy`]: sort by printed page numbers
//! - [`StructuralStrategy`]: group pages by their structural role
//! - [`SimilarityChainStrategy`]: greedy walk over the similarity matrix
//!
//! Whatever a strategy proposes is repaired into a permutation of `0..N`
//! before it is returned, so [`OrderResult::order`] is always a bijection.

mod chain;
mod numbering;
mod structural;

pub use chain::SimilarityChainStrategy;
pub use numbering::NumberingStrategy;
pub use structural::StructuralStrategy;

use crate::classify::Classification;
use crate::config::ReconstructConfig;
use crate::pipeline::{Stage, StageLog};
use crate::similarity::SimilarityMatrix;
use serde::Serialize;

/// Which strategy produced an order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PlanStrategy {
    /// Printed page numbers
    ExplicitNumbering {
        /// Pages carrying a number
        numbered: usize,
    },
    /// Role buckets
    Structural {
        /// Pages with a known role
        classified: usize,
    },
    /// Greedy similarity walk
    SimilarityChain {
        /// Page the walk started from
        seed: usize,
    },
    /// No strategy applied; source order kept
    OriginalOrder,
}

impl PlanStrategy {
    /// Short name of the strategy.
    pub fn name(&self) -> &'static str {
        match self {
            PlanStrategy::ExplicitNumbering { .. } => "explicit_numbering",
            PlanStrategy::Structural { .. } => "structural",
            PlanStrategy::SimilarityChain { .. } => "similarity_chain",
            PlanStrategy::OriginalOrder => "original_order",
        }
    }
}

/// Best-guess page order for a document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderResult {
    /// Permutation of original page indices, in reading order
    pub order: Vec<usize>,
    /// Self-reported confidence in [0, 1]
    pub confidence: f32,
    /// Human-readable description of how the order was derived
    pub reasoning: String,
    /// Strategy that produced the order
    pub strategy: PlanStrategy,
}

impl OrderResult {
    /// Output position of an original page index.
    pub fn position_of(&self, original_index: usize) -> Option<usize> {
        self.order.iter().position(|&i| i == original_index)
    }
}

/// Proposal from a single strategy, before validation.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    /// Proposed order (may be invalid)
    pub order: Vec<usize>,
    /// Proposed confidence
    pub confidence: f32,
    /// Reasoning text
    pub reasoning: String,
    /// Strategy tag
    pub strategy: PlanStrategy,
}

/// Everything a strategy may look at.
#[derive(Debug, Clone, Copy)]
pub struct PlanningContext<'a> {
    /// Per-page classification, index-aligned with the corpus
    pub classifications: &'a [Classification],
    /// Pairwise similarity
    pub similarity: &'a SimilarityMatrix,
}

impl<'a> PlanningContext<'a> {
    /// Create a context.
    pub fn new(classifications: &'a [Classification], similarity: &'a SimilarityMatrix) -> Self {
        Self {
            classifications,
            similarity,
        }
    }

    /// Number of pages.
    pub fn len(&self) -> usize {
        self.classifications.len()
    }

    /// Whether there are no pages.
    pub fn is_empty(&self) -> bool {
        self.classifications.is_empty()
    }
}

/// A single ordering strategy in the cascade.
pub trait OrderStrategy: Send + Sync {
    /// Propose an order, or `None` if the strategy does not apply.
    fn plan(&self, context: &PlanningContext<'_>) -> Option<Candidate>;

    /// Return the name of this strategy for debugging.
    fn name(&self) -> &'static str;
}

/// Outcome of permutation repair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepairedOrder {
    /// A valid permutation of `0..n`
    pub order: Vec<usize>,
    /// Out-of-range or repeated entries removed
    pub dropped: usize,
    /// Missing indices appended
    pub appended: usize,
}

impl RepairedOrder {
    /// Whether the candidate needed any change.
    pub fn was_repaired(&self) -> bool {
        self.dropped > 0 || self.appended > 0
    }
}

/// Turn any candidate into a permutation of `0..n`.
///
/// Keeps the first occurrence of each in-range index, drops everything else,
/// then appends the indices that never appeared in ascending order.
pub fn repair_permutation(candidate: &[usize], n: usize) -> RepairedOrder {
    let mut seen = vec![false; n];
    let mut order = Vec::with_capacity(n);
    let mut dropped = 0;

    for &index in candidate {
        if index < n && !seen[index] {
            seen[index] = true;
            order.push(index);
        } else {
            dropped += 1;
        }
    }

    let before = order.len();
    order.extend((0..n).filter(|&i| !seen[i]));
    let appended = order.len() - before;

    RepairedOrder {
        order,
        dropped,
        appended,
    }
}

/// Runs the strategy cascade.
pub struct OrderPlanner {
    strategies: Vec<Box<dyn OrderStrategy>>,
}

impl Default for OrderPlanner {
    fn default() -> Self {
        Self::new()
    }
}

impl OrderPlanner {
    /// Planner with the default cascade and thresholds.
    pub fn new() -> Self {
        Self::from_config(&ReconstructConfig::default())
    }

    /// Planner with thresholds taken from configuration.
    pub fn from_config(config: &ReconstructConfig) -> Self {
        Self::with_strategies(vec![
            Box::new(NumberingStrategy::new(config.numbering_threshold)),
            Box::new(StructuralStrategy::new(config.structure_threshold)),
            Box::new(SimilarityChainStrategy::new()),
        ])
    }

    /// Planner with a custom cascade, tried in the given order.
    pub fn with_strategies(strategies: Vec<Box<dyn OrderStrategy>>) -> Self {
        Self { strategies }
    }

    /// Plan the page order.
    pub fn plan(
        &self,
        classifications: &[Classification],
        similarity: &SimilarityMatrix,
    ) -> OrderResult {
        let log = StageLog::new(Stage::Ordering);
        let context = PlanningContext::new(classifications, similarity);
        let n = context.len();

        if n == 0 {
            return OrderResult {
                order: Vec::new(),
                confidence: 0.0,
                reasoning: "Document has no pages".to_string(),
                strategy: PlanStrategy::OriginalOrder,
            };
        }

        let candidate = self
            .strategies
            .iter()
            .find_map(|strategy| {
                let candidate = strategy.plan(&context);
                if candidate.is_none() {
                    log.info(format_args!("{} does not apply", strategy.name()));
                }
                candidate
            })
            .unwrap_or_else(|| Candidate {
                order: (0..n).collect(),
                confidence: 0.0,
                reasoning: "No ordering strategy applied; pages kept in source order".to_string(),
                strategy: PlanStrategy::OriginalOrder,
            });

        let repaired = repair_permutation(&candidate.order, n);
        let mut reasoning = candidate.reasoning;
        if repaired.was_repaired() {
            log.warn(format_args!(
                "{} proposed an invalid order: dropped {}, appended {}",
                candidate.strategy.name(),
                repaired.dropped,
                repaired.appended
            ));
            reasoning.push_str(&format!(
                " (order repaired: {} entries dropped, {} pages appended)",
                repaired.dropped, repaired.appended
            ));
        }

        let confidence = if candidate.confidence.is_finite() {
            candidate.confidence.clamp(0.0, 1.0)
        } else {
            0.0
        };

        log.info(format_args!(
            "strategy={} confidence={:.2}",
            candidate.strategy.name(),
            confidence
        ));

        OrderResult {
            order: repaired.order,
            confidence,
            reasoning,
            strategy: candidate.strategy,
        }
    }
}
