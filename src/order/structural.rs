//! Ordering by structural role.

use super::{Candidate, OrderStrategy, PlanStrategy, PlanningContext};
use crate::classify::PageRole;

/// Confidence ceiling for role-based ordering.
const MAX_CONFIDENCE: f32 = 0.8;

/// Groups pages into a fixed sequence of role buckets.
///
/// Bucket order: title, toc, abstract, introduction, chapter, everything else
/// (in source order), conclusion, references, appendix, index. Applies when at
/// least `threshold` of the pages have a known role.
#[derive(Debug, Clone)]
pub struct StructuralStrategy {
    threshold: f32,
}

impl StructuralStrategy {
    /// Create the strategy with a minimum classified fraction.
    pub fn new(threshold: f32) -> Self {
        Self { threshold }
    }
}

/// Bucket rank of a role; lower ranks come first.
pub(crate) fn bucket_rank(role: PageRole) -> u8 {
    match role {
        PageRole::Title => 0,
        PageRole::Toc => 1,
        PageRole::Abstract => 2,
        PageRole::Introduction => 3,
        PageRole::Chapter => 4,
        PageRole::Section | PageRole::Content | PageRole::Unknown => 5,
        PageRole::Conclusion => 6,
        PageRole::References => 7,
        PageRole::Appendix => 8,
        PageRole::Index => 9,
    }
}

impl OrderStrategy for StructuralStrategy {
    fn plan(&self, context: &PlanningContext<'_>) -> Option<Candidate> {
        let n = context.len();
        if n == 0 {
            return None;
        }

        let classified = context
            .classifications
            .iter()
            .filter(|c| c.role.is_known())
            .count();
        let fraction = classified as f32 / n as f32;
        if classified == 0 || fraction < self.threshold {
            return None;
        }

        // Stable sort keeps source order inside each bucket.
        let mut order: Vec<usize> = context.classifications.iter().map(|c| c.index).collect();
        order.sort_by_key(|&index| bucket_rank(context.classifications[index].role));

        Some(Candidate {
            order,
            confidence: (fraction * MAX_CONFIDENCE).min(MAX_CONFIDENCE),
            reasoning: format!(
                "Grouped pages by structural role ({} of {} pages classified): \
                 front matter, body in source order, then back matter",
                classified, n
            ),
            strategy: PlanStrategy::Structural { classified },
        })
    }

    fn name(&self) -> &'static str {
        "StructuralStrategy"
    }
}
