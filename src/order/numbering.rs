//! Ordering by printed page numbers.

use super::{Candidate, OrderStrategy, PlanStrategy, PlanningContext};

/// Confidence ceiling for number-based ordering.
const MAX_CONFIDENCE: f32 = 0.95;

/// Sorts pages by their explicit page numbers.
///
/// Applies when at least `threshold` of the pages carry a number. Numbered
/// pages are sorted by number (ties by original index) into the positions
/// numbered pages occupied in the source; pages without a number keep their
/// source position.
#[derive(Debug, Clone)]
pub struct NumberingStrategy {
    threshold: f32,
}

impl NumberingStrategy {
    /// Create the strategy with a minimum numbered fraction.
    pub fn new(threshold: f32) -> Self {
        Self { threshold }
    }
}

impl OrderStrategy for NumberingStrategy {
    fn plan(&self, context: &PlanningContext<'_>) -> Option<Candidate> {
        let n = context.len();
        if n == 0 {
            return None;
        }

        let mut numbered: Vec<(u32, usize)> = context
            .classifications
            .iter()
            .filter_map(|c| c.number().map(|number| (number, c.index)))
            .collect();

        let fraction = numbered.len() as f32 / n as f32;
        if numbered.is_empty() || fraction < self.threshold {
            return None;
        }

        let slots: Vec<usize> = numbered.iter().map(|&(_, index)| index).collect();
        numbered.sort();

        let mut order: Vec<usize> = (0..n).collect();
        for (&slot, &(_, index)) in slots.iter().zip(&numbered) {
            order[slot] = index;
        }

        let repeated = numbered.windows(2).filter(|w| w[0].0 == w[1].0).count();
        let mut reasoning = format!(
            "Ordered by printed page numbers found on {} of {} pages",
            numbered.len(),
            n
        );
        if repeated > 0 {
            reasoning.push_str(&format!("; {} repeated numbers kept in source order", repeated));
        }
        if numbered.len() < n {
            reasoning.push_str("; unnumbered pages kept in their source positions");
        }

        Some(Candidate {
            order,
            confidence: fraction.min(MAX_CONFIDENCE),
            reasoning,
            strategy: PlanStrategy::ExplicitNumbering {
                numbered: numbered.len(),
            },
        })
    }

    fn name(&self) -> &'static str {
        "NumberingStrategy"
    }
}
