//! Greedy similarity chain ordering.
//!
//! The walk never backtracks, so it finds a locally good sequence rather than
//! an optimal one.

use super::structural::bucket_rank;
use super::{Candidate, OrderStrategy, PlanStrategy, PlanningContext};
use crate::classify::PageRole;

/// Confidence ceiling for chain ordering.
const MAX_CONFIDENCE: f32 = 0.9;

/// Bonus for one chapter page following another.
const CHAPTER_CONTINUATION_BONUS: f32 = 0.1;

/// Bonus for back-matter transitions (conclusion → references → appendix).
const BACK_MATTER_BONUS: f32 = 0.2;

/// Walks from a seed page to its most similar unvisited neighbour.
#[derive(Debug, Clone, Default)]
pub struct SimilarityChainStrategy;

impl SimilarityChainStrategy {
    /// Create the strategy.
    pub fn new() -> Self {
        Self
    }
}

/// Extra score for role transitions expected late in a document.
pub fn transition_bonus(from: PageRole, to: PageRole) -> f32 {
    match (from, to) {
        (PageRole::Chapter, PageRole::Chapter) => CHAPTER_CONTINUATION_BONUS,
        (PageRole::Conclusion, PageRole::References) => BACK_MATTER_BONUS,
        (PageRole::References, PageRole::Appendix) => BACK_MATTER_BONUS,
        _ => 0.0,
    }
}

fn is_opening_role(role: PageRole) -> bool {
    matches!(role, PageRole::Title | PageRole::Abstract | PageRole::Introduction)
}

/// Pick the page the chain starts from.
///
/// Opening pages (title, abstract, introduction) win by role priority, then by
/// average similarity; without any, the most central page is used. Remaining
/// ties go to the lowest index.
fn choose_seed(context: &PlanningContext<'_>) -> usize {
    let n = context.len();
    let averages: Vec<f32> = (0..n).map(|i| context.similarity.average(i)).collect();

    let openings: Vec<usize> = (0..n)
        .filter(|&i| is_opening_role(context.classifications[i].role))
        .collect();
    let pool: Vec<usize> = if openings.is_empty() {
        (0..n).collect()
    } else {
        openings
    };

    let mut best = pool[0];
    for &candidate in &pool[1..] {
        let rank_best = bucket_rank(context.classifications[best].role);
        let rank_candidate = bucket_rank(context.classifications[candidate].role);
        let better = rank_candidate < rank_best
            || (rank_candidate == rank_best && averages[candidate] > averages[best]);
        if better {
            best = candidate;
        }
    }
    best
}

impl OrderStrategy for SimilarityChainStrategy {
    fn plan(&self, context: &PlanningContext<'_>) -> Option<Candidate> {
        let n = context.len();
        if n == 0 {
            return None;
        }

        let roles: Vec<PageRole> = context.classifications.iter().map(|c| c.role).collect();
        let seed = choose_seed(context);

        let mut visited = vec![false; n];
        let mut order = Vec::with_capacity(n);
        visited[seed] = true;
        order.push(seed);

        let mut current = seed;
        while order.len() < n {
            let mut best: Option<(usize, f32)> = None;
            for candidate in (0..n).filter(|&c| !visited[c]) {
                let score = context.similarity.get(current, candidate)
                    + transition_bonus(roles[current], roles[candidate]);
                if best.map_or(true, |(_, best_score)| score > best_score) {
                    best = Some((candidate, score));
                }
            }
            let Some((next, _)) = best else {
                break;
            };
            visited[next] = true;
            order.push(next);
            current = next;
        }

        let mean = if order.len() < 2 {
            1.0
        } else {
            let total: f32 = order
                .windows(2)
                .map(|w| context.similarity.get(w[0], w[1]))
                .sum();
            total / (order.len() - 1) as f32
        };

        Some(Candidate {
            order,
            confidence: mean.min(MAX_CONFIDENCE),
            reasoning: format!(
                "Chained pages by content similarity starting from page {} ({}); \
                 mean adjacent similarity {:.2}",
                seed + 1,
                roles[seed],
                mean
            ),
            strategy: PlanStrategy::SimilarityChain { seed },
        })
    }

    fn name(&self) -> &'static str {
        "SimilarityChainStrategy"
    }
}
