//! Gap analysis over explicit page numbers.

use crate::classify::Classification;
use crate::pipeline::{Stage, StageLog};
use serde::Serialize;
use std::collections::BTreeMap;

/// An expected page number that no page carries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MissingGap {
    /// The absent page number
    pub number: u32,
    /// Original index of the first page carrying the nearest lower number
    pub before_index: usize,
    /// Original index of the first page carrying the nearest higher number
    pub after_index: usize,
    /// Nearest present number below the gap
    pub before_number: u32,
    /// Nearest present number above the gap
    pub after_number: u32,
}

/// Flags absent numbers between consecutive present page numbers.
#[derive(Debug, Clone)]
pub struct MissingPageAnalyzer {
    min_fraction: f32,
}

impl Default for MissingPageAnalyzer {
    fn default() -> Self {
        Self::new(0.5)
    }
}

impl MissingPageAnalyzer {
    /// Create an analyzer that needs `min_fraction` of pages to be numbered.
    pub fn new(min_fraction: f32) -> Self {
        Self { min_fraction }
    }

    /// Find missing page numbers.
    ///
    /// Returns an empty list when too few pages carry a number for the
    /// sequence to be trusted.
    pub fn analyze(&self, classifications: &[Classification]) -> Vec<MissingGap> {
        let log = StageLog::new(Stage::MissingPages);
        let total = classifications.len();
        if total == 0 {
            return Vec::new();
        }

        // number -> first page carrying it
        let mut present: BTreeMap<u32, usize> = BTreeMap::new();
        let mut numbered = 0usize;
        for c in classifications {
            if let Some(number) = c.number() {
                numbered += 1;
                present.entry(number).or_insert(c.index);
            }
        }

        let fraction = numbered as f32 / total as f32;
        if numbered == 0 || fraction < self.min_fraction {
            log.info(format_args!(
                "skipped: {} of {} pages numbered (need {:.0}%)",
                numbered,
                total,
                self.min_fraction * 100.0
            ));
            return Vec::new();
        }

        let entries: Vec<(u32, usize)> = present.into_iter().collect();
        let mut gaps = Vec::new();
        for pair in entries.windows(2) {
            let (before_number, before_index) = pair[0];
            let (after_number, after_index) = pair[1];
            for number in (before_number + 1)..after_number {
                gaps.push(MissingGap {
                    number,
                    before_index,
                    after_index,
                    before_number,
                    after_number,
                });
            }
        }

        log.info(format_args!("found {} missing page numbers", gaps.len()));
        gaps
    }
}
