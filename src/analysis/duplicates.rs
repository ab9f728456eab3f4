//! Near-duplicate page detection.
//!
//! Pages are compared pairwise and every qualifying pair is merged into one
//! group (transitively), independently of the page order. Perceptual
//! signatures are used when enabled and available for every page; otherwise
//! pages are compared by the Jaccard similarity of their token sets.

use crate::corpus::Corpus;
use crate::pipeline::{Stage, StageLog};
use crate::similarity::{jaccard, tokenize};
use indexmap::IndexMap;
use serde::Serialize;

use super::signature::hamming_distance;

/// How a duplicate group was established.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum DuplicateMethod {
    /// Perceptual signatures within a Hamming distance
    PerceptualHash {
        /// Maximum Hamming distance
        max_distance: u32,
    },
    /// Token sets above a Jaccard similarity
    TextJaccard {
        /// Minimum Jaccard similarity
        min_similarity: f32,
    },
}

/// A set of near-identical pages.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DuplicateGroup {
    /// Original indices, ascending; always at least two
    pub pages: Vec<usize>,
    /// Method and threshold that produced the group
    pub method: DuplicateMethod,
}

/// Groups near-identical pages.
#[derive(Debug, Clone)]
pub struct DuplicateDetector {
    use_signatures: bool,
    hamming_threshold: u32,
    jaccard_threshold: f32,
}

impl DuplicateDetector {
    /// Create a detector with explicit thresholds.
    pub fn new(hamming_threshold: u32, jaccard_threshold: f32) -> Self {
        Self {
            use_signatures: true,
            hamming_threshold,
            jaccard_threshold,
        }
    }

    /// Enable or disable the perceptual signature mode.
    pub fn with_signatures(mut self, enable: bool) -> Self {
        self.use_signatures = enable;
        self
    }

    /// Method this detector will use for a corpus.
    ///
    /// Signatures are only compared when every page carries one.
    pub fn method_for(&self, corpus: &Corpus) -> DuplicateMethod {
        if self.use_signatures && corpus.has_all_signatures() {
            DuplicateMethod::PerceptualHash {
                max_distance: self.hamming_threshold,
            }
        } else {
            DuplicateMethod::TextJaccard {
                min_similarity: self.jaccard_threshold,
            }
        }
    }

    /// Detect duplicate groups.
    pub fn detect(&self, corpus: &Corpus) -> Vec<DuplicateGroup> {
        let log = StageLog::new(Stage::Duplicates);
        let n = corpus.len();
        let method = self.method_for(corpus);
        let mut sets = DisjointSet::new(n);

        match method {
            DuplicateMethod::PerceptualHash { max_distance } => {
                let signatures: Vec<u64> = corpus.iter().filter_map(|p| p.signature()).collect();
                for a in 0..n {
                    for b in (a + 1)..n {
                        if hamming_distance(signatures[a], signatures[b]) <= max_distance {
                            sets.union(a, b);
                        }
                    }
                }
            },
            DuplicateMethod::TextJaccard { min_similarity } => {
                let signed = corpus.iter().filter(|p| p.signature().is_some()).count();
                if self.use_signatures && signed > 0 {
                    log.warn(format_args!(
                        "only {} of {} pages have signatures; comparing text",
                        signed, n
                    ));
                }
                let tokens: Vec<_> = corpus.iter().map(|p| tokenize(p.text())).collect();
                for a in 0..n {
                    for b in (a + 1)..n {
                        if tokens[a].is_empty() || tokens[b].is_empty() {
                            continue;
                        }
                        if jaccard(&tokens[a], &tokens[b]) >= min_similarity {
                            sets.union(a, b);
                        }
                    }
                }
            },
        }

        let mut groups: IndexMap<usize, Vec<usize>> = IndexMap::new();
        for index in 0..n {
            let root = sets.find(index);
            groups.entry(root).or_default().push(index);
        }

        let groups: Vec<DuplicateGroup> = groups
            .into_values()
            .filter(|pages| pages.len() >= 2)
            .map(|pages| DuplicateGroup { pages, method })
            .collect();
        log.info(format_args!("found {} duplicate groups", groups.len()));
        groups
    }
}

/// Union-find over page indices.
struct DisjointSet {
    parent: Vec<usize>,
}

impl DisjointSet {
    fn new(size: usize) -> Self {
        Self {
            parent: (0..size).collect(),
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    fn union(&mut self, a: usize, b: usize) {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra != rb {
            // Smaller index becomes the root.
            let (root, child) = if ra < rb { (ra, rb) } else { (rb, ra) };
            self.parent[child] = root;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_text_grouped() {
        let corpus = Corpus::from_texts([
            "the quick brown fox",
            "something else entirely",
            "the quick brown fox",
        ]);
        let groups = DuplicateDetector::new(6, 0.9).detect(&corpus);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].pages, vec![0, 2]);
        assert_eq!(
            groups[0].method,
            DuplicateMethod::TextJaccard {
                min_similarity: 0.9
            }
        );
    }

    #[test]
    fn test_transitive_grouping() {
        let corpus = Corpus::from_texts(["a b c d", "a b c e", "a b f e", "x y z"]);
        let groups = DuplicateDetector::new(6, 0.6).detect(&corpus);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].pages, vec![0, 1, 2]);
    }

    #[test]
    fn test_blank_pages_not_grouped() {
        let corpus = Corpus::from_texts(["", "  ", "text"]);
        assert!(DuplicateDetector::new(6, 0.9).detect(&corpus).is_empty());
    }

    #[test]
    fn test_signature_mode() {
        let corpus = Corpus::from_texts(["a", "b", "c"]).map_pages(|p| {
            let sig = match p.index() {
                0 => 0b0000,
                1 => 0b0111,
                _ => u64::MAX,
            };
            p.with_signature(sig)
        });
        let groups = DuplicateDetector::new(3, 0.9).detect(&corpus);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].pages, vec![0, 1]);
        assert_eq!(groups[0].method, DuplicateMethod::PerceptualHash { max_distance: 3 });
    }

    #[test]
    fn test_partial_signatures_fall_back_to_text() {
        let corpus = Corpus::from_texts(["same words here", "same words here", "other"]).map_pages(|p| {
            if p.index() == 0 {
                p.with_signature(1)
            } else {
                p
            }
        });
        let detector = DuplicateDetector::new(6, 0.9);
        assert!(matches!(detector.method_for(&corpus), DuplicateMethod::TextJaccard { .. }));
        let groups = detector.detect(&corpus);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].pages, vec![0, 1]);
    }

    #[test]
    fn test_signatures_disabled_uses_text() {
        let corpus = Corpus::from_texts(["same", "same"]).map_pages(|p| p.with_signature(0));
        let detector = DuplicateDetector::new(6, 0.9).with_signatures(false);
        let groups = detector.detect(&corpus);
        assert_eq!(groups[0].pages, vec![0, 1]);
        assert!(matches!(groups[0].method, DuplicateMethod::TextJaccard { .. }));
    }
}
