//! Table of contents synthesis.
//!
//! Entries are built in original index space and always cover every page
//! exactly once:
//!
//! 1. Headings: each page contributes at most one heading, whose range runs up
//!    to the page before the next heading.
//! 2. Keyword sections (only when no page has a heading): contiguous runs of
//!    pages sharing a content keyword bucket.
//! 3. Filler: pages still uncovered are grouped into `Content Section` entries
//!    (three or more consecutive pages) or single `Page k` entries.

mod headings;

pub use headings::{Heading, HeadingKind, HeadingRules};

use crate::corpus::Corpus;
use crate::pipeline::{Stage, StageLog};
use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use std::collections::HashMap;

/// Where a TOC entry came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TocSource {
    /// A detected heading
    Heading,
    /// A run of pages sharing a content keyword
    KeywordSection,
    /// Pages nothing else covered
    Filler,
}

/// One outline entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TocEntry {
    /// Display title
    pub title: String,
    /// First original page index (inclusive)
    pub start: usize,
    /// Last original page index (inclusive)
    pub end: usize,
    /// Hierarchy level, 1 = top
    pub level: u8,
    /// How the entry was derived
    pub source: TocSource,
}

impl TocEntry {
    /// Number of pages covered.
    pub fn page_count(&self) -> usize {
        self.end - self.start + 1
    }
}

/// Keyword buckets for the fallback pass, checked in order.
const KEYWORD_BUCKETS: &[(&str, &str)] = &[
    ("Title", r"\b(thesis|dissertation|submitted (to|by|in)|all rights reserved)\b"),
    ("Table of Contents", r"\b(table of contents|contents)\b"),
    ("Abstract", r"\b(abstract|executive summary)\b"),
    ("Introduction", r"\b(introduction|background)\b"),
    ("Methods", r"\b(methods?|methodology|materials)\b"),
    ("Results", r"\b(results|findings)\b"),
    ("Discussion", r"\bdiscussion\b"),
    ("Conclusion", r"\b(conclusions?|concluding)\b"),
    ("References", r"\b(references|bibliography|works cited)\b"),
    ("Appendix", r"\b(appendix|appendices)\b"),
];

lazy_static! {
    static ref BUCKETS: Vec<(&'static str, Regex)> = KEYWORD_BUCKETS
        .iter()
        .map(|(label, pattern)| (*label, Regex::new(pattern).unwrap()))
        .collect();
}

/// Minimum run length grouped into one `Content Section` entry.
const MIN_SECTION_RUN: usize = 3;

/// Builds a page-complete outline from page text.
#[derive(Debug, Clone)]
pub struct TocBuilder {
    /// Heading limits
    pub rules: HeadingRules,
    /// Ignore heading titles repeated on more than this fraction of pages
    /// (running headers); applies to corpora of three or more pages
    pub running_header_fraction: f32,
}

impl Default for TocBuilder {
    fn default() -> Self {
        Self {
            rules: HeadingRules::default(),
            running_header_fraction: 0.5,
        }
    }
}

impl TocBuilder {
    /// Create a builder with default limits.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the outline for a corpus.
    pub fn build(&self, corpus: &Corpus) -> Vec<TocEntry> {
        let log = StageLog::new(Stage::Toc);
        let n = corpus.len();
        if n == 0 {
            return Vec::new();
        }

        let mut entries = self.heading_entries(corpus, &log);
        if entries.is_empty() {
            entries = keyword_entries(corpus);
            if !entries.is_empty() {
                log.info(format_args!("no headings; {} keyword sections", entries.len()));
            }
        } else {
            log.info(format_args!("{} headings", entries.len()));
        }

        fill_uncovered(&mut entries, n);
        entries.sort_by_key(|e| e.start);
        entries
    }

    fn heading_entries(&self, corpus: &Corpus, log: &StageLog) -> Vec<TocEntry> {
        let n = corpus.len();
        let candidates: Vec<Vec<Heading>> = corpus
            .iter()
            .map(|page| self.rules.candidates(page.text()))
            .collect();

        let mut frequency: HashMap<String, usize> = HashMap::new();
        for page in &candidates {
            let mut seen: Vec<String> = page.iter().map(|h| h.title.to_lowercase()).collect();
            seen.sort();
            seen.dedup();
            for title in seen {
                *frequency.entry(title).or_default() += 1;
            }
        }
        let is_running_header = |title: &str| {
            n >= 3
                && frequency.get(&title.to_lowercase()).copied().unwrap_or(0) as f32
                    > n as f32 * self.running_header_fraction
        };

        let chosen: Vec<(usize, Heading)> = candidates
            .into_iter()
            .enumerate()
            .filter_map(|(index, page)| {
                page.into_iter()
                    .filter(|h| !is_running_header(&h.title))
                    .min_by_key(|h| (h.kind, h.line))
                    .map(|h| (index, h))
            })
            .collect();

        chosen
            .iter()
            .enumerate()
            .map(|(k, (start, heading))| {
                let end = chosen.get(k + 1).map_or(n - 1, |(next, _)| next - 1);
                log.page_debug(*start, format_args!("heading {:?} '{}'", heading.kind, heading.title));
                TocEntry {
                    title: heading.title.clone(),
                    start: *start,
                    end,
                    level: heading.level,
                    source: TocSource::Heading,
                }
            })
            .collect()
    }
}

/// Keyword bucket of a page, if any.
pub fn keyword_bucket(text: &str) -> Option<&'static str> {
    let lower = text.to_lowercase();
    BUCKETS
        .iter()
        .find(|(_, pattern)| pattern.is_match(&lower))
        .map(|(label, _)| *label)
}

fn keyword_entries(corpus: &Corpus) -> Vec<TocEntry> {
    let buckets: Vec<Option<&'static str>> = corpus.iter().map(|p| keyword_bucket(p.text())).collect();

    let mut entries = Vec::new();
    let mut start = 0;
    while start < buckets.len() {
        let mut end = start;
        while end + 1 < buckets.len() && buckets[end + 1] == buckets[start] {
            end += 1;
        }
        if let Some(label) = buckets[start] {
            entries.push(TocEntry {
                title: label.to_string(),
                start,
                end,
                level: 1,
                source: TocSource::KeywordSection,
            });
        }
        start = end + 1;
    }
    entries
}

/// Cover every page no entry covers yet.
fn fill_uncovered(entries: &mut Vec<TocEntry>, n: usize) {
    let mut covered = vec![false; n];
    for entry in entries.iter() {
        for flag in &mut covered[entry.start..=entry.end.min(n - 1)] {
            *flag = true;
        }
    }

    let mut page = 0;
    while page < n {
        if covered[page] {
            page += 1;
            continue;
        }
        let start = page;
        while page < n && !covered[page] {
            page += 1;
        }
        let end = page - 1;

        if end - start + 1 >= MIN_SECTION_RUN {
            entries.push(TocEntry {
                title: format!("Content Section (pages {}-{})", start + 1, end + 1),
                start,
                end,
                level: 1,
                source: TocSource::Filler,
            });
        } else {
            entries.extend((start..=end).map(|k| TocEntry {
                title: format!("Page {}", k + 1),
                start: k,
                end: k,
                level: 1,
                source: TocSource::Filler,
            }));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_partition(entries: &[TocEntry], n: usize) {
        let mut next = 0;
        for entry in entries {
            assert_eq!(entry.start, next, "gap or overlap at {:?}", entry);
            assert!(entry.end >= entry.start);
            next = entry.end + 1;
        }
        assert_eq!(next, n);
    }

    #[test]
    fn test_heading_ranges() {
        let corpus = Corpus::from_texts([
            "plain opening words",
            "Chapter 1: Beginnings\nbody",
            "more body text here",
            "Chapter 2: Endings\nbody",
        ]);
        let toc = TocBuilder::new().build(&corpus);
        assert_partition(&toc, 4);
        assert_eq!(toc[0].title, "Page 1");
        assert_eq!(toc[0].source, TocSource::Filler);
        assert_eq!((toc[1].start, toc[1].end), (1, 2));
        assert_eq!(toc[1].title, "Chapter 1: Beginnings");
        assert_eq!((toc[2].start, toc[2].end), (3, 3));
    }

    #[test]
    fn test_heading_free_document() {
        let corpus = Corpus::from_texts(["one two", "three four", "five six", "seven eight"]);
        let toc = TocBuilder::new().build(&corpus);
        assert_eq!(toc.len(), 1);
        assert_eq!(toc[0].title, "Content Section (pages 1-4)");
        assert_partition(&toc, 4);
    }

    #[test]
    fn test_keyword_fallback() {
        let corpus = Corpus::from_texts([
            "we describe the method used",
            "the method continued",
            "plain words",
            "the results were clear",
            "further results shown",
        ]);
        let toc = TocBuilder::new().build(&corpus);
        assert_partition(&toc, 5);
        let titles: Vec<&str> = toc.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["Methods", "Page 3", "Results"]);
        assert_eq!(toc[0].source, TocSource::KeywordSection);
    }

    #[test]
    fn test_running_header_ignored() {
        let corpus = Corpus::from_texts([
            "JOURNAL OF THINGS\nplain text",
            "JOURNAL OF THINGS\nChapter 1: Start",
            "JOURNAL OF THINGS\nplain text",
        ]);
        let toc = TocBuilder::new().build(&corpus);
        assert_partition(&toc, 3);
        assert_eq!(toc[0].title, "Page 1");
        assert_eq!(toc[1].title, "Chapter 1: Start");
        assert_eq!(toc[1].end, 2);
    }

    #[test]
    fn test_short_uncovered_runs_per_page() {
        let corpus = Corpus::from_texts(["a b", "c d", "Chapter 9\nx"]);
        let toc = TocBuilder::new().build(&corpus);
        let titles: Vec<&str> = toc.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["Page 1", "Page 2", "Chapter 9"]);
    }

    #[test]
    fn test_empty_corpus() {
        assert!(TocBuilder::new().build(&Corpus::default()).is_empty());
    }

    #[test]
    fn test_keyword_bucket_order() {
        assert_eq!(keyword_bucket("Introduction and background"), Some("Introduction"));
        assert_eq!(keyword_bucket("References"), Some("References"));
        assert_eq!(keyword_bucket("nothing here"), None);
    }
}
