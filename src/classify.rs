//! Page role classification and explicit page number extraction.
//!
//! Roles come from ordered keyword rules over the lowercased page text: the
//! first rule that matches wins. Explicit numbers are read from the printed
//! page furniture. The footer, header and middle bands of the page are tried
//! first so that a bare "2019" in the body is not mistaken for a folio when a
//! "Page 4" footer exists; only when those bands yield nothing is every line of
//! the page tried with the same pattern list.

use crate::corpus::{Corpus, Page};
use crate::pipeline::{Stage, StageLog};
use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use std::fmt;

/// Largest explicit page number accepted.
pub const MAX_PAGE_NUMBER: u32 = 9999;

/// Largest value accepted from a roman numeral folio.
pub const MAX_ROMAN_FOLIO: u32 = 100;

/// Number of trailing non-empty lines forming the footer band.
const FOOTER_LINES: usize = 3;

/// Number of leading non-empty lines forming the header band.
const HEADER_LINES: usize = 2;

/// Coarse structural role of a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PageRole {
    /// Title or cover page
    Title,
    /// Table of contents
    Toc,
    /// Abstract or executive summary
    Abstract,
    /// Introduction
    Introduction,
    /// Chapter opening page
    Chapter,
    /// Numbered section page
    Section,
    /// Body content with recognizable cues (figures, tables, citations)
    Content,
    /// Conclusion
    Conclusion,
    /// References or bibliography
    References,
    /// Appendix
    Appendix,
    /// Back-of-book index
    Index,
    /// No rule matched
    Unknown,
}

impl PageRole {
    /// Human-readable role name.
    pub fn name(&self) -> &'static str {
        match self {
            PageRole::Title => "title",
            PageRole::Toc => "toc",
            PageRole::Abstract => "abstract",
            PageRole::Introduction => "introduction",
            PageRole::Chapter => "chapter",
            PageRole::Section => "section",
            PageRole::Content => "content",
            PageRole::Conclusion => "conclusion",
            PageRole::References => "references",
            PageRole::Appendix => "appendix",
            PageRole::Index => "index",
            PageRole::Unknown => "unknown",
        }
    }

    /// Whether the classifier assigned a role at all.
    pub fn is_known(&self) -> bool {
        !matches!(self, PageRole::Unknown)
    }
}

impl fmt::Display for PageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Printed numbering style that produced an explicit number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NumberPattern {
    /// `Page N` or `Page N of M`
    PageLabel,
    /// `P. N` / `pg. N`
    Abbreviated,
    /// `N of M` / `N/M`
    OfTotal,
    /// `- N -`
    DashWrapped,
    /// `[N]` / `(N)`
    BracketWrapped,
    /// Roman numerals
    Roman,
    /// A line holding only a 1-4 digit integer
    Bare,
}

/// Where on the page an explicit number was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NumberBand {
    /// Footer, header or middle band
    Furniture,
    /// Anywhere in the page text
    FullText,
}

/// An explicit page number read from page text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ExplicitNumber {
    /// The printed number
    pub value: u32,
    /// Pattern that matched
    pub pattern: NumberPattern,
    /// Band the match came from
    pub band: NumberBand,
}

/// Classification of one page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Classification {
    /// Original page index
    pub index: usize,
    /// Assigned role
    pub role: PageRole,
    /// Explicit number, if one was printed on the page
    pub explicit_number: Option<ExplicitNumber>,
}

impl Classification {
    /// The explicit number value, if any.
    pub fn number(&self) -> Option<u32> {
        self.explicit_number.map(|n| n.value)
    }
}

lazy_static! {
    /// Ordered role rules over lowercased text; first match wins.
    static ref ROLE_RULES: Vec<(PageRole, Regex)> = vec![
        (PageRole::Toc, Regex::new(r"(?m)\btable of contents\b|^\s*contents\s*$").unwrap()),
        (PageRole::Abstract, Regex::new(r"(?m)^\s*(?:abstract|executive summary)\b").unwrap()),
        (
            PageRole::Introduction,
            Regex::new(r"(?m)^\s*(?:\d+\.?\s+)?introduction\b").unwrap(),
        ),
        (
            PageRole::Conclusion,
            Regex::new(r"(?m)^\s*(?:\d+\.?\s+)?(?:conclusions?|concluding remarks)\b").unwrap(),
        ),
        (
            PageRole::References,
            Regex::new(r"(?m)^\s*(?:references|bibliography|works cited)\s*$").unwrap(),
        ),
        (PageRole::Appendix, Regex::new(r"(?m)^\s*appendix\b").unwrap()),
        (PageRole::Index, Regex::new(r"(?m)^\s*index\s*$").unwrap()),
        (PageRole::Chapter, Regex::new(r"(?m)^\s*chapter\s+(?:\d+|[ivxlc]+)\b").unwrap()),
        (
            PageRole::Section,
            Regex::new(r"(?m)^\s*(?:section\s+\d+|\d+\.\d+(?:\.\d+)*\.?\s+[a-z])").unwrap(),
        ),
        (
            PageRole::Title,
            Regex::new(
                r"\b(?:a thesis|dissertation submitted|submitted (?:to|by|in partial)|all rights reserved|copyright\s+(?:©|\(c\)|\d{4}))",
            )
            .unwrap(),
        ),
        (
            PageRole::Content,
            Regex::new(r"\b(?:figure|fig\.|table)\s+\d+|\bet al\.").unwrap(),
        ),
    ];

    /// Ordered explicit-number patterns; each matches one whole line.
    static ref NUMBER_PATTERNS: Vec<(NumberPattern, Regex)> = vec![
        (
            NumberPattern::PageLabel,
            Regex::new(r"(?i)^\s*page\s+(\d{1,4})(?:\s+of\s+\d{1,5})?\s*$").unwrap(),
        ),
        (NumberPattern::Abbreviated, Regex::new(r"(?i)^\s*pg?\.\s*(\d{1,4})\s*$").unwrap()),
        (NumberPattern::OfTotal, Regex::new(r"(?i)^\s*(\d{1,4})\s*(?:of|/)\s*\d{1,5}\s*$").unwrap()),
        (NumberPattern::DashWrapped, Regex::new(r"^\s*[-–—]\s*(\d{1,4})\s*[-–—]\s*$").unwrap()),
        (NumberPattern::BracketWrapped, Regex::new(r"^\s*[\[(]\s*(\d{1,4})\s*[\])]\s*$").unwrap()),
        (NumberPattern::Roman, Regex::new(r"(?i)^\s*([ivxlcdm]{1,15})\s*$").unwrap()),
        (NumberPattern::Bare, Regex::new(r"^\s*(\d{1,4})\s*$").unwrap()),
    ];
}

/// Assigns roles and explicit numbers to pages.
#[derive(Debug, Clone, Default)]
pub struct StructureClassifier {
    verbose: bool,
}

impl StructureClassifier {
    /// Create a classifier.
    pub fn new() -> Self {
        Self::default()
    }

    /// Emit one debug record per classified page.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Classify a single page.
    pub fn classify(&self, page: &Page) -> Classification {
        Classification {
            index: page.index(),
            role: classify_role(page.text()),
            explicit_number: extract_explicit_number(page.text()),
        }
    }

    /// Classify every page of a corpus, index-aligned with it.
    pub fn classify_corpus(&self, corpus: &Corpus) -> Vec<Classification> {
        let log = StageLog::new(Stage::Classification).with_verbose(self.verbose);
        let classifications: Vec<Classification> = corpus
            .iter()
            .map(|page| {
                let classification = self.classify(page);
                log.page_debug(
                    page.index(),
                    format_args!(
                        "role={} number={:?}",
                        classification.role,
                        classification.number()
                    ),
                );
                classification
            })
            .collect();

        let numbered = classifications.iter().filter(|c| c.number().is_some()).count();
        let known = classifications.iter().filter(|c| c.role.is_known()).count();
        log.info(format_args!(
            "{} of {} pages numbered, {} classified",
            numbered,
            classifications.len(),
            known
        ));
        classifications
    }
}

/// Assign a role by ordered keyword matching.
pub fn classify_role(text: &str) -> PageRole {
    let lower = text.to_lowercase();
    ROLE_RULES
        .iter()
        .find(|(_, re)| re.is_match(&lower))
        .map(|(role, _)| *role)
        .unwrap_or(PageRole::Unknown)
}

/// Extract the printed page number from page text.
pub fn extract_explicit_number(text: &str) -> Option<ExplicitNumber> {
    let lines: Vec<&str> = text.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
    if lines.is_empty() {
        return None;
    }

    let furniture = furniture_lines(&lines);
    match_patterns(&furniture, NumberBand::Furniture)
        .or_else(|| match_patterns(&lines, NumberBand::FullText))
}

/// Footer (bottom-up), header and middle bands, without repeats.
fn furniture_lines<'a>(lines: &[&'a str]) -> Vec<&'a str> {
    let n = lines.len();
    let mut positions: Vec<usize> = (n.saturating_sub(FOOTER_LINES)..n).rev().collect();
    positions.extend(0..HEADER_LINES.min(n));
    let mid = n / 2;
    positions.extend(mid.saturating_sub(1)..(mid + 2).min(n));

    let mut seen = vec![false; n];
    positions
        .into_iter()
        .filter(|&p| !std::mem::replace(&mut seen[p], true))
        .map(|p| lines[p])
        .collect()
}

fn match_patterns(lines: &[&str], band: NumberBand) -> Option<ExplicitNumber> {
    for (pattern, re) in NUMBER_PATTERNS.iter() {
        for line in lines {
            let Some(caps) = re.captures(line) else {
                continue;
            };
            let value = match pattern {
                // A lone letter in running text is a word, not a folio.
                NumberPattern::Roman if band == NumberBand::FullText && caps[1].len() < 2 => None,
                NumberPattern::Roman => roman_folio(&caps[1]),
                _ => caps[1].parse::<u32>().ok(),
            };
            if let Some(value) = value.filter(|v| (1..=MAX_PAGE_NUMBER).contains(v)) {
                return Some(ExplicitNumber {
                    value,
                    pattern: *pattern,
                    band,
                });
            }
        }
    }
    None
}

/// Value of a roman numeral that can stand as a page folio.
///
/// Canonical numerals up to [`MAX_ROMAN_FOLIO`]; `mix` or `dim` are words.
pub fn roman_folio(numeral: &str) -> Option<u32> {
    from_roman(numeral).filter(|&value| value <= MAX_ROMAN_FOLIO)
}

/// Parse a roman numeral, accepting only its canonical spelling.
pub fn from_roman(numeral: &str) -> Option<u32> {
    let lower = numeral.to_ascii_lowercase();
    let mut total = 0u32;
    let mut previous = 0u32;
    for c in lower.chars().rev() {
        let value = match c {
            'i' => 1,
            'v' => 5,
            'x' => 10,
            'l' => 50,
            'c' => 100,
            'd' => 500,
            'm' => 1000,
            _ => return None,
        };
        if value < previous {
            total = total.checked_sub(value)?;
        } else {
            total += value;
            previous = value;
        }
    }
    (total > 0 && to_roman(total) == lower).then_some(total)
}

fn to_roman(mut n: u32) -> String {
    let numerals = [
        (1000, "m"),
        (900, "cm"),
        (500, "d"),
        (400, "cd"),
        (100, "c"),
        (90, "xc"),
        (50, "l"),
        (40, "xl"),
        (10, "x"),
        (9, "ix"),
        (5, "v"),
        (4, "iv"),
        (1, "i"),
    ];

    let mut result = String::new();
    for (value, numeral) in numerals.iter() {
        while n >= *value {
            result.push_str(numeral);
            n -= value;
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_first_match_wins() {
        assert_eq!(classify_role("Table of Contents\n1 Intro ..... 3"), PageRole::Toc);
        assert_eq!(classify_role("Abstract\nWe study things."), PageRole::Abstract);
        assert_eq!(classify_role("1. Introduction\nBody"), PageRole::Introduction);
        assert_eq!(classify_role("Chapter 3\nThe middle"), PageRole::Chapter);
        assert_eq!(classify_role("References\n[1] A. Author"), PageRole::References);
        assert_eq!(classify_role("Appendix A\nTables"), PageRole::Appendix);
        assert_eq!(classify_role("2.1 Method details"), PageRole::Section);
        assert_eq!(classify_role("As shown in Figure 2 the"), PageRole::Content);
        assert_eq!(classify_role("plain prose"), PageRole::Unknown);
    }

    #[test]
    fn test_toc_beats_introduction() {
        let text = "Contents\nIntroduction ..... 1\nConclusion ..... 9";
        assert_eq!(classify_role(text), PageRole::Toc);
    }

    #[test]
    fn test_page_label_footer() {
        let n = extract_explicit_number("Some body text\nmore text\nPage 7").unwrap();
        assert_eq!(n.value, 7);
        assert_eq!(n.pattern, NumberPattern::PageLabel);
        assert_eq!(n.band, NumberBand::Furniture);
    }

    #[test]
    fn test_page_label_beats_bare_year() {
        let text = "Page 4\nintro\nbody\nbody\nbody\nbody\n2019";
        assert_eq!(extract_explicit_number(text).unwrap().value, 4);
    }

    #[test]
    fn test_other_patterns() {
        assert_eq!(extract_explicit_number("text\n3 of 10").unwrap().value, 3);
        assert_eq!(extract_explicit_number("text\n- 12 -").unwrap().value, 12);
        assert_eq!(extract_explicit_number("text\n[5]").unwrap().value, 5);
        assert_eq!(extract_explicit_number("text\nP. 8").unwrap().value, 8);
        assert_eq!(extract_explicit_number("text\nxiv").unwrap().value, 14);
        assert_eq!(extract_explicit_number("text\n42").unwrap().value, 42);
    }

    #[test]
    fn test_full_text_fallback() {
        let text = "one\ntwo\nthree\nPage 9\nfour\nfive\nsix\nseven\neight\nnine\nten\neleven";
        let n = extract_explicit_number(text).unwrap();
        assert_eq!(n.value, 9);
        assert_eq!(n.band, NumberBand::FullText);
    }

    #[test]
    fn test_out_of_range_rejected() {
        assert!(extract_explicit_number("text\n0").is_none());
        assert!(extract_explicit_number("text\n12345").is_none());
        assert!(extract_explicit_number("").is_none());
    }

    #[test]
    fn test_roman_canonical_only() {
        assert_eq!(from_roman("iv"), Some(4));
        assert_eq!(from_roman("XIV"), Some(14));
        assert_eq!(from_roman("mcmxc"), Some(1990));
        assert_eq!(from_roman("iiii"), None);
        assert_eq!(from_roman("vx"), None);
        assert_eq!(from_roman("mix"), Some(1009));
        assert_eq!(from_roman("dim"), None);
    }

    #[test]
    fn test_roman_folio_limits() {
        assert_eq!(roman_folio("xii"), Some(12));
        assert_eq!(roman_folio("C"), Some(100));
        assert_eq!(roman_folio("mix"), None);
        assert_eq!(roman_folio("ci"), None);

        assert_eq!(extract_explicit_number("preface\nxii").map(|n| n.value), Some(12));
        assert!(extract_explicit_number("the recipe\nmix").is_none());
        assert!(extract_explicit_number("dim").is_none());
    }

    #[test]
    fn test_single_letter_roman_only_in_furniture() {
        assert_eq!(match_patterns(&["I"], NumberBand::Furniture).map(|n| n.value), Some(1));
        assert!(match_patterns(&["I"], NumberBand::FullText).is_none());
        assert_eq!(match_patterns(&["iv"], NumberBand::FullText).map(|n| n.value), Some(4));

        // Nine lines put the lone "I" outside every furniture band.
        let text = "one\ntwo\nI\nfour\nfive\nsix\nseven\neight\nnine";
        assert!(extract_explicit_number(text).is_none());
    }

    #[test]
    fn test_classify_corpus_aligned() {
        let corpus = Corpus::from_texts(["Abstract\nx", "body\nPage 2"]);
        let classes = StructureClassifier::new().classify_corpus(&corpus);
        assert_eq!(classes.len(), 2);
        assert_eq!(classes[0].role, PageRole::Abstract);
        assert_eq!(classes[1].number(), Some(2));
        assert_eq!(classes[1].index, 1);
    }
}
