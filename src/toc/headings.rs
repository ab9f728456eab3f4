//! Heading candidates in page text.

use crate::classify::roman_folio;
use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

lazy_static! {
    static ref STRUCTURED: Regex = Regex::new(
        r"(?i)^(chapter|section|part)\s+(\d{1,3}|[ivxlcdm]{1,7}|[a-z])\b\s*[:.\-–—]?\s*(.*)$"
    )
    .unwrap();
    static ref OUTLINE: Regex = Regex::new(r"^(\d{1,2}(?:\.\d{1,2}){0,3})\.?\s+(\p{Lu}.*)$").unwrap();
    static ref UNDERLINE: Regex = Regex::new(r"^(?:={3,}|-{3,}|_{3,})$").unwrap();
    static ref BULLET: Regex = Regex::new(r"^[•·▪◦*\-]\s+(\p{L}.*)$").unwrap();
    static ref PAGE_LABEL: Regex = Regex::new(
        r"(?i)^(?:page|pg\.?|p\.)?\s*[\[(\-–]?\s*\d{1,4}\s*[\])\-–]?(?:\s*(?:of|/)\s*\d{1,4})?$"
    )
    .unwrap();
    static ref DATE: Regex = Regex::new(
        r"(?ix)^(?:
            \d{1,2}[/.\-]\d{1,2}[/.\-]\d{2,4}
          | \d{4}-\d{2}-\d{2}
          | (?:\d{1,2}\s+)?(?:jan|feb|mar|apr|may|jun|jul|aug|sep|sept|oct|nov|dec)[a-z]*\.?\s+(?:\d{1,2}(?:st|nd|rd|th)?,?\s+)?\d{4}
        )$"
    )
    .unwrap();
}

const MINOR_WORDS: &[&str] = &[
    "a", "an", "and", "as", "at", "by", "for", "in", "of", "on", "or", "the", "to", "with",
];

/// Which pattern produced a heading, strongest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HeadingKind {
    /// `Chapter 3: Title`, `Section 2`, `Part IV - Title`
    Structured,
    /// `1.2 Title`
    Outline,
    /// A line followed by `===`, `---` or `___`
    Underlined,
    /// `RESULTS AND DISCUSSION`
    AllCaps,
    /// `• Title`
    Bullet,
    /// `Related Work in Context`
    TitleCase,
}

/// A heading candidate found on a page.
#[derive(Debug, Clone, PartialEq)]
pub struct Heading {
    /// Display title
    pub title: String,
    /// Hierarchy level, 1 = top
    pub level: u8,
    /// Pattern that matched
    pub kind: HeadingKind,
    /// Position among the page's non-empty lines
    pub line: usize,
}

/// Limits applied to heading candidates.
#[derive(Debug, Clone)]
pub struct HeadingRules {
    /// Number of leading non-empty lines scanned per page
    pub leading_lines: usize,
    /// Maximum heading length in characters
    pub max_chars: usize,
    /// Maximum words for the caps, bullet and title-case patterns
    pub max_words: usize,
}

impl Default for HeadingRules {
    fn default() -> Self {
        Self {
            leading_lines: 8,
            max_chars: 80,
            max_words: 8,
        }
    }
}

impl HeadingRules {
    /// All heading candidates among the leading lines of a page.
    pub fn candidates(&self, text: &str) -> Vec<Heading> {
        let lines: Vec<&str> = text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .take(self.leading_lines + 1)
            .collect();

        let mut found = Vec::new();
        for (i, &line) in lines.iter().enumerate().take(self.leading_lines) {
            if UNDERLINE.is_match(line) || self.is_excluded(line) {
                continue;
            }
            let underline = lines.get(i + 1).filter(|next| UNDERLINE.is_match(next));
            if let Some(heading) = self.match_line(line, underline.copied()) {
                found.push(Heading { line: i, ..heading });
            }
        }
        found
    }

    /// Strongest candidate of a page: best pattern, then earliest line.
    pub fn best(&self, text: &str) -> Option<Heading> {
        self.candidates(text)
            .into_iter()
            .min_by_key(|h| (h.kind, h.line))
    }

    fn is_excluded(&self, line: &str) -> bool {
        line.chars().count() > self.max_chars
            || PAGE_LABEL.is_match(line)
            || DATE.is_match(line)
            || roman_folio(line).is_some()
            || !line.chars().any(char::is_alphabetic)
    }

    fn match_line(&self, line: &str, underline: Option<&str>) -> Option<Heading> {
        if let Some(caps) = STRUCTURED.captures(line) {
            let keyword = caps[1].to_lowercase();
            let label = format!("{} {}", capitalize(&keyword), &caps[2]);
            let rest = caps[3].trim();
            let title = if rest.is_empty() {
                label
            } else {
                format!("{}: {}", label, rest)
            };
            let level = if keyword == "section" { 2 } else { 1 };
            return Some(heading(title, level, HeadingKind::Structured));
        }

        if let Some(caps) = OUTLINE.captures(line) {
            let title = caps[2].trim();
            if !ends_like_sentence(title) {
                let depth = caps[1].split('.').count().min(3) as u8;
                return Some(heading(
                    format!("{} {}", &caps[1], title),
                    depth,
                    HeadingKind::Outline,
                ));
            }
        }

        if let Some(rule) = underline {
            let level = if rule.starts_with('=') { 1 } else { 2 };
            return Some(heading(line.to_string(), level, HeadingKind::Underlined));
        }

        let words = line.split_whitespace().count();
        if words > self.max_words {
            return None;
        }

        if is_all_caps(line) {
            return Some(heading(line.to_string(), 1, HeadingKind::AllCaps));
        }

        if let Some(caps) = BULLET.captures(line) {
            let title = caps[1].trim();
            if !ends_like_sentence(title) {
                return Some(heading(title.to_string(), 2, HeadingKind::Bullet));
            }
        }

        if words >= 2 && is_title_case(line) {
            return Some(heading(line.to_string(), 2, HeadingKind::TitleCase));
        }

        None
    }
}

fn heading(title: String, level: u8, kind: HeadingKind) -> Heading {
    Heading {
        title,
        level,
        kind,
        line: 0,
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn ends_like_sentence(text: &str) -> bool {
    text.ends_with(['.', ',', ';', ':', '?', '!'])
}

fn is_all_caps(line: &str) -> bool {
    let letters = line.chars().filter(|c| c.is_alphabetic()).count();
    letters >= 3 && !line.chars().any(char::is_lowercase)
}

fn is_title_case(line: &str) -> bool {
    if ends_like_sentence(line) {
        return false;
    }
    let mut capitalized = 0;
    for (i, word) in line.split_whitespace().enumerate() {
        let starts_upper = word.chars().next().map_or(false, char::is_uppercase);
        if starts_upper {
            capitalized += 1;
        } else if i == 0 || !MINOR_WORDS.contains(&word) {
            return false;
        }
    }
    capitalized >= 2
}
