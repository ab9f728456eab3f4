//! Report artifacts written next to the reconstructed document.
//!
//! - `log.json`: order, confidence, reasoning, strategy and per-page details
//! - `report.html`: human-readable summary
//! - `toc.json`: outline entries with their exported page numbers
//! - `duplicates_missing.json`: duplicate groups and missing page numbers

use super::{exported_page_index, StagedFiles};
use crate::analysis::{DuplicateGroup, MissingGap};
use crate::classify::PageRole;
use crate::error::Result;
use crate::order::PlanStrategy;
use crate::pipeline::{ReconstructionOutcome, Stage, StageLog};
use crate::toc::TocSource;
use serde::Serialize;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

/// Escape text for inclusion in HTML.
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RunLog<'a> {
    generated_at: String,
    page_count: usize,
    confidence: f32,
    order: &'a [usize],
    reasoning: &'a str,
    strategy: &'a PlanStrategy,
    toc_embedded: bool,
    pages: Vec<PageRecord>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PageRecord {
    index: usize,
    exported_page: Option<usize>,
    width: f32,
    height: f32,
    rotation: i32,
    role: PageRole,
    number: Option<u32>,
    has_embedding: bool,
    signature: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TocRecord<'a> {
    title: &'a str,
    start: usize,
    end: usize,
    level: u8,
    source: TocSource,
    exported_page: Option<usize>,
}

#[derive(Serialize)]
struct DuplicatesMissing<'a> {
    duplicates: &'a [DuplicateGroup],
    missing: &'a [MissingGap],
}

/// Writes the report artifacts of a run into one directory.
#[derive(Debug, Clone)]
pub struct ReportWriter {
    dir: PathBuf,
}

impl ReportWriter {
    /// Write reports into `dir`.
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// Write every artifact; returns the paths written.
    ///
    /// Either all reports appear or none do.
    pub fn write_all(&self, outcome: &ReconstructionOutcome) -> Result<Vec<PathBuf>> {
        let mut staged = StagedFiles::new(&self.dir)?;
        for (name, bytes) in render_all(outcome)? {
            staged.add(name, &bytes)?;
        }
        let written = staged.commit()?;
        StageLog::new(Stage::Report).info(format_args!(
            "wrote {} report files to {}",
            written.len(),
            self.dir.display()
        ));
        Ok(written)
    }
}

/// Serialized contents of every report artifact, by file name.
pub fn render_all(outcome: &ReconstructionOutcome) -> Result<Vec<(&'static str, Vec<u8>)>> {
    Ok(vec![
        ("log.json", serde_json::to_vec_pretty(&run_log(outcome))?),
        ("toc.json", serde_json::to_vec_pretty(&toc_records(outcome))?),
        (
            "duplicates_missing.json",
            serde_json::to_vec_pretty(&DuplicatesMissing {
                duplicates: &outcome.duplicates,
                missing: &outcome.missing,
            })?,
        ),
        ("report.html", render_html(outcome).into_bytes()),
    ])
}

/// 1-based exported page number of an original page.
fn exported_number(outcome: &ReconstructionOutcome, original: usize) -> Option<usize> {
    exported_page_index(&outcome.order.order, original, outcome.toc_offset()).map(|i| i + 1)
}

fn run_log(outcome: &ReconstructionOutcome) -> RunLog<'_> {
    let pages = outcome
        .corpus
        .iter()
        .zip(&outcome.classifications)
        .map(|(page, class)| PageRecord {
            index: page.index(),
            exported_page: exported_number(outcome, page.index()),
            width: page.width(),
            height: page.height(),
            rotation: page.rotation(),
            role: class.role,
            number: class.number(),
            has_embedding: page.embedding().is_some(),
            signature: page.signature().map(|s| format!("{:016x}", s)),
        })
        .collect();

    RunLog {
        generated_at: chrono::Local::now().to_rfc3339(),
        page_count: outcome.corpus.len(),
        confidence: outcome.order.confidence,
        order: &outcome.order.order,
        reasoning: &outcome.order.reasoning,
        strategy: &outcome.order.strategy,
        toc_embedded: outcome.toc_embedded,
        pages,
    }
}

fn toc_records(outcome: &ReconstructionOutcome) -> Vec<TocRecord<'_>> {
    outcome
        .toc
        .iter()
        .map(|entry| TocRecord {
            title: &entry.title,
            start: entry.start,
            end: entry.end,
            level: entry.level,
            source: entry.source,
            exported_page: exported_number(outcome, entry.start),
        })
        .collect()
}

/// Human-readable summary of a run.
pub fn render_html(outcome: &ReconstructionOutcome) -> String {
    let mut html = String::new();
    html.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
    html.push_str("<title>PDF Reconstruction Report</title>\n<style>\n");
    html.push_str("body { font-family: sans-serif; margin: 2em; }\n");
    html.push_str(".toc-entry { margin: 4px 0; }\n");
    html.push_str(".toc-level-2 { margin-left: 20px; }\n.toc-level-3 { margin-left: 40px; }\n");
    html.push_str("</style>\n</head>\n<body>\n<h1>PDF Reconstruction Report</h1>\n");

    let order = &outcome.order;
    let _ = writeln!(
        html,
        "<p>Generated {}. {} pages; strategy <b>{}</b>, confidence {:.0}%.</p>",
        escape_html(&chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string()),
        outcome.corpus.len(),
        order.strategy.name(),
        order.confidence * 100.0
    );
    let _ = writeln!(html, "<h2>Reasoning</h2>\n<p>{}</p>", escape_html(&order.reasoning));

    let sequence: Vec<String> = order.order.iter().map(|i| (i + 1).to_string()).collect();
    let _ = writeln!(
        html,
        "<h2>Page Order</h2>\n<p>Original pages in reading order: {}</p>",
        sequence.join(", ")
    );

    html.push_str("<h2>Duplicates</h2>\n");
    if outcome.duplicates.is_empty() {
        html.push_str("<p>None found.</p>\n");
    } else {
        html.push_str("<ul>\n");
        for group in &outcome.duplicates {
            let pages: Vec<String> = group.pages.iter().map(|i| (i + 1).to_string()).collect();
            let _ = writeln!(html, "<li>Pages {}</li>", pages.join(", "));
        }
        html.push_str("</ul>\n");
    }

    html.push_str("<h2>Missing Pages</h2>\n");
    if outcome.missing.is_empty() {
        html.push_str("<p>None detected.</p>\n");
    } else {
        html.push_str("<ul>\n");
        for gap in &outcome.missing {
            let _ = writeln!(
                html,
                "<li>Page number {} (between {} and {})</li>",
                gap.number, gap.before_number, gap.after_number
            );
        }
        html.push_str("</ul>\n");
    }

    html.push_str("<h2>Table of Contents</h2>\n");
    for entry in &outcome.toc {
        let page = exported_number(outcome, entry.start)
            .map(|p| p.to_string())
            .unwrap_or_else(|| "?".to_string());
        let _ = writeln!(
            html,
            "<div class=\"toc-entry toc-level-{}\">{} <span>(p. {})</span></div>",
            entry.level.clamp(1, 3),
            escape_html(&entry.title),
            page
        );
    }

    html.push_str("</body>\n</html>\n");
    html
}
