//! Integration tests for outline construction.

use pdf_reconstruct::{Corpus, TocBuilder, TocEntry, TocSource};
use proptest::prelude::*;

fn build(texts: &[&str]) -> Vec<TocEntry> {
    TocBuilder::new().build(&Corpus::from_texts(texts.iter().copied()))
}

fn assert_partition(entries: &[TocEntry], n: usize) {
    let mut next = 0;
    for entry in entries {
        assert_eq!(entry.start, next, "gap or overlap before {:?}", entry);
        assert!(entry.end >= entry.start);
        next = entry.end + 1;
    }
    assert_eq!(next, n);
}

#[test]
fn test_heading_free_document() {
    let entries = build(&[
        "river water flows slowly past the old mill",
        "the miller counts sacks of grain every morning",
        "some sacks are taken to town by cart",
        "the cart returns empty before nightfall",
    ]);
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].title, "Content Section (pages 1-4)");
    assert_eq!(entries[0].source, TocSource::Filler);
    assert_eq!(entries[0].page_count(), 4);
}

#[test]
fn test_chapters_span_until_next_heading() {
    let entries = build(&[
        "Chapter 1 Beginnings\nthe story opens in a small village",
        "the village had one road and one well",
        "Chapter 2 Growth\nyears pass and the village becomes a town",
        "the town builds a second road",
    ]);
    assert_partition(&entries, 4);
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].title, "Chapter 1: Beginnings");
    assert_eq!((entries[0].start, entries[0].end), (0, 1));
    assert_eq!(entries[1].title, "Chapter 2: Growth");
    assert_eq!((entries[1].start, entries[1].end), (2, 3));
    assert!(entries.iter().all(|e| e.source == TocSource::Heading));
}

#[test]
fn test_front_pages_before_first_heading_are_filled() {
    let entries = build(&[
        "a short note from the printer",
        "Chapter 1 Beginnings\nthe story opens",
        "the story goes on",
    ]);
    assert_partition(&entries, 3);
    assert_eq!(entries[0].title, "Page 1");
    assert_eq!(entries[0].source, TocSource::Filler);
    assert_eq!(entries[1].start, 1);
}

#[test]
fn test_empty_corpus_has_no_entries() {
    assert!(build(&[]).is_empty());
}

fn page_text() -> impl Strategy<Value = String> {
    let lines = prop::sample::select(vec![
        "Chapter 3 Harvest",
        "2.1 Soil Samples",
        "ABSTRACT",
        "the field was ploughed twice",
        "References",
        "Page 4",
        "• Key Findings",
        "Related Work in Context",
        "iv",
        "figures follow below",
    ]);
    prop::collection::vec(lines, 0..6).prop_map(|l| l.join("\n"))
}

proptest! {
    #[test]
    fn prop_entries_partition_pages(texts in prop::collection::vec(page_text(), 1..20)) {
        let corpus = Corpus::from_texts(texts.iter().cloned());
        let entries = TocBuilder::new().build(&corpus);
        let mut next = 0;
        for entry in &entries {
            prop_assert_eq!(entry.start, next);
            prop_assert!(entry.end >= entry.start);
            prop_assert!(!entry.title.is_empty());
            next = entry.end + 1;
        }
        prop_assert_eq!(next, texts.len());
    }
}
