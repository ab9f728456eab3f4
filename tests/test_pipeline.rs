//! End-to-end reconstruction tests.

mod common;

use common::{build_pdf, page_content, page_ids};
use pdf_reconstruct::{
    CancellationToken, EmbeddingSet, Error, ReconstructConfig, Reconstructor, Stage,
};
use std::fs;
use tempfile::tempdir;

fn scrambled() -> Vec<u8> {
    build_pdf(&[
        &["third part of the story", "Page 3"],
        &["opening of the story", "Page 1"],
        &["middle of the story", "Page 2"],
    ])
}

#[test]
fn test_reconstruct_to_dir() {
    let dir = tempdir().unwrap();
    let (outcome, path) = Reconstructor::new(ReconstructConfig::default())
        .reconstruct_to_dir(&scrambled(), dir.path())
        .unwrap();

    assert_eq!(outcome.order.order, vec![1, 2, 0]);
    assert!(outcome.toc_embedded);
    assert!(!outcome.order.reasoning.is_empty());

    assert_eq!(path, dir.path().join("reconstructed.pdf"));
    for name in ["log.json", "toc.json", "duplicates_missing.json", "report.html"] {
        assert!(dir.path().join(name).is_file(), "missing {}", name);
    }

    let (doc, ids) = page_ids(&fs::read(&path).unwrap());
    assert_eq!(ids.len(), 4);
    assert!(page_content(&doc, ids[0]).contains("Table of Contents"));
    assert!(page_content(&doc, ids[1]).contains("opening"));
    assert!(page_content(&doc, ids[3]).contains("third"));

    let log: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(dir.path().join("log.json")).unwrap()).unwrap();
    assert_eq!(log["pageCount"], 3);
    assert_eq!(log["order"], serde_json::json!([1, 2, 0]));
}

#[test]
fn test_reconstruct_without_toc_or_reports() {
    let dir = tempdir().unwrap();
    let config = ReconstructConfig::new()
        .with_embed_toc(false)
        .with_reports(false);
    let (outcome, path) = Reconstructor::new(config)
        .reconstruct_to_dir(&scrambled(), dir.path())
        .unwrap();

    assert!(!outcome.toc_embedded);
    assert!(!outcome.toc.is_empty());
    assert!(!dir.path().join("log.json").exists());

    let (doc, ids) = page_ids(&fs::read(&path).unwrap());
    assert_eq!(ids.len(), 3);
    assert!(page_content(&doc, ids[0]).contains("opening"));
}

#[test]
fn test_cancelled_run_writes_nothing() {
    let dir = tempdir().unwrap();
    let token = CancellationToken::new();
    token.cancel();

    let err = Reconstructor::new(ReconstructConfig::default())
        .with_cancellation(token)
        .reconstruct_to_dir(&scrambled(), dir.path())
        .unwrap_err();

    assert!(matches!(err, Error::Cancelled { .. }));
    assert_eq!(err.stage(), Some(Stage::Extraction));
    assert!(!dir.path().join("reconstructed.pdf").exists());
}

#[test]
fn test_unreadable_input_fails_in_extraction() {
    let dir = tempdir().unwrap();
    let err = Reconstructor::new(ReconstructConfig::default())
        .reconstruct_to_dir(b"definitely not a pdf", dir.path())
        .unwrap_err();

    assert_eq!(err.stage(), Some(Stage::Extraction));
    assert!(!dir.path().join("reconstructed.pdf").exists());
}

#[test]
fn test_embeddings_attached_during_extraction() {
    let embeddings = EmbeddingSet::from_json_str("[[1.0, 0.0], null, [0.0, 1.0]]").unwrap();
    let reconstructor =
        Reconstructor::new(ReconstructConfig::default()).with_embeddings(embeddings.clone());
    let corpus = reconstructor.extract(&scrambled()).unwrap();
    assert_eq!(corpus.embedding_count(), 2);

    let disabled = Reconstructor::new(ReconstructConfig::new().with_embeddings(false))
        .with_embeddings(embeddings);
    assert_eq!(disabled.extract(&scrambled()).unwrap().embedding_count(), 0);
}

#[test]
fn test_reconstruct_bytes_keeps_page_count() {
    let (outcome, bytes) = Reconstructor::new(ReconstructConfig::default())
        .reconstruct_bytes(&scrambled())
        .unwrap();
    let (_, ids) = page_ids(&bytes);
    assert_eq!(ids.len(), outcome.corpus.len() + outcome.toc_offset());
}

#[test]
fn test_failed_report_leaves_no_document() {
    let dir = tempdir().unwrap();
    fs::create_dir(dir.path().join("log.json")).unwrap();

    let err = Reconstructor::new(ReconstructConfig::default())
        .reconstruct_to_dir(&scrambled(), dir.path())
        .unwrap_err();

    assert_eq!(err.stage(), Some(Stage::Report));
    assert!(!dir.path().join("reconstructed.pdf").exists());
    // Only the blocking directory remains; no temporaries or partial reports.
    let names: Vec<_> = fs::read_dir(dir.path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name())
        .collect();
    assert_eq!(names, vec![std::ffi::OsString::from("log.json")]);
}
