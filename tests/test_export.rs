//! Integration tests for reordered export and TOC link targets.

mod common;

use common::{build_pdf, page_content, page_ids};
use pdf_reconstruct::{exported_page_index, Error, ReconstructionExporter, TocEntry, TocSource};
use std::fs;
use tempfile::tempdir;

fn three_pages() -> Vec<u8> {
    build_pdf(&[&["Marker A"], &["Marker B"], &["Marker C"]])
}

fn entry(title: &str, start: usize, end: usize) -> TocEntry {
    TocEntry {
        title: title.to_string(),
        start,
        end,
        level: 1,
        source: TocSource::Heading,
    }
}

#[test]
fn test_reorder_without_toc() {
    let out = ReconstructionExporter::new()
        .with_toc(false)
        .export_bytes(&three_pages(), &[2, 0, 1], &[])
        .unwrap();

    let (doc, ids) = page_ids(&out);
    assert_eq!(ids.len(), 3);
    assert!(page_content(&doc, ids[0]).contains("Marker C"));
    assert!(page_content(&doc, ids[1]).contains("Marker A"));
    assert!(page_content(&doc, ids[2]).contains("Marker B"));
}

#[test]
fn test_toc_link_follows_permutation() {
    let order = [2, 0, 1];
    let toc = [entry("Opening", 0, 0), entry("Middle", 1, 2)];
    let out = ReconstructionExporter::new()
        .export_bytes(&three_pages(), &order, &toc)
        .unwrap();

    let (doc, ids) = page_ids(&out);
    assert_eq!(ids.len(), 4);
    assert!(page_content(&doc, ids[0]).contains("Table of Contents"));

    let expected = exported_page_index(&order, 0, 1).unwrap();
    assert_eq!(expected, 2);

    let toc_page = doc.get_dictionary(ids[0]).unwrap();
    let annots = toc_page.get(b"Annots").unwrap().as_array().unwrap();
    assert_eq!(annots.len(), 2);

    let link = doc
        .get_dictionary(annots[0].as_reference().unwrap())
        .unwrap();
    assert_eq!(link.get(b"Subtype").unwrap().as_name().unwrap(), b"Link");
    let action = link.get(b"A").unwrap().as_dict().unwrap();
    assert_eq!(action.get(b"S").unwrap().as_name().unwrap(), b"GoTo");
    let dest = action.get(b"D").unwrap().as_array().unwrap();
    assert_eq!(dest[0].as_reference().unwrap(), ids[expected]);
    assert_eq!(dest[1].as_name().unwrap(), b"Fit");
    assert!(page_content(&doc, ids[expected]).contains("Marker A"));

    // Displayed number is the 1-based exported page.
    assert!(page_content(&doc, ids[0]).contains("(3)"));
}

#[test]
fn test_inherited_attributes_pushed_down() {
    let out = ReconstructionExporter::new()
        .with_toc(false)
        .export_bytes(&three_pages(), &[1, 2, 0], &[])
        .unwrap();

    let (doc, ids) = page_ids(&out);
    for &id in &ids {
        let page = doc.get_dictionary(id).unwrap();
        assert!(page.has(b"Resources"));
        assert!(page.has(b"MediaBox"));
    }

    // Pages 1 and 2 inherited /Rotate 90 from an intermediate node that is gone now.
    let rotated = doc.get_dictionary(ids[0]).unwrap();
    assert_eq!(rotated.get(b"Rotate").unwrap().as_i64().unwrap(), 90);
    let unrotated = doc.get_dictionary(ids[2]).unwrap();
    assert!(!unrotated.has(b"Rotate"));

    let parent = rotated.get(b"Parent").unwrap().as_reference().unwrap();
    let kids = doc.get_dictionary(parent).unwrap().get(b"Kids").unwrap().as_array().unwrap();
    assert_eq!(kids.len(), 3);
}

#[test]
fn test_invalid_order_rejected() {
    let exporter = ReconstructionExporter::new();
    for order in [vec![0, 1], vec![0, 0, 1], vec![0, 1, 5]] {
        let result = exporter.export_bytes(&three_pages(), &order, &[]);
        assert!(matches!(result, Err(Error::Export(_))), "order {:?}", order);
    }
}

#[test]
fn test_export_to_file_is_atomic() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("reconstructed.pdf");
    let exporter = ReconstructionExporter::new();

    assert!(exporter
        .export_to_file(&three_pages(), &[0, 0, 0], &[], &path)
        .is_err());
    assert!(!path.exists());
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);

    exporter
        .export_to_file(&three_pages(), &[0, 1, 2], &[entry("All", 0, 2)], &path)
        .unwrap();
    let (_, ids) = page_ids(&fs::read(&path).unwrap());
    assert_eq!(ids.len(), 4);
}
