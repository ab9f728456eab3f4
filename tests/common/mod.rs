//! Shared helpers for building small PDFs in integration tests.

#![allow(dead_code)]

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};

/// Build a PDF with one page per entry; each line becomes its own text block.
///
/// Resources and MediaBox live on the root /Pages node. Pages after the first
/// sit under an intermediate /Pages node that sets /Rotate 90, so every page
/// inherits something.
pub fn build_pdf(pages: &[&[&str]]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let inner_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });

    let mut root_kids = Vec::new();
    let mut inner_kids = Vec::new();
    for (i, lines) in pages.iter().enumerate() {
        let parent = if i == 0 { pages_id } else { inner_id };
        let page_id = add_page(&mut doc, parent, lines);
        if i == 0 {
            root_kids.push(Object::Reference(page_id));
        } else {
            inner_kids.push(Object::Reference(page_id));
        }
    }

    if !inner_kids.is_empty() {
        let count = inner_kids.len() as i64;
        doc.objects.insert(
            inner_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Parent" => pages_id,
                "Kids" => inner_kids,
                "Count" => Object::Integer(count),
                "Rotate" => Object::Integer(90),
            }),
        );
        root_kids.push(Object::Reference(inner_id));
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => root_kids,
            "Count" => Object::Integer(pages.len() as i64),
            "Resources" => dictionary! {
                "Font" => dictionary! { "F1" => font_id },
            },
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(612),
                Object::Integer(792),
            ],
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

fn add_page(doc: &mut Document, parent: ObjectId, lines: &[&str]) -> ObjectId {
    let mut operations = Vec::new();
    for (i, line) in lines.iter().enumerate() {
        operations.extend([
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), Object::Integer(12)]),
            Operation::new(
                "Td",
                vec![Object::Integer(72), Object::Integer(720 - 20 * i as i64)],
            ),
            Operation::new("Tj", vec![Object::string_literal(*line)]),
            Operation::new("ET", vec![]),
        ]);
    }
    let content = Content { operations };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
    doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => parent,
        "Contents" => content_id,
    })
}

/// Page object ids of a serialized document, in page order.
pub fn page_ids(bytes: &[u8]) -> (Document, Vec<ObjectId>) {
    let doc = Document::load_mem(bytes).unwrap();
    let ids = doc.get_pages().values().copied().collect();
    (doc, ids)
}

/// Decoded content stream of a page as text.
pub fn page_content(doc: &Document, page_id: ObjectId) -> String {
    String::from_utf8_lossy(&doc.get_page_content(page_id).unwrap()).into_owned()
}
