//! Layout of the inserted table of contents page.

use crate::error::Result;
use crate::pipeline::{Stage, StageLog};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};

/// One line of the TOC page.
#[derive(Debug, Clone)]
pub(crate) struct TocLine {
    pub title: String,
    pub level: u8,
    /// 1-based exported page number shown to the reader
    pub page_number: usize,
    /// Page object the line links to
    pub target: ObjectId,
}

/// Geometry of the TOC page, in points.
#[derive(Debug, Clone)]
pub(crate) struct TocLayout {
    pub width: f32,
    pub height: f32,
    pub margin: f32,
    pub heading_size: f32,
    pub entry_size: f32,
    pub max_line_height: f32,
    pub min_line_height: f32,
    pub indent: f32,
    pub max_title_chars: usize,
}

impl Default for TocLayout {
    fn default() -> Self {
        // A4 portrait
        Self {
            width: 595.0,
            height: 842.0,
            margin: 72.0,
            heading_size: 18.0,
            entry_size: 11.0,
            max_line_height: 18.0,
            min_line_height: 12.0,
            indent: 18.0,
            max_title_chars: 64,
        }
    }
}

impl TocLayout {
    fn first_baseline(&self) -> f32 {
        self.height - self.margin - 2.5 * self.heading_size
    }

    /// Line spacing and the number of lines that fit on the page.
    fn fit(&self, count: usize) -> (f32, usize) {
        let span = self.first_baseline() - self.margin;
        let line_height = if count <= 1 {
            self.max_line_height
        } else {
            (span / (count - 1) as f32).clamp(self.min_line_height, self.max_line_height)
        };
        let capacity = (span / line_height + 1e-3).floor() as usize + 1;
        (line_height, capacity.min(count))
    }

    /// Add the TOC page and its link annotations to `doc`; returns the page id.
    ///
    /// The page is not yet attached to the page tree.
    pub(crate) fn build_page(&self, doc: &mut Document, parent: ObjectId, lines: &[TocLine]) -> Result<ObjectId> {
        let log = StageLog::new(Stage::Export);
        let (line_height, shown) = self.fit(lines.len());
        if shown < lines.len() {
            log.warn(format_args!(
                "TOC page holds {} of {} entries; the rest are omitted",
                shown,
                lines.len()
            ));
        }

        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        });

        let mut operations = text_at(
            self.margin,
            self.height - self.margin - self.heading_size,
            self.heading_size,
            "Table of Contents",
        );
        let number_x = self.width - self.margin - 24.0;
        let mut annotations = Vec::with_capacity(shown);

        for (i, line) in lines.iter().take(shown).enumerate() {
            let y = self.first_baseline() - i as f32 * line_height;
            let x = self.margin + f32::from(line.level.saturating_sub(1).min(3)) * self.indent;

            operations.extend(text_at(x, y, self.entry_size, &self.truncate(&line.title)));
            operations.extend(text_at(number_x, y, self.entry_size, &line.page_number.to_string()));

            let rect = [self.margin, y - 3.0, self.width - self.margin, y + self.entry_size];
            annotations.push(Object::Reference(doc.add_object(link_annotation(rect, line.target))));
        }

        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => parent,
            "MediaBox" => vec![Object::Integer(0), Object::Integer(0), Object::Real(self.width), Object::Real(self.height)],
            "Resources" => dictionary! {
                "Font" => dictionary! { "F1" => font_id },
            },
            "Contents" => content_id,
            "Annots" => annotations,
        });
        Ok(page_id)
    }

    fn truncate(&self, title: &str) -> String {
        let ascii = to_win_ansi(title);
        if ascii.chars().count() <= self.max_title_chars {
            return ascii;
        }
        let mut cut: String = ascii.chars().take(self.max_title_chars - 3).collect();
        cut.push_str("...");
        cut
    }
}

/// `[page /Fit]` link annotation covering `rect`.
fn link_annotation(rect: [f32; 4], target: ObjectId) -> lopdf::Dictionary {
    dictionary! {
        "Type" => "Annot",
        "Subtype" => "Link",
        "Rect" => rect.iter().map(|&v| Object::Real(v)).collect::<Vec<Object>>(),
        "Border" => vec![Object::Integer(0), Object::Integer(0), Object::Integer(0)],
        "A" => dictionary! {
            "S" => "GoTo",
            "D" => vec![Object::Reference(target), "Fit".into()],
        },
    }
}

fn text_at(x: f32, y: f32, size: f32, text: &str) -> Vec<Operation> {
    vec![
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec!["F1".into(), Object::Real(size)]),
        Operation::new("Td", vec![Object::Real(x), Object::Real(y)]),
        Operation::new("Tj", vec![Object::string_literal(text)]),
        Operation::new("ET", vec![]),
    ]
}

/// Replace characters the standard Helvetica encoding cannot show.
fn to_win_ansi(text: &str) -> String {
    text.chars()
        .map(|c| if c.is_ascii() && !c.is_ascii_control() { c } else { '?' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_shrinks_then_caps() {
        let layout = TocLayout::default();
        let (height, shown) = layout.fit(5);
        assert_eq!(height, 18.0);
        assert_eq!(shown, 5);

        let (height, shown) = layout.fit(45);
        assert!(height < 18.0 && height >= 12.0);
        assert_eq!(shown, 45);

        let (height, shown) = layout.fit(500);
        assert_eq!(height, 12.0);
        assert!(shown < 500);
    }

    #[test]
    fn test_truncate_and_sanitize() {
        let layout = TocLayout::default();
        assert_eq!(layout.truncate("Résumé"), "R?sum?");
        let long = "x".repeat(100);
        let cut = layout.truncate(&long);
        assert_eq!(cut.len(), 64);
        assert!(cut.ends_with("..."));
    }

    #[test]
    fn test_build_page_links() {
        let mut doc = Document::with_version("1.5");
        let parent = doc.new_object_id();
        let target = doc.new_object_id();
        let lines = vec![TocLine {
            title: "Intro".to_string(),
            level: 1,
            page_number: 2,
            target,
        }];
        let page_id = TocLayout::default().build_page(&mut doc, parent, &lines).unwrap();

        let page = doc.get_dictionary(page_id).unwrap();
        let annots = page.get(b"Annots").unwrap().as_array().unwrap();
        assert_eq!(annots.len(), 1);
        let annot = doc.get_dictionary(annots[0].as_reference().unwrap()).unwrap();
        let action = annot.get(b"A").unwrap().as_dict().unwrap();
        let dest = action.get(b"D").unwrap().as_array().unwrap();
        assert_eq!(dest[0].as_reference().unwrap(), target);
        assert_eq!(dest[1].as_name().unwrap(), b"Fit");
    }
}
