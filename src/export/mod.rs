//! Re-export of the source document in reconstructed order.
//!
//! The page tree is rebuilt flat under the existing root /Pages node. Values
//! of the inheritable page attributes (ISO 32000-1:2008, Table 30) are copied
//! down onto every page first, so pages keep their resources and geometry
//! once the intermediate nodes they inherited from are gone.
//!
//! When a TOC is embedded it becomes exported page 0 and every content page
//! shifts by one; TOC links point at the page object shown at the shifted
//! position, never at the pre-reorder index.

pub mod report;
mod toc_page;

pub use report::{escape_html, ReportWriter};

use crate::error::{Error, Result};
use crate::extract::inherited_attribute;
use crate::order::repair_permutation;
use crate::pipeline::{Stage, StageLog};
use crate::toc::TocEntry;
use lopdf::{Document, Object, ObjectId};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use toc_page::{TocLayout, TocLine};

/// Page attributes a page may inherit from its ancestors.
const INHERITABLE: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Exported position of an original page.
///
/// `offset` is the number of pages inserted ahead of the content pages
/// (1 with an embedded TOC page, 0 otherwise).
pub fn exported_page_index(order: &[usize], original: usize, offset: usize) -> Option<usize> {
    order
        .iter()
        .position(|&index| index == original)
        .map(|position| position + offset)
}

/// Writes reordered documents.
#[derive(Debug, Clone)]
pub struct ReconstructionExporter {
    embed_toc: bool,
    layout: TocLayout,
}

impl Default for ReconstructionExporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReconstructionExporter {
    /// Create an exporter that embeds a TOC page when given entries.
    pub fn new() -> Self {
        Self {
            embed_toc: true,
            layout: TocLayout::default(),
        }
    }

    /// Enable or disable the TOC page.
    pub fn with_toc(mut self, enable: bool) -> Self {
        self.embed_toc = enable;
        self
    }

    /// Reorder `source` and return the serialized document.
    pub fn export_bytes(&self, source: &[u8], order: &[usize], toc: &[TocEntry]) -> Result<Vec<u8>> {
        let mut doc = Document::load_mem(source)
            .map_err(|e| Error::Export(format!("cannot reopen source document: {}", e)))?;
        self.reorder_document(&mut doc, order, toc)?;

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes)?;
        Ok(bytes)
    }

    /// Reorder `source` and write it to `path`.
    ///
    /// The file only appears at `path` once it has been completely written.
    pub fn export_to_file(
        &self,
        source: &[u8],
        order: &[usize],
        toc: &[TocEntry],
        path: impl AsRef<Path>,
    ) -> Result<()> {
        let bytes = self.export_bytes(source, order, toc)?;
        write_atomic(path.as_ref(), &bytes)?;
        StageLog::new(Stage::Export).info(format_args!(
            "wrote {} bytes to {}",
            bytes.len(),
            path.as_ref().display()
        ));
        Ok(())
    }

    /// Rebuild the page tree of `doc` in `order`, inserting the TOC page.
    pub fn reorder_document(&self, doc: &mut Document, order: &[usize], toc: &[TocEntry]) -> Result<()> {
        let log = StageLog::new(Stage::Export);
        let page_ids: Vec<ObjectId> = doc.get_pages().values().copied().collect();
        let n = page_ids.len();

        if order.len() != n || repair_permutation(order, n).was_repaired() {
            return Err(Error::Export(format!(
                "order is not a permutation of the document's {} pages",
                n
            )));
        }

        let pages_id = root_pages_id(doc)?;
        for &page_id in &page_ids {
            flatten_page(doc, page_id, pages_id)?;
        }

        let mut kids: Vec<ObjectId> = order.iter().map(|&index| page_ids[index]).collect();

        if self.embed_toc && !toc.is_empty() {
            let lines: Vec<TocLine> = toc
                .iter()
                .filter_map(|entry| {
                    let position = exported_page_index(order, entry.start, 0);
                    if position.is_none() {
                        log.page_warn(entry.start, format_args!("TOC entry '{}' skipped: no such page", entry.title));
                    }
                    position.map(|position| TocLine {
                        title: entry.title.clone(),
                        level: entry.level,
                        page_number: position + 2,
                        target: kids[position],
                    })
                })
                .collect();
            let toc_id = self.layout.build_page(doc, pages_id, &lines)?;
            kids.insert(0, toc_id);
            log.info(format_args!("inserted TOC page with {} entries", lines.len()));
        }

        let pages = doc.get_object_mut(pages_id)?.as_dict_mut()?;
        pages.set(
            "Kids",
            Object::Array(kids.iter().map(|&id| Object::Reference(id)).collect()),
        );
        pages.set("Count", Object::Integer(kids.len() as i64));

        let pruned = doc.prune_objects();
        log.info(format_args!(
            "page tree rebuilt with {} pages ({} unreachable objects pruned)",
            kids.len(),
            pruned.len()
        ));
        Ok(())
    }
}

fn root_pages_id(doc: &Document) -> Result<ObjectId> {
    let catalog_id = doc.trailer.get(b"Root")?.as_reference()?;
    let pages_id = doc.get_dictionary(catalog_id)?.get(b"Pages")?.as_reference()?;
    Ok(pages_id)
}

/// Copy inherited attributes onto the page and re-parent it to the root node.
fn flatten_page(doc: &mut Document, page_id: ObjectId, pages_id: ObjectId) -> Result<()> {
    let own = doc.get_dictionary(page_id)?;
    let inherited: Vec<(&[u8], Object)> = INHERITABLE
        .iter()
        .filter(|key| !own.has(key))
        .filter_map(|&key| inherited_attribute(doc, page_id, key).map(|value| (key, value)))
        .collect();

    let page = doc.get_object_mut(page_id)?.as_dict_mut()?;
    for (key, value) in inherited {
        page.set(key, value);
    }
    page.set("Parent", Object::Reference(pages_id));
    Ok(())
}

/// Write `bytes` to `path` through a temporary file in the same directory.
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(bytes)?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|e| Error::Io(e.error))?;
    Ok(())
}

/// Output files written to temporaries in one directory and published together.
///
/// No file appears under its final name until [`StagedFiles::commit`]
/// succeeds for all of them. Dropping an uncommitted batch removes its
/// temporaries.
pub(crate) struct StagedFiles {
    dir: PathBuf,
    files: Vec<(NamedTempFile, PathBuf)>,
}

impl StagedFiles {
    /// Stage files into `dir`, creating it if needed.
    pub(crate) fn new(dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
            files: Vec::new(),
        })
    }

    /// Write `bytes` to a temporary that will become `dir/name`.
    pub(crate) fn add(&mut self, name: &str, bytes: &[u8]) -> Result<PathBuf> {
        let mut file = NamedTempFile::new_in(&self.dir)?;
        file.write_all(bytes)?;
        file.as_file().sync_all()?;
        let path = self.dir.join(name);
        self.files.push((file, path.clone()));
        Ok(path)
    }

    /// Move every staged file to its final name, in the order added.
    ///
    /// If one fails, files already published by this call are removed again.
    pub(crate) fn commit(self) -> Result<Vec<PathBuf>> {
        let mut published: Vec<PathBuf> = Vec::with_capacity(self.files.len());
        for (file, path) in self.files {
            if let Err(e) = file.persist(&path) {
                for done in &published {
                    if let Err(remove) = std::fs::remove_file(done) {
                        StageLog::new(Stage::Export)
                            .warn(format_args!("could not remove {}: {}", done.display(), remove));
                    }
                }
                return Err(Error::Io(e.error));
            }
            published.push(path);
        }
        Ok(published)
    }
}
