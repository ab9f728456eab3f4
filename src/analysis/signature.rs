//! Perceptual page signatures.
//!
//! A signature is a 64-bit difference hash (dHash) of a page thumbnail: the
//! image is reduced to 9×8 grayscale and each bit records whether a pixel is
//! brighter than its right-hand neighbour. Visually identical pages differ in
//! only a few bits even after re-scanning or recompression.
//!
//! Rendering pages to thumbnails is outside this crate; thumbnails are read
//! from a [`ThumbnailSource`].

use crate::corpus::Corpus;
use crate::error::{Error, Result};
use crate::pipeline::{Stage, StageLog};
use image::imageops::FilterType;
use image::DynamicImage;
use std::path::{Path, PathBuf};

/// Compute the 64-bit difference hash of an image.
pub fn difference_hash(image: &DynamicImage) -> u64 {
    let small = image.resize_exact(9, 8, FilterType::Triangle).to_luma8();
    let mut hash = 0u64;
    for y in 0..8 {
        for x in 0..8 {
            let left = small.get_pixel(x, y)[0];
            let right = small.get_pixel(x + 1, y)[0];
            hash = (hash << 1) | u64::from(left > right);
        }
    }
    hash
}

/// Number of differing bits between two signatures.
pub fn hamming_distance(a: u64, b: u64) -> u32 {
    (a ^ b).count_ones()
}

/// Supplies page thumbnails by original page index.
pub trait ThumbnailSource {
    /// Thumbnail of a page, `Ok(None)` if the source has none for it.
    fn thumbnail(&self, index: usize) -> Result<Option<DynamicImage>>;
}

/// Thumbnails stored as `page-<n>.png` / `.jpg` files, `n` being 1-based.
///
/// Zero-padded names (`page-01.png`, `page-001.png`) are also recognised.
#[derive(Debug, Clone)]
pub struct ThumbnailDir {
    dir: PathBuf,
}

impl ThumbnailDir {
    /// Use thumbnails from `dir`.
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    fn find(&self, index: usize) -> Option<PathBuf> {
        let n = index + 1;
        let stems = [
            format!("page-{}", n),
            format!("page-{:02}", n),
            format!("page-{:03}", n),
            format!("page-{:04}", n),
        ];
        stems
            .iter()
            .flat_map(|stem| ["png", "jpg", "jpeg"].map(|ext| self.dir.join(format!("{}.{}", stem, ext))))
            .find(|path| path.is_file())
    }
}

impl ThumbnailSource for ThumbnailDir {
    fn thumbnail(&self, index: usize) -> Result<Option<DynamicImage>> {
        match self.find(index) {
            Some(path) => image::open(&path)
                .map(Some)
                .map_err(|e| Error::Image(format!("{}: {}", path.display(), e))),
            None => Ok(None),
        }
    }
}

/// Attach a signature to every page the source has a readable thumbnail for.
///
/// Unreadable thumbnails are logged and leave the page without a signature.
pub fn attach_signatures(corpus: Corpus, source: &dyn ThumbnailSource) -> Corpus {
    let log = StageLog::new(Stage::Duplicates);
    corpus.map_pages(|page| match source.thumbnail(page.index()) {
        Ok(Some(image)) => {
            let signature = difference_hash(&image);
            log.page_debug(page.index(), format_args!("signature {:016x}", signature));
            page.with_signature(signature)
        },
        Ok(None) => page,
        Err(e) => {
            log.page_warn(page.index(), format_args!("no signature: {}", e));
            page
        },
    })
}
