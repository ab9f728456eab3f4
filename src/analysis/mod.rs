//! Order-independent corpus analysis: duplicates, missing pages and the
//! per-page inputs they rely on.

pub mod duplicates;
pub mod embeddings;
pub mod missing;
pub mod signature;

pub use duplicates::{DuplicateDetector, DuplicateGroup, DuplicateMethod};
pub use embeddings::EmbeddingSet;
pub use missing::{MissingGap, MissingPageAnalyzer};
pub use signature::{attach_signatures, difference_hash, hamming_distance, ThumbnailDir, ThumbnailSource};
