//! Canonical data model for segmented books.
//!
//! The segmenter produces this shape; the EPUB and single-file writers
//! consume it as the single source of truth.

use serde::{Deserialize, Serialize};

/// Chapter position within a volume.
///
/// Titles that carry no explicit chapter number get [ChapterIndex::Unnumbered],
/// which sorts after every numbered chapter of the same volume. Volume header
/// lines use `Number(0)` so they sort before their first chapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ChapterIndex {
    Number(u64),
    Unnumbered,
}

/// Reading-order key: volume first, then chapter index.
///
/// The volume carries forward from the most recent volume header; content
/// before any header is volume 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SortKey {
    pub volume: u64,
    pub index: ChapterIndex,
}

impl SortKey {
    /// Key of the synthetic front-matter chapter; sorts before everything.
    pub const FRONT_MATTER: SortKey = SortKey {
        volume: 0,
        index: ChapterIndex::Number(0),
    };

    /// Key of the whole-input fallback chapter when no structure is found.
    pub const BODY_FALLBACK: SortKey = SortKey {
        volume: 0,
        index: ChapterIndex::Number(1),
    };

    pub fn new(volume: u64, index: ChapterIndex) -> Self {
        SortKey { volume, index }
    }
}

/// One logical chapter.
///
/// `title` is the heading line as produced by the classifier (marker prefix
/// included when insertion is enabled). `body` is the newline-joined content
/// with single blank lines preserved as empty strings for paragraph spacing.
/// Identity for de-duplication and merging is the `title` string.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chapter {
    pub title: String,
    pub body: String,
    #[serde(rename = "sortKey")]
    pub sort_key: SortKey,
}

/// Canonical book shape: ordered chapters plus display metadata.
///
/// Chapter order is either encounter order or ascending [SortKey] order,
/// never a mixture; the segmenter decides before the book is assembled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Book {
    pub title: String,
    pub author: String,
    pub chapters: Vec<Chapter>,
}
