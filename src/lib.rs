//! txtbind: segment loose plain-text novels into ordered chapters and bind
//! them into e-books.

pub mod cli;
pub mod config;
pub mod epub;
pub mod formats;
pub mod model;
pub mod notify;
pub mod segment;
pub mod source;

// Re-exports for CLI and consumers.
pub use epub::{write_epub, EpubError, EpubVersion};
pub use formats::{write_json, write_markdown, write_text, FormatError, OutputFormat};
pub use model::{Book, Chapter, ChapterIndex, SortKey};
pub use segment::{DetectionMode, HeadingClassifier, SegmentConfig, Segmenter};
pub use source::{needs_update, read_text, scan_tasks, txt_files_by_mtime, SourceError, Task};
