//! Single-file output formats: master text, Markdown, and JSON.
//! Consumes the canonical Book and writes one file per format.

use crate::model::Book;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use thiserror::Error;

/// Output format selector for the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Epub,
    Json,
    Text,
    Markdown,
}

/// Errors from the single-file writers.
#[derive(Debug, Error)]
pub enum FormatError {
    #[error("Cannot write: book title is empty.")]
    EmptyTitle,

    #[error("Cannot write: book author is empty.")]
    EmptyAuthor,

    #[error("Failed to write output: {path}: {source}")]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write output: {0}")]
    Write(#[from] std::io::Error),

    #[error("Failed to serialize book: {0}")]
    Json(#[from] serde_json::Error),
}

fn validate_book(book: &Book) -> Result<(), FormatError> {
    if book.title.trim().is_empty() {
        return Err(FormatError::EmptyTitle);
    }
    if book.author.trim().is_empty() {
        return Err(FormatError::EmptyAuthor);
    }
    Ok(())
}

fn create(path: &Path) -> Result<File, FormatError> {
    File::create(path).map_err(|e| FormatError::Io {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Write a master text file: title header, then each chapter as its heading
/// line followed by the body. The result re-segments into the same chapters.
pub fn write_text(book: &Book, path: &Path) -> Result<(), FormatError> {
    validate_book(book)?;
    let mut f = create(path)?;

    writeln!(f, "{}", book.title)?;
    writeln!(f, "作者: {}", book.author)?;
    for ch in &book.chapters {
        writeln!(f)?;
        writeln!(f, "{}", ch.title)?;
        writeln!(f, "{}", ch.body)?;
    }
    Ok(())
}

/// Write a single Markdown file: title and author header, then each chapter
/// as a `##` heading plus its paragraphs.
pub fn write_markdown(book: &Book, path: &Path) -> Result<(), FormatError> {
    validate_book(book)?;
    let mut f = create(path)?;

    writeln!(f, "# {}", book.title)?;
    writeln!(f)?;
    writeln!(f, "作者: {}", book.author)?;
    writeln!(f)?;
    writeln!(f, "---")?;
    for ch in &book.chapters {
        writeln!(f)?;
        writeln!(f, "## {}", ch.title)?;
        writeln!(f)?;
        writeln!(f, "{}", ch.body)?;
    }
    Ok(())
}

/// Write the canonical book as JSON (titles, bodies, sort keys).
pub fn write_json(book: &Book, path: &Path) -> Result<(), FormatError> {
    validate_book(book)?;
    let f = create(path)?;
    serde_json::to_writer_pretty(f, book)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Chapter, ChapterIndex, SortKey};
    use std::io::Read;

    fn minimal_book() -> Book {
        Book {
            title: "测试书".to_string(),
            author: "Luna".to_string(),
            chapters: vec![
                Chapter {
                    title: "第一章 开始".to_string(),
                    body: "内容A".to_string(),
                    sort_key: SortKey::new(0, ChapterIndex::Number(1)),
                },
                Chapter {
                    title: "第二章 继续".to_string(),
                    body: "内容B\n\n内容C".to_string(),
                    sort_key: SortKey::new(0, ChapterIndex::Number(2)),
                },
            ],
        }
    }

    fn read_back(path: &std::path::Path) -> String {
        let mut buf = String::new();
        File::open(path).unwrap().read_to_string(&mut buf).unwrap();
        std::fs::remove_file(path).ok();
        buf
    }

    #[test]
    fn write_text_contains_headings_and_bodies() {
        let book = minimal_book();
        let path = std::env::temp_dir().join("txtbind_test_text.txt");
        write_text(&book, &path).unwrap();
        let buf = read_back(&path);
        assert!(buf.starts_with("测试书\n作者: Luna\n"));
        assert!(buf.contains("\n第一章 开始\n内容A\n"));
        assert!(buf.contains("\n第二章 继续\n内容B\n\n内容C\n"));
    }

    #[test]
    fn master_text_resegments_to_same_chapters() {
        let book = minimal_book();
        let path = std::env::temp_dir().join("txtbind_test_text_roundtrip.txt");
        write_text(&book, &path).unwrap();
        let buf = read_back(&path);

        let segmenter =
            crate::segment::Segmenter::new(crate::segment::SegmentConfig::default()).unwrap();
        let chapters = segmenter.segment(&buf);
        // Title/author header lines become front matter; the chapters return
        // with the same titles and bodies.
        let titles: Vec<&str> = chapters.iter().map(|c| c.title.as_str()).collect();
        assert!(titles.contains(&"第一章 开始"));
        assert!(titles.contains(&"第二章 继续"));
        let second = chapters.iter().find(|c| c.title == "第二章 继续").unwrap();
        assert_eq!(second.body, "内容B\n\n内容C");
    }

    #[test]
    fn write_markdown_emits_chapter_headings() {
        let book = minimal_book();
        let path = std::env::temp_dir().join("txtbind_test_md.md");
        write_markdown(&book, &path).unwrap();
        let buf = read_back(&path);
        assert!(buf.starts_with("# 测试书"));
        assert!(buf.contains("## 第一章 开始"));
        assert!(buf.contains("内容A"));
    }

    #[test]
    fn write_json_round_trips() {
        let book = minimal_book();
        let path = std::env::temp_dir().join("txtbind_test_json.json");
        write_json(&book, &path).unwrap();
        let buf = read_back(&path);
        let back: Book = serde_json::from_str(&buf).unwrap();
        assert_eq!(back.title, book.title);
        assert_eq!(back.chapters.len(), 2);
        assert_eq!(back.chapters[1].body, "内容B\n\n内容C");
    }

    #[test]
    fn validate_rejects_empty_title() {
        let mut book = minimal_book();
        book.title.clear();
        let path = std::env::temp_dir().join("txtbind_void.txt");
        assert!(matches!(
            write_text(&book, &path),
            Err(FormatError::EmptyTitle)
        ));
    }

    #[test]
    fn validate_rejects_empty_author() {
        let mut book = minimal_book();
        book.author.clear();
        let path = std::env::temp_dir().join("txtbind_void.md");
        assert!(matches!(
            write_markdown(&book, &path),
            Err(FormatError::EmptyAuthor)
        ));
    }
}
