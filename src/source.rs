//! Source-text access: decoded file reading, task discovery, and the
//! recency ordering the merge path requires.
//!
//! The segmenter only ever sees fully decoded text from here; bytes and
//! encoding names stop at this boundary.

use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Attempts per file read; transient I/O failures get one more try.
const READ_RETRIES: u32 = 2;
const RETRY_PAUSE: Duration = Duration::from_secs(1);

/// Errors from source discovery and reading.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Cannot read source file: {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Source path does not exist or is not a file or directory: {path}")]
    InvalidPath { path: PathBuf },

    #[error("No readable .txt sources under: {path}")]
    NoSources { path: PathBuf },
}

/// One unit of conversion work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Task {
    /// A standalone text file converted on its own.
    Single { path: PathBuf },
    /// A directory of text files merged into one book. `files` are ordered
    /// oldest to newest by modification time.
    Merge { dir: PathBuf, files: Vec<PathBuf> },
}

impl Task {
    /// Book title derived from the file stem or directory name.
    pub fn book_name(&self) -> String {
        let path = match self {
            Task::Single { path } => path.as_path(),
            Task::Merge { dir, .. } => dir.as_path(),
        };
        path.file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "book".to_string())
    }

    /// All files feeding this task, for up-to-date checks.
    pub fn source_paths(&self) -> Vec<PathBuf> {
        match self {
            Task::Single { path } => vec![path.clone()],
            Task::Merge { files, .. } => files.clone(),
        }
    }
}

fn is_txt(path: &Path) -> bool {
    path.extension()
        .map(|e| e.eq_ignore_ascii_case("txt"))
        .unwrap_or(false)
}

/// Read a source file and decode it to text.
///
/// Tries UTF-8 (BOM-aware, including UTF-16 BOMs), then GB18030, then Big5;
/// the first encoding that decodes without malformed sequences wins, with a
/// lossy UTF-8 fallback. One retry with a short pause on I/O failure.
pub fn read_text(path: &Path) -> Result<String, SourceError> {
    let mut last_err: Option<std::io::Error> = None;
    for attempt in 0..READ_RETRIES {
        match std::fs::read(path) {
            Ok(bytes) => {
                let (text, encoding) = decode_text(&bytes);
                debug!(path = %path.display(), encoding, "decoded source file");
                return Ok(text);
            }
            Err(e) => {
                if attempt < READ_RETRIES - 1 {
                    warn!(path = %path.display(), error = %e, "read failed, retrying");
                    std::thread::sleep(RETRY_PAUSE);
                }
                last_err = Some(e);
            }
        }
    }
    Err(SourceError::Read {
        path: path.to_path_buf(),
        source: last_err.unwrap_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::Other, "read retries exhausted")
        }),
    })
}

/// Decode raw bytes to text, returning the encoding name used.
pub(crate) fn decode_text(bytes: &[u8]) -> (String, &'static str) {
    if let Some((encoding, _)) = encoding_rs::Encoding::for_bom(bytes) {
        let (text, _, _) = encoding.decode(bytes);
        return (text.into_owned(), encoding.name());
    }
    for encoding in [encoding_rs::UTF_8, encoding_rs::GB18030, encoding_rs::BIG5] {
        let (text, _, had_errors) = encoding.decode(bytes);
        if !had_errors {
            return (text.into_owned(), encoding.name());
        }
    }
    warn!("no candidate encoding decoded cleanly; using lossy UTF-8");
    let (text, _, _) = encoding_rs::UTF_8.decode(bytes);
    (text.into_owned(), "UTF-8")
}

/// The `.txt` files directly inside `dir`, ordered oldest to newest by
/// modification time. Files whose metadata cannot be read are skipped with a
/// warning.
pub fn txt_files_by_mtime(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<(PathBuf, std::time::SystemTime)> = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "skipping unreadable directory entry");
                continue;
            }
        };
        let path = entry.path();
        if !entry.file_type().is_file() || !is_txt(path) {
            continue;
        }
        match std::fs::metadata(path).and_then(|m| m.modified()) {
            Ok(mtime) => files.push((path.to_path_buf(), mtime)),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "cannot read modification time, skipping file");
            }
        }
    }
    files.sort_by_key(|(_, mtime)| *mtime);
    files.into_iter().map(|(path, _)| path).collect()
}

/// Discover conversion tasks under a source directory: each immediate
/// subdirectory with `.txt` files is a merge task, each top-level `.txt`
/// file a single task.
pub fn scan_tasks(root: &Path) -> Result<Vec<Task>, SourceError> {
    if !root.is_dir() {
        return Err(SourceError::InvalidPath {
            path: root.to_path_buf(),
        });
    }

    let mut tasks = Vec::new();
    for entry in WalkDir::new(root).min_depth(1).max_depth(1).sort_by_file_name() {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                warn!(root = %root.display(), error = %e, "skipping unreadable entry");
                continue;
            }
        };
        let path = entry.path();
        if entry.file_type().is_dir() {
            let files = txt_files_by_mtime(path);
            if !files.is_empty() {
                tasks.push(Task::Merge {
                    dir: path.to_path_buf(),
                    files,
                });
            }
        } else if entry.file_type().is_file() && is_txt(path) {
            tasks.push(Task::Single {
                path: path.to_path_buf(),
            });
        }
    }

    if tasks.is_empty() {
        return Err(SourceError::NoSources {
            path: root.to_path_buf(),
        });
    }
    info!(count = tasks.len(), root = %root.display(), "scanned tasks");
    Ok(tasks)
}

/// Whether `dest` must be regenerated: it does not exist, or any source is
/// newer than it.
pub fn needs_update(sources: &[PathBuf], dest: &Path) -> bool {
    let dest_mtime = match std::fs::metadata(dest).and_then(|m| m.modified()) {
        Ok(t) => t,
        Err(_) => {
            debug!(dest = %dest.display(), "destination missing, will generate");
            return true;
        }
    };
    for source in sources {
        match std::fs::metadata(source).and_then(|m| m.modified()) {
            Ok(t) if t > dest_mtime => {
                info!(source = %source.display(), "source newer than destination");
                return true;
            }
            Ok(_) => {}
            Err(e) => {
                warn!(source = %source.display(), error = %e, "cannot check source mtime");
            }
        }
    }
    info!(dest = %dest.display(), "destination up to date, skipping");
    false
}
