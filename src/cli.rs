//! CLI parsing and orchestration. Parses args, resolves tasks (single file,
//! merged directory, or batch scan), runs segmentation, and writes EPUB,
//! JSON, text, or Markdown. Maps errors to exit codes.

use crate::config;
use crate::epub::{write_epub, EpubError, EpubVersion};
use crate::formats::{write_json, write_markdown, write_text, FormatError, OutputFormat};
use crate::model::Book;
use crate::notify::notify_best_effort;
use crate::segment::{DetectionMode, SegmentConfig, Segmenter};
use crate::source::{self, SourceError, Task};
use clap::Parser;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::error;

const DEFAULT_AUTHOR: &str = "Luna";
const DEFAULT_MARKER: &str = "#";

/// CLI error carrying exit code and message.
#[derive(Debug, Error)]
pub enum CliRunError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    Source(#[from] SourceError),

    #[error("{0}")]
    Epub(#[from] EpubError),

    #[error("{0}")]
    Format(#[from] FormatError),
}

impl CliRunError {
    pub fn exit_code(&self) -> i32 {
        match self {
            CliRunError::InvalidInput(_) => 1,
            CliRunError::Source(_) => 2,
            CliRunError::Epub(_) | CliRunError::Format(_) => 3,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "txtbind")]
#[command(about = "Segment plain-text novels into chapters and bind them into e-books")]
#[command(
    after_help = "Config file keys (output_dir, author, detection_mode, double_blank_split, marker_insertion, marker, sorting, bark_url, cover_image) are read from ./txtbind.toml or the XDG config dir. CLI flags override config."
)]
pub struct Args {
    /// Input: a .txt file, or a directory whose .txt files are merged into
    /// one book (oldest file first).
    pub input: PathBuf,

    /// Output path. Default: {output_dir}/{book name}.{ext}.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Output format: epub, json, text, or markdown.
    #[arg(long, default_value = "epub", value_parser = parse_format)]
    pub format: OutputFormat,

    /// Treat the input directory as a library: each subdirectory merges into
    /// one book, loose .txt files convert individually.
    #[arg(long)]
    pub batch: bool,

    /// Book title override (ignored in batch mode).
    #[arg(long)]
    pub title: Option<String>,

    /// Author written into book metadata.
    #[arg(long)]
    pub author: Option<String>,

    /// Chapter detection mode: both (default), pattern, or blank-line.
    #[arg(long, value_parser = parse_detection_mode)]
    pub detection: Option<DetectionMode>,

    /// Disable double-blank-line chapter splitting.
    #[arg(long)]
    pub no_blank_split: bool,

    /// Prefix detected headings with the marker string.
    #[arg(long)]
    pub mark_headings: bool,

    /// Marker string used by --mark-headings.
    #[arg(long)]
    pub marker: Option<String>,

    /// Reorder chapters by (volume, chapter) instead of encounter order.
    #[arg(long)]
    pub sort: bool,

    /// Generate EPUB 2 instead of EPUB 3 (only when format is epub).
    #[arg(long)]
    pub epub_2: bool,

    /// Include toc.ncx in EPUB 3 output for legacy readers.
    #[arg(long)]
    pub ncx: bool,

    /// Regenerate even when the destination is newer than all sources.
    #[arg(long)]
    pub force: bool,

    /// Suppress progress output (errors only).
    #[arg(short, long)]
    pub quiet: bool,

    /// Print verbose error chain.
    #[arg(long)]
    pub verbose: bool,
}

fn parse_format(s: &str) -> Result<OutputFormat, String> {
    match s.to_lowercase().as_str() {
        "epub" => Ok(OutputFormat::Epub),
        "json" => Ok(OutputFormat::Json),
        "text" | "txt" => Ok(OutputFormat::Text),
        "markdown" | "md" => Ok(OutputFormat::Markdown),
        _ => Err(format!(
            "Invalid --format value: '{}'. Use epub, json, text, or markdown.",
            s
        )),
    }
}

fn parse_detection_mode(s: &str) -> Result<DetectionMode, String> {
    match s.to_lowercase().as_str() {
        "both" | "auto" => Ok(DetectionMode::PatternAndBlankLine),
        "pattern" => Ok(DetectionMode::PatternOnly),
        "blank-line" | "blankline" => Ok(DetectionMode::BlankLineOnly),
        _ => Err(format!(
            "Invalid detection mode: '{}'. Use both, pattern, or blank-line.",
            s
        )),
    }
}

fn extension_for_format(format: OutputFormat) -> &'static str {
    match format {
        OutputFormat::Epub => "epub",
        OutputFormat::Json => "json",
        OutputFormat::Text => "txt",
        OutputFormat::Markdown => "md",
    }
}

/// Ensure output path parent exists; return an error naming the path.
fn validate_output_path(path: &Path) -> Result<(), CliRunError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            return Err(CliRunError::InvalidInput(format!(
                "Cannot write output: {}: parent directory does not exist.",
                path.display()
            )));
        }
    }
    Ok(())
}

/// Merge config file values and CLI flags into the segmentation options.
/// CLI flags win over config keys; absent both, the documented defaults.
fn resolve_segment_config(
    args: &Args,
    config: Option<&config::Config>,
) -> Result<SegmentConfig, CliRunError> {
    let mode = match args.detection {
        Some(m) => m,
        None => match config.and_then(|c| c.detection_mode.as_deref()) {
            Some(s) => parse_detection_mode(s).map_err(CliRunError::InvalidInput)?,
            None => DetectionMode::default(),
        },
    };
    let double_blank_split = if args.no_blank_split {
        false
    } else {
        config.and_then(|c| c.double_blank_split).unwrap_or(true)
    };
    let marker_insertion =
        args.mark_headings || config.and_then(|c| c.marker_insertion).unwrap_or(false);
    let marker = args
        .marker
        .clone()
        .or_else(|| config.and_then(|c| c.marker.clone()))
        .unwrap_or_else(|| DEFAULT_MARKER.to_string());
    let sorting = args.sort || config.and_then(|c| c.sorting).unwrap_or(false);
    Ok(SegmentConfig {
        mode,
        double_blank_split,
        marker_insertion,
        marker,
        sorting,
    })
}

/// Resolve the units of work for this invocation.
fn resolve_tasks(args: &Args) -> Result<Vec<Task>, CliRunError> {
    if args.input.is_file() {
        return Ok(vec![Task::Single {
            path: args.input.clone(),
        }]);
    }
    if args.input.is_dir() {
        if args.batch {
            return Ok(source::scan_tasks(&args.input)?);
        }
        let files = source::txt_files_by_mtime(&args.input);
        if files.is_empty() {
            return Err(CliRunError::Source(SourceError::NoSources {
                path: args.input.clone(),
            }));
        }
        return Ok(vec![Task::Merge {
            dir: args.input.clone(),
            files,
        }]);
    }
    Err(CliRunError::InvalidInput(format!(
        "Input does not exist: {}",
        args.input.display()
    )))
}

/// Read and segment one task's sources into a book.
///
/// Merge tasks skip unreadable files and continue; they fail only when no
/// source could be read. Merged books are always sorted into reading order.
fn build_book(
    segmenter: &Segmenter,
    task: &Task,
    title: String,
    author: String,
) -> Result<Book, CliRunError> {
    let chapters = match task {
        Task::Single { path } => {
            let content = source::read_text(path)?;
            segmenter.segment(&content)
        }
        Task::Merge { dir, files } => {
            let mut texts = Vec::with_capacity(files.len());
            for file in files {
                match source::read_text(file) {
                    Ok(text) => texts.push(text),
                    Err(e) => error!(path = %file.display(), error = %e, "skipping unreadable source"),
                }
            }
            if texts.is_empty() {
                return Err(CliRunError::Source(SourceError::NoSources {
                    path: dir.clone(),
                }));
            }
            segmenter.merge_sources(texts, true)
        }
    };
    Ok(Book {
        title,
        author,
        chapters,
    })
}

fn write_output(
    book: &Book,
    path: &Path,
    args: &Args,
    cover: Option<&Path>,
) -> Result<(), CliRunError> {
    validate_output_path(path)?;
    match args.format {
        OutputFormat::Epub => {
            let version = if args.epub_2 {
                EpubVersion::Epub2
            } else {
                EpubVersion::Epub3
            };
            write_epub(book, path, version, args.ncx, cover)?;
        }
        OutputFormat::Json => write_json(book, path)?,
        OutputFormat::Text => write_text(book, path)?,
        OutputFormat::Markdown => write_markdown(book, path)?,
    }
    Ok(())
}

/// Entry point for the CLI. Returns Ok(()) on success; Err with exit code
/// and message on failure.
pub fn run(args: &Args) -> Result<(), CliRunError> {
    let config = config::load_config().map_err(CliRunError::InvalidInput)?;
    let segment_config = resolve_segment_config(args, config.as_ref())?;
    let segmenter = Segmenter::new(segment_config).map_err(|e| {
        CliRunError::InvalidInput(format!("Failed to compile heading patterns: {}", e))
    })?;

    let author = args
        .author
        .clone()
        .or_else(|| config.as_ref().and_then(|c| c.author.clone()))
        .unwrap_or_else(|| DEFAULT_AUTHOR.to_string());
    let output_dir: PathBuf = config
        .as_ref()
        .and_then(|c| c.output_dir.clone())
        .unwrap_or_else(|| PathBuf::from("."));
    let cover = config.as_ref().and_then(|c| c.cover_image.clone());
    let bark_url = config.as_ref().and_then(|c| c.bark_url.clone());

    let tasks = resolve_tasks(args)?;
    let multi = tasks.len() > 1;
    if multi && args.output.is_some() {
        return Err(CliRunError::InvalidInput(
            "Cannot use --output with multiple tasks; set output_dir in the config instead."
                .to_string(),
        ));
    }

    let progress = if multi && !args.quiet {
        let bar = indicatif::ProgressBar::new(tasks.len() as u64);
        bar.set_style(
            indicatif::ProgressStyle::default_bar()
                .template("{spinner} {msg} [{bar:40}] {pos}/{len}")
                .unwrap()
                .progress_chars("█▉▊▋▌▍▎▏ "),
        );
        Some(bar)
    } else {
        None
    };

    let mut succeeded = 0usize;
    let mut skipped = 0usize;
    let mut first_err: Option<CliRunError> = None;

    for task in &tasks {
        let title = match (&args.title, multi) {
            (Some(t), false) => t.clone(),
            _ => task.book_name(),
        };
        if let Some(bar) = &progress {
            bar.set_message(title.clone());
        }

        let dest = match &args.output {
            Some(p) => p.clone(),
            None => output_dir.join(format!(
                "{}.{}",
                title,
                extension_for_format(args.format)
            )),
        };

        if !args.force && !source::needs_update(&task.source_paths(), &dest) {
            skipped += 1;
            if let Some(bar) = &progress {
                bar.inc(1);
            }
            continue;
        }

        let result = build_book(&segmenter, task, title.clone(), author.clone())
            .and_then(|book| write_output(&book, &dest, args, cover.as_deref()));
        match result {
            Ok(()) => {
                succeeded += 1;
                if !args.quiet {
                    eprintln!("Wrote {}", dest.display());
                }
            }
            Err(e) => {
                if !multi {
                    return Err(e);
                }
                error!(book = %title, error = %e, "task failed, continuing");
                if first_err.is_none() {
                    first_err = Some(e);
                }
            }
        }
        if let Some(bar) = &progress {
            bar.inc(1);
        }
    }

    if let Some(bar) = progress {
        bar.finish_and_clear();
    }

    if multi {
        let failed = tasks.len() - succeeded - skipped;
        if !args.quiet {
            eprintln!(
                "Done: {} written, {} skipped, {} failed",
                succeeded, skipped, failed
            );
        }
        notify_best_effort(
            bark_url.as_deref(),
            "txtbind 转换完成",
            &format!("成功 {} 本，跳过 {} 本，失败 {} 本", succeeded, skipped, failed),
        );
        if succeeded == 0 {
            if let Some(e) = first_err {
                return Err(e);
            }
        }
    } else if succeeded > 0 {
        notify_best_effort(
            bark_url.as_deref(),
            "txtbind 转换完成",
            &format!("《{}》已生成", tasks[0].book_name()),
        );
    }
    Ok(())
}
