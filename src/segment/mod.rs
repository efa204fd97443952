//! Chapter segmentation: line-driven splitting, de-duplication, numeral-aware
//! sort keys, ordering, and multi-source merging.
//!
//! The segmenter consumes decoded text only; file reading and encoding live in
//! [crate::source], rendering lives in [crate::epub] and [crate::formats].

mod heading;
pub mod numerals;

pub use heading::HeadingClassifier;

use crate::model::{Chapter, ChapterIndex, SortKey};
use regex::Regex;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};

/// Title of the synthetic chapter for content before the first heading.
const FRONT_MATTER_TITLE: &str = "前言";
/// Title of the fallback chapter when no structure is detected.
const BODY_TITLE: &str = "正文";

/// How chapter boundaries are detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DetectionMode {
    /// Heading patterns and double-blank-line splitting together.
    #[default]
    PatternAndBlankLine,
    /// Heading patterns only; blank lines are always intra-chapter spacing.
    PatternOnly,
    /// Double-blank-line splitting only; no pattern matching at all.
    BlankLineOnly,
}

/// Immutable segmentation options, read once per run.
#[derive(Debug, Clone)]
pub struct SegmentConfig {
    pub mode: DetectionMode,
    /// Whether two consecutive blank lines end the current chapter. Ignored
    /// outside [DetectionMode::PatternAndBlankLine]: pattern-only never
    /// splits on blanks, blank-line-only always does.
    pub double_blank_split: bool,
    /// Prefix detected headings with `marker` (unless already present).
    pub marker_insertion: bool,
    pub marker: String,
    /// Reorder output by sort key instead of encounter order.
    pub sorting: bool,
}

impl Default for SegmentConfig {
    fn default() -> Self {
        Self {
            mode: DetectionMode::default(),
            double_blank_split: true,
            marker_insertion: false,
            marker: "#".to_string(),
            sorting: false,
        }
    }
}

/// Why a completed segment exists; decides its sort key treatment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SegKind {
    /// Opened by a classified heading line.
    Heading,
    /// Content before the first detected heading.
    FrontMatter,
    /// Created by a double-blank-line split; first line serves as title.
    Split,
    /// Whole-input fallback when nothing was detected.
    Fallback,
}

#[derive(Debug)]
struct Seg {
    title: String,
    body: String,
    kind: SegKind,
}

/// In-progress chapter buffer. `heading` is set when the buffer was opened by
/// a heading line; `lines` never include it.
#[derive(Debug, Default)]
struct Buffer {
    heading: Option<String>,
    lines: Vec<String>,
}

impl Buffer {
    fn with_heading(title: String) -> Self {
        Buffer {
            heading: Some(title),
            lines: Vec::new(),
        }
    }

    fn is_empty(&self) -> bool {
        self.heading.is_none() && self.lines.is_empty()
    }
}

fn trim_trailing_blanks(lines: &mut Vec<String>) {
    while lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }
}

fn ensure_marker(title: &str, marker: &str) -> String {
    if marker.is_empty() || title.starts_with(marker) {
        title.to_string()
    } else {
        format!("{marker}{title}")
    }
}

/// Chapter segmenter. Holds the compiled classifier, the numeral-capturing
/// sort-key patterns, and the run configuration.
///
/// Each call to [Segmenter::segment] or [Segmenter::merge_sources] works on
/// locally-owned buffers and returns a fresh list; no state crosses calls.
#[derive(Debug)]
pub struct Segmenter {
    classifier: HeadingClassifier,
    volume_key: Regex,
    chapter_key: Regex,
    config: SegmentConfig,
}

impl Segmenter {
    pub fn new(config: SegmentConfig) -> Result<Self, regex::Error> {
        // Unlike the classifier's rules these also accept ASCII digits, and
        // they capture the numeral token for conversion.
        let numerals = format!("0-9{}", heading::CJK_NUMERALS);
        Ok(Self {
            classifier: HeadingClassifier::new()?,
            volume_key: Regex::new(&format!(r"第\s*([{numerals}]+)\s*卷(?:\s|$)"))?,
            chapter_key: Regex::new(&format!(r"第\s*([{numerals}]+)\s*[章回节集](?:\s|$)"))?,
            config,
        })
    }

    pub fn config(&self) -> &SegmentConfig {
        &self.config
    }

    /// Segment one decoded document into ordered chapters.
    ///
    /// Always returns at least one chapter for any input, degrading to a
    /// single body chapter when no structure is found. Output order follows
    /// the configured `sorting` flag.
    pub fn segment(&self, content: &str) -> Vec<Chapter> {
        self.segment_inner(content, self.config.sorting)
    }

    /// Merge several sources of the same book, ordered oldest to newest by
    /// the caller.
    ///
    /// Each source is segmented in encounter order, then merged by title: the
    /// first occurrence fixes position and sort key, a later occurrence
    /// replaces the body. Sorting applies once over the merged list when
    /// enabled in the config or forced here.
    pub fn merge_sources<I, S>(&self, sources: I, force_sort: bool) -> Vec<Chapter>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut merge = ChapterMerge::default();
        let mut source_count = 0usize;
        for source in sources {
            source_count += 1;
            for chapter in self.segment_inner(source.as_ref(), false) {
                merge.absorb(chapter);
            }
        }
        let mut chapters = merge.into_chapters();
        info!(
            sources = source_count,
            chapters = chapters.len(),
            "merged sources"
        );
        if force_sort || self.config.sorting {
            sort_chapters(&mut chapters);
        }
        chapters
    }

    fn segment_inner(&self, content: &str, sort: bool) -> Vec<Chapter> {
        if content.trim().is_empty() {
            warn!("input is empty; emitting placeholder chapter");
            return vec![Chapter {
                title: BODY_TITLE.to_string(),
                body: String::new(),
                sort_key: SortKey::BODY_FALLBACK,
            }];
        }

        let segs = self.split_lines(content);
        let chapters = self.assign_sort_keys(segs);
        let before = chapters.len();
        let mut chapters = dedup_by_title(chapters);
        debug!(before, after = chapters.len(), "deduplicated chapters");

        if chapters.is_empty() {
            // Headings with no content between them; keep the text whole.
            warn!("no chapter had any content; falling back to a single body chapter");
            chapters.push(Chapter {
                title: BODY_TITLE.to_string(),
                body: content.trim().to_string(),
                sort_key: SortKey::BODY_FALLBACK,
            });
        }

        if sort {
            sort_chapters(&mut chapters);
        }
        chapters
    }

    /// The line-driven state machine of the segmentation pass.
    fn split_lines(&self, content: &str) -> Vec<Seg> {
        let patterns_active = self.config.mode != DetectionMode::BlankLineOnly;
        let blank_split_active = match self.config.mode {
            DetectionMode::PatternAndBlankLine => self.config.double_blank_split,
            DetectionMode::PatternOnly => false,
            DetectionMode::BlankLineOnly => true,
        };

        let mut segs: Vec<Seg> = Vec::new();
        let mut buffer = Buffer::default();
        let mut blank_run = 0u32;
        let mut seen_heading = false;

        for raw in content.lines() {
            let line = raw.trim();
            if !line.is_empty() {
                blank_run = 0;
                let verdict = if patterns_active {
                    self.classifier.classify(line)
                } else {
                    None
                };
                match verdict {
                    Some(canonical) => {
                        let title = if self.config.marker_insertion {
                            ensure_marker(&canonical, &self.config.marker)
                        } else {
                            canonical
                        };
                        if !buffer.is_empty() {
                            if let Some(seg) = finish_buffer(buffer, !seen_heading) {
                                segs.push(seg);
                            }
                        }
                        buffer = Buffer::with_heading(title);
                        seen_heading = true;
                    }
                    None => buffer.lines.push(line.to_string()),
                }
            } else {
                blank_run += 1;
                if blank_split_active && blank_run == 2 && !buffer.is_empty() {
                    if let Some(seg) = finish_buffer(buffer, false) {
                        segs.push(seg);
                    }
                    buffer = Buffer::default();
                    blank_run = 0;
                } else if !buffer.is_empty() {
                    // Single blank line: keep for paragraph spacing.
                    buffer.lines.push(String::new());
                }
            }
        }

        if !buffer.is_empty() {
            if segs.is_empty() && buffer.heading.is_none() {
                info!("no chapter structure detected; using a single body chapter");
                let mut lines = buffer.lines;
                trim_trailing_blanks(&mut lines);
                segs.push(Seg {
                    title: BODY_TITLE.to_string(),
                    body: lines.join("\n"),
                    kind: SegKind::Fallback,
                });
            } else if let Some(seg) = finish_buffer(buffer, false) {
                segs.push(seg);
            }
        }
        segs
    }

    fn assign_sort_keys(&self, segs: Vec<Seg>) -> Vec<Chapter> {
        let mut current_volume: u64 = 0;
        let mut chapters = Vec::with_capacity(segs.len());
        for seg in segs {
            let sort_key = match seg.kind {
                SegKind::FrontMatter => SortKey::FRONT_MATTER,
                SegKind::Fallback => SortKey::BODY_FALLBACK,
                SegKind::Heading | SegKind::Split => {
                    self.sort_key_for(&seg.title, &mut current_volume)
                }
            };
            chapters.push(Chapter {
                title: seg.title,
                body: seg.body,
                sort_key,
            });
        }
        chapters
    }

    /// Derive the (volume, chapter) key from a title, carrying the volume
    /// forward. Conversion failures degrade to the carried/sentinel values.
    fn sort_key_for(&self, title: &str, current_volume: &mut u64) -> SortKey {
        let mut index = ChapterIndex::Unnumbered;
        if let Some(caps) = self.volume_key.captures(title) {
            match numerals::parse(&caps[1]) {
                Ok(v) => {
                    *current_volume = v;
                    // Volume headers sort before their first chapter.
                    index = ChapterIndex::Number(0);
                }
                Err(e) => warn!(title = %title, error = %e, "could not convert volume number"),
            }
        }
        if let Some(caps) = self.chapter_key.captures(title) {
            match numerals::parse(&caps[1]) {
                Ok(n) => index = ChapterIndex::Number(n),
                Err(e) => warn!(title = %title, error = %e, "could not convert chapter number"),
            }
        }
        SortKey::new(*current_volume, index)
    }
}

/// Close a buffer into a segment.
///
/// Heading buffers keep their heading as title; content buffers use the
/// first line, except that content flushed out by the first detected heading
/// becomes the synthetic front-matter chapter. Trailing blank padding never
/// ends a body.
fn finish_buffer(buffer: Buffer, before_first_heading: bool) -> Option<Seg> {
    let mut lines = buffer.lines;
    trim_trailing_blanks(&mut lines);
    let seg = match buffer.heading {
        Some(title) => Seg {
            title,
            body: lines.join("\n"),
            kind: SegKind::Heading,
        },
        None if before_first_heading => Seg {
            title: FRONT_MATTER_TITLE.to_string(),
            body: lines.join("\n"),
            kind: SegKind::FrontMatter,
        },
        None => {
            let mut rest = lines;
            if rest.is_empty() {
                return None;
            }
            let title = rest.remove(0);
            trim_trailing_blanks(&mut rest);
            Seg {
                title,
                body: rest.join("\n"),
                kind: SegKind::Split,
            }
        }
    };
    debug!(title = %seg.title, "chapter boundary");
    Some(seg)
}

/// One record per title, first occurrence wins; records with whitespace-only
/// bodies are dropped (back-to-back headings, malformed repeats).
fn dedup_by_title(chapters: Vec<Chapter>) -> Vec<Chapter> {
    let mut seen: HashSet<String> = HashSet::with_capacity(chapters.len());
    let mut out = Vec::with_capacity(chapters.len());
    for ch in chapters {
        if ch.body.trim().is_empty() {
            debug!(title = %ch.title, "dropping empty chapter");
            continue;
        }
        if seen.insert(ch.title.clone()) {
            out.push(ch);
        }
    }
    out
}

/// Stable ascending sort by (volume, chapter); equal keys keep encounter
/// order.
fn sort_chapters(chapters: &mut [Chapter]) {
    chapters.sort_by(|a, b| a.sort_key.cmp(&b.sort_key));
    info!(chapters = chapters.len(), "sorted chapters by volume and number");
}

/// Insertion-order-preserving title → chapter map used by the merge pass:
/// first insertion fixes the position and sort key, later insertions replace
/// the body. Whitespace-only bodies are never absorbed.
#[derive(Debug, Default)]
struct ChapterMerge {
    positions: HashMap<String, usize>,
    chapters: Vec<Chapter>,
}

impl ChapterMerge {
    fn absorb(&mut self, chapter: Chapter) {
        if chapter.body.trim().is_empty() {
            return;
        }
        match self.positions.get(&chapter.title) {
            Some(&i) => self.chapters[i].body = chapter.body,
            None => {
                self.positions
                    .insert(chapter.title.clone(), self.chapters.len());
                self.chapters.push(chapter);
            }
        }
    }

    fn into_chapters(self) -> Vec<Chapter> {
        self.chapters
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segmenter(config: SegmentConfig) -> Segmenter {
        Segmenter::new(config).unwrap()
    }

    fn default_segmenter() -> Segmenter {
        segmenter(SegmentConfig::default())
    }

    #[test]
    fn two_chapters_with_double_blank_before_second_heading() {
        let s = default_segmenter();
        let chapters = s.segment("第一章 开始\n内容A\n\n\n第二章 继续\n内容B");
        assert_eq!(chapters.len(), 2);
        assert_eq!(chapters[0].title, "第一章 开始");
        assert_eq!(chapters[0].body, "内容A");
        assert_eq!(chapters[1].title, "第二章 继续");
        assert_eq!(chapters[1].body, "内容B");
    }

    #[test]
    fn no_heading_input_degrades_to_single_body_chapter() {
        let s = default_segmenter();
        let chapters = s.segment("Just plain prose.\nMore prose.");
        assert_eq!(chapters.len(), 1);
        assert_eq!(chapters[0].title, BODY_TITLE);
        assert_eq!(chapters[0].body, "Just plain prose.\nMore prose.");
        assert_eq!(chapters[0].sort_key, SortKey::BODY_FALLBACK);
    }

    #[test]
    fn empty_input_yields_placeholder() {
        let s = default_segmenter();
        let chapters = s.segment("");
        assert_eq!(chapters.len(), 1);
        assert_eq!(chapters[0].title, BODY_TITLE);
        assert_eq!(chapters[0].body, "");

        let chapters = s.segment("  \n\n  ");
        assert_eq!(chapters.len(), 1);
        assert_eq!(chapters[0].body, "");
    }

    #[test]
    fn leading_content_becomes_front_matter() {
        let s = default_segmenter();
        let chapters = s.segment("楔子的内容。\n第一章 出发\n正文内容。");
        assert_eq!(chapters.len(), 2);
        assert_eq!(chapters[0].title, FRONT_MATTER_TITLE);
        assert_eq!(chapters[0].body, "楔子的内容。");
        assert_eq!(chapters[0].sort_key, SortKey::FRONT_MATTER);
        assert_eq!(chapters[1].title, "第一章 出发");
    }

    #[test]
    fn single_blank_line_is_kept_as_paragraph_spacing() {
        let s = default_segmenter();
        let chapters = s.segment("第一章\n段落一。\n\n段落二。");
        assert_eq!(chapters.len(), 1);
        assert_eq!(chapters[0].body, "段落一。\n\n段落二。");
    }

    #[test]
    fn double_blank_split_creates_chapter_titled_by_first_line() {
        let s = default_segmenter();
        let chapters = s.segment("某个无标题片段\n后续内容。\n\n\n另一个片段\n更多内容。");
        assert_eq!(chapters.len(), 2);
        assert_eq!(chapters[0].title, "某个无标题片段");
        assert_eq!(chapters[0].body, "后续内容。");
        assert_eq!(chapters[1].title, "另一个片段");
        assert_eq!(chapters[1].body, "更多内容。");
    }

    #[test]
    fn pattern_only_mode_never_splits_on_blanks() {
        let config = SegmentConfig {
            mode: DetectionMode::PatternOnly,
            ..SegmentConfig::default()
        };
        let s = segmenter(config);
        let chapters = s.segment("第一章\n内容。\n\n\n\n还是第一章的内容。");
        assert_eq!(chapters.len(), 1);
        // Blank lines stay, collapsed to the run that was seen.
        assert!(chapters[0].body.contains("还是第一章的内容。"));
        assert!(chapters[0].body.contains("\n\n"));
    }

    #[test]
    fn blank_line_only_mode_ignores_heading_patterns() {
        let config = SegmentConfig {
            mode: DetectionMode::BlankLineOnly,
            // The toggle is ignored in this mode; splitting stays on.
            double_blank_split: false,
            ..SegmentConfig::default()
        };
        let s = segmenter(config);
        let chapters = s.segment("第一章\n内容A\n\n\n第二章\n内容B");
        assert_eq!(chapters.len(), 2);
        assert_eq!(chapters[0].title, "第一章");
        assert_eq!(chapters[0].body, "内容A");
        assert_eq!(chapters[1].title, "第二章");
        assert_eq!(chapters[1].body, "内容B");
    }

    #[test]
    fn double_blank_toggle_off_keeps_one_chapter() {
        let config = SegmentConfig {
            double_blank_split: false,
            ..SegmentConfig::default()
        };
        let s = segmenter(config);
        let chapters = s.segment("无标题内容\n\n\n更多内容");
        assert_eq!(chapters.len(), 1);
        assert_eq!(chapters[0].title, BODY_TITLE);
    }

    #[test]
    fn marker_insertion_prefixes_detected_headings_once() {
        let config = SegmentConfig {
            marker_insertion: true,
            marker: "#".to_string(),
            ..SegmentConfig::default()
        };
        let s = segmenter(config);
        let chapters = s.segment("第一章 出发\n内容。\n# 终章\n结尾。");
        assert_eq!(chapters[0].title, "#第一章 出发");
        // The classifier strips the author marker, insertion adds ours back.
        assert_eq!(chapters[1].title, "#终章");
    }

    #[test]
    fn back_to_back_headings_drop_the_empty_chapter() {
        let s = default_segmenter();
        let chapters = s.segment("第一章\n第二章\n实际内容。");
        assert_eq!(chapters.len(), 1);
        assert_eq!(chapters[0].title, "第二章");
        assert_eq!(chapters[0].body, "实际内容。");
    }

    #[test]
    fn all_headings_no_content_falls_back_to_whole_text() {
        let s = default_segmenter();
        let chapters = s.segment("第一章\n第二章");
        assert_eq!(chapters.len(), 1);
        assert_eq!(chapters[0].title, BODY_TITLE);
        assert_eq!(chapters[0].body, "第一章\n第二章");
    }

    #[test]
    fn repeated_title_keeps_first_occurrence() {
        let s = default_segmenter();
        let chapters = s.segment("第一章\n早先的内容。\n第二章\n中间。\n第一章\n重复的内容。");
        assert_eq!(chapters.len(), 2);
        assert_eq!(chapters[0].title, "第一章");
        assert_eq!(chapters[0].body, "早先的内容。");
        assert_eq!(chapters[1].title, "第二章");
    }

    #[test]
    fn segmentation_preserves_all_content_lines() {
        let s = default_segmenter();
        let input = "引子一行\n第一章 开始\n内容A\n内容B\n\n内容C\n第二章 继续\n内容D";
        let chapters = s.segment(input);
        let rebuilt: Vec<String> = chapters
            .iter()
            .flat_map(|c| {
                std::iter::once(c.title.clone()).chain(c.body.lines().map(String::from))
            })
            .collect();
        for line in ["引子一行", "内容A", "内容B", "内容C", "内容D"] {
            assert!(rebuilt.iter().any(|l| l == line), "lost line {line}");
        }
        assert!(rebuilt.iter().any(|l| l == "第一章 开始"));
        assert!(rebuilt.iter().any(|l| l == "第二章 继续"));
    }

    #[test]
    fn sort_keys_carry_volume_forward() {
        let s = default_segmenter();
        let chapters = s.segment(
            "第一卷 风起\n卷首语。\n第一章 出发\n内容。\n第二章 路上\n内容。\n第二卷 云涌\n卷首语。\n第一章 新篇\n内容。",
        );
        let keys: Vec<SortKey> = chapters.iter().map(|c| c.sort_key).collect();
        assert_eq!(keys[0], SortKey::new(1, ChapterIndex::Number(0)));
        assert_eq!(keys[1], SortKey::new(1, ChapterIndex::Number(1)));
        assert_eq!(keys[2], SortKey::new(1, ChapterIndex::Number(2)));
        assert_eq!(keys[3], SortKey::new(2, ChapterIndex::Number(0)));
        assert_eq!(keys[4], SortKey::new(2, ChapterIndex::Number(1)));
    }

    #[test]
    fn title_without_number_gets_sentinel_index() {
        let s = default_segmenter();
        let chapters = s.segment("第一章 出发\n内容。\n# 番外\n内容。");
        assert_eq!(chapters[1].sort_key.index, ChapterIndex::Unnumbered);
        assert_eq!(chapters[1].sort_key.volume, 0);
    }

    #[test]
    fn sorting_orders_sentinel_last_within_volume() {
        let mut chapters = vec![
            Chapter {
                title: "a".into(),
                body: "x".into(),
                sort_key: SortKey::new(1, ChapterIndex::Unnumbered),
            },
            Chapter {
                title: "b".into(),
                body: "x".into(),
                sort_key: SortKey::new(1, ChapterIndex::Number(2)),
            },
            Chapter {
                title: "c".into(),
                body: "x".into(),
                sort_key: SortKey::new(2, ChapterIndex::Number(0)),
            },
            Chapter {
                title: "d".into(),
                body: "x".into(),
                sort_key: SortKey::new(1, ChapterIndex::Number(1)),
            },
        ];
        sort_chapters(&mut chapters);
        let titles: Vec<&str> = chapters.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["d", "b", "a", "c"]);
    }

    #[test]
    fn sorting_is_stable_for_equal_keys() {
        let mut chapters = vec![
            Chapter {
                title: "first".into(),
                body: "x".into(),
                sort_key: SortKey::new(0, ChapterIndex::Unnumbered),
            },
            Chapter {
                title: "second".into(),
                body: "x".into(),
                sort_key: SortKey::new(0, ChapterIndex::Unnumbered),
            },
        ];
        sort_chapters(&mut chapters);
        assert_eq!(chapters[0].title, "first");
        assert_eq!(chapters[1].title, "second");
    }

    #[test]
    fn segment_sorts_when_enabled() {
        let config = SegmentConfig {
            sorting: true,
            ..SegmentConfig::default()
        };
        let s = segmenter(config);
        let chapters = s.segment("第二章 后写的\n内容。\n第一章 先读的\n内容。");
        assert_eq!(chapters[0].title, "第一章 先读的");
        assert_eq!(chapters[1].title, "第二章 后写的");
    }

    #[test]
    fn unconvertible_numeral_degrades_to_sentinel() {
        let s = default_segmenter();
        // The enumeration rule makes this a heading, but the chapter-key
        // pattern does not match, so it keeps the sentinel.
        let chapters = s.segment("1. 序幕\n内容。");
        assert_eq!(chapters[0].sort_key.index, ChapterIndex::Unnumbered);
    }

    #[test]
    fn merge_later_source_overrides_body_not_position() {
        let s = default_segmenter();
        let old = "第一章\nold\n第二章\nsecond";
        let new = "第一章\nnew";
        let merged = s.merge_sources([old, new], false);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].title, "第一章");
        assert_eq!(merged[0].body, "new");
        assert_eq!(merged[1].title, "第二章");
        assert_eq!(merged[1].body, "second");
    }

    #[test]
    fn merge_appends_new_chapters_from_newer_sources() {
        let s = default_segmenter();
        let merged = s.merge_sources(["第一章\n甲", "第二章\n乙\n第三章\n丙"], false);
        let titles: Vec<&str> = merged.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["第一章", "第二章", "第三章"]);
    }

    #[test]
    fn merge_ignores_empty_replacement_bodies() {
        let s = default_segmenter();
        // The newer source repeats the heading with nothing under it.
        let merged = s.merge_sources(["第一章\n完整内容", "第一章\n第二章\n乙"], false);
        assert_eq!(merged[0].body, "完整内容");
        assert_eq!(merged[1].title, "第二章");
    }

    #[test]
    fn merge_with_force_sort_orders_by_key() {
        let s = default_segmenter();
        let merged = s.merge_sources(["第三章\n丙\n第一章\n甲", "第二章\n乙"], true);
        let titles: Vec<&str> = merged.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["第一章", "第二章", "第三章"]);
    }

    #[test]
    fn merge_of_no_sources_is_empty() {
        let s = default_segmenter();
        let merged = s.merge_sources(std::iter::empty::<&str>(), true);
        assert!(merged.is_empty());
    }

    #[test]
    fn segment_is_pure_across_calls() {
        let s = default_segmenter();
        let input = "第一章\n内容。\n第二章\n更多。";
        let a = s.segment(input);
        let b = s.segment(input);
        assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(&b) {
            assert_eq!(x.title, y.title);
            assert_eq!(x.body, y.body);
            assert_eq!(x.sort_key, y.sort_key);
        }
    }
}
