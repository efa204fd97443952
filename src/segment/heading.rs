//! Heading classification for a single line of text.
//!
//! Stateless ordered-rule matcher: the first applicable rule decides whether
//! a line opens a new chapter. Every numbered rule requires the keyword to be
//! followed by whitespace or end-of-line, so prose that merely starts with a
//! heading-shaped prefix ("第1章节课") is not misread as a heading.

use regex::Regex;

/// Chinese numeral characters accepted in headings: standard digits, the
/// multipliers, and the formal (financial) variants of 1-10.
pub(crate) const CJK_NUMERALS: &str =
    "〇一二两三四五六七八九十百千万亿零壹贰叁肆伍陸柒捌玖拾佰仟";

/// Leading characters that mark a heading unconditionally.
const MARKER_CHARS: [char; 2] = ['#', '@'];

/// Line classifier holding the compiled heading rules.
///
/// Rules in priority order; all are anchored at line start:
/// 1. marker prefix (`#`/`@`), canonical text has the marker stripped;
/// 2. `第 <digits> 章/回/节/集/卷` and `Chapter/Section <digits>`;
/// 3. `第 <Chinese numeral> 章/回/节/集/卷/部`;
/// 4. `Chapter/Section <Roman numeral>`;
/// 5. `<digits>` or `<Chinese numeral>` followed by `.` or `、`.
///
/// Rules 2-5 return the whole original line as the canonical title so any
/// trailing annotation on the heading line is preserved.
#[derive(Debug)]
pub struct HeadingClassifier {
    digit_chapter: Regex,
    keyword_digit: Regex,
    cjk_chapter: Regex,
    keyword_roman: Regex,
    digit_enumeration: Regex,
    cjk_enumeration: Regex,
}

impl HeadingClassifier {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            digit_chapter: Regex::new(r"^第\s*[0-9]+\s*[章回节集卷](?:\s|$)")?,
            keyword_digit: Regex::new(r"(?i)^(?:chapter|section)\s*[0-9]+(?:\s|$)")?,
            cjk_chapter: Regex::new(&format!(
                r"^第\s*[{CJK_NUMERALS}]+\s*[章回节集卷部](?:\s|$)"
            ))?,
            keyword_roman: Regex::new(r"(?i)^(?:chapter|section)\s+[IVX]+(?:\s|$)")?,
            digit_enumeration: Regex::new(r"^[0-9]+\s*[.、](?:\s|$)")?,
            cjk_enumeration: Regex::new(&format!(
                r"^[{CJK_NUMERALS}]+\s*[.、](?:\s|$)"
            ))?,
        })
    }

    /// Classify one trimmed, non-empty line.
    ///
    /// Returns the canonical chapter title when the line is a heading, `None`
    /// otherwise. Pure: same line, same answer.
    pub fn classify(&self, line: &str) -> Option<String> {
        let line = line.trim();

        // Author-inserted markers win regardless of content.
        if line.starts_with(MARKER_CHARS) {
            return Some(line.trim_start_matches(MARKER_CHARS).trim().to_string());
        }

        if self.digit_chapter.is_match(line)
            || self.keyword_digit.is_match(line)
            || self.cjk_chapter.is_match(line)
            || self.keyword_roman.is_match(line)
            || self.digit_enumeration.is_match(line)
            || self.cjk_enumeration.is_match(line)
        {
            return Some(line.to_string());
        }
        None
    }
}
