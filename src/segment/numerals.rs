//! Numeral parsing for sortable chapter keys.
//!
//! Converts the numeral token captured from a heading ("一百二十三", "12",
//! "两千", "壹佰") to an integer. Best-effort: mixed digit/Chinese
//! expressions are accepted, anything outside the known character set is an
//! error rather than a guess.

use thiserror::Error;

/// Failure to convert a numeral token. Callers degrade to carried-forward or
/// sentinel values; this never aborts a segmentation pass.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum NumeralError {
    #[error("empty numeral token")]
    Empty,

    #[error("unrecognized numeral character '{0}'")]
    UnknownChar(char),

    #[error("numeral value out of range")]
    Overflow,
}

/// Digit characters: ASCII, standard and financial Chinese forms.
fn digit_value(c: char) -> Option<u64> {
    match c {
        '0'..='9' => Some(c as u64 - '0' as u64),
        '〇' | '零' => Some(0),
        '一' | '壹' => Some(1),
        '二' | '两' | '贰' => Some(2),
        '三' | '叁' => Some(3),
        '四' | '肆' => Some(4),
        '五' | '伍' => Some(5),
        '六' | '陸' => Some(6),
        '七' | '柒' => Some(7),
        '八' | '捌' => Some(8),
        '九' | '玖' => Some(9),
        _ => None,
    }
}

/// Multipliers that combine with the preceding digit run inside a section.
fn small_unit(c: char) -> Option<u64> {
    match c {
        '十' | '拾' => Some(10),
        '百' | '佰' => Some(100),
        '千' | '仟' => Some(1000),
        _ => None,
    }
}

/// Section multipliers: everything accumulated so far in the current section
/// is scaled and folded into the total.
fn section_unit(c: char) -> Option<u64> {
    match c {
        '万' => Some(10_000),
        '亿' => Some(100_000_000),
        _ => None,
    }
}

/// Parse a numeral expression to an integer.
///
/// A leading unit with no digit counts as one ("十" is 10, "十万" is
/// 100000). A trailing bare digit is added as-is, so "一百二" is 102, not
/// the colloquial 120.
pub fn parse(s: &str) -> Result<u64, NumeralError> {
    let s = s.trim();
    if s.is_empty() {
        return Err(NumeralError::Empty);
    }

    if s.bytes().all(|b| b.is_ascii_digit()) {
        return s.parse::<u64>().map_err(|_| NumeralError::Overflow);
    }

    let mut total: u64 = 0;
    let mut section: u64 = 0;
    let mut number: u64 = 0;
    for c in s.chars() {
        if let Some(d) = digit_value(c) {
            number = number
                .checked_mul(10)
                .and_then(|n| n.checked_add(d))
                .ok_or(NumeralError::Overflow)?;
        } else if let Some(unit) = small_unit(c) {
            let n = if number == 0 { 1 } else { number };
            section = n
                .checked_mul(unit)
                .and_then(|v| section.checked_add(v))
                .ok_or(NumeralError::Overflow)?;
            number = 0;
        } else if let Some(unit) = section_unit(c) {
            let sec = section.checked_add(number).ok_or(NumeralError::Overflow)?;
            let sec = if sec == 0 { 1 } else { sec };
            total = sec
                .checked_mul(unit)
                .and_then(|v| total.checked_add(v))
                .ok_or(NumeralError::Overflow)?;
            section = 0;
            number = 0;
        } else {
            return Err(NumeralError::UnknownChar(c));
        }
    }
    total
        .checked_add(section)
        .and_then(|t| t.checked_add(number))
        .ok_or(NumeralError::Overflow)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_digits() {
        assert_eq!(parse("1"), Ok(1));
        assert_eq!(parse("1024"), Ok(1024));
        assert_eq!(parse(" 42 "), Ok(42));
    }

    #[test]
    fn single_chinese_digits() {
        assert_eq!(parse("一"), Ok(1));
        assert_eq!(parse("两"), Ok(2));
        assert_eq!(parse("九"), Ok(9));
        assert_eq!(parse("〇"), Ok(0));
    }

    #[test]
    fn tens_and_hundreds() {
        assert_eq!(parse("十"), Ok(10));
        assert_eq!(parse("二十"), Ok(20));
        assert_eq!(parse("二十三"), Ok(23));
        assert_eq!(parse("一百"), Ok(100));
        assert_eq!(parse("一百零八"), Ok(108));
        assert_eq!(parse("一百二十三"), Ok(123));
    }

    #[test]
    fn thousands_and_sections() {
        assert_eq!(parse("两千"), Ok(2000));
        assert_eq!(parse("三千零一"), Ok(3001));
        assert_eq!(parse("十万"), Ok(100_000));
        assert_eq!(parse("一亿二千万"), Ok(120_000_000));
    }

    #[test]
    fn financial_variants() {
        assert_eq!(parse("壹"), Ok(1));
        assert_eq!(parse("拾"), Ok(10));
        assert_eq!(parse("壹佰贰拾"), Ok(120));
        assert_eq!(parse("叁仟"), Ok(3000));
    }

    #[test]
    fn mixed_digit_and_unit() {
        assert_eq!(parse("3千"), Ok(3000));
        assert_eq!(parse("1千2百"), Ok(1200));
    }

    #[test]
    fn trailing_digit_is_literal_not_colloquial() {
        assert_eq!(parse("一百二"), Ok(102));
    }

    #[test]
    fn rejects_unknown_characters() {
        assert_eq!(parse("abc"), Err(NumeralError::UnknownChar('a')));
        assert_eq!(parse("第"), Err(NumeralError::UnknownChar('第')));
    }

    #[test]
    fn rejects_empty() {
        assert_eq!(parse(""), Err(NumeralError::Empty));
        assert_eq!(parse("   "), Err(NumeralError::Empty));
    }

    #[test]
    fn rejects_overflow() {
        assert_eq!(parse("99999999999999999999999"), Err(NumeralError::Overflow));
    }

    #[test]
    fn repeated_calls_are_pure() {
        assert_eq!(parse("第"), parse("第"));
        assert_eq!(parse("五十五"), parse("五十五"));
    }
}
