//! Half-open calendar intervals for the date search modes.

use crate::catalog::SearchMode;
use crate::error::{CompileError, CompileResult};
use crate::value::{calendar_start, parse_digits, ValueType};
use time::{Duration, PrimitiveDateTime};

/// `[start, end)` covering the year, month or day named by `literal`.
///
/// The literal must match the mode's format exactly: `yyyy`, `yyyyMM` or
/// `yyyyMMdd`.
pub fn date_range(
    mode: SearchMode,
    literal: &str,
) -> CompileResult<(PrimitiveDateTime, PrimitiveDateTime)> {
    let fail = |reason: &str| CompileError::LiteralParse {
        value: literal.to_string(),
        value_type: ValueType::DateTime,
        reason: reason.to_string(),
    };

    let field = |range: std::ops::Range<usize>| -> CompileResult<u32> {
        let text = literal
            .get(range.clone())
            .ok_or_else(|| fail("unexpected length"))?;
        parse_digits(text, range.len()).ok_or_else(|| fail("expected digits"))
    };

    let (expected_len, format) = match mode {
        SearchMode::DateTimeYear => (4, "yyyy"),
        SearchMode::DateTimeMonth => (6, "yyyyMM"),
        SearchMode::DateTimeDay => (8, "yyyyMMdd"),
        other => {
            return Err(CompileError::UnsupportedPredicate(format!(
                "{:?} is not a date search mode",
                other
            )))
        }
    };
    if literal.len() != expected_len {
        return Err(fail(&format!("expected {}", format)));
    }

    let year = field(0..4)? as i32;
    let (start, end) = match mode {
        SearchMode::DateTimeYear => (calendar_start(year, 1, 1), calendar_start(year + 1, 1, 1)),
        SearchMode::DateTimeMonth => {
            let month = field(4..6)?;
            let (next_year, next_month) = if month == 12 {
                (year + 1, 1)
            } else {
                (year, month + 1)
            };
            (
                calendar_start(year, month, 1),
                calendar_start(next_year, next_month, 1),
            )
        }
        _ => {
            let start = calendar_start(year, field(4..6)?, field(6..8)?);
            (start, start.and_then(|s| s.checked_add(Duration::days(1))))
        }
    };

    match (start, end) {
        (Some(start), Some(end)) => Ok((start, end)),
        _ => Err(fail("not a calendar date")),
    }
}
