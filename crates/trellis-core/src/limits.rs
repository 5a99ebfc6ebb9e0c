//! Value ranges for graph settings and note titles

use std::ops::RangeInclusive;

use thiserror::Error;

/// Maximum length for note titles (256 chars)
pub const MAX_TITLE_LEN: usize = 256;

/// Maximum length for the graph search box (256 chars)
pub const MAX_SEARCH_LEN: usize = 256;

/// Node radius in pixels
pub const NODE_SIZE: RangeInclusive<f64> = 2.0..=20.0;

/// Edge stroke width in pixels
pub const LINK_THICKNESS: RangeInclusive<f64> = 0.5..=5.0;

/// Zoom level at which labels start to show
pub const TEXT_FADE_THRESHOLD: RangeInclusive<f64> = 0.5..=5.0;

/// Pull towards the viewport centre
pub const CENTER_FORCE: RangeInclusive<f64> = 0.0..=2.0;

/// Node-node charge; negative values repel
pub const REPEL_FORCE: RangeInclusive<f64> = -1000.0..=0.0;

/// Preferred edge length
pub const LINK_DISTANCE: RangeInclusive<f64> = 10.0..=200.0;

/// Validation error type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Note title cannot be empty")]
    EmptyTitle,
    #[error("Note title too long: {len} chars (max {max})")]
    TitleTooLong { len: usize, max: usize },
    #[error("Search text too long: {len} chars (max {max})")]
    SearchTooLong { len: usize, max: usize },
    #[error("{field} out of range: {value} (expected {min}..={max})")]
    OutOfRange { field: &'static str, value: f64, min: f64, max: f64 },
}

/// Validate a note title before it is sent to the store
pub fn validate_title(title: &str) -> Result<(), ValidationError> {
    if title.trim().is_empty() {
        return Err(ValidationError::EmptyTitle);
    }
    let len = title.chars().count();
    if len > MAX_TITLE_LEN {
        return Err(ValidationError::TitleTooLong {
            len,
            max: MAX_TITLE_LEN,
        });
    }
    Ok(())
}

/// Validate graph search text
pub fn validate_search(query: &str) -> Result<(), ValidationError> {
    let len = query.chars().count();
    if len > MAX_SEARCH_LEN {
        return Err(ValidationError::SearchTooLong {
            len,
            max: MAX_SEARCH_LEN,
        });
    }
    Ok(())
}

/// Check that `value` lies in `range`
pub fn validate_range(
    field: &'static str,
    value: f64,
    range: &RangeInclusive<f64>,
) -> Result<(), ValidationError> {
    if range.contains(&value) {
        Ok(())
    } else {
        Err(ValidationError::OutOfRange {
            field,
            value,
            min: *range.start(),
            max: *range.end(),
        })
    }
}

/// Clamp `value` into `range`; NaN falls back to the lower bound
pub fn clamp(value: f64, range: &RangeInclusive<f64>) -> f64 {
    if value.is_nan() {
        return *range.start();
    }
    value.clamp(*range.start(), *range.end())
}
