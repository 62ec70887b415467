//! Movie filter criteria and their boundary validation.
//!
//! Criteria arrive as raw query-string values. [`FilterCriteria::parse`]
//! normalises them (trimming, dropping empty strings) and validates lengths
//! and ranges so that nothing malformed ever reaches the repository layer.

use validator::{Validate, ValidationError};

use crate::error::CoreError;
use crate::types::Year;

// ---------------------------------------------------------------------------
// Bounds
// ---------------------------------------------------------------------------

/// Maximum length (in characters) of a title substring filter.
pub const MAX_TITLE_FILTER_LEN: u64 = 200;

/// Maximum length (in characters) of a genre filter.
pub const MAX_GENRE_FILTER_LEN: u64 = 50;

/// Earliest accepted release year filter.
pub const MIN_YEAR: Year = 1900;

/// Latest accepted release year filter.
pub const MAX_YEAR: Year = 2100;

// ---------------------------------------------------------------------------
// FilterCriteria
// ---------------------------------------------------------------------------

/// Optional, independently applied movie filters.
///
/// An absent field contributes no condition; all present fields are combined
/// conjunctively.
#[derive(Debug, Clone, Default, PartialEq, Eq, Validate)]
pub struct FilterCriteria {
    /// Case-insensitive title substring.
    #[validate(
        length(
            min = 1,
            max = MAX_TITLE_FILTER_LEN,
            message = "title filter must be between 1 and 200 characters"
        ),
        custom(
            function = "reject_control_chars",
            message = "title filter must not contain control characters"
        )
    )]
    pub title: Option<String>,

    /// Genre label the movie must carry.
    #[validate(
        length(
            min = 1,
            max = MAX_GENRE_FILTER_LEN,
            message = "genre filter must be between 1 and 50 characters"
        ),
        custom(
            function = "reject_control_chars",
            message = "genre filter must not contain control characters"
        )
    )]
    pub genre: Option<String>,

    /// Exact release year.
    #[validate(range(
        min = MIN_YEAR,
        max = MAX_YEAR,
        message = "year must be between 1900 and 2100"
    ))]
    pub year: Option<Year>,
}

impl FilterCriteria {
    /// Build criteria from raw request values, normalise and validate them.
    ///
    /// Whitespace is trimmed and blank strings are treated as absent.
    pub fn parse(
        title: Option<String>,
        genre: Option<String>,
        year: Option<Year>,
    ) -> Result<Self, CoreError> {
        let criteria = Self {
            title: normalize(title),
            genre: normalize(genre),
            year,
        };
        criteria.validate().map_err(validation_error)?;
        Ok(criteria)
    }

    /// True when no filter is set (the unfiltered listing).
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.genre.is_none() && self.year.is_none()
    }
}

fn normalize(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// NUL and other control characters cannot be stored in a TEXT value and are
/// never part of a movie title or genre label.
fn reject_control_chars(value: &str) -> Result<(), ValidationError> {
    if value.chars().any(char::is_control) {
        return Err(ValidationError::new("control_characters"));
    }
    Ok(())
}

/// Flatten `validator` errors into a single [`CoreError::Validation`].
///
/// Field messages are sorted so the resulting text is deterministic.
pub fn validation_error(errors: validator::ValidationErrors) -> CoreError {
    let mut messages: Vec<String> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| match &e.message {
                Some(msg) => msg.to_string(),
                None => format!("{field} is invalid"),
            })
        })
        .collect();
    messages.sort();
    CoreError::Validation(messages.join("; "))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
