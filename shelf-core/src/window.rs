//! Time windows for filtering reviews by creation time.

use chrono::{DateTime, Months, Utc};
use serde::{Deserialize, Serialize};

use crate::{Timestamp, ValidationError};

/// Optional inclusive range `[from, to]` over `created_at`.
///
/// - `from` only: `created_at >= from`
/// - `to` only: `created_at <= to`
/// - both: `from <= created_at <= to`
/// - neither: everything matches
///
/// A window with `from > to` is well-formed and matches nothing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub from: Option<Timestamp>,
    pub to: Option<Timestamp>,
}

impl TimeWindow {
    /// The unbounded window.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn new(from: Option<Timestamp>, to: Option<Timestamp>) -> Self {
        Self { from, to }
    }

    pub fn between(from: Timestamp, to: Timestamp) -> Self {
        Self::new(Some(from), Some(to))
    }

    pub fn since(from: Timestamp) -> Self {
        Self::new(Some(from), None)
    }

    pub fn until(to: Timestamp) -> Self {
        Self::new(None, Some(to))
    }

    /// `[now - months, now]` using calendar-month arithmetic.
    ///
    /// Falls back to the unbounded lower end if the subtraction leaves chrono's range.
    pub fn last_months(now: Timestamp, months: u32) -> Self {
        let from = now.checked_sub_months(Months::new(months));
        Self::new(from, Some(now))
    }

    /// Parse optional RFC 3339 bounds supplied by a caller.
    ///
    /// # Errors
    /// `ValidationError::MalformedTimestamp` naming `from` or `to`.
    pub fn parse(from: Option<&str>, to: Option<&str>) -> Result<Self, ValidationError> {
        Ok(Self::new(
            parse_bound("from", from)?,
            parse_bound("to", to)?,
        ))
    }

    pub fn is_unbounded(&self) -> bool {
        self.from.is_none() && self.to.is_none()
    }

    pub fn contains(&self, at: Timestamp) -> bool {
        match (self.from, self.to) {
            (Some(from), None) => at >= from,
            (None, Some(to)) => at <= to,
            (Some(from), Some(to)) => from <= at && at <= to,
            (None, None) => true,
        }
    }
}

fn parse_bound(field: &str, raw: Option<&str>) -> Result<Option<Timestamp>, ValidationError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => DateTime::parse_from_rfc3339(value)
            .map(|dt| Some(dt.with_timezone(&Utc)))
            .map_err(|_| ValidationError::MalformedTimestamp {
                field: field.to_string(),
                value: value.to_string(),
            }),
    }
}
