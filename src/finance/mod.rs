//! Reporting arithmetic over whole entity collections.
//!
//! Everything here is pure: handlers fetch the collections from storage and
//! pass them in, together with the reference year or date range.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::error::{AppError, AppResult};
use crate::model::datetime::{parse_date, parse_timestamp};

pub mod dashboard;
pub mod export;
pub mod payroll;
pub mod reports;

/// Inclusive time window used by the report filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateRange {
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at >= self.start && at <= self.end
    }

    /// Filtering only applies when both bounds are given. A plain-date end
    /// bound covers that whole day.
    pub fn from_query(start: Option<&str>, end: Option<&str>) -> AppResult<Option<Self>> {
        let (Some(start), Some(end)) = (start, end) else {
            return Ok(None);
        };

        let start = parse_timestamp(start)
            .ok_or_else(|| AppError::invalid("startDate", "must be a date (YYYY-MM-DD) or timestamp"))?;

        let end = match parse_date(end) {
            Some(day) => day
                .and_hms_milli_opt(23, 59, 59, 999)
                .map(|n| n.and_utc()),
            None => parse_timestamp(end),
        }
        .ok_or_else(|| AppError::invalid("endDate", "must be a date (YYYY-MM-DD) or timestamp"))?;

        if end < start {
            return Err(AppError::invalid("endDate", "must not be before startDate"));
        }

        Ok(Some(Self { start, end }))
    }
}

pub(crate) fn in_range(range: Option<&DateRange>, at: DateTime<Utc>) -> bool {
    range.is_none_or(|r| r.contains(at))
}

/// Checked addition. Stored amounts are bounded, so this only fails on
/// totals no real ledger reaches.
pub fn add(a: Decimal, b: Decimal) -> AppResult<Decimal> {
    a.checked_add(b)
        .ok_or_else(|| AppError::Internal("amount total overflowed".into()))
}

pub fn sum(amounts: impl IntoIterator<Item = Decimal>) -> AppResult<Decimal> {
    amounts.into_iter().try_fold(Decimal::ZERO, add)
}
