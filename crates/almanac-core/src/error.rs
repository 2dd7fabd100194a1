use thiserror::Error;

use crate::views::ViewKind;

pub type Result<T> =
  std::result::Result<T, CalendarError>;

/// Failures surfaced by the calendar
/// engine.
///
/// Configuration variants mean the
/// caller wired the engine up wrong and
/// are never worth retrying.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CalendarError {
  #[error(
    "at least one of the month, week \
     or day views must be configured"
  )]
  NoViewsConfigured,

  #[error(
    "the {0} view is not configured"
  )]
  ViewNotConfigured(ViewKind),

  #[error(
    "unknown view `{0}`; expected \
     month, week or day"
  )]
  UnknownView(String),

  #[error(
    "week start must be 0 (Sunday) \
     through 6 (Saturday), got {0}"
  )]
  InvalidWeekStart(u8),

  #[error(
    "invalid time zone `{zone}`: \
     {reason}"
  )]
  InvalidTimeZone {
    zone:   String,
    reason: String
  },

  #[error("invalid date: {0}")]
  InvalidDate(String),

  #[error(
    "invalid month {year}-{month:02}"
  )]
  InvalidMonth {
    year:  i32,
    month: u32
  },

  #[error(
    "invalid time slot settings: {0}"
  )]
  InvalidSlotConfig(String)
}
