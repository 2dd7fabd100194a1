//! Start/end boundaries of month, week
//! and day windows.
//!
//! Plain-date bounds are computed first and
//! then pinned to zoned start/end-of-day
//! instants so DST days keep their real
//! length.

use chrono::{
  DateTime,
  NaiveDate
};
use chrono_tz::Tz;
use serde::Serialize;

use crate::datetime::{
  YearMonth,
  add_days,
  day_of_week,
  end_of_day,
  start_of_day,
  week_start_weekday
};
use crate::error::Result;
use crate::views::ViewKind;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DateRange {
  pub start: DateTime<Tz>,
  pub end:   DateTime<Tz>
}

impl DateRange {
  pub fn from_dates(
    first: NaiveDate,
    last: NaiveDate,
    tz: Tz
  ) -> Result<Self> {
    Ok(Self {
      start: start_of_day(first, tz)?,
      end:   end_of_day(last, tz)?
    })
  }

  pub fn contains<Z: chrono::TimeZone>(
    &self,
    instant: &DateTime<Z>
  ) -> bool {
    *instant >= self.start
      && *instant <= self.end
  }

  pub fn first_date(&self) -> NaiveDate {
    self.start.date_naive()
  }

  pub fn last_date(&self) -> NaiveDate {
    self.end.date_naive()
  }
}

/// How month windows treat the weeks that
/// straddle the month boundary.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default,
)]
pub enum RangeMode {
  /// Padded out to whole grid weeks.
  #[default]
  Aligned,
  /// Exactly the first to last day of the
  /// month.
  Strict
}

fn days_back_to_week_start(
  date: NaiveDate,
  week_starts_on: u8
) -> i64 {
  let dow = i64::from(day_of_week(date));
  (dow - i64::from(week_starts_on) + 7)
    % 7
}

pub fn month_bounds(
  month: YearMonth,
  week_starts_on: u8,
  mode: RangeMode
) -> Result<(NaiveDate, NaiveDate)> {
  week_start_weekday(week_starts_on)?;
  let first = month.first_day()?;
  let last = month.last_day()?;
  if mode == RangeMode::Strict {
    return Ok((first, last));
  }

  let lead = days_back_to_week_start(
    first,
    week_starts_on
  );
  let trail = (i64::from(week_starts_on)
    + 6
    - i64::from(day_of_week(last)))
  .rem_euclid(7);
  Ok((
    add_days(first, -lead)?,
    add_days(last, trail)?
  ))
}

pub fn week_bounds(
  date: NaiveDate,
  week_starts_on: u8
) -> Result<(NaiveDate, NaiveDate)> {
  week_start_weekday(week_starts_on)?;
  let start = add_days(
    date,
    -days_back_to_week_start(
      date,
      week_starts_on
    )
  )?;
  Ok((start, add_days(start, 6)?))
}

pub fn month_range(
  date: NaiveDate,
  tz: Tz,
  week_starts_on: u8,
  mode: RangeMode
) -> Result<DateRange> {
  let (first, last) = month_bounds(
    YearMonth::of(date),
    week_starts_on,
    mode
  )?;
  DateRange::from_dates(first, last, tz)
}

pub fn week_range(
  date: NaiveDate,
  tz: Tz,
  week_starts_on: u8
) -> Result<DateRange> {
  let (first, last) =
    week_bounds(date, week_starts_on)?;
  DateRange::from_dates(first, last, tz)
}

pub fn day_range(
  date: NaiveDate,
  tz: Tz
) -> Result<DateRange> {
  DateRange::from_dates(date, date, tz)
}

#[tracing::instrument(level = "debug")]
pub fn date_range(
  view: ViewKind,
  date: NaiveDate,
  tz: Tz,
  week_starts_on: u8
) -> Result<DateRange> {
  let range = match view {
    | ViewKind::Month => {
      month_range(
        date,
        tz,
        week_starts_on,
        RangeMode::Aligned
      )?
    }
    | ViewKind::Week => {
      week_range(date, tz, week_starts_on)?
    }
    | ViewKind::Day => day_range(date, tz)?
  };
  tracing::debug!(
    start = %range.start,
    end = %range.end,
    "computed date range"
  );
  Ok(range)
}
