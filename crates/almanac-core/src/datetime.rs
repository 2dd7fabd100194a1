use std::fmt;
use std::fs;
use std::path::PathBuf;

use chrono::{
  DateTime,
  Datelike,
  Duration,
  LocalResult,
  NaiveDate,
  NaiveDateTime,
  NaiveTime,
  TimeZone,
  Utc,
  Weekday
};
use chrono_tz::Tz;
use regex::Regex;
use serde::{
  Deserialize,
  Serialize
};

use crate::error::{
  CalendarError,
  Result
};

const TIMEZONE_CONFIG_FILE: &str =
  "almanac-time.toml";
const TIMEZONE_ENV_VAR: &str =
  "ALMANAC_TIMEZONE";
const TIMEZONE_CONFIG_ENV_VAR: &str =
  "ALMANAC_TIME_CONFIG";

const GAP_SEARCH_STEP_MINUTES: i64 = 15;
const GAP_SEARCH_LIMIT: i64 = 96;

#[derive(Debug, Deserialize)]
struct TimezoneConfig {
  timezone: Option<String>,
  time:     Option<TimezoneSection>
}

#[derive(Debug, Deserialize)]
struct TimezoneSection {
  timezone: Option<String>
}

/// A calendar month without a day.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
  Serialize,
)]
pub struct YearMonth {
  pub year:  i32,
  pub month: u32
}

impl YearMonth {
  pub fn new(
    year: i32,
    month: u32
  ) -> Result<Self> {
    if !(1..=12).contains(&month)
      || NaiveDate::from_ymd_opt(
        year, month, 1
      )
      .is_none()
    {
      return Err(
        CalendarError::InvalidMonth {
          year,
          month
        }
      );
    }
    Ok(Self { year, month })
  }

  pub fn of(date: NaiveDate) -> Self {
    Self {
      year:  date.year(),
      month: date.month()
    }
  }

  pub fn first_day(
    &self
  ) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(
      self.year, self.month, 1
    )
    .ok_or(CalendarError::InvalidMonth {
      year:  self.year,
      month: self.month
    })
  }

  pub fn last_day(
    &self
  ) -> Result<NaiveDate> {
    let next = self.next()?;
    let first_of_next = next.first_day()?;
    first_of_next.pred_opt().ok_or(
      CalendarError::InvalidMonth {
        year:  self.year,
        month: self.month
      }
    )
  }

  pub fn days_in_month(
    &self
  ) -> Result<u32> {
    Ok(self.last_day()?.day())
  }

  pub fn next(&self) -> Result<Self> {
    self.shift(1)
  }

  pub fn previous(
    &self
  ) -> Result<Self> {
    self.shift(-1)
  }

  pub fn shift(
    &self,
    months: i32
  ) -> Result<Self> {
    let total = i64::from(self.year) * 12
      + i64::from(self.month) - 1
      + i64::from(months);
    let year = i32::try_from(
      total.div_euclid(12)
    )
    .map_err(|_| {
      CalendarError::InvalidMonth {
        year:  self.year,
        month: self.month
      }
    })?;
    let month =
      total.rem_euclid(12) as u32 + 1;
    Self::new(year, month)
  }

  pub fn contains(
    &self,
    date: NaiveDate
  ) -> bool {
    date.year() == self.year
      && date.month() == self.month
  }
}

impl fmt::Display for YearMonth {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    write!(
      f,
      "{:04}-{:02}",
      self.year, self.month
    )
  }
}

/// Parses an IANA identifier or `UTC`.
pub fn parse_time_zone(
  raw: &str
) -> Result<Tz> {
  let trimmed = raw.trim();
  trimmed.parse::<Tz>().map_err(|err| {
    CalendarError::InvalidTimeZone {
      zone:   trimmed.to_string(),
      reason: err.to_string()
    }
  })
}

#[must_use]
pub fn today_in(tz: Tz) -> NaiveDate {
  Utc::now()
    .with_timezone(&tz)
    .date_naive()
}

/// Converts the 0 (Sunday) .. 6
/// (Saturday) convention into chrono's
/// weekday.
pub fn week_start_weekday(
  week_starts_on: u8
) -> Result<Weekday> {
  if week_starts_on > 6 {
    return Err(
      CalendarError::InvalidWeekStart(
        week_starts_on
      )
    );
  }
  // ISO numbering runs 1 (Mon) .. 7 (Sun);
  // Sunday = 0 maps onto ISO 7.
  let iso = if week_starts_on == 0 {
    7
  } else {
    u32::from(week_starts_on)
  };
  Ok(weekday_from_iso(iso))
}

fn weekday_from_iso(iso: u32) -> Weekday {
  match iso {
    | 1 => Weekday::Mon,
    | 2 => Weekday::Tue,
    | 3 => Weekday::Wed,
    | 4 => Weekday::Thu,
    | 5 => Weekday::Fri,
    | 6 => Weekday::Sat,
    | _ => Weekday::Sun
  }
}

/// Day of week in the 0 (Sunday) .. 6
/// (Saturday) convention.
#[must_use]
pub fn day_of_week(
  date: NaiveDate
) -> u32 {
  date.weekday().number_from_monday() % 7
}

pub fn add_days(
  date: NaiveDate,
  days: i64
) -> Result<NaiveDate> {
  date
    .checked_add_signed(Duration::days(
      days
    ))
    .ok_or_else(|| {
      CalendarError::InvalidDate(format!(
        "{date} shifted by {days} days \
         is out of range"
      ))
    })
}

/// Moves by whole months, clamping the
/// day to the target month's length.
pub fn add_months(
  date: NaiveDate,
  months: i32
) -> Result<NaiveDate> {
  let target =
    YearMonth::of(date).shift(months)?;
  let day = date
    .day()
    .min(target.days_in_month()?);
  NaiveDate::from_ymd_opt(
    target.year,
    target.month,
    day
  )
  .ok_or_else(|| {
    CalendarError::InvalidDate(format!(
      "{date} shifted by {months} \
       months is out of range"
    ))
  })
}

/// First instant of `date` in `tz`.
pub fn start_of_day(
  date: NaiveDate,
  tz: Tz
) -> Result<DateTime<Tz>> {
  let midnight =
    date.and_time(NaiveTime::MIN);
  match tz.from_local_datetime(&midnight)
  {
    | LocalResult::Single(dt) => Ok(dt),
    | LocalResult::Ambiguous(
      first,
      second
    ) => {
      tracing::warn!(
        %date,
        timezone = %tz,
        "ambiguous local midnight; using earliest"
      );
      Ok(first.min(second))
    }
    | LocalResult::None => {
      tracing::warn!(
        %date,
        timezone = %tz,
        "local midnight skipped by a \
         transition; using first valid \
         time"
      );
      search_existing_local(
        midnight,
        tz,
        GAP_SEARCH_STEP_MINUTES
      )
    }
  }
}

/// Last millisecond of `date` in `tz`.
pub fn end_of_day(
  date: NaiveDate,
  tz: Tz
) -> Result<DateTime<Tz>> {
  let last = date
    .and_hms_milli_opt(23, 59, 59, 999)
    .ok_or_else(|| {
      CalendarError::InvalidDate(format!(
        "failed to construct end of day \
         for {date}"
      ))
    })?;
  match tz.from_local_datetime(&last) {
    | LocalResult::Single(dt) => Ok(dt),
    | LocalResult::Ambiguous(
      first,
      second
    ) => {
      tracing::warn!(
        %date,
        timezone = %tz,
        "ambiguous end of day; using latest"
      );
      Ok(first.max(second))
    }
    | LocalResult::None => {
      tracing::warn!(
        %date,
        timezone = %tz,
        "end of day skipped by a \
         transition; using last valid \
         time"
      );
      search_existing_local(
        last,
        tz,
        -GAP_SEARCH_STEP_MINUTES
      )
    }
  }
}

fn search_existing_local(
  from: NaiveDateTime,
  tz: Tz,
  step_minutes: i64
) -> Result<DateTime<Tz>> {
  for step in 1..=GAP_SEARCH_LIMIT {
    let candidate = from
      + Duration::minutes(
        step * step_minutes
      );
    match tz
      .from_local_datetime(&candidate)
    {
      | LocalResult::Single(dt) => {
        return Ok(dt);
      }
      | LocalResult::Ambiguous(
        first,
        second
      ) => {
        return Ok(
          if step_minutes > 0 {
            first.min(second)
          } else {
            first.max(second)
          }
        );
      }
      | LocalResult::None => {}
    }
  }
  Err(CalendarError::InvalidDate(
    format!(
      "no valid local time near {from} \
       in {tz}"
    )
  ))
}

/// Resolves a time zone for the
/// command-line front end.
///
/// Sources are tried in order and an
/// invalid identifier at one source falls
/// through to the next.
pub fn resolve_time_zone(
  explicit: Option<&str>,
  configured: Option<&str>
) -> Tz {
  if let Some(raw) = explicit
    && let Some(tz) =
      try_time_zone(raw, "--tz")
  {
    return tz;
  }

  if let Some(raw) = configured
    && let Some(tz) =
      try_time_zone(raw, "rc:timezone")
  {
    return tz;
  }

  if let Ok(raw) =
    std::env::var(TIMEZONE_ENV_VAR)
    && let Some(tz) =
      try_time_zone(&raw, TIMEZONE_ENV_VAR)
  {
    return tz;
  }

  if let Some(path) =
    timezone_config_path()
    && let Some(tz) =
      load_timezone_from_file(&path)
  {
    return tz;
  }

  tracing::debug!(
    "no time zone configured; using UTC"
  );
  chrono_tz::UTC
}

fn try_time_zone(
  raw: &str,
  source: &str
) -> Option<Tz> {
  if raw.trim().is_empty() {
    tracing::warn!(
      source,
      "timezone source was empty"
    );
    return None;
  }

  match parse_time_zone(raw) {
    | Ok(tz) => {
      tracing::info!(
        source,
        timezone = %tz,
        "configured time zone"
      );
      Some(tz)
    }
    | Err(err) => {
      tracing::error!(
        source,
        error = %err,
        "failed to parse timezone id"
      );
      None
    }
  }
}

fn timezone_config_path()
-> Option<PathBuf> {
  if let Ok(raw) = std::env::var(
    TIMEZONE_CONFIG_ENV_VAR
  ) {
    let trimmed = raw.trim();
    if !trimmed.is_empty() {
      return Some(PathBuf::from(
        trimmed
      ));
    }
  }

  std::env::current_dir().ok().map(
    |dir| {
      dir.join(TIMEZONE_CONFIG_FILE)
    }
  )
}

fn load_timezone_from_file(
  path: &PathBuf
) -> Option<Tz> {
  if !path.exists() {
    tracing::debug!(
      file = %path.display(),
      "timezone config file not found"
    );
    return None;
  }

  let raw = match fs::read_to_string(
    path
  ) {
    | Ok(raw) => raw,
    | Err(err) => {
      tracing::error!(
        file = %path.display(),
        error = %err,
        "failed reading timezone config file"
      );
      return None;
    }
  };

  let parsed = match toml::from_str::<
    TimezoneConfig
  >(&raw)
  {
    | Ok(parsed) => parsed,
    | Err(err) => {
      tracing::error!(
        file = %path.display(),
        error = %err,
        "failed parsing timezone config file"
      );
      return None;
    }
  };

  let timezone =
    parsed.timezone.or_else(|| {
      parsed.time.and_then(|section| {
        section.timezone
      })
    });
  let Some(timezone) = timezone else {
    tracing::warn!(
      file = %path.display(),
      "timezone config had no timezone field"
    );
    return None;
  };

  try_time_zone(
    timezone.as_str(),
    &format!("file:{}", path.display())
  )
}

/// Parses the date forms accepted on the
/// command line relative to `today`.
#[tracing::instrument(skip(today), fields(input = input))]
pub fn parse_date_expr(
  input: &str,
  today: NaiveDate
) -> Result<NaiveDate> {
  let token = input.trim();
  let lower =
    token.to_ascii_lowercase();

  match lower.as_str() {
    | "today" => return Ok(today),
    | "tomorrow" => {
      return add_days(today, 1);
    }
    | "yesterday" => {
      return add_days(today, -1);
    }
    | _ => {}
  }

  let rel_re = Regex::new(
    r"^(?P<sign>[+-])(?P<num>\d+)(?P<unit>[dwm])$"
  )
  .map_err(|e| {
    CalendarError::InvalidDate(format!(
      "internal regex compile failure: \
       {e}"
    ))
  })?;

  if let Some(caps) =
    rel_re.captures(&lower)
  {
    let negative = caps
      .name("sign")
      .is_some_and(|m| m.as_str() == "-");
    let num: i64 = caps
      .name("num")
      .map(|m| m.as_str())
      .unwrap_or_default()
      .parse()
      .map_err(|_| {
        CalendarError::InvalidDate(
          format!(
            "relative amount out of \
             range: {input}"
          )
        )
      })?;
    let num =
      if negative { -num } else { num };
    let unit = caps
      .name("unit")
      .map(|m| m.as_str())
      .unwrap_or_default();

    return match unit {
      | "d" => add_days(today, num),
      | "w" => add_days(today, num * 7),
      | _ => {
        let months = i32::try_from(num)
          .map_err(|_| {
            CalendarError::InvalidDate(
              format!(
                "relative amount out \
                 of range: {input}"
              )
            )
          })?;
        add_months(today, months)
      }
    };
  }

  if let Ok(date) =
    NaiveDate::parse_from_str(
      token, "%Y-%m-%d"
    )
  {
    return Ok(date);
  }

  if let Ok(date) =
    NaiveDate::parse_from_str(
      &format!("{token}-01"),
      "%Y-%m-%d"
    )
  {
    return Ok(date);
  }

  Err(CalendarError::InvalidDate(
    format!(
      "unrecognized date expression \
       `{input}`; supported formats: \
       today/tomorrow/yesterday, \
       +Nd/+Nw/+Nm, YYYY-MM-DD, YYYY-MM"
    )
  ))
}

#[cfg(test)]
mod tests {
  use chrono::{
    Datelike,
    NaiveDate,
    Timelike,
    Weekday
  };

  use super::{
    YearMonth,
    add_months,
    day_of_week,
    end_of_day,
    parse_date_expr,
    parse_time_zone,
    start_of_day,
    week_start_weekday
  };
  use crate::error::CalendarError;

  fn date(
    y: i32,
    m: u32,
    d: u32
  ) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d)
      .expect("valid date")
  }

  #[test]
  fn year_month_knows_leap_februaries() {
    let feb_2024 = YearMonth::new(2024, 2)
      .expect("valid month");
    let feb_2023 = YearMonth::new(2023, 2)
      .expect("valid month");
    let feb_1900 = YearMonth::new(1900, 2)
      .expect("valid month");

    assert_eq!(
      feb_2024.days_in_month().expect("len"),
      29
    );
    assert_eq!(
      feb_2023.days_in_month().expect("len"),
      28
    );
    assert_eq!(
      feb_1900.days_in_month().expect("len"),
      28
    );
  }

  #[test]
  fn year_month_wraps_across_years() {
    let dec = YearMonth::new(2023, 12)
      .expect("valid month");
    assert_eq!(
      dec.next().expect("next"),
      YearMonth::new(2024, 1)
        .expect("valid month")
    );
    let jan = YearMonth::new(2024, 1)
      .expect("valid month");
    assert_eq!(
      jan.previous().expect("prev"),
      dec
    );
    assert_eq!(dec.to_string(), "2023-12");
  }

  #[test]
  fn rejects_month_thirteen() {
    assert_eq!(
      YearMonth::new(2024, 13),
      Err(CalendarError::InvalidMonth {
        year:  2024,
        month: 13
      })
    );
  }

  #[test]
  fn add_months_clamps_day() {
    assert_eq!(
      add_months(date(2024, 1, 31), 1)
        .expect("shift"),
      date(2024, 2, 29)
    );
    assert_eq!(
      add_months(date(2024, 3, 31), -1)
        .expect("shift"),
      date(2024, 2, 29)
    );
  }

  #[test]
  fn week_start_converts_conventions() {
    assert_eq!(
      week_start_weekday(0).expect("sun"),
      Weekday::Sun
    );
    assert_eq!(
      week_start_weekday(1).expect("mon"),
      Weekday::Mon
    );
    assert_eq!(
      week_start_weekday(6).expect("sat"),
      Weekday::Sat
    );
    assert_eq!(
      week_start_weekday(7),
      Err(CalendarError::InvalidWeekStart(
        7
      ))
    );
    // 2024-01-07 was a Sunday.
    assert_eq!(
      day_of_week(date(2024, 1, 7)),
      0
    );
    assert_eq!(
      day_of_week(date(2024, 1, 6)),
      6
    );
  }

  #[test]
  fn zoned_day_bounds_follow_offsets() {
    let tz = parse_time_zone(
      "America/New_York"
    )
    .expect("valid zone");
    let start =
      start_of_day(date(2024, 7, 4), tz)
        .expect("start");
    let end =
      end_of_day(date(2024, 7, 4), tz)
        .expect("end");

    assert_eq!(
      start.to_rfc3339(),
      "2024-07-04T00:00:00-04:00"
    );
    assert_eq!(end.hour(), 23);
    assert_eq!(
      end.timestamp_subsec_millis(),
      999
    );
  }

  #[test]
  fn midnight_gap_moves_forward() {
    // Santiago springs forward at local
    // midnight on 2023-09-03.
    let tz = parse_time_zone(
      "America/Santiago"
    )
    .expect("valid zone");
    let start =
      start_of_day(date(2023, 9, 3), tz)
        .expect("start");
    assert_eq!(start.day(), 3);
    assert!(start.hour() >= 1);
  }

  #[test]
  fn invalid_zone_is_reported() {
    let err = parse_time_zone("Mars/Base")
      .expect_err("unknown zone");
    assert!(matches!(
      err,
      CalendarError::InvalidTimeZone { .. }
    ));
    assert!(
      parse_time_zone("UTC").is_ok()
    );
  }

  #[test]
  fn parses_date_expressions() {
    let today = date(2024, 1, 31);
    assert_eq!(
      parse_date_expr("tomorrow", today)
        .expect("parse"),
      date(2024, 2, 1)
    );
    assert_eq!(
      parse_date_expr("-2w", today)
        .expect("parse"),
      date(2024, 1, 17)
    );
    assert_eq!(
      parse_date_expr("+1m", today)
        .expect("parse"),
      date(2024, 2, 29)
    );
    assert_eq!(
      parse_date_expr("2024-05", today)
        .expect("parse"),
      date(2024, 5, 1)
    );
    assert_eq!(
      parse_date_expr("2024-05-17", today)
        .expect("parse")
        .day(),
      17
    );
    assert!(
      parse_date_expr("someday", today)
        .is_err()
    );
  }
}
