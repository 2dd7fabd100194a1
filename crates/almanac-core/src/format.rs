//! Locale-aware labels for weekdays, months
//! and times.
//!
//! Actual string formatting goes through a
//! [`LocaleFormatter`]; the default one
//! uses chrono's locale tables.

use chrono::{
  Locale,
  NaiveDate,
  NaiveDateTime,
  NaiveTime,
  TimeZone,
  Utc
};

use crate::datetime::{
  add_days,
  week_start_weekday
};
use crate::error::{
  CalendarError,
  Result
};

pub const DEFAULT_LOCALE: &str = "en-US";

/// Formats dates and times for a locale
/// using strftime-style patterns.
pub trait LocaleFormatter {
  fn format_date(
    &self,
    date: NaiveDate,
    locale: &str,
    pattern: &str
  ) -> String;

  fn format_time(
    &self,
    time: NaiveTime,
    locale: &str,
    pattern: &str
  ) -> String;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ChronoFormatter;

impl ChronoFormatter {
  fn render(
    at: NaiveDateTime,
    locale: &str,
    pattern: &str
  ) -> String {
    Utc
      .from_utc_datetime(&at)
      .format_localized(
        pattern,
        resolve_locale(locale)
      )
      .to_string()
  }
}

impl LocaleFormatter for ChronoFormatter {
  fn format_date(
    &self,
    date: NaiveDate,
    locale: &str,
    pattern: &str
  ) -> String {
    Self::render(
      date.and_time(NaiveTime::MIN),
      locale,
      pattern
    )
  }

  fn format_time(
    &self,
    time: NaiveTime,
    locale: &str,
    pattern: &str
  ) -> String {
    Self::render(
      NaiveDate::default().and_time(time),
      locale,
      pattern
    )
  }
}

/// Maps BCP 47 style tags (`en-US`) onto
/// chrono locales, falling back to POSIX.
///
/// A bare language picks its usual region:
/// a short table for languages whose main
/// region code differs from the language
/// code, `ll_LL` otherwise (`fr` as
/// `fr_FR`).
pub fn resolve_locale(tag: &str) -> Locale {
  let normalized =
    tag.trim().replace('-', "_");
  if let Ok(locale) =
    Locale::try_from(normalized.as_str())
  {
    return locale;
  }

  let language = normalized
    .split('_')
    .next()
    .unwrap_or_default()
    .to_ascii_lowercase();
  let candidate = match language.as_str() {
    | "" => return Locale::POSIX,
    | "en" => "en_US".to_string(),
    | "ar" => "ar_SA".to_string(),
    | "ca" => "ca_ES".to_string(),
    | "cs" => "cs_CZ".to_string(),
    | "da" => "da_DK".to_string(),
    | "el" => "el_GR".to_string(),
    | "et" => "et_EE".to_string(),
    | "fa" => "fa_IR".to_string(),
    | "he" => "he_IL".to_string(),
    | "hi" => "hi_IN".to_string(),
    | "ja" => "ja_JP".to_string(),
    | "ko" => "ko_KR".to_string(),
    | "nb" | "no" => "nb_NO".to_string(),
    | "sl" => "sl_SI".to_string(),
    | "sv" => "sv_SE".to_string(),
    | "uk" => "uk_UA".to_string(),
    | "vi" => "vi_VN".to_string(),
    | "zh" => "zh_CN".to_string(),
    | other => {
      format!(
        "{other}_{}",
        other.to_ascii_uppercase()
      )
    }
  };
  Locale::try_from(candidate.as_str())
    .unwrap_or_else(|_| {
      tracing::debug!(
        locale = tag,
        "unknown locale; using POSIX"
      );
      Locale::POSIX
    })
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default,
)]
pub enum WeekdayFormat {
  #[default]
  Long,
  Short,
  Narrow
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default,
)]
pub enum MonthFormat {
  #[default]
  Long,
  Short,
  Numeric
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default,
)]
pub enum TimeFormat {
  #[default]
  Hour24,
  Hour12
}

// 2023-01-01 fell on a Sunday.
fn sunday_anchor() -> Result<NaiveDate> {
  NaiveDate::from_ymd_opt(2023, 1, 1)
    .ok_or_else(|| {
      CalendarError::InvalidDate(
        "failed to construct weekday \
         anchor"
          .to_string()
      )
    })
}

fn weekday_label(
  formatter: &dyn LocaleFormatter,
  date: NaiveDate,
  locale: &str,
  format: WeekdayFormat
) -> String {
  match format {
    | WeekdayFormat::Long => {
      formatter.format_date(
        date, locale, "%A"
      )
    }
    | WeekdayFormat::Short => {
      formatter.format_date(
        date, locale, "%a"
      )
    }
    | WeekdayFormat::Narrow => {
      formatter
        .format_date(date, locale, "%A")
        .chars()
        .next()
        .map(|c| c.to_string())
        .unwrap_or_default()
    }
  }
}

/// Seven weekday labels starting at
/// `week_starts_on` (0 = Sunday).
pub fn get_weekdays(
  week_starts_on: u8,
  locale: &str,
  format: WeekdayFormat
) -> Result<Vec<String>> {
  get_weekdays_with(
    &ChronoFormatter,
    week_starts_on,
    locale,
    format
  )
}

pub fn get_weekdays_with(
  formatter: &dyn LocaleFormatter,
  week_starts_on: u8,
  locale: &str,
  format: WeekdayFormat
) -> Result<Vec<String>> {
  week_start_weekday(week_starts_on)?;
  let anchor = sunday_anchor()?;
  (0..7_u8)
    .map(|i| {
      let offset =
        (week_starts_on + i) % 7;
      let date = add_days(
        anchor,
        i64::from(offset)
      )?;
      Ok(weekday_label(
        formatter, date, locale, format
      ))
    })
    .collect()
}

pub fn month_name(
  month: u32,
  locale: &str,
  format: MonthFormat
) -> Result<String> {
  let date =
    NaiveDate::from_ymd_opt(2023, month, 1)
      .ok_or(CalendarError::InvalidMonth {
        year: 2023,
        month
      })?;
  let pattern = match format {
    | MonthFormat::Long => "%B",
    | MonthFormat::Short => "%b",
    | MonthFormat::Numeric => "%-m"
  };
  Ok(ChronoFormatter.format_date(
    date, locale, pattern
  ))
}

pub fn format_time(
  time: NaiveTime,
  locale: &str,
  format: TimeFormat
) -> String {
  let pattern = match format {
    | TimeFormat::Hour24 => "%H:%M",
    | TimeFormat::Hour12 => "%-I:%M %p"
  };
  ChronoFormatter.format_time(
    time, locale, pattern
  )
}

pub fn format_date(
  date: NaiveDate,
  locale: &str,
  pattern: &str
) -> String {
  ChronoFormatter
    .format_date(date, locale, pattern)
}

#[cfg(test)]
mod tests {
  use chrono::NaiveTime;

  use super::{
    MonthFormat,
    TimeFormat,
    WeekdayFormat,
    format_time,
    get_weekdays,
    month_name
  };

  #[test]
  fn sunday_first_long_names() {
    assert_eq!(
      get_weekdays(
        0,
        "en-US",
        WeekdayFormat::Long
      )
      .expect("weekdays"),
      vec![
        "Sunday",
        "Monday",
        "Tuesday",
        "Wednesday",
        "Thursday",
        "Friday",
        "Saturday"
      ]
    );
  }

  #[test]
  fn monday_first_short_and_narrow() {
    assert_eq!(
      get_weekdays(
        1,
        "en-US",
        WeekdayFormat::Short
      )
      .expect("weekdays"),
      vec![
        "Mon", "Tue", "Wed", "Thu", "Fri",
        "Sat", "Sun"
      ]
    );
    assert_eq!(
      get_weekdays(
        6,
        "en-US",
        WeekdayFormat::Narrow
      )
      .expect("weekdays"),
      vec!["S", "S", "M", "T", "W", "T", "F"]
    );
  }

  #[test]
  fn other_locales_use_their_tables() {
    let labels = get_weekdays(
      1,
      "fr-FR",
      WeekdayFormat::Long
    )
    .expect("weekdays");
    assert_eq!(labels[0], "lundi");
  }

  #[test]
  fn bare_languages_pick_their_region() {
    for (tag, monday) in [
      ("fr", "lundi"),
      ("de", "Montag"),
      ("da", "mandag"),
      ("sv", "måndag"),
      ("ja", "月曜日")
    ] {
      let labels = get_weekdays(
        1,
        tag,
        WeekdayFormat::Long
      )
      .expect("weekdays");
      assert_eq!(labels[0], monday, "{tag}");
    }
    assert_eq!(
      get_weekdays(
        1,
        "xx",
        WeekdayFormat::Long
      )
      .expect("weekdays")[0],
      "Monday"
    );
  }

  #[test]
  fn rejects_week_start_out_of_range() {
    assert!(
      get_weekdays(
        7,
        "en-US",
        WeekdayFormat::Long
      )
      .is_err()
    );
  }

  #[test]
  fn month_names_and_times() {
    assert_eq!(
      month_name(
        2,
        "en-US",
        MonthFormat::Long
      )
      .expect("month"),
      "February"
    );
    assert_eq!(
      month_name(
        9,
        "en",
        MonthFormat::Short
      )
      .expect("month"),
      "Sep"
    );
    assert!(
      month_name(
        13,
        "en-US",
        MonthFormat::Long
      )
      .is_err()
    );

    let time = NaiveTime::from_hms_opt(
      14, 5, 0
    )
    .expect("valid time");
    assert_eq!(
      format_time(
        time,
        "en-US",
        TimeFormat::Hour24
      ),
      "14:05"
    );
    assert_eq!(
      format_time(
        time,
        "en-US",
        TimeFormat::Hour12
      ),
      "2:05 PM"
    );
  }
}
