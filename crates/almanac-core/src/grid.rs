//! Month, week and day grids with items
//! bucketed into their cells.

use std::collections::HashMap;

use chrono::{
  Local,
  NaiveDate,
  NaiveDateTime,
  NaiveTime
};
use serde::Serialize;

use crate::accessor::CalendarAccessor;
use crate::datetime::{
  YearMonth,
  add_days
};
use crate::error::{
  CalendarError,
  Result
};
use crate::range::{
  RangeMode,
  month_bounds,
  week_bounds
};

pub const DEFAULT_START_HOUR: u32 = 0;
pub const DEFAULT_END_HOUR: u32 = 24;
pub const DEFAULT_SLOT_MINUTES: u32 = 30;

const MINUTES_PER_DAY: u32 = 24 * 60;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalendarDay<T> {
  pub date:             NaiveDate,
  pub is_current_month: bool,
  pub is_today:         bool,
  pub items:            Vec<T>
}

/// Always seven days long.
pub type CalendarWeek<T> =
  Vec<CalendarDay<T>>;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalendarMonth<T> {
  pub weeks: Vec<CalendarWeek<T>>,
  pub month: YearMonth
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeSlot<T> {
  pub hour:   u32,
  pub minute: u32,
  pub time:   NaiveTime,
  pub items:  Vec<T>
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeekDay<T> {
  pub date:       NaiveDate,
  pub is_today:   bool,
  pub items:      Vec<T>,
  pub time_slots: Option<Vec<TimeSlot<T>>>
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalendarWeekView<T> {
  pub days:       Vec<WeekDay<T>>,
  pub week_start: NaiveDate,
  pub week_end:   NaiveDate
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalendarDayView<T> {
  pub date:       NaiveDate,
  pub is_today:   bool,
  /// Every item on the date regardless of
  /// its time.
  pub items:      Vec<T>,
  pub time_slots: Vec<TimeSlot<T>>
}

impl<T> CalendarMonth<T> {
  pub fn days(
    &self
  ) -> impl Iterator<Item = &CalendarDay<T>>
  {
    self.weeks.iter().flatten()
  }
}

pub struct MonthGridOptions<'a, T> {
  pub data:           &'a [T],
  pub accessor:       &'a dyn CalendarAccessor<T>,
  pub week_starts_on: u8,
  pub today:          Option<NaiveDate>
}

pub struct WeekGridOptions<'a, T> {
  pub data:           &'a [T],
  pub accessor:       &'a dyn CalendarAccessor<T>,
  pub week_starts_on: u8,
  pub start_hour:     Option<u32>,
  pub end_hour:       Option<u32>,
  pub slot_duration:  Option<u32>,
  pub today:          Option<NaiveDate>
}

pub struct DayGridOptions<'a, T> {
  pub data:          &'a [T],
  pub accessor:      &'a dyn CalendarAccessor<T>,
  pub start_hour:    Option<u32>,
  pub end_hour:      Option<u32>,
  pub slot_duration: Option<u32>,
  pub today:         Option<NaiveDate>
}

/// Resolved slot layout for one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotConfig {
  pub start_hour:    u32,
  pub end_hour:      u32,
  pub slot_duration: u32
}

impl Default for SlotConfig {
  fn default() -> Self {
    Self {
      start_hour:    DEFAULT_START_HOUR,
      end_hour:      DEFAULT_END_HOUR,
      slot_duration: DEFAULT_SLOT_MINUTES
    }
  }
}

impl SlotConfig {
  pub fn resolve(
    start_hour: Option<u32>,
    end_hour: Option<u32>,
    slot_duration: Option<u32>
  ) -> Result<Self> {
    let config = Self {
      start_hour:    start_hour
        .unwrap_or(DEFAULT_START_HOUR),
      end_hour:      end_hour
        .unwrap_or(DEFAULT_END_HOUR),
      slot_duration: slot_duration
        .unwrap_or(DEFAULT_SLOT_MINUTES)
    };
    config.validate()?;
    Ok(config)
  }

  pub fn validate(&self) -> Result<()> {
    if self.slot_duration == 0 {
      return Err(
        CalendarError::InvalidSlotConfig(
          "slot duration must be at \
           least one minute"
            .to_string()
        )
      );
    }
    if self.slot_duration > MINUTES_PER_DAY
    {
      return Err(
        CalendarError::InvalidSlotConfig(
          format!(
            "slot duration {} is longer \
             than a day",
            self.slot_duration
          )
        )
      );
    }
    if self.end_hour > 24 {
      return Err(
        CalendarError::InvalidSlotConfig(
          format!(
            "end hour {} is past 24",
            self.end_hour
          )
        )
      );
    }
    if self.start_hour > self.end_hour {
      return Err(
        CalendarError::InvalidSlotConfig(
          format!(
            "start hour {} is after end \
             hour {}",
            self.start_hour, self.end_hour
          )
        )
      );
    }
    Ok(())
  }

  /// Slot start offsets in minutes since
  /// midnight. Minutes carry into the hour
  /// when the duration does not divide 60.
  pub fn slot_starts(
    &self
  ) -> impl Iterator<Item = u32> + use<>
  {
    let step = self.slot_duration as usize;
    (self.start_hour * 60
      ..self.end_hour * 60)
      .step_by(step.max(1))
  }
}

fn system_today() -> NaiveDate {
  Local::now().date_naive()
}

fn bucket_by_date<T: Clone>(
  data: &[T],
  accessor: &dyn CalendarAccessor<T>
) -> HashMap<NaiveDate, Vec<T>> {
  let mut buckets: HashMap<
    NaiveDate,
    Vec<T>
  > = HashMap::new();
  for item in data {
    let date = accessor.date(item);
    tracing::trace!(%date, "bucketing item");
    buckets
      .entry(date)
      .or_default()
      .push(item.clone());
  }
  buckets
}

fn time_of(minutes: u32) -> Result<NaiveTime> {
  NaiveTime::from_hms_opt(
    minutes / 60,
    minutes % 60,
    0
  )
  .ok_or_else(|| {
    CalendarError::InvalidSlotConfig(
      format!(
        "slot offset {minutes} minutes \
         is not a time of day"
      )
    )
  })
}

fn last_instant_of(
  date: NaiveDate
) -> Result<NaiveDateTime> {
  date
    .and_hms_milli_opt(23, 59, 59, 999)
    .ok_or_else(|| {
      CalendarError::InvalidDate(format!(
        "failed to construct end of day \
         for {date}"
      ))
    })
}

/// Builds the time slots of one day.
///
/// Slots are half-open `[start, end)`
/// except a slot reaching midnight, which
/// closes at `23:59:59.999` inclusive.
pub fn build_time_slots<T: Clone>(
  date: NaiveDate,
  data: &[T],
  accessor: &dyn CalendarAccessor<T>,
  config: SlotConfig
) -> Result<Vec<TimeSlot<T>>> {
  config.validate()?;
  let day_end = last_instant_of(date)?;
  let starts = data
    .iter()
    .filter_map(|item| {
      accessor
        .start(item)
        .map(|start| (start, item))
    })
    .collect::<Vec<_>>();

  config
    .slot_starts()
    .map(|offset| {
      let time = time_of(offset)?;
      let slot_start = date.and_time(time);
      let end_offset = offset
        .saturating_add(config.slot_duration);
      let items = if end_offset
        >= MINUTES_PER_DAY
      {
        starts
          .iter()
          .filter(|(start, _)| {
            *start >= slot_start
              && *start <= day_end
          })
          .map(|(_, item)| (*item).clone())
          .collect()
      } else {
        let slot_end = date
          .and_time(time_of(end_offset)?);
        starts
          .iter()
          .filter(|(start, _)| {
            *start >= slot_start
              && *start < slot_end
          })
          .map(|(_, item)| (*item).clone())
          .collect()
      };
      Ok(TimeSlot {
        hour: offset / 60,
        minute: offset % 60,
        time,
        items
      })
    })
    .collect()
}

#[tracing::instrument(skip(options), fields(items = options.data.len()))]
pub fn build_month<T: Clone>(
  year: i32,
  month: u32,
  options: &MonthGridOptions<'_, T>
) -> Result<CalendarMonth<T>> {
  let target = YearMonth::new(year, month)?;
  let (grid_start, _) = month_bounds(
    target,
    options.week_starts_on,
    RangeMode::Aligned
  )?;
  let month_last = target.last_day()?;
  let today =
    options.today.unwrap_or_else(system_today);
  let mut buckets = bucket_by_date(
    options.data,
    options.accessor
  );

  let mut weeks = Vec::new();
  let mut cursor = grid_start;
  loop {
    let mut week = Vec::with_capacity(7);
    for _ in 0..7 {
      week.push(CalendarDay {
        date:             cursor,
        is_current_month: target
          .contains(cursor),
        is_today:         cursor == today,
        items:            buckets
          .remove(&cursor)
          .unwrap_or_default()
      });
      cursor = add_days(cursor, 1)?;
    }
    weeks.push(week);
    if cursor > month_last {
      break;
    }
  }

  tracing::debug!(
    month = %target,
    weeks = weeks.len(),
    "built month grid"
  );
  Ok(CalendarMonth {
    weeks,
    month: target
  })
}

#[tracing::instrument(skip(options), fields(items = options.data.len()))]
pub fn build_week<T: Clone>(
  date: NaiveDate,
  options: &WeekGridOptions<'_, T>
) -> Result<CalendarWeekView<T>> {
  let (week_start, week_end) = week_bounds(
    date,
    options.week_starts_on
  )?;
  let today =
    options.today.unwrap_or_else(system_today);

  // Slots only when the whole triple is
  // given; partial settings mean none.
  let slots = match (
    options.start_hour,
    options.end_hour,
    options.slot_duration
  ) {
    | (Some(start), Some(end), Some(step)) => {
      Some(SlotConfig {
        start_hour:    start,
        end_hour:      end,
        slot_duration: step
      })
    }
    | _ => None
  };
  if let Some(config) = slots {
    config.validate()?;
  }

  let mut buckets = bucket_by_date(
    options.data,
    options.accessor
  );
  let mut days = Vec::with_capacity(7);
  for offset in 0..7 {
    let day = add_days(week_start, offset)?;
    let time_slots = match slots {
      | Some(config) => {
        let day_view = build_day(
          day,
          &DayGridOptions {
            data:          options.data,
            accessor:      options.accessor,
            start_hour:    Some(
              config.start_hour
            ),
            end_hour:      Some(
              config.end_hour
            ),
            slot_duration: Some(
              config.slot_duration
            ),
            today:         Some(today)
          }
        )?;
        Some(day_view.time_slots)
      }
      | None => None
    };
    days.push(WeekDay {
      date: day,
      is_today: day == today,
      items: buckets
        .remove(&day)
        .unwrap_or_default(),
      time_slots
    });
  }

  Ok(CalendarWeekView {
    days,
    week_start,
    week_end
  })
}

#[tracing::instrument(skip(options), fields(items = options.data.len()))]
pub fn build_day<T: Clone>(
  date: NaiveDate,
  options: &DayGridOptions<'_, T>
) -> Result<CalendarDayView<T>> {
  let config = SlotConfig::resolve(
    options.start_hour,
    options.end_hour,
    options.slot_duration
  )?;
  let today =
    options.today.unwrap_or_else(system_today);
  let items = options
    .data
    .iter()
    .filter(|item| {
      options.accessor.date(item) == date
    })
    .cloned()
    .collect::<Vec<_>>();
  let time_slots = build_time_slots(
    date,
    options.data,
    options.accessor,
    config
  )?;

  tracing::debug!(
    %date,
    items = items.len(),
    slots = time_slots.len(),
    "built day grid"
  );
  Ok(CalendarDayView {
    date,
    is_today: date == today,
    items,
    time_slots
  })
}
