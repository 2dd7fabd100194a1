use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{
  Deserialize,
  Serialize
};

use crate::accessor::CalendarAccessor;
use crate::error::{
  CalendarError,
  Result
};

pub const DEFAULT_WEEK_STARTS_ON: u8 = 1;

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ViewKind {
  Month,
  Week,
  Day
}

impl ViewKind {
  pub fn as_key(self) -> &'static str {
    match self {
      | Self::Month => "month",
      | Self::Week => "week",
      | Self::Day => "day"
    }
  }
}

impl fmt::Display for ViewKind {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    f.write_str(self.as_key())
  }
}

impl FromStr for ViewKind {
  type Err = CalendarError;

  fn from_str(
    s: &str
  ) -> std::result::Result<Self, Self::Err>
  {
    match s
      .trim()
      .to_ascii_lowercase()
      .as_str()
    {
      | "month" => Ok(Self::Month),
      | "week" => Ok(Self::Week),
      | "day" => Ok(Self::Day),
      | _ => {
        Err(CalendarError::UnknownView(
          s.to_string()
        ))
      }
    }
  }
}

pub type SharedAccessor<T> =
  Arc<dyn CalendarAccessor<T> + Send + Sync>;

pub struct MonthViewOptions<T> {
  pub accessor:       SharedAccessor<T>,
  /// 0 (Sunday) .. 6 (Saturday).
  pub week_starts_on: Option<u8>
}

pub struct WeekViewOptions<T> {
  pub accessor:       SharedAccessor<T>,
  pub week_starts_on: Option<u8>,
  pub start_hour:     Option<u32>,
  pub end_hour:       Option<u32>,
  /// Minutes per slot.
  pub slot_duration:  Option<u32>
}

pub struct DayViewOptions<T> {
  pub accessor:      SharedAccessor<T>,
  pub start_hour:    Option<u32>,
  pub end_hour:      Option<u32>,
  pub slot_duration: Option<u32>
}

impl<T> MonthViewOptions<T> {
  pub fn new(
    accessor: SharedAccessor<T>
  ) -> Self {
    Self {
      accessor,
      week_starts_on: None
    }
  }

  #[must_use]
  pub fn week_starts_on(
    mut self,
    day: u8
  ) -> Self {
    self.week_starts_on = Some(day);
    self
  }
}

impl<T> WeekViewOptions<T> {
  pub fn new(
    accessor: SharedAccessor<T>
  ) -> Self {
    Self {
      accessor,
      week_starts_on: None,
      start_hour: None,
      end_hour: None,
      slot_duration: None
    }
  }

  #[must_use]
  pub fn week_starts_on(
    mut self,
    day: u8
  ) -> Self {
    self.week_starts_on = Some(day);
    self
  }

  #[must_use]
  pub fn time_slots(
    mut self,
    start_hour: u32,
    end_hour: u32,
    slot_duration: u32
  ) -> Self {
    self.start_hour = Some(start_hour);
    self.end_hour = Some(end_hour);
    self.slot_duration =
      Some(slot_duration);
    self
  }
}

impl<T> DayViewOptions<T> {
  pub fn new(
    accessor: SharedAccessor<T>
  ) -> Self {
    Self {
      accessor,
      start_hour: None,
      end_hour: None,
      slot_duration: None
    }
  }

  #[must_use]
  pub fn time_slots(
    mut self,
    start_hour: u32,
    end_hour: u32,
    slot_duration: u32
  ) -> Self {
    self.start_hour = Some(start_hour);
    self.end_hour = Some(end_hour);
    self.slot_duration =
      Some(slot_duration);
    self
  }
}

// Manual impls: derive would demand
// `T: Clone` although only the Arc is
// cloned.
impl<T> Clone for MonthViewOptions<T> {
  fn clone(&self) -> Self {
    Self {
      accessor:       Arc::clone(
        &self.accessor
      ),
      week_starts_on: self.week_starts_on
    }
  }
}

impl<T> Clone for WeekViewOptions<T> {
  fn clone(&self) -> Self {
    Self {
      accessor:       Arc::clone(
        &self.accessor
      ),
      week_starts_on: self.week_starts_on,
      start_hour:     self.start_hour,
      end_hour:       self.end_hour,
      slot_duration:  self.slot_duration
    }
  }
}

impl<T> Clone for DayViewOptions<T> {
  fn clone(&self) -> Self {
    Self {
      accessor:      Arc::clone(
        &self.accessor
      ),
      start_hour:    self.start_hour,
      end_hour:      self.end_hour,
      slot_duration: self.slot_duration
    }
  }
}

/// The set of configured views.
///
/// Registration order matters: the first
/// view added is the default view.
pub struct ViewsConfig<T> {
  month: Option<MonthViewOptions<T>>,
  week:  Option<WeekViewOptions<T>>,
  day:   Option<DayViewOptions<T>>,
  order: Vec<ViewKind>
}

impl<T> Default for ViewsConfig<T> {
  fn default() -> Self {
    Self {
      month: None,
      week:  None,
      day:   None,
      order: Vec::new()
    }
  }
}

impl<T> Clone for ViewsConfig<T> {
  fn clone(&self) -> Self {
    Self {
      month: self.month.clone(),
      week:  self.week.clone(),
      day:   self.day.clone(),
      order: self.order.clone()
    }
  }
}

impl<T> fmt::Debug for ViewsConfig<T> {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    f.debug_struct("ViewsConfig")
      .field("order", &self.order)
      .field(
        "week_starts_on",
        &self.week_starts_on()
      )
      .finish_non_exhaustive()
  }
}

impl<T> ViewsConfig<T> {
  pub fn new() -> Self {
    Self::default()
  }

  #[must_use]
  pub fn month(
    mut self,
    options: MonthViewOptions<T>
  ) -> Self {
    self.month = Some(options);
    self.touch(ViewKind::Month);
    self
  }

  #[must_use]
  pub fn week(
    mut self,
    options: WeekViewOptions<T>
  ) -> Self {
    self.week = Some(options);
    self.touch(ViewKind::Week);
    self
  }

  #[must_use]
  pub fn day(
    mut self,
    options: DayViewOptions<T>
  ) -> Self {
    self.day = Some(options);
    self.touch(ViewKind::Day);
    self
  }

  // Re-registering keeps the original
  // position, like re-assigning an
  // existing object key.
  fn touch(&mut self, kind: ViewKind) {
    if !self.order.contains(&kind) {
      self.order.push(kind);
    }
  }

  pub fn validate(&self) -> Result<()> {
    if self.order.is_empty() {
      return Err(
        CalendarError::NoViewsConfigured
      );
    }
    for day in [
      self
        .month
        .as_ref()
        .and_then(|m| m.week_starts_on),
      self
        .week
        .as_ref()
        .and_then(|w| w.week_starts_on)
    ]
    .into_iter()
    .flatten()
    {
      if day > 6 {
        return Err(
          CalendarError::InvalidWeekStart(
            day
          )
        );
      }
    }
    Ok(())
  }

  pub fn configured(&self) -> &[ViewKind] {
    &self.order
  }

  pub fn default_view(
    &self
  ) -> Option<ViewKind> {
    self.order.first().copied()
  }

  pub fn has(&self, kind: ViewKind) -> bool {
    self.order.contains(&kind)
  }

  /// Week start shared by navigation:
  /// month's setting, then week's, then
  /// Monday.
  pub fn week_starts_on(&self) -> u8 {
    self
      .month
      .as_ref()
      .and_then(|m| m.week_starts_on)
      .or_else(|| {
        self
          .week
          .as_ref()
          .and_then(|w| w.week_starts_on)
      })
      .unwrap_or(DEFAULT_WEEK_STARTS_ON)
  }

  pub fn month_options(
    &self
  ) -> Result<&MonthViewOptions<T>> {
    self.month.as_ref().ok_or(
      CalendarError::ViewNotConfigured(
        ViewKind::Month
      )
    )
  }

  pub fn week_options(
    &self
  ) -> Result<&WeekViewOptions<T>> {
    self.week.as_ref().ok_or(
      CalendarError::ViewNotConfigured(
        ViewKind::Week
      )
    )
  }

  pub fn day_options(
    &self
  ) -> Result<&DayViewOptions<T>> {
    self.day.as_ref().ok_or(
      CalendarError::ViewNotConfigured(
        ViewKind::Day
      )
    )
  }
}

#[cfg(test)]
mod tests {
  use std::sync::Arc;

  use chrono::NaiveDate;

  use super::{
    DayViewOptions,
    MonthViewOptions,
    SharedAccessor,
    ViewKind,
    ViewsConfig,
    WeekViewOptions
  };
  use crate::accessor::AccessorFn;
  use crate::error::CalendarError;

  fn accessor() -> SharedAccessor<NaiveDate>
  {
    Arc::new(AccessorFn::new(
      |d: &NaiveDate| *d
    ))
  }

  #[test]
  fn empty_config_is_rejected() {
    let views =
      ViewsConfig::<NaiveDate>::new();
    assert_eq!(
      views.validate(),
      Err(CalendarError::NoViewsConfigured)
    );
    assert_eq!(views.default_view(), None);
  }

  #[test]
  fn first_registered_view_is_default() {
    let views = ViewsConfig::new()
      .day(DayViewOptions::new(accessor()))
      .month(MonthViewOptions::new(
        accessor()
      ));
    assert_eq!(
      views.default_view(),
      Some(ViewKind::Day)
    );
    assert_eq!(
      views.configured(),
      &[ViewKind::Day, ViewKind::Month]
    );
    assert!(!views.has(ViewKind::Week));
    assert!(matches!(
      views.week_options(),
      Err(CalendarError::ViewNotConfigured(
        ViewKind::Week
      ))
    ));
  }

  #[test]
  fn month_week_start_wins_over_week() {
    let views = ViewsConfig::new()
      .week(
        WeekViewOptions::new(accessor())
          .week_starts_on(3)
      )
      .month(
        MonthViewOptions::new(accessor())
          .week_starts_on(0)
      );
    assert_eq!(views.week_starts_on(), 0);

    let week_only = ViewsConfig::new()
      .week(
        WeekViewOptions::new(accessor())
          .week_starts_on(3)
      );
    assert_eq!(
      week_only.week_starts_on(),
      3
    );

    let neither = ViewsConfig::new()
      .day(DayViewOptions::new(accessor()));
    assert_eq!(neither.week_starts_on(), 1);
  }

  #[test]
  fn out_of_range_week_start_fails() {
    let views = ViewsConfig::new().month(
      MonthViewOptions::new(accessor())
        .week_starts_on(9)
    );
    assert_eq!(
      views.validate(),
      Err(CalendarError::InvalidWeekStart(
        9
      ))
    );
  }

  #[test]
  fn parses_view_names() {
    assert_eq!(
      " Week ".parse::<ViewKind>(),
      Ok(ViewKind::Week)
    );
    assert_eq!(
      "year".parse::<ViewKind>(),
      Err(CalendarError::UnknownView(
        "year".to_string()
      ))
    );
  }
}
