//! Stateful navigation over the configured
//! views.
//!
//! All mutation funnels through
//! [`Calendar::set_state`], which re-derives
//! the date range from the reference date
//! and current view, notifies subscribers,
//! and only then commits.

use std::fmt;
use std::sync::{
  Arc,
  Mutex,
  PoisonError
};

use chrono::{
  Datelike,
  NaiveDate
};
use chrono_tz::Tz;
use serde::Serialize;

use crate::datetime::{
  YearMonth,
  add_days,
  parse_time_zone,
  today_in
};
use crate::error::{
  CalendarError,
  Result
};
use crate::format::{
  ChronoFormatter,
  LocaleFormatter
};
use crate::grid::{
  CalendarDayView,
  CalendarMonth,
  CalendarWeekView,
  DayGridOptions,
  MonthGridOptions,
  WeekGridOptions,
  build_day,
  build_month,
  build_week
};
use crate::range::{
  DateRange,
  RangeMode,
  date_range,
  month_range
};
use crate::views::{
  ViewKind,
  ViewsConfig
};

pub const DEFAULT_TIME_ZONE: &str = "UTC";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalendarState {
  pub reference_date: NaiveDate,
  pub current_view:   ViewKind,
  pub date_range:     DateRange
}

/// Partial update merged into the current
/// state. The date range is never part of a
/// patch; it is always recomputed.
#[derive(
  Debug, Clone, Copy, Default, PartialEq, Eq,
)]
pub struct StatePatch {
  pub reference_date: Option<NaiveDate>,
  pub current_view:   Option<ViewKind>
}

impl StatePatch {
  pub fn reference_date(
    date: NaiveDate
  ) -> Self {
    Self {
      reference_date: Some(date),
      current_view:   None
    }
  }

  pub fn current_view(
    view: ViewKind
  ) -> Self {
    Self {
      reference_date: None,
      current_view:   Some(view)
    }
  }
}

impl From<CalendarState> for StatePatch {
  fn from(state: CalendarState) -> Self {
    Self {
      reference_date: Some(
        state.reference_date
      ),
      current_view:   Some(
        state.current_view
      )
    }
  }
}

pub type StateListener = Box<
  dyn FnMut(&CalendarState) + Send
>;

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash,
)]
pub struct SubscriptionId(u64);

pub struct CalendarOptions<T> {
  pub views:           ViewsConfig<T>,
  pub data:            Vec<T>,
  /// IANA identifier; `UTC` when unset.
  pub time_zone:       Option<String>,
  pub state:           StatePatch,
  /// Pins "today" instead of reading the
  /// system clock.
  pub today:           Option<NaiveDate>,
  pub on_state_change: Option<StateListener>
}

impl<T> CalendarOptions<T> {
  pub fn new(views: ViewsConfig<T>) -> Self {
    Self {
      views,
      data: Vec::new(),
      time_zone: None,
      state: StatePatch::default(),
      today: None,
      on_state_change: None
    }
  }

  #[must_use]
  pub fn data(mut self, data: Vec<T>) -> Self {
    self.data = data;
    self
  }

  #[must_use]
  pub fn time_zone(
    mut self,
    zone: impl Into<String>
  ) -> Self {
    self.time_zone = Some(zone.into());
    self
  }

  #[must_use]
  pub fn state(
    mut self,
    state: StatePatch
  ) -> Self {
    self.state = state;
    self
  }

  #[must_use]
  pub fn today(
    mut self,
    today: NaiveDate
  ) -> Self {
    self.today = Some(today);
    self
  }

  #[must_use]
  pub fn on_state_change(
    mut self,
    listener: impl FnMut(&CalendarState)
    + Send
    + 'static
  ) -> Self {
    self.on_state_change =
      Some(Box::new(listener));
    self
  }
}

// The listener is not cloned; a clone
// carries no callback.
impl<T: Clone> Clone for CalendarOptions<T> {
  fn clone(&self) -> Self {
    Self {
      views:           self.views.clone(),
      data:            self.data.clone(),
      time_zone:       self.time_zone.clone(),
      state:           self.state,
      today:           self.today,
      on_state_change: None
    }
  }
}

impl<T> fmt::Debug for CalendarOptions<T> {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    f.debug_struct("CalendarOptions")
      .field("views", &self.views)
      .field("items", &self.data.len())
      .field("time_zone", &self.time_zone)
      .field("state", &self.state)
      .field("today", &self.today)
      .finish_non_exhaustive()
  }
}

/// strftime patterns used by
/// [`Calendar::get_title`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitleOptions {
  pub month: String,
  pub week:  String,
  pub year:  String,
  pub day:   String
}

impl Default for TitleOptions {
  fn default() -> Self {
    Self {
      month: "%B %Y".to_string(),
      week:  "%b %-d".to_string(),
      year:  "%Y".to_string(),
      day:   "%A, %B %-d, %Y".to_string()
    }
  }
}

pub struct Calendar<T> {
  options:          CalendarOptions<T>,
  time_zone:        Tz,
  state:            CalendarState,
  subscribers:      Vec<(
    SubscriptionId,
    StateListener
  )>,
  next_id:          u64,
  options_listener: Option<SubscriptionId>
}

impl<T> fmt::Debug for Calendar<T> {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    f.debug_struct("Calendar")
      .field("options", &self.options)
      .field("time_zone", &self.time_zone)
      .field("state", &self.state)
      .field(
        "subscribers",
        &self.subscribers.len()
      )
      .finish_non_exhaustive()
  }
}

fn resolve_zone(
  raw: Option<&str>
) -> Result<Tz> {
  parse_time_zone(
    raw.unwrap_or(DEFAULT_TIME_ZONE)
  )
}

impl<T: Clone> Calendar<T> {
  #[tracing::instrument(skip_all)]
  pub fn new(
    mut options: CalendarOptions<T>
  ) -> Result<Self> {
    options.views.validate()?;
    let time_zone = resolve_zone(
      options.time_zone.as_deref()
    )?;
    let today = options
      .today
      .unwrap_or_else(|| today_in(time_zone));
    let current_view =
      match options.state.current_view {
        | Some(view) => view,
        | None => {
          options
            .views
            .default_view()
            .ok_or(
              CalendarError::NoViewsConfigured
            )?
        }
      };
    if !options.views.has(current_view) {
      return Err(
        CalendarError::ViewNotConfigured(
          current_view
        )
      );
    }
    let reference_date = options
      .state
      .reference_date
      .unwrap_or(today);
    let range = date_range(
      current_view,
      reference_date,
      time_zone,
      options.views.week_starts_on()
    )?;

    let listener =
      options.on_state_change.take();
    let mut calendar = Self {
      options,
      time_zone,
      state: CalendarState {
        reference_date,
        current_view,
        date_range: range
      },
      subscribers: Vec::new(),
      next_id: 0,
      options_listener: None
    };
    if let Some(listener) = listener {
      let id = calendar.register(listener);
      calendar.options_listener = Some(id);
    }

    tracing::debug!(
      %reference_date,
      %current_view,
      timezone = %time_zone,
      "calendar initialised"
    );
    Ok(calendar)
  }

  pub fn state(&self) -> &CalendarState {
    &self.state
  }

  pub fn date_range(&self) -> &DateRange {
    &self.state.date_range
  }

  pub fn options(
    &self
  ) -> &CalendarOptions<T> {
    &self.options
  }

  pub fn time_zone(&self) -> Tz {
    self.time_zone
  }

  pub fn has_month_view(&self) -> bool {
    self.options.views.has(ViewKind::Month)
  }

  pub fn has_week_view(&self) -> bool {
    self.options.views.has(ViewKind::Week)
  }

  pub fn has_day_view(&self) -> bool {
    self.options.views.has(ViewKind::Day)
  }

  fn register(
    &mut self,
    listener: StateListener
  ) -> SubscriptionId {
    let id = SubscriptionId(self.next_id);
    self.next_id += 1;
    self.subscribers.push((id, listener));
    id
  }

  pub fn subscribe(
    &mut self,
    listener: impl FnMut(&CalendarState)
    + Send
    + 'static
  ) -> SubscriptionId {
    self.register(Box::new(listener))
  }

  pub fn unsubscribe(
    &mut self,
    id: SubscriptionId
  ) -> bool {
    let before = self.subscribers.len();
    self
      .subscribers
      .retain(|(sub, _)| *sub != id);
    if self.options_listener == Some(id) {
      self.options_listener = None;
    }
    before != self.subscribers.len()
  }

  fn ensure_configured(
    &self,
    view: ViewKind
  ) -> Result<()> {
    if self.options.views.has(view) {
      Ok(())
    } else {
      Err(CalendarError::ViewNotConfigured(
        view
      ))
    }
  }

  fn today(&self) -> NaiveDate {
    self
      .options
      .today
      .unwrap_or_else(|| today_in(self.time_zone))
  }

  /// Merges a patch computed from the
  /// current state, recomputes the date
  /// range, notifies subscribers, then
  /// commits.
  pub fn set_state(
    &mut self,
    updater: impl FnOnce(&CalendarState)
    -> StatePatch
  ) -> Result<()> {
    let patch = updater(&self.state);
    let reference_date = patch
      .reference_date
      .unwrap_or(self.state.reference_date);
    let current_view = patch
      .current_view
      .unwrap_or(self.state.current_view);
    self.ensure_configured(current_view)?;

    let range = date_range(
      current_view,
      reference_date,
      self.time_zone,
      self.options.views.week_starts_on()
    )?;
    let next = CalendarState {
      reference_date,
      current_view,
      date_range: range
    };
    for (_, listener) in
      self.subscribers.iter_mut()
    {
      listener(&next);
    }
    tracing::debug!(
      %reference_date,
      %current_view,
      "calendar state committed"
    );
    self.state = next;
    Ok(())
  }

  /// Replaces the whole state; the given
  /// date range is discarded and derived
  /// again.
  pub fn replace_state(
    &mut self,
    state: CalendarState
  ) -> Result<()> {
    self.set_state(|_| state.into())
  }

  pub fn set_current_view(
    &mut self,
    view: ViewKind
  ) -> Result<()> {
    self.set_state(|_| {
      StatePatch::current_view(view)
    })
  }

  fn resolve_view(
    &self,
    view: Option<ViewKind>
  ) -> Result<ViewKind> {
    let view = view
      .unwrap_or(self.state.current_view);
    self.ensure_configured(view)?;
    Ok(view)
  }

  fn step(
    &mut self,
    view: ViewKind,
    direction: i32
  ) -> Result<()> {
    let current = self.state.reference_date;
    let target = match view {
      | ViewKind::Month => {
        YearMonth::of(current)
          .shift(direction)?
          .first_day()?
      }
      | ViewKind::Week => {
        add_days(
          current,
          i64::from(direction) * 7
        )?
      }
      | ViewKind::Day => {
        add_days(
          current,
          i64::from(direction)
        )?
      }
    };
    self.set_state(|_| {
      StatePatch::reference_date(target)
    })
  }

  #[tracing::instrument(skip(self))]
  pub fn next(
    &mut self,
    view: Option<ViewKind>
  ) -> Result<()> {
    let view = self.resolve_view(view)?;
    self.step(view, 1)
  }

  #[tracing::instrument(skip(self))]
  pub fn previous(
    &mut self,
    view: Option<ViewKind>
  ) -> Result<()> {
    let view = self.resolve_view(view)?;
    self.step(view, -1)
  }

  pub fn next_month(&mut self) -> Result<()> {
    self.next(Some(ViewKind::Month))
  }

  pub fn previous_month(
    &mut self
  ) -> Result<()> {
    self.previous(Some(ViewKind::Month))
  }

  pub fn next_week(&mut self) -> Result<()> {
    self.next(Some(ViewKind::Week))
  }

  pub fn previous_week(
    &mut self
  ) -> Result<()> {
    self.previous(Some(ViewKind::Week))
  }

  pub fn next_day(&mut self) -> Result<()> {
    self.next(Some(ViewKind::Day))
  }

  pub fn previous_day(
    &mut self
  ) -> Result<()> {
    self.previous(Some(ViewKind::Day))
  }

  pub fn go_to_today(&mut self) -> Result<()> {
    let today = self.today();
    self.go_to_date(today)
  }

  #[tracing::instrument(skip(self))]
  pub fn go_to_date(
    &mut self,
    date: NaiveDate
  ) -> Result<()> {
    self.set_state(|_| {
      StatePatch::reference_date(date)
    })
  }

  #[tracing::instrument(skip(self))]
  pub fn go_to_month(
    &mut self,
    year: i32,
    month: u32
  ) -> Result<()> {
    let first =
      YearMonth::new(year, month)?.first_day()?;
    self.go_to_date(first)
  }

  /// Range for `view` (default: current
  /// view) at the current reference date.
  pub fn get_date_range(
    &self,
    view: Option<ViewKind>
  ) -> Result<DateRange> {
    let view = view
      .unwrap_or(self.state.current_view);
    date_range(
      view,
      self.state.reference_date,
      self.time_zone,
      self.options.views.week_starts_on()
    )
  }

  pub fn get_month_range(
    &self,
    mode: RangeMode
  ) -> Result<DateRange> {
    month_range(
      self.state.reference_date,
      self.time_zone,
      self.options.views.week_starts_on(),
      mode
    )
  }

  pub fn get_month(
    &self
  ) -> Result<CalendarMonth<T>> {
    let views = &self.options.views;
    let month = views.month_options()?;
    let reference = self.state.reference_date;
    build_month(
      reference.year(),
      reference.month(),
      &MonthGridOptions {
        data:           &self.options.data,
        accessor:       month.accessor.as_ref(),
        week_starts_on: month
          .week_starts_on
          .unwrap_or(views.week_starts_on()),
        today:          Some(self.today())
      }
    )
  }

  pub fn get_week(
    &self
  ) -> Result<CalendarWeekView<T>> {
    let views = &self.options.views;
    let week = views.week_options()?;
    build_week(
      self.state.reference_date,
      &WeekGridOptions {
        data:           &self.options.data,
        accessor:       week.accessor.as_ref(),
        week_starts_on: week
          .week_starts_on
          .unwrap_or(views.week_starts_on()),
        start_hour:     week.start_hour,
        end_hour:       week.end_hour,
        slot_duration:  week.slot_duration,
        today:          Some(self.today())
      }
    )
  }

  pub fn get_day(
    &self
  ) -> Result<CalendarDayView<T>> {
    let day = self.options.views.day_options()?;
    build_day(
      self.state.reference_date,
      &DayGridOptions {
        data:          &self.options.data,
        accessor:      day.accessor.as_ref(),
        start_hour:    day.start_hour,
        end_hour:      day.end_hour,
        slot_duration: day.slot_duration,
        today:         Some(self.today())
      }
    )
  }

  pub fn get_title(
    &self,
    view: Option<ViewKind>,
    locale: &str,
    options: &TitleOptions
  ) -> Result<String> {
    self.get_title_with(
      &ChronoFormatter,
      view,
      locale,
      options
    )
  }

  pub fn get_title_with(
    &self,
    formatter: &dyn LocaleFormatter,
    view: Option<ViewKind>,
    locale: &str,
    options: &TitleOptions
  ) -> Result<String> {
    let view = self.resolve_view(view)?;
    let title = match view {
      | ViewKind::Month => {
        let grid = self.get_month()?;
        formatter.format_date(
          grid.month.first_day()?,
          locale,
          &options.month
        )
      }
      | ViewKind::Week => {
        let grid = self.get_week()?;
        format!(
          "{} \u{2013} {}, {}",
          formatter.format_date(
            grid.week_start,
            locale,
            &options.week
          ),
          formatter.format_date(
            grid.week_end,
            locale,
            &options.week
          ),
          formatter.format_date(
            grid.week_end,
            locale,
            &options.year
          )
        )
      }
      | ViewKind::Day => {
        let grid = self.get_day()?;
        formatter.format_date(
          grid.date,
          locale,
          &options.day
        )
      }
    };
    Ok(title)
  }

  /// Applies `updater` to a copy of the
  /// options; the calendar is left
  /// untouched if the result is invalid.
  #[tracing::instrument(skip_all)]
  pub fn set_options(
    &mut self,
    updater: impl FnOnce(&mut CalendarOptions<T>)
  ) -> Result<()> {
    let mut staged = self.options.clone();
    updater(&mut staged);
    staged.views.validate()?;
    let time_zone = resolve_zone(
      staged.time_zone.as_deref()
    )?;

    let current_view = if staged
      .views
      .has(self.state.current_view)
    {
      self.state.current_view
    } else {
      staged
        .views
        .default_view()
        .ok_or(CalendarError::NoViewsConfigured)?
    };
    // Fail before committing anything.
    date_range(
      current_view,
      self.state.reference_date,
      time_zone,
      staged.views.week_starts_on()
    )?;

    if let Some(listener) =
      staged.on_state_change.take()
    {
      if let Some(old) =
        self.options_listener.take()
      {
        self.unsubscribe(old);
      }
      let id = self.register(listener);
      self.options_listener = Some(id);
    }
    self.options = staged;
    self.time_zone = time_zone;

    self.set_state(|_| {
      StatePatch::current_view(current_view)
    })
  }
}

/// Mutex-guarded calendar for hosts that
/// share one engine across threads.
pub struct SharedCalendar<T> {
  inner: Arc<Mutex<Calendar<T>>>
}

impl<T> Clone for SharedCalendar<T> {
  fn clone(&self) -> Self {
    Self {
      inner: Arc::clone(&self.inner)
    }
  }
}

impl<T: Clone> SharedCalendar<T> {
  pub fn new(calendar: Calendar<T>) -> Self {
    Self {
      inner: Arc::new(Mutex::new(calendar))
    }
  }

  /// Runs `f` with exclusive access; every
  /// `set_state` inside is serialised.
  pub fn with<R>(
    &self,
    f: impl FnOnce(&mut Calendar<T>) -> R
  ) -> R {
    let mut guard = self
      .inner
      .lock()
      .unwrap_or_else(PoisonError::into_inner);
    f(&mut guard)
  }

  pub fn state(&self) -> CalendarState {
    self.with(|calendar| {
      calendar.state().clone()
    })
  }
}

#[cfg(test)]
mod tests {
  use std::sync::{
    Arc,
    Mutex
  };

  use chrono::NaiveDate;

  use super::{
    Calendar,
    CalendarOptions,
    StatePatch,
    TitleOptions
  };
  use crate::accessor::AccessorFn;
  use crate::error::CalendarError;
  use crate::views::{
    DayViewOptions,
    MonthViewOptions,
    SharedAccessor,
    ViewKind,
    ViewsConfig,
    WeekViewOptions
  };

  fn date(
    y: i32,
    m: u32,
    d: u32
  ) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d)
      .expect("valid date")
  }

  fn accessor() -> SharedAccessor<NaiveDate>
  {
    Arc::new(AccessorFn::new(
      |d: &NaiveDate| *d
    ))
  }

  fn all_views() -> ViewsConfig<NaiveDate> {
    ViewsConfig::new()
      .month(MonthViewOptions::new(accessor()))
      .week(WeekViewOptions::new(accessor()))
      .day(DayViewOptions::new(accessor()))
  }

  fn calendar_at(
    views: ViewsConfig<NaiveDate>,
    reference: NaiveDate
  ) -> Calendar<NaiveDate> {
    Calendar::new(
      CalendarOptions::new(views)
        .today(reference)
        .state(StatePatch::reference_date(
          reference
        ))
    )
    .expect("calendar")
  }

  #[test]
  fn defaults_to_first_view_and_today() {
    let views = ViewsConfig::new()
      .week(WeekViewOptions::new(accessor()))
      .month(MonthViewOptions::new(accessor()));
    let calendar = Calendar::new(
      CalendarOptions::new(views)
        .today(date(2024, 3, 6))
    )
    .expect("calendar");
    assert_eq!(
      calendar.state().current_view,
      ViewKind::Week
    );
    assert_eq!(
      calendar.state().reference_date,
      date(2024, 3, 6)
    );
    assert_eq!(
      calendar.date_range().first_date(),
      date(2024, 3, 4)
    );
  }

  #[test]
  fn week_grid_keeps_its_own_week_start() {
    let views = ViewsConfig::new()
      .month(
        MonthViewOptions::new(accessor())
          .week_starts_on(0)
      )
      .week(
        WeekViewOptions::new(accessor())
          .week_starts_on(3)
      );
    // Thursday.
    let mut calendar =
      calendar_at(views, date(2024, 1, 18));
    calendar
      .set_current_view(ViewKind::Week)
      .expect("week view");

    let week = calendar.get_week().expect("week");
    assert_eq!(week.week_start, date(2024, 1, 17));
    assert_eq!(week.week_end, date(2024, 1, 23));

    // Shared range math follows the month view.
    assert_eq!(
      calendar.date_range().first_date(),
      date(2024, 1, 14)
    );
    assert_eq!(
      calendar.date_range().last_date(),
      date(2024, 1, 20)
    );
  }

  #[test]
  fn rejects_missing_views() {
    let result = Calendar::new(
      CalendarOptions::new(
        ViewsConfig::<NaiveDate>::new()
      )
    );
    assert!(matches!(
      result,
      Err(CalendarError::NoViewsConfigured)
    ));
  }

  #[test]
  fn month_step_snaps_to_first() {
    let mut calendar = calendar_at(
      all_views(),
      date(2024, 1, 31)
    );
    calendar.next_month().expect("next");
    assert_eq!(
      calendar.state().reference_date,
      date(2024, 2, 1)
    );
    calendar
      .previous_month()
      .expect("previous");
    calendar
      .previous_month()
      .expect("previous");
    assert_eq!(
      calendar.state().reference_date,
      date(2023, 12, 1)
    );
  }

  #[test]
  fn week_and_day_steps_keep_weekday() {
    let mut calendar = calendar_at(
      all_views(),
      date(2024, 1, 17)
    );
    calendar.next_week().expect("next");
    assert_eq!(
      calendar.state().reference_date,
      date(2024, 1, 24)
    );
    calendar.previous_day().expect("prev");
    assert_eq!(
      calendar.state().reference_date,
      date(2024, 1, 23)
    );
  }

  #[test]
  fn navigation_on_missing_view_fails() {
    let views = ViewsConfig::new()
      .month(MonthViewOptions::new(accessor()));
    let mut calendar =
      calendar_at(views, date(2024, 1, 15));
    assert_eq!(
      calendar.next(Some(ViewKind::Day)),
      Err(CalendarError::ViewNotConfigured(
        ViewKind::Day
      ))
    );
    assert!(calendar.get_week().is_err());
    assert!(
      calendar
        .set_current_view(ViewKind::Week)
        .is_err()
    );
    assert_eq!(
      calendar.state().reference_date,
      date(2024, 1, 15)
    );
  }

  #[test]
  fn every_mutation_refreshes_range_then_notifies() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let mut calendar = Calendar::new(
      CalendarOptions::new(all_views())
        .today(date(2024, 1, 15))
        .on_state_change(move |state| {
          sink
            .lock()
            .expect("lock")
            .push(state.clone());
        })
    )
    .expect("calendar");

    calendar
      .set_current_view(ViewKind::Day)
      .expect("switch view");
    calendar
      .set_state(|_| StatePatch::default())
      .expect("no-op patch");

    let seen = seen.lock().expect("lock");
    assert_eq!(seen.len(), 2);
    assert_eq!(
      seen[0].date_range.first_date(),
      date(2024, 1, 15)
    );
    assert_eq!(
      seen[0].date_range.last_date(),
      date(2024, 1, 15)
    );
    assert_eq!(&seen[1], calendar.state());
  }

  #[test]
  fn unsubscribed_listeners_stay_quiet() {
    let count = Arc::new(Mutex::new(0));
    let sink = Arc::clone(&count);
    let mut calendar = calendar_at(
      all_views(),
      date(2024, 1, 15)
    );
    let id = calendar.subscribe(move |_| {
      *sink.lock().expect("lock") += 1;
    });
    calendar.next_day().expect("next");
    assert!(calendar.unsubscribe(id));
    calendar.next_day().expect("next");
    assert_eq!(*count.lock().expect("lock"), 1);
    assert!(!calendar.unsubscribe(id));
  }

  #[test]
  fn go_to_month_and_today() {
    let mut calendar = calendar_at(
      all_views(),
      date(2024, 1, 15)
    );
    calendar
      .go_to_month(2025, 7)
      .expect("go to month");
    assert_eq!(
      calendar.state().reference_date,
      date(2025, 7, 1)
    );
    assert!(calendar.go_to_month(2025, 13).is_err());
    calendar.go_to_today().expect("today");
    assert_eq!(
      calendar.state().reference_date,
      date(2024, 1, 15)
    );
  }

  #[test]
  fn titles_per_view() {
    let calendar = calendar_at(
      all_views(),
      date(2024, 1, 18)
    );
    let options = TitleOptions::default();
    assert_eq!(
      calendar
        .get_title(Some(ViewKind::Month), "en-US", &options)
        .expect("title"),
      "January 2024"
    );
    assert_eq!(
      calendar
        .get_title(Some(ViewKind::Week), "en-US", &options)
        .expect("title"),
      "Jan 15 \u{2013} Jan 21, 2024"
    );
    assert_eq!(
      calendar
        .get_title(Some(ViewKind::Day), "en-US", &options)
        .expect("title"),
      "Thursday, January 18, 2024"
    );
  }

  #[test]
  fn set_options_swaps_views_and_zone() {
    let mut calendar = calendar_at(
      all_views(),
      date(2024, 1, 15)
    );
    calendar
      .set_options(|options| {
        options.views = ViewsConfig::new()
          .day(DayViewOptions::new(accessor()));
        options.time_zone =
          Some("Asia/Tokyo".to_string());
      })
      .expect("set options");
    assert_eq!(
      calendar.state().current_view,
      ViewKind::Day
    );
    assert_eq!(
      calendar.time_zone().name(),
      "Asia/Tokyo"
    );
    assert!(!calendar.has_month_view());

    let rejected = calendar.set_options(|options| {
      options.time_zone =
        Some("Nowhere/Land".to_string());
    });
    assert!(rejected.is_err());
    assert_eq!(
      calendar.time_zone().name(),
      "Asia/Tokyo"
    );
  }

  #[test]
  fn month_grid_reads_configured_data() {
    let views = ViewsConfig::new().month(
      MonthViewOptions::new(accessor())
        .week_starts_on(0)
    );
    let mut calendar = Calendar::new(
      CalendarOptions::new(views)
        .data(vec![
          date(2024, 2, 29),
          date(2024, 2, 29),
          date(2024, 3, 1),
        ])
        .today(date(2024, 2, 10))
    )
    .expect("calendar");
    let month = calendar.get_month().expect("month");
    let leap_day = month
      .days()
      .find(|d| d.date == date(2024, 2, 29))
      .expect("leap day");
    assert_eq!(leap_day.items.len(), 2);
    assert_eq!(
      month.weeks[0][0].date,
      date(2024, 1, 28)
    );

    calendar.next(None).expect("next");
    assert_eq!(
      calendar.state().reference_date,
      date(2024, 3, 1)
    );
  }
}
