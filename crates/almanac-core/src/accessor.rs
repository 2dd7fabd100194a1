//! Mapping from caller items to calendar
//! positions.

use std::fmt;

use chrono::{
  NaiveDate,
  NaiveDateTime
};

/// Reads calendar coordinates off a
/// caller-owned item.
///
/// Only `date` is required. Items whose
/// accessor yields no `start` are still
/// bucketed by day but never land in a
/// time slot.
pub trait CalendarAccessor<T> {
  fn date(&self, item: &T) -> NaiveDate;

  fn start(
    &self,
    _item: &T
  ) -> Option<NaiveDateTime> {
    None
  }

  fn end(
    &self,
    _item: &T
  ) -> Option<NaiveDateTime> {
    None
  }
}

type DateFn<T> =
  Box<dyn Fn(&T) -> NaiveDate + Send + Sync>;
type DateTimeFn<T> = Box<
  dyn Fn(&T) -> Option<NaiveDateTime>
    + Send
    + Sync
>;

/// Closure-backed accessor for callers
/// that do not want a dedicated type.
pub struct AccessorFn<T> {
  date:  DateFn<T>,
  start: Option<DateTimeFn<T>>,
  end:   Option<DateTimeFn<T>>
}

impl<T> AccessorFn<T> {
  pub fn new(
    date: impl Fn(&T) -> NaiveDate
    + Send
    + Sync
    + 'static
  ) -> Self {
    Self {
      date:  Box::new(date),
      start: None,
      end:   None
    }
  }

  #[must_use]
  pub fn with_start(
    mut self,
    start: impl Fn(&T) -> NaiveDateTime
    + Send
    + Sync
    + 'static
  ) -> Self {
    self.start = Some(Box::new(
      move |item| Some(start(item))
    ));
    self
  }

  #[must_use]
  pub fn with_end(
    mut self,
    end: impl Fn(&T) -> NaiveDateTime
    + Send
    + Sync
    + 'static
  ) -> Self {
    self.end = Some(Box::new(
      move |item| Some(end(item))
    ));
    self
  }

  pub fn has_start(&self) -> bool {
    self.start.is_some()
  }
}

impl<T> CalendarAccessor<T>
  for AccessorFn<T>
{
  fn date(&self, item: &T) -> NaiveDate {
    (self.date)(item)
  }

  fn start(
    &self,
    item: &T
  ) -> Option<NaiveDateTime> {
    self
      .start
      .as_ref()
      .and_then(|start| start(item))
  }

  fn end(
    &self,
    item: &T
  ) -> Option<NaiveDateTime> {
    self
      .end
      .as_ref()
      .and_then(|end| end(item))
  }
}

impl<T> fmt::Debug for AccessorFn<T> {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    f.debug_struct("AccessorFn")
      .field("start", &self.start.is_some())
      .field("end", &self.end.is_some())
      .finish_non_exhaustive()
  }
}
