//! Calendar grids, date ranges and
//! navigation state.
//!
//! The engine ([`Calendar`], [`grid`],
//! [`range`]) is generic over the item type
//! and reads dates through a
//! [`CalendarAccessor`]. The remaining
//! modules make up the `almanac` terminal
//! front end.

pub mod accessor;
pub mod calendar;
pub mod cli;
pub mod commands;
pub mod config;
pub mod datetime;
pub mod error;
pub mod format;
pub mod grid;
pub mod items;
pub mod range;
pub mod render;
pub mod views;

use std::ffi::OsString;

use anyhow::Context;
use clap::Parser;
use tracing::{
  debug,
  info
};

pub use accessor::{
  AccessorFn,
  CalendarAccessor
};
pub use calendar::{
  Calendar,
  CalendarOptions,
  CalendarState,
  SharedCalendar,
  StatePatch,
  SubscriptionId,
  TitleOptions
};
pub use error::{
  CalendarError,
  Result
};
pub use grid::{
  CalendarDay,
  CalendarDayView,
  CalendarMonth,
  CalendarWeek,
  CalendarWeekView,
  TimeSlot,
  WeekDay
};
pub use range::{
  DateRange,
  RangeMode
};
pub use views::{
  DayViewOptions,
  MonthViewOptions,
  ViewKind,
  ViewsConfig,
  WeekViewOptions
};

#[tracing::instrument(skip_all)]
pub fn run(
  raw_args: Vec<OsString>
) -> anyhow::Result<()> {
  let pre =
    cli::preprocess_args(&raw_args)?;
  let cli = cli::GlobalCli::parse_from(
    pre.cleaned_args
  );

  cli::init_tracing(
    cli.verbose,
    cli.quiet
  )?;

  info!(
    verbose = cli.verbose,
    quiet = cli.quiet,
    "starting almanac CLI"
  );
  debug!(?pre.rc_overrides, "preprocessed rc overrides");

  let mut cfg = config::Config::load(
    cli.config.as_deref()
  )?;
  cfg.apply_overrides(
    pre.rc_overrides.into_iter().chain(
      cli
        .rc_overrides
        .into_iter()
        .map(|kv| (kv.key, kv.value))
    )
  );

  let tz = datetime::resolve_time_zone(
    cli.tz.as_deref(),
    cfg.get("timezone").as_deref()
  );
  let today = match cli.today.as_deref() {
    | Some(raw) => {
      datetime::parse_date_expr(
        raw,
        datetime::today_in(tz)
      )
      .with_context(|| {
        format!(
          "invalid --today value: {raw}"
        )
      })?
    }
    | None => datetime::today_in(tz)
  };
  debug!(timezone = %tz, %today, "resolved clock");

  let ctx = commands::RunContext::load(
    tz,
    today,
    cli.items.as_deref()
  )?;
  let renderer =
    render::Renderer::new(&cfg)?;

  commands::dispatch(
    &cfg,
    &renderer,
    &ctx,
    cli.command
  )?;

  info!("done");
  Ok(())
}
