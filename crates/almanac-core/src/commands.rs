use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use chrono::NaiveDate;
use chrono_tz::Tz;
use tracing::{debug, info, instrument};

use crate::calendar::{Calendar, CalendarOptions, StatePatch, TitleOptions};
use crate::cli::{Command, ViewArgs};
use crate::config::Config;
use crate::datetime::parse_date_expr;
use crate::format::{WeekdayFormat, get_weekdays};
use crate::items::{EventAccessor, EventItem, load_items};
use crate::render::Renderer;
use crate::views::{
    DayViewOptions, MonthViewOptions, SharedAccessor, ViewKind, ViewsConfig, WeekViewOptions,
};

/// Everything a command needs that does not come from its own arguments.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub time_zone: Tz,
    pub today: NaiveDate,
    pub items: Vec<EventItem>,
}

impl RunContext {
    pub fn load(tz: Tz, today: NaiveDate, items_path: Option<&Path>) -> anyhow::Result<Self> {
        let items = match items_path {
            Some(path) => load_items(path)
                .with_context(|| format!("failed to load items from {}", path.display()))?,
            None => Vec::new(),
        };
        Ok(Self {
            time_zone: tz,
            today,
            items,
        })
    }
}

#[instrument(skip(cfg, ctx))]
pub fn build_calendar(
    cfg: &Config,
    ctx: &RunContext,
    view: ViewKind,
) -> anyhow::Result<Calendar<EventItem>> {
    let week_starts_on = cfg.week_starts_on()?;
    let start_hour = cfg.get_u32("day.start_hour")?.unwrap_or(0);
    let end_hour = cfg.get_u32("day.end_hour")?.unwrap_or(24);
    let slot_minutes = cfg.get_u32("day.slot_minutes")?.unwrap_or(30);

    let accessor: SharedAccessor<EventItem> = Arc::new(EventAccessor);
    let views = ViewsConfig::new()
        .month(MonthViewOptions::new(accessor.clone()).week_starts_on(week_starts_on))
        .week(WeekViewOptions::new(accessor.clone()).week_starts_on(week_starts_on))
        .day(DayViewOptions::new(accessor).time_slots(start_hour, end_hour, slot_minutes));

    let options = CalendarOptions::new(views)
        .data(ctx.items.clone())
        .time_zone(ctx.time_zone.name())
        .today(ctx.today)
        .state(StatePatch::current_view(view));

    let calendar = Calendar::new(options).context("failed to initialise calendar")?;
    debug!(
        items = ctx.items.len(),
        week_starts_on, "calendar ready"
    );
    Ok(calendar)
}

#[instrument(skip(cfg, renderer, ctx, command))]
pub fn dispatch(
    cfg: &Config,
    renderer: &Renderer,
    ctx: &RunContext,
    command: Option<Command>,
) -> anyhow::Result<()> {
    let command = match command {
        Some(command) => command,
        None => {
            let view = cfg.default_view()?;
            info!(%view, "no command given; showing default view");
            view_command(view, ViewArgs::default())
        }
    };

    match command {
        Command::Month(args) => cmd_view(cfg, renderer, ctx, ViewKind::Month, &args),
        Command::Week(args) => cmd_view(cfg, renderer, ctx, ViewKind::Week, &args),
        Command::Day(args) => cmd_view(cfg, renderer, ctx, ViewKind::Day, &args),
        Command::Title { view, date } => cmd_title(cfg, renderer, ctx, view.into(), date.as_deref()),
        Command::Weekdays { format } => cmd_weekdays(cfg, renderer, format.into()),
        Command::Range { view, date } => cmd_range(cfg, renderer, ctx, view.into(), date.as_deref()),
    }
}

fn view_command(view: ViewKind, args: ViewArgs) -> Command {
    match view {
        ViewKind::Month => Command::Month(args),
        ViewKind::Week => Command::Week(args),
        ViewKind::Day => Command::Day(args),
    }
}

fn positioned_calendar(
    cfg: &Config,
    ctx: &RunContext,
    view: ViewKind,
    date: Option<&str>,
) -> anyhow::Result<Calendar<EventItem>> {
    let mut calendar = build_calendar(cfg, ctx, view)?;
    if let Some(raw) = date {
        let target = parse_date_expr(raw, ctx.today)
            .with_context(|| format!("could not understand date '{raw}'"))?;
        calendar.go_to_date(target)?;
    }
    Ok(calendar)
}

#[instrument(skip(cfg, renderer, ctx))]
fn cmd_view(
    cfg: &Config,
    renderer: &Renderer,
    ctx: &RunContext,
    view: ViewKind,
    args: &ViewArgs,
) -> anyhow::Result<()> {
    let mut calendar = positioned_calendar(cfg, ctx, view, args.date.as_deref())?;
    for _ in 0..args.next {
        calendar.next(None)?;
    }
    for _ in 0..args.prev {
        calendar.previous(None)?;
    }
    info!(
        reference = %calendar.state().reference_date,
        %view,
        "rendering view"
    );

    let title = calendar.get_title(None, renderer.locale(), &TitleOptions::default())?;
    match view {
        ViewKind::Month => {
            let month = calendar.get_month()?;
            let weekdays = get_weekdays(
                cfg.week_starts_on()?,
                renderer.locale(),
                WeekdayFormat::Short,
            )?;
            renderer.print_month(&title, &month, &weekdays)
        }
        ViewKind::Week => renderer.print_week(&title, &calendar.get_week()?),
        ViewKind::Day => renderer.print_day(&title, &calendar.get_day()?),
    }
}

fn cmd_title(
    cfg: &Config,
    renderer: &Renderer,
    ctx: &RunContext,
    view: ViewKind,
    date: Option<&str>,
) -> anyhow::Result<()> {
    let calendar = positioned_calendar(cfg, ctx, view, date)?;
    let title = calendar.get_title(Some(view), renderer.locale(), &TitleOptions::default())?;
    renderer.print_line(&title)
}

fn cmd_weekdays(cfg: &Config, renderer: &Renderer, format: WeekdayFormat) -> anyhow::Result<()> {
    let labels = get_weekdays(cfg.week_starts_on()?, renderer.locale(), format)?;
    renderer.print_weekdays(&labels)
}

fn cmd_range(
    cfg: &Config,
    renderer: &Renderer,
    ctx: &RunContext,
    view: ViewKind,
    date: Option<&str>,
) -> anyhow::Result<()> {
    let calendar = positioned_calendar(cfg, ctx, view, date)?;
    let range = calendar.get_date_range(Some(view))?;
    renderer.print_range(&range)
}
