use std::ffi::OsString;
use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::anyhow;
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::format::WeekdayFormat;
use crate::views::ViewKind;

#[derive(Debug, Clone)]
pub struct PreprocessedArgs {
    pub cleaned_args: Vec<OsString>,
    pub rc_overrides: Vec<(String, String)>,
}

#[derive(Debug, Clone)]
pub struct KeyVal {
    pub key: String,
    pub value: String,
}

impl std::str::FromStr for KeyVal {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (k, v) = s
            .split_once('=')
            .ok_or_else(|| anyhow!("expected KEY=VALUE, got: {s}"))?;
        Ok(Self {
            key: k.trim().to_string(),
            value: v.trim().to_string(),
        })
    }
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "almanac",
    version,
    about = "Month, week and day calendar grids in the terminal",
    disable_help_subcommand = true
)]
pub struct GlobalCli {
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[arg(short = 'q', long = "quiet", action = ArgAction::Count, global = true)]
    pub quiet: u8,

    #[arg(
        long = "rc",
        value_parser = clap::builder::ValueParser::new(|s: &str| s.parse::<KeyVal>()),
        action = ArgAction::Append,
        global = true
    )]
    pub rc_overrides: Vec<KeyVal>,

    #[arg(long = "config", global = true)]
    pub config: Option<PathBuf>,

    /// IANA time zone, e.g. Europe/Berlin.
    #[arg(long = "tz", global = true)]
    pub tz: Option<String>,

    /// JSON-lines file of events.
    #[arg(long = "items", global = true)]
    pub items: Option<PathBuf>,

    /// Pretend today is this date.
    #[arg(long = "today", global = true)]
    pub today: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Month grid around DATE.
    Month(ViewArgs),
    /// Week grid containing DATE.
    Week(ViewArgs),
    /// Day view with time slots.
    Day(ViewArgs),
    /// Print only the title of a view.
    Title {
        view: ViewKindArg,
        date: Option<String>,
    },
    /// Weekday labels starting at the configured week start.
    Weekdays {
        #[arg(long, value_enum, default_value_t = WeekdayStyleArg::Short)]
        format: WeekdayStyleArg,
    },
    /// Zoned start and end instants of a view.
    Range {
        view: ViewKindArg,
        date: Option<String>,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct ViewArgs {
    pub date: Option<String>,

    /// Step forward N periods before printing.
    #[arg(long, default_value_t = 0)]
    pub next: u32,

    /// Step back N periods before printing.
    #[arg(long, default_value_t = 0)]
    pub prev: u32,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewKindArg {
    Month,
    Week,
    Day,
}

impl From<ViewKindArg> for ViewKind {
    fn from(arg: ViewKindArg) -> Self {
        match arg {
            ViewKindArg::Month => ViewKind::Month,
            ViewKindArg::Week => ViewKind::Week,
            ViewKindArg::Day => ViewKind::Day,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeekdayStyleArg {
    Long,
    Short,
    Narrow,
}

impl From<WeekdayStyleArg> for WeekdayFormat {
    fn from(arg: WeekdayStyleArg) -> Self {
        match arg {
            WeekdayStyleArg::Long => WeekdayFormat::Long,
            WeekdayStyleArg::Short => WeekdayFormat::Short,
            WeekdayStyleArg::Narrow => WeekdayFormat::Narrow,
        }
    }
}

pub fn init_tracing(verbose: u8, quiet: u8) -> anyhow::Result<()> {
    let default_level = if quiet >= 2 {
        "error"
    } else if quiet == 1 {
        "warn"
    } else if verbose >= 3 {
        "trace"
    } else if verbose == 2 {
        "debug"
    } else if verbose == 1 {
        "info"
    } else {
        "warn"
    };

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .map_err(|e| anyhow!("invalid RUST_LOG / log filter: {e}"))?;

    let init_result = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .try_init();

    if let Err(err) = init_result {
        debug!(error = %err, "tracing subscriber already set, continuing");
    }

    Ok(())
}

/// Pulls bare `rc.key=value` / `rc.key:value` arguments out before clap sees them.
#[tracing::instrument(skip_all)]
pub fn preprocess_args(raw: &[OsString]) -> anyhow::Result<PreprocessedArgs> {
    let mut cleaned = Vec::with_capacity(raw.len());
    let mut overrides: Vec<(String, String)> = Vec::new();

    let mut iter = raw.iter().cloned();
    if let Some(bin) = iter.next() {
        cleaned.push(bin);
    }

    for arg in iter {
        let s = arg.to_string_lossy();
        if let Some(rest) = s.strip_prefix("rc.") {
            let parsed = if let Some((k, v)) = rest.split_once('=') {
                Some((format!("rc.{k}"), v.to_string()))
            } else if let Some((k, v)) = rest.split_once(':') {
                Some((format!("rc.{k}"), v.to_string()))
            } else {
                None
            };

            if let Some((k, v)) = parsed {
                debug!(key = %k, value = %v, "captured positional rc override");
                overrides.push((k, v));
                continue;
            }
        }

        cleaned.push(arg);
    }

    Ok(PreprocessedArgs {
        cleaned_args: cleaned,
        rc_overrides: overrides,
    })
}
