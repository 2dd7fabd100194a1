use std::io::{self, IsTerminal, Write};

use anyhow::anyhow;
use chrono::Datelike;
use unicode_width::UnicodeWidthStr;

use crate::config::Config;
use crate::format::{TimeFormat, format_date, format_time};
use crate::grid::{CalendarDayView, CalendarMonth, CalendarWeekView, TimeSlot};
use crate::items::EventItem;
use crate::range::DateRange;

#[derive(Debug, Clone)]
pub struct Renderer {
    color: bool,
    locale: String,
}

impl Renderer {
    pub fn new(cfg: &Config) -> anyhow::Result<Self> {
        let color_cfg = cfg.get("color").unwrap_or_else(|| "on".to_string());
        let color = match color_cfg.to_ascii_lowercase().as_str() {
            "on" | "yes" | "true" | "1" => true,
            "off" | "no" | "false" | "0" => false,
            other => return Err(anyhow!("invalid color setting: {other}")),
        };
        let locale = cfg
            .get("locale")
            .unwrap_or_else(|| crate::format::DEFAULT_LOCALE.to_string());

        Ok(Self { color, locale })
    }

    pub fn locale(&self) -> &str {
        &self.locale
    }

    pub fn print_line(&self, text: &str) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();
        writeln!(out, "{text}")?;
        Ok(())
    }

    #[tracing::instrument(skip(self, month, weekdays))]
    pub fn print_month(
        &self,
        title: &str,
        month: &CalendarMonth<EventItem>,
        weekdays: &[String],
    ) -> anyhow::Result<()> {
        self.write_month(io::stdout().lock(), title, month, weekdays)
    }

    pub fn write_month<W: Write>(
        &self,
        mut out: W,
        title: &str,
        month: &CalendarMonth<EventItem>,
        weekdays: &[String],
    ) -> anyhow::Result<()> {
        writeln!(out, "{}", self.paint(title, "1"))?;

        let mut rows = Vec::with_capacity(month.weeks.len());
        for week in &month.weeks {
            let row: Vec<String> = week
                .iter()
                .map(|day| {
                    let mut cell = format!("{:>2}", day.date.day());
                    if !day.items.is_empty() {
                        cell.push_str(&format!("+{}", day.items.len()));
                    }
                    if day.is_today {
                        self.paint(&cell, "7")
                    } else if !day.is_current_month {
                        self.paint(&cell, "2")
                    } else {
                        cell
                    }
                })
                .collect();
            rows.push(row);
        }

        write_table(&mut out, weekdays.to_vec(), rows)?;
        Ok(())
    }

    #[tracing::instrument(skip(self, week))]
    pub fn print_week(&self, title: &str, week: &CalendarWeekView<EventItem>) -> anyhow::Result<()> {
        self.write_week(io::stdout().lock(), title, week)
    }

    pub fn write_week<W: Write>(
        &self,
        mut out: W,
        title: &str,
        week: &CalendarWeekView<EventItem>,
    ) -> anyhow::Result<()> {
        writeln!(out, "{}", self.paint(title, "1"))?;

        let headers = vec!["Day".to_string(), "Items".to_string()];
        let mut rows = Vec::with_capacity(week.days.len());
        for day in &week.days {
            let label = format_date(day.date, &self.locale, "%a %-d");
            let label = if day.is_today {
                self.paint(&label, "7")
            } else {
                label
            };
            let items = day
                .items
                .iter()
                .map(|item| self.item_label(item))
                .collect::<Vec<_>>()
                .join("; ");
            rows.push(vec![label, items]);
        }

        write_table(&mut out, headers, rows)?;
        Ok(())
    }

    #[tracing::instrument(skip(self, day))]
    pub fn print_day(&self, title: &str, day: &CalendarDayView<EventItem>) -> anyhow::Result<()> {
        self.write_day(io::stdout().lock(), title, day)
    }

    pub fn write_day<W: Write>(
        &self,
        mut out: W,
        title: &str,
        day: &CalendarDayView<EventItem>,
    ) -> anyhow::Result<()> {
        writeln!(out, "{}", self.paint(title, "1"))?;

        let untimed = day
            .items
            .iter()
            .filter(|item| item.start.is_none())
            .map(|item| item.title.clone())
            .collect::<Vec<_>>();
        if !untimed.is_empty() {
            writeln!(out, "all day   {}", untimed.join("; "))?;
        }

        let headers = vec!["Time".to_string(), "Items".to_string()];
        let rows: Vec<Vec<String>> = day
            .time_slots
            .iter()
            .map(|slot| self.slot_row(slot))
            .collect();
        write_table(&mut out, headers, rows)?;
        Ok(())
    }

    pub fn print_weekdays(&self, labels: &[String]) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();
        writeln!(out, "{}", labels.join(" "))?;
        Ok(())
    }

    pub fn print_range(&self, range: &DateRange) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();
        writeln!(out, "start     {}", range.start.to_rfc3339())?;
        writeln!(out, "end       {}", range.end.to_rfc3339())?;
        Ok(())
    }

    fn slot_row(&self, slot: &TimeSlot<EventItem>) -> Vec<String> {
        let time = format_time(slot.time, &self.locale, TimeFormat::Hour24);
        let time = if slot.items.is_empty() {
            self.paint(&time, "2")
        } else {
            self.paint(&time, "33")
        };
        let items = slot
            .items
            .iter()
            .map(|item| item.title.clone())
            .collect::<Vec<_>>()
            .join("; ");
        vec![time, items]
    }

    fn item_label(&self, item: &EventItem) -> String {
        match item.start {
            Some(start) => format!(
                "{} {}",
                format_time(start.time(), &self.locale, TimeFormat::Hour24),
                item.title
            ),
            None => item.title.clone(),
        }
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color || !io::stdout().is_terminal() {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }
}

fn write_table<W: Write>(
    mut writer: W,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
) -> anyhow::Result<()> {
    let column_count = headers.len();
    let mut widths = vec![0usize; column_count];

    for (idx, header) in headers.iter().enumerate() {
        widths[idx] = widths[idx].max(UnicodeWidthStr::width(header.as_str()));
    }

    for row in &rows {
        for (idx, cell) in row.iter().enumerate().take(column_count) {
            widths[idx] = widths[idx].max(UnicodeWidthStr::width(strip_ansi(cell).as_str()));
        }
    }

    for (idx, header) in headers.iter().enumerate() {
        write!(writer, "{:width$} ", header, width = widths[idx])?;
    }
    writeln!(writer)?;

    for width in &widths {
        write!(writer, "{:-<width$} ", "", width = *width)?;
    }
    writeln!(writer)?;

    for row in rows {
        for (idx, cell) in row.iter().enumerate().take(column_count) {
            let visible_width = UnicodeWidthStr::width(strip_ansi(cell).as_str());
            let padding = widths[idx].saturating_sub(visible_width);
            write!(writer, "{}{} ", cell, " ".repeat(padding))?;
        }
        writeln!(writer)?;
    }

    Ok(())
}

fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut escaped = false;

    for ch in s.chars() {
        if escaped {
            if ch == 'm' {
                escaped = false;
            }
            continue;
        }

        if ch == '\x1b' {
            escaped = true;
            continue;
        }

        out.push(ch);
    }

    out
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::{Renderer, strip_ansi, write_table};
    use crate::config::Config;
    use crate::grid::{MonthGridOptions, build_month};
    use crate::items::{EventAccessor, EventItem};

    fn plain_renderer() -> Renderer {
        let mut cfg = Config::default();
        cfg.apply_overrides(vec![("rc.color".to_string(), "off".to_string())]);
        Renderer::new(&cfg).expect("renderer")
    }

    #[test]
    fn strip_ansi_removes_escapes() {
        assert_eq!(strip_ansi("\x1b[7m15\x1b[0m"), "15");
    }

    #[test]
    fn table_pads_wide_characters() {
        let mut buf = Vec::new();
        write_table(
            &mut buf,
            vec!["Day".to_string(), "Items".to_string()],
            vec![vec!["月".to_string(), "x".to_string()]],
        )
        .expect("table");
        let text = String::from_utf8(buf).expect("utf8");
        let lines = text.lines().collect::<Vec<_>>();
        assert_eq!(lines[0], "Day Items ");
        assert_eq!(lines[2], "月  x     ");
    }

    #[test]
    fn rejects_unknown_color_setting() {
        let mut cfg = Config::default();
        cfg.apply_overrides(vec![("color".to_string(), "sometimes".to_string())]);
        assert!(Renderer::new(&cfg).is_err());
    }

    #[test]
    fn month_grid_shows_item_counts() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 15).expect("valid date");
        let items = vec![
            EventItem {
                title: "a".to_string(),
                date,
                start: None,
                end: None,
            },
            EventItem {
                title: "b".to_string(),
                date,
                start: None,
                end: None,
            },
        ];
        let month = build_month(
            2024,
            1,
            &MonthGridOptions::<EventItem> {
                data: &items,
                accessor: &EventAccessor,
                week_starts_on: 1,
                today: None,
            },
        )
        .expect("month");
        let weekdays = ["Mo", "Tu", "We", "Th", "Fr", "Sa", "Su"]
            .iter()
            .map(|s| s.to_string())
            .collect::<Vec<_>>();

        let mut buf = Vec::new();
        plain_renderer()
            .write_month(&mut buf, "January 2024", &month, &weekdays)
            .expect("render");
        let text = String::from_utf8(buf).expect("utf8");
        assert!(text.starts_with("January 2024\n"));
        assert!(text.contains("15+2"));
        // Title, header, rule and five week rows.
        assert_eq!(text.lines().count(), 3 + 5);
    }
}
