use std::fs;
use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::Context;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::accessor::CalendarAccessor;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventItem {
    pub title: String,

    pub date: NaiveDate,

    #[serde(default, with = "local_datetime_serde::option")]
    pub start: Option<NaiveDateTime>,

    #[serde(default, with = "local_datetime_serde::option")]
    pub end: Option<NaiveDateTime>,
}

/// Reads `date`, `start` and `end` straight off an [`EventItem`].
#[derive(Debug, Clone, Copy, Default)]
pub struct EventAccessor;

impl CalendarAccessor<EventItem> for EventAccessor {
    fn date(&self, item: &EventItem) -> NaiveDate {
        item.date
    }

    fn start(&self, item: &EventItem) -> Option<NaiveDateTime> {
        item.start
    }

    fn end(&self, item: &EventItem) -> Option<NaiveDateTime> {
        item.end
    }
}

#[tracing::instrument(skip(path), fields(file = %path.display()))]
pub fn load_items(path: &Path) -> anyhow::Result<Vec<EventItem>> {
    let file = fs::File::open(path)
        .with_context(|| format!("failed to open items file {}", path.display()))?;
    let reader = BufReader::new(file);

    let mut out = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let item: EventItem = serde_json::from_str(trimmed)
            .with_context(|| format!("failed parsing {} line {}", path.display(), idx + 1))?;
        out.push(item);
    }

    debug!(count = out.len(), "loaded items from jsonl");
    Ok(out)
}

/// Local date-times written as `YYYY-MM-DDTHH:MM` with optional seconds.
pub mod local_datetime_serde {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M"];

    pub fn parse(raw: &str) -> Option<NaiveDateTime> {
        FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(raw.trim(), fmt).ok())
    }

    pub fn serialize<S>(dt: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&dt.format("%Y-%m-%dT%H:%M:%S").to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid local datetime: {raw}")))
    }

    pub mod option {
        use chrono::NaiveDateTime;
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S>(dt: &Option<NaiveDateTime>, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            match dt {
                Some(value) => super::serialize(value, serializer),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
        where
            D: Deserializer<'de>,
        {
            let opt = Option::<String>::deserialize(deserializer)?;
            match opt {
                Some(raw) => super::parse(&raw).map(Some).ok_or_else(|| {
                    serde::de::Error::custom(format!("invalid local datetime: {raw}"))
                }),
                None => Ok(None),
            }
        }
    }
}
