use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{MovieId, TrendingEntry};

/// Trending time window understood by the metadata API
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TimeWindow {
    #[default]
    Day,
    Week,
}

impl TimeWindow {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeWindow::Day => "day",
            TimeWindow::Week => "week",
        }
    }

    /// Parses a query parameter, falling back to `Day` for anything unknown
    pub fn from_param(param: Option<&str>) -> Self {
        match param.map(str::trim) {
            Some(p) if p.eq_ignore_ascii_case("week") => TimeWindow::Week,
            _ => TimeWindow::Day,
        }
    }
}

impl std::fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The full trending list as of one poll cycle
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    entries: Vec<TrendingEntry>,
}

impl Snapshot {
    pub fn new(entries: Vec<TrendingEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[TrendingEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Membership set used for diffing
    pub fn ids(&self) -> HashSet<MovieId> {
        self.entries.iter().map(|e| e.id).collect()
    }

    /// First `n` entries in snapshot order
    pub fn head(&self, n: usize) -> Vec<TrendingEntry> {
        self.entries.iter().take(n).cloned().collect()
    }
}

/// Entries newly present in the current snapshot
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Delta {
    entries: Vec<TrendingEntry>,
}

impl Delta {
    pub fn new(entries: Vec<TrendingEntry>) -> Self {
        Self { entries }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[TrendingEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn ids(&self) -> Vec<MovieId> {
        self.entries.iter().map(|e| e.id).collect()
    }

    pub fn into_entries(self) -> Vec<TrendingEntry> {
        self.entries
    }
}

/// The single outbound message shape sent to viewers
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrendingPayload {
    pub movies: Vec<TrendingEntry>,
    #[serde(with = "iso8601_millis")]
    pub timestamp: DateTime<Utc>,
}

impl TrendingPayload {
    pub fn new(movies: Vec<TrendingEntry>, timestamp: DateTime<Utc>) -> Self {
        Self { movies, timestamp }
    }

    pub fn now(movies: Vec<TrendingEntry>) -> Self {
        Self::new(movies, Utc::now())
    }
}

/// `2024-05-01T12:00:00.000Z`, the format browsers produce for dates
mod iso8601_millis {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|ts| ts.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}
