//! Session history.
//!
//! An append-only list of closed [`SessionRecord`]s. The session that is
//! still running lives in the engine's state until it closes; it is never
//! part of this list.
//!
//! Calendar queries take `now` in the caller's time zone and compare each
//! record's `start_time` against the day / ISO week / month containing it.

use chrono::{DateTime, Datelike, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::timer::SessionType;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionMetadata {
    /// Target minutes for the session's state when it closed.
    pub target_duration: u32,
    pub was_interrupted: bool,
}

/// Free-text note written during Reflection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReflectionSummary {
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ReflectionSummary {
    pub(crate) fn new(content: String, now: DateTime<Utc>) -> Self {
        Self {
            content,
            created_at: now,
            updated_at: now,
        }
    }

    /// Replace the text, keeping the original creation time.
    pub(crate) fn revise(&mut self, content: String, now: DateTime<Utc>) {
        self.content = content;
        self.updated_at = now;
    }
}

/// One closed session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: String,
    pub session_type: SessionType,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub duration_ms: u64,
    pub is_completed: bool,
    pub is_failed: bool,
    #[serde(default)]
    pub metadata: Option<SessionMetadata>,
    #[serde(default)]
    pub reflection_summary: Option<ReflectionSummary>,
}

impl SessionRecord {
    /// Structural checks applied to records read back from storage.
    ///
    /// # Errors
    /// Returns a description of the first violated rule.
    pub fn validate(&self) -> Result<(), String> {
        if self.id.is_empty() {
            return Err("record has an empty id".into());
        }
        if self.end_time < self.start_time {
            return Err(format!("record {} ends before it starts", self.id));
        }
        let span = (self.end_time - self.start_time).num_milliseconds();
        if u64::try_from(span).ok() != Some(self.duration_ms) {
            return Err(format!(
                "record {} duration {}ms does not match its {}ms span",
                self.id, self.duration_ms, span
            ));
        }
        if self.is_failed == self.is_completed {
            return Err(format!(
                "record {} must be exactly one of completed or failed",
                self.id
            ));
        }
        if self.is_failed && self.session_type != SessionType::Focus {
            return Err(format!("record {} is a failed non-focus session", self.id));
        }
        Ok(())
    }

    pub fn duration_min(&self) -> u64 {
        self.duration_ms / 60_000
    }
}

/// Calendar window for history queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum HistoryRange {
    Today,
    Week,
    Month,
    #[default]
    All,
}

impl std::str::FromStr for HistoryRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "today" => Ok(Self::Today),
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            "all" => Ok(Self::All),
            other => Err(format!("unknown range '{other}' (today|week|month|all)")),
        }
    }
}

impl HistoryRange {
    fn contains<Tz: TimeZone>(self, start: DateTime<Utc>, now: &DateTime<Tz>) -> bool {
        let day = start.with_timezone(&now.timezone()).date_naive();
        let today = now.date_naive();
        match self {
            HistoryRange::Today => day == today,
            HistoryRange::Week => day.iso_week() == today.iso_week(),
            HistoryRange::Month => day.year() == today.year() && day.month() == today.month(),
            HistoryRange::All => true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryStats {
    pub total_sessions: u64,
    pub completed_focus: u64,
    pub failed_focus: u64,
    pub focus_min: u64,
    pub reflection_min: u64,
    pub rest_min: u64,
}

impl HistoryStats {
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a SessionRecord>) -> Self {
        let mut stats = Self::default();
        for record in records {
            stats.total_sessions += 1;
            match record.session_type {
                SessionType::Focus => {
                    if record.is_failed {
                        stats.failed_focus += 1;
                    } else {
                        stats.completed_focus += 1;
                    }
                    stats.focus_min += record.duration_min();
                }
                SessionType::Reflection => stats.reflection_min += record.duration_min(),
                SessionType::Rest => stats.rest_min += record.duration_min(),
            }
        }
        stats
    }
}

/// Append-only record list. Insertion order is chronological.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionHistory {
    records: Vec<SessionRecord>,
}

impl SessionHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a closed record. Returns false, leaving history untouched,
    /// when a record with the same id is already present.
    pub fn record(&mut self, record: SessionRecord) -> bool {
        if self.records.iter().any(|r| r.id == record.id) {
            tracing::debug!(id = %record.id, "ignoring duplicate session record");
            return false;
        }
        self.records.push(record);
        true
    }

    pub fn all(&self) -> &[SessionRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn last(&self) -> Option<&SessionRecord> {
        self.records.last()
    }

    pub fn range<Tz: TimeZone>(
        &self,
        range: HistoryRange,
        now: &DateTime<Tz>,
    ) -> Vec<&SessionRecord> {
        self.records
            .iter()
            .filter(|r| range.contains(r.start_time, now))
            .collect()
    }

    pub fn today<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Vec<&SessionRecord> {
        self.range(HistoryRange::Today, now)
    }

    pub fn week<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Vec<&SessionRecord> {
        self.range(HistoryRange::Week, now)
    }

    pub fn month<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Vec<&SessionRecord> {
        self.range(HistoryRange::Month, now)
    }

    pub fn stats<Tz: TimeZone>(&self, range: HistoryRange, now: &DateTime<Tz>) -> HistoryStats {
        HistoryStats::from_records(self.range(range, now))
    }

    /// The only mutable access to a closed record: the most recent one, and
    /// only if it is a Reflection record.
    pub(crate) fn last_reflection_mut(&mut self) -> Option<&mut SessionRecord> {
        self.records
            .last_mut()
            .filter(|r| r.session_type == SessionType::Reflection)
    }

    /// Validate every record and the uniqueness of ids.
    ///
    /// # Errors
    /// Returns a description of the first problem found.
    pub fn validate(&self) -> Result<(), String> {
        let mut seen = HashSet::new();
        for record in &self.records {
            record.validate()?;
            if !seen.insert(record.id.as_str()) {
                return Err(format!("duplicate record id {}", record.id));
            }
        }
        Ok(())
    }
}
