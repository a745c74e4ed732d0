// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Milestone model: a labeled point in time shown on the progress bars.

use crate::error::SyncError;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Marker color used when the user does not pick one.
pub const DEFAULT_COLOR: &str = "#00cec9";
/// Time of day assumed when a milestone has none.
pub const DEFAULT_TIME: &str = "00:00";

/// Display customization for a milestone marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customization {
    /// CSS color
    #[serde(default = "default_color")]
    pub color: String,
    /// Emoji icon
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

impl Default for Customization {
    fn default() -> Self {
        Self {
            color: default_color(),
            icon: None,
        }
    }
}

fn default_color() -> String {
    DEFAULT_COLOR.to_string()
}

/// A stored milestone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Milestone {
    /// Unique within a collection. Older data may lack one; see `parse_collection`.
    #[serde(default)]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub label: String,
    /// Calendar date, `YYYY-MM-DD`
    pub date: String,
    /// Time of day, `HH:MM`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub customization: Customization,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Identity used to spot the same milestone in two collections.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MilestoneKey {
    pub date_time: String,
    pub label: String,
}

/// Generate a fresh milestone id.
pub fn fresh_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// Parse a `YYYY-MM-DD` date.
pub fn parse_date(date: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d").ok()
}

/// Parse an `HH:MM` (or `HH:MM:SS`) time of day.
pub fn parse_time(time: &str) -> Option<NaiveTime> {
    let time = time.trim();
    NaiveTime::parse_from_str(time, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(time, "%H:%M:%S"))
        .ok()
}

impl Milestone {
    /// Create a milestone from validated input, assigning a fresh id.
    pub fn create(input: NewMilestone) -> Result<Self, SyncError> {
        input.validate()?;
        Ok(Self {
            id: fresh_id(),
            label: input.label.trim().to_string(),
            date: input.date.trim().to_string(),
            time: input.time.map(|t| t.trim().to_string()),
            customization: input.customization.unwrap_or_default(),
        })
    }

    pub fn naive_date(&self) -> Option<NaiveDate> {
        parse_date(&self.date)
    }

    /// Time of day, falling back to midnight when absent or malformed.
    pub fn naive_time(&self) -> NaiveTime {
        self.time
            .as_deref()
            .and_then(parse_time)
            .unwrap_or(NaiveTime::MIN)
    }

    /// Combined wall-clock date and time, `None` if the date is malformed.
    pub fn date_time(&self) -> Option<NaiveDateTime> {
        self.naive_date().map(|d| d.and_time(self.naive_time()))
    }

    pub fn key(&self) -> MilestoneKey {
        let date_time = match self.date_time() {
            Some(dt) => dt.format("%Y-%m-%dT%H:%M").to_string(),
            None => format!(
                "{}T{}",
                self.date,
                self.time.as_deref().unwrap_or(DEFAULT_TIME)
            ),
        };
        MilestoneKey {
            date_time,
            label: self.label.clone(),
        }
    }

    /// Shallow-merge the set fields of `update` into this milestone.
    pub fn apply(&mut self, update: MilestoneUpdate) {
        if let Some(label) = update.label {
            self.label = label.trim().to_string();
        }
        if let Some(date) = update.date {
            self.date = date.trim().to_string();
        }
        if let Some(time) = update.time {
            self.time = Some(time.trim().to_string());
        }
        if let Some(customization) = update.customization {
            self.customization = customization;
        }
    }
}

/// Sort a collection for display: ascending date-time, malformed dates last.
pub fn sort_for_display(milestones: &mut [Milestone]) {
    milestones.sort_by_key(|m| (m.date_time().is_none(), m.date_time()));
}

/// Input for creating a milestone.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewMilestone {
    #[serde(default)]
    pub label: String,
    pub date: String,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub customization: Option<Customization>,
}

impl NewMilestone {
    pub fn new(date: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            date: date.into(),
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<(), SyncError> {
        validate_date(&self.date)?;
        if let Some(time) = &self.time {
            validate_time(time)?;
        }
        Ok(())
    }
}

/// Partial update for an existing milestone; unset fields are left alone.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MilestoneUpdate {
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub customization: Option<Customization>,
}

impl MilestoneUpdate {
    pub fn validate(&self) -> Result<(), SyncError> {
        if let Some(date) = &self.date {
            validate_date(date)?;
        }
        if let Some(time) = &self.time {
            validate_time(time)?;
        }
        Ok(())
    }
}

fn validate_date(date: &str) -> Result<(), SyncError> {
    if date.trim().is_empty() {
        return Err(SyncError::Validation("Please select a date".to_string()));
    }
    parse_date(date)
        .map(|_| ())
        .ok_or_else(|| SyncError::Validation(format!("Invalid date: {}", date)))
}

fn validate_time(time: &str) -> Result<(), SyncError> {
    parse_time(time)
        .map(|_| ())
        .ok_or_else(|| SyncError::Validation(format!("Invalid time: {}", time)))
}

/// Result of reading a stored milestone collection.
#[derive(Debug, Default)]
pub struct ParsedCollection {
    pub milestones: Vec<Milestone>,
    /// Ids were assigned or de-duplicated; the collection should be written back.
    pub repaired: bool,
    /// Entries dropped because they were not valid milestones.
    pub dropped: usize,
}

/// Parse a stored JSON milestone array, validating each entry.
///
/// A top-level value that is not an array is a `Parse` error. Individual
/// entries that are not milestones or whose date does not parse are dropped.
/// Missing or repeated ids are replaced with fresh ones.
pub fn parse_collection(json: &str) -> Result<ParsedCollection, SyncError> {
    let values: Vec<Value> =
        serde_json::from_str(json).map_err(|e| SyncError::Parse(e.to_string()))?;

    let mut parsed = ParsedCollection::default();
    let mut seen_ids = std::collections::HashSet::new();

    for value in values {
        let mut milestone: Milestone = match serde_json::from_value(value) {
            Ok(m) => m,
            Err(e) => {
                tracing::warn!(error = %e, "Dropping malformed milestone entry");
                parsed.dropped += 1;
                continue;
            }
        };

        if milestone.naive_date().is_none() {
            tracing::warn!(date = %milestone.date, "Dropping milestone with invalid date");
            parsed.dropped += 1;
            continue;
        }

        if milestone.id.is_empty() || seen_ids.contains(&milestone.id) {
            milestone.id = fresh_id();
            parsed.repaired = true;
        }
        seen_ids.insert(milestone.id.clone());
        parsed.milestones.push(milestone);
    }

    Ok(parsed)
}
