// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Custom date range settings.

use chrono::{Datelike, Duration, NaiveDate, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Persisted settings document, stored locally and as a second gist file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default)]
    pub custom_range: Option<CustomRange>,
    /// When the settings were last written (RFC3339)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
}

impl Settings {
    /// Settings holding `custom_range`, stamped with the current time.
    pub fn stamped(custom_range: Option<CustomRange>) -> Self {
        Self {
            custom_range,
            last_updated: Some(Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)),
        }
    }
}

/// A user-chosen date range shown as the "custom" progress bar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomRange {
    /// `YYYY-MM-DD`
    pub start_date: String,
    /// `YYYY-MM-DD`
    pub end_date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preset: Option<RangePreset>,
}

/// Canned custom ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RangePreset {
    ThisQuarter,
    ThisSemester,
    Last30Days,
    Next30Days,
    ThisYearRemaining,
}

impl RangePreset {
    pub const ALL: [RangePreset; 5] = [
        RangePreset::ThisQuarter,
        RangePreset::ThisSemester,
        RangePreset::Last30Days,
        RangePreset::Next30Days,
        RangePreset::ThisYearRemaining,
    ];

    pub fn label(self) -> &'static str {
        match self {
            RangePreset::ThisQuarter => "This Quarter",
            RangePreset::ThisSemester => "This Semester",
            RangePreset::Last30Days => "Last 30 Days",
            RangePreset::Next30Days => "Next 30 Days",
            RangePreset::ThisYearRemaining => "Year Remaining",
        }
    }

    /// Inclusive start and end dates of the preset relative to `today`.
    pub fn range(self, today: NaiveDate) -> (NaiveDate, NaiveDate) {
        let year = today.year();
        let month0 = today.month0();
        match self {
            RangePreset::ThisQuarter => {
                let first = month0 / 3 * 3 + 1;
                (first_of_month(year, first), last_of_month(year, first + 2))
            }
            RangePreset::ThisSemester => {
                let first = if month0 < 6 { 1 } else { 7 };
                (first_of_month(year, first), last_of_month(year, first + 5))
            }
            RangePreset::Last30Days => (today - Duration::days(30), today),
            RangePreset::Next30Days => (today, today + Duration::days(30)),
            RangePreset::ThisYearRemaining => (today, last_of_month(year, 12)),
        }
    }

    /// Build the custom range this preset stands for.
    pub fn to_custom_range(self, today: NaiveDate) -> CustomRange {
        let (start, end) = self.range(today);
        CustomRange {
            start_date: start.format("%Y-%m-%d").to_string(),
            end_date: end.format("%Y-%m-%d").to_string(),
            preset: Some(self),
        }
    }
}

fn first_of_month(year: i32, month: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(NaiveDate::MIN)
}

fn last_of_month(year: i32, month: u32) -> NaiveDate {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    first_of_month(next_year, next_month) - Duration::days(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_quarter_and_semester() {
        let today = d(2024, 8, 15);
        assert_eq!(
            RangePreset::ThisQuarter.range(today),
            (d(2024, 7, 1), d(2024, 9, 30))
        );
        assert_eq!(
            RangePreset::ThisSemester.range(today),
            (d(2024, 7, 1), d(2024, 12, 31))
        );
        assert_eq!(
            RangePreset::ThisQuarter.range(d(2024, 2, 29)),
            (d(2024, 1, 1), d(2024, 3, 31))
        );
    }

    #[test]
    fn test_relative_presets() {
        let today = d(2024, 12, 20);
        assert_eq!(
            RangePreset::Next30Days.range(today),
            (today, d(2025, 1, 19))
        );
        assert_eq!(
            RangePreset::Last30Days.range(today),
            (d(2024, 11, 20), today)
        );
        assert_eq!(
            RangePreset::ThisYearRemaining.range(today),
            (today, d(2024, 12, 31))
        );
    }

    #[test]
    fn test_settings_json_shape() {
        let settings = Settings {
            custom_range: Some(RangePreset::ThisQuarter.to_custom_range(d(2024, 5, 1))),
            last_updated: Some("2024-05-01T00:00:00Z".to_string()),
        };
        let json = serde_json::to_value(&settings).unwrap();
        assert_eq!(json["customRange"]["startDate"], "2024-04-01");
        assert_eq!(json["customRange"]["endDate"], "2024-06-30");
        assert_eq!(json["customRange"]["preset"], "this-quarter");
        assert_eq!(json["lastUpdated"], "2024-05-01T00:00:00Z");
    }
}
