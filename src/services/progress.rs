// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Elapsed-time progress for year/month/week/day and custom ranges.
//!
//! Everything here is pure except `spawn_progress_ticker`, which republishes
//! a snapshot on a timer.

use chrono::{DateTime, Datelike, Duration, Local, NaiveDate, NaiveDateTime, Timelike, Utc};
use std::fmt;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::error::SyncError;
use crate::models::milestone::{parse_date, sort_for_display};
use crate::models::quotes::quote_for_date;
use crate::models::{Bar, CustomRange, Milestone};

const MS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Years a custom range may span.
const RANGE_YEARS: std::ops::RangeInclusive<i32> = 1000..=9999;

/// Percentage of `[start, end]` elapsed at `now`, in `[0, 100]`.
pub fn compute_progress(start: DateTime<Utc>, end: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    if now < start {
        return 0.0;
    }
    if now > end {
        return 100.0;
    }

    let total = (end - start).num_milliseconds();
    if total <= 0 {
        return 100.0;
    }
    let elapsed = (now - start).num_milliseconds();

    (elapsed as f64 / total as f64 * 100.0).clamp(0.0, 100.0)
}

/// Percentage together with whole-day counts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressText {
    pub percentage: f64,
    /// Whole days elapsed (floor), clamped to `[0, total_days]`
    pub elapsed_days: i64,
    /// Whole days in the range (ceil)
    pub total_days: i64,
    pub remaining_days: i64,
}

impl fmt::Display for ProgressText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.1}% complete ({}/{} days, {} remaining)",
            self.percentage, self.elapsed_days, self.total_days, self.remaining_days
        )
    }
}

pub fn format_progress_text(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    now: DateTime<Utc>,
) -> ProgressText {
    let percentage = compute_progress(start, end, now);

    let total_ms = (end - start).num_milliseconds();
    let total_days = (-(-total_ms).div_euclid(MS_PER_DAY)).max(0);
    let elapsed_days = (now - start)
        .num_milliseconds()
        .div_euclid(MS_PER_DAY)
        .clamp(0, total_days);

    ProgressText {
        percentage,
        elapsed_days,
        total_days,
        remaining_days: (total_days - elapsed_days).max(0),
    }
}

/// Day bar text, e.g. `41.7% complete (10h 0m elapsed)`.
pub fn format_day_text(now: NaiveDateTime) -> String {
    let (start, end) = Period::Day.bounds(now);
    let percentage = compute_progress(start.and_utc(), end.and_utc(), now.and_utc());
    format!(
        "{:.1}% complete ({}h {}m elapsed)",
        percentage,
        now.hour(),
        now.minute()
    )
}

/// Calendar periods with their own progress bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Period {
    Year,
    Month,
    /// Monday-based
    Week,
    Day,
}

impl Period {
    pub const ALL: [Period; 4] = [Period::Year, Period::Month, Period::Week, Period::Day];

    /// Half-open wall-clock interval `[start, end)` of the period containing `now`.
    pub fn bounds(self, now: NaiveDateTime) -> (NaiveDateTime, NaiveDateTime) {
        let today = now.date();
        let (start, end) = match self {
            Period::Year => (
                first_day(today.year(), 1),
                first_day(today.year() + 1, 1),
            ),
            Period::Month => {
                let start = first_day(today.year(), today.month());
                let end = if today.month() == 12 {
                    first_day(today.year() + 1, 1)
                } else {
                    first_day(today.year(), today.month() + 1)
                };
                (start, end)
            }
            Period::Week => {
                let monday =
                    today - Duration::days(today.weekday().num_days_from_monday() as i64);
                (monday, monday + Duration::days(7))
            }
            Period::Day => (today, today + Duration::days(1)),
        };
        (start.and_time(chrono::NaiveTime::MIN), end.and_time(chrono::NaiveTime::MIN))
    }

    pub fn contains(self, now: NaiveDateTime, t: NaiveDateTime) -> bool {
        let (start, end) = self.bounds(now);
        start <= t && t < end
    }

    pub fn bar(self) -> Bar {
        match self {
            Period::Year => Bar::Year,
            Period::Month => Bar::Month,
            Period::Week => Bar::Week,
            Period::Day => Bar::Day,
        }
    }
}

fn first_day(year: i32, month: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(NaiveDate::MAX)
}

/// Validate a custom range given as `YYYY-MM-DD` strings with four-digit years.
pub fn validate_date_range(start: &str, end: &str) -> Result<(NaiveDate, NaiveDate), SyncError> {
    let in_window = |d: &NaiveDate| RANGE_YEARS.contains(&d.year());
    let start_date = parse_date(start).filter(in_window);
    let end_date = parse_date(end).filter(in_window);

    let mut errors = Vec::new();
    if start_date.is_none() {
        errors.push("Start date is invalid");
    }
    if end_date.is_none() {
        errors.push("End date is invalid");
    }

    match (start_date, end_date) {
        (Some(s), Some(e)) if s < e => Ok((s, e)),
        (Some(_), Some(_)) => Err(SyncError::Validation(
            "End date must be after start date".to_string(),
        )),
        _ => Err(SyncError::Validation(errors.join(", "))),
    }
}

/// Human-friendly distance from `reference` to `target`.
pub fn relative_time(target: NaiveDate, reference: NaiveDate) -> String {
    match (target - reference).num_days() {
        0 => "Today".to_string(),
        1 => "Tomorrow".to_string(),
        -1 => "Yesterday".to_string(),
        n if n > 0 => format!("In {} days", n),
        n => format!("{} days ago", -n),
    }
}

/// Milestones falling within `period` around `now`, in display order.
pub fn milestones_for_period(
    milestones: &[Milestone],
    period: Period,
    now: NaiveDateTime,
) -> Vec<Milestone> {
    let mut matching: Vec<Milestone> = milestones
        .iter()
        .filter(|m| m.date_time().is_some_and(|t| period.contains(now, t)))
        .cloned()
        .collect();
    sort_for_display(&mut matching);
    matching
}

// ─────────────────────────────────────────────────────────────────────────────
// Snapshots and the periodic ticker
// ─────────────────────────────────────────────────────────────────────────────

/// One progress bar's computed state.
#[derive(Debug, Clone, PartialEq)]
pub struct BarProgress {
    pub bar: Bar,
    pub percentage: f64,
    pub text: String,
}

/// All bars computed at one instant.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressSnapshot {
    pub taken_at: NaiveDateTime,
    pub bars: Vec<BarProgress>,
    /// Quote of the day for `taken_at`
    pub quote: &'static str,
}

impl ProgressSnapshot {
    /// Compute every bar at `now`. Custom range end dates are inclusive.
    pub fn at(now: NaiveDateTime, custom_range: Option<&CustomRange>) -> Self {
        let mut bars: Vec<BarProgress> = Period::ALL
            .iter()
            .map(|&period| {
                let (start, end) = period.bounds(now);
                let (start, end, at) = (start.and_utc(), end.and_utc(), now.and_utc());
                let text = match period {
                    Period::Day => format_day_text(now),
                    _ => format_progress_text(start, end, at).to_string(),
                };
                BarProgress {
                    bar: period.bar(),
                    percentage: compute_progress(start, end, at),
                    text,
                }
            })
            .collect();

        bars.push(custom_bar(now, custom_range));
        Self {
            taken_at: now,
            bars,
            quote: quote_for_date(now.date()),
        }
    }

    pub fn get(&self, bar: Bar) -> Option<&BarProgress> {
        self.bars.iter().find(|b| b.bar == bar)
    }
}

fn custom_bar(now: NaiveDateTime, custom_range: Option<&CustomRange>) -> BarProgress {
    let empty = |text: String| BarProgress {
        bar: Bar::Custom,
        percentage: 0.0,
        text,
    };

    let Some(range) = custom_range else {
        return empty("Please select start and end dates".to_string());
    };

    match validate_date_range(&range.start_date, &range.end_date) {
        Ok((start, end)) => {
            let Some(end) = end.succ_opt() else {
                return empty("End date is invalid".to_string());
            };
            let start = start.and_time(chrono::NaiveTime::MIN).and_utc();
            let end = end.and_time(chrono::NaiveTime::MIN).and_utc();
            let at = now.and_utc();
            BarProgress {
                bar: Bar::Custom,
                percentage: compute_progress(start, end, at),
                text: format_progress_text(start, end, at).to_string(),
            }
        }
        Err(e) => empty(e.to_string()),
    }
}

/// Recompute a snapshot every `every` on its own task, and again whenever
/// `custom_range` changes.
///
/// The first snapshot is available immediately. The task stops once every
/// receiver has been dropped. If the range sender goes away the last range
/// keeps being used.
pub fn spawn_progress_ticker(
    every: std::time::Duration,
    mut custom_range: watch::Receiver<Option<CustomRange>>,
) -> (watch::Receiver<ProgressSnapshot>, JoinHandle<()>) {
    let initial = ProgressSnapshot::at(
        Local::now().naive_local(),
        custom_range.borrow_and_update().as_ref(),
    );
    let (tx, rx) = watch::channel(initial);

    let handle = tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        interval.tick().await;
        let mut follow_range = true;
        loop {
            tokio::select! {
                _ = interval.tick() => {}
                changed = custom_range.changed(), if follow_range => {
                    if changed.is_err() {
                        follow_range = false;
                        continue;
                    }
                    tracing::debug!("Custom range changed, recomputing progress");
                }
            }

            let range = custom_range.borrow_and_update().clone();
            let snapshot = ProgressSnapshot::at(Local::now().naive_local(), range.as_ref());
            if tx.send(snapshot).is_err() {
                tracing::debug!("Progress ticker has no subscribers, stopping");
                break;
            }
        }
    });

    (rx, handle)
}
