//! Presentation preferences kept only in local storage.

use serde::{Deserialize, Serialize};

/// Color theme.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "light" => Some(Theme::Light),
            "dark" => Some(Theme::Dark),
            _ => None,
        }
    }
}

/// One of the progress bars on the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bar {
    Year,
    Month,
    Week,
    Day,
    Custom,
}

/// Reference to a milestone by its visible identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MilestoneRef {
    pub date: String,
    pub label: String,
}

/// Last milestone the user selected on each bar.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedMilestones {
    #[serde(default)]
    pub year: Option<MilestoneRef>,
    #[serde(default)]
    pub month: Option<MilestoneRef>,
    #[serde(default)]
    pub week: Option<MilestoneRef>,
    #[serde(default)]
    pub day: Option<MilestoneRef>,
    #[serde(default)]
    pub custom: Option<MilestoneRef>,
}

impl SelectedMilestones {
    pub fn get(&self, bar: Bar) -> Option<&MilestoneRef> {
        self.slot(bar).as_ref()
    }

    pub fn set(&mut self, bar: Bar, selection: Option<MilestoneRef>) {
        *self.slot_mut(bar) = selection;
    }

    fn slot(&self, bar: Bar) -> &Option<MilestoneRef> {
        match bar {
            Bar::Year => &self.year,
            Bar::Month => &self.month,
            Bar::Week => &self.week,
            Bar::Day => &self.day,
            Bar::Custom => &self.custom,
        }
    }

    fn slot_mut(&mut self, bar: Bar) -> &mut Option<MilestoneRef> {
        match bar {
            Bar::Year => &mut self.year,
            Bar::Month => &mut self.month,
            Bar::Week => &mut self.week,
            Bar::Day => &mut self.day,
            Bar::Custom => &mut self.custom,
        }
    }
}
