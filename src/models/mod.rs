// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod gist;
pub mod milestone;
pub mod preferences;
pub mod quotes;
pub mod session;
pub mod settings;

pub use milestone::{Customization, Milestone, MilestoneKey, MilestoneUpdate, NewMilestone};
pub use preferences::{Bar, MilestoneRef, SelectedMilestones, Theme};
pub use quotes::quote_for_date;
pub use session::{AuthSession, GitHubUser};
pub use settings::{CustomRange, RangePreset, Settings};
