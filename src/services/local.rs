// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Local store adapter.
//!
//! Reads never fail: malformed or unreadable data is logged and treated as
//! absent. Writes log and swallow storage failures, matching how the
//! dashboard treats browser local storage.

use crate::models::milestone::parse_collection;
use crate::models::{Milestone, SelectedMilestones, Settings, Theme};
use crate::storage::{keys, KeyValueStore};
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;

#[derive(Clone)]
pub struct LocalStore {
    kv: Arc<dyn KeyValueStore>,
}

impl LocalStore {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    /// Underlying key/value store (shared with the auth adapter).
    pub fn kv(&self) -> &Arc<dyn KeyValueStore> {
        &self.kv
    }

    // ─── Milestones ──────────────────────────────────────────────

    /// Load the local milestone collection; empty on any failure.
    pub fn load_milestones(&self) -> Vec<Milestone> {
        let Some(raw) = self.read(keys::MILESTONES) else {
            return Vec::new();
        };

        match parse_collection(&raw) {
            Ok(parsed) => {
                if parsed.repaired || parsed.dropped > 0 {
                    tracing::info!(
                        dropped = parsed.dropped,
                        "Repaired local milestone collection"
                    );
                    self.save_milestones(&parsed.milestones);
                }
                parsed.milestones
            }
            Err(e) => {
                tracing::warn!(error = %e, "Discarding unreadable local milestones");
                Vec::new()
            }
        }
    }

    pub fn save_milestones(&self, milestones: &[Milestone]) {
        self.write_json(keys::MILESTONES, milestones);
    }

    /// Whether any valid local milestones exist.
    pub fn has_milestones(&self) -> bool {
        !self.load_milestones().is_empty()
    }

    pub fn clear_milestones(&self) {
        self.delete(keys::MILESTONES);
    }

    // ─── Settings ────────────────────────────────────────────────

    pub fn load_settings(&self) -> Option<Settings> {
        self.read_json(keys::SETTINGS)
    }

    pub fn save_settings(&self, settings: &Settings) {
        self.write_json(keys::SETTINGS, settings);
    }

    pub fn clear_settings(&self) {
        self.delete(keys::SETTINGS);
    }

    // ─── Preferences ─────────────────────────────────────────────

    pub fn load_theme(&self) -> Option<Theme> {
        self.read(keys::THEME).and_then(|raw| Theme::parse(&raw))
    }

    pub fn save_theme(&self, theme: Theme) {
        self.write(keys::THEME, theme.as_str());
    }

    pub fn load_selected(&self) -> SelectedMilestones {
        self.read_json(keys::SELECTED).unwrap_or_default()
    }

    pub fn save_selected(&self, selected: &SelectedMilestones) {
        self.write_json(keys::SELECTED, selected);
    }

    // ─── Helpers ─────────────────────────────────────────────────

    fn read(&self, key: &str) -> Option<String> {
        match self.kv.get(key) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(key, error = %e, "Local storage read failed");
                None
            }
        }
    }

    fn read_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = self.read(key)?;
        serde_json::from_str(&raw)
            .map_err(|e| tracing::warn!(key, error = %e, "Discarding unreadable local value"))
            .ok()
    }

    fn write(&self, key: &str, value: &str) {
        if let Err(e) = self.kv.set(key, value) {
            tracing::error!(key, error = %e, "Local storage write failed");
        }
    }

    fn write_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) {
        match serde_json::to_string(value) {
            Ok(raw) => self.write(key, &raw),
            Err(e) => tracing::error!(key, error = %e, "Failed to serialize local value"),
        }
    }

    fn delete(&self, key: &str) {
        if let Err(e) = self.kv.remove(key) {
            tracing::error!(key, error = %e, "Local storage delete failed");
        }
    }
}
