// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Milestone synchronizer.
//!
//! `MilestoneSync` owns the session context and the in-memory collection.
//! Local storage is authoritative while logged out and the gist while logged
//! in. Every operation holds the session lock, so a logout issued during a
//! sync waits for the sync to finish.

use chrono::NaiveDate;
use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{broadcast, watch, Mutex};

use crate::config::ClientConfig;
use crate::error::SyncError;
use crate::models::milestone::{fresh_id, sort_for_display};
use crate::models::{
    AuthSession, CustomRange, Customization, GitHubUser, Milestone, MilestoneKey,
    MilestoneUpdate, NewMilestone, RangePreset, Settings,
};
use crate::services::auth::AuthService;
use crate::services::gist::{GistStore, HandleCache};
use crate::services::local::LocalStore;
use crate::services::progress::validate_date_range;
use crate::storage::{JsonFileStore, KeyValueStore};

const EVENT_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    LoggedOut,
    SyncingAfterLogin,
    LoggedIn,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Error,
}

/// Transient user-facing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

/// Change notifications for the presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncEvent {
    /// The current collection, in display order.
    MilestonesChanged(Vec<Milestone>),
    SettingsChanged(Settings),
    SessionChanged(SessionState),
    /// Brackets every remote operation.
    Busy(bool),
    Notice(Notice),
}

/// Result of folding local milestones into the remote collection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergeOutcome {
    pub milestones: Vec<Milestone>,
    /// Local milestones added to the remote collection
    pub appended: usize,
    /// Local milestones dropped as duplicates
    pub duplicates: usize,
}

/// Merge `local` into `remote`.
///
/// Remote entries are kept as they are. A local entry is a duplicate when its
/// `(date-time, label)` matches one already in the result; otherwise it is
/// appended, with a fresh id if its id is already taken.
pub fn merge_milestones(remote: Vec<Milestone>, local: Vec<Milestone>) -> MergeOutcome {
    let mut keys: HashSet<MilestoneKey> = remote.iter().map(Milestone::key).collect();
    let mut ids: HashSet<String> = remote.iter().map(|m| m.id.clone()).collect();

    let mut outcome = MergeOutcome {
        milestones: remote,
        ..Default::default()
    };

    for mut milestone in local {
        if !keys.insert(milestone.key()) {
            tracing::debug!(id = %milestone.id, "Dropping duplicate local milestone");
            outcome.duplicates += 1;
            continue;
        }
        if milestone.id.is_empty() || ids.contains(&milestone.id) {
            milestone.id = fresh_id();
        }
        ids.insert(milestone.id.clone());
        outcome.milestones.push(milestone);
        outcome.appended += 1;
    }

    outcome
}

/// What a login sync did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Local milestones uploaded to the gist
    pub uploaded: usize,
    /// Local milestones already present remotely
    pub duplicates: usize,
    /// Size of the collection after the sync
    pub total: usize,
    /// Whether a local custom range was moved to the gist
    pub settings_migrated: bool,
}

struct Session {
    auth: Option<AuthSession>,
    state: SessionState,
    milestones: Vec<Milestone>,
    settings: Settings,
}

pub struct MilestoneSync {
    local: LocalStore,
    remote: GistStore,
    auth: AuthService,
    session: Mutex<Session>,
    events: broadcast::Sender<SyncEvent>,
    range: watch::Sender<Option<CustomRange>>,
}

impl MilestoneSync {
    /// Assemble a synchronizer and restore any persisted session.
    ///
    /// While logged out the collection is loaded from local storage straight
    /// away; a restored session loads nothing until `get_milestones`.
    pub fn new(local: LocalStore, remote: GistStore, auth: AuthService) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        let session = match auth.restore() {
            Some(restored) => Session {
                auth: Some(restored),
                state: SessionState::LoggedIn,
                milestones: Vec::new(),
                settings: Settings::default(),
            },
            None => Session {
                auth: None,
                state: SessionState::LoggedOut,
                milestones: local.load_milestones(),
                settings: local.load_settings().unwrap_or_default(),
            },
        };

        let (range, _) = watch::channel(session.settings.custom_range.clone());

        Self {
            local,
            remote,
            auth,
            session: Mutex::new(session),
            events,
            range,
        }
    }

    pub fn from_config(config: &ClientConfig, kv: Arc<dyn KeyValueStore>) -> Self {
        let handles: HandleCache = Arc::new(dashmap::DashMap::new());
        let remote = GistStore::from_config(config, handles);
        let auth = AuthService::new(config, kv.clone(), remote.clone());
        Self::new(LocalStore::new(kv), remote, auth)
    }

    /// Synchronizer whose local mirror is the state file at `config.state_path`.
    pub fn open(config: &ClientConfig) -> Result<Self, SyncError> {
        let kv = Arc::new(JsonFileStore::open(&config.state_path)?);
        Ok(Self::from_config(config, kv))
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SyncEvent> {
        self.events.subscribe()
    }

    /// Current custom range, updated whenever settings change. Feed this to
    /// `spawn_progress_ticker` to keep the custom bar current.
    pub fn watch_custom_range(&self) -> watch::Receiver<Option<CustomRange>> {
        self.range.subscribe()
    }

    pub fn local(&self) -> &LocalStore {
        &self.local
    }

    pub fn auth(&self) -> &AuthService {
        &self.auth
    }

    pub async fn session_state(&self) -> SessionState {
        self.session.lock().await.state
    }

    pub async fn current_user(&self) -> Option<GitHubUser> {
        let session = self.session.lock().await;
        session.auth.as_ref().map(|a| a.user.clone())
    }

    /// Last successfully loaded collection, in display order.
    pub async fn snapshot(&self) -> Vec<Milestone> {
        display_order(&self.session.lock().await.milestones)
    }

    pub async fn custom_range(&self) -> Option<CustomRange> {
        self.session.lock().await.settings.custom_range.clone()
    }

    // ─── Milestones ──────────────────────────────────────────────

    /// Read the collection from the active store.
    pub async fn get_milestones(&self) -> Result<Vec<Milestone>, SyncError> {
        let mut session = self.session.lock().await;
        let milestones = self.read_active(&session).await?;
        session.milestones = milestones;
        self.publish_milestones(&session.milestones);
        Ok(display_order(&session.milestones))
    }

    pub async fn add_milestone(&self, input: NewMilestone) -> Result<Milestone, SyncError> {
        let mut milestone = Milestone::create(input)?;

        let added = self
            .mutate(move |milestones| {
                while milestones.iter().any(|m| m.id == milestone.id) {
                    milestone.id = fresh_id();
                }
                milestones.push(milestone.clone());
                Some(milestone)
            })
            .await?;

        match added {
            Some(milestone) => {
                tracing::info!(id = %milestone.id, "Milestone added");
                Ok(milestone)
            }
            None => Err(SyncError::Storage("Milestone was not added".to_string())),
        }
    }

    /// Shallow-merge `update` into the milestone with `id`.
    ///
    /// Returns `Ok(None)` without writing anything if no milestone has that id.
    pub async fn edit_milestone(
        &self,
        id: &str,
        update: MilestoneUpdate,
    ) -> Result<Option<Milestone>, SyncError> {
        update.validate()?;

        let edited = self
            .mutate(|milestones| {
                let milestone = milestones.iter_mut().find(|m| m.id == id)?;
                milestone.apply(update);
                Some(milestone.clone())
            })
            .await?;

        if edited.is_none() {
            tracing::debug!(id, "Edit of unknown milestone ignored");
        }
        Ok(edited)
    }

    /// Remove the milestone with `id`. Unknown ids are a no-op returning `false`.
    pub async fn delete_milestone(&self, id: &str) -> Result<bool, SyncError> {
        let removed = self
            .mutate(|milestones| {
                let index = milestones.iter().position(|m| m.id == id)?;
                Some(milestones.remove(index))
            })
            .await?;

        match removed {
            Some(_) => {
                tracing::info!(id, "Milestone deleted");
                Ok(true)
            }
            None => {
                tracing::debug!(id, "Delete of unknown milestone ignored");
                Ok(false)
            }
        }
    }

    pub async fn set_customization(
        &self,
        id: &str,
        customization: Customization,
    ) -> Result<Option<Milestone>, SyncError> {
        self.edit_milestone(
            id,
            MilestoneUpdate {
                customization: Some(customization),
                ..Default::default()
            },
        )
        .await
    }

    /// Read the full collection, apply `change` and write it back.
    ///
    /// `change` returns `None` when it left the collection alone, in which
    /// case nothing is written.
    async fn mutate<T>(
        &self,
        change: impl FnOnce(&mut Vec<Milestone>) -> Option<T>,
    ) -> Result<Option<T>, SyncError> {
        let mut session = self.session.lock().await;
        let mut milestones = self.read_active(&session).await?;

        let Some(result) = change(&mut milestones) else {
            session.milestones = milestones;
            return Ok(None);
        };

        let written = self.write_active(&session, &milestones).await;
        session.milestones = milestones;
        self.publish_milestones(&session.milestones);
        written.map(|()| Some(result))
    }

    async fn read_active(&self, session: &Session) -> Result<Vec<Milestone>, SyncError> {
        let Some(auth) = &session.auth else {
            return Ok(self.local.load_milestones());
        };

        self.remote_op(self.remote.load_milestones(&auth.token))
            .await
            .inspect_err(|e| self.fail(format!("Failed to load milestones: {}", e)))
    }

    /// Write to the active store. A failed remote write is kept in the local
    /// mirror and picked up again by the next login sync.
    async fn write_active(&self, session: &Session, milestones: &[Milestone]) -> Result<(), SyncError> {
        let Some(auth) = &session.auth else {
            self.local.save_milestones(milestones);
            return Ok(());
        };

        let result = self
            .remote_op(self.remote.save_milestones(&auth.token, milestones))
            .await;
        if let Err(e) = &result {
            tracing::warn!(error = %e, "Keeping milestones in local storage after failed remote write");
            self.local.save_milestones(milestones);
            self.fail(format!("Failed to save milestones: {}", e));
        }
        result
    }

    // ─── Login and logout ────────────────────────────────────────

    /// Complete an OAuth login and fold local data into the gist.
    ///
    /// An exchange failure leaves the session logged out. A sync failure
    /// leaves it logged in with the last good collection.
    pub async fn login(&self, code: &str, state: &str) -> Result<SyncReport, SyncError> {
        let mut session = self.session.lock().await;

        let auth = match self.remote_op(self.auth.complete_login(code, state)).await {
            Ok(auth) => auth,
            Err(e) => {
                tracing::error!(error = %e, "Login failed");
                self.fail(format!("Login failed: {}", e));
                return Err(e);
            }
        };

        let login = auth.user.login.clone();
        session.auth = Some(auth);
        self.set_state(&mut session, SessionState::SyncingAfterLogin);

        let result = self.sync_locked(&mut session).await;
        self.set_state(&mut session, SessionState::LoggedIn);

        match result {
            Ok(report) => {
                self.notice(NoticeLevel::Success, format!("Logged in as {}", login));
                Ok(report)
            }
            Err(e) => {
                tracing::error!(error = %e, "Sync after login failed");
                self.fail(format!("Failed to sync milestones: {}", e));
                Err(e)
            }
        }
    }

    /// Fold local milestones and settings into the gist for the current user.
    pub async fn sync_on_login(&self) -> Result<SyncReport, SyncError> {
        let mut session = self.session.lock().await;
        self.sync_locked(&mut session).await
    }

    async fn sync_locked(&self, session: &mut Session) -> Result<SyncReport, SyncError> {
        let token = session
            .auth
            .as_ref()
            .map(|a| a.token.clone())
            .ok_or(SyncError::NotAuthenticated)?;

        let local = self.local.load_milestones();
        let remote = self.remote_op(self.remote.load_milestones(&token)).await?;

        let mut report = SyncReport::default();
        let milestones = if local.is_empty() {
            remote
        } else {
            let outcome = merge_milestones(remote, local);
            self.remote_op(self.remote.save_milestones(&token, &outcome.milestones))
                .await?;
            self.local.clear_milestones();

            tracing::info!(
                uploaded = outcome.appended,
                duplicates = outcome.duplicates,
                "Synced local milestones to gist"
            );
            report.uploaded = outcome.appended;
            report.duplicates = outcome.duplicates;
            outcome.milestones
        };

        report.total = milestones.len();
        session.milestones = milestones;
        self.publish_milestones(&session.milestones);

        report.settings_migrated = self.sync_settings_locked(session, &token).await?;
        Ok(report)
    }

    /// Move a local custom range to the gist, or adopt the remote settings.
    async fn sync_settings_locked(&self, session: &mut Session, token: &str) -> Result<bool, SyncError> {
        let local_range = self.local.load_settings().and_then(|s| s.custom_range);

        let (settings, migrated) = match local_range {
            Some(range) => {
                let settings = Settings::stamped(Some(range));
                self.remote_op(self.remote.save_settings(token, &settings))
                    .await?;
                self.local.clear_settings();
                tracing::info!("Migrated local custom range to gist");
                (settings, true)
            }
            None => {
                let remote = self.remote_op(self.remote.load_settings(token)).await?;
                (remote.unwrap_or_default(), false)
            }
        };

        session.settings = settings;
        self.settings_changed(&session.settings);
        Ok(migrated)
    }

    /// Log out once any in-flight operation has finished, then reload from
    /// local storage.
    pub async fn logout(&self) {
        let mut session = self.session.lock().await;
        self.auth.logout();
        session.auth = None;
        self.set_state(&mut session, SessionState::LoggedOut);
        self.reload_local(&mut session);
        self.notice(NoticeLevel::Info, "Logged out successfully".to_string());
    }

    /// Replace the in-memory collection with the local one. Local storage is
    /// not modified.
    pub async fn sync_on_logout(&self) {
        let mut session = self.session.lock().await;
        self.reload_local(&mut session);
    }

    fn reload_local(&self, session: &mut Session) {
        session.milestones = self.local.load_milestones();
        session.settings = self.local.load_settings().unwrap_or_default();
        self.publish_milestones(&session.milestones);
        self.settings_changed(&session.settings);
    }

    // ─── Settings ────────────────────────────────────────────────

    pub async fn get_settings(&self) -> Result<Settings, SyncError> {
        let mut session = self.session.lock().await;
        let settings = match &session.auth {
            Some(auth) => self
                .remote_op(self.remote.load_settings(&auth.token))
                .await
                .inspect_err(|e| self.fail(format!("Failed to load settings: {}", e)))?
                .unwrap_or_default(),
            None => self.local.load_settings().unwrap_or_default(),
        };
        session.settings = settings.clone();
        self.range.send_replace(settings.custom_range.clone());
        Ok(settings)
    }

    /// Store a custom range given as `YYYY-MM-DD` dates.
    pub async fn set_custom_range(&self, start: &str, end: &str) -> Result<CustomRange, SyncError> {
        validate_date_range(start, end)?;
        let range = CustomRange {
            start_date: start.trim().to_string(),
            end_date: end.trim().to_string(),
            preset: None,
        };
        self.write_settings(Settings::stamped(Some(range.clone())))
            .await?;
        Ok(range)
    }

    /// Store the range `preset` stands for on `today`.
    pub async fn apply_preset(
        &self,
        preset: RangePreset,
        today: NaiveDate,
    ) -> Result<CustomRange, SyncError> {
        let range = preset.to_custom_range(today);
        validate_date_range(&range.start_date, &range.end_date)?;
        self.write_settings(Settings::stamped(Some(range.clone())))
            .await?;
        Ok(range)
    }

    pub async fn clear_custom_range(&self) -> Result<(), SyncError> {
        self.write_settings(Settings::stamped(None)).await
    }

    async fn write_settings(&self, settings: Settings) -> Result<(), SyncError> {
        let mut session = self.session.lock().await;

        let result = match &session.auth {
            Some(auth) => self
                .remote_op(self.remote.save_settings(&auth.token, &settings))
                .await,
            None => {
                self.local.save_settings(&settings);
                Ok(())
            }
        };

        if let Err(e) = &result {
            tracing::warn!(error = %e, "Keeping settings in local storage after failed remote write");
            self.local.save_settings(&settings);
            self.fail(format!("Failed to save settings: {}", e));
        }

        session.settings = settings;
        self.settings_changed(&session.settings);
        result
    }

    // ─── Notifications ───────────────────────────────────────────

    async fn remote_op<T>(
        &self,
        op: impl Future<Output = Result<T, SyncError>>,
    ) -> Result<T, SyncError> {
        self.emit(SyncEvent::Busy(true));
        let result = op.await;
        self.emit(SyncEvent::Busy(false));
        result
    }

    fn set_state(&self, session: &mut Session, state: SessionState) {
        session.state = state;
        self.emit(SyncEvent::SessionChanged(state));
    }

    fn publish_milestones(&self, milestones: &[Milestone]) {
        self.emit(SyncEvent::MilestonesChanged(display_order(milestones)));
    }

    fn fail(&self, message: String) {
        self.notice(NoticeLevel::Error, message);
    }

    fn notice(&self, level: NoticeLevel, message: String) {
        self.emit(SyncEvent::Notice(Notice { level, message }));
    }

    fn settings_changed(&self, settings: &Settings) {
        self.range.send_replace(settings.custom_range.clone());
        self.emit(SyncEvent::SettingsChanged(settings.clone()));
    }

    fn emit(&self, event: SyncEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }
}

fn display_order(milestones: &[Milestone]) -> Vec<Milestone> {
    let mut sorted = milestones.to_vec();
    sort_for_display(&mut sorted);
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;

    fn milestone(id: &str, date: &str, label: &str) -> Milestone {
        Milestone {
            id: id.to_string(),
            label: label.to_string(),
            date: date.to_string(),
            time: None,
            customization: Customization::default(),
        }
    }

    #[test]
    fn test_merge_appends_new_and_drops_duplicates() {
        let remote = vec![milestone("r1", "2025-01-01", "New Year")];
        let local = vec![
            milestone("l1", "2025-01-01", "New Year"),
            milestone("l2", "2025-12-25", "Xmas"),
        ];

        let outcome = merge_milestones(remote, local);
        assert_eq!(outcome.appended, 1);
        assert_eq!(outcome.duplicates, 1);
        assert_eq!(outcome.milestones.len(), 2);
        assert_eq!(outcome.milestones[0].id, "r1");
        assert_eq!(outcome.milestones[1].label, "Xmas");
    }

    #[test]
    fn test_merge_with_itself_keeps_size() {
        let set = vec![
            milestone("a", "2025-03-01", "Spring"),
            milestone("b", "2025-06-21", "Summer"),
        ];
        let outcome = merge_milestones(set.clone(), set.clone());
        assert_eq!(outcome.milestones, set);
        assert_eq!(outcome.duplicates, 2);
    }

    #[test]
    fn test_merge_midnight_matches_missing_time() {
        let remote = vec![milestone("r1", "2025-07-04", "Fourth")];
        let mut local = milestone("l1", "2025-07-04", "Fourth");
        local.time = Some("00:00".to_string());

        let outcome = merge_milestones(remote, vec![local]);
        assert_eq!(outcome.milestones.len(), 1);
    }

    #[test]
    fn test_merge_same_label_different_time_is_kept() {
        let remote = vec![milestone("r1", "2025-07-04", "Launch")];
        let mut local = milestone("l1", "2025-07-04", "Launch");
        local.time = Some("09:30".to_string());

        let outcome = merge_milestones(remote, vec![local]);
        assert_eq!(outcome.milestones.len(), 2);
    }

    #[test]
    fn test_merge_reassigns_colliding_id() {
        let remote = vec![milestone("same", "2025-01-01", "One")];
        let local = vec![milestone("same", "2025-02-01", "Two")];

        let outcome = merge_milestones(remote, local);
        assert_eq!(outcome.milestones.len(), 2);
        assert_ne!(outcome.milestones[1].id, "same");
    }

    #[test]
    fn test_merge_dedupes_within_local() {
        let local = vec![
            milestone("a", "2025-05-05", "Dup"),
            milestone("b", "2025-05-05", "Dup"),
        ];
        let outcome = merge_milestones(Vec::new(), local);
        assert_eq!(outcome.milestones.len(), 1);
        assert_eq!(outcome.duplicates, 1);
    }
}
