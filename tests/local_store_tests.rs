// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Local store adapter tests over both key/value backends.

use std::sync::Arc;
use yearprogress::models::{
    Bar, CustomRange, Customization, Milestone, MilestoneRef, SelectedMilestones, Settings, Theme,
};
use yearprogress::services::LocalStore;
use yearprogress::storage::{keys, JsonFileStore, KeyValueStore, MemoryStore};

fn sample() -> Vec<Milestone> {
    vec![
        Milestone {
            id: "a".to_string(),
            label: "Launch".to_string(),
            date: "2025-03-14".to_string(),
            time: Some("09:26".to_string()),
            customization: Customization {
                color: "#6c5ce7".to_string(),
                icon: Some("🚀".to_string()),
            },
        },
        Milestone {
            id: "b".to_string(),
            label: "Xmas".to_string(),
            date: "2025-12-25".to_string(),
            time: None,
            customization: Customization::default(),
        },
    ]
}

fn temp_state_path() -> std::path::PathBuf {
    std::env::temp_dir()
        .join(format!("yearprogress-test-{}", uuid::Uuid::new_v4()))
        .join("state.json")
}

#[test]
fn test_milestones_round_trip() {
    let local = LocalStore::new(Arc::new(MemoryStore::new()));

    local.save_milestones(&sample());
    assert_eq!(local.load_milestones(), sample());
    assert!(local.has_milestones());

    local.clear_milestones();
    assert!(local.load_milestones().is_empty());
    assert!(!local.has_milestones());
}

#[test]
fn test_corrupt_milestones_read_as_empty() {
    let kv = Arc::new(MemoryStore::new());
    kv.set(keys::MILESTONES, "not json at all").unwrap();
    let local = LocalStore::new(kv);

    assert!(local.load_milestones().is_empty());
}

#[test]
fn test_repaired_collection_is_written_back() {
    let kv = Arc::new(MemoryStore::new());
    kv.set(
        keys::MILESTONES,
        r#"[{"date":"2025-05-01","label":"May Day"},{"id":"x","date":"13/13/2025"}]"#,
    )
    .unwrap();
    let local = LocalStore::new(kv.clone());

    let loaded = local.load_milestones();
    assert_eq!(loaded.len(), 1);

    let stored = kv.get(keys::MILESTONES).unwrap().unwrap();
    let stored: Vec<Milestone> = serde_json::from_str(&stored).unwrap();
    assert_eq!(stored, loaded);
}

#[test]
fn test_settings_theme_and_selection() {
    let local = LocalStore::new(Arc::new(MemoryStore::new()));
    assert_eq!(local.load_settings(), None);
    assert_eq!(local.load_theme(), None);
    assert_eq!(local.load_selected(), SelectedMilestones::default());

    let settings = Settings::stamped(Some(CustomRange {
        start_date: "2025-01-01".to_string(),
        end_date: "2025-06-30".to_string(),
        preset: None,
    }));
    local.save_settings(&settings);
    assert_eq!(local.load_settings(), Some(settings));
    local.clear_settings();
    assert_eq!(local.load_settings(), None);

    local.save_theme(Theme::Dark);
    assert_eq!(local.load_theme(), Some(Theme::Dark));

    let mut selected = SelectedMilestones::default();
    selected.set(
        Bar::Month,
        Some(MilestoneRef {
            date: "2025-12-25".to_string(),
            label: "Xmas".to_string(),
        }),
    );
    local.save_selected(&selected);
    let loaded = local.load_selected();
    assert_eq!(loaded.get(Bar::Month).map(|r| r.label.as_str()), Some("Xmas"));
    assert!(loaded.get(Bar::Year).is_none());
}

#[test]
fn test_unknown_theme_is_ignored() {
    let kv = Arc::new(MemoryStore::new());
    kv.set(keys::THEME, "sepia").unwrap();
    assert_eq!(LocalStore::new(kv).load_theme(), None);
}

#[test]
fn test_file_store_survives_reopen() {
    let path = temp_state_path();

    {
        let store = JsonFileStore::open(&path).unwrap();
        LocalStore::new(Arc::new(store)).save_milestones(&sample());
    }

    let reopened = LocalStore::new(Arc::new(JsonFileStore::open(&path).unwrap()));
    assert_eq!(reopened.load_milestones(), sample());

    let _ = std::fs::remove_dir_all(path.parent().unwrap());
}

#[test]
fn test_file_store_uses_browser_keys() {
    let path = temp_state_path();
    let store = Arc::new(JsonFileStore::open(&path).unwrap());
    LocalStore::new(store.clone()).save_theme(Theme::Light);

    let raw: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(raw["theme"], "light");

    store.remove(keys::THEME).unwrap();
    assert_eq!(store.get(keys::THEME).unwrap(), None);

    let _ = std::fs::remove_dir_all(path.parent().unwrap());
}
