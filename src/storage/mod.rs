//! Local key/value storage (the durable local mirror).

pub mod file;
pub mod memory;

pub use file::JsonFileStore;
pub use memory::MemoryStore;

use crate::error::SyncError;

/// Storage keys as constants.
pub mod keys {
    pub const TOKEN: &str = "githubToken";
    pub const USER: &str = "githubUser";
    pub const MILESTONES: &str = "milestones";
    pub const SETTINGS: &str = "settings";
    pub const THEME: &str = "theme";
    /// Last selected milestone per progress bar
    pub const SELECTED: &str = "selectedMilestone";
    /// OAuth state awaiting the provider's redirect
    pub const OAUTH_STATE: &str = "oauthState";
}

/// String key/value store with the semantics of browser local storage.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, SyncError>;
    fn set(&self, key: &str, value: &str) -> Result<(), SyncError>;
    /// Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<(), SyncError>;
}
