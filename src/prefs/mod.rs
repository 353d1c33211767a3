//! Locally persisted preferences: theme, favorites and the session ids used
//! to restore a login on the next start.
//!
//! Every mutation is written through immediately. Nothing here ever fails
//! toward the caller: unreadable values degrade to their defaults and failed
//! writes are logged.

use std::collections::BTreeSet;
use std::sync::Arc;

use thiserror::Error;

use crate::entities::{PostId, UserId};

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

pub const THEME_KEY: &str = "theme";
pub const FAVORITES_KEY: &str = "favorites";
pub const USER_ID_KEY: &str = "userId";
pub const USERNAME_KEY: &str = "username";

pub const DEFAULT_THEME: &str = "dark";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("storage error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// String key-value storage with browser `localStorage` semantics.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Box<S> {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> { (**self).get(key) }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> { (**self).set(key, value) }

    fn remove(&self, key: &str) -> Result<(), StoreError> { (**self).remove(key) }
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Arc<S> {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> { (**self).get(key) }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> { (**self).set(key, value) }

    fn remove(&self, key: &str) -> Result<(), StoreError> { (**self).remove(key) }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredSession {
    pub user_id: UserId,
    pub username: String,
}

pub struct Preferences<S> {
    store: S,
}

impl<S: KeyValueStore> Preferences<S> {
    pub fn new(store: S) -> Self { Self { store } }

    fn read(&self, key: &str) -> Option<String> {
        match self.store.get(key) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(key, error = %e, "cannot read preference, using default");
                None
            },
        }
    }

    fn write(&self, key: &str, value: &str) {
        if let Err(e) = self.store.set(key, value) {
            tracing::warn!(key, error = %e, "cannot persist preference");
        }
    }

    fn erase(&self, key: &str) {
        if let Err(e) = self.store.remove(key) {
            tracing::warn!(key, error = %e, "cannot remove preference");
        }
    }

    pub fn theme(&self) -> String {
        self.read(THEME_KEY)
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| DEFAULT_THEME.to_string())
    }

    pub fn set_theme(&self, theme: &str) { self.write(THEME_KEY, theme) }

    /// Stored favorites; a missing or corrupt entry reads as empty.
    pub fn favorites(&self) -> BTreeSet<PostId> {
        let raw = match self.read(FAVORITES_KEY) {
            Some(raw) => raw,
            None => return BTreeSet::new(),
        };

        match serde_json::from_str::<Vec<String>>(&raw) {
            Ok(ids) => ids.into_iter().map(PostId).collect(),
            Err(e) => {
                tracing::debug!(error = %e, "stored favorites are unreadable, starting empty");
                BTreeSet::new()
            },
        }
    }

    pub fn set_favorites(&self, favorites: &BTreeSet<PostId>) {
        let ids = favorites.iter().map(PostId::as_str).collect::<Vec<_>>();
        match serde_json::to_string(&ids) {
            Ok(json) => self.write(FAVORITES_KEY, &json),
            Err(e) => tracing::warn!(error = %e, "cannot serialize favorites"),
        }
    }

    /// Adds or removes `id` and persists the result.
    pub fn toggle_favorite(&self, id: &PostId) -> BTreeSet<PostId> {
        let mut favorites = self.favorites();

        if !favorites.remove(id) {
            favorites.insert(id.clone());
        }

        self.set_favorites(&favorites);
        favorites
    }

    pub fn session(&self) -> Option<StoredSession> {
        let user_id = self.read(USER_ID_KEY).filter(|s| !s.is_empty())?;
        let username = self.read(USERNAME_KEY).filter(|s| !s.is_empty())?;

        Some(StoredSession {
            user_id: UserId(user_id),
            username,
        })
    }

    pub fn set_session(&self, user_id: &UserId, username: &str) {
        self.write(USER_ID_KEY, user_id.as_str());
        self.write(USERNAME_KEY, username);
    }

    pub fn clear_session(&self) {
        self.erase(USER_ID_KEY);
        self.erase(USERNAME_KEY);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prefs() -> Preferences<MemoryStore> { Preferences::new(MemoryStore::new()) }

    #[test]
    fn theme_defaults_to_dark() {
        let p = prefs();
        assert_eq!(p.theme(), "dark");

        p.set_theme("light");
        assert_eq!(p.theme(), "light");
    }

    #[test]
    fn favorite_toggle_is_persisted_and_reversible() {
        let p = prefs();
        let x = PostId::from("X");

        let after = p.toggle_favorite(&x);
        assert_eq!(after, [x.clone()].into_iter().collect::<BTreeSet<_>>());
        assert_eq!(p.favorites(), after);

        p.toggle_favorite(&x);
        assert!(p.favorites().is_empty());
    }

    #[test]
    fn corrupt_favorites_read_as_empty() {
        let store = MemoryStore::new();
        store.set(FAVORITES_KEY, "[\"a\", \"b").unwrap();
        let p = Preferences::new(store);
        assert!(p.favorites().is_empty());

        // a later toggle overwrites the corrupt value
        p.toggle_favorite(&PostId::from("c"));
        assert_eq!(p.favorites().len(), 1);
    }

    #[test]
    fn session_needs_both_ids() {
        let p = prefs();
        assert_eq!(p.session(), None);

        p.set_session(&UserId::from("u1"), "ana");
        assert_eq!(
            p.session(),
            Some(StoredSession {
                user_id: UserId::from("u1"),
                username: "ana".to_string(),
            })
        );

        p.clear_session();
        assert_eq!(p.session(), None);
    }
}
