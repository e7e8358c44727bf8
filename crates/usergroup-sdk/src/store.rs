//! Session storage contract.
//!
//! The session manager never touches a storage medium directly: it is
//! handed a [`SessionStore`] at construction. Implementations decide where
//! the fields live (process memory, a file, a browser's session storage)
//! and namespace them with [`SessionField::key`].
//!
//! Two implementations ship with the SDK:
//!
//! * [`MemorySessionStore`]: a process-wide map, the default for tests
//!   and short-lived tools.
//! * [`UnavailableSessionStore`]: stands in for hosts without any
//!   persistent storage; every session query then reports "no session".

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use usergroup_models::{PersistedSession, SessionField};

use crate::error::StoreError;

/// Key/value persistence for a single session.
///
/// `write` must replace every field in one step so that no reader sees a
/// mix of two sessions. `remove_all` must be idempotent.
pub trait SessionStore: Send + Sync {
    /// Whether the host offers storage at all.
    fn is_available(&self) -> bool {
        true
    }

    /// Replace the stored session with `session`.
    fn write(&self, session: &PersistedSession) -> Result<(), StoreError>;

    /// Read one stored field.
    fn read_field(&self, field: SessionField) -> Option<String>;

    /// Remove every session field.
    fn remove_all(&self);
}

impl<T: SessionStore + ?Sized> SessionStore for Arc<T> {
    fn is_available(&self) -> bool {
        (**self).is_available()
    }

    fn write(&self, session: &PersistedSession) -> Result<(), StoreError> {
        (**self).write(session)
    }

    fn read_field(&self, field: SessionField) -> Option<String> {
        (**self).read_field(field)
    }

    fn remove_all(&self) {
        (**self).remove_all();
    }
}

// ---------------------------------------------------------------------------
// MemorySessionStore
// ---------------------------------------------------------------------------

/// In-memory store keyed exactly like the browser medium it replaces.
///
/// Keys are `{app}_goapi_{field}`. Unrelated keys written through
/// [`set_raw`](Self::set_raw) are left alone by [`remove_all`](SessionStore::remove_all).
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    app: String,
    entries: RwLock<HashMap<String, String>>,
}

impl MemorySessionStore {
    /// Empty store namespaced by `app`.
    pub fn new(app: &str) -> Self {
        Self {
            app: app.to_string(),
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Application identifier used as key prefix.
    pub fn app(&self) -> &str {
        &self.app
    }

    /// Write a raw value under a field's key, bypassing session semantics.
    ///
    /// Useful to simulate other code in the same context editing the medium.
    pub fn set_raw(&self, field: SessionField, value: &str) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(field.key(&self.app), value.to_string());
    }

    /// Remove a single field, bypassing session semantics.
    pub fn remove_raw(&self, field: SessionField) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&field.key(&self.app));
    }

    /// Number of keys currently stored.
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// `true` when nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SessionStore for MemorySessionStore {
    fn write(&self, session: &PersistedSession) -> Result<(), StoreError> {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        for (field, value) in session.fields() {
            entries.insert(field.key(&self.app), value);
        }
        Ok(())
    }

    fn read_field(&self, field: SessionField) -> Option<String> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&field.key(&self.app))
            .cloned()
    }

    fn remove_all(&self) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        for field in SessionField::all() {
            entries.remove(&field.key(&self.app));
        }
    }
}

// ---------------------------------------------------------------------------
// UnavailableSessionStore
// ---------------------------------------------------------------------------

/// Store for hosts without persistent key/value storage.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableSessionStore;

impl SessionStore for UnavailableSessionStore {
    fn is_available(&self) -> bool {
        false
    }

    fn write(&self, _session: &PersistedSession) -> Result<(), StoreError> {
        Err(StoreError::Unavailable)
    }

    fn read_field(&self, _field: SessionField) -> Option<String> {
        None
    }

    fn remove_all(&self) {}
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use chrono::DateTime;
    use usergroup_models::GroupIds;

    use super::*;

    fn session() -> PersistedSession {
        PersistedSession {
            token: "a.b.c".into(),
            user_id: 5,
            external_id: "E5".into(),
            name: "Eve".into(),
            login: "eve".into(),
            email: "eve@example.com".into(),
            is_admin: false,
            group_ids: GroupIds::new(vec![1, 2]),
            expires_at: DateTime::from_timestamp(2_000_000_000, 0).unwrap(),
        }
    }

    #[test]
    fn write_then_read_every_field() {
        let store = MemorySessionStore::new("App");
        store.write(&session()).unwrap();

        assert_eq!(store.len(), 9);
        assert_eq!(store.read_field(SessionField::Token).as_deref(), Some("a.b.c"));
        assert_eq!(store.read_field(SessionField::UserId).as_deref(), Some("5"));
        assert_eq!(store.read_field(SessionField::Groups).as_deref(), Some("1,2"));
        assert_eq!(store.read_field(SessionField::IsAdmin).as_deref(), Some("false"));
    }

    #[test]
    fn remove_all_keeps_foreign_keys() {
        let store = MemorySessionStore::new("App");
        store.write(&session()).unwrap();
        store
            .entries
            .write()
            .unwrap()
            .insert("Other_key".into(), "x".into());

        store.remove_all();
        store.remove_all();

        assert_eq!(store.len(), 1);
        assert!(store.read_field(SessionField::Token).is_none());
    }

    #[test]
    fn stores_are_isolated_by_app() {
        let a = MemorySessionStore::new("A");
        a.write(&session()).unwrap();
        assert!(a.read_field(SessionField::Email).is_some());

        let b = MemorySessionStore::new("B");
        b.set_raw(SessionField::Email, "b@example.com");
        assert_eq!(b.read_field(SessionField::Email).as_deref(), Some("b@example.com"));
        b.remove_raw(SessionField::Email);
        assert!(b.is_empty());
    }

    #[test]
    fn shared_through_arc() {
        let store = Arc::new(MemorySessionStore::new("App"));
        let handle: Arc<MemorySessionStore> = Arc::clone(&store);
        handle.write(&session()).unwrap();
        assert_eq!(store.read_field(SessionField::Login).as_deref(), Some("eve"));
    }

    #[test]
    fn unavailable_store_refuses_writes() {
        let store = UnavailableSessionStore;
        assert!(!store.is_available());
        assert!(matches!(store.write(&session()), Err(StoreError::Unavailable)));
        assert!(store.read_field(SessionField::Token).is_none());
        store.remove_all();
    }
}
