use crate::context::{History, Location, Storage};
use crate::error::HostError;
use crate::types::PersistedSession;

/// What a read of the storage slot found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoredSlot {
    /// Storage exists and the slot holds nothing.
    Empty,
    /// Storage is missing or the read failed.
    Unavailable,
    /// The slot held text that does not parse; it has been cleared.
    Corrupt,
    Present(PersistedSession),
}

impl StoredSlot {
    #[must_use]
    pub fn into_session(self) -> Option<PersistedSession> {
        match self {
            Self::Present(blob) => Some(blob),
            Self::Empty | Self::Unavailable | Self::Corrupt => None,
        }
    }
}

/// Single-slot persistence for the `{ session, user }` pair.
///
/// Every operation fails soft: persistence is a convenience, so storage
/// problems degrade to "no stored session" instead of surfacing as errors.
pub struct SessionStore<'a> {
    storage: Option<&'a dyn Storage>,
    key: &'a str,
}

impl<'a> SessionStore<'a> {
    #[must_use]
    pub fn new(storage: Option<&'a dyn Storage>, key: &'a str) -> Self {
        Self { storage, key }
    }

    /// Read the stored pair.
    ///
    /// Returns `None` if storage is unavailable, the slot is empty, or the
    /// stored text does not parse; on a read failure or unparseable text the
    /// slot is cleared so the bad value is not read again.
    #[must_use]
    pub fn load(&self) -> Option<PersistedSession> {
        self.read().into_session()
    }

    /// Like [`load`](Self::load), but reports why nothing was returned.
    #[must_use]
    pub fn read(&self) -> StoredSlot {
        let Some(storage) = self.storage else {
            return StoredSlot::Unavailable;
        };
        let raw = match storage.get_item(self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return StoredSlot::Empty,
            Err(e) => {
                tracing::warn!(error = %e, key = self.key, "Could not read stored session");
                self.clear();
                return StoredSlot::Unavailable;
            }
        };

        match serde_json::from_str::<PersistedSession>(&raw) {
            Ok(blob) => StoredSlot::Present(blob),
            Err(e) => {
                tracing::warn!(error = %e, key = self.key, "Discarding unreadable stored session");
                self.clear();
                StoredSlot::Corrupt
            }
        }
    }

    /// Overwrite the slot with `blob`. Failures are logged, not returned.
    pub fn save(&self, blob: &PersistedSession) {
        if let Err(e) = self.try_save(blob) {
            tracing::warn!(error = %e, key = self.key, "Could not store session");
        }
    }

    fn try_save(&self, blob: &PersistedSession) -> Result<(), HostError> {
        let storage = self.storage.ok_or(HostError::Unavailable)?;
        let raw = serde_json::to_string(blob).map_err(|e| HostError::Platform(e.to_string()))?;
        storage.set_item(self.key, &raw)
    }

    /// Delete the slot. Never fails.
    pub fn clear(&self) {
        let Some(storage) = self.storage else {
            return;
        };
        if let Err(e) = storage.remove_item(self.key) {
            tracing::debug!(error = %e, key = self.key, "Could not clear stored session");
        }
    }
}

/// Rewrite the visible URL to `pathname + search`, dropping the fragment,
/// without adding a history entry. No-op without history support.
pub fn clear_visible_fragment(location: &dyn Location, history: Option<&dyn History>) {
    let Some(history) = history else {
        tracing::debug!("History replacement unavailable; fragment left in place");
        return;
    };

    if let Err(e) = path_and_query(location).and_then(|url| history.replace_url(&url)) {
        tracing::warn!(error = %e, "Could not clear URL fragment");
    }
}

fn path_and_query(location: &dyn Location) -> Result<String, HostError> {
    Ok(format!("{}{}", location.pathname()?, location.search()?))
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use time::macros::datetime;

    use super::*;
    use crate::context::{BrowsingContext, MemoryContext, MemoryStorage};
    use crate::types::{Session, User};

    const KEY: &str = "supabase_session";

    fn blob() -> PersistedSession {
        let now = datetime!(2026-05-01 12:00 UTC);
        PersistedSession::new(
            Session::issue("tok", "ref", 3600, "bearer", now),
            User::new("u1", "a@b.com", now),
        )
    }

    /// Storage where every operation fails.
    struct BrokenStorage;

    impl Storage for BrokenStorage {
        fn get_item(&self, _: &str) -> Result<Option<String>, HostError> {
            Err(HostError::Unavailable)
        }
        fn set_item(&self, _: &str, _: &str) -> Result<(), HostError> {
            Err(HostError::QuotaExceeded)
        }
        fn remove_item(&self, _: &str) -> Result<(), HostError> {
            Err(HostError::Unavailable)
        }
    }

    #[test]
    fn save_then_load_roundtrip() {
        let storage = MemoryStorage::new();
        let store = SessionStore::new(Some(&storage), KEY);
        store.save(&blob());
        assert_eq!(store.load(), Some(blob()));
    }

    #[test]
    fn save_overwrites_single_slot() {
        let storage = MemoryStorage::new();
        let store = SessionStore::new(Some(&storage), KEY);
        store.save(&blob());

        let now = datetime!(2026-05-02 12:00 UTC);
        let second = PersistedSession::new(
            Session::issue("tok2", "", 60, "bearer", now),
            User::new("u2", "", now),
        );
        store.save(&second);

        assert_eq!(storage.len(), 1);
        assert_eq!(store.load(), Some(second));
    }

    #[test]
    fn empty_slot_loads_as_none() {
        let storage = MemoryStorage::new();
        assert_eq!(SessionStore::new(Some(&storage), KEY).load(), None);
    }

    #[test]
    fn corrupt_slot_is_cleared() {
        let storage = MemoryStorage::new();
        storage.set_item(KEY, "{not json").unwrap();
        let store = SessionStore::new(Some(&storage), KEY);

        assert_eq!(store.load(), None);
        assert_eq!(storage.get_item(KEY).unwrap(), None);
    }

    #[test]
    fn wrong_shape_is_cleared() {
        let storage = MemoryStorage::new();
        storage.set_item(KEY, r#"{"session":{"access_token":"x"}}"#).unwrap();
        let store = SessionStore::new(Some(&storage), KEY);

        assert_eq!(store.load(), None);
        assert!(storage.is_empty());
    }

    #[test]
    fn unavailable_storage_is_soft() {
        let store = SessionStore::new(None, KEY);
        store.save(&blob());
        store.clear();
        assert_eq!(store.load(), None);
    }

    #[test]
    fn failing_storage_is_soft() {
        let storage = BrokenStorage;
        let store = SessionStore::new(Some(&storage), KEY);
        store.save(&blob());
        store.clear();
        assert_eq!(store.load(), None);
    }

    /// Storage whose reads fail; records the keys it was asked to remove.
    #[derive(Default)]
    struct UnreadableStorage {
        removed: RefCell<Vec<String>>,
    }

    impl Storage for UnreadableStorage {
        fn get_item(&self, _: &str) -> Result<Option<String>, HostError> {
            Err(HostError::Platform("SecurityError".into()))
        }
        fn set_item(&self, _: &str, _: &str) -> Result<(), HostError> {
            Ok(())
        }
        fn remove_item(&self, key: &str) -> Result<(), HostError> {
            self.removed.borrow_mut().push(key.to_owned());
            Ok(())
        }
    }

    #[test]
    fn read_failure_clears_slot() {
        let storage = UnreadableStorage::default();
        let store = SessionStore::new(Some(&storage), KEY);

        assert_eq!(store.read(), StoredSlot::Unavailable);
        assert_eq!(*storage.removed.borrow(), vec![KEY.to_owned()]);
    }

    #[test]
    fn read_reports_slot_state() {
        let storage = MemoryStorage::new();
        let store = SessionStore::new(Some(&storage), KEY);
        assert_eq!(store.read(), StoredSlot::Empty);

        store.save(&blob());
        assert_eq!(store.read(), StoredSlot::Present(blob()));

        storage.set_item(KEY, "garbage").unwrap();
        assert_eq!(store.read(), StoredSlot::Corrupt);
        assert_eq!(store.read(), StoredSlot::Empty);

        assert_eq!(SessionStore::new(None, KEY).read(), StoredSlot::Unavailable);
    }

    #[test]
    fn other_keys_untouched() {
        let storage = MemoryStorage::new();
        storage.set_item("theme", "dark").unwrap();
        let store = SessionStore::new(Some(&storage), KEY);
        store.save(&blob());
        store.clear();
        assert_eq!(storage.get_item("theme").unwrap().as_deref(), Some("dark"));
    }

    #[test]
    fn clears_fragment_preserving_path_and_query() {
        let ctx = MemoryContext::new("https://app.example/cb?x=1#access_token=t".parse().unwrap());
        clear_visible_fragment(ctx.location(), ctx.history());
        assert_eq!(ctx.url().as_str(), "https://app.example/cb?x=1");
        assert_eq!(ctx.replacements(), 1);
    }

    #[test]
    fn fragment_clear_is_noop_without_history() {
        let ctx = MemoryContext::new("https://app.example/cb#access_token=t".parse().unwrap())
            .without_history();
        clear_visible_fragment(ctx.location(), ctx.history());
        assert_eq!(ctx.url().fragment(), Some("access_token=t"));
    }
}
