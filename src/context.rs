//! Host capabilities the resolver depends on.
//!
//! In a browser these are `window.location`, `window.history` and
//! `window.localStorage` (see the `web` feature). [`MemoryContext`] provides
//! the same surface over a plain [`Url`] for native hosts and tests.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use url::Url;

use crate::error::HostError;

/// Read access to the current location.
pub trait Location {
    /// Fragment including the leading `#`, or `""` when there is none.
    fn hash(&self) -> Result<String, HostError>;
    fn pathname(&self) -> Result<String, HostError>;
    /// Query including the leading `?`, or `""` when there is none.
    fn search(&self) -> Result<String, HostError>;
}

/// Session history manipulation.
pub trait History {
    /// Replace the current URL without creating a history entry.
    fn replace_url(&self, url: &str) -> Result<(), HostError>;
}

/// Key-value store that survives page reloads.
pub trait Storage {
    fn get_item(&self, key: &str) -> Result<Option<String>, HostError>;
    fn set_item(&self, key: &str, value: &str) -> Result<(), HostError>;
    fn remove_item(&self, key: &str) -> Result<(), HostError>;
}

/// An interactive browsing context.
///
/// Location is mandatory; history and storage may be missing on
/// restricted platforms.
pub trait BrowsingContext {
    fn location(&self) -> &dyn Location;
    fn history(&self) -> Option<&dyn History>;
    fn storage(&self) -> Option<&dyn Storage>;

    /// Whether an expired stored session was discarded during this page's
    /// lifetime. Outlives any single resolver.
    fn expired_seen(&self) -> bool;
    fn set_expired_seen(&self, seen: bool);
}

impl<C: BrowsingContext + ?Sized> BrowsingContext for &C {
    fn location(&self) -> &dyn Location {
        (**self).location()
    }

    fn history(&self) -> Option<&dyn History> {
        (**self).history()
    }

    fn storage(&self) -> Option<&dyn Storage> {
        (**self).storage()
    }

    fn expired_seen(&self) -> bool {
        (**self).expired_seen()
    }

    fn set_expired_seen(&self, seen: bool) {
        (**self).set_expired_seen(seen);
    }
}

/// In-memory [`Storage`].
#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: RefCell<HashMap<String, String>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.borrow().is_empty()
    }
}

impl Storage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, HostError> {
        Ok(self.items.borrow().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), HostError> {
        self.items
            .borrow_mut()
            .insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), HostError> {
        self.items.borrow_mut().remove(key);
        Ok(())
    }
}

/// Browsing context backed by an in-memory URL.
///
/// ```rust
/// use implicit_session::{BrowsingContext, Location, MemoryContext};
///
/// let ctx = MemoryContext::new("https://app.example/cb?x=1#access_token=t".parse()?);
/// assert_eq!(ctx.location().hash()?, "#access_token=t");
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug)]
pub struct MemoryContext {
    url: RefCell<Url>,
    storage: Option<MemoryStorage>,
    history_enabled: bool,
    replacements: Cell<usize>,
    expired_seen: Cell<bool>,
}

impl MemoryContext {
    /// Context at `url` with empty storage and history support.
    #[must_use]
    pub fn new(url: Url) -> Self {
        Self {
            url: RefCell::new(url),
            storage: Some(MemoryStorage::new()),
            history_enabled: true,
            replacements: Cell::new(0),
            expired_seen: Cell::new(false),
        }
    }

    /// Simulate a platform where storage is unavailable.
    #[must_use]
    pub fn without_storage(mut self) -> Self {
        self.storage = None;
        self
    }

    /// Simulate a platform with no history-replacement capability.
    #[must_use]
    pub fn without_history(mut self) -> Self {
        self.history_enabled = false;
        self
    }

    /// Current URL.
    #[must_use]
    pub fn url(&self) -> Url {
        self.url.borrow().clone()
    }

    /// Navigate to `url` (as if the user followed a redirect).
    pub fn navigate(&self, url: Url) {
        *self.url.borrow_mut() = url;
    }

    /// Number of history replacements performed so far.
    #[must_use]
    pub fn replacements(&self) -> usize {
        self.replacements.get()
    }

    #[must_use]
    pub fn memory_storage(&self) -> Option<&MemoryStorage> {
        self.storage.as_ref()
    }
}

impl Location for MemoryContext {
    fn hash(&self) -> Result<String, HostError> {
        Ok(match self.url.borrow().fragment() {
            Some(f) if !f.is_empty() => format!("#{f}"),
            _ => String::new(),
        })
    }

    fn pathname(&self) -> Result<String, HostError> {
        Ok(self.url.borrow().path().to_owned())
    }

    fn search(&self) -> Result<String, HostError> {
        Ok(match self.url.borrow().query() {
            Some(q) if !q.is_empty() => format!("?{q}"),
            _ => String::new(),
        })
    }
}

impl History for MemoryContext {
    fn replace_url(&self, url: &str) -> Result<(), HostError> {
        let next = self
            .url
            .borrow()
            .join(url)
            .map_err(|e| HostError::Platform(e.to_string()))?;
        *self.url.borrow_mut() = next;
        self.replacements.set(self.replacements.get() + 1);
        Ok(())
    }
}

impl BrowsingContext for MemoryContext {
    fn location(&self) -> &dyn Location {
        self
    }

    fn history(&self) -> Option<&dyn History> {
        self.history_enabled.then_some(self as &dyn History)
    }

    fn storage(&self) -> Option<&dyn Storage> {
        self.storage.as_ref().map(|s| s as &dyn Storage)
    }

    fn expired_seen(&self) -> bool {
        self.expired_seen.get()
    }

    fn set_expired_seen(&self, seen: bool) {
        self.expired_seen.set(seen);
    }
}
