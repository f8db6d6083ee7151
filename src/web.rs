//! Browser host backed by `web-sys`.
//!
//! ```rust,ignore
//! use implicit_session::{ResolutionError, resolve_browser_session};
//!
//! match resolve_browser_session() {
//!     Ok((session, user)) => app.signed_in(session, user),
//!     Err(ResolutionError::NoSession | ResolutionError::SessionExpired) => app.show_login(),
//!     Err(e) => app.show_error(e),
//! }
//! ```

use std::cell::Cell;

use wasm_bindgen::{JsCast, JsValue};

use crate::clock::SystemClock;
use crate::config::ResolverConfig;
use crate::context::{BrowsingContext, History, Location, Storage};
use crate::error::{HostError, ResolutionError};
use crate::resolver::SessionResolver;
use crate::types::{Session, User};

thread_local! {
    // One page per wasm instance, so a thread-local spans the page lifetime.
    static EXPIRED_SEEN: Cell<bool> = const { Cell::new(false) };
}

/// `window.location`, `window.history` and `window.localStorage`.
pub struct WebContext {
    location: web_sys::Location,
    history: Option<web_sys::History>,
    storage: Option<web_sys::Storage>,
}

impl WebContext {
    /// Capture the current window, or `None` outside a browsing context
    /// (workers, server-side rendering, native targets).
    #[must_use]
    pub fn detect() -> Option<Self> {
        let window = web_sys::window()?;
        let storage = match window.local_storage() {
            Ok(storage) => storage,
            Err(e) => {
                tracing::warn!(error = %host_error(&e), "localStorage unavailable");
                None
            }
        };
        Some(Self {
            location: window.location(),
            history: window.history().ok(),
            storage,
        })
    }
}

impl BrowsingContext for WebContext {
    fn location(&self) -> &dyn Location {
        &self.location
    }

    fn history(&self) -> Option<&dyn History> {
        self.history.as_ref().map(|h| h as &dyn History)
    }

    fn storage(&self) -> Option<&dyn Storage> {
        self.storage.as_ref().map(|s| s as &dyn Storage)
    }

    fn expired_seen(&self) -> bool {
        EXPIRED_SEEN.with(Cell::get)
    }

    fn set_expired_seen(&self, seen: bool) {
        EXPIRED_SEEN.with(|flag| flag.set(seen));
    }
}

impl Location for web_sys::Location {
    fn hash(&self) -> Result<String, HostError> {
        web_sys::Location::hash(self).map_err(|e| host_error(&e))
    }

    fn pathname(&self) -> Result<String, HostError> {
        web_sys::Location::pathname(self).map_err(|e| host_error(&e))
    }

    fn search(&self) -> Result<String, HostError> {
        web_sys::Location::search(self).map_err(|e| host_error(&e))
    }
}

impl History for web_sys::History {
    fn replace_url(&self, url: &str) -> Result<(), HostError> {
        self.replace_state_with_url(&JsValue::NULL, "", Some(url))
            .map_err(|e| host_error(&e))
    }
}

impl Storage for web_sys::Storage {
    fn get_item(&self, key: &str) -> Result<Option<String>, HostError> {
        web_sys::Storage::get_item(self, key).map_err(|e| host_error(&e))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), HostError> {
        web_sys::Storage::set_item(self, key, value).map_err(|e| host_error(&e))
    }

    fn remove_item(&self, key: &str) -> Result<(), HostError> {
        web_sys::Storage::remove_item(self, key).map_err(|e| host_error(&e))
    }
}

fn host_error(value: &JsValue) -> HostError {
    match value.dyn_ref::<web_sys::DomException>() {
        Some(ex) if ex.name() == "QuotaExceededError" => HostError::QuotaExceeded,
        Some(ex) if ex.name() == "SecurityError" => HostError::Unavailable,
        Some(ex) => HostError::Platform(format!("{}: {}", ex.name(), ex.message())),
        None => HostError::Platform(format!("{value:?}")),
    }
}

/// Resolve the page's session with default configuration and the system clock.
///
/// # Errors
///
/// See [`SessionResolver::resolve`].
pub fn resolve_browser_session() -> Result<(Session, User), ResolutionError> {
    SessionResolver::<WebContext, SystemClock>::new(ResolverConfig::default(), WebContext::detect())
        .resolve()
}
