#![doc = include_str!("../README.md")]

pub mod clock;
pub mod config;
pub mod context;
pub mod error;
pub mod fragment;
pub mod resolver;
pub mod store;
pub mod token;
pub mod types;
#[cfg(feature = "web")]
pub mod web;

// Re-exports for convenient access
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::ResolverConfig;
pub use context::{BrowsingContext, History, Location, MemoryContext, MemoryStorage, Storage};
pub use error::{DecodeError, HostError, ResolutionError};
pub use fragment::{FragmentParams, extract_token_fragment};
pub use resolver::{SessionResolver, check_stored, session_from_fragment};
pub use store::{SessionStore, StoredSlot, clear_visible_fragment};
pub use token::{Claims, decode_claims};
pub use types::{PersistedSession, Session, User, UserId};
#[cfg(feature = "web")]
pub use web::{WebContext, resolve_browser_session};
