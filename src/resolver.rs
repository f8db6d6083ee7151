//! Extract-or-restore session resolution.
//!
//! Resolution is a two-row decision table keyed on the current fragment:
//!
//! | Fragment                         | Sub-procedure            |
//! |----------------------------------|--------------------------|
//! | non-empty, contains `access_token` | [`session_from_fragment`] |
//! | anything else                    | [`check_stored`]         |
//!
//! A fragment that looks like a token response but fails to parse is a hard
//! error; it never falls back to the stored session.

use time::OffsetDateTime;

use crate::clock::{Clock, SystemClock};
use crate::config::ResolverConfig;
use crate::context::BrowsingContext;
use crate::error::ResolutionError;
use crate::fragment::{self, FragmentParams};
use crate::store::{self, SessionStore, StoredSlot};
use crate::token;
use crate::types::{PersistedSession, Session, User};

/// Resolves the current session from a browsing context.
///
/// ```rust
/// use implicit_session::{MemoryContext, ResolverConfig, SessionResolver};
///
/// let ctx = MemoryContext::new(
///     "https://app.example/cb#access_token=eyJzdWIiOiJ1MSJ9&expires_in=60".parse()?,
/// );
/// let resolver = SessionResolver::new(ResolverConfig::default(), Some(&ctx));
/// let (session, user) = resolver.resolve()?;
/// assert_eq!(user.id.as_str(), "u1");
/// assert_eq!(session.expires_in(), 60);
///
/// // The fragment was consumed; the next call restores from storage.
/// assert!(ctx.url().fragment().is_none());
/// assert!(resolver.resolve().is_ok());
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct SessionResolver<C, K = SystemClock> {
    config: ResolverConfig,
    context: Option<C>,
    clock: K,
}

impl<C: BrowsingContext> SessionResolver<C> {
    /// `context` is `None` when not running in an interactive browsing context.
    #[must_use]
    pub fn new(config: ResolverConfig, context: Option<C>) -> Self {
        Self {
            config,
            context,
            clock: SystemClock,
        }
    }
}

impl<C: BrowsingContext, K: Clock> SessionResolver<C, K> {
    /// Use a custom clock (for deterministic hosts or testing).
    #[must_use]
    pub fn with_clock<K2: Clock>(self, clock: K2) -> SessionResolver<C, K2> {
        SessionResolver {
            config: self.config,
            context: self.context,
            clock,
        }
    }

    #[must_use]
    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Extract a fresh session from the fragment, or restore the stored one.
    ///
    /// On the fresh-token path the pair is persisted and the fragment is
    /// removed from the visible URL, so a repeated call degrades to the
    /// stored-session path.
    ///
    /// Once an expired session has been discarded, later calls that find the
    /// slot empty keep reporting `SessionExpired`. The marker lives on the
    /// context, so it spans resolvers, and is reset by a fresh session or
    /// [`sign_out`](Self::sign_out).
    ///
    /// # Errors
    ///
    /// - [`ResolutionError::NoContext`] without a browsing context
    /// - [`ResolutionError::MissingAccessToken`] / [`ResolutionError::InvalidToken`]
    ///   for a token-looking fragment that cannot be used
    /// - [`ResolutionError::NoSession`] when nothing usable is stored
    /// - [`ResolutionError::SessionExpired`] when the stored session has expired
    pub fn resolve(&self) -> Result<(Session, User), ResolutionError> {
        let ctx = self.context.as_ref().ok_or(ResolutionError::NoContext)?;
        let slot = SessionStore::new(ctx.storage(), &self.config.storage_key);
        let now = self.clock.now();

        let raw_fragment = ctx.location().hash().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Could not read location fragment");
            String::new()
        });

        match fragment::extract_token_fragment(&raw_fragment) {
            Some(params) => {
                let blob = session_from_fragment(&params, now, &self.config)?;
                ctx.set_expired_seen(false);
                slot.save(&blob);
                store::clear_visible_fragment(ctx.location(), ctx.history());
                tracing::info!(
                    user_id = %blob.user.id,
                    expires_at = blob.session.expires_at(),
                    "Session established from URL fragment"
                );
                Ok(blob.into_pair())
            }
            None => {
                if let Some((error, description)) = fragment::oauth_error(&raw_fragment) {
                    tracing::warn!(
                        error = %error,
                        description = description.as_deref().unwrap_or(""),
                        "OAuth error redirect"
                    );
                }
                let stored = slot.read();
                let vacant = stored == StoredSlot::Empty;
                match check_stored(stored.into_session(), now) {
                    Err(ResolutionError::SessionExpired) => {
                        tracing::info!("Stored session expired");
                        slot.clear();
                        ctx.set_expired_seen(true);
                        Err(ResolutionError::SessionExpired)
                    }
                    Err(ResolutionError::NoSession) if vacant && ctx.expired_seen() => {
                        Err(ResolutionError::SessionExpired)
                    }
                    other => other.map(|blob| {
                        tracing::debug!(user_id = %blob.user.id, "Session restored from storage");
                        blob.into_pair()
                    }),
                }
            }
        }
    }

    /// Forget the stored session. Safe to call when nothing is stored.
    pub fn sign_out(&self) {
        if let Some(ctx) = &self.context {
            ctx.set_expired_seen(false);
            SessionStore::new(ctx.storage(), &self.config.storage_key).clear();
        }
    }
}

/// Build the session/user pair from a token-response fragment.
///
/// # Errors
///
/// [`ResolutionError::MissingAccessToken`] if `access_token` is absent or
/// empty, [`ResolutionError::InvalidToken`] if its payload does not decode.
pub fn session_from_fragment(
    params: &FragmentParams,
    now: OffsetDateTime,
    config: &ResolverConfig,
) -> Result<PersistedSession, ResolutionError> {
    let access_token = params
        .access_token()
        .ok_or(ResolutionError::MissingAccessToken)?;

    let claims = token::decode_claims(access_token).map_err(ResolutionError::InvalidToken)?;

    let expires_in = params
        .expires_in()
        .and_then(|s| s.trim().parse::<u64>().ok())
        .filter(|&secs| secs > 0)
        .unwrap_or(config.default_expires_in);

    let session = Session::issue(
        access_token,
        params.refresh_token().unwrap_or_default(),
        expires_in,
        params
            .token_type()
            .unwrap_or(config.default_token_type.as_str()),
        now,
    );
    let user = User::new(claims.subject(), claims.email(), now);

    Ok(PersistedSession::new(session, user))
}

/// Validate a loaded blob against `now`.
///
/// # Errors
///
/// [`ResolutionError::NoSession`] if nothing was loaded,
/// [`ResolutionError::SessionExpired`] if `expires_at <= now`.
pub fn check_stored(
    stored: Option<PersistedSession>,
    now: OffsetDateTime,
) -> Result<PersistedSession, ResolutionError> {
    let blob = stored.ok_or(ResolutionError::NoSession)?;
    if blob.session.is_expired_at(now) {
        return Err(ResolutionError::SessionExpired);
    }
    Ok(blob)
}
