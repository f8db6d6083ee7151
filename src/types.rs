use derive_more::{Display, From, Into};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Identity provider user identifier (OAuth `sub` claim, opaque string).
///
/// Empty when the access token carried no usable `sub`.
#[derive(
    Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, From, Into,
)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Bearer credential obtained from an implicit-flow redirect.
///
/// `expires_at` is always derived from the local clock at creation time
/// (`now + expires_in`); it is never taken from the redirect as an absolute value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    access_token: String,
    refresh_token: String,
    expires_in: u64,
    token_type: String,
    expires_at: i64,
}

impl Session {
    /// Issue a session whose expiry is computed from `now`.
    #[must_use]
    pub fn issue(
        access_token: impl Into<String>,
        refresh_token: impl Into<String>,
        expires_in: u64,
        token_type: impl Into<String>,
        now: OffsetDateTime,
    ) -> Self {
        let lifetime = i64::try_from(expires_in).unwrap_or(i64::MAX);
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
            expires_in,
            token_type: token_type.into(),
            expires_at: now.unix_timestamp().saturating_add(lifetime),
        }
    }

    #[must_use]
    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    /// Refresh token, empty when the provider sent none.
    #[must_use]
    pub fn refresh_token(&self) -> &str {
        &self.refresh_token
    }

    #[must_use]
    pub fn expires_in(&self) -> u64 {
        self.expires_in
    }

    #[must_use]
    pub fn token_type(&self) -> &str {
        &self.token_type
    }

    /// Absolute expiry in Unix epoch seconds.
    #[must_use]
    pub fn expires_at(&self) -> i64 {
        self.expires_at
    }

    /// A session is expired once `expires_at <= now`.
    #[must_use]
    pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
        self.expires_at <= now.unix_timestamp()
    }

    /// `Authorization` header value for API calls made with this session.
    #[must_use]
    pub fn authorization_header(&self) -> String {
        format!("Bearer {}", self.access_token)
    }
}

/// Best-effort identity decoded from the access token. Not authoritative.
///
/// `created_at` is the local decode time, not the token's `iat`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl User {
    #[must_use]
    pub fn new(
        id: impl Into<UserId>,
        email: impl Into<String>,
        created_at: OffsetDateTime,
    ) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
            created_at,
        }
    }
}

/// The `{ session, user }` pair kept in the single storage slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedSession {
    pub session: Session,
    pub user: User,
}

impl PersistedSession {
    #[must_use]
    pub fn new(session: Session, user: User) -> Self {
        Self { session, user }
    }

    #[must_use]
    pub fn into_pair(self) -> (Session, User) {
        (self.session, self.user)
    }
}
