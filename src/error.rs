/// Why a session could not be resolved.
///
/// Every variant is recoverable from the caller's point of view: the usual
/// reaction is to show a sign-in entry point.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ResolutionError {
    /// No interactive browsing context (no addressable location).
    #[error("no browsing context available")]
    NoContext,

    /// The fragment looks like a token response but carries no `access_token`.
    #[error("token fragment is missing access_token")]
    MissingAccessToken,

    /// The fresh access token's payload could not be decoded.
    #[error("invalid access token: {0}")]
    InvalidToken(#[source] DecodeError),

    /// Neither a usable fragment nor a stored session exists.
    #[error("no session")]
    NoSession,

    /// The stored session has passed its `expires_at`.
    #[error("session expired")]
    SessionExpired,
}

/// Failure to decode a compact token's payload segment.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum DecodeError {
    #[error("token has no payload segment")]
    MissingPayload,
    #[error("payload is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failure reported by a host capability (storage, location, history).
///
/// Handled inside the crate; never returned from
/// [`SessionResolver::resolve`](crate::SessionResolver::resolve).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum HostError {
    #[error("capability unavailable")]
    Unavailable,
    #[error("storage quota exceeded")]
    QuotaExceeded,
    #[error("platform error: {0}")]
    Platform(String),
}

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use super::*;

    #[test]
    fn invalid_token_exposes_decode_source() {
        let err = ResolutionError::InvalidToken(DecodeError::MissingPayload);
        assert_eq!(
            err.to_string(),
            "invalid access token: token has no payload segment"
        );
        assert!(err.source().is_some());
    }

    #[test]
    fn json_error_converts_into_decode_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = DecodeError::from(json_err);
        assert!(matches!(err, DecodeError::Json(_)));
    }
}
