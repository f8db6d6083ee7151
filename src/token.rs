use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use serde_json::Value as JsonValue;

use crate::error::DecodeError;

/// Standard-alphabet decoder that, like the browser's `atob`, tolerates
/// non-zero trailing bits in the final quantum.
const LENIENT_STANDARD: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_allow_trailing_bits(true)
        .with_decode_padding_mode(DecodePaddingMode::RequireCanonical),
);

/// Unverified claims decoded from a compact token's payload segment.
///
/// No signature check is performed; treat every value as a hint.
#[derive(Debug, Clone, PartialEq)]
pub struct Claims {
    inner: JsonValue,
}

impl Claims {
    /// Gets a claim value by key.
    #[must_use]
    pub fn get_claim(&self, key: &str) -> Option<&JsonValue> {
        self.inner.get(key)
    }

    /// Gets the inner JSON value.
    #[must_use]
    pub fn as_json(&self) -> &JsonValue {
        &self.inner
    }

    /// `sub` claim, or `""` when absent or not a string.
    #[must_use]
    pub fn subject(&self) -> &str {
        self.string_claim("sub")
    }

    /// `email` claim, or `""` when absent or not a string.
    #[must_use]
    pub fn email(&self) -> &str {
        self.string_claim("email")
    }

    fn string_claim(&self, key: &str) -> &str {
        self.get_claim(key).and_then(JsonValue::as_str).unwrap_or_default()
    }
}

/// Decodes the payload segment of a compact (JWT-style) token.
///
/// The payload is the second period-separated segment. A token with no
/// period is taken to be a bare payload segment.
///
/// # Errors
///
/// Returns [`DecodeError::MissingPayload`] for an empty token or empty payload
/// segment, [`DecodeError::Base64`] if the segment is not base64url, and
/// [`DecodeError::Json`] if the decoded bytes are not JSON.
pub fn decode_claims(token: &str) -> Result<Claims, DecodeError> {
    let segment = payload_segment(token)?;
    let bytes = LENIENT_STANDARD.decode(to_padded_standard(segment))?;
    let inner: JsonValue = serde_json::from_slice(&bytes)?;
    Ok(Claims { inner })
}

fn payload_segment(token: &str) -> Result<&str, DecodeError> {
    let segment = match token.split_once('.') {
        Some((_, rest)) => rest.split('.').next().unwrap_or_default(),
        None => token,
    };
    if segment.is_empty() {
        return Err(DecodeError::MissingPayload);
    }
    Ok(segment)
}

/// base64url → standard alphabet, right-padded with `=` to a multiple of 4.
fn to_padded_standard(segment: &str) -> String {
    let mut out: String = segment
        .chars()
        .map(|c| match c {
            '-' => '+',
            '_' => '/',
            other => other,
        })
        .collect();
    while out.len() % 4 != 0 {
        out.push('=');
    }
    out
}

#[cfg(test)]
mod tests {
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;

    use super::*;

    fn jwt(payload: &str) -> String {
        format!(
            "{}.{}.sig",
            URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#),
            URL_SAFE_NO_PAD.encode(payload)
        )
    }

    #[test]
    fn decodes_three_segment_token() {
        let claims = decode_claims(&jwt(r#"{"sub":"u1","email":"a@b.com"}"#)).unwrap();
        assert_eq!(claims.subject(), "u1");
        assert_eq!(claims.email(), "a@b.com");
    }

    #[test]
    fn decodes_bare_payload_segment() {
        let claims = decode_claims("eyJzdWIiOiJ1MSIsImVtYWlsIjoiYUBiLmNvbSJ9").unwrap();
        assert_eq!(claims.subject(), "u1");
        assert_eq!(claims.email(), "a@b.com");
    }

    #[test]
    fn converts_url_safe_alphabet() {
        // "?>" and "~~" encode with '-' / '_' in base64url.
        let token = jwt(r#"{"sub":"?>?>","email":"~~~"}"#);
        assert!(token.contains('-') || token.contains('_'));
        let claims = decode_claims(&token).unwrap();
        assert_eq!(claims.subject(), "?>?>");
        assert_eq!(claims.email(), "~~~");
    }

    #[test]
    fn missing_or_non_string_claims_default_to_empty() {
        let claims = decode_claims(&jwt(r#"{"sub":42}"#)).unwrap();
        assert_eq!(claims.subject(), "");
        assert_eq!(claims.email(), "");
        assert_eq!(claims.get_claim("sub"), Some(&serde_json::json!(42)));
    }

    #[test]
    fn non_object_json_yields_empty_identity() {
        let claims = decode_claims(&jwt("[1,2,3]")).unwrap();
        assert_eq!(claims.subject(), "");
        assert!(claims.as_json().is_array());
    }

    #[test]
    fn empty_token_fails() {
        assert!(matches!(decode_claims(""), Err(DecodeError::MissingPayload)));
        assert!(matches!(decode_claims("header..sig"), Err(DecodeError::MissingPayload)));
    }

    #[test]
    fn invalid_base64_fails() {
        assert!(matches!(decode_claims("h.p*y!.s"), Err(DecodeError::Base64(_))));
        assert!(matches!(decode_claims("h.abcde.s"), Err(DecodeError::Base64(_))));
    }

    #[test]
    fn non_json_payload_fails() {
        let token = format!("h.{}.s", URL_SAFE_NO_PAD.encode("not json"));
        assert!(matches!(decode_claims(&token), Err(DecodeError::Json(_))));
    }

    #[test]
    fn not_a_jwt_fails() {
        assert!(decode_claims("not-a-valid-jwt").is_err());
    }
}
