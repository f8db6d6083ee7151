use std::collections::HashMap;

use url::form_urlencoded;

/// Literal whose presence marks a fragment as an implicit-grant token response.
pub const TOKEN_MARKER: &str = "access_token";

/// Decoded key/value pairs of a token-response fragment.
///
/// Keys are unique; for a repeated key the last occurrence wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FragmentParams {
    pairs: HashMap<String, String>,
}

impl FragmentParams {
    /// Parse `application/x-www-form-urlencoded` text. A leading `#` is ignored.
    #[must_use]
    pub fn parse(fragment: &str) -> Self {
        let raw = strip_hash(fragment);
        let pairs = form_urlencoded::parse(raw.as_bytes())
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        Self { pairs }
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs.get(key).map(String::as_str)
    }

    /// `access_token`, treating an empty value as absent.
    #[must_use]
    pub fn access_token(&self) -> Option<&str> {
        self.get("access_token").filter(|v| !v.is_empty())
    }

    #[must_use]
    pub fn refresh_token(&self) -> Option<&str> {
        self.get("refresh_token").filter(|v| !v.is_empty())
    }

    /// Raw `expires_in` text; interpretation is left to the caller.
    #[must_use]
    pub fn expires_in(&self) -> Option<&str> {
        self.get("expires_in")
    }

    #[must_use]
    pub fn token_type(&self) -> Option<&str> {
        self.get("token_type").filter(|v| !v.is_empty())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// Classify a location fragment and parse it if it looks like a token response.
///
/// Returns `None` when the fragment is empty or lacks the `access_token`
/// marker. The check is structural: a marker-bearing fragment is parsed even
/// if the token itself later turns out to be unusable.
#[must_use]
pub fn extract_token_fragment(fragment: &str) -> Option<FragmentParams> {
    let raw = strip_hash(fragment);
    if raw.is_empty() || !raw.contains(TOKEN_MARKER) {
        return None;
    }
    Some(FragmentParams::parse(raw))
}

/// OAuth error redirect (`#error=...&error_description=...`), if present.
///
/// Returns `(error, error_description)`.
#[must_use]
pub fn oauth_error(fragment: &str) -> Option<(String, Option<String>)> {
    let raw = strip_hash(fragment);
    if raw.is_empty() {
        return None;
    }
    let params = FragmentParams::parse(raw);
    let error = params.get("error").filter(|e| !e.is_empty())?.to_owned();
    let description = params.get("error_description").map(str::to_owned);
    Some((error, description))
}

fn strip_hash(fragment: &str) -> &str {
    fragment.strip_prefix('#').unwrap_or(fragment)
}
