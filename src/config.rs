/// Storage key used by the browser SDK this crate interoperates with.
pub const DEFAULT_STORAGE_KEY: &str = "supabase_session";

/// Lifetime assumed when the redirect omits a usable `expires_in`.
pub const DEFAULT_EXPIRES_IN: u64 = 3600;

/// Token type assumed when the redirect omits `token_type`.
pub const DEFAULT_TOKEN_TYPE: &str = "bearer";

/// Session resolver configuration.
///
/// Every field has a default; override with `with_*` methods.
///
/// ```rust
/// use implicit_session::ResolverConfig;
///
/// let config = ResolverConfig::new()
///     .with_storage_key("my_app_session")
///     .with_default_expires_in(900);
/// assert_eq!(config.storage_key(), "my_app_session");
/// ```
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct ResolverConfig {
    pub(crate) storage_key: String,
    pub(crate) default_expires_in: u64,
    pub(crate) default_token_type: String,
}

impl ResolverConfig {
    #[must_use]
    pub fn new() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.into(),
            default_expires_in: DEFAULT_EXPIRES_IN,
            default_token_type: DEFAULT_TOKEN_TYPE.into(),
        }
    }

    /// Override the storage slot key (default: `"supabase_session"`).
    #[must_use]
    pub fn with_storage_key(mut self, key: impl Into<String>) -> Self {
        self.storage_key = key.into();
        self
    }

    /// Override the fallback lifetime in seconds (default: 3600).
    ///
    /// Zero is ignored; a session lifetime is always positive.
    #[must_use]
    pub fn with_default_expires_in(mut self, seconds: u64) -> Self {
        if seconds > 0 {
            self.default_expires_in = seconds;
        }
        self
    }

    /// Override the fallback token type (default: `"bearer"`).
    #[must_use]
    pub fn with_default_token_type(mut self, token_type: impl Into<String>) -> Self {
        self.default_token_type = token_type.into();
        self
    }

    #[must_use]
    pub fn storage_key(&self) -> &str {
        &self.storage_key
    }

    #[must_use]
    pub fn default_expires_in(&self) -> u64 {
        self.default_expires_in
    }

    #[must_use]
    pub fn default_token_type(&self) -> &str {
        &self.default_token_type
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = ResolverConfig::default();
        assert_eq!(config.storage_key(), "supabase_session");
        assert_eq!(config.default_expires_in(), 3600);
        assert_eq!(config.default_token_type(), "bearer");
    }

    #[test]
    fn test_config_with_overrides() {
        let config = ResolverConfig::new()
            .with_storage_key("app_session")
            .with_default_expires_in(60)
            .with_default_token_type("Bearer");

        assert_eq!(config.storage_key(), "app_session");
        assert_eq!(config.default_expires_in(), 60);
        assert_eq!(config.default_token_type(), "Bearer");
    }

    #[test]
    fn test_config_ignores_zero_lifetime() {
        let config = ResolverConfig::new().with_default_expires_in(0);
        assert_eq!(config.default_expires_in(), 3600);
    }
}
