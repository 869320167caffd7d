//! SAML trust configuration parsed from environment variables.

use std::env;
use xavyo_keystore::{SigningKeyStoreConfig, DEFAULT_KEYSTORE_EXTENSION};

pub const ENV_AUDIT_LOG_ENABLED: &str = "SAML_AUDIT_LOG_ENABLED";
pub const ENV_TENANT_KEYSTORE_EXTENSION: &str = "TENANT_KEYSTORE_EXTENSION";

/// Process-wide settings for credential resolution and SP registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SamlConfig {
    /// Dedicated super tenant signing keystore (all-or-nothing).
    pub signing_keystore: SigningKeyStoreConfig,
    /// Whether SP mutations emit audit events (default: true).
    pub audit_enabled: bool,
    /// Extension of tenant keystore names (default: `jks`).
    pub tenant_keystore_extension: String,
}

impl Default for SamlConfig {
    fn default() -> Self {
        Self {
            signing_keystore: SigningKeyStoreConfig::default(),
            audit_enabled: true,
            tenant_keystore_extension: DEFAULT_KEYSTORE_EXTENSION.to_string(),
        }
    }
}

impl SamlConfig {
    /// Parse configuration from environment variables.
    ///
    /// Reads:
    /// - `SAML_SIGN_KEYSTORE_*` - dedicated signing keystore settings
    /// - `SAML_AUDIT_LOG_ENABLED` - audit events on SP mutations (default: true)
    /// - `TENANT_KEYSTORE_EXTENSION` - tenant keystore extension (default: "jks")
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Parse configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let audit_enabled = lookup(ENV_AUDIT_LOG_ENABLED)
            .map(|v| parse_bool(&v))
            .unwrap_or(true);

        let tenant_keystore_extension = lookup(ENV_TENANT_KEYSTORE_EXTENSION)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_KEYSTORE_EXTENSION.to_string());

        let signing_keystore = SigningKeyStoreConfig::from_lookup(&lookup);
        if !signing_keystore.is_fully_specified() && signing_keystore != SigningKeyStoreConfig::default() {
            // Partially configured: the primary keystore is used instead.
            tracing::debug!(
                missing = ?signing_keystore.missing_settings(),
                "Dedicated signing keystore is partially configured and will be ignored"
            );
        }

        Self {
            signing_keystore,
            audit_enabled,
            tenant_keystore_extension,
        }
    }
}

fn parse_bool(value: &str) -> bool {
    !matches!(
        value.trim().to_lowercase().as_str(),
        "false" | "0" | "no" | "off"
    )
}
