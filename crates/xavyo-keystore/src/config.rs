//! Dedicated signing keystore configuration parsed from environment variables.
//!
//! The super tenant may sign with a keystore other than its primary one. The
//! dedicated keystore is used only when all five settings are present and
//! non-blank; anything less falls back to the primary keystore without error.

use std::env;
use std::fmt;
use std::path::PathBuf;

pub const ENV_LOCATION: &str = "SAML_SIGN_KEYSTORE_LOCATION";
pub const ENV_TYPE: &str = "SAML_SIGN_KEYSTORE_TYPE";
pub const ENV_PASSWORD: &str = "SAML_SIGN_KEYSTORE_PASSWORD";
pub const ENV_KEY_ALIAS: &str = "SAML_SIGN_KEYSTORE_KEY_ALIAS";
pub const ENV_KEY_PASSWORD: &str = "SAML_SIGN_KEYSTORE_KEY_PASSWORD";

/// Raw dedicated signing keystore settings, each possibly absent.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct SigningKeyStoreConfig {
    /// Path of the keystore file.
    pub location: Option<String>,
    /// Keystore type, e.g. `PKCS12`.
    pub store_type: Option<String>,
    /// Keystore password.
    pub store_password: Option<String>,
    /// Alias of the signing key entry.
    pub key_alias: Option<String>,
    /// Password of the signing key entry.
    pub key_password: Option<String>,
}

impl fmt::Debug for SigningKeyStoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningKeyStoreConfig")
            .field("location", &self.location)
            .field("store_type", &self.store_type)
            .field("store_password", &self.store_password.as_ref().map(|_| "[REDACTED]"))
            .field("key_alias", &self.key_alias)
            .field("key_password", &self.key_password.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Fully specified dedicated signing keystore settings.
#[derive(Clone, PartialEq, Eq)]
pub struct SigningKeyStoreSettings {
    pub location: PathBuf,
    pub store_type: String,
    pub store_password: String,
    pub key_alias: String,
    pub key_password: String,
}

impl fmt::Debug for SigningKeyStoreSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningKeyStoreSettings")
            .field("location", &self.location)
            .field("store_type", &self.store_type)
            .field("store_password", &"[REDACTED]")
            .field("key_alias", &self.key_alias)
            .field("key_password", &"[REDACTED]")
            .finish()
    }
}

impl SigningKeyStoreConfig {
    /// Parse configuration from environment variables.
    ///
    /// Reads:
    /// - `SAML_SIGN_KEYSTORE_LOCATION` - keystore file path
    /// - `SAML_SIGN_KEYSTORE_TYPE` - keystore type (`PKCS12`)
    /// - `SAML_SIGN_KEYSTORE_PASSWORD` - keystore password
    /// - `SAML_SIGN_KEYSTORE_KEY_ALIAS` - signing key alias
    /// - `SAML_SIGN_KEYSTORE_KEY_PASSWORD` - signing key password
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Parse configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            location: lookup(ENV_LOCATION),
            store_type: lookup(ENV_TYPE),
            store_password: lookup(ENV_PASSWORD),
            key_alias: lookup(ENV_KEY_ALIAS),
            key_password: lookup(ENV_KEY_PASSWORD),
        }
    }

    /// Whether all five settings are present and non-blank.
    #[must_use]
    pub fn is_fully_specified(&self) -> bool {
        self.missing_settings().is_empty()
    }

    /// Names of the settings that are absent or blank.
    #[must_use]
    pub fn missing_settings(&self) -> Vec<&'static str> {
        [
            (ENV_LOCATION, &self.location),
            (ENV_TYPE, &self.store_type),
            (ENV_PASSWORD, &self.store_password),
            (ENV_KEY_ALIAS, &self.key_alias),
            (ENV_KEY_PASSWORD, &self.key_password),
        ]
        .into_iter()
        .filter(|(_, value)| non_blank(value).is_none())
        .map(|(name, _)| name)
        .collect()
    }

    /// The complete settings, or `None` when any setting is blank.
    #[must_use]
    pub fn settings(&self) -> Option<SigningKeyStoreSettings> {
        Some(SigningKeyStoreSettings {
            location: PathBuf::from(non_blank(&self.location)?),
            store_type: non_blank(&self.store_type)?.to_string(),
            store_password: non_blank(&self.store_password)?.to_string(),
            key_alias: non_blank(&self.key_alias)?.to_string(),
            key_password: non_blank(&self.key_password)?.to_string(),
        })
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn full() -> HashMap<&'static str, String> {
        HashMap::from([
            (ENV_LOCATION, "/etc/xavyo/signing.p12".to_string()),
            (ENV_TYPE, "PKCS12".to_string()),
            (ENV_PASSWORD, "store-pw".to_string()),
            (ENV_KEY_ALIAS, "signer".to_string()),
            (ENV_KEY_PASSWORD, "key-pw".to_string()),
        ])
    }

    fn config_from(vars: &HashMap<&'static str, String>) -> SigningKeyStoreConfig {
        SigningKeyStoreConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_fully_specified() {
        let config = config_from(&full());
        assert!(config.is_fully_specified());
        let settings = config.settings().unwrap();
        assert_eq!(settings.location, PathBuf::from("/etc/xavyo/signing.p12"));
        assert_eq!(settings.key_alias, "signer");
    }

    #[test]
    fn test_any_blank_setting_disables_dedicated_keystore() {
        for name in [ENV_LOCATION, ENV_TYPE, ENV_PASSWORD, ENV_KEY_ALIAS, ENV_KEY_PASSWORD] {
            let mut vars = full();
            vars.insert(name, "   ".to_string());
            let config = config_from(&vars);
            assert!(!config.is_fully_specified(), "{name} blank");
            assert!(config.settings().is_none());
            assert_eq!(config.missing_settings(), vec![name]);

            let mut vars = full();
            vars.remove(name);
            assert!(!config_from(&vars).is_fully_specified(), "{name} absent");
        }
    }

    #[test]
    fn test_default_is_not_specified() {
        let config = SigningKeyStoreConfig::default();
        assert!(!config.is_fully_specified());
        assert_eq!(config.missing_settings().len(), 5);
    }

    #[test]
    fn test_debug_redacts_passwords() {
        let config = config_from(&full());
        let debug = format!("{config:?}");
        assert!(!debug.contains("store-pw"));
        assert!(!debug.contains("key-pw"));
        let debug = format!("{:?}", config.settings().unwrap());
        assert!(!debug.contains("store-pw"));
    }
}
