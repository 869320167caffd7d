//! Keystore access for the xavyo SAML identity provider.
//!
//! This crate models the keystores that hold tenant signing keys and trusted
//! service provider certificates:
//!
//! - [`KeyStore`] - a named, typed collection of alias to entry
//! - [`loader`] - PKCS#12 file loading
//! - [`KeyStoreManager`] - per-tenant keystore access, with [`InMemoryKeyStores`]
//! - [`SigningKeyStoreConfig`] - the dedicated super tenant signing keystore
//!
//! # Usage
//!
//! ```rust,ignore
//! use xavyo_keystore::{KeyStoreManagers, tenant_keystore_name};
//!
//! let manager = managers.for_tenant(tenant_id);
//! let name = tenant_keystore_name("example.com", "jks");
//! let cert = manager.get_certificate(&name, "example.com").await?;
//! ```

pub mod config;
pub mod keystore;
pub mod loader;
pub mod manager;
pub mod naming;

pub use config::{SigningKeyStoreConfig, SigningKeyStoreSettings};
pub use keystore::{Certificate, Key, KeyStore, KeyStoreEntry};
pub use loader::{load_keystore, load_keystore_file, KeyStoreType};
pub use manager::{InMemoryKeyStores, KeyStoreManager, KeyStoreManagers};
pub use naming::{tenant_keystore_name, DEFAULT_KEYSTORE_EXTENSION};

// ── KeyStoreError ────────────────────────────────────────────────────────

/// Result type for keystore operations.
pub type KeyStoreResult<T> = Result<T, KeyStoreError>;

/// Errors returned by keystore operations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum KeyStoreError {
    /// The keystore file could not be read.
    #[error("Failed to read keystore '{path}': {detail}")]
    Io { path: String, detail: String },

    /// The keystore type is not supported by this build.
    #[error("Unsupported keystore type '{store_type}'")]
    UnsupportedType { store_type: String },

    /// The keystore content is corrupt or the store password is wrong.
    #[error("Malformed keystore '{name}': {detail}")]
    Malformed { name: String, detail: String },

    /// A key entry exists but cannot be recovered with the given password.
    #[error("Cannot recover key '{alias}' from keystore '{name}'")]
    UnrecoverableKey { name: String, alias: String },

    /// No keystore with this name exists for the tenant.
    #[error("Keystore not found: '{name}'")]
    NotFound { name: String },

    /// A certificate entry would overwrite a key entry.
    #[error("Alias '{alias}' in keystore '{name}' already holds a key entry")]
    AliasConflict { name: String, alias: String },

    /// Keystore configuration is missing or inconsistent.
    #[error("Keystore configuration error: {detail}")]
    Config { detail: String },
}

impl KeyStoreError {
    /// Get the error code string for classification.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            KeyStoreError::Io { .. } => "keystore_io",
            KeyStoreError::UnsupportedType { .. } => "unsupported_keystore_type",
            KeyStoreError::Malformed { .. } => "malformed_keystore",
            KeyStoreError::UnrecoverableKey { .. } => "unrecoverable_key",
            KeyStoreError::NotFound { .. } => "keystore_not_found",
            KeyStoreError::AliasConflict { .. } => "alias_conflict",
            KeyStoreError::Config { .. } => "keystore_config",
        }
    }

    /// Whether the caller can fix this error by changing its input.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(self, KeyStoreError::AliasConflict { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = KeyStoreError::UnrecoverableKey {
            name: "signing.p12".to_string(),
            alias: "wso2carbon".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Cannot recover key 'wso2carbon' from keystore 'signing.p12'"
        );
    }

    #[test]
    fn test_error_codes() {
        let err = KeyStoreError::NotFound {
            name: "example-com.jks".to_string(),
        };
        assert_eq!(err.error_code(), "keystore_not_found");
        assert!(!err.is_client_error());

        let err = KeyStoreError::AliasConflict {
            name: "example-com.jks".to_string(),
            alias: "example.com".to_string(),
        };
        assert_eq!(err.error_code(), "alias_conflict");
        assert!(err.is_client_error());
    }
}
