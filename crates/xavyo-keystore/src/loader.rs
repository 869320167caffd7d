//! Keystore file loading.
//!
//! PKCS#12 is the only container format openssl can read. JKS and JCEKS
//! stores must be converted (`keytool -importkeystore -deststoretype pkcs12`)
//! before they can be used here.

use openssl::pkcs12::Pkcs12;
use std::path::Path;

use crate::keystore::KeyStore;
use crate::{KeyStoreError, KeyStoreResult};

/// Alias given to the key entry when the PKCS#12 bag carries no friendly name.
const DEFAULT_PKCS12_ALIAS: &str = "1";

/// Supported keystore container formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyStoreType {
    Pkcs12,
}

impl KeyStoreType {
    /// Parse from string value (case-insensitive).
    pub fn from_str_value(s: &str) -> KeyStoreResult<Self> {
        match s.trim().to_lowercase().as_str() {
            "pkcs12" | "p12" | "pfx" => Ok(Self::Pkcs12),
            other => Err(KeyStoreError::UnsupportedType {
                store_type: other.to_uppercase(),
            }),
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pkcs12 => "PKCS12",
        }
    }
}

/// Parse keystore bytes.
///
/// The key entry is protected with the store password, the way PKCS#12
/// files produced by `openssl pkcs12 -export` are.
pub fn load_keystore(
    name: &str,
    store_type: &str,
    bytes: &[u8],
    password: &str,
) -> KeyStoreResult<KeyStore> {
    let store_type = KeyStoreType::from_str_value(store_type)?;
    match store_type {
        KeyStoreType::Pkcs12 => load_pkcs12(name, bytes, password),
    }
}

fn load_pkcs12(name: &str, bytes: &[u8], password: &str) -> KeyStoreResult<KeyStore> {
    let malformed = |detail: String| KeyStoreError::Malformed {
        name: name.to_string(),
        detail,
    };

    let parsed = Pkcs12::from_der(bytes)
        .map_err(|e| malformed(format!("not a PKCS#12 structure: {e}")))?
        .parse2(password)
        .map_err(|e| malformed(format!("cannot decrypt (wrong password?): {e}")))?;

    let mut keystore = KeyStore::new(name, KeyStoreType::Pkcs12.as_str());
    let mut extra: Vec<_> = parsed
        .ca
        .map(|stack| stack.into_iter().collect())
        .unwrap_or_default();

    match (parsed.pkey, parsed.cert) {
        (Some(key), Some(cert)) => {
            let alias = friendly_name(&cert);
            let mut chain = vec![cert];
            chain.append(&mut extra);
            keystore.set_key_entry(alias, key, password, chain);
        }
        (Some(key), None) => {
            keystore.set_key_entry(DEFAULT_PKCS12_ALIAS, key, password, std::mem::take(&mut extra));
        }
        (None, Some(cert)) => {
            let alias = friendly_name(&cert);
            keystore.set_certificate_entry(alias, cert)?;
        }
        (None, None) => {}
    }

    for (index, cert) in extra.into_iter().enumerate() {
        keystore.set_certificate_entry(format!("ca-{index}"), cert)?;
    }

    tracing::debug!(
        keystore = %name,
        entries = keystore.len(),
        "PKCS#12 keystore parsed"
    );

    Ok(keystore)
}

fn friendly_name(cert: &openssl::x509::X509) -> String {
    cert.alias()
        .and_then(|alias| std::str::from_utf8(alias).ok())
        .filter(|alias| !alias.is_empty())
        .unwrap_or(DEFAULT_PKCS12_ALIAS)
        .to_string()
}

/// Read and parse a keystore file.
///
/// The keystore takes the file name as its name.
pub async fn load_keystore_file(
    path: &Path,
    store_type: &str,
    password: &str,
) -> KeyStoreResult<KeyStore> {
    // Reject the type before touching the file system.
    KeyStoreType::from_str_value(store_type)?;

    check_permissions(path);

    let bytes = tokio::fs::read(path).await.map_err(|e| KeyStoreError::Io {
        path: path.display().to_string(),
        detail: e.to_string(),
    })?;

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    let keystore = load_keystore(&name, store_type, &bytes, password)?;

    tracing::info!(
        path = %path.display(),
        store_type = %keystore.store_type(),
        "Keystore loaded from file"
    );

    Ok(keystore)
}

/// Warn when a keystore file is world-readable.
#[cfg(unix)]
fn check_permissions(path: &Path) {
    use std::os::unix::fs::PermissionsExt;
    if let Ok(metadata) = std::fs::metadata(path) {
        let mode = metadata.permissions().mode();
        if mode & 0o004 != 0 {
            tracing::warn!(
                path = %path.display(),
                mode = format!("{:o}", mode),
                "Keystore file is world-readable. Consider restricting permissions to 0600."
            );
        }
    }
}

#[cfg(not(unix))]
fn check_permissions(_path: &Path) {}
