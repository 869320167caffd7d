//! In-memory keystore model.
//!
//! A [`KeyStore`] maps aliases to entries. Key entries are protected by a
//! per-entry password; certificate entries are readable without one.

use openssl::pkey::{Id, PKey, Private};
use openssl::x509::X509;
use std::collections::BTreeMap;
use std::fmt;

use crate::{KeyStoreError, KeyStoreResult};

/// A certificate held by a keystore.
#[derive(Clone)]
pub enum Certificate {
    /// An X.509 certificate.
    X509(X509),
    /// Any other certificate type (kept opaque).
    Other { cert_type: String, encoded: Vec<u8> },
}

impl Certificate {
    /// The X.509 certificate, if this is one.
    #[must_use]
    pub fn as_x509(&self) -> Option<&X509> {
        match self {
            Certificate::X509(cert) => Some(cert),
            Certificate::Other { .. } => None,
        }
    }

    /// Consume into the X.509 certificate, if this is one.
    #[must_use]
    pub fn into_x509(self) -> Option<X509> {
        match self {
            Certificate::X509(cert) => Some(cert),
            Certificate::Other { .. } => None,
        }
    }

    /// Certificate type name, `X.509` for X.509 certificates.
    #[must_use]
    pub fn cert_type(&self) -> &str {
        match self {
            Certificate::X509(_) => "X.509",
            Certificate::Other { cert_type, .. } => cert_type,
        }
    }

    fn der(&self) -> Option<Vec<u8>> {
        match self {
            Certificate::X509(cert) => cert.to_der().ok(),
            Certificate::Other { encoded, .. } => Some(encoded.clone()),
        }
    }
}

impl From<X509> for Certificate {
    fn from(cert: X509) -> Self {
        Certificate::X509(cert)
    }
}

impl fmt::Debug for Certificate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Certificate::X509(cert) => f
                .debug_struct("X509")
                .field("subject", &cert.subject_name())
                .finish(),
            Certificate::Other { cert_type, encoded } => f
                .debug_struct("Other")
                .field("cert_type", cert_type)
                .field("len", &encoded.len())
                .finish(),
        }
    }
}

/// A key recovered from a keystore entry.
#[derive(Clone)]
pub enum Key {
    /// A private key from a key pair entry.
    Private(PKey<Private>),
    /// Raw secret key bytes.
    Secret(Vec<u8>),
}

impl Key {
    /// The private key when this is an asymmetric private key.
    ///
    /// HMAC keys are wrapped in `PKey<Private>` by openssl but are symmetric.
    #[must_use]
    pub fn into_asymmetric_private(self) -> Option<PKey<Private>> {
        match self {
            Key::Private(key) if key.id() != Id::HMAC => Some(key),
            _ => None,
        }
    }

    /// Algorithm name for diagnostics.
    #[must_use]
    pub fn algorithm(&self) -> String {
        match self {
            Key::Private(key) => format!("{:?}", key.id()),
            Key::Secret(_) => "SECRET".to_string(),
        }
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Key").field(&self.algorithm()).finish()
    }
}

/// A keystore entry.
#[derive(Clone)]
pub enum KeyStoreEntry {
    /// A private key with its certificate chain (leaf first).
    PrivateKey {
        key: PKey<Private>,
        password: String,
        chain: Vec<X509>,
    },
    /// A trusted certificate without a key.
    TrustedCertificate(Certificate),
    /// A symmetric key.
    SecretKey { bytes: Vec<u8>, password: String },
}

impl KeyStoreEntry {
    #[must_use]
    pub fn is_key_entry(&self) -> bool {
        !matches!(self, KeyStoreEntry::TrustedCertificate(_))
    }
}

impl fmt::Debug for KeyStoreEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyStoreEntry::PrivateKey { chain, .. } => f
                .debug_struct("PrivateKey")
                .field("key", &"[REDACTED]")
                .field("chain_len", &chain.len())
                .finish(),
            KeyStoreEntry::TrustedCertificate(cert) => {
                f.debug_tuple("TrustedCertificate").field(cert).finish()
            }
            KeyStoreEntry::SecretKey { .. } => f
                .debug_struct("SecretKey")
                .field("bytes", &"[REDACTED]")
                .finish(),
        }
    }
}

/// A named, typed collection of keystore entries.
#[derive(Clone)]
pub struct KeyStore {
    name: String,
    store_type: String,
    entries: BTreeMap<String, KeyStoreEntry>,
}

impl fmt::Debug for KeyStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyStore")
            .field("name", &self.name)
            .field("store_type", &self.store_type)
            .field("aliases", &self.entries.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl KeyStore {
    /// Create an empty keystore.
    pub fn new(name: impl Into<String>, store_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            store_type: store_type.into(),
            entries: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn store_type(&self) -> &str {
        &self.store_type
    }

    /// Aliases in sorted order.
    pub fn aliases(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn contains_alias(&self, alias: &str) -> bool {
        self.entries.contains_key(alias)
    }

    #[must_use]
    pub fn entry(&self, alias: &str) -> Option<&KeyStoreEntry> {
        self.entries.get(alias)
    }

    /// Insert or replace any entry.
    pub fn set_entry(&mut self, alias: impl Into<String>, entry: KeyStoreEntry) {
        self.entries.insert(alias.into(), entry);
    }

    /// Insert or replace a private key entry.
    pub fn set_key_entry(
        &mut self,
        alias: impl Into<String>,
        key: PKey<Private>,
        password: impl Into<String>,
        chain: Vec<X509>,
    ) {
        self.set_entry(
            alias,
            KeyStoreEntry::PrivateKey {
                key,
                password: password.into(),
                chain,
            },
        );
    }

    /// Insert or replace a secret key entry.
    pub fn set_secret_key_entry(
        &mut self,
        alias: impl Into<String>,
        bytes: Vec<u8>,
        password: impl Into<String>,
    ) {
        self.set_entry(
            alias,
            KeyStoreEntry::SecretKey {
                bytes,
                password: password.into(),
            },
        );
    }

    /// Insert or replace a trusted certificate entry.
    ///
    /// Fails with [`KeyStoreError::AliasConflict`] when the alias already holds
    /// a key entry.
    pub fn set_certificate_entry(
        &mut self,
        alias: impl Into<String>,
        cert: impl Into<Certificate>,
    ) -> KeyStoreResult<()> {
        let alias = alias.into();
        if self.entries.get(&alias).is_some_and(KeyStoreEntry::is_key_entry) {
            return Err(KeyStoreError::AliasConflict {
                name: self.name.clone(),
                alias,
            });
        }
        self.entries
            .insert(alias, KeyStoreEntry::TrustedCertificate(cert.into()));
        Ok(())
    }

    /// Remove an entry, returning it.
    pub fn delete_entry(&mut self, alias: &str) -> Option<KeyStoreEntry> {
        self.entries.remove(alias)
    }

    /// Recover the key stored under `alias`.
    ///
    /// Returns `Ok(None)` when the alias is absent or holds only a certificate.
    pub fn key(&self, alias: &str, password: &str) -> KeyStoreResult<Option<Key>> {
        let (key, expected) = match self.entries.get(alias) {
            Some(KeyStoreEntry::PrivateKey { key, password, .. }) => {
                (Key::Private(key.clone()), password)
            }
            Some(KeyStoreEntry::SecretKey { bytes, password }) => {
                (Key::Secret(bytes.clone()), password)
            }
            Some(KeyStoreEntry::TrustedCertificate(_)) | None => return Ok(None),
        };
        if expected != password {
            return Err(KeyStoreError::UnrecoverableKey {
                name: self.name.clone(),
                alias: alias.to_string(),
            });
        }
        Ok(Some(key))
    }

    /// The certificate stored under `alias`: the trusted certificate, or the
    /// leaf of a key entry's chain.
    #[must_use]
    pub fn certificate(&self, alias: &str) -> Option<Certificate> {
        match self.entries.get(alias)? {
            KeyStoreEntry::PrivateKey { chain, .. } => {
                chain.first().cloned().map(Certificate::X509)
            }
            KeyStoreEntry::TrustedCertificate(cert) => Some(cert.clone()),
            KeyStoreEntry::SecretKey { .. } => None,
        }
    }

    /// Find the alias whose certificate is byte-identical to `cert`.
    #[must_use]
    pub fn certificate_alias(&self, cert: &X509) -> Option<String> {
        let wanted = cert.to_der().ok()?;
        self.entries.iter().find_map(|(alias, entry)| {
            let candidate = match entry {
                KeyStoreEntry::PrivateKey { chain, .. } => chain.first()?.to_der().ok()?,
                KeyStoreEntry::TrustedCertificate(c) => c.der()?,
                KeyStoreEntry::SecretKey { .. } => return None,
            };
            (candidate == wanted).then(|| alias.clone())
        })
    }

    /// Whether `alias` holds `cert` as a trusted certificate entry.
    #[must_use]
    pub fn holds_trusted_certificate(&self, alias: &str, cert: &X509) -> bool {
        match self.entries.get(alias) {
            Some(KeyStoreEntry::TrustedCertificate(held)) => {
                matches!((held.der(), cert.to_der().ok()), (Some(a), Some(b)) if a == b)
            }
            _ => false,
        }
    }
}
