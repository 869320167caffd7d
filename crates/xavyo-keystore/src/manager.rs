//! Per-tenant keystore access.
//!
//! [`KeyStoreManager`] is the capability the SAML services consume. The
//! storage behind it (files, database, HSM) is owned by the implementation,
//! including its caching and locking discipline.

use async_trait::async_trait;
use openssl::pkey::{PKey, Private};
use openssl::x509::X509;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use xavyo_core::TenantId;

use crate::keystore::{Certificate, Key, KeyStore, KeyStoreEntry};
use crate::{KeyStoreError, KeyStoreResult};

/// Keystore operations scoped to one tenant.
#[async_trait]
pub trait KeyStoreManager: Send + Sync {
    /// Recover the key stored under `alias` in keystore `keystore_name`.
    async fn get_private_key(&self, keystore_name: &str, alias: &str) -> KeyStoreResult<Option<Key>>;

    /// The certificate stored under `alias` in keystore `keystore_name`.
    async fn get_certificate(
        &self,
        keystore_name: &str,
        alias: &str,
    ) -> KeyStoreResult<Option<Certificate>>;

    /// The private key of the tenant's primary keystore.
    async fn get_default_private_key(&self) -> KeyStoreResult<Option<PKey<Private>>>;

    /// The certificate of the tenant's primary keystore.
    async fn get_default_primary_certificate(&self) -> KeyStoreResult<Option<X509>>;

    /// A snapshot of the tenant's primary keystore.
    async fn get_primary_keystore(&self) -> KeyStoreResult<KeyStore>;

    /// A snapshot of the named keystore.
    async fn get_keystore(&self, keystore_name: &str) -> KeyStoreResult<KeyStore>;

    /// Replace the stored keystore with `keystore`.
    async fn persist_keystore(&self, keystore_name: &str, keystore: KeyStore) -> KeyStoreResult<()>;

    /// Write a trusted certificate entry and persist the keystore as one step.
    ///
    /// Returns the entry previously stored under `alias`.
    async fn import_certificate_entry(
        &self,
        keystore_name: &str,
        alias: &str,
        cert: X509,
    ) -> KeyStoreResult<Option<KeyStoreEntry>>;

    /// Undo [`KeyStoreManager::import_certificate_entry`].
    ///
    /// `alias` is restored to `previous` (or removed) only while it still holds
    /// `imported`. Returns whether the keystore changed.
    async fn revert_certificate_entry(
        &self,
        keystore_name: &str,
        alias: &str,
        imported: &X509,
        previous: Option<KeyStoreEntry>,
    ) -> KeyStoreResult<bool>;
}

/// Hands out the keystore manager of a tenant.
pub trait KeyStoreManagers: Send + Sync {
    fn for_tenant(&self, tenant_id: TenantId) -> Arc<dyn KeyStoreManager>;
}

// ── In-memory implementation ─────────────────────────────────────────────

struct StoredKeyStore {
    keystore: KeyStore,
    password: String,
}

struct PrimaryEntry {
    keystore_name: String,
    alias: String,
}

#[derive(Default)]
struct TenantKeyStores {
    keystores: HashMap<String, StoredKeyStore>,
    primary: Option<PrimaryEntry>,
    persist_count: usize,
}

type SharedTenants = Arc<RwLock<HashMap<TenantId, TenantKeyStores>>>;

/// In-memory keystores for all tenants.
///
/// Each registered keystore carries the password that protects its key
/// entries, matching tenant keystores where key and store passwords are equal.
#[derive(Clone, Default)]
pub struct InMemoryKeyStores {
    tenants: SharedTenants,
}

impl InMemoryKeyStores {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) a keystore for a tenant.
    pub async fn add_keystore(&self, tenant_id: TenantId, keystore: KeyStore, password: impl Into<String>) {
        let mut tenants = self.tenants.write().await;
        tenants.entry(tenant_id).or_default().keystores.insert(
            keystore.name().to_string(),
            StoredKeyStore {
                keystore,
                password: password.into(),
            },
        );
    }

    /// Mark a registered keystore and alias as the tenant's primary key.
    pub async fn set_primary(
        &self,
        tenant_id: TenantId,
        keystore_name: impl Into<String>,
        alias: impl Into<String>,
    ) -> KeyStoreResult<()> {
        let keystore_name = keystore_name.into();
        let mut tenants = self.tenants.write().await;
        let tenant = tenants.entry(tenant_id).or_default();
        if !tenant.keystores.contains_key(&keystore_name) {
            return Err(KeyStoreError::NotFound {
                name: keystore_name,
            });
        }
        tenant.primary = Some(PrimaryEntry {
            keystore_name,
            alias: alias.into(),
        });
        Ok(())
    }

    /// Snapshot of a tenant keystore.
    pub async fn keystore(&self, tenant_id: TenantId, keystore_name: &str) -> Option<KeyStore> {
        let tenants = self.tenants.read().await;
        tenants
            .get(&tenant_id)?
            .keystores
            .get(keystore_name)
            .map(|stored| stored.keystore.clone())
    }

    /// How many times keystores of this tenant were persisted.
    pub async fn persist_count(&self, tenant_id: TenantId) -> usize {
        let tenants = self.tenants.read().await;
        tenants.get(&tenant_id).map_or(0, |t| t.persist_count)
    }
}

impl KeyStoreManagers for InMemoryKeyStores {
    fn for_tenant(&self, tenant_id: TenantId) -> Arc<dyn KeyStoreManager> {
        Arc::new(InMemoryTenantKeyStores {
            tenant_id,
            tenants: Arc::clone(&self.tenants),
        })
    }
}

/// View of [`InMemoryKeyStores`] bound to one tenant.
struct InMemoryTenantKeyStores {
    tenant_id: TenantId,
    tenants: SharedTenants,
}

impl InMemoryTenantKeyStores {
    fn primary<'a>(&self, tenant: Option<&'a TenantKeyStores>) -> KeyStoreResult<(&'a StoredKeyStore, &'a str)> {
        let tenant = tenant.ok_or_else(|| self.no_primary())?;
        let primary = tenant.primary.as_ref().ok_or_else(|| self.no_primary())?;
        let stored = tenant
            .keystores
            .get(&primary.keystore_name)
            .ok_or_else(|| KeyStoreError::NotFound {
                name: primary.keystore_name.clone(),
            })?;
        Ok((stored, primary.alias.as_str()))
    }

    /// Run `f` on the stored keystore under the write lock.
    ///
    /// The keystore counts as persisted when `f` returns `Ok((_, true))`.
    async fn modify_keystore<T, F>(&self, keystore_name: &str, f: F) -> KeyStoreResult<T>
    where
        F: FnOnce(&mut KeyStore) -> KeyStoreResult<(T, bool)> + Send,
        T: Send,
    {
        let mut tenants = self.tenants.write().await;
        let tenant = tenants
            .get_mut(&self.tenant_id)
            .ok_or_else(|| KeyStoreError::NotFound {
                name: keystore_name.to_string(),
            })?;
        let stored = tenant
            .keystores
            .get_mut(keystore_name)
            .ok_or_else(|| KeyStoreError::NotFound {
                name: keystore_name.to_string(),
            })?;
        let (value, changed) = f(&mut stored.keystore)?;
        if changed {
            tenant.persist_count += 1;
            tracing::debug!(
                tenant_id = %self.tenant_id,
                keystore = %keystore_name,
                "Keystore persisted"
            );
        }
        Ok(value)
    }

    fn no_primary(&self) -> KeyStoreError {
        KeyStoreError::Config {
            detail: format!("no primary keystore configured for tenant {}", self.tenant_id),
        }
    }
}

fn lookup<'a>(tenant: Option<&'a TenantKeyStores>, keystore_name: &str) -> KeyStoreResult<&'a StoredKeyStore> {
    tenant
        .and_then(|t| t.keystores.get(keystore_name))
        .ok_or_else(|| KeyStoreError::NotFound {
            name: keystore_name.to_string(),
        })
}

#[async_trait]
impl KeyStoreManager for InMemoryTenantKeyStores {
    async fn get_private_key(&self, keystore_name: &str, alias: &str) -> KeyStoreResult<Option<Key>> {
        let tenants = self.tenants.read().await;
        let stored = lookup(tenants.get(&self.tenant_id), keystore_name)?;
        stored.keystore.key(alias, &stored.password)
    }

    async fn get_certificate(
        &self,
        keystore_name: &str,
        alias: &str,
    ) -> KeyStoreResult<Option<Certificate>> {
        let tenants = self.tenants.read().await;
        let stored = lookup(tenants.get(&self.tenant_id), keystore_name)?;
        Ok(stored.keystore.certificate(alias))
    }

    async fn get_default_private_key(&self) -> KeyStoreResult<Option<PKey<Private>>> {
        let tenants = self.tenants.read().await;
        let (stored, alias) = self.primary(tenants.get(&self.tenant_id))?;
        match stored.keystore.key(alias, &stored.password)? {
            None => Ok(None),
            Some(key) => key
                .into_asymmetric_private()
                .map(Some)
                .ok_or_else(|| KeyStoreError::Malformed {
                    name: stored.keystore.name().to_string(),
                    detail: format!("primary entry '{alias}' is not a private key"),
                }),
        }
    }

    async fn get_default_primary_certificate(&self) -> KeyStoreResult<Option<X509>> {
        let tenants = self.tenants.read().await;
        let (stored, alias) = self.primary(tenants.get(&self.tenant_id))?;
        match stored.keystore.certificate(alias) {
            None => Ok(None),
            Some(cert) => cert
                .into_x509()
                .map(Some)
                .ok_or_else(|| KeyStoreError::Malformed {
                    name: stored.keystore.name().to_string(),
                    detail: format!("primary entry '{alias}' is not an X.509 certificate"),
                }),
        }
    }

    async fn get_primary_keystore(&self) -> KeyStoreResult<KeyStore> {
        let tenants = self.tenants.read().await;
        let (stored, _) = self.primary(tenants.get(&self.tenant_id))?;
        Ok(stored.keystore.clone())
    }

    async fn get_keystore(&self, keystore_name: &str) -> KeyStoreResult<KeyStore> {
        let tenants = self.tenants.read().await;
        Ok(lookup(tenants.get(&self.tenant_id), keystore_name)?.keystore.clone())
    }

    async fn persist_keystore(&self, keystore_name: &str, keystore: KeyStore) -> KeyStoreResult<()> {
        self.modify_keystore(keystore_name, |stored| {
            *stored = keystore;
            Ok(((), true))
        })
        .await
    }

    async fn import_certificate_entry(
        &self,
        keystore_name: &str,
        alias: &str,
        cert: X509,
    ) -> KeyStoreResult<Option<KeyStoreEntry>> {
        self.modify_keystore(keystore_name, |keystore| {
            let previous = keystore.entry(alias).cloned();
            keystore.set_certificate_entry(alias, cert)?;
            Ok((previous, true))
        })
        .await
    }

    async fn revert_certificate_entry(
        &self,
        keystore_name: &str,
        alias: &str,
        imported: &X509,
        previous: Option<KeyStoreEntry>,
    ) -> KeyStoreResult<bool> {
        self.modify_keystore(keystore_name, |keystore| {
            if !keystore.holds_trusted_certificate(alias, imported) {
                return Ok((false, false));
            }
            match previous {
                Some(entry) => keystore.set_entry(alias, entry),
                None => {
                    keystore.delete_entry(alias);
                }
            }
            Ok((true, true))
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keystore::tests::self_signed;

    const TENANT: TenantId = TenantId::new(7);

    async fn stores_with_tenant_keystore() -> (InMemoryKeyStores, X509) {
        let (key, cert) = self_signed("example.com");
        let mut ks = KeyStore::new("example-com.jks", "JKS");
        ks.set_key_entry("example.com", key, "tenant-pw", vec![cert.clone()]);

        let stores = InMemoryKeyStores::new();
        stores.add_keystore(TENANT, ks, "tenant-pw").await;
        (stores, cert)
    }

    #[tokio::test]
    async fn test_get_private_key_and_certificate() {
        let (stores, cert) = stores_with_tenant_keystore().await;
        let manager = stores.for_tenant(TENANT);

        let key = manager
            .get_private_key("example-com.jks", "example.com")
            .await
            .unwrap();
        assert!(matches!(key, Some(Key::Private(_))));

        let found = manager
            .get_certificate("example-com.jks", "example.com")
            .await
            .unwrap()
            .and_then(Certificate::into_x509)
            .unwrap();
        assert_eq!(found.to_der().unwrap(), cert.to_der().unwrap());
    }

    #[tokio::test]
    async fn test_unknown_keystore_is_not_found() {
        let (stores, _) = stores_with_tenant_keystore().await;
        let manager = stores.for_tenant(TENANT);

        let err = manager.get_keystore("other.jks").await.unwrap_err();
        assert!(matches!(err, KeyStoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_tenant_isolation() {
        let (stores, _) = stores_with_tenant_keystore().await;
        let other = stores.for_tenant(TenantId::new(8));

        let err = other
            .get_private_key("example-com.jks", "example.com")
            .await
            .unwrap_err();
        assert!(matches!(err, KeyStoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_default_key_requires_primary() {
        let (stores, cert) = stores_with_tenant_keystore().await;
        let manager = stores.for_tenant(TENANT);

        let err = manager.get_default_private_key().await.unwrap_err();
        assert!(matches!(err, KeyStoreError::Config { .. }));

        stores
            .set_primary(TENANT, "example-com.jks", "example.com")
            .await
            .unwrap();
        assert!(manager.get_default_private_key().await.unwrap().is_some());
        let primary = manager.get_default_primary_certificate().await.unwrap().unwrap();
        assert_eq!(primary.to_der().unwrap(), cert.to_der().unwrap());
    }

    #[tokio::test]
    async fn test_persist_replaces_keystore() {
        let (stores, _) = stores_with_tenant_keystore().await;
        let manager = stores.for_tenant(TENANT);
        let (_, sp_cert) = self_signed("sp1");

        let mut ks = manager.get_keystore("example-com.jks").await.unwrap();
        ks.set_certificate_entry("sp1", sp_cert).unwrap();
        manager.persist_keystore("example-com.jks", ks).await.unwrap();

        let stored = stores.keystore(TENANT, "example-com.jks").await.unwrap();
        assert!(stored.contains_alias("sp1"));
        assert_eq!(stores.persist_count(TENANT).await, 1);
    }

    #[tokio::test]
    async fn test_snapshots_are_detached() {
        let (stores, _) = stores_with_tenant_keystore().await;
        let manager = stores.for_tenant(TENANT);
        let (_, sp_cert) = self_signed("sp1");

        let mut ks = manager.get_keystore("example-com.jks").await.unwrap();
        ks.set_certificate_entry("sp1", sp_cert).unwrap();

        let stored = stores.keystore(TENANT, "example-com.jks").await.unwrap();
        assert!(!stored.contains_alias("sp1"));
        assert_eq!(stores.persist_count(TENANT).await, 0);
    }

    #[tokio::test]
    async fn test_concurrent_imports_keep_every_entry() {
        let (stores, _) = stores_with_tenant_keystore().await;
        let manager = stores.for_tenant(TENANT);
        let (_, cert_a) = self_signed("sp-a");
        let (_, cert_b) = self_signed("sp-b");

        let (a, b) = tokio::join!(
            manager.import_certificate_entry("example-com.jks", "sp-a", cert_a.clone()),
            manager.import_certificate_entry("example-com.jks", "sp-b", cert_b.clone()),
        );
        assert!(a.unwrap().is_none());
        assert!(b.unwrap().is_none());

        let stored = stores.keystore(TENANT, "example-com.jks").await.unwrap();
        assert!(stored.holds_trusted_certificate("sp-a", &cert_a));
        assert!(stored.holds_trusted_certificate("sp-b", &cert_b));
        assert_eq!(stores.persist_count(TENANT).await, 2);
    }

    #[tokio::test]
    async fn test_import_into_key_alias_is_rejected() {
        let (stores, _) = stores_with_tenant_keystore().await;
        let manager = stores.for_tenant(TENANT);
        let (_, sp_cert) = self_signed("sp1");

        let err = manager
            .import_certificate_entry("example-com.jks", "example.com", sp_cert)
            .await
            .unwrap_err();
        assert!(matches!(err, KeyStoreError::AliasConflict { .. }));
        assert_eq!(stores.persist_count(TENANT).await, 0);
    }

    #[tokio::test]
    async fn test_revert_restores_previous_entry() {
        let (stores, _) = stores_with_tenant_keystore().await;
        let manager = stores.for_tenant(TENANT);
        let (_, old_cert) = self_signed("sp1-old");
        let (_, new_cert) = self_signed("sp1-new");

        manager
            .import_certificate_entry("example-com.jks", "sp1", old_cert.clone())
            .await
            .unwrap();
        let previous = manager
            .import_certificate_entry("example-com.jks", "sp1", new_cert.clone())
            .await
            .unwrap();
        assert!(previous.is_some());

        let reverted = manager
            .revert_certificate_entry("example-com.jks", "sp1", &new_cert, previous)
            .await
            .unwrap();
        assert!(reverted);
        let stored = stores.keystore(TENANT, "example-com.jks").await.unwrap();
        assert!(stored.holds_trusted_certificate("sp1", &old_cert));
    }

    #[tokio::test]
    async fn test_revert_skips_alias_overwritten_since_import() {
        let (stores, _) = stores_with_tenant_keystore().await;
        let manager = stores.for_tenant(TENANT);
        let (_, mine) = self_signed("sp1-mine");
        let (_, theirs) = self_signed("sp1-theirs");

        let previous = manager
            .import_certificate_entry("example-com.jks", "sp1", mine.clone())
            .await
            .unwrap();
        manager
            .import_certificate_entry("example-com.jks", "sp1", theirs.clone())
            .await
            .unwrap();

        let reverted = manager
            .revert_certificate_entry("example-com.jks", "sp1", &mine, previous)
            .await
            .unwrap();
        assert!(!reverted);
        let stored = stores.keystore(TENANT, "example-com.jks").await.unwrap();
        assert!(stored.holds_trusted_certificate("sp1", &theirs));
    }
}
