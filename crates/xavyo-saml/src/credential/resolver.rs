//! Tenant signing credential resolution
//!
//! Resolution order:
//! 1. super tenant with a fully configured dedicated signing keystore
//! 2. super tenant primary keystore
//! 3. any other tenant: its own keystore, keyed by the tenant domain

use openssl::pkey::{PKey, Private};
use openssl::x509::X509;
use std::sync::Arc;
use xavyo_core::is_super_tenant_domain;
use xavyo_keystore::{
    tenant_keystore_name, Certificate, Key, KeyStoreError, KeyStoreManager, KeyStoreManagers,
    SigningKeyStoreConfig, SigningKeyStoreSettings,
};

use super::cell::SignKeyStoreCell;
use super::signing::SigningCredential;
use crate::config::SamlConfig;
use crate::error::{CredentialError, CredentialResult};
use crate::tenant::TenantDirectory;

/// Key and certificate found by one resolution path, either possibly absent.
type Resolved = (Option<PKey<Private>>, Option<X509>);

/// Resolves the signing credential of a tenant.
#[derive(Clone)]
pub struct CredentialResolver {
    tenants: Arc<dyn TenantDirectory>,
    keystores: Arc<dyn KeyStoreManagers>,
    signing_keystore: SigningKeyStoreConfig,
    keystore_extension: String,
    sign_keystore_cell: Arc<SignKeyStoreCell>,
}

impl CredentialResolver {
    /// Create a resolver using the process-wide signing keystore cache.
    pub fn new(
        tenants: Arc<dyn TenantDirectory>,
        keystores: Arc<dyn KeyStoreManagers>,
        config: &SamlConfig,
    ) -> Self {
        Self {
            tenants,
            keystores,
            signing_keystore: config.signing_keystore.clone(),
            keystore_extension: config.tenant_keystore_extension.clone(),
            sign_keystore_cell: SignKeyStoreCell::global(),
        }
    }

    /// Use a dedicated signing keystore cache instead of the global one.
    #[must_use]
    pub fn with_sign_keystore_cell(mut self, cell: Arc<SignKeyStoreCell>) -> Self {
        self.sign_keystore_cell = cell;
        self
    }

    /// Resolve the signing credential for `tenant_domain`.
    pub async fn resolve(&self, tenant_domain: &str) -> CredentialResult<SigningCredential> {
        let tenant_id = self
            .tenants
            .tenant_id_for_domain(tenant_domain)
            .await
            .map_err(|source| CredentialError::TenantLookup {
                tenant_domain: tenant_domain.to_string(),
                source,
            })?;
        let manager = self.keystores.for_tenant(tenant_id);

        let (private_key, certificate) = if is_super_tenant_domain(tenant_domain) {
            match self.signing_keystore.settings() {
                Some(settings) => {
                    tracing::debug!(
                        tenant_domain = %tenant_domain,
                        "Initializing key data for super tenant using separate sign keystore"
                    );
                    self.signing_keystore_credential(&settings).await?
                }
                None => {
                    tracing::debug!(
                        tenant_domain = %tenant_domain,
                        missing = ?self.signing_keystore.missing_settings(),
                        "Sign keystore not configured, using primary keystore"
                    );
                    Self::primary_keystore_credential(manager.as_ref(), tenant_domain).await?
                }
            }
        } else {
            self.tenant_keystore_credential(manager.as_ref(), tenant_domain)
                .await?
        };

        let private_key = private_key.ok_or_else(|| CredentialError::MissingPrivateKey {
            tenant_domain: tenant_domain.to_string(),
        })?;
        let certificate = certificate.ok_or_else(|| CredentialError::MissingCertificate {
            tenant_domain: tenant_domain.to_string(),
        })?;

        SigningCredential::from_key_and_certificate(private_key, certificate)
    }

    async fn signing_keystore_credential(
        &self,
        settings: &SigningKeyStoreSettings,
    ) -> CredentialResult<Resolved> {
        let keystore = self
            .sign_keystore_cell
            .get_or_load(settings)
            .await
            .map_err(CredentialError::SigningKeyStore)?;

        let alias = settings.key_alias.as_str();
        let private_key = match keystore
            .key(alias, &settings.key_password)
            .map_err(CredentialError::SigningKeyStore)?
        {
            None => None,
            Some(key) => Some(key.clone().into_asymmetric_private().ok_or_else(|| {
                CredentialError::InvalidCredentialType {
                    alias: alias.to_string(),
                    detail: format!(
                        "configured signing keystore private key is invalid ({})",
                        key.algorithm()
                    ),
                }
            })?),
        };

        let certificate = match keystore.certificate(alias) {
            None => None,
            Some(Certificate::X509(cert)) => Some(cert),
            Some(other) => {
                return Err(CredentialError::InvalidCredentialType {
                    alias: alias.to_string(),
                    detail: format!(
                        "configured signing keystore certificate is {}, not X.509",
                        other.cert_type()
                    ),
                })
            }
        };

        Ok((private_key, certificate))
    }

    async fn primary_keystore_credential(
        manager: &dyn KeyStoreManager,
        tenant_domain: &str,
    ) -> CredentialResult<Resolved> {
        let wrap = |source| CredentialError::TenantKeyStore {
            tenant_domain: tenant_domain.to_string(),
            source,
        };
        let private_key = manager.get_default_private_key().await.map_err(wrap)?;
        let certificate = manager
            .get_default_primary_certificate()
            .await
            .map_err(wrap)?;
        Ok((private_key, certificate))
    }

    async fn tenant_keystore_credential(
        &self,
        manager: &dyn KeyStoreManager,
        tenant_domain: &str,
    ) -> CredentialResult<Resolved> {
        let keystore_name = tenant_keystore_name(tenant_domain, &self.keystore_extension);
        let wrap = |source| CredentialError::TenantKeyStore {
            tenant_domain: tenant_domain.to_string(),
            source,
        };

        tracing::debug!(
            tenant_domain = %tenant_domain,
            keystore = %keystore_name,
            "Resolving signing credential from tenant keystore"
        );

        let private_key = match manager
            .get_private_key(&keystore_name, tenant_domain)
            .await
            .map_err(wrap)?
        {
            None => None,
            Some(Key::Private(key)) => Some(key),
            Some(Key::Secret(_)) => {
                return Err(wrap(KeyStoreError::Malformed {
                    name: keystore_name,
                    detail: format!("entry '{tenant_domain}' is not a private key"),
                }))
            }
        };

        let certificate = match manager
            .get_certificate(&keystore_name, tenant_domain)
            .await
            .map_err(wrap)?
        {
            None => None,
            Some(Certificate::X509(cert)) => Some(cert),
            Some(other) => {
                return Err(wrap(KeyStoreError::Malformed {
                    name: keystore_name,
                    detail: format!(
                        "entry '{tenant_domain}' holds a {} certificate, not X.509",
                        other.cert_type()
                    ),
                }))
            }
        };

        Ok((private_key, certificate))
    }
}
