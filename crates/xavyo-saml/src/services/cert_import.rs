//! Service provider certificate import
//!
//! The super tenant keystore is never written: an existing alias for the
//! exact certificate is looked up instead. Other tenants get a trusted
//! certificate entry aliased by the issuer, which can be rolled back if the
//! registration itself fails.

use openssl::x509::X509;
use xavyo_core::TenantContext;
use xavyo_keystore::{tenant_keystore_name, KeyStoreEntry, KeyStoreError, KeyStoreManager};

use crate::error::{RegistrationError, RegistrationResult};
use crate::models::ServiceProviderRecord;

/// A keystore write that can be undone.
#[derive(Debug)]
pub(crate) struct ImportedCertificate {
    keystore_name: String,
    alias: String,
    certificate: X509,
    previous: Option<KeyStoreEntry>,
}

/// Import the record's certificate and set `cert_alias` accordingly.
///
/// Returns the undo handle for tenant keystore writes.
pub(crate) async fn import_certificate(
    manager: &dyn KeyStoreManager,
    tenant: &TenantContext,
    keystore_extension: &str,
    record: &mut ServiceProviderRecord,
    cert: &X509,
) -> RegistrationResult<Option<ImportedCertificate>> {
    let issuer = record.issuer.clone();
    let wrap = |source: KeyStoreError| RegistrationError::CertificateImport {
        issuer: issuer.clone(),
        source,
    };

    if tenant.is_super_tenant() {
        let primary = manager.get_primary_keystore().await.map_err(wrap)?;
        // Admins add super tenant SP certificates to the keystore file by hand.
        record.cert_alias = primary
            .certificate_alias(cert)
            .filter(|alias| !alias.trim().is_empty());
        tracing::debug!(
            issuer = %issuer,
            cert_alias = ?record.cert_alias,
            "Resolved SP certificate alias in primary keystore"
        );
        return Ok(None);
    }

    let keystore_name = tenant_keystore_name(tenant.tenant_domain(), keystore_extension);
    let previous = manager
        .import_certificate_entry(&keystore_name, &issuer, cert.clone())
        .await
        .map_err(wrap)?;

    record.cert_alias = Some(issuer.clone());
    tracing::debug!(
        tenant_domain = %tenant.tenant_domain(),
        keystore = %keystore_name,
        issuer = %issuer,
        "Imported SP certificate into tenant keystore"
    );

    Ok(Some(ImportedCertificate {
        keystore_name,
        alias: issuer,
        certificate: cert.clone(),
        previous,
    }))
}

/// Restore the keystore entry replaced by [`import_certificate`].
///
/// An alias that was overwritten since the import is left alone. Failures
/// are logged; the registration error that triggered the rollback is what
/// the caller reports.
pub(crate) async fn rollback_import(manager: &dyn KeyStoreManager, imported: ImportedCertificate) {
    let ImportedCertificate {
        keystore_name,
        alias,
        certificate,
        previous,
    } = imported;

    let result = manager
        .revert_certificate_entry(&keystore_name, &alias, &certificate, previous)
        .await;

    match result {
        Ok(true) => tracing::debug!(
            keystore = %keystore_name,
            alias = %alias,
            "Rolled back SP certificate import"
        ),
        Ok(false) => tracing::debug!(
            keystore = %keystore_name,
            alias = %alias,
            "SP certificate entry replaced since import, rollback skipped"
        ),
        Err(e) => tracing::error!(
            keystore = %keystore_name,
            alias = %alias,
            error = %e,
            "Failed to roll back SP certificate import"
        ),
    }
}
