//! Shared fixtures for xavyo-saml integration tests.

#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;

use openssl::asn1::Asn1Time;
use openssl::bn::{BigNum, MsbOption};
use openssl::hash::MessageDigest;
use openssl::nid::Nid;
use openssl::pkcs12::Pkcs12;
use openssl::pkey::{PKey, Private};
use openssl::rsa::Rsa;
use openssl::x509::{X509Builder, X509NameBuilder, X509};
use xavyo_core::{TenantContext, TenantId, SUPER_TENANT_DOMAIN};
use xavyo_keystore::{InMemoryKeyStores, KeyStore, SigningKeyStoreConfig};
use xavyo_saml::{
    FileServiceProviderSet, InMemoryAuditSink, InMemoryServiceProviderStore,
    InMemoryTenantDirectory, SamlAdminServices, SamlConfig, ServiceProviderRecord,
};

pub const TENANT_DOMAIN: &str = "example.com";
pub const TENANT_KEYSTORE: &str = "example-com.jks";
pub const TENANT_KEYSTORE_PASSWORD: &str = "tenant-secret";

pub const PRIMARY_KEYSTORE: &str = "wso2carbon.jks";
pub const PRIMARY_ALIAS: &str = "wso2carbon";
pub const PRIMARY_PASSWORD: &str = "wso2carbon";

pub const SIGN_KEYSTORE_ALIAS: &str = "saml-signer";
pub const SIGN_KEYSTORE_PASSWORD: &str = "sign-secret";

/// Static issuer loaded "from the file system".
pub const STATIC_ISSUER: &str = "travelocity.com";

pub fn tenant_id() -> TenantId {
    TenantId::new(1)
}

pub fn tenant_context() -> TenantContext {
    TenantContext::new(TENANT_DOMAIN, tenant_id())
}

/// A fresh RSA key and self-signed certificate.
pub fn self_signed(cn: &str) -> (PKey<Private>, X509) {
    let key = PKey::from_rsa(Rsa::generate(2048).unwrap()).unwrap();
    let mut name = X509NameBuilder::new().unwrap();
    name.append_entry_by_nid(Nid::COMMONNAME, cn).unwrap();
    let name = name.build();

    let mut serial = BigNum::new().unwrap();
    serial.rand(64, MsbOption::MAYBE_ZERO, false).unwrap();

    let mut builder = X509Builder::new().unwrap();
    builder.set_version(2).unwrap();
    builder
        .set_serial_number(&serial.to_asn1_integer().unwrap())
        .unwrap();
    builder.set_subject_name(&name).unwrap();
    builder.set_issuer_name(&name).unwrap();
    builder.set_pubkey(&key).unwrap();
    builder
        .set_not_before(&Asn1Time::days_from_now(0).unwrap())
        .unwrap();
    builder
        .set_not_after(&Asn1Time::days_from_now(365).unwrap())
        .unwrap();
    builder.sign(&key, MessageDigest::sha256()).unwrap();
    (key, builder.build())
}

pub fn certificate_pem(cert: &X509) -> String {
    String::from_utf8(cert.to_pem().unwrap()).unwrap()
}

/// Base64 DER body as found in metadata `X509Certificate` elements.
pub fn certificate_base64(cert: &X509) -> String {
    use base64::{engine::general_purpose::STANDARD, Engine};
    STANDARD.encode(cert.to_der().unwrap())
}

/// Write a PKCS#12 signing keystore and return its certificate.
pub fn write_signing_keystore(path: &Path) -> X509 {
    let (key, cert) = self_signed("saml-signer");
    let p12 = Pkcs12::builder()
        .name(SIGN_KEYSTORE_ALIAS)
        .pkey(&key)
        .cert(&cert)
        .build2(SIGN_KEYSTORE_PASSWORD)
        .unwrap();
    std::fs::write(path, p12.to_der().unwrap()).unwrap();
    cert
}

/// Fully specified dedicated signing keystore configuration.
pub fn signing_keystore_config(path: &Path) -> SigningKeyStoreConfig {
    SigningKeyStoreConfig {
        location: Some(path.display().to_string()),
        store_type: Some("PKCS12".to_string()),
        store_password: Some(SIGN_KEYSTORE_PASSWORD.to_string()),
        key_alias: Some(SIGN_KEYSTORE_ALIAS.to_string()),
        key_password: Some(SIGN_KEYSTORE_PASSWORD.to_string()),
    }
}

/// Keystores and tenants shared by the suites.
pub struct KeyStoreFixture {
    pub keystores: InMemoryKeyStores,
    pub tenants: InMemoryTenantDirectory,
    pub primary_cert: X509,
    pub tenant_cert: X509,
}

/// Super tenant primary keystore plus a keystore for `example.com` holding
/// its signing key under the domain alias.
pub async fn keystore_fixture() -> KeyStoreFixture {
    let keystores = InMemoryKeyStores::new();

    let (primary_key, primary_cert) = self_signed(SUPER_TENANT_DOMAIN);
    let mut primary = KeyStore::new(PRIMARY_KEYSTORE, "JKS");
    primary.set_key_entry(
        PRIMARY_ALIAS,
        primary_key,
        PRIMARY_PASSWORD,
        vec![primary_cert.clone()],
    );
    keystores
        .add_keystore(TenantId::SUPER, primary, PRIMARY_PASSWORD)
        .await;
    keystores
        .set_primary(TenantId::SUPER, PRIMARY_KEYSTORE, PRIMARY_ALIAS)
        .await
        .unwrap();

    let (tenant_key, tenant_cert) = self_signed(TENANT_DOMAIN);
    let mut tenant = KeyStore::new(TENANT_KEYSTORE, "JKS");
    tenant.set_key_entry(
        TENANT_DOMAIN,
        tenant_key,
        TENANT_KEYSTORE_PASSWORD,
        vec![tenant_cert.clone()],
    );
    keystores
        .add_keystore(tenant_id(), tenant, TENANT_KEYSTORE_PASSWORD)
        .await;

    let tenants = InMemoryTenantDirectory::new();
    tenants.register(TENANT_DOMAIN, tenant_id()).await;

    KeyStoreFixture {
        keystores,
        tenants,
        primary_cert,
        tenant_cert,
    }
}

/// Registration collaborators with in-memory implementations.
pub struct RegistrationFixture {
    pub keys: KeyStoreFixture,
    pub store: InMemoryServiceProviderStore,
    pub audit: InMemoryAuditSink,
    pub services: SamlAdminServices,
}

pub async fn registration_fixture(config: SamlConfig) -> RegistrationFixture {
    let keys = keystore_fixture().await;
    let store = InMemoryServiceProviderStore::new();
    let audit = InMemoryAuditSink::new();
    let statics = FileServiceProviderSet::from_records([ServiceProviderRecord::new(STATIC_ISSUER)]);

    let services = SamlAdminServices::new(
        Arc::new(store.clone()),
        Arc::new(statics),
        Arc::new(keys.keystores.clone()),
        config,
    )
    .with_audit_sink(Arc::new(audit.clone()));

    RegistrationFixture {
        keys,
        store,
        audit,
        services,
    }
}

/// SP metadata with an optional signing certificate.
pub fn sp_metadata(entity_id: &str, certificate_base64: Option<&str>) -> String {
    let key_descriptor = certificate_base64
        .map(|cert| {
            format!(
                r#"<md:KeyDescriptor use="signing">
      <ds:KeyInfo xmlns:ds="http://www.w3.org/2000/09/xmldsig#">
        <ds:X509Data><ds:X509Certificate>{cert}</ds:X509Certificate></ds:X509Data>
      </ds:KeyInfo>
    </md:KeyDescriptor>"#
            )
        })
        .unwrap_or_default();

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<md:EntityDescriptor xmlns:md="urn:oasis:names:tc:SAML:2.0:metadata" entityID="{entity_id}">
  <md:SPSSODescriptor AuthnRequestsSigned="false" WantAssertionsSigned="true" protocolSupportEnumeration="urn:oasis:names:tc:SAML:2.0:protocol">
    {key_descriptor}
    <md:NameIDFormat>urn:oasis:names:tc:SAML:1.1:nameid-format:emailAddress</md:NameIDFormat>
    <md:AssertionConsumerService Binding="urn:oasis:names:tc:SAML:2.0:bindings:HTTP-POST" Location="https://sp.example.org/acs" index="0" isDefault="true"/>
  </md:SPSSODescriptor>
</md:EntityDescriptor>"#
    )
}
