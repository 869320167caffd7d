//! Persisted service provider configuration

use openssl::error::ErrorStack;
use openssl::x509::X509;
use serde::{Deserialize, Serialize};

/// Reserved separator between issuer and qualifier.
pub const ISSUER_QUALIFIER_SEPARATOR: char = '@';

/// Effective issuer: `issuer`, or `issuer@qualifier` when a qualifier is set.
#[must_use]
pub fn issuer_with_qualifier(issuer: &str, qualifier: Option<&str>) -> String {
    match qualifier.map(str::trim).filter(|q| !q.is_empty()) {
        Some(qualifier) => format!("{issuer}{ISSUER_QUALIFIER_SEPARATOR}{qualifier}"),
        None => issuer.to_string(),
    }
}

/// SAML SSO service provider configuration.
///
/// Records are keyed by their effective issuer within a tenant. The name-ID
/// format is stored in its `:`-delimited form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceProviderRecord {
    pub issuer: String,
    pub issuer_qualifier: Option<String>,
    pub assertion_consumer_urls: Vec<String>,
    pub default_assertion_consumer_url: Option<String>,
    /// Alias of the SP certificate in the tenant keystore.
    pub cert_alias: Option<String>,
    /// SP certificate in PEM form.
    pub certificate: Option<String>,
    pub do_single_logout: bool,
    pub do_front_channel_logout: bool,
    pub front_channel_logout_binding: Option<String>,
    pub slo_response_url: Option<String>,
    pub slo_request_url: Option<String>,
    pub login_page_url: Option<String>,
    pub do_sign_response: bool,
    pub do_sign_assertions: bool,
    pub name_id_claim_uri: Option<String>,
    pub name_id_format: String,
    pub signing_algorithm_uri: Option<String>,
    pub digest_algorithm_uri: Option<String>,
    pub assertion_encryption_algorithm_uri: Option<String>,
    pub key_encryption_algorithm_uri: Option<String>,
    pub assertion_query_request_profile_enabled: bool,
    pub supported_assertion_query_request_types: Option<String>,
    pub enable_saml2_artifact_binding: bool,
    pub do_validate_signature_in_artifact_resolve: bool,
    /// Empty when the attribute profile is disabled.
    pub attribute_consuming_service_index: String,
    pub enable_attributes_by_default: bool,
    pub requested_audiences: Vec<String>,
    pub requested_recipients: Vec<String>,
    pub requested_claims: Vec<String>,
    pub idp_init_sso_enabled: bool,
    pub idp_init_slo_enabled: bool,
    pub idp_init_slo_return_to_urls: Vec<String>,
    pub do_enable_encrypted_assertion: bool,
    pub do_validate_signature_in_requests: bool,
    pub idp_entity_id_alias: Option<String>,
}

impl ServiceProviderRecord {
    /// Create a record with only the issuer set.
    pub fn new(issuer: impl Into<String>) -> Self {
        Self {
            issuer: issuer.into(),
            ..Self::default()
        }
    }

    /// The key this record is stored under.
    #[must_use]
    pub fn effective_issuer(&self) -> String {
        issuer_with_qualifier(&self.issuer, self.issuer_qualifier.as_deref())
    }

    /// Parse the stored PEM certificate.
    pub fn x509_certificate(&self) -> Result<Option<X509>, ErrorStack> {
        self.certificate
            .as_deref()
            .map(|pem| X509::from_pem(pem.as_bytes()))
            .transpose()
    }

    /// Store `cert` in PEM form.
    pub fn set_certificate(&mut self, cert: &X509) -> Result<(), ErrorStack> {
        let pem = cert.to_pem()?;
        self.certificate = Some(String::from_utf8_lossy(&pem).into_owned());
        Ok(())
    }

    /// Whether the record has an attribute consuming service.
    #[must_use]
    pub fn attribute_profile_enabled(&self) -> bool {
        !self.attribute_consuming_service_index.is_empty()
    }
}
