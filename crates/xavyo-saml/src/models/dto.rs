//! Admin-facing service provider transfer objects

use base64::{engine::general_purpose::STANDARD, Engine};
use openssl::x509::X509;
use serde::{Deserialize, Serialize};

use super::normalize::{external_name_id_format, generate_attribute_index, internal_name_id_format, normalize};
use super::record::{ServiceProviderRecord, ISSUER_QUALIFIER_SEPARATOR};
use crate::error::{RegistrationError, RegistrationResult};

/// Service provider as submitted by, and returned to, admin clients.
///
/// `name_id_format` is `/`-delimited here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceProviderDto {
    pub issuer: String,
    pub issuer_qualifier: Option<String>,
    pub assertion_consumer_urls: Vec<String>,
    pub default_assertion_consumer_url: Option<String>,
    pub cert_alias: Option<String>,
    /// PEM or base64 DER certificate.
    pub certificate_content: Option<String>,
    pub do_single_logout: bool,
    pub do_front_channel_logout: bool,
    pub front_channel_logout_binding: Option<String>,
    pub slo_response_url: Option<String>,
    pub slo_request_url: Option<String>,
    pub login_page_url: Option<String>,
    pub do_sign_response: bool,
    pub do_sign_assertions: bool,
    pub name_id_claim_uri: Option<String>,
    pub name_id_format: Option<String>,
    pub signing_algorithm_uri: Option<String>,
    pub digest_algorithm_uri: Option<String>,
    pub assertion_encryption_algorithm_uri: Option<String>,
    pub key_encryption_algorithm_uri: Option<String>,
    pub assertion_query_request_profile_enabled: bool,
    pub supported_assertion_query_request_types: Option<String>,
    pub enable_saml2_artifact_binding: bool,
    pub do_validate_signature_in_artifact_resolve: bool,
    pub enable_attribute_profile: bool,
    pub attribute_consuming_service_index: Option<String>,
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

/// Service providers of a tenant as listed to admin clients.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceProviderInfo {
    pub service_providers: Vec<ServiceProviderDto>,
    /// True for the super tenant.
    pub tenant_zero: bool,
}

/// Reject blank issuers and issuers containing the qualifier separator.
pub(crate) fn validate_issuer(issuer: &str) -> RegistrationResult<()> {
    if issuer.trim().is_empty() {
        return Err(RegistrationError::InvalidRequest(
            "A value for the Issuer is mandatory.".to_string(),
        ));
    }
    if issuer.contains(ISSUER_QUALIFIER_SEPARATOR) {
        return Err(RegistrationError::InvalidRequest(
            "'@' is a reserved character. Cannot be used for Service Provider Entity ID."
                .to_string(),
        ));
    }
    Ok(())
}

/// Reject qualifiers containing the qualifier separator.
pub(crate) fn validate_issuer_qualifier(qualifier: Option<&str>) -> RegistrationResult<()> {
    match qualifier {
        Some(q) if !q.trim().is_empty() && q.contains(ISSUER_QUALIFIER_SEPARATOR) => {
            Err(RegistrationError::InvalidRequest(
                "'@' is a reserved character. Cannot be used for Service Provider Qualifier Value."
                    .to_string(),
            ))
        }
        _ => Ok(()),
    }
}

/// Decode a PEM or base64 DER certificate.
pub(crate) fn decode_certificate(content: &str) -> Result<X509, String> {
    let content = content.trim();
    if content.starts_with("-----BEGIN") {
        return X509::from_pem(content.as_bytes()).map_err(|e| e.to_string());
    }
    let compact: String = content.chars().filter(|c| !c.is_whitespace()).collect();
    let der = STANDARD.decode(compact).map_err(|e| e.to_string())?;
    X509::from_der(&der).map_err(|e| e.to_string())
}

impl ServiceProviderDto {
    /// Validate and convert into a normalized record.
    ///
    /// With the attribute profile enabled a missing index is generated; with
    /// it disabled the index is cleared and attributes-by-default turned off.
    pub fn into_record(self) -> RegistrationResult<ServiceProviderRecord> {
        validate_issuer(&self.issuer)?;
        validate_issuer_qualifier(self.issuer_qualifier.as_deref())?;

        let certificate = match self.certificate_content.as_deref().map(str::trim) {
            Some(content) if !content.is_empty() => {
                let cert = decode_certificate(content).map_err(|e| {
                    RegistrationError::InvalidRequest(format!("Invalid certificate content: {e}"))
                })?;
                let pem = cert.to_pem().map_err(|e| {
                    RegistrationError::InvalidRequest(format!("Invalid certificate content: {e}"))
                })?;
                Some(String::from_utf8_lossy(&pem).into_owned())
            }
            _ => None,
        };

        let (attribute_consuming_service_index, enable_attributes_by_default) =
            if self.enable_attribute_profile {
                let index = self
                    .attribute_consuming_service_index
                    .filter(|i| !i.trim().is_empty())
                    .unwrap_or_else(generate_attribute_index);
                (index, self.enable_attributes_by_default)
            } else {
                if self.enable_attributes_by_default {
                    tracing::warn!(
                        issuer = %self.issuer,
                        "Enable Attribute Profile must be selected to activate it by default. \
                         EnableAttributesByDefault will be disabled."
                    );
                }
                (String::new(), false)
            };

        let mut record = ServiceProviderRecord {
            issuer: self.issuer,
            issuer_qualifier: self.issuer_qualifier,
            assertion_consumer_urls: self.assertion_consumer_urls,
            default_assertion_consumer_url: self.default_assertion_consumer_url,
            cert_alias: self.cert_alias,
            certificate,
            do_single_logout: self.do_single_logout,
            do_front_channel_logout: self.do_front_channel_logout,
            front_channel_logout_binding: self.front_channel_logout_binding,
            slo_response_url: self.slo_response_url,
            slo_request_url: self.slo_request_url,
            login_page_url: self.login_page_url,
            do_sign_response: self.do_sign_response,
            do_sign_assertions: true,
            name_id_claim_uri: self.name_id_claim_uri,
            name_id_format: internal_name_id_format(self.name_id_format.as_deref()),
            signing_algorithm_uri: self.signing_algorithm_uri,
            digest_algorithm_uri: self.digest_algorithm_uri,
            assertion_encryption_algorithm_uri: self.assertion_encryption_algorithm_uri,
            key_encryption_algorithm_uri: self.key_encryption_algorithm_uri,
            assertion_query_request_profile_enabled: self.assertion_query_request_profile_enabled,
            supported_assertion_query_request_types: self.supported_assertion_query_request_types,
            enable_saml2_artifact_binding: self.enable_saml2_artifact_binding,
            do_validate_signature_in_artifact_resolve: self
                .do_validate_signature_in_artifact_resolve,
            attribute_consuming_service_index,
            enable_attributes_by_default,
            requested_claims: self.requested_claims,
            idp_init_sso_enabled: self.idp_init_sso_enabled,
            idp_init_slo_enabled: self.idp_init_slo_enabled,
            idp_init_slo_return_to_urls: self.idp_init_slo_return_to_urls,
            do_enable_encrypted_assertion: self.do_enable_encrypted_assertion,
            do_validate_signature_in_requests: self.do_validate_signature_in_requests,
            idp_entity_id_alias: self.idp_entity_id_alias,
            ..ServiceProviderRecord::default()
        };
        if !self.requested_audiences.is_empty() {
            record.requested_audiences = self.requested_audiences;
        }
        if !self.requested_recipients.is_empty() {
            record.requested_recipients = self.requested_recipients;
        }

        Ok(normalize(record))
    }
}

impl ServiceProviderRecord {
    /// External view of this record.
    #[must_use]
    pub fn to_dto(&self) -> ServiceProviderDto {
        let attribute_profile = self.attribute_profile_enabled();
        ServiceProviderDto {
            issuer: self.issuer.clone(),
            issuer_qualifier: self.issuer_qualifier.clone(),
            assertion_consumer_urls: self.assertion_consumer_urls.clone(),
            default_assertion_consumer_url: self.default_assertion_consumer_url.clone(),
            cert_alias: self.cert_alias.clone(),
            certificate_content: self.certificate.clone(),
            do_single_logout: self.do_single_logout,
            do_front_channel_logout: self.do_front_channel_logout,
            front_channel_logout_binding: self.front_channel_logout_binding.clone(),
            slo_response_url: self.slo_response_url.clone(),
            slo_request_url: self.slo_request_url.clone(),
            login_page_url: self.login_page_url.clone(),
            do_sign_response: self.do_sign_response,
            do_sign_assertions: self.do_sign_assertions,
            name_id_claim_uri: self.name_id_claim_uri.clone(),
            name_id_format: Some(external_name_id_format(&self.name_id_format)),
            signing_algorithm_uri: self.signing_algorithm_uri.clone(),
            digest_algorithm_uri: self.digest_algorithm_uri.clone(),
            assertion_encryption_algorithm_uri: self.assertion_encryption_algorithm_uri.clone(),
            key_encryption_algorithm_uri: self.key_encryption_algorithm_uri.clone(),
            assertion_query_request_profile_enabled: self.assertion_query_request_profile_enabled,
            supported_assertion_query_request_types: self
                .supported_assertion_query_request_types
                .clone(),
            enable_saml2_artifact_binding: self.enable_saml2_artifact_binding,
            do_validate_signature_in_artifact_resolve: self
                .do_validate_signature_in_artifact_resolve,
            enable_attribute_profile: attribute_profile,
            attribute_consuming_service_index: attribute_profile
                .then(|| self.attribute_consuming_service_index.clone()),
            enable_attributes_by_default: self.enable_attributes_by_default,
            requested_audiences: self.requested_audiences.clone(),
            requested_recipients: self.requested_recipients.clone(),
            requested_claims: self.requested_claims.clone(),
            idp_init_sso_enabled: self.idp_init_sso_enabled,
            idp_init_slo_enabled: self.idp_init_slo_enabled,
            idp_init_slo_return_to_urls: self.idp_init_slo_return_to_urls.clone(),
            do_enable_encrypted_assertion: self.do_enable_encrypted_assertion,
            do_validate_signature_in_requests: self.do_validate_signature_in_requests,
            idp_entity_id_alias: self.idp_entity_id_alias.clone(),
        }
    }
}
