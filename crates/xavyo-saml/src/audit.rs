//! Audit events for service provider mutations
//!
//! Events are emitted after a successful add, update, or remove. Delivery
//! failures never fail the mutation itself.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::sync::RwLock;

use crate::error::AuditError;
use crate::models::ServiceProviderRecord;

/// Kind of principal that initiated an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InitiatorType {
    User,
}

/// Kind of object an event is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetType {
    Application,
}

/// Mutation performed on a service provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpAuditAction {
    Create,
    Update,
    Delete,
}

impl std::fmt::Display for SpAuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SpAuditAction::Create => write!(f, "create-saml-application"),
            SpAuditAction::Update => write!(f, "update-saml-application"),
            SpAuditAction::Delete => write!(f, "delete-saml-application"),
        }
    }
}

/// A service provider audit event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    pub initiator_id: String,
    pub initiator_type: InitiatorType,
    /// Issuer of the affected service provider
    pub target_id: String,
    pub target_type: TargetType,
    pub action: SpAuditAction,
    /// Public configuration snapshot, absent for deletes
    pub data: Option<Value>,
    pub timestamp: DateTime<Utc>,
}

impl AuditEvent {
    pub fn new(
        initiator_id: impl Into<String>,
        target_id: impl Into<String>,
        action: SpAuditAction,
        data: Option<Value>,
    ) -> Self {
        Self {
            initiator_id: initiator_id.into(),
            initiator_type: InitiatorType::User,
            target_id: target_id.into(),
            target_type: TargetType::Application,
            action,
            data,
            timestamp: Utc::now(),
        }
    }
}

/// Public fields of a record for audit payloads.
///
/// Certificate content is never included.
#[must_use]
pub fn sp_audit_data(record: &ServiceProviderRecord) -> Value {
    json!({
        "issuer": record.issuer,
        "issuerQualifier": record.issuer_qualifier,
        "assertionConsumerUrls": record.assertion_consumer_urls,
        "defaultAssertionConsumerUrl": record.default_assertion_consumer_url,
        "certAlias": record.cert_alias,
        "doSingleLogout": record.do_single_logout,
        "doFrontChannelLogout": record.do_front_channel_logout,
        "frontChannelLogoutBinding": record.front_channel_logout_binding,
        "sloResponseUrl": record.slo_response_url,
        "sloRequestUrl": record.slo_request_url,
        "loginPageUrl": record.login_page_url,
        "doSignResponse": record.do_sign_response,
        "doSignAssertions": record.do_sign_assertions,
        "nameIdClaimUri": record.name_id_claim_uri,
        "nameIdFormat": record.name_id_format,
        "signingAlgorithmUri": record.signing_algorithm_uri,
        "digestAlgorithmUri": record.digest_algorithm_uri,
        "assertionEncryptionAlgorithmUri": record.assertion_encryption_algorithm_uri,
        "keyEncryptionAlgorithmUri": record.key_encryption_algorithm_uri,
        "assertionQueryRequestProfileEnabled": record.assertion_query_request_profile_enabled,
        "enableSAML2ArtifactBinding": record.enable_saml2_artifact_binding,
        "attributeConsumingServiceIndex": record.attribute_consuming_service_index,
        "enableAttributesByDefault": record.enable_attributes_by_default,
        "requestedAudiences": record.requested_audiences,
        "requestedRecipients": record.requested_recipients,
        "idPInitSSOEnabled": record.idp_init_sso_enabled,
        "idPInitSLOEnabled": record.idp_init_slo_enabled,
        "doEnableEncryptedAssertion": record.do_enable_encrypted_assertion,
        "doValidateSignatureInRequests": record.do_validate_signature_in_requests,
        "idpEntityIDAlias": record.idp_entity_id_alias,
    })
}

/// Audit transport.
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn emit(&self, event: AuditEvent) -> Result<(), AuditError>;
}

/// Writes audit events to the `audit` tracing target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAuditSink;

#[async_trait]
impl AuditSink for TracingAuditSink {
    async fn emit(&self, event: AuditEvent) -> Result<(), AuditError> {
        let data = event
            .data
            .as_ref()
            .map(Value::to_string)
            .unwrap_or_default();
        tracing::info!(
            target: "audit",
            initiator_id = %event.initiator_id,
            target_id = %event.target_id,
            action = %event.action,
            data = %data,
            "SAML service provider audit event"
        );
        Ok(())
    }
}

/// In-memory audit sink for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAuditSink {
    events: Arc<RwLock<Vec<AuditEvent>>>,
    failing: Arc<AtomicBool>,
}

impl InMemoryAuditSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Events received so far, oldest first.
    pub async fn events(&self) -> Vec<AuditEvent> {
        self.events.read().await.clone()
    }

    /// Make every subsequent emit fail.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl AuditSink for InMemoryAuditSink {
    async fn emit(&self, event: AuditEvent) -> Result<(), AuditError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(AuditError::Unavailable("in-memory sink failing".to_string()));
        }
        self.events.write().await.push(event);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audit_data_excludes_certificate() {
        let mut record = ServiceProviderRecord::new("sp1");
        record.certificate = Some("-----BEGIN CERTIFICATE-----".to_string());
        record.cert_alias = Some("sp1".to_string());

        let data = sp_audit_data(&record);
        assert_eq!(data["issuer"], "sp1");
        assert_eq!(data["certAlias"], "sp1");
        assert!(!data.to_string().contains("BEGIN CERTIFICATE"));
    }

    #[test]
    fn test_action_display() {
        assert_eq!(SpAuditAction::Create.to_string(), "create-saml-application");
        assert_eq!(SpAuditAction::Delete.to_string(), "delete-saml-application");
    }

    #[tokio::test]
    async fn test_in_memory_sink() {
        let sink = InMemoryAuditSink::new();
        sink.emit(AuditEvent::new("u1", "sp1", SpAuditAction::Delete, None))
            .await
            .unwrap();

        let events = sink.events().await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].initiator_type, InitiatorType::User);
        assert_eq!(events[0].target_type, TargetType::Application);

        sink.set_failing(true);
        assert!(sink
            .emit(AuditEvent::new("u1", "sp1", SpAuditAction::Delete, None))
            .await
            .is_err());
        assert_eq!(sink.events().await.len(), 1);
    }

    #[tokio::test]
    async fn test_tracing_sink_never_fails() {
        let event = AuditEvent::new(
            "u1",
            "sp1",
            SpAuditAction::Create,
            Some(sp_audit_data(&ServiceProviderRecord::new("sp1"))),
        );
        assert!(TracingAuditSink.emit(event).await.is_ok());
    }
}
