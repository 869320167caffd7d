//! Service provider registration
//!
//! A [`ServiceProviderRegistrar`] is built per request from the shared
//! [`SamlAdminServices`] and runs every mutation through the same steps:
//! validation, normalization, issuer conflict check, certificate import,
//! persistence, and audit.

use std::sync::Arc;

use xavyo_core::TenantContext;
use xavyo_keystore::KeyStoreManagers;

use super::cert_import::{import_certificate, rollback_import};
use super::issuer_conflict::resolve_issuer_conflict;
use crate::audit::{sp_audit_data, AuditEvent, AuditSink, SpAuditAction, TracingAuditSink};
use crate::config::SamlConfig;
use crate::error::{RegistrationError, RegistrationResult, StoreError};
use crate::metadata::{MetadataParser, SpMetadataParser};
use crate::models::dto::{validate_issuer, validate_issuer_qualifier};
use crate::models::{normalize, ServiceProviderDto, ServiceProviderInfo, ServiceProviderRecord};
use crate::session::{resolve_initiator, InitiatorIdDeriver, SessionContext, UuidInitiatorIdDeriver};
use crate::static_providers::StaticServiceProviders;
use crate::store::ServiceProviderStore;
use crate::tenant::TenantDirectory;

/// Collaborators shared by every registrar.
#[derive(Clone)]
pub struct SamlAdminServices {
    store: Arc<dyn ServiceProviderStore>,
    static_providers: Arc<dyn StaticServiceProviders>,
    keystores: Arc<dyn KeyStoreManagers>,
    metadata_parser: Arc<dyn MetadataParser>,
    audit_sink: Arc<dyn AuditSink>,
    initiator_deriver: Arc<dyn InitiatorIdDeriver>,
    config: SamlConfig,
}

impl SamlAdminServices {
    /// Create services with the quick-xml metadata parser, tracing audit
    /// sink, and UUID initiator ids.
    pub fn new(
        store: Arc<dyn ServiceProviderStore>,
        static_providers: Arc<dyn StaticServiceProviders>,
        keystores: Arc<dyn KeyStoreManagers>,
        config: SamlConfig,
    ) -> Self {
        Self {
            store,
            static_providers,
            keystores,
            metadata_parser: Arc::new(SpMetadataParser::new()),
            audit_sink: Arc::new(TracingAuditSink),
            initiator_deriver: Arc::new(UuidInitiatorIdDeriver),
            config,
        }
    }

    #[must_use]
    pub fn with_metadata_parser(mut self, parser: Arc<dyn MetadataParser>) -> Self {
        self.metadata_parser = parser;
        self
    }

    #[must_use]
    pub fn with_audit_sink(mut self, sink: Arc<dyn AuditSink>) -> Self {
        self.audit_sink = sink;
        self
    }

    #[must_use]
    pub fn with_initiator_deriver(mut self, deriver: Arc<dyn InitiatorIdDeriver>) -> Self {
        self.initiator_deriver = deriver;
        self
    }

    #[must_use]
    pub fn config(&self) -> &SamlConfig {
        &self.config
    }

    /// Registrar acting in `tenant` on behalf of `session`, with auditing on.
    #[must_use]
    pub fn registrar(&self, tenant: TenantContext, session: SessionContext) -> ServiceProviderRegistrar {
        ServiceProviderRegistrar {
            services: self.clone(),
            tenant,
            session,
            auditing: true,
        }
    }

    /// Registrar for the tenant registered under `tenant_domain`.
    pub async fn registrar_for_domain(
        &self,
        tenants: &dyn TenantDirectory,
        tenant_domain: &str,
        session: SessionContext,
    ) -> RegistrationResult<ServiceProviderRegistrar> {
        let tenant = tenants.context_for_domain(tenant_domain).await?;
        Ok(self.registrar(tenant, session))
    }
}

/// Tenant-scoped service provider administration.
#[derive(Clone)]
pub struct ServiceProviderRegistrar {
    services: SamlAdminServices,
    tenant: TenantContext,
    session: SessionContext,
    auditing: bool,
}

impl ServiceProviderRegistrar {
    /// Enable or disable audit events for this registrar.
    #[must_use]
    pub fn with_auditing(mut self, auditing: bool) -> Self {
        self.auditing = auditing;
        self
    }

    #[must_use]
    pub fn tenant(&self) -> &TenantContext {
        &self.tenant
    }

    /// Register a new service provider.
    pub async fn add(&self, dto: ServiceProviderDto) -> RegistrationResult<ServiceProviderRecord> {
        let record = dto.into_record()?;
        self.persist(record, None).await
    }

    /// Replace the service provider registered under `current_issuer`.
    ///
    /// Returns `None` when `current_issuer` is blank.
    pub async fn update(
        &self,
        dto: ServiceProviderDto,
        current_issuer: &str,
    ) -> RegistrationResult<Option<ServiceProviderRecord>> {
        let record = dto.into_record()?;
        if current_issuer.trim().is_empty() {
            return Ok(None);
        }
        self.persist(record, Some(current_issuer)).await.map(Some)
    }

    /// Register a service provider from its SAML metadata.
    pub async fn add_from_metadata(&self, xml: &str) -> RegistrationResult<ServiceProviderRecord> {
        let record = self.parse_metadata(xml)?;
        self.persist(record, None).await
    }

    /// Replace the service provider under `current_issuer` from SAML metadata.
    ///
    /// Returns `None` when `current_issuer` is blank.
    pub async fn update_from_metadata(
        &self,
        xml: &str,
        current_issuer: &str,
    ) -> RegistrationResult<Option<ServiceProviderRecord>> {
        let record = self.parse_metadata(xml)?;
        if current_issuer.trim().is_empty() {
            return Ok(None);
        }
        self.persist(record, Some(current_issuer)).await.map(Some)
    }

    /// All service providers of the tenant.
    pub async fn list(&self) -> RegistrationResult<Vec<ServiceProviderRecord>> {
        let records = self
            .services
            .store
            .list_for_tenant(self.tenant.tenant_id())
            .await
            .map_err(|source| self.store_error("retrieving", source))?;
        Ok(records.into_iter().map(normalize).collect())
    }

    /// All service providers of the tenant in their admin-facing form.
    pub async fn list_info(&self) -> RegistrationResult<ServiceProviderInfo> {
        let service_providers = self
            .list()
            .await?
            .iter()
            .map(|record| {
                let mut dto = record.to_dto();
                dto.login_page_url = Some(
                    dto.login_page_url
                        .filter(|url| url != "null")
                        .unwrap_or_default(),
                );
                dto
            })
            .collect();

        Ok(ServiceProviderInfo {
            service_providers,
            tenant_zero: self.tenant.is_super_tenant(),
        })
    }

    /// Look up one service provider by effective issuer.
    pub async fn get(&self, issuer: &str) -> RegistrationResult<Option<ServiceProviderRecord>> {
        let record = self
            .services
            .store
            .get(self.tenant.tenant_id(), issuer)
            .await
            .map_err(|source| self.store_error("retrieving", source))?;
        Ok(record.map(normalize))
    }

    /// Remove a service provider. Returns whether it existed.
    pub async fn remove(&self, issuer: &str) -> RegistrationResult<bool> {
        let removed = self
            .services
            .store
            .remove(self.tenant.tenant_id(), issuer)
            .await
            .map_err(|source| self.store_error("removing", source))?;

        if removed {
            tracing::info!(
                tenant_domain = %self.tenant.tenant_domain(),
                issuer = %issuer,
                "SAML service provider removed"
            );
            self.audit(issuer, SpAuditAction::Delete, None).await;
        }
        Ok(removed)
    }

    fn parse_metadata(&self, xml: &str) -> RegistrationResult<ServiceProviderRecord> {
        let record = self.services.metadata_parser.parse(xml)?;
        validate_issuer(&record.issuer)?;
        validate_issuer_qualifier(record.issuer_qualifier.as_deref())?;
        Ok(normalize(record))
    }

    /// Conflict check, certificate import, store write, and audit.
    async fn persist(
        &self,
        mut record: ServiceProviderRecord,
        current_issuer: Option<&str>,
    ) -> RegistrationResult<ServiceProviderRecord> {
        let issuer = record.effective_issuer();
        let tenant_domain = self.tenant.tenant_domain();

        let conflict = resolve_issuer_conflict(self.services.static_providers.as_ref(), &issuer, None);
        if let Some(err) = conflict.into_error(&issuer, tenant_domain) {
            tracing::warn!(
                tenant_domain = %tenant_domain,
                issuer = %issuer,
                "SAML issuer already loaded from the file system"
            );
            return Err(err);
        }

        let manager = self.services.keystores.for_tenant(self.tenant.tenant_id());
        let imported = match record.x509_certificate() {
            Ok(None) => None,
            Ok(Some(cert)) => {
                import_certificate(
                    manager.as_ref(),
                    &self.tenant,
                    &self.services.config.tenant_keystore_extension,
                    &mut record,
                    &cert,
                )
                .await?
            }
            Err(e) => {
                return Err(RegistrationError::InvalidRequest(format!(
                    "Invalid certificate content: {e}"
                )))
            }
        };

        let tenant_id = self.tenant.tenant_id();
        let (outcome, operation) = match current_issuer {
            None => (
                self.services.store.add(tenant_id, record.clone()).await,
                "adding",
            ),
            Some(current) => (
                self.services
                    .store
                    .update(tenant_id, record.clone(), current)
                    .await,
                "updating",
            ),
        };

        let failure = match outcome {
            Ok(accepted) => resolve_issuer_conflict(
                self.services.static_providers.as_ref(),
                &issuer,
                Some(accepted),
            )
            .into_error(&issuer, tenant_domain),
            Err(source) => Some(self.store_error(operation, source)),
        };
        if let Some(err) = failure {
            if let Some(imported) = imported {
                rollback_import(manager.as_ref(), imported).await;
            }
            return Err(err);
        }

        let action = if current_issuer.is_some() {
            SpAuditAction::Update
        } else {
            SpAuditAction::Create
        };
        tracing::info!(
            tenant_domain = %tenant_domain,
            issuer = %issuer,
            action = %action,
            "SAML service provider saved"
        );
        self.audit(&issuer, action, Some(sp_audit_data(&record))).await;

        Ok(record)
    }

    async fn audit(&self, target_id: &str, action: SpAuditAction, data: Option<serde_json::Value>) {
        if !(self.services.config.audit_enabled && self.auditing) {
            return;
        }

        let Some(initiator_id) =
            resolve_initiator(&self.session, self.services.initiator_deriver.as_ref())
        else {
            tracing::error!(
                tenant_domain = %self.tenant.tenant_domain(),
                target_id = %target_id,
                action = %action,
                "Error getting the logged in userId, audit event not emitted"
            );
            return;
        };

        let event = AuditEvent::new(initiator_id, target_id, action, data);
        if let Err(e) = self.services.audit_sink.emit(event).await {
            tracing::error!(
                tenant_domain = %self.tenant.tenant_domain(),
                target_id = %target_id,
                action = %action,
                error = %e,
                "Failed to emit SAML service provider audit event"
            );
        }
    }

    fn store_error(&self, operation: &'static str, source: StoreError) -> RegistrationError {
        RegistrationError::Store {
            tenant_domain: self.tenant.tenant_domain().to_string(),
            operation,
            source,
        }
    }
}
