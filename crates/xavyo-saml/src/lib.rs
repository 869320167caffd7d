//! SAML service provider trust configuration for xavyo
//!
//! This crate provides:
//! - Tenant signing credential resolution ([`CredentialResolver`])
//! - Service provider registration with issuer conflict checks,
//!   certificate import, and audit ([`ServiceProviderRegistrar`])
//! - SP metadata parsing ([`SpMetadataParser`])
//! - In-memory and PostgreSQL service provider stores

pub mod audit;
pub mod config;
pub mod credential;
pub mod error;
pub mod metadata;
pub mod models;
pub mod services;
pub mod session;
pub mod static_providers;
pub mod store;
pub mod tenant;

pub use audit::{
    sp_audit_data, AuditEvent, AuditSink, InMemoryAuditSink, InitiatorType, SpAuditAction,
    TargetType, TracingAuditSink,
};
pub use config::SamlConfig;
pub use credential::{
    CredentialContextSet, CredentialResolver, CredentialType, SignKeyStoreCell, SigningCredential,
    UsageType,
};
pub use error::{
    AuditError, CredentialError, CredentialResult, MetadataError, RegistrationError,
    RegistrationResult, StaticProviderError, StoreError, TenantLookupError,
};
pub use metadata::{MetadataParser, SpMetadataParser, MAX_METADATA_SIZE};
pub use models::{
    issuer_with_qualifier, normalize, ServiceProviderDto, ServiceProviderInfo,
    ServiceProviderRecord, NAME_ID_FORMAT_UNSPECIFIED,
};
pub use services::{
    resolve_issuer_conflict, IssuerConflict, SamlAdminServices, ServiceProviderRegistrar,
};
pub use session::{
    resolve_initiator, InitiatorIdDeriver, SessionContext, UuidInitiatorIdDeriver,
};
pub use static_providers::{FileServiceProviderSet, StaticServiceProviders};
pub use store::{InMemoryServiceProviderStore, PostgresServiceProviderStore, ServiceProviderStore};
pub use tenant::{InMemoryTenantDirectory, TenantDirectory};
