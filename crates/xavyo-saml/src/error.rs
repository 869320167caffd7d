//! SAML trust configuration error types

use thiserror::Error;
use xavyo_keystore::KeyStoreError;

/// Result type for signing credential resolution
pub type CredentialResult<T> = Result<T, CredentialError>;

/// Result type for service provider registration
pub type RegistrationResult<T> = Result<T, RegistrationError>;

/// Tenant directory lookup failures
#[derive(Debug, Clone, Error)]
pub enum TenantLookupError {
    /// No tenant is registered under this domain
    #[error("Unknown tenant domain: {0}")]
    UnknownDomain(String),

    /// The tenant directory could not be reached
    #[error("Tenant directory unavailable: {0}")]
    Unavailable(String),
}

/// Errors raised while resolving a tenant's signing credential
#[derive(Debug, Error)]
pub enum CredentialError {
    /// The tenant domain could not be mapped to a tenant id
    #[error("Tenant lookup failed for '{tenant_domain}': {source}")]
    TenantLookup {
        tenant_domain: String,
        #[source]
        source: TenantLookupError,
    },

    /// The dedicated signing keystore could not be opened or read
    #[error("Signing keystore error: {0}")]
    SigningKeyStore(#[source] KeyStoreError),

    /// The tenant keystore could not be read
    #[error("Error retrieving signing key from keystore of tenant '{tenant_domain}': {source}")]
    TenantKeyStore {
        tenant_domain: String,
        #[source]
        source: KeyStoreError,
    },

    /// A keystore entry has the wrong key or certificate type
    #[error("Invalid credential type for alias '{alias}': {detail}")]
    InvalidCredentialType { alias: String, detail: String },

    /// No private key was found for the tenant
    #[error("No private key found for tenant '{tenant_domain}'")]
    MissingPrivateKey { tenant_domain: String },

    /// No certificate was found for the tenant
    #[error("No certificate found for tenant '{tenant_domain}'")]
    MissingCertificate { tenant_domain: String },

    /// The crypto backend rejected the key algorithm
    #[error("Unsupported key algorithm: {0}")]
    UnsupportedKeyAlgorithm(String),

    /// The supplied key components are malformed
    #[error("Invalid key specification: {0}")]
    InvalidKeySpec(String),
}

impl CredentialError {
    /// Get the error code string for classification.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            CredentialError::TenantLookup { .. } => "tenant_lookup_failed",
            CredentialError::SigningKeyStore(_) => "signing_keystore_error",
            CredentialError::TenantKeyStore { .. } => "tenant_keystore_error",
            CredentialError::InvalidCredentialType { .. } => "invalid_credential_type",
            CredentialError::MissingPrivateKey { .. } => "missing_private_key",
            CredentialError::MissingCertificate { .. } => "missing_certificate",
            CredentialError::UnsupportedKeyAlgorithm(_) => "unsupported_key_algorithm",
            CredentialError::InvalidKeySpec(_) => "invalid_key_spec",
        }
    }

    /// Whether the failure stems from caller input rather than server state.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            CredentialError::TenantLookup {
                source: TenantLookupError::UnknownDomain(_),
                ..
            } | CredentialError::UnsupportedKeyAlgorithm(_)
                | CredentialError::InvalidKeySpec(_)
        )
    }
}

/// Persistent service provider store failures
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A stored record could not be (de)serialized
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The backing store is unavailable
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// SAML metadata parsing failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MetadataError {
    /// The document exceeds the accepted size
    #[error("Metadata exceeds maximum size ({size} > {max} bytes)")]
    TooLarge { size: usize, max: usize },

    /// The document is not well-formed XML
    #[error("XML parse error: {0}")]
    Xml(String),

    /// No `EntityDescriptor` with an `entityID` was found
    #[error("Missing EntityDescriptor entityID")]
    MissingEntityId,

    /// No `SPSSODescriptor` was found
    #[error("Missing SPSSODescriptor")]
    MissingSpDescriptor,

    /// The SP declares no assertion consumer service
    #[error("Missing AssertionConsumerService")]
    MissingAssertionConsumerService,

    /// An embedded certificate could not be decoded
    #[error("Invalid X509Certificate: {0}")]
    InvalidCertificate(String),
}

/// Loading the file-based provider set failed
#[derive(Debug, Clone, Error)]
pub enum StaticProviderError {
    /// The provider file could not be read
    #[error("Failed to read provider file '{path}': {detail}")]
    Io { path: String, detail: String },

    /// The provider file is not a JSON array of records
    #[error("Failed to parse provider file '{path}': {detail}")]
    Parse { path: String, detail: String },
}

/// Audit sink delivery failures
#[derive(Debug, Clone, Error)]
pub enum AuditError {
    /// The audit transport rejected or could not receive the event
    #[error("Audit sink unavailable: {0}")]
    Unavailable(String),
}

/// Errors raised by service provider registration
#[derive(Debug, Error)]
pub enum RegistrationError {
    /// The request failed validation
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The effective issuer is already registered
    #[error("Conflicting issuer: {message}")]
    ConflictingIssuer { issuer: String, message: String },

    /// Uploaded metadata could not be parsed
    #[error("Error parsing SAML SP metadata: {0}")]
    InvalidMetadata(#[from] MetadataError),

    /// The SP certificate could not be imported
    #[error("Error occurred while setting certificate and alias for '{issuer}': {source}")]
    CertificateImport {
        issuer: String,
        #[source]
        source: KeyStoreError,
    },

    /// The persistent store failed
    #[error("Error while {operation} service provider in tenant '{tenant_domain}': {source}")]
    Store {
        tenant_domain: String,
        operation: &'static str,
        #[source]
        source: StoreError,
    },

    /// The tenant could not be resolved
    #[error("Tenant lookup failed: {0}")]
    TenantLookup(#[from] TenantLookupError),
}

impl RegistrationError {
    /// Get the error code string for classification.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            RegistrationError::InvalidRequest(_) => "invalid_request",
            RegistrationError::ConflictingIssuer { .. } => "conflicting_saml_issuer",
            RegistrationError::InvalidMetadata(_) => "invalid_metadata",
            RegistrationError::CertificateImport { .. } => "certificate_import_failed",
            RegistrationError::Store { .. } => "store_error",
            RegistrationError::TenantLookup(_) => "tenant_lookup_failed",
        }
    }

    /// Whether the failure stems from caller input rather than server state.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            RegistrationError::InvalidRequest(_)
                | RegistrationError::ConflictingIssuer { .. }
                | RegistrationError::InvalidMetadata(_)
        )
    }
}
