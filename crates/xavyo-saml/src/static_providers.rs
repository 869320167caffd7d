//! Service providers loaded from configuration files
//!
//! These records live outside the persistent store but share its issuer
//! namespace, so every mutating registration path checks them first.

use std::collections::HashMap;
use std::path::Path;

use crate::error::StaticProviderError;
use crate::models::{normalize, ServiceProviderRecord};

/// Read-only set of service providers that take precedence over the store.
pub trait StaticServiceProviders: Send + Sync {
    /// Look up a provider by effective issuer.
    fn find_by_issuer(&self, effective_issuer: &str) -> Option<ServiceProviderRecord>;
}

/// Static providers read from a JSON array of records.
#[derive(Debug, Clone, Default)]
pub struct FileServiceProviderSet {
    providers: HashMap<String, ServiceProviderRecord>,
}

impl FileServiceProviderSet {
    /// An empty set.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a set from records; later duplicates replace earlier ones.
    #[must_use]
    pub fn from_records(records: impl IntoIterator<Item = ServiceProviderRecord>) -> Self {
        let providers = records
            .into_iter()
            .map(normalize)
            .map(|record| (record.effective_issuer(), record))
            .collect();
        Self { providers }
    }

    /// Load a JSON array of records from `path`.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, StaticProviderError> {
        let path = path.as_ref();
        let path_str = path.display().to_string();

        let content =
            tokio::fs::read_to_string(path)
                .await
                .map_err(|e| StaticProviderError::Io {
                    path: path_str.clone(),
                    detail: e.to_string(),
                })?;
        let records: Vec<ServiceProviderRecord> =
            serde_json::from_str(&content).map_err(|e| StaticProviderError::Parse {
                path: path_str.clone(),
                detail: e.to_string(),
            })?;

        let set = Self::from_records(records);
        tracing::info!(
            path = %path_str,
            count = set.len(),
            "Loaded file-based SAML service providers"
        );
        Ok(set)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl StaticServiceProviders for FileServiceProviderSet {
    fn find_by_issuer(&self, effective_issuer: &str) -> Option<ServiceProviderRecord> {
        self.providers.get(effective_issuer).cloned()
    }
}
