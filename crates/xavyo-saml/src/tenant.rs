//! Tenant directory
//!
//! Maps tenant domains to tenant ids. The super tenant is always present.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use xavyo_core::{TenantContext, TenantId, SUPER_TENANT_DOMAIN};

use crate::error::TenantLookupError;

/// Resolves tenant domains.
#[async_trait]
pub trait TenantDirectory: Send + Sync {
    /// Tenant id registered for `domain`.
    async fn tenant_id_for_domain(&self, domain: &str) -> Result<TenantId, TenantLookupError>;

    /// Build the full context for `domain`.
    async fn context_for_domain(&self, domain: &str) -> Result<TenantContext, TenantLookupError> {
        let tenant_id = self.tenant_id_for_domain(domain).await?;
        Ok(TenantContext::new(domain, tenant_id))
    }
}

/// In-memory tenant directory.
#[derive(Debug, Clone)]
pub struct InMemoryTenantDirectory {
    tenants: Arc<RwLock<HashMap<String, TenantId>>>,
}

impl Default for InMemoryTenantDirectory {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryTenantDirectory {
    /// Create a directory containing only the super tenant.
    #[must_use]
    pub fn new() -> Self {
        let mut tenants = HashMap::new();
        tenants.insert(SUPER_TENANT_DOMAIN.to_string(), TenantId::SUPER);
        Self {
            tenants: Arc::new(RwLock::new(tenants)),
        }
    }

    /// Register a tenant domain.
    pub async fn register(&self, domain: impl Into<String>, tenant_id: TenantId) {
        self.tenants.write().await.insert(domain.into(), tenant_id);
    }
}

#[async_trait]
impl TenantDirectory for InMemoryTenantDirectory {
    async fn tenant_id_for_domain(&self, domain: &str) -> Result<TenantId, TenantLookupError> {
        self.tenants
            .read()
            .await
            .get(domain)
            .copied()
            .ok_or_else(|| TenantLookupError::UnknownDomain(domain.to_string()))
    }
}
