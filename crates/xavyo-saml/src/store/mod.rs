//! Persistent service provider storage
//!
//! Records are keyed by `(tenant, effective issuer)`. A `false` from
//! [`ServiceProviderStore::add`] or [`ServiceProviderStore::update`] means the
//! store refused the record because the issuer is taken.

mod memory;
mod postgres;

pub use memory::InMemoryServiceProviderStore;
pub use postgres::PostgresServiceProviderStore;

use async_trait::async_trait;
use xavyo_core::TenantId;

use crate::error::StoreError;
use crate::models::ServiceProviderRecord;

/// Tenant-scoped service provider persistence.
#[async_trait]
pub trait ServiceProviderStore: Send + Sync {
    /// Insert a record unless its effective issuer already exists.
    async fn add(&self, tenant_id: TenantId, record: ServiceProviderRecord)
        -> Result<bool, StoreError>;

    /// Replace the record stored under `current_issuer`.
    ///
    /// Returns `false` when `current_issuer` is unknown or the new effective
    /// issuer belongs to a different record.
    async fn update(
        &self,
        tenant_id: TenantId,
        record: ServiceProviderRecord,
        current_issuer: &str,
    ) -> Result<bool, StoreError>;

    /// Delete a record. Returns whether anything was removed.
    async fn remove(&self, tenant_id: TenantId, issuer: &str) -> Result<bool, StoreError>;

    /// Look up a record by effective issuer.
    async fn get(
        &self,
        tenant_id: TenantId,
        issuer: &str,
    ) -> Result<Option<ServiceProviderRecord>, StoreError>;

    /// All records of a tenant, ordered by effective issuer.
    async fn list_for_tenant(
        &self,
        tenant_id: TenantId,
    ) -> Result<Vec<ServiceProviderRecord>, StoreError>;
}
