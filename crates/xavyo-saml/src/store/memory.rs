//! In-memory service provider store

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use xavyo_core::TenantId;

use super::ServiceProviderStore;
use crate::error::StoreError;
use crate::models::ServiceProviderRecord;

type TenantRecords = BTreeMap<String, ServiceProviderRecord>;

/// Service provider store for embedding and tests.
#[derive(Debug, Clone, Default)]
pub struct InMemoryServiceProviderStore {
    records: Arc<RwLock<HashMap<TenantId, TenantRecords>>>,
    mutations: Arc<AtomicUsize>,
    unavailable: Arc<AtomicBool>,
}

impl InMemoryServiceProviderStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of add, update, and remove calls received.
    #[must_use]
    pub fn mutation_count(&self) -> usize {
        self.mutations.load(Ordering::SeqCst)
    }

    /// Make every subsequent call fail with [`StoreError::Unavailable`].
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(
                "in-memory store marked unavailable".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl ServiceProviderStore for InMemoryServiceProviderStore {
    async fn add(
        &self,
        tenant_id: TenantId,
        record: ServiceProviderRecord,
    ) -> Result<bool, StoreError> {
        self.mutations.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;

        let mut records = self.records.write().await;
        let tenant = records.entry(tenant_id).or_default();
        let key = record.effective_issuer();
        if tenant.contains_key(&key) {
            return Ok(false);
        }
        tenant.insert(key, record);
        Ok(true)
    }

    async fn update(
        &self,
        tenant_id: TenantId,
        record: ServiceProviderRecord,
        current_issuer: &str,
    ) -> Result<bool, StoreError> {
        self.mutations.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;

        let mut records = self.records.write().await;
        let Some(tenant) = records.get_mut(&tenant_id) else {
            return Ok(false);
        };
        if !tenant.contains_key(current_issuer) {
            return Ok(false);
        }
        let key = record.effective_issuer();
        if key != current_issuer && tenant.contains_key(&key) {
            return Ok(false);
        }
        tenant.remove(current_issuer);
        tenant.insert(key, record);
        Ok(true)
    }

    async fn remove(&self, tenant_id: TenantId, issuer: &str) -> Result<bool, StoreError> {
        self.mutations.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;

        let mut records = self.records.write().await;
        Ok(records
            .get_mut(&tenant_id)
            .is_some_and(|tenant| tenant.remove(issuer).is_some()))
    }

    async fn get(
        &self,
        tenant_id: TenantId,
        issuer: &str,
    ) -> Result<Option<ServiceProviderRecord>, StoreError> {
        self.check_available()?;
        let records = self.records.read().await;
        Ok(records
            .get(&tenant_id)
            .and_then(|tenant| tenant.get(issuer))
            .cloned())
    }

    async fn list_for_tenant(
        &self,
        tenant_id: TenantId,
    ) -> Result<Vec<ServiceProviderRecord>, StoreError> {
        self.check_available()?;
        let records = self.records.read().await;
        Ok(records
            .get(&tenant_id)
            .map(|tenant| tenant.values().cloned().collect())
            .unwrap_or_default())
    }
}
