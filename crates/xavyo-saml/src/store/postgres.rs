//! PostgreSQL-backed service provider store
//!
//! Each record is a JSONB document in `saml_sso_service_providers`, keyed by
//! `(tenant_id, issuer)` where `issuer` is the effective issuer.

use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::PgPool;
use xavyo_core::TenantId;

use super::ServiceProviderStore;
use crate::error::StoreError;
use crate::models::ServiceProviderRecord;

/// PostgreSQL service provider store for production
#[derive(Debug, Clone)]
pub struct PostgresServiceProviderStore {
    pool: PgPool,
}

impl PostgresServiceProviderStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Apply the bundled schema migrations.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        tracing::info!("Running service provider store migrations");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Unavailable(format!("migration failed: {e}")))
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

#[async_trait]
impl ServiceProviderStore for PostgresServiceProviderStore {
    async fn add(
        &self,
        tenant_id: TenantId,
        record: ServiceProviderRecord,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r"
            INSERT INTO saml_sso_service_providers (tenant_id, issuer, config)
            VALUES ($1, $2, $3)
            ON CONFLICT (tenant_id, issuer) DO NOTHING
            ",
        )
        .bind(tenant_id.as_i32())
        .bind(record.effective_issuer())
        .bind(Json(&record))
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn update(
        &self,
        tenant_id: TenantId,
        record: ServiceProviderRecord,
        current_issuer: &str,
    ) -> Result<bool, StoreError> {
        let new_issuer = record.effective_issuer();
        let mut tx = self.pool.begin().await?;

        let current: Option<String> = sqlx::query_scalar(
            r"
            SELECT issuer FROM saml_sso_service_providers
            WHERE tenant_id = $1 AND issuer = $2
            FOR UPDATE
            ",
        )
        .bind(tenant_id.as_i32())
        .bind(current_issuer)
        .fetch_optional(&mut *tx)
        .await?;
        if current.is_none() {
            tx.rollback().await?;
            return Ok(false);
        }

        // The primary key rejects an issuer taken by another record, including
        // one inserted after the row lock above was taken.
        let updated = sqlx::query(
            r"
            UPDATE saml_sso_service_providers
            SET issuer = $3, config = $4, updated_at = NOW()
            WHERE tenant_id = $1 AND issuer = $2
            ",
        )
        .bind(tenant_id.as_i32())
        .bind(current_issuer)
        .bind(&new_issuer)
        .bind(Json(&record))
        .execute(&mut *tx)
        .await;

        match updated {
            Ok(_) => {
                tx.commit().await?;
                Ok(true)
            }
            Err(e) if is_unique_violation(&e) => {
                tracing::debug!(
                    tenant_id = %tenant_id,
                    issuer = %new_issuer,
                    "Issuer already taken, update rejected"
                );
                tx.rollback().await?;
                Ok(false)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn remove(&self, tenant_id: TenantId, issuer: &str) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r"DELETE FROM saml_sso_service_providers WHERE tenant_id = $1 AND issuer = $2",
        )
        .bind(tenant_id.as_i32())
        .bind(issuer)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn get(
        &self,
        tenant_id: TenantId,
        issuer: &str,
    ) -> Result<Option<ServiceProviderRecord>, StoreError> {
        let config: Option<Json<ServiceProviderRecord>> = sqlx::query_scalar(
            r"SELECT config FROM saml_sso_service_providers WHERE tenant_id = $1 AND issuer = $2",
        )
        .bind(tenant_id.as_i32())
        .bind(issuer)
        .fetch_optional(&self.pool)
        .await?;

        Ok(config.map(|Json(record)| record))
    }

    async fn list_for_tenant(
        &self,
        tenant_id: TenantId,
    ) -> Result<Vec<ServiceProviderRecord>, StoreError> {
        let configs: Vec<Json<ServiceProviderRecord>> = sqlx::query_scalar(
            r"
            SELECT config FROM saml_sso_service_providers
            WHERE tenant_id = $1
            ORDER BY issuer
            ",
        )
        .bind(tenant_id.as_i32())
        .fetch_all(&self.pool)
        .await?;

        Ok(configs.into_iter().map(|Json(record)| record).collect())
    }
}
