//! Tenant context
//!
//! A [`TenantContext`] is resolved once per request and never mutated.

use crate::ids::TenantId;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Domain name of the super tenant.
pub const SUPER_TENANT_DOMAIN: &str = "carbon.super";

/// Integer id of the super tenant.
pub const SUPER_TENANT_ID: i32 = 0;

/// Identifies the tenant a request executes for.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TenantContext {
    tenant_domain: String,
    tenant_id: TenantId,
}

impl TenantContext {
    /// Create a context for a tenant.
    pub fn new(tenant_domain: impl Into<String>, tenant_id: TenantId) -> Self {
        Self {
            tenant_domain: tenant_domain.into(),
            tenant_id,
        }
    }

    /// Context of the super tenant.
    #[must_use]
    pub fn super_tenant() -> Self {
        Self::new(SUPER_TENANT_DOMAIN, TenantId::SUPER)
    }

    #[must_use]
    pub fn tenant_domain(&self) -> &str {
        &self.tenant_domain
    }

    #[must_use]
    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    /// A context is the super tenant when either its id or its domain says so.
    #[must_use]
    pub fn is_super_tenant(&self) -> bool {
        self.tenant_id.is_super_tenant() || is_super_tenant_domain(&self.tenant_domain)
    }
}

impl Display for TenantContext {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.tenant_domain, self.tenant_id)
    }
}

/// Whether `domain` names the super tenant.
#[must_use]
pub fn is_super_tenant_domain(domain: &str) -> bool {
    domain == SUPER_TENANT_DOMAIN
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_super_tenant_context() {
        let ctx = TenantContext::super_tenant();
        assert_eq!(ctx.tenant_domain(), "carbon.super");
        assert_eq!(ctx.tenant_id(), TenantId::SUPER);
        assert!(ctx.is_super_tenant());
    }

    #[test]
    fn test_regular_tenant_context() {
        let ctx = TenantContext::new("example.com", TenantId::new(3));
        assert!(!ctx.is_super_tenant());
        assert_eq!(ctx.to_string(), "example.com (3)");
    }

    #[test]
    fn test_super_domain_check_is_exact() {
        assert!(is_super_tenant_domain("carbon.super"));
        assert!(!is_super_tenant_domain("Carbon.Super"));
        assert!(!is_super_tenant_domain("carbon.super.example"));
    }
}
