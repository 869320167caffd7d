//! Admin session context and initiator resolution

mod initiator;

pub use initiator::{
    resolve_initiator, strip_user_store_domain, InitiatorIdDeriver, UuidInitiatorIdDeriver,
};

use serde::{Deserialize, Serialize};

/// The authenticated admin on whose behalf a registration runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionContext {
    /// Login name, possibly prefixed with a user store domain (`PRIMARY/alice`)
    pub user_name: Option<String>,
    /// Domain of the tenant the user belongs to
    pub tenant_domain: String,
    /// Stable user id, when the session carries one
    pub user_id: Option<String>,
}

impl SessionContext {
    /// Session for a user known by id.
    pub fn with_user_id(tenant_domain: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            user_name: None,
            tenant_domain: tenant_domain.into(),
            user_id: Some(user_id.into()),
        }
    }

    /// Session for a user known only by name.
    pub fn with_user_name(tenant_domain: impl Into<String>, user_name: impl Into<String>) -> Self {
        Self {
            user_name: Some(user_name.into()),
            tenant_domain: tenant_domain.into(),
            user_id: None,
        }
    }

    /// Session with no authenticated user.
    pub fn anonymous(tenant_domain: impl Into<String>) -> Self {
        Self {
            tenant_domain: tenant_domain.into(),
            ..Self::default()
        }
    }
}
