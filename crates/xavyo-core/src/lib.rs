//! xavyo Core Library
//!
//! Shared tenant types for the SAML trust crates.
//!
//! # Modules
//!
//! - [`ids`] - Strongly typed identifiers (TenantId)
//! - [`tenant`] - Tenant context and super tenant constants
//!
//! # Example
//!
//! ```
//! use xavyo_core::{TenantContext, TenantId, SUPER_TENANT_DOMAIN};
//!
//! let ctx = TenantContext::new("example.com", TenantId::new(5));
//! assert!(!ctx.is_super_tenant());
//! assert_eq!(TenantContext::super_tenant().tenant_domain(), SUPER_TENANT_DOMAIN);
//! ```

pub mod ids;
pub mod tenant;

pub use ids::{ParseIdError, TenantId};
pub use tenant::{is_super_tenant_domain, TenantContext, SUPER_TENANT_DOMAIN, SUPER_TENANT_ID};
