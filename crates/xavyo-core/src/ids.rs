//! Strongly Typed Identifiers
//!
//! Tenants are identified by the integer id assigned by the tenant directory.
//! The newtype keeps tenant ids from being confused with other integers
//! (keystore indexes, attribute consuming service indexes).
//!
//! # Example
//!
//! ```
//! use xavyo_core::TenantId;
//!
//! let tenant = TenantId::new(42);
//! assert_eq!(tenant.as_i32(), 42);
//! assert!(!tenant.is_super_tenant());
//! assert!(TenantId::SUPER.is_super_tenant());
//! ```

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Error type for ID parsing failures
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdError {
    /// The type of ID that failed to parse
    pub id_type: &'static str,
    /// The underlying parse error message
    pub message: String,
}

impl Display for ParseIdError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Failed to parse {}: {}", self.id_type, self.message)
    }
}

impl std::error::Error for ParseIdError {}

/// Strongly typed identifier for tenants.
///
/// The super tenant always has id `0`. Every other tenant receives a positive
/// id from the tenant directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TenantId(i32);

impl TenantId {
    /// The root tenant of a multi-tenant deployment.
    pub const SUPER: TenantId = TenantId(crate::SUPER_TENANT_ID);

    /// Creates a tenant id from its integer value.
    #[must_use]
    pub const fn new(id: i32) -> Self {
        Self(id)
    }

    /// Returns the integer value.
    #[must_use]
    pub const fn as_i32(&self) -> i32 {
        self.0
    }

    /// Whether this is the super tenant.
    #[must_use]
    pub const fn is_super_tenant(&self) -> bool {
        self.0 == crate::SUPER_TENANT_ID
    }
}

impl Display for TenantId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i32> for TenantId {
    fn from(value: i32) -> Self {
        Self(value)
    }
}

impl FromStr for TenantId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        s.trim()
            .parse::<i32>()
            .map(Self)
            .map_err(|e| ParseIdError {
                id_type: "TenantId",
                message: e.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod tenant_id_tests {
        use super::*;

        #[test]
        fn test_super_tenant_is_zero() {
            assert_eq!(TenantId::SUPER.as_i32(), 0);
            assert!(TenantId::SUPER.is_super_tenant());
            assert!(TenantId::new(0).is_super_tenant());
        }

        #[test]
        fn test_regular_tenant_is_not_super() {
            assert!(!TenantId::new(1).is_super_tenant());
            assert!(!TenantId::new(-1).is_super_tenant());
        }

        #[test]
        fn test_display_returns_integer() {
            assert_eq!(TenantId::new(1234).to_string(), "1234");
        }
    }

    mod serde_tests {
        use super::*;

        #[test]
        fn test_serializes_as_plain_number() {
            let json = serde_json::to_string(&TenantId::new(7)).unwrap();
            assert_eq!(json, "7");
            let parsed: TenantId = serde_json::from_str("7").unwrap();
            assert_eq!(parsed, TenantId::new(7));
        }
    }

    mod from_str_tests {
        use super::*;

        #[test]
        fn test_parse_valid_integer() {
            let id: TenantId = " 12 ".parse().unwrap();
            assert_eq!(id, TenantId::new(12));
        }

        #[test]
        fn test_parse_invalid_returns_error() {
            let err = "not-a-number".parse::<TenantId>().unwrap_err();
            assert_eq!(err.id_type, "TenantId");
            assert!(err.to_string().contains("Failed to parse TenantId"));
        }
    }
}
