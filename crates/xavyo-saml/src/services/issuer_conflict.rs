//! Issuer namespace precedence
//!
//! File-based providers win over persisted ones; the store's refusal is the
//! final tie-break. Both surface as [`RegistrationError::ConflictingIssuer`].

use crate::error::RegistrationError;
use crate::static_providers::StaticServiceProviders;

/// Outcome of checking an effective issuer against every issuer source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssuerConflict {
    None,
    ConflictsWithStatic,
    ConflictsWithPersisted,
}

/// Check `effective_issuer` against the static set and, once known, the
/// store's answer (`Some(false)` = refused).
pub fn resolve_issuer_conflict(
    static_providers: &dyn StaticServiceProviders,
    effective_issuer: &str,
    store_accepted: Option<bool>,
) -> IssuerConflict {
    if static_providers.find_by_issuer(effective_issuer).is_some() {
        IssuerConflict::ConflictsWithStatic
    } else if store_accepted == Some(false) {
        IssuerConflict::ConflictsWithPersisted
    } else {
        IssuerConflict::None
    }
}

impl IssuerConflict {
    /// The registration error for this conflict, if any.
    #[must_use]
    pub fn into_error(self, issuer: &str, tenant_domain: &str) -> Option<RegistrationError> {
        let message = match self {
            IssuerConflict::None => return None,
            IssuerConflict::ConflictsWithStatic => format!(
                "A Service Provider with the name: {issuer} is already loaded from the file system."
            ),
            IssuerConflict::ConflictsWithPersisted => format!(
                "An application with the SAML issuer: {issuer} already exists in tenantDomain: {tenant_domain}"
            ),
        };
        Some(RegistrationError::ConflictingIssuer {
            issuer: issuer.to_string(),
            message,
        })
    }
}
