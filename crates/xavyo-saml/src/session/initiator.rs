//! Audit initiator resolution
//!
//! The initiator is the session's user id when present, otherwise an id
//! derived from the user name (without its user store domain) and the
//! tenant domain.

use uuid::Uuid;

use super::SessionContext;

/// Separator between a user store domain and the user name.
const USER_STORE_DOMAIN_SEPARATOR: char = '/';

/// Derives a stable user id from a user name and tenant domain.
pub trait InitiatorIdDeriver: Send + Sync {
    fn derive(&self, user_name: &str, tenant_domain: &str) -> Option<String>;
}

/// UUIDv5 of `user@tenant` in the OID namespace.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidInitiatorIdDeriver;

impl InitiatorIdDeriver for UuidInitiatorIdDeriver {
    fn derive(&self, user_name: &str, tenant_domain: &str) -> Option<String> {
        let qualified = format!("{user_name}@{tenant_domain}");
        Some(Uuid::new_v5(&Uuid::NAMESPACE_OID, qualified.as_bytes()).to_string())
    }
}

/// Drop a leading `DOMAIN/` user store prefix.
#[must_use]
pub fn strip_user_store_domain(user_name: &str) -> &str {
    user_name
        .split_once(USER_STORE_DOMAIN_SEPARATOR)
        .map_or(user_name, |(_, name)| name)
}

/// Resolve the audit initiator id for a session.
pub fn resolve_initiator(
    session: &SessionContext,
    deriver: &dyn InitiatorIdDeriver,
) -> Option<String> {
    session
        .user_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .or_else(|| {
            let user_name = session
                .user_name
                .as_deref()
                .map(strip_user_store_domain)
                .map(str::trim)
                .filter(|name| !name.is_empty())?;
            deriver.derive(user_name, &session.tenant_domain)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoDeriver;

    impl InitiatorIdDeriver for NoDeriver {
        fn derive(&self, _user_name: &str, _tenant_domain: &str) -> Option<String> {
            None
        }
    }

    #[test]
    fn test_user_id_wins() {
        let mut session = SessionContext::with_user_id("example.com", "u-123");
        session.user_name = Some("alice".to_string());
        assert_eq!(
            resolve_initiator(&session, &UuidInitiatorIdDeriver).as_deref(),
            Some("u-123")
        );
    }

    #[test]
    fn test_blank_user_id_falls_back_to_name() {
        let mut session = SessionContext::with_user_name("example.com", "PRIMARY/alice");
        session.user_id = Some("  ".to_string());

        let derived = resolve_initiator(&session, &UuidInitiatorIdDeriver).unwrap();
        let expected = UuidInitiatorIdDeriver
            .derive("alice", "example.com")
            .unwrap();
        assert_eq!(derived, expected);
    }

    #[test]
    fn test_derived_id_is_stable_and_tenant_scoped() {
        let a = UuidInitiatorIdDeriver.derive("alice", "example.com");
        let b = UuidInitiatorIdDeriver.derive("alice", "example.com");
        let c = UuidInitiatorIdDeriver.derive("alice", "other.com");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_no_initiator() {
        let session = SessionContext::anonymous("example.com");
        assert!(resolve_initiator(&session, &UuidInitiatorIdDeriver).is_none());

        let session = SessionContext::with_user_name("example.com", "alice");
        assert!(resolve_initiator(&session, &NoDeriver).is_none());
    }

    #[test]
    fn test_strip_user_store_domain() {
        assert_eq!(strip_user_store_domain("PRIMARY/alice"), "alice");
        assert_eq!(strip_user_store_domain("alice"), "alice");
        assert_eq!(strip_user_store_domain("LDAP/ou/bob"), "ou/bob");
    }
}
