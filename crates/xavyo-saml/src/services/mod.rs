//! Service provider registration services

mod cert_import;
pub mod issuer_conflict;
pub mod sp_registrar;

pub use issuer_conflict::{resolve_issuer_conflict, IssuerConflict};
pub use sp_registrar::{SamlAdminServices, ServiceProviderRegistrar};
