//! Signing credentials and their per-tenant resolution.

pub mod cell;
pub mod resolver;
pub mod signing;

pub use cell::SignKeyStoreCell;
pub use resolver::CredentialResolver;
pub use signing::{CredentialContextSet, CredentialType, SigningCredential, UsageType};
