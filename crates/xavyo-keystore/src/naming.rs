//! Tenant keystore naming.

/// Extension appended to tenant keystore names unless configured otherwise.
pub const DEFAULT_KEYSTORE_EXTENSION: &str = "jks";

/// Derive the keystore name for a tenant domain.
///
/// Dots become dashes and the extension is appended, so `example.com` with
/// extension `jks` maps to `example-com.jks`.
#[must_use]
pub fn tenant_keystore_name(tenant_domain: &str, extension: &str) -> String {
    let base = tenant_domain.trim().replace('.', "-");
    let extension = extension.trim().trim_start_matches('.');
    if extension.is_empty() {
        base
    } else {
        format!("{base}.{extension}")
    }
}
