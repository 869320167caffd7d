//! Canonical form of service provider records
//!
//! Every path that creates, updates, or lists records goes through
//! [`normalize`] so stored and returned records never diverge.

use rand::{rngs::OsRng, RngCore};

use super::record::ServiceProviderRecord;

/// SAML 1.1 unspecified name identifier format.
pub const NAME_ID_FORMAT_UNSPECIFIED: &str = "urn:oasis:names:tc:SAML:1.1:nameid-format:unspecified";

/// Bring a record into canonical form.
///
/// - issuer and qualifier trimmed, blank qualifier removed
/// - assertion signing forced on
/// - name-ID format `:`-delimited, blank mapped to unspecified
/// - assertion consumer URLs deduplicated in order, default taken from the
///   first URL when unset
/// - attributes-by-default cleared when no attribute index exists
#[must_use]
pub fn normalize(mut record: ServiceProviderRecord) -> ServiceProviderRecord {
    record.issuer = record.issuer.trim().to_string();
    record.issuer_qualifier = record
        .issuer_qualifier
        .map(|q| q.trim().to_string())
        .filter(|q| !q.is_empty());

    // Assertions in a response must always be signed.
    record.do_sign_assertions = true;

    record.name_id_format = internal_name_id_format(Some(&record.name_id_format));

    let mut seen = std::collections::HashSet::new();
    record
        .assertion_consumer_urls
        .retain(|url| !url.trim().is_empty() && seen.insert(url.clone()));
    if record
        .default_assertion_consumer_url
        .as_deref()
        .is_none_or(|url| url.trim().is_empty())
    {
        record.default_assertion_consumer_url = record.assertion_consumer_urls.first().cloned();
    }

    if record.attribute_consuming_service_index.trim().is_empty() {
        record.attribute_consuming_service_index = String::new();
        record.enable_attributes_by_default = false;
    }

    record
}

/// Name-ID format as stored: `:`-delimited, unspecified when blank.
#[must_use]
pub fn internal_name_id_format(format: Option<&str>) -> String {
    match format.map(str::trim).filter(|f| !f.is_empty()) {
        Some(format) => format.replace('/', ":"),
        None => NAME_ID_FORMAT_UNSPECIFIED.to_string(),
    }
}

/// Name-ID format as exposed to admin clients: `/`-delimited.
#[must_use]
pub fn external_name_id_format(format: &str) -> String {
    format.replace(':', "/")
}

/// A random non-negative attribute consuming service index.
#[must_use]
pub fn generate_attribute_index() -> String {
    (OsRng.next_u32() & i32::MAX as u32).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_id_format_conversion() {
        assert_eq!(internal_name_id_format(None), NAME_ID_FORMAT_UNSPECIFIED);
        assert_eq!(internal_name_id_format(Some("  ")), NAME_ID_FORMAT_UNSPECIFIED);
        assert_eq!(
            internal_name_id_format(Some("urn/oasis/names/tc/SAML/1.1/nameid-format/emailAddress")),
            "urn:oasis:names:tc:SAML:1.1:nameid-format:emailAddress"
        );
        assert_eq!(
            external_name_id_format("urn:oasis:names:tc:SAML:2.0:nameid-format:persistent"),
            "urn/oasis/names/tc/SAML/2.0/nameid-format/persistent"
        );
    }

    #[test]
    fn test_normalize_forces_assertion_signing() {
        let record = normalize(ServiceProviderRecord::new("sp1"));
        assert!(record.do_sign_assertions);
        assert_eq!(record.name_id_format, NAME_ID_FORMAT_UNSPECIFIED);
    }

    #[test]
    fn test_normalize_clears_attributes_by_default_without_index() {
        let mut record = ServiceProviderRecord::new("sp1");
        record.enable_attributes_by_default = true;
        record.attribute_consuming_service_index = " ".to_string();
        let record = normalize(record);
        assert_eq!(record.attribute_consuming_service_index, "");
        assert!(!record.enable_attributes_by_default);
    }

    #[test]
    fn test_normalize_acs_urls() {
        let mut record = ServiceProviderRecord::new("sp1");
        record.assertion_consumer_urls = vec![
            "https://sp/acs".to_string(),
            "https://sp/acs2".to_string(),
            "https://sp/acs".to_string(),
        ];
        let record = normalize(record);
        assert_eq!(record.assertion_consumer_urls.len(), 2);
        assert_eq!(
            record.default_assertion_consumer_url.as_deref(),
            Some("https://sp/acs")
        );
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let mut record = ServiceProviderRecord::new(" sp1 ");
        record.issuer_qualifier = Some("".to_string());
        record.name_id_format = "urn/x/y".to_string();
        let once = normalize(record);
        assert_eq!(once.issuer, "sp1");
        assert!(once.issuer_qualifier.is_none());
        assert_eq!(normalize(once.clone()), once);
    }

    #[test]
    fn test_generated_index_is_numeric() {
        let index = generate_attribute_index();
        assert!(!index.is_empty());
        assert!(index.parse::<i32>().unwrap() >= 0);
    }

    #[test]
    fn test_generated_indexes_are_non_negative_and_vary() {
        let indexes: std::collections::HashSet<i32> = (0..64)
            .map(|_| generate_attribute_index().parse::<i32>().unwrap())
            .collect();
        assert!(indexes.iter().all(|i| *i >= 0));
        assert!(indexes.len() > 1);
    }
}
