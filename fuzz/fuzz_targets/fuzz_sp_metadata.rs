//! Fuzz target for SP metadata parsing.
//!
//! Parsed records must survive normalization and the DTO conversion
//! without panicking.
//!
//! Run with:
//! cargo +nightly fuzz run fuzz_sp_metadata -- -max_total_time=600

#![no_main]

use libfuzzer_sys::fuzz_target;
use xavyo_saml::{normalize, MetadataParser, SpMetadataParser};

fuzz_target!(|data: &[u8]| {
    let Ok(xml) = std::str::from_utf8(data) else {
        return;
    };

    if let Ok(record) = SpMetadataParser::new().parse(xml) {
        assert!(!record.issuer.trim().is_empty());
        assert!(!record.assertion_consumer_urls.is_empty());

        let normalized = normalize(record);
        assert!(normalized.do_sign_assertions);
        assert_eq!(normalize(normalized.clone()), normalized);

        let _ = normalized.to_dto();
        let _ = normalized.effective_issuer();
    }
});
