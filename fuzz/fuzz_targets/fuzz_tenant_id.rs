//! Fuzz target for tenant id parsing.
//!
//! Run with:
//! cargo +nightly fuzz run fuzz_tenant_id -- -max_total_time=600

#![no_main]

use libfuzzer_sys::fuzz_target;
use xavyo_core::TenantId;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(id) = s.parse::<TenantId>() {
            // Display output parses back to the same id
            let parsed: TenantId = id.to_string().parse().unwrap();
            assert_eq!(parsed, id);
            assert_eq!(id.is_super_tenant(), id.as_i32() == 0);
        }
    }

    if data.len() == 4 {
        let raw = i32::from_be_bytes([data[0], data[1], data[2], data[3]]);
        let id = TenantId::from(raw);
        assert_eq!(id.as_i32(), raw);
    }
});
