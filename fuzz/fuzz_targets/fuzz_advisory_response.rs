//! Fuzz target: `advisory_http::parse_response`
//!
//! Feeds arbitrary bodies and status codes into the advisory response
//! parser. It must never panic and never return more text than an advice
//! buffer holds.
//!
//! cargo fuzz run fuzz_advisory_response

#![no_main]

use aquamood::adapters::advisory_http::parse_response;
use aquamood::advisory::ADVICE_CAP;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() < 2 {
        return;
    }
    let status = u16::from_le_bytes([data[0], data[1]]) % 600;
    if let Ok(resp) = parse_response(status, &data[2..]) {
        assert_eq!(resp.status, status);
        assert!(resp.text.len() <= ADVICE_CAP);
        if !(200..300).contains(&status) {
            assert!(resp.text.is_empty());
        }
    }
});
