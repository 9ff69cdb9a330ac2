//! Fuzz target for raw socket frames
//!
//! # Invariants
//!
//! - `parse` never panics on arbitrary text
//! - A parsed event always carries a known tag
//! - `parse` and `decode` agree on which frames are accepted

#![no_main]

use aryu_proto::{ServerEvent, envelope};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(raw) = std::str::from_utf8(data) else {
        return;
    };

    let parsed = envelope::parse(raw);
    let decoded = envelope::decode(raw);

    assert_eq!(parsed.is_some(), decoded.is_ok());
    if let Some(event) = parsed {
        assert!(ServerEvent::KNOWN_TYPES.contains(&event.kind()));
    }
});
