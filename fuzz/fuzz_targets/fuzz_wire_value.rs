//! Fuzz target: `WireValue::from_payload` / `decode`
//!
//! Drives arbitrary notification payloads through the receive path and
//! asserts that the slot never grows past the field width, stays
//! NUL-padded, and that any value that decodes re-encodes to a field
//! that decodes again.
//!
//! cargo fuzz run fuzz_wire_value

#![no_main]

use adxl_link::protocol::{WIRE_WIDTH, WireValue};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let wire = WireValue::from_payload(data);

    let n = data.len().min(WIRE_WIDTH);
    assert_eq!(wire.as_bytes(), &data[..n]);
    assert!(wire.padded()[n..].iter().all(|b| *b == 0));

    // Display must never panic on non-UTF-8 input.
    let _ = wire.to_string();

    if let Some(v) = wire.decode() {
        let again = WireValue::encode(v);
        assert_eq!(again.as_bytes().len(), WIRE_WIDTH);
        if v.is_finite() {
            assert!(again.decode().is_some() || v.abs() >= 1.0e7);
        }
    }
});
