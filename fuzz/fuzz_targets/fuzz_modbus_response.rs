//! Fuzz target: Modbus response validation
//!
//! Feeds arbitrary bytes as an MBAP header + body into the response
//! checker and asserts it never panics and never accepts a frame that
//! is not a faithful echo of the request.
//!
//! cargo fuzz run fuzz_modbus_response

#![no_main]

use libfuzzer_sys::fuzz_target;
use porterbot::device::modbus::{HEADER_LEN, body_len, check_write_response, encode_write_single};

fuzz_target!(|data: &[u8]| {
    if data.len() < HEADER_LEN {
        return;
    }
    let mut header = [0u8; HEADER_LEN];
    header.copy_from_slice(&data[..HEADER_LEN]);
    let body = &data[HEADER_LEN..];

    let _ = body_len(&header);

    // Arbitrary frames must never be accepted as an echo of a request
    // they do not match.
    let accepted = check_write_response(&header, body, 0xBEEF, 9, 0x0102, 0x0304).is_ok();
    if accepted {
        let expected = encode_write_single(0xBEEF, 9, 0x0102, 0x0304);
        assert_eq!(&expected[..4], &header[..4], "txn/protocol must match");
        assert_eq!(expected[6], header[6], "unit must match");
        assert_eq!(&expected[HEADER_LEN..], body, "PDU must be a faithful echo");
    }
});
