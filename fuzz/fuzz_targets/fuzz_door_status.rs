//! Fuzz target: `DoorSnapshot::decode`
//!
//! Drives arbitrary byte sequences through the door-status decoder and
//! asserts that it never panics — every malformed payload must come
//! back as `None` (which the guard classifies as unsafe), never as a
//! crash.
//!
//! cargo fuzz run fuzz_door_status

#![no_main]

use libfuzzer_sys::fuzz_target;
use porterbot::guard::DoorSnapshot;

fuzz_target!(|data: &[u8]| {
    let Ok(payload) = std::str::from_utf8(data) else {
        return;
    };

    if let Some(snapshot) = DoorSnapshot::decode(payload) {
        // A decoded snapshot must classify without panicking either way.
        let _ = snapshot.all_closed();
    }
});
