//! Fuzz target for per-frame JSON annotation parsing.
//!
//! Arbitrary bytes go straight to the JSON parser, checking for panics,
//! crashes, or hangs in category resolution and box checks.

#![no_main]

use libfuzzer_sys::fuzz_target;
use labelprep::source::json::fuzz_parse_json;

fuzz_target!(|data: &[u8]| {
    if data.len() > 10 * 1024 * 1024 {
        return;
    }

    let _ = fuzz_parse_json(data);
});
