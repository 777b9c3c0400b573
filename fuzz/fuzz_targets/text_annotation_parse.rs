//! Fuzz target for text annotation parsing.
//!
//! Input need not be UTF-8: the parser decodes every byte as latin-1, so
//! the raw data is passed through unchanged.

#![no_main]

use libfuzzer_sys::fuzz_target;
use labelprep::source::text::fuzz_parse_text;

fuzz_target!(|data: &[u8]| {
    if data.len() > 10 * 1024 * 1024 {
        return;
    }

    let _ = fuzz_parse_text(data);
});
