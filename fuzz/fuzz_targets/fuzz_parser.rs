#![no_main]

use complua_syntax::parser::parse_chunk;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // The parser must never panic on any input — errors are fine, panics are bugs.
    let _ = parse_chunk(data);
});
