#![no_main]
use libfuzzer_sys::fuzz_target;
use rplib::parser::parse_bytes;
use rplib::serial::serialize;

fuzz_target!(|data: &[u8]| {
    // Parse -> serialize -> parse roundtrip should never panic
    if let Ok(doc) = parse_bytes(data) {
        let output = serialize(&doc);
        let _ = parse_bytes(output.as_bytes());
    }
});
