#![no_main]
use libfuzzer_sys::fuzz_target;
use rplib::path::parse_path;
use rplib::Library;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        // Parsing and displaying a path should round trip and never panic.
        if let Ok(path) = parse_path(s) {
            let text = path.to_string();
            assert_eq!(parse_path(&text).ok(), Some(path));

            let mut lib = Library::new("run");
            let _ = lib.put_text(&text, "x", false);
            let _ = lib.get(&text);
        }
    }
});
