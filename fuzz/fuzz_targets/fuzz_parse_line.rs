#![no_main]
use libfuzzer_sys::fuzz_target;
use sensorlog::protocol::{parse_line, Line};

fuzz_target!(|data: &[u8]| {
    let line = String::from_utf8_lossy(data);
    if let Ok(Line::Record(_)) = parse_line(&line) {
        // Anything we accept must have come from exactly four fields.
        assert_eq!(line.trim().split(',').count(), 4);
    }
});
