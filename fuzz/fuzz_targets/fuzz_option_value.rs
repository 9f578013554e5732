#![no_main]

use libfuzzer_sys::fuzz_target;
use livebuild::options::{OptionAssignment, OptionValue};

fuzz_target!(|data: &[u8]| {
    if let Ok(raw) = std::str::from_utf8(data) {
        let value = OptionValue::parse(Some(raw));
        let _ = value.to_args();
        let _ = OptionAssignment::parse(raw);
    }
});
