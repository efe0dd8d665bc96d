#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Arbitrary extracts must never split a char or leave raw markup behind
    if let Ok(s) = std::str::from_utf8(data)
        && let Some(rendered) = docbar_core::snippet::render(s, 64)
    {
        assert!(rendered.chars().filter(|c| *c == '<' || *c == '>').count() == 0);
    }
});
