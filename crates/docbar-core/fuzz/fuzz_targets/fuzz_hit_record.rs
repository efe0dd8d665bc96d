#![no_main]

use docbar_bus::HitRecord;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Split arbitrary text into field/value pairs and run them through the
    // record parser and locator rewriting. Neither may panic.
    let Ok(s) = std::str::from_utf8(data) else {
        return;
    };

    let parts: Vec<&str> = s.split('\n').collect();
    let fields = parts
        .chunks(2)
        .map(|pair| {
            (
                pair[0].to_string(),
                pair.get(1).copied().unwrap_or_default().to_string(),
            )
        })
        .collect();

    if let Ok(hit) = HitRecord::Fields(fields).into_hit(None) {
        let _ = docbar_core::locator::normalize(&hit.locator);
        let _ = docbar_core::locator::display_path(&hit.locator, None);
    }
});
