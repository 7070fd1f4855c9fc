#![no_main]

use libfuzzer_sys::fuzz_target;
use underbar::json::from_json;
use underbar::{Realm, is_equal};

fuzz_target!(|data: &[u8]| {
    // Two JSON documents separated by a NUL byte
    let mut parts = data.splitn(2, |b| *b == 0);
    let (Some(left), Some(right)) = (parts.next(), parts.next()) else {
        return;
    };
    let (Ok(left), Ok(right)) = (
        serde_json::from_slice::<serde_json::Value>(left),
        serde_json::from_slice::<serde_json::Value>(right),
    ) else {
        return;
    };

    let realm = Realm::new();
    let a = from_json(&realm, &left);
    let b = from_json(&realm, &right);

    // Reflexive on identical and on freshly built copies, and symmetric
    assert!(is_equal(&a, &a));
    assert!(is_equal(&a, &from_json(&realm, &left)));
    assert_eq!(is_equal(&a, &b), is_equal(&b, &a));
});
