#![no_main]

use std::sync::OnceLock;

use libfuzzer_sys::fuzz_target;
use modseal_core::crypto::{verify, KeyPair};
use modseal_core::DEFAULT_KEY_BITS;

fn keys() -> &'static KeyPair {
    static KEYS: OnceLock<KeyPair> = OnceLock::new();
    KEYS.get_or_init(|| KeyPair::generate(DEFAULT_KEY_BITS).expect("key generation"))
}

fuzz_target!(|data: &[u8]| {
    // Split input into a claimed signature and a body
    let split = data.first().map_or(0, |&b| b as usize).min(data.len());
    let (signature, body) = data.split_at(split);
    let signature = String::from_utf8_lossy(signature);

    // Verification is a total predicate over untrusted input
    assert!(!verify(body, &signature, &keys().public));
});
