#![no_main]

use libfuzzer_sys::fuzz_target;
use modseal_core::codec::{embed, extract, SIGNATURE_PREFIX};
use modseal_core::crypto::Signature;

fuzz_target!(|data: &[u8]| {
    // Parsing arbitrary bytes should not panic
    let extracted = extract(data);
    assert!(data.ends_with(extracted.body));

    match &extracted.signature {
        Some(signature) => {
            assert!(data.starts_with(SIGNATURE_PREFIX.as_bytes()));
            assert!(!signature.contains('\n'));
        }
        None => assert_eq!(extracted.body, data),
    }

    // Re-embedding under any header recovers the same body
    let content = embed(extracted.body, &Signature::from_base64("QUJD"));
    let again = extract(&content);
    assert_eq!(again.signature.as_deref(), Some("QUJD"));
    assert_eq!(again.body, extracted.body);
});
