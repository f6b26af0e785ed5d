//! Property-based tests for modseal-core using proptest
//!
//! These tests verify invariants that should hold for all valid inputs.

use std::sync::OnceLock;

use proptest::prelude::*;
use modseal_core::{
    codec::{embed, extract, SIGNATURE_PREFIX},
    crypto::{sign, verify, KeyPair, Signature},
    DEFAULT_KEY_BITS,
};

fn keys(index: usize) -> &'static KeyPair {
    static KEYS: OnceLock<[KeyPair; 2]> = OnceLock::new();
    let keys = KEYS.get_or_init(|| {
        [
            KeyPair::generate(DEFAULT_KEY_BITS).unwrap(),
            KeyPair::generate(DEFAULT_KEY_BITS).unwrap(),
        ]
    });
    &keys[index]
}

// ============================================
// Strategies
// ============================================

/// Bodies that do not themselves begin with a header line
fn arb_body() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..512)
        .prop_filter("body must not start with the header prefix", |body| {
            !body.starts_with(SIGNATURE_PREFIX.as_bytes())
        })
}

fn arb_base64() -> impl Strategy<Value = String> {
    "[A-Za-z0-9+/]{1,700}={0,2}"
}

// ============================================
// Codec properties
// ============================================

proptest! {
    #[test]
    fn prop_header_roundtrip(body in arb_body(), text in arb_base64()) {
        let signature = Signature::from_base64(text.clone());
        let content = embed(&body, &signature);
        let extracted = extract(&content);

        prop_assert_eq!(extracted.signature.as_deref(), Some(text.as_str()));
        prop_assert_eq!(extracted.body, body.as_slice());
    }

    #[test]
    fn prop_unsigned_content_unchanged(body in arb_body()) {
        let extracted = extract(&body);
        prop_assert!(extracted.signature.is_none());
        prop_assert_eq!(extracted.body, body.as_slice());
    }

    #[test]
    fn prop_extract_never_panics(raw in prop::collection::vec(any::<u8>(), 0..1024)) {
        let extracted = extract(&raw);
        // The body is always a suffix of the input
        prop_assert!(raw.ends_with(extracted.body));
    }

    #[test]
    fn prop_verify_rejects_arbitrary_text(body in arb_body(), text in ".{0,800}") {
        prop_assert!(!verify(&body, &text, &keys(0).public));
    }
}

// ============================================
// Signature properties (RSA-heavy, fewer cases)
// ============================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn prop_sign_verify_roundtrip(body in arb_body()) {
        let signature = sign(&body, &keys(0).private).unwrap();
        prop_assert!(verify(&body, signature.as_str(), &keys(0).public));
    }

    #[test]
    fn prop_single_byte_tamper_detected(
        body in prop::collection::vec(any::<u8>(), 1..256),
        index in any::<prop::sample::Index>(),
        flip in 1u8..=255,
    ) {
        let signature = sign(&body, &keys(0).private).unwrap();

        let mut tampered = body.clone();
        let i = index.index(tampered.len());
        tampered[i] ^= flip;

        prop_assert!(!verify(&tampered, signature.as_str(), &keys(0).public));
    }

    #[test]
    fn prop_cross_key_rejected(body in arb_body()) {
        let signature = sign(&body, &keys(0).private).unwrap();
        prop_assert!(!verify(&body, signature.as_str(), &keys(1).public));
    }

    #[test]
    fn prop_signing_is_deterministic(body in arb_body()) {
        let first = sign(&body, &keys(0).private).unwrap();
        let second = sign(&body, &keys(0).private).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn prop_signed_content_verifies(body in arb_body()) {
        let signature = sign(&body, &keys(0).private).unwrap();
        let content = embed(&body, &signature);

        let extracted = extract(&content);
        let claimed = extracted.signature.unwrap();
        prop_assert!(verify(extracted.body, &claimed, &keys(0).public));
    }
}
