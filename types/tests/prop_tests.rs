use proptest::prelude::*;

use fedchain_types::{FullSignature, Hash, PublicKey, Signature, Timestamp};

proptest! {
    /// Hash roundtrip: new -> as_bytes -> new produces identical hash.
    #[test]
    fn hash_roundtrip(bytes in prop::array::uniform32(0u8..)) {
        let hash = Hash::new(bytes);
        prop_assert_eq!(hash.as_bytes(), &bytes);
    }

    /// Hash::is_zero is true only for all-zero bytes.
    #[test]
    fn hash_is_zero_correct(bytes in prop::array::uniform32(0u8..)) {
        let hash = Hash::new(bytes);
        prop_assert_eq!(hash.is_zero(), bytes == [0u8; 32]);
    }

    /// Hash hex form parses back to the same hash.
    #[test]
    fn hash_hex_roundtrip(bytes in prop::array::uniform32(0u8..)) {
        let hash = Hash::new(bytes);
        prop_assert_eq!(Hash::from_hex(&hash.to_hex()), Some(hash));
    }

    /// Hash JSON serialization roundtrip.
    #[test]
    fn hash_json_roundtrip(bytes in prop::array::uniform32(0u8..)) {
        let hash = Hash::new(bytes);
        let encoded = serde_json::to_string(&hash).unwrap();
        let decoded: Hash = serde_json::from_str(&encoded).unwrap();
        prop_assert_eq!(decoded, hash);
    }

    /// Timestamp ordering: from_millis(a) <= from_millis(b) iff a <= b.
    #[test]
    fn timestamp_ordering(a in 0u64..u64::MAX, b in 0u64..u64::MAX) {
        let ta = Timestamp::from_millis(a);
        let tb = Timestamp::from_millis(b);
        prop_assert_eq!(ta <= tb, a <= b);
        prop_assert_eq!(ta == tb, a == b);
    }

    /// Timestamp elapsed_since: elapsed_since(now) = now - self (saturating).
    #[test]
    fn timestamp_elapsed_since(base in 0u64..1_000_000, offset in 0u64..1_000_000) {
        let t = Timestamp::from_millis(base);
        let now = Timestamp::from_millis(base + offset);
        prop_assert_eq!(t.elapsed_since(now), offset);
    }

    /// Timestamp elapsed_since saturates to 0 when now < self.
    #[test]
    fn timestamp_elapsed_since_saturates(
        base in 1u64..1_000_000,
        deficit in 1u64..1_000_000,
    ) {
        let later = Timestamp::from_millis(base + deficit);
        let earlier = Timestamp::from_millis(base);
        prop_assert_eq!(later.elapsed_since(earlier), 0);
    }

    /// fits_wire agrees with the 48-bit bound.
    #[test]
    fn timestamp_fits_wire(millis in any::<u64>()) {
        let t = Timestamp::from_millis(millis);
        prop_assert_eq!(t.fits_wire(), millis < (1u64 << 48));
    }

    /// FullSignature JSON roundtrip preserves both key and signature.
    #[test]
    fn full_signature_json_roundtrip(
        key in prop::array::uniform32(0u8..),
        sig_hi in prop::array::uniform32(0u8..),
        sig_lo in prop::array::uniform32(0u8..),
    ) {
        let mut sig = [0u8; 64];
        sig[..32].copy_from_slice(&sig_hi);
        sig[32..].copy_from_slice(&sig_lo);
        let full = FullSignature::new(PublicKey(key), Signature(sig));
        let encoded = serde_json::to_string(&full).unwrap();
        let decoded: FullSignature = serde_json::from_str(&encoded).unwrap();
        prop_assert_eq!(decoded, full);
    }
}
