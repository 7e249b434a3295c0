#![no_main]

use fedchain_protocol::{Decode, Encode, Reader};
use fedchain_types::{FullSignature, Hash, Timestamp};
use libfuzzer_sys::fuzz_target;

// Field readers must never panic. Fixed-width reads consume nothing on failure.
fuzz_target!(|data: &[u8]| {
    let mut reader = Reader::new(data);
    loop {
        let before = reader.remaining();
        let (ok, fixed_width) = match before % 4 {
            0 => (reader.read_u32("u32").is_ok(), true),
            1 => (reader.read_var_bytes("var").is_ok(), false),
            2 => (reader.read::<Timestamp>().is_ok(), true),
            _ => (reader.read::<FullSignature>().is_ok(), true),
        };
        if !ok {
            if fixed_width {
                assert_eq!(reader.remaining(), before, "failed read consumed input");
            }
            break;
        }
        if reader.is_empty() {
            break;
        }
    }

    // A decoded hash re-encodes to the same bytes.
    if let Ok((hash, _)) = Hash::decode_prefix(data) {
        let encoded = hash.to_bytes().expect("hash always encodes");
        assert_eq!(&encoded[..], &data[..32]);
    }
});
