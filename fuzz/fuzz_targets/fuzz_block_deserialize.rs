#![no_main]

use fedchain_ledger::FBlock;
use libfuzzer_sys::fuzz_target;

// Malformed Factoid blocks must be rejected without panicking; accepted ones
// must re-marshal to the exact input.
fuzz_target!(|data: &[u8]| {
    if let Ok(block) = FBlock::unmarshal_binary(data) {
        let encoded = block.marshal_binary().expect("decoded block re-encodes");
        assert_eq!(encoded, data);
    }
});
