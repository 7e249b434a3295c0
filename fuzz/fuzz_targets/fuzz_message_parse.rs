#![no_main]

use fedchain_messages::{decode_message, ProtocolMessage};
use libfuzzer_sys::fuzz_target;

// Anything that decodes must re-marshal to the exact input.
fuzz_target!(|data: &[u8]| {
    let Ok(message) = decode_message(data) else {
        return;
    };
    let _ = message.verify_signature();
    let _ = message.msg_hash();
    let encoded = message.marshal_binary().expect("decoded message re-encodes");
    assert_eq!(encoded, data);
});
