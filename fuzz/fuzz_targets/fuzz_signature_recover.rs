#![no_main]

use concord_crypto::recover_signer;
use concord_types::{Digest, RecoverableSignature};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // 32-byte digest followed by a 65-byte signature.
    if data.len() < 97 {
        return;
    }
    let Ok(digest) = Digest::from_slice(&data[..32]) else {
        return;
    };
    let Ok(signature) = RecoverableSignature::from_slice(&data[32..97]) else {
        return;
    };
    let _ = recover_signer(&digest, &signature);
});
