#![no_main]

use concord_governance::codec::ArgReader;
use concord_governance::{Amendment, CallContext, GovernedTarget, TextStore};
use concord_types::Address;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Call data comes from signers and proposers; decoding must never panic.
    if let Ok(amendment) = Amendment::decode(data) {
        // Decoded amendments survive a re-encode.
        assert_eq!(Amendment::decode(&amendment.encode()).ok(), Some(amendment));
    }

    let reader = ArgReader::new(data);
    let _ = reader.address_array(0);
    let _ = reader.bool_array(1);
    let _ = reader.string(0);

    let mut store = TextStore::new(Address::ZERO);
    let ctx = CallContext {
        caller: Address::ZERO,
        value: 0,
    };
    let _ = store.perform(ctx, data);
});
