#![no_main]

use concord_governance::{EngineSnapshot, GovernanceEngine, GovernedExecutor};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // State files may be truncated or tampered with.
    if let Ok(snapshot) = bincode::deserialize::<EngineSnapshot>(data) {
        let _ = GovernanceEngine::from_snapshot(snapshot, GovernedExecutor::new());
    }
});
