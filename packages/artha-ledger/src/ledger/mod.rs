//! Paper-trading ledger.
//!
//! Provides the account state machine plus the seams it is driven through:
//! an injectable noise source for simulated drift and an injectable clock
//! for timestamps and history retention.

mod clock;
mod engine;
mod handle;
mod noise;
mod retention;
mod seed;

pub use clock::{Clock, ManualClock, SystemClock};
pub use engine::LedgerEngine;
pub use handle::LedgerHandle;
pub use noise::{FixedNoise, NoiseSource, RandomNoise, ScriptedNoise};
pub use retention::retain_recent;
