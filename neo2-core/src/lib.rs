//! Metered smart-contract execution harness over the legacy Neo VM.
//!
//! The crate wraps the [`neo2_vm`] interpreter with per-instruction gas
//! accounting, pre-execution limit checks, and the dynamic-invoke
//! authorization gate. It also carries the protocol primitives, the snapshot
//! cache layer, the default syscall dispatcher, and the one-shot bootstrap
//! entry points.

pub mod application_engine;
pub mod block;
pub mod bootstrap;
pub mod contract_state;
pub mod fixed8;
pub mod interop;
pub mod ledger;
pub mod snapshot;
pub mod state;
pub mod trigger;
pub mod uint;

pub use application_engine::{ApplicationEngine, EngineFault};
pub use block::{Block, Header, Witness};
pub use bootstrap::{run, run_with_debug};
pub use contract_state::{ContractPropertyState, ContractState};
pub use fixed8::Fixed8;
pub use interop::StateReader;
pub use ledger::{LedgerView, MemoryLedger};
pub use snapshot::{ContractTable, DataCache, Snapshot, SnapshotTable};
pub use trigger::TriggerType;
pub use uint::{UInt160, UInt256};

/// Seconds between consecutive blocks, used when synthesizing the
/// persisting block.
pub const SECONDS_PER_BLOCK: u32 = 15;
