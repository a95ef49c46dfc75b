//! Host services invoked through the `SYSCALL` opcode.

mod state_reader;
mod storage_context;

pub use state_reader::{BlockHandle, ContractHandle, HeaderHandle, StateReader};
pub use storage_context::StorageContext;
