//! Seams the host plugs into the interpreter.

use crate::error::VmResult;
use crate::execution_engine::ExecutionEngine;
use crate::trace::ExecutionTrace;
use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

/// The signable payload an execution runs on behalf of (a transaction or
/// block); `CHECKSIG`-family opcodes verify against its message.
pub trait ScriptContainer {
    /// The bytes signatures are verified over.
    fn message(&self) -> Vec<u8>;
}

/// Resolves a script hash to deployed script bytes for `APPCALL`/`TAILCALL`.
pub trait ScriptTable {
    /// The script stored under `script_hash`, if any.
    fn script(&self, script_hash: &[u8; 20]) -> Option<Vec<u8>>;
}

/// Dispatcher for the `SYSCALL` opcode. The interpreter hands over the
/// decoded API name and itself; the service reads arguments from and pushes
/// results onto the evaluation stack.
pub trait InteropService {
    /// Executes the named syscall. An error faults the step.
    fn invoke(&mut self, api: &str, engine: &mut ExecutionEngine) -> VmResult<()>;

    /// Receives the trace when debugging begins, so service operations are
    /// logged alongside VM steps.
    fn attach_trace(&mut self, _trace: Rc<RefCell<ExecutionTrace>>) {}

    /// Downcasting access to the concrete service.
    fn as_any(&self) -> &dyn Any;
}
