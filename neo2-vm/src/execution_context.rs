//! Execution context: one frame of the invocation stack.

use crate::crypto::hash160;
use crate::error::{VmError, VmResult};
use crate::op_code::OpCode;
use std::cell::OnceCell;
use std::rc::Rc;

/// A script being executed with its instruction pointer.
#[derive(Clone)]
pub struct ExecutionContext {
    script: Rc<Vec<u8>>,
    instruction_pointer: usize,
    push_only: bool,
    script_hash: OnceCell<[u8; 20]>,
}

impl ExecutionContext {
    /// Creates a context positioned at the start of `script`.
    #[must_use]
    pub fn new(script: Rc<Vec<u8>>, push_only: bool) -> Self {
        Self {
            script,
            instruction_pointer: 0,
            push_only,
            script_hash: OnceCell::new(),
        }
    }

    /// The script bytes.
    #[must_use]
    pub fn script(&self) -> &[u8] {
        &self.script
    }

    /// Script length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.script.len()
    }

    /// Whether the script is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.script.is_empty()
    }

    /// Current instruction pointer.
    #[must_use]
    pub fn instruction_pointer(&self) -> usize {
        self.instruction_pointer
    }

    /// Moves the instruction pointer.
    pub fn set_instruction_pointer(&mut self, ip: usize) {
        self.instruction_pointer = ip;
    }

    /// Whether only push opcodes are permitted in this context.
    #[must_use]
    pub fn is_push_only(&self) -> bool {
        self.push_only
    }

    /// The 20-byte hash of the script, computed on first use.
    #[must_use]
    pub fn script_hash(&self) -> [u8; 20] {
        *self.script_hash.get_or_init(|| hash160(&self.script))
    }

    /// The opcode at the instruction pointer; `RET` once past the end.
    #[must_use]
    pub fn next_instruction(&self) -> OpCode {
        self.script
            .get(self.instruction_pointer)
            .map_or(OpCode::RET, |byte| OpCode(*byte))
    }

    /// Reads `count` bytes at an absolute offset, failing when the script is
    /// too short.
    pub fn read_bytes(&self, offset: usize, count: usize) -> VmResult<&[u8]> {
        self.script
            .get(offset..offset.saturating_add(count))
            .ok_or_else(|| VmError::out_of_bounds(offset, count, self.script.len()))
    }

    /// Clone used by `CALL`: shares the script and its cached hash, keeps the
    /// current position.
    #[must_use]
    pub fn duplicate(&self) -> Self {
        self.clone()
    }
}
