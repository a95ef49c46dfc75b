//! Error types for the virtual machine.

use thiserror::Error;

/// VM execution errors. Every variant faults the current execution; the
/// harness surfaces the message through its trace when one is attached.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VmError {
    /// Operand or payload read past the end of the script.
    #[error("script out of bounds: {requested} bytes at offset {offset}, script length {length}")]
    ScriptOutOfBounds {
        offset: usize,
        requested: usize,
        length: usize,
    },

    /// Unknown opcode byte.
    #[error("invalid opcode: {opcode:#04x}")]
    InvalidOpCode { opcode: u8 },

    /// Non-push opcode inside a push-only context.
    #[error("push-only context rejected opcode {opcode:#04x}")]
    PushOnlyViolation { opcode: u8 },

    /// Stack underflow.
    #[error("stack underflow: requested item {requested}, {available} available")]
    StackUnderflow { requested: usize, available: usize },

    /// Invocation stack grew past the interpreter's depth bound.
    #[error("invocation stack limit exceeded: {depth}")]
    InvocationDepthExceeded { depth: usize },

    /// Invalid operation with context.
    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    /// Item of the wrong kind for the operation.
    #[error("invalid type: expected {expected}")]
    InvalidType { expected: &'static str },

    /// Division or modulo by zero.
    #[error("division by zero")]
    DivisionByZero,

    /// Shift amount outside the interpreter's bound.
    #[error("shift out of range: {0}")]
    ShiftOutOfRange(i64),

    /// Signature check executed without a script container.
    #[error("no script container to verify against")]
    MissingContainer,

    /// `SYSCALL` executed without a registered interop service.
    #[error("no interop service registered")]
    MissingInteropService,

    /// Call target could not be resolved through the script table.
    #[error("unknown contract: {hash}")]
    UnknownContract { hash: String },

    /// Interop service failure.
    #[error("syscall {api}: {message}")]
    Syscall { api: String, message: String },

    /// `THROW` was executed.
    #[error("THROW is executed")]
    Throw,

    /// `THROWIFNOT` was executed with a false condition.
    #[error("THROWIFNOT is executed with false condition")]
    ThrowIfNot,
}

impl VmError {
    /// Create a new out-of-bounds error.
    #[must_use]
    pub const fn out_of_bounds(offset: usize, requested: usize, length: usize) -> Self {
        Self::ScriptOutOfBounds {
            offset,
            requested,
            length,
        }
    }

    /// Create a new invalid operation error.
    pub fn invalid_operation<S: Into<String>>(message: S) -> Self {
        Self::InvalidOperation(message.into())
    }

    /// Create a new invalid type error.
    #[must_use]
    pub const fn invalid_type(expected: &'static str) -> Self {
        Self::InvalidType { expected }
    }

    /// Create a new stack underflow error.
    #[must_use]
    pub const fn stack_underflow(requested: usize, available: usize) -> Self {
        Self::StackUnderflow {
            requested,
            available,
        }
    }

    /// Create a new syscall error.
    pub fn syscall<A: Into<String>, M: Into<String>>(api: A, message: M) -> Self {
        Self::Syscall {
            api: api.into(),
            message: message.into(),
        }
    }
}

/// Result type for VM operations.
pub type VmResult<T> = std::result::Result<T, VmError>;
