//! Script builder.
//!
//! Fluent helpers for assembling scripts programmatically; used by callers
//! and heavily by tests.

use crate::error::{VmError, VmResult};
use crate::op_code::OpCode;
use num_bigint::BigInt;
use num_traits::ToPrimitive;

/// Helps construct VM scripts programmatically.
#[derive(Default)]
pub struct ScriptBuilder {
    script: Vec<u8>,
}

impl ScriptBuilder {
    /// Creates a new script builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Emits a single opcode.
    pub fn emit(&mut self, op: OpCode) -> &mut Self {
        self.script.push(op.value());
        self
    }

    /// Emits raw bytes.
    pub fn emit_raw(&mut self, bytes: &[u8]) -> &mut Self {
        self.script.extend_from_slice(bytes);
        self
    }

    /// Emits the shortest push for the given data.
    pub fn emit_push(&mut self, data: &[u8]) -> &mut Self {
        let len = data.len();
        if len == 0 {
            return self.emit(OpCode::PUSH0);
        }
        if len <= OpCode::PUSHBYTES75.value() as usize {
            self.script.push(len as u8);
        } else if len <= 0xFF {
            self.emit(OpCode::PUSHDATA1);
            self.script.push(len as u8);
        } else if len <= 0xFFFF {
            self.emit(OpCode::PUSHDATA2);
            self.script.extend_from_slice(&(len as u16).to_le_bytes());
        } else {
            self.emit(OpCode::PUSHDATA4);
            self.script.extend_from_slice(&(len as u32).to_le_bytes());
        }
        self.script.extend_from_slice(data);
        self
    }

    /// Emits the shortest push for the given integer.
    pub fn emit_push_int(&mut self, value: &BigInt) -> &mut Self {
        if let Some(small) = value.to_i64() {
            if small == -1 {
                return self.emit(OpCode::PUSHM1);
            }
            if small == 0 {
                return self.emit(OpCode::PUSH0);
            }
            if (1..=16).contains(&small) {
                self.script.push(OpCode::PUSH1.value() - 1 + small as u8);
                return self;
            }
        }
        let bytes = value.to_signed_bytes_le();
        self.emit_push(&bytes)
    }

    /// Emits a boolean push.
    pub fn emit_push_bool(&mut self, value: bool) -> &mut Self {
        if value {
            self.emit(OpCode::PUSH1)
        } else {
            self.emit(OpCode::PUSH0)
        }
    }

    /// Emits a jump-family opcode with a relative offset (relative to the
    /// opcode's own position).
    pub fn emit_jump(&mut self, op: OpCode, offset: i16) -> &mut Self {
        self.emit(op);
        self.script.extend_from_slice(&offset.to_le_bytes());
        self
    }

    /// Emits a `SYSCALL` with a length-prefixed ASCII API name.
    pub fn emit_syscall(&mut self, api: &str) -> VmResult<&mut Self> {
        if api.is_empty() || api.len() > 252 {
            return Err(VmError::invalid_operation(format!(
                "syscall name length {} out of range",
                api.len()
            )));
        }
        self.emit(OpCode::SYSCALL);
        self.script.push(api.len() as u8);
        self.script.extend_from_slice(api.as_bytes());
        Ok(self)
    }

    /// Emits an `APPCALL` (or `TAILCALL`) to the given script hash; an
    /// all-zero hash makes the call dynamic.
    pub fn emit_appcall(&mut self, script_hash: &[u8; 20], tail_call: bool) -> &mut Self {
        self.emit(if tail_call {
            OpCode::TAILCALL
        } else {
            OpCode::APPCALL
        });
        self.script.extend_from_slice(script_hash);
        self
    }

    /// The assembled script.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        self.script.clone()
    }

    /// Consumes the builder, returning the script.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.script
    }
}
