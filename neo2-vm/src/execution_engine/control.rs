//! Flow control, calls, and syscall dispatch.

use super::ExecutionEngine;
use crate::error::{VmError, VmResult};
use crate::op_code::OpCode;
use crate::vm_state::VMState;
use crate::MAX_INVOCATION_DEPTH;

impl ExecutionEngine {
    /// Jump offsets are signed 16-bit, relative to the opcode's position.
    /// A target equal to the script length is permitted and terminates with
    /// the implicit `RET` on the next step.
    pub(super) fn op_jump(&mut self, op: OpCode) -> VmResult<()> {
        let operand = self.operand(2)?;
        self.trace_param(op, &operand);
        let offset = i16::from_le_bytes([operand[0], operand[1]]) as isize;
        let (ip, length) = {
            let context = self
                .current_context()
                .ok_or_else(|| VmError::invalid_operation("no current context"))?;
            (context.instruction_pointer() as isize, context.len() as isize)
        };
        let target = ip + offset;
        if target < 0 || target > length {
            return Err(VmError::invalid_operation(format!(
                "jump target {target} out of range"
            )));
        }
        let taken = match op {
            OpCode::JMPIF => self.pop_bool()?,
            OpCode::JMPIFNOT => !self.pop_bool()?,
            _ => true,
        };
        if taken {
            self.set_ip(target as usize)
        } else {
            self.advance(3)
        }
    }

    /// `CALL` clones the current context and jumps inside the same script;
    /// the caller resumes past the operand when the callee returns.
    pub(super) fn op_call(&mut self) -> VmResult<()> {
        if self.invocation_stack().len() >= MAX_INVOCATION_DEPTH {
            return Err(VmError::InvocationDepthExceeded {
                depth: self.invocation_stack().len(),
            });
        }
        let operand = self.operand(2)?;
        self.trace_param(OpCode::CALL, &operand);
        let offset = i16::from_le_bytes([operand[0], operand[1]]) as isize;
        let (ip, length, callee) = {
            let context = self
                .current_context()
                .ok_or_else(|| VmError::invalid_operation("no current context"))?;
            (
                context.instruction_pointer() as isize,
                context.len() as isize,
                context.duplicate(),
            )
        };
        let target = ip + offset;
        if target < 0 || target > length {
            return Err(VmError::invalid_operation(format!(
                "call target {target} out of range"
            )));
        }
        self.advance(3)?;
        let mut callee = callee;
        callee.set_instruction_pointer(target as usize);
        self.invocation_stack.push(callee);
        Ok(())
    }

    pub(super) fn op_ret(&mut self) -> VmResult<()> {
        self.invocation_stack.pop();
        if self.invocation_stack.is_empty() {
            self.state.insert(VMState::HALT);
        }
        Ok(())
    }

    /// `APPCALL`/`TAILCALL`: 20-byte callee hash after the opcode; all-zero
    /// means the target is popped from the evaluation stack. The callee
    /// script is resolved through the script table.
    pub(super) fn op_appcall(&mut self, op: OpCode) -> VmResult<()> {
        let table = self
            .table
            .clone()
            .ok_or_else(|| VmError::invalid_operation("no script table for contract call"))?;
        let operand = self.operand(20)?;
        self.trace_param(op, &operand);
        let mut hash = [0u8; 20];
        hash.copy_from_slice(&operand);
        if hash.iter().all(|byte| *byte == 0) {
            let target = self.pop_bytes()?;
            if target.len() != 20 {
                return Err(VmError::invalid_operation(
                    "dynamic call target must be a 20-byte script hash",
                ));
            }
            hash.copy_from_slice(&target);
        }
        let script = table.script(&hash).ok_or_else(|| VmError::UnknownContract {
            hash: hex::encode(hash),
        })?;
        self.advance(21)?;
        if op == OpCode::TAILCALL {
            self.invocation_stack.pop();
        }
        self.load_script(script, false)
    }

    /// `SYSCALL`: 1-byte length plus ASCII API name; dispatch goes through
    /// the interop service. The instruction pointer is moved past the name
    /// before dispatch so the service observes a consistent context.
    pub(super) fn op_syscall(&mut self) -> VmResult<()> {
        let length = self.operand(1)?[0] as usize;
        let name_bytes = {
            let context = self
                .current_context()
                .ok_or_else(|| VmError::invalid_operation("no current context"))?;
            context
                .read_bytes(context.instruction_pointer() + 2, length)?
                .to_vec()
        };
        let api = String::from_utf8(name_bytes.clone())
            .map_err(|_| VmError::invalid_operation("syscall name is not valid UTF-8"))?;
        self.trace_param(OpCode::SYSCALL, &name_bytes);
        self.advance(2 + length)?;
        self.trace_syscall(&api);
        let mut service = self
            .service
            .take()
            .ok_or(VmError::MissingInteropService)?;
        let result = service.invoke(&api, self);
        self.service = Some(service);
        result
    }

    pub(super) fn op_throw_if_not(&mut self) -> VmResult<()> {
        if self.pop_bool()? {
            self.advance(1)
        } else {
            Err(VmError::ThrowIfNot)
        }
    }
}
