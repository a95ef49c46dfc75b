//! Constant-push opcodes.

use super::ExecutionEngine;
use crate::error::{VmError, VmResult};
use crate::op_code::OpCode;
use crate::stack_item::StackItem;

impl ExecutionEngine {
    pub(super) fn op_push0(&mut self) -> VmResult<()> {
        self.push_item(StackItem::from_bytes(Vec::new()));
        self.advance(1)
    }

    /// `PUSHBYTES1..=PUSHBYTES75`: the opcode value is the payload length.
    pub(super) fn op_push_bytes(&mut self, op: OpCode) -> VmResult<()> {
        let count = op.value() as usize;
        let data = self.operand(count)?;
        self.trace_param(op, &data);
        self.push_item(StackItem::from_bytes(data));
        self.advance(1 + count)
    }

    pub(super) fn op_push_data(&mut self, op: OpCode) -> VmResult<()> {
        let prefix = match op {
            OpCode::PUSHDATA1 => 1,
            OpCode::PUSHDATA2 => 2,
            _ => 4,
        };
        let length_bytes = self.operand(prefix)?;
        let length = match prefix {
            1 => length_bytes[0] as usize,
            2 => u16::from_le_bytes([length_bytes[0], length_bytes[1]]) as usize,
            _ => u32::from_le_bytes([
                length_bytes[0],
                length_bytes[1],
                length_bytes[2],
                length_bytes[3],
            ]) as usize,
        };
        let context = self
            .current_context()
            .ok_or_else(|| VmError::invalid_operation("no current context"))?;
        let data = context
            .read_bytes(context.instruction_pointer() + 1 + prefix, length)?
            .to_vec();
        self.trace_param(op, &data);
        self.push_item(StackItem::from_bytes(data));
        self.advance(1 + prefix + length)
    }

    /// `PUSHM1` and `PUSH1..=PUSH16`: the pushed integer is the offset from
    /// the opcode value 0x50.
    pub(super) fn op_push_constant(&mut self, op: OpCode) -> VmResult<()> {
        let value = i32::from(op.value()) - i32::from(OpCode::PUSH1.value()) + 1;
        self.push_item(StackItem::from_int(value));
        self.advance(1)
    }
}
