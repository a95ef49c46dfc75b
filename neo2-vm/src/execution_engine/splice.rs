//! Byte-string splice opcodes.

use super::ExecutionEngine;
use crate::error::{VmError, VmResult};
use crate::op_code::OpCode;
use crate::stack_item::StackItem;

impl ExecutionEngine {
    pub(super) fn op_splice(&mut self, op: OpCode) -> VmResult<()> {
        match op {
            OpCode::CAT => {
                let tail = self.pop_bytes()?;
                let mut head = self.pop_bytes()?;
                head.extend_from_slice(&tail);
                self.push_item(StackItem::from_bytes(head));
            }
            OpCode::SUBSTR => {
                let count = self.pop_index()?;
                let index = self.pop_index()?;
                let bytes = self.pop_bytes()?;
                let slice: Vec<u8> = bytes.into_iter().skip(index).take(count).collect();
                self.push_item(StackItem::from_bytes(slice));
            }
            OpCode::LEFT => {
                let count = self.pop_index()?;
                let mut bytes = self.pop_bytes()?;
                bytes.truncate(count);
                self.push_item(StackItem::from_bytes(bytes));
            }
            OpCode::RIGHT => {
                let count = self.pop_index()?;
                let bytes = self.pop_bytes()?;
                if bytes.len() < count {
                    return Err(VmError::invalid_operation("RIGHT count exceeds length"));
                }
                let slice = bytes[bytes.len() - count..].to_vec();
                self.push_item(StackItem::from_bytes(slice));
            }
            OpCode::SIZE => {
                let bytes = self.pop_bytes()?;
                self.push_item(StackItem::from_int(bytes.len() as u64));
            }
            _ => return Err(VmError::InvalidOpCode { opcode: op.value() }),
        }
        self.advance(1)
    }
}
