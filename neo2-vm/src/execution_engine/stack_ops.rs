//! Stack manipulation opcodes.

use super::ExecutionEngine;
use crate::error::{VmError, VmResult};
use crate::op_code::OpCode;
use crate::stack_item::StackItem;

impl ExecutionEngine {
    pub(super) fn op_stack(&mut self, op: OpCode) -> VmResult<()> {
        match op {
            OpCode::DUPFROMALTSTACK => {
                let item = self.alt_stack.peek(0)?.clone();
                self.push_item(item);
            }
            OpCode::TOALTSTACK => {
                let item = self.pop_item()?;
                self.alt_stack.push(item);
            }
            OpCode::FROMALTSTACK => {
                let item = self.alt_stack.pop()?;
                self.push_item(item);
            }
            OpCode::XDROP => {
                let depth = self.pop_index()?;
                self.evaluation_stack.remove(depth)?;
            }
            OpCode::XSWAP => {
                let depth = self.pop_index()?;
                if depth != 0 {
                    let below = self.evaluation_stack.peek(depth)?.clone();
                    let top = self.evaluation_stack.peek(0)?.clone();
                    self.evaluation_stack.set(depth, top)?;
                    self.evaluation_stack.set(0, below)?;
                }
            }
            OpCode::XTUCK => {
                let depth = self.pop_index()?;
                if depth == 0 {
                    return Err(VmError::invalid_operation("XTUCK depth must be positive"));
                }
                let top = self.evaluation_stack.peek(0)?.clone();
                self.evaluation_stack.insert(depth, top)?;
            }
            OpCode::DEPTH => {
                let depth = self.evaluation_stack.len();
                self.push_item(StackItem::from_int(depth as u64));
            }
            OpCode::DROP => {
                self.pop_item()?;
            }
            OpCode::DUP => {
                let item = self.evaluation_stack.peek(0)?.clone();
                self.push_item(item);
            }
            OpCode::NIP => {
                self.evaluation_stack.remove(1)?;
            }
            OpCode::OVER => {
                let item = self.evaluation_stack.peek(1)?.clone();
                self.push_item(item);
            }
            OpCode::PICK => {
                let depth = self.pop_index()?;
                let item = self.evaluation_stack.peek(depth)?.clone();
                self.push_item(item);
            }
            OpCode::ROLL => {
                let depth = self.pop_index()?;
                if depth > 0 {
                    let item = self.evaluation_stack.remove(depth)?;
                    self.push_item(item);
                }
            }
            OpCode::ROT => {
                let item = self.evaluation_stack.remove(2)?;
                self.push_item(item);
            }
            OpCode::SWAP => {
                let item = self.evaluation_stack.remove(1)?;
                self.push_item(item);
            }
            OpCode::TUCK => {
                let item = self.evaluation_stack.peek(0)?.clone();
                self.evaluation_stack.insert(2, item)?;
            }
            _ => return Err(VmError::InvalidOpCode { opcode: op.value() }),
        }
        self.advance(1)
    }
}
