//! Bitwise and arithmetic opcodes.

use super::ExecutionEngine;
use crate::error::{VmError, VmResult};
use crate::op_code::OpCode;
use crate::stack_item::{big_int_sign, StackItem};
use num_bigint::BigInt;
use num_traits::{Signed, ToPrimitive, Zero};

/// Shift amounts beyond this bound fault; unbounded shifts would let a
/// script materialise arbitrarily large integers in one step.
const MAX_SHIFT: i64 = 256;

impl ExecutionEngine {
    pub(super) fn op_bitwise(&mut self, op: OpCode) -> VmResult<()> {
        match op {
            OpCode::INVERT => {
                let x = self.pop_int()?;
                self.push_item(StackItem::from_int(-(x + BigInt::from(1))));
            }
            OpCode::AND | OpCode::OR | OpCode::XOR => {
                let x2 = self.pop_int()?;
                let x1 = self.pop_int()?;
                let result = match op {
                    OpCode::AND => x1 & x2,
                    OpCode::OR => x1 | x2,
                    _ => x1 ^ x2,
                };
                self.push_item(StackItem::from_int(result));
            }
            OpCode::EQUAL => {
                let x2 = self.pop_item()?;
                let x1 = self.pop_item()?;
                self.push_item(StackItem::from_bool(x1.equals(&x2)));
            }
            _ => return Err(VmError::InvalidOpCode { opcode: op.value() }),
        }
        self.advance(1)
    }

    pub(super) fn op_arithmetic(&mut self, op: OpCode) -> VmResult<()> {
        match op {
            OpCode::INC => {
                let x = self.pop_int()?;
                self.push_item(StackItem::from_int(x + 1));
            }
            OpCode::DEC => {
                let x = self.pop_int()?;
                self.push_item(StackItem::from_int(x - 1));
            }
            OpCode::SIGN => {
                let x = self.pop_int()?;
                self.push_item(StackItem::from_int(big_int_sign(&x)));
            }
            OpCode::NEGATE => {
                let x = self.pop_int()?;
                self.push_item(StackItem::from_int(-x));
            }
            OpCode::ABS => {
                let x = self.pop_int()?;
                self.push_item(StackItem::from_int(x.abs()));
            }
            OpCode::NOT => {
                let x = self.pop_bool()?;
                self.push_item(StackItem::from_bool(!x));
            }
            OpCode::NZ => {
                let x = self.pop_int()?;
                self.push_item(StackItem::from_bool(!x.is_zero()));
            }
            OpCode::ADD => {
                let x2 = self.pop_int()?;
                let x1 = self.pop_int()?;
                self.push_item(StackItem::from_int(x1 + x2));
            }
            OpCode::SUB => {
                let x2 = self.pop_int()?;
                let x1 = self.pop_int()?;
                self.push_item(StackItem::from_int(x1 - x2));
            }
            OpCode::MUL => {
                let x2 = self.pop_int()?;
                let x1 = self.pop_int()?;
                self.push_item(StackItem::from_int(x1 * x2));
            }
            OpCode::DIV => {
                let x2 = self.pop_int()?;
                let x1 = self.pop_int()?;
                if x2.is_zero() {
                    return Err(VmError::DivisionByZero);
                }
                self.push_item(StackItem::from_int(x1 / x2));
            }
            OpCode::MOD => {
                let x2 = self.pop_int()?;
                let x1 = self.pop_int()?;
                if x2.is_zero() {
                    return Err(VmError::DivisionByZero);
                }
                self.push_item(StackItem::from_int(x1 % x2));
            }
            OpCode::SHL | OpCode::SHR => {
                let shift_big = self.pop_int()?;
                let shift = shift_big.to_i64().unwrap_or(i64::MAX);
                if shift.abs() > MAX_SHIFT {
                    return Err(VmError::ShiftOutOfRange(shift));
                }
                let x = self.pop_int()?;
                let left = (op == OpCode::SHL) == (shift >= 0);
                let amount = shift.unsigned_abs() as usize;
                let result: BigInt = if left { x << amount } else { x >> amount };
                self.push_item(StackItem::from_int(result));
            }
            OpCode::BOOLAND => {
                let x2 = self.pop_bool()?;
                let x1 = self.pop_bool()?;
                self.push_item(StackItem::from_bool(x1 && x2));
            }
            OpCode::BOOLOR => {
                let x2 = self.pop_bool()?;
                let x1 = self.pop_bool()?;
                self.push_item(StackItem::from_bool(x1 || x2));
            }
            OpCode::NUMEQUAL
            | OpCode::NUMNOTEQUAL
            | OpCode::LT
            | OpCode::GT
            | OpCode::LTE
            | OpCode::GTE => {
                let x2 = self.pop_int()?;
                let x1 = self.pop_int()?;
                let result = match op {
                    OpCode::NUMEQUAL => x1 == x2,
                    OpCode::NUMNOTEQUAL => x1 != x2,
                    OpCode::LT => x1 < x2,
                    OpCode::GT => x1 > x2,
                    OpCode::LTE => x1 <= x2,
                    _ => x1 >= x2,
                };
                self.push_item(StackItem::from_bool(result));
            }
            OpCode::MIN => {
                let x2 = self.pop_int()?;
                let x1 = self.pop_int()?;
                self.push_item(StackItem::from_int(x1.min(x2)));
            }
            OpCode::MAX => {
                let x2 = self.pop_int()?;
                let x1 = self.pop_int()?;
                self.push_item(StackItem::from_int(x1.max(x2)));
            }
            OpCode::WITHIN => {
                let upper = self.pop_int()?;
                let lower = self.pop_int()?;
                let x = self.pop_int()?;
                self.push_item(StackItem::from_bool(lower <= x && x < upper));
            }
            _ => return Err(VmError::InvalidOpCode { opcode: op.value() }),
        }
        self.advance(1)
    }
}
