//! Protocol constants and the pre-execution limit-check battery.
//!
//! Every predicate inspects the interpreter state and the upcoming opcode
//! without mutating anything. Arithmetic opcodes are screened on the
//! hypothetical result, so an out-of-range value is rejected before it can
//! be materialised anywhere.

use super::ApplicationEngine;
use neo2_vm::{OpCode, StackItem};
use num_bigint::{BigInt, Sign};

/// Meter units per external fixed-point gas unit.
pub const RATIO: i64 = 100_000;

/// Free gas allowance, in meter units.
pub const GAS_FREE: i64 = 10 * 100_000_000;

/// Largest permitted two's-complement encoding of an integer, in bytes.
pub const MAX_BIGINT_BYTES: usize = 32;

/// Ceiling on the combined evaluation and alt stack depth.
pub const MAX_STACK_SIZE: usize = 2048;

/// Ceiling on the byte length of a single item.
pub const MAX_ITEM_SIZE: usize = 1_048_576;

/// Ceiling on the invocation stack depth.
pub const MAX_INVOCATION_STACK: usize = 1024;

/// Ceiling on array cardinality.
pub const MAX_ARRAY_SIZE: usize = 1024;

fn fits(value: &BigInt) -> bool {
    value.to_signed_bytes_le().len() <= MAX_BIGINT_BYTES
}

impl ApplicationEngine {
    fn integer_at(&self, depth: usize) -> Option<BigInt> {
        self.interp
            .evaluation_stack()
            .peek(depth)
            .ok()
            .and_then(StackItem::as_big_integer)
    }

    fn byte_length(&self, depth: usize) -> Option<usize> {
        self.interp
            .evaluation_stack()
            .peek(depth)
            .ok()
            .and_then(StackItem::as_byte_array)
            .map(|bytes| bytes.len())
    }

    /// Gates opcodes that introduce or enlarge byte-string items.
    pub(super) fn check_item_size(&self, op: OpCode) -> bool {
        match op {
            OpCode::PUSHDATA4 => {
                let Some(context) = self.interp.current_context() else {
                    return true;
                };
                let ip = context.instruction_pointer();
                if ip + 5 > context.len() {
                    return false;
                }
                let script = context.script();
                let length = u32::from_le_bytes([
                    script[ip + 1],
                    script[ip + 2],
                    script[ip + 3],
                    script[ip + 4],
                ]) as usize;
                length <= MAX_ITEM_SIZE
            }
            OpCode::CAT => {
                if self.interp.evaluation_stack().len() < 2 {
                    return false;
                }
                match (self.byte_length(0), self.byte_length(1)) {
                    (Some(a), Some(b)) => a + b <= MAX_ITEM_SIZE,
                    _ => false,
                }
            }
            _ => true,
        }
    }

    /// Bounds the combined evaluation and alt stack depth by the growth the
    /// upcoming opcode can cause.
    pub(super) fn check_stack_size(&self, op: OpCode) -> bool {
        let mut growth = 0usize;
        if op.is_push_constant() {
            growth = 1;
        } else {
            match op {
                OpCode::DEPTH | OpCode::DUP | OpCode::OVER | OpCode::TUCK => growth = 1,
                OpCode::UNPACK => {
                    let Ok(item) = self.interp.evaluation_stack().peek(0) else {
                        return false;
                    };
                    let Some(items) = item.as_array() else {
                        return false;
                    };
                    growth = items.borrow().len();
                }
                _ => {}
            }
        }
        if growth == 0 {
            return true;
        }
        growth + self.interp.stack_item_count() <= MAX_STACK_SIZE
    }

    /// Bounds the cardinality requested by array-constructing opcodes.
    pub(super) fn check_array_size(&self, op: OpCode) -> bool {
        match op {
            OpCode::PACK | OpCode::NEWARRAY | OpCode::NEWSTRUCT => {
                if self.interp.evaluation_stack().is_empty() {
                    return false;
                }
                match self.integer_at(0) {
                    Some(size) => size <= BigInt::from(MAX_ARRAY_SIZE),
                    None => false,
                }
            }
            _ => true,
        }
    }

    /// Bounds the invocation depth before call opcodes.
    pub(super) fn check_invocation_stack(&self, op: OpCode) -> bool {
        match op {
            OpCode::CALL | OpCode::APPCALL => {
                self.interp.invocation_stack().len() < MAX_INVOCATION_STACK
            }
            _ => true,
        }
    }

    /// Screens arithmetic on operand magnitude and on the hypothetical
    /// result; an absent or non-numeric operand screens as not fitting.
    pub(super) fn check_big_integers(&self, op: OpCode) -> bool {
        match op {
            OpCode::INC => {
                let Some(x) = self.integer_at(0) else {
                    return false;
                };
                fits(&x) && fits(&(x + 1))
            }
            OpCode::DEC => {
                let Some(x) = self.integer_at(0) else {
                    return false;
                };
                if !fits(&x) {
                    return false;
                }
                // A positive value only shrinks under decrement; zero and
                // negatives can grow past the boundary.
                x.sign() == Sign::Plus || fits(&(x - 1))
            }
            OpCode::ADD => {
                let (Some(x2), Some(x1)) = (self.integer_at(0), self.integer_at(1)) else {
                    return false;
                };
                fits(&x2) && fits(&x1) && fits(&(x1 + x2))
            }
            OpCode::SUB => {
                let (Some(x2), Some(x1)) = (self.integer_at(0), self.integer_at(1)) else {
                    return false;
                };
                fits(&x2) && fits(&x1) && fits(&(x1 - x2))
            }
            OpCode::MUL => {
                let (Some(x2), Some(x1)) = (self.integer_at(0), self.integer_at(1)) else {
                    return false;
                };
                // Byte-length sum overapproximates the product's size by at
                // most one byte; the protocol fixes this exact bound.
                x1.to_signed_bytes_le().len() + x2.to_signed_bytes_le().len() <= MAX_BIGINT_BYTES
            }
            OpCode::DIV | OpCode::MOD => {
                let (Some(x2), Some(x1)) = (self.integer_at(0), self.integer_at(1)) else {
                    return false;
                };
                fits(&x2) && fits(&x1)
            }
            _ => true,
        }
    }
}
