//! The gas price tables.
//!
//! Prices are integers in the pre-multiplied meter domain; the driver
//! multiplies by [`RATIO`](super::RATIO) when charging. The syscall table
//! embeds the protocol's economic policy and must not be adjusted
//! independently of it.

use super::ApplicationEngine;
use crate::contract_state::ContractPropertyState;
use neo2_vm::{OpCode, VmError, VmResult};
use num_bigint::BigInt;
use num_traits::ToPrimitive;

use super::RATIO;

const ONE_GAS: i64 = 100_000_000;

impl ApplicationEngine {
    /// Price of the upcoming opcode. For `SYSCALL` and `CHECKMULTISIG` the
    /// price depends on the operands the instruction is about to consume.
    pub fn price_of(&self, op: OpCode) -> VmResult<i64> {
        if op.is_push_constant() {
            return Ok(0);
        }
        Ok(match op {
            OpCode::NOP => 0,
            OpCode::APPCALL | OpCode::TAILCALL => 10,
            OpCode::SYSCALL => return self.price_of_syscall(),
            OpCode::SHA1 | OpCode::SHA256 => 10,
            OpCode::HASH160 | OpCode::HASH256 => 20,
            OpCode::CHECKSIG => 100,
            OpCode::CHECKMULTISIG => {
                let stack = self.interp.evaluation_stack();
                if stack.is_empty() {
                    return Ok(1);
                }
                let Some(n) = stack.peek(0)?.as_big_integer() else {
                    return Ok(1);
                };
                match n.to_i64() {
                    Some(n) if n >= 1 => n.saturating_mul(100),
                    Some(_) => 1,
                    // Oversized count: saturate and let the meter overflow.
                    None if n > BigInt::from(0) => i64::MAX,
                    None => 1,
                }
            }
            _ => 1,
        })
    }

    /// Price of the upcoming `SYSCALL`. A malformed trailer (missing length
    /// byte, name running past the script, non-ASCII bytes) prices as 1 and
    /// is left for dispatch to reject.
    fn price_of_syscall(&self) -> VmResult<i64> {
        let Some(context) = self.interp.current_context() else {
            return Ok(1);
        };
        let script = context.script();
        let ip = context.instruction_pointer();
        let Some(&length) = script.get(ip + 1) else {
            return Ok(1);
        };
        let Some(name) = script.get(ip + 2..ip + 2 + length as usize) else {
            return Ok(1);
        };
        let Ok(api) = std::str::from_utf8(name) else {
            return Ok(1);
        };
        // The unspent-coins query exists only under the current prefix.
        if api == "Neo.Transaction.GetUnspentCoins" {
            return Ok(200);
        }
        let Some(name) = api
            .strip_prefix("Neo.")
            .or_else(|| api.strip_prefix("AntShares."))
        else {
            return Ok(1);
        };
        Ok(match name {
            "Runtime.CheckWitness" => 200,
            "Blockchain.GetHeader" => 100,
            "Blockchain.GetBlock" => 200,
            "Blockchain.GetTransaction" => 100,
            "Blockchain.GetAccount" => 100,
            "Blockchain.GetValidators" => 200,
            "Blockchain.GetAsset" => 100,
            "Blockchain.GetContract" => 100,
            "Transaction.GetReferences" => 200,
            "Account.SetVotes" => 1000,
            "Validator.Register" => 1000 * ONE_GAS / RATIO,
            "Asset.Create" => 5000 * ONE_GAS / RATIO,
            "Asset.Renew" => {
                let years = i64::from(self.operand_low_byte(1)?);
                years * 5000 * ONE_GAS / RATIO
            }
            "Contract.Create" | "Contract.Migrate" => {
                let properties = ContractPropertyState::from_byte(self.operand_low_byte(3)?);
                let mut fee = 100i64;
                if properties.contains(ContractPropertyState::HAS_STORAGE) {
                    fee += 400;
                }
                if properties.contains(ContractPropertyState::HAS_DYNAMIC_INVOKE) {
                    fee += 500;
                }
                fee * ONE_GAS / RATIO
            }
            "Storage.Get" => 100,
            "Storage.Put" => {
                let key_length = self.operand_byte_length(1)? as i64;
                let value_length = self.operand_byte_length(2)? as i64;
                ((key_length + value_length - 1) / 1024 + 1) * 1000
            }
            "Storage.Delete" => 100,
            _ => 1,
        })
    }

    /// Low 8 bits of the integer at the given stack depth. A missing or
    /// non-numeric operand is a pricing error and faults the step.
    fn operand_low_byte(&self, depth: usize) -> VmResult<u8> {
        let item = self.interp.evaluation_stack().peek(depth)?;
        if item.as_big_integer().is_none() {
            return Err(VmError::invalid_type("integer"));
        }
        Ok(item.low_u8())
    }

    /// Byte length of the item at the given stack depth.
    fn operand_byte_length(&self, depth: usize) -> VmResult<usize> {
        self.interp
            .evaluation_stack()
            .peek(depth)?
            .as_byte_array()
            .map(|bytes| bytes.len())
            .ok_or_else(|| VmError::invalid_type("byte array"))
    }
}
