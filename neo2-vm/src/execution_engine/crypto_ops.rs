//! Hashing and signature-check opcodes.

use super::ExecutionEngine;
use crate::crypto;
use crate::error::{VmError, VmResult};
use crate::op_code::OpCode;
use crate::stack_item::StackItem;

impl ExecutionEngine {
    pub(super) fn op_crypto(&mut self, op: OpCode) -> VmResult<()> {
        match op {
            OpCode::SHA1 => {
                let data = self.pop_bytes()?;
                self.push_item(StackItem::from_bytes(crypto::sha1(&data)));
            }
            OpCode::SHA256 => {
                let data = self.pop_bytes()?;
                self.push_item(StackItem::from_bytes(crypto::sha256(&data)));
            }
            OpCode::HASH160 => {
                let data = self.pop_bytes()?;
                self.push_item(StackItem::from_bytes(crypto::hash160(&data).to_vec()));
            }
            OpCode::HASH256 => {
                let data = self.pop_bytes()?;
                self.push_item(StackItem::from_bytes(crypto::hash256(&data)));
            }
            OpCode::CHECKSIG => {
                let public_key = self.pop_bytes()?;
                let signature = self.pop_bytes()?;
                let message = self.container_message()?;
                let valid = self
                    .crypto
                    .verify_signature(&message, &signature, &public_key);
                self.push_item(StackItem::from_bool(valid));
            }
            OpCode::VERIFY => {
                let public_key = self.pop_bytes()?;
                let signature = self.pop_bytes()?;
                let message = self.pop_bytes()?;
                let valid = self
                    .crypto
                    .verify_signature(&message, &signature, &public_key);
                self.push_item(StackItem::from_bool(valid));
            }
            OpCode::CHECKMULTISIG => {
                let public_keys = self.pop_byte_vectors()?;
                let signatures = self.pop_byte_vectors()?;
                if signatures.is_empty() || signatures.len() > public_keys.len() {
                    return Err(VmError::invalid_operation(
                        "signature count out of range for CHECKMULTISIG",
                    ));
                }
                let message = self.container_message()?;
                // Signatures must appear in public-key order; each key is
                // consumed at most once.
                let mut valid = true;
                let mut sig_index = 0;
                let mut key_index = 0;
                while valid && sig_index < signatures.len() {
                    if key_index >= public_keys.len() {
                        valid = false;
                        break;
                    }
                    if self.crypto.verify_signature(
                        &message,
                        &signatures[sig_index],
                        &public_keys[key_index],
                    ) {
                        sig_index += 1;
                    }
                    key_index += 1;
                    if signatures.len() - sig_index > public_keys.len() - key_index {
                        valid = false;
                    }
                }
                self.push_item(StackItem::from_bool(valid));
            }
            _ => return Err(VmError::InvalidOpCode { opcode: op.value() }),
        }
        self.advance(1)
    }

    fn container_message(&self) -> VmResult<Vec<u8>> {
        Ok(self
            .container
            .as_ref()
            .ok_or(VmError::MissingContainer)?
            .message())
    }

    /// Pops either an array of byte strings, or a count followed by that
    /// many byte strings.
    fn pop_byte_vectors(&mut self) -> VmResult<Vec<Vec<u8>>> {
        let item = self.pop_item()?;
        if let Some(items) = item.as_array() {
            return items
                .borrow()
                .iter()
                .map(|entry| {
                    entry
                        .as_byte_array()
                        .ok_or_else(|| VmError::invalid_type("byte array"))
                })
                .collect();
        }
        let count = item
            .as_big_integer()
            .ok_or_else(|| VmError::invalid_type("integer"))
            .and_then(|value| {
                use num_traits::ToPrimitive;
                value
                    .to_usize()
                    .filter(|n| *n >= 1)
                    .ok_or_else(|| VmError::invalid_operation("count out of range"))
            })?;
        (0..count).map(|_| self.pop_bytes()).collect()
    }
}
