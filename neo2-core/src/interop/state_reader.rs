//! Default syscall dispatcher over the snapshot caches.
//!
//! Pricing of syscalls is the engine's concern; this service only executes
//! them. Both the current `Neo.` prefix and the historical `AntShares.`
//! prefix resolve to the same operations.

use crate::block::{Block, Header};
use crate::contract_state::ContractState;
use crate::interop::storage_context::StorageContext;
use crate::ledger::LedgerView;
use crate::snapshot::Snapshot;
use crate::state::{StorageItem, StorageKey};
use crate::trigger::TriggerType;
use crate::uint::{UInt160, UInt256};
use neo2_vm::crypto::hash160;
use neo2_vm::{
    ExecutionEngine, ExecutionTrace, InteropObject, InteropService, OpCode, StackItem, VmError,
    VmResult,
};
use num_traits::ToPrimitive;
use std::any::Any;
use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

const MAX_STORAGE_KEY_SIZE: usize = 1024;

/// Header pushed onto the stack by `Blockchain.GetHeader`.
#[derive(Debug)]
pub struct HeaderHandle(pub Header);

impl InteropObject for HeaderHandle {
    fn interface_type(&self) -> &'static str {
        "Header"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Block pushed onto the stack by `Blockchain.GetBlock`.
#[derive(Debug)]
pub struct BlockHandle(pub Block);

impl InteropObject for BlockHandle {
    fn interface_type(&self) -> &'static str {
        "Block"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Contract state pushed onto the stack by `Blockchain.GetContract`.
#[derive(Debug)]
pub struct ContractHandle(pub ContractState);

impl InteropObject for ContractHandle {
    fn interface_type(&self) -> &'static str {
        "Contract"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Syscall dispatcher reading and writing the snapshot caches.
pub struct StateReader {
    trigger: TriggerType,
    persisting_block: Block,
    snapshot: Rc<RefCell<Snapshot>>,
    ledger: Rc<dyn LedgerView>,
    witnesses: HashSet<UInt160>,
    notifications: Vec<StackItem>,
    logs: Vec<String>,
    trace: Option<Rc<RefCell<ExecutionTrace>>>,
}

impl StateReader {
    /// Creates a dispatcher over the given worldview.
    #[must_use]
    pub fn new(
        trigger: TriggerType,
        persisting_block: Block,
        snapshot: Rc<RefCell<Snapshot>>,
        ledger: Rc<dyn LedgerView>,
    ) -> Self {
        Self {
            trigger,
            persisting_block,
            snapshot,
            ledger,
            witnesses: HashSet::new(),
            notifications: Vec::new(),
            logs: Vec::new(),
            trace: None,
        }
    }

    /// Registers a script hash `Runtime.CheckWitness` will approve.
    pub fn add_witness(&mut self, script_hash: UInt160) {
        self.witnesses.insert(script_hash);
    }

    /// Items emitted through `Runtime.Notify`.
    #[must_use]
    pub fn notifications(&self) -> &[StackItem] {
        &self.notifications
    }

    /// Messages emitted through `Runtime.Log`.
    #[must_use]
    pub fn logs(&self) -> &[String] {
        &self.logs
    }

    fn runtime_check_witness(&mut self, engine: &mut ExecutionEngine) -> VmResult<()> {
        let data = engine
            .evaluation_stack_mut()
            .pop()?
            .as_byte_array()
            .ok_or_else(|| VmError::invalid_type("byte array"))?;
        let hash = match data.len() {
            20 => UInt160::from_slice(&data)
                .map_err(|_| VmError::invalid_operation("bad witness hash"))?,
            33 => {
                // Script hash of the canonical single-signature script.
                let mut script = Vec::with_capacity(35);
                script.push(0x21);
                script.extend_from_slice(&data);
                script.push(OpCode::CHECKSIG.value());
                UInt160::new(hash160(&script))
            }
            other => {
                return Err(VmError::invalid_operation(format!(
                    "witness operand of {other} bytes"
                )))
            }
        };
        let approved = self.witnesses.contains(&hash);
        engine
            .evaluation_stack_mut()
            .push(StackItem::from_bool(approved));
        Ok(())
    }

    fn storage_context_of(engine: &mut ExecutionEngine) -> VmResult<StorageContext> {
        let item = engine.evaluation_stack_mut().pop()?;
        let StackItem::InteropInterface(object) = item else {
            return Err(VmError::invalid_type("storage context"));
        };
        object
            .as_any()
            .downcast_ref::<StorageContext>()
            .cloned()
            .ok_or_else(|| VmError::invalid_type("storage context"))
    }

    /// A storage context is valid only for a deployed contract that owns a
    /// storage area.
    fn check_storage_context(&self, context: &StorageContext) -> VmResult<()> {
        let snapshot = self.snapshot.borrow();
        let contract = snapshot
            .contracts
            .try_get(&context.script_hash)
            .ok_or_else(|| VmError::invalid_operation("storage context has no contract"))?;
        if !contract.has_storage() {
            return Err(VmError::invalid_operation(
                "contract does not own a storage area",
            ));
        }
        Ok(())
    }

    fn storage_get(&mut self, engine: &mut ExecutionEngine) -> VmResult<()> {
        let context = Self::storage_context_of(engine)?;
        let key = engine
            .evaluation_stack_mut()
            .pop()?
            .as_byte_array()
            .ok_or_else(|| VmError::invalid_type("byte array"))?;
        self.check_storage_context(&context)?;
        let value = self
            .snapshot
            .borrow()
            .storages
            .try_get(&StorageKey::new(context.script_hash, key))
            .map(|item| item.value.clone())
            .unwrap_or_default();
        engine
            .evaluation_stack_mut()
            .push(StackItem::from_bytes(value));
        Ok(())
    }

    fn storage_put(&mut self, engine: &mut ExecutionEngine) -> VmResult<()> {
        if self.trigger != TriggerType::Application {
            return Err(VmError::invalid_operation(
                "storage writes need the application trigger",
            ));
        }
        let context = Self::storage_context_of(engine)?;
        if context.is_read_only {
            return Err(VmError::invalid_operation("storage context is read-only"));
        }
        let key = engine
            .evaluation_stack_mut()
            .pop()?
            .as_byte_array()
            .ok_or_else(|| VmError::invalid_type("byte array"))?;
        if key.len() > MAX_STORAGE_KEY_SIZE {
            return Err(VmError::invalid_operation("storage key too long"));
        }
        let value = engine
            .evaluation_stack_mut()
            .pop()?
            .as_byte_array()
            .ok_or_else(|| VmError::invalid_type("byte array"))?;
        self.check_storage_context(&context)?;
        tracing::trace!(
            contract = %context.script_hash,
            key_len = key.len(),
            value_len = value.len(),
            "storage put"
        );
        self.snapshot.borrow_mut().storages.put(
            StorageKey::new(context.script_hash, key),
            StorageItem::new(value),
        );
        Ok(())
    }

    fn storage_delete(&mut self, engine: &mut ExecutionEngine) -> VmResult<()> {
        if self.trigger != TriggerType::Application {
            return Err(VmError::invalid_operation(
                "storage writes need the application trigger",
            ));
        }
        let context = Self::storage_context_of(engine)?;
        if context.is_read_only {
            return Err(VmError::invalid_operation("storage context is read-only"));
        }
        let key = engine
            .evaluation_stack_mut()
            .pop()?
            .as_byte_array()
            .ok_or_else(|| VmError::invalid_type("byte array"))?;
        self.check_storage_context(&context)?;
        self.snapshot
            .borrow_mut()
            .storages
            .delete(&StorageKey::new(context.script_hash, key));
        Ok(())
    }

    fn blockchain_get_header(&self, engine: &mut ExecutionEngine) -> VmResult<()> {
        let data = engine
            .evaluation_stack_mut()
            .pop()?
            .as_byte_array()
            .ok_or_else(|| VmError::invalid_type("byte array"))?;
        let header = if data.len() <= 5 {
            let height = StackItem::from_bytes(data)
                .as_big_integer()
                .and_then(|v| v.to_u32())
                .ok_or_else(|| VmError::invalid_operation("bad block height"))?;
            self.ledger.header_at(height)
        } else if data.len() == 32 {
            let hash = UInt256::from_slice(&data)
                .map_err(|_| VmError::invalid_operation("bad block hash"))?;
            self.ledger.header_by_hash(&hash)
        } else {
            return Err(VmError::invalid_operation("bad header reference"));
        };
        let item = match header {
            Some(header) => StackItem::from_interface(Rc::new(HeaderHandle(header))),
            None => StackItem::from_bytes(Vec::new()),
        };
        engine.evaluation_stack_mut().push(item);
        Ok(())
    }

    fn blockchain_get_block(&self, engine: &mut ExecutionEngine) -> VmResult<()> {
        let data = engine
            .evaluation_stack_mut()
            .pop()?
            .as_byte_array()
            .ok_or_else(|| VmError::invalid_type("byte array"))?;
        let block = if data.len() <= 5 {
            let height = StackItem::from_bytes(data)
                .as_big_integer()
                .and_then(|v| v.to_u32())
                .ok_or_else(|| VmError::invalid_operation("bad block height"))?;
            self.ledger.block_at(height)
        } else {
            return Err(VmError::invalid_operation("bad block reference"));
        };
        let item = match block {
            Some(block) => StackItem::from_interface(Rc::new(BlockHandle(block))),
            None => StackItem::from_bytes(Vec::new()),
        };
        engine.evaluation_stack_mut().push(item);
        Ok(())
    }

    fn blockchain_get_contract(&self, engine: &mut ExecutionEngine) -> VmResult<()> {
        let data = engine
            .evaluation_stack_mut()
            .pop()?
            .as_byte_array()
            .ok_or_else(|| VmError::invalid_type("byte array"))?;
        let hash = UInt160::from_slice(&data)
            .map_err(|_| VmError::invalid_operation("bad contract hash"))?;
        let item = match self.snapshot.borrow().contracts.try_get(&hash) {
            Some(contract) => StackItem::from_interface(Rc::new(ContractHandle(contract.clone()))),
            None => StackItem::from_bytes(Vec::new()),
        };
        engine.evaluation_stack_mut().push(item);
        Ok(())
    }
}

/// Strips the protocol prefix; both spellings name the same operation.
fn normalize(api: &str) -> Option<&str> {
    api.strip_prefix("Neo.")
        .or_else(|| api.strip_prefix("AntShares."))
}

impl InteropService for StateReader {
    fn invoke(&mut self, api: &str, engine: &mut ExecutionEngine) -> VmResult<()> {
        let Some(name) = normalize(api) else {
            return Err(VmError::syscall(api, "unknown syscall"));
        };
        match name {
            "Runtime.GetTrigger" => {
                engine
                    .evaluation_stack_mut()
                    .push(StackItem::from_int(self.trigger as u8));
                Ok(())
            }
            "Runtime.GetTime" => {
                engine
                    .evaluation_stack_mut()
                    .push(StackItem::from_int(self.persisting_block.header.timestamp));
                Ok(())
            }
            "Runtime.CheckWitness" => self.runtime_check_witness(engine),
            "Runtime.Notify" => {
                let item = engine.evaluation_stack_mut().pop()?;
                let rendered = neo2_vm::trace::snapshot_of(&item);
                tracing::debug!(item = ?rendered, "runtime notify");
                if let Some(trace) = &self.trace {
                    trace
                        .borrow_mut()
                        .log(&format!("notify {}({})", rendered.kind, rendered.value));
                }
                self.notifications.push(item);
                Ok(())
            }
            "Runtime.Log" => {
                let bytes = engine
                    .evaluation_stack_mut()
                    .pop()?
                    .as_byte_array()
                    .ok_or_else(|| VmError::invalid_type("byte array"))?;
                let message = String::from_utf8_lossy(&bytes).into_owned();
                tracing::debug!(%message, "runtime log");
                if let Some(trace) = &self.trace {
                    trace.borrow_mut().log(&message);
                }
                self.logs.push(message);
                Ok(())
            }
            "Blockchain.GetHeight" => {
                engine
                    .evaluation_stack_mut()
                    .push(StackItem::from_int(self.ledger.height()));
                Ok(())
            }
            "Blockchain.GetHeader" => self.blockchain_get_header(engine),
            "Blockchain.GetBlock" => self.blockchain_get_block(engine),
            "Blockchain.GetContract" => self.blockchain_get_contract(engine),
            "Storage.GetContext" => {
                let script_hash = engine
                    .current_context()
                    .map(|context| UInt160::new(context.script_hash()))
                    .ok_or_else(|| VmError::invalid_operation("no current context"))?;
                engine
                    .evaluation_stack_mut()
                    .push(StackItem::from_interface(Rc::new(StorageContext::new(
                        script_hash,
                    ))));
                Ok(())
            }
            "Storage.GetReadOnlyContext" => {
                let script_hash = engine
                    .current_context()
                    .map(|context| UInt160::new(context.script_hash()))
                    .ok_or_else(|| VmError::invalid_operation("no current context"))?;
                engine
                    .evaluation_stack_mut()
                    .push(StackItem::from_interface(Rc::new(
                        StorageContext::new(script_hash).as_read_only(),
                    )));
                Ok(())
            }
            "Storage.Get" => self.storage_get(engine),
            "Storage.Put" => self.storage_put(engine),
            "Storage.Delete" => self.storage_delete(engine),
            _ => Err(VmError::syscall(api, "unknown syscall")),
        }
    }

    fn attach_trace(&mut self, trace: Rc<RefCell<ExecutionTrace>>) {
        self.trace = Some(trace);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_normalization() {
        assert_eq!(normalize("Neo.Storage.Get"), Some("Storage.Get"));
        assert_eq!(normalize("AntShares.Storage.Get"), Some("Storage.Get"));
        assert_eq!(normalize("System.Storage.Get"), None);
    }
}
