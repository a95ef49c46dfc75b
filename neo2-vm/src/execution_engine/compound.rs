//! Array, struct and map opcodes.

use super::ExecutionEngine;
use crate::error::{VmError, VmResult};
use crate::op_code::OpCode;
use crate::stack_item::StackItem;
use num_traits::ToPrimitive;

impl ExecutionEngine {
    pub(super) fn op_compound(&mut self, op: OpCode) -> VmResult<()> {
        match op {
            OpCode::ARRAYSIZE => {
                let item = self.pop_item()?;
                let size = if let Some(items) = item.as_array() {
                    items.borrow().len()
                } else if let Some(entries) = item.as_map() {
                    entries.borrow().len()
                } else {
                    item.as_byte_array()
                        .ok_or_else(|| VmError::invalid_type("sized item"))?
                        .len()
                };
                self.push_item(StackItem::from_int(size as u64));
            }
            OpCode::PACK => {
                let count = self.pop_index()?;
                let mut items = Vec::with_capacity(count);
                for _ in 0..count {
                    items.push(self.pop_item()?);
                }
                self.push_item(StackItem::new_array(items));
            }
            OpCode::UNPACK => {
                let item = self.pop_item()?;
                let items = item
                    .as_array()
                    .ok_or_else(|| VmError::invalid_type("array"))?;
                let elements = items.borrow().clone();
                let count = elements.len();
                for element in elements.into_iter().rev() {
                    self.push_item(element);
                }
                self.push_item(StackItem::from_int(count as u64));
            }
            OpCode::PICKITEM => {
                let key = self.pop_key()?;
                let target = self.pop_item()?;
                if let Some(entries) = target.as_map() {
                    let value = entries
                        .borrow()
                        .get(&key)
                        .cloned()
                        .ok_or_else(|| VmError::invalid_operation("map key not found"))?;
                    self.push_item(value);
                } else if let Some(items) = target.as_array() {
                    let index = Self::index_of(&key)?;
                    let value = items
                        .borrow()
                        .get(index)
                        .cloned()
                        .ok_or_else(|| VmError::invalid_operation("array index out of range"))?;
                    self.push_item(value);
                } else {
                    return Err(VmError::invalid_type("array or map"));
                }
            }
            OpCode::SETITEM => {
                let value = self.pop_item()?.clone_for_assignment();
                let key = self.pop_key()?;
                let target = self.pop_item()?;
                if let Some(entries) = target.as_map() {
                    entries.borrow_mut().insert(key, value);
                } else if let Some(items) = target.as_array() {
                    let index = Self::index_of(&key)?;
                    let mut items = items.borrow_mut();
                    let slot = items
                        .get_mut(index)
                        .ok_or_else(|| VmError::invalid_operation("array index out of range"))?;
                    *slot = value;
                } else {
                    return Err(VmError::invalid_type("array or map"));
                }
            }
            OpCode::NEWARRAY => {
                let count = self.pop_index()?;
                self.push_item(StackItem::new_array(vec![
                    StackItem::from_bool(false);
                    count
                ]));
            }
            OpCode::NEWSTRUCT => {
                let count = self.pop_index()?;
                self.push_item(StackItem::new_struct(vec![
                    StackItem::from_bool(false);
                    count
                ]));
            }
            OpCode::NEWMAP => {
                self.push_item(StackItem::new_map());
            }
            OpCode::APPEND => {
                let value = self.pop_item()?.clone_for_assignment();
                let target = self.pop_item()?;
                let items = target
                    .as_array()
                    .ok_or_else(|| VmError::invalid_type("array"))?;
                items.borrow_mut().push(value);
            }
            OpCode::REVERSE => {
                let target = self.pop_item()?;
                let items = target
                    .as_array()
                    .ok_or_else(|| VmError::invalid_type("array"))?;
                items.borrow_mut().reverse();
            }
            OpCode::REMOVE => {
                let key = self.pop_key()?;
                let target = self.pop_item()?;
                if let Some(entries) = target.as_map() {
                    entries.borrow_mut().remove(&key);
                } else if let Some(items) = target.as_array() {
                    let index = Self::index_of(&key)?;
                    let mut items = items.borrow_mut();
                    if index >= items.len() {
                        return Err(VmError::invalid_operation("array index out of range"));
                    }
                    items.remove(index);
                } else {
                    return Err(VmError::invalid_type("array or map"));
                }
            }
            OpCode::HASKEY => {
                let key = self.pop_key()?;
                let target = self.pop_item()?;
                let present = if let Some(entries) = target.as_map() {
                    entries.borrow().contains_key(&key)
                } else if let Some(items) = target.as_array() {
                    let index = Self::index_of(&key)?;
                    index < items.borrow().len()
                } else {
                    return Err(VmError::invalid_type("array or map"));
                };
                self.push_item(StackItem::from_bool(present));
            }
            OpCode::KEYS => {
                let target = self.pop_item()?;
                let entries = target.as_map().ok_or_else(|| VmError::invalid_type("map"))?;
                let keys = entries.borrow().keys();
                self.push_item(StackItem::new_array(keys));
            }
            OpCode::VALUES => {
                let target = self.pop_item()?;
                let values: Vec<StackItem> = if let Some(entries) = target.as_map() {
                    entries.borrow().values()
                } else if let Some(items) = target.as_array() {
                    items.borrow().clone()
                } else {
                    return Err(VmError::invalid_type("array or map"));
                };
                let copied = values
                    .iter()
                    .map(StackItem::clone_for_assignment)
                    .collect();
                self.push_item(StackItem::new_array(copied));
            }
            _ => return Err(VmError::InvalidOpCode { opcode: op.value() }),
        }
        self.advance(1)
    }

    /// Pops a map key or array index; compound items cannot be keys.
    fn pop_key(&mut self) -> VmResult<StackItem> {
        let key = self.pop_item()?;
        if key.is_primitive() {
            Ok(key)
        } else {
            Err(VmError::invalid_type("primitive key"))
        }
    }

    fn index_of(key: &StackItem) -> VmResult<usize> {
        key.as_big_integer()
            .and_then(|value| value.to_usize())
            .ok_or_else(|| VmError::invalid_operation("negative or oversized index"))
    }
}
