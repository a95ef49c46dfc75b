//! Step-trace recorder.
//!
//! When attached, the recorder receives a notification for every loaded
//! script, the opcode and immediate operand of each step, the evaluation
//! stack edits the step performed, and the final machine state. It is a pure
//! observer: recording peeks values without consuming them, and execution
//! with and without a trace produces identical results.

use crate::op_code::OpCode;
use crate::stack_item::StackItem;
use crate::vm_state::VMState;
use serde::Serialize;

/// Shallow rendering of a stack item: the variant tag and a short value.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ItemSnapshot {
    /// Variant name.
    pub kind: &'static str,
    /// Rendered value; byte strings are hex, compound items show cardinality.
    pub value: String,
}

/// A single evaluation-stack edit performed by a step.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "edit", rename_all = "snake_case")]
pub enum StackEdit {
    /// An item was pushed on top.
    Push { item: ItemSnapshot },
    /// An item was inserted at a depth below the top.
    Insert { index: usize, item: ItemSnapshot },
    /// The item at a depth was replaced.
    Set { index: usize, item: ItemSnapshot },
}

/// A recorded event.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TraceEvent {
    /// A script entered the invocation stack.
    ScriptLoaded {
        /// Hex text of the 20-byte script hash.
        script_hash: String,
    },
    /// One executed (or rejected) step.
    Step {
        ip: usize,
        opcode: String,
        /// Hex of the immediate operand, for parameterised opcodes.
        #[serde(skip_serializing_if = "Option::is_none")]
        param: Option<String>,
        edits: Vec<StackEdit>,
        /// Top of the evaluation stack after the step.
        #[serde(skip_serializing_if = "Option::is_none")]
        effect: Option<ItemSnapshot>,
    },
    /// A syscall was dispatched.
    Syscall { api: String },
    /// A message emitted by the host service.
    Log { message: String },
    /// The execution was rejected or the interpreter faulted.
    Fault { reason: String },
    /// Execution terminated with the given state.
    Finish { state: String },
}

#[derive(Debug, Clone)]
struct PendingStep {
    ip: usize,
    opcode: OpCode,
    param: Option<String>,
    edits: Vec<StackEdit>,
}

/// Event log of one engine execution.
#[derive(Debug, Default)]
pub struct ExecutionTrace {
    events: Vec<TraceEvent>,
    pending: Option<PendingStep>,
}

impl ExecutionTrace {
    /// Creates an empty trace.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a loaded script by its hash.
    pub fn script_loaded(&mut self, script_hash: &[u8; 20]) {
        self.events.push(TraceEvent::ScriptLoaded {
            script_hash: hex::encode(script_hash),
        });
    }

    /// Opens the record for the next step, discarding any stale one.
    pub fn next_op(&mut self, ip: usize, opcode: OpCode) {
        self.flush_pending(None);
        self.pending = Some(PendingStep {
            ip,
            opcode,
            param: None,
            edits: Vec::new(),
        });
    }

    /// Attaches the immediate operand of the current step.
    pub fn set_param(&mut self, opcode: OpCode, operand: &[u8]) {
        if let Some(pending) = &mut self.pending {
            if pending.opcode == opcode {
                pending.param = Some(hex::encode(operand));
            }
        }
    }

    /// Records a push onto the evaluation stack.
    pub fn record_push(&mut self, item: &StackItem) {
        if let Some(pending) = &mut self.pending {
            pending.edits.push(StackEdit::Push {
                item: snapshot_of(item),
            });
        }
    }

    /// Records an insert at the given depth.
    pub fn record_insert(&mut self, index: usize, item: &StackItem) {
        if let Some(pending) = &mut self.pending {
            pending.edits.push(StackEdit::Insert {
                index,
                item: snapshot_of(item),
            });
        }
    }

    /// Records a replacement at the given depth.
    pub fn record_set(&mut self, index: usize, item: &StackItem) {
        if let Some(pending) = &mut self.pending {
            pending.edits.push(StackEdit::Set {
                index,
                item: snapshot_of(item),
            });
        }
    }

    /// Closes the record of the current step with its final stack effect.
    pub fn log_result(&mut self, effect: Option<ItemSnapshot>) {
        self.flush_pending(effect);
    }

    /// Records a dispatched syscall.
    pub fn syscall(&mut self, api: &str) {
        self.events.push(TraceEvent::Syscall {
            api: api.to_string(),
        });
    }

    /// Records a host-service message.
    pub fn log(&mut self, message: &str) {
        self.events.push(TraceEvent::Log {
            message: message.to_string(),
        });
    }

    /// Records a rejection or fault diagnostic.
    pub fn fault(&mut self, reason: &str) {
        self.flush_pending(None);
        self.events.push(TraceEvent::Fault {
            reason: reason.to_string(),
        });
    }

    /// Records the final machine state.
    pub fn finish(&mut self, state: VMState) {
        self.flush_pending(None);
        self.events.push(TraceEvent::Finish {
            state: state.to_string(),
        });
    }

    /// The recorded events.
    #[must_use]
    pub fn events(&self) -> &[TraceEvent] {
        &self.events
    }

    /// Serializes the event log to JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.events)
    }

    fn flush_pending(&mut self, effect: Option<ItemSnapshot>) {
        if let Some(pending) = self.pending.take() {
            self.events.push(TraceEvent::Step {
                ip: pending.ip,
                opcode: pending.opcode.mnemonic(),
                param: pending.param,
                edits: pending.edits,
                effect,
            });
        }
    }
}

/// Shallow rendering of a stack item. Compound items render as their
/// cardinality only, which keeps the snapshot cycle-safe.
#[must_use]
pub fn snapshot_of(item: &StackItem) -> ItemSnapshot {
    const MAX_RENDERED_BYTES: usize = 64;
    match item {
        StackItem::Boolean(b) => ItemSnapshot {
            kind: "Boolean",
            value: b.to_string(),
        },
        StackItem::Integer(v) => ItemSnapshot {
            kind: "Integer",
            value: v.to_string(),
        },
        StackItem::ByteArray(bytes) => {
            let value = if bytes.len() > MAX_RENDERED_BYTES {
                format!("{}... ({} bytes)", hex::encode(&bytes[..MAX_RENDERED_BYTES]), bytes.len())
            } else {
                hex::encode(bytes)
            };
            ItemSnapshot {
                kind: "ByteArray",
                value,
            }
        }
        StackItem::Array(items) => ItemSnapshot {
            kind: "Array",
            value: format!("len={}", items.borrow().len()),
        },
        StackItem::Struct(items) => ItemSnapshot {
            kind: "Struct",
            value: format!("len={}", items.borrow().len()),
        },
        StackItem::Map(entries) => ItemSnapshot {
            kind: "Map",
            value: format!("len={}", entries.borrow().len()),
        },
        StackItem::InteropInterface(object) => ItemSnapshot {
            kind: "InteropInterface",
            value: object.interface_type().to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_records_param_and_edits() {
        let mut trace = ExecutionTrace::new();
        trace.script_loaded(&[0u8; 20]);
        trace.next_op(0, OpCode::PUSHDATA1);
        trace.set_param(OpCode::PUSHDATA1, &[0xAB]);
        trace.record_push(&StackItem::from_bytes(vec![0xAB]));
        trace.log_result(Some(snapshot_of(&StackItem::from_bytes(vec![0xAB]))));
        trace.finish(VMState::HALT);

        assert_eq!(trace.events().len(), 3);
        match &trace.events()[1] {
            TraceEvent::Step {
                ip,
                opcode,
                param,
                edits,
                effect,
            } => {
                assert_eq!(*ip, 0);
                assert_eq!(opcode, "PUSHDATA1");
                assert_eq!(param.as_deref(), Some("ab"));
                assert_eq!(edits.len(), 1);
                assert!(effect.is_some());
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn json_dump_round_trips() {
        let mut trace = ExecutionTrace::new();
        trace.next_op(3, OpCode::NOP);
        trace.log_result(None);
        let json = trace.to_json().unwrap();
        assert!(json.contains("\"NOP\""));
    }
}
