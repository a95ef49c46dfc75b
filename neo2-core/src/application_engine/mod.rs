//! The metered execution harness.
//!
//! [`ApplicationEngine`] drives the interpreter one step at a time. Before
//! every step it charges the opcode's price, enforces the gas limit, runs
//! the limit-check battery, and asks the dynamic-invoke gate; only then is
//! the instruction dispatched. A rejected step leaves interpreter state
//! untouched, so nothing ever needs rolling back.

mod limits;
mod prices;

pub use limits::{
    GAS_FREE, MAX_ARRAY_SIZE, MAX_BIGINT_BYTES, MAX_INVOCATION_STACK, MAX_ITEM_SIZE,
    MAX_STACK_SIZE, RATIO,
};

use crate::fixed8::Fixed8;
use crate::snapshot::ContractTable;
use crate::trigger::TriggerType;
use crate::uint::UInt160;
use neo2_vm::{
    ExecutionEngine, ExecutionTrace, InteropService, OpCode, ScriptContainer, VMState, VmError,
    VmResult,
};
use std::cell::RefCell;
use std::rc::Rc;
use thiserror::Error;

/// Why an execution was rejected. Every variant is fatal: `execute()`
/// returns `false` and the engine's effects are discarded.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EngineFault {
    /// The meter passed the gas limit in non-test mode.
    #[error("gas limit exceeded: consumed {consumed}, limit {limit}")]
    GasExhausted { consumed: i64, limit: i64 },
    /// The meter itself overflowed its integer domain.
    #[error("gas meter overflow")]
    MeterOverflow,
    /// An item would exceed the byte-size ceiling.
    #[error("item size limit exceeded")]
    ItemSizeExceeded,
    /// The combined stacks would exceed the depth ceiling.
    #[error("stack size limit exceeded")]
    StackSizeExceeded,
    /// An array would exceed the cardinality ceiling.
    #[error("array size limit exceeded")]
    ArraySizeExceeded,
    /// The invocation stack is at its depth ceiling.
    #[error("invocation stack limit exceeded")]
    InvocationStackExceeded,
    /// An integer operand or result would exceed the magnitude ceiling.
    #[error("big integer limit exceeded")]
    BigIntegerExceeded,
    /// A dynamic call from a contract without the capability.
    #[error("dynamic invoke not permitted for this contract")]
    DynamicInvokeDenied,
    /// The price table could not read its operands.
    #[error("pricing failed: {0}")]
    Pricing(#[from] VmError),
}

/// Adapts the contract table to the interpreter's script lookups.
struct ContractScripts(Rc<dyn ContractTable>);

impl neo2_vm::ScriptTable for ContractScripts {
    fn script(&self, script_hash: &[u8; 20]) -> Option<Vec<u8>> {
        self.0
            .contract_state(&UInt160::new(*script_hash))
            .map(|contract| contract.script)
    }
}

/// A one-shot metered execution over the VM.
pub struct ApplicationEngine {
    trigger: TriggerType,
    interp: ExecutionEngine,
    gas_amount: i64,
    gas_consumed: i64,
    test_mode: bool,
    script_table: Option<Rc<dyn ContractTable>>,
    trace: Option<Rc<RefCell<ExecutionTrace>>>,
    fault: Option<EngineFault>,
}

impl ApplicationEngine {
    /// Creates an engine. The gas limit is the free allowance plus the
    /// caller-supplied gas; in test mode the meter still runs but is never
    /// enforced.
    #[must_use]
    pub fn new(
        trigger: TriggerType,
        container: Option<Rc<dyn ScriptContainer>>,
        script_table: Option<Rc<dyn ContractTable>>,
        service: Option<Box<dyn InteropService>>,
        gas: Fixed8,
        test_mode: bool,
    ) -> Self {
        let vm_table = script_table
            .clone()
            .map(|table| Rc::new(ContractScripts(table)) as Rc<dyn neo2_vm::ScriptTable>);
        Self {
            trigger,
            interp: ExecutionEngine::new(container, vm_table, service),
            gas_amount: GAS_FREE + gas.raw(),
            gas_consumed: 0,
            test_mode,
            script_table,
            trace: None,
            fault: None,
        }
    }

    /// The invocation trigger.
    #[must_use]
    pub fn trigger(&self) -> TriggerType {
        self.trigger
    }

    /// Final machine state.
    #[must_use]
    pub fn state(&self) -> VMState {
        self.interp.state()
    }

    /// The wrapped interpreter.
    #[must_use]
    pub fn interpreter(&self) -> &ExecutionEngine {
        &self.interp
    }

    /// The wrapped interpreter, mutably.
    pub fn interpreter_mut(&mut self) -> &mut ExecutionEngine {
        &mut self.interp
    }

    /// Gas consumed so far, as the external fixed-point value.
    #[must_use]
    pub fn gas_consumed(&self) -> Fixed8 {
        Fixed8::from_raw(self.gas_consumed / RATIO)
    }

    /// Gas consumed so far, in raw meter units.
    #[must_use]
    pub fn gas_consumed_units(&self) -> i64 {
        self.gas_consumed
    }

    /// Why the engine rejected the execution, when the rejection came from
    /// the harness rather than the interpreter.
    #[must_use]
    pub fn fault_reason(&self) -> Option<&EngineFault> {
        self.fault.as_ref()
    }

    /// Attaches a trace recorder to the engine, the interpreter, and the
    /// syscall service, and returns a handle for inspection.
    pub fn begin_debug(&mut self) -> Rc<RefCell<ExecutionTrace>> {
        let trace = Rc::new(RefCell::new(ExecutionTrace::new()));
        self.interp.attach_trace(Rc::clone(&trace));
        self.trace = Some(Rc::clone(&trace));
        trace
    }

    /// Loads a script for execution.
    pub fn load_script(&mut self, script: Vec<u8>, push_only: bool) -> VmResult<()> {
        self.interp.load_script(script, push_only)
    }

    /// Runs to completion. Returns `true` iff the final state carries no
    /// fault flag.
    pub fn execute(&mut self) -> bool {
        loop {
            let state = self.interp.state();
            if state.intersects(VMState::HALT | VMState::FAULT) {
                break;
            }
            if let Some((ip, op)) = self.peek_next() {
                if let Some(trace) = &self.trace {
                    trace.borrow_mut().next_op(ip, op);
                }
                if let Err(fault) = self.pre_step(op) {
                    tracing::debug!(%fault, ip, opcode = %op, "execution rejected");
                    if let Some(trace) = &self.trace {
                        trace.borrow_mut().fault(&fault.to_string());
                    }
                    self.fault = Some(fault);
                    self.interp.set_fault();
                    break;
                }
            }
            // Past the end of the script the interpreter performs the
            // implicit RET itself; no gas, no checks.
            self.interp.step_into();
            if let Some(trace) = &self.trace {
                let effect = self
                    .interp
                    .evaluation_stack()
                    .peek(0)
                    .ok()
                    .map(neo2_vm::trace::snapshot_of);
                trace.borrow_mut().log_result(effect);
            }
        }
        let state = self.interp.state();
        if let Some(trace) = &self.trace {
            trace.borrow_mut().finish(state);
        }
        !state.is_fault()
    }

    fn peek_next(&self) -> Option<(usize, OpCode)> {
        let context = self.interp.current_context()?;
        let ip = context.instruction_pointer();
        if ip < context.len() {
            Some((ip, context.next_instruction()))
        } else {
            None
        }
    }

    /// Gas is charged before any check may reject, and a rejected step
    /// still costs its price; this ordering is protocol behavior.
    fn pre_step(&mut self, op: OpCode) -> Result<(), EngineFault> {
        let price = self.price_of(op)?;
        let delta = price
            .checked_mul(RATIO)
            .ok_or(EngineFault::MeterOverflow)?;
        self.gas_consumed = self
            .gas_consumed
            .checked_add(delta)
            .ok_or(EngineFault::MeterOverflow)?;
        if !self.test_mode && self.gas_consumed > self.gas_amount {
            return Err(EngineFault::GasExhausted {
                consumed: self.gas_consumed,
                limit: self.gas_amount,
            });
        }
        if !self.check_item_size(op) {
            return Err(EngineFault::ItemSizeExceeded);
        }
        if !self.check_stack_size(op) {
            return Err(EngineFault::StackSizeExceeded);
        }
        if !self.check_array_size(op) {
            return Err(EngineFault::ArraySizeExceeded);
        }
        if !self.check_invocation_stack(op) {
            return Err(EngineFault::InvocationStackExceeded);
        }
        if !self.check_big_integers(op) {
            return Err(EngineFault::BigIntegerExceeded);
        }
        if !self.check_dynamic_invoke(op) {
            return Err(EngineFault::DynamicInvokeDenied);
        }
        Ok(())
    }

    /// A call with an all-zero embedded hash takes its target from the
    /// stack at dispatch time; only contracts deployed with the capability
    /// may do that. A non-zero byte anywhere makes the call static, which
    /// is always permitted.
    fn check_dynamic_invoke(&self, op: OpCode) -> bool {
        if op != OpCode::APPCALL && op != OpCode::TAILCALL {
            return true;
        }
        let Some(context) = self.interp.current_context() else {
            return true;
        };
        let script = context.script();
        let ip = context.instruction_pointer();
        for offset in 1..=20 {
            match script.get(ip + offset) {
                Some(&0) => continue,
                Some(_) => return true,
                // Truncated operand: left to the interpreter's own
                // out-of-bounds fault.
                None => return true,
            }
        }
        let Some(table) = &self.script_table else {
            return false;
        };
        let hash = UInt160::new(context.script_hash());
        table
            .contract_state(&hash)
            .is_some_and(|contract| contract.has_dynamic_invoke())
    }
}
