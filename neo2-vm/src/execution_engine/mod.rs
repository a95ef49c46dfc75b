//! The stack-based bytecode interpreter.
//!
//! One engine executes one script to completion. The engine owns the
//! evaluation, alt and invocation stacks and consumes the host seams
//! (interop service, script table, script container, crypto). A host driving
//! the engine step by step calls [`ExecutionEngine::step_into`]; internal
//! errors are caught there and convert the state to `FAULT` without
//! propagating.

mod arithmetic;
mod compound;
mod constants;
mod control;
mod crypto_ops;
mod splice;
mod stack_ops;

#[cfg(test)]
mod tests;

use crate::crypto::{Crypto, P256Crypto};
use crate::error::{VmError, VmResult};
use crate::evaluation_stack::EvaluationStack;
use crate::execution_context::ExecutionContext;
use crate::interop::{InteropService, ScriptContainer, ScriptTable};
use crate::op_code::OpCode;
use crate::stack_item::StackItem;
use crate::trace::ExecutionTrace;
use crate::vm_state::VMState;
use crate::MAX_INVOCATION_DEPTH;
use num_bigint::BigInt;
use num_traits::ToPrimitive;
use std::cell::RefCell;
use std::rc::Rc;

/// The virtual machine.
pub struct ExecutionEngine {
    state: VMState,
    evaluation_stack: EvaluationStack,
    alt_stack: EvaluationStack,
    invocation_stack: Vec<ExecutionContext>,
    container: Option<Rc<dyn ScriptContainer>>,
    crypto: Rc<dyn Crypto>,
    table: Option<Rc<dyn ScriptTable>>,
    service: Option<Box<dyn InteropService>>,
    trace: Option<Rc<RefCell<ExecutionTrace>>>,
    last_error: Option<VmError>,
}

impl ExecutionEngine {
    /// Creates an engine over the given host seams, with P-256 signature
    /// verification.
    #[must_use]
    pub fn new(
        container: Option<Rc<dyn ScriptContainer>>,
        table: Option<Rc<dyn ScriptTable>>,
        service: Option<Box<dyn InteropService>>,
    ) -> Self {
        Self::with_crypto(container, table, service, Rc::new(P256Crypto))
    }

    /// Creates an engine with an explicit signature verifier.
    #[must_use]
    pub fn with_crypto(
        container: Option<Rc<dyn ScriptContainer>>,
        table: Option<Rc<dyn ScriptTable>>,
        service: Option<Box<dyn InteropService>>,
        crypto: Rc<dyn Crypto>,
    ) -> Self {
        Self {
            state: VMState::NONE,
            evaluation_stack: EvaluationStack::new(),
            alt_stack: EvaluationStack::new(),
            invocation_stack: Vec::new(),
            container,
            crypto,
            table,
            service,
            trace: None,
            last_error: None,
        }
    }

    /// Current machine state.
    #[must_use]
    pub fn state(&self) -> VMState {
        self.state
    }

    /// Overwrites the machine state.
    pub fn set_state(&mut self, state: VMState) {
        self.state = state;
    }

    /// Marks the execution faulted.
    pub fn set_fault(&mut self) {
        self.state.insert(VMState::FAULT);
    }

    /// The evaluation stack.
    #[must_use]
    pub fn evaluation_stack(&self) -> &EvaluationStack {
        &self.evaluation_stack
    }

    /// The evaluation stack, mutably.
    pub fn evaluation_stack_mut(&mut self) -> &mut EvaluationStack {
        &mut self.evaluation_stack
    }

    /// The alt stack.
    #[must_use]
    pub fn alt_stack(&self) -> &EvaluationStack {
        &self.alt_stack
    }

    /// The invocation stack, bottom to top.
    #[must_use]
    pub fn invocation_stack(&self) -> &[ExecutionContext] {
        &self.invocation_stack
    }

    /// The context currently executing.
    #[must_use]
    pub fn current_context(&self) -> Option<&ExecutionContext> {
        self.invocation_stack.last()
    }

    /// The context currently executing, mutably.
    pub fn current_context_mut(&mut self) -> Option<&mut ExecutionContext> {
        self.invocation_stack.last_mut()
    }

    /// Combined size of the evaluation and alt stacks.
    #[must_use]
    pub fn stack_item_count(&self) -> usize {
        self.evaluation_stack.len() + self.alt_stack.len()
    }

    /// The interop service, when one is registered.
    #[must_use]
    pub fn service(&self) -> Option<&dyn InteropService> {
        self.service.as_deref()
    }

    /// The error that faulted the execution, when the fault came from
    /// inside the interpreter.
    #[must_use]
    pub fn last_error(&self) -> Option<&VmError> {
        self.last_error.as_ref()
    }

    /// Attaches a trace recorder to the engine, its evaluation stack, and
    /// the interop service.
    pub fn attach_trace(&mut self, trace: Rc<RefCell<ExecutionTrace>>) {
        self.evaluation_stack.attach_trace(Rc::clone(&trace));
        if let Some(service) = &mut self.service {
            service.attach_trace(Rc::clone(&trace));
        }
        self.trace = Some(trace);
    }

    /// Pushes a script onto the invocation stack.
    pub fn load_script(&mut self, script: Vec<u8>, push_only: bool) -> VmResult<()> {
        if self.invocation_stack.len() >= MAX_INVOCATION_DEPTH {
            return Err(VmError::InvocationDepthExceeded {
                depth: self.invocation_stack.len(),
            });
        }
        let context = ExecutionContext::new(Rc::new(script), push_only);
        if let Some(trace) = &self.trace {
            trace.borrow_mut().script_loaded(&context.script_hash());
        }
        self.invocation_stack.push(context);
        Ok(())
    }

    /// Runs to completion and returns the final state.
    pub fn execute(&mut self) -> VMState {
        self.state.remove(VMState::BREAK);
        while !self.state.intersects(VMState::HALT | VMState::FAULT) {
            self.step_into();
        }
        self.state
    }

    /// Executes a single instruction. Errors are converted to a `FAULT`
    /// state here and never propagate to the caller.
    pub fn step_into(&mut self) {
        if self.state.intersects(VMState::HALT | VMState::FAULT) {
            return;
        }
        if let Err(err) = self.execute_next() {
            tracing::debug!(error = %err, "interpreter fault");
            if let Some(trace) = &self.trace {
                trace.borrow_mut().fault(&err.to_string());
            }
            self.last_error = Some(err);
            self.state.insert(VMState::FAULT);
        }
    }

    fn execute_next(&mut self) -> VmResult<()> {
        let Some(context) = self.invocation_stack.last() else {
            self.state.insert(VMState::HALT);
            return Ok(());
        };
        let op = context.next_instruction();
        if context.is_push_only() && !op.is_push_constant() && op != OpCode::RET {
            return Err(VmError::PushOnlyViolation { opcode: op.value() });
        }
        self.execute_op(op)
    }

    fn execute_op(&mut self, op: OpCode) -> VmResult<()> {
        if op.is_push_bytes() {
            return self.op_push_bytes(op);
        }
        if op == OpCode::PUSHM1 || (OpCode::PUSH1.0..=OpCode::PUSH16.0).contains(&op.0) {
            return self.op_push_constant(op);
        }
        match op {
            OpCode::PUSH0 => self.op_push0(),
            OpCode::PUSHDATA1 | OpCode::PUSHDATA2 | OpCode::PUSHDATA4 => self.op_push_data(op),

            OpCode::NOP => self.advance(1),
            OpCode::JMP | OpCode::JMPIF | OpCode::JMPIFNOT => self.op_jump(op),
            OpCode::CALL => self.op_call(),
            OpCode::RET => self.op_ret(),
            OpCode::APPCALL | OpCode::TAILCALL => self.op_appcall(op),
            OpCode::SYSCALL => self.op_syscall(),
            OpCode::THROW => Err(VmError::Throw),
            OpCode::THROWIFNOT => self.op_throw_if_not(),

            OpCode::DUPFROMALTSTACK
            | OpCode::TOALTSTACK
            | OpCode::FROMALTSTACK
            | OpCode::XDROP
            | OpCode::XSWAP
            | OpCode::XTUCK
            | OpCode::DEPTH
            | OpCode::DROP
            | OpCode::DUP
            | OpCode::NIP
            | OpCode::OVER
            | OpCode::PICK
            | OpCode::ROLL
            | OpCode::ROT
            | OpCode::SWAP
            | OpCode::TUCK => self.op_stack(op),

            OpCode::CAT | OpCode::SUBSTR | OpCode::LEFT | OpCode::RIGHT | OpCode::SIZE => {
                self.op_splice(op)
            }

            OpCode::INVERT | OpCode::AND | OpCode::OR | OpCode::XOR | OpCode::EQUAL => {
                self.op_bitwise(op)
            }

            OpCode::INC
            | OpCode::DEC
            | OpCode::SIGN
            | OpCode::NEGATE
            | OpCode::ABS
            | OpCode::NOT
            | OpCode::NZ
            | OpCode::ADD
            | OpCode::SUB
            | OpCode::MUL
            | OpCode::DIV
            | OpCode::MOD
            | OpCode::SHL
            | OpCode::SHR
            | OpCode::BOOLAND
            | OpCode::BOOLOR
            | OpCode::NUMEQUAL
            | OpCode::NUMNOTEQUAL
            | OpCode::LT
            | OpCode::GT
            | OpCode::LTE
            | OpCode::GTE
            | OpCode::MIN
            | OpCode::MAX
            | OpCode::WITHIN => self.op_arithmetic(op),

            OpCode::SHA1
            | OpCode::SHA256
            | OpCode::HASH160
            | OpCode::HASH256
            | OpCode::CHECKSIG
            | OpCode::VERIFY
            | OpCode::CHECKMULTISIG => self.op_crypto(op),

            OpCode::ARRAYSIZE
            | OpCode::PACK
            | OpCode::UNPACK
            | OpCode::PICKITEM
            | OpCode::SETITEM
            | OpCode::NEWARRAY
            | OpCode::NEWSTRUCT
            | OpCode::NEWMAP
            | OpCode::APPEND
            | OpCode::REVERSE
            | OpCode::REMOVE
            | OpCode::HASKEY
            | OpCode::KEYS
            | OpCode::VALUES => self.op_compound(op),

            _ => Err(VmError::InvalidOpCode { opcode: op.value() }),
        }
    }

    // ---- shared helpers for the opcode handlers ----

    fn no_context() -> VmError {
        VmError::invalid_operation("no current context")
    }

    pub(crate) fn advance(&mut self, count: usize) -> VmResult<()> {
        let context = self.current_context_mut().ok_or_else(Self::no_context)?;
        let ip = context.instruction_pointer();
        context.set_instruction_pointer(ip + count);
        Ok(())
    }

    pub(crate) fn set_ip(&mut self, ip: usize) -> VmResult<()> {
        let context = self.current_context_mut().ok_or_else(Self::no_context)?;
        context.set_instruction_pointer(ip);
        Ok(())
    }

    /// Reads `count` operand bytes directly after the current opcode.
    pub(crate) fn operand(&self, count: usize) -> VmResult<Vec<u8>> {
        let context = self.current_context().ok_or_else(Self::no_context)?;
        Ok(context
            .read_bytes(context.instruction_pointer() + 1, count)?
            .to_vec())
    }

    pub(crate) fn trace_param(&self, op: OpCode, operand: &[u8]) {
        if let Some(trace) = &self.trace {
            trace.borrow_mut().set_param(op, operand);
        }
    }

    pub(crate) fn trace_syscall(&self, api: &str) {
        if let Some(trace) = &self.trace {
            trace.borrow_mut().syscall(api);
        }
    }

    pub(crate) fn push_item(&mut self, item: StackItem) {
        self.evaluation_stack.push(item);
    }

    pub(crate) fn pop_item(&mut self) -> VmResult<StackItem> {
        self.evaluation_stack.pop()
    }

    pub(crate) fn pop_int(&mut self) -> VmResult<BigInt> {
        self.pop_item()?
            .as_big_integer()
            .ok_or_else(|| VmError::invalid_type("integer"))
    }

    pub(crate) fn pop_bytes(&mut self) -> VmResult<Vec<u8>> {
        self.pop_item()?
            .as_byte_array()
            .ok_or_else(|| VmError::invalid_type("byte array"))
    }

    pub(crate) fn pop_bool(&mut self) -> VmResult<bool> {
        Ok(self.pop_item()?.as_bool())
    }

    /// Pops a non-negative index that fits the address space.
    pub(crate) fn pop_index(&mut self) -> VmResult<usize> {
        let value = self.pop_int()?;
        value
            .to_usize()
            .ok_or_else(|| VmError::invalid_operation("negative or oversized count"))
    }
}
