//! Unit tests for the execution engine.

use super::ExecutionEngine;
use crate::error::VmResult;
use crate::interop::{InteropService, ScriptContainer, ScriptTable};
use crate::op_code::OpCode;
use crate::script_builder::ScriptBuilder;
use crate::stack_item::StackItem;
use crate::vm_state::VMState;
use num_bigint::BigInt;
use std::any::Any;
use std::collections::HashMap;
use std::rc::Rc;

fn run(script: Vec<u8>) -> ExecutionEngine {
    let mut engine = ExecutionEngine::new(None, None, None);
    engine.load_script(script, false).unwrap();
    engine.execute();
    engine
}

fn top_int(engine: &ExecutionEngine) -> BigInt {
    engine
        .evaluation_stack()
        .peek(0)
        .unwrap()
        .as_big_integer()
        .unwrap()
}

#[test]
fn empty_script_halts() {
    let engine = run(Vec::new());
    assert_eq!(engine.state(), VMState::HALT);
    assert!(engine.evaluation_stack().is_empty());
}

#[test]
fn push_add_halts_with_sum() {
    let engine = run(vec![
        OpCode::PUSH1.value(),
        OpCode::PUSH2.value(),
        OpCode::ADD.value(),
    ]);
    assert_eq!(engine.state(), VMState::HALT);
    assert_eq!(top_int(&engine), BigInt::from(3));
}

#[test]
fn pushdata_pushes_payload() {
    let mut builder = ScriptBuilder::new();
    builder.emit_push(&[0xDE, 0xAD, 0xBE, 0xEF]);
    let engine = run(builder.into_bytes());
    assert_eq!(engine.state(), VMState::HALT);
    assert_eq!(
        engine.evaluation_stack().peek(0).unwrap().as_byte_array(),
        Some(vec![0xDE, 0xAD, 0xBE, 0xEF])
    );
}

#[test]
fn jmpif_takes_branch() {
    // PUSH1; JMPIF +4 (to PUSH5); PUSH2; PUSH5
    let script = vec![
        OpCode::PUSH1.value(),
        OpCode::JMPIF.value(),
        0x04,
        0x00,
        OpCode::PUSH2.value(),
        OpCode::PUSH5.value(),
    ];
    let engine = run(script);
    assert_eq!(engine.state(), VMState::HALT);
    assert_eq!(engine.evaluation_stack().len(), 1);
    assert_eq!(top_int(&engine), BigInt::from(5));
}

#[test]
fn call_and_return() {
    // CALL +4; RET; PUSH2; RET
    let script = vec![
        OpCode::CALL.value(),
        0x04,
        0x00,
        OpCode::RET.value(),
        OpCode::PUSH2.value(),
        OpCode::RET.value(),
    ];
    let engine = run(script);
    assert_eq!(engine.state(), VMState::HALT);
    assert_eq!(top_int(&engine), BigInt::from(2));
}

#[test]
fn unbounded_call_recursion_faults() {
    // CALL +0 recurses into itself until the depth bound trips.
    let engine = run(vec![OpCode::CALL.value(), 0x00, 0x00]);
    assert_eq!(engine.state(), VMState::FAULT);
    assert!(engine.last_error().is_some());
}

#[test]
fn alt_stack_round_trip() {
    let script = vec![
        OpCode::PUSH7.value(),
        OpCode::TOALTSTACK.value(),
        OpCode::DUPFROMALTSTACK.value(),
        OpCode::FROMALTSTACK.value(),
        OpCode::ADD.value(),
    ];
    let engine = run(script);
    assert_eq!(engine.state(), VMState::HALT);
    assert_eq!(top_int(&engine), BigInt::from(14));
}

#[test]
fn pack_unpack_round_trip() {
    // PUSH1 PUSH2 PUSH3; PUSH3 PACK; UNPACK -> 1 2 3 and the count 3 on top.
    let script = vec![
        OpCode::PUSH1.value(),
        OpCode::PUSH2.value(),
        OpCode::PUSH3.value(),
        OpCode::PUSH3.value(),
        OpCode::PACK.value(),
        OpCode::UNPACK.value(),
    ];
    let engine = run(script);
    assert_eq!(engine.state(), VMState::HALT);
    assert_eq!(engine.evaluation_stack().len(), 4);
    assert_eq!(top_int(&engine), BigInt::from(3));
    assert_eq!(
        engine
            .evaluation_stack()
            .peek(1)
            .unwrap()
            .as_big_integer()
            .unwrap(),
        BigInt::from(3)
    );
}

#[test]
fn setitem_mutates_shared_array() {
    // [0] -> array of 1 slot; DUP; 0; 5; SETITEM; 0; PICKITEM
    let script = vec![
        OpCode::PUSH1.value(),
        OpCode::NEWARRAY.value(),
        OpCode::DUP.value(),
        OpCode::PUSH0.value(),
        OpCode::PUSH5.value(),
        OpCode::SETITEM.value(),
        OpCode::PUSH0.value(),
        OpCode::PICKITEM.value(),
    ];
    let engine = run(script);
    assert_eq!(engine.state(), VMState::HALT);
    assert_eq!(top_int(&engine), BigInt::from(5));
}

#[test]
fn cat_concatenates() {
    let mut builder = ScriptBuilder::new();
    builder.emit_push(b"ab").emit_push(b"cd").emit(OpCode::CAT);
    let engine = run(builder.into_bytes());
    assert_eq!(engine.state(), VMState::HALT);
    assert_eq!(
        engine.evaluation_stack().peek(0).unwrap().as_byte_array(),
        Some(b"abcd".to_vec())
    );
}

#[test]
fn throw_faults() {
    let engine = run(vec![OpCode::THROW.value()]);
    assert_eq!(engine.state(), VMState::FAULT);
}

#[test]
fn throwifnot_passes_on_true() {
    let engine = run(vec![OpCode::PUSH1.value(), OpCode::THROWIFNOT.value()]);
    assert_eq!(engine.state(), VMState::HALT);
}

#[test]
fn push_only_context_rejects_other_opcodes() {
    let mut engine = ExecutionEngine::new(None, None, None);
    engine
        .load_script(vec![OpCode::PUSH1.value(), OpCode::ADD.value()], true)
        .unwrap();
    engine.execute();
    assert_eq!(engine.state(), VMState::FAULT);
}

#[test]
fn truncated_operand_faults() {
    // PUSHDATA1 announcing 4 bytes with only 1 present.
    let engine = run(vec![OpCode::PUSHDATA1.value(), 0x04, 0xAA]);
    assert_eq!(engine.state(), VMState::FAULT);
}

#[test]
fn shift_bound_faults() {
    let mut builder = ScriptBuilder::new();
    builder
        .emit_push_int(&BigInt::from(2))
        .emit_push_int(&BigInt::from(300))
        .emit(OpCode::SHL);
    let engine = run(builder.into_bytes());
    assert_eq!(engine.state(), VMState::FAULT);
}

struct FixedTable {
    scripts: HashMap<[u8; 20], Vec<u8>>,
}

impl ScriptTable for FixedTable {
    fn script(&self, script_hash: &[u8; 20]) -> Option<Vec<u8>> {
        self.scripts.get(script_hash).cloned()
    }
}

#[test]
fn appcall_runs_callee_script() {
    let callee = vec![OpCode::PUSH9.value(), OpCode::RET.value()];
    let hash = [0x11u8; 20];
    let table = FixedTable {
        scripts: HashMap::from([(hash, callee)]),
    };
    let mut builder = ScriptBuilder::new();
    builder.emit_appcall(&hash, false);
    let mut engine = ExecutionEngine::new(None, Some(Rc::new(table)), None);
    engine.load_script(builder.into_bytes(), false).unwrap();
    engine.execute();
    assert_eq!(engine.state(), VMState::HALT);
    assert_eq!(top_int(&engine), BigInt::from(9));
}

#[test]
fn dynamic_appcall_pops_target() {
    let callee = vec![OpCode::PUSH8.value()];
    let hash = [0x22u8; 20];
    let table = FixedTable {
        scripts: HashMap::from([(hash, callee)]),
    };
    let mut builder = ScriptBuilder::new();
    builder.emit_push(&hash).emit_appcall(&[0u8; 20], false);
    let mut engine = ExecutionEngine::new(None, Some(Rc::new(table)), None);
    engine.load_script(builder.into_bytes(), false).unwrap();
    engine.execute();
    assert_eq!(engine.state(), VMState::HALT);
    assert_eq!(top_int(&engine), BigInt::from(8));
}

#[test]
fn appcall_to_unknown_contract_faults() {
    let table = FixedTable {
        scripts: HashMap::new(),
    };
    let mut builder = ScriptBuilder::new();
    builder.emit_appcall(&[0x33u8; 20], false);
    let mut engine = ExecutionEngine::new(None, Some(Rc::new(table)), None);
    engine.load_script(builder.into_bytes(), false).unwrap();
    engine.execute();
    assert_eq!(engine.state(), VMState::FAULT);
}

struct EchoService;

impl InteropService for EchoService {
    fn invoke(&mut self, api: &str, engine: &mut ExecutionEngine) -> VmResult<()> {
        engine.push_item(StackItem::from_bytes(api.as_bytes().to_vec()));
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[test]
fn syscall_dispatches_to_service() {
    let mut builder = ScriptBuilder::new();
    builder.emit_syscall("Test.Echo").unwrap();
    let mut engine = ExecutionEngine::new(None, None, Some(Box::new(EchoService)));
    engine.load_script(builder.into_bytes(), false).unwrap();
    engine.execute();
    assert_eq!(engine.state(), VMState::HALT);
    assert_eq!(
        engine.evaluation_stack().peek(0).unwrap().as_byte_array(),
        Some(b"Test.Echo".to_vec())
    );
}

#[test]
fn syscall_without_service_faults() {
    let mut builder = ScriptBuilder::new();
    builder.emit_syscall("Test.Echo").unwrap();
    let mut engine = ExecutionEngine::new(None, None, None);
    engine.load_script(builder.into_bytes(), false).unwrap();
    engine.execute();
    assert_eq!(engine.state(), VMState::FAULT);
}

struct TestContainer(Vec<u8>);

impl ScriptContainer for TestContainer {
    fn message(&self) -> Vec<u8> {
        self.0.clone()
    }
}

#[test]
fn checksig_verifies_p256_signature() {
    use p256::ecdsa::signature::Signer;
    use p256::ecdsa::{Signature, SigningKey};

    let signing_key = SigningKey::from_slice(&[0x01; 32]).unwrap();
    let message = b"transaction bytes".to_vec();
    let signature: Signature = signing_key.sign(&message);
    let public_key = signing_key
        .verifying_key()
        .to_encoded_point(true)
        .as_bytes()
        .to_vec();

    let signature_bytes = signature.to_bytes();
    let mut builder = ScriptBuilder::new();
    builder
        .emit_push(signature_bytes.as_slice())
        .emit_push(&public_key)
        .emit(OpCode::CHECKSIG);
    let container = Rc::new(TestContainer(message));
    let mut engine = ExecutionEngine::new(Some(container), None, None);
    engine.load_script(builder.into_bytes(), false).unwrap();
    engine.execute();
    assert_eq!(engine.state(), VMState::HALT);
    assert!(engine.evaluation_stack().peek(0).unwrap().as_bool());
}

#[test]
fn checksig_rejects_wrong_message() {
    use p256::ecdsa::signature::Signer;
    use p256::ecdsa::{Signature, SigningKey};

    let signing_key = SigningKey::from_slice(&[0x02; 32]).unwrap();
    let signature: Signature = signing_key.sign(b"signed message");
    let public_key = signing_key
        .verifying_key()
        .to_encoded_point(true)
        .as_bytes()
        .to_vec();

    let signature_bytes = signature.to_bytes();
    let mut builder = ScriptBuilder::new();
    builder
        .emit_push(signature_bytes.as_slice())
        .emit_push(&public_key)
        .emit(OpCode::CHECKSIG);
    let container = Rc::new(TestContainer(b"different message".to_vec()));
    let mut engine = ExecutionEngine::new(Some(container), None, None);
    engine.load_script(builder.into_bytes(), false).unwrap();
    engine.execute();
    assert_eq!(engine.state(), VMState::HALT);
    assert!(!engine.evaluation_stack().peek(0).unwrap().as_bool());
}

#[test]
fn trace_is_a_pure_observer() {
    use crate::trace::ExecutionTrace;
    use std::cell::RefCell;

    let script = vec![
        OpCode::PUSH1.value(),
        OpCode::PUSH2.value(),
        OpCode::ADD.value(),
    ];

    let plain = run(script.clone());

    let trace = Rc::new(RefCell::new(ExecutionTrace::new()));
    let mut traced = ExecutionEngine::new(None, None, None);
    traced.attach_trace(Rc::clone(&trace));
    traced.load_script(script, false).unwrap();
    traced.execute();

    assert_eq!(plain.state(), traced.state());
    assert_eq!(top_int(&plain), top_int(&traced));
    assert!(!trace.borrow().events().is_empty());
}
