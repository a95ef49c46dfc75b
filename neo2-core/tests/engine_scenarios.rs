//! End-to-end scenarios for the metered execution harness.

use neo2_core::application_engine::{GAS_FREE, RATIO};
use neo2_core::{
    run, run_with_debug, ApplicationEngine, ContractPropertyState, ContractState, EngineFault,
    Fixed8, LedgerView, MemoryLedger, Snapshot, SnapshotTable, StateReader, TriggerType,
};
use neo2_vm::{OpCode, ScriptBuilder, VMState};
use num_bigint::BigInt;
use std::cell::RefCell;
use std::rc::Rc;

/// Engine with no syscall service, unlimited gas unless raw units are given.
fn bare_engine(gas_raw: i64, test_mode: bool) -> ApplicationEngine {
    ApplicationEngine::new(
        TriggerType::Application,
        None,
        None,
        None,
        Fixed8::from_raw(gas_raw),
        test_mode,
    )
}

fn execute(engine: &mut ApplicationEngine, script: Vec<u8>) -> bool {
    engine.load_script(script, false).unwrap();
    engine.execute()
}

/// 2^255 - 1: the largest integer whose encoding fits 32 bytes.
fn max_32_byte_int() -> Vec<u8> {
    let mut bytes = vec![0xFFu8; 32];
    bytes[31] = 0x7F;
    bytes
}

/// -2^255: the smallest integer whose encoding fits 32 bytes.
fn min_32_byte_int() -> Vec<u8> {
    let mut bytes = vec![0u8; 32];
    bytes[31] = 0x80;
    bytes
}

#[test]
fn s1_empty_script_halts_for_free() {
    let mut engine = bare_engine(0, true);
    assert!(execute(&mut engine, Vec::new()));
    assert_eq!(engine.state(), VMState::HALT);
    assert_eq!(engine.gas_consumed_units(), 0);
}

#[test]
fn s2_single_nop_is_free() {
    let mut engine = bare_engine(0, true);
    assert!(execute(&mut engine, vec![OpCode::NOP.value()]));
    assert_eq!(engine.gas_consumed_units(), 0);
}

#[test]
fn s3_stack_overflow_rejected_at_the_boundary() {
    let mut engine = bare_engine(0, true);
    let script = vec![OpCode::PUSH0.value(); 2049];
    assert!(!execute(&mut engine, script));
    assert_eq!(engine.fault_reason(), Some(&EngineFault::StackSizeExceeded));
    assert_eq!(engine.gas_consumed_units(), 0);
    // The stack stopped at the ceiling; the rejected push left no trace.
    assert_eq!(engine.interpreter().stack_item_count(), 2048);
}

#[test]
fn s4_add_overflow_rejected_on_the_hypothetical_result() {
    let mut builder = ScriptBuilder::new();
    builder
        .emit_push(&max_32_byte_int())
        .emit(OpCode::PUSH1)
        .emit(OpCode::ADD);
    let mut engine = bare_engine(0, true);
    assert!(!execute(&mut engine, builder.into_bytes()));
    assert_eq!(engine.fault_reason(), Some(&EngineFault::BigIntegerExceeded));
    // Two free pushes plus the ADD price.
    assert_eq!(engine.gas_consumed_units(), RATIO);
}

#[test]
fn s5_storage_put_is_priced_by_the_kilobyte() {
    // The executing script must be a deployed contract owning storage.
    let mut builder = ScriptBuilder::new();
    builder.emit_push(&vec![0xAB; 2000]).emit_push(&[0x01; 100]);
    builder.emit_syscall("Neo.Storage.GetContext").unwrap();
    builder.emit_syscall("Neo.Storage.Put").unwrap();
    let script = builder.into_bytes();

    let mut snapshot = Snapshot::new();
    snapshot.seed_contract(ContractState::new(
        script.clone(),
        ContractPropertyState::HAS_STORAGE,
        "storage owner",
    ));
    let snapshot = Rc::new(RefCell::new(snapshot));
    let ledger: Rc<dyn LedgerView> = Rc::new(MemoryLedger::new());
    let block = ledger.block_at(0).unwrap();
    let service = StateReader::new(
        TriggerType::Application,
        block,
        Rc::clone(&snapshot),
        ledger,
    );
    let mut engine = ApplicationEngine::new(
        TriggerType::Application,
        None,
        Some(Rc::new(SnapshotTable::new(Rc::clone(&snapshot)))),
        Some(Box::new(service)),
        Fixed8::ZERO,
        true,
    );
    assert!(execute(&mut engine, script));
    // GetContext costs 1; Put covers ceil(2100/1024) = 3 kilobyte units.
    assert_eq!(engine.gas_consumed_units(), (1 + 3000) * RATIO);
    assert_eq!(engine.gas_consumed(), Fixed8::from_raw(3001));
    assert_eq!(snapshot.borrow().storages.len(), 1);
}

#[test]
fn s6_dynamic_appcall_without_capability_is_denied() {
    let snapshot = Rc::new(RefCell::new(Snapshot::new()));
    let mut engine = ApplicationEngine::new(
        TriggerType::Application,
        None,
        Some(Rc::new(SnapshotTable::new(snapshot))),
        None,
        Fixed8::ZERO,
        true,
    );
    let mut builder = ScriptBuilder::new();
    builder.emit_appcall(&[0u8; 20], false);
    assert!(!execute(&mut engine, builder.into_bytes()));
    assert_eq!(engine.fault_reason(), Some(&EngineFault::DynamicInvokeDenied));
    // The APPCALL price was already charged when the gate rejected.
    assert_eq!(engine.gas_consumed_units(), 10 * RATIO);
}

#[test]
fn dynamic_appcall_with_capability_succeeds() {
    let callee_script = vec![OpCode::PUSH8.value()];
    let callee_hash = ContractState::new(
        callee_script.clone(),
        ContractPropertyState::NO_PROPERTY,
        "callee",
    )
    .script_hash();

    let mut builder = ScriptBuilder::new();
    builder
        .emit_push(callee_hash.as_bytes())
        .emit_appcall(&[0u8; 20], false);
    let runner_script = builder.into_bytes();

    let mut snapshot = Snapshot::new();
    snapshot.seed_contract(ContractState::new(
        callee_script,
        ContractPropertyState::NO_PROPERTY,
        "callee",
    ));
    snapshot.seed_contract(ContractState::new(
        runner_script.clone(),
        ContractPropertyState::HAS_DYNAMIC_INVOKE,
        "runner",
    ));

    let mut engine = ApplicationEngine::new(
        TriggerType::Application,
        None,
        Some(Rc::new(SnapshotTable::new(Rc::new(RefCell::new(snapshot))))),
        None,
        Fixed8::ZERO,
        true,
    );
    assert!(execute(&mut engine, runner_script));
    assert_eq!(
        engine
            .interpreter()
            .evaluation_stack()
            .peek(0)
            .unwrap()
            .as_big_integer(),
        Some(BigInt::from(8))
    );
    assert_eq!(engine.gas_consumed_units(), 10 * RATIO);
}

#[test]
fn static_appcall_needs_no_capability() {
    let callee_script = vec![OpCode::PUSH3.value()];
    let callee = ContractState::new(
        callee_script.clone(),
        ContractPropertyState::NO_PROPERTY,
        "callee",
    );
    let callee_hash = callee.script_hash();
    let mut snapshot = Snapshot::new();
    snapshot.seed_contract(callee);

    let mut engine = ApplicationEngine::new(
        TriggerType::Application,
        None,
        Some(Rc::new(SnapshotTable::new(Rc::new(RefCell::new(snapshot))))),
        None,
        Fixed8::ZERO,
        true,
    );
    let mut builder = ScriptBuilder::new();
    builder.emit_appcall(callee_hash.as_bytes(), false);
    assert!(execute(&mut engine, builder.into_bytes()));
}

#[test]
fn s7_gas_exhaustion_stops_before_the_sixth_step() {
    // gas_amount = 5 meter-unit prices; six single-unit jumps.
    let mut engine = bare_engine(5 * RATIO - GAS_FREE, false);
    let mut builder = ScriptBuilder::new();
    for _ in 0..6 {
        builder.emit_jump(OpCode::JMP, 3);
    }
    assert!(!execute(&mut engine, builder.into_bytes()));
    assert!(matches!(
        engine.fault_reason(),
        Some(&EngineFault::GasExhausted { .. })
    ));
    // The sixth charge lands on the meter even though the step never ran.
    assert_eq!(engine.gas_consumed_units(), 6 * RATIO);
    // The instruction pointer still points at the rejected opcode.
    assert_eq!(
        engine
            .interpreter()
            .current_context()
            .unwrap()
            .instruction_pointer(),
        15
    );
}

#[test]
fn five_units_of_gas_cover_five_steps() {
    let mut engine = bare_engine(5 * RATIO - GAS_FREE, false);
    let mut builder = ScriptBuilder::new();
    for _ in 0..5 {
        builder.emit_jump(OpCode::JMP, 3);
    }
    assert!(execute(&mut engine, builder.into_bytes()));
    assert_eq!(engine.gas_consumed_units(), 5 * RATIO);
}

#[test]
fn dec_at_the_negative_boundary_is_rejected() {
    let mut builder = ScriptBuilder::new();
    builder.emit_push(&min_32_byte_int()).emit(OpCode::DEC);
    let mut engine = bare_engine(0, true);
    assert!(!execute(&mut engine, builder.into_bytes()));
    assert_eq!(engine.fault_reason(), Some(&EngineFault::BigIntegerExceeded));
}

#[test]
fn dec_of_a_positive_boundary_value_passes() {
    let mut builder = ScriptBuilder::new();
    builder.emit_push(&max_32_byte_int()).emit(OpCode::DEC);
    let mut engine = bare_engine(0, true);
    assert!(execute(&mut engine, builder.into_bytes()));
}

#[test]
fn inc_at_the_positive_boundary_is_rejected() {
    let mut builder = ScriptBuilder::new();
    builder.emit_push(&max_32_byte_int()).emit(OpCode::INC);
    let mut engine = bare_engine(0, true);
    assert!(!execute(&mut engine, builder.into_bytes()));
    assert_eq!(engine.fault_reason(), Some(&EngineFault::BigIntegerExceeded));
}

#[test]
fn mul_screens_on_operand_lengths_not_the_product() {
    // 2^128 encodes in 17 bytes, 2^120 in 16; their product would fit 32
    // bytes but the protocol's length-sum bound rejects the pair.
    let mut builder = ScriptBuilder::new();
    builder
        .emit_push_int(&(BigInt::from(1) << 128))
        .emit_push_int(&(BigInt::from(1) << 120))
        .emit(OpCode::MUL);
    let mut engine = bare_engine(0, true);
    assert!(!execute(&mut engine, builder.into_bytes()));
    assert_eq!(engine.fault_reason(), Some(&EngineFault::BigIntegerExceeded));
}

#[test]
fn unpack_growth_is_projected_from_cardinality() {
    let mut builder = ScriptBuilder::new();
    for _ in 0..1500 {
        builder.emit(OpCode::PUSH0);
    }
    builder
        .emit_push_int(&BigInt::from(1024))
        .emit(OpCode::NEWARRAY)
        .emit(OpCode::UNPACK);
    let mut engine = bare_engine(0, true);
    assert!(!execute(&mut engine, builder.into_bytes()));
    assert_eq!(engine.fault_reason(), Some(&EngineFault::StackSizeExceeded));
    // NEWARRAY and the rejected UNPACK each cost one unit.
    assert_eq!(engine.gas_consumed_units(), 2 * RATIO);
}

#[test]
fn oversized_array_request_is_rejected() {
    let mut builder = ScriptBuilder::new();
    builder
        .emit_push_int(&BigInt::from(1025))
        .emit(OpCode::NEWARRAY);
    let mut engine = bare_engine(0, true);
    assert!(!execute(&mut engine, builder.into_bytes()));
    assert_eq!(engine.fault_reason(), Some(&EngineFault::ArraySizeExceeded));
    assert_eq!(engine.gas_consumed_units(), RATIO);
}

#[test]
fn pushdata4_length_is_screened_before_allocation() {
    let mut script = vec![OpCode::PUSHDATA4.value()];
    script.extend_from_slice(&(1_048_577u32).to_le_bytes());
    let mut engine = bare_engine(0, true);
    assert!(!execute(&mut engine, script));
    assert_eq!(engine.fault_reason(), Some(&EngineFault::ItemSizeExceeded));
    assert_eq!(engine.gas_consumed_units(), 0);
}

#[test]
fn truncated_pushdata4_is_rejected() {
    let script = vec![OpCode::PUSHDATA4.value(), 0x01, 0x00];
    let mut engine = bare_engine(0, true);
    assert!(!execute(&mut engine, script));
    assert_eq!(engine.fault_reason(), Some(&EngineFault::ItemSizeExceeded));
}

#[test]
fn cat_is_screened_on_the_combined_length() {
    let mut builder = ScriptBuilder::new();
    builder
        .emit_push(&vec![0x55; 600_000])
        .emit_push(&vec![0x66; 600_000])
        .emit(OpCode::CAT);
    let mut engine = bare_engine(0, true);
    assert!(!execute(&mut engine, builder.into_bytes()));
    assert_eq!(engine.fault_reason(), Some(&EngineFault::ItemSizeExceeded));
}

#[test]
fn call_recursion_is_bounded_by_the_invocation_limit() {
    // CALL +0 re-enters itself forever; the battery stops it at the bound.
    let mut engine = bare_engine(0, true);
    assert!(!execute(&mut engine, vec![OpCode::CALL.value(), 0x00, 0x00]));
    assert_eq!(
        engine.fault_reason(),
        Some(&EngineFault::InvocationStackExceeded)
    );
    assert_eq!(engine.gas_consumed_units(), 1024 * RATIO);
}

#[test]
fn interpreter_faults_surface_as_false() {
    // DROP on an empty stack is the interpreter's own fault, not a limit.
    let mut engine = bare_engine(0, true);
    assert!(!execute(&mut engine, vec![OpCode::DROP.value()]));
    assert!(engine.fault_reason().is_none());
    assert!(engine.interpreter().last_error().is_some());
    assert_eq!(engine.gas_consumed_units(), RATIO);
}

#[test]
fn tracer_does_not_change_outcome_or_meter() {
    let mut builder = ScriptBuilder::new();
    builder
        .emit_push(b"ab")
        .emit_push(b"cd")
        .emit(OpCode::CAT)
        .emit(OpCode::SHA256);
    let script = builder.into_bytes();

    let mut plain = bare_engine(0, true);
    let plain_result = execute(&mut plain, script.clone());

    let mut traced = bare_engine(0, true);
    let trace = traced.begin_debug();
    let traced_result = execute(&mut traced, script);

    assert_eq!(plain_result, traced_result);
    assert_eq!(plain.gas_consumed_units(), traced.gas_consumed_units());
    assert_eq!(plain.state(), traced.state());
    assert!(trace.borrow().to_json().unwrap().contains("SHA256"));
}

#[test]
fn tracer_records_the_rejection_reason() {
    let mut engine = bare_engine(5 * RATIO - GAS_FREE, false);
    let trace = engine.begin_debug();
    let mut builder = ScriptBuilder::new();
    for _ in 0..6 {
        builder.emit_jump(OpCode::JMP, 3);
    }
    assert!(!execute(&mut engine, builder.into_bytes()));
    let dump = trace.borrow().to_json().unwrap();
    assert!(dump.contains("gas limit exceeded"));
    assert!(dump.contains("FAULT"));
}

#[test]
fn verification_trigger_is_carried() {
    let engine = ApplicationEngine::new(
        TriggerType::Verification,
        None,
        None,
        None,
        Fixed8::ZERO,
        true,
    );
    assert_eq!(engine.trigger(), TriggerType::Verification);
}

#[test]
fn bootstrap_run_matches_direct_execution() {
    let ledger: Rc<dyn LedgerView> = Rc::new(MemoryLedger::new());
    let mut builder = ScriptBuilder::new();
    builder
        .emit(OpCode::PUSH2)
        .emit(OpCode::PUSH3)
        .emit(OpCode::MUL);
    let script = builder.into_bytes();

    let engine = run(&script, Rc::clone(&ledger), None, None).unwrap();
    assert_eq!(engine.state(), VMState::HALT);
    assert_eq!(
        engine
            .interpreter()
            .evaluation_stack()
            .peek(0)
            .unwrap()
            .as_big_integer(),
        Some(BigInt::from(6))
    );

    let (debug_engine, _trace) = run_with_debug(&script, ledger, None, None).unwrap();
    assert_eq!(
        debug_engine.gas_consumed_units(),
        engine.gas_consumed_units()
    );
}
