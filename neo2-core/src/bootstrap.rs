//! One-shot engine entry points.
//!
//! Both entry points synthesize a tip+1 persisting block when the caller
//! does not supply one, create a fresh cache layer, wire a [`StateReader`]
//! over it, and execute the script under the application trigger in test
//! mode (the meter runs but is not enforced).

use crate::application_engine::ApplicationEngine;
use crate::block::Block;
use crate::fixed8::Fixed8;
use crate::interop::StateReader;
use crate::ledger::LedgerView;
use crate::snapshot::{Snapshot, SnapshotTable};
use crate::trigger::TriggerType;
use neo2_vm::{ExecutionTrace, ScriptContainer, VmResult};
use std::cell::RefCell;
use std::rc::Rc;

fn build_engine(
    ledger: &Rc<dyn LedgerView>,
    container: Option<Rc<dyn ScriptContainer>>,
    persisting_block: Option<Block>,
) -> ApplicationEngine {
    let block = persisting_block
        .unwrap_or_else(|| Block::on_top_of(&ledger.tip(), ledger.tip_hash()));
    tracing::debug!(height = block.header.index, "bootstrapping one-shot engine");
    let snapshot = Rc::new(RefCell::new(Snapshot::new()));
    let service = StateReader::new(
        TriggerType::Application,
        block,
        Rc::clone(&snapshot),
        Rc::clone(ledger),
    );
    let table = Rc::new(SnapshotTable::new(snapshot));
    ApplicationEngine::new(
        TriggerType::Application,
        container,
        Some(table),
        Some(Box::new(service)),
        Fixed8::ZERO,
        true,
    )
}

/// Executes `script` once over a synthesized (or provided) persisting block
/// and fresh caches. The returned engine carries the final state, the
/// meter, and the evaluation stack.
pub fn run(
    script: &[u8],
    ledger: Rc<dyn LedgerView>,
    container: Option<Rc<dyn ScriptContainer>>,
    persisting_block: Option<Block>,
) -> VmResult<ApplicationEngine> {
    let mut engine = build_engine(&ledger, container, persisting_block);
    engine.load_script(script.to_vec(), false)?;
    engine.execute();
    Ok(engine)
}

/// Same as [`run`], but attaches a trace recorder before loading the script
/// and returns it alongside the engine.
pub fn run_with_debug(
    script: &[u8],
    ledger: Rc<dyn LedgerView>,
    container: Option<Rc<dyn ScriptContainer>>,
    persisting_block: Option<Block>,
) -> VmResult<(ApplicationEngine, Rc<RefCell<ExecutionTrace>>)> {
    let mut engine = build_engine(&ledger, container, persisting_block);
    let trace = engine.begin_debug();
    engine.load_script(script.to_vec(), false)?;
    engine.execute();
    Ok((engine, trace))
}
