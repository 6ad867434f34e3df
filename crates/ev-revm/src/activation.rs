//! Pre-block activation of stateful precompiles.

use alloy_evm::{Database, EvmInternals};
use alloy_primitives::Address;
use ev_stateful_precompiles::{EvmStateAccessor, PrecompileRegistry, StateError};
use reth_revm::revm::{
    context::{BlockEnv, Journal},
    context_interface::JournalTr,
    primitives::hardfork::SpecId,
    DatabaseCommit,
};

/// Configures every precompile of `registry` that activates in the block
/// described by `block_env`, then commits the resulting state to `db`.
///
/// Must run before the block's first transaction. `parent_timestamp` is
/// `None` for the genesis block. Returns the configured addresses.
pub fn activate_precompiles<DB>(
    db: &mut DB,
    registry: &PrecompileRegistry,
    spec: SpecId,
    block_env: &BlockEnv,
    parent_timestamp: Option<u64>,
) -> Result<Vec<Address>, StateError>
where
    DB: Database + DatabaseCommit,
{
    let timestamp = block_env.timestamp.saturating_to::<u64>();
    let addresses: Vec<Address> =
        registry.iter().map(|entry| entry.precompile().address()).collect();

    let mut journal = Journal::new(&mut *db);
    journal.set_spec_id(spec);

    let configured = {
        let mut internals = EvmInternals::new(&mut journal, block_env);
        let mut state = EvmStateAccessor::new(&mut internals, &addresses);
        registry.configure_activated(&mut state, parent_timestamp, timestamp)?
    };

    if !configured.is_empty() {
        let changes = journal.finalize();
        drop(journal);
        db.commit(changes);
        tracing::info!(
            target: "ev-revm",
            ?configured,
            timestamp,
            "stateful precompiles activated"
        );
    }

    Ok(configured)
}
