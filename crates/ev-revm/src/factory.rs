//! Helpers for wrapping Reth EVM factories with the stateful precompiles.

use alloy_evm::{
    eth::{EthBlockExecutorFactory, EthEvm, EthEvmContext, EthEvmFactory},
    precompiles::PrecompilesMap,
    Database, Evm, EvmEnv, EvmFactory,
};
use ev_stateful_precompiles::{EvmPrecompile, PrecompileRegistry};
use reth_evm_ethereum::EthEvmConfig;
use reth_revm::{
    inspector::NoOpInspector,
    revm::{
        context::{
            result::{EVMError, HaltReason},
            BlockEnv, TxEnv,
        },
        context_interface::result::InvalidTransaction,
        primitives::hardfork::SpecId,
        Inspector,
    },
};
use std::sync::Arc;

/// Wrapper around an existing `EvmFactory` that installs the precompiles of a
/// [`PrecompileRegistry`] active at the block's timestamp.
#[derive(Debug, Clone)]
pub struct EvEvmFactory<F> {
    inner: F,
    registry: Arc<PrecompileRegistry>,
}

impl<F> EvEvmFactory<F> {
    /// Creates a new factory wrapper around `inner`.
    pub const fn new(inner: F, registry: Arc<PrecompileRegistry>) -> Self {
        Self { inner, registry }
    }

    /// Registry the factory installs precompiles from.
    pub fn registry(&self) -> &Arc<PrecompileRegistry> {
        &self.registry
    }

    fn install_precompiles(&self, precompiles: &mut PrecompilesMap, timestamp: u64) {
        for precompile in self.registry.active_at(timestamp) {
            let precompile = EvmPrecompile::new(Arc::clone(precompile));
            let address = precompile.address();
            precompiles
                .apply_precompile(&address, move |_| Some(precompile.into_dyn_precompile()));
        }
    }
}

impl EvmFactory for EvEvmFactory<EthEvmFactory> {
    type Evm<DB: Database, I: Inspector<Self::Context<DB>>> = EthEvm<DB, I, PrecompilesMap>;
    type Context<DB: Database> = EthEvmContext<DB>;
    type Tx = TxEnv;
    type Error<DBError: std::error::Error + Send + Sync + 'static> =
        EVMError<DBError, InvalidTransaction>;
    type HaltReason = HaltReason;
    type Spec = SpecId;
    type BlockEnv = BlockEnv;
    type Precompiles = PrecompilesMap;

    fn create_evm<DB: Database>(
        &self,
        db: DB,
        evm_env: EvmEnv<Self::Spec, Self::BlockEnv>,
    ) -> Self::Evm<DB, NoOpInspector> {
        let timestamp = evm_env.block_env.timestamp.saturating_to::<u64>();
        let mut evm = self.inner.create_evm(db, evm_env);
        self.install_precompiles(evm.precompiles_mut(), timestamp);
        evm
    }

    fn create_evm_with_inspector<DB: Database, I: Inspector<Self::Context<DB>>>(
        &self,
        db: DB,
        input: EvmEnv<Self::Spec, Self::BlockEnv>,
        inspector: I,
    ) -> Self::Evm<DB, I> {
        let timestamp = input.block_env.timestamp.saturating_to::<u64>();
        let mut evm = self.inner.create_evm_with_inspector(db, input, inspector);
        self.install_precompiles(evm.precompiles_mut(), timestamp);
        evm
    }
}

/// Wraps an [`EthEvmConfig`] so that its EVMs carry the stateful precompiles.
pub fn with_stateful_precompiles<ChainSpec>(
    config: EthEvmConfig<ChainSpec, EthEvmFactory>,
    registry: Arc<PrecompileRegistry>,
) -> EthEvmConfig<ChainSpec, EvEvmFactory<EthEvmFactory>> {
    let EthEvmConfig {
        executor_factory,
        block_assembler,
    } = config;
    let wrapped_factory = EvEvmFactory::new(*executor_factory.evm_factory(), registry);
    let new_executor_factory = EthBlockExecutorFactory::new(
        *executor_factory.receipt_builder(),
        executor_factory.spec().clone(),
        wrapped_factory,
    );

    EthEvmConfig {
        executor_factory: new_executor_factory,
        block_assembler,
    }
}
