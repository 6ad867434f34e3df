//! Revm integration: runs stateful precompiles against the EVM journal.

use crate::{
    dispatch::{PrecompileCall, StatefulPrecompile},
    error::{CallError, StateError},
    state::StateAccessor,
};
use alloy_evm::{
    precompiles::{DynPrecompile, Precompile, PrecompileInput},
    revm::precompile::{PrecompileError, PrecompileId, PrecompileResult},
    EvmInternals, EvmInternalsError,
};
use alloy_primitives::{Address, Bytes, U256};
use revm::{bytecode::Bytecode, precompile::PrecompileOutput};
use std::sync::{Arc, OnceLock};

/// [`StateAccessor`] backed by the EVM journal.
///
/// Writes are journaled, so the EVM reverts them together with the rest of
/// the call frame when the call fails.
pub struct EvmStateAccessor<'a, 'db> {
    internals: &'a mut EvmInternals<'db>,
    precompiles: &'a [Address],
}

impl<'a, 'db> EvmStateAccessor<'a, 'db> {
    /// Wraps `internals`. Accounts created at one of `precompiles` receive the
    /// precompile bytecode marker.
    pub fn new(internals: &'a mut EvmInternals<'db>, precompiles: &'a [Address]) -> Self {
        Self {
            internals,
            precompiles,
        }
    }

    /// Code installed on a precompile account when it is first created.
    ///
    /// A lone `INVALID` opcode. Code makes the account non-empty, so the role
    /// and fee slots under it are never cleared with empty accounts.
    fn bytecode() -> &'static Bytecode {
        static BYTECODE: OnceLock<Bytecode> = OnceLock::new();
        BYTECODE.get_or_init(|| Bytecode::new_raw(Bytes::from_static(&[0xFE])))
    }

    fn map_internals_error(err: EvmInternalsError) -> StateError {
        StateError::Backend(err.to_string())
    }
}

impl std::fmt::Debug for EvmStateAccessor<'_, '_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvmStateAccessor")
            .field("precompiles", &self.precompiles)
            .finish_non_exhaustive()
    }
}

impl StateAccessor for EvmStateAccessor<'_, '_> {
    fn exists(&mut self, address: Address) -> Result<bool, StateError> {
        let account = self.internals.load_account(address).map_err(Self::map_internals_error)?;
        Ok(!account.is_loaded_as_not_existing())
    }

    fn create_account(&mut self, address: Address) -> Result<(), StateError> {
        let account = self.internals.load_account(address).map_err(Self::map_internals_error)?;

        if account.is_loaded_as_not_existing() {
            if self.precompiles.contains(&address) {
                self.internals.set_code(address, Self::bytecode().clone());
                self.internals.nonce_bump_journal_entry(address);
            }
            self.internals.touch_account(address);
        }

        Ok(())
    }

    fn add_balance(&mut self, address: Address, amount: U256) -> Result<(), StateError> {
        let account = self.internals.load_account(address).map_err(Self::map_internals_error)?;
        let new_balance =
            account.info.balance.checked_add(amount).ok_or(StateError::BalanceOverflow(address))?;

        self.internals.set_balance(address, new_balance).map_err(Self::map_internals_error)?;
        self.internals.touch_account(address);
        Ok(())
    }

    fn get_slot(&mut self, address: Address, key: U256) -> Result<U256, StateError> {
        let value = self.internals.sload(address, key).map_err(Self::map_internals_error)?;
        Ok(*value)
    }

    fn set_slot(&mut self, address: Address, key: U256, value: U256) -> Result<(), StateError> {
        self.internals.sstore(address, key, value).map_err(Self::map_internals_error)?;
        self.internals.touch_account(address);
        Ok(())
    }
}

/// Adapts a [`StatefulPrecompile`] to the alloy-evm [`Precompile`] interface.
#[derive(Clone, Debug)]
pub struct EvmPrecompile {
    inner: Arc<dyn StatefulPrecompile>,
    address: Address,
    id: PrecompileId,
}

impl EvmPrecompile {
    /// Wraps `inner`; its name becomes the precompile id.
    pub fn new(inner: Arc<dyn StatefulPrecompile>) -> Self {
        let id = PrecompileId::custom(inner.name());
        let address = inner.address();
        Self { inner, address, id }
    }

    /// Address the wrapped precompile is installed at.
    pub const fn address(&self) -> Address {
        self.address
    }

    /// Converts into a [`DynPrecompile`] for a `PrecompilesMap`.
    pub fn into_dyn_precompile(self) -> DynPrecompile {
        let id = self.id.clone();
        DynPrecompile::new_stateful(id, move |input| self.call(input))
    }

    fn map_call_error(err: CallError) -> PrecompileError {
        match err {
            CallError::OutOfGas => PrecompileError::OutOfGas,
            other => PrecompileError::Other(other.to_string().into()),
        }
    }
}

impl Precompile for EvmPrecompile {
    fn precompile_id(&self) -> &PrecompileId {
        &self.id
    }

    fn call(&self, mut input: PrecompileInput<'_>) -> PrecompileResult {
        let address = self.address;
        let caller = input.caller;
        let gas = input.gas;
        let data = input.data;

        tracing::debug!(
            target: "stateful_precompiles",
            name = self.inner.name(),
            ?caller,
            gas,
            is_static = input.is_static_call(),
            calldata_len = data.len(),
            "precompile call invoked"
        );

        let call = PrecompileCall {
            caller,
            address,
            input: data,
            gas,
            read_only: input.is_static_call(),
        };
        let mut state =
            EvmStateAccessor::new(input.internals_mut(), std::slice::from_ref(&self.address));

        match self.inner.run(&mut state, call) {
            Ok(out) => Ok(PrecompileOutput::new(gas - out.remaining_gas, out.output)),
            Err(failure) => {
                tracing::debug!(
                    target: "stateful_precompiles",
                    name = self.inner.name(),
                    error = %failure.error,
                    remaining_gas = failure.remaining_gas,
                    "precompile call failed"
                );
                Err(Self::map_call_error(failure.error))
            }
        }
    }

    fn is_pure(&self) -> bool {
        false
    }
}
