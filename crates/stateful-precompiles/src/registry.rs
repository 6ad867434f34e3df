//! Host-owned set of stateful precompiles.
//!
//! The registry is built once at startup from [`StatefulPrecompilesConfig`]
//! and handed to the EVM factory by reference. It replaces per-process
//! singletons, so every test can build its own.

use crate::{
    config::StatefulPrecompilesConfig,
    dispatch::{CallResult, PrecompileCall, StatefulPrecompile},
    error::{RegistryError, StateError},
    fee_config::FeeConfigManager,
    native_minter::NativeMinter,
    state::StateAccessor,
};
use alloy_primitives::Address;
use std::{collections::BTreeMap, sync::Arc};

/// A registered precompile and the timestamp it activates at.
#[derive(Clone, Debug)]
pub struct RegisteredPrecompile {
    precompile: Arc<dyn StatefulPrecompile>,
    activation_timestamp: u64,
}

impl RegisteredPrecompile {
    /// The precompile itself.
    pub fn precompile(&self) -> &Arc<dyn StatefulPrecompile> {
        &self.precompile
    }

    /// Timestamp of the first block the precompile runs in.
    pub const fn activation_timestamp(&self) -> u64 {
        self.activation_timestamp
    }

    /// Returns true when the precompile is active in a block with `timestamp`.
    pub const fn is_active_at(&self, timestamp: u64) -> bool {
        timestamp >= self.activation_timestamp
    }

    /// Returns true when the precompile activates in the block with
    /// `timestamp`, given the parent block's timestamp (`None` at genesis).
    pub fn activates_in(&self, parent_timestamp: Option<u64>, timestamp: u64) -> bool {
        self.is_active_at(timestamp) &&
            parent_timestamp.is_none_or(|parent| !self.is_active_at(parent))
    }
}

/// Address-ordered collection of stateful precompiles.
#[derive(Clone, Debug, Default)]
pub struct PrecompileRegistry {
    entries: BTreeMap<Address, RegisteredPrecompile>,
}

impl PrecompileRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the registry for every precompile enabled in `config`.
    pub fn from_config(config: &StatefulPrecompilesConfig) -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        if let Some(minter) = &config.native_minter {
            registry.register(
                Arc::new(NativeMinter::new(minter.admin_addresses.clone())?),
                minter.activation_timestamp(),
            )?;
        }
        if let Some(manager) = &config.fee_config_manager {
            registry.register(
                Arc::new(FeeConfigManager::new(manager.admin_addresses.clone())?),
                manager.activation_timestamp(),
            )?;
        }
        Ok(registry)
    }

    /// Adds a precompile. Each address may be registered once.
    pub fn register(
        &mut self,
        precompile: Arc<dyn StatefulPrecompile>,
        activation_timestamp: u64,
    ) -> Result<(), RegistryError> {
        let address = precompile.address();
        if self.entries.contains_key(&address) {
            return Err(RegistryError::DuplicateAddress(address));
        }
        tracing::debug!(
            target: "stateful_precompiles",
            name = precompile.name(),
            %address,
            activation_timestamp,
            "registered precompile"
        );
        self.entries.insert(address, RegisteredPrecompile {
            precompile,
            activation_timestamp,
        });
        Ok(())
    }

    /// Looks up the precompile at `address`.
    pub fn get(&self, address: &Address) -> Option<&RegisteredPrecompile> {
        self.entries.get(address)
    }

    /// Iterates over all registered precompiles in address order.
    pub fn iter(&self) -> impl Iterator<Item = &RegisteredPrecompile> {
        self.entries.values()
    }

    /// Precompiles that run in a block with `timestamp`.
    pub fn active_at(
        &self,
        timestamp: u64,
    ) -> impl Iterator<Item = &Arc<dyn StatefulPrecompile>> {
        self.iter()
            .filter(move |entry| entry.is_active_at(timestamp))
            .map(RegisteredPrecompile::precompile)
    }

    /// Runs `configure` for every precompile that activates in this block.
    ///
    /// Returns the addresses that were configured, in address order.
    pub fn configure_activated(
        &self,
        state: &mut dyn StateAccessor,
        parent_timestamp: Option<u64>,
        timestamp: u64,
    ) -> Result<Vec<Address>, StateError> {
        let mut configured = Vec::new();
        for entry in self.iter().filter(|entry| entry.activates_in(parent_timestamp, timestamp)) {
            entry.precompile.configure(state)?;
            tracing::info!(
                target: "stateful_precompiles",
                name = entry.precompile.name(),
                address = %entry.precompile.address(),
                timestamp,
                "activated precompile"
            );
            configured.push(entry.precompile.address());
        }
        Ok(configured)
    }

    /// Runs the precompile at `call.address`, if one is registered.
    pub fn run(
        &self,
        state: &mut dyn StateAccessor,
        call: PrecompileCall<'_>,
    ) -> Option<CallResult> {
        self.get(&call.address).map(|entry| entry.precompile.run(state, call))
    }

    /// Number of registered precompiles.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        allowlist::{get_role, Role},
        config::AllowListConfig,
        fee_config::FEE_CONFIG_MANAGER_ADDRESS,
        native_minter::NATIVE_MINTER_ADDRESS,
        state::InMemoryState,
    };
    use alloy_primitives::address;

    const ADMIN: Address = address!("0x00000000000000000000000000000000000000a1");

    fn config() -> StatefulPrecompilesConfig {
        StatefulPrecompilesConfig {
            native_minter: Some(AllowListConfig::new(vec![ADMIN])),
            fee_config_manager: Some(AllowListConfig {
                block_timestamp: Some(100),
                admin_addresses: vec![ADMIN],
            }),
        }
    }

    #[test]
    fn builds_enabled_precompiles() {
        let registry = PrecompileRegistry::from_config(&config()).unwrap();
        assert_eq!(registry.len(), 2);
        assert!(registry.get(&NATIVE_MINTER_ADDRESS).is_some());
        assert!(registry.get(&FEE_CONFIG_MANAGER_ADDRESS).is_some());
        let empty = PrecompileRegistry::from_config(&StatefulPrecompilesConfig::default()).unwrap();
        assert!(empty.is_empty());
    }

    #[test]
    fn rejects_duplicate_address() {
        let mut registry = PrecompileRegistry::new();
        registry.register(Arc::new(NativeMinter::new(vec![]).unwrap()), 0).unwrap();
        let err = registry.register(Arc::new(NativeMinter::new(vec![]).unwrap()), 5).unwrap_err();
        assert_eq!(err, RegistryError::DuplicateAddress(NATIVE_MINTER_ADDRESS));
    }

    #[test]
    fn active_set_follows_timestamps() {
        let registry = PrecompileRegistry::from_config(&config()).unwrap();
        let active: Vec<_> = registry.active_at(99).map(|p| p.address()).collect();
        assert_eq!(active, vec![NATIVE_MINTER_ADDRESS]);
        let active: Vec<_> = registry.active_at(100).map(|p| p.address()).collect();
        assert_eq!(active, vec![NATIVE_MINTER_ADDRESS, FEE_CONFIG_MANAGER_ADDRESS]);
    }

    #[test]
    fn configures_each_precompile_once() {
        let registry = PrecompileRegistry::from_config(&config()).unwrap();
        let mut state = InMemoryState::new();

        let genesis = registry.configure_activated(&mut state, None, 0).unwrap();
        assert_eq!(genesis, vec![NATIVE_MINTER_ADDRESS]);
        assert_eq!(get_role(&mut state, NATIVE_MINTER_ADDRESS, ADMIN).unwrap(), Role::Admin);
        assert_eq!(get_role(&mut state, FEE_CONFIG_MANAGER_ADDRESS, ADMIN).unwrap(), Role::None);

        assert!(registry.configure_activated(&mut state, Some(0), 50).unwrap().is_empty());

        let fork = registry.configure_activated(&mut state, Some(98), 102).unwrap();
        assert_eq!(fork, vec![FEE_CONFIG_MANAGER_ADDRESS]);
        assert_eq!(get_role(&mut state, FEE_CONFIG_MANAGER_ADDRESS, ADMIN).unwrap(), Role::Admin);

        assert!(registry.configure_activated(&mut state, Some(102), 104).unwrap().is_empty());
    }

    #[test]
    fn run_ignores_unknown_address() {
        let registry = PrecompileRegistry::from_config(&config()).unwrap();
        let mut state = InMemoryState::new();
        let call = PrecompileCall {
            caller: ADMIN,
            address: address!("0x00000000000000000000000000000000000000ff"),
            input: &[],
            gas: 1,
            read_only: false,
        };
        assert!(registry.run(&mut state, call).is_none());
    }
}
