//! Host state primitives consumed by the precompiles.

use crate::error::StateError;
use alloy_primitives::{Address, U256};
use std::collections::HashMap;

/// The slice of host state a stateful precompile may touch.
///
/// Implementations mutate in place. They must not roll back on their own;
/// discarding the writes of a failed call is the host's job.
pub trait StateAccessor {
    /// Returns whether `address` has an account record.
    fn exists(&mut self, address: Address) -> Result<bool, StateError>;

    /// Creates an empty account record for `address`.
    fn create_account(&mut self, address: Address) -> Result<(), StateError>;

    /// Credits `amount` to the balance of `address`.
    fn add_balance(&mut self, address: Address, amount: U256) -> Result<(), StateError>;

    /// Reads storage slot `key` of `address`. Unwritten slots read as zero.
    fn get_slot(&mut self, address: Address, key: U256) -> Result<U256, StateError>;

    /// Writes storage slot `key` of `address`.
    fn set_slot(&mut self, address: Address, key: U256, value: U256) -> Result<(), StateError>;
}

/// A single account in [`InMemoryState`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InMemoryAccount {
    /// Native balance.
    pub balance: U256,
    /// Non-zero storage slots.
    pub storage: HashMap<U256, U256>,
}

/// Map-backed [`StateAccessor`] for tooling and tests.
///
/// Writing a slot of a missing account creates the account, mirroring how an
/// EVM journal materialises accounts on first `SSTORE`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InMemoryState {
    accounts: HashMap<Address, InMemoryAccount>,
}

impl InMemoryState {
    /// Creates an empty state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the account for `address`, if any.
    pub fn account(&self, address: Address) -> Option<&InMemoryAccount> {
        self.accounts.get(&address)
    }

    /// Returns the balance of `address`, zero when the account is missing.
    pub fn balance(&self, address: Address) -> U256 {
        self.accounts.get(&address).map(|account| account.balance).unwrap_or_default()
    }

    /// Returns the number of accounts.
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    /// Returns true when no account exists.
    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

impl StateAccessor for InMemoryState {
    fn exists(&mut self, address: Address) -> Result<bool, StateError> {
        Ok(self.accounts.contains_key(&address))
    }

    fn create_account(&mut self, address: Address) -> Result<(), StateError> {
        self.accounts.entry(address).or_default();
        Ok(())
    }

    fn add_balance(&mut self, address: Address, amount: U256) -> Result<(), StateError> {
        let account = self.accounts.entry(address).or_default();
        account.balance = account
            .balance
            .checked_add(amount)
            .ok_or(StateError::BalanceOverflow(address))?;
        Ok(())
    }

    fn get_slot(&mut self, address: Address, key: U256) -> Result<U256, StateError> {
        Ok(self
            .accounts
            .get(&address)
            .and_then(|account| account.storage.get(&key).copied())
            .unwrap_or_default())
    }

    fn set_slot(&mut self, address: Address, key: U256, value: U256) -> Result<(), StateError> {
        let storage = &mut self.accounts.entry(address).or_default().storage;
        if value.is_zero() {
            storage.remove(&key);
        } else {
            storage.insert(key, value);
        }
        Ok(())
    }
}
