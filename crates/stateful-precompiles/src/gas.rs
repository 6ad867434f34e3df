//! Fixed gas costs charged by the stateful precompiles.
//!
//! Each operation is billed once, up front, before any state is read or
//! written. The costs are derived from the cold `SSTORE`/`SLOAD` prices.

use crate::{
    error::{CallError, CallFailure},
    fee_config::FEE_CONFIG_FIELD_COUNT,
};

/// Cost of writing a single storage slot.
pub const WRITE_GAS_COST_PER_SLOT: u64 = 20_000;

/// Cost of reading a single storage slot.
pub const READ_GAS_COST_PER_SLOT: u64 = 5_000;

/// Cost of `setAdmin`, `setEnabled` and `setNone`.
pub const MODIFY_ALLOW_LIST_GAS_COST: u64 = WRITE_GAS_COST_PER_SLOT;

/// Cost of `readAllowList`.
pub const READ_ALLOW_LIST_GAS_COST: u64 = READ_GAS_COST_PER_SLOT;

/// Cost of `mintNativeCoin`.
pub const MINT_GAS_COST: u64 = 30_000;

/// Cost of `setFeeConfig`, one write per field.
pub const SET_FEE_CONFIG_GAS_COST: u64 = WRITE_GAS_COST_PER_SLOT * FEE_CONFIG_FIELD_COUNT as u64;

/// Cost of `getFeeConfig`, one read per field.
pub const GET_FEE_CONFIG_GAS_COST: u64 = READ_GAS_COST_PER_SLOT * FEE_CONFIG_FIELD_COUNT as u64;

/// Deducts `cost` from `supplied`, returning the remaining gas.
///
/// On failure the caller is left with zero gas.
pub fn deduct_gas(supplied: u64, cost: u64) -> Result<u64, CallFailure> {
    supplied.checked_sub(cost).ok_or_else(|| CallError::OutOfGas.with_gas(0))
}
