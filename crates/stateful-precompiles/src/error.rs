//! Error types returned by the stateful precompiles.

use crate::abi::Selector;
use alloy_primitives::{hex, Address};
use thiserror::Error;

/// Failures raised while executing a precompile call.
///
/// Every variant is returned to the host unchanged; nothing is retried or
/// swallowed inside this crate. The host decides whether to revert.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CallError {
    /// The supplied gas does not cover the fixed cost of the operation.
    #[error("out of gas")]
    OutOfGas,
    /// A state-mutating operation was invoked from a read-only context.
    #[error("write protection")]
    WriteProtection,
    /// The argument body does not have the exact length the operation expects.
    #[error("invalid input length for {operation}: expected {expected}, got {actual}")]
    InvalidInputLength {
        /// Operation whose arguments failed to decode.
        operation: &'static str,
        /// Required body length in bytes.
        expected: usize,
        /// Length that was supplied.
        actual: usize,
    },
    /// The caller's role does not permit the operation.
    #[error("{caller} is not permitted to {action}")]
    PermissionDenied {
        /// Address that attempted the call.
        caller: Address,
        /// Human readable description of the denied action.
        action: &'static str,
    },
    /// No function is registered for the selector and there is no fallback.
    #[error("invalid function selector {}", hex::encode_prefixed(.0))]
    UnknownSelector(Selector),
    /// Calldata is too short to carry a selector.
    #[error("missing function selector to precompile - input length ({0})")]
    MissingSelector(usize),
    /// Packed parts did not add up to the expected length.
    #[error("packed input length mismatch: expected {expected}, got {actual}")]
    EncodingLengthMismatch {
        /// Declared total length.
        expected: usize,
        /// Length of the concatenated parts.
        actual: usize,
    },
    /// A fixed storage key fell outside its valid range. Indicates a defect.
    #[error("internal consistency violation: {0}")]
    InternalConsistency(String),
    /// The host state store failed.
    #[error(transparent)]
    State(#[from] StateError),
}

impl CallError {
    /// Attaches the gas left after the failed operation.
    pub fn with_gas(self, remaining_gas: u64) -> CallFailure {
        CallFailure {
            error: self,
            remaining_gas,
        }
    }
}

/// A failed call together with the gas that remained after the fixed cost
/// was deducted.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{error}")]
pub struct CallFailure {
    /// What went wrong.
    pub error: CallError,
    /// Gas left for the caller. Zero for [`CallError::OutOfGas`].
    pub remaining_gas: u64,
}

/// Errors surfaced by a [`StateAccessor`](crate::state::StateAccessor).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StateError {
    /// Adding to a balance would exceed `U256::MAX`.
    #[error("balance overflow for {0}")]
    BalanceOverflow(Address),
    /// The backing store reported an error.
    #[error("state access failed: {0}")]
    Backend(String),
}

/// Errors raised while assembling a dispatch table.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BuildError {
    /// Two functions share the same selector.
    #[error("duplicate function selector {}", hex::encode_prefixed(.0))]
    DuplicateSelector(Selector),
}

/// Errors raised while assembling a [`PrecompileRegistry`](crate::registry::PrecompileRegistry).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// A precompile's dispatch table failed to build.
    #[error(transparent)]
    Build(#[from] BuildError),
    /// Two precompiles claim the same address.
    #[error("precompile already registered at {0}")]
    DuplicateAddress(Address),
}
