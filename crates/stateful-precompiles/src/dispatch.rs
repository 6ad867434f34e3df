//! Selector routing for stateful precompiles.
//!
//! A [`DispatchTable`] maps 4-byte selectors to a contract's own operation
//! enum. Contracts match exhaustively on the resolved operation, so every
//! registered selector has exactly one handler.

use crate::{
    abi::{Selector, SELECTOR_LEN},
    error::{BuildError, CallError, CallFailure, StateError},
    state::StateAccessor,
};
use alloy_primitives::{Address, Bytes};
use std::collections::BTreeMap;

/// Inputs of a single precompile invocation.
#[derive(Clone, Copy, Debug)]
pub struct PrecompileCall<'a> {
    /// Immediate caller of the precompile.
    pub caller: Address,
    /// Address the precompile is executing at.
    pub address: Address,
    /// Full calldata, selector included.
    pub input: &'a [u8],
    /// Gas available to the call.
    pub gas: u64,
    /// Whether the call runs in a read-only (static) context.
    pub read_only: bool,
}

/// Successful precompile output.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CallOutput {
    /// Returned bytes, possibly empty.
    pub output: Bytes,
    /// Gas left for the caller.
    pub remaining_gas: u64,
}

impl CallOutput {
    /// Creates an output.
    pub const fn new(output: Bytes, remaining_gas: u64) -> Self {
        Self {
            output,
            remaining_gas,
        }
    }

    /// Creates an empty output.
    pub const fn empty(remaining_gas: u64) -> Self {
        Self::new(Bytes::new(), remaining_gas)
    }
}

/// Result of a precompile invocation.
pub type CallResult = Result<CallOutput, CallFailure>;

/// A precompile whose behaviour depends on, and may modify, host state.
pub trait StatefulPrecompile: std::fmt::Debug + Send + Sync {
    /// Short identifier used in logs and precompile ids.
    fn name(&self) -> &'static str;

    /// Address the precompile is installed at.
    fn address(&self) -> Address;

    /// Routes `call` to the matching operation and executes it.
    fn run(&self, state: &mut dyn StateAccessor, call: PrecompileCall<'_>) -> CallResult;

    /// One-time state initialisation performed when the precompile activates.
    fn configure(&self, state: &mut dyn StateAccessor) -> Result<(), StateError>;
}

/// Immutable selector → operation mapping with an optional fallback.
#[derive(Clone, Debug)]
pub struct DispatchTable<Op> {
    functions: BTreeMap<Selector, Op>,
    fallback: Option<Op>,
}

impl<Op: Copy> DispatchTable<Op> {
    /// Builds a table, rejecting duplicate selectors.
    pub fn build(
        fallback: Option<Op>,
        functions: impl IntoIterator<Item = (Selector, Op)>,
    ) -> Result<Self, BuildError> {
        let mut map = BTreeMap::new();
        for (selector, op) in functions {
            if map.insert(selector, op).is_some() {
                return Err(BuildError::DuplicateSelector(selector));
            }
        }
        Ok(Self {
            functions: map,
            fallback,
        })
    }

    /// Resolves calldata to an operation and its argument body.
    ///
    /// Empty calldata goes to the fallback when there is one. Resolution never
    /// consumes gas, so failures hand back the full `gas` budget.
    pub fn resolve<'a>(&self, input: &'a [u8], gas: u64) -> Result<(Op, &'a [u8]), CallFailure> {
        if input.is_empty() {
            if let Some(fallback) = self.fallback {
                return Ok((fallback, input));
            }
        }
        if input.len() < SELECTOR_LEN {
            return Err(CallError::MissingSelector(input.len()).with_gas(gas));
        }
        let (head, args) = input.split_at(SELECTOR_LEN);
        let mut selector = [0u8; SELECTOR_LEN];
        selector.copy_from_slice(head);
        self.functions
            .get(&selector)
            .map(|op| (*op, args))
            .ok_or_else(|| CallError::UnknownSelector(selector).with_gas(gas))
    }

    /// Number of registered functions, fallback excluded.
    pub fn len(&self) -> usize {
        self.functions.len()
    }

    /// Returns true when no function is registered.
    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    /// Returns true when a fallback operation is set.
    pub const fn has_fallback(&self) -> bool {
        self.fallback.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abi::function_selector;

    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    enum Op {
        Ping,
        Pong,
        Fallback,
    }

    fn table(fallback: Option<Op>) -> DispatchTable<Op> {
        DispatchTable::build(
            fallback,
            [
                (function_selector("ping()"), Op::Ping),
                (function_selector("pong(uint256)"), Op::Pong),
            ],
        )
        .unwrap()
    }

    #[test]
    fn resolves_selector_and_strips_it() {
        let mut input = function_selector("pong(uint256)").to_vec();
        input.extend_from_slice(&[0u8; 32]);
        let (op, args) = table(None).resolve(&input, 100).unwrap();
        assert_eq!(op, Op::Pong);
        assert_eq!(args.len(), 32);
    }

    #[test]
    fn duplicate_selector_is_rejected() {
        let selector = function_selector("ping()");
        let err =
            DispatchTable::build(None, [(selector, Op::Ping), (selector, Op::Pong)]).unwrap_err();
        assert_eq!(err, BuildError::DuplicateSelector(selector));
    }

    #[test]
    fn unknown_selector_keeps_gas() {
        let failure = table(None).resolve(&[0xde, 0xad, 0xbe, 0xef], 42).unwrap_err();
        assert_eq!(failure.error, CallError::UnknownSelector([0xde, 0xad, 0xbe, 0xef]));
        assert_eq!(failure.remaining_gas, 42);
    }

    #[test]
    fn empty_input_uses_fallback() {
        let (op, args) = table(Some(Op::Fallback)).resolve(&[], 1).unwrap();
        assert_eq!(op, Op::Fallback);
        assert!(args.is_empty());

        let failure = table(None).resolve(&[], 1).unwrap_err();
        assert_eq!(failure.error, CallError::MissingSelector(0));
    }

    #[test]
    fn short_input_is_missing_selector() {
        let failure = table(Some(Op::Fallback)).resolve(&[1, 2], 5).unwrap_err();
        assert_eq!(failure.error, CallError::MissingSelector(2));
    }
}
