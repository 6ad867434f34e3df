//! Stateful precompile wiring for `revm`.
//!
//! [`EvEvmFactory`] installs the precompiles of a
//! [`PrecompileRegistry`](ev_stateful_precompiles::PrecompileRegistry) into
//! every EVM it builds, and [`activate_precompiles`] seeds their state in the
//! block they activate in.

pub mod activation;
pub mod factory;

pub use activation::activate_precompiles;
pub use factory::{with_stateful_precompiles, EvEvmFactory};
