//! # Allow-list Gated Stateful Precompiles
//!
//! Native operations exposed to contracts at fixed addresses, invoked through
//! the ordinary Solidity calling convention and guarded by a per-precompile
//! role list kept in EVM storage.
//!
//! ## Available Precompiles
//!
//! | Address | Name | Description |
//! |---------|------|-------------|
//! | `0x0200..01` | [`native_minter`] | Mint the native coin to any account |
//! | `0x0200..03` | [`fee_config`] | Read and replace the dynamic fee parameters |
//!
//! ## Architecture
//!
//! Every precompile follows the same pattern:
//!
//! 1. **Routing**: a [`DispatchTable`] maps the 4-byte selector to an operation
//! 2. **Gas**: the operation's fixed cost is deducted before anything else
//! 3. **Write protection**: state-changing operations fail in read-only calls
//! 4. **Decoding**: argument bodies must have their exact packed length
//! 5. **Authorization**: the caller's [`Role`] is read from the allow list
//! 6. **Mutation**: state is written only after every check passed
//!
//! The host owns a [`PrecompileRegistry`] built from
//! [`StatefulPrecompilesConfig`], seeds admins through
//! [`PrecompileRegistry::configure_activated`] and installs the active
//! precompiles with [`evm::EvmPrecompile`].
//!
//! ## Atomicity
//!
//! There is no rollback inside this crate. When a call fails after writing,
//! the host discards its state changes, which the EVM journal does for
//! precompile calls.

pub mod abi;
pub mod allowlist;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod evm;
pub mod fee_config;
pub mod gas;
pub mod native_minter;
pub mod registry;
pub mod state;

pub use allowlist::{get_role, set_role, AllowListOp, Role};
pub use config::{AllowListConfig, ConfigError, StatefulPrecompilesConfig};
pub use dispatch::{
    CallOutput, CallResult, DispatchTable, PrecompileCall, StatefulPrecompile,
};
pub use error::{BuildError, CallError, CallFailure, RegistryError, StateError};
pub use evm::{EvmPrecompile, EvmStateAccessor};
pub use fee_config::{
    get_fee_config, FeeConfig, FeeConfigField, FeeConfigManager, FEE_CONFIG_MANAGER_ADDRESS,
};
pub use native_minter::{NativeMinter, NATIVE_MINTER_ADDRESS};
pub use registry::PrecompileRegistry;
pub use state::{InMemoryState, StateAccessor};
