//! Native minter precompile
//!
//! Enabled addresses may mint the native coin to any account. Admins manage
//! who is enabled through the shared allow-list functions.
//!
//! ```solidity
//! interface INativeMinter {
//!     function mintNativeCoin(address to, uint256 amount) external;
//!     function setAdmin(address account) external;
//!     function setEnabled(address account) external;
//!     function setNone(address account) external;
//!     function readAllowList(address account) external view returns (uint256);
//! }
//! ```

use crate::{
    abi::{
        address_word, ensure_words, function_selector, pack_ordered, packed_element, u256_word,
        word_address, word_u256, SELECTOR_LEN, WORD_LEN,
    },
    allowlist::{self, get_role, AllowListOp},
    dispatch::{CallOutput, CallResult, DispatchTable, PrecompileCall, StatefulPrecompile},
    error::{BuildError, CallError, StateError},
    gas::{deduct_gas, MINT_GAS_COST},
    state::StateAccessor,
};
use alloy_primitives::{address, Address, U256};

/// Native Minter Precompile Address: `0x0200..01`
pub const NATIVE_MINTER_ADDRESS: Address = address!("0x0200000000000000000000000000000000000001");

/// Signature of the mint function.
pub const MINT_SIGNATURE: &str = "mintNativeCoin(address,uint256)";

/// Length of the mint argument body: recipient word plus amount word.
pub const MINT_INPUT_LEN: usize = 2 * WORD_LEN;

/// Packs `mintNativeCoin` calldata.
pub fn pack_mint_input(to: Address, amount: U256) -> Result<Vec<u8>, CallError> {
    let selector = function_selector(MINT_SIGNATURE);
    let to = address_word(to);
    let amount = u256_word(amount);
    pack_ordered(&[&selector, to.as_slice(), &amount], SELECTOR_LEN + MINT_INPUT_LEN)
}

/// Unpacks a `mintNativeCoin` argument body (selector already stripped).
pub fn unpack_mint_input(input: &[u8]) -> Result<(Address, U256), CallError> {
    ensure_words("mint", input, 2)?;
    let to = word_address(packed_element(input, 0));
    let amount = word_u256(packed_element(input, 1));
    Ok((to, amount))
}

/// Operations routed by the native minter's dispatch table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NativeMinterOp {
    /// Shared role management.
    AllowList(AllowListOp),
    /// `mintNativeCoin`
    Mint,
}

/// Permissioned precompile that creates native coin.
#[derive(Clone, Debug)]
pub struct NativeMinter {
    admins: Vec<Address>,
    table: DispatchTable<NativeMinterOp>,
}

impl NativeMinter {
    /// Creates the precompile; `admins` are seeded by [`StatefulPrecompile::configure`].
    pub fn new(admins: Vec<Address>) -> Result<Self, BuildError> {
        let functions = AllowListOp::functions()
            .into_iter()
            .map(|(selector, op)| (selector, NativeMinterOp::AllowList(op)))
            .chain([(function_selector(MINT_SIGNATURE), NativeMinterOp::Mint)]);
        Ok(Self {
            admins,
            table: DispatchTable::build(None, functions)?,
        })
    }

    /// Addresses seeded as admins on activation.
    pub fn admins(&self) -> &[Address] {
        &self.admins
    }

    fn mint(state: &mut dyn StateAccessor, call: &PrecompileCall<'_>, args: &[u8]) -> CallResult {
        let remaining = deduct_gas(call.gas, MINT_GAS_COST)?;
        if call.read_only {
            return Err(CallError::WriteProtection.with_gas(remaining));
        }
        let (to, amount) = unpack_mint_input(args).map_err(|err| err.with_gas(remaining))?;

        let fail = |err: StateError| CallError::from(err).with_gas(remaining);
        let caller_role = get_role(state, NATIVE_MINTER_ADDRESS, call.caller).map_err(fail)?;
        if !caller_role.is_enabled() {
            tracing::warn!(target: "native_minter", caller = ?call.caller, "mint denied");
            return Err(CallError::PermissionDenied {
                caller: call.caller,
                action: "mint",
            }
            .with_gas(remaining));
        }

        if !state.exists(to).map_err(fail)? {
            state.create_account(to).map_err(fail)?;
        }
        state.add_balance(to, amount).map_err(fail)?;

        tracing::info!(
            target: "native_minter",
            caller = ?call.caller,
            ?to,
            %amount,
            "minted native coin"
        );
        Ok(CallOutput::empty(remaining))
    }
}

impl StatefulPrecompile for NativeMinter {
    fn name(&self) -> &'static str {
        "native_minter"
    }

    fn address(&self) -> Address {
        NATIVE_MINTER_ADDRESS
    }

    fn run(&self, state: &mut dyn StateAccessor, call: PrecompileCall<'_>) -> CallResult {
        let (op, args) = self.table.resolve(call.input, call.gas)?;
        match op {
            NativeMinterOp::AllowList(op) => op.execute(state, &call, args),
            NativeMinterOp::Mint => Self::mint(state, &call, args),
        }
    }

    fn configure(&self, state: &mut dyn StateAccessor) -> Result<(), StateError> {
        allowlist::configure(state, NATIVE_MINTER_ADDRESS, &self.admins)
    }
}
