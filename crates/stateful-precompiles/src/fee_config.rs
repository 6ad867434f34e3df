//! Fee Config Manager Precompile
//!
//! Lets enabled addresses replace the chain's dynamic fee parameters at
//! runtime.
//!
//! ## Interface
//!
//! ```solidity
//! interface IFeeConfigManager {
//!     function setFeeConfig(
//!         uint256 gasLimit,
//!         uint256 targetBlockRate,
//!         uint256 minBaseFee,
//!         uint256 targetGas,
//!         uint256 baseFeeChangeDenominator,
//!         uint256 minBlockGasCost,
//!         uint256 maxBlockGasCost,
//!         uint256 blockGasCostStep
//!     ) external;
//!     function getFeeConfig() external view returns (uint256[8] memory);
//!     function setAdmin(address account) external;
//!     function setEnabled(address account) external;
//!     function setNone(address account) external;
//!     function readAllowList(address account) external view returns (uint256);
//! }
//! ```
//!
//! ## Storage Layout
//!
//! Field slots carry the field key in the most significant byte, so they
//! never coincide with a role slot of a non-zero address.
//!
//! | Slot | Field |
//! |------|-------|
//! | `0x00..` | gas limit |
//! | `0x01..` | target block rate |
//! | `0x02..` | min base fee |
//! | `0x03..` | target gas |
//! | `0x04..` | base fee change denominator |
//! | `0x05..` | min block gas cost |
//! | `0x06..` | max block gas cost |
//! | `0x07..` | block gas cost step |
//! | `U256(address)` | allow-list role |

use crate::{
    abi::{
        ensure_words, function_selector, pack_ordered, packed_element, u256_word, word_u256,
        SELECTOR_LEN, WORD_LEN,
    },
    allowlist::{self, get_role, AllowListOp},
    dispatch::{CallOutput, CallResult, DispatchTable, PrecompileCall, StatefulPrecompile},
    error::{BuildError, CallError, StateError},
    gas::{deduct_gas, GET_FEE_CONFIG_GAS_COST, SET_FEE_CONFIG_GAS_COST},
    state::StateAccessor,
};
use alloy_primitives::{address, Address, Bytes, B256, U256};

/// Fee Config Manager Precompile Address: `0x0200..03`
pub const FEE_CONFIG_MANAGER_ADDRESS: Address =
    address!("0x0200000000000000000000000000000000000003");

/// Signature of the fee config setter.
pub const SET_FEE_CONFIG_SIGNATURE: &str =
    "setFeeConfig(uint256,uint256,uint256,uint256,uint256,uint256,uint256,uint256)";

/// Signature of the fee config getter.
pub const GET_FEE_CONFIG_SIGNATURE: &str = "getFeeConfig()";

/// Number of fields in a [`FeeConfig`].
pub const FEE_CONFIG_FIELD_COUNT: usize = 8;

/// Length of the packed fee config body.
pub const FEE_CONFIG_INPUT_LEN: usize = FEE_CONFIG_FIELD_COUNT * WORD_LEN;

/// Dynamic fee parameters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FeeConfig {
    /// Block gas limit.
    pub gas_limit: U256,
    /// Target seconds between blocks.
    pub target_block_rate: U256,
    /// Floor for the base fee.
    pub min_base_fee: U256,
    /// Gas targeted per rollup window.
    pub target_gas: U256,
    /// Bounds the base fee change between blocks.
    pub base_fee_change_denominator: U256,
    /// Floor for the block gas cost.
    pub min_block_gas_cost: U256,
    /// Ceiling for the block gas cost.
    pub max_block_gas_cost: U256,
    /// Block gas cost change per second off target.
    pub block_gas_cost_step: U256,
}

/// A single [`FeeConfig`] field. The discriminant is its storage key and its
/// position in calldata.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum FeeConfigField {
    /// `gasLimit`
    GasLimit = 0,
    /// `targetBlockRate`
    TargetBlockRate = 1,
    /// `minBaseFee`
    MinBaseFee = 2,
    /// `targetGas`
    TargetGas = 3,
    /// `baseFeeChangeDenominator`
    BaseFeeChangeDenominator = 4,
    /// `minBlockGasCost`
    MinBlockGasCost = 5,
    /// `maxBlockGasCost`
    MaxBlockGasCost = 6,
    /// `blockGasCostStep`
    BlockGasCostStep = 7,
}

impl FeeConfigField {
    /// All fields in storage and calldata order.
    pub const ALL: [Self; FEE_CONFIG_FIELD_COUNT] = [
        Self::GasLimit,
        Self::TargetBlockRate,
        Self::MinBaseFee,
        Self::TargetGas,
        Self::BaseFeeChangeDenominator,
        Self::MinBlockGasCost,
        Self::MaxBlockGasCost,
        Self::BlockGasCostStep,
    ];

    /// Solidity name of the field.
    pub const fn name(self) -> &'static str {
        match self {
            Self::GasLimit => "gasLimit",
            Self::TargetBlockRate => "targetBlockRate",
            Self::MinBaseFee => "minBaseFee",
            Self::TargetGas => "targetGas",
            Self::BaseFeeChangeDenominator => "baseFeeChangeDenominator",
            Self::MinBlockGasCost => "minBlockGasCost",
            Self::MaxBlockGasCost => "maxBlockGasCost",
            Self::BlockGasCostStep => "blockGasCostStep",
        }
    }

    /// Position of the field in calldata.
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Storage slot of the field: the key in the high byte of the word.
    pub fn slot(self) -> U256 {
        let mut word = B256::ZERO;
        word[0] = self as u8;
        word.into()
    }

    /// Reads the field from `config`.
    pub const fn get(self, config: &FeeConfig) -> U256 {
        match self {
            Self::GasLimit => config.gas_limit,
            Self::TargetBlockRate => config.target_block_rate,
            Self::MinBaseFee => config.min_base_fee,
            Self::TargetGas => config.target_gas,
            Self::BaseFeeChangeDenominator => config.base_fee_change_denominator,
            Self::MinBlockGasCost => config.min_block_gas_cost,
            Self::MaxBlockGasCost => config.max_block_gas_cost,
            Self::BlockGasCostStep => config.block_gas_cost_step,
        }
    }

    /// Mutable access to the field in `config`.
    pub fn get_mut(self, config: &mut FeeConfig) -> &mut U256 {
        match self {
            Self::GasLimit => &mut config.gas_limit,
            Self::TargetBlockRate => &mut config.target_block_rate,
            Self::MinBaseFee => &mut config.min_base_fee,
            Self::TargetGas => &mut config.target_gas,
            Self::BaseFeeChangeDenominator => &mut config.base_fee_change_denominator,
            Self::MinBlockGasCost => &mut config.min_block_gas_cost,
            Self::MaxBlockGasCost => &mut config.max_block_gas_cost,
            Self::BlockGasCostStep => &mut config.block_gas_cost_step,
        }
    }
}

impl TryFrom<u8> for FeeConfigField {
    type Error = CallError;

    fn try_from(key: u8) -> Result<Self, Self::Error> {
        Self::ALL
            .get(usize::from(key))
            .copied()
            .ok_or_else(|| CallError::InternalConsistency(format!("unknown fee config key {key}")))
    }
}

impl FeeConfig {
    /// Iterates `(field, value)` pairs in storage order.
    pub fn fields(&self) -> impl Iterator<Item = (FeeConfigField, U256)> + '_ {
        FeeConfigField::ALL.into_iter().map(move |field| (field, field.get(self)))
    }
}

/// Packs `setFeeConfig` calldata.
pub fn pack_set_fee_config_input(config: &FeeConfig) -> Result<Vec<u8>, CallError> {
    let selector = function_selector(SET_FEE_CONFIG_SIGNATURE);
    let words: Vec<[u8; WORD_LEN]> = config.fields().map(|(_, value)| u256_word(value)).collect();
    let mut parts: Vec<&[u8]> = Vec::with_capacity(FEE_CONFIG_FIELD_COUNT + 1);
    parts.push(&selector);
    parts.extend(words.iter().map(|word| word.as_slice()));
    pack_ordered(&parts, SELECTOR_LEN + FEE_CONFIG_INPUT_LEN)
}

/// Unpacks a `setFeeConfig` argument body (selector already stripped).
pub fn unpack_fee_config_input(input: &[u8]) -> Result<FeeConfig, CallError> {
    ensure_words("fee config", input, FEE_CONFIG_FIELD_COUNT)?;
    let mut config = FeeConfig::default();
    for field in FeeConfigField::ALL {
        *field.get_mut(&mut config) = word_u256(packed_element(input, field.index()));
    }
    Ok(config)
}

/// Encodes `config` as the 8-word `getFeeConfig` return value.
pub fn pack_fee_config_output(config: &FeeConfig) -> Bytes {
    let mut out = Vec::with_capacity(FEE_CONFIG_INPUT_LEN);
    for (_, value) in config.fields() {
        out.extend_from_slice(&u256_word(value));
    }
    out.into()
}

/// Reads the stored fee config.
///
/// Returns the zero config when the precompile account does not exist yet.
pub fn get_fee_config(state: &mut dyn StateAccessor) -> Result<FeeConfig, StateError> {
    let mut config = FeeConfig::default();
    if !state.exists(FEE_CONFIG_MANAGER_ADDRESS)? {
        return Ok(config);
    }
    for field in FeeConfigField::ALL {
        *field.get_mut(&mut config) = state.get_slot(FEE_CONFIG_MANAGER_ADDRESS, field.slot())?;
    }
    Ok(config)
}

/// Writes every field of `config` to its slot.
pub fn set_fee_config(state: &mut dyn StateAccessor, config: &FeeConfig) -> Result<(), StateError> {
    if !state.exists(FEE_CONFIG_MANAGER_ADDRESS)? {
        state.create_account(FEE_CONFIG_MANAGER_ADDRESS)?;
    }
    for (field, value) in config.fields() {
        state.set_slot(FEE_CONFIG_MANAGER_ADDRESS, field.slot(), value)?;
    }
    Ok(())
}

/// Operations routed by the fee config manager's dispatch table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FeeConfigManagerOp {
    /// Shared role management.
    AllowList(AllowListOp),
    /// `setFeeConfig`
    SetFeeConfig,
    /// `getFeeConfig`
    GetFeeConfig,
}

/// Permissioned precompile holding the chain's fee parameters.
#[derive(Clone, Debug)]
pub struct FeeConfigManager {
    admins: Vec<Address>,
    table: DispatchTable<FeeConfigManagerOp>,
}

impl FeeConfigManager {
    /// Creates the precompile; `admins` are seeded by [`StatefulPrecompile::configure`].
    pub fn new(admins: Vec<Address>) -> Result<Self, BuildError> {
        let functions = AllowListOp::functions()
            .into_iter()
            .map(|(selector, op)| (selector, FeeConfigManagerOp::AllowList(op)))
            .chain([
                (function_selector(SET_FEE_CONFIG_SIGNATURE), FeeConfigManagerOp::SetFeeConfig),
                (function_selector(GET_FEE_CONFIG_SIGNATURE), FeeConfigManagerOp::GetFeeConfig),
            ]);
        Ok(Self {
            admins,
            table: DispatchTable::build(None, functions)?,
        })
    }

    /// Addresses seeded as admins on activation.
    pub fn admins(&self) -> &[Address] {
        &self.admins
    }

    fn set_fee_config(
        state: &mut dyn StateAccessor,
        call: &PrecompileCall<'_>,
        args: &[u8],
    ) -> CallResult {
        let remaining = deduct_gas(call.gas, SET_FEE_CONFIG_GAS_COST)?;
        if call.read_only {
            return Err(CallError::WriteProtection.with_gas(remaining));
        }
        let config = unpack_fee_config_input(args).map_err(|err| err.with_gas(remaining))?;

        let fail = |err: StateError| CallError::from(err).with_gas(remaining);
        let caller_role = get_role(state, FEE_CONFIG_MANAGER_ADDRESS, call.caller).map_err(fail)?;
        if !caller_role.is_enabled() {
            tracing::warn!(
                target: "fee_config_manager",
                caller = ?call.caller,
                "fee config change denied"
            );
            return Err(CallError::PermissionDenied {
                caller: call.caller,
                action: "change fee config",
            }
            .with_gas(remaining));
        }

        set_fee_config(state, &config).map_err(fail)?;
        tracing::info!(
            target: "fee_config_manager",
            caller = ?call.caller,
            ?config,
            "fee config updated"
        );
        Ok(CallOutput::empty(remaining))
    }

    fn get_fee_config(
        state: &mut dyn StateAccessor,
        call: &PrecompileCall<'_>,
        args: &[u8],
    ) -> CallResult {
        let remaining = deduct_gas(call.gas, GET_FEE_CONFIG_GAS_COST)?;
        ensure_words("get fee config", args, 0).map_err(|err| err.with_gas(remaining))?;
        let config =
            get_fee_config(state).map_err(|err| CallError::from(err).with_gas(remaining))?;
        Ok(CallOutput::new(pack_fee_config_output(&config), remaining))
    }
}

impl StatefulPrecompile for FeeConfigManager {
    fn name(&self) -> &'static str {
        "fee_config_manager"
    }

    fn address(&self) -> Address {
        FEE_CONFIG_MANAGER_ADDRESS
    }

    fn run(&self, state: &mut dyn StateAccessor, call: PrecompileCall<'_>) -> CallResult {
        let (op, args) = self.table.resolve(call.input, call.gas)?;
        match op {
            FeeConfigManagerOp::AllowList(op) => op.execute(state, &call, args),
            FeeConfigManagerOp::SetFeeConfig => Self::set_fee_config(state, &call, args),
            FeeConfigManagerOp::GetFeeConfig => Self::get_fee_config(state, &call, args),
        }
    }

    fn configure(&self, state: &mut dyn StateAccessor) -> Result<(), StateError> {
        allowlist::configure(state, FEE_CONFIG_MANAGER_ADDRESS, &self.admins)
    }
}
