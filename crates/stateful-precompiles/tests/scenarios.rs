use alloy_primitives::{address, Address, U256};
use alloy_sol_types::{sol, SolCall};
use ev_stateful_precompiles::{
    abi::function_selector,
    allowlist::{pack_modify_allow_list, pack_read_allow_list},
    fee_config::{pack_set_fee_config_input, GET_FEE_CONFIG_SIGNATURE},
    gas::{
        GET_FEE_CONFIG_GAS_COST, MINT_GAS_COST, MODIFY_ALLOW_LIST_GAS_COST,
        READ_ALLOW_LIST_GAS_COST, SET_FEE_CONFIG_GAS_COST,
    },
    native_minter::pack_mint_input,
    *,
};

sol! {
    interface INativeMinter {
        function mintNativeCoin(address to, uint256 amount) external;
        function setAdmin(address account) external;
        function setEnabled(address account) external;
        function setNone(address account) external;
        function readAllowList(address account) external view returns (uint256);
    }

    interface IFeeConfigManager {
        function setFeeConfig(
            uint256 gasLimit,
            uint256 targetBlockRate,
            uint256 minBaseFee,
            uint256 targetGas,
            uint256 baseFeeChangeDenominator,
            uint256 minBlockGasCost,
            uint256 maxBlockGasCost,
            uint256 blockGasCostStep
        ) external;
    }
}

const ADMIN: Address = address!("0x00000000000000000000000000000000000000a1");
const BOB: Address = address!("0x00000000000000000000000000000000000000b0");
const CAROL: Address = address!("0x00000000000000000000000000000000000000c0");
const DAVE: Address = address!("0x00000000000000000000000000000000000000d0");
const ERIN: Address = address!("0x00000000000000000000000000000000000000e0");
const GAS: u64 = 1_000_000;

fn registry() -> PrecompileRegistry {
    let config = StatefulPrecompilesConfig {
        native_minter: Some(AllowListConfig::new(vec![ADMIN])),
        fee_config_manager: Some(AllowListConfig::new(vec![ADMIN])),
    };
    PrecompileRegistry::from_config(&config).unwrap()
}

fn genesis() -> (PrecompileRegistry, InMemoryState) {
    let registry = registry();
    let mut state = InMemoryState::new();
    registry.configure_activated(&mut state, None, 0).unwrap();
    (registry, state)
}

fn call(address: Address, caller: Address, input: &[u8], gas: u64) -> PrecompileCall<'_> {
    PrecompileCall {
        caller,
        address,
        input,
        gas,
        read_only: false,
    }
}

fn run(
    registry: &PrecompileRegistry,
    state: &mut InMemoryState,
    call: PrecompileCall<'_>,
) -> CallResult {
    registry.run(state, call).expect("precompile registered")
}

fn sample_fee_config() -> FeeConfig {
    FeeConfig {
        gas_limit: U256::from(21_000_000u64),
        target_block_rate: U256::from(2u64),
        min_base_fee: U256::from(25_000_000_000u64),
        target_gas: U256::from(15_000_000u64),
        base_fee_change_denominator: U256::from(36u64),
        min_block_gas_cost: U256::ZERO,
        max_block_gas_cost: U256::from(10_000_000u64),
        block_gas_cost_step: U256::from(100_000u64),
    }
}

fn read_fee_config(registry: &PrecompileRegistry, state: &mut InMemoryState) -> FeeConfig {
    let input = function_selector(GET_FEE_CONFIG_SIGNATURE);
    let out = run(registry, state, call(FEE_CONFIG_MANAGER_ADDRESS, BOB, &input, GAS)).unwrap();
    assert_eq!(out.remaining_gas, GAS - GET_FEE_CONFIG_GAS_COST);
    assert_eq!(out.output.len(), 8 * 32);

    let mut config = FeeConfig::default();
    for (field, word) in FeeConfigField::ALL.into_iter().zip(out.output.chunks(32)) {
        *field.get_mut(&mut config) = U256::from_be_slice(word);
    }
    config
}

fn read_role(registry: &PrecompileRegistry, state: &mut InMemoryState, who: Address) -> U256 {
    let input = pack_read_allow_list(who).unwrap();
    let out = run(registry, state, call(NATIVE_MINTER_ADDRESS, ERIN, &input, GAS)).unwrap();
    assert_eq!(out.remaining_gas, GAS - READ_ALLOW_LIST_GAS_COST);
    U256::from_be_slice(&out.output)
}

#[test]
fn admin_sets_fee_config_and_outsider_is_denied() {
    let (registry, mut state) = genesis();
    let config = sample_fee_config();
    let input = pack_set_fee_config_input(&config).unwrap();

    let out = run(&registry, &mut state, call(FEE_CONFIG_MANAGER_ADDRESS, ADMIN, &input, GAS))
        .unwrap();
    assert!(out.output.is_empty());
    assert_eq!(out.remaining_gas, GAS - SET_FEE_CONFIG_GAS_COST);
    assert_eq!(read_fee_config(&registry, &mut state), config);

    let mut other = config;
    other.gas_limit = U256::from(1u64);
    let input = pack_set_fee_config_input(&other).unwrap();
    let failure = run(&registry, &mut state, call(FEE_CONFIG_MANAGER_ADDRESS, BOB, &input, GAS))
        .unwrap_err();

    assert!(matches!(failure.error, CallError::PermissionDenied { caller, .. } if caller == BOB));
    assert_eq!(failure.remaining_gas, GAS - SET_FEE_CONFIG_GAS_COST);
    assert_eq!(read_fee_config(&registry, &mut state), config);
}

#[test]
fn enabled_account_mints_and_unlisted_account_cannot() {
    let (registry, mut state) = genesis();

    let input = pack_modify_allow_list(CAROL, Role::Enabled).unwrap();
    let out = run(&registry, &mut state, call(NATIVE_MINTER_ADDRESS, ADMIN, &input, GAS)).unwrap();
    assert_eq!(out.remaining_gas, GAS - MODIFY_ALLOW_LIST_GAS_COST);
    assert_eq!(read_role(&registry, &mut state, CAROL), U256::from(1u64));

    let input = pack_mint_input(DAVE, U256::from(500u64)).unwrap();
    run(&registry, &mut state, call(NATIVE_MINTER_ADDRESS, CAROL, &input, GAS)).unwrap();
    assert_eq!(state.balance(DAVE), U256::from(500u64));

    let input = pack_mint_input(ERIN, U256::from(500u64)).unwrap();
    let failure =
        run(&registry, &mut state, call(NATIVE_MINTER_ADDRESS, DAVE, &input, GAS)).unwrap_err();
    assert!(matches!(failure.error, CallError::PermissionDenied { .. }));
    assert_eq!(failure.remaining_gas, GAS - MINT_GAS_COST);
    assert_eq!(state.balance(ERIN), U256::ZERO);
    assert!(state.account(ERIN).is_none());
}

#[test]
fn role_transitions() {
    let (registry, mut state) = genesis();
    assert_eq!(read_role(&registry, &mut state, ADMIN), U256::from(2u64));
    assert_eq!(read_role(&registry, &mut state, BOB), U256::ZERO);

    let promote = pack_modify_allow_list(BOB, Role::Admin).unwrap();
    run(&registry, &mut state, call(NATIVE_MINTER_ADDRESS, ADMIN, &promote, GAS)).unwrap();
    assert_eq!(read_role(&registry, &mut state, BOB), U256::from(2u64));

    // the new admin can manage the list, including the original admin
    let demote = pack_modify_allow_list(ADMIN, Role::None).unwrap();
    run(&registry, &mut state, call(NATIVE_MINTER_ADDRESS, BOB, &demote, GAS)).unwrap();
    assert_eq!(read_role(&registry, &mut state, ADMIN), U256::ZERO);

    let mint = pack_mint_input(CAROL, U256::from(7u64)).unwrap();
    let failure =
        run(&registry, &mut state, call(NATIVE_MINTER_ADDRESS, ADMIN, &mint, GAS)).unwrap_err();
    assert!(matches!(failure.error, CallError::PermissionDenied { caller, .. } if caller == ADMIN));

    let restore = pack_modify_allow_list(ADMIN, Role::Admin).unwrap();
    let failure =
        run(&registry, &mut state, call(NATIVE_MINTER_ADDRESS, ADMIN, &restore, GAS)).unwrap_err();
    assert!(matches!(failure.error, CallError::PermissionDenied { .. }));
    assert_eq!(read_role(&registry, &mut state, ADMIN), U256::ZERO);
}

#[test]
fn allow_lists_are_independent_per_precompile() {
    let (registry, mut state) = genesis();
    let enable = pack_modify_allow_list(CAROL, Role::Enabled).unwrap();
    run(&registry, &mut state, call(NATIVE_MINTER_ADDRESS, ADMIN, &enable, GAS)).unwrap();

    let input = pack_set_fee_config_input(&sample_fee_config()).unwrap();
    let failure = run(&registry, &mut state, call(FEE_CONFIG_MANAGER_ADDRESS, CAROL, &input, GAS))
        .unwrap_err();
    assert!(matches!(failure.error, CallError::PermissionDenied { .. }));
    assert_eq!(get_role(&mut state, FEE_CONFIG_MANAGER_ADDRESS, CAROL).unwrap(), Role::None);
}

#[test]
fn read_only_calls_cannot_write() {
    let (registry, mut state) = genesis();
    let before = state.clone();

    let inputs = [
        (NATIVE_MINTER_ADDRESS, pack_mint_input(DAVE, U256::from(1u64)).unwrap(), MINT_GAS_COST),
        (
            NATIVE_MINTER_ADDRESS,
            pack_modify_allow_list(BOB, Role::Admin).unwrap(),
            MODIFY_ALLOW_LIST_GAS_COST,
        ),
        (
            FEE_CONFIG_MANAGER_ADDRESS,
            pack_set_fee_config_input(&sample_fee_config()).unwrap(),
            SET_FEE_CONFIG_GAS_COST,
        ),
    ];
    for (address, input, cost) in &inputs {
        let static_call = PrecompileCall {
            read_only: true,
            ..call(*address, ADMIN, input, GAS)
        };
        let failure = run(&registry, &mut state, static_call).unwrap_err();
        assert_eq!(failure.error, CallError::WriteProtection);
        assert_eq!(failure.remaining_gas, GAS - cost);
    }
    assert_eq!(state, before);

    // reads stay available in read-only context
    let input = pack_read_allow_list(ADMIN).unwrap();
    let static_call = PrecompileCall {
        read_only: true,
        ..call(NATIVE_MINTER_ADDRESS, BOB, &input, GAS)
    };
    assert!(run(&registry, &mut state, static_call).is_ok());
}

#[test]
fn insufficient_gas_leaves_state_untouched() {
    let (registry, mut state) = genesis();
    let before = state.clone();

    let input = pack_mint_input(DAVE, U256::from(1u64)).unwrap();
    let failure = run(
        &registry,
        &mut state,
        call(NATIVE_MINTER_ADDRESS, ADMIN, &input, MINT_GAS_COST - 1),
    )
    .unwrap_err();
    assert_eq!(failure.error, CallError::OutOfGas);
    assert_eq!(failure.remaining_gas, 0);

    let input = pack_set_fee_config_input(&sample_fee_config()).unwrap();
    let failure = run(
        &registry,
        &mut state,
        call(FEE_CONFIG_MANAGER_ADDRESS, ADMIN, &input, SET_FEE_CONFIG_GAS_COST - 1),
    )
    .unwrap_err();
    assert_eq!(failure.error, CallError::OutOfGas);
    assert_eq!(state, before);

    // exact gas is enough
    let input = pack_mint_input(DAVE, U256::from(1u64)).unwrap();
    let out =
        run(&registry, &mut state, call(NATIVE_MINTER_ADDRESS, ADMIN, &input, MINT_GAS_COST))
            .unwrap();
    assert_eq!(out.remaining_gas, 0);
}

#[test]
fn extreme_fee_configs_are_stored_verbatim() {
    let (registry, mut state) = genesis();
    assert_eq!(read_fee_config(&registry, &mut state), FeeConfig::default());

    let max = FeeConfig {
        gas_limit: U256::MAX,
        target_block_rate: U256::MAX,
        min_base_fee: U256::MAX,
        target_gas: U256::MAX,
        base_fee_change_denominator: U256::MAX,
        min_block_gas_cost: U256::MAX,
        max_block_gas_cost: U256::MAX,
        block_gas_cost_step: U256::MAX,
    };
    for config in [max, FeeConfig::default()] {
        let input = pack_set_fee_config_input(&config).unwrap();
        run(&registry, &mut state, call(FEE_CONFIG_MANAGER_ADDRESS, ADMIN, &input, GAS)).unwrap();
        assert_eq!(read_fee_config(&registry, &mut state), config);
    }
}

#[test]
fn calldata_matches_solidity_encoding() {
    let amount = U256::from(123_456u64);
    assert_eq!(
        pack_mint_input(DAVE, amount).unwrap(),
        INativeMinter::mintNativeCoinCall { to: DAVE, amount }.abi_encode()
    );
    assert_eq!(
        pack_modify_allow_list(BOB, Role::Admin).unwrap(),
        INativeMinter::setAdminCall { account: BOB }.abi_encode()
    );
    assert_eq!(
        pack_modify_allow_list(BOB, Role::Enabled).unwrap(),
        INativeMinter::setEnabledCall { account: BOB }.abi_encode()
    );
    assert_eq!(
        pack_modify_allow_list(BOB, Role::None).unwrap(),
        INativeMinter::setNoneCall { account: BOB }.abi_encode()
    );
    assert_eq!(
        pack_read_allow_list(BOB).unwrap(),
        INativeMinter::readAllowListCall { account: BOB }.abi_encode()
    );

    let config = sample_fee_config();
    let expected = IFeeConfigManager::setFeeConfigCall {
        gasLimit: config.gas_limit,
        targetBlockRate: config.target_block_rate,
        minBaseFee: config.min_base_fee,
        targetGas: config.target_gas,
        baseFeeChangeDenominator: config.base_fee_change_denominator,
        minBlockGasCost: config.min_block_gas_cost,
        maxBlockGasCost: config.max_block_gas_cost,
        blockGasCostStep: config.block_gas_cost_step,
    }
    .abi_encode();
    assert_eq!(pack_set_fee_config_input(&config).unwrap(), expected);
}

#[test]
fn malformed_calldata_is_rejected() {
    let (registry, mut state) = genesis();

    let failure =
        run(&registry, &mut state, call(NATIVE_MINTER_ADDRESS, ADMIN, &[0x01, 0x02], GAS))
            .unwrap_err();
    assert_eq!(failure.error, CallError::MissingSelector(2));
    assert_eq!(failure.remaining_gas, GAS);

    let failure =
        run(&registry, &mut state, call(NATIVE_MINTER_ADDRESS, ADMIN, &[], GAS)).unwrap_err();
    assert_eq!(failure.error, CallError::MissingSelector(0));

    let failure = run(
        &registry,
        &mut state,
        call(NATIVE_MINTER_ADDRESS, ADMIN, &[0xde, 0xad, 0xbe, 0xef], GAS),
    )
    .unwrap_err();
    assert_eq!(failure.error, CallError::UnknownSelector([0xde, 0xad, 0xbe, 0xef]));
    assert_eq!(failure.remaining_gas, GAS);

    // the fee config manager does not expose mint
    let input = pack_mint_input(DAVE, U256::from(1u64)).unwrap();
    let failure = run(&registry, &mut state, call(FEE_CONFIG_MANAGER_ADDRESS, ADMIN, &input, GAS))
        .unwrap_err();
    assert!(matches!(failure.error, CallError::UnknownSelector(_)));

    let mut input = pack_modify_allow_list(BOB, Role::Enabled).unwrap();
    input.push(0);
    let failure =
        run(&registry, &mut state, call(NATIVE_MINTER_ADDRESS, ADMIN, &input, GAS)).unwrap_err();
    assert!(matches!(
        failure.error,
        CallError::InvalidInputLength {
            expected: 32,
            actual: 33,
            ..
        }
    ));
    assert_eq!(failure.remaining_gas, GAS - MODIFY_ALLOW_LIST_GAS_COST);
}

#[test]
fn low_address_roles_do_not_touch_fee_config() {
    let (registry, mut state) = genesis();
    let config = sample_fee_config();
    let input = pack_set_fee_config_input(&config).unwrap();
    run(&registry, &mut state, call(FEE_CONFIG_MANAGER_ADDRESS, ADMIN, &input, GAS)).unwrap();

    let low = Address::with_last_byte(2);
    let input = pack_modify_allow_list(low, Role::Enabled).unwrap();
    run(&registry, &mut state, call(FEE_CONFIG_MANAGER_ADDRESS, ADMIN, &input, GAS)).unwrap();

    assert_eq!(read_fee_config(&registry, &mut state), config);
    assert_eq!(get_role(&mut state, FEE_CONFIG_MANAGER_ADDRESS, low).unwrap(), Role::Enabled);
}
