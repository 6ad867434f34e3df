//! Address-keyed role store shared by every permissioned precompile.
//!
//! ## Storage Layout
//!
//! Roles live in the storage of the precompile they guard:
//!
//! | Slot | Value |
//! |------|-------|
//! | `U256(subject)` | `0` = none, `1` = enabled, `2` = admin |
//!
//! The slot key is the subject address left-padded to 32 bytes. Entries are
//! never deleted; revoking a role writes [`Role::None`].

use crate::{
    abi::{
        address_word, ensure_words, function_selector, pack_ordered, packed_element, u256_word,
        word_address, Selector, SELECTOR_LEN, WORD_LEN,
    },
    dispatch::{CallOutput, CallResult, PrecompileCall},
    error::{CallError, StateError},
    gas::{deduct_gas, MODIFY_ALLOW_LIST_GAS_COST, READ_ALLOW_LIST_GAS_COST},
    state::StateAccessor,
};
use alloy_primitives::{Address, Bytes, U256};

/// Signature of the admin role setter.
pub const SET_ADMIN_SIGNATURE: &str = "setAdmin(address)";
/// Signature of the enabled role setter.
pub const SET_ENABLED_SIGNATURE: &str = "setEnabled(address)";
/// Signature of the role reset.
pub const SET_NONE_SIGNATURE: &str = "setNone(address)";
/// Signature of the role reader.
pub const READ_ALLOW_LIST_SIGNATURE: &str = "readAllowList(address)";

/// Length of the argument body of every allow-list function.
pub const ALLOW_LIST_INPUT_LEN: usize = WORD_LEN;

/// Permission level of an address on a single precompile.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Role {
    /// No permissions.
    #[default]
    None = 0,
    /// May call the precompile's privileged operations.
    Enabled = 1,
    /// May call privileged operations and change roles.
    Admin = 2,
}

impl Role {
    /// Returns true when this role is at least `other`.
    pub fn at_least(self, other: Self) -> bool {
        self >= other
    }

    /// Returns true for [`Role::Enabled`] and [`Role::Admin`].
    pub fn is_enabled(self) -> bool {
        self.at_least(Self::Enabled)
    }

    /// Returns true for [`Role::Admin`].
    pub fn is_admin(self) -> bool {
        self.at_least(Self::Admin)
    }

    /// Storage representation of the role.
    pub fn to_slot(self) -> U256 {
        U256::from(self as u8)
    }

    /// Decodes a stored slot value; `None` for anything but `0`, `1` and `2`.
    pub fn from_slot(value: U256) -> Option<Self> {
        match u8::try_from(value).ok()? {
            0 => Some(Self::None),
            1 => Some(Self::Enabled),
            2 => Some(Self::Admin),
            _ => None,
        }
    }

    /// Signature of the function that assigns this role.
    pub const fn setter_signature(self) -> &'static str {
        match self {
            Self::None => SET_NONE_SIGNATURE,
            Self::Enabled => SET_ENABLED_SIGNATURE,
            Self::Admin => SET_ADMIN_SIGNATURE,
        }
    }
}

/// Storage key of `subject`'s role entry.
pub fn role_key(subject: Address) -> U256 {
    address_word(subject).into()
}

/// Reads the role of `subject` on `contract`.
///
/// Values that do not decode to a role are treated as [`Role::None`].
pub fn get_role(
    state: &mut dyn StateAccessor,
    contract: Address,
    subject: Address,
) -> Result<Role, StateError> {
    let raw = state.get_slot(contract, role_key(subject))?;
    Ok(Role::from_slot(raw).unwrap_or_else(|| {
        tracing::warn!(
            target: "allowlist",
            %contract,
            ?subject,
            value = %raw,
            "unrecognised role value"
        );
        Role::None
    }))
}

/// Overwrites the role of `subject` on `contract`.
///
/// Performs no authorization; callers check the caller's role first.
pub fn set_role(
    state: &mut dyn StateAccessor,
    contract: Address,
    subject: Address,
    role: Role,
) -> Result<(), StateError> {
    state.set_slot(contract, role_key(subject), role.to_slot())
}

/// Seeds `admins` with [`Role::Admin`] when `contract` activates.
///
/// The contract account is created first so the role entries are not pruned
/// with an otherwise empty account.
pub fn configure(
    state: &mut dyn StateAccessor,
    contract: Address,
    admins: &[Address],
) -> Result<(), StateError> {
    if !state.exists(contract)? {
        state.create_account(contract)?;
    }
    for admin in admins {
        set_role(state, contract, *admin, Role::Admin)?;
        tracing::info!(target: "allowlist", %contract, ?admin, "seeded admin");
    }
    Ok(())
}

/// Allow-list operations every permissioned precompile exposes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AllowListOp {
    /// `setAdmin`, `setEnabled` or `setNone`.
    SetRole(Role),
    /// `readAllowList`.
    Read,
}

impl AllowListOp {
    /// Selector/operation pairs for the four allow-list functions.
    pub fn functions() -> [(Selector, Self); 4] {
        [
            (function_selector(SET_ADMIN_SIGNATURE), Self::SetRole(Role::Admin)),
            (function_selector(SET_ENABLED_SIGNATURE), Self::SetRole(Role::Enabled)),
            (function_selector(SET_NONE_SIGNATURE), Self::SetRole(Role::None)),
            (function_selector(READ_ALLOW_LIST_SIGNATURE), Self::Read),
        ]
    }

    /// Executes the operation against the allow list stored at `call.address`.
    pub fn execute(
        self,
        state: &mut dyn StateAccessor,
        call: &PrecompileCall<'_>,
        args: &[u8],
    ) -> CallResult {
        match self {
            Self::SetRole(role) => modify_role(state, call, args, role),
            Self::Read => read_role(state, call, args),
        }
    }
}

fn modify_role(
    state: &mut dyn StateAccessor,
    call: &PrecompileCall<'_>,
    args: &[u8],
    role: Role,
) -> CallResult {
    let remaining = deduct_gas(call.gas, MODIFY_ALLOW_LIST_GAS_COST)?;
    if call.read_only {
        return Err(CallError::WriteProtection.with_gas(remaining));
    }
    ensure_words("modify allow list", args, 1).map_err(|err| err.with_gas(remaining))?;
    let subject = word_address(packed_element(args, 0));

    let fail = |err: StateError| CallError::from(err).with_gas(remaining);
    let caller_role = get_role(state, call.address, call.caller).map_err(fail)?;
    if !caller_role.is_admin() {
        tracing::warn!(
            target: "allowlist",
            caller = ?call.caller,
            ?subject,
            ?role,
            "role change denied"
        );
        return Err(CallError::PermissionDenied {
            caller: call.caller,
            action: "modify allow list",
        }
        .with_gas(remaining));
    }

    set_role(state, call.address, subject, role).map_err(fail)?;
    tracing::info!(
        target: "allowlist",
        contract = %call.address,
        caller = ?call.caller,
        ?subject,
        ?role,
        "role updated"
    );
    Ok(CallOutput::empty(remaining))
}

fn read_role(state: &mut dyn StateAccessor, call: &PrecompileCall<'_>, args: &[u8]) -> CallResult {
    let remaining = deduct_gas(call.gas, READ_ALLOW_LIST_GAS_COST)?;
    ensure_words("read allow list", args, 1).map_err(|err| err.with_gas(remaining))?;
    let subject = word_address(packed_element(args, 0));
    let role = get_role(state, call.address, subject)
        .map_err(|err| CallError::from(err).with_gas(remaining))?;
    Ok(CallOutput::new(Bytes::copy_from_slice(&u256_word(role.to_slot())), remaining))
}

/// Packs calldata assigning `role` to `subject`.
pub fn pack_modify_allow_list(subject: Address, role: Role) -> Result<Vec<u8>, CallError> {
    pack_address_call(role.setter_signature(), subject)
}

/// Packs calldata reading the role of `subject`.
pub fn pack_read_allow_list(subject: Address) -> Result<Vec<u8>, CallError> {
    pack_address_call(READ_ALLOW_LIST_SIGNATURE, subject)
}

fn pack_address_call(signature: &str, subject: Address) -> Result<Vec<u8>, CallError> {
    let selector = function_selector(signature);
    let word = address_word(subject);
    pack_ordered(&[&selector, word.as_slice()], SELECTOR_LEN + ALLOW_LIST_INPUT_LEN)
}
