//! Fixed-width calling convention shared by every stateful precompile.
//!
//! Calldata is a 4-byte function selector followed by `N` 32-byte words, the
//! same layout Solidity produces for functions whose arguments are all static
//! types. Integers are unsigned big-endian; addresses sit in the low 20 bytes
//! of their word.

use crate::error::CallError;
use alloy_primitives::{keccak256, Address, B256, U256};

/// Length of a function selector in bytes.
pub const SELECTOR_LEN: usize = 4;

/// Length of a packed argument word in bytes.
pub const WORD_LEN: usize = 32;

/// A 4-byte function selector.
pub type Selector = [u8; SELECTOR_LEN];

/// Computes the selector for a canonical signature such as
/// `mintNativeCoin(address,uint256)`.
pub fn function_selector(signature: &str) -> Selector {
    let hash = keccak256(signature.as_bytes());
    let mut selector = [0u8; SELECTOR_LEN];
    selector.copy_from_slice(&hash[..SELECTOR_LEN]);
    selector
}

/// Concatenates `parts` and checks the result is exactly `total_len` bytes.
pub fn pack_ordered(parts: &[&[u8]], total_len: usize) -> Result<Vec<u8>, CallError> {
    let mut packed = Vec::with_capacity(total_len);
    for part in parts {
        packed.extend_from_slice(part);
    }
    if packed.len() != total_len {
        return Err(CallError::EncodingLengthMismatch {
            expected: total_len,
            actual: packed.len(),
        });
    }
    Ok(packed)
}

/// Returns the word at `index`.
///
/// The caller must have validated that `input` holds at least `index + 1`
/// words.
pub fn packed_element(input: &[u8], index: usize) -> &[u8] {
    &input[index * WORD_LEN..(index + 1) * WORD_LEN]
}

/// Checks that an argument body carries exactly `words` words.
pub const fn ensure_words(
    operation: &'static str,
    input: &[u8],
    words: usize,
) -> Result<(), CallError> {
    if input.len() == words * WORD_LEN {
        Ok(())
    } else {
        Err(CallError::InvalidInputLength {
            operation,
            expected: words * WORD_LEN,
            actual: input.len(),
        })
    }
}

/// Left-pads an address into a word.
pub fn address_word(address: Address) -> B256 {
    address.into_word()
}

/// Reads an address from the low 20 bytes of a word. The high bytes are ignored.
pub fn word_address(word: &[u8]) -> Address {
    Address::from_word(B256::from_slice(word))
}

/// Encodes an unsigned integer as a big-endian word.
pub fn u256_word(value: U256) -> [u8; WORD_LEN] {
    value.to_be_bytes::<WORD_LEN>()
}

/// Decodes a big-endian word into an unsigned integer.
pub fn word_u256(word: &[u8]) -> U256 {
    U256::from_be_slice(word)
}
