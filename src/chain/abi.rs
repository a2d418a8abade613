//! Minimal Solidity ABI codec for the two reward contract reads.
//!
//! Only what the audit needs: a single `string` or `bytes32` argument in,
//! a single `bytes32` or `bool` word out. Function selectors come from
//! configuration so no hashing happens here.

use crate::error::ChainError;

/// ABI word size in bytes
pub const WORD: usize = 32;

pub type Selector = [u8; 4];

/// Parse a `0x`-prefixed 4-byte selector.
pub fn parse_selector(s: &str) -> Result<Selector, String> {
    let raw = s.strip_prefix("0x").unwrap_or(s);
    let bytes = hex::decode(raw).map_err(|e| format!("invalid selector '{}': {}", s, e))?;
    bytes
        .try_into()
        .map_err(|_| format!("selector '{}' must be exactly 4 bytes", s))
}

/// Parse a 20-byte contract address, returning its lowercase `0x` form.
pub fn parse_address(s: &str) -> Result<String, String> {
    let raw = s
        .strip_prefix("0x")
        .ok_or_else(|| format!("address '{}' must start with 0x", s))?;
    let bytes = hex::decode(raw).map_err(|e| format!("invalid address '{}': {}", s, e))?;
    if bytes.len() != 20 {
        return Err(format!(
            "address '{}' must be 20 bytes, got {}",
            s,
            bytes.len()
        ));
    }
    Ok(format!("0x{}", hex::encode(bytes)))
}

fn uint_word(value: usize) -> [u8; WORD] {
    let mut word = [0u8; WORD];
    word[WORD - 8..].copy_from_slice(&(value as u64).to_be_bytes());
    word
}

/// Calldata for `f(string)`: head offset, length, then right-padded bytes.
pub fn encode_string_call(selector: &Selector, value: &str) -> Vec<u8> {
    let bytes = value.as_bytes();
    let padded_len = bytes.len().div_ceil(WORD) * WORD;

    let mut data = Vec::with_capacity(4 + 2 * WORD + padded_len);
    data.extend_from_slice(selector);
    data.extend_from_slice(&uint_word(WORD));
    data.extend_from_slice(&uint_word(bytes.len()));
    data.extend_from_slice(bytes);
    data.resize(4 + 2 * WORD + padded_len, 0);
    data
}

/// Calldata for `f(bytes32)`.
pub fn encode_bytes32_call(selector: &Selector, word: &[u8; WORD]) -> Vec<u8> {
    let mut data = Vec::with_capacity(4 + WORD);
    data.extend_from_slice(selector);
    data.extend_from_slice(word);
    data
}

fn first_word(data: &[u8]) -> Result<&[u8], ChainError> {
    if data.len() < WORD {
        return Err(ChainError::ChainUnavailable(format!(
            "return data too short: {} bytes (is the contract deployed at this address?)",
            data.len()
        )));
    }
    Ok(&data[..WORD])
}

pub fn decode_bytes32(data: &[u8]) -> Result<[u8; WORD], ChainError> {
    let mut out = [0u8; WORD];
    out.copy_from_slice(first_word(data)?);
    Ok(out)
}

/// A bool word must be exactly 0 or 1.
pub fn decode_bool(data: &[u8]) -> Result<bool, ChainError> {
    let word = first_word(data)?;
    if word[..WORD - 1].iter().any(|b| *b != 0) || word[WORD - 1] > 1 {
        return Err(ChainError::ChainUnavailable(format!(
            "malformed bool return word 0x{}",
            hex::encode(word)
        )));
    }
    Ok(word[WORD - 1] == 1)
}

pub fn to_hex_data(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

pub fn from_hex_data(s: &str) -> Result<Vec<u8>, ChainError> {
    let raw = s.strip_prefix("0x").unwrap_or(s);
    hex::decode(raw)
        .map_err(|e| ChainError::ChainUnavailable(format!("invalid hex in RPC result: {}", e)))
}
