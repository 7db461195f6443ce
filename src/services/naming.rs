//! Address-derived display names
//!
//! A wallet address is 20 bytes of entropy, which maps cleanly onto a BIP-39
//! mnemonic. The first and last words of that mnemonic, title-cased, become
//! the token's human-readable name, so every holder gets a stable name
//! without storing anything extra.

use bip39::Mnemonic;

/// Error types for name derivation
#[derive(Debug)]
pub enum NamingError {
    InvalidAddress(String),
}

impl std::fmt::Display for NamingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NamingError::InvalidAddress(msg) => write!(f, "Invalid address: {}", msg),
        }
    }
}

impl std::error::Error for NamingError {}

/// Full mnemonic for a wallet address (the address bytes as entropy)
pub fn address_mnemonic(address: &str) -> Result<String, NamingError> {
    let stripped = address.strip_prefix("0x").unwrap_or(address);
    let entropy =
        hex::decode(stripped).map_err(|e| NamingError::InvalidAddress(e.to_string()))?;

    let mnemonic =
        Mnemonic::from_entropy(&entropy).map_err(|e| NamingError::InvalidAddress(e.to_string()))?;

    Ok(mnemonic.to_string())
}

/// "First Last" display name for a wallet address
pub fn display_name(address: &str) -> Result<String, NamingError> {
    let mnemonic = address_mnemonic(address)?;
    let words: Vec<&str> = mnemonic.split_whitespace().collect();

    // 20 bytes of entropy always yields 15 words; guard anyway
    let first = words.first().ok_or_else(|| {
        NamingError::InvalidAddress("address produced an empty mnemonic".to_string())
    })?;
    let last = words.last().ok_or_else(|| {
        NamingError::InvalidAddress("address produced an empty mnemonic".to_string())
    })?;

    Ok(format!("{} {}", title_case(first), title_case(last)))
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
