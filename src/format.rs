use anyhow::{anyhow, Result};
use ethers::types::U256;

use crate::config::NATIVE_DECIMALS;

/// Render a raw amount as a decimal string with trailing zeros trimmed,
/// e.g. `1500000` with 6 decimals -> `"1.5"`.
pub fn human_amount(raw: U256, decimals: u32) -> String {
    let formatted = match ethers::utils::format_units(raw, decimals) {
        Ok(s) => s,
        Err(_) => return raw.to_string(),
    };
    if !formatted.contains('.') {
        return formatted;
    }
    formatted
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_string()
}

/// Native coin amount (wei) in whole coins.
pub fn format_native(wei: U256) -> String {
    human_amount(wei, NATIVE_DECIMALS)
}

/// Parse an integer amount in the smallest unit. Whitespace and surrounding
/// `"`/`'` quotes are ignored.
pub fn parse_raw_amount(input: &str) -> Result<U256> {
    let cleaned = input.trim().trim_matches(|c| c == '"' || c == '\'').trim();
    if cleaned.is_empty() {
        return Err(anyhow!("Amount cannot be empty"));
    }
    U256::from_dec_str(cleaned).map_err(|e| anyhow!("Invalid amount '{}': {:?}", cleaned, e))
}

/// Shorten a long address for compact display: `0x1234...abcd`.
pub fn short_address(address: &str) -> String {
    if address.len() <= 14 || !address.is_char_boundary(6) || !address.is_char_boundary(address.len() - 4) {
        return address.to_string();
    }
    format!("{}...{}", &address[..6], &address[address.len() - 4..])
}
