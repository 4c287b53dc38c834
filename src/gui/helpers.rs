//! Display helpers for the drop table and balance panel.

use crate::config::{find_token, TokenInfo, NATIVE_DECIMALS};
use crate::format;
use crate::state::AppState;
use crate::types::{BalanceSnapshot, DropMode, HoldingStatus, PopulatedDropAccount};
use ethers::types::U256;

/// Decimals and symbol of the asset a drop in `state` would send. Unknown
/// tokens are shown in raw units.
pub fn asset_display(state: &AppState, custom_tokens: &[TokenInfo]) -> (u32, String) {
    match state.mode {
        DropMode::Native => (NATIVE_DECIMALS, state.cluster.native_token().to_string()),
        DropMode::Token => match find_token(state.cluster, &state.token_address, custom_tokens) {
            Some(token) => (token.decimals, token.symbol),
            None => (0, "units".to_string()),
        },
    }
}

pub fn amount_label(amount: U256, decimals: u32, symbol: &str) -> String {
    format!("{} {}", format::human_amount(amount, decimals), symbol)
}

pub fn snapshot_label(snapshot: Option<&BalanceSnapshot>, decimals: u32) -> String {
    match snapshot {
        None => "…".to_string(),
        Some(BalanceSnapshot::Missing) => "0".to_string(),
        Some(BalanceSnapshot::Found(record)) => format::human_amount(record.amount, decimals),
    }
}

pub fn holding_label(account: &PopulatedDropAccount) -> String {
    match account.holding() {
        HoldingStatus::Loading => "Loading".to_string(),
        HoldingStatus::Missing => "missing".to_string(),
        HoldingStatus::Address(address) => format::short_address(address),
    }
}
