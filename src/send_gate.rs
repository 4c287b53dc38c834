//! Decides whether the send control is enabled.

use crate::state::AppState;
use ethers::types::U256;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendGate {
    Enabled { total: U256, available: U256 },
    /// Every drop amount is zero (or the list is empty)
    NothingToSend,
    /// The balance must strictly exceed the total; `shortfall` is zero when they are equal
    InsufficientFunds { total: U256, available: U256, shortfall: U256 },
    NoSigningAccount,
}

impl SendGate {
    pub fn is_enabled(&self) -> bool {
        matches!(self, SendGate::Enabled { .. })
    }
}

/// Sum of every requested drop, saturating at `U256::MAX`.
pub fn total_drop(state: &AppState) -> U256 {
    state
        .drop_accounts
        .iter()
        .fold(U256::zero(), |acc, account| acc.saturating_add(account.drop))
}

/// Evaluate the gate. A balance that was not observed for the current wallet
/// and cluster counts as nothing available.
pub fn evaluate(state: &AppState, has_signing_account: bool, balance_is_current: bool) -> SendGate {
    let total = total_drop(state);
    let available = if balance_is_current {
        state.balance.available(state.mode, &state.token_address)
    } else {
        U256::zero()
    };

    if has_signing_account && !total.is_zero() && available > total {
        SendGate::Enabled { total, available }
    } else if total.is_zero() {
        SendGate::NothingToSend
    } else if available <= total {
        SendGate::InsufficientFunds {
            total,
            available,
            shortfall: total - available,
        }
    } else {
        SendGate::NoSigningAccount
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Cluster;
    use crate::state::{reduce, AppAction};
    use crate::types::{DropAccount, DropMode, TokenHolding, WalletBalance};

    fn state(native: u64, drops: &[u64]) -> AppState {
        let state = AppState::new(Cluster::Sepolia, "0xfunder", "0xtoken");
        let accounts = drops
            .iter()
            .enumerate()
            .map(|(i, d)| DropAccount::new(format!("wallet{}", i), *d))
            .collect();
        let state = reduce(state, AppAction::SetDropAccounts(accounts));
        reduce(
            state,
            AppAction::SetBalance(WalletBalance {
                id: "0xfunder".to_string(),
                native_amount: U256::from(native),
                token_holdings: vec![TokenHolding {
                    token_address: "0xtoken".to_string(),
                    amount: U256::from(40u64),
                }],
            }),
        )
    }

    // ==================== evaluate tests ====================

    #[test]
    fn test_enabled_when_funded() {
        let gate = evaluate(&state(200, &[100, 50]), true, true);
        assert_eq!(
            gate,
            SendGate::Enabled {
                total: U256::from(150u64),
                available: U256::from(200u64)
            }
        );
        assert!(gate.is_enabled());
    }

    #[test]
    fn test_shortfall_after_balance_drops() {
        let funded = state(200, &[100, 50]);
        assert!(evaluate(&funded, true, true).is_enabled());
        let mut poorer = funded.clone();
        poorer.balance.native_amount = U256::from(100u64);
        match evaluate(&poorer, true, true) {
            SendGate::InsufficientFunds { shortfall, .. } => assert_eq!(shortfall, U256::from(50u64)),
            other => panic!("expected insufficient funds, got {:?}", other),
        }
    }

    #[test]
    fn test_nothing_to_send() {
        assert_eq!(evaluate(&state(200, &[]), true, true), SendGate::NothingToSend);
        assert_eq!(evaluate(&state(200, &[0, 0]), false, true), SendGate::NothingToSend);
    }

    #[test]
    fn test_equal_balance_is_insufficient() {
        let gate = evaluate(&state(150, &[100, 50]), true, true);
        assert_eq!(
            gate,
            SendGate::InsufficientFunds {
                total: U256::from(150u64),
                available: U256::from(150u64),
                shortfall: U256::zero()
            }
        );
    }

    #[test]
    fn test_no_signing_account() {
        assert_eq!(evaluate(&state(200, &[100]), false, true), SendGate::NoSigningAccount);
    }

    #[test]
    fn test_stale_balance_counts_as_zero() {
        match evaluate(&state(200, &[100, 50]), true, false) {
            SendGate::InsufficientFunds { available, shortfall, .. } => {
                assert!(available.is_zero());
                assert_eq!(shortfall, U256::from(150u64));
            }
            other => panic!("expected insufficient funds, got {:?}", other),
        }
    }

    #[test]
    fn test_token_mode_uses_token_holding() {
        let mut s = state(1_000, &[30]);
        s.mode = DropMode::Token;
        assert!(evaluate(&s, true, true).is_enabled());
        let s = reduce(s, AppAction::SetDropAccounts(vec![DropAccount::new("w", 45u64)]));
        match evaluate(&s, true, true) {
            SendGate::InsufficientFunds { shortfall, .. } => assert_eq!(shortfall, U256::from(5u64)),
            other => panic!("expected insufficient funds, got {:?}", other),
        }
    }

    #[test]
    fn test_total_drop_saturates() {
        let mut s = state(0, &[]);
        s.drop_accounts = vec![DropAccount::new("a", U256::MAX), DropAccount::new("b", 1u64)];
        assert_eq!(total_drop(&s), U256::MAX);
    }
}
