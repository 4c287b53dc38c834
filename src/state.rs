//! Application state and its reducer.
//!
//! `reduce` is the only place `AppState` changes. It is a pure function: the
//! same state and action always produce the same result and nothing here does
//! I/O, logging included. Async producers (balance fetches, transfers) feed
//! their results back in as actions through [`crate::store::Store`].

use crate::config::Cluster;
use crate::types::{DropAccount, DropAccountBalance, DropMode, PopulatedDropAccount, WalletBalance};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppState {
    pub cluster: Cluster,
    pub mode: DropMode,
    pub token_address: String,
    pub balance: WalletBalance,
    pub drop_accounts: Vec<DropAccount>,
    pub drop_populated_accounts: Vec<PopulatedDropAccount>,
}

impl AppState {
    pub fn new(cluster: Cluster, wallet_id: impl Into<String>, token_address: impl Into<String>) -> Self {
        Self {
            cluster,
            mode: DropMode::Native,
            token_address: token_address.into(),
            balance: WalletBalance::empty(wallet_id),
            drop_accounts: Vec::new(),
            drop_populated_accounts: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppAction {
    SetCluster(Cluster),
    SetTokenAddress(String),
    SetMode(DropMode),
    SetDropAccounts(Vec<DropAccount>),
    SetDropAccountBefore(DropAccountBalance),
    SetDropAccountAfter(DropAccountBalance),
    SetBalance(WalletBalance),
    SetWallet(String),
}

impl AppAction {
    pub fn kind(&self) -> &'static str {
        match self {
            AppAction::SetCluster(_) => "SET_CLUSTER",
            AppAction::SetTokenAddress(_) => "SET_TOKEN_ADDRESS",
            AppAction::SetMode(_) => "SET_MODE",
            AppAction::SetDropAccounts(_) => "SET_DROP_ACCOUNT",
            AppAction::SetDropAccountBefore(_) => "SET_DROP_ACCOUNT_BEFORE",
            AppAction::SetDropAccountAfter(_) => "SET_DROP_ACCOUNT_AFTER",
            AppAction::SetBalance(_) => "SET_BALANCE",
            AppAction::SetWallet(_) => "SET_WALLET",
        }
    }
}

pub fn reduce(state: AppState, action: AppAction) -> AppState {
    match action {
        AppAction::SetDropAccounts(accounts) => AppState {
            drop_populated_accounts: accounts.iter().cloned().map(PopulatedDropAccount::from).collect(),
            drop_accounts: accounts,
            ..state
        },
        AppAction::SetCluster(cluster) => AppState {
            cluster,
            mode: DropMode::Native,
            drop_populated_accounts: strip_snapshots(&state.drop_populated_accounts),
            ..state
        },
        AppAction::SetTokenAddress(token_address) => AppState {
            token_address,
            drop_populated_accounts: strip_snapshots(&state.drop_populated_accounts),
            ..state
        },
        AppAction::SetDropAccountBefore(record) => {
            let AppState {
                drop_populated_accounts,
                ..
            } = state;
            AppState {
                drop_populated_accounts: drop_populated_accounts
                    .into_iter()
                    .map(|account| {
                        if account.wallet == record.wallet {
                            PopulatedDropAccount {
                                before: Some(record.snapshot.clone()),
                                ..account
                            }
                        } else {
                            account
                        }
                    })
                    .collect(),
                ..state
            }
        }
        AppAction::SetDropAccountAfter(record) => {
            let AppState {
                drop_populated_accounts,
                ..
            } = state;
            AppState {
                drop_populated_accounts: drop_populated_accounts
                    .into_iter()
                    .map(|account| {
                        if account.wallet == record.wallet {
                            PopulatedDropAccount {
                                after: Some(record.snapshot.clone()),
                                ..account
                            }
                        } else {
                            account
                        }
                    })
                    .collect(),
                ..state
            }
        }
        AppAction::SetMode(mode) => AppState { mode, ..state },
        AppAction::SetBalance(balance) => AppState { balance, ..state },
        AppAction::SetWallet(wallet) => AppState {
            balance: WalletBalance::empty(wallet),
            ..state
        },
    }
}

fn strip_snapshots(accounts: &[PopulatedDropAccount]) -> Vec<PopulatedDropAccount> {
    accounts.iter().map(PopulatedDropAccount::stripped).collect()
}
