//! Common types shared across modules.

use ethers::types::U256;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Whether a drop sends the native coin or the selected ERC-20 token.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DropMode {
    #[default]
    Native,
    Token,
}

impl fmt::Display for DropMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DropMode::Native => f.write_str("Native"),
            DropMode::Token => f.write_str("Token"),
        }
    }
}

/// One recipient row imported from CSV. `drop` is in the smallest unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropAccount {
    pub wallet: String,
    pub drop: U256,
}

impl DropAccount {
    pub fn new(wallet: impl Into<String>, drop: impl Into<U256>) -> Self {
        Self {
            wallet: wallet.into(),
            drop: drop.into(),
        }
    }
}

/// A fetched balance: the account holding it and the raw amount.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceRecord {
    pub address: String,
    pub amount: U256,
}

/// Point-in-time observation of a recipient's balance for the selected asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BalanceSnapshot {
    Found(BalanceRecord),
    /// The wallet holds nothing of the selected token
    Missing,
}

impl BalanceSnapshot {
    pub fn amount(&self) -> Option<U256> {
        match self {
            BalanceSnapshot::Found(record) => Some(record.amount),
            BalanceSnapshot::Missing => None,
        }
    }
}

/// Result of a per-recipient balance fetch, keyed by wallet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropAccountBalance {
    pub wallet: String,
    pub snapshot: BalanceSnapshot,
}

/// A drop account with optional before/after balance snapshots.
/// `None` means the snapshot has not been fetched yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PopulatedDropAccount {
    pub wallet: String,
    pub drop: U256,
    pub before: Option<BalanceSnapshot>,
    pub after: Option<BalanceSnapshot>,
}

/// What the holding-address cell of the drop table shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HoldingStatus<'a> {
    Loading,
    Missing,
    Address(&'a str),
}

impl PopulatedDropAccount {
    /// Copy with both snapshots dropped.
    pub fn stripped(&self) -> Self {
        Self {
            wallet: self.wallet.clone(),
            drop: self.drop,
            before: None,
            after: None,
        }
    }

    pub fn account(&self) -> DropAccount {
        DropAccount {
            wallet: self.wallet.clone(),
            drop: self.drop,
        }
    }

    pub fn holding(&self) -> HoldingStatus<'_> {
        match (&self.before, &self.after) {
            (None, None) => HoldingStatus::Loading,
            (_, Some(BalanceSnapshot::Found(record))) => HoldingStatus::Address(&record.address),
            (Some(BalanceSnapshot::Found(record)), _) => HoldingStatus::Address(&record.address),
            _ => HoldingStatus::Missing,
        }
    }
}

impl From<DropAccount> for PopulatedDropAccount {
    fn from(account: DropAccount) -> Self {
        Self {
            wallet: account.wallet,
            drop: account.drop,
            before: None,
            after: None,
        }
    }
}

/// Raw balance of one ERC-20 token held by a wallet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenHolding {
    pub token_address: String,
    pub amount: U256,
}

/// Balance of the wallet the drop is funded from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletBalance {
    pub id: String,
    pub native_amount: U256,
    pub token_holdings: Vec<TokenHolding>,
}

impl WalletBalance {
    /// Zeroed balance for a wallet whose balance has not been fetched.
    pub fn empty(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            native_amount: U256::zero(),
            token_holdings: Vec::new(),
        }
    }

    pub fn token_amount(&self, token_address: &str) -> Option<U256> {
        self.token_holdings
            .iter()
            .find(|h| h.token_address.eq_ignore_ascii_case(token_address))
            .map(|h| h.amount)
    }

    /// Amount usable for a drop in `mode`.
    pub fn available(&self, mode: DropMode, token_address: &str) -> U256 {
        match mode {
            DropMode::Native => self.native_amount,
            DropMode::Token => self.token_amount(token_address).unwrap_or_default(),
        }
    }
}
