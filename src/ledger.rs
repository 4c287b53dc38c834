//! Ledger access seam.
//!
//! Everything that needs a live network goes through [`Ledger`], so the
//! reducer, store and session can be exercised against an in-memory ledger.

use crate::config::Cluster;
use crate::types::{DropAccount, DropAccountBalance, DropMode, PopulatedDropAccount, WalletBalance};
use async_trait::async_trait;
use ethers::signers::LocalWallet;
use ethers::types::{Address, TxHash, U256};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("No token selected for token mode")]
    NoTokenSelected,

    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("ABI error: {0}")]
    Abi(String),

    #[error("Transaction to {recipient} failed: {reason}")]
    Transaction { recipient: String, reason: String },

    #[error("Nothing to drop: every amount is zero")]
    NothingToDrop,

    #[error("Dev funding is not available on {0}")]
    FundingUnavailable(Cluster),

    #[error("Cannot mint {token} on this node: {reason}")]
    MintUnavailable { token: String, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<ethers::providers::ProviderError> for LedgerError {
    fn from(e: ethers::providers::ProviderError) -> Self {
        LedgerError::Rpc(e.to_string())
    }
}

#[async_trait]
pub trait Ledger: Send + Sync {
    /// Native balance plus known token holdings of `wallet`.
    async fn get_wallet_balance(&self, cluster: Cluster, wallet: &str) -> Result<WalletBalance, LedgerError>;

    /// Balance a recipient holds of the asset selected by `mode`/`token_address`.
    async fn get_drop_account_balance(
        &self,
        cluster: Cluster,
        account: &DropAccount,
        signer: Address,
        mode: DropMode,
        token_address: &str,
    ) -> Result<DropAccountBalance, LedgerError>;

    /// Send every non-zero drop, one transfer at a time.
    ///
    /// `Err` means nothing was broadcast. Once the first transfer is out, the
    /// result is `Ok` and a later failure is carried in [`DropOutcome::failure`].
    async fn distribute(
        &self,
        cluster: Cluster,
        signer: &LocalWallet,
        accounts: &[PopulatedDropAccount],
        mode: DropMode,
        token_address: &str,
    ) -> Result<DropOutcome, LedgerError>;

    /// Fund `signer` on a development cluster. Returns the amount granted.
    async fn drop_dev(&self, cluster: Cluster, signer: Address) -> Result<U256, LedgerError>;

    /// Credit `signer` with `token_address` on a development cluster. Returns
    /// the raw amount minted.
    async fn mint_dev(&self, cluster: Cluster, signer: Address, token_address: &str) -> Result<U256, LedgerError>;
}

/// Transfers a distribution got through, and the error that stopped it early.
#[derive(Debug)]
pub struct DropOutcome {
    /// Hashes in recipient order, skipping zero drops
    pub sent: Vec<TxHash>,
    pub failure: Option<LedgerError>,
}

impl DropOutcome {
    pub fn complete(sent: Vec<TxHash>) -> Self {
        Self { sent, failure: None }
    }

    pub fn stopped(sent: Vec<TxHash>, failure: LedgerError) -> Self {
        Self {
            sent,
            failure: Some(failure),
        }
    }
}

#[cfg(test)]
pub(crate) mod mock {
    //! In-memory ledger for tests.

    use super::*;
    use crate::types::{BalanceRecord, BalanceSnapshot, TokenHolding};
    use std::collections::HashMap;
    use std::sync::Mutex;
    use ethers::signers::Signer;
    use std::time::Duration;

    pub(crate) const MOCK_MINT_UNITS: u64 = 1_000;

    #[derive(Default)]
    pub(crate) struct MockLedger {
        /// Balances keyed by (cluster, wallet)
        pub native: Mutex<HashMap<(Cluster, String), U256>>,
        /// Token balances keyed by (cluster, wallet, token)
        pub tokens: Mutex<HashMap<(Cluster, String, String), U256>>,
        /// Per-wallet artificial latency for drop-account fetches
        pub delays: Mutex<HashMap<String, Duration>>,
        pub fail_wallets: Mutex<Vec<String>>,
        pub wallet_balance_calls: Mutex<Vec<(Cluster, String)>>,
        pub drops: Mutex<Vec<(Cluster, Vec<(String, U256)>, DropMode)>>,
        /// Index of the transfer that fails, counting non-zero drops only
        pub fail_transfer_at: Mutex<Option<usize>>,
    }

    impl MockLedger {
        pub fn set_native(&self, cluster: Cluster, wallet: &str, amount: u64) {
            self.native
                .lock()
                .unwrap()
                .insert((cluster, wallet.to_string()), U256::from(amount));
        }

        pub fn set_token(&self, cluster: Cluster, wallet: &str, token: &str, amount: u64) {
            self.tokens
                .lock()
                .unwrap()
                .insert((cluster, wallet.to_string(), token.to_string()), U256::from(amount));
        }

        pub fn set_delay(&self, wallet: &str, delay: Duration) {
            self.delays.lock().unwrap().insert(wallet.to_string(), delay);
        }

        pub fn clear_delay(&self, wallet: &str) {
            self.delays.lock().unwrap().remove(wallet);
        }

        pub fn fail_for(&self, wallet: &str) {
            self.fail_wallets.lock().unwrap().push(wallet.to_string());
        }

        pub fn fail_transfer_at(&self, index: usize) {
            *self.fail_transfer_at.lock().unwrap() = Some(index);
        }

        pub fn wallet_balance_calls(&self) -> usize {
            self.wallet_balance_calls.lock().unwrap().len()
        }

        fn native_of(&self, cluster: Cluster, wallet: &str) -> U256 {
            self.native
                .lock()
                .unwrap()
                .get(&(cluster, wallet.to_string()))
                .copied()
                .unwrap_or_default()
        }

        fn token_of(&self, cluster: Cluster, wallet: &str, token: &str) -> U256 {
            self.tokens
                .lock()
                .unwrap()
                .get(&(cluster, wallet.to_string(), token.to_string()))
                .copied()
                .unwrap_or_default()
        }
    }

    #[async_trait]
    impl Ledger for MockLedger {
        async fn get_wallet_balance(&self, cluster: Cluster, wallet: &str) -> Result<WalletBalance, LedgerError> {
            self.wallet_balance_calls
                .lock()
                .unwrap()
                .push((cluster, wallet.to_string()));
            let token_holdings = self
                .tokens
                .lock()
                .unwrap()
                .iter()
                .filter(|((c, w, _), _)| *c == cluster && w == wallet)
                .map(|((_, _, token), amount)| TokenHolding {
                    token_address: token.clone(),
                    amount: *amount,
                })
                .collect();
            Ok(WalletBalance {
                id: wallet.to_string(),
                native_amount: self.native_of(cluster, wallet),
                token_holdings,
            })
        }

        async fn get_drop_account_balance(
            &self,
            cluster: Cluster,
            account: &DropAccount,
            _signer: Address,
            mode: DropMode,
            token_address: &str,
        ) -> Result<DropAccountBalance, LedgerError> {
            let delay = self.delays.lock().unwrap().get(&account.wallet).copied();
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            if self.fail_wallets.lock().unwrap().contains(&account.wallet) {
                return Err(LedgerError::Rpc("connection refused".to_string()));
            }
            let snapshot = match mode {
                DropMode::Native => BalanceSnapshot::Found(BalanceRecord {
                    address: account.wallet.clone(),
                    amount: self.native_of(cluster, &account.wallet),
                }),
                DropMode::Token => {
                    let amount = self.token_of(cluster, &account.wallet, token_address);
                    if amount.is_zero() {
                        BalanceSnapshot::Missing
                    } else {
                        BalanceSnapshot::Found(BalanceRecord {
                            address: account.wallet.clone(),
                            amount,
                        })
                    }
                }
            };
            Ok(DropAccountBalance {
                wallet: account.wallet.clone(),
                snapshot,
            })
        }

        async fn distribute(
            &self,
            cluster: Cluster,
            signer: &LocalWallet,
            accounts: &[PopulatedDropAccount],
            mode: DropMode,
            token_address: &str,
        ) -> Result<DropOutcome, LedgerError> {
            let transfers: Vec<(String, U256)> = accounts
                .iter()
                .filter(|a| !a.drop.is_zero())
                .map(|a| (a.wallet.clone(), a.drop))
                .collect();
            if transfers.is_empty() {
                return Err(LedgerError::NothingToDrop);
            }
            let funder = format!("{:?}", signer.address());
            let fail_at = *self.fail_transfer_at.lock().unwrap();

            let mut sent = Vec::new();
            let mut failure = None;
            for (i, (wallet, amount)) in transfers.iter().enumerate() {
                if fail_at == Some(i) {
                    failure = Some(LedgerError::Transaction {
                        recipient: wallet.clone(),
                        reason: "rpc hiccup".to_string(),
                    });
                    break;
                }
                match mode {
                    DropMode::Native => {
                        let from = self.native_of(cluster, &funder);
                        let to = self.native_of(cluster, wallet);
                        let mut native = self.native.lock().unwrap();
                        native.insert((cluster, funder.clone()), from.saturating_sub(*amount));
                        native.insert((cluster, wallet.clone()), to + *amount);
                    }
                    DropMode::Token => {
                        let from = self.token_of(cluster, &funder, token_address);
                        let to = self.token_of(cluster, wallet, token_address);
                        let mut tokens = self.tokens.lock().unwrap();
                        tokens.insert(
                            (cluster, funder.clone(), token_address.to_string()),
                            from.saturating_sub(*amount),
                        );
                        tokens.insert((cluster, wallet.clone(), token_address.to_string()), to + *amount);
                    }
                }
                sent.push(TxHash::from_low_u64_be(i as u64 + 1));
            }

            let delivered = transfers[..sent.len()].to_vec();
            self.drops.lock().unwrap().push((cluster, delivered, mode));
            match failure {
                Some(e) if sent.is_empty() => Err(e),
                Some(e) => Ok(DropOutcome::stopped(sent, e)),
                None => Ok(DropOutcome::complete(sent)),
            }
        }

        async fn drop_dev(&self, cluster: Cluster, _signer: Address) -> Result<U256, LedgerError> {
            if cluster.supports_dev_funding() {
                Ok(U256::exp10(18))
            } else {
                Err(LedgerError::FundingUnavailable(cluster))
            }
        }

        async fn mint_dev(&self, cluster: Cluster, signer: Address, token_address: &str) -> Result<U256, LedgerError> {
            if !cluster.supports_dev_funding() {
                return Err(LedgerError::FundingUnavailable(cluster));
            }
            if token_address.trim().is_empty() {
                return Err(LedgerError::NoTokenSelected);
            }
            let owner = format!("{:?}", signer);
            let amount = U256::from(MOCK_MINT_UNITS);
            let current = self.token_of(cluster, &owner, token_address);
            self.tokens
                .lock()
                .unwrap()
                .insert((cluster, owner, token_address.to_string()), current + amount);
            Ok(amount)
        }
    }

    // ==================== MockLedger sanity tests ====================

    #[test]
    fn test_mock_token_balance_missing_when_zero() {
        let ledger = MockLedger::default();
        let account = DropAccount::new("Alice", 1u64);
        let result = tokio_test::block_on(ledger.get_drop_account_balance(
            Cluster::Sepolia,
            &account,
            Address::zero(),
            DropMode::Token,
            "0xtoken",
        ))
        .unwrap();
        assert_eq!(result.snapshot, BalanceSnapshot::Missing);
    }

    #[test]
    fn test_mock_transfer_failure_keeps_earlier_hashes() {
        let ledger = MockLedger::default();
        ledger.fail_transfer_at(1);
        let signer = LocalWallet::new(&mut rand::thread_rng());
        let accounts = vec![
            PopulatedDropAccount::from(DropAccount::new("Alice", 100u64)),
            PopulatedDropAccount::from(DropAccount::new("Zero", 0u64)),
            PopulatedDropAccount::from(DropAccount::new("Bob", 50u64)),
        ];
        let outcome = tokio_test::block_on(ledger.distribute(
            Cluster::Localhost,
            &signer,
            &accounts,
            DropMode::Native,
            "",
        ))
        .unwrap();
        assert_eq!(outcome.sent.len(), 1);
        assert!(matches!(
            outcome.failure,
            Some(LedgerError::Transaction { ref recipient, .. }) if recipient == "Bob"
        ));
        assert_eq!(ledger.native_of(Cluster::Localhost, "Alice"), U256::from(100u64));
        assert_eq!(ledger.native_of(Cluster::Localhost, "Bob"), U256::zero());
    }

    #[test]
    fn test_mock_drop_dev_only_on_localhost() {
        let ledger = MockLedger::default();
        assert!(tokio_test::block_on(ledger.drop_dev(Cluster::Localhost, Address::zero())).is_ok());
        let err = tokio_test::block_on(ledger.drop_dev(Cluster::Mainnet, Address::zero())).unwrap_err();
        assert!(err.to_string().contains("Ethereum"));
    }
}
