//! A drop session: the store plus everything that feeds it.
//!
//! The UI thread owns the session and calls [`DropSession::poll`] every frame.
//! Network work runs on the tokio runtime behind `handle` and reports back over
//! an unbounded channel, so the store keeps a single writer.

use crate::account::{self, AccountError, AccountInfo, AccountRestoreForm};
use crate::config::Cluster;
use crate::csv_import::{self, ImportError, ImportSummary};
use crate::ledger::{DropOutcome, Ledger};
use crate::refresh::{self, Effect, SnapshotQuery, TaskResult};
use crate::send_gate::{self, SendGate};
use crate::state::{AppAction, AppState};
use crate::store::{FetchKind, Store};
use crate::types::{DropAccount, DropMode};
use anyhow::{bail, Result};
use ethers::types::{TxHash, U256};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{info, warn};

/// Outcome of background work worth telling the user about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    DropSent {
        cluster: Cluster,
        hashes: Vec<TxHash>,
        recipients: usize,
        total: U256,
    },
    /// Transfers before `error` went out; the remaining ones were not sent
    DropPartiallySent {
        cluster: Cluster,
        hashes: Vec<TxHash>,
        recipients: usize,
        error: String,
    },
    DropFailed(String),
    DevFunded {
        cluster: Cluster,
        amount: U256,
    },
    DevFundingFailed(String),
    DevMinted {
        cluster: Cluster,
        amount: U256,
    },
    DevMintFailed(String),
}

impl SessionEvent {
    /// Operation log entry for events that moved funds.
    pub fn operation_log_entry(&self) -> Option<(Cluster, String)> {
        match self {
            SessionEvent::DropSent {
                cluster,
                hashes,
                recipients,
                total,
            } => {
                let mut details = format!("recipients={}\ntotal={}", recipients, total);
                for hash in hashes {
                    details.push_str(&format!("\ntx {:?}", hash));
                }
                Some((*cluster, details))
            }
            SessionEvent::DropPartiallySent {
                cluster,
                hashes,
                recipients,
                error,
            } => {
                let mut details = format!(
                    "recipients={}\nsent={}\nstopped: {}",
                    recipients,
                    hashes.len(),
                    error
                );
                for hash in hashes {
                    details.push_str(&format!("\ntx {:?}", hash));
                }
                Some((*cluster, details))
            }
            _ => None,
        }
    }
}

pub struct DropSession {
    store: Store,
    ledger: Arc<dyn Ledger>,
    account: Option<AccountInfo>,
    handle: Handle,
    tx: UnboundedSender<TaskResult>,
    rx: UnboundedReceiver<TaskResult>,
    balance_debounce: Duration,
    drop_in_flight: bool,
    funding_in_flight: bool,
    minting_in_flight: bool,
}

impl DropSession {
    pub fn new(ledger: Arc<dyn Ledger>, handle: Handle, state: AppState, balance_debounce: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            store: Store::new(state),
            ledger,
            account: None,
            handle,
            tx,
            rx,
            balance_debounce,
            drop_in_flight: false,
            funding_in_flight: false,
            minting_in_flight: false,
        }
    }

    pub fn state(&self) -> &AppState {
        self.store.state()
    }

    pub fn account(&self) -> Option<&AccountInfo> {
        self.account.as_ref()
    }

    pub fn drop_in_flight(&self) -> bool {
        self.drop_in_flight
    }

    pub fn funding_in_flight(&self) -> bool {
        self.funding_in_flight
    }

    pub fn minting_in_flight(&self) -> bool {
        self.minting_in_flight
    }

    pub fn balance_is_current(&self) -> bool {
        self.store.balance_is_current()
    }

    pub fn send_gate(&self) -> SendGate {
        send_gate::evaluate(self.state(), self.account.is_some(), self.store.balance_is_current())
    }

    // ------------------------------------------------------------------
    // User intent
    // ------------------------------------------------------------------

    fn dispatch(&mut self, action: AppAction) {
        let effects = refresh::effects_for(&action);
        self.store.dispatch(action);
        for effect in effects {
            self.run(effect);
        }
    }

    pub fn set_wallet(&mut self, wallet: &str) {
        let wallet = wallet.trim();
        if wallet == self.state().balance.id {
            return;
        }
        self.dispatch(AppAction::SetWallet(wallet.to_string()));
    }

    pub fn set_cluster(&mut self, cluster: Cluster) {
        if cluster == self.state().cluster {
            return;
        }
        info!("Switching cluster to {}", cluster);
        self.dispatch(AppAction::SetCluster(cluster));
    }

    pub fn set_mode(&mut self, mode: DropMode) {
        if mode == self.state().mode {
            return;
        }
        self.dispatch(AppAction::SetMode(mode));
    }

    pub fn set_token_address(&mut self, token_address: &str) {
        let token_address = token_address.trim();
        if token_address == self.state().token_address {
            return;
        }
        self.dispatch(AppAction::SetTokenAddress(token_address.to_string()));
    }

    /// Replace the recipient list.
    pub fn set_drop_accounts(&mut self, accounts: Vec<DropAccount>) {
        self.dispatch(AppAction::SetDropAccounts(accounts));
    }

    pub fn import_csv(&mut self, path: &Path) -> Result<ImportSummary, ImportError> {
        let summary = csv_import::load_drop_csv(path)?;
        self.set_drop_accounts(summary.accounts.clone());
        Ok(summary)
    }

    /// Replace the signing account. Snapshots taken for the previous account
    /// are no longer wanted.
    pub fn set_account(&mut self, account: Option<AccountInfo>) {
        self.store.invalidate_snapshots();
        self.account = account;
        self.run(Effect::RefreshBefore);
    }

    /// Create a fresh account, make it the signing account and fund from it.
    pub fn create_account(&mut self) -> Result<AccountInfo, AccountError> {
        let created = account::create()?;
        self.adopt_account(created.clone());
        Ok(created)
    }

    pub fn restore_account(&mut self, form: &AccountRestoreForm) -> Result<AccountInfo, AccountError> {
        let restored = account::restore(form)?;
        self.adopt_account(restored.clone());
        Ok(restored)
    }

    fn adopt_account(&mut self, account: AccountInfo) {
        let address = account.address_string();
        self.set_account(Some(account));
        self.set_wallet(&address);
    }

    /// Swap the ledger, e.g. after an RPC override changed. Everything fetched
    /// through the old one is refetched.
    pub fn set_ledger(&mut self, ledger: Arc<dyn Ledger>) {
        self.ledger = ledger;
        self.store.invalidate_snapshots();
        self.refresh_balance();
        self.run(Effect::RefreshBefore);
    }

    pub fn set_balance_debounce(&mut self, delay: Duration) {
        self.balance_debounce = delay;
    }

    /// Fetch the funding wallet's balance now.
    pub fn refresh_balance(&mut self) {
        self.spawn_wallet_balance(Duration::ZERO);
    }

    /// Send every drop from the signing account.
    pub fn drop(&mut self) -> Result<()> {
        if self.drop_in_flight {
            bail!("A drop is already in progress");
        }
        let gate = self.send_gate();
        let total = match gate {
            SendGate::Enabled { total, .. } => total,
            SendGate::NothingToSend => bail!("Nothing to send"),
            SendGate::InsufficientFunds { shortfall, .. } => bail!("Insufficient funds: short by {}", shortfall),
            SendGate::NoSigningAccount => bail!("Need a signing account"),
        };
        let Some(account) = self.account.clone() else {
            bail!("Need a signing account");
        };

        let state = self.state();
        let cluster = state.cluster;
        let mode = state.mode;
        let token_address = state.token_address.clone();
        let populated = state.drop_populated_accounts.clone();
        let accounts = state.drop_accounts.clone();
        let after = self.store.issue(FetchKind::After);

        info!(
            "Starting drop of {} to {} recipients on {} ({} mode)",
            total,
            populated.len(),
            cluster,
            mode
        );
        self.drop_in_flight = true;

        let ledger = self.ledger.clone();
        let tx = self.tx.clone();
        self.handle.spawn(async move {
            let result = ledger
                .distribute(cluster, &account.signer, &populated, mode, &token_address)
                .await;
            let _ = tx.send(TaskResult::Dropped {
                cluster,
                after,
                accounts,
                result,
            });
        });
        Ok(())
    }

    /// Ask a development cluster to fund the signing account.
    pub fn drop_dev(&mut self) -> Result<()> {
        let cluster = self.state().cluster;
        if !cluster.supports_dev_funding() {
            bail!("Dev funding is not available on {}", cluster);
        }
        if self.funding_in_flight {
            bail!("Funding is already in progress");
        }
        let Some(account) = self.account.as_ref() else {
            bail!("Need a signing account");
        };
        let address = account.address;
        self.funding_in_flight = true;

        let ledger = self.ledger.clone();
        let tx = self.tx.clone();
        self.handle.spawn(async move {
            let result = ledger.drop_dev(cluster, address).await;
            let _ = tx.send(TaskResult::Funded { cluster, result });
        });
        Ok(())
    }

    /// Credit the signing account with the selected token on a development
    /// cluster.
    pub fn mint_dev(&mut self) -> Result<()> {
        let state = self.state();
        let cluster = state.cluster;
        let token_address = state.token_address.trim().to_string();
        if !cluster.supports_dev_funding() {
            bail!("Dev minting is not available on {}", cluster);
        }
        if token_address.is_empty() {
            bail!("Select a token to mint");
        }
        if self.minting_in_flight {
            bail!("Minting is already in progress");
        }
        let Some(account) = self.account.as_ref() else {
            bail!("Need a signing account");
        };
        let address = account.address;
        self.minting_in_flight = true;

        let ledger = self.ledger.clone();
        let tx = self.tx.clone();
        self.handle.spawn(async move {
            let result = ledger.mint_dev(cluster, address, &token_address).await;
            let _ = tx.send(TaskResult::Minted {
                cluster,
                token_address,
                result,
            });
        });
        Ok(())
    }

    // ------------------------------------------------------------------
    // Background work
    // ------------------------------------------------------------------

    fn run(&mut self, effect: Effect) {
        match effect {
            Effect::RefreshWallet { debounced } => {
                let delay = if debounced { self.balance_debounce } else { Duration::ZERO };
                self.spawn_wallet_balance(delay);
            }
            Effect::RefreshBefore => self.spawn_snapshots(FetchKind::Before),
        }
    }

    fn spawn_wallet_balance(&mut self, delay: Duration) {
        let ticket = self.store.issue(FetchKind::WalletBalance);
        let state = self.store.state();
        if state.balance.id.is_empty() {
            return;
        }
        refresh::spawn_wallet_balance(
            &self.handle,
            self.ledger.clone(),
            self.tx.clone(),
            ticket,
            state.cluster,
            state.balance.id.clone(),
            delay,
        );
    }

    fn snapshot_query(&self) -> Option<SnapshotQuery> {
        let account = self.account.as_ref()?;
        let state = self.state();
        Some(SnapshotQuery {
            cluster: state.cluster,
            signer: account.address,
            mode: state.mode,
            token_address: state.token_address.clone(),
        })
    }

    fn spawn_snapshots(&mut self, kind: FetchKind) {
        let ticket = self.store.issue(kind);
        let accounts = self.state().drop_accounts.clone();
        if accounts.is_empty() {
            return;
        }
        let Some(query) = self.snapshot_query() else {
            return;
        };
        refresh::spawn_snapshot_fanout(&self.handle, self.ledger.clone(), self.tx.clone(), ticket, query, accounts);
    }

    /// Apply finished background work. Call once per frame.
    pub fn poll(&mut self) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        while let Ok(result) = self.rx.try_recv() {
            match result {
                TaskResult::Observed(observation) => {
                    self.store.observe(observation);
                }
                TaskResult::FetchFailed { kind, wallet, error } => {
                    tracing::debug!(?kind, %wallet, %error, "fetch failed, keeping previous value");
                }
                TaskResult::Dropped {
                    cluster,
                    after,
                    accounts,
                    result,
                } => {
                    self.drop_in_flight = false;
                    // Whatever happened, the funding wallet may have changed
                    if self.state().cluster == cluster {
                        self.refresh_balance();
                    }
                    match result {
                        Ok(outcome) => {
                            let DropOutcome { sent: hashes, failure } = outcome;
                            if !hashes.is_empty() && after.is_current() {
                                if let Some(query) = self.snapshot_query() {
                                    refresh::spawn_snapshot_fanout(
                                        &self.handle,
                                        self.ledger.clone(),
                                        self.tx.clone(),
                                        after,
                                        query,
                                        accounts.clone(),
                                    );
                                }
                            }
                            match failure {
                                None => {
                                    let total = accounts
                                        .iter()
                                        .fold(U256::zero(), |acc, a| acc.saturating_add(a.drop));
                                    info!("Drop on {} finished with {} transactions", cluster, hashes.len());
                                    events.push(SessionEvent::DropSent {
                                        cluster,
                                        hashes,
                                        recipients: accounts.len(),
                                        total,
                                    });
                                }
                                Some(e) => {
                                    warn!("Drop on {} stopped after {} transactions: {}", cluster, hashes.len(), e);
                                    events.push(SessionEvent::DropPartiallySent {
                                        cluster,
                                        hashes,
                                        recipients: accounts.len(),
                                        error: e.to_string(),
                                    });
                                }
                            }
                        }
                        Err(e) => {
                            warn!("Drop on {} failed: {}", cluster, e);
                            events.push(SessionEvent::DropFailed(e.to_string()));
                        }
                    }
                }
                TaskResult::Funded { cluster, result } => {
                    self.funding_in_flight = false;
                    match result {
                        Ok(amount) => {
                            if self.state().cluster == cluster {
                                self.refresh_balance();
                            }
                            events.push(SessionEvent::DevFunded { cluster, amount });
                        }
                        Err(e) => {
                            warn!("Dev funding on {} failed: {}", cluster, e);
                            events.push(SessionEvent::DevFundingFailed(e.to_string()));
                        }
                    }
                }
                TaskResult::Minted {
                    cluster,
                    token_address,
                    result,
                } => {
                    self.minting_in_flight = false;
                    match result {
                        Ok(amount) => {
                            info!("Minted {} units of {} on {}", amount, token_address, cluster);
                            if self.state().cluster == cluster {
                                self.refresh_balance();
                            }
                            events.push(SessionEvent::DevMinted { cluster, amount });
                        }
                        Err(e) => {
                            warn!("Dev minting on {} failed: {}", cluster, e);
                            events.push(SessionEvent::DevMintFailed(e.to_string()));
                        }
                    }
                }
            }
        }
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::mock::{MockLedger, MOCK_MINT_UNITS};
    use crate::types::{BalanceSnapshot, HoldingStatus};
    use std::time::Instant;

    const KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
    const FUNDER: &str = "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266";
    const TOKEN: &str = "0x0000000000000000000000000000000000000def";

    fn session(ledger: Arc<MockLedger>, debounce_ms: u64) -> DropSession {
        DropSession::new(
            ledger,
            Handle::current(),
            AppState::new(Cluster::Localhost, "", TOKEN),
            Duration::from_millis(debounce_ms),
        )
    }

    fn signing_account() -> AccountInfo {
        account::restore(&AccountRestoreForm::PrivateKey(KEY.to_string())).unwrap()
    }

    fn alice_and_bob() -> Vec<DropAccount> {
        vec![DropAccount::new("Alice", 100u64), DropAccount::new("Bob", 50u64)]
    }

    /// Poll until `done` holds, collecting events. Panics after two seconds.
    async fn settle(session: &mut DropSession, done: impl Fn(&DropSession) -> bool) -> Vec<SessionEvent> {
        let deadline = Instant::now() + Duration::from_secs(2);
        let mut events = Vec::new();
        loop {
            events.extend(session.poll());
            if done(session) {
                return events;
            }
            assert!(Instant::now() < deadline, "session did not settle");
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    /// Poll for a fixed time.
    async fn drain(session: &mut DropSession, millis: u64) -> Vec<SessionEvent> {
        let deadline = Instant::now() + Duration::from_millis(millis);
        let mut events = Vec::new();
        while Instant::now() < deadline {
            events.extend(session.poll());
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        events
    }

    fn before_amount(session: &DropSession, idx: usize) -> Option<U256> {
        session.state().drop_populated_accounts[idx]
            .before
            .as_ref()
            .and_then(|s| s.amount())
    }

    fn all_before_loaded(session: &DropSession) -> bool {
        session.state().drop_populated_accounts.iter().all(|a| a.before.is_some())
    }

    // ==================== balance refresh tests ====================

    #[tokio::test(flavor = "multi_thread")]
    async fn test_wallet_change_fetches_balance_after_debounce() {
        let ledger = Arc::new(MockLedger::default());
        ledger.set_native(Cluster::Localhost, FUNDER, 200);
        let mut session = session(ledger.clone(), 20);

        session.set_wallet(FUNDER);
        assert!(!session.balance_is_current());
        settle(&mut session, |s| s.balance_is_current()).await;
        assert_eq!(session.state().balance.native_amount, U256::from(200u64));
        assert_eq!(ledger.wallet_balance_calls(), 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_superseded_debounced_fetch_is_never_issued() {
        let ledger = Arc::new(MockLedger::default());
        let mut session = session(ledger.clone(), 100);

        session.set_wallet("0xfirst");
        session.set_wallet("0xsecond");
        drain(&mut session, 300).await;

        let calls = ledger.wallet_balance_calls.lock().unwrap().clone();
        assert_eq!(calls, vec![(Cluster::Localhost, "0xsecond".to_string())]);
        assert_eq!(session.state().balance.id, "0xsecond");
        assert!(session.balance_is_current());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_empty_wallet_is_not_fetched() {
        let ledger = Arc::new(MockLedger::default());
        let mut session = session(ledger.clone(), 0);
        session.set_wallet("0xaa");
        settle(&mut session, |s| s.balance_is_current()).await;
        session.set_wallet("   ");
        drain(&mut session, 50).await;
        assert_eq!(ledger.wallet_balance_calls(), 1);
        assert!(!session.balance_is_current());
    }

    // ==================== snapshot tests ====================

    #[tokio::test(flavor = "multi_thread")]
    async fn test_before_snapshots_need_an_account() {
        let ledger = Arc::new(MockLedger::default());
        ledger.set_native(Cluster::Localhost, "Alice", 5);
        let mut session = session(ledger, 0);

        session.set_drop_accounts(alice_and_bob());
        drain(&mut session, 50).await;
        assert!(session.state().drop_populated_accounts.iter().all(|a| a.holding() == HoldingStatus::Loading));

        session.set_account(Some(signing_account()));
        settle(&mut session, all_before_loaded).await;
        assert_eq!(before_amount(&session, 0), Some(U256::from(5u64)));
        assert_eq!(before_amount(&session, 1), Some(U256::zero()));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_token_mode_reports_missing_holdings() {
        let ledger = Arc::new(MockLedger::default());
        ledger.set_token(Cluster::Localhost, "Bob", TOKEN, 9);
        let mut session = session(ledger, 0);
        session.set_account(Some(signing_account()));
        session.set_drop_accounts(alice_and_bob());
        session.set_mode(DropMode::Token);

        settle(&mut session, all_before_loaded).await;
        let accounts = &session.state().drop_populated_accounts;
        assert_eq!(accounts[0].before, Some(BalanceSnapshot::Missing));
        assert_eq!(accounts[0].holding(), HoldingStatus::Missing);
        assert_eq!(accounts[1].holding(), HoldingStatus::Address("Bob"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_stale_snapshot_does_not_overwrite_newer_one() {
        let ledger = Arc::new(MockLedger::default());
        ledger.set_native(Cluster::Localhost, "Alice", 7);
        ledger.set_native(Cluster::Sepolia, "Alice", 9);
        ledger.set_delay("Alice", Duration::from_millis(200));
        let mut session = session(ledger.clone(), 0);
        session.set_account(Some(signing_account()));
        session.set_drop_accounts(vec![DropAccount::new("Alice", 1u64)]);

        // let the slow Localhost fetch start before the cluster changes
        tokio::time::sleep(Duration::from_millis(50)).await;
        ledger.clear_delay("Alice");
        session.set_cluster(Cluster::Sepolia);

        settle(&mut session, all_before_loaded).await;
        assert_eq!(before_amount(&session, 0), Some(U256::from(9u64)));

        // the Localhost result lands now and must be discarded
        drain(&mut session, 300).await;
        assert_eq!(before_amount(&session, 0), Some(U256::from(9u64)));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_failed_fetch_leaves_snapshot_loading() {
        let ledger = Arc::new(MockLedger::default());
        ledger.fail_for("Bob");
        let mut session = session(ledger, 0);
        session.set_account(Some(signing_account()));
        session.set_drop_accounts(alice_and_bob());

        settle(&mut session, |s| s.state().drop_populated_accounts[0].before.is_some()).await;
        drain(&mut session, 50).await;
        assert_eq!(session.state().drop_populated_accounts[1].holding(), HoldingStatus::Loading);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_cluster_change_resets_mode_and_snapshots() {
        let ledger = Arc::new(MockLedger::default());
        let mut session = session(ledger, 0);
        session.set_account(Some(signing_account()));
        session.set_drop_accounts(alice_and_bob());
        session.set_mode(DropMode::Token);
        settle(&mut session, all_before_loaded).await;

        session.set_cluster(Cluster::Sepolia);
        assert_eq!(session.state().mode, DropMode::Native);
        assert!(session.state().drop_populated_accounts.iter().all(|a| a.before.is_none()));
    }

    // ==================== drop tests ====================

    async fn funded_session(ledger: Arc<MockLedger>) -> DropSession {
        ledger.set_native(Cluster::Localhost, FUNDER, 1_000);
        ledger.set_native(Cluster::Localhost, "Alice", 5);
        let mut session = session(ledger, 0);
        session.restore_account(&AccountRestoreForm::PrivateKey(KEY.to_string())).unwrap();
        session.set_drop_accounts(alice_and_bob());
        settle(&mut session, |s| s.balance_is_current() && all_before_loaded(s)).await;
        session
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_restore_sets_wallet_to_account_address() {
        let ledger = Arc::new(MockLedger::default());
        let session = funded_session(ledger).await;
        assert_eq!(session.state().balance.id, FUNDER);
        assert!(session.send_gate().is_enabled());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_drop_populates_after_snapshots() {
        let ledger = Arc::new(MockLedger::default());
        let mut session = funded_session(ledger.clone()).await;

        session.drop().unwrap();
        assert!(session.drop_in_flight());
        let events = settle(&mut session, |s| {
            s.state().drop_populated_accounts.iter().all(|a| a.after.is_some())
        })
        .await;

        assert!(!session.drop_in_flight());
        assert!(events.iter().any(|e| matches!(
            e,
            SessionEvent::DropSent { recipients: 2, hashes, .. } if hashes.len() == 2
        )));
        let accounts = &session.state().drop_populated_accounts;
        assert_eq!(accounts[0].before.as_ref().and_then(|s| s.amount()), Some(U256::from(5u64)));
        assert_eq!(accounts[0].after.as_ref().and_then(|s| s.amount()), Some(U256::from(105u64)));
        assert_eq!(accounts[1].after.as_ref().and_then(|s| s.amount()), Some(U256::from(50u64)));
        assert_eq!(ledger.drops.lock().unwrap().len(), 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_second_drop_refused_while_in_flight() {
        let ledger = Arc::new(MockLedger::default());
        let mut session = funded_session(ledger.clone()).await;
        session.drop().unwrap();
        let err = session.drop().unwrap_err();
        assert!(err.to_string().contains("already in progress"));
        settle(&mut session, |s| !s.drop_in_flight()).await;
        assert_eq!(ledger.drops.lock().unwrap().len(), 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_drop_refused_by_gate() {
        let ledger = Arc::new(MockLedger::default());
        let mut session = session(ledger.clone(), 0);
        session.set_drop_accounts(alice_and_bob());
        assert_eq!(session.drop().unwrap_err().to_string(), "Insufficient funds: short by 150");

        let mut empty = funded_session(Arc::new(MockLedger::default())).await;
        empty.set_drop_accounts(Vec::new());
        assert_eq!(empty.drop().unwrap_err().to_string(), "Nothing to send");
        assert!(ledger.drops.lock().unwrap().is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_drop_needs_signing_account() {
        let ledger = Arc::new(MockLedger::default());
        ledger.set_native(Cluster::Localhost, FUNDER, 1_000);
        let mut session = session(ledger, 0);
        session.set_wallet(FUNDER);
        session.set_drop_accounts(alice_and_bob());
        settle(&mut session, |s| s.balance_is_current()).await;
        assert_eq!(session.send_gate(), SendGate::NoSigningAccount);
        assert!(session.drop().is_err());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_list_change_during_drop_skips_after_fanout() {
        let ledger = Arc::new(MockLedger::default());
        let mut session = funded_session(ledger).await;
        session.drop().unwrap();
        session.set_drop_accounts(vec![DropAccount::new("Carol", 1u64)]);
        settle(&mut session, |s| !s.drop_in_flight()).await;
        drain(&mut session, 50).await;
        assert!(session.state().drop_populated_accounts[0].after.is_none());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_partial_drop_refreshes_balance_and_after_snapshots() {
        let ledger = Arc::new(MockLedger::default());
        ledger.fail_transfer_at(1);
        let mut session = funded_session(ledger.clone()).await;

        session.drop().unwrap();
        let events = settle(&mut session, |s| {
            !s.drop_in_flight()
                && s.balance_is_current()
                && s.state().drop_populated_accounts.iter().all(|a| a.after.is_some())
        })
        .await;

        let partial = events
            .iter()
            .find(|e| matches!(e, SessionEvent::DropPartiallySent { .. }))
            .expect("partial drop event");
        match partial {
            SessionEvent::DropPartiallySent {
                hashes,
                recipients,
                error,
                ..
            } => {
                assert_eq!(hashes.len(), 1);
                assert_eq!(*recipients, 2);
                assert!(error.contains("Bob"));
            }
            other => panic!("unexpected event {:?}", other),
        }
        assert!(!events.iter().any(|e| matches!(e, SessionEvent::DropFailed(_))));

        // the gate now sees what the funder really has left
        assert_eq!(session.state().balance.native_amount, U256::from(900u64));
        assert_eq!(
            session.send_gate(),
            SendGate::Enabled {
                total: U256::from(150u64),
                available: U256::from(900u64)
            }
        );
        let accounts = &session.state().drop_populated_accounts;
        assert_eq!(accounts[0].after.as_ref().and_then(|s| s.amount()), Some(U256::from(105u64)));
        assert_eq!(accounts[1].after.as_ref().and_then(|s| s.amount()), Some(U256::zero()));

        let (cluster, details) = partial.operation_log_entry().unwrap();
        assert_eq!(cluster, Cluster::Localhost);
        assert!(details.contains("sent=1"));
        assert!(details.contains("tx 0x"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_failed_drop_still_refreshes_balance() {
        let ledger = Arc::new(MockLedger::default());
        ledger.fail_transfer_at(0);
        let mut session = funded_session(ledger.clone()).await;
        let calls = ledger.wallet_balance_calls();

        session.drop().unwrap();
        let events = settle(&mut session, |s| !s.drop_in_flight() && s.balance_is_current()).await;

        assert_eq!(events.len(), 1);
        assert!(matches!(&events[0], SessionEvent::DropFailed(reason) if reason.contains("Alice")));
        assert_eq!(events[0].operation_log_entry(), None);
        assert_eq!(ledger.wallet_balance_calls(), calls + 1);
        drain(&mut session, 50).await;
        assert!(session.state().drop_populated_accounts.iter().all(|a| a.after.is_none()));
    }

    #[test]
    fn test_completed_drop_log_entry_lists_hashes() {
        let event = SessionEvent::DropSent {
            cluster: Cluster::Sepolia,
            hashes: vec![TxHash::from_low_u64_be(1), TxHash::from_low_u64_be(2)],
            recipients: 2,
            total: U256::from(150u64),
        };
        let (cluster, details) = event.operation_log_entry().unwrap();
        assert_eq!(cluster, Cluster::Sepolia);
        assert!(details.starts_with("recipients=2\ntotal=150"));
        assert_eq!(details.matches("\ntx 0x").count(), 2);
    }

    // ==================== dev funding tests ====================

    #[tokio::test(flavor = "multi_thread")]
    async fn test_drop_dev_on_localhost() {
        let ledger = Arc::new(MockLedger::default());
        let mut session = session(ledger, 0);
        assert!(session.drop_dev().is_err());

        session.set_account(Some(signing_account()));
        session.drop_dev().unwrap();
        let events = settle(&mut session, |s| !s.funding_in_flight()).await;
        assert_eq!(
            events,
            vec![SessionEvent::DevFunded {
                cluster: Cluster::Localhost,
                amount: U256::exp10(18)
            }]
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_drop_dev_refused_off_localhost() {
        let ledger = Arc::new(MockLedger::default());
        let mut session = session(ledger, 0);
        session.set_account(Some(signing_account()));
        session.set_cluster(Cluster::Mainnet);
        let err = session.drop_dev().unwrap_err();
        assert!(err.to_string().contains("not available"));
    }

    // ==================== dev minting tests ====================

    #[tokio::test(flavor = "multi_thread")]
    async fn test_mint_dev_credits_signer_and_refreshes_balance() {
        let ledger = Arc::new(MockLedger::default());
        let mut session = session(ledger.clone(), 0);
        assert!(session.mint_dev().unwrap_err().to_string().contains("signing account"));

        session.restore_account(&AccountRestoreForm::PrivateKey(KEY.to_string())).unwrap();
        session.set_mode(DropMode::Token);
        settle(&mut session, |s| s.balance_is_current()).await;
        assert_eq!(session.state().balance.available(DropMode::Token, TOKEN), U256::zero());

        session.mint_dev().unwrap();
        assert!(session.minting_in_flight());
        assert!(session.mint_dev().unwrap_err().to_string().contains("already in progress"));
        let events = settle(&mut session, |s| !s.minting_in_flight() && s.balance_is_current()).await;

        assert_eq!(
            events,
            vec![SessionEvent::DevMinted {
                cluster: Cluster::Localhost,
                amount: U256::from(MOCK_MINT_UNITS)
            }]
        );
        assert_eq!(
            session.state().balance.available(DropMode::Token, TOKEN),
            U256::from(MOCK_MINT_UNITS)
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_mint_dev_refused_off_localhost_or_without_token() {
        let ledger = Arc::new(MockLedger::default());
        let mut session = session(ledger, 0);
        session.set_account(Some(signing_account()));
        session.set_token_address("");
        assert!(session.mint_dev().unwrap_err().to_string().contains("Select a token"));

        session.set_token_address(TOKEN);
        session.set_cluster(Cluster::Mainnet);
        assert!(session.mint_dev().unwrap_err().to_string().contains("not available"));
        assert!(!session.minting_in_flight());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_set_ledger_refetches_from_new_ledger() {
        let old = Arc::new(MockLedger::default());
        old.set_native(Cluster::Localhost, "Alice", 1);
        let mut session = session(old, 0);
        session.set_account(Some(signing_account()));
        session.set_drop_accounts(vec![DropAccount::new("Alice", 1u64)]);
        settle(&mut session, all_before_loaded).await;

        let new = Arc::new(MockLedger::default());
        new.set_native(Cluster::Localhost, "Alice", 2);
        session.set_ledger(new);
        settle(&mut session, |s| before_amount(s, 0) == Some(U256::from(2u64))).await;
    }

    // ==================== import tests ====================

    #[tokio::test(flavor = "multi_thread")]
    async fn test_import_csv_replaces_list() {
        let path = std::env::temp_dir().join(format!("tokendrop_session_{}.csv", std::process::id()));
        std::fs::write(&path, "wallet,drop\nAlice,100\nBob,50\n").unwrap();
        let mut session = session(Arc::new(MockLedger::default()), 0);
        session.set_drop_accounts(vec![DropAccount::new("Old", 1u64)]);

        let summary = session.import_csv(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(summary.accounts.len(), 2);
        assert_eq!(session.state().drop_accounts, alice_and_bob());
        assert!(session
            .state()
            .drop_populated_accounts
            .iter()
            .all(|a| a.before.is_none() && a.after.is_none()));
    }
}
