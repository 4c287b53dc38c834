//! Background balance fetches.
//!
//! Every fetch is spawned on the session's runtime and reports back over the
//! session channel, tagged with the [`Ticket`] it was issued under. Nothing
//! here touches state; the session applies results in `poll`.

use crate::config::Cluster;
use crate::ledger::{DropOutcome, Ledger, LedgerError};
use crate::state::AppAction;
use crate::store::{FetchKind, Observation, Ticket};
use crate::types::{DropAccount, DropMode};
use ethers::types::{Address, U256};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, warn};

/// Follow-up work an action requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Fetch the funding wallet's balance, optionally after the debounce delay
    RefreshWallet { debounced: bool },
    /// Fetch a before-snapshot for every drop account
    RefreshBefore,
}

/// Fetches a dispatched action calls for.
pub fn effects_for(action: &AppAction) -> Vec<Effect> {
    match action {
        AppAction::SetWallet(_) => vec![Effect::RefreshWallet { debounced: true }],
        AppAction::SetCluster(_) => vec![Effect::RefreshWallet { debounced: true }, Effect::RefreshBefore],
        AppAction::SetTokenAddress(_) | AppAction::SetMode(_) | AppAction::SetDropAccounts(_) => {
            vec![Effect::RefreshBefore]
        }
        AppAction::SetBalance(_) | AppAction::SetDropAccountBefore(_) | AppAction::SetDropAccountAfter(_) => {
            Vec::new()
        }
    }
}

/// Message from a background task to the session.
#[derive(Debug)]
pub enum TaskResult {
    Observed(Observation),
    FetchFailed {
        kind: FetchKind,
        wallet: String,
        error: LedgerError,
    },
    Dropped {
        cluster: Cluster,
        /// Ticket for the after-snapshot fan-out, issued when the drop started
        after: Ticket,
        accounts: Vec<DropAccount>,
        result: Result<DropOutcome, LedgerError>,
    },
    Funded {
        cluster: Cluster,
        result: Result<U256, LedgerError>,
    },
    Minted {
        cluster: Cluster,
        token_address: String,
        result: Result<U256, LedgerError>,
    },
}

/// Parameters shared by every drop-account fetch of one fan-out.
#[derive(Debug, Clone)]
pub struct SnapshotQuery {
    pub cluster: Cluster,
    pub signer: Address,
    pub mode: DropMode,
    pub token_address: String,
}

pub fn spawn_wallet_balance(
    handle: &Handle,
    ledger: Arc<dyn Ledger>,
    tx: UnboundedSender<TaskResult>,
    ticket: Ticket,
    cluster: Cluster,
    wallet: String,
    delay: Duration,
) {
    handle.spawn(async move {
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
            if !ticket.is_current() {
                debug!("Balance fetch for {} superseded during debounce", wallet);
                return;
            }
        }
        let message = match ledger.get_wallet_balance(cluster, &wallet).await {
            Ok(balance) => TaskResult::Observed(Observation::WalletBalance(ticket, balance)),
            Err(error) => {
                warn!("Failed to fetch balance of {} on {}: {}", wallet, cluster, error);
                TaskResult::FetchFailed {
                    kind: FetchKind::WalletBalance,
                    wallet,
                    error,
                }
            }
        };
        let _ = tx.send(message);
    });
}

/// One concurrent fetch per account; results arrive in any order.
pub fn spawn_snapshot_fanout(
    handle: &Handle,
    ledger: Arc<dyn Ledger>,
    tx: UnboundedSender<TaskResult>,
    ticket: Ticket,
    query: SnapshotQuery,
    accounts: Vec<DropAccount>,
) {
    debug!(
        kind = ?ticket.kind,
        generation = ticket.generation,
        "fetching {} drop account balances",
        accounts.len()
    );
    for account in accounts {
        let ledger = ledger.clone();
        let tx = tx.clone();
        let ticket = ticket.clone();
        let query = query.clone();
        handle.spawn(async move {
            if !ticket.is_current() {
                return;
            }
            let result = ledger
                .get_drop_account_balance(query.cluster, &account, query.signer, query.mode, &query.token_address)
                .await;
            let message = match result {
                Ok(record) => TaskResult::Observed(match ticket.kind {
                    FetchKind::After => Observation::DropAccountAfter(ticket, record),
                    _ => Observation::DropAccountBefore(ticket, record),
                }),
                Err(error) => {
                    warn!("Failed to fetch balance of {} on {}: {}", account.wallet, query.cluster, error);
                    TaskResult::FetchFailed {
                        kind: ticket.kind,
                        wallet: account.wallet,
                        error,
                    }
                }
            };
            let _ = tx.send(message);
        });
    }
}
