//! Single-writer store around the reducer.
//!
//! User intent enters through [`Store::dispatch`]. Results of background
//! fetches enter through [`Store::observe`], each tagged with the generation it
//! was issued against. Actions that change what a fetch would return (wallet,
//! cluster, token, mode, drop list, signing account) bump the relevant counter,
//! so a result that lands after such a change is discarded instead of
//! overwriting a newer observation.

use crate::state::{reduce, AppAction, AppState};
use crate::types::{DropAccountBalance, WalletBalance};
use std::mem;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

pub type Generation = u64;

/// Monotonic counter shared with background tasks so they can tell whether
/// the work they were started for is still wanted.
#[derive(Debug, Clone, Default)]
pub struct GenerationCounter(Arc<AtomicU64>);

impl GenerationCounter {
    pub fn current(&self) -> Generation {
        self.0.load(Ordering::SeqCst)
    }

    pub fn is_current(&self, generation: Generation) -> bool {
        self.current() == generation
    }

    fn bump(&self) -> Generation {
        self.0.fetch_add(1, Ordering::SeqCst) + 1
    }
}

/// Which family of fetches a ticket belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchKind {
    WalletBalance,
    Before,
    After,
}

/// Handed to a fetch when it is issued and returned with its result.
#[derive(Debug, Clone)]
pub struct Ticket {
    pub kind: FetchKind,
    pub generation: Generation,
    counter: GenerationCounter,
}

impl Ticket {
    /// False once a newer fetch of the same kind was issued or the state it
    /// was issued against changed.
    pub fn is_current(&self) -> bool {
        self.counter.is_current(self.generation)
    }
}

/// A fetch result waiting to be applied.
#[derive(Debug, Clone)]
pub enum Observation {
    WalletBalance(Ticket, WalletBalance),
    DropAccountBefore(Ticket, DropAccountBalance),
    DropAccountAfter(Ticket, DropAccountBalance),
}

impl Observation {
    fn into_parts(self) -> (Ticket, AppAction) {
        match self {
            Observation::WalletBalance(ticket, balance) => (ticket, AppAction::SetBalance(balance)),
            Observation::DropAccountBefore(ticket, record) => (ticket, AppAction::SetDropAccountBefore(record)),
            Observation::DropAccountAfter(ticket, record) => (ticket, AppAction::SetDropAccountAfter(record)),
        }
    }
}

pub struct Store {
    state: AppState,
    balance: GenerationCounter,
    before: GenerationCounter,
    after: GenerationCounter,
    /// Balance generation at which `state.balance` was last observed
    balance_observed_at: Option<Generation>,
}

impl Store {
    pub fn new(state: AppState) -> Self {
        Self {
            state,
            balance: GenerationCounter::default(),
            before: GenerationCounter::default(),
            after: GenerationCounter::default(),
            balance_observed_at: None,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    fn counter(&self, kind: FetchKind) -> &GenerationCounter {
        match kind {
            FetchKind::WalletBalance => &self.balance,
            FetchKind::Before => &self.before,
            FetchKind::After => &self.after,
        }
    }

    fn apply(&mut self, action: AppAction) {
        tracing::debug!(action = action.kind(), "reduce");
        let state = mem::replace(&mut self.state, AppState::new(Default::default(), "", ""));
        self.state = reduce(state, action);
    }

    /// Apply user intent, invalidating in-flight fetches it makes stale.
    pub fn dispatch(&mut self, action: AppAction) {
        match &action {
            AppAction::SetWallet(_) => {
                self.balance.bump();
            }
            AppAction::SetCluster(_) => {
                self.balance.bump();
                self.invalidate_snapshots();
            }
            AppAction::SetTokenAddress(_) | AppAction::SetMode(_) | AppAction::SetDropAccounts(_) => {
                self.invalidate_snapshots();
            }
            AppAction::SetBalance(_) => {
                self.balance_observed_at = Some(self.balance.current());
            }
            AppAction::SetDropAccountBefore(_) | AppAction::SetDropAccountAfter(_) => {}
        }
        self.apply(action);
    }

    /// Drop every in-flight before/after fetch. Used when the signing account
    /// changes as well as by `dispatch`.
    pub fn invalidate_snapshots(&mut self) {
        self.before.bump();
        self.after.bump();
    }

    /// Start a new fetch of `kind`, superseding any older one still in flight.
    pub fn issue(&mut self, kind: FetchKind) -> Ticket {
        let counter = self.counter(kind).clone();
        let generation = counter.bump();
        Ticket {
            kind,
            generation,
            counter,
        }
    }

    /// Apply a fetch result if its ticket is still current. Returns whether it
    /// was applied.
    pub fn observe(&mut self, observation: Observation) -> bool {
        let (ticket, action) = observation.into_parts();
        if !ticket.is_current() {
            tracing::debug!(
                action = action.kind(),
                issued = ticket.generation,
                current = ticket.counter.current(),
                "discarding stale observation"
            );
            return false;
        }
        if ticket.kind == FetchKind::WalletBalance {
            self.balance_observed_at = Some(ticket.generation);
        }
        self.apply(action);
        true
    }

    /// Whether `state().balance` was observed for the current wallet and cluster.
    pub fn balance_is_current(&self) -> bool {
        self.balance_observed_at == Some(self.balance.current())
    }
}
