//! Tokendrop: batch native coin and ERC-20 airdrops with before/after balance
//! preview.
//!
//! The core (`state`, `store`, `send_gate`, `session`) is independent of the
//! network; everything that talks to a node goes through [`ledger::Ledger`].

pub mod account;
pub mod config;
pub mod csv_import;
pub mod erc20;
pub mod evm_ledger;
pub mod format;
pub mod gui;
pub mod ledger;
pub mod operation_log;
pub mod refresh;
pub mod send_gate;
pub mod session;
pub mod state;
pub mod store;
pub mod types;
pub mod user_settings;
