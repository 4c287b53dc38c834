//! View modules for the GUI
//!
//! Each submodule adds rendering methods to `GuiApp` for one part of the window.
//!
//! ## Module Structure
//!
//! - `drop` - Funding wallet, asset selection, CSV import and the recipient table
//! - `send_panel` - Drop total, send gating status and the send buttons
//! - `token_picker` - Token selection for token drops
//! - `account` - Signing account creation and restore
//! - `settings` - RPC overrides, refresh delay, custom tokens and files
//!
//! These methods are called from the main `App::update` method in `app.rs`.

pub mod account;
pub mod drop_table;
pub mod send_panel;
pub mod settings;
pub mod token_picker;
