//! GUI module for the Tokendrop application
//!
//! This module provides the graphical user interface built with egui/eframe.
//!
//! ## Module Structure
//!
//! - `app` - Main GuiApp struct, form state, and the frame loop
//! - `async_job` - Generic async job polling for background tasks
//! - `theme` - Centralized theme and styling system (AppTheme)
//! - `helpers` - Amount, snapshot and holding labels for the drop table
//! - `notifications` - Notification entries built from session events
//! - `views` - View rendering functions (drop, send panel, token picker, account, settings)
//!
//! ## Usage
//!
//! ```no_run
//! use tokendrop::config::Config;
//! use tokendrop::gui;
//! use tokendrop::user_settings::UserSettings;
//!
//! let settings = UserSettings::load();
//! let config = Config::from_settings(&settings);
//! gui::launch(config, settings).expect("Failed to launch GUI");
//! ```

mod app;
pub mod async_job;
pub mod helpers;
pub mod notifications;
pub mod theme;
pub mod views;

pub use app::{launch, GuiApp, GuiSection};

pub use async_job::AsyncJob;
pub use notifications::NotificationEntry;
pub use theme::{configure_style, AppTheme};
