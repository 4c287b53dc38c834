//! Main GUI application module
//!
//! Contains the GuiApp struct, its background job plumbing and the frame loop.

use crate::{
    account::{AccountRestoreForm, DerivationMode},
    config::{tokens_for_cluster, Cluster, Config},
    csv_import::{self, ImportSummary},
    evm_ledger::EthersLedger,
    operation_log,
    session::{DropSession, SessionEvent},
    state::AppState,
    user_settings::UserSettings,
};
use anyhow::{anyhow, Result};
use eframe::{egui, egui::RichText, App, Frame, NativeOptions};
use ethers::types::TxHash;
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;
use tokio::runtime::{Builder, Runtime};

use super::async_job::AsyncJob;
use super::notifications::NotificationEntry;
use super::theme::{configure_style, AppTheme};

const MAX_NOTIFICATIONS: usize = 50;

/// GUI section enum for navigation
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GuiSection {
    Drop,
    Account,
    Settings,
}

impl GuiSection {
    fn label(self) -> &'static str {
        match self {
            GuiSection::Drop => "Drop",
            GuiSection::Account => "Account",
            GuiSection::Settings => "Settings",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub(crate) enum RestoreKind {
    #[default]
    Mnemonic,
    PrivateKey,
}

#[derive(Default)]
pub(crate) struct AccountFormState {
    pub(crate) kind: RestoreKind,
    pub(crate) phrase: String,
    pub(crate) index: u32,
    pub(crate) mode: DerivationMode,
    pub(crate) private_key: String,
    /// Mnemonic of an account created this session, shown until dismissed
    pub(crate) revealed_phrase: Option<String>,
    pub(crate) error: Option<String>,
}

impl AccountFormState {
    pub(crate) fn to_form(&self) -> AccountRestoreForm {
        match self.kind {
            RestoreKind::Mnemonic => AccountRestoreForm::Mnemonic {
                phrase: self.phrase.clone(),
                index: self.index,
                mode: self.mode,
            },
            RestoreKind::PrivateKey => AccountRestoreForm::PrivateKey(self.private_key.clone()),
        }
    }

    pub(crate) fn clear_secrets(&mut self) {
        self.phrase.clear();
        self.private_key.clear();
        self.error = None;
    }
}

pub(crate) struct TokenFormState {
    pub(crate) address: String,
    pub(crate) symbol: String,
    pub(crate) name: String,
    pub(crate) decimals: u32,
}

impl Default for TokenFormState {
    fn default() -> Self {
        Self {
            address: String::new(),
            symbol: String::new(),
            name: String::new(),
            decimals: 18,
        }
    }
}

#[derive(Default)]
pub(crate) struct SettingsFormState {
    pub(crate) rpc_input: String,
    pub(crate) debounce_ms: u64,
    pub(crate) log_content: Option<String>,
}

/// Transactions of the most recent drop that sent anything, for explorer links.
pub(crate) struct LastDrop {
    pub(crate) cluster: Cluster,
    pub(crate) hashes: Vec<TxHash>,
}

pub struct GuiApp {
    pub(crate) config: Config,
    pub(crate) user_settings: UserSettings,
    pub(crate) session: DropSession,
    pub(crate) theme: AppTheme,
    pub(crate) section: GuiSection,
    pub(crate) notifications: VecDeque<NotificationEntry>,
    pub(crate) show_notifications_popup: bool,
    pub(crate) wallet_input: String,
    pub(crate) csv_job: Option<AsyncJob<ImportSummary>>,
    pub(crate) account_form: AccountFormState,
    pub(crate) token_form: TokenFormState,
    pub(crate) settings_form: SettingsFormState,
    pub(crate) last_drop: Option<LastDrop>,
    /// Runs the session's background fetches and transfers
    _runtime: Runtime,
}

impl GuiApp {
    fn new(config: Config, user_settings: UserSettings, runtime: Runtime, ctx: &egui::Context) -> Self {
        let theme = AppTheme::default();
        configure_style(ctx, &theme);

        let cluster = config.cluster;
        let token_address = tokens_for_cluster(cluster, &user_settings.custom_tokens)
            .first()
            .map(|t| t.address.clone())
            .unwrap_or_default();
        let state = AppState::new(cluster, user_settings.wallet_id.trim(), token_address);
        let ledger = Arc::new(EthersLedger::new(config.clone()));
        let mut session = DropSession::new(ledger, runtime.handle().clone(), state, config.balance_debounce);
        session.refresh_balance();

        let settings_form = SettingsFormState {
            rpc_input: user_settings.get_custom_rpc(cluster).cloned().unwrap_or_default(),
            debounce_ms: config.balance_debounce.as_millis() as u64,
            log_content: None,
        };

        Self {
            wallet_input: user_settings.wallet_id.clone(),
            config,
            user_settings,
            session,
            theme,
            section: GuiSection::Drop,
            notifications: VecDeque::with_capacity(20),
            show_notifications_popup: false,
            csv_job: None,
            account_form: AccountFormState::default(),
            token_form: TokenFormState::default(),
            settings_form,
            last_drop: None,
            _runtime: runtime,
        }
    }

    pub(crate) fn notify(&mut self, message: impl Into<String>) {
        self.notifications.push_back(NotificationEntry::new(message));
        while self.notifications.len() > MAX_NOTIFICATIONS {
            self.notifications.pop_front();
        }
    }

    pub(crate) fn save_settings(&mut self) {
        if let Err(e) = self.user_settings.save() {
            self.notify(format!("[XX] Failed to save settings: {}", e));
        }
    }

    pub(crate) fn open_url(&mut self, url: &str) {
        if let Err(e) = open::that(url) {
            self.notify(format!("Failed to open URL: {}", e));
        }
    }

    /// Rebuild the ledger after RPC overrides or custom tokens changed.
    pub(crate) fn rebuild_ledger(&mut self) {
        let mut config = Config::from_settings(&self.user_settings);
        config.cluster = self.session.state().cluster;
        self.session.set_ledger(Arc::new(EthersLedger::new(config.clone())));
        self.config = config;
    }

    pub(crate) fn change_cluster(&mut self, cluster: Cluster) {
        if cluster == self.session.state().cluster {
            return;
        }
        self.session.set_cluster(cluster);
        let token_address = tokens_for_cluster(cluster, &self.user_settings.custom_tokens)
            .first()
            .map(|t| t.address.clone())
            .unwrap_or_default();
        self.session.set_token_address(&token_address);
        self.config.cluster = cluster;
        self.settings_form.rpc_input = self.user_settings.get_custom_rpc(cluster).cloned().unwrap_or_default();
        self.user_settings.selected_cluster = cluster;
        self.save_settings();
        self.notify(format!("Switched to {}", cluster));
    }

    /// Persist the wallet field once it differs from what is saved.
    pub(crate) fn remember_wallet(&mut self) {
        let wallet = self.wallet_input.trim().to_string();
        if self.user_settings.wallet_id != wallet {
            self.user_settings.wallet_id = wallet;
            self.save_settings();
        }
    }

    pub(crate) fn spawn_job<T, FutBuilder, Fut>(&self, builder: FutBuilder) -> AsyncJob<T>
    where
        T: Send + 'static,
        FutBuilder: FnOnce() -> Fut + Send + 'static,
        Fut: std::future::Future<Output = Result<T>> + 'static,
    {
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let result = match Builder::new_current_thread().enable_all().build() {
                Ok(runtime) => runtime.block_on(builder()),
                Err(e) => Err(anyhow!("Failed to create async runtime: {}", e)),
            };
            let _ = tx.send(result);
        });
        AsyncJob::new(rx)
    }

    pub(crate) fn start_csv_import(&mut self, path: PathBuf) {
        tracing::info!("Importing recipients from {:?}", path);
        self.csv_job = Some(self.spawn_job(move || async move {
            csv_import::load_drop_csv(&path).map_err(anyhow::Error::from)
        }));
    }

    fn poll_jobs(&mut self) {
        for event in self.session.poll() {
            self.notifications.push_back(NotificationEntry::from(&event));
            if let Some((cluster, details)) = event.operation_log_entry() {
                if let Err(e) = operation_log::append_log("drop", cluster, details) {
                    tracing::warn!("Failed to write operation log: {}", e);
                }
            }
            match event {
                SessionEvent::DropSent { cluster, hashes, .. }
                | SessionEvent::DropPartiallySent { cluster, hashes, .. } => {
                    self.last_drop = Some(LastDrop { cluster, hashes });
                }
                _ => {}
            }
        }

        if let Some(job) = &mut self.csv_job {
            if let Some(result) = job.poll() {
                self.csv_job = None;
                match result {
                    Ok(summary) => {
                        let count = summary.accounts.len();
                        self.session.set_drop_accounts(summary.accounts);
                        if count == 0 {
                            self.notify("[!!] No recipients found in CSV file");
                        } else {
                            self.notify(format!("[OK] Loaded {} recipients from CSV file", count));
                        }
                        if summary.skipped > 0 {
                            self.notify(format!("[!!] Skipped {} rows with invalid amounts", summary.skipped));
                        }
                    }
                    Err(e) => self.notify(format!("[XX] Failed to load CSV file: {}", e)),
                }
            }
        }

        while self.notifications.len() > MAX_NOTIFICATIONS {
            self.notifications.pop_front();
        }
    }

    pub(crate) fn render_section_header(&self, ui: &mut egui::Ui, icon: &str, title: &str) {
        ui.label(
            RichText::new(self.theme.section_header_text(icon, title))
                .size(22.0)
                .strong()
                .color(self.theme.text_primary),
        );
        ui.separator();
    }

    fn render_top_bar(&mut self, ui: &mut egui::Ui) {
        ui.add_space(self.theme.spacing_sm);
        ui.horizontal_wrapped(|ui| {
            ui.heading(RichText::new("Tokendrop").strong().color(self.theme.primary));
            ui.label(
                RichText::new(format!("v{}", env!("CARGO_PKG_VERSION")))
                    .size(12.0)
                    .color(self.theme.text_secondary),
            );
            ui.add_space(self.theme.spacing_md);

            for section in [GuiSection::Drop, GuiSection::Account, GuiSection::Settings] {
                ui.selectable_value(&mut self.section, section, section.label());
            }

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                let current = self.session.state().cluster;
                let mut picked = None;
                egui::ComboBox::from_id_source("cluster_selector")
                    .selected_text(format!("{} ({})", current.label(), current.native_token()))
                    .width(200.0)
                    .show_ui(ui, |ui| {
                        for cluster in Cluster::all() {
                            let label = format!("{} · #{}", cluster.label(), cluster.chain_id());
                            if ui.selectable_label(cluster == current, label).clicked() {
                                picked = Some(cluster);
                            }
                        }
                    });
                if let Some(cluster) = picked {
                    self.change_cluster(cluster);
                }
            });
        });
        ui.add_space(self.theme.spacing_xs);
    }

    fn render_notifications(&mut self, ctx: &egui::Context) {
        let latest = self.notifications.back().map(|n| (n.message.clone(), n.time_ago()));
        let count = self.notifications.len();
        let theme = self.theme;

        egui::Area::new(egui::Id::new("notification_overlay"))
            .anchor(egui::Align2::RIGHT_BOTTOM, [-10.0, -10.0])
            .order(egui::Order::Foreground)
            .show(ctx, |ui| {
                theme.frame_panel().show(ui, |ui| {
                    ui.horizontal(|ui| {
                        if ui
                            .add(theme.button_small(&format!("[{}]", count)))
                            .on_hover_text("Show notification history")
                            .clicked()
                        {
                            self.show_notifications_popup = !self.show_notifications_popup;
                        }
                        match &latest {
                            Some((message, ago)) => {
                                ui.label(RichText::new(message).color(theme.text_primary));
                                ui.label(RichText::new(ago).small().color(theme.text_secondary));
                            }
                            None => {
                                ui.label(RichText::new("No notifications").color(theme.text_secondary));
                            }
                        }
                    });
                });
            });

        if self.show_notifications_popup {
            let mut open = true;
            let mut clear = false;
            egui::Window::new("Notifications")
                .open(&mut open)
                .default_width(420.0)
                .show(ctx, |ui| {
                    if ui.add(theme.button_small("Clear")).clicked() {
                        clear = true;
                    }
                    egui::ScrollArea::vertical().max_height(320.0).show(ui, |ui| {
                        for entry in self.notifications.iter().rev() {
                            ui.horizontal_wrapped(|ui| {
                                ui.label(RichText::new(entry.time_ago()).small().color(theme.text_secondary));
                                ui.label(&entry.message);
                            });
                        }
                    });
                });
            if clear {
                self.notifications.clear();
            }
            self.show_notifications_popup = open;
        }
    }
}

impl App for GuiApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut Frame) {
        self.poll_jobs();

        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            self.render_top_bar(ui);
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().auto_shrink([false, false]).show(ui, |ui| match self.section {
                GuiSection::Drop => self.view_drop(ui),
                GuiSection::Account => self.view_account(ui),
                GuiSection::Settings => self.view_settings(ui),
            });
        });

        self.render_notifications(ctx);

        // Background results only arrive through poll_jobs
        ctx.request_repaint_after(Duration::from_millis(250));
    }
}

pub fn launch(config: Config, user_settings: UserSettings) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("tokendrop-worker")
        .build()?;

    let app_creator = move |cc: &eframe::CreationContext<'_>| {
        Box::new(GuiApp::new(config, user_settings, runtime, &cc.egui_ctx)) as Box<dyn App>
    };

    let viewport = egui::ViewportBuilder::default()
        .with_inner_size([1100.0, 760.0])
        .with_min_inner_size([720.0, 480.0]);

    let native_options = NativeOptions {
        viewport,
        persist_window: true,
        ..Default::default()
    };

    eframe::run_native("Tokendrop", native_options, Box::new(app_creator))
        .map_err(|e| anyhow!("Failed to start GUI: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_form_to_mnemonic() {
        let form = AccountFormState {
            phrase: "word ".repeat(12),
            index: 4,
            mode: DerivationMode::AddressIndex,
            ..Default::default()
        };
        match form.to_form() {
            AccountRestoreForm::Mnemonic { index, mode, .. } => {
                assert_eq!(index, 4);
                assert_eq!(mode, DerivationMode::AddressIndex);
            }
            AccountRestoreForm::PrivateKey(_) => panic!("expected mnemonic form"),
        }
    }

    #[test]
    fn test_account_form_clear_secrets() {
        let mut form = AccountFormState {
            kind: RestoreKind::PrivateKey,
            phrase: "secret words".to_string(),
            private_key: "0xabc".to_string(),
            error: Some("bad key".to_string()),
            ..Default::default()
        };
        assert!(form.to_form() == AccountRestoreForm::PrivateKey("0xabc".to_string()));
        form.clear_secrets();
        assert!(form.phrase.is_empty());
        assert!(form.private_key.is_empty());
        assert!(form.error.is_none());
    }

    #[test]
    fn test_token_form_defaults_to_18_decimals() {
        assert_eq!(TokenFormState::default().decimals, 18);
    }
}
