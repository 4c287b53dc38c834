//! Drop view implementation
//!
//! Funding wallet input and balance, native/token mode, CSV import and the
//! recipient table with before/after snapshots.

use crate::config::{get_address_explorer_url, NATIVE_DECIMALS};
use crate::format;
use crate::gui::app::GuiApp;
use crate::gui::helpers::{amount_label, asset_display, holding_label, snapshot_label};
use crate::types::{DropMode, PopulatedDropAccount};
use eframe::egui::{self, RichText};
use egui_extras::{Column, TableBuilder};

impl GuiApp {
    /// Render the drop view
    pub(crate) fn view_drop(&mut self, ui: &mut egui::Ui) {
        self.render_section_header(ui, "[>]", "DROP");
        ui.add_space(self.theme.spacing_sm);

        self.render_wallet_panel(ui);
        ui.add_space(self.theme.spacing_md);

        self.render_asset_selector(ui);
        ui.add_space(self.theme.spacing_md);

        self.render_recipients(ui);
        ui.add_space(self.theme.spacing_md);

        self.render_send_panel(ui);
    }

    fn render_wallet_panel(&mut self, ui: &mut egui::Ui) {
        let theme = self.theme;
        theme.frame_panel().show(ui, |ui| {
            ui.horizontal(|ui| {
                ui.label("Funding wallet:");
                let response = ui.add(
                    egui::TextEdit::singleline(&mut self.wallet_input)
                        .hint_text("0x...")
                        .font(egui::TextStyle::Monospace)
                        .desired_width(400.0),
                );
                if response.changed() {
                    self.session.set_wallet(&self.wallet_input);
                }
                if response.lost_focus() {
                    self.remember_wallet();
                }
                if ui
                    .add(theme.button_small("Refresh"))
                    .on_hover_text("Fetch the wallet balance again")
                    .clicked()
                {
                    self.session.refresh_balance();
                }
            });

            ui.add_space(theme.spacing_xs);
            let state = self.session.state();
            let cluster = state.cluster;
            let wallet = state.balance.id.clone();
            if wallet.is_empty() {
                ui.label(RichText::new("Enter the wallet the drop is funded from").color(theme.text_secondary));
                return;
            }

            let mut open_url = None;
            ui.horizontal(|ui| {
                if self.session.balance_is_current() {
                    let state = self.session.state();
                    ui.label(amount_label(state.balance.native_amount, NATIVE_DECIMALS, cluster.native_token()));
                    if state.mode == DropMode::Token {
                        let (decimals, symbol) = asset_display(state, &self.user_settings.custom_tokens);
                        let available = state.balance.available(state.mode, &state.token_address);
                        ui.label("|");
                        ui.label(amount_label(available, decimals, &symbol));
                    }
                } else {
                    ui.spinner();
                    ui.label(RichText::new("Loading balance").color(theme.text_secondary));
                }
                if let Some(url) = get_address_explorer_url(cluster, &wallet) {
                    if ui.link("View in explorer").clicked() {
                        open_url = Some(url);
                    }
                }
            });
            if let Some(url) = open_url {
                self.open_url(&url);
            }
        });
    }

    fn render_asset_selector(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.label("Send:");
            let state = self.session.state();
            let current = state.mode;
            let mut mode = current;
            ui.selectable_value(&mut mode, DropMode::Native, state.cluster.native_token());
            ui.selectable_value(&mut mode, DropMode::Token, "Token");
            if mode != current {
                self.session.set_mode(mode);
            }
            if mode == DropMode::Token {
                ui.add_space(self.theme.spacing_sm);
                self.render_token_picker(ui);
            }
        });
    }

    fn render_recipients(&mut self, ui: &mut egui::Ui) {
        let theme = self.theme;
        let loading = self.csv_job.as_ref().map(|job| job.is_running()).unwrap_or(false);
        let count = self.session.state().drop_accounts.len();

        ui.horizontal(|ui| {
            if ui
                .add_enabled(!loading, theme.button_primary("Load CSV"))
                .on_hover_text("CSV with a header row and wallet,drop columns. Amounts are in the smallest unit.")
                .clicked()
            {
                if let Some(path) = rfd::FileDialog::new().add_filter("CSV files", &["csv"]).pick_file() {
                    self.start_csv_import(path);
                }
            }
            if loading {
                ui.spinner();
            }
            if count > 0 && ui.add(theme.button_small("Clear")).clicked() {
                self.session.set_drop_accounts(Vec::new());
            }
            ui.label(RichText::new(format!("{} recipients", count)).color(theme.text_secondary));
        });
        ui.add_space(theme.spacing_sm);

        self.render_drop_table(ui);
    }

    fn render_drop_table(&mut self, ui: &mut egui::Ui) {
        let state = self.session.state();
        if state.drop_populated_accounts.is_empty() {
            ui.label(RichText::new("No recipients loaded").color(self.theme.text_secondary));
            return;
        }

        let cluster = state.cluster;
        let (decimals, symbol) = asset_display(state, &self.user_settings.custom_tokens);
        let rows: Vec<PopulatedDropAccount> = state.drop_populated_accounts.clone();
        let mut open_url = None;

        TableBuilder::new(ui)
            .striped(true)
            .resizable(true)
            .cell_layout(egui::Layout::left_to_right(egui::Align::Center))
            .column(Column::initial(340.0).at_least(120.0))
            .column(Column::initial(120.0).at_least(60.0))
            .column(Column::initial(120.0).at_least(60.0))
            .column(Column::initial(120.0).at_least(60.0))
            .column(Column::remainder().at_least(90.0))
            .max_scroll_height(360.0)
            .header(22.0, |mut header| {
                header.col(|ui| {
                    ui.strong("Wallet");
                });
                header.col(|ui| {
                    ui.strong(format!("Drop ({})", symbol));
                });
                header.col(|ui| {
                    ui.strong("Before");
                });
                header.col(|ui| {
                    ui.strong("After");
                });
                header.col(|ui| {
                    ui.strong("Holding");
                });
            })
            .body(|body| {
                body.rows(20.0, rows.len(), |mut row| {
                    let account = &rows[row.index()];
                    row.col(|ui| match get_address_explorer_url(cluster, &account.wallet) {
                        Some(url) => {
                            if ui.link(RichText::new(&account.wallet).monospace()).clicked() {
                                open_url = Some(url);
                            }
                        }
                        None => {
                            ui.monospace(&account.wallet);
                        }
                    });
                    row.col(|ui| {
                        ui.label(format::human_amount(account.drop, decimals));
                    });
                    row.col(|ui| {
                        ui.label(snapshot_label(account.before.as_ref(), decimals));
                    });
                    row.col(|ui| {
                        ui.label(snapshot_label(account.after.as_ref(), decimals));
                    });
                    row.col(|ui| {
                        ui.monospace(holding_label(account));
                    });
                });
            });

        if let Some(url) = open_url {
            self.open_url(&url);
        }
    }
}
