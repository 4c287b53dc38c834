//! Settings view implementation
//!
//! Contains the settings panel rendering including:
//! - RPC override for the active cluster
//! - Balance refresh delay
//! - Custom token management
//! - Settings and operation log files

use crate::config::{tokens_for_cluster, TokenInfo};
use crate::evm_ledger::parse_address;
use crate::gui::app::GuiApp;
use crate::operation_log;
use crate::user_settings::UserSettings;
use eframe::egui::{self, RichText};
use std::time::Duration;

impl GuiApp {
    /// Render the settings view
    pub(crate) fn view_settings(&mut self, ui: &mut egui::Ui) {
        self.render_section_header(ui, "[*]", "SETTINGS");
        ui.add_space(self.theme.spacing_md);

        self.render_network_settings(ui);
        ui.add_space(self.theme.spacing_md);

        self.render_refresh_settings(ui);
        ui.add_space(self.theme.spacing_md);

        self.render_token_settings(ui);
        ui.add_space(self.theme.spacing_md);

        self.render_file_settings(ui);
    }

    fn render_network_settings(&mut self, ui: &mut egui::Ui) {
        let theme = self.theme;
        let cluster = self.session.state().cluster;
        let default_rpc = cluster.info().default_rpc;

        theme.frame_panel().show(ui, |ui| {
            ui.label(RichText::new("Network & RPC").size(18.0).strong());
            ui.add_space(theme.spacing_sm);

            egui::Grid::new("network_settings_grid")
                .num_columns(2)
                .spacing([12.0, 8.0])
                .show(ui, |ui| {
                    ui.label("Cluster:");
                    ui.label(format!("{} (chain id {})", cluster.label(), cluster.chain_id()));
                    ui.end_row();

                    ui.label("Default RPC:");
                    ui.monospace(default_rpc);
                    ui.end_row();

                    ui.label("Custom RPC:");
                    ui.add(
                        egui::TextEdit::singleline(&mut self.settings_form.rpc_input)
                            .hint_text("leave empty to use the default")
                            .desired_width(380.0),
                    );
                    ui.end_row();
                });

            ui.add_space(theme.spacing_sm);
            ui.horizontal(|ui| {
                if ui.add(theme.button_small("Save")).clicked() {
                    let input = self.settings_form.rpc_input.trim().to_string();
                    if !input.is_empty() && url::Url::parse(&input).is_err() {
                        self.notify(format!("[XX] Invalid RPC URL: {}", input));
                    } else {
                        self.user_settings.set_custom_rpc(cluster, input);
                        self.save_settings();
                        self.rebuild_ledger();
                        self.notify(format!("[OK] RPC for {} updated", cluster));
                    }
                }
                if ui.add(theme.button_small("Reset")).clicked() {
                    self.settings_form.rpc_input.clear();
                    self.user_settings.set_custom_rpc(cluster, String::new());
                    self.save_settings();
                    self.rebuild_ledger();
                    self.notify(format!("RPC for {} reset to default", cluster));
                }
            });
        });
    }

    fn render_refresh_settings(&mut self, ui: &mut egui::Ui) {
        let theme = self.theme;
        theme.frame_panel().show(ui, |ui| {
            ui.label(RichText::new("Balance refresh").size(18.0).strong());
            ui.add_space(theme.spacing_sm);
            ui.horizontal(|ui| {
                ui.label("Delay after typing:");
                ui.add(
                    egui::DragValue::new(&mut self.settings_form.debounce_ms)
                        .clamp_range(0..=10_000)
                        .suffix(" ms"),
                );
                if ui.add(theme.button_small("Apply")).clicked() {
                    let ms = self.settings_form.debounce_ms;
                    self.user_settings.balance_debounce_ms = ms;
                    self.config.balance_debounce = Duration::from_millis(ms);
                    self.session.set_balance_debounce(Duration::from_millis(ms));
                    self.save_settings();
                }
            });
        });
    }

    fn render_token_settings(&mut self, ui: &mut egui::Ui) {
        let theme = self.theme;
        let cluster = self.session.state().cluster;
        let custom: Vec<TokenInfo> = self
            .user_settings
            .custom_tokens
            .iter()
            .filter(|t| t.cluster == cluster)
            .cloned()
            .collect();
        let builtin_count = tokens_for_cluster(cluster, &[]).len();

        theme.frame_panel().show(ui, |ui| {
            ui.label(RichText::new("Custom tokens").size(18.0).strong());
            ui.label(
                RichText::new(format!("{} built-in tokens on {}", builtin_count, cluster))
                    .color(theme.text_secondary),
            );
            ui.add_space(theme.spacing_sm);

            let mut removed = None;
            for token in &custom {
                ui.horizontal(|ui| {
                    ui.label(RichText::new(&token.symbol).strong());
                    ui.label(&token.name);
                    ui.monospace(&token.address);
                    ui.label(format!("{} decimals", token.decimals));
                    if ui.add(theme.button_small("Remove")).clicked() {
                        removed = Some(token.address.clone());
                    }
                });
            }
            if let Some(address) = removed {
                if self.user_settings.remove_custom_token(cluster, &address) {
                    self.save_settings();
                    self.rebuild_ledger();
                    self.notify("Custom token removed");
                }
            }

            ui.add_space(theme.spacing_sm);
            egui::Grid::new("custom_token_grid")
                .num_columns(2)
                .spacing([12.0, 8.0])
                .show(ui, |ui| {
                    ui.label("Address:");
                    ui.add(
                        egui::TextEdit::singleline(&mut self.token_form.address)
                            .hint_text("0x...")
                            .desired_width(380.0),
                    );
                    ui.end_row();

                    ui.label("Symbol:");
                    ui.text_edit_singleline(&mut self.token_form.symbol);
                    ui.end_row();

                    ui.label("Name:");
                    ui.text_edit_singleline(&mut self.token_form.name);
                    ui.end_row();

                    ui.label("Decimals:");
                    ui.add(egui::DragValue::new(&mut self.token_form.decimals).clamp_range(1..=36));
                    ui.end_row();
                });

            if ui.add(theme.button_small("Add")).clicked() {
                self.add_custom_token_from_form(cluster);
            }
        });
    }

    fn add_custom_token_from_form(&mut self, cluster: crate::config::Cluster) {
        let address = self.token_form.address.trim().to_string();
        if let Err(e) = parse_address(&address) {
            self.notify(format!("[XX] {}", e));
            return;
        }
        let symbol = self.token_form.symbol.trim();
        if symbol.is_empty() {
            self.notify("[XX] Token symbol is required");
            return;
        }
        let name = match self.token_form.name.trim() {
            "" => symbol,
            name => name,
        };
        let token = TokenInfo::new(cluster, &address, symbol, name, self.token_form.decimals);
        if self.user_settings.add_custom_token(token) {
            self.token_form = Default::default();
            self.save_settings();
            self.rebuild_ledger();
            self.notify(format!("[OK] Added token {}", address));
        } else {
            self.notify(format!("[!!] Token {} is already known on {}", address, cluster));
        }
    }

    fn render_file_settings(&mut self, ui: &mut egui::Ui) {
        let theme = self.theme;
        theme.frame_panel().show(ui, |ui| {
            ui.label(RichText::new("Files").size(18.0).strong());
            ui.add_space(theme.spacing_sm);

            egui::Grid::new("file_settings_grid")
                .num_columns(2)
                .spacing([12.0, 8.0])
                .show(ui, |ui| {
                    ui.label("Settings:");
                    ui.monospace(UserSettings::settings_path_display());
                    ui.end_row();

                    ui.label("Operation log:");
                    ui.monospace(operation_log::log_file_path());
                    ui.end_row();
                });

            ui.add_space(theme.spacing_sm);
            let label = if self.settings_form.log_content.is_some() {
                "Hide log"
            } else {
                "Show log"
            };
            if ui.add(theme.button_small(label)).clicked() {
                if self.settings_form.log_content.is_some() {
                    self.settings_form.log_content = None;
                } else {
                    match operation_log::read_log() {
                        Ok(content) => self.settings_form.log_content = Some(content),
                        Err(e) => self.notify(format!("[XX] Failed to read operation log: {}", e)),
                    }
                }
            }

            if let Some(content) = &self.settings_form.log_content {
                egui::ScrollArea::vertical()
                    .id_source("operation_log_scroll")
                    .max_height(240.0)
                    .show(ui, |ui| {
                        if content.is_empty() {
                            ui.label(RichText::new("No operations logged yet").color(theme.text_secondary));
                        } else {
                            ui.monospace(content);
                        }
                    });
            }
        });
    }
}
