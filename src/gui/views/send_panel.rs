//! Send panel: drop total, gating status and the send buttons.

use crate::config::get_tx_explorer_url;
use crate::gui::app::GuiApp;
use crate::gui::helpers::{amount_label, asset_display};
use crate::send_gate::{total_drop, SendGate};
use crate::types::DropMode;
use eframe::egui::{self, RichText};

/// Status line shown under the drop total.
pub(crate) fn gate_status_text(gate: &SendGate, decimals: u32, symbol: &str) -> String {
    match gate {
        SendGate::Enabled { .. } => "Ready to send".to_string(),
        SendGate::NothingToSend => "All good".to_string(),
        SendGate::InsufficientFunds { shortfall, .. } => {
            format!("Insufficient funds: short by {}", amount_label(*shortfall, decimals, symbol))
        }
        SendGate::NoSigningAccount => "Need a signing account".to_string(),
    }
}

impl GuiApp {
    pub(crate) fn render_send_panel(&mut self, ui: &mut egui::Ui) {
        let theme = self.theme;
        let gate = self.session.send_gate();
        let state = self.session.state();
        let cluster = state.cluster;
        let total = total_drop(state);
        let (decimals, symbol) = asset_display(state, &self.user_settings.custom_tokens);
        let in_flight = self.session.drop_in_flight();
        let funding = self.session.funding_in_flight();
        let minting = self.session.minting_in_flight();
        let token_mode = state.mode == DropMode::Token;
        let has_account = self.session.account().is_some();

        theme.frame_panel().show(ui, |ui| {
            ui.horizontal(|ui| {
                ui.label("Total:");
                ui.label(RichText::new(amount_label(total, decimals, &symbol)).strong());
            });
            ui.label(RichText::new(gate_status_text(&gate, decimals, &symbol)).color(theme.gate_color(&gate)));
            ui.add_space(theme.spacing_sm);

            ui.horizontal(|ui| {
                let label = if in_flight { "Sending..." } else { "Send drop" };
                if ui
                    .add_enabled(gate.is_enabled() && !in_flight, theme.button_primary(label))
                    .clicked()
                {
                    match self.session.drop() {
                        Ok(()) => self.notify(format!("Drop submitted on {}", cluster)),
                        Err(e) => self.notify(format!("[XX] {}", e)),
                    }
                }
                if in_flight {
                    ui.spinner();
                }

                if cluster.supports_dev_funding() {
                    if ui
                        .add_enabled(has_account && !funding, theme.button_secondary("Fund signer"))
                        .on_hover_text("Add 1 ETH to the signing account on this dev node")
                        .clicked()
                    {
                        if let Err(e) = self.session.drop_dev() {
                            self.notify(format!("[XX] {}", e));
                        }
                    }
                    if funding {
                        ui.spinner();
                    }
                    if token_mode {
                        if ui
                            .add_enabled(has_account && !minting, theme.button_secondary("Mint tokens"))
                            .on_hover_text("Credit the signing account with the selected token on this dev node")
                            .clicked()
                        {
                            if let Err(e) = self.session.mint_dev() {
                                self.notify(format!("[XX] {}", e));
                            }
                        }
                        if minting {
                            ui.spinner();
                        }
                    }
                }
            });

            let mut open_url = None;
            if let Some(last) = &self.last_drop {
                ui.add_space(theme.spacing_sm);
                ui.label(RichText::new("Last drop").color(theme.text_secondary));
                for hash in &last.hashes {
                    let hash = format!("{:?}", hash);
                    match get_tx_explorer_url(last.cluster, &hash) {
                        Some(url) => {
                            if ui.link(RichText::new(&hash).monospace()).clicked() {
                                open_url = Some(url);
                            }
                        }
                        None => {
                            ui.monospace(&hash);
                        }
                    }
                }
            }
            if let Some(url) = open_url {
                self.open_url(&url);
            }
        });
    }
}
