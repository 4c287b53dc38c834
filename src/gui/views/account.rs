//! Account view implementation
//!
//! Creating a fresh signing account, restoring one from a mnemonic or private
//! key, and forgetting the current one.

use crate::account::DerivationMode;
use crate::gui::app::{GuiApp, RestoreKind};
use eframe::egui::{self, RichText};

impl GuiApp {
    /// Render the account view
    pub(crate) fn view_account(&mut self, ui: &mut egui::Ui) {
        self.render_section_header(ui, "[#]", "ACCOUNT");
        ui.add_space(self.theme.spacing_md);

        self.render_current_account(ui);
        ui.add_space(self.theme.spacing_md);

        if self.account_form.revealed_phrase.is_some() {
            self.render_revealed_phrase(ui);
            ui.add_space(self.theme.spacing_md);
        }

        self.render_restore_form(ui);
    }

    fn render_current_account(&mut self, ui: &mut egui::Ui) {
        let theme = self.theme;
        theme.frame_panel().show(ui, |ui| {
            ui.label(RichText::new("Signing account").size(18.0).strong());
            ui.add_space(theme.spacing_sm);

            match self.session.account().map(|a| a.address_string()) {
                Some(address) => {
                    ui.horizontal(|ui| {
                        ui.monospace(&address);
                        if ui.add(theme.button_small("Copy")).clicked() {
                            ui.output_mut(|o| o.copied_text = address.clone());
                        }
                        if ui
                            .add(theme.button_small("Forget"))
                            .on_hover_text("Drop the signing account from this session")
                            .clicked()
                        {
                            self.session.set_account(None);
                            self.account_form.revealed_phrase = None;
                            self.notify("Signing account cleared");
                        }
                    });
                }
                None => {
                    ui.label(
                        RichText::new("No signing account. Create or restore one to send drops.")
                            .color(theme.text_secondary),
                    );
                }
            }

            ui.add_space(theme.spacing_sm);
            if ui
                .add(theme.button_primary("Create account"))
                .on_hover_text("Generate a new 12-word mnemonic and use its first account")
                .clicked()
            {
                match self.session.create_account() {
                    Ok(info) => {
                        self.wallet_input = info.address_string();
                        self.remember_wallet();
                        self.account_form.revealed_phrase = info.phrase.clone();
                        self.notify(format!("[OK] Created account {}", info.address_string()));
                    }
                    Err(e) => self.notify(format!("[XX] Failed to create account: {}", e)),
                }
            }
        });
    }

    fn render_revealed_phrase(&mut self, ui: &mut egui::Ui) {
        let theme = self.theme;
        let phrase = self.account_form.revealed_phrase.clone().unwrap_or_default();
        theme.frame_panel().show(ui, |ui| {
            ui.label(
                RichText::new("Write these words down. They are not stored and will not be shown again.")
                    .color(theme.warning)
                    .strong(),
            );
            ui.add_space(theme.spacing_xs);
            ui.label(RichText::new(&phrase).monospace().size(15.0));
            ui.add_space(theme.spacing_sm);
            if ui.add(theme.button_secondary("I saved it")).clicked() {
                self.account_form.revealed_phrase = None;
            }
        });
    }

    fn render_restore_form(&mut self, ui: &mut egui::Ui) {
        let theme = self.theme;
        theme.frame_panel().show(ui, |ui| {
            ui.label(RichText::new("Restore account").size(18.0).strong());
            ui.add_space(theme.spacing_sm);

            ui.horizontal(|ui| {
                ui.radio_value(&mut self.account_form.kind, RestoreKind::Mnemonic, "Mnemonic");
                ui.radio_value(&mut self.account_form.kind, RestoreKind::PrivateKey, "Private key");
            });
            ui.add_space(theme.spacing_xs);

            egui::Grid::new("restore_account_grid")
                .num_columns(2)
                .spacing([12.0, 8.0])
                .show(ui, |ui| match self.account_form.kind {
                    RestoreKind::Mnemonic => {
                        ui.label("Phrase:");
                        ui.add(
                            egui::TextEdit::multiline(&mut self.account_form.phrase)
                                .hint_text("twelve or twenty-four words")
                                .desired_rows(2)
                                .desired_width(420.0),
                        );
                        ui.end_row();

                        ui.label("Derivation:");
                        let current = self.account_form.mode;
                        egui::ComboBox::from_id_source("derivation_mode")
                            .selected_text(current.label())
                            .show_ui(ui, |ui| {
                                for mode in [DerivationMode::AccountIndex, DerivationMode::AddressIndex] {
                                    ui.selectable_value(&mut self.account_form.mode, mode, mode.label());
                                }
                            });
                        ui.end_row();

                        ui.label("Index:");
                        ui.horizontal(|ui| {
                            ui.add(egui::DragValue::new(&mut self.account_form.index).clamp_range(0..=9999));
                            ui.label(
                                RichText::new(self.account_form.mode.get_path(self.account_form.index))
                                    .monospace()
                                    .color(theme.text_secondary),
                            );
                        });
                        ui.end_row();
                    }
                    RestoreKind::PrivateKey => {
                        ui.label("Private key:");
                        ui.add(
                            egui::TextEdit::singleline(&mut self.account_form.private_key)
                                .password(true)
                                .hint_text("0x...")
                                .desired_width(420.0),
                        );
                        ui.end_row();
                    }
                });

            ui.add_space(theme.spacing_sm);
            if ui.add(theme.button_primary("Restore")).clicked() {
                let form = self.account_form.to_form();
                match self.session.restore_account(&form) {
                    Ok(info) => {
                        self.account_form.clear_secrets();
                        self.account_form.revealed_phrase = None;
                        self.wallet_input = info.address_string();
                        self.remember_wallet();
                        self.notify(format!("[OK] Restored account {}", info.address_string()));
                    }
                    Err(e) => self.account_form.error = Some(e.to_string()),
                }
            }

            if let Some(error) = &self.account_form.error {
                ui.label(RichText::new(error).color(theme.error));
            }
        });
    }
}
