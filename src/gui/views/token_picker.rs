//! Token selection for token drops.

use crate::config::tokens_for_cluster;
use crate::format::short_address;
use crate::gui::app::GuiApp;
use eframe::egui;

impl GuiApp {
    pub(crate) fn render_token_picker(&mut self, ui: &mut egui::Ui) {
        let state = self.session.state();
        let tokens = tokens_for_cluster(state.cluster, &self.user_settings.custom_tokens);
        let current = state.token_address.clone();

        let selected_text = tokens
            .iter()
            .find(|t| t.address.eq_ignore_ascii_case(&current))
            .map(|t| format!("{} ({})", t.symbol, t.name))
            .unwrap_or_else(|| {
                if current.is_empty() {
                    "Select token".to_string()
                } else {
                    short_address(&current)
                }
            });

        let mut picked = None;
        egui::ComboBox::from_id_source("token_picker")
            .selected_text(selected_text)
            .width(260.0)
            .show_ui(ui, |ui| {
                if tokens.is_empty() {
                    ui.label("No tokens on this cluster. Add one in Settings.");
                }
                for token in &tokens {
                    let selected = token.address.eq_ignore_ascii_case(&current);
                    if ui
                        .selectable_label(selected, format!("{} · {}", token.symbol, token.name))
                        .on_hover_text(&token.address)
                        .clicked()
                    {
                        picked = Some(token.address.clone());
                    }
                }
            });

        if let Some(address) = picked {
            self.session.set_token_address(&address);
        }
    }
}
