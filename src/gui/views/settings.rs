//! Settings view: networks, refresh interval, signer, and the activity log.

use crate::activity_log;
use crate::config::{find_network_by_chain_id, HederaNetwork, NETWORKS};
use crate::gui::app::GuiApp;
use crate::user_settings::UserSettings;
use eframe::egui::{self, RichText};

const AUTO_REFRESH_CHOICES: [(u64, &str); 5] = [
    (0, "Off"),
    (15, "Every 15 seconds"),
    (30, "Every 30 seconds"),
    (60, "Every minute"),
    (300, "Every 5 minutes"),
];

fn auto_refresh_label(secs: u64) -> String {
    AUTO_REFRESH_CHOICES
        .iter()
        .find(|(s, _)| *s == secs)
        .map(|(_, label)| label.to_string())
        .unwrap_or_else(|| format!("Every {} seconds", secs))
}

impl GuiApp {
    pub(crate) fn view_settings(&mut self, ui: &mut egui::Ui) {
        self.render_section_header(ui, "[*]", "SETTINGS");
        ui.add_space(self.theme.spacing_md);

        let mut save_clicked = false;
        self.theme.frame_panel().show(ui, |ui| {
            ui.label(RichText::new("Hedera").size(16.0).strong());
            ui.add_space(self.theme.spacing_xs);
            egui::Grid::new("hedera_settings")
                .num_columns(2)
                .spacing([self.theme.spacing_md, self.theme.spacing_sm])
                .show(ui, |ui| {
                    ui.label("Network:");
                    egui::ComboBox::from_id_source("hedera_network")
                        .selected_text(self.settings_form.hedera_network.label())
                        .show_ui(ui, |ui| {
                            for network in HederaNetwork::ALL {
                                ui.selectable_value(&mut self.settings_form.hedera_network, network, network.label());
                            }
                        });
                    ui.end_row();

                    ui.label("Auto refresh:");
                    egui::ComboBox::from_id_source("auto_refresh")
                        .selected_text(auto_refresh_label(self.settings_form.auto_refresh_secs))
                        .show_ui(ui, |ui| {
                            for (secs, label) in AUTO_REFRESH_CHOICES {
                                ui.selectable_value(&mut self.settings_form.auto_refresh_secs, secs, label);
                            }
                        });
                    ui.end_row();
                });
            if self.env_config.mirror_node_url != self.env_config.network.mirror_node_url() {
                ui.label(
                    RichText::new(format!("MIRROR_NODE_URL is set to {}", self.env_config.mirror_node_url))
                        .small()
                        .color(self.theme.warning),
                );
            }

            ui.add_space(self.theme.spacing_md);
            ui.label(RichText::new("Ethereum").size(16.0).strong());
            ui.add_space(self.theme.spacing_xs);
            egui::Grid::new("evm_settings")
                .num_columns(2)
                .spacing([self.theme.spacing_md, self.theme.spacing_sm])
                .show(ui, |ui| {
                    ui.label("Network:");
                    let selected = find_network_by_chain_id(self.settings_form.evm_chain_id)
                        .map(|n| format!("{} (#{})", n.label, n.chain_id))
                        .unwrap_or_else(|| format!("Chain #{}", self.settings_form.evm_chain_id));
                    let mut picked = None;
                    egui::ComboBox::from_id_source("evm_network")
                        .selected_text(selected)
                        .width(220.0)
                        .show_ui(ui, |ui| {
                            for network in NETWORKS {
                                let label = format!("{} · {} · #{}", network.label, network.native_token, network.chain_id);
                                if ui
                                    .selectable_label(network.chain_id == self.settings_form.evm_chain_id, label)
                                    .clicked()
                                {
                                    picked = Some(network.chain_id);
                                }
                            }
                        });
                    if let Some(chain_id) = picked {
                        self.settings_form.evm_chain_id = chain_id;
                        self.settings_form.custom_rpc = self
                            .user_settings
                            .get_custom_rpc(chain_id)
                            .cloned()
                            .unwrap_or_default();
                    }
                    ui.end_row();

                    ui.label("Custom RPC:");
                    let default_rpc = find_network_by_chain_id(self.settings_form.evm_chain_id)
                        .map(|n| n.default_rpc)
                        .unwrap_or("https://");
                    ui.add(
                        egui::TextEdit::singleline(&mut self.settings_form.custom_rpc)
                            .hint_text(default_rpc)
                            .desired_width(320.0),
                    );
                    ui.end_row();

                    ui.label("Blocks to scan:");
                    ui.add(egui::DragValue::new(&mut self.settings_form.blocks_to_scan).clamp_range(1..=100));
                    ui.end_row();

                    ui.label("Signer:");
                    let signer = if self.config.evm.private_key.is_some() {
                        "Local key (ETH_PRIVATE_KEY)"
                    } else {
                        "Ledger"
                    };
                    ui.label(RichText::new(signer).color(self.theme.text_secondary));
                    ui.end_row();

                    ui.label("Ledger HD path:");
                    ui.add_enabled(
                        self.config.evm.private_key.is_none(),
                        egui::TextEdit::singleline(&mut self.settings_form.ledger_hd_path).desired_width(220.0),
                    );
                    ui.end_row();
                });

            ui.add_space(self.theme.spacing_md);
            if ui.add(self.theme.button_primary("Save Settings")).clicked() {
                save_clicked = true;
            }
        });
        if save_clicked {
            self.apply_settings();
        }

        ui.add_space(self.theme.spacing_lg);
        self.render_activity_log(ui);

        ui.add_space(self.theme.spacing_lg);
        self.theme.frame_surface().show(ui, |ui| {
            egui::Grid::new("about_grid")
                .num_columns(2)
                .spacing([self.theme.spacing_md, self.theme.spacing_xs])
                .show(ui, |ui| {
                    ui.label(RichText::new("Version:").color(self.theme.text_secondary));
                    ui.label(env!("CARGO_PKG_VERSION"));
                    ui.end_row();

                    ui.label(RichText::new("Settings file:").color(self.theme.text_secondary));
                    ui.label(RichText::new(UserSettings::settings_path_display()).small());
                    ui.end_row();

                    ui.label(RichText::new("Log file:").color(self.theme.text_secondary));
                    ui.label(RichText::new(activity_log::log_file_path()).small());
                    ui.end_row();
                });
        });
    }

    fn render_activity_log(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.label(RichText::new("[#] Activity Log").size(16.0).strong());
            let loading = self.log_view.job.is_some();
            if ui
                .add_enabled(!loading, self.theme.button_small(if loading { "[..]" } else { "Refresh" }))
                .clicked()
            {
                self.refresh_logs();
            }
        });
        if let Some(err) = &self.log_view.error {
            ui.label(RichText::new(err).color(self.theme.error));
        }
        self.theme.frame_surface().show(ui, |ui| {
            egui::ScrollArea::vertical()
                .id_source("activity_log")
                .max_height(240.0)
                .stick_to_bottom(true)
                .show(ui, |ui| {
                    ui.set_min_width(ui.available_width());
                    ui.label(RichText::new(&self.log_view.content).monospace().size(12.0));
                });
        });
    }
}
