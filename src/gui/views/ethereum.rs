//! Ethereum variant: wallet connection, send form and the scanned feed.

use crate::gui::app::{GuiApp, GuiSection};
use crate::gui::widgets::{empty_state, evm_row, filter_bar, stat_cards, status_banner};
use eframe::egui::{self, RichText};

impl GuiApp {
    pub(crate) fn view_ethereum(&mut self, ui: &mut egui::Ui) {
        self.render_section_header(ui, "[E]", "ETHEREUM TRANSACTIONS");
        ui.label(
            RichText::new(format!(
                "{} (chain {}) - {}",
                self.config.evm.network_label(),
                self.config.evm.chain_id,
                self.config.evm.rpc_url
            ))
            .small()
            .color(self.theme.text_secondary),
        );
        ui.add_space(self.theme.spacing_md);

        let Some(account) = self.ethereum.account() else {
            self.render_connect_panel(ui);
            return;
        };

        self.theme.frame_panel().show(ui, |ui| {
            ui.horizontal(|ui| {
                ui.label(RichText::new("Connected:").color(self.theme.text_secondary));
                let address = format!("{:?}", account);
                ui.label(RichText::new(&address).monospace().strong());
                if ui.add(egui::Button::new("[c]").small()).on_hover_text("Copy address").clicked() {
                    ui.output_mut(|o| o.copied_text = address.clone());
                }
                let signer = match self.ethereum.session.as_ref().map(|s| s.provider().is_ledger()) {
                    Some(true) => "Ledger",
                    _ => "Local key",
                };
                ui.label(RichText::new(format!("({})", signer)).small().color(self.theme.text_secondary));
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.add(self.theme.button_secondary("Logout")).clicked() {
                        self.logout_wallet();
                    }
                });
            });
        });
        // Logout may have just dropped the session
        if self.ethereum.session.is_none() {
            return;
        }
        ui.add_space(self.theme.spacing_md);

        self.render_send_form(ui);
        ui.add_space(self.theme.spacing_md);

        ui.horizontal(|ui| {
            ui.label(RichText::new("Recent Transactions").size(16.0).strong());
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                let fetching = self.ethereum.feed.is_fetching();
                if ui
                    .add_enabled(!fetching, self.theme.button_primary(if fetching { "Loading..." } else { "Refresh" }))
                    .clicked()
                {
                    self.refresh_ethereum();
                }
                if ui.add(self.theme.button_secondary("Export CSV")).clicked() {
                    self.export_feed(GuiSection::Ethereum);
                }
            });
        });
        ui.label(
            RichText::new(format!("Last {} blocks", self.config.evm.blocks_to_scan))
                .small()
                .color(self.theme.text_secondary),
        );
        ui.add_space(self.theme.spacing_sm);

        // Charged fees need receipts, which the block scan does not fetch,
        // so neither the average card nor the fee bands apply here
        stat_cards(ui, &self.theme, &self.ethereum.feed.stats(), None);
        ui.add_space(self.theme.spacing_md);
        filter_bar(ui, &self.theme, "ethereum", &mut self.ethereum.filter, false);
        ui.add_space(self.theme.spacing_sm);
        status_banner(ui, &self.theme, &self.ethereum.feed);
        ui.add_space(self.theme.spacing_sm);

        let total = self.ethereum.feed.records().len();
        let rows = self.ethereum.feed.project(&self.ethereum.filter);
        if rows.is_empty() {
            if self.ethereum.feed.is_fetching() && total == 0 {
                return;
            }
            if empty_state(ui, &self.theme, &self.ethereum.filter, total) {
                self.ethereum.filter.clear();
            }
            return;
        }

        let chain_id = self.config.evm.chain_id;
        let native_token = self.config.evm.native_token().to_string();
        for (index, record) in rows.into_iter().enumerate() {
            ui.push_id(record.list_key(index), |ui| {
                evm_row(ui, &self.theme, record, chain_id, &native_token);
            });
            ui.add_space(self.theme.spacing_xs);
        }
    }

    fn render_connect_panel(&mut self, ui: &mut egui::Ui) {
        let connecting = self.ethereum.connect_job.is_some();
        self.theme.frame_panel().show(ui, |ui| {
            ui.set_min_width(ui.available_width());
            ui.vertical_centered(|ui| {
                ui.add_space(self.theme.spacing_md);
                ui.label(RichText::new("Connect a wallet to see its recent transactions.").size(16.0));
                let hint = if self.config.evm.private_key.is_some() {
                    "Using the key from ETH_PRIVATE_KEY.".to_string()
                } else {
                    format!("Using a Ledger at {}.", self.user_settings.ledger_hd_path)
                };
                ui.label(RichText::new(hint).small().color(self.theme.text_secondary));
                ui.add_space(self.theme.spacing_sm);
                if connecting {
                    ui.horizontal(|ui| {
                        ui.spinner();
                        ui.label("Connecting...");
                    });
                } else if ui.add(self.theme.button_primary("Connect Wallet")).clicked() {
                    self.connect_wallet();
                }
                ui.add_space(self.theme.spacing_md);
            });
        });
    }

    fn render_send_form(&mut self, ui: &mut egui::Ui) {
        let native_token = self.config.evm.native_token().to_string();
        let mut send_clicked = false;

        self.theme.frame_panel().show(ui, |ui| {
            ui.label(RichText::new("Send Transaction").size(16.0).strong());
            ui.add_space(self.theme.spacing_xs);
            egui::Grid::new("send_form")
                .num_columns(2)
                .spacing([self.theme.spacing_md, self.theme.spacing_xs])
                .show(ui, |ui| {
                    ui.label("Recipient:");
                    ui.add(
                        egui::TextEdit::singleline(&mut self.ethereum.send_to)
                            .hint_text("0x...")
                            .desired_width(380.0),
                    );
                    ui.end_row();

                    ui.label(format!("Amount ({}):", native_token));
                    ui.add(
                        egui::TextEdit::singleline(&mut self.ethereum.send_amount)
                            .hint_text("0.01")
                            .desired_width(160.0),
                    );
                    ui.end_row();
                });
            ui.add_space(self.theme.spacing_sm);

            if self.ethereum.send_job.is_some() {
                ui.horizontal(|ui| {
                    ui.spinner();
                    ui.label("Waiting for signature and broadcast...");
                });
            } else if self.ethereum.confirm_job.is_some() {
                ui.horizontal(|ui| {
                    ui.spinner();
                    ui.label("Waiting for confirmation...");
                });
            } else if ui.add(self.theme.button_primary("Send")).clicked() {
                send_clicked = true;
            }
        });

        if send_clicked {
            self.send_transaction();
        }
    }
}
