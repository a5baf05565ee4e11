//! Hedera mirror-node dashboard: pairing panel, filter, stats and the list.

use crate::gui::app::{GuiApp, GuiSection};
use crate::gui::widgets::{empty_state, filter_bar, hedera_row, stat_cards, status_banner};
use crate::types::AccountId;
use crate::utils::format_tinybars;
use eframe::egui::{self, RichText};

enum ScopeAction {
    Select(Option<AccountId>),
    Unpair(AccountId),
}

impl GuiApp {
    pub(crate) fn view_hedera(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            self.render_section_header(ui, "[H]", "HEDERA TRANSACTIONS");
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                let fetching = self.hedera.feed.is_fetching();
                if ui
                    .add_enabled(!fetching, self.theme.button_primary(if fetching { "Loading..." } else { "Refresh" }))
                    .clicked()
                {
                    self.refresh_hedera();
                }
                if ui.add(self.theme.button_secondary("Export CSV")).clicked() {
                    self.export_feed(GuiSection::Hedera);
                }
            });
        });
        ui.label(
            RichText::new(format!("{} - {}", self.config.network.label(), self.config.mirror_node_url))
                .small()
                .color(self.theme.text_secondary),
        );
        ui.add_space(self.theme.spacing_md);

        self.render_pairing_panel(ui);
        ui.add_space(self.theme.spacing_md);

        stat_cards(ui, &self.theme, &self.hedera.feed.stats(), Some(format_tinybars));
        ui.add_space(self.theme.spacing_md);

        // Filter edits only re-project the held records
        filter_bar(ui, &self.theme, "hedera", &mut self.hedera.filter, true);
        ui.add_space(self.theme.spacing_sm);
        status_banner(ui, &self.theme, &self.hedera.feed);
        ui.add_space(self.theme.spacing_sm);

        let total = self.hedera.feed.records().len();
        let rows = self.hedera.feed.project(&self.hedera.filter);
        if rows.is_empty() {
            if self.hedera.feed.is_fetching() && total == 0 {
                return;
            }
            if empty_state(ui, &self.theme, &self.hedera.filter, total) {
                self.hedera.filter.clear();
            }
            return;
        }

        ui.label(
            RichText::new(format!("Showing {} of {} transactions", rows.len(), total))
                .small()
                .color(self.theme.text_secondary),
        );
        let network = self.config.network;
        for (index, record) in rows.into_iter().enumerate() {
            ui.push_id(record.list_key(index), |ui| {
                hedera_row(ui, &self.theme, record, network);
            });
            ui.add_space(self.theme.spacing_xs);
        }
    }

    fn render_pairing_panel(&mut self, ui: &mut egui::Ui) {
        let mut action = None;
        let mut pair_clicked = false;

        self.theme.frame_panel().show(ui, |ui| {
            ui.label(RichText::new("Paired Accounts").size(16.0).strong());
            let Some(session) = self.pairing.as_ref() else {
                ui.label(RichText::new("Pairing session unavailable.").color(self.theme.error));
                return;
            };
            ui.label(
                RichText::new(format!("Session {} on {}", &session.topic()[..8], session.network().label()))
                    .small()
                    .color(self.theme.text_secondary),
            );
            ui.add_space(self.theme.spacing_xs);

            ui.horizontal(|ui| {
                ui.label("Account ID:");
                let response = ui.add(
                    egui::TextEdit::singleline(&mut self.hedera.pairing_input)
                        .hint_text("0.0.12345")
                        .desired_width(160.0),
                );
                let submitted = response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
                if ui.add(self.theme.button_small("Pair")).clicked() || submitted {
                    pair_clicked = true;
                }
            });

            let paired = session.paired_accounts();
            if paired.is_empty() {
                ui.label(
                    RichText::new("No paired accounts. The feed shows the latest network transactions.")
                        .small()
                        .color(self.theme.text_secondary),
                );
                return;
            }

            ui.add_space(self.theme.spacing_xs);
            ui.horizontal_wrapped(|ui| {
                if ui
                    .selectable_label(self.hedera.scope.is_none(), "All network")
                    .clicked()
                {
                    action = Some(ScopeAction::Select(None));
                }
                for account in paired {
                    let selected = self.hedera.scope == Some(account);
                    if ui.selectable_label(selected, account.to_string()).clicked() {
                        action = Some(ScopeAction::Select(Some(account)));
                    }
                    if ui
                        .add(egui::Button::new("x").small())
                        .on_hover_text("Unpair")
                        .clicked()
                    {
                        action = Some(ScopeAction::Unpair(account));
                    }
                    ui.add_space(self.theme.spacing_sm);
                }
            });
        });

        if pair_clicked {
            self.pair_account();
        }
        match action {
            Some(ScopeAction::Select(scope)) => self.set_hedera_scope(scope),
            Some(ScopeAction::Unpair(account)) => self.unpair_account(account),
            None => {}
        }
    }
}
