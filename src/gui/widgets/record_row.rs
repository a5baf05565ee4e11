//! One row of the transaction list, for either feed.

use crate::config::{get_tx_explorer_url, HederaNetwork};
use crate::gui::theme::AppTheme;
use crate::types::TransactionRecord;
use crate::utils::{format_ether, format_timestamp, format_tinybars, format_wei, short_address};
use eframe::egui::{self, RichText};

/// `0x12345678...abcdef`
pub fn short_hash(hash: &str) -> String {
    if hash.len() > 18 {
        format!("{}...{}", &hash[..10], &hash[hash.len() - 6..])
    } else {
        hash.to_string()
    }
}

fn open_explorer(url: &str) {
    if let Err(e) = open::that(url) {
        tracing::warn!("Failed to open explorer URL: {}", e);
    }
}

fn copy_button(ui: &mut egui::Ui, text: &str, hover: &str) {
    if ui.add(egui::Button::new("[c]").small()).on_hover_text(hover).clicked() {
        ui.output_mut(|o| o.copied_text = text.to_string());
    }
}

/// Mirror-node record: entity, time, fee, max fee, explorer link.
pub fn hedera_row(ui: &mut egui::Ui, theme: &AppTheme, record: &TransactionRecord, network: HederaNetwork) {
    theme.frame_surface().show(ui, |ui| {
        ui.set_min_width(ui.available_width());
        ui.horizontal_wrapped(|ui| {
            let entity = record.entity_id.as_deref().unwrap_or("Unknown entity");
            ui.label(RichText::new(entity).strong().monospace().color(theme.text_primary));
            if let Some(name) = &record.name {
                ui.label(RichText::new(name).small().color(theme.text_secondary));
            }
            if let Some(result) = record.result.as_deref().filter(|r| *r != "SUCCESS") {
                ui.label(RichText::new(result).small().color(theme.warning));
            }

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                let explorer_link = match (record.transaction_id.as_deref(), record.entity_id.as_deref()) {
                    (Some(tx_id), _) => Some(network.explorer_transaction_url(tx_id)),
                    (None, Some(entity)) => Some(network.explorer_account_url(entity)),
                    (None, None) => None,
                };
                if let Some(url) = explorer_link {
                    if ui
                        .add(egui::Button::new("[->]").small())
                        .on_hover_text("View on HashScan")
                        .clicked()
                    {
                        open_explorer(&url);
                    }
                }
                if record.max_fee.is_some() {
                    ui.label(
                        RichText::new(format!("max {}", format_tinybars(record.max_fee)))
                            .small()
                            .color(theme.text_secondary),
                    );
                }
                ui.label(RichText::new(format_tinybars(record.charged_fee)).color(theme.accent));
            });
        });
        ui.label(
            RichText::new(format_timestamp(record.consensus_timestamp.as_deref()))
                .small()
                .color(theme.text_secondary),
        );
    });
}

/// EVM record: hash, from/to, value, block, time, confirmations.
pub fn evm_row(ui: &mut egui::Ui, theme: &AppTheme, record: &TransactionRecord, chain_id: u64, native_token: &str) {
    let Some(evm) = &record.evm else {
        return;
    };
    let hash = format!("{:?}", evm.hash);

    theme.frame_surface().show(ui, |ui| {
        ui.set_min_width(ui.available_width());
        ui.horizontal_wrapped(|ui| {
            ui.label(RichText::new("Hash:").color(theme.text_secondary));
            ui.label(RichText::new(short_hash(&hash)).monospace().strong());
            copy_button(ui, &hash, "Copy transaction hash");
            if let Some(url) = get_tx_explorer_url(chain_id, &hash) {
                if ui
                    .add(egui::Button::new("[->]").small())
                    .on_hover_text("View on block explorer")
                    .clicked()
                {
                    open_explorer(&url);
                }
            }

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.label(
                    RichText::new(format!("{} {}", format_ether(evm.value), native_token))
                        .strong()
                        .color(theme.accent),
                );
            });
        });

        ui.horizontal_wrapped(|ui| {
            ui.label(RichText::new("From:").color(theme.text_secondary));
            ui.label(RichText::new(short_address(&evm.from)).monospace())
                .on_hover_text(format!("{:?}", evm.from));
            ui.label(RichText::new("To:").color(theme.text_secondary));
            match evm.to {
                Some(to) => {
                    ui.label(RichText::new(short_address(&to)).monospace())
                        .on_hover_text(format!("{:?}", to));
                }
                None => {
                    ui.label(RichText::new("Contract Creation").italics().color(theme.warning));
                }
            }
        });

        ui.horizontal_wrapped(|ui| {
            ui.label(RichText::new(format!("Block #{}", evm.block_number)).small());
            ui.separator();
            ui.label(
                RichText::new(format_timestamp(record.consensus_timestamp.as_deref()))
                    .small()
                    .color(theme.text_secondary),
            );
            ui.separator();
            ui.label(RichText::new(format!("{} confirmations", evm.confirmations)).small());
            if record.max_fee.is_some() {
                ui.separator();
                ui.label(
                    RichText::new(format!("max fee {}", format_wei(record.max_fee)))
                        .small()
                        .color(theme.text_secondary),
                );
            }
        });
    });
}
