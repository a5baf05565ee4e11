//! Filter bar, stat cards, status banner and empty state shared by both feeds.

use crate::feed::{FeedStats, FeedStatus, FeedView};
use crate::filter::{FilterMode, FilterState};
use crate::gui::notifications::fetch_error_message;
use crate::gui::theme::AppTheme;
use eframe::egui::{self, RichText};

pub const NO_MATCH_MESSAGE: &str = "No transactions match your filters";
pub const NO_DATA_MESSAGE: &str = "No transactions found";

/// Empty-state text: "no match" only when a filter hides existing records.
pub fn empty_state_message(filter: &FilterState, total: usize) -> &'static str {
    if filter.is_active() && total > 0 {
        NO_MATCH_MESSAGE
    } else {
        NO_DATA_MESSAGE
    }
}

/// Search box and, when `fee_bands` is set, the fee band combo.
/// Returns true when the filter changed.
pub fn filter_bar(
    ui: &mut egui::Ui,
    theme: &AppTheme,
    id: &str,
    filter: &mut FilterState,
    fee_bands: bool,
) -> bool {
    let mut changed = false;
    ui.horizontal(|ui| {
        ui.label(RichText::new("Search:").color(theme.text_secondary));
        let response = ui.add(
            egui::TextEdit::singleline(&mut filter.query)
                .hint_text("Account ID or timestamp")
                .desired_width(260.0),
        );
        changed |= response.changed();
        if !fee_bands {
            return;
        }

        ui.add_space(theme.spacing_sm);
        egui::ComboBox::from_id_source(format!("{}_filter_mode", id))
            .selected_text(filter.mode.label())
            .width(200.0)
            .show_ui(ui, |ui| {
                for mode in FilterMode::ALL_MODES {
                    if ui
                        .selectable_value(&mut filter.mode, mode, mode.label())
                        .changed()
                    {
                        changed = true;
                    }
                }
            });
    });
    changed
}

fn stat_card(ui: &mut egui::Ui, theme: &AppTheme, title: &str, value: &str) {
    theme.frame_stat_card().show(ui, |ui| {
        ui.set_min_width(180.0);
        ui.vertical(|ui| {
            ui.label(RichText::new(title).size(12.0).color(theme.text_secondary));
            ui.label(RichText::new(value).size(20.0).strong().color(theme.accent));
        });
    });
}

/// Total, average fee and last update. The fee card is skipped when
/// `format_fee` is `None` (feeds without charged fees).
pub fn stat_cards(
    ui: &mut egui::Ui,
    theme: &AppTheme,
    stats: &FeedStats,
    format_fee: Option<fn(Option<u64>) -> String>,
) {
    let updated = stats
        .last_updated_at
        .map(|t| t.format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "Never".to_string());

    ui.horizontal_wrapped(|ui| {
        stat_card(ui, theme, "Total Transactions", &stats.count.to_string());
        if let Some(format_fee) = format_fee {
            let average = match stats.average_fee {
                Some(fee) => format_fee(Some(fee)),
                None => "No data".to_string(),
            };
            stat_card(ui, theme, "Average Fee", &average);
        }
        stat_card(ui, theme, "Latest Update", &updated);
    });
}

/// Spinner while loading, and a banner when the held data is stale.
pub fn status_banner(ui: &mut egui::Ui, theme: &AppTheme, feed: &FeedView) {
    match feed.status() {
        FeedStatus::Loading => {
            ui.horizontal(|ui| {
                ui.spinner();
                ui.label(RichText::new("Loading transactions...").color(theme.text_secondary));
            });
        }
        FeedStatus::Error => {
            let message = feed
                .last_error()
                .map(fetch_error_message)
                .unwrap_or_else(|| "Failed to fetch transactions".to_string());
            theme.frame_banner(theme.error).show(ui, |ui| {
                ui.label(RichText::new(format!("[!] {}", message)).color(theme.error));
                if !feed.records().is_empty() {
                    ui.label(
                        RichText::new(format!("Showing {} records from the last successful fetch.", feed.records().len()))
                            .small()
                            .color(theme.text_secondary),
                    );
                }
            });
        }
        FeedStatus::Ready => {}
    }
}

/// Empty list placeholder. Returns true when "Clear filters" was clicked.
pub fn empty_state(ui: &mut egui::Ui, theme: &AppTheme, filter: &FilterState, total: usize) -> bool {
    let mut clear = false;
    theme.frame_surface().show(ui, |ui| {
        ui.set_min_width(ui.available_width());
        ui.vertical_centered(|ui| {
            ui.add_space(theme.spacing_md);
            ui.label(RichText::new(empty_state_message(filter, total)).size(16.0).color(theme.text_secondary));
            if filter.is_active() {
                ui.add_space(theme.spacing_sm);
                clear = ui.add(theme.button_secondary("Clear filters")).clicked();
            }
            ui.add_space(theme.spacing_md);
        });
    });
    clear
}
