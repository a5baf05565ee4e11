//! Screens of the dashboard.
//!
//! Each submodule adds a `view_*` method to `GuiApp`, called from `App::update`.

pub mod ethereum;
pub mod hedera;
pub mod settings;

use crate::gui::app::GuiApp;
use eframe::egui::{self, RichText};

impl GuiApp {
    pub(crate) fn render_section_header(&self, ui: &mut egui::Ui, icon: &str, title: &str) {
        ui.label(
            RichText::new(self.theme.section_header_text(icon, title))
                .size(22.0)
                .strong()
                .color(self.theme.text_primary),
        );
        ui.label(RichText::new("=".repeat(48)).size(10.0).color(self.theme.primary));
    }
}
