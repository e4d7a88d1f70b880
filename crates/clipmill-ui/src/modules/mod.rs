// crates/clipmill-ui/src/modules/mod.rs
//
// Tab registry. To add a new tab:
//   1. Create modules/mytab.rs implementing TabModule
//   2. Add `pub mod mytab;` below
//   3. Add a Tab variant and one line in app.rs

pub mod cut;
pub mod job_modal;
pub mod merge;

use egui::Ui;

use clipmill_core::commands::AppCommand;
use clipmill_core::quality::Quality;

use crate::i18n::Translations;
use crate::state::UiState;

/// Every tab implements this trait.
/// Modules read state, emit commands — they never mutate state directly.
pub trait TabModule {
    fn ui(
        &mut self,
        ui:    &mut Ui,
        state: &UiState,
        tr:    &Translations,
        cmd:   &mut Vec<AppCommand>,
    );
}

/// Localised quality preset ComboBox, shared by both tabs.
pub(crate) fn quality_combo(
    ui:      &mut Ui,
    tr:      &Translations,
    id_salt: &str,
    value:   &mut Quality,
) {
    egui::ComboBox::from_id_salt(id_salt)
        .selected_text(tr.get(value.label_key()))
        .show_ui(ui, |ui| {
            for q in Quality::ALL {
                ui.selectable_value(value, q, tr.get(q.label_key()));
            }
        });
}
