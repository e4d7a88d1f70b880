// crates/clipmill-ui/src/modules/merge.rs
//
// Merge tab: an ordered file list (list order = concatenation order) with
// add / remove / move / clear controls, a quality combo, and the go button.
// The list itself lives in UiState; this module owns only the selection
// cursor and the quality choice.

use egui::{Button, Frame, Margin, RichText, ScrollArea, Ui};

use clipmill_core::commands::AppCommand;
use clipmill_core::quality::Quality;

use super::{quality_combo, TabModule};
use crate::i18n::Translations;
use crate::state::UiState;
use crate::theme::{BORDER, EXEC_GREEN, TEXT_DIM};

pub struct MergeModule {
    selected: Option<usize>,
    quality:  Quality,
}

impl MergeModule {
    pub fn new(quality: Quality) -> Self {
        Self { selected: None, quality }
    }
}

impl TabModule for MergeModule {
    fn ui(
        &mut self,
        ui:    &mut Ui,
        state: &UiState,
        tr:    &Translations,
        cmd:   &mut Vec<AppCommand>,
    ) {
        let busy = state.job_running();
        let count = state.merge_files.len();

        // The selection survives list edits done in app.rs; clamp it here.
        if self.selected.is_some_and(|i| i >= count) {
            self.selected = None;
        }

        ui.add_space(4.0);
        ui.label(RichText::new(tr.get("merge_list")).strong());
        ui.add_space(2.0);

        // ── File list ─────────────────────────────────────────────────────────
        Frame::new()
            .fill(crate::theme::CARD_BG)
            .stroke(egui::Stroke::new(1.0, BORDER))
            .corner_radius(egui::CornerRadius::same(6))
            .inner_margin(Margin::same(6))
            .show(ui, |ui| {
                ui.set_width(ui.available_width());
                ScrollArea::vertical()
                    .auto_shrink([false, false])
                    .max_height(ui.available_height() - 110.0)
                    .show(ui, |ui| {
                        if state.merge_files.is_empty() {
                            ui.label(RichText::new(tr.get("merge_list_hint")).color(TEXT_DIM));
                        }
                        for (i, path) in state.merge_files.iter().enumerate() {
                            let name = path.file_name()
                                .map(|n| n.to_string_lossy().into_owned())
                                .unwrap_or_else(|| path.display().to_string());
                            let row = format!("{}.  {name}", i + 1);
                            if ui
                                .selectable_label(self.selected == Some(i), row)
                                .clicked()
                            {
                                self.selected = Some(i);
                            }
                        }
                    });
            });

        ui.add_space(6.0);

        // ── List controls ─────────────────────────────────────────────────────
        ui.add_enabled_ui(!busy, |ui| {
            ui.horizontal(|ui| {
                if ui.button(format!("➕ {}", tr.get("add_files"))).clicked() {
                    cmd.push(AppCommand::AddMergeFiles);
                }

                let has_sel = self.selected.is_some();
                if ui
                    .add_enabled(has_sel, Button::new(format!("🗑 {}", tr.get("remove_selected"))))
                    .clicked()
                {
                    if let Some(i) = self.selected.take() {
                        cmd.push(AppCommand::RemoveMergeItem(i));
                    }
                }

                let can_up = self.selected.is_some_and(|i| i > 0);
                if ui
                    .add_enabled(can_up, Button::new(format!("⬆ {}", tr.get("move_up"))))
                    .clicked()
                {
                    if let Some(i) = self.selected {
                        cmd.push(AppCommand::MoveMergeItem { index: i, up: true });
                        self.selected = Some(i - 1);
                    }
                }

                let can_down = self.selected.is_some_and(|i| i + 1 < count);
                if ui
                    .add_enabled(can_down, Button::new(format!("⬇ {}", tr.get("move_down"))))
                    .clicked()
                {
                    if let Some(i) = self.selected {
                        cmd.push(AppCommand::MoveMergeItem { index: i, up: false });
                        self.selected = Some(i + 1);
                    }
                }

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui
                        .add_enabled(count > 0, Button::new(tr.get("clear_list")))
                        .clicked()
                    {
                        self.selected = None;
                        cmd.push(AppCommand::ClearMergeList);
                    }
                });
            });
        });

        ui.add_space(8.0);

        // ── Quality + go ──────────────────────────────────────────────────────
        ui.horizontal(|ui| {
            ui.add_enabled_ui(!busy, |ui| {
                ui.label(tr.get("quality"));
                quality_combo(ui, tr, "merge_quality", &mut self.quality);
            });

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                let start_btn = Button::new(
                    RichText::new(tr.get("start_merge")).strong().color(egui::Color32::WHITE),
                )
                .fill(EXEC_GREEN)
                .min_size(egui::vec2(140.0, 28.0));
                if ui.add_enabled(!busy, start_btn).clicked() {
                    cmd.push(AppCommand::StartMerge { quality: self.quality });
                }
            });
        });
    }
}
