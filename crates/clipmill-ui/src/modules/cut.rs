// crates/clipmill-ui/src/modules/cut.rs
//
// Cut tab: pick a source, see its probed duration/resolution, choose
// cut-by-range or split-by-duration, pick a quality, go.
//
// The module owns only widget text. Parsed values travel out as AppCommands
// (unparseable time fields become None and are rejected by app.rs with the
// same dialog as an inverted range); the source path, probe results, and job
// state live in UiState.

use egui::{Button, ComboBox, Frame, Margin, RichText, TextEdit, Ui};
use uuid::Uuid;

use clipmill_core::commands::AppCommand;
use clipmill_core::helpers::time::{format_timecode, parse_timecode};
use clipmill_core::quality::Quality;

use super::{quality_combo, TabModule};
use crate::i18n::Translations;
use crate::state::UiState;
use crate::theme::{BORDER, EXEC_GREEN, TEXT_DIM};

#[derive(Clone, Copy, PartialEq)]
enum CutMode {
    Range,
    Split,
}

pub struct CutModule {
    mode:       CutMode,
    start_text: String,
    end_text:   String,
    part_text:  String,
    quality:    Quality,
    /// Probe id the time fields were last prefilled from, so a fresh probe
    /// resets them exactly once and never fights the user's edits.
    synced_probe: Option<Uuid>,
}

impl CutModule {
    pub fn new(quality: Quality) -> Self {
        Self {
            mode:         CutMode::Range,
            start_text:   format_timecode(0),
            end_text:     format_timecode(0),
            part_text:    String::new(),
            quality,
            synced_probe: None,
        }
    }
}

impl TabModule for CutModule {
    fn ui(
        &mut self,
        ui:    &mut Ui,
        state: &UiState,
        tr:    &Translations,
        cmd:   &mut Vec<AppCommand>,
    ) {
        // Prefill the range from a freshly probed source: start at zero, end
        // at the full duration, exactly like the player's time fields.
        if let (Some(pid), Some(info)) = (state.source_probe, &state.info) {
            if self.synced_probe != Some(pid) {
                self.start_text = format_timecode(0);
                self.end_text = format_timecode(info.duration_secs as u32);
                self.synced_probe = Some(pid);
            }
        }

        let busy = state.job_running();

        ui.add_space(4.0);

        // ── Source ────────────────────────────────────────────────────────────
        if ui
            .add_enabled(!busy, Button::new(format!("📂 {}", tr.get("browse"))))
            .clicked()
        {
            cmd.push(AppCommand::BrowseCutSource);
        }

        ui.add_space(6.0);
        self.info_panel(ui, state, tr);
        ui.add_space(6.0);

        // ── Settings ──────────────────────────────────────────────────────────
        ui.add_enabled_ui(!busy, |ui| {
            Frame::new()
                .fill(crate::theme::CARD_BG)
                .stroke(egui::Stroke::new(1.0, BORDER))
                .corner_radius(egui::CornerRadius::same(6))
                .inner_margin(Margin::same(10))
                .show(ui, |ui| {
                    ui.set_width(ui.available_width());
                    ui.label(RichText::new(tr.get("cut_settings")).strong());
                    ui.add_space(4.0);

                    ui.horizontal(|ui| {
                        ui.label(tr.get("cut_mode"));
                        let mode_label = match self.mode {
                            CutMode::Range => tr.get("cut_by_range"),
                            CutMode::Split => tr.get("split_by_duration"),
                        };
                        ComboBox::from_id_salt("cut_mode")
                            .selected_text(mode_label)
                            .show_ui(ui, |ui| {
                                ui.selectable_value(
                                    &mut self.mode, CutMode::Range, tr.get("cut_by_range"));
                                ui.selectable_value(
                                    &mut self.mode, CutMode::Split, tr.get("split_by_duration"));
                            });
                    });

                    ui.add_space(4.0);
                    match self.mode {
                        CutMode::Range => self.range_fields(ui, tr),
                        CutMode::Split => self.split_fields(ui, tr),
                    }

                    ui.add_space(4.0);
                    ui.horizontal(|ui| {
                        ui.label(tr.get("quality"));
                        quality_combo(ui, tr, "cut_quality", &mut self.quality);
                    });
                });
        });

        ui.add_space(10.0);

        // ── Go ────────────────────────────────────────────────────────────────
        let label = match self.mode {
            CutMode::Range => tr.get("start_cut"),
            CutMode::Split => tr.get("start_split"),
        };
        let start_btn = Button::new(RichText::new(label).strong().color(egui::Color32::WHITE))
            .fill(EXEC_GREEN)
            .min_size(egui::vec2(ui.available_width(), 32.0));
        if ui.add_enabled(!busy, start_btn).clicked() {
            match self.mode {
                CutMode::Range => cmd.push(AppCommand::StartRangeCut {
                    start_sec: parse_timecode(&self.start_text),
                    end_sec:   parse_timecode(&self.end_text),
                    quality:   self.quality,
                }),
                CutMode::Split => cmd.push(AppCommand::StartSplit {
                    part_secs: self.part_text.trim().parse().ok(),
                    quality:   self.quality,
                }),
            }
        }
    }
}

impl CutModule {
    fn info_panel(&self, ui: &mut Ui, state: &UiState, tr: &Translations) {
        Frame::new()
            .fill(crate::theme::CARD_BG)
            .stroke(egui::Stroke::new(1.0, BORDER))
            .corner_radius(egui::CornerRadius::same(6))
            .inner_margin(Margin::same(10))
            .show(ui, |ui| {
                ui.set_width(ui.available_width());
                ui.label(RichText::new(tr.get("video_information")).strong());
                ui.add_space(2.0);

                let name = state.source.as_deref()
                    .and_then(|p| p.file_name())
                    .map(|n| n.to_string_lossy().into_owned());
                match name {
                    Some(name) => { ui.label(name); }
                    None => { ui.label(RichText::new(tr.get("drop_hint")).color(TEXT_DIM)); }
                }

                let (duration, resolution) = match &state.info {
                    Some(info) => (
                        format_timecode(info.duration_secs as u32),
                        format!("{}x{}", info.width, info.height),
                    ),
                    None => ("N/A".into(), "N/A".into()),
                };
                ui.label(format!("{} {duration}", tr.get("duration")));
                ui.label(format!("{} {resolution}", tr.get("resolution")));

                if let Some(err) = &state.probe_error {
                    ui.label(
                        RichText::new(format!("{} {err}", tr.get("probe_failed")))
                            .color(egui::Color32::from_rgb(180, 50, 50))
                            .size(11.0),
                    );
                }
            });
    }

    fn range_fields(&mut self, ui: &mut Ui, tr: &Translations) {
        ui.horizontal(|ui| {
            ui.label(tr.get("start_time"));
            ui.add(
                TextEdit::singleline(&mut self.start_text)
                    .desired_width(90.0)
                    .hint_text("HH:MM:SS"),
            );
            ui.add_space(8.0);
            ui.label(tr.get("end_time"));
            ui.add(
                TextEdit::singleline(&mut self.end_text)
                    .desired_width(90.0)
                    .hint_text("HH:MM:SS"),
            );
        });
    }

    fn split_fields(&mut self, ui: &mut Ui, tr: &Translations) {
        ui.horizontal(|ui| {
            ui.label(tr.get("duration_per_part_sec"));
            ui.add(
                TextEdit::singleline(&mut self.part_text)
                    .desired_width(90.0)
                    .hint_text("e.g., 60"),
            );
        });
    }
}
