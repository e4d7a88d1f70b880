// crates/clipmill-ui/src/modules/job_modal.rs
//
// Full-window modal for the active job, painted on top of everything after
// the panels. No-op while no job is tracked.
//
// Layer order (bottom → top): panels → scrim → card. The card background is
// painted inside the same Area as its widgets so it can never composite over
// them.
//
// Cards by phase:
//   Running   — split: percent readout + bar; cut/merge: spinner
//               (single-pass operations report nothing until terminal)
//   Finished  — localised success message with the output path
//   Failed    — the error text, verbatim from the worker
//   Cancelled — set locally the moment the user clicked Cancel

use egui::{Color32, Context, RichText, Stroke, Ui};

use clipmill_core::commands::AppCommand;
use clipmill_core::job::JobKind;

use crate::i18n::Translations;
use crate::state::{ActiveJob, JobPhase, UiState};
use crate::theme::{BORDER, CARD_BG, TEXT_DIM};

// ── Colour palette (local to the modal) ───────────────────────────────────────

const GREEN: Color32 = Color32::from_rgb( 40, 140,  80);
const RED:   Color32 = Color32::from_rgb(190,  60,  60);
const AMBER: Color32 = Color32::from_rgb(190, 130,  40);
const TRACK_BG: Color32 = Color32::from_rgb(222, 234, 244);
const TRACK_FG: Color32 = Color32::from_rgb(  0, 123, 255);

const CARD_W: f32 = 420.0;
const CARD_H: f32 = 230.0;
const PAD:    f32 = 24.0;

pub fn show(ctx: &Context, state: &UiState, tr: &Translations, cmd: &mut Vec<AppCommand>) {
    let Some(job) = &state.job else { return };

    let screen = ctx.screen_rect();

    // Scrim under the card, over the panels.
    let painter = ctx.layer_painter(egui::LayerId::new(
        egui::Order::Foreground,
        egui::Id::new("job_modal_scrim"),
    ));
    painter.rect_filled(screen, 0.0, Color32::from_black_alpha(96));

    let card_rect = egui::Rect::from_center_size(screen.center(), egui::vec2(CARD_W, CARD_H));
    let inner_rect = card_rect.shrink(PAD);

    let border = match &job.phase {
        JobPhase::Running     => TRACK_FG,
        JobPhase::Finished(_) => GREEN,
        JobPhase::Failed(_)   => RED,
        JobPhase::Cancelled   => AMBER,
    };
    let terminal = job.phase != JobPhase::Running;

    egui::Area::new(egui::Id::new("job_modal_content"))
        .order(egui::Order::Foreground)
        .fixed_pos(card_rect.min)
        .show(ctx, |ui| {
            ui.set_min_size(card_rect.size());
            ui.set_max_size(card_rect.size());

            ui.painter().rect(
                card_rect,
                6.0,
                CARD_BG,
                Stroke::new(1.0, border),
                egui::StrokeKind::Inside,
            );

            let mut card = ui.new_child(egui::UiBuilder::new().max_rect(inner_rect));
            match &job.phase {
                JobPhase::Running => {
                    running_card(&mut card, job, tr, cmd);
                    ctx.request_repaint();
                }
                JobPhase::Finished(output) => {
                    let key = match job.kind {
                        JobKind::Cut   => "cut_success_message",
                        JobKind::Split => "split_success_message",
                        JobKind::Merge => "merge_success_message",
                    };
                    let body = tr.get(key).replace("{}", &output.display().to_string());
                    terminal_card(&mut card, tr.get("success_title"), &body, GREEN, tr, cmd);
                }
                JobPhase::Failed(message) => {
                    terminal_card(&mut card, tr.get("error_title"), message, RED, tr, cmd);
                }
                JobPhase::Cancelled => {
                    let body = tr.get("cancelled_message");
                    terminal_card(&mut card, tr.get("cancelled_title"), body, AMBER, tr, cmd);
                }
            }
        });

    // Click outside dismisses a terminal card (never a running one).
    if terminal {
        let clicked_outside = ctx.input(|i| {
            i.pointer.any_click()
                && i.pointer.interact_pos()
                    .map(|p| !card_rect.contains(p))
                    .unwrap_or(false)
        });
        if clicked_outside {
            cmd.push(AppCommand::DismissJobStatus);
        }
    }
}

fn running_card(ui: &mut Ui, job: &ActiveJob, tr: &Translations, cmd: &mut Vec<AppCommand>) {
    ui.label(RichText::new(tr.get("processing")).size(14.0).strong());
    ui.add_space(12.0);

    match job.percent {
        // Split: one update per finished part.
        Some(percent) => {
            ui.label(
                RichText::new(format!("{percent}%"))
                    .size(40.0)
                    .strong()
                    .color(TRACK_FG),
            );
            ui.add_space(8.0);

            let (bar, _) = ui.allocate_exact_size(
                egui::vec2(ui.available_width(), 8.0),
                egui::Sense::hover(),
            );
            let p = ui.painter();
            p.rect_filled(bar, 4.0, TRACK_BG);
            if percent > 0 {
                let mut fill = bar;
                fill.max.x = bar.min.x + bar.width() * (percent as f32 / 100.0);
                p.rect_filled(fill, 4.0, TRACK_FG);
            }
        }
        // Cut and merge are single-pass: nothing to count, just a spinner.
        None => {
            ui.vertical_centered(|ui| {
                ui.add(egui::Spinner::new().size(42.0).color(TRACK_FG));
            });
        }
    }

    ui.add_space(14.0);

    let cancel_btn = egui::Button::new(RichText::new(tr.get("cancel")).color(TEXT_DIM))
        .stroke(Stroke::new(1.0, BORDER))
        .min_size(egui::vec2(ui.available_width(), 28.0));
    if ui.add(cancel_btn).clicked() {
        cmd.push(AppCommand::CancelJob(job.id));
    }
}

fn terminal_card(
    ui:     &mut Ui,
    title:  &str,
    body:   &str,
    tint:   Color32,
    tr:     &Translations,
    cmd:    &mut Vec<AppCommand>,
) {
    ui.label(RichText::new(title).size(14.0).strong());
    ui.add_space(12.0);

    egui::Frame::new()
        .fill(CARD_BG)
        .stroke(Stroke::new(1.0, tint))
        .corner_radius(egui::CornerRadius::same(4))
        .inner_margin(egui::Margin::same(8))
        .show(ui, |ui| {
            ui.set_width(ui.available_width());
            ui.label(RichText::new(body).size(11.5).color(tint));
        });

    ui.add_space(12.0);

    let dismiss = egui::Button::new(RichText::new(tr.get("dismiss")).color(TEXT_DIM))
        .stroke(Stroke::new(1.0, BORDER))
        .min_size(egui::vec2(ui.available_width(), 28.0));
    if ui.add(dismiss).clicked() {
        cmd.push(AppCommand::DismissJobStatus);
    }
}
