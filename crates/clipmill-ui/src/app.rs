// crates/clipmill-ui/src/app.rs
//
// ClipMillApp wires everything together:
//   - one UiState + AppContext (worker) + Translations
//   - two tab modules that read state and emit AppCommands
//   - process_command(), the single place state is mutated
//
// Job flow on a start command: validate the fields (blocking warning dialog
// on failure, no job starts) → ask for the output location → build the
// JobRequest → JobRequest::validate → MediaWorker::submit. From then on the
// UI only reacts to MediaEvents.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use eframe::egui;
use egui::RichText;
use rfd::{FileDialog, MessageDialog, MessageLevel};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use clipmill_core::commands::AppCommand;
use clipmill_core::job::JobRequest;
use clipmill_core::quality::Quality;
use clipmill_media::{FfmpegBackend, MediaWorker, SubmitError};

use crate::context::AppContext;
use crate::i18n::{Translations, LANGUAGES};
use crate::modules::cut::CutModule;
use crate::modules::merge::MergeModule;
use crate::modules::{job_modal, TabModule};
use crate::state::{ActiveJob, JobPhase, UiState};
use crate::theme;

const VIDEO_EXTENSIONS: &[&str] = &["mp4", "avi", "mov", "mkv"];

/// Everything that survives a restart.
#[derive(Serialize, Deserialize)]
struct Settings {
    language: String,
    quality:  Quality,
}

impl Default for Settings {
    fn default() -> Self {
        Self { language: "en".into(), quality: Quality::Medium }
    }
}

#[derive(Clone, Copy, PartialEq)]
enum Tab {
    Cut,
    Merge,
}

// ── App ───────────────────────────────────────────────────────────────────────

pub struct ClipMillApp {
    state:    UiState,
    context:  AppContext,
    tr:       Translations,
    settings: Settings,
    tab:      Tab,
    cut:      CutModule,
    merge:    MergeModule,
    /// Commands emitted by modules each frame, processed after the UI pass.
    pending_cmds: Vec<AppCommand>,
}

impl ClipMillApp {
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        theme::configure_style(&cc.egui_ctx);
        // Pin to light mode — prevents egui overwriting the theme on OS
        // light/dark changes.
        cc.egui_ctx.options_mut(|o| {
            o.theme_preference = egui::ThemePreference::Light;
        });

        let settings: Settings = cc.storage
            .and_then(|s| eframe::get_value(s, eframe::APP_KEY))
            .unwrap_or_default();

        // A missing primary language falls back to English inside
        // load_or_fallback; if English is missing too there is nothing to
        // render labels with and startup aborts.
        let tr = match Translations::load_or_fallback(&settings.language) {
            Ok(tr) => tr,
            Err(e) => {
                log::error!("[app] language resources unavailable: {e}");
                MessageDialog::new()
                    .set_level(MessageLevel::Error)
                    .set_title("Language File Error")
                    .set_description(format!("Cannot load language resources: {e}"))
                    .show();
                std::process::exit(1);
            }
        };

        let quality = settings.quality;
        Self {
            state:        UiState::default(),
            context:      AppContext::new(MediaWorker::new(Arc::new(FfmpegBackend))),
            tr,
            settings,
            tab:          Tab::Cut,
            cut:          CutModule::new(quality),
            merge:        MergeModule::new(quality),
            pending_cmds: Vec::new(),
        }
    }

    // ── Command processing ────────────────────────────────────────────────────

    fn process_command(&mut self, cmd: AppCommand) {
        match cmd {
            // ── Cut tab ──────────────────────────────────────────────────────
            AppCommand::BrowseCutSource => {
                if let Some(path) = FileDialog::new()
                    .add_filter("Video", VIDEO_EXTENSIONS)
                    .pick_file()
                {
                    self.set_cut_source(path);
                }
            }

            AppCommand::StartRangeCut { start_sec, end_sec, quality } => {
                let Some(source) = self.state.source.clone() else {
                    self.warn_dialog("file_not_selected_error");
                    return;
                };
                let (Some(start_sec), Some(end_sec)) = (start_sec, end_sec) else {
                    self.warn_dialog("start_time_error");
                    return;
                };
                if start_sec >= end_sec {
                    self.warn_dialog("start_time_error");
                    return;
                }

                let stem = source.file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "video".into());
                let Some(output) = FileDialog::new()
                    .set_title(self.tr.get("select_output_file_cut"))
                    .set_file_name(format!("{stem}_cut.mp4"))
                    .add_filter("MP4", &["mp4"])
                    .save_file()
                else {
                    return;
                };

                self.settings.quality = quality;
                self.submit(JobRequest::CutRange { source, start_sec, end_sec, output, quality });
            }

            AppCommand::StartSplit { part_secs, quality } => {
                let Some(source) = self.state.source.clone() else {
                    self.warn_dialog("file_not_selected_error");
                    return;
                };
                let Some(part_secs) = part_secs.filter(|p| *p > 0) else {
                    self.warn_dialog("invalid_duration_error");
                    return;
                };
                let Some(out_dir) = FileDialog::new()
                    .set_title(self.tr.get("select_output_folder"))
                    .pick_folder()
                else {
                    return;
                };

                self.settings.quality = quality;
                self.submit(JobRequest::SplitDuration { source, part_secs, out_dir, quality });
            }

            // ── Merge tab ────────────────────────────────────────────────────
            AppCommand::AddMergeFiles => {
                if let Some(paths) = FileDialog::new()
                    .add_filter("Video", VIDEO_EXTENSIONS)
                    .pick_files()
                {
                    self.state.merge_files.extend(paths);
                }
            }

            AppCommand::RemoveMergeItem(index) => {
                if index < self.state.merge_files.len() {
                    self.state.merge_files.remove(index);
                }
            }

            AppCommand::MoveMergeItem { index, up } => {
                let files = &mut self.state.merge_files;
                if up && index > 0 && index < files.len() {
                    files.swap(index, index - 1);
                } else if !up && index + 1 < files.len() {
                    files.swap(index, index + 1);
                }
            }

            AppCommand::ClearMergeList => {
                self.state.merge_files.clear();
            }

            AppCommand::StartMerge { quality } => {
                if self.state.merge_files.len() < 2 {
                    self.warn_dialog("merge_list_empty_error");
                    return;
                }
                let Some(output) = FileDialog::new()
                    .set_title(self.tr.get("select_output_file_merge"))
                    .set_file_name("merged_video.mp4")
                    .add_filter("MP4", &["mp4"])
                    .save_file()
                else {
                    return;
                };

                self.settings.quality = quality;
                self.submit(JobRequest::Merge {
                    sources: self.state.merge_files.clone(),
                    output,
                    quality,
                });
            }

            // ── Job modal ────────────────────────────────────────────────────
            AppCommand::CancelJob(job_id) => {
                self.context.worker.cancel(job_id);
                // The worker stays silent on the cancel path; flip the phase
                // locally so the modal reflects the request immediately.
                if let Some(job) = &mut self.state.job {
                    if job.id == job_id && job.phase == JobPhase::Running {
                        job.phase = JobPhase::Cancelled;
                    }
                }
            }

            AppCommand::DismissJobStatus => {
                if !self.state.job_running() {
                    self.state.job = None;
                }
            }

            // ── Chrome ───────────────────────────────────────────────────────
            AppCommand::SetLanguage(code) => match Translations::load_or_fallback(&code) {
                Ok(tr) => {
                    self.settings.language = tr.code().to_string();
                    self.tr = tr;
                }
                Err(e) => {
                    log::error!("[app] language switch failed: {e}");
                    MessageDialog::new()
                        .set_level(MessageLevel::Error)
                        .set_title("Language File Error")
                        .set_description(e)
                        .show();
                }
            },

            AppCommand::ShowAbout => {
                MessageDialog::new()
                    .set_level(MessageLevel::Info)
                    .set_title(self.tr.get("about_title"))
                    .set_description(self.tr.get("about_text"))
                    .show();
            }
        }
    }

    /// Final validation + submission. The single-worker policy surfaces here
    /// as a dialog if a second start slips past the disabled buttons.
    fn submit(&mut self, request: JobRequest) {
        if let Err(e) = request.validate() {
            self.warn_dialog(e.message_key());
            return;
        }
        let kind = request.kind();
        match self.context.worker.submit(request) {
            Ok(id) => {
                self.state.job = Some(ActiveJob {
                    id,
                    kind,
                    percent: None,
                    phase: JobPhase::Running,
                });
            }
            Err(err @ SubmitError::Busy) => self.warn_dialog(err.message_key()),
        }
    }

    fn set_cut_source(&mut self, path: PathBuf) {
        let id = Uuid::new_v4();
        self.state.source_probe = Some(id);
        self.state.info = None;
        self.state.probe_error = None;
        self.context.worker.probe(id, path.clone());
        self.state.source = Some(path);
        self.tab = Tab::Cut;
    }

    fn warn_dialog(&self, key: &str) {
        MessageDialog::new()
            .set_level(MessageLevel::Warning)
            .set_title(self.tr.get("error_title"))
            .set_description(self.tr.get(key))
            .show();
    }

    fn handle_dropped_files(&mut self, ctx: &egui::Context) {
        let files = ctx.input(|i| i.raw.dropped_files.clone());
        for file in files {
            if let Some(path) = file.path {
                if is_video(&path) {
                    self.set_cut_source(path);
                    break;
                }
            }
        }
    }
}

fn is_video(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| VIDEO_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

// ── eframe::App ───────────────────────────────────────────────────────────────

impl eframe::App for ClipMillApp {
    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        eframe::set_value(storage, eframe::APP_KEY, &self.settings);
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.context.worker.shutdown();
    }

    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.handle_dropped_files(ctx);
        self.context.ingest_media_events(&mut self.state, ctx);

        egui::TopBottomPanel::top("top_panel")
            .exact_height(40.0)
            .show(ctx, |ui| {
                ui.horizontal_centered(|ui| {
                    ui.label(
                        RichText::new("🎬 ClipMill")
                            .strong()
                            .size(15.0)
                            .color(theme::ACCENT),
                    );
                    ui.separator();

                    for (tab, key) in [(Tab::Cut, "tab_cut"), (Tab::Merge, "tab_merge")] {
                        if ui
                            .selectable_label(self.tab == tab, self.tr.get(key))
                            .clicked()
                        {
                            self.tab = tab;
                        }
                    }

                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.button(self.tr.get("menu_about")).clicked() {
                            self.pending_cmds.push(AppCommand::ShowAbout);
                        }
                        ui.menu_button(format!("🌐 {}", self.tr.get("menu_language")), |ui| {
                            for (code, name) in LANGUAGES {
                                if ui
                                    .selectable_label(self.settings.language == code, name)
                                    .clicked()
                                {
                                    self.pending_cmds.push(AppCommand::SetLanguage(code.into()));
                                    ui.close_menu();
                                }
                            }
                        });
                    });
                });
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            match self.tab {
                Tab::Cut   => self.cut.ui(ui, &self.state, &self.tr, &mut self.pending_cmds),
                Tab::Merge => self.merge.ui(ui, &self.state, &self.tr, &mut self.pending_cmds),
            }
        });

        // Painted last so it covers every panel while a job is tracked.
        job_modal::show(ctx, &self.state, &self.tr, &mut self.pending_cmds);

        // ── Process commands emitted by modules this frame ────────────────────
        let cmds: Vec<AppCommand> = self.pending_cmds.drain(..).collect();
        for cmd in cmds {
            self.process_command(cmd);
        }
    }
}
