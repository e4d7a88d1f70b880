// crates/clipmill-ui/src/context.rs
//
// AppContext owns the runtime handles that are not UI state: today that is
// the MediaWorker and the single translation layer that turns its events
// into UiState changes. The UI thread never reaches past this layer into
// worker internals.

use eframe::egui;

use clipmill_core::events::MediaEvent;
use clipmill_media::MediaWorker;

use crate::state::{JobPhase, UiState};

pub struct AppContext {
    pub worker: MediaWorker,
}

impl AppContext {
    pub fn new(worker: MediaWorker) -> Self {
        Self { worker }
    }

    /// Drain the worker's event channel into UiState. Called once per frame
    /// from app::update, before the panels are drawn.
    ///
    /// Every arm guards on the current correlation id (probe) or job id, so
    /// a stale event from an abandoned source or a finished job can never
    /// clobber newer state.
    pub fn ingest_media_events(&mut self, state: &mut UiState, ctx: &egui::Context) {
        while let Ok(event) = self.worker.rx.try_recv() {
            match event {
                MediaEvent::SourceProbed { id, info } => {
                    if state.source_probe == Some(id) {
                        state.info = Some(info);
                        state.probe_error = None;
                        ctx.request_repaint();
                    }
                }

                MediaEvent::ProbeFailed { id, message } => {
                    if state.source_probe == Some(id) {
                        state.info = None;
                        state.probe_error = Some(message);
                        ctx.request_repaint();
                    }
                }

                MediaEvent::Progress { job_id, percent } => {
                    if let Some(job) = &mut state.job {
                        if job.id == job_id && job.phase == JobPhase::Running {
                            job.percent = Some(percent);
                            ctx.request_repaint();
                        }
                    }
                }

                MediaEvent::Finished { job_id, output, .. } => {
                    if let Some(job) = &mut state.job {
                        if job.id == job_id && job.phase == JobPhase::Running {
                            log::info!("[app] job {job_id} finished → {}", output.display());
                            job.percent = Some(100);
                            job.phase = JobPhase::Finished(output);
                            ctx.request_repaint();
                        }
                    }
                }

                MediaEvent::Failed { job_id, message } => {
                    if let Some(job) = &mut state.job {
                        if job.id == job_id && job.phase == JobPhase::Running {
                            log::error!("[app] job {job_id} failed: {message}");
                            job.phase = JobPhase::Failed(message);
                            ctx.request_repaint();
                        }
                    }
                }
            }
        }
    }
}
