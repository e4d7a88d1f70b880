// crates/clipmill-ui/src/state.rs
//
// Session state shared by the tab modules. Modules read it and emit
// AppCommands; only app.rs and the event ingest in context.rs mutate it.

use std::path::PathBuf;

use uuid::Uuid;

use clipmill_core::events::SourceInfo;
use clipmill_core::job::JobKind;

/// UI-side mirror of the worker's job lifecycle. `Cancelled` is set locally
/// the moment the user asks — the worker stays silent on that path.
#[derive(Clone, Debug, PartialEq)]
pub enum JobPhase {
    Running,
    Finished(PathBuf),
    Failed(String),
    Cancelled,
}

/// The one job the UI tracks, mirrored purely from submit() and MediaEvents.
#[derive(Clone, Debug)]
pub struct ActiveJob {
    pub id:      Uuid,
    pub kind:    JobKind,
    /// Percent for split jobs; None renders as an indeterminate spinner.
    pub percent: Option<u8>,
    pub phase:   JobPhase,
}

#[derive(Default)]
pub struct UiState {
    /// Source selected on the cut tab.
    pub source:       Option<PathBuf>,
    /// Correlation id of the probe for `source`; stale probe results are
    /// dropped by comparing against this.
    pub source_probe: Option<Uuid>,
    /// Probe result for `source`, once it arrives.
    pub info:         Option<SourceInfo>,
    pub probe_error:  Option<String>,

    /// Merge tab file list, in concatenation order.
    pub merge_files:  Vec<PathBuf>,

    pub job: Option<ActiveJob>,
}

impl UiState {
    pub fn job_running(&self) -> bool {
        matches!(&self.job, Some(job) if job.phase == JobPhase::Running)
    }
}
