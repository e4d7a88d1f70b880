// crates/clipmill-core/src/events.rs
//
// Types that flow across the channel between clipmill-media and clipmill-ui.
// Payloads are plain immutable data — the worker never hands the UI a
// reference into its own state.

use std::path::PathBuf;
use uuid::Uuid;

use crate::job::JobKind;

/// Container-level facts about one source file, as reported by the backend.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SourceInfo {
    pub duration_secs: f64,
    pub width:         u32,
    pub height:        u32,
    /// Integer output frame rate. Sources with fractional rates are rounded;
    /// sources that report no rate at all default to 30.
    pub fps:           u32,
}

/// Everything the background side ever tells the UI.
///
/// Progress is emitted only by duration-split (one update per finished part).
/// Range-cut and merge are single-pass and report nothing until terminal.
/// A cancelled job emits no terminal event at all — the UI already knows,
/// because it requested the cancellation.
#[derive(Clone, Debug)]
pub enum MediaEvent {
    SourceProbed { id: Uuid, info: SourceInfo },
    ProbeFailed  { id: Uuid, message: String },
    Progress     { job_id: Uuid, percent: u8 },
    Finished     { job_id: Uuid, kind: JobKind, output: PathBuf },
    Failed       { job_id: Uuid, message: String },
}
