// crates/clipmill-core/src/commands.rs
//
// Every user action in ClipMill is expressed as an AppCommand.
// Tab modules emit these; app.rs processes them after the UI pass.
// Adding a feature = add a variant here + one match arm in app.rs.
//
// Time fields travel as Option<u32>: the module parses its text fields and
// sends None for anything unparseable, which app.rs reports with the same
// dialog as an inverted range.

use uuid::Uuid;

use crate::quality::Quality;

#[derive(Clone, Debug)]
pub enum AppCommand {
    // ── Cut tab ──────────────────────────────────────────────────────────────
    /// Open the source-file picker and probe the chosen file.
    BrowseCutSource,
    StartRangeCut {
        start_sec: Option<u32>,
        end_sec:   Option<u32>,
        quality:   Quality,
    },
    StartSplit {
        part_secs: Option<u32>,
        quality:   Quality,
    },

    // ── Merge tab ────────────────────────────────────────────────────────────
    /// Open the multi-file picker and append the selection to the merge list.
    AddMergeFiles,
    RemoveMergeItem(usize),
    /// Swap the item at `index` with its neighbour above (`up`) or below.
    MoveMergeItem { index: usize, up: bool },
    ClearMergeList,
    StartMerge { quality: Quality },

    // ── Job modal ────────────────────────────────────────────────────────────
    /// Request cooperative cancellation of the active job. The in-flight
    /// encode still runs to completion; only later checkpoints observe this.
    CancelJob(Uuid),
    /// Close the finished / failed / cancelled card.
    DismissJobStatus,

    // ── Chrome ───────────────────────────────────────────────────────────────
    SetLanguage(String),
    ShowAbout,
}
