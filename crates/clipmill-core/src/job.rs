// crates/clipmill-core/src/job.rs
//
// Job requests and their pre-submission validation.
//
// A JobRequest is built by the UI after every field has been checked, handed
// to MediaWorker::submit exactly once, and never mutated afterwards. All
// validation failures map to a localisation key so the UI can show the
// dialog text in the active language.

use std::path::{Path, PathBuf};

use crate::quality::Quality;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JobKind {
    Cut,
    Split,
    Merge,
}

/// One background media operation, fully parameterised.
#[derive(Clone, Debug)]
pub enum JobRequest {
    /// Extract `[start_sec, end_sec]` of `source` into `output`.
    CutRange {
        source:    PathBuf,
        start_sec: u32,
        end_sec:   u32,
        output:    PathBuf,
        quality:   Quality,
    },
    /// Partition `source` into consecutive `part_secs`-long files in `out_dir`.
    SplitDuration {
        source:    PathBuf,
        part_secs: u32,
        out_dir:   PathBuf,
        quality:   Quality,
    },
    /// Concatenate `sources` in list order into `output`.
    Merge {
        sources: Vec<PathBuf>,
        output:  PathBuf,
        quality: Quality,
    },
}

impl JobRequest {
    pub fn kind(&self) -> JobKind {
        match self {
            JobRequest::CutRange { .. }      => JobKind::Cut,
            JobRequest::SplitDuration { .. } => JobKind::Split,
            JobRequest::Merge { .. }         => JobKind::Merge,
        }
    }

    /// Caller-side validation. Must pass before the request reaches the
    /// worker — the jobs themselves assume these invariants hold.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            JobRequest::CutRange { source, start_sec, end_sec, .. } => {
                require_file(source)?;
                if start_sec >= end_sec {
                    return Err(ValidationError::InvalidRange);
                }
                Ok(())
            }
            JobRequest::SplitDuration { source, part_secs, .. } => {
                require_file(source)?;
                if *part_secs == 0 {
                    return Err(ValidationError::InvalidPartDuration);
                }
                Ok(())
            }
            JobRequest::Merge { sources, .. } => {
                if sources.len() < 2 {
                    return Err(ValidationError::TooFewMergeInputs);
                }
                for s in sources {
                    require_file(s)?;
                }
                Ok(())
            }
        }
    }
}

fn require_file(path: &Path) -> Result<(), ValidationError> {
    if path.is_file() {
        Ok(())
    } else {
        Err(ValidationError::MissingSource(path.to_path_buf()))
    }
}

/// Everything a request can be rejected for before a job starts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ValidationError {
    MissingSource(PathBuf),
    /// start ≥ end, or a time field that did not parse.
    InvalidRange,
    InvalidPartDuration,
    TooFewMergeInputs,
}

impl ValidationError {
    pub fn message_key(&self) -> &'static str {
        match self {
            ValidationError::MissingSource(_)    => "file_not_selected_error",
            ValidationError::InvalidRange        => "start_time_error",
            ValidationError::InvalidPartDuration => "invalid_duration_error",
            ValidationError::TooFewMergeInputs   => "merge_list_empty_error",
        }
    }
}
