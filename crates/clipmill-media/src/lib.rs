// crates/clipmill-media/src/lib.rs
//
// No egui dependency — communicates with clipmill-ui via channels only.
//
// Layout:
//   backend.rs — the MediaBackend capability boundary + FFmpeg implementation
//   probe.rs   — in-process FFmpeg probing (duration, geometry, frame rate)
//   encode.rs  — single-pass H.264 + AAC encode of a clip description
//   jobs.rs    — the three media jobs (cut, split, merge) and their
//                checkpoint-based cancellation semantics
//   worker.rs  — MediaWorker: the single-slot background job dispatcher

pub mod backend;
pub mod jobs;
pub mod worker;

mod encode;
mod probe;

// Re-export the main public API so clipmill-ui imports are simple.
pub use backend::{ClipHandle, EncodeSettings, FfmpegBackend, MediaBackend, Segment};
pub use worker::{MediaWorker, SubmitError};
