// crates/clipmill-core/src/lib.rs
//
// Pure data and pure logic shared by clipmill-media and clipmill-ui.
// No egui, no ffmpeg, no runtime handles — everything here is unit-testable
// without touching a real video file.

pub mod commands;
pub mod events;
pub mod helpers;
pub mod job;
pub mod plan;
pub mod quality;
