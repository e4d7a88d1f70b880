// crates/clipmill-media/src/backend.rs
//
// The capability boundary between job logic and FFmpeg.
//
// Jobs never touch codecs directly: they see four operations — probe,
// extract-range, concatenate, encode — behind the MediaBackend trait, so the
// whole of jobs.rs and worker.rs runs under test against a fake.
//
// Clip handles are lazy: extract_range and concatenate only build an edit
// description (which byte ranges of which files, and the output geometry).
// All decoding and encoding happens inside encode(), which materialises the
// description in one pass. This mirrors how the wrapped library treats
// sub-clips — nothing is transcoded until a write is requested.

use std::path::{Path, PathBuf};

use anyhow::Result;

use clipmill_core::events::SourceInfo;
use clipmill_core::quality::Quality;

use crate::encode::encode_clip;
use crate::probe::probe_source;

/// One contiguous slice of one source file, in source-local seconds.
#[derive(Clone, Debug, PartialEq)]
pub struct Segment {
    pub path:     PathBuf,
    pub start:    f64,
    pub duration: f64,
}

/// A lazy edit description: segments in output order plus the geometry every
/// frame is scaled to. Dropping a handle releases everything it holds — no
/// decoder state exists until encode() runs.
#[derive(Clone, Debug, PartialEq)]
pub struct ClipHandle {
    pub segments: Vec<Segment>,
    /// Output width, even (required by YUV420P).
    pub width:    u32,
    /// Output height, even.
    pub height:   u32,
    pub fps:      u32,
}

impl ClipHandle {
    /// A handle over one slice of one source, output geometry taken from the
    /// source itself.
    pub fn single(path: &Path, start: f64, end: f64, info: &SourceInfo) -> ClipHandle {
        ClipHandle {
            segments: vec![Segment {
                path:     path.to_path_buf(),
                start,
                duration: (end - start).max(0.0),
            }],
            width:  even(info.width),
            height: even(info.height),
            fps:    info.fps.max(1),
        }
    }

    pub fn duration(&self) -> f64 {
        self.segments.iter().map(|s| s.duration).sum()
    }
}

/// Round up to the nearest even number (H.264 YUV420P needs even dimensions).
fn even(v: u32) -> u32 {
    (v + 1) & !1
}

/// Fixed-codec encode parameters. Video is always H.264, audio always AAC;
/// the quality preset only moves the video bitrate.
#[derive(Clone, Debug, PartialEq)]
pub struct EncodeSettings {
    /// Target video bitrate in the preset's `"5000k"` notation.
    pub bitrate: &'static str,
}

impl EncodeSettings {
    pub fn from_quality(quality: Quality) -> EncodeSettings {
        EncodeSettings { bitrate: quality.bitrate() }
    }
}

/// The four operations the jobs are allowed to ask of the media layer.
pub trait MediaBackend: Send + Sync {
    /// Open `path` and report duration, geometry, and frame rate.
    fn probe(&self, path: &Path) -> Result<SourceInfo>;

    /// Build a handle over `[start_sec, end_sec]` of `path`.
    fn extract_range(&self, path: &Path, start_sec: f64, end_sec: f64) -> Result<ClipHandle>;

    /// Join handles in list order into one handle, normalising output
    /// geometry across sources that disagree.
    fn concatenate(&self, clips: Vec<ClipHandle>) -> Result<ClipHandle>;

    /// Materialise `clip` into `output`. Blocking; runs to completion or
    /// error — cancellation is checked by the caller between calls, never
    /// inside one.
    fn encode(&self, clip: &ClipHandle, output: &Path, settings: &EncodeSettings) -> Result<()>;
}

// ── FFmpeg implementation ─────────────────────────────────────────────────────

/// Production backend over the in-process FFmpeg bindings.
pub struct FfmpegBackend;

impl MediaBackend for FfmpegBackend {
    fn probe(&self, path: &Path) -> Result<SourceInfo> {
        probe_source(path)
    }

    fn extract_range(&self, path: &Path, start_sec: f64, end_sec: f64) -> Result<ClipHandle> {
        let info = probe_source(path)?;
        Ok(ClipHandle::single(path, start_sec, end_sec, &info))
    }

    fn concatenate(&self, clips: Vec<ClipHandle>) -> Result<ClipHandle> {
        anyhow::ensure!(!clips.is_empty(), "nothing to concatenate");

        // Normalise mismatched sources: every frame is scaled up to the
        // largest geometry in the list; the first clip sets the frame rate.
        let width  = clips.iter().map(|c| c.width).max().unwrap_or(2);
        let height = clips.iter().map(|c| c.height).max().unwrap_or(2);
        let fps    = clips[0].fps;

        Ok(ClipHandle {
            segments: clips.into_iter().flat_map(|c| c.segments).collect(),
            width,
            height,
            fps,
        })
    }

    fn encode(&self, clip: &ClipHandle, output: &Path, settings: &EncodeSettings) -> Result<()> {
        encode_clip(clip, output, settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle(w: u32, h: u32, fps: u32, path: &str) -> ClipHandle {
        let info = SourceInfo { duration_secs: 10.0, width: w, height: h, fps };
        ClipHandle::single(Path::new(path), 0.0, 10.0, &info)
    }

    #[test]
    fn single_handle_is_deterministic() {
        // Identical requests build identical edit descriptions, so a re-run
        // of the same cut always encodes the same duration and geometry.
        let info = SourceInfo { duration_secs: 60.0, width: 1280, height: 720, fps: 30 };
        let a = ClipHandle::single(Path::new("a.mp4"), 10.0, 25.0, &info);
        let b = ClipHandle::single(Path::new("a.mp4"), 10.0, 25.0, &info);
        assert_eq!(a, b);
        assert_eq!(a.duration(), 15.0);
    }

    #[test]
    fn concatenate_normalises_to_largest_geometry() {
        let merged = FfmpegBackend
            .concatenate(vec![
                handle(1280, 720, 30, "a.mp4"),
                handle(640, 480, 25, "b.mp4"),
            ])
            .unwrap();
        assert_eq!((merged.width, merged.height), (1280, 720));
        assert_eq!(merged.fps, 30);
        assert_eq!(merged.segments.len(), 2);
        assert_eq!(merged.segments[0].path, Path::new("a.mp4"));
        assert_eq!(merged.segments[1].path, Path::new("b.mp4"));
    }

    #[test]
    fn odd_dimensions_round_up_to_even() {
        let h = handle(853, 479, 24, "odd.mp4");
        assert_eq!((h.width, h.height), (854, 480));
    }

    #[test]
    fn concatenate_rejects_empty_list() {
        assert!(FfmpegBackend.concatenate(Vec::new()).is_err());
    }
}
