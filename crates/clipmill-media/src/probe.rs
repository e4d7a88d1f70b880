// crates/clipmill-media/src/probe.rs
//
// In-process FFmpeg probing: duration, video geometry, frame rate.

use std::path::Path;

use anyhow::{anyhow, Result};

use ffmpeg_the_third as ffmpeg;
use ffmpeg::format::input;
use ffmpeg::media::Type;

use clipmill_core::events::SourceInfo;

/// Frame rate assumed when the container reports none.
const FALLBACK_FPS: u32 = 30;

pub fn probe_source(path: &Path) -> Result<SourceInfo> {
    let ictx = input(path)
        .map_err(|e| anyhow!("open '{}': {e}", path.display()))?;

    // Container-level duration, falling back to the best stream's own
    // duration when the container leaves it unset (some MKV/TS files).
    let mut duration = ictx.duration() as f64 / ffmpeg::ffi::AV_TIME_BASE as f64;
    if duration <= 0.0 {
        if let Some(stream) = ictx.streams().best(Type::Video)
            .or_else(|| ictx.streams().best(Type::Audio))
        {
            let tb = stream.time_base();
            duration = stream.duration() as f64 * tb.numerator() as f64
                / tb.denominator() as f64;
        }
    }
    if duration <= 0.0 {
        return Err(anyhow!("duration unknown for '{}'", path.display()));
    }

    let video = ictx.streams().best(Type::Video)
        .ok_or_else(|| anyhow!("no video stream in '{}'", path.display()))?;

    let params = video.parameters();
    let (width, height) = (params.width() as u32, params.height() as u32);
    if width == 0 || height == 0 {
        return Err(anyhow!("video geometry unknown for '{}'", path.display()));
    }

    let rate = video.avg_frame_rate();
    let fps = if rate.numerator() > 0 && rate.denominator() > 0 {
        (rate.numerator() as f64 / rate.denominator() as f64).round() as u32
    } else {
        FALLBACK_FPS
    };

    log::info!(
        "[media] probed {}: {duration:.2}s {width}x{height} @{fps}fps",
        path.display()
    );

    Ok(SourceInfo {
        duration_secs: duration,
        width,
        height,
        fps: fps.clamp(1, 240),
    })
}
