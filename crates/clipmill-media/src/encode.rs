// crates/clipmill-media/src/encode.rs
//
// Single-pass H.264 + AAC MP4 encode of a lazy clip description.
//
// encode_clip() walks the handle's segments in order, decodes each one,
// scales every frame to the handle's output geometry, and feeds one shared
// video encoder + one shared audio encoder. That one loop covers all three
// jobs: a cut is one segment, a split part is one segment, a merge is many
// segments with mismatched sources normalised to a common geometry.
//
// Stream layout in the output MP4:
//   Stream 0 — H.264 video (YUV420P, bitrate from the quality preset)
//   Stream 1 — AAC audio  (FLTP stereo, 44100 Hz, 128 kbps)
//
// PTS strategy:
//   Video: monotonically increasing frame counter in 1/fps.
//   Audio: monotonically increasing sample counter in 1/44100.
//   Both start at zero, so trimming and multi-segment joins never leak the
//   source files' timestamps into the output.
//
// Audio FIFO:
//   AAC wants exactly encoder.frame_size() samples per input frame, while
//   decoded audio arrives in arbitrary chunks. All resampled PCM goes
//   through a stereo FLTP ring buffer; full frames are popped off the front
//   and any remainder carries across segment boundaries, which is what keeps
//   merged audio gap-free. The tail is zero-padded and flushed at the end.
//
// Cancellation never reaches this module. Jobs check their flag only between
// encode calls, so one encode_clip call always runs to completion or error.

use std::path::Path;

use anyhow::{anyhow, Result};

use ffmpeg_the_third as ffmpeg;
use ffmpeg::codec::{self, Id as CodecId};
use ffmpeg::encoder;
use ffmpeg::format::sample::Type as SampleType;
use ffmpeg::format::{input as open_input, output as open_output, Pixel, Sample};
use ffmpeg::media::Type as MediaType;
use ffmpeg::software::resampling;
use ffmpeg::software::scaling::{Context as ScaleCtx, Flags as ScaleFlags};
use ffmpeg::util::channel_layout::{ChannelLayout, ChannelLayoutMask};
use ffmpeg::util::frame::audio::Audio as AudioFrame;
use ffmpeg::util::frame::video::Video as VideoFrame;
use ffmpeg::util::rational::Rational;
use ffmpeg::Packet;

use crate::backend::{ClipHandle, EncodeSettings, Segment};

// ── Constants ─────────────────────────────────────────────────────────────────

/// Output audio sample rate.
const AUDIO_RATE: i32 = 44_100;

/// Output audio bitrate.
const AUDIO_BITRATE: usize = 128_000;

/// Target audio sample format: float planar, what the native AAC encoder eats.
const AUDIO_FMT: Sample = Sample::F32(SampleType::Planar);

/// Parse a `"5000k"`-style bitrate label into bits per second.
fn parse_bitrate(label: &str) -> Result<usize> {
    let (digits, mult) = match label.strip_suffix(['k', 'K']) {
        Some(d) => (d, 1000usize),
        None    => (label, 1),
    };
    digits
        .parse::<usize>()
        .map(|v| v * mult)
        .map_err(|_| anyhow!("bad bitrate label '{label}'"))
}

// ── Public entry point ────────────────────────────────────────────────────────

/// Materialise `clip` into `output`. Blocking — run on the worker thread.
pub(crate) fn encode_clip(
    clip:     &ClipHandle,
    output:   &Path,
    settings: &EncodeSettings,
) -> Result<()> {
    anyhow::ensure!(!clip.segments.is_empty(), "nothing to encode: clip is empty");

    let bitrate = parse_bitrate(settings.bitrate)?;
    log::info!(
        "[media] encode {} segment(s) → {} ({}x{} @{}fps, {})",
        clip.segments.len(),
        output.display(),
        clip.width,
        clip.height,
        clip.fps,
        settings.bitrate,
    );

    // ── Output context ────────────────────────────────────────────────────────
    let mut octx = open_output(output)
        .map_err(|e| anyhow!("could not open output '{}': {e}", output.display()))?;

    // ── Video encoder (stream 0) ──────────────────────────────────────────────
    // The codec context is created independently of the output stream —
    // Stream does not expose a .codec() accessor in this version of the
    // bindings; codec parameters are copied over via FFI below.
    let frame_tb = Rational::new(1, clip.fps as i32);

    let h264 = encoder::find(CodecId::H264)
        .ok_or_else(|| anyhow!("H.264 encoder not found — is libx264 available?"))?;

    let mut ost_video = octx.add_stream(h264)
        .map_err(|e| anyhow!("add video stream: {e}"))?;
    ost_video.set_time_base(frame_tb);

    let video_ctx = codec::context::Context::new_with_codec(h264);
    let mut video_enc = video_ctx.encoder().video()
        .map_err(|e| anyhow!("create video encoder context: {e}"))?;

    video_enc.set_width(clip.width);
    video_enc.set_height(clip.height);
    video_enc.set_format(Pixel::YUV420P);
    video_enc.set_time_base(frame_tb);
    video_enc.set_frame_rate(Some(Rational::new(clip.fps as i32, 1)));
    video_enc.set_bit_rate(bitrate);

    let mut opts = ffmpeg::Dictionary::new();
    opts.set("preset", "medium");

    let mut video_encoder = video_enc.open_as_with(h264, opts)
        .map_err(|e| anyhow!("open H.264 encoder: {e}"))?;

    // Square pixels must be forced on the OPENED context — libavcodec resets
    // sample_aspect_ratio during codec init, clobbering anything set earlier.
    video_encoder.set_aspect_ratio(Rational::new(1, 1));

    // Copy encoder params into the stream's codecpar so the muxer knows the
    // resolution, format, and codec-private data. set_parameters() wants
    // AsPtr<AVCodecParameters>, which encoder::Video does not implement.
    unsafe {
        let ret = ffmpeg::ffi::avcodec_parameters_from_context(
            (**(*octx.as_mut_ptr()).streams.add(0)).codecpar,
            video_encoder.as_ptr() as *mut ffmpeg::ffi::AVCodecContext,
        );
        if ret < 0 {
            return Err(anyhow!("avcodec_parameters_from_context (video) failed: {ret}"));
        }
    }

    // ── Audio encoder (stream 1) ──────────────────────────────────────────────
    // All source audio is resampled to 44100 Hz stereo FLTP before entering
    // the FIFO, so the encoder side never transcodes formats.
    let audio_tb = Rational::new(1, AUDIO_RATE);

    let aac = encoder::find(CodecId::AAC)
        .ok_or_else(|| anyhow!("AAC encoder not found"))?;

    let mut ost_audio = octx.add_stream(aac)
        .map_err(|e| anyhow!("add audio stream: {e}"))?;
    ost_audio.set_time_base(audio_tb);

    let audio_ctx = codec::context::Context::new_with_codec(aac);
    let mut audio_enc = audio_ctx.encoder().audio()
        .map_err(|e| anyhow!("create audio encoder context: {e}"))?;

    audio_enc.set_rate(AUDIO_RATE);
    audio_enc.set_ch_layout(ChannelLayout::STEREO);
    audio_enc.set_format(AUDIO_FMT);
    audio_enc.set_bit_rate(AUDIO_BITRATE);

    let audio_encoder = audio_enc.open_as_with(aac, ffmpeg::Dictionary::new())
        .map_err(|e| anyhow!("open AAC encoder: {e}"))?;

    // Guard against a codec that reports 0 (shouldn't happen with AAC).
    let audio_frame_size = (audio_encoder.frame_size() as usize).max(1024);

    // Muxer-assigned timebase for stream 1, read before the header is written.
    let mux_audio_tb = octx.stream(1).unwrap().time_base();

    unsafe {
        let ret = ffmpeg::ffi::avcodec_parameters_from_context(
            (**(*octx.as_mut_ptr()).streams.add(1)).codecpar,
            audio_encoder.as_ptr() as *mut ffmpeg::ffi::AVCodecContext,
        );
        if ret < 0 {
            return Err(anyhow!("avcodec_parameters_from_context (audio) failed: {ret}"));
        }
    }

    // ── Write header, then walk the segments ──────────────────────────────────
    octx.write_header()
        .map_err(|e| anyhow!("write output header: {e}"))?;

    let mut audio = AudioPipe {
        encoder:    audio_encoder,
        next_pts:   0,
        frame_size: audio_frame_size,
        fifo:       SampleFifo::default(),
        enc_tb:     audio_tb,
        mux_tb:     mux_audio_tb,
    };

    let mut frame_idx: i64 = 0;
    for segment in &clip.segments {
        frame_idx = encode_segment(
            segment,
            clip,
            &mut octx,
            &mut video_encoder,
            &mut audio,
            frame_idx,
            frame_tb,
        )?;
    }

    // ── Flush video encoder ───────────────────────────────────────────────────
    video_encoder.send_eof()
        .map_err(|e| anyhow!("send EOF to video encoder: {e}"))?;

    let mux_video_tb = octx.stream(0).unwrap().time_base();
    let mut pkt = Packet::empty();
    while video_encoder.receive_packet(&mut pkt).is_ok() {
        pkt.set_stream(0);
        pkt.rescale_ts(frame_tb, mux_video_tb);
        pkt.write_interleaved(&mut octx)
            .map_err(|e| anyhow!("write flush video packet: {e}"))?;
    }

    // ── Flush audio FIFO then encoder ─────────────────────────────────────────
    audio.drain(&mut octx, true)?;
    audio.finish(&mut octx)?;

    octx.write_trailer()
        .map_err(|e| anyhow!("write trailer: {e}"))?;

    log::info!("[media] encode done → {}", output.display());
    Ok(())
}

// ── Audio FIFO ────────────────────────────────────────────────────────────────

/// Stereo FLTP sample ring buffer. Mono sources are duplicated onto both
/// planes so the output is always true stereo.
#[derive(Default)]
struct SampleFifo {
    left:  Vec<f32>,
    right: Vec<f32>,
}

impl SampleFifo {
    fn len(&self) -> usize {
        self.left.len()
    }

    /// Append one decoded / resampled FLTP frame.
    fn push(&mut self, frame: &AudioFrame) {
        let n = frame.samples();
        if n == 0 {
            return;
        }
        unsafe {
            let l = frame.data(0);
            self.left.extend_from_slice(
                std::slice::from_raw_parts(l.as_ptr() as *const f32, n),
            );
            // Stereo frames use plane 1; mono duplicates plane 0.
            let r = if frame.ch_layout().channels() >= 2 { frame.data(1) } else { frame.data(0) };
            self.right.extend_from_slice(
                std::slice::from_raw_parts(r.as_ptr() as *const f32, n),
            );
        }
    }

    /// Pop one encoder-sized frame from the front, zero-padding the tail when
    /// fewer than `n` samples remain (only the final flush frame does this).
    fn pop_frame(&mut self, n: usize, pts: i64) -> AudioFrame {
        let available = self.left.len().min(n);

        let mut frame = AudioFrame::new(AUDIO_FMT, n, ChannelLayoutMask::STEREO);
        frame.set_rate(AUDIO_RATE as u32);
        frame.set_pts(Some(pts));

        unsafe {
            for (plane, src) in [(0usize, &self.left), (1usize, &self.right)] {
                let data = frame.data_mut(plane);
                let dst = std::slice::from_raw_parts_mut(data.as_mut_ptr() as *mut f32, n);
                dst[..available].copy_from_slice(&src[..available]);
                if available < n {
                    dst[available..].fill(0.0);
                }
            }
        }

        self.left.drain(..available);
        self.right.drain(..available);
        frame
    }
}

// ── Audio encoder state ───────────────────────────────────────────────────────

/// Drives the AAC encoder across all segments of one encode.
struct AudioPipe {
    encoder:    ffmpeg::encoder::Audio,
    /// Next output frame's PTS in samples (timebase 1/44100).
    next_pts:   i64,
    /// AAC input frame size in samples (typically 1024).
    frame_size: usize,
    fifo:       SampleFifo,
    enc_tb:     Rational,
    mux_tb:     Rational,
}

impl AudioPipe {
    /// Drain buffered samples → encode → write interleaved. With `flush`
    /// set, a final partial frame is zero-padded and sent so no PCM is lost.
    fn drain(
        &mut self,
        octx:  &mut ffmpeg::format::context::Output,
        flush: bool,
    ) -> Result<()> {
        while self.fifo.len() >= self.frame_size || (flush && self.fifo.len() > 0) {
            let frame = self.fifo.pop_frame(self.frame_size, self.next_pts);
            self.next_pts += self.frame_size as i64;

            self.encoder.send_frame(&frame)
                .map_err(|e| anyhow!("send audio frame to encoder: {e}"))?;
            self.write_packets(octx)?;
        }
        Ok(())
    }

    fn write_packets(&mut self, octx: &mut ffmpeg::format::context::Output) -> Result<()> {
        let mut pkt = Packet::empty();
        while self.encoder.receive_packet(&mut pkt).is_ok() {
            pkt.set_stream(1);
            pkt.rescale_ts(self.enc_tb, self.mux_tb);
            pkt.write_interleaved(octx)
                .map_err(|e| anyhow!("write audio packet: {e}"))?;
        }
        Ok(())
    }

    /// Send EOF to the AAC encoder and flush its remaining packets.
    fn finish(&mut self, octx: &mut ffmpeg::format::context::Output) -> Result<()> {
        self.encoder.send_eof()
            .map_err(|e| anyhow!("send EOF to audio encoder: {e}"))?;
        self.write_packets(octx)
    }
}

// ── Per-segment encode ────────────────────────────────────────────────────────

/// Decode one segment and feed its frames to the shared encoders, starting
/// video output PTS at `frame_idx`. Returns the next unused frame index.
///
/// Video and audio are demuxed from the same packet loop so their relative
/// timing survives. Audio before the trim in-point is discarded; audio is
/// not cut at the out-point — the slight over-run lands in the FIFO and is
/// consumed at the start of the next segment (or flushed at the very end),
/// keeping the output audio continuous.
fn encode_segment(
    segment:       &Segment,
    clip:          &ClipHandle,
    octx:          &mut ffmpeg::format::context::Output,
    video_encoder: &mut ffmpeg::encoder::video::Video,
    audio:         &mut AudioPipe,
    mut frame_idx: i64,
    frame_tb:      Rational,
) -> Result<i64> {
    // ── Open input ────────────────────────────────────────────────────────────
    let mut ictx = open_input(&segment.path)
        .map_err(|e| anyhow!("open '{}': {e}", segment.path.display()))?;

    let video_idx = ictx.streams().best(MediaType::Video)
        .ok_or_else(|| anyhow!("no video stream in '{}'", segment.path.display()))?
        .index();

    // Audio is optional — silent sources produce silence via FIFO carry-over.
    let audio_idx: Option<usize> = ictx.streams().best(MediaType::Audio).map(|s| s.index());

    let in_video_tb = ictx.stream(video_idx).unwrap().time_base();

    // ── Video decoder ─────────────────────────────────────────────────────────
    let vdec_ctx = codec::context::Context::from_parameters(
        ictx.stream(video_idx).unwrap().parameters(),
    ).map_err(|e| anyhow!("video decoder context: {e}"))?;
    let mut video_decoder = vdec_ctx.decoder().video()
        .map_err(|e| anyhow!("open video decoder: {e}"))?;

    // ── Audio decoder (optional, soft-fail) ───────────────────────────────────
    let mut audio_decoder: Option<ffmpeg::decoder::audio::Audio> = None;
    let mut in_audio_tb = Rational::new(1, AUDIO_RATE);
    if let Some(ai) = audio_idx {
        let ast = ictx.stream(ai).unwrap();
        in_audio_tb = ast.time_base();
        match codec::context::Context::from_parameters(ast.parameters())
            .and_then(|ctx| ctx.decoder().audio())
        {
            Ok(dec) => audio_decoder = Some(dec),
            Err(e)  => log::warn!(
                "[media] audio decoder unavailable for '{}': {e}",
                segment.path.display()
            ),
        }
    }

    // Display dimensions (visible pixels). AVFrame carries *coded* dimensions
    // padded to macroblock size (1920×1088 for 1080p); feeding those to the
    // scaler would smear the padding rows into the output.
    let (src_w, src_h) = {
        let stream = ictx.stream(video_idx).unwrap();
        let params = stream.parameters();
        let (w, h) = (params.width() as u32, params.height() as u32);
        if w > 0 && h > 0 { (w, h) } else { (video_decoder.width(), video_decoder.height()) }
    };

    // ── Seek to the trim in-point ─────────────────────────────────────────────
    // Skipped at zero: the demuxer already starts there, and seeking a fresh
    // context to 0 returns EPERM on some platforms.
    if segment.start > 0.0 {
        let ts = (segment.start * ffmpeg::ffi::AV_TIME_BASE as f64) as i64;
        ictx.seek(ts, ts..)
            .map_err(|e| anyhow!("seek in '{}': {e}", segment.path.display()))?;
    }

    // Converters are built on the first frame of each type, once the real
    // source formats are known.
    let mut scaler:    Option<ScaleCtx>            = None;
    let mut resampler: Option<resampling::Context> = None;

    let segment_end = segment.start + segment.duration;
    let mux_video_tb = octx.stream(0).unwrap().time_base();
    let half_frame = 0.5 / clip.fps as f64;

    // ── Packet loop ───────────────────────────────────────────────────────────
    'packets: for result in ictx.packets() {
        let (stream, packet) = result
            .map_err(|e| anyhow!("read packet from '{}': {e}", segment.path.display()))?;
        let sidx = stream.index();

        if sidx == video_idx {
            video_decoder.send_packet(&packet)
                .map_err(|e| anyhow!("send video packet to decoder: {e}"))?;

            let mut decoded = VideoFrame::empty();
            while video_decoder.receive_frame(&mut decoded).is_ok() {
                let pts_secs = decoded.pts()
                    .map(|pts| pts as f64 * f64::from(in_video_tb))
                    .unwrap_or(0.0);

                // Pre-roll before the in-point; done past the out-point.
                if pts_secs < segment.start - half_frame { continue; }
                if pts_secs >= segment_end { break 'packets; }

                frame_idx = push_video_frame(
                    &decoded, clip, src_w, src_h, &mut scaler,
                    video_encoder, octx, frame_idx, frame_tb, mux_video_tb,
                )?;
            }
        } else if Some(sidx) == audio_idx {
            if let Some(ref mut adec) = audio_decoder {
                // A bad audio packet must not abort the whole encode.
                if adec.send_packet(&packet).is_err() { continue; }

                let mut raw = AudioFrame::empty();
                while adec.receive_frame(&mut raw).is_ok() {
                    let pts_secs = raw.pts()
                        .map(|pts| pts as f64 * f64::from(in_audio_tb))
                        .unwrap_or(0.0);
                    // Generous window so a frame spanning the exact trim
                    // boundary is kept rather than silenced.
                    if pts_secs < segment.start - 0.05 { continue; }

                    push_audio_frame(&raw, &mut resampler, audio)?;
                    audio.drain(octx, false)?;
                }
            }
        }
    }

    // ── Drain decoders at segment end ─────────────────────────────────────────
    // B-frame codecs hold frames internally; flush them out.
    let _ = video_decoder.send_eof();
    let mut decoded = VideoFrame::empty();
    while video_decoder.receive_frame(&mut decoded).is_ok() {
        let pts_secs = decoded.pts()
            .map(|pts| pts as f64 * f64::from(in_video_tb))
            .unwrap_or(0.0);
        if pts_secs >= segment_end { break; }
        frame_idx = push_video_frame(
            &decoded, clip, src_w, src_h, &mut scaler,
            video_encoder, octx, frame_idx, frame_tb, mux_video_tb,
        )?;
    }

    if let Some(ref mut adec) = audio_decoder {
        let _ = adec.send_eof();
        let mut raw = AudioFrame::empty();
        while adec.receive_frame(&mut raw).is_ok() {
            push_audio_frame(&raw, &mut resampler, audio)?;
        }
        audio.drain(octx, false)?;
    }

    Ok(frame_idx)
}

/// Scale one decoded frame to the output geometry and encode it.
#[allow(clippy::too_many_arguments)]
fn push_video_frame(
    decoded:       &VideoFrame,
    clip:          &ClipHandle,
    src_w:         u32,
    src_h:         u32,
    scaler:        &mut Option<ScaleCtx>,
    video_encoder: &mut ffmpeg::encoder::video::Video,
    octx:          &mut ffmpeg::format::context::Output,
    frame_idx:     i64,
    frame_tb:      Rational,
    mux_video_tb:  Rational,
) -> Result<i64> {
    if scaler.is_none() {
        let sc = ScaleCtx::get(
            decoded.format(), src_w,      src_h,
            Pixel::YUV420P,   clip.width, clip.height,
            ScaleFlags::BILINEAR,
        ).map_err(|e| anyhow!("create scaler: {e}"))?;
        *scaler = Some(sc);
    }
    let sc = scaler.as_mut().unwrap();

    let mut yuv = VideoFrame::empty();
    sc.run(decoded, &mut yuv)
        .map_err(|e| anyhow!("scale video frame: {e}"))?;

    yuv.set_pts(Some(frame_idx));
    yuv.set_kind(decoded.kind());
    // swscale inherits the source SAR; override to 1:1 so players don't
    // letterbox. No safe setter exists — write the AVFrame field directly.
    unsafe {
        (*yuv.as_mut_ptr()).sample_aspect_ratio =
            ffmpeg::ffi::AVRational { num: 1, den: 1 };
    }

    video_encoder.send_frame(&yuv)
        .map_err(|e| anyhow!("send video frame to encoder: {e}"))?;

    let mut pkt = Packet::empty();
    while video_encoder.receive_packet(&mut pkt).is_ok() {
        pkt.set_stream(0);
        pkt.rescale_ts(frame_tb, mux_video_tb);
        pkt.write_interleaved(octx)
            .map_err(|e| anyhow!("write video packet: {e}"))?;
    }

    Ok(frame_idx + 1)
}

/// Resample one decoded audio frame to FLTP stereo 44100 and push it into
/// the FIFO. The resampler is built lazily on the first frame that needs it;
/// mono sources must be declared MONO or swr misreads the layout.
fn push_audio_frame(
    raw:       &AudioFrame,
    resampler: &mut Option<resampling::Context>,
    audio:     &mut AudioPipe,
) -> Result<()> {
    let channels = raw.ch_layout().channels();
    let needs_resample = raw.format() != AUDIO_FMT
        || raw.rate() != AUDIO_RATE as u32
        || channels   != 2;

    if !needs_resample {
        audio.fifo.push(raw);
        return Ok(());
    }

    if resampler.is_none() {
        let src_layout = if channels >= 2 { raw.ch_layout() } else { ChannelLayout::MONO };
        let rs = resampling::Context::get2(
            raw.format(), src_layout,            raw.rate(),
            AUDIO_FMT,    ChannelLayout::STEREO, AUDIO_RATE as u32,
        ).map_err(|e| anyhow!("create audio resampler: {e}"))?;
        *resampler = Some(rs);
    }
    let rs = resampler.as_mut().unwrap();

    let mut resampled = AudioFrame::empty();
    if rs.run(raw, &mut resampled).is_ok() && resampled.samples() > 0 {
        audio.fifo.push(&resampled);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bitrate_labels_parse() {
        assert_eq!(parse_bitrate("1000k").unwrap(), 1_000_000);
        assert_eq!(parse_bitrate("5000k").unwrap(), 5_000_000);
        assert_eq!(parse_bitrate("10000k").unwrap(), 10_000_000);
        assert_eq!(parse_bitrate("800000").unwrap(), 800_000);
    }

    #[test]
    fn bad_bitrate_labels_error() {
        assert!(parse_bitrate("").is_err());
        assert!(parse_bitrate("fastest").is_err());
        assert!(parse_bitrate("10m").is_err());
    }
}
