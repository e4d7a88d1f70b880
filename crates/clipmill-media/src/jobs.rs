// crates/clipmill-media/src/jobs.rs
//
// The three media jobs, run on the worker thread by MediaWorker.
//
// Shared state machine: Idle → Running → { Finished | Cancelled | Failed }.
// All three terminal states are final — no retries, no resume.
//
// Cancellation is cooperative and checkpoint-based: the flag is read before
// the first encode and between split parts, never during an encode. A job
// that observes the flag exits *silently* — no event fires, because the UI
// initiated the cancellation and already knows. Whatever was written to disk
// before the checkpoint stays there; partial outputs are never rolled back.
//
// Any backend failure becomes exactly one Failed event carrying the error's
// message text. No classification, no cleanup of partial output.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Result;
use crossbeam_channel::Sender;
use uuid::Uuid;

use clipmill_core::events::MediaEvent;
use clipmill_core::job::JobRequest;
use clipmill_core::plan::{part_file_name, progress_percent, split_parts};
use clipmill_core::quality::Quality;

use crate::backend::{EncodeSettings, MediaBackend};

enum Outcome {
    Done(PathBuf),
    Cancelled,
}

/// Execute `request` to a terminal state and report it over `tx`.
pub(crate) fn run(
    backend: &dyn MediaBackend,
    job_id:  Uuid,
    request: &JobRequest,
    cancel:  &AtomicBool,
    tx:      &Sender<MediaEvent>,
) {
    let kind = request.kind();
    let outcome = match request {
        JobRequest::CutRange { source, start_sec, end_sec, output, quality } => {
            cut(backend, source, *start_sec, *end_sec, output, *quality, cancel)
        }
        JobRequest::SplitDuration { source, part_secs, out_dir, quality } => {
            split(backend, source, *part_secs, out_dir, *quality, job_id, cancel, tx)
        }
        JobRequest::Merge { sources, output, quality } => {
            merge(backend, sources, output, *quality, cancel)
        }
    };

    match outcome {
        Ok(Outcome::Done(output)) => {
            let _ = tx.send(MediaEvent::Finished { job_id, kind, output });
        }
        Ok(Outcome::Cancelled) => {
            log::info!("[jobs] {kind:?} job {job_id} cancelled");
        }
        Err(e) => {
            log::error!("[jobs] {kind:?} job {job_id} failed: {e:#}");
            let _ = tx.send(MediaEvent::Failed { job_id, message: e.to_string() });
        }
    }
}

/// Range cut: one segment, one encode.
fn cut(
    backend:   &dyn MediaBackend,
    source:    &Path,
    start_sec: u32,
    end_sec:   u32,
    output:    &Path,
    quality:   Quality,
    cancel:    &AtomicBool,
) -> Result<Outcome> {
    let settings = EncodeSettings::from_quality(quality);
    let clip = backend.extract_range(source, start_sec as f64, end_sec as f64)?;

    // Checkpoint: source opened, nothing written yet.
    if cancel.load(Ordering::Relaxed) {
        return Ok(Outcome::Cancelled);
    }

    backend.encode(&clip, output, &settings)?;

    // A cancellation that arrived during the encode cannot interrupt it, but
    // it still suppresses the finish signal. The written file stays on disk.
    if cancel.load(Ordering::Relaxed) {
        return Ok(Outcome::Cancelled);
    }
    Ok(Outcome::Done(output.to_path_buf()))
}

/// Duration split: one encode per planned part, progress after each,
/// cancellation checkpoint before each.
#[allow(clippy::too_many_arguments)]
fn split(
    backend:   &dyn MediaBackend,
    source:    &Path,
    part_secs: u32,
    out_dir:   &Path,
    quality:   Quality,
    job_id:    Uuid,
    cancel:    &AtomicBool,
    tx:        &Sender<MediaEvent>,
) -> Result<Outcome> {
    let settings = EncodeSettings::from_quality(quality);
    let info = backend.probe(source)?;

    let parts = split_parts(info.duration_secs, part_secs);
    let total = parts.len();
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "clip".into());

    for part in &parts {
        // Checkpoint: parts already written stay on disk.
        if cancel.load(Ordering::Relaxed) {
            return Ok(Outcome::Cancelled);
        }

        let clip = backend.extract_range(source, part.start, part.end)?;
        let output = out_dir.join(part_file_name(&stem, part.index));
        backend.encode(&clip, &output, &settings)?;

        let _ = tx.send(MediaEvent::Progress {
            job_id,
            percent: progress_percent(part.index + 1, total),
        });
    }

    // Checkpoint: a cancellation that lands after the last part still
    // suppresses the finish signal.
    if cancel.load(Ordering::Relaxed) {
        return Ok(Outcome::Cancelled);
    }
    Ok(Outcome::Done(out_dir.to_path_buf()))
}

/// Merge: open every source, concatenate in list order, encode once.
/// Handles are released by drop on every exit path — including the
/// cancelled-before-start one, where no output is produced.
fn merge(
    backend: &dyn MediaBackend,
    sources: &[PathBuf],
    output:  &Path,
    quality: Quality,
    cancel:  &AtomicBool,
) -> Result<Outcome> {
    let settings = EncodeSettings::from_quality(quality);

    let mut clips = Vec::with_capacity(sources.len());
    for source in sources {
        let info = backend.probe(source)?;
        clips.push(backend.extract_range(source, 0.0, info.duration_secs)?);
    }

    // Checkpoint: sources opened, nothing written yet.
    if cancel.load(Ordering::Relaxed) {
        return Ok(Outcome::Cancelled);
    }

    let combined = backend.concatenate(clips)?;
    backend.encode(&combined, output, &settings)?;

    if cancel.load(Ordering::Relaxed) {
        return Ok(Outcome::Cancelled);
    }
    Ok(Outcome::Done(output.to_path_buf()))
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::ClipHandle;
    use clipmill_core::events::SourceInfo;
    use clipmill_core::job::JobKind;
    use crossbeam_channel::unbounded;
    use std::sync::atomic::AtomicUsize;
    use std::sync::{Arc, Mutex};

    /// Records every backend call; optionally fails encodes or raises the
    /// cancel flag after the Nth encode (simulating the user clicking Cancel
    /// while part N is being written).
    struct FakeBackend {
        duration:     f64,
        encodes:      Mutex<Vec<PathBuf>>,
        probes:       AtomicUsize,
        fail_encode:  bool,
        cancel_after: Option<(usize, Arc<AtomicBool>)>,
    }

    impl FakeBackend {
        fn with_duration(duration: f64) -> Self {
            FakeBackend {
                duration,
                encodes:      Mutex::new(Vec::new()),
                probes:       AtomicUsize::new(0),
                fail_encode:  false,
                cancel_after: None,
            }
        }

        fn info(&self) -> SourceInfo {
            SourceInfo {
                duration_secs: self.duration,
                width:         1280,
                height:        720,
                fps:           30,
            }
        }

        fn encoded(&self) -> Vec<PathBuf> {
            self.encodes.lock().unwrap().clone()
        }
    }

    impl MediaBackend for FakeBackend {
        fn probe(&self, _path: &Path) -> Result<SourceInfo> {
            self.probes.fetch_add(1, Ordering::Relaxed);
            Ok(self.info())
        }

        fn extract_range(&self, path: &Path, start: f64, end: f64) -> Result<ClipHandle> {
            Ok(ClipHandle::single(path, start, end, &self.info()))
        }

        fn concatenate(&self, clips: Vec<ClipHandle>) -> Result<ClipHandle> {
            crate::backend::FfmpegBackend.concatenate(clips)
        }

        fn encode(&self, _clip: &ClipHandle, output: &Path, _s: &EncodeSettings) -> Result<()> {
            if self.fail_encode {
                anyhow::bail!("encoder exploded");
            }
            let mut encodes = self.encodes.lock().unwrap();
            encodes.push(output.to_path_buf());
            if let Some((after, flag)) = &self.cancel_after {
                if encodes.len() == *after {
                    flag.store(true, Ordering::Relaxed);
                }
            }
            Ok(())
        }
    }

    fn drain(rx: &crossbeam_channel::Receiver<MediaEvent>) -> Vec<MediaEvent> {
        let mut out = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            out.push(ev);
        }
        out
    }

    #[test]
    fn cut_emits_finished_with_output_path() {
        let backend = FakeBackend::with_duration(60.0);
        let (tx, rx) = unbounded();
        let cancel = AtomicBool::new(false);
        let job_id = Uuid::new_v4();

        let request = JobRequest::CutRange {
            source:    PathBuf::from("movie.mp4"),
            start_sec: 5,
            end_sec:   20,
            output:    PathBuf::from("/out/movie_cut.mp4"),
            quality:   Quality::High,
        };
        run(&backend, job_id, &request, &cancel, &tx);

        let events = drain(&rx);
        assert_eq!(events.len(), 1);
        assert!(matches!(
            &events[0],
            MediaEvent::Finished { job_id: id, kind: JobKind::Cut, output }
                if *id == job_id && output == Path::new("/out/movie_cut.mp4")
        ));
        assert_eq!(backend.encoded().len(), 1);
    }

    #[test]
    fn cut_cancelled_before_encode_is_silent() {
        let backend = FakeBackend::with_duration(60.0);
        let (tx, rx) = unbounded();
        let cancel = AtomicBool::new(true);

        let request = JobRequest::CutRange {
            source:    PathBuf::from("movie.mp4"),
            start_sec: 0,
            end_sec:   10,
            output:    PathBuf::from("/out/movie_cut.mp4"),
            quality:   Quality::Medium,
        };
        run(&backend, Uuid::new_v4(), &request, &cancel, &tx);

        assert!(drain(&rx).is_empty());
        assert!(backend.encoded().is_empty());
    }

    #[test]
    fn cut_cancelled_during_encode_finishes_the_file_but_stays_silent() {
        // The cancel flag raised mid-encode cannot interrupt the write, but
        // it suppresses the finish signal afterwards.
        let cancel = Arc::new(AtomicBool::new(false));
        let mut backend = FakeBackend::with_duration(60.0);
        backend.cancel_after = Some((1, Arc::clone(&cancel)));
        let (tx, rx) = unbounded();

        let request = JobRequest::CutRange {
            source:    PathBuf::from("movie.mp4"),
            start_sec: 0,
            end_sec:   10,
            output:    PathBuf::from("/out/movie_cut.mp4"),
            quality:   Quality::Medium,
        };
        run(&backend, Uuid::new_v4(), &request, &cancel, &tx);

        // The file was written, but no event fires.
        assert_eq!(backend.encoded(), vec![PathBuf::from("/out/movie_cut.mp4")]);
        assert!(drain(&rx).is_empty());
    }

    #[test]
    fn cut_failure_emits_one_failed_event() {
        let mut backend = FakeBackend::with_duration(60.0);
        backend.fail_encode = true;
        let (tx, rx) = unbounded();
        let cancel = AtomicBool::new(false);
        let job_id = Uuid::new_v4();

        let request = JobRequest::CutRange {
            source:    PathBuf::from("movie.mp4"),
            start_sec: 0,
            end_sec:   10,
            output:    PathBuf::from("/out/movie_cut.mp4"),
            quality:   Quality::Medium,
        };
        run(&backend, job_id, &request, &cancel, &tx);

        let events = drain(&rx);
        assert_eq!(events.len(), 1);
        assert!(matches!(
            &events[0],
            MediaEvent::Failed { job_id: id, message }
                if *id == job_id && message.contains("encoder exploded")
        ));
    }

    #[test]
    fn split_covers_total_and_reports_progress() {
        // 125 s at 60 s per part → holiday_part_1..3, progress 33/67/100.
        let backend = FakeBackend::with_duration(125.0);
        let (tx, rx) = unbounded();
        let cancel = AtomicBool::new(false);
        let job_id = Uuid::new_v4();

        let request = JobRequest::SplitDuration {
            source:    PathBuf::from("/media/holiday.mp4"),
            part_secs: 60,
            out_dir:   PathBuf::from("/out"),
            quality:   Quality::Medium,
        };
        run(&backend, job_id, &request, &cancel, &tx);

        assert_eq!(
            backend.encoded(),
            vec![
                PathBuf::from("/out/holiday_part_1.mp4"),
                PathBuf::from("/out/holiday_part_2.mp4"),
                PathBuf::from("/out/holiday_part_3.mp4"),
            ]
        );

        let events = drain(&rx);
        let percents: Vec<u8> = events.iter()
            .filter_map(|ev| match ev {
                MediaEvent::Progress { percent, .. } => Some(*percent),
                _ => None,
            })
            .collect();
        assert_eq!(percents, vec![33, 67, 100]);
        assert!(matches!(
            events.last(),
            Some(MediaEvent::Finished { kind: JobKind::Split, output, .. })
                if output == Path::new("/out")
        ));
    }

    #[test]
    fn split_cancelled_after_part_two_stops_and_stays_silent() {
        // 5-part split, cancel raised while part 2 encodes: parts 1–2 exist,
        // parts 3–5 are never produced, and no success event fires.
        let cancel = Arc::new(AtomicBool::new(false));
        let mut backend = FakeBackend::with_duration(300.0);
        backend.cancel_after = Some((2, Arc::clone(&cancel)));
        let (tx, rx) = unbounded();

        let request = JobRequest::SplitDuration {
            source:    PathBuf::from("/media/long.mp4"),
            part_secs: 60,
            out_dir:   PathBuf::from("/out"),
            quality:   Quality::Low,
        };
        run(&backend, Uuid::new_v4(), &request, &cancel, &tx);

        assert_eq!(
            backend.encoded(),
            vec![
                PathBuf::from("/out/long_part_1.mp4"),
                PathBuf::from("/out/long_part_2.mp4"),
            ]
        );

        let events = drain(&rx);
        let percents: Vec<u8> = events.iter()
            .filter_map(|ev| match ev {
                MediaEvent::Progress { percent, .. } => Some(*percent),
                _ => None,
            })
            .collect();
        assert_eq!(percents, vec![20, 40]);
        assert!(!events.iter().any(|ev| matches!(ev, MediaEvent::Finished { .. })));
    }

    #[test]
    fn merge_opens_every_source_and_encodes_once() {
        let backend = FakeBackend::with_duration(30.0);
        let (tx, rx) = unbounded();
        let cancel = AtomicBool::new(false);
        let job_id = Uuid::new_v4();

        let request = JobRequest::Merge {
            sources: vec![
                PathBuf::from("a.mp4"),
                PathBuf::from("b.mp4"),
                PathBuf::from("c.mp4"),
            ],
            output:  PathBuf::from("/out/merged_video.mp4"),
            quality: Quality::Medium,
        };
        run(&backend, job_id, &request, &cancel, &tx);

        assert_eq!(backend.probes.load(Ordering::Relaxed), 3);
        assert_eq!(backend.encoded(), vec![PathBuf::from("/out/merged_video.mp4")]);
        assert!(matches!(
            drain(&rx).as_slice(),
            [MediaEvent::Finished { kind: JobKind::Merge, .. }]
        ));
    }

    #[test]
    fn merge_cancelled_before_start_produces_nothing() {
        let backend = FakeBackend::with_duration(30.0);
        let (tx, rx) = unbounded();
        let cancel = AtomicBool::new(true);

        let request = JobRequest::Merge {
            sources: vec![PathBuf::from("a.mp4"), PathBuf::from("b.mp4")],
            output:  PathBuf::from("/out/merged_video.mp4"),
            quality: Quality::Medium,
        };
        run(&backend, Uuid::new_v4(), &request, &cancel, &tx);

        // Sources were opened, then released without an encode or an event.
        assert_eq!(backend.probes.load(Ordering::Relaxed), 2);
        assert!(backend.encoded().is_empty());
        assert!(drain(&rx).is_empty());
    }
}
