// crates/clipmill-media/tests/worker_tests.rs
//
// End-to-end MediaWorker tests against a gated fake backend: the fake's
// encode() blocks until the test releases it, which makes the single-slot
// policy and the cancellation checkpoints observable without timing games.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use anyhow::Result;
use crossbeam_channel::{unbounded, Receiver, Sender};
use uuid::Uuid;

use clipmill_core::events::{MediaEvent, SourceInfo};
use clipmill_core::job::{JobKind, JobRequest};
use clipmill_core::quality::Quality;
use clipmill_media::{ClipHandle, EncodeSettings, MediaBackend, MediaWorker, SubmitError};

/// Fake backend whose encode() announces itself on `started`, then blocks
/// until a permit arrives on `gate`.
struct GatedBackend {
    duration: f64,
    gate:     Receiver<()>,
    started:  Sender<PathBuf>,
    encodes:  Mutex<Vec<PathBuf>>,
}

impl GatedBackend {
    fn info(&self) -> SourceInfo {
        SourceInfo { duration_secs: self.duration, width: 640, height: 360, fps: 25 }
    }
}

impl MediaBackend for GatedBackend {
    fn probe(&self, _path: &Path) -> Result<SourceInfo> {
        Ok(self.info())
    }

    fn extract_range(&self, path: &Path, start: f64, end: f64) -> Result<ClipHandle> {
        Ok(ClipHandle::single(path, start, end, &self.info()))
    }

    fn concatenate(&self, clips: Vec<ClipHandle>) -> Result<ClipHandle> {
        clipmill_media::FfmpegBackend.concatenate(clips)
    }

    fn encode(&self, _clip: &ClipHandle, output: &Path, _s: &EncodeSettings) -> Result<()> {
        let _ = self.started.send(output.to_path_buf());
        let _ = self.gate.recv();
        self.encodes.lock().unwrap().push(output.to_path_buf());
        Ok(())
    }
}

struct Rig {
    worker:     MediaWorker,
    backend:    Arc<GatedBackend>,
    permit_tx:  Sender<()>,
    started_rx: Receiver<PathBuf>,
}

fn rig(duration: f64) -> Rig {
    let (permit_tx, gate) = unbounded();
    let (started, started_rx) = unbounded();
    let backend = Arc::new(GatedBackend {
        duration,
        gate,
        started,
        encodes: Mutex::new(Vec::new()),
    });
    Rig {
        worker: MediaWorker::new(backend.clone()),
        backend,
        permit_tx,
        started_rx,
    }
}

fn split_request(part_secs: u32) -> JobRequest {
    JobRequest::SplitDuration {
        source:    PathBuf::from("/media/talk.mp4"),
        part_secs,
        out_dir:   PathBuf::from("/out"),
        quality:   Quality::Medium,
    }
}

fn wait_idle(worker: &MediaWorker) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while worker.is_busy() {
        assert!(Instant::now() < deadline, "worker never released its slot");
        std::thread::sleep(Duration::from_millis(5));
    }
}

const EVENT_WAIT: Duration = Duration::from_secs(5);

#[test]
fn second_submission_is_rejected_while_busy() {
    let rig = rig(100.0);

    let _job = rig.worker.submit(split_request(60)).unwrap();
    assert!(rig.worker.is_busy());
    assert_eq!(rig.worker.submit(split_request(60)), Err(SubmitError::Busy));

    // Release both parts; the slot frees only after the terminal event.
    rig.permit_tx.send(()).unwrap();
    rig.permit_tx.send(()).unwrap();
    wait_idle(&rig.worker);

    // The slot is reusable once the previous job is terminal.
    assert!(rig.worker.submit(split_request(60)).is_ok());
}

#[test]
fn split_events_arrive_in_emission_order() {
    let rig = rig(100.0);
    rig.permit_tx.send(()).unwrap();
    rig.permit_tx.send(()).unwrap();

    let job_id = rig.worker.submit(split_request(60)).unwrap();

    // 100 s at 60 s per part → two parts → 50 %, 100 %, then Finished.
    match rig.worker.rx.recv_timeout(EVENT_WAIT).unwrap() {
        MediaEvent::Progress { job_id: id, percent } => {
            assert_eq!(id, job_id);
            assert_eq!(percent, 50);
        }
        other => panic!("expected first progress, got {other:?}"),
    }
    match rig.worker.rx.recv_timeout(EVENT_WAIT).unwrap() {
        MediaEvent::Progress { percent, .. } => assert_eq!(percent, 100),
        other => panic!("expected second progress, got {other:?}"),
    }
    match rig.worker.rx.recv_timeout(EVENT_WAIT).unwrap() {
        MediaEvent::Finished { job_id: id, kind, output } => {
            assert_eq!(id, job_id);
            assert_eq!(kind, JobKind::Split);
            assert_eq!(output, PathBuf::from("/out"));
        }
        other => panic!("expected finished, got {other:?}"),
    }

    assert_eq!(
        *rig.backend.encodes.lock().unwrap(),
        vec![
            PathBuf::from("/out/talk_part_1.mp4"),
            PathBuf::from("/out/talk_part_2.mp4"),
        ]
    );
}

#[test]
fn cancel_during_an_encode_stops_at_the_next_checkpoint() {
    let rig = rig(180.0); // three parts of 60 s

    let job_id = rig.worker.submit(split_request(60)).unwrap();

    // Part 1 is being written. Cancelling now must NOT interrupt it…
    let first = rig.started_rx.recv_timeout(EVENT_WAIT).unwrap();
    assert_eq!(first, PathBuf::from("/out/talk_part_1.mp4"));
    rig.worker.cancel(job_id);
    rig.permit_tx.send(()).unwrap();

    // …so part 1 completes and reports progress, then the checkpoint before
    // part 2 observes the flag and the job ends silently.
    match rig.worker.rx.recv_timeout(EVENT_WAIT).unwrap() {
        MediaEvent::Progress { percent, .. } => assert_eq!(percent, 33),
        other => panic!("expected part-1 progress, got {other:?}"),
    }
    wait_idle(&rig.worker);

    assert_eq!(
        *rig.backend.encodes.lock().unwrap(),
        vec![PathBuf::from("/out/talk_part_1.mp4")]
    );
    assert!(
        rig.worker.rx.try_recv().is_err(),
        "a cancelled job must not emit a terminal event"
    );
    assert!(
        rig.started_rx.try_recv().is_err(),
        "part 2 must never start after cancellation"
    );
}

#[test]
fn cancel_with_stale_job_id_is_ignored() {
    let rig = rig(100.0);

    let job_id = rig.worker.submit(split_request(60)).unwrap();
    rig.worker.cancel(Uuid::new_v4()); // not this job — must change nothing

    rig.permit_tx.send(()).unwrap();
    rig.permit_tx.send(()).unwrap();

    let mut finished = false;
    while let Ok(ev) = rig.worker.rx.recv_timeout(EVENT_WAIT) {
        if let MediaEvent::Finished { job_id: id, .. } = ev {
            assert_eq!(id, job_id);
            finished = true;
            break;
        }
    }
    assert!(finished, "job should run to completion despite the stale cancel");
}

#[test]
fn probe_reports_back_with_the_callers_id() {
    let rig = rig(42.0);
    let id = Uuid::new_v4();

    rig.worker.probe(id, PathBuf::from("/media/talk.mp4"));

    match rig.worker.rx.recv_timeout(EVENT_WAIT).unwrap() {
        MediaEvent::SourceProbed { id: got, info } => {
            assert_eq!(got, id);
            assert_eq!(info.duration_secs, 42.0);
            assert_eq!((info.width, info.height), (640, 360));
        }
        other => panic!("expected probe result, got {other:?}"),
    }
}
