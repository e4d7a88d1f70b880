// crates/clipmill-media/src/worker.rs
//
// MediaWorker: the single-slot background job dispatcher.
// All public API that clipmill-ui calls lives here.
//
// One interactive thread plus at most one job thread. submit() claims the
// slot or returns Busy — it never queues and never lets a second worker race
// the first. Probes are independent of the job slot (they are cheap,
// read-only, and the info panel must stay live while a job runs).
//
// Everything crossing back to the UI is an immutable MediaEvent on one
// bounded channel, drained once per frame; events arrive in the order the
// worker emitted them.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use crossbeam_channel::{bounded, Receiver, Sender};
use uuid::Uuid;

use clipmill_core::events::MediaEvent;
use clipmill_core::job::JobRequest;

use crate::backend::MediaBackend;
use crate::jobs;

/// Why a submission was refused.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubmitError {
    /// A job is already in flight; the single worker slot is taken.
    Busy,
}

impl SubmitError {
    pub fn message_key(self) -> &'static str {
        match self {
            SubmitError::Busy => "job_busy_error",
        }
    }
}

pub struct MediaWorker {
    /// Events from job and probe threads. Drained by the UI once per frame.
    pub rx: Receiver<MediaEvent>,
    tx:     Sender<MediaEvent>,

    backend: Arc<dyn MediaBackend>,

    /// The single worker slot. Claimed by submit(), released by the job
    /// thread as its last action.
    busy: Arc<AtomicBool>,

    /// Cancel flag of the in-flight job, keyed by its id so a stale cancel
    /// for a finished job can never touch a newer one.
    active: Arc<Mutex<Option<(Uuid, Arc<AtomicBool>)>>>,

    /// App-exit flag: raised once, observed by probe threads before they
    /// send, and folded into the active job's cancel flag.
    shutdown: Arc<AtomicBool>,
}

impl MediaWorker {
    pub fn new(backend: Arc<dyn MediaBackend>) -> Self {
        let (tx, rx) = bounded(256);
        Self {
            rx,
            tx,
            backend,
            busy:     Arc::new(AtomicBool::new(false)),
            active:   Arc::new(Mutex::new(None)),
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Run `request` on the worker slot. Non-blocking: results arrive later
    /// as MediaEvents. Returns the job id used in those events, or Busy if a
    /// job is already in flight.
    ///
    /// The caller must have validated the request (JobRequest::validate) —
    /// jobs assume its invariants hold.
    pub fn submit(&self, request: JobRequest) -> Result<Uuid, SubmitError> {
        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(SubmitError::Busy);
        }

        let job_id = Uuid::new_v4();
        let cancel = Arc::new(AtomicBool::new(false));

        // Register the cancel flag before spawning — no window where
        // cancel() can miss a job that is already running.
        *self.active.lock().unwrap() = Some((job_id, Arc::clone(&cancel)));

        log::info!("[worker] job {job_id} submitted ({:?})", request.kind());

        let tx      = self.tx.clone();
        let backend = Arc::clone(&self.backend);
        let busy    = Arc::clone(&self.busy);
        let active  = Arc::clone(&self.active);
        thread::spawn(move || {
            jobs::run(backend.as_ref(), job_id, &request, &cancel, &tx);

            // Free the slot last, after the terminal event (if any) is in
            // the channel, so event order can never show a free slot before
            // the old job's outcome.
            *active.lock().unwrap() = None;
            busy.store(false, Ordering::Release);
        });

        Ok(job_id)
    }

    /// Request cooperative cancellation of `job_id`. The in-flight encode
    /// still runs to completion; only the next checkpoint observes the flag.
    /// A no-op when the job already reached a terminal state.
    pub fn cancel(&self, job_id: Uuid) {
        if let Some((id, flag)) = &*self.active.lock().unwrap() {
            if *id == job_id {
                log::info!("[worker] cancel requested for job {job_id}");
                flag.store(true, Ordering::Relaxed);
            }
        }
    }

    /// True while a job holds the worker slot.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Probe `path` on a short-lived thread and report SourceProbed /
    /// ProbeFailed with the caller's correlation `id`.
    pub fn probe(&self, id: Uuid, path: PathBuf) {
        let tx = self.tx.clone();
        let backend = Arc::clone(&self.backend);
        let shutdown = Arc::clone(&self.shutdown);
        thread::spawn(move || {
            if shutdown.load(Ordering::Relaxed) {
                return;
            }
            let event = match backend.probe(&path) {
                Ok(info) => MediaEvent::SourceProbed { id, info },
                Err(e) => {
                    log::warn!("[worker] probe failed for {}: {e:#}", path.display());
                    MediaEvent::ProbeFailed { id, message: e.to_string() }
                }
            };
            let _ = tx.send(event);
        });
    }

    /// App exit: stop probe threads from reporting and cancel the active job
    /// at its next checkpoint. The in-flight encode is not interrupted.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
        if let Some((_, flag)) = &*self.active.lock().unwrap() {
            flag.store(true, Ordering::Relaxed);
        }
    }
}
