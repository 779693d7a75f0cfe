//! Bounded admission queue and worker pool
//!
//! Accepts submission ids up to a fixed capacity and fans them out to a
//! fixed set of worker tasks in FIFO order. Admission waits a bounded time
//! when the queue is full, then rejects and records the rejection on the
//! submission itself.
//!
//! This module does NOT decide verdicts; each worker hands the id to the
//! [`JudgeEngine`](crate::engine::JudgeEngine) and moves on to the next.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{timeout, timeout_at, Instant};
use tracing::{info, warn};

use crate::config::JudgeConfig;
use crate::engine::JudgeEngine;

/// FIFO submission queue with a fixed worker pool.
///
/// Workers are spawned by [`start`](Self::start) and run until
/// [`stop`](Self::stop) flips the running flag; an idle worker notices the
/// flag within one poll interval.
pub struct SubmissionQueue {
    engine: Arc<JudgeEngine>,
    tx: mpsc::Sender<i64>,
    /// Workers take turns holding this lock for one bounded poll each
    rx: Arc<Mutex<mpsc::Receiver<i64>>>,
    running: Arc<AtomicBool>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    worker_threads: usize,
    enqueue_timeout: Duration,
    poll_interval: Duration,
    shutdown_grace: Duration,
}

impl SubmissionQueue {
    pub fn new(engine: Arc<JudgeEngine>, config: &JudgeConfig) -> Self {
        let (tx, rx) = mpsc::channel(config.queue_capacity.max(1));
        Self {
            engine,
            tx,
            rx: Arc::new(Mutex::new(rx)),
            running: Arc::new(AtomicBool::new(false)),
            workers: Mutex::new(Vec::new()),
            worker_threads: config.worker_threads.max(1),
            enqueue_timeout: config.enqueue_timeout(),
            poll_interval: config.poll_interval(),
            shutdown_grace: config.shutdown_grace(),
        }
    }

    /// Spawn the worker pool. Calling this twice is a logged no-op.
    pub async fn start(&self) {
        if self.running.swap(true, Ordering::SeqCst) {
            warn!("Submission queue already started");
            return;
        }
        info!(
            "Starting submission queue with {} worker threads",
            self.worker_threads
        );

        let mut workers = self.workers.lock().await;
        for worker_id in 0..self.worker_threads {
            workers.push(tokio::spawn(worker_loop(
                worker_id,
                self.rx.clone(),
                self.engine.clone(),
                self.running.clone(),
                self.poll_interval,
            )));
        }
    }

    /// Offer a submission id for judging.
    ///
    /// Waits up to the configured enqueue timeout for a slot. Returns
    /// `false` if none opened up, after marking the submission SYSTEM_ERROR
    /// so its terminal state is still recorded.
    pub async fn enqueue(&self, submission_id: i64) -> bool {
        match self.tx.send_timeout(submission_id, self.enqueue_timeout).await {
            Ok(()) => {
                info!(
                    "Submission {} added to queue. Queue size: {}",
                    submission_id,
                    self.depth()
                );
                true
            }
            Err(_) => {
                warn!(
                    "Failed to add submission {} to queue - queue is full",
                    submission_id
                );
                self.engine
                    .mark_system_error(submission_id, "Queue is full")
                    .await;
                false
            }
        }
    }

    /// Number of submissions currently waiting in the queue
    pub fn depth(&self) -> usize {
        self.tx.max_capacity() - self.tx.capacity()
    }

    /// Stop the worker pool.
    ///
    /// Clears the running flag, then gives every worker a shared grace
    /// period to finish its current submission. Workers still alive after
    /// the deadline are aborted. Calling this without a prior `start` is a
    /// no-op.
    pub async fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }
        info!("Shutting down submission queue");

        let deadline = Instant::now() + self.shutdown_grace;
        let mut workers = self.workers.lock().await;
        for (worker_id, handle) in workers.drain(..).enumerate() {
            let abort = handle.abort_handle();
            if timeout_at(deadline, handle).await.is_err() {
                warn!(
                    "Worker {} did not terminate gracefully within the grace period",
                    worker_id
                );
                abort.abort();
            }
        }
        info!("Submission queue stopped");
    }
}

async fn worker_loop(
    worker_id: usize,
    rx: Arc<Mutex<mpsc::Receiver<i64>>>,
    engine: Arc<JudgeEngine>,
    running: Arc<AtomicBool>,
    poll_interval: Duration,
) {
    info!("Worker {} started", worker_id);

    while running.load(Ordering::SeqCst) {
        // Hold the receiver lock for one bounded poll only, so siblings
        // get their turn and shutdown is observed within one interval
        let polled = {
            let mut rx = rx.lock().await;
            timeout(poll_interval, rx.recv()).await
        };

        match polled {
            Ok(Some(submission_id)) => {
                info!("Worker {} processing submission {}", worker_id, submission_id);
                engine.process(submission_id).await;
                info!("Worker {} completed submission {}", worker_id, submission_id);
            }
            // Channel closed, nothing more will ever arrive
            Ok(None) => break,
            // Poll expired while idle, re-check the running flag
            Err(_) => continue,
        }
    }

    info!("Worker {} stopped", worker_id);
}
