//! Fixed-capacity job executor with graceful drain.
use async_channel::{bounded, unbounded, Receiver, Sender};
use futures_util::FutureExt;
use std::any::Any;
use std::future::Future;
use std::num::NonZeroUsize;
use std::panic::AssertUnwindSafe;
use thiserror::Error;
use tokio::task::JoinHandle;
#[allow(unused)]
use tracing::{debug, error, info, trace, warn, Instrument};

#[derive(Debug, Error)]
pub enum PoolError {
    #[error("Worker pool has no workers left to accept jobs.")]
    Closed,
}

/// What happened to every job handed to a pool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainReport {
    pub submitted: u64,
    pub executed: u64,
    pub panicked: u64,
}

/// A pool of `capacity` workers pulling jobs from one shared queue.
///
/// At most `capacity` job bodies run at once, each submitted job runs exactly once, and a job
/// that panics only takes itself down. Order of execution is unspecified.
///
/// [`drain`](Self::drain) consumes the pool, so no job can be submitted after it.
pub struct WorkerPool<J> {
    tx: Sender<J>,
    workers: Vec<JoinHandle<DrainReport>>,
    submitted: u64,
}

impl<J: Send + 'static> WorkerPool<J> {
    /// Spawn `capacity` workers on the current tokio runtime. With `queue_capacity` set,
    /// [`submit`](Self::submit) waits while that many jobs are already queued.
    pub fn new<T, F>(
        capacity: NonZeroUsize,
        queue_capacity: Option<NonZeroUsize>,
        handler: T,
    ) -> Self
    where
        T: Fn(J) -> F + Send + Sync + Clone + 'static,
        F: Future<Output = ()> + Send + 'static,
    {
        let (tx, rx) = match queue_capacity {
            Some(queue_capacity) => bounded(queue_capacity.get()),
            None => unbounded(),
        };

        let workers = (0..capacity.get())
            .map(|id| {
                tokio::spawn(
                    worker(rx.clone(), handler.clone())
                        .instrument(tracing::debug_span!("worker", id)),
                )
            })
            .collect();

        debug!("Spawned {capacity} workers.");

        Self {
            tx,
            workers,
            submitted: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.workers.len()
    }

    pub fn submitted(&self) -> u64 {
        self.submitted
    }

    /// Queue a job. Only waits when a bounded queue is full.
    pub async fn submit(&mut self, job: J) -> Result<(), PoolError> {
        self.tx.send(job).await.map_err(|_| PoolError::Closed)?;
        self.submitted += 1;
        Ok(())
    }

    /// Wait for every submitted job, queued ones included, to finish.
    pub async fn drain(self) -> DrainReport {
        let Self {
            tx,
            workers,
            submitted,
        } = self;

        // Workers exit once the queue is both closed and empty.
        drop(tx);

        let mut report = DrainReport {
            submitted,
            ..DrainReport::default()
        };
        for handle in workers {
            match handle.await {
                Ok(stats) => {
                    report.executed += stats.executed;
                    report.panicked += stats.panicked;
                }
                Err(err) => error!("Worker task failed: {err}"),
            }
        }

        debug!(
            "Pool drained: {} executed, {} panicked.",
            report.executed, report.panicked
        );
        report
    }
}

async fn worker<J, T, F>(rx: Receiver<J>, handler: T) -> DrainReport
where
    T: Fn(J) -> F,
    F: Future<Output = ()>,
{
    let mut stats = DrainReport::default();
    while let Ok(job) = rx.recv().await {
        let res = AssertUnwindSafe(async { handler(job).await })
            .catch_unwind()
            .await;

        match res {
            Ok(()) => stats.executed += 1,
            Err(panic) => {
                stats.panicked += 1;
                error!("Job panicked: {}", panic_message(&*panic));
            }
        }
    }

    trace!("Worker exiting.");
    stats
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(msg) = panic.downcast_ref::<&'static str>() {
        msg
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg
    } else {
        "unknown panic payload"
    }
}
