//! Bounded pool of worker threads.
//!
//! Every submitted job yields exactly one result or error through its
//! [`JobHandle`]. A job that panics is reported as [`WorkerError::Panicked`]
//! and the thread keeps serving the queue.

use std::{
    any::Any,
    panic::{self, AssertUnwindSafe},
    sync::{Arc, Condvar, Mutex, PoisonError},
    thread::{self, JoinHandle},
};

use crossbeam_channel::{Receiver, Sender, bounded};
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WorkerError {
    #[error("{worker} worker failed: {message}")]
    Failed { worker: String, message: String },

    #[error("{worker} worker panicked: {message}")]
    Panicked { worker: String, message: String },

    #[error("failed to spawn {worker} worker: {message}")]
    Spawn { worker: String, message: String },

    #[error("{0} worker is no longer running")]
    Disconnected(String),
}

impl WorkerError {
    pub fn failed(worker: &str, error: impl std::fmt::Display) -> Self {
        WorkerError::Failed {
            worker: worker.to_string(),
            message: error.to_string(),
        }
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

pub(crate) fn spawn_thread<F>(name: String, f: F) -> Result<JoinHandle<()>, WorkerError>
where
    F: FnOnce() + Send + 'static,
{
    thread::Builder::new()
        .name(name.clone())
        .spawn(f)
        .map_err(|e| WorkerError::Spawn {
            worker: name,
            message: e.to_string(),
        })
}

type Reply<R> = Sender<Result<R, WorkerError>>;

struct Envelope<J, R> {
    job: J,
    reply: Reply<R>,
}

/// Number of submitted jobs that have not finished yet.
#[derive(Default)]
struct InFlight {
    count: Mutex<usize>,
    drained: Condvar,
}

impl InFlight {
    fn start(&self) {
        *self.count.lock().unwrap_or_else(PoisonError::into_inner) += 1;
    }

    fn finish(&self) {
        let mut count = self.count.lock().unwrap_or_else(PoisonError::into_inner);
        *count = count.saturating_sub(1);
        if *count == 0 {
            self.drained.notify_all();
        }
    }

    fn wait_drained(&self) {
        let mut count = self.count.lock().unwrap_or_else(PoisonError::into_inner);
        while *count > 0 {
            count = self
                .drained
                .wait(count)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }
}

/// Result of a single submitted job.
pub struct JobHandle<R> {
    worker: String,
    rx: Receiver<Result<R, WorkerError>>,
}

impl<R> JobHandle<R> {
    /// Blocks until the job finished.
    pub fn wait(self) -> Result<R, WorkerError> {
        self.rx
            .recv()
            .unwrap_or(Err(WorkerError::Disconnected(self.worker)))
    }
}

pub struct WorkerPool<J, R> {
    name: String,
    jobs: Option<Sender<Envelope<J, R>>>,
    threads: Vec<JoinHandle<()>>,
    in_flight: Arc<InFlight>,
}

impl<J, R> WorkerPool<J, R>
where
    J: Send + 'static,
    R: Send + 'static,
{
    /// Starts `size` threads running `handler`. The job queue holds at most
    /// two jobs per thread, `submit` blocks beyond that.
    pub fn spawn<F>(name: &str, size: usize, handler: F) -> Result<Self, WorkerError>
    where
        F: Fn(J) -> Result<R, WorkerError> + Send + Sync + 'static,
    {
        let size = size.max(1);
        let (tx, rx) = bounded::<Envelope<J, R>>(size * 2);
        let handler = Arc::new(handler);
        let in_flight = Arc::new(InFlight::default());

        let mut threads = Vec::with_capacity(size);
        for i in 0..size {
            let rx = rx.clone();
            let handler = Arc::clone(&handler);
            let in_flight = Arc::clone(&in_flight);
            let worker = name.to_string();

            threads.push(spawn_thread(format!("{name}-{i}"), move || {
                for Envelope { job, reply } in rx.iter() {
                    let result = panic::catch_unwind(AssertUnwindSafe(|| handler(job)))
                        .unwrap_or_else(|payload| {
                            Err(WorkerError::Panicked {
                                worker: worker.clone(),
                                message: panic_message(payload.as_ref()),
                            })
                        });
                    // the submitter may have stopped listening
                    let _ = reply.send(result);
                    in_flight.finish();
                }
            })?);
        }

        log::debug!("spawned {size} {name} worker(s)");
        Ok(Self {
            name: name.to_string(),
            jobs: Some(tx),
            threads,
            in_flight,
        })
    }

    pub fn submit(&self, job: J) -> JobHandle<R> {
        let (reply, rx) = bounded(1);
        let handle = JobHandle {
            worker: self.name.clone(),
            rx,
        };

        self.in_flight.start();
        let sent = match &self.jobs {
            Some(jobs) => jobs.send(Envelope { job, reply }).is_ok(),
            None => false,
        };
        if !sent {
            self.in_flight.finish();
        }
        handle
    }
}

impl<J, R> WorkerPool<J, R> {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Blocks until every submitted job has finished.
    pub fn await_completion(&self) {
        self.in_flight.wait_drained();
    }

    fn shutdown(&mut self) {
        // closing the queue lets every thread finish its current job and exit
        self.jobs.take();
        for thread in self.threads.drain(..) {
            if thread.join().is_err() {
                log::warn!("{} worker thread exited abnormally", self.name);
            }
        }
    }

    /// Finishes queued jobs, then stops and joins every thread.
    pub fn terminate(mut self) {
        self.shutdown();
    }
}

impl<J, R> Drop for WorkerPool<J, R> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
