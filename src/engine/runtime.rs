//! Routed execution runtime for batches.
//!
//! `EditEngine::process_batch` is synchronous. Servers that must keep reads
//! responsive while long edits (and their oracle calls) run use this small,
//! bounded, thread-based runtime, which routes batches into separate worker
//! pools. A full queue rejects the batch instead of blocking.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TrySendError};

use crate::batch::{BatchCall, BatchResponse, Operation};
use crate::config::RuntimeConfig;
use crate::error::{EditError, EditResult, ExecutionError};

use super::EditEngine;

/// Execution path selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExecutionPath {
    /// Batches that only read.
    Query,
    /// Batches with at least one mutating request.
    Edit,
}

impl ExecutionPath {
    /// Routes a batch: any mutating request sends it to [`ExecutionPath::Edit`].
    ///
    /// Unknown labels route to the query path; the engine rejects them there.
    #[must_use]
    pub fn route(call: &BatchCall) -> Self {
        let mutating = call.requests.iter().any(|r| {
            r.operation
                .as_deref()
                .and_then(|label| Operation::parse(label.trim()))
                .is_some_and(Operation::is_mutating)
        });
        if mutating {
            Self::Edit
        } else {
            Self::Query
        }
    }

    const fn name(self) -> &'static str {
        match self {
            Self::Query => "query",
            Self::Edit => "edit",
        }
    }
}

enum Job {
    Process {
        call: BatchCall,
        privileged: bool,
        reply: Sender<BatchResponse>,
    },

    #[cfg(test)]
    Sleep {
        duration: Duration,
        reply: Sender<()>,
    },
}

struct WorkerPool {
    tx: Sender<Job>,
    workers: Vec<JoinHandle<()>>,
    queue_capacity: usize,
    path: ExecutionPath,
}

impl WorkerPool {
    fn start(
        path: ExecutionPath,
        workers: usize,
        queue_capacity: usize,
        engine: &Arc<EditEngine>,
    ) -> EditResult<Self> {
        let workers = workers.max(1);
        let queue_capacity = queue_capacity.max(1);
        let (tx, rx) = bounded::<Job>(queue_capacity);

        let mut handles = Vec::with_capacity(workers);
        for idx in 0..workers {
            let rx: Receiver<Job> = rx.clone();
            let engine = Arc::clone(engine);
            let handle = thread::Builder::new()
                .name(format!("causal-edit-{}-{idx}", path.name()))
                .spawn(move || loop {
                    match rx.recv() {
                        Ok(Job::Process {
                            call,
                            privileged,
                            reply,
                        }) => {
                            let _ = reply.send(engine.process_call(call, privileged));
                        }
                        Err(_) => break,

                        #[cfg(test)]
                        Ok(Job::Sleep { duration, reply }) => {
                            thread::sleep(duration);
                            let _ = reply.send(());
                        }
                    }
                })
                .map_err(|e| EditError::internal(format!("failed to spawn {} worker: {e}", path.name())))?;
            handles.push(handle);
        }

        Ok(Self {
            tx,
            workers: handles,
            queue_capacity,
            path,
        })
    }

    fn idle(path: ExecutionPath) -> Self {
        Self {
            tx: bounded::<Job>(1).0,
            workers: Vec::new(),
            queue_capacity: 1,
            path,
        }
    }

    fn try_submit(&self, job: Job) -> EditResult<()> {
        match self.tx.try_send(job) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => Err(ExecutionError::QueueFull {
                path: self.path.name().to_string(),
                capacity: self.queue_capacity,
            }
            .into()),
            Err(TrySendError::Disconnected(_)) => Err(ExecutionError::Disconnected {
                path: self.path.name().to_string(),
            }
            .into()),
        }
    }

    fn shutdown(self) {
        // Workers drain queued jobs, then see the closed channel and exit.
        drop(self.tx);
        for handle in self.workers {
            let _ = handle.join();
        }
    }
}

/// Handle returned by [`BatchRuntime::submit`].
#[derive(Debug)]
pub struct BatchHandle {
    path: ExecutionPath,
    rx: Receiver<BatchResponse>,
}

impl BatchHandle {
    /// The path the batch was routed to.
    #[must_use]
    pub const fn path(&self) -> ExecutionPath {
        self.path
    }

    /// Waits for the response.
    ///
    /// # Errors
    /// `Disconnected` if the worker went away without answering.
    pub fn join(self) -> EditResult<BatchResponse> {
        self.rx.recv().map_err(|_| {
            ExecutionError::Disconnected {
                path: self.path.name().to_string(),
            }
            .into()
        })
    }

    /// Waits for the response, up to `timeout`.
    ///
    /// # Errors
    /// `Timeout` on expiry, `Disconnected` if the worker went away.
    pub fn join_timeout(self, timeout: Duration) -> EditResult<BatchResponse> {
        self.rx.recv_timeout(timeout).map_err(|err| match err {
            RecvTimeoutError::Timeout => ExecutionError::Timeout {
                duration_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            }
            .into(),
            RecvTimeoutError::Disconnected => ExecutionError::Disconnected {
                path: self.path.name().to_string(),
            }
            .into(),
        })
    }
}

/// A routed runtime keeping read-only batches apart from edits.
pub struct BatchRuntime {
    engine: Arc<EditEngine>,
    query: WorkerPool,
    edit: WorkerPool,
}

impl std::fmt::Debug for BatchRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchRuntime")
            .field("query_workers", &self.query.workers.len())
            .field("edit_workers", &self.edit.workers.len())
            .finish_non_exhaustive()
    }
}

impl BatchRuntime {
    /// Starts both worker pools.
    ///
    /// # Errors
    /// Internal error if a worker thread cannot be spawned.
    pub fn new(engine: EditEngine, config: &RuntimeConfig) -> EditResult<Self> {
        let engine = Arc::new(engine);
        let query = WorkerPool::start(
            ExecutionPath::Query,
            config.query_workers,
            config.queue_capacity,
            &engine,
        )?;
        let edit = WorkerPool::start(
            ExecutionPath::Edit,
            config.edit_workers,
            config.queue_capacity,
            &engine,
        )?;
        Ok(Self { engine, query, edit })
    }

    /// Queues a batch on its routed path.
    ///
    /// # Errors
    /// `QueueFull` if the path's queue is at capacity.
    pub fn submit(&self, call: BatchCall, privileged: bool) -> EditResult<BatchHandle> {
        let path = ExecutionPath::route(&call);
        let (tx, rx) = bounded::<BatchResponse>(1);
        self.pool(path).try_submit(Job::Process {
            call,
            privileged,
            reply: tx,
        })?;
        Ok(BatchHandle { path, rx })
    }

    /// Queues a batch and waits for its response.
    ///
    /// # Errors
    /// See [`BatchRuntime::submit`] and [`BatchHandle::join`].
    pub fn process(&self, call: BatchCall, privileged: bool) -> EditResult<BatchResponse> {
        self.submit(call, privileged)?.join()
    }

    /// The shared engine.
    #[must_use]
    pub fn engine(&self) -> &EditEngine {
        &self.engine
    }

    const fn pool(&self, path: ExecutionPath) -> &WorkerPool {
        match path {
            ExecutionPath::Query => &self.query,
            ExecutionPath::Edit => &self.edit,
        }
    }

    #[cfg(test)]
    fn submit_sleep(&self, path: ExecutionPath, duration: Duration) -> EditResult<Receiver<()>> {
        let (tx, rx) = bounded::<()>(1);
        self.pool(path).try_submit(Job::Sleep { duration, reply: tx })?;
        Ok(rx)
    }
}

impl Drop for BatchRuntime {
    fn drop(&mut self) {
        let query = std::mem::replace(&mut self.query, WorkerPool::idle(ExecutionPath::Query));
        let edit = std::mem::replace(&mut self.edit, WorkerPool::idle(ExecutionPath::Edit));
        query.shutdown();
        edit.shutdown();
    }
}
