//! # Task Management System
//!
//! This module provides the worker pool that runs CPU-heavy work (mesh
//! builds) off the owning thread.
//!
//! ## Architecture Overview
//!
//! - `TaskManager`: owns the workers, the shared task queue and the results queue
//! - `Task`: a unit of work that can be executed asynchronously
//! - `TaskCompletion`: a finished task's output, or its panic message
//!
//! All workers pull from one bounded multi-producer/multi-consumer queue and
//! push into one unbounded results queue. Nothing else is shared between the
//! owning thread and the workers.
//!
//! ## Task Lifecycle
//! 1. Tasks are published via `TaskManager::publish_task()`
//! 2. If the queue is full the task waits in an owner-side backlog, flushed
//!    by `process_queued_tasks()`; the owning thread never blocks
//! 3. An idle worker takes the task and runs it inside `catch_unwind`
//! 4. The completion is collected on the owning thread with `drain_completed()`
//!
//! ## Shutdown
//! Dropping the manager discards queued work, sends one `Shutdown` message per
//! worker and joins every worker before returning.
//!
//! ## Example Usage
//! ```ignore
//! let mut task_manager = TaskManager::new(num_workers, queue_capacity);
//! let id = task_manager.publish_task(Box::new(MyTask::new(...)));
//!
//! // In the main loop:
//! task_manager.process_queued_tasks();
//! for completion in task_manager.drain_completed() { ... }
//! ```

pub mod task;

use std::any::Any;
use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, unbounded, Receiver, Sender, TrySendError};
use log::{debug, error, info};
use task::{Task, TaskCompletion, TaskId};

/// A boxed task producing `O`.
pub type BoxedTask<O> = Box<dyn Task<Output = O>>;

/// Message on the shared task queue.
enum WorkerMessage<O> {
    Run(TaskId, BoxedTask<O>),
    Shutdown,
}

/// Manages a pool of worker threads and coordinates task execution.
///
/// # Implementation Notes
/// - Owned by one thread; `publish_task` and `drain_completed` are never blocking
/// - Panic-safe: a panicking task becomes a failed `TaskCompletion`
/// - Drop-safe: workers are stopped and joined when the manager is dropped
pub struct TaskManager<O: Send + 'static> {
    task_sender: Sender<WorkerMessage<O>>,
    task_receiver: Receiver<WorkerMessage<O>>,
    result_receiver: Receiver<TaskCompletion<O>>,
    workers: Vec<JoinHandle<()>>,
    queued_tasks: VecDeque<(TaskId, BoxedTask<O>)>,
    next_task_id: TaskId,
    num_tasks_in_flight: usize,
}

impl<O: Send + 'static> TaskManager<O> {
    /// Creates a new `TaskManager` with the specified number of worker threads.
    ///
    /// # Arguments
    /// * `num_workers` - Number of worker threads to create
    /// * `queue_capacity` - Capacity of the shared task queue
    ///
    /// A worker that fails to spawn is logged and skipped.
    pub fn new(num_workers: usize, queue_capacity: usize) -> Self {
        let (task_sender, task_receiver) = bounded::<WorkerMessage<O>>(queue_capacity.max(1));
        let (result_sender, result_receiver) = unbounded::<TaskCompletion<O>>();

        info!(
            "Starting {} workers (available parallelism: {:?})",
            num_workers,
            thread::available_parallelism()
        );

        let mut workers = Vec::with_capacity(num_workers);
        for index in 0..num_workers {
            let task_rx = task_receiver.clone();
            let result_tx = result_sender.clone();
            let spawned = thread::Builder::new()
                .name(format!("mesh-worker-{index}"))
                .spawn(move || worker_loop(task_rx, result_tx));
            match spawned {
                Ok(handle) => workers.push(handle),
                Err(err) => error!("Failed to spawn worker {}: {}", index, err),
            }
        }

        TaskManager {
            task_sender,
            task_receiver,
            result_receiver,
            workers,
            queued_tasks: VecDeque::new(),
            next_task_id: 0,
            num_tasks_in_flight: 0,
        }
    }

    /// Publishes a new task for execution.
    ///
    /// The task goes straight onto the shared queue if there is room and no
    /// older task is waiting in the backlog; otherwise it joins the backlog.
    ///
    /// # Returns
    /// The identifier its `TaskCompletion` will carry.
    pub fn publish_task(&mut self, task: BoxedTask<O>) -> TaskId {
        let id = self.next_task_id;
        self.next_task_id += 1;
        self.num_tasks_in_flight += 1;

        if !self.queued_tasks.is_empty() {
            self.queued_tasks.push_back((id, task));
            return id;
        }

        if let Err((id, task)) = self.try_send_task(id, task) {
            self.queued_tasks.push_back((id, task));
        }
        id
    }

    fn try_send_task(&self, id: TaskId, task: BoxedTask<O>) -> Result<(), (TaskId, BoxedTask<O>)> {
        match self.task_sender.try_send(WorkerMessage::Run(id, task)) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(WorkerMessage::Run(id, task)))
            | Err(TrySendError::Disconnected(WorkerMessage::Run(id, task))) => Err((id, task)),
            Err(_) => Ok(()),
        }
    }

    /// Moves backlogged tasks onto the shared queue until it is full.
    pub fn process_queued_tasks(&mut self) {
        while let Some((id, task)) = self.queued_tasks.pop_front() {
            if let Err((id, task)) = self.try_send_task(id, task) {
                self.queued_tasks.push_front((id, task));
                break;
            }
        }
    }

    /// Collects every completion that is ready. Never blocks.
    pub fn drain_completed(&mut self) -> Vec<TaskCompletion<O>> {
        let completed: Vec<_> = self.result_receiver.try_iter().collect();
        self.num_tasks_in_flight = self.num_tasks_in_flight.saturating_sub(completed.len());
        completed
    }

    /// Tasks published but not yet taken by a worker.
    pub fn queue_depth(&self) -> usize {
        self.queued_tasks.len() + self.task_sender.len()
    }

    /// Tasks published whose completion has not been drained yet.
    pub fn in_flight(&self) -> usize {
        self.num_tasks_in_flight
    }

    /// Number of running worker threads.
    pub fn num_workers(&self) -> usize {
        self.workers.len()
    }
}

impl<O: Send + 'static> Drop for TaskManager<O> {
    fn drop(&mut self) {
        let discarded = self.queued_tasks.len() + self.task_receiver.try_iter().count();
        self.queued_tasks.clear();
        if discarded > 0 {
            debug!("Discarding {} queued tasks on shutdown", discarded);
        }

        for _ in 0..self.workers.len() {
            if self.task_sender.send(WorkerMessage::Shutdown).is_err() {
                break;
            }
        }
        for worker in self.workers.drain(..) {
            if worker.join().is_err() {
                error!("Worker thread panicked outside a task");
            }
        }
        debug!("Task manager shut down");
    }
}

fn worker_loop<O: Send + 'static>(
    task_rx: Receiver<WorkerMessage<O>>,
    result_tx: Sender<TaskCompletion<O>>,
) {
    while let Ok(message) = task_rx.recv() {
        match message {
            WorkerMessage::Run(id, task) => {
                let result = panic::catch_unwind(AssertUnwindSafe(|| task.process()))
                    .map_err(panic_message);
                if result_tx.send(TaskCompletion { id, result }).is_err() {
                    break;
                }
            }
            WorkerMessage::Shutdown => break,
        }
    }
}

/// Extracts the message of a caught panic.
pub fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "task panicked".to_string()
    }
}
