//! # Task System Core Traits
//!
//! This module defines the fundamental building block of the task system: a
//! `Task` is a unit of work that owns everything it needs, runs once on a
//! worker thread and produces an output that is handed back to the owning
//! thread.
//!
//! ## Task Lifecycle
//! 1. A `Task` is created and scheduled via `TaskManager::publish_task()`
//! 2. The task's `process()` method is called on a worker thread
//! 3. The output (or a panic message) is wrapped in a `TaskCompletion`
//! 4. The owning thread collects completions with `TaskManager::drain_completed()`
//!
//! ## Thread Safety
//! - `Task` must be `Send` to be transferred between threads
//! - Outputs must be `Send` to be transferred back to the owning thread
//! - Tasks should own copies of their input rather than references to live state

/// Identifier assigned to a task when it is published.
pub type TaskId = u64;

/// A trait representing a unit of work that can be executed asynchronously.
///
/// # Implementation Guidelines
/// - Should be relatively coarse-grained to amortize task scheduling overhead
/// - Should avoid holding references to data that might be modified elsewhere
/// - Errors belong in `Output`; a panic is caught by the worker and reported
///   as a failed completion
pub trait Task: Send {
    /// Result type handed back to the owning thread.
    type Output: Send + 'static;

    /// Processes the task on a worker thread.
    fn process(self: Box<Self>) -> Self::Output;
}

/// A finished task, as seen by the owning thread.
#[derive(Debug)]
pub struct TaskCompletion<O> {
    /// Identifier returned by `publish_task`.
    pub id: TaskId,
    /// The task's output, or the panic message if it panicked.
    pub result: Result<O, String>,
}
