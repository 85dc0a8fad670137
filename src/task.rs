//! Single-resolution asynchronous results handed out by capabilities.
//!
//! A [`Task`] settles at most once, either resolved with a value or rejected
//! with a [`TaskError`]. Callers register a success and a failure callback with
//! [`Task::wait`]; each registration receives exactly one of the two, even when
//! it is made after the task already settled. There is no cancellation.

use std::fmt;
use std::mem;
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum TaskError {
    #[error("engine: {0}")]
    Engine(String),

    #[error("{0} is not available")]
    Unavailable(String),

    #[error("{detail}")]
    Generic { detail: String },
}

impl TaskError {
    pub fn generic(msg: impl Into<String>) -> Self {
        Self::Generic { detail: msg.into() }
    }
}

type SuccessFn<T> = Box<dyn FnOnce(T) + Send>;
type FailureFn = Box<dyn FnOnce(TaskError) + Send>;

struct Waiter<T> {
    on_success: SuccessFn<T>,
    on_failure: FailureFn,
}

enum TaskState<T> {
    Pending(Vec<Waiter<T>>),
    Resolved(T),
    Rejected(TaskError),
}

/// Shared handle to a pending or settled result.
pub struct Task<T> {
    inner: Arc<Mutex<TaskState<T>>>,
}

impl<T> Clone for Task<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> fmt::Debug for Task<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let label = match &*state {
            TaskState::Pending(waiters) => format!("Pending({} waiters)", waiters.len()),
            TaskState::Resolved(_) => "Resolved".to_string(),
            TaskState::Rejected(e) => format!("Rejected({e})"),
        };
        f.debug_struct("Task").field("state", &label).finish()
    }
}

impl<T: Clone + Send + 'static> Default for Task<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + Send + 'static> Task<T> {
    /// A task that has not settled yet.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(TaskState::Pending(Vec::new()))),
        }
    }

    pub fn resolved(value: T) -> Self {
        Self {
            inner: Arc::new(Mutex::new(TaskState::Resolved(value))),
        }
    }

    pub fn rejected(error: TaskError) -> Self {
        Self {
            inner: Arc::new(Mutex::new(TaskState::Rejected(error))),
        }
    }

    pub fn is_settled(&self) -> bool {
        let state = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        !matches!(&*state, TaskState::Pending(_))
    }

    /// Settles the task with `value`. Returns false if it had already settled.
    pub fn resolve(&self, value: T) -> bool {
        let waiters = {
            let mut state = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            match &mut *state {
                TaskState::Pending(waiters) => {
                    let waiters = mem::take(waiters);
                    *state = TaskState::Resolved(value.clone());
                    waiters
                }
                _ => return false,
            }
        };
        // Callbacks run outside the lock so they may wait on this task again.
        for waiter in waiters {
            (waiter.on_success)(value.clone());
        }
        true
    }

    /// Settles the task with `error`. Returns false if it had already settled.
    pub fn reject(&self, error: TaskError) -> bool {
        let waiters = {
            let mut state = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            match &mut *state {
                TaskState::Pending(waiters) => {
                    let waiters = mem::take(waiters);
                    *state = TaskState::Rejected(error.clone());
                    waiters
                }
                _ => return false,
            }
        };
        for waiter in waiters {
            (waiter.on_failure)(error.clone());
        }
        true
    }

    /// Registers callbacks. If the task already settled the matching callback
    /// runs immediately on the calling thread.
    pub fn wait<S, F>(&self, on_success: S, on_failure: F)
    where
        S: FnOnce(T) + Send + 'static,
        F: FnOnce(TaskError) + Send + 'static,
    {
        let settled = {
            let mut state = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            match &mut *state {
                TaskState::Pending(waiters) => {
                    waiters.push(Waiter {
                        on_success: Box::new(on_success),
                        on_failure: Box::new(on_failure),
                    });
                    return;
                }
                TaskState::Resolved(value) => Ok(value.clone()),
                TaskState::Rejected(error) => Err(error.clone()),
            }
        };
        match settled {
            Ok(value) => on_success(value),
            Err(error) => on_failure(error),
        }
    }
}

/// Failure handler that discards the error.
pub fn ignore(_error: TaskError) {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn waiters_registered_before_settling_are_called_once() {
        let task = Task::<u32>::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        for _ in 0..2 {
            let seen = Arc::clone(&seen);
            task.wait(move |v| seen.lock().unwrap().push(v), ignore);
        }

        assert!(task.resolve(7));
        assert!(!task.resolve(8));
        assert!(!task.reject(TaskError::generic("late")));
        assert_eq!(*seen.lock().unwrap(), vec![7, 7]);
    }

    #[test]
    fn waiting_on_a_settled_task_runs_immediately() {
        let task = Task::resolved(String::from("ready"));
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        task.wait(
            move |v| {
                assert_eq!(v, "ready");
                counter.fetch_add(1, Ordering::SeqCst);
            },
            |_| panic!("resolved task must not fail"),
        );
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn rejection_reaches_only_the_failure_callback() {
        let task = Task::<Vec<u8>>::new();
        let failures = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&failures);
        task.wait(
            |_| panic!("rejected task must not succeed"),
            move |e| {
                assert_eq!(e, TaskError::Unavailable("export".into()));
                counter.fetch_add(1, Ordering::SeqCst);
            },
        );
        task.reject(TaskError::Unavailable("export".into()));
        assert_eq!(failures.load(Ordering::SeqCst), 1);
        assert!(task.is_settled());
    }

    #[test]
    fn settles_from_another_thread() {
        let task = Task::<usize>::new();
        let (tx, rx) = flume::bounded(1);
        task.wait(
            move |v| {
                let _ = tx.send(v);
            },
            ignore,
        );

        let remote = task.clone();
        std::thread::spawn(move || remote.resolve(42))
            .join()
            .unwrap();

        assert_eq!(rx.recv().unwrap(), 42);
    }
}
