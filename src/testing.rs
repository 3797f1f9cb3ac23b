//! Testing utilities for resource handles
//!
//! Ordering guarantees are easiest to check against a log: every helper here
//! records what it does into a shared [`EventLog`], and [`ShadowLog`] records
//! the outcomes a run discarded.
//!
//! # Examples
//!
//! ```rust
//! use managed_effect::assert_events;
//! use managed_effect::effect::prelude::*;
//! use managed_effect::testing::{tracked, EventLog};
//!
//! let log = EventLog::new();
//! let pair = tracked(&log, "A").zip(&tracked(&log, "B"));
//!
//! let result = pair.with(|(a, b)| pure(format!("{}{}", a, b))).run_blocking(&());
//!
//! assert_eq!(result, Ok("AB".to_string()));
//! assert_events!(log, ["acquire A", "acquire B", "release B", "release A"]);
//! ```

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::effect::constructors::{fail, from_fn, pure};
use crate::managed::Managed;
use crate::observer::{ShadowObserver, Shadowed, SharedObserver};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Shared, ordered record of lifecycle events.
///
/// Clones share the same log.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Arc<Mutex<Vec<String>>>,
}

impl EventLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event.
    pub fn record(&self, event: impl Into<String>) {
        lock(&self.events).push(event.into());
    }

    /// Snapshot of the events recorded so far.
    pub fn events(&self) -> Vec<String> {
        lock(&self.events).clone()
    }

    /// Forget every recorded event.
    pub fn clear(&self) {
        lock(&self.events).clear();
    }
}

/// A handle over `name` that logs `acquire {name}` and `release {name}`.
pub fn tracked(log: &EventLog, name: &str) -> Managed<String, String> {
    let acquire_log = log.clone();
    let release_log = log.clone();
    let name = name.to_string();
    Managed::new(
        move || {
            let log = acquire_log.clone();
            let name = name.clone();
            from_fn(move |_: &()| {
                log.record(format!("acquire {}", name));
                Ok(name)
            })
        },
        move |resource: String| {
            release_log.record(format!("release {}", resource));
            async { Ok(()) }
        },
    )
}

/// A handle whose acquisition fails with `error`, logging `acquire {name} failed`.
pub fn failing_acquire(log: &EventLog, name: &str, error: &str) -> Managed<String, String> {
    let acquire_log = log.clone();
    let release_log = log.clone();
    let name = name.to_string();
    let error = error.to_string();
    Managed::new(
        move || {
            acquire_log.record(format!("acquire {} failed", name));
            fail::<String, _, ()>(error.clone())
        },
        move |resource: String| {
            release_log.record(format!("release {}", resource));
            async { Ok(()) }
        },
    )
}

/// A handle whose release fails with `error` after logging `release {name}`.
pub fn failing_release(log: &EventLog, name: &str, error: &str) -> Managed<String, String> {
    let acquire_log = log.clone();
    let release_log = log.clone();
    let name = name.to_string();
    let error = error.to_string();
    Managed::new(
        move || {
            acquire_log.record(format!("acquire {}", name));
            pure::<_, String, ()>(name.clone())
        },
        move |resource: String| {
            release_log.record(format!("release {}", resource));
            let error = error.clone();
            async move { Err(error) }
        },
    )
}

/// Owned copy of a [`Shadowed`] event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShadowRecord<E> {
    /// A successful result was discarded.
    Value {
        /// The error propagated instead.
        release_error: E,
    },
    /// An earlier error was discarded.
    Error {
        /// The discarded error.
        discarded: E,
        /// The error propagated instead.
        release_error: E,
    },
}

/// Observer that keeps every discarded outcome it is shown.
///
/// Clones share the same records, so keep one clone and pass another to
/// `observe`.
#[derive(Debug)]
pub struct ShadowLog<E> {
    records: Arc<Mutex<Vec<ShadowRecord<E>>>>,
}

impl<E> Clone for ShadowLog<E> {
    fn clone(&self) -> Self {
        ShadowLog {
            records: Arc::clone(&self.records),
        }
    }
}

impl<E> Default for ShadowLog<E> {
    fn default() -> Self {
        ShadowLog {
            records: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl<E: Clone> ShadowLog<E> {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the records so far.
    pub fn records(&self) -> Vec<ShadowRecord<E>> {
        lock(&self.records).clone()
    }

    /// This log as a [`SharedObserver`].
    pub fn shared(&self) -> SharedObserver<E>
    where
        E: Send + 'static,
    {
        SharedObserver::new(self.clone())
    }
}

impl<E: Clone + Send> ShadowObserver<E> for ShadowLog<E> {
    fn shadowed(&self, event: Shadowed<'_, E>) {
        let record = match event {
            Shadowed::Value { release_error } => ShadowRecord::Value {
                release_error: release_error.clone(),
            },
            Shadowed::Error {
                discarded,
                release_error,
            } => ShadowRecord::Error {
                discarded: discarded.clone(),
                release_error: release_error.clone(),
            },
        };
        lock(&self.records).push(record);
    }
}

/// Assert that an [`EventLog`] holds exactly the given events, in order.
///
/// # Example
///
/// ```rust
/// use managed_effect::{assert_events, testing::EventLog};
///
/// let log = EventLog::new();
/// log.record("acquire db");
/// assert_events!(log, ["acquire db"]);
/// ```
#[macro_export]
macro_rules! assert_events {
    ($log:expr, [$($event:expr),* $(,)?]) => {{
        let expected: ::std::vec::Vec<::std::string::String> =
            ::std::vec![$(::std::string::String::from($event)),*];
        assert_eq!($log.events(), expected);
    }};
}
