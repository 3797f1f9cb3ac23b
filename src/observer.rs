//! Observation of outcomes discarded by the release-failure policy.
//!
//! When a release action fails, its error replaces whatever the bracket was
//! about to return: a successful result or an earlier error. Every
//! discarded outcome is handed to a [`ShadowObserver`] exactly once.
//!
//! The default observer, [`TracingObserver`], emits a `tracing` warning.
//!
//! # Example
//!
//! ```rust
//! use managed_effect::observer::{ShadowObserver, Shadowed};
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! #[derive(Default)]
//! struct CountShadowed(AtomicUsize);
//!
//! impl<E> ShadowObserver<E> for CountShadowed {
//!     fn shadowed(&self, _event: Shadowed<'_, E>) {
//!         self.0.fetch_add(1, Ordering::SeqCst);
//!     }
//! }
//! ```

use std::fmt::Debug;
use std::sync::Arc;

/// An outcome that was superseded by a release failure.
#[derive(Debug, PartialEq, Eq)]
pub enum Shadowed<'a, E> {
    /// A successful result was dropped because a release failed.
    Value {
        /// The release error that is propagated instead.
        release_error: &'a E,
    },
    /// An earlier error was dropped because a release failed.
    ///
    /// The discarded error may come from a use action, from an acquisition
    /// that triggered a rollback, or from a release that ran before the
    /// failing one.
    Error {
        /// The error that is no longer propagated.
        discarded: &'a E,
        /// The release error that is propagated instead.
        release_error: &'a E,
    },
}

impl<E> Clone for Shadowed<'_, E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E> Copy for Shadowed<'_, E> {}

impl<'a, E> Shadowed<'a, E> {
    /// The release error that won.
    pub fn release_error(&self) -> &'a E {
        match self {
            Shadowed::Value { release_error } | Shadowed::Error { release_error, .. } => {
                release_error
            }
        }
    }

    /// The error that was dropped, if an error was dropped.
    pub fn discarded(&self) -> Option<&'a E> {
        match self {
            Shadowed::Value { .. } => None,
            Shadowed::Error { discarded, .. } => Some(discarded),
        }
    }
}

/// Hook notified whenever a release failure discards another outcome.
///
/// Implemented for any `Fn(Shadowed<'_, E>) + Send + Sync` closure.
pub trait ShadowObserver<E>: Send + Sync {
    /// Called once per discarded outcome.
    fn shadowed(&self, event: Shadowed<'_, E>);
}

impl<E, F> ShadowObserver<E> for F
where
    F: Fn(Shadowed<'_, E>) + Send + Sync,
{
    fn shadowed(&self, event: Shadowed<'_, E>) {
        self(event)
    }
}

/// Observer shared by every level of a managed run.
///
/// Cheap to clone; every composed handle hands the same observer down to its
/// constituents.
pub struct SharedObserver<E>(Arc<dyn ShadowObserver<E>>);

impl<E> SharedObserver<E> {
    /// Share an observer.
    pub fn new<O>(observer: O) -> Self
    where
        O: ShadowObserver<E> + 'static,
    {
        SharedObserver(Arc::new(observer))
    }
}

impl<E> Clone for SharedObserver<E> {
    fn clone(&self) -> Self {
        SharedObserver(Arc::clone(&self.0))
    }
}

impl<E> std::fmt::Debug for SharedObserver<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("SharedObserver")
            .field(&"<observer>")
            .finish()
    }
}

impl<E> ShadowObserver<E> for SharedObserver<E> {
    fn shadowed(&self, event: Shadowed<'_, E>) {
        self.0.shadowed(event)
    }
}

/// Logs discarded outcomes as `tracing` warnings.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl<E: Debug> ShadowObserver<E> for TracingObserver {
    fn shadowed(&self, event: Shadowed<'_, E>) {
        match event {
            Shadowed::Value { release_error } => {
                tracing::warn!(
                    release_error = ?release_error,
                    "release failed after a successful use; result discarded"
                );
            }
            Shadowed::Error {
                discarded,
                release_error,
            } => {
                tracing::warn!(
                    discarded = ?discarded,
                    release_error = ?release_error,
                    "release failed; earlier error discarded"
                );
            }
        }
    }
}
