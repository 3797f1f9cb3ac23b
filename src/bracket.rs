//! Bracket pattern for guaranteed resource release.
//!
//! This module provides:
//!
//! - [`bracket`] - Acquire/use/release with guaranteed release
//! - [`bracket_full`] - Same lifecycle, returning every error in a [`BracketError`]
//! - [`BracketError`] - Error type for `bracket_full`
//!
//! # Resolution Policy
//!
//! `bracket` runs `use` through [`attempt`](crate::effect::EffectExt::attempt),
//! so a failing use never skips the release. The final outcome is resolved as:
//!
//! | use | release | result |
//! |-----|---------|--------|
//! | `Ok(a)` | `Ok(())` | `Ok(a)` |
//! | `Ok(a)` | `Err(e)` | `Err(e)` |
//! | `Err(e1)` | `Ok(())` | `Err(e1)` |
//! | `Err(e1)` | `Err(e2)` | `Err(e2)` |
//!
//! A release failure always wins. Whatever it replaces is reported to the
//! bracket's [`ShadowObserver`](crate::observer::ShadowObserver), which logs
//! through `tracing` unless [`Bracket::observe`] installs another one. Use
//! [`bracket_full`] when both errors are needed as data.
//!
//! # Example
//!
//! ```rust
//! use managed_effect::bracket::bracket;
//! use managed_effect::effect::prelude::*;
//!
//! # tokio_test::block_on(async {
//! let result = bracket(
//!     pure::<_, String, ()>("R".to_string()),
//!     |_conn: String| async { Ok(()) },
//!     |conn: &String| pure(conn.len()),
//! )
//! .run(&())
//! .await;
//!
//! assert_eq!(result, Ok(1));
//! # });
//! ```

use std::fmt::Debug;
use std::future::Future;

use crate::effect::{Effect, EffectExt};
use crate::observer::{ShadowObserver, Shadowed, TracingObserver};

// ============================================================================
// BracketError
// ============================================================================

/// Error type for [`bracket_full`].
///
/// Each variant identifies which phase of the bracket failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BracketError<E> {
    /// Resource acquisition failed - the resource was never used.
    AcquireError(E),
    /// The use function failed, release succeeded.
    UseError(E),
    /// The use function succeeded, release failed.
    CleanupError(E),
    /// Both use and release failed.
    Both {
        /// The error from the use function
        use_error: E,
        /// The error from the release function
        cleanup_error: E,
    },
}

impl<E> BracketError<E> {
    /// Returns the acquire error, if any.
    pub fn acquire_error(&self) -> Option<&E> {
        match self {
            BracketError::AcquireError(e) => Some(e),
            _ => None,
        }
    }

    /// Returns the use error, if any.
    pub fn use_error(&self) -> Option<&E> {
        match self {
            BracketError::UseError(e) | BracketError::Both { use_error: e, .. } => Some(e),
            _ => None,
        }
    }

    /// Returns the release error, if any.
    pub fn cleanup_error(&self) -> Option<&E> {
        match self {
            BracketError::CleanupError(e)
            | BracketError::Both {
                cleanup_error: e, ..
            } => Some(e),
            _ => None,
        }
    }

    /// Collapse into the error `bracket` would have returned.
    ///
    /// Applies the release-wins policy: a release error takes precedence
    /// over the use error.
    pub fn into_prevailing(self) -> E {
        match self {
            BracketError::AcquireError(e)
            | BracketError::UseError(e)
            | BracketError::CleanupError(e) => e,
            BracketError::Both { cleanup_error, .. } => cleanup_error,
        }
    }

    /// Maps the error type using the provided function.
    pub fn map<F, E2>(self, f: F) -> BracketError<E2>
    where
        F: Fn(E) -> E2,
    {
        match self {
            BracketError::AcquireError(e) => BracketError::AcquireError(f(e)),
            BracketError::UseError(e) => BracketError::UseError(f(e)),
            BracketError::CleanupError(e) => BracketError::CleanupError(f(e)),
            BracketError::Both {
                use_error,
                cleanup_error,
            } => BracketError::Both {
                use_error: f(use_error),
                cleanup_error: f(cleanup_error),
            },
        }
    }
}

impl<E: std::fmt::Display> std::fmt::Display for BracketError<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BracketError::AcquireError(e) => write!(f, "acquire failed: {}", e),
            BracketError::UseError(e) => write!(f, "{}", e),
            BracketError::CleanupError(e) => write!(f, "release failed: {}", e),
            BracketError::Both {
                use_error,
                cleanup_error,
            } => {
                write!(
                    f,
                    "use failed: {}; release also failed: {}",
                    use_error, cleanup_error
                )
            }
        }
    }
}

impl<E: std::error::Error + 'static> std::error::Error for BracketError<E> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BracketError::AcquireError(e) => Some(e),
            BracketError::UseError(e) => Some(e),
            BracketError::Both { use_error, .. } => Some(use_error),
            BracketError::CleanupError(e) => Some(e),
        }
    }
}

// ============================================================================
// Resolution policy
// ============================================================================

/// Combine an outcome with the result of the release that followed it.
///
/// The release error wins; the outcome it replaces goes to `observer`.
pub(crate) fn resolve<T, E, O>(outcome: Result<T, E>, released: Result<(), E>, observer: &O) -> Result<T, E>
where
    O: ShadowObserver<E> + ?Sized,
{
    match (outcome, released) {
        (outcome, Ok(())) => outcome,
        (Ok(_), Err(release_error)) => {
            observer.shadowed(Shadowed::Value {
                release_error: &release_error,
            });
            Err(release_error)
        }
        (Err(discarded), Err(release_error)) => {
            observer.shadowed(Shadowed::Error {
                discarded: &discarded,
                release_error: &release_error,
            });
            Err(release_error)
        }
    }
}

/// Resolve an outcome against release failures, in the order they happened.
///
/// Each failure supersedes whatever the previous step left, so the observer
/// sees the same events a nest of brackets would report.
pub(crate) fn resolve_all<T, E, O>(outcome: Result<T, E>, failures: Vec<E>, observer: &O) -> Result<T, E>
where
    O: ShadowObserver<E> + ?Sized,
{
    failures
        .into_iter()
        .fold(outcome, |outcome, failure| resolve(outcome, Err(failure), observer))
}

// ============================================================================
// Bracket - core pattern
// ============================================================================

/// Bracket combinator type for resource management.
///
/// The bracket pattern has three phases:
/// 1. **Acquire**: Obtain the resource; failure ends the bracket
/// 2. **Use**: Use the resource, with failure captured as a value
/// 3. **Release**: Release the resource exactly once
///
/// See the [module documentation](self) for how the outcomes combine.
pub struct Bracket<Acquire, Use, Release, Obs = TracingObserver> {
    acquire: Acquire,
    use_fn: Use,
    release: Release,
    observer: Obs,
}

impl<Acquire, Use, Release, Obs> std::fmt::Debug for Bracket<Acquire, Use, Release, Obs> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bracket")
            .field("acquire", &"<effect>")
            .field("use_fn", &"<function>")
            .field("release", &"<function>")
            .field("observer", &"<observer>")
            .finish()
    }
}

impl<Acquire, Use, Release> Bracket<Acquire, Use, Release> {
    /// Create a new Bracket that logs discarded outcomes through `tracing`.
    pub fn new(acquire: Acquire, use_fn: Use, release: Release) -> Self {
        Bracket {
            acquire,
            use_fn,
            release,
            observer: TracingObserver,
        }
    }
}

impl<Acquire, Use, Release, Obs> Bracket<Acquire, Use, Release, Obs> {
    /// Report discarded outcomes to `observer` instead.
    pub fn observe<Obs2>(self, observer: Obs2) -> Bracket<Acquire, Use, Release, Obs2> {
        Bracket {
            acquire: self.acquire,
            use_fn: self.use_fn,
            release: self.release,
            observer,
        }
    }
}

impl<Acquire, Use, Release, Obs, UseEffect, R, T, E, Env, RelFut> Effect
    for Bracket<Acquire, Use, Release, Obs>
where
    Acquire: Effect<Output = R, Error = E, Env = Env>,
    Use: FnOnce(&R) -> UseEffect + Send,
    UseEffect: Effect<Output = T, Error = E, Env = Env>,
    Release: FnOnce(R) -> RelFut + Send,
    RelFut: Future<Output = Result<(), E>> + Send,
    Obs: ShadowObserver<E>,
    R: Send,
    T: Send,
    E: Send,
    Env: Clone + Send + Sync,
{
    type Output = T;
    type Error = E;
    type Env = Env;

    async fn run(self, env: &Self::Env) -> Result<T, E> {
        let resource = self.acquire.run(env).await?;

        let outcome = (self.use_fn)(&resource)
            .attempt()
            .run(env)
            .await
            .unwrap_or_else(Err);

        let released = (self.release)(resource).await;

        resolve(outcome, released, &self.observer)
    }
}

/// Bracket pattern for guaranteed resource release.
///
/// Acquires a resource, uses it, and releases it exactly once if the
/// acquisition succeeded. A release failure replaces the use outcome.
///
/// # Type Parameters
///
/// * `Acquire` - Effect that acquires the resource
/// * `Use` - Function that uses the resource (receives a reference)
/// * `Release` - Function that releases the resource (receives ownership)
///
/// # Example
///
/// ```rust,ignore
/// use managed_effect::prelude::*;
///
/// let effect = bracket(
///     from_async(|env: &AppEnv| env.pool.clone().checkout()),
///     |conn| async move { conn.close().await },
///     |conn| from_fn(move |_| conn.execute("SELECT 1")),
/// );
/// ```
pub fn bracket<Acquire, Use, Release, UseEffect, R, T, E, Env, RelFut>(
    acquire: Acquire,
    release: Release,
    use_fn: Use,
) -> Bracket<Acquire, Use, Release>
where
    Acquire: Effect<Output = R, Error = E, Env = Env>,
    Use: FnOnce(&R) -> UseEffect + Send,
    UseEffect: Effect<Output = T, Error = E, Env = Env>,
    Release: FnOnce(R) -> RelFut + Send,
    RelFut: Future<Output = Result<(), E>> + Send,
    R: Send,
    T: Send,
    E: Send + Debug,
    Env: Clone + Send + Sync,
{
    Bracket::new(acquire, use_fn, release)
}

// ============================================================================
// BracketFull - explicit error handling
// ============================================================================

/// Bracket with explicit error handling - returns BracketError with all error info.
pub struct BracketFull<Acquire, Use, Release> {
    acquire: Acquire,
    use_fn: Use,
    release: Release,
}

impl<Acquire, Use, Release> std::fmt::Debug for BracketFull<Acquire, Use, Release> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BracketFull")
            .field("acquire", &"<effect>")
            .field("use_fn", &"<function>")
            .field("release", &"<function>")
            .finish()
    }
}

impl<Acquire, Use, Release> BracketFull<Acquire, Use, Release> {
    /// Create a new BracketFull.
    pub fn new(acquire: Acquire, use_fn: Use, release: Release) -> Self {
        BracketFull {
            acquire,
            use_fn,
            release,
        }
    }
}

impl<Acquire, Use, Release, UseEffect, R, T, E, Env, RelFut> Effect
    for BracketFull<Acquire, Use, Release>
where
    Acquire: Effect<Output = R, Error = E, Env = Env>,
    Use: FnOnce(&R) -> UseEffect + Send,
    UseEffect: Effect<Output = T, Error = E, Env = Env>,
    Release: FnOnce(R) -> RelFut + Send,
    RelFut: Future<Output = Result<(), E>> + Send,
    R: Send,
    T: Send,
    E: Send,
    Env: Clone + Send + Sync,
{
    type Output = T;
    type Error = BracketError<E>;
    type Env = Env;

    async fn run(self, env: &Self::Env) -> Result<T, BracketError<E>> {
        let resource = self
            .acquire
            .run(env)
            .await
            .map_err(BracketError::AcquireError)?;

        let use_result = (self.use_fn)(&resource).run(env).await;

        let release_result = (self.release)(resource).await;

        match (use_result, release_result) {
            (Ok(value), Ok(())) => Ok(value),
            (Ok(_), Err(cleanup_err)) => Err(BracketError::CleanupError(cleanup_err)),
            (Err(use_err), Ok(())) => Err(BracketError::UseError(use_err)),
            (Err(use_err), Err(cleanup_err)) => Err(BracketError::Both {
                use_error: use_err,
                cleanup_error: cleanup_err,
            }),
        }
    }
}

/// Bracket with explicit error handling.
///
/// Unlike [`bracket`], nothing is discarded: the returned [`BracketError`]
/// carries the use error and the release error when both occur.
///
/// # Example
///
/// ```rust
/// use managed_effect::bracket::{bracket_full, BracketError};
/// use managed_effect::effect::prelude::*;
///
/// # tokio_test::block_on(async {
/// let result = bracket_full(
///     pure::<_, String, ()>(1),
///     |_: i32| async { Err("close failed".to_string()) },
///     |_: &i32| fail::<i32, _, ()>("query failed".to_string()),
/// )
/// .run(&())
/// .await;
///
/// assert_eq!(
///     result,
///     Err(BracketError::Both {
///         use_error: "query failed".to_string(),
///         cleanup_error: "close failed".to_string(),
///     })
/// );
/// # });
/// ```
pub fn bracket_full<Acquire, Use, Release, UseEffect, R, T, E, Env, RelFut>(
    acquire: Acquire,
    release: Release,
    use_fn: Use,
) -> BracketFull<Acquire, Use, Release>
where
    Acquire: Effect<Output = R, Error = E, Env = Env>,
    Use: FnOnce(&R) -> UseEffect + Send,
    UseEffect: Effect<Output = T, Error = E, Env = Env>,
    Release: FnOnce(R) -> RelFut + Send,
    RelFut: Future<Output = Result<(), E>> + Send,
    R: Send,
    T: Send,
    E: Send,
    Env: Clone + Send + Sync,
{
    BracketFull::new(acquire, use_fn, release)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effect::constructors::{fail, from_fn, pure};
    use crate::testing::{ShadowLog, ShadowRecord};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;
    use tracing_test::traced_test;

    #[tokio::test]
    async fn bracket_returns_error_on_acquire_failure() {
        let used = Arc::new(AtomicBool::new(false));
        let released = Arc::new(AtomicBool::new(false));
        let used_clone = used.clone();
        let released_clone = released.clone();

        let result = bracket(
            fail::<i32, String, ()>("acquire failed".to_string()),
            move |_: i32| {
                released_clone.store(true, Ordering::SeqCst);
                async { Ok(()) }
            },
            move |val: &i32| {
                used_clone.store(true, Ordering::SeqCst);
                pure::<_, String, ()>(*val * 2)
            },
        )
        .run(&())
        .await;

        assert_eq!(result, Err("acquire failed".to_string()));
        assert!(!used.load(Ordering::SeqCst), "use must NOT run");
        assert!(!released.load(Ordering::SeqCst), "release must NOT run");
    }

    #[tokio::test]
    async fn bracket_releases_once_on_success() {
        let releases = Arc::new(AtomicUsize::new(0));
        let releases_clone = releases.clone();

        let result = bracket(
            pure::<_, String, ()>(42),
            move |_: i32| {
                releases_clone.fetch_add(1, Ordering::SeqCst);
                async { Ok(()) }
            },
            |val: &i32| pure::<_, String, ()>(*val * 2),
        )
        .run(&())
        .await;

        assert_eq!(result, Ok(84));
        assert_eq!(releases.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn bracket_does_nothing_until_run() {
        let acquired = Arc::new(AtomicBool::new(false));
        let acquired_clone = acquired.clone();

        let effect = bracket(
            from_fn(move |_: &()| {
                acquired_clone.store(true, Ordering::SeqCst);
                Ok::<_, String>(1)
            }),
            |_: i32| async { Ok(()) },
            |val: &i32| pure::<_, String, ()>(*val),
        );
        assert!(!acquired.load(Ordering::SeqCst));

        assert_eq!(effect.run(&()).await, Ok(1));
        assert!(acquired.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn bracket_releases_once_on_use_failure() {
        let releases = Arc::new(AtomicUsize::new(0));
        let releases_clone = releases.clone();

        let result = bracket(
            pure::<_, String, ()>(42),
            move |_: i32| {
                releases_clone.fetch_add(1, Ordering::SeqCst);
                async { Ok(()) }
            },
            |_: &i32| fail::<i32, String, ()>("use failed".to_string()),
        )
        .run(&())
        .await;

        assert_eq!(result, Err("use failed".to_string()));
        assert_eq!(releases.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn release_failure_replaces_successful_result() {
        let shadows = ShadowLog::new();

        let result = bracket(
            pure::<_, String, ()>(42),
            |_: i32| async { Err::<(), String>("release failed".to_string()) },
            |val: &i32| pure::<_, String, ()>(*val * 2),
        )
        .observe(shadows.clone())
        .run(&())
        .await;

        assert_eq!(result, Err("release failed".to_string()));
        assert_eq!(
            shadows.records(),
            vec![ShadowRecord::Value {
                release_error: "release failed".to_string()
            }]
        );
    }

    #[tokio::test]
    async fn release_failure_replaces_use_failure() {
        let shadows = ShadowLog::new();

        let result = bracket(
            pure::<_, String, ()>(42),
            |_: i32| async { Err::<(), String>("release failed".to_string()) },
            |_: &i32| fail::<i32, String, ()>("use failed".to_string()),
        )
        .observe(shadows.clone())
        .run(&())
        .await;

        assert_eq!(result, Err("release failed".to_string()));
        assert_eq!(
            shadows.records(),
            vec![ShadowRecord::Error {
                discarded: "use failed".to_string(),
                release_error: "release failed".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn nothing_is_reported_without_a_release_failure() {
        let shadows = ShadowLog::new();

        let result = bracket(
            pure::<_, String, ()>(1),
            |_: i32| async { Ok(()) },
            |_: &i32| fail::<i32, String, ()>("use failed".to_string()),
        )
        .observe(shadows.clone())
        .run(&())
        .await;

        assert_eq!(result, Err("use failed".to_string()));
        assert!(shadows.records().is_empty());
    }

    #[tokio::test]
    #[traced_test]
    async fn default_observer_logs_discarded_result() {
        let result = bracket(
            pure::<_, String, ()>(42),
            |_: i32| async { Err::<(), String>("socket close failed".to_string()) },
            |val: &i32| pure::<_, String, ()>(*val),
        )
        .run(&())
        .await;

        assert_eq!(result, Err("socket close failed".to_string()));
        assert!(logs_contain("result discarded"));
        assert!(logs_contain("socket close failed"));
    }

    #[test]
    fn bracket_runs_synchronously() {
        let result = bracket(
            pure::<_, String, ()>("R".to_string()),
            |_: String| async { Ok(()) },
            |r: &String| pure::<_, String, ()>(r.len()),
        )
        .run_blocking(&());

        assert_eq!(result, Ok(1));
    }

    #[test]
    fn resolve_follows_release_wins_table() {
        let shadows = ShadowLog::<&str>::new();

        assert_eq!(resolve(Ok::<_, &str>(1), Ok(()), &shadows), Ok(1));
        assert_eq!(resolve(Ok::<i32, _>(1), Err("r"), &shadows), Err("r"));
        assert_eq!(resolve(Err::<i32, _>("u"), Ok(()), &shadows), Err("u"));
        assert_eq!(resolve(Err::<i32, _>("u"), Err("r"), &shadows), Err("r"));
        assert_eq!(shadows.records().len(), 2);
    }

    #[test]
    fn resolve_all_reports_each_failure_against_its_predecessor() {
        let shadows = ShadowLog::<&str>::new();

        assert_eq!(resolve_all(Ok::<_, &str>(1), Vec::new(), &shadows), Ok(1));
        assert!(shadows.records().is_empty());

        let result = resolve_all(Ok::<i32, _>(1), vec!["inner", "outer"], &shadows);

        assert_eq!(result, Err("outer"));
        assert_eq!(
            shadows.records(),
            vec![
                ShadowRecord::Value {
                    release_error: "inner",
                },
                ShadowRecord::Error {
                    discarded: "inner",
                    release_error: "outer",
                },
            ]
        );
    }

    #[tokio::test]
    async fn bracket_full_returns_both_errors() {
        let result = bracket_full(
            pure::<_, String, ()>(42),
            |_: i32| async { Err::<(), String>("cleanup failed".to_string()) },
            |_: &i32| fail::<i32, String, ()>("use failed".to_string()),
        )
        .run(&())
        .await;

        match result.unwrap_err() {
            BracketError::Both {
                use_error,
                cleanup_error,
            } => {
                assert_eq!(use_error, "use failed");
                assert_eq!(cleanup_error, "cleanup failed");
            }
            other => panic!("expected BracketError::Both, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn bracket_full_returns_acquire_error() {
        let result = bracket_full(
            fail::<i32, String, ()>("acquire failed".to_string()),
            |_: i32| async { Ok(()) },
            |_: &i32| pure::<i32, String, ()>(42),
        )
        .run(&())
        .await;

        assert_eq!(
            result,
            Err(BracketError::AcquireError("acquire failed".to_string()))
        );
    }

    #[tokio::test]
    async fn bracket_full_returns_cleanup_error_only() {
        let result = bracket_full(
            pure::<_, String, ()>(42),
            |_: i32| async { Err::<(), String>("cleanup failed".to_string()) },
            |_: &i32| pure::<i32, String, ()>(84),
        )
        .run(&())
        .await;

        assert_eq!(
            result,
            Err(BracketError::CleanupError("cleanup failed".to_string()))
        );
    }

    #[test]
    fn bracket_error_display() {
        let acquire_err: BracketError<&str> = BracketError::AcquireError("failed");
        assert_eq!(format!("{}", acquire_err), "acquire failed: failed");

        let use_err: BracketError<&str> = BracketError::UseError("failed");
        assert_eq!(format!("{}", use_err), "failed");

        let cleanup_err: BracketError<&str> = BracketError::CleanupError("failed");
        assert_eq!(format!("{}", cleanup_err), "release failed: failed");

        let both_err: BracketError<&str> = BracketError::Both {
            use_error: "use failed",
            cleanup_error: "cleanup failed",
        };
        assert_eq!(
            format!("{}", both_err),
            "use failed: use failed; release also failed: cleanup failed"
        );
    }

    #[test]
    fn bracket_error_accessors_and_prevailing() {
        let both_err: BracketError<&str> = BracketError::Both {
            use_error: "use",
            cleanup_error: "cleanup",
        };
        assert_eq!(both_err.acquire_error(), None);
        assert_eq!(both_err.use_error(), Some(&"use"));
        assert_eq!(both_err.cleanup_error(), Some(&"cleanup"));
        assert_eq!(both_err.into_prevailing(), "cleanup");

        let err: BracketError<i32> = BracketError::UseError(42);
        assert_eq!(err.map(|x| x.to_string()), BracketError::UseError("42".to_string()));
    }
}
