//! Reusable resource handles.
//!
//! A [`Managed`] captures how to acquire and release a resource without doing
//! either. Running it with a use function performs one full
//! acquire/use/release cycle; running it again performs another.
//!
//! Handles compose into larger handles:
//!
//! | Composition | Acquire order | Release order |
//! |-------------|---------------|---------------|
//! | [`and_then`](Managed::and_then) | outer, then inner | inner, then outer |
//! | [`zip`](Managed::zip), [`zip3`](Managed::zip3), [`zip4`](Managed::zip4) | declaration order | reverse |
//! | [`sequence`](Managed::sequence), [`traverse`](Managed::traverse), [`fold`](Managed::fold) | collection order | reverse |
//!
//! When an acquisition fails partway through, only the resources acquired so
//! far are released, newest first.
//!
//! # Example
//!
//! ```rust
//! use managed_effect::effect::prelude::*;
//! use managed_effect::managed::Managed;
//!
//! # tokio_test::block_on(async {
//! let session = Managed::new(
//!     || pure::<_, String, ()>("session".to_string()),
//!     |_session| async { Ok(()) },
//! );
//! let connection = session.and_then(|session| {
//!     let name = format!("{}/conn", session);
//!     Managed::new(move || pure(name.clone()), |_conn| async { Ok(()) })
//! });
//!
//! let result = connection.with(|conn| pure(conn.len())).run(&()).await;
//! assert_eq!(result, Ok(12));
//! # });
//! ```
//!
//! # Failures
//!
//! A release failure replaces whatever the run was about to return, at every
//! level of nesting. The replaced outcome is handed to the run's
//! [`ShadowObserver`](crate::observer::ShadowObserver): a `tracing` warning by
//! default, or the observer passed to [`ManagedWith::observe`].
//!
//! # Cancellation
//!
//! Cancellation is not supported. Releases run as part of the run's future, so
//! dropping that future before it completes (a `tokio::time::timeout`, a lost
//! `select!` branch, an aborted task) skips every release that has not started
//! yet. Run managed effects to completion, or enforce timeouts inside the
//! acquire and use effects themselves.

mod allocated;
mod compose;
mod fold;

use std::sync::Arc;

pub use allocated::{release_fn, Allocated, ReleaseFn};

use crate::effect::{BoxFuture, Effect, EffectExt};
use crate::observer::{ShadowObserver, SharedObserver, TracingObserver};

type AllocateFn<R, E, Env> =
    dyn Fn(Env, SharedObserver<E>) -> BoxFuture<'static, Result<Allocated<R, E>, E>> + Send + Sync;

/// A deferred, reusable acquire/release pair.
///
/// Constructing or cloning a `Managed` performs no effect. Each
/// [`with`](Managed::with) run acquires fresh resources and releases them
/// before returning.
pub struct Managed<R, E, Env = ()> {
    allocate: Arc<AllocateFn<R, E, Env>>,
}

impl<R, E, Env> Clone for Managed<R, E, Env> {
    fn clone(&self) -> Self {
        Managed {
            allocate: Arc::clone(&self.allocate),
        }
    }
}

impl<R, E, Env> std::fmt::Debug for Managed<R, E, Env> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Managed")
            .field("allocate", &"<function>")
            .finish()
    }
}

impl<R, E, Env> Managed<R, E, Env>
where
    R: Send + 'static,
    E: Send + 'static,
    Env: Clone + Send + Sync + 'static,
{
    /// Build a handle from a raw allocation function.
    ///
    /// The function receives the run's environment and observer, and must
    /// either return the acquired resource with its release action or fail
    /// having released everything it acquired.
    pub fn from_allocate<F, Fut>(allocate: F) -> Self
    where
        F: Fn(Env, SharedObserver<E>) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = Result<Allocated<R, E>, E>> + Send + 'static,
    {
        Managed {
            allocate: Arc::new(
                move |env: Env,
                      observer: SharedObserver<E>|
                      -> BoxFuture<'static, Result<Allocated<R, E>, E>> {
                    Box::pin(allocate(env, observer))
                },
            ),
        }
    }

    /// Acquire the resource, leaving its release to the caller.
    ///
    /// Most code wants [`with`](Managed::with), which cannot forget the
    /// release.
    pub fn allocate(
        &self,
        env: Env,
        observer: SharedObserver<E>,
    ) -> BoxFuture<'static, Result<Allocated<R, E>, E>> {
        (self.allocate)(env, observer)
    }

    /// Create a handle from an acquire effect factory and a release function.
    ///
    /// `acquire` is called once per run to build a fresh acquire effect.
    /// `release` receives the resource by value.
    ///
    /// # Example
    ///
    /// ```rust
    /// use managed_effect::effect::prelude::*;
    /// use managed_effect::managed::Managed;
    ///
    /// #[derive(Clone)]
    /// struct Env {
    ///     dsn: String,
    /// }
    ///
    /// let connection = Managed::new(
    ///     || from_fn(|env: &Env| Ok::<_, String>(format!("conn:{}", env.dsn))),
    ///     |_conn: String| async { Ok(()) },
    /// );
    ///
    /// let env = Env { dsn: "db".to_string() };
    /// let len = connection.with(|conn| pure(conn.len())).run_blocking(&env);
    /// assert_eq!(len, Ok(7));
    /// ```
    pub fn new<A, Acq, Rel, RelFut>(acquire: A, release: Rel) -> Self
    where
        A: Fn() -> Acq + Send + Sync + 'static,
        Acq: Effect<Output = R, Error = E, Env = Env> + Send + 'static,
        Rel: Fn(R) -> RelFut + Send + Sync + 'static,
        RelFut: std::future::Future<Output = Result<(), E>> + Send + 'static,
    {
        let release = Arc::new(release);
        Managed::from_allocate(move |env: Env, _observer: SharedObserver<E>| {
            let acquire = acquire();
            let release = Arc::clone(&release);
            async move {
                let resource = acquire.run(&env).await?;
                Ok(Allocated::new(resource, move |resource| (*release)(resource)))
            }
        })
    }

    /// A handle over a plain value, with nothing to acquire or release.
    ///
    /// This is the identity for [`and_then`](Managed::and_then).
    pub fn pure(value: R) -> Self
    where
        R: Clone + Sync,
    {
        Managed::from_allocate(move |_env: Env, _observer: SharedObserver<E>| {
            let value = value.clone();
            async move { Ok(Allocated::unmanaged(value)) }
        })
    }

    /// Expose a value computed from the resource.
    ///
    /// The underlying resource stays acquired until the run releases it.
    pub fn map<B, F>(&self, f: F) -> Managed<B, E, Env>
    where
        B: Send + 'static,
        F: Fn(&R) -> B + Send + Sync + 'static,
    {
        let inner = self.clone();
        let f = Arc::new(f);
        Managed::from_allocate(move |env: Env, observer: SharedObserver<E>| {
            let allocation = inner.allocate(env, observer);
            let f = Arc::clone(&f);
            async move { Ok(allocation.await?.map(|resource| (*f)(resource))) }
        })
    }

    /// Run this handle with a use function.
    ///
    /// Returns an effect that acquires the resource, runs `use_fn` on it,
    /// and releases it. Nothing happens until the effect is run.
    ///
    /// Outcomes discarded by release failures are logged through `tracing`
    /// unless [`ManagedWith::observe`] installs another observer.
    pub fn with<U, UseEff, T>(&self, use_fn: U) -> ManagedWith<R, E, Env, U>
    where
        U: FnOnce(&R) -> UseEff + Send,
        UseEff: Effect<Output = T, Error = E, Env = Env>,
        T: Send,
    {
        ManagedWith {
            managed: self.clone(),
            use_fn,
            observer: TracingObserver,
        }
    }
}

/// Create a handle from an acquire effect factory and a release function.
///
/// Shorthand for [`Managed::new`].
pub fn managed<R, E, Env, A, Acq, Rel, RelFut>(acquire: A, release: Rel) -> Managed<R, E, Env>
where
    R: Send + 'static,
    E: Send + 'static,
    Env: Clone + Send + Sync + 'static,
    A: Fn() -> Acq + Send + Sync + 'static,
    Acq: Effect<Output = R, Error = E, Env = Env> + Send + 'static,
    Rel: Fn(R) -> RelFut + Send + Sync + 'static,
    RelFut: std::future::Future<Output = Result<(), E>> + Send + 'static,
{
    Managed::new(acquire, release)
}

/// Effect produced by [`Managed::with`].
///
/// Running it performs one acquire/use/release cycle of the handle. The
/// result is the same as nesting one bracket per constituent handle.
pub struct ManagedWith<R, E, Env, U, Obs = TracingObserver> {
    managed: Managed<R, E, Env>,
    use_fn: U,
    observer: Obs,
}

impl<R, E, Env, U, Obs> std::fmt::Debug for ManagedWith<R, E, Env, U, Obs> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManagedWith")
            .field("managed", &self.managed)
            .field("use_fn", &"<function>")
            .field("observer", &"<observer>")
            .finish()
    }
}

impl<R, E, Env, U, Obs> ManagedWith<R, E, Env, U, Obs> {
    /// Report outcomes discarded by release failures to `observer`.
    ///
    /// The observer is shared by every level of a composed handle.
    pub fn observe<O>(self, observer: O) -> ManagedWith<R, E, Env, U, SharedObserver<E>>
    where
        O: ShadowObserver<E> + 'static,
    {
        ManagedWith {
            managed: self.managed,
            use_fn: self.use_fn,
            observer: SharedObserver::new(observer),
        }
    }
}

impl<R, E, Env, U, Obs, UseEff, T> Effect for ManagedWith<R, E, Env, U, Obs>
where
    R: Send + 'static,
    E: Send + 'static,
    Env: Clone + Send + Sync + 'static,
    U: FnOnce(&R) -> UseEff + Send,
    UseEff: Effect<Output = T, Error = E, Env = Env>,
    T: Send,
    Obs: ShadowObserver<E> + 'static,
{
    type Output = T;
    type Error = E;
    type Env = Env;

    async fn run(self, env: &Env) -> Result<T, E> {
        let ManagedWith {
            managed,
            use_fn,
            observer,
        } = self;
        let observer = SharedObserver::new(observer);

        let allocated = managed.allocate(env.clone(), observer.clone()).await?;

        let outcome = use_fn(allocated.resource())
            .attempt()
            .run(env)
            .await
            .unwrap_or_else(Err);

        allocated.settle(outcome, &observer).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effect::prelude::*;
    use crate::observer::Shadowed;
    use crate::testing::{failing_acquire, failing_release, tracked, EventLog, ShadowLog, ShadowRecord};
    use tracing_test::traced_test;

    #[tokio::test]
    async fn construction_performs_no_effect() {
        let log = EventLog::new();
        let handle = tracked(&log, "R");
        let _copy = handle.clone();
        let _mapped = handle.map(|r| r.len());

        assert!(log.events().is_empty());
    }

    #[tokio::test]
    async fn with_acquires_uses_and_releases() {
        let log = EventLog::new();
        let handle = tracked(&log, "R");

        let result = handle.with(|r| pure(r.len())).run(&()).await;

        assert_eq!(result, Ok(1));
        assert_eq!(log.events(), vec!["acquire R", "release R"]);
    }

    #[tokio::test]
    async fn use_failure_still_releases() {
        let log = EventLog::new();
        let handle = tracked(&log, "R");

        let result = handle
            .with(|_| fail::<usize, _, ()>("use failed".to_string()))
            .run(&())
            .await;

        assert_eq!(result, Err("use failed".to_string()));
        assert_eq!(log.events(), vec!["acquire R", "release R"]);
    }

    #[tokio::test]
    async fn acquire_failure_skips_use_and_release() {
        let log = EventLog::new();
        let handle = failing_acquire(&log, "R", "boom");
        let used = std::sync::atomic::AtomicBool::new(false);

        let result = handle
            .with(|r| {
                used.store(true, std::sync::atomic::Ordering::SeqCst);
                pure(r.len())
            })
            .run(&())
            .await;

        assert_eq!(result, Err("boom".to_string()));
        assert!(!used.load(std::sync::atomic::Ordering::SeqCst));
        assert_eq!(log.events(), vec!["acquire R failed"]);
    }

    #[tokio::test]
    async fn each_run_is_independent() {
        let log = EventLog::new();
        let handle = tracked(&log, "R");

        let first = handle.with(|r| pure(r.len())).run(&()).await;
        let second = handle.with(|r| pure(format!("{}!", r))).run(&()).await;

        assert_eq!(first, Ok(1));
        assert_eq!(second, Ok("R!".to_string()));
        assert_eq!(
            log.events(),
            vec!["acquire R", "release R", "acquire R", "release R"]
        );
    }

    #[tokio::test]
    async fn release_failure_wins_and_is_observed() {
        let log = EventLog::new();
        let shadows = ShadowLog::new();
        let handle = failing_release(&log, "R", "close failed");

        let result = handle
            .with(|r| pure(r.len()))
            .observe(shadows.clone())
            .run(&())
            .await;

        assert_eq!(result, Err("close failed".to_string()));
        assert_eq!(
            shadows.records(),
            vec![ShadowRecord::Value {
                release_error: "close failed".to_string()
            }]
        );
    }

    #[tokio::test]
    #[traced_test]
    async fn default_observer_logs_shadowed_use_error() {
        let log = EventLog::new();
        let handle = failing_release(&log, "R", "close failed");

        let result = handle
            .with(|_| fail::<usize, _, ()>("query failed".to_string()))
            .run(&())
            .await;

        assert_eq!(result, Err("close failed".to_string()));
        assert!(logs_contain("earlier error discarded"));
        assert!(logs_contain("query failed"));
    }

    #[tokio::test]
    async fn observed_runs_accept_errors_without_debug() {
        struct Opaque(&'static str);

        let handle = Managed::new(
            || pure::<_, Opaque, ()>(3),
            |_| async { Err(Opaque("close")) },
        );
        let shadowed = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let counter = Arc::clone(&shadowed);

        let result = handle
            .with(|n| pure(*n))
            .observe(move |_: Shadowed<'_, Opaque>| {
                counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            })
            .run(&())
            .await;

        assert!(matches!(result, Err(Opaque("close"))));
        assert_eq!(shadowed.load(std::sync::atomic::Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn map_exposes_derived_value() {
        let log = EventLog::new();
        let handle = tracked(&log, "socket").map(|name| name.to_uppercase());

        let result = handle.with(|upper| pure(upper.clone())).run(&()).await;

        assert_eq!(result, Ok("SOCKET".to_string()));
        assert_eq!(log.events(), vec!["acquire socket", "release socket"]);
    }

    #[tokio::test]
    async fn pure_has_no_lifecycle() {
        let handle = Managed::<_, String, ()>::pure(5);

        assert_eq!(handle.with(|n| pure(*n * 2)).run(&()).await, Ok(10));
    }

    #[tokio::test]
    async fn environment_reaches_acquire_and_use() {
        #[derive(Clone)]
        struct Env {
            prefix: String,
        }

        let handle = managed(
            || from_fn(|env: &Env| Ok::<_, String>(format!("{}-conn", env.prefix))),
            |_conn: String| async { Ok(()) },
        );
        let effect = handle.with(|conn| {
            let conn = conn.clone();
            from_fn(move |env: &Env| Ok(format!("{} via {}", env.prefix, conn)))
        });

        let env = Env {
            prefix: "db".to_string(),
        };
        assert_eq!(effect.run(&env).await, Ok("db via db-conn".to_string()));
    }

    #[test]
    fn runs_without_an_async_runtime() {
        let log = EventLog::new();
        let handle = tracked(&log, "R");

        assert_eq!(handle.with(|r| pure(r.len())).run_blocking(&()), Ok(1));
        assert_eq!(log.events(), vec!["acquire R", "release R"]);
    }
}
