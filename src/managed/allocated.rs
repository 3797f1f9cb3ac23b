//! A live resource paired with the action that releases it.
//!
//! Allocating a [`Managed`](super::Managed) yields an [`Allocated`]. Composed
//! handles stack the release actions of their constituents, so releasing the
//! outermost allocation unwinds every resource in reverse acquisition order.
//!
//! Releasing reports failures one level at a time, innermost first. Settling
//! an outcome against them gives the same result, and the same observer
//! events, as the equivalent nest of brackets.

use std::future::Future;

use crate::bracket::resolve_all;
use crate::effect::BoxFuture;
use crate::observer::ShadowObserver;

/// Boxed release action for a resource of type `R`.
///
/// Resolves to the release failures in the order they happened.
pub type ReleaseFn<R, E> = Box<dyn FnOnce(R) -> BoxFuture<'static, Vec<E>> + Send>;

/// Box a single release function.
pub fn release_fn<R, E, F, Fut>(f: F) -> ReleaseFn<R, E>
where
    F: FnOnce(R) -> Fut + Send + 'static,
    Fut: Future<Output = Result<(), E>> + Send + 'static,
    R: Send + 'static,
{
    Box::new(move |resource: R| -> BoxFuture<'static, Vec<E>> {
        Box::pin(async move {
            let failures: Vec<E> = f(resource).await.err().into_iter().collect();
            failures
        })
    })
}

/// An acquired resource together with its release action.
///
/// The release action must be run exactly once; dropping an `Allocated`
/// without calling [`release`](Allocated::release) or
/// [`settle`](Allocated::settle) leaks the resource.
pub struct Allocated<R, E> {
    resource: R,
    release: ReleaseFn<R, E>,
}

impl<R, E> std::fmt::Debug for Allocated<R, E>
where
    R: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Allocated")
            .field("resource", &self.resource)
            .field("release", &"<function>")
            .finish()
    }
}

impl<R, E> Allocated<R, E>
where
    R: Send + 'static,
    E: Send + 'static,
{
    /// Pair a resource with its release function.
    pub fn new<F, Fut>(resource: R, release: F) -> Self
    where
        F: FnOnce(R) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), E>> + Send + 'static,
    {
        Allocated::from_parts(resource, release_fn(release))
    }

    /// Pair a resource with an already boxed release action.
    pub fn from_parts(resource: R, release: ReleaseFn<R, E>) -> Self {
        Allocated { resource, release }
    }

    /// A resource with nothing to release.
    pub fn unmanaged(resource: R) -> Self {
        Allocated::new(resource, |_| async { Ok(()) })
    }

    /// Borrow the resource.
    pub fn resource(&self) -> &R {
        &self.resource
    }

    /// Run every release action, consuming the resource.
    ///
    /// Resolves to the release failures, innermost first.
    pub fn release(self) -> BoxFuture<'static, Vec<E>> {
        (self.release)(self.resource)
    }

    /// Release, then resolve `outcome` against each release failure in turn.
    ///
    /// Every outcome a failure replaces is reported to `observer`.
    pub async fn settle<T, O>(self, outcome: Result<T, E>, observer: &O) -> Result<T, E>
    where
        O: ShadowObserver<E> + ?Sized,
    {
        let failures = self.release().await;
        resolve_all(outcome, failures, observer)
    }

    /// Split into the resource and its release action.
    pub fn into_parts(self) -> (R, ReleaseFn<R, E>) {
        (self.resource, self.release)
    }

    /// Expose a value derived from the resource.
    ///
    /// The original resource stays alive until the derived value is released.
    pub(crate) fn map<B, F>(self, f: F) -> Allocated<B, E>
    where
        B: Send + 'static,
        F: FnOnce(&R) -> B,
    {
        let derived = f(&self.resource);
        Allocated::from_parts(derived, Box::new(move |_: B| self.release()))
    }

    /// Restructure the resource without touching its lifecycle.
    pub(crate) fn reshape<S>(self, to: fn(R) -> S, from: fn(S) -> R) -> Allocated<S, E>
    where
        S: Send + 'static,
    {
        let (resource, release) = self.into_parts();
        Allocated::from_parts(to(resource), Box::new(move |shaped: S| release(from(shaped))))
    }

    /// Pair with a resource acquired after this one.
    ///
    /// `next` is released first.
    pub(crate) fn alongside<R2>(self, next: Allocated<R2, E>) -> Allocated<(R, R2), E>
    where
        R2: Send + 'static,
    {
        let (first, release_first) = self.into_parts();
        let (second, release_second) = next.into_parts();
        Allocated::from_parts(
            (first, second),
            Box::new(move |(first, second): (R, R2)| -> BoxFuture<'static, Vec<E>> {
                Box::pin(async move {
                    let mut failures = release_second(second).await;
                    failures.extend(release_first(first).await);
                    failures
                })
            }),
        )
    }

    /// Keep `outer` alive underneath this resource.
    ///
    /// `outer` is released after this resource, and only its release action
    /// sees it again.
    pub(crate) fn within<O>(self, outer: Allocated<O, E>) -> Self
    where
        O: Send + 'static,
    {
        let (resource, release) = self.into_parts();
        Allocated::from_parts(
            resource,
            Box::new(move |resource: R| -> BoxFuture<'static, Vec<E>> {
                Box::pin(async move {
                    let mut failures = release(resource).await;
                    failures.extend(outer.release().await);
                    failures
                })
            }),
        )
    }
}

/// Release `resources` in reverse order, collecting every failure.
pub(crate) async fn release_all<R, E>(resources: Vec<R>, releases: Vec<ReleaseFn<R, E>>) -> Vec<E> {
    let mut failures = Vec::new();
    for (resource, release) in resources.into_iter().zip(releases).rev() {
        failures.extend(release(resource).await);
    }
    failures
}
