//! Composition over collections of handles.
//!
//! Anything that implements `IntoIterator` can be folded: a `Vec`, an
//! `Option` or a right-biased [`Either`]. Only the handles the collection
//! actually yields are acquired and released.

use std::sync::Arc;

use futures::future::{self, FutureExt};

use super::allocated::release_all;
use super::{Allocated, Managed, ReleaseFn};
use crate::bracket::resolve_all;
use crate::either::Either;
use crate::monoid::{fold_all, Monoid};
use crate::observer::SharedObserver;
use crate::semigroup::Semigroup;

impl<R, E, Env> Managed<R, E, Env>
where
    R: Send + 'static,
    E: Send + 'static,
    Env: Clone + Send + Sync + 'static,
{
    /// Acquire every handle in order.
    ///
    /// Resources are released in reverse order. If one acquisition fails,
    /// the ones before it are released, newest first. An empty collection
    /// acquires nothing.
    ///
    /// # Example
    ///
    /// ```rust
    /// use managed_effect::effect::prelude::*;
    /// use managed_effect::managed::Managed;
    ///
    /// let files: Vec<Managed<String, String>> = ["a.log", "b.log"]
    ///     .into_iter()
    ///     .map(|name| Managed::new(move || pure(name.to_string()), |_| async { Ok(()) }))
    ///     .collect();
    ///
    /// let names = Managed::sequence(files)
    ///     .with(|names| pure(names.join(",")))
    ///     .run_blocking(&());
    /// assert_eq!(names, Ok("a.log,b.log".to_string()));
    /// ```
    pub fn sequence<I>(handles: I) -> Managed<Vec<R>, E, Env>
    where
        I: IntoIterator<Item = Managed<R, E, Env>>,
    {
        let handles: Arc<[Managed<R, E, Env>]> = handles.into_iter().collect();
        Managed::from_allocate(move |env: Env, observer: SharedObserver<E>| {
            let handles = Arc::clone(&handles);
            async move {
                let mut resources = Vec::with_capacity(handles.len());
                let mut releases: Vec<ReleaseFn<R, E>> = Vec::with_capacity(handles.len());
                for handle in handles.iter() {
                    match handle.allocate(env.clone(), observer.clone()).await {
                        Ok(allocated) => {
                            let (resource, release) = allocated.into_parts();
                            resources.push(resource);
                            releases.push(release);
                        }
                        Err(error) => {
                            tracing::debug!(
                                acquired = resources.len(),
                                "acquisition failed; releasing resources acquired so far"
                            );
                            let failures = release_all(resources, releases).await;
                            return resolve_all(Err(error), failures, &observer);
                        }
                    }
                }
                Ok(Allocated::from_parts(
                    resources,
                    Box::new(move |resources: Vec<R>| release_all(resources, releases).boxed()),
                ))
            }
        })
    }

    /// Build a handle per item and acquire them all in order.
    ///
    /// Handles are built when `traverse` is called; nothing is acquired
    /// until the result is run.
    pub fn traverse<T, I, F>(items: I, f: F) -> Managed<Vec<R>, E, Env>
    where
        I: IntoIterator<Item = T>,
        F: FnMut(T) -> Managed<R, E, Env>,
    {
        Managed::sequence(items.into_iter().map(f))
    }

    /// Fold a collection of handles into one handle over a combined value.
    ///
    /// `combine` folds the acquired resources, in order, starting from
    /// `identity`. Folding an empty collection yields `identity` without
    /// acquiring anything. The resources stay acquired until the combined
    /// value is released.
    ///
    /// `identity` comes before `combine` so the closure can sit last, the
    /// same order as [`Iterator::fold`].
    ///
    /// # Example
    ///
    /// ```rust
    /// use managed_effect::effect::prelude::*;
    /// use managed_effect::managed::Managed;
    ///
    /// let pool = |size: usize| {
    ///     Managed::new(move || pure::<_, String, ()>(size), |_| async { Ok(()) })
    /// };
    ///
    /// let capacity = Managed::fold(vec![2, 3, 5], pool, 0_usize, |total, size| total + size);
    /// assert_eq!(capacity.with(|n| pure(*n)).run_blocking(&()), Ok(10));
    ///
    /// let none = Managed::fold(Vec::<usize>::new(), pool, 0_usize, |total, size| total + size);
    /// assert_eq!(none.with(|n| pure(*n)).run_blocking(&()), Ok(0));
    /// ```
    pub fn fold<T, I, F, C, G>(items: I, to_handle: F, identity: C, combine: G) -> Managed<C, E, Env>
    where
        I: IntoIterator<Item = T>,
        F: FnMut(T) -> Managed<R, E, Env>,
        C: Clone + Send + Sync + 'static,
        G: Fn(C, &R) -> C + Send + Sync + 'static,
    {
        Managed::traverse(items, to_handle).map(move |resources| {
            resources
                .iter()
                .fold(identity.clone(), |acc, resource| combine(acc, resource))
        })
    }

    /// Acquire the handle if there is one.
    pub fn optional(handle: Option<Managed<R, E, Env>>) -> Managed<Option<R>, E, Env> {
        Managed::sequence(handle).reshape(
            |resources| resources.into_iter().next(),
            |resource| resource.into_iter().collect(),
        )
    }

    /// Acquire whichever branch is present.
    pub fn either<L>(handle: Either<Managed<L, E, Env>, Managed<R, E, Env>>) -> Managed<Either<L, R>, E, Env>
    where
        L: Send + 'static,
    {
        Managed::from_allocate(move |env: Env, observer: SharedObserver<E>| {
            let allocation = handle
                .as_ref()
                .map_left(|left| left.allocate(env.clone(), observer.clone()))
                .map(|right| right.allocate(env, observer));
            async move {
                let allocated = match allocation {
                    Either::Left(left) => {
                        let (resource, release) = left.await?.into_parts();
                        Allocated::from_parts(
                            Either::Left(resource),
                            Box::new(move |either: Either<L, R>| match either {
                                Either::Left(resource) => release(resource),
                                Either::Right(_) => future::ready(Vec::new()).boxed(),
                            }),
                        )
                    }
                    Either::Right(right) => {
                        let (resource, release) = right.await?.into_parts();
                        Allocated::from_parts(
                            Either::Right(resource),
                            Box::new(move |either: Either<L, R>| match either {
                                Either::Right(resource) => release(resource),
                                Either::Left(_) => future::ready(Vec::new()).boxed(),
                            }),
                        )
                    }
                };
                Ok(allocated)
            }
        })
    }
}

impl<R, E, Env> Managed<R, E, Env>
where
    R: Monoid + Clone + Send + Sync + 'static,
    E: Send + 'static,
    Env: Clone + Send + Sync + 'static,
{
    /// Acquire every handle and combine their resources with the monoid.
    ///
    /// An empty collection yields `R::empty()`.
    pub fn concat_all<I>(handles: I) -> Managed<R, E, Env>
    where
        I: IntoIterator<Item = Managed<R, E, Env>>,
    {
        Managed::sequence(handles).map(|resources| fold_all(resources.iter().cloned()))
    }
}

/// Pairs two handles and combines their resources.
///
/// Acquisition and release follow [`Managed::zip`].
impl<R, E, Env> Semigroup for Managed<R, E, Env>
where
    R: Semigroup + Clone + Send + 'static,
    E: Send + 'static,
    Env: Clone + Send + Sync + 'static,
{
    fn combine(self, other: Self) -> Self {
        self.zip(&other)
            .map(|(left, right)| left.clone().combine(right.clone()))
    }
}

/// The identity is a handle over `R::empty()` with nothing to release.
impl<R, E, Env> Monoid for Managed<R, E, Env>
where
    R: Monoid + Clone + Send + Sync + 'static,
    E: Send + 'static,
    Env: Clone + Send + Sync + 'static,
{
    fn empty() -> Self {
        Managed::pure(R::empty())
    }
}
