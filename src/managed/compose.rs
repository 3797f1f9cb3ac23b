//! Sequential and independent composition of handles.

use std::sync::Arc;

use super::{Allocated, Managed};
use crate::effect::BoxFuture;
use crate::observer::SharedObserver;

/// Await `next` with `first` already held.
///
/// If `next` fails, `first` is released before the error is returned.
async fn acquire_next<R, R2, E>(
    first: Allocated<R, E>,
    next: BoxFuture<'static, Result<Allocated<R2, E>, E>>,
    observer: &SharedObserver<E>,
) -> Result<(Allocated<R, E>, Allocated<R2, E>), E>
where
    R: Send + 'static,
    E: Send + 'static,
{
    match next.await {
        Ok(second) => Ok((first, second)),
        Err(error) => {
            tracing::debug!("acquisition failed; releasing resources acquired so far");
            first.settle(Err(error), observer).await
        }
    }
}

impl<R, E, Env> Managed<R, E, Env>
where
    R: Send + 'static,
    E: Send + 'static,
    Env: Clone + Send + Sync + 'static,
{
    /// Acquire a second resource that depends on this one.
    ///
    /// Running the result acquires this resource, builds the next handle
    /// from it, acquires that, and after use releases them in reverse. The
    /// first resource stays alive until the second one is released.
    ///
    /// # Example
    ///
    /// ```rust
    /// use managed_effect::effect::prelude::*;
    /// use managed_effect::managed::Managed;
    ///
    /// let session = Managed::new(
    ///     || pure::<_, String, ()>(7_u32),
    ///     |_id| async { Ok(()) },
    /// );
    /// let connection = session.and_then(|id| {
    ///     let id = *id;
    ///     Managed::new(move || pure(format!("conn-{}", id)), |_conn| async { Ok(()) })
    /// });
    ///
    /// let name = connection.with(|conn| pure(conn.clone())).run_blocking(&());
    /// assert_eq!(name, Ok("conn-7".to_string()));
    /// ```
    pub fn and_then<R2, F>(&self, f: F) -> Managed<R2, E, Env>
    where
        R2: Send + 'static,
        F: Fn(&R) -> Managed<R2, E, Env> + Send + Sync + 'static,
    {
        let outer = self.clone();
        let f = Arc::new(f);
        Managed::from_allocate(move |env: Env, observer: SharedObserver<E>| {
            let first = outer.allocate(env.clone(), observer.clone());
            let f = Arc::clone(&f);
            async move {
                let first = first.await?;
                let next = (*f)(first.resource()).allocate(env, observer.clone());
                let (first, second) = acquire_next(first, next, &observer).await?;
                Ok(second.within(first))
            }
        })
    }

    /// Pair with an independent handle.
    ///
    /// This resource is acquired first and released last.
    ///
    /// # Example
    ///
    /// ```rust
    /// use managed_effect::effect::prelude::*;
    /// use managed_effect::managed::Managed;
    ///
    /// let reader = Managed::new(|| pure::<_, String, ()>("in"), |_| async { Ok(()) });
    /// let writer = Managed::new(|| pure::<_, String, ()>("out"), |_| async { Ok(()) });
    ///
    /// let pair = reader.zip(&writer).with(|pair| pure(*pair)).run_blocking(&());
    /// assert_eq!(pair, Ok(("in", "out")));
    /// ```
    pub fn zip<R2>(&self, other: &Managed<R2, E, Env>) -> Managed<(R, R2), E, Env>
    where
        R2: Send + 'static,
    {
        let left = self.clone();
        let right = other.clone();
        Managed::from_allocate(move |env: Env, observer: SharedObserver<E>| {
            let first = left.allocate(env.clone(), observer.clone());
            let right = right.clone();
            async move {
                let first = first.await?;
                let next = right.allocate(env, observer.clone());
                let (first, second) = acquire_next(first, next, &observer).await?;
                Ok(first.alongside(second))
            }
        })
    }

    /// Combine three independent handles.
    pub fn zip3<R2, R3>(
        &self,
        second: &Managed<R2, E, Env>,
        third: &Managed<R3, E, Env>,
    ) -> Managed<(R, R2, R3), E, Env>
    where
        R2: Send + 'static,
        R3: Send + 'static,
    {
        self.zip(second)
            .zip(third)
            .reshape(|((a, b), c)| (a, b, c), |(a, b, c)| ((a, b), c))
    }

    /// Combine four independent handles.
    pub fn zip4<R2, R3, R4>(
        &self,
        second: &Managed<R2, E, Env>,
        third: &Managed<R3, E, Env>,
        fourth: &Managed<R4, E, Env>,
    ) -> Managed<(R, R2, R3, R4), E, Env>
    where
        R2: Send + 'static,
        R3: Send + 'static,
        R4: Send + 'static,
    {
        self.zip3(second, third)
            .zip(fourth)
            .reshape(|((a, b, c), d)| (a, b, c, d), |(a, b, c, d)| ((a, b, c), d))
    }

    pub(crate) fn reshape<S>(&self, to: fn(R) -> S, from: fn(S) -> R) -> Managed<S, E, Env>
    where
        S: Send + 'static,
    {
        let inner = self.clone();
        Managed::from_allocate(move |env: Env, observer: SharedObserver<E>| {
            let allocation = inner.allocate(env, observer);
            async move { Ok(allocation.await?.reshape(to, from)) }
        })
    }
}
