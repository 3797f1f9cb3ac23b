//! Extension trait providing combinator methods for all Effects.
//!
//! The `EffectExt` trait is automatically implemented for all types
//! that implement `Effect`.

use crate::effect::boxed::BoxedEffect;
use crate::effect::combinators::{AndThen, Attempt, Map, MapErr, OrElse};
use crate::effect::trait_def::Effect;

/// Extension trait providing combinator methods for all Effects.
///
/// You don't need to implement this trait yourself.
///
/// # Example
///
/// ```rust
/// use managed_effect::effect::prelude::*;
///
/// # tokio_test::block_on(async {
/// let effect = pure::<_, String, ()>(21)
///     .map(|x| x * 2)
///     .and_then(|x| pure(x + 1))
///     .map_err(|e| format!("Error: {}", e));
///
/// assert_eq!(effect.execute(&()).await, Ok(43));
/// # });
/// ```
pub trait EffectExt: Effect {
    /// Transform the success value.
    fn map<U, F>(self, f: F) -> Map<Self, F>
    where
        F: FnOnce(Self::Output) -> U + Send,
        U: Send,
    {
        Map { inner: self, f }
    }

    /// Transform the error value.
    fn map_err<E2, F>(self, f: F) -> MapErr<Self, F>
    where
        F: FnOnce(Self::Error) -> E2 + Send,
        E2: Send,
    {
        MapErr { inner: self, f }
    }

    /// Chain a dependent effect.
    ///
    /// If this effect succeeds, apply the function to produce the next effect.
    /// If this effect fails, propagate the error.
    fn and_then<E2, F>(self, f: F) -> AndThen<Self, F>
    where
        E2: Effect<Error = Self::Error, Env = Self::Env>,
        F: FnOnce(Self::Output) -> E2 + Send,
    {
        AndThen { inner: self, f }
    }

    /// Recover from an error.
    fn or_else<E2, F>(self, f: F) -> OrElse<Self, F>
    where
        E2: Effect<Output = Self::Output, Env = Self::Env>,
        F: FnOnce(Self::Error) -> E2 + Send,
    {
        OrElse { inner: self, f }
    }

    /// Reify the outcome of this effect as a value.
    ///
    /// The resulting effect always succeeds with `Ok(outcome)`.
    ///
    /// ```rust
    /// use managed_effect::effect::prelude::*;
    ///
    /// # tokio_test::block_on(async {
    /// let outcome = pure::<_, String, ()>(1).attempt().execute(&()).await;
    /// assert_eq!(outcome, Ok(Ok(1)));
    /// # });
    /// ```
    fn attempt(self) -> Attempt<Self> {
        Attempt { inner: self }
    }

    /// Convert to a boxed effect for type erasure.
    fn boxed(self) -> BoxedEffect<Self::Output, Self::Error, Self::Env>
    where
        Self: 'static,
    {
        BoxedEffect::new(self)
    }

    /// Run and await the effect.
    async fn execute(self, env: &Self::Env) -> Result<Self::Output, Self::Error> {
        self.run(env).await
    }

    /// Run the effect to completion on the current thread.
    ///
    /// Drives the effect with `futures::executor::block_on`, so synchronous
    /// callers can use the same effects and resource handles as async ones.
    /// Do not call this from inside an async runtime worker.
    ///
    /// ```rust
    /// use managed_effect::effect::prelude::*;
    ///
    /// let result = from_fn(|_: &()| Ok::<_, String>(7)).run_blocking(&());
    /// assert_eq!(result, Ok(7));
    /// ```
    fn run_blocking(self, env: &Self::Env) -> Result<Self::Output, Self::Error> {
        futures::executor::block_on(self.run(env))
    }
}

impl<E: Effect> EffectExt for E {}
