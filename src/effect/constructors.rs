//! Constructor functions for creating effects.
//!
//! These functions provide ergonomic ways to create effects without
//! directly constructing the combinator types.

use std::future::Future;

use crate::effect::combinators::{Fail, FromAsync, FromFn, FromResult, Pure};

/// Create a pure effect that succeeds with the given value.
///
/// # Example
///
/// ```rust
/// use managed_effect::effect::prelude::*;
///
/// # tokio_test::block_on(async {
/// let effect = pure::<_, String, ()>(42);
/// assert_eq!(effect.run(&()).await, Ok(42));
/// # });
/// ```
pub fn pure<T, E, Env>(value: T) -> Pure<T, E, Env>
where
    T: Send,
    E: Send,
    Env: Clone + Send + Sync,
{
    Pure::new(value)
}

/// Create an effect that fails with the given error.
///
/// This is the `raise` capability of the effect context.
///
/// # Example
///
/// ```rust
/// use managed_effect::effect::prelude::*;
///
/// # tokio_test::block_on(async {
/// let effect = fail::<i32, _, ()>("error".to_string());
/// assert_eq!(effect.run(&()).await, Err("error".to_string()));
/// # });
/// ```
pub fn fail<T, E, Env>(error: E) -> Fail<T, E, Env>
where
    T: Send,
    E: Send,
    Env: Clone + Send + Sync,
{
    Fail::new(error)
}

/// Create an effect from a synchronous function.
///
/// The function receives a reference to the environment and returns a `Result`.
///
/// # Example
///
/// ```rust
/// use managed_effect::effect::prelude::*;
///
/// #[derive(Clone)]
/// struct Env { value: i32 }
///
/// # tokio_test::block_on(async {
/// let effect = from_fn(|env: &Env| Ok::<_, String>(env.value * 2));
/// assert_eq!(effect.run(&Env { value: 21 }).await, Ok(42));
/// # });
/// ```
pub fn from_fn<T, E, Env, F>(f: F) -> FromFn<F, Env>
where
    F: FnOnce(&Env) -> Result<T, E> + Send,
    T: Send,
    E: Send,
    Env: Clone + Send + Sync,
{
    FromFn::new(f)
}

/// Create an effect from an async function.
///
/// # Example
///
/// ```rust
/// use managed_effect::effect::prelude::*;
///
/// # tokio_test::block_on(async {
/// let effect = from_async(|_: &()| async { Ok::<_, String>(42) });
/// assert_eq!(effect.run(&()).await, Ok(42));
/// # });
/// ```
pub fn from_async<T, E, Env, F, Fut>(f: F) -> FromAsync<F, Env>
where
    F: FnOnce(&Env) -> Fut + Send,
    Fut: Future<Output = Result<T, E>> + Send,
    T: Send,
    E: Send,
    Env: Clone + Send + Sync,
{
    FromAsync::new(f)
}

/// Create an effect from a `Result`.
///
/// # Example
///
/// ```rust
/// use managed_effect::effect::prelude::*;
///
/// # tokio_test::block_on(async {
/// let effect = from_result::<i32, _, ()>(Err("error".to_string()));
/// assert_eq!(effect.run(&()).await, Err("error".to_string()));
/// # });
/// ```
pub fn from_result<T, E, Env>(result: Result<T, E>) -> FromResult<T, E, Env>
where
    T: Send,
    E: Send,
    Env: Clone + Send + Sync,
{
    FromResult::new(result)
}
