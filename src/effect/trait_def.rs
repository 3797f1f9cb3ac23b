//! Effect trait definition - the effect context every resource action runs in.
//!
//! An `Effect` is a deferred computation that:
//! - Produces a value of type `Output` on success
//! - May fail with an error of type `Error`
//! - Depends on an environment of type `Env`
//!
//! Nothing happens until [`Effect::run`] is called and the returned future is
//! awaited. Resource handles never inspect the concrete effect type; they only
//! sequence effects, map over them, reify their failures with `attempt`, and
//! raise errors with `fail`.
//!
//! # Environment Cloning
//!
//! The `Env` type requires `Clone` so that boxed effects and resource handles
//! can own their environment for a `'static` future. Keep environments cheap
//! to clone by wrapping shared state in `Arc`:
//!
//! ```rust,ignore
//! #[derive(Clone)]
//! struct AppEnv {
//!     pool: Arc<ConnectionPool>,
//!     config: Arc<Config>,
//! }
//! ```

use std::future::Future;

/// The core Effect trait - a computation that may perform effects.
///
/// Combinators return concrete types, the same way `Future` and `Iterator`
/// adapters do. Use [`boxed`](crate::effect::EffectExt::boxed) when type
/// erasure is needed.
///
/// # Type Parameters
///
/// * `Output` - The success type produced by this effect
/// * `Error` - The error type that may be produced
/// * `Env` - The environment type required to run this effect
///
/// # Example
///
/// ```rust
/// use managed_effect::effect::prelude::*;
///
/// fn load_port() -> impl Effect<Output = u16, Error = String, Env = ()> {
///     from_fn(|_: &()| "8080".parse::<u16>().map_err(|e| e.to_string()))
/// }
///
/// # tokio_test::block_on(async {
/// assert_eq!(load_port().run(&()).await, Ok(8080));
/// # });
/// ```
pub trait Effect: Sized + Send {
    /// The success type produced by this effect.
    type Output: Send;

    /// The error type that may be produced.
    type Error: Send;

    /// The environment type required to run this effect.
    type Env: Clone + Send + Sync;

    /// Execute this effect with the given environment.
    ///
    /// The returned future resolves to `Ok(output)` on success or
    /// `Err(error)` on failure.
    fn run(self, env: &Self::Env)
        -> impl Future<Output = Result<Self::Output, Self::Error>> + Send;
}
