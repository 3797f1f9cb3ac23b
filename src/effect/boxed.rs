//! BoxedEffect - type-erased effect for opt-in boxing.
//!
//! Boxing clones the environment to achieve a `'static` future. Resource
//! handles rely on the same trick to stay reusable across runs.

use std::future::Future;
use std::marker::PhantomData;
use std::pin::Pin;

use crate::effect::trait_def::Effect;

/// A boxed future that is Send + 'a.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A type-erased effect.
///
/// Use `BoxedEffect` to return different effect types from match arms or
/// to store effects in a collection.
///
/// # Example
///
/// ```rust
/// use managed_effect::effect::prelude::*;
///
/// fn open(cached: bool) -> BoxedEffect<&'static str, String, ()> {
///     if cached {
///         pure("cached").boxed()
///     } else {
///         pure("fresh").map(|s| s).boxed()
///     }
/// }
///
/// # tokio_test::block_on(async {
/// assert_eq!(open(true).run(&()).await, Ok("cached"));
/// # });
/// ```
pub struct BoxedEffect<T, E, Env> {
    run_fn: Box<dyn FnOnce(Env) -> BoxFuture<'static, Result<T, E>> + Send>,
    _phantom: PhantomData<Env>,
}

impl<T, E, Env> std::fmt::Debug for BoxedEffect<T, E, Env> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoxedEffect")
            .field("run_fn", &"<function>")
            .finish()
    }
}

impl<T, E, Env> BoxedEffect<T, E, Env>
where
    T: Send + 'static,
    E: Send + 'static,
    Env: Clone + Send + Sync + 'static,
{
    /// Create a boxed effect from any effect.
    ///
    /// The environment is cloned when the effect is run.
    pub fn new<Eff>(effect: Eff) -> Self
    where
        Eff: Effect<Output = T, Error = E, Env = Env> + 'static,
    {
        BoxedEffect {
            run_fn: Box::new(move |env: Env| Box::pin(async move { effect.run(&env).await })),
            _phantom: PhantomData,
        }
    }
}

impl<T, E, Env> Effect for BoxedEffect<T, E, Env>
where
    T: Send,
    E: Send,
    Env: Clone + Send + Sync,
{
    type Output = T;
    type Error = E;
    type Env = Env;

    fn run(self, env: &Env) -> impl Future<Output = Result<T, E>> + Send {
        (self.run_fn)(env.clone())
    }
}
