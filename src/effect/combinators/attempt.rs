//! Attempt combinator - reifies failure as a value.

use crate::effect::trait_def::Effect;

/// Attempt combinator - turns `Effect<Output = T>` into
/// `Effect<Output = Result<T, E>>`.
///
/// The attempted effect never fails: both outcomes of the inner effect
/// arrive as `Ok(outcome)`. The error type is kept so the attempted effect
/// still chains with `and_then` and `fail` in the same context.
///
/// # Example
///
/// ```rust
/// use managed_effect::effect::prelude::*;
///
/// # tokio_test::block_on(async {
/// let effect = fail::<i32, _, ()>("boom").attempt();
/// assert_eq!(effect.run(&()).await, Ok(Err("boom")));
/// # });
/// ```
pub struct Attempt<Inner> {
    pub(crate) inner: Inner,
}

impl<Inner> std::fmt::Debug for Attempt<Inner> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Attempt")
            .field("inner", &"<effect>")
            .finish()
    }
}

impl<Inner> Effect for Attempt<Inner>
where
    Inner: Effect,
{
    type Output = Result<Inner::Output, Inner::Error>;
    type Error = Inner::Error;
    type Env = Inner::Env;

    async fn run(self, env: &Self::Env) -> Result<Self::Output, Self::Error> {
        Ok(self.inner.run(env).await)
    }
}
