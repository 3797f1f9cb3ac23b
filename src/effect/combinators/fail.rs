//! Fail effect - raises an error into the effect context.

use std::marker::PhantomData;

use crate::effect::trait_def::Effect;

/// A failure value wrapped as an Effect.
///
/// # Example
///
/// ```rust
/// use managed_effect::effect::prelude::*;
///
/// # tokio_test::block_on(async {
/// let effect = fail::<i32, _, ()>("connection refused".to_string());
/// assert_eq!(effect.run(&()).await, Err("connection refused".to_string()));
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct Fail<T, E, Env> {
    error: E,
    _phantom: PhantomData<(T, Env)>,
}

impl<T, E, Env> Fail<T, E, Env> {
    /// Create a new Fail effect from an error.
    pub fn new(error: E) -> Self {
        Fail {
            error,
            _phantom: PhantomData,
        }
    }
}

impl<T, E, Env> Effect for Fail<T, E, Env>
where
    T: Send,
    E: Send,
    Env: Clone + Send + Sync,
{
    type Output = T;
    type Error = E;
    type Env = Env;

    async fn run(self, _env: &Self::Env) -> Result<T, E> {
        Err(self.error)
    }
}
