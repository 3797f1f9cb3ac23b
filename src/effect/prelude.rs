//! Prelude module for convenient imports.
//!
//! ```rust
//! use managed_effect::effect::prelude::*;
//!
//! # tokio_test::block_on(async {
//! let effect = pure::<_, String, ()>(42)
//!     .map(|x| x * 2)
//!     .and_then(|x| pure(x + 1));
//!
//! assert_eq!(effect.execute(&()).await, Ok(85));
//! # });
//! ```

// Traits
pub use crate::effect::ext::EffectExt;
pub use crate::effect::tracing::EffectTracingExt;
pub use crate::effect::trait_def::Effect;

// Boxed Effect
pub use crate::effect::boxed::{BoxFuture, BoxedEffect};

// Combinator Types
pub use crate::effect::combinators::{
    AndThen, Attempt, Fail, FromAsync, FromFn, FromResult, Map, MapErr, OrElse, Pure,
};

// Constructors
pub use crate::effect::constructors::{fail, from_async, from_fn, from_result, pure};
