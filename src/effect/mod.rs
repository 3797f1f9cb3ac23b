//! The effect context that resource actions run in.
//!
//! Resource handles are written against a small capability set rather than
//! a concrete runtime:
//!
//! | Capability | Provided by |
//! |------------|-------------|
//! | lift a value | [`pure`] |
//! | sequence | [`EffectExt::and_then`] |
//! | map | [`EffectExt::map`] |
//! | reify failure | [`EffectExt::attempt`] |
//! | raise | [`fail`] |
//!
//! Any [`Effect`] works: tokio I/O through [`from_async`], blocking code
//! through [`from_fn`], precomputed outcomes through [`from_result`]. An
//! effect can be awaited on any executor or driven synchronously with
//! [`EffectExt::run_blocking`].
//!
//! # Zero-Cost by Default
//!
//! ```rust
//! use managed_effect::effect::prelude::*;
//!
//! # tokio_test::block_on(async {
//! // Type: Map<AndThen<Pure<i32, String, ()>, _>, _>, no heap allocation
//! let effect = pure::<_, String, ()>(42)
//!     .and_then(|x| pure(x * 2))
//!     .map(|x| x.to_string());
//!
//! assert_eq!(effect.run(&()).await, Ok("84".to_string()));
//! # });
//! ```
//!
//! Use `.boxed()` when effects of different types have to share a slot.

pub mod boxed;
pub mod combinators;
pub mod constructors;
pub mod ext;
pub mod prelude;
pub mod tracing;
mod trait_def;

pub use trait_def::Effect;

pub use ext::EffectExt;

pub use boxed::{BoxFuture, BoxedEffect};

pub use combinators::{
    AndThen, Attempt, Fail, FromAsync, FromFn, FromResult, Map, MapErr, OrElse, Pure,
};

pub use constructors::{fail, from_async, from_fn, from_result, pure};

pub use tracing::{EffectTracingExt, Instrument};
