//! Combinator types for effect composition.
//!
//! These are the concrete types returned by the constructors in
//! [`constructors`](crate::effect::constructors) and the methods on
//! [`EffectExt`](crate::effect::EffectExt). None of them allocate.
//!
//! The five capabilities resource handles depend on map onto:
//!
//! | Capability | Type |
//! |------------|------|
//! | pure | [`Pure`] |
//! | sequencing | [`AndThen`] |
//! | mapping | [`Map`] |
//! | attempt | [`Attempt`] |
//! | raise | [`Fail`] |

mod and_then;
mod attempt;
mod fail;
mod from_async;
mod from_fn;
mod from_result;
mod map;
mod map_err;
mod or_else;
mod pure;

pub use and_then::AndThen;
pub use attempt::Attempt;
pub use fail::Fail;
pub use from_async::FromAsync;
pub use from_fn::FromFn;
pub use from_result::FromResult;
pub use map::Map;
pub use map_err::MapErr;
pub use or_else::OrElse;
pub use pure::Pure;
