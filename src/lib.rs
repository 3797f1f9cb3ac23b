//! # managed-effect
//!
//! Composable, reusable resource handles with guaranteed release.
//!
//! A [`Managed`] describes how to acquire a resource and how to release it,
//! without doing either. Handles compose: sequentially when one resource is
//! built from another, independently when they are unrelated, and over whole
//! collections. Running a composed handle acquires everything in order, hands
//! the result to a single use function, and releases everything in reverse
//! order, whatever happened along the way.
//!
//! ## Quick Example
//!
//! ```rust
//! use managed_effect::prelude::*;
//!
//! # tokio_test::block_on(async {
//! let config = Managed::new(
//!     || pure::<_, String, ()>("postgres://db".to_string()),
//!     |_cfg| async { Ok(()) },
//! );
//! let pool = config.and_then(|url| {
//!     let url = url.clone();
//!     Managed::new(move || pure(format!("pool({})", url)), |_pool| async { Ok(()) })
//! });
//! let cache = Managed::new(|| pure("cache".to_string()), |_cache| async { Ok(()) });
//!
//! let app = pool.zip(&cache);
//! let summary = app
//!     .with(|(pool, cache)| pure(format!("{} + {}", pool, cache)))
//!     .run(&())
//!     .await;
//!
//! assert_eq!(summary, Ok("pool(postgres://db) + cache".to_string()));
//! # });
//! ```
//!
//! ## Modules
//!
//! - [`effect`]: the effect type every acquire, use and release runs in
//! - [`bracket`]: the acquire/use/release primitive
//! - [`managed`]: reusable handles and their composition
//! - [`observer`]: visibility into outcomes discarded by release failures
//! - [`testing`]: event logs and tracked handles for tests

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

pub mod bracket;
pub mod effect;
pub mod either;
pub mod managed;
pub mod monoid;
pub mod observer;
pub mod semigroup;
pub mod testing;

// Re-exports
pub use bracket::{bracket, bracket_full, BracketError};
pub use effect::{Effect, EffectExt};
pub use either::Either;
pub use managed::{managed, Managed, ManagedWith};
pub use monoid::Monoid;
pub use observer::{ShadowObserver, Shadowed, TracingObserver};
pub use semigroup::Semigroup;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::bracket::{bracket, bracket_full, BracketError};
    pub use crate::effect::prelude::*;
    pub use crate::either::Either;
    pub use crate::managed::{managed, Managed, ManagedWith};
    pub use crate::monoid::Monoid;
    pub use crate::observer::{ShadowObserver, Shadowed, TracingObserver};
    pub use crate::semigroup::Semigroup;
}
