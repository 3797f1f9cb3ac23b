//! Tracing support for effects.
//!
//! Provides the `Instrument` combinator and the `instrument` method for
//! wrapping an effect, including a whole managed run, in a tracing span.

use crate::effect::trait_def::Effect;

/// An effect wrapped in a tracing span.
///
/// Created by [`EffectTracingExt::instrument`].
#[derive(Debug)]
pub struct Instrument<E> {
    pub(crate) inner: E,
    pub(crate) span: tracing::Span,
}

impl<E> Effect for Instrument<E>
where
    E: Effect,
{
    type Output = E::Output;
    type Error = E::Error;
    type Env = E::Env;

    async fn run(self, env: &Self::Env) -> Result<Self::Output, Self::Error> {
        use tracing::Instrument as _;
        self.inner.run(env).instrument(self.span).await
    }
}

/// Extension trait for adding tracing instrumentation to effects.
pub trait EffectTracingExt: Effect {
    /// Wrap this effect in a tracing span.
    ///
    /// The span is entered each time the effect is polled. Every acquire,
    /// use and release action of a managed run happens inside it.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// use managed_effect::prelude::*;
    /// use tracing::info_span;
    ///
    /// let effect = database()
    ///     .with(|conn| query(conn))
    ///     .instrument(info_span!("report", tenant = %tenant_id));
    /// ```
    fn instrument(self, span: tracing::Span) -> Instrument<Self> {
        Instrument { inner: self, span }
    }
}

impl<E: Effect> EffectTracingExt for E {}
