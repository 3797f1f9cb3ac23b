//! A right-biased sum type for conditional resources.
//!
//! `Either<L, R>` holds one of two values with no success/failure meaning.
//! It is right-biased: [`map`](Either::map) and iteration see only the
//! `Right` value. That makes it a collection of zero or one element, so a
//! resource fold over an `Either` acquires the `Right` branch and skips the
//! `Left` one.
//!
//! # Examples
//!
//! ```rust
//! use managed_effect::Either;
//!
//! fn source(from_cache: bool) -> Either<&'static str, u16> {
//!     if from_cache {
//!         Either::left("cache")
//!     } else {
//!         Either::right(5432)
//!     }
//! }
//!
//! let ports: Vec<u16> = source(false).into_iter().collect();
//! assert_eq!(ports, vec![5432]);
//! assert_eq!(source(true).into_iter().count(), 0);
//! ```

/// A value that is either `Left(L)` or `Right(R)`.
///
/// By convention `Right` is the value that flows through `map` and
/// iteration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Either<L, R> {
    /// The left variant
    Left(L),
    /// The right variant
    Right(R),
}

impl<L, R> Either<L, R> {
    /// Create a Left value.
    #[inline]
    pub fn left(value: L) -> Self {
        Either::Left(value)
    }

    /// Create a Right value.
    #[inline]
    pub fn right(value: R) -> Self {
        Either::Right(value)
    }

    /// Returns `true` if this is a `Left` value.
    #[inline]
    pub fn is_left(&self) -> bool {
        matches!(self, Either::Left(_))
    }

    /// Returns `true` if this is a `Right` value.
    #[inline]
    pub fn is_right(&self) -> bool {
        matches!(self, Either::Right(_))
    }

    /// Convert into `Option<L>`, discarding a `Right`.
    pub fn into_left(self) -> Option<L> {
        match self {
            Either::Left(l) => Some(l),
            Either::Right(_) => None,
        }
    }

    /// Convert into `Option<R>`, discarding a `Left`.
    pub fn into_right(self) -> Option<R> {
        match self {
            Either::Left(_) => None,
            Either::Right(r) => Some(r),
        }
    }

    /// Borrow both sides.
    pub fn as_ref(&self) -> Either<&L, &R> {
        match self {
            Either::Left(l) => Either::Left(l),
            Either::Right(r) => Either::Right(r),
        }
    }

    /// Transform the `Left` value.
    pub fn map_left<L2, F>(self, f: F) -> Either<L2, R>
    where
        F: FnOnce(L) -> L2,
    {
        match self {
            Either::Left(l) => Either::Left(f(l)),
            Either::Right(r) => Either::Right(r),
        }
    }

    /// Transform the `Right` value.
    ///
    /// # Example
    ///
    /// ```rust
    /// use managed_effect::Either;
    ///
    /// let e: Either<&str, i32> = Either::right(21);
    /// assert_eq!(e.map(|n| n * 2), Either::right(42));
    /// ```
    pub fn map<R2, F>(self, f: F) -> Either<L, R2>
    where
        F: FnOnce(R) -> R2,
    {
        match self {
            Either::Left(l) => Either::Left(l),
            Either::Right(r) => Either::Right(f(r)),
        }
    }

    /// Collapse both branches into one value.
    pub fn fold<T, F, G>(self, left_fn: F, right_fn: G) -> T
    where
        F: FnOnce(L) -> T,
        G: FnOnce(R) -> T,
    {
        match self {
            Either::Left(l) => left_fn(l),
            Either::Right(r) => right_fn(r),
        }
    }
}

impl<L, R> From<Result<R, L>> for Either<L, R> {
    fn from(result: Result<R, L>) -> Self {
        match result {
            Ok(r) => Either::Right(r),
            Err(l) => Either::Left(l),
        }
    }
}

impl<L, R> IntoIterator for Either<L, R> {
    type Item = R;
    type IntoIter = std::option::IntoIter<R>;

    fn into_iter(self) -> Self::IntoIter {
        self.into_right().into_iter()
    }
}

impl<'a, L, R> IntoIterator for &'a Either<L, R> {
    type Item = &'a R;
    type IntoIter = std::option::IntoIter<&'a R>;

    fn into_iter(self) -> Self::IntoIter {
        self.as_ref().into_right().into_iter()
    }
}
