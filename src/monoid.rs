//! Monoid trait for types with identity elements
//!
//! A `Monoid` extends `Semigroup` with an identity element, so a collection of
//! any length (including zero) can be folded. A resource fold over nothing
//! exposes the identity.
//!
//! # Mathematical Properties
//!
//! 1. **Associativity** (from Semigroup)
//! 2. **Identity**:
//!    ```text
//!    a.combine(M::empty()) == a == M::empty().combine(a)
//!    ```
//!
//! # Numeric Monoids
//!
//! Numbers combine in more than one lawful way, so addition is opted into
//! through the [`Sum`] wrapper:
//!
//! ```
//! use managed_effect::monoid::{Sum, fold_all};
//!
//! let open_handles = vec![Sum(2), Sum(3), Sum(1)];
//! assert_eq!(fold_all(open_handles), Sum(6));
//! ```

use crate::Semigroup;
use std::ops::Add;

/// A `Monoid` is a `Semigroup` with an identity element.
///
/// # Example
///
/// ```rust
/// use managed_effect::{Monoid, Semigroup};
///
/// let v1 = vec![1, 2, 3];
/// let empty: Vec<i32> = Monoid::empty();
///
/// assert_eq!(v1.clone().combine(empty.clone()), v1);
/// assert_eq!(empty.combine(v1.clone()), v1);
/// ```
pub trait Monoid: Semigroup {
    /// The identity element for this monoid.
    fn empty() -> Self;
}

impl<T> Monoid for Vec<T> {
    fn empty() -> Self {
        Vec::new()
    }
}

impl Monoid for String {
    fn empty() -> Self {
        String::new()
    }
}

impl<T: Semigroup> Monoid for Option<T> {
    fn empty() -> Self {
        None
    }
}

macro_rules! impl_monoid_tuple {
    ($($idx:tt $T:ident),+) => {
        impl<$($T: Monoid),+> Monoid for ($($T,)+) {
            fn empty() -> Self {
                ($($T::empty(),)+)
            }
        }
    };
}

impl_monoid_tuple!(0 T1, 1 T2);
impl_monoid_tuple!(0 T1, 1 T2, 2 T3);
impl_monoid_tuple!(0 T1, 1 T2, 2 T3, 3 T4);

/// Monoid for numeric types under addition.
///
/// Identity: `T::default()` (zero for the numeric primitives).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Sum<T>(pub T);

impl<T: Add<Output = T>> Semigroup for Sum<T> {
    fn combine(self, other: Self) -> Self {
        Sum(self.0 + other.0)
    }
}

impl<T: Add<Output = T> + Default> Monoid for Sum<T> {
    fn empty() -> Self {
        Sum(T::default())
    }
}

/// Fold an iterator into a single value, starting from the identity.
///
/// ```
/// use managed_effect::monoid::fold_all;
///
/// let parts = vec!["db".to_string(), "/".to_string(), "main".to_string()];
/// assert_eq!(fold_all::<String, _>(parts), "db/main");
/// ```
pub fn fold_all<M, I>(iter: I) -> M
where
    M: Monoid,
    I: IntoIterator<Item = M>,
{
    iter.into_iter().fold(M::empty(), |acc, x| acc.combine(x))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn fold_all_of_nothing_is_empty() {
        assert_eq!(fold_all::<Vec<i32>, _>(Vec::new()), Vec::<i32>::new());
        assert_eq!(fold_all::<Sum<u32>, _>(Vec::new()), Sum(0));
    }

    #[test]
    fn tuple_identity() {
        let value = (vec![1], "a".to_string());
        let empty: (Vec<i32>, String) = Monoid::empty();

        assert_eq!(value.clone().combine(empty), value);
    }

    proptest! {
        #[test]
        fn sum_identity(n in any::<i32>()) {
            prop_assert_eq!(Sum(n).combine(Sum::empty()), Sum(n));
            prop_assert_eq!(Sum::empty().combine(Sum(n)), Sum(n));
        }

        #[test]
        fn vec_fold_matches_concat(parts in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..4), 0..6)) {
            let expected: Vec<u8> = parts.concat();
            prop_assert_eq!(fold_all(parts), expected);
        }
    }
}
