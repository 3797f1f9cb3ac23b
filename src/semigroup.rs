//! Semigroup trait for associative operations
//!
//! A Semigroup is a type with an associative binary operation. Resource folds
//! use it to combine the values exposed by several handles into one.
//!
//! # Mathematical Properties
//!
//! For a type to be a valid Semigroup, the `combine` operation must be associative:
//! ```text
//! a.combine(b).combine(c) == a.combine(b.combine(c))
//! ```
//!
//! # Examples
//!
//! ```
//! use managed_effect::Semigroup;
//!
//! assert_eq!(vec![1, 2].combine(vec![3]), vec![1, 2, 3]);
//! assert_eq!("conn-".to_string().combine("a".to_string()), "conn-a");
//! assert_eq!(
//!     (vec![1], "a".to_string()).combine((vec![2], "b".to_string())),
//!     (vec![1, 2], "ab".to_string())
//! );
//! ```

/// A type that supports an associative binary operation
///
/// # Laws
///
/// ```text
/// a.combine(b).combine(c) == a.combine(b.combine(c))
/// ```
///
/// `combine` takes `self` by value; clone first to keep the originals.
pub trait Semigroup: Sized {
    /// Combine this value with another value associatively
    fn combine(self, other: Self) -> Self;
}

impl<T> Semigroup for Vec<T> {
    #[inline]
    fn combine(mut self, other: Self) -> Self {
        self.extend(other);
        self
    }
}

impl Semigroup for String {
    #[inline]
    fn combine(mut self, other: Self) -> Self {
        self.push_str(&other);
        self
    }
}

// Some(a) + Some(b) combines the inner values; None is skipped
impl<T: Semigroup> Semigroup for Option<T> {
    fn combine(self, other: Self) -> Self {
        match (self, other) {
            (Some(a), Some(b)) => Some(a.combine(b)),
            (a, None) => a,
            (None, b) => b,
        }
    }
}

macro_rules! impl_semigroup_tuple {
    ($($idx:tt $T:ident),+) => {
        impl<$($T: Semigroup),+> Semigroup for ($($T,)+) {
            #[inline]
            fn combine(self, other: Self) -> Self {
                (
                    $(self.$idx.combine(other.$idx)),+
                )
            }
        }
    };
}

impl_semigroup_tuple!(0 T1, 1 T2);
impl_semigroup_tuple!(0 T1, 1 T2, 2 T3);
impl_semigroup_tuple!(0 T1, 1 T2, 2 T3, 3 T4);

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn option_skips_none() {
        assert_eq!(Some(vec![1]).combine(None), Some(vec![1]));
        assert_eq!(None.combine(Some(vec![2])), Some(vec![2]));
        assert_eq!(Some(vec![1]).combine(Some(vec![2])), Some(vec![1, 2]));
        assert_eq!(None::<Vec<i32>>.combine(None), None);
    }

    #[test]
    fn triple_combines_component_wise() {
        let a = (vec![1], "x".to_string(), Some("p".to_string()));
        let b = (vec![2], "y".to_string(), None);

        assert_eq!(
            a.combine(b),
            (vec![1, 2], "xy".to_string(), Some("p".to_string()))
        );
    }

    proptest! {
        #[test]
        fn string_combine_is_associative(a in ".*", b in ".*", c in ".*") {
            let left = a.clone().combine(b.clone()).combine(c.clone());
            let right = a.combine(b.combine(c));
            prop_assert_eq!(left, right);
        }
    }
}
