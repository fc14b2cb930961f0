//! Sameness of input values.
//!
//! The memo cache decides between reuse and recomputation by comparing the
//! latest input values against the remembered ones. The default notion is
//! **shallow** equality:
//!
//! - **primitives** (integers, floats, `bool`, `char`, strings, `()`) compare
//!   by value;
//! - **shared pointers** (`Arc`, `Rc`) compare by identity, never by content;
//! - **`Option` and tuples** compare position by position.
//!
//! Owned collections (`Vec`, maps) deliberately have no shallow equality.
//! A derivation that wants its collection to participate in caching hands
//! out the same `Arc` for as long as the collection is logically unchanged.

use std::rc::Rc;
use std::sync::Arc;

/// Identity-or-primitive equality.
///
/// Implementations must never recurse into shared data: two distinct
/// allocations with identical contents are *not* shallowly equal.
pub trait ShallowEq {
    fn shallow_eq(&self, other: &Self) -> bool;
}

macro_rules! shallow_by_value {
    ($($ty:ty),* $(,)?) => {
        $(
            impl ShallowEq for $ty {
                #[inline]
                fn shallow_eq(&self, other: &Self) -> bool {
                    self == other
                }
            }
        )*
    };
}

shallow_by_value!(
    (),
    bool,
    char,
    u8,
    u16,
    u32,
    u64,
    u128,
    usize,
    i8,
    i16,
    i32,
    i64,
    i128,
    isize,
    f32,
    f64,
    String,
    &'static str,
);

impl<T: ?Sized> ShallowEq for Arc<T> {
    #[inline]
    fn shallow_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(self, other)
    }
}

impl<T: ?Sized> ShallowEq for Rc<T> {
    #[inline]
    fn shallow_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(self, other)
    }
}

impl<T: ShallowEq> ShallowEq for Option<T> {
    fn shallow_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Some(a), Some(b)) => a.shallow_eq(b),
            (None, None) => true,
            _ => false,
        }
    }
}

macro_rules! shallow_tuple {
    ($($name:ident : $idx:tt),+) => {
        impl<$($name: ShallowEq),+> ShallowEq for ($($name,)+) {
            #[inline]
            fn shallow_eq(&self, other: &Self) -> bool {
                $(self.$idx.shallow_eq(&other.$idx))&&+
            }
        }
    };
}

shallow_tuple!(A: 0);
shallow_tuple!(A: 0, B: 1);
shallow_tuple!(A: 0, B: 1, C: 2);
shallow_tuple!(A: 0, B: 1, C: 2, D: 3);
shallow_tuple!(A: 0, B: 1, C: 2, D: 3, E: 4);
shallow_tuple!(A: 0, B: 1, C: 2, D: 3, E: 4, F: 5);
shallow_tuple!(A: 0, B: 1, C: 2, D: 3, E: 4, F: 5, G: 6);
shallow_tuple!(A: 0, B: 1, C: 2, D: 3, E: 4, F: 5, G: 6, H: 7);
shallow_tuple!(A: 0, B: 1, C: 2, D: 3, E: 4, F: 5, G: 6, H: 7, I: 8);
shallow_tuple!(A: 0, B: 1, C: 2, D: 3, E: 4, F: 5, G: 6, H: 7, I: 8, J: 9);
shallow_tuple!(A: 0, B: 1, C: 2, D: 3, E: 4, F: 5, G: 6, H: 7, I: 8, J: 9, K: 10);
shallow_tuple!(A: 0, B: 1, C: 2, D: 3, E: 4, F: 5, G: 6, H: 7, I: 8, J: 9, K: 10, L: 11);

/// A strategy deciding whether remembered inputs still stand for the
/// current ones.
///
/// Selectors compare the *whole* input tuple through one strategy, so a
/// custom strategy sees every position at once.
pub trait EqualityCheck<T: ?Sized> {
    fn same(&self, previous: &T, current: &T) -> bool;
}

/// Shallow equality, the default strategy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Shallow;

impl<T: ShallowEq + ?Sized> EqualityCheck<T> for Shallow {
    #[inline]
    fn same(&self, previous: &T, current: &T) -> bool {
        previous.shallow_eq(current)
    }
}

/// Structural equality through `PartialEq`.
///
/// Useful when input functions return cheap owned values (small `Vec`s,
/// plain structs) that are rebuilt on every call but rarely change.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ByValue;

impl<T: PartialEq + ?Sized> EqualityCheck<T> for ByValue {
    #[inline]
    fn same(&self, previous: &T, current: &T) -> bool {
        previous == current
    }
}

impl<T: ?Sized, F> EqualityCheck<T> for F
where
    F: Fn(&T, &T) -> bool,
{
    #[inline]
    fn same(&self, previous: &T, current: &T) -> bool {
        self(previous, current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitives_compare_by_value() {
        assert!(3_i64.shallow_eq(&3));
        assert!(!3_i64.shallow_eq(&4));
        assert!(String::from("a").shallow_eq(&String::from("a")));
        assert!("x".shallow_eq(&"x"));
        assert!(().shallow_eq(&()));
    }

    #[test]
    fn nan_is_never_shallow_equal() {
        assert!(!f64::NAN.shallow_eq(&f64::NAN));
    }

    #[test]
    fn shared_pointers_compare_by_identity() {
        let a = Arc::new(vec![1, 2, 3]);
        let b = Arc::new(vec![1, 2, 3]);
        assert!(a.shallow_eq(&Arc::clone(&a)));
        assert!(!a.shallow_eq(&b));

        let r = Rc::new("same");
        assert!(r.shallow_eq(&Rc::clone(&r)));
        assert!(!r.shallow_eq(&Rc::new("same")));
    }

    #[test]
    fn options_and_tuples_compare_per_position() {
        let shared = Arc::new(5);
        assert!(Some(Arc::clone(&shared)).shallow_eq(&Some(Arc::clone(&shared))));
        assert!(!Some(1).shallow_eq(&None));
        assert!(None::<i32>.shallow_eq(&None));

        let left = (1_u8, Arc::clone(&shared), true);
        assert!(left.shallow_eq(&(1, Arc::clone(&shared), true)));
        assert!(!left.shallow_eq(&(1, Arc::new(5), true)));
        assert!(!left.shallow_eq(&(2, Arc::clone(&shared), true)));
    }

    #[test]
    fn strategies_differ_on_fresh_allocations() {
        let a = (Arc::new(vec![1]),);
        let b = (Arc::new(vec![1]),);
        assert!(!Shallow.same(&a, &b));
        assert!(ByValue.same(&a, &b));
    }

    #[test]
    fn closures_are_strategies() {
        let by_len = |a: &(Vec<u8>,), b: &(Vec<u8>,)| a.0.len() == b.0.len();
        assert!(by_len.same(&(vec![1, 2],), &(vec![3, 4],)));
        assert!(!by_len.same(&(vec![1],), &(vec![3, 4],)));
    }
}
