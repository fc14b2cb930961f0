//! Derivation functions and input lists.
//!
//! A derivation maps a state snapshot `S` and call-site props `P` to a
//! value. Two call shapes exist and mix freely inside one input list:
//!
//! - [`derivation`] wraps `Fn(&S, &P) -> V`, the two-argument shape;
//! - [`from_state`] wraps `Fn(&S) -> V`, which ignores props.
//!
//! Whatever shape a derivation has, a selector hands it the exact `(state,
//! props)` pair it was itself called with.
//!
//! Outputs are owned values. Anything bigger than a primitive should be
//! returned behind an `Arc` that stays the same while the underlying data is
//! unchanged, otherwise every call looks like a change to the cache.

use std::sync::Arc;

/// A function from `(state, props)` to a derived value.
pub trait Derivation<S, P> {
    type Output;

    fn derive(&self, state: &S, props: &P) -> Self::Output;
}

/// Two-argument derivation built by [`derivation`].
#[derive(Debug, Clone, Copy)]
pub struct FromFn<F>(pub F);

/// State-only derivation built by [`from_state`].
#[derive(Debug, Clone, Copy)]
pub struct FromState<F>(pub F);

/// Use a `Fn(&S, &P) -> V` closure as a derivation.
pub fn derivation<F>(f: F) -> FromFn<F> {
    FromFn(f)
}

/// Use a `Fn(&S) -> V` closure as a derivation that ignores props.
pub fn from_state<F>(f: F) -> FromState<F> {
    FromState(f)
}

impl<S, P, V, F> Derivation<S, P> for FromFn<F>
where
    F: Fn(&S, &P) -> V,
{
    type Output = V;

    #[inline]
    fn derive(&self, state: &S, props: &P) -> V {
        (self.0)(state, props)
    }
}

impl<S, P, V, F> Derivation<S, P> for FromState<F>
where
    F: Fn(&S) -> V,
{
    type Output = V;

    #[inline]
    fn derive(&self, state: &S, _props: &P) -> V {
        (self.0)(state)
    }
}

impl<S, P, T> Derivation<S, P> for &T
where
    T: Derivation<S, P> + ?Sized,
{
    type Output = T::Output;

    #[inline]
    fn derive(&self, state: &S, props: &P) -> Self::Output {
        (**self).derive(state, props)
    }
}

impl<S, P, T> Derivation<S, P> for Arc<T>
where
    T: Derivation<S, P> + ?Sized,
{
    type Output = T::Output;

    #[inline]
    fn derive(&self, state: &S, props: &P) -> Self::Output {
        (**self).derive(state, props)
    }
}

impl<S, P, T> Derivation<S, P> for Box<T>
where
    T: Derivation<S, P> + ?Sized,
{
    type Output = T::Output;

    #[inline]
    fn derive(&self, state: &S, props: &P) -> Self::Output {
        (**self).derive(state, props)
    }
}

/// An ordered, non-empty list of derivations sharing one call signature.
///
/// Implemented for tuples of 1 to 12 derivations. Evaluation runs the
/// members left to right and collects their outputs in a tuple of the same
/// arity, which is what a combiner receives.
pub trait InputList<S, P> {
    type Values;

    /// Number of derivations in the list.
    const LEN: usize;

    fn evaluate(&self, state: &S, props: &P) -> Self::Values;
}

macro_rules! input_list {
    ($len:expr; $($name:ident : $idx:tt),+) => {
        impl<S, P, $($name),+> InputList<S, P> for ($($name,)+)
        where
            $($name: Derivation<S, P>,)+
        {
            type Values = ($(<$name as Derivation<S, P>>::Output,)+);

            const LEN: usize = $len;

            #[inline]
            fn evaluate(&self, state: &S, props: &P) -> Self::Values {
                ($(self.$idx.derive(state, props),)+)
            }
        }
    };
}

input_list!(1; A: 0);
input_list!(2; A: 0, B: 1);
input_list!(3; A: 0, B: 1, C: 2);
input_list!(4; A: 0, B: 1, C: 2, D: 3);
input_list!(5; A: 0, B: 1, C: 2, D: 3, E: 4);
input_list!(6; A: 0, B: 1, C: 2, D: 3, E: 4, F: 5);
input_list!(7; A: 0, B: 1, C: 2, D: 3, E: 4, F: 5, G: 6);
input_list!(8; A: 0, B: 1, C: 2, D: 3, E: 4, F: 5, G: 6, H: 7);
input_list!(9; A: 0, B: 1, C: 2, D: 3, E: 4, F: 5, G: 6, H: 7, I: 8);
input_list!(10; A: 0, B: 1, C: 2, D: 3, E: 4, F: 5, G: 6, H: 7, I: 8, J: 9);
input_list!(11; A: 0, B: 1, C: 2, D: 3, E: 4, F: 5, G: 6, H: 7, I: 8, J: 9, K: 10);
input_list!(12; A: 0, B: 1, C: 2, D: 3, E: 4, F: 5, G: 6, H: 7, I: 8, J: 9, K: 10, L: 11);

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    struct Shop {
        items: Arc<Vec<u32>>,
        tax: u32,
    }

    struct Props {
        discount: u32,
    }

    fn list_len<S, P, I: InputList<S, P>>(_: &I) -> usize {
        I::LEN
    }

    #[test]
    fn both_shapes_see_the_same_call() {
        let shop = Shop {
            items: Arc::new(vec![10, 20]),
            tax: 8,
        };
        let props = Props { discount: 5 };

        let inputs = (
            from_state(|s: &Shop| s.tax),
            derivation(|_: &Shop, p: &Props| p.discount),
            from_state(|s: &Shop| Arc::clone(&s.items)),
        );
        let (tax, discount, items) = inputs.evaluate(&shop, &props);
        assert_eq!(tax, 8);
        assert_eq!(discount, 5);
        assert!(Arc::ptr_eq(&items, &shop.items));
        assert_eq!(list_len::<Shop, Props, _>(&inputs), 3);
    }

    #[test]
    fn evaluation_runs_in_list_order() {
        let order = RefCell::new(Vec::new());
        let inputs = (
            derivation(|_: &(), _: &()| order.borrow_mut().push("first")),
            derivation(|_: &(), _: &()| order.borrow_mut().push("second")),
            derivation(|_: &(), _: &()| order.borrow_mut().push("third")),
        );
        inputs.evaluate(&(), &());
        assert_eq!(*order.borrow(), vec!["first", "second", "third"]);
    }

    #[test]
    fn shared_and_borrowed_derivations_forward() {
        let double = Arc::new(from_state(|n: &u32| n * 2));
        assert_eq!(Derivation::<u32, ()>::derive(&double, &4, &()), 8);
        assert_eq!(Derivation::<u32, ()>::derive(&&*double, &5, &()), 10);
    }
}
