//! Stand-alone memoized functions.
//!
//! [`memoize`] gives a single-argument function the same depth-1 cache a
//! selector uses, without an input list: the argument itself is the key.

use crate::equality::{EqualityCheck, Shallow, ShallowEq};
use crate::memo::{CacheStats, MemoCell};
use std::convert::Infallible;

/// A function wrapped with a single-slot cache on its argument.
pub struct Memoized<A, R, F, Q = Shallow> {
    f: F,
    equality: Q,
    memo: MemoCell<A, R>,
}

/// Memoize `f` on its most recent argument under shallow equality.
///
/// ```
/// use memoselect_kernel::memoize;
/// use std::sync::Arc;
///
/// let total = memoize(|xs: &Arc<Vec<u32>>| xs.iter().sum::<u32>());
/// let xs = Arc::new(vec![1, 2, 3]);
/// assert_eq!(total.call(Arc::clone(&xs)), 6);
/// assert_eq!(total.call(Arc::clone(&xs)), 6);
/// assert_eq!(total.stats().recomputations, 1);
/// ```
pub fn memoize<A, R, F>(f: F) -> Memoized<A, R, F>
where
    A: ShallowEq,
    F: Fn(&A) -> R,
{
    memoize_with(f, Shallow)
}

/// Memoize `f` under a custom equality strategy.
pub fn memoize_with<A, R, F, Q>(f: F, equality: Q) -> Memoized<A, R, F, Q>
where
    F: Fn(&A) -> R,
    Q: EqualityCheck<A>,
{
    Memoized {
        f,
        equality,
        memo: MemoCell::new(),
    }
}

impl<A, R, F, Q> Memoized<A, R, F, Q>
where
    F: Fn(&A) -> R,
    Q: EqualityCheck<A>,
    R: Clone,
{
    pub fn call(&self, arg: A) -> R {
        match self
            .memo
            .memoize(&self.equality, || Ok::<_, Infallible>(arg), |arg| Ok((self.f)(arg)))
        {
            Ok((result, _)) => result,
            Err(never) => match never {},
        }
    }

    pub fn clear(&self) {
        self.memo.clear();
    }

    pub fn stats(&self) -> CacheStats {
        self.memo.stats()
    }
}
