//! Typed selectors.
//!
//! A [`Selector`] joins a tuple of derivations with a combiner and memoizes
//! the combiner behind a depth-1 cache:
//!
//! 1. every input derivation runs, in order, on the `(state, props)` the
//!    selector was called with;
//! 2. if the resulting tuple is the same as the remembered one (per the
//!    selector's [`EqualityCheck`]), the remembered result is returned;
//! 3. otherwise the combiner runs on the new tuple and its result replaces
//!    the remembered pair.
//!
//! The input list is a tuple, so the combiner's arity is checked by the
//! compiler: a combiner destructuring two values cannot be paired with
//! three inputs. The dynamic engine in [`crate::dynamic`] performs the same
//! check at construction time instead.
//!
//! A selector is itself a [`Derivation`], so selectors nest. Each keeps its
//! own cache; an outer selector compares the inner one's output like any
//! other input.
//!
//! Combiners may return closures. The closure value is what gets cached;
//! calls made on it afterwards are outside the selector and are not
//! memoized.

use crate::derivation::{Derivation, InputList};
use crate::equality::{EqualityCheck, Shallow};
use crate::memo::{CacheStats, MemoCell, Outcome};
use crate::options::SelectorOptions;
use crate::stability::StabilityCheck;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt;
use std::marker::PhantomData;

/// Label used in log events for selectors built without a name.
pub const ANONYMOUS: &str = "<anonymous>";

/// Snapshot of a selector's counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectorStats {
    pub name: Option<String>,
    #[serde(flatten)]
    pub cache: CacheStats,
    pub stability_warnings: u64,
}

/// A memoized derivation built from an input list and a combiner.
pub struct Selector<S, P, I, C, R, Q = Shallow>
where
    I: InputList<S, P>,
{
    inputs: I,
    combiner: C,
    equality: Q,
    memo: MemoCell<I::Values, R>,
    stability: StabilityCheck,
    name: Option<String>,
    _call: PhantomData<fn(&S, &P) -> R>,
}

/// Build a selector with shallow equality and default options.
///
/// ```
/// use memoselect_kernel::{create_selector, from_state};
///
/// struct Counter {
///     count: i64,
/// }
///
/// let doubled = create_selector((from_state(|s: &Counter| s.count),), |(count,)| count * 2);
/// assert_eq!(doubled.select(&Counter { count: 3 }, &()), 6);
/// assert_eq!(doubled.select(&Counter { count: 3 }, &()), 6);
/// assert_eq!(doubled.recomputations(), 1);
/// ```
pub fn create_selector<S, P, I, C, R>(inputs: I, combiner: C) -> Selector<S, P, I, C, R>
where
    I: InputList<S, P>,
    C: Fn(&I::Values) -> R,
{
    SelectorCreator::new().create(inputs, combiner)
}

impl<S, P, I, C, R, Q> Selector<S, P, I, C, R, Q>
where
    I: InputList<S, P>,
    C: Fn(&I::Values) -> R,
    Q: EqualityCheck<I::Values>,
    R: Clone,
{
    /// Invoke the selector.
    pub fn select(&self, state: &S, props: &P) -> R {
        let served = self.memo.memoize(
            &self.equality,
            || {
                let values = self.inputs.evaluate(state, props);
                self.stability.verify(self.label(), &self.equality, &values, || {
                    Ok::<_, Infallible>(self.inputs.evaluate(state, props))
                })?;
                Ok::<_, Infallible>(values)
            },
            |values| Ok((self.combiner)(values)),
        );
        let (result, outcome) = match served {
            Ok(served) => served,
            Err(never) => match never {},
        };
        self.trace(outcome);
        result
    }
}

impl<S, P, I, C, R, Q> Selector<S, P, I, C, R, Q>
where
    I: InputList<S, P>,
{
    fn trace(&self, outcome: Outcome) {
        match outcome {
            Outcome::Hit => tracing::trace!(selector = self.label(), "cache hit"),
            Outcome::Miss => tracing::debug!(
                selector = self.label(),
                recomputations = self.memo.recomputations(),
                "recomputed"
            ),
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn label(&self) -> &str {
        self.name().unwrap_or(ANONYMOUS)
    }

    /// How many times the combiner has run.
    pub fn recomputations(&self) -> u64 {
        self.memo.recomputations()
    }

    /// How many invocations were served from the cache.
    pub fn hits(&self) -> u64 {
        self.memo.hits()
    }

    /// Zero the counters without touching the cache.
    pub fn reset_recomputations(&self) {
        self.memo.reset_counters();
    }

    /// Forget the remembered result. The next invocation recomputes.
    pub fn clear_cache(&self) {
        self.memo.clear();
    }

    /// The remembered result, if the selector has run successfully.
    pub fn last_result(&self) -> Option<R>
    where
        R: Clone,
    {
        self.memo.last_result()
    }

    /// The combiner, callable directly without memoization.
    pub fn combiner(&self) -> &C {
        &self.combiner
    }

    /// The input list the selector was built from.
    pub fn inputs(&self) -> &I {
        &self.inputs
    }

    pub fn dependency_count(&self) -> usize {
        I::LEN
    }

    pub fn stats(&self) -> SelectorStats {
        SelectorStats {
            name: self.name.clone(),
            cache: self.memo.stats(),
            stability_warnings: self.stability.warnings(),
        }
    }
}

impl<S, P, I, C, R, Q> Derivation<S, P> for Selector<S, P, I, C, R, Q>
where
    I: InputList<S, P>,
    C: Fn(&I::Values) -> R,
    Q: EqualityCheck<I::Values>,
    R: Clone,
{
    type Output = R;

    fn derive(&self, state: &S, props: &P) -> R {
        self.select(state, props)
    }
}

impl<S, P, I, C, R, Q> fmt::Debug for Selector<S, P, I, C, R, Q>
where
    I: InputList<S, P>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Selector")
            .field("name", &self.label())
            .field("dependencies", &I::LEN)
            .field("memo", &self.memo)
            .finish()
    }
}

/// A factory stamping an equality strategy and options onto selectors.
///
/// ```
/// use memoselect_kernel::{ByValue, SelectorCreator, SelectorOptions, from_state};
///
/// let creator = SelectorCreator::new()
///     .with_equality(ByValue)
///     .with_options(SelectorOptions::named("tags"));
/// let joined = creator.create(
///     (from_state(|tags: &Vec<String>| tags.clone()),),
///     |(tags,)| tags.join(","),
/// );
/// assert_eq!(joined.select(&vec!["a".into(), "b".into()], &()), "a,b");
/// assert_eq!(joined.select(&vec!["a".into(), "b".into()], &()), "a,b");
/// assert_eq!(joined.recomputations(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct SelectorCreator<Q = Shallow> {
    equality: Q,
    options: SelectorOptions,
}

impl SelectorCreator<Shallow> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<Q: Clone> SelectorCreator<Q> {
    /// Replace the equality strategy.
    pub fn with_equality<Q2>(self, equality: Q2) -> SelectorCreator<Q2> {
        SelectorCreator {
            equality,
            options: self.options,
        }
    }

    pub fn with_options(mut self, options: SelectorOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &SelectorOptions {
        &self.options
    }

    /// Build a selector with this creator's strategy and options.
    pub fn create<S, P, I, C, R>(&self, inputs: I, combiner: C) -> Selector<S, P, I, C, R, Q>
    where
        I: InputList<S, P>,
        C: Fn(&I::Values) -> R,
    {
        Selector {
            inputs,
            combiner,
            equality: self.equality.clone(),
            memo: MemoCell::new(),
            stability: StabilityCheck::new(self.options.input_stability_check),
            name: self.options.name.clone(),
            _call: PhantomData,
        }
    }

    /// Like [`create`](Self::create), under a different name.
    pub fn create_named<S, P, I, C, R>(
        &self,
        name: impl Into<String>,
        inputs: I,
        combiner: C,
    ) -> Selector<S, P, I, C, R, Q>
    where
        I: InputList<S, P>,
        C: Fn(&I::Values) -> R,
    {
        let mut selector = self.create(inputs, combiner);
        selector.name = Some(name.into());
        selector
    }
}
