//! # memoselect kernel
//!
//! Memoized selectors: derived values computed from a state snapshot and
//! call-site props, recomputed only when their inputs change.
//!
//! A selector is built from an ordered list of input derivations and a
//! combiner. Each invocation runs the inputs, compares their outputs with
//! the ones remembered from the previous invocation, and only runs the
//! combiner when something changed. The cache holds exactly one entry and
//! compares inputs shallowly: primitives by value, shared data by identity.
//!
//! This crate is **state-agnostic**: it does not own, fetch or mutate state.
//! It only prescribes how derived values are reused.
//!
//! ## Architecture
//!
//! ```text
//! ShallowEq / EqualityCheck   ← When are two inputs "the same"?
//!     │
//! MemoCell<K, R>              ← One remembered (inputs, result) pair, locked
//!     │
//! Derivation<S, P>            ← (state, props) → value; tuples form InputLists
//!     │
//! Selector                    ← InputList + combiner + MemoCell; a Derivation
//!     │
//! DynSelector                 ← Runtime-arity variant over dynamic Values
//! ```

pub mod derivation;
pub mod dynamic;
pub mod equality;
pub mod error;
pub mod memo;
pub mod memoize;
pub mod options;
pub mod selector;
pub mod stability;

pub use derivation::{Derivation, FromFn, FromState, InputList, derivation, from_state};
pub use dynamic::{
    DynCombiner, DynInput, DynSelector, Value, dyn_input, dyn_state_input, structured_selector,
};
pub use equality::{ByValue, EqualityCheck, Shallow, ShallowEq};
pub use error::ConfigurationError;
pub use memo::{CacheStats, MemoCell, Outcome};
pub use memoize::{Memoized, memoize, memoize_with};
pub use options::{CheckFrequency, SelectorOptions};
pub use selector::{Selector, SelectorCreator, SelectorStats, create_selector};
