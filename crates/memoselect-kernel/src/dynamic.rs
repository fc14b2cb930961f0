//! Runtime-arity selectors over dynamic values.
//!
//! The typed [`Selector`](crate::Selector) fixes its arity in the type of its
//! input tuple. This module covers the other case: input lists assembled at
//! runtime, from configuration or from a host that only knows values, not
//! types.
//!
//! - [`Value`] is the dynamic output of an input function. Primitives compare
//!   by value; every shared variant compares by `Arc` identity.
//! - [`DynCombiner`] declares its arity, and [`DynSelector::new`] refuses an
//!   input list of a different length before any invocation.
//! - Input functions and combiners are fallible. The first `Err` is returned
//!   to the caller unchanged and the cache keeps its previous entry.

use crate::equality::{Shallow, ShallowEq};
use crate::error::ConfigurationError;
use crate::memo::{MemoCell, Outcome};
use crate::options::SelectorOptions;
use crate::selector::{ANONYMOUS, SelectorStats};
use crate::stability::StabilityCheck;
use serde::{Serialize, Serializer};
use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// A function value stored inside a [`Value`].
pub type ValueFn = Arc<dyn Fn(&[Value]) -> Value + Send + Sync>;

/// Dynamic output of an input function.
#[derive(Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Arc<str>),
    List(Arc<Vec<Value>>),
    Record(Arc<BTreeMap<String, Value>>),
    Json(Arc<serde_json::Value>),
    Opaque(Arc<dyn Any + Send + Sync>),
    Func(ValueFn),
}

impl Value {
    pub fn str(s: impl AsRef<str>) -> Self {
        Value::Str(Arc::from(s.as_ref()))
    }

    pub fn list(items: impl IntoIterator<Item = Value>) -> Self {
        Value::List(Arc::new(items.into_iter().collect()))
    }

    pub fn record<K: Into<String>>(fields: impl IntoIterator<Item = (K, Value)>) -> Self {
        Value::Record(Arc::new(
            fields.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        ))
    }

    pub fn opaque<T: Any + Send + Sync>(value: T) -> Self {
        Value::Opaque(Arc::new(value))
    }

    pub fn func(f: impl Fn(&[Value]) -> Value + Send + Sync + 'static) -> Self {
        Value::Func(Arc::new(f))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Numeric view; integers widen to floats.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(x) => Some(*x),
            Value::Int(n) => Some(*n as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(&**s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items.as_slice()),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Record(fields) => Some(&**fields),
            _ => None,
        }
    }

    pub fn downcast<T: Any>(&self) -> Option<&T> {
        match self {
            Value::Opaque(inner) => inner.downcast_ref(),
            _ => None,
        }
    }

    /// Apply a function value. `None` when the value is not a function.
    pub fn call(&self, args: &[Value]) -> Option<Value> {
        match self {
            Value::Func(f) => Some(f(args)),
            _ => None,
        }
    }

    /// JSON view of the value. Opaque values and functions render as tags.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value as Json;
        match self {
            Value::Null => Json::Null,
            Value::Bool(b) => Json::Bool(*b),
            Value::Int(n) => Json::from(*n),
            Value::Float(x) => Json::from(*x),
            Value::Str(s) => Json::String(s.to_string()),
            Value::List(items) => Json::Array(items.iter().map(Value::to_json).collect()),
            Value::Record(fields) => Json::Object(
                fields
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
            Value::Json(json) => Json::clone(json),
            Value::Opaque(_) => Json::String("<opaque>".into()),
            Value::Func(_) => Json::String("<function>".into()),
        }
    }
}

impl ShallowEq for Value {
    fn shallow_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) => Arc::ptr_eq(a, b),
            (Value::Record(a), Value::Record(b)) => Arc::ptr_eq(a, b),
            (Value::Json(a), Value::Json(b)) => Arc::ptr_eq(a, b),
            (Value::Opaque(a), Value::Opaque(b)) => Arc::ptr_eq(a, b),
            (Value::Func(a), Value::Func(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "Null"),
            Value::Bool(b) => write!(f, "Bool({b})"),
            Value::Int(n) => write!(f, "Int({n})"),
            Value::Float(x) => write!(f, "Float({x})"),
            Value::Str(s) => write!(f, "Str({s:?})"),
            Value::List(items) => f.debug_tuple("List").field(items).finish(),
            Value::Record(fields) => f.debug_tuple("Record").field(fields).finish(),
            Value::Json(json) => write!(f, "Json({json})"),
            Value::Opaque(_) => write!(f, "Opaque(..)"),
            Value::Func(_) => write!(f, "Func(..)"),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::str(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(Arc::from(s))
    }
}

/// Primitives convert to primitive variants; arrays and objects are shared
/// as one [`Value::Json`], so each conversion yields a new identity.
impl From<&serde_json::Value> for Value {
    fn from(json: &serde_json::Value) -> Self {
        use serde_json::Value as Json;
        match json {
            Json::Null => Value::Null,
            Json::Bool(b) => Value::Bool(*b),
            Json::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Json::String(s) => Value::str(s),
            Json::Array(_) | Json::Object(_) => Value::Json(Arc::new(json.clone())),
        }
    }
}

/// The remembered input tuple of a [`DynSelector`].
#[derive(Debug, Clone)]
pub struct InputValues(pub Vec<Value>);

impl ShallowEq for InputValues {
    fn shallow_eq(&self, other: &Self) -> bool {
        self.0.len() == other.0.len()
            && self.0.iter().zip(&other.0).all(|(a, b)| a.shallow_eq(b))
    }
}

/// A fallible input function over `(state, props)`.
pub type DynInput<S, P, E> = Arc<dyn Fn(&S, &P) -> Result<Value, E> + Send + Sync>;

/// Box a two-argument input function.
pub fn dyn_input<S, P, E, F>(f: F) -> DynInput<S, P, E>
where
    F: Fn(&S, &P) -> Result<Value, E> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Box a state-only input function.
pub fn dyn_state_input<S, P, E, F>(f: F) -> DynInput<S, P, E>
where
    S: 'static,
    P: 'static,
    E: 'static,
    F: Fn(&S) -> Result<Value, E> + Send + Sync + 'static,
{
    Arc::new(move |state: &S, _props: &P| f(state))
}

/// A combiner with a declared arity.
pub struct DynCombiner<R, E> {
    arity: usize,
    apply: Arc<dyn Fn(&[Value]) -> Result<R, E> + Send + Sync>,
}

impl<R, E> DynCombiner<R, E> {
    pub fn new<F>(arity: usize, f: F) -> Self
    where
        F: Fn(&[Value]) -> Result<R, E> + Send + Sync + 'static,
    {
        Self {
            arity,
            apply: Arc::new(f),
        }
    }

    pub fn arity(&self) -> usize {
        self.arity
    }

    /// Run the combiner directly, bypassing any cache.
    pub fn apply(&self, values: &[Value]) -> Result<R, E> {
        (self.apply)(values)
    }
}

impl<R, E> Clone for DynCombiner<R, E> {
    fn clone(&self) -> Self {
        Self {
            arity: self.arity,
            apply: Arc::clone(&self.apply),
        }
    }
}

impl<R, E> fmt::Debug for DynCombiner<R, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynCombiner")
            .field("arity", &self.arity)
            .finish_non_exhaustive()
    }
}

/// A memoized selector whose input list is assembled at runtime.
pub struct DynSelector<S, P, R, E> {
    inputs: Vec<DynInput<S, P, E>>,
    combiner: DynCombiner<R, E>,
    memo: MemoCell<InputValues, R>,
    stability: StabilityCheck,
    name: Option<String>,
}

impl<S, P, R, E> DynSelector<S, P, R, E> {
    /// Build a selector, checking the combiner's arity against the inputs.
    pub fn new(
        inputs: Vec<DynInput<S, P, E>>,
        combiner: DynCombiner<R, E>,
    ) -> Result<Self, ConfigurationError> {
        Self::with_options(inputs, combiner, SelectorOptions::default())
    }

    pub fn with_options(
        inputs: Vec<DynInput<S, P, E>>,
        combiner: DynCombiner<R, E>,
        options: SelectorOptions,
    ) -> Result<Self, ConfigurationError> {
        ConfigurationError::check_arity(combiner.arity(), inputs.len())?;
        Ok(Self {
            inputs,
            combiner,
            memo: MemoCell::new(),
            stability: StabilityCheck::new(options.input_stability_check),
            name: options.name,
        })
    }

    fn evaluate(&self, state: &S, props: &P) -> Result<InputValues, E> {
        self.inputs
            .iter()
            .map(|input| input(state, props))
            .collect::<Result<Vec<_>, E>>()
            .map(InputValues)
    }

    /// Invoke the selector.
    pub fn select(&self, state: &S, props: &P) -> Result<R, E>
    where
        R: Clone,
    {
        let (result, outcome) = self.memo.memoize(
            &Shallow,
            || {
                let values = self.evaluate(state, props)?;
                self.stability
                    .verify(self.label(), &Shallow, &values, || self.evaluate(state, props))?;
                Ok::<_, E>(values)
            },
            |values| self.combiner.apply(&values.0),
        )?;
        match outcome {
            Outcome::Hit => tracing::trace!(selector = self.label(), "cache hit"),
            Outcome::Miss => tracing::debug!(
                selector = self.label(),
                recomputations = self.memo.recomputations(),
                "recomputed"
            ),
        }
        Ok(result)
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn label(&self) -> &str {
        self.name().unwrap_or(ANONYMOUS)
    }

    pub fn combiner(&self) -> &DynCombiner<R, E> {
        &self.combiner
    }

    pub fn dependency_count(&self) -> usize {
        self.inputs.len()
    }

    pub fn recomputations(&self) -> u64 {
        self.memo.recomputations()
    }

    pub fn hits(&self) -> u64 {
        self.memo.hits()
    }

    pub fn reset_recomputations(&self) {
        self.memo.reset_counters();
    }

    pub fn clear_cache(&self) {
        self.memo.clear();
    }

    pub fn last_result(&self) -> Option<R>
    where
        R: Clone,
    {
        self.memo.last_result()
    }

    pub fn stats(&self) -> SelectorStats {
        SelectorStats {
            name: self.name.clone(),
            cache: self.memo.stats(),
            stability_warnings: self.stability.warnings(),
        }
    }
}

impl<S, P, E> DynSelector<S, P, Value, E>
where
    S: 'static,
    P: 'static,
    E: 'static,
{
    /// Use this selector as an input of another dynamic selector.
    pub fn into_input(self: Arc<Self>) -> DynInput<S, P, E> {
        Arc::new(move |state: &S, props: &P| self.select(state, props))
    }
}

impl<S, P, R, E> fmt::Debug for DynSelector<S, P, R, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynSelector")
            .field("name", &self.label())
            .field("dependencies", &self.inputs.len())
            .field("memo", &self.memo)
            .finish()
    }
}

fn record_combiner<E: 'static>(keys: Vec<String>) -> DynCombiner<Value, E> {
    let arity = keys.len();
    DynCombiner::new(arity, move |values: &[Value]| {
        Ok(Value::record(keys.iter().cloned().zip(values.iter().cloned())))
    })
}

/// Build a selector whose result is a [`Value::Record`] of its inputs.
///
/// The record is rebuilt only when some field changes, so consumers can
/// compare it by identity.
pub fn structured_selector<S, P, E, K>(
    fields: impl IntoIterator<Item = (K, DynInput<S, P, E>)>,
) -> Result<DynSelector<S, P, Value, E>, ConfigurationError>
where
    K: Into<String>,
    E: 'static,
{
    let mut keys: Vec<String> = Vec::new();
    let mut inputs = Vec::new();
    for (key, input) in fields {
        let key = key.into();
        if keys.contains(&key) {
            return Err(ConfigurationError::DuplicateKey(key));
        }
        keys.push(key);
        inputs.push(input);
    }
    DynSelector::new(inputs, record_combiner(keys))
}
