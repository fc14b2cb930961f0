//! The single-slot memo cache.
//!
//! A [`MemoCell`] remembers at most one `(inputs, result)` pair. Each
//! invocation evaluates the current inputs, compares them with the
//! remembered ones through an [`EqualityCheck`], and either reuses the
//! remembered result or recomputes and overwrites it.
//!
//! Evaluation, comparison and the write all happen under one lock, so
//! concurrent callers of the same cell are serialized and the remembered
//! pair is always consistent. The slot is written only after the
//! computation succeeded: a failing or panicking computation leaves the
//! previous entry exactly as it was.

use crate::equality::EqualityCheck;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// The remembered state of a memo cell.
///
/// Both halves live in one value, so a result can never outlive or precede
/// the inputs it was computed from.
#[derive(Debug, Clone)]
pub struct CacheEntry<K, R> {
    pub inputs: K,
    pub result: R,
}

/// How an invocation was served.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// The remembered result was returned; nothing was recomputed.
    Hit,
    /// The result was recomputed and is now remembered.
    Miss,
}

impl Outcome {
    pub fn is_hit(self) -> bool {
        matches!(self, Outcome::Hit)
    }
}

/// Counters collected by a memo cell.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Number of times the result was recomputed.
    pub recomputations: u64,
    /// Number of invocations served from the remembered result.
    pub hits: u64,
}

/// A depth-1 memo cache keyed by `K`.
pub struct MemoCell<K, R> {
    slot: Mutex<Option<CacheEntry<K, R>>>,
    recomputations: AtomicU64,
    hits: AtomicU64,
}

impl<K, R> MemoCell<K, R> {
    /// An empty cell. Nothing is remembered until the first invocation.
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(None),
            recomputations: AtomicU64::new(0),
            hits: AtomicU64::new(0),
        }
    }

    // The slot is only assigned after a computation returns, so a poisoned
    // lock still guards a consistent entry.
    fn lock(&self) -> MutexGuard<'_, Option<CacheEntry<K, R>>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Serve one invocation.
    ///
    /// `evaluate` produces the current inputs; `combine` turns inputs into a
    /// result and only runs on a miss. An `Err` from either is returned as
    /// is and leaves the remembered entry untouched.
    pub fn memoize<Q, E>(
        &self,
        equality: &Q,
        evaluate: impl FnOnce() -> Result<K, E>,
        combine: impl FnOnce(&K) -> Result<R, E>,
    ) -> Result<(R, Outcome), E>
    where
        Q: EqualityCheck<K> + ?Sized,
        R: Clone,
    {
        let mut slot = self.lock();
        let inputs = evaluate()?;

        if let Some(entry) = slot.as_ref() {
            if equality.same(&entry.inputs, &inputs) {
                self.hits.fetch_add(1, Ordering::Relaxed);
                return Ok((entry.result.clone(), Outcome::Hit));
            }
        }

        let result = combine(&inputs)?;
        self.recomputations.fetch_add(1, Ordering::Relaxed);
        *slot = Some(CacheEntry {
            inputs,
            result: result.clone(),
        });
        Ok((result, Outcome::Miss))
    }

    /// Whether an entry is currently remembered.
    pub fn is_empty(&self) -> bool {
        self.lock().is_none()
    }

    /// The remembered result, if any.
    pub fn last_result(&self) -> Option<R>
    where
        R: Clone,
    {
        self.lock().as_ref().map(|entry| entry.result.clone())
    }

    /// The remembered inputs, if any.
    pub fn last_inputs(&self) -> Option<K>
    where
        K: Clone,
    {
        self.lock().as_ref().map(|entry| entry.inputs.clone())
    }

    /// Forget the remembered entry. The next invocation is a miss.
    pub fn clear(&self) {
        *self.lock() = None;
    }

    pub fn recomputations(&self) -> u64 {
        self.recomputations.load(Ordering::Relaxed)
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    /// Zero the counters. The remembered entry is kept.
    pub fn reset_counters(&self) {
        self.recomputations.store(0, Ordering::Relaxed);
        self.hits.store(0, Ordering::Relaxed);
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            recomputations: self.recomputations(),
            hits: self.hits(),
        }
    }
}

impl<K, R> Default for MemoCell<K, R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, R> std::fmt::Debug for MemoCell<K, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoCell")
            .field("cached", &!self.is_empty())
            .field("recomputations", &self.recomputations())
            .field("hits", &self.hits())
            .finish()
    }
}
