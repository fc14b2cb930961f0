//! Input-stability check.
//!
//! Memoization only pays off when input functions are pure: called twice
//! with the same arguments they must produce values the selector's equality
//! considers the same. An input that builds a fresh collection on every call
//! silently turns every invocation into a recomputation.
//!
//! When enabled, the check evaluates the input list a second time with the
//! same arguments and compares both results. A mismatch is reported as a
//! `warn` event and counted; the selector's result is never affected.
//!
//! The second evaluation is a real one. Nested selectors in the input list
//! are invoked again and count the extra call as a hit, and inputs with side
//! effects observe it.

use crate::equality::EqualityCheck;
use crate::options::CheckFrequency;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

#[derive(Debug)]
pub struct StabilityCheck {
    frequency: CheckFrequency,
    ran: AtomicBool,
    warnings: AtomicU64,
}

impl StabilityCheck {
    pub fn new(frequency: CheckFrequency) -> Self {
        Self {
            frequency,
            ran: AtomicBool::new(false),
            warnings: AtomicU64::new(0),
        }
    }

    pub fn frequency(&self) -> CheckFrequency {
        self.frequency
    }

    /// Whether this invocation should be checked. `Once` is due exactly one
    /// time over the life of the check.
    pub fn is_due(&self) -> bool {
        match self.frequency {
            CheckFrequency::Never => false,
            CheckFrequency::Always => true,
            CheckFrequency::Once => !self.ran.swap(true, Ordering::AcqRel),
        }
    }

    /// Compare `first` with a second evaluation when the check is due.
    ///
    /// An `Err` from the second evaluation is returned to the caller like any
    /// other input failure.
    pub fn verify<K, Q, E>(
        &self,
        selector: &str,
        equality: &Q,
        first: &K,
        again: impl FnOnce() -> Result<K, E>,
    ) -> Result<(), E>
    where
        Q: EqualityCheck<K> + ?Sized,
    {
        if !self.is_due() {
            return Ok(());
        }
        let second = again()?;
        if !equality.same(first, &second) {
            let warnings = self.warnings.fetch_add(1, Ordering::Relaxed) + 1;
            tracing::warn!(
                selector,
                warnings,
                "input functions returned different values for identical arguments; \
                 the selector will recompute on every call"
            );
        }
        Ok(())
    }

    /// Number of unstable evaluations seen so far.
    pub fn warnings(&self) -> u64 {
        self.warnings.load(Ordering::Relaxed)
    }
}
