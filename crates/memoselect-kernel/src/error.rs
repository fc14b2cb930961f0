//! Error types for selector construction.
//!
//! The engine only fails while a selector is being built. Failures raised by
//! input functions or combiners during invocation belong to the caller and
//! are returned to it untouched; they never appear here.

/// A selector could not be built from the parts it was given.
#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    /// The combiner's declared arity does not match the input list.
    #[error("arity mismatch: combiner takes {expected} inputs, input list has {actual}")]
    ArityMismatch { expected: usize, actual: usize },

    /// A selector needs at least one input function.
    #[error("selector requires at least one input function")]
    EmptyInputs,

    /// A structured selector names the same output key twice.
    #[error("duplicate structured selector key: {0}")]
    DuplicateKey(String),

    /// Selector options could not be parsed.
    #[error("invalid selector options: {0}")]
    Options(#[from] toml::de::Error),
}

impl ConfigurationError {
    /// Check that a combiner of `expected` arity fits `actual` inputs.
    pub fn check_arity(expected: usize, actual: usize) -> Result<(), Self> {
        if actual == 0 {
            return Err(Self::EmptyInputs);
        }
        if expected != actual {
            return Err(Self::ArityMismatch { expected, actual });
        }
        Ok(())
    }
}
