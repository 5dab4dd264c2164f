//! # Error Types
//!
//! This module defines the error type shared by every part of the engine.
//! Errors fall into three families:
//!
//! - configuration problems (`Configuration`), always reported before the
//!   first generation runs;
//! - evaluation failures (`Evaluation`, `InvalidNumericValue`), returned by a
//!   genome's objective and absorbed by the engine according to the
//!   configured [`EvaluationPolicy`](crate::evaluation::EvaluationPolicy);
//! - operator failures (`Operator`, `EmptyPopulation`), raised when a
//!   selection, variation or migration strategy cannot honour its contract.
//!   These stop the run.
//!
//! ## Examples
//!
//! ```rust
//! use gaopt::error::{GeneticError, Result};
//!
//! fn objective(x: f64) -> Result<f64> {
//!     if x < 0.0 {
//!         return Err(GeneticError::Evaluation(format!("log undefined for {}", x)));
//!     }
//!     Ok(x.ln())
//! }
//!
//! assert!(objective(-1.0).is_err());
//! ```
//!
//! Using the `OptionExt` trait to convert `Option` to `Result`:
//!
//! ```rust
//! use gaopt::error::{GeneticError, OptionExt};
//!
//! fn lowest(candidates: &[i32]) -> gaopt::error::Result<i32> {
//!     candidates.iter().min().cloned().ok_or_else_genetic(||
//!         GeneticError::EmptyPopulation
//!     )
//! }
//!
//! assert!(lowest(&[]).is_err());
//! ```

use thiserror::Error;

/// Represents errors that can occur while configuring or running an evolution.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeneticError {
    /// Invalid configuration detected before the run started.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A genome's objective is undefined for its current state.
    #[error("Evaluation error: {0}")]
    Evaluation(String),

    /// A selection, variation or migration strategy cannot satisfy its
    /// contract for the given population.
    #[error("Operator error: {0}")]
    Operator(String),

    /// The engine was driven in an order its state machine does not allow.
    #[error("Evolution error: {0}")]
    Evolution(String),

    /// Error that occurs when an empty population is encountered.
    #[error("Empty population error: Cannot operate on an empty population")]
    EmptyPopulation,

    /// Error that occurs when NaN values are encountered.
    #[error("Invalid numeric value: {0}")]
    InvalidNumericValue(String),

    /// A generic error with a custom message.
    #[error("{0}")]
    Other(String),
}

impl GeneticError {
    /// Returns `true` for errors the engine isolates to one individual
    /// instead of stopping the run.
    pub fn is_evaluation_failure(&self) -> bool {
        matches!(
            self,
            GeneticError::Evaluation(_) | GeneticError::InvalidNumericValue(_)
        )
    }
}

/// A specialized Result type for evolution operations.
pub type Result<T> = std::result::Result<T, GeneticError>;

/// Extension trait for Option to convert to Result with a custom error.
pub trait OptionExt<T> {
    /// Converts an `Option<T>` to a `Result<T, GeneticError>` using
    /// a closure to generate the error.
    fn ok_or_else_genetic<F>(self, err_fn: F) -> Result<T>
    where
        F: FnOnce() -> GeneticError;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_else_genetic<F>(self, err_fn: F) -> Result<T>
    where
        F: FnOnce() -> GeneticError,
    {
        self.ok_or_else(err_fn)
    }
}
