//! The module contains the error the engine can throw.
//!
//! Two variants carry domain meaning beyond plain validation:
//!
//! - [`SplitMismatch`] when manually entered shares do not add up to the
//!   expense amount; it carries the signed delta for user display.
//! - [`UnknownMember`] when an expense references a member outside the group
//!   roster; aggregation aborts rather than produce a partial balance.
//!
//!  [`SplitMismatch`]: EngineError::SplitMismatch
//!  [`UnknownMember`]: EngineError::UnknownMember
use thiserror::Error;
use uuid::Uuid;

use crate::Money;

/// Engine custom errors.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum EngineError {
    /// `delta` is `sum(shares) - amount`, positive when the shares overshoot.
    #[error("shares differ from the expense amount by {delta}")]
    SplitMismatch { delta: Money },
    #[error("member \"{0}\" is not part of the group")]
    UnknownMember(Uuid),
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("\"{0}\" already present!")]
    ExistingKey(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Invalid weight: {0}")]
    InvalidWeight(String),
    #[error("Currency mismatch: {0}")]
    CurrencyMismatch(String),
}
