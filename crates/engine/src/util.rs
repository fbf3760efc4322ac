//! Internal helpers for input validation.
//!
//! These utilities are **not** part of the public API. They centralize
//! validation logic so the engine enforces consistent invariants.

use crate::{Currency, EngineError, ResultEngine};

/// Trim a user-supplied name and reject empty input.
pub(crate) fn normalize_required_name(value: &str, label: &str) -> ResultEngine<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::InvalidAmount(format!(
            "{label} name must not be empty"
        )));
    }
    Ok(trimmed.to_string())
}

/// Ensure an expense currency matches the group currency.
pub(crate) fn ensure_group_currency(
    group_currency: Currency,
    actual: Currency,
) -> ResultEngine<()> {
    if group_currency != actual {
        return Err(EngineError::CurrencyMismatch(format!(
            "group currency is {}, got {}",
            group_currency.code(),
            actual.code()
        )));
    }
    Ok(())
}
