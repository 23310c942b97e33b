use std::fmt;

use super::{Cents, format_cents};

/// Input that is rejected before the store is touched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    EmptyName,
    NegativeBalance(Cents),
    NonPositiveAmount(Cents),
    SelfTransfer,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::EmptyName => write!(f, "customer name must not be empty"),
            ValidationError::NegativeBalance(cents) => write!(
                f,
                "initial balance must not be negative (got {})",
                format_cents(*cents)
            ),
            ValidationError::NonPositiveAmount(cents) => write!(
                f,
                "transfer amount must be positive (got {})",
                format_cents(*cents)
            ),
            ValidationError::SelfTransfer => {
                write!(f, "source and destination accounts must differ")
            }
        }
    }
}

impl std::error::Error for ValidationError {}
