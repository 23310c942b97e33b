use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{AccountId, AccountView, Cents, ValidationError};

pub type TransactionId = Uuid;

/// A completed transfer between two accounts.
/// Transactions are append-only: nothing updates or deletes them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    /// Source account (balance decreased)
    pub from_account: AccountId,
    /// Destination account (balance increased)
    pub to_account: AccountId,
    /// Amount in cents (always positive)
    pub amount_cents: Cents,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    /// Record a transfer of `amount_cents` from one account to another.
    pub fn new(
        from_account: AccountId,
        to_account: AccountId,
        amount_cents: Cents,
    ) -> Result<Self, ValidationError> {
        validate_transfer(from_account, to_account, amount_cents)?;

        Ok(Self {
            id: Uuid::new_v4(),
            from_account,
            to_account,
            amount_cents,
            created_at: Utc::now(),
        })
    }
}

/// Input checks for a transfer that don't need the store.
pub fn validate_transfer(
    from_account: AccountId,
    to_account: AccountId,
    amount_cents: Cents,
) -> Result<(), ValidationError> {
    if amount_cents <= 0 {
        return Err(ValidationError::NonPositiveAmount(amount_cents));
    }
    if from_account == to_account {
        return Err(ValidationError::SelfTransfer);
    }
    Ok(())
}

/// Transaction with both accounts (and their customers) expanded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionView {
    pub id: TransactionId,
    pub amount_cents: Cents,
    pub from_account: AccountView,
    pub to_account: AccountView,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_account_ids() -> (AccountId, AccountId) {
        (Uuid::new_v4(), Uuid::new_v4())
    }

    #[test]
    fn test_create_transaction() {
        let (from, to) = sample_account_ids();
        let tx = Transaction::new(from, to, 4000).unwrap();

        assert_eq!(tx.from_account, from);
        assert_eq!(tx.to_account, to);
        assert_eq!(tx.amount_cents, 4000);
    }

    #[test]
    fn test_transaction_requires_positive_amount() {
        let (from, to) = sample_account_ids();
        assert_eq!(
            Transaction::new(from, to, 0),
            Err(ValidationError::NonPositiveAmount(0))
        );
        assert_eq!(
            Transaction::new(from, to, -100),
            Err(ValidationError::NonPositiveAmount(-100))
        );
    }

    #[test]
    fn test_transaction_rejects_same_account() {
        let (from, _) = sample_account_ids();
        assert_eq!(
            Transaction::new(from, from, 100),
            Err(ValidationError::SelfTransfer)
        );
    }

    #[test]
    fn test_amount_is_checked_before_accounts() {
        let (from, _) = sample_account_ids();
        assert_eq!(
            validate_transfer(from, from, 0),
            Err(ValidationError::NonPositiveAmount(0))
        );
    }
}
