use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Cents, CustomerId, CustomerSummary, ValidationError};

pub type AccountId = Uuid;

/// An account row as stored. The balance only changes through transfers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub customer_id: CustomerId,
    pub balance_cents: Cents,
    pub created_at: DateTime<Utc>,
}

impl Account {
    /// Open a new account with the given starting balance.
    pub fn open(customer_id: CustomerId, initial_balance: Cents) -> Result<Self, ValidationError> {
        if initial_balance < 0 {
            return Err(ValidationError::NegativeBalance(initial_balance));
        }

        Ok(Self {
            id: Uuid::new_v4(),
            customer_id,
            balance_cents: initial_balance,
            created_at: Utc::now(),
        })
    }

    pub fn can_cover(&self, amount: Cents) -> bool {
        self.balance_cents >= amount
    }
}

/// Account joined with its owning customer: `{id, balance, customer}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountView {
    pub id: AccountId,
    pub balance_cents: Cents,
    pub customer: CustomerSummary,
}

impl AccountView {
    pub fn new(account: &Account, customer: CustomerSummary) -> Self {
        Self {
            id: account.id,
            balance_cents: account.balance_cents,
            customer,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_with_zero_balance() {
        let account = Account::open(Uuid::new_v4(), 0).unwrap();
        assert_eq!(account.balance_cents, 0);
    }

    #[test]
    fn test_open_rejects_negative_balance() {
        assert_eq!(
            Account::open(Uuid::new_v4(), -1),
            Err(ValidationError::NegativeBalance(-1))
        );
    }

    #[test]
    fn test_can_cover() {
        let account = Account::open(Uuid::new_v4(), 10000).unwrap();
        assert!(account.can_cover(10000));
        assert!(account.can_cover(4000));
        assert!(!account.can_cover(10001));
    }

    #[test]
    fn test_view_embeds_customer() {
        let customer_id = Uuid::new_v4();
        let account = Account::open(customer_id, 500).unwrap();
        let view = AccountView::new(
            &account,
            CustomerSummary {
                id: customer_id,
                name: "Alice".into(),
            },
        );

        assert_eq!(view.id, account.id);
        assert_eq!(view.balance_cents, 500);
        assert_eq!(view.customer.id, customer_id);
    }
}
