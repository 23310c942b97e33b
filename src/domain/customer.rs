use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ValidationError;

pub type CustomerId = Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    /// Display name, stored trimmed and never empty
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl Customer {
    /// Build a new customer, rejecting blank names.
    pub fn new(name: impl Into<String>) -> Result<Self, ValidationError> {
        let name = name.into();
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptyName);
        }

        Ok(Self {
            id: Uuid::new_v4(),
            name: trimmed.to_string(),
            created_at: Utc::now(),
        })
    }

    pub fn summary(&self) -> CustomerSummary {
        CustomerSummary {
            id: self.id,
            name: self.name.clone(),
        }
    }
}

/// The `{id, name}` shape embedded in account views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerSummary {
    pub id: CustomerId,
    pub name: String,
}
