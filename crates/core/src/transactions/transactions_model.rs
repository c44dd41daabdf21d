//! Transaction domain models.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::{require_field, Result};

/// A ledger entry. `amount` is signed; spending is recorded as positive amounts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    pub owner_id: String,
    pub category_id: Option<String>,
    pub date: NaiveDate,
    pub amount: Decimal,
    pub currency: String,
    pub description: Option<String>,
    /// Minted by storage on every insert and update. Spend event keys use it,
    /// so a re-recorded id or a new edit never collides with an earlier event.
    pub revision: String,
}

impl Transaction {
    pub fn has_category(&self, category_id: &str) -> bool {
        self.category_id.as_deref() == Some(category_id)
    }
}

/// Input model for recording a new transaction
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTransaction {
    pub id: Option<String>,
    pub owner_id: String,
    pub category_id: Option<String>,
    pub date: NaiveDate,
    pub amount: Decimal,
    pub currency: String,
    pub description: Option<String>,
}

impl NewTransaction {
    pub fn validate(&self) -> Result<()> {
        require_field(&self.owner_id, "ownerId")?;
        require_field(&self.currency, "currency")?;
        Ok(())
    }
}

/// Input model for modifying an existing transaction. Every mutable field is
/// replaced; date and category may both move.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionUpdate {
    pub id: String,
    pub category_id: Option<String>,
    pub date: NaiveDate,
    pub amount: Decimal,
    pub currency: String,
    pub description: Option<String>,
}

impl TransactionUpdate {
    pub fn validate(&self) -> Result<()> {
        require_field(&self.id, "id")?;
        require_field(&self.currency, "currency")?;
        Ok(())
    }
}
