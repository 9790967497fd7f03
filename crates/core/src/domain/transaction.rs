use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CustomerId(pub String);

impl fmt::Display for CustomerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PurchaseId(pub String);

/// One purchase event as read from the input table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub customer_id: CustomerId,
    pub purchase_id: PurchaseId,
    pub amount: Decimal,
    pub purchased_on: NaiveDate,
}

impl Transaction {
    pub fn new(
        customer_id: impl Into<String>,
        purchase_id: impl Into<String>,
        amount: Decimal,
        purchased_on: NaiveDate,
    ) -> Self {
        Self {
            customer_id: CustomerId(customer_id.into()),
            purchase_id: PurchaseId(purchase_id.into()),
            amount,
            purchased_on,
        }
    }
}
