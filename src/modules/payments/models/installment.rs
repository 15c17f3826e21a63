use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::payment_method::PaymentMethod;

/// One recorded collection against a payment ledger. Never edited or removed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Installment {
    pub id: String,
    /// 1-based position within the ledger
    pub sequence: i32,
    pub amount: Decimal,
    pub payment_method: PaymentMethod,
    pub payment_date: DateTime<Utc>,
    pub collected_by: String,
    pub description: Option<String>,
    pub receipt_number: String,
    /// External reference (UPI ref, cheque number, ...)
    pub transaction_id: Option<String>,
    pub notes: Option<String>,
}

/// Input for appending an installment
#[derive(Debug, Clone)]
pub struct NewInstallment {
    pub amount: Decimal,
    pub payment_method: PaymentMethod,
    /// Defaults to the time of recording
    pub payment_date: Option<DateTime<Utc>>,
    pub collected_by: String,
    pub description: Option<String>,
    pub receipt_number: String,
    pub transaction_id: Option<String>,
    pub notes: Option<String>,
}

impl NewInstallment {
    pub fn new(
        amount: Decimal,
        payment_method: PaymentMethod,
        collected_by: impl Into<String>,
        receipt_number: impl Into<String>,
    ) -> Self {
        Self {
            amount,
            payment_method,
            payment_date: None,
            collected_by: collected_by.into(),
            description: None,
            receipt_number: receipt_number.into(),
            transaction_id: None,
            notes: None,
        }
    }

    pub fn paid_on(mut self, payment_date: DateTime<Utc>) -> Self {
        self.payment_date = Some(payment_date);
        self
    }

    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }

    pub fn with_transaction_id(mut self, transaction_id: Option<String>) -> Self {
        self.transaction_id = transaction_id;
        self
    }

    pub fn with_notes(mut self, notes: Option<String>) -> Self {
        self.notes = notes;
        self
    }
}
