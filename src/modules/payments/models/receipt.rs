use chrono::{DateTime, Utc};
use rand::Rng;
use rust_decimal::Decimal;
use serde::Serialize;

use super::installment::Installment;
use super::payment::{Payment, PaymentStatus};
use super::payment_method::UiPaymentMethod;

/// Generate a receipt number: `RCPT-<unix millis>-<4 random digits>`.
/// Uniqueness is backed by the database key on `receipt_number`.
pub fn generate_receipt_number(now: DateTime<Utc>) -> String {
    let suffix: u16 = rand::thread_rng().gen_range(0..10_000);
    format!("RCPT-{}-{:04}", now.timestamp_millis(), suffix)
}

/// Receipt view synthesized from a stored installment; never persisted
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    pub receipt_number: String,
    pub payment_id: String,
    pub installment_number: i32,
    pub amount: Decimal,
    pub payment_method: UiPaymentMethod,
    pub payment_date: DateTime<Utc>,
    pub collected_by: String,
    pub description: Option<String>,
    pub transaction_id: Option<String>,
    pub total_amount: Decimal,
    /// Collected up to and including this installment
    pub total_collected: Decimal,
    /// Balance left right after this installment
    pub balance_amount: Decimal,
    pub status: PaymentStatus,
    pub student_name: Option<String>,
    pub seat_number: Option<String>,
    pub property_name: Option<String>,
    pub issued_at: DateTime<Utc>,
}

impl Receipt {
    pub fn for_installment(payment: &Payment, installment: &Installment, now: DateTime<Utc>) -> Self {
        let collected: Decimal = payment
            .installments
            .iter()
            .filter(|i| i.sequence <= installment.sequence)
            .map(|i| i.amount)
            .sum();

        Self {
            receipt_number: installment.receipt_number.clone(),
            payment_id: payment.id.clone(),
            installment_number: installment.sequence,
            amount: installment.amount,
            payment_method: installment.payment_method.to_ui(),
            payment_date: installment.payment_date,
            collected_by: installment.collected_by.clone(),
            description: installment.description.clone(),
            transaction_id: installment.transaction_id.clone(),
            total_amount: payment.total_amount,
            total_collected: collected,
            balance_amount: payment.total_amount - collected,
            status: payment.effective_status(now),
            student_name: None,
            seat_number: None,
            property_name: None,
            issued_at: now,
        }
    }

    pub fn with_parties(
        mut self,
        student_name: Option<String>,
        seat_number: Option<String>,
        property_name: Option<String>,
    ) -> Self {
        self.student_name = student_name;
        self.seat_number = seat_number;
        self.property_name = property_name;
        self
    }
}
