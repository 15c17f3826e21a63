// Wire shapes for payment endpoints: stored payment methods are shown in the
// dashboard vocabulary and the status is the read-time (overdue-aware) view.

use chrono::{DateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::modules::payments::models::{
    BillingPeriod, FeeType, Installment, Payment, PaymentProgress, PaymentStatus, Receipt,
    RefundInfo, UiPaymentMethod,
};
use crate::modules::payments::services::{PaymentDetails, RecordedPayment};
use crate::modules::properties::models::Property;
use crate::modules::seats::models::{Seat, SeatStatus, Shift};
use crate::modules::students::models::Student;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallmentResponse {
    pub id: String,
    pub installment_number: i32,
    pub amount: Decimal,
    pub payment_method: UiPaymentMethod,
    pub payment_date: DateTime<Utc>,
    pub collected_by: String,
    pub description: Option<String>,
    pub receipt_number: String,
    pub transaction_id: Option<String>,
    pub notes: Option<String>,
}

impl From<Installment> for InstallmentResponse {
    fn from(installment: Installment) -> Self {
        Self {
            id: installment.id,
            installment_number: installment.sequence,
            amount: installment.amount,
            payment_method: installment.payment_method.to_ui(),
            payment_date: installment.payment_date,
            collected_by: installment.collected_by,
            description: installment.description,
            receipt_number: installment.receipt_number,
            transaction_id: installment.transaction_id,
            notes: installment.notes,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentSummary {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    pub phone: String,
}

impl From<Student> for StudentSummary {
    fn from(student: Student) -> Self {
        Self {
            id: student.id,
            name: student.name,
            email: student.email,
            phone: student.phone,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatSummary {
    pub id: String,
    pub seat_number: String,
    pub status: SeatStatus,
}

impl From<Seat> for SeatSummary {
    fn from(seat: Seat) -> Self {
        Self {
            id: seat.id,
            seat_number: seat.seat_number,
            status: seat.status,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftSummary {
    pub id: String,
    pub name: String,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

impl From<Shift> for ShiftSummary {
    fn from(shift: Shift) -> Self {
        Self {
            id: shift.id,
            name: shift.name,
            start_time: shift.start_time,
            end_time: shift.end_time,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertySummary {
    pub id: String,
    pub name: String,
    pub address: String,
}

impl From<Property> for PropertySummary {
    fn from(property: Property) -> Self {
        Self {
            id: property.id,
            name: property.name,
            address: property.address,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentResponse {
    pub id: String,
    pub student_id: String,
    pub seat_id: String,
    pub shift_id: Option<String>,
    pub property_id: String,
    pub assignment_id: String,
    pub total_amount: Decimal,
    pub total_collected: Decimal,
    pub balance_amount: Decimal,
    pub status: PaymentStatus,
    pub is_overdue: bool,
    pub fee_type: FeeType,
    pub due_date: DateTime<Utc>,
    pub period: BillingPeriod,
    pub description: Option<String>,
    pub notes: Option<String>,
    pub payment_date: Option<DateTime<Utc>>,
    /// Method of the latest installment
    pub payment_method: Option<UiPaymentMethod>,
    pub installments: Vec<InstallmentResponse>,
    pub progress: PaymentProgress,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refund: Option<RefundInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student: Option<StudentSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seat: Option<SeatSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shift: Option<ShiftSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub property: Option<PropertySummary>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PaymentResponse {
    pub fn new(payment: Payment, now: DateTime<Utc>) -> Self {
        let status = payment.effective_status(now);
        let progress = payment.progress();
        let payment_method = payment
            .installments
            .last()
            .map(|i| i.payment_method.to_ui());

        Self {
            id: payment.id,
            student_id: payment.student_id,
            seat_id: payment.seat_id,
            shift_id: payment.shift_id,
            property_id: payment.property_id,
            assignment_id: payment.assignment_id,
            total_amount: payment.total_amount,
            total_collected: payment.total_collected,
            balance_amount: payment.balance_amount,
            status,
            is_overdue: status == PaymentStatus::Overdue,
            fee_type: payment.fee_type,
            due_date: payment.due_date,
            period: payment.period,
            description: payment.description,
            notes: payment.notes,
            payment_date: payment.payment_date,
            payment_method,
            installments: payment
                .installments
                .into_iter()
                .map(InstallmentResponse::from)
                .collect(),
            progress,
            refund: payment.refund,
            student: None,
            seat: None,
            shift: None,
            property: None,
            created_at: payment.created_at,
            updated_at: payment.updated_at,
        }
    }

    /// Response with the referenced records populated
    pub fn with_details(details: PaymentDetails, now: DateTime<Utc>) -> Self {
        let mut response = Self::new(details.payment, now);
        response.student = details.student.map(StudentSummary::from);
        response.seat = details.seat.map(SeatSummary::from);
        response.shift = details.shift.map(ShiftSummary::from);
        response.property = details.property.map(PropertySummary::from);
        response
    }

    pub fn list(payments: Vec<Payment>, now: DateTime<Utc>) -> Vec<Self> {
        payments.into_iter().map(|p| Self::new(p, now)).collect()
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordedPaymentResponse {
    pub payment: PaymentResponse,
    pub receipt: Receipt,
    pub progress: PaymentProgress,
}

impl RecordedPaymentResponse {
    pub fn new(recorded: RecordedPayment, now: DateTime<Utc>) -> Self {
        Self {
            payment: PaymentResponse::new(recorded.payment, now),
            receipt: recorded.receipt,
            progress: recorded.progress,
        }
    }
}
