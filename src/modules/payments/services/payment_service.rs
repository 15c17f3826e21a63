// PaymentService
//
// Orchestrates the ledger: resolves student + seat + active assignment into a
// payment (opening one on first collection), records installments through the
// repository's locked `apply_change`, and synthesizes receipts.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{info, warn};

use crate::core::{AppError, PageRequest, Result};
use crate::modules::payments::models::{
    generate_receipt_number, BillingPeriod, FeeType, LedgerChange, NewInstallment, NewPayment,
    Payment, PaymentFilter, PaymentMethod, PaymentPage, PaymentProgress, PaymentSearch,
    PaymentSort, PaymentUpdate, Receipt, StatusFilter,
};
use crate::modules::payments::repositories::PaymentRepository;
use crate::modules::properties::models::Property;
use crate::modules::properties::repositories::PropertyRepository;
use crate::modules::seats::models::{Assignment, Seat, Shift};
use crate::modules::seats::repositories::{
    AssignmentRepository, SeatRepository, ShiftRepository,
};
use crate::modules::students::models::Student;
use crate::modules::students::repositories::StudentRepository;

/// Defaults applied when a ledger is opened
#[derive(Debug, Clone, Copy)]
pub struct LedgerSettings {
    pub default_monthly_rent: Decimal,
    pub payment_due_days: i64,
}

impl Default for LedgerSettings {
    fn default() -> Self {
        Self {
            default_monthly_rent: Decimal::from(1600),
            payment_due_days: 30,
        }
    }
}

/// One collection as entered at the desk
#[derive(Debug, Clone)]
pub struct InstallmentCommand {
    pub amount: Decimal,
    pub payment_method: PaymentMethod,
    pub payment_date: Option<DateTime<Utc>>,
    pub description: Option<String>,
    pub notes: Option<String>,
    pub transaction_id: Option<String>,
}

impl InstallmentCommand {
    pub fn new(amount: Decimal, payment_method: PaymentMethod) -> Self {
        Self {
            amount,
            payment_method,
            payment_date: None,
            description: None,
            notes: None,
            transaction_id: None,
        }
    }

    fn into_installment(self, collected_by: &str, now: DateTime<Utc>) -> NewInstallment {
        let mut installment = NewInstallment::new(
            self.amount,
            self.payment_method,
            collected_by,
            generate_receipt_number(now),
        )
        .with_description(self.description)
        .with_transaction_id(self.transaction_id)
        .with_notes(self.notes);

        if let Some(date) = self.payment_date {
            installment = installment.paid_on(date);
        }
        installment
    }
}

/// Collection against a student's seat, identified the way the desk knows it
#[derive(Debug, Clone)]
pub struct CreatePaymentCommand {
    pub student_id: String,
    pub seat_number: String,
    pub installment: InstallmentCommand,
}

/// Outcome of recording an installment
#[derive(Debug, Clone)]
pub struct RecordedPayment {
    pub payment: Payment,
    pub receipt: Receipt,
    pub progress: PaymentProgress,
}

/// A ledger with the records it references; missing references stay `None`
#[derive(Debug, Clone, Serialize)]
pub struct PaymentDetails {
    pub payment: Payment,
    pub student: Option<Student>,
    pub seat: Option<Seat>,
    pub shift: Option<Shift>,
    pub property: Option<Property>,
}

pub struct PaymentService {
    payments: Arc<dyn PaymentRepository>,
    students: Arc<dyn StudentRepository>,
    seats: Arc<dyn SeatRepository>,
    shifts: Arc<dyn ShiftRepository>,
    properties: Arc<dyn PropertyRepository>,
    assignments: Arc<dyn AssignmentRepository>,
    settings: LedgerSettings,
}

impl PaymentService {
    pub fn new(
        payments: Arc<dyn PaymentRepository>,
        students: Arc<dyn StudentRepository>,
        seats: Arc<dyn SeatRepository>,
        shifts: Arc<dyn ShiftRepository>,
        properties: Arc<dyn PropertyRepository>,
        assignments: Arc<dyn AssignmentRepository>,
        settings: LedgerSettings,
    ) -> Self {
        Self {
            payments,
            students,
            seats,
            shifts,
            properties,
            assignments,
            settings,
        }
    }

    async fn require_payment(&self, id: &str) -> Result<Payment> {
        self.payments
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Payment '{}' not found", id)))
    }

    async fn require_student(&self, id: &str) -> Result<Student> {
        self.students
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Student '{}' not found", id)))
    }

    /// Record a collection for a student's seat.
    ///
    /// Opens the assignment's ledger if this is its first collection; the
    /// balance check runs under the ledger's row lock.
    pub async fn create_payment(
        &self,
        command: CreatePaymentCommand,
        collected_by: &str,
    ) -> Result<RecordedPayment> {
        let now = Utc::now();

        let student = self.require_student(&command.student_id).await?;

        let (seat, assignment) = self
            .resolve_assignment(&student, &command.seat_number)
            .await?;

        let property = self
            .properties
            .find_by_id(&seat.property_id)
            .await?
            .ok_or_else(|| {
                AppError::not_found(format!("Property for seat '{}' not found", seat.seat_number))
            })?;

        let candidate = Payment::open(
            NewPayment {
                student_id: student.id.clone(),
                seat_id: seat.id.clone(),
                shift_id: Some(assignment.shift_id.clone()),
                property_id: property.id.clone(),
                assignment_id: assignment.id.clone(),
                total_amount: self.ledger_amount(assignment.monthly_rent),
                due_date: now + Duration::days(self.settings.payment_due_days),
                period: BillingPeriod::monthly_from(assignment.start_date),
                fee_type: FeeType::Monthly,
                description: None,
            },
            now,
        )?;

        let ledger = self.payments.find_or_create(&candidate).await?;
        if ledger.id == candidate.id {
            info!(
                payment_id = ledger.id.as_str(),
                assignment_id = assignment.id.as_str(),
                total_amount = %ledger.total_amount,
                "Payment ledger opened"
            );
        }

        let installment = command.installment.into_installment(collected_by, now);
        let receipt_number = installment.receipt_number.clone();
        let payment = self
            .record(&ledger.id, LedgerChange::AppendInstallment(installment), now)
            .await?;

        let receipt = Self::receipt_for(&payment, &receipt_number, now)?.with_parties(
            Some(student.name),
            Some(seat.seat_number),
            Some(property.name),
        );

        Ok(RecordedPayment {
            progress: payment.progress(),
            payment,
            receipt,
        })
    }

    /// The seat with this number that the student actively holds.
    ///
    /// Seat numbers repeat across properties, so every match is checked for
    /// an active assignment rather than taking the first one.
    async fn resolve_assignment(
        &self,
        student: &Student,
        seat_number: &str,
    ) -> Result<(Seat, Assignment)> {
        let seat_number = seat_number.trim().to_uppercase();
        let seats = self.seats.find_all_by_number(&seat_number).await?;
        if seats.is_empty() {
            return Err(AppError::not_found(format!("Seat '{}' not found", seat_number)));
        }

        for seat in seats {
            if let Some(assignment) = self.assignments.find_active(&student.id, &seat.id).await? {
                return Ok((seat, assignment));
            }
        }

        Err(AppError::not_found(format!(
            "No active assignment for student '{}' on seat {}",
            student.id, seat_number
        )))
    }

    /// Ledger total for an assignment; rows stored without a rent use the default
    fn ledger_amount(&self, monthly_rent: Decimal) -> Decimal {
        if monthly_rent > Decimal::ZERO {
            monthly_rent
        } else {
            self.settings.default_monthly_rent
        }
    }

    /// Record a collection against a known ledger
    pub async fn add_installment(
        &self,
        payment_id: &str,
        command: InstallmentCommand,
        collected_by: &str,
    ) -> Result<RecordedPayment> {
        let now = Utc::now();
        let installment = command.into_installment(collected_by, now);
        let receipt_number = installment.receipt_number.clone();

        let payment = self
            .record(payment_id, LedgerChange::AppendInstallment(installment), now)
            .await?;

        let receipt = self
            .with_parties(Self::receipt_for(&payment, &receipt_number, now)?, &payment)
            .await?;

        Ok(RecordedPayment {
            progress: payment.progress(),
            payment,
            receipt,
        })
    }

    /// Pay off the remaining balance of a ledger nobody has paid into yet
    pub async fn complete_payment(
        &self,
        payment_id: &str,
        payment_method: PaymentMethod,
        collected_by: &str,
    ) -> Result<RecordedPayment> {
        let now = Utc::now();

        // Amount is filled in from the locked ledger
        let mut command = InstallmentCommand::new(Decimal::ZERO, payment_method);
        command.description = Some("Remaining balance".to_string());
        let installment = command.into_installment(collected_by, now);
        let receipt_number = installment.receipt_number.clone();

        let payment = self
            .record(payment_id, LedgerChange::Complete(installment), now)
            .await?;

        let receipt = self
            .with_parties(Self::receipt_for(&payment, &receipt_number, now)?, &payment)
            .await?;

        Ok(RecordedPayment {
            progress: payment.progress(),
            payment,
            receipt,
        })
    }

    /// Edit due date, period, fee type, description or notes of an open ledger
    pub async fn update_payment(&self, payment_id: &str, update: PaymentUpdate) -> Result<Payment> {
        self.record(payment_id, LedgerChange::UpdateDetails(update), Utc::now())
            .await
    }

    pub async fn refund_payment(
        &self,
        payment_id: &str,
        reason: String,
        refunded_by: &str,
    ) -> Result<Payment> {
        let payment = self
            .record(
                payment_id,
                LedgerChange::Refund {
                    reason,
                    refunded_by: refunded_by.to_string(),
                },
                Utc::now(),
            )
            .await?;

        warn!(
            payment_id = payment.id.as_str(),
            amount = %payment.total_collected,
            refunded_by,
            "Payment refunded"
        );

        Ok(payment)
    }

    /// A ledger with its student, seat, shift and property
    pub async fn get_payment(&self, payment_id: &str) -> Result<PaymentDetails> {
        let payment = self.require_payment(payment_id).await?;

        let student = self.students.find_by_id(&payment.student_id).await?;
        let seat = self.seats.find_by_id(&payment.seat_id).await?;
        let shift = match payment.shift_id.as_deref() {
            Some(shift_id) => self.shifts.find_by_id(shift_id).await?,
            None => None,
        };
        let property = self.properties.find_by_id(&payment.property_id).await?;

        Ok(PaymentDetails {
            payment,
            student,
            seat,
            shift,
            property,
        })
    }

    /// Filtered, sorted page of ledgers with a summary over the whole filter.
    /// `search` matches student name/email/phone or an installment's transaction id.
    pub async fn list_payments(
        &self,
        mut filter: PaymentFilter,
        search: Option<&str>,
        sort: PaymentSort,
        page: PageRequest,
    ) -> Result<PaymentPage> {
        filter.validate()?;

        if let Some(term) = search.map(str::trim).filter(|t| !t.is_empty()) {
            let student_ids = self.students.search_ids(term).await?;
            filter.search = Some(PaymentSearch {
                term: term.to_string(),
                student_ids,
            });
        }

        self.payments.list(&filter, sort, page, Utc::now()).await
    }

    /// Pending or partial ledgers past their due date, oldest due first
    pub async fn overdue_payments(
        &self,
        property_id: Option<String>,
        page: PageRequest,
    ) -> Result<PaymentPage> {
        let filter = PaymentFilter {
            status: Some(StatusFilter::Overdue),
            property_id,
            ..PaymentFilter::default()
        };

        self.payments
            .list(&filter, PaymentSort::due_date_ascending(), page, Utc::now())
            .await
    }

    /// Every ledger of one student, newest first
    pub async fn student_payments(&self, student_id: &str) -> Result<Vec<Payment>> {
        self.require_student(student_id).await?;
        self.payments.find_by_student(student_id).await
    }

    /// Receipt for one installment; the latest one unless a receipt number is given
    pub async fn receipt(&self, payment_id: &str, receipt_number: Option<&str>) -> Result<Receipt> {
        let now = Utc::now();
        let payment = self.require_payment(payment_id).await?;

        let installment = payment.find_installment(receipt_number).ok_or_else(|| {
            match receipt_number {
                Some(number) => AppError::not_found(format!(
                    "Receipt '{}' not found on payment '{}'",
                    number, payment_id
                )),
                None => AppError::not_found(format!(
                    "Payment '{}' has no installments yet",
                    payment_id
                )),
            }
        })?;

        let receipt = Receipt::for_installment(&payment, installment, now);
        self.with_parties(receipt, &payment).await
    }

    async fn record(
        &self,
        payment_id: &str,
        change: LedgerChange,
        now: DateTime<Utc>,
    ) -> Result<Payment> {
        let kind = match &change {
            LedgerChange::AppendInstallment(_) => "installment",
            LedgerChange::Complete(_) => "complete",
            LedgerChange::UpdateDetails(_) => "update",
            LedgerChange::Refund { .. } => "refund",
        };

        let payment = self.payments.apply_change(payment_id, change, now).await?;

        info!(
            payment_id = payment.id.as_str(),
            change = kind,
            total_collected = %payment.total_collected,
            balance = %payment.balance_amount,
            status = %payment.status,
            "Payment ledger updated"
        );

        Ok(payment)
    }

    fn receipt_for(payment: &Payment, receipt_number: &str, now: DateTime<Utc>) -> Result<Receipt> {
        payment
            .find_installment(Some(receipt_number))
            .map(|installment| Receipt::for_installment(payment, installment, now))
            .ok_or_else(|| AppError::internal("Recorded installment missing from ledger"))
    }

    async fn with_parties(&self, receipt: Receipt, payment: &Payment) -> Result<Receipt> {
        let student = self.students.find_by_id(&payment.student_id).await?;
        let seat = self.seats.find_by_id(&payment.seat_id).await?;
        let property = self.properties.find_by_id(&payment.property_id).await?;

        Ok(receipt.with_parties(
            student.map(|s| s.name),
            seat.map(|s| s.seat_number),
            property.map(|p| p.name),
        ))
    }
}
