// Payment ledger
//
// One Payment exists per seat assignment. It fixes the amount owed at creation
// and accumulates installments until the balance reaches zero. The collected
// total, the balance and the status are denormalized for cheap reads, but they
// are always recomputed from `installments` + `total_amount` and never adjusted
// incrementally, so they cannot drift from the installment list.

use chrono::{DateTime, Months, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::installment::{Installment, NewInstallment};
use crate::core::{AppError, Result};

/// Amounts are tracked to the paisa
pub const AMOUNT_SCALE: u32 = 2;

/// Ledger status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Nothing collected yet
    Pending,
    /// Some but not all of the total collected
    Partial,
    /// Balance is zero
    Completed,
    /// Read-time view of pending/partial past the due date; never stored
    Overdue,
    /// Completed ledger whose money was returned
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Partial => "partial",
            Self::Completed => "completed",
            Self::Overdue => "overdue",
            Self::Refunded => "refunded",
        }
    }

    /// Completed and refunded ledgers accept no further ledger or detail changes
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Refunded)
    }

    /// Statuses that still expect money
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Pending | Self::Partial | Self::Overdue)
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "partial" => Ok(Self::Partial),
            "completed" => Ok(Self::Completed),
            "overdue" => Ok(Self::Overdue),
            "refunded" => Ok(Self::Refunded),
            _ => Err(format!("Invalid payment status: {}", s)),
        }
    }
}

impl TryFrom<String> for PaymentStatus {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        value.parse()
    }
}

/// What the obligation is for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeeType {
    #[default]
    Monthly,
    Registration,
    SecurityDeposit,
    Other,
}

impl FeeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Monthly => "monthly",
            Self::Registration => "registration",
            Self::SecurityDeposit => "security_deposit",
            Self::Other => "other",
        }
    }
}

impl std::str::FromStr for FeeType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "monthly" => Ok(Self::Monthly),
            "registration" => Ok(Self::Registration),
            "security_deposit" => Ok(Self::SecurityDeposit),
            "other" => Ok(Self::Other),
            _ => Err(format!("Invalid fee type: {}", s)),
        }
    }
}

/// Billing period covered by the fee (inclusive dates)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingPeriod {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl BillingPeriod {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if end < start {
            return Err(AppError::validation(format!(
                "Period end ({}) must not be before period start ({})",
                end, start
            )));
        }
        Ok(Self { start, end })
    }

    /// One calendar month starting at `start`
    pub fn monthly_from(start: NaiveDate) -> Self {
        let end = start
            .checked_add_months(Months::new(1))
            .and_then(|d| d.pred_opt())
            .unwrap_or(start);
        Self { start, end }
    }
}

/// Refund annotation; the only change a completed ledger accepts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefundInfo {
    pub reason: String,
    pub refunded_at: DateTime<Utc>,
    pub refunded_by: String,
}

/// Read-only progress snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentProgress {
    pub total_amount: Decimal,
    pub total_collected: Decimal,
    pub balance_amount: Decimal,
    pub installments_count: usize,
}

/// Fee obligation for one seat assignment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: String,
    pub student_id: String,
    pub seat_id: String,
    pub shift_id: Option<String>,
    pub property_id: String,
    pub assignment_id: String,
    /// Fixed at creation from the assignment's monthly rent
    pub total_amount: Decimal,
    pub installments: Vec<Installment>,
    pub total_collected: Decimal,
    pub balance_amount: Decimal,
    pub status: PaymentStatus,
    pub fee_type: FeeType,
    pub due_date: DateTime<Utc>,
    pub period: BillingPeriod,
    pub description: Option<String>,
    pub notes: Option<String>,
    /// Set when the ledger reaches completed
    pub payment_date: Option<DateTime<Utc>>,
    pub refund: Option<RefundInfo>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Parameters for opening a new ledger
#[derive(Debug, Clone)]
pub struct NewPayment {
    pub student_id: String,
    pub seat_id: String,
    pub shift_id: Option<String>,
    pub property_id: String,
    pub assignment_id: String,
    pub total_amount: Decimal,
    pub due_date: DateTime<Utc>,
    pub period: BillingPeriod,
    pub fee_type: FeeType,
    pub description: Option<String>,
}

/// Non-ledger fields an operator may edit while the ledger is open
#[derive(Debug, Clone, Default)]
pub struct PaymentUpdate {
    pub due_date: Option<DateTime<Utc>>,
    pub period_start: Option<NaiveDate>,
    pub period_end: Option<NaiveDate>,
    pub fee_type: Option<FeeType>,
    pub description: Option<String>,
    pub notes: Option<String>,
}

impl PaymentUpdate {
    pub fn is_empty(&self) -> bool {
        self.due_date.is_none()
            && self.period_start.is_none()
            && self.period_end.is_none()
            && self.fee_type.is_none()
            && self.description.is_none()
            && self.notes.is_none()
    }
}

/// A single atomic change applied to a stored ledger under its row lock
#[derive(Debug, Clone)]
pub enum LedgerChange {
    AppendInstallment(NewInstallment),
    /// Settle a pending ledger in full; the amount is taken from the locked row
    Complete(NewInstallment),
    UpdateDetails(PaymentUpdate),
    Refund { reason: String, refunded_by: String },
}

/// Validate that an amount is positive and has at most two decimal places
pub fn validate_amount(amount: Decimal, field: &str) -> Result<()> {
    if amount <= Decimal::ZERO {
        return Err(AppError::validation(format!(
            "{} must be greater than 0, got {}",
            field, amount
        )));
    }

    if amount.round_dp(AMOUNT_SCALE) != amount {
        return Err(AppError::validation(format!(
            "{} must have at most {} decimal places, got {}",
            field, AMOUNT_SCALE, amount
        )));
    }

    Ok(())
}

impl Payment {
    /// Open an empty ledger
    pub fn open(new: NewPayment, now: DateTime<Utc>) -> Result<Self> {
        validate_amount(new.total_amount, "Total amount")?;

        Ok(Self {
            id: Uuid::new_v4().to_string(),
            student_id: new.student_id,
            seat_id: new.seat_id,
            shift_id: new.shift_id,
            property_id: new.property_id,
            assignment_id: new.assignment_id,
            total_amount: new.total_amount,
            installments: Vec::new(),
            total_collected: Decimal::ZERO,
            balance_amount: new.total_amount,
            status: PaymentStatus::Pending,
            fee_type: new.fee_type,
            due_date: new.due_date,
            period: new.period,
            description: new.description,
            notes: None,
            payment_date: None,
            refund: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Status implied by a total and a collected amount
    pub fn derive_status(total_amount: Decimal, total_collected: Decimal) -> PaymentStatus {
        if total_collected <= Decimal::ZERO {
            PaymentStatus::Pending
        } else if total_collected >= total_amount {
            PaymentStatus::Completed
        } else {
            PaymentStatus::Partial
        }
    }

    /// Sum of installment amounts
    pub fn collected_from_installments(&self) -> Decimal {
        self.installments.iter().map(|i| i.amount).sum()
    }

    /// Re-derive collected, balance and status from the installment list.
    /// Refunded is sticky; everything else follows the installments.
    pub fn recompute(&mut self) {
        self.total_collected = self.collected_from_installments();
        self.balance_amount = self.total_amount - self.total_collected;

        if self.status != PaymentStatus::Refunded {
            self.status = Self::derive_status(self.total_amount, self.total_collected);
        }
    }

    /// Remaining amount computed from the installments, independent of the stored fields
    pub fn remaining_balance(&self) -> Decimal {
        self.total_amount - self.collected_from_installments()
    }

    /// Append an installment after validating it against the remaining balance
    pub fn add_installment(
        &mut self,
        new: NewInstallment,
        now: DateTime<Utc>,
    ) -> Result<&Installment> {
        validate_amount(new.amount, "Installment amount")?;

        if self.status == PaymentStatus::Refunded {
            return Err(AppError::validation(
                "Cannot add an installment to a refunded payment",
            ));
        }

        if new.collected_by.trim().is_empty() {
            return Err(AppError::validation("collectedBy is required"));
        }

        let collected = self.collected_from_installments();
        let balance = self.total_amount - collected;
        if collected + new.amount > self.total_amount {
            return Err(AppError::validation(format!(
                "Amount {} exceeds remaining balance of {} (total {}, already collected {})",
                new.amount, balance, self.total_amount, collected
            )));
        }

        let payment_date = new.payment_date.unwrap_or(now);
        let sequence = i32::try_from(self.installments.len() + 1)
            .map_err(|_| AppError::internal("Installment count overflow"))?;

        self.installments.push(Installment {
            id: Uuid::new_v4().to_string(),
            sequence,
            amount: new.amount,
            payment_method: new.payment_method,
            payment_date,
            collected_by: new.collected_by,
            description: new.description,
            receipt_number: new.receipt_number,
            transaction_id: new.transaction_id,
            notes: new.notes,
        });

        self.recompute();
        if self.status == PaymentStatus::Completed {
            self.payment_date = Some(payment_date);
        }
        self.updated_at = now;

        self.installments
            .last()
            .ok_or_else(|| AppError::internal("Installment was appended but not found"))
    }

    /// Pay off a ledger nobody has paid into with one installment for the balance
    pub fn complete(
        &mut self,
        mut new: NewInstallment,
        now: DateTime<Utc>,
    ) -> Result<&Installment> {
        if self.status != PaymentStatus::Pending {
            return Err(AppError::validation(format!(
                "Only pending payments can be completed (status: {})",
                self.status
            )));
        }

        new.amount = self.remaining_balance();
        self.add_installment(new, now)
    }

    /// Progress snapshot; pure read
    pub fn progress(&self) -> PaymentProgress {
        PaymentProgress {
            total_amount: self.total_amount,
            total_collected: self.total_collected,
            balance_amount: self.balance_amount,
            installments_count: self.installments.len(),
        }
    }

    /// Whether the ledger still expects money and its due date has passed
    pub fn is_overdue_at(&self, now: DateTime<Utc>) -> bool {
        matches!(self.status, PaymentStatus::Pending | PaymentStatus::Partial)
            && now > self.due_date
    }

    /// Status as shown to readers: overdue replaces pending/partial past due
    pub fn effective_status(&self, now: DateTime<Utc>) -> PaymentStatus {
        if self.is_overdue_at(now) {
            PaymentStatus::Overdue
        } else {
            self.status
        }
    }

    /// Reject edits on completed or refunded ledgers
    pub fn ensure_mutable(&self) -> Result<()> {
        if self.status.is_terminal() {
            return Err(AppError::validation(format!(
                "Payment {} is {} and can no longer be modified",
                self.id, self.status
            )));
        }
        Ok(())
    }

    /// Apply edits to non-ledger fields
    pub fn apply_update(&mut self, update: PaymentUpdate, now: DateTime<Utc>) -> Result<()> {
        self.ensure_mutable()?;

        if update.is_empty() {
            return Err(AppError::validation("No updatable fields were provided"));
        }

        let period = BillingPeriod::new(
            update.period_start.unwrap_or(self.period.start),
            update.period_end.unwrap_or(self.period.end),
        )?;

        if let Some(due_date) = update.due_date {
            self.due_date = due_date;
        }
        if let Some(fee_type) = update.fee_type {
            self.fee_type = fee_type;
        }
        if update.description.is_some() {
            self.description = update.description;
        }
        if update.notes.is_some() {
            self.notes = update.notes;
        }
        self.period = period;
        self.updated_at = now;

        Ok(())
    }

    /// Mark a completed ledger as refunded
    pub fn refund(
        &mut self,
        reason: String,
        refunded_by: String,
        now: DateTime<Utc>,
    ) -> Result<()> {
        if self.status != PaymentStatus::Completed {
            return Err(AppError::validation(format!(
                "Only completed payments can be refunded (status: {})",
                self.status
            )));
        }

        if reason.trim().is_empty() {
            return Err(AppError::validation("Refund reason is required"));
        }

        self.status = PaymentStatus::Refunded;
        self.refund = Some(RefundInfo {
            reason,
            refunded_at: now,
            refunded_by,
        });
        self.updated_at = now;

        Ok(())
    }

    /// Apply one ledger change; the repository calls this while holding the row lock
    pub fn apply(&mut self, change: LedgerChange, now: DateTime<Utc>) -> Result<()> {
        match change {
            LedgerChange::AppendInstallment(new) => {
                self.add_installment(new, now)?;
            }
            LedgerChange::Complete(new) => {
                self.complete(new, now)?;
            }
            LedgerChange::UpdateDetails(update) => self.apply_update(update, now)?,
            LedgerChange::Refund {
                reason,
                refunded_by,
            } => self.refund(reason, refunded_by, now)?,
        }
        Ok(())
    }

    /// Installment by receipt number, or the most recent one
    pub fn find_installment(&self, receipt_number: Option<&str>) -> Option<&Installment> {
        match receipt_number {
            Some(number) => self
                .installments
                .iter()
                .find(|i| i.receipt_number == number),
            None => self.installments.last(),
        }
    }
}
