use std::cmp::Ordering;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use super::payment::{Payment, PaymentStatus};
use super::payment_method::PaymentMethod;
use crate::core::{AppError, Result};

/// Status selector for payment listings.
///
/// `Pending` is what the dashboard shows under "pending": everything still
/// awaiting its first rupee plus partially paid ledgers that slipped past the
/// due date. `Overdue` is the read-time view over pending/partial ledgers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusFilter {
    Pending,
    Partial,
    Completed,
    Refunded,
    Overdue,
}

impl StatusFilter {
    pub fn parse(value: &str) -> Result<Self> {
        let status: PaymentStatus = value.parse().map_err(AppError::validation)?;
        Ok(match status {
            PaymentStatus::Pending => Self::Pending,
            PaymentStatus::Partial => Self::Partial,
            PaymentStatus::Completed => Self::Completed,
            PaymentStatus::Refunded => Self::Refunded,
            PaymentStatus::Overdue => Self::Overdue,
        })
    }

    pub fn matches(&self, payment: &Payment, now: DateTime<Utc>) -> bool {
        match self {
            Self::Pending => {
                payment.status == PaymentStatus::Pending
                    || (payment.status == PaymentStatus::Partial && payment.is_overdue_at(now))
            }
            Self::Partial => payment.status == PaymentStatus::Partial,
            Self::Completed => payment.status == PaymentStatus::Completed,
            Self::Refunded => payment.status == PaymentStatus::Refunded,
            Self::Overdue => payment.is_overdue_at(now),
        }
    }
}

/// Free-text search, resolved to the students whose name/email/phone matched
/// plus the raw term for transaction-id matching
#[derive(Debug, Clone, Default)]
pub struct PaymentSearch {
    pub term: String,
    pub student_ids: Vec<String>,
}

impl PaymentSearch {
    pub fn matches(&self, payment: &Payment) -> bool {
        if self.student_ids.iter().any(|id| id == &payment.student_id) {
            return true;
        }

        let term = self.term.to_lowercase();
        payment.installments.iter().any(|i| {
            i.transaction_id
                .as_deref()
                .is_some_and(|t| t.to_lowercase().contains(&term))
        })
    }
}

/// Filters for listing payment ledgers
#[derive(Debug, Clone, Default)]
pub struct PaymentFilter {
    pub status: Option<StatusFilter>,
    /// Matches ledgers holding at least one installment in this channel
    pub payment_method: Option<PaymentMethod>,
    pub property_id: Option<String>,
    pub student_id: Option<String>,
    /// Inclusive bounds on the ledger's creation date
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub search: Option<PaymentSearch>,
}

impl PaymentFilter {
    pub fn validate(&self) -> Result<()> {
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if start > end {
                return Err(AppError::validation(format!(
                    "startDate ({}) must be before or equal to endDate ({})",
                    start, end
                )));
            }
        }
        Ok(())
    }

    pub fn matches(&self, payment: &Payment, now: DateTime<Utc>) -> bool {
        if let Some(status) = &self.status {
            if !status.matches(payment, now) {
                return false;
            }
        }

        if let Some(method) = self.payment_method {
            if !payment.installments.iter().any(|i| i.payment_method == method) {
                return false;
            }
        }

        if let Some(property_id) = &self.property_id {
            if &payment.property_id != property_id {
                return false;
            }
        }

        if let Some(student_id) = &self.student_id {
            if &payment.student_id != student_id {
                return false;
            }
        }

        let created = payment.created_at.date_naive();
        if self.start_date.is_some_and(|start| created < start) {
            return false;
        }
        if self.end_date.is_some_and(|end| created > end) {
            return false;
        }

        if let Some(search) = &self.search {
            if !search.matches(payment) {
                return false;
            }
        }

        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
    #[default]
    CreatedAt,
    DueDate,
    TotalAmount,
    BalanceAmount,
    TotalCollected,
}

impl SortField {
    pub fn parse(value: &str) -> Result<Self> {
        match value.trim() {
            "created_at" | "createdAt" => Ok(Self::CreatedAt),
            "due_date" | "dueDate" => Ok(Self::DueDate),
            "total_amount" | "totalAmount" => Ok(Self::TotalAmount),
            "balance_amount" | "balanceAmount" => Ok(Self::BalanceAmount),
            "total_collected" | "totalCollected" => Ok(Self::TotalCollected),
            other => Err(AppError::validation(format!("Invalid sortBy: {}", other))),
        }
    }

    /// Column name; only ever one of these constants reaches the SQL text
    pub fn column(&self) -> &'static str {
        match self {
            Self::CreatedAt => "created_at",
            Self::DueDate => "due_date",
            Self::TotalAmount => "total_amount",
            Self::BalanceAmount => "balance_amount",
            Self::TotalCollected => "total_collected",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn parse(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            other => Err(AppError::validation(format!("Invalid sortOrder: {}", other))),
        }
    }

    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Listing order, `created_at desc` unless asked otherwise
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PaymentSort {
    pub field: SortField,
    pub order: SortOrder,
}

impl PaymentSort {
    pub fn parse(sort_by: Option<&str>, sort_order: Option<&str>) -> Result<Self> {
        Ok(Self {
            field: sort_by.map(SortField::parse).transpose()?.unwrap_or_default(),
            order: sort_order.map(SortOrder::parse).transpose()?.unwrap_or_default(),
        })
    }

    /// Overdue listings run oldest due date first
    pub fn due_date_ascending() -> Self {
        Self {
            field: SortField::DueDate,
            order: SortOrder::Asc,
        }
    }

    pub fn compare(&self, a: &Payment, b: &Payment) -> Ordering {
        let ordering = match self.field {
            SortField::CreatedAt => a.created_at.cmp(&b.created_at),
            SortField::DueDate => a.due_date.cmp(&b.due_date),
            SortField::TotalAmount => a.total_amount.cmp(&b.total_amount),
            SortField::BalanceAmount => a.balance_amount.cmp(&b.balance_amount),
            SortField::TotalCollected => a.total_collected.cmp(&b.total_collected),
        };

        match self.order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    }
}

/// Aggregate over every ledger matching a filter, not just the current page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSummary {
    pub total_amount: Decimal,
    pub total_collected: Decimal,
    /// Balance still owed on pending/partial ledgers
    pub total_pending: Decimal,
    pub total_balance: Decimal,
    pub payment_count: u64,
}

impl PaymentSummary {
    pub fn from_payments<'a>(payments: impl IntoIterator<Item = &'a Payment>) -> Self {
        payments
            .into_iter()
            .fold(Self::default(), |mut summary, payment| {
                summary.total_amount += payment.total_amount;
                summary.total_collected += payment.total_collected;
                summary.total_balance += payment.balance_amount;
                if matches!(
                    payment.status,
                    PaymentStatus::Pending | PaymentStatus::Partial
                ) {
                    summary.total_pending += payment.balance_amount;
                }
                summary.payment_count += 1;
                summary
            })
    }
}

/// One page of ledgers plus the filter-wide total and summary
#[derive(Debug, Clone)]
pub struct PaymentPage {
    pub payments: Vec<Payment>,
    pub total: u64,
    pub summary: PaymentSummary,
}
