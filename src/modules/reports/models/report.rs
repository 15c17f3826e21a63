use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::modules::payments::models::{PaymentStatus, UiPaymentMethod};
use crate::modules::seats::models::SeatStatus;

/// Ledgers grouped by stored status
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusBreakdown {
    pub status: PaymentStatus,
    pub payment_count: u64,
    pub total_amount: Decimal,
    pub total_collected: Decimal,
    pub balance_amount: Decimal,
}

/// Installments grouped by collection channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodBreakdown {
    pub payment_method: UiPaymentMethod,
    pub installment_count: u64,
    pub total_amount: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverdueSummary {
    pub payment_count: u64,
    pub balance_amount: Decimal,
}

/// Payment statistics for the dashboard's payments tab
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentStats {
    pub by_status: Vec<StatusBreakdown>,
    pub by_method: Vec<MethodBreakdown>,
    pub overdue: OverdueSummary,
    pub payment_count: u64,
    pub total_amount: Decimal,
    pub total_collected: Decimal,
    pub total_balance: Decimal,
    /// Collected as a percentage of billed, two decimal places
    pub collection_rate: Decimal,
}

impl PaymentStats {
    pub fn new(
        by_status: Vec<StatusBreakdown>,
        by_method: Vec<MethodBreakdown>,
        overdue: OverdueSummary,
    ) -> Self {
        let payment_count = by_status.iter().map(|b| b.payment_count).sum();
        let total_amount: Decimal = by_status.iter().map(|b| b.total_amount).sum();
        let total_collected: Decimal = by_status.iter().map(|b| b.total_collected).sum();
        let total_balance = by_status.iter().map(|b| b.balance_amount).sum();

        Self {
            collection_rate: percentage(total_collected, total_amount),
            by_status,
            by_method,
            overdue,
            payment_count,
            total_amount,
            total_collected,
            total_balance,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatStatusCount {
    pub status: SeatStatus,
    pub count: u64,
}

/// Raw dashboard counters as read from storage
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DashboardCounts {
    pub total_students: u64,
    pub active_students: u64,
    pub seats_by_status: Vec<SeatStatusCount>,
    pub active_assignments: u64,
    pub total_collected: Decimal,
    pub collected_this_month: Decimal,
    pub outstanding_balance: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_students: u64,
    pub active_students: u64,
    pub total_seats: u64,
    pub seats_by_status: Vec<SeatStatusCount>,
    pub occupancy_rate: Decimal,
    pub active_assignments: u64,
    pub total_collected: Decimal,
    pub collected_this_month: Decimal,
    pub outstanding_balance: Decimal,
    pub overdue_count: u64,
    pub overdue_balance: Decimal,
}

impl DashboardStats {
    pub fn new(counts: DashboardCounts, overdue: OverdueSummary) -> Self {
        let total_seats: u64 = counts.seats_by_status.iter().map(|s| s.count).sum();
        let occupied = counts
            .seats_by_status
            .iter()
            .filter(|s| s.status == SeatStatus::Occupied)
            .map(|s| s.count)
            .sum::<u64>();

        Self {
            total_students: counts.total_students,
            active_students: counts.active_students,
            total_seats,
            occupancy_rate: percentage(Decimal::from(occupied), Decimal::from(total_seats)),
            seats_by_status: counts.seats_by_status,
            active_assignments: counts.active_assignments,
            total_collected: counts.total_collected,
            collected_this_month: counts.collected_this_month,
            outstanding_balance: counts.outstanding_balance,
            overdue_count: overdue.payment_count,
            overdue_balance: overdue.balance_amount,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyRevenue {
    pub date: NaiveDate,
    pub installment_count: u64,
    pub total_amount: Decimal,
}

/// Collections per day over an inclusive date range
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevenueReport {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub property_id: Option<String>,
    pub days: Vec<DailyRevenue>,
    pub installment_count: u64,
    pub total_amount: Decimal,
}

impl RevenueReport {
    pub fn new(
        start_date: NaiveDate,
        end_date: NaiveDate,
        property_id: Option<String>,
        days: Vec<DailyRevenue>,
    ) -> Self {
        Self {
            start_date,
            end_date,
            property_id,
            installment_count: days.iter().map(|d| d.installment_count).sum(),
            total_amount: days.iter().map(|d| d.total_amount).sum(),
            days,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }
}

fn percentage(part: Decimal, whole: Decimal) -> Decimal {
    if whole.is_zero() {
        Decimal::ZERO
    } else {
        (part * Decimal::ONE_HUNDRED / whole).round_dp(2)
    }
}
