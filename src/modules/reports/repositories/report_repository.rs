use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use sqlx::{MySql, MySqlPool, QueryBuilder};

use crate::core::{AppError, Result};
use crate::modules::payments::models::PaymentMethod;
use crate::modules::reports::models::{
    DailyRevenue, DashboardCounts, MethodBreakdown, OverdueSummary, SeatStatusCount,
    StatusBreakdown,
};

/// Read-only aggregation over ledgers, installments and inventory.
/// Installments of refunded ledgers are not counted as collected money.
#[async_trait]
pub trait ReportRepository: Send + Sync {
    async fn status_breakdown(&self, property_id: Option<&str>) -> Result<Vec<StatusBreakdown>>;

    async fn method_breakdown(&self, property_id: Option<&str>) -> Result<Vec<MethodBreakdown>>;

    /// Pending/partial ledgers whose due date is before `now`
    async fn overdue_summary(
        &self,
        property_id: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<OverdueSummary>;

    async fn dashboard_counts(
        &self,
        property_id: Option<&str>,
        month_start: DateTime<Utc>,
    ) -> Result<DashboardCounts>;

    /// Installment totals per day for `start..=end`
    async fn daily_revenue(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        property_id: Option<&str>,
    ) -> Result<Vec<DailyRevenue>>;
}

pub struct MySqlReportRepository {
    pool: MySqlPool,
}

impl MySqlReportRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct StatusRow {
    status: String,
    payment_count: i64,
    total_amount: Decimal,
    total_collected: Decimal,
    balance_amount: Decimal,
}

#[derive(sqlx::FromRow)]
struct MethodRow {
    payment_method: String,
    installment_count: i64,
    total_amount: Decimal,
}

#[derive(sqlx::FromRow)]
struct OverdueRow {
    payment_count: i64,
    balance_amount: Decimal,
}

#[derive(sqlx::FromRow)]
struct SeatCountRow {
    status: String,
    seat_count: i64,
}

#[derive(sqlx::FromRow)]
struct MoneyRow {
    total_collected: Decimal,
    outstanding_balance: Decimal,
}

#[derive(sqlx::FromRow)]
struct RevenueRow {
    day: NaiveDate,
    installment_count: i64,
    total_amount: Decimal,
}

fn count(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}

fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

fn query_error(what: &str) -> impl FnOnce(sqlx::Error) -> AppError + '_ {
    move |e| AppError::Internal(format!("Failed to aggregate {}: {}", what, e))
}

#[async_trait]
impl ReportRepository for MySqlReportRepository {
    async fn status_breakdown(&self, property_id: Option<&str>) -> Result<Vec<StatusBreakdown>> {
        let mut query = QueryBuilder::<MySql>::new(
            r#"
            SELECT
                status,
                COUNT(*) AS payment_count,
                COALESCE(SUM(total_amount), 0) AS total_amount,
                COALESCE(SUM(total_collected), 0) AS total_collected,
                COALESCE(SUM(balance_amount), 0) AS balance_amount
            FROM payments
            WHERE 1 = 1
            "#,
        );
        if let Some(property_id) = property_id {
            query.push(" AND property_id = ").push_bind(property_id);
        }
        query.push(" GROUP BY status ORDER BY status");

        let rows = query
            .build_query_as::<StatusRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(query_error("payment statuses"))?;

        rows.into_iter()
            .map(|row| {
                Ok(StatusBreakdown {
                    status: row.status.parse().map_err(AppError::Internal)?,
                    payment_count: count(row.payment_count),
                    total_amount: row.total_amount,
                    total_collected: row.total_collected,
                    balance_amount: row.balance_amount,
                })
            })
            .collect()
    }

    async fn method_breakdown(&self, property_id: Option<&str>) -> Result<Vec<MethodBreakdown>> {
        let mut query = QueryBuilder::<MySql>::new(
            r#"
            SELECT
                i.payment_method,
                COUNT(*) AS installment_count,
                COALESCE(SUM(i.amount), 0) AS total_amount
            FROM payment_installments i
            JOIN payments p ON p.id = i.payment_id
            WHERE p.status <> 'refunded'
            "#,
        );
        if let Some(property_id) = property_id {
            query.push(" AND p.property_id = ").push_bind(property_id);
        }
        query.push(" GROUP BY i.payment_method ORDER BY total_amount DESC");

        let rows = query
            .build_query_as::<MethodRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(query_error("payment methods"))?;

        Ok(rows
            .into_iter()
            .map(|row| MethodBreakdown {
                payment_method: PaymentMethod::from_storage(&row.payment_method).to_ui(),
                installment_count: count(row.installment_count),
                total_amount: row.total_amount,
            })
            .collect())
    }

    async fn overdue_summary(
        &self,
        property_id: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<OverdueSummary> {
        let mut query = QueryBuilder::<MySql>::new(
            r#"
            SELECT
                COUNT(*) AS payment_count,
                COALESCE(SUM(balance_amount), 0) AS balance_amount
            FROM payments
            WHERE status IN ('pending', 'partial') AND due_date <
            "#,
        );
        query.push_bind(now);
        if let Some(property_id) = property_id {
            query.push(" AND property_id = ").push_bind(property_id);
        }

        let row = query
            .build_query_as::<OverdueRow>()
            .fetch_one(&self.pool)
            .await
            .map_err(query_error("overdue payments"))?;

        Ok(OverdueSummary {
            payment_count: count(row.payment_count),
            balance_amount: row.balance_amount,
        })
    }

    async fn dashboard_counts(
        &self,
        property_id: Option<&str>,
        month_start: DateTime<Utc>,
    ) -> Result<DashboardCounts> {
        let (total_students, active_students): (i64, i64) = sqlx::query_as(
            r#"
            SELECT
                COUNT(*),
                CAST(COALESCE(SUM(CASE WHEN is_active THEN 1 ELSE 0 END), 0) AS SIGNED)
            FROM students
            "#,
        )
        .fetch_one(&self.pool)
        .await
        .map_err(query_error("students"))?;

        let mut seats_query =
            QueryBuilder::<MySql>::new("SELECT status, COUNT(*) AS seat_count FROM seats WHERE 1 = 1");
        if let Some(property_id) = property_id {
            seats_query.push(" AND property_id = ").push_bind(property_id);
        }
        seats_query.push(" GROUP BY status ORDER BY status");

        let seats_by_status = seats_query
            .build_query_as::<SeatCountRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(query_error("seats"))?
            .into_iter()
            .map(|row| {
                Ok(SeatStatusCount {
                    status: row.status.parse().map_err(AppError::Internal)?,
                    count: count(row.seat_count),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let mut assignments_query = QueryBuilder::<MySql>::new(
            "SELECT COUNT(*) FROM assignments a JOIN seats s ON s.id = a.seat_id \
             WHERE a.status = 'active'",
        );
        if let Some(property_id) = property_id {
            assignments_query.push(" AND s.property_id = ").push_bind(property_id);
        }
        let active_assignments: i64 = assignments_query
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
            .map_err(query_error("assignments"))?;

        let mut money_query = QueryBuilder::<MySql>::new(
            r#"
            SELECT
                COALESCE(SUM(total_collected), 0) AS total_collected,
                COALESCE(SUM(CASE WHEN status IN ('pending', 'partial')
                    THEN balance_amount ELSE 0 END), 0) AS outstanding_balance
            FROM payments
            WHERE status <> 'refunded'
            "#,
        );
        if let Some(property_id) = property_id {
            money_query.push(" AND property_id = ").push_bind(property_id);
        }
        let money = money_query
            .build_query_as::<MoneyRow>()
            .fetch_one(&self.pool)
            .await
            .map_err(query_error("collections"))?;

        let mut month_query = QueryBuilder::<MySql>::new(
            "SELECT COALESCE(SUM(i.amount), 0) FROM payment_installments i \
             JOIN payments p ON p.id = i.payment_id \
             WHERE p.status <> 'refunded' AND i.payment_date >= ",
        );
        month_query.push_bind(month_start);
        if let Some(property_id) = property_id {
            month_query.push(" AND p.property_id = ").push_bind(property_id);
        }
        let collected_this_month: Decimal = month_query
            .build_query_scalar::<Decimal>()
            .fetch_one(&self.pool)
            .await
            .map_err(query_error("monthly collections"))?;

        Ok(DashboardCounts {
            total_students: count(total_students),
            active_students: count(active_students),
            seats_by_status,
            active_assignments: count(active_assignments),
            total_collected: money.total_collected,
            collected_this_month,
            outstanding_balance: money.outstanding_balance,
        })
    }

    async fn daily_revenue(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        property_id: Option<&str>,
    ) -> Result<Vec<DailyRevenue>> {
        let end_exclusive = end
            .succ_opt()
            .ok_or_else(|| AppError::validation(format!("end_date {} is out of range", end)))?;

        let mut query = QueryBuilder::<MySql>::new(
            r#"
            SELECT
                DATE(i.payment_date) AS day,
                COUNT(*) AS installment_count,
                COALESCE(SUM(i.amount), 0) AS total_amount
            FROM payment_installments i
            JOIN payments p ON p.id = i.payment_id
            WHERE p.status <> 'refunded' AND i.payment_date >=
            "#,
        );
        query
            .push_bind(start_of_day(start))
            .push(" AND i.payment_date < ")
            .push_bind(start_of_day(end_exclusive));
        if let Some(property_id) = property_id {
            query.push(" AND p.property_id = ").push_bind(property_id);
        }
        query.push(" GROUP BY DATE(i.payment_date) ORDER BY day");

        let rows = query
            .build_query_as::<RevenueRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(query_error("revenue"))?;

        Ok(rows
            .into_iter()
            .map(|row| DailyRevenue {
                date: row.day,
                installment_count: count(row.installment_count),
                total_amount: row.total_amount,
            })
            .collect())
    }
}
