// PaymentRepository
//
// Ledger rows live in `payments` (with denormalized totals) and
// `payment_installments` (append-only). Every mutation of an existing ledger
// goes through `apply_change`, which locks the payment row, rebuilds the domain
// object, lets it validate and apply the change, and writes the result back
// before committing. Concurrent appends against one ledger therefore serialize
// on the row lock and each sees the balance left by the previous one.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use sqlx::{MySql, MySqlConnection, MySqlPool, QueryBuilder, Transaction};

use crate::core::validators::like_pattern;
use crate::core::{AppError, PageRequest, Result};
use crate::modules::payments::models::{
    BillingPeriod, Installment, LedgerChange, Payment, PaymentFilter, PaymentMethod, PaymentPage,
    PaymentSort, PaymentSummary, RefundInfo, StatusFilter,
};

#[async_trait]
pub trait PaymentRepository: Send + Sync {
    async fn find_by_id(&self, id: &str) -> Result<Option<Payment>>;

    async fn find_by_assignment(&self, assignment_id: &str) -> Result<Option<Payment>>;

    /// All ledgers of one student, newest first
    async fn find_by_student(&self, student_id: &str) -> Result<Vec<Payment>>;

    /// Store `payment` unless a ledger already exists for its assignment;
    /// returns whichever ledger is stored afterwards
    async fn find_or_create(&self, payment: &Payment) -> Result<Payment>;

    /// Apply one change to a stored ledger under its row lock
    async fn apply_change(
        &self,
        id: &str,
        change: LedgerChange,
        now: DateTime<Utc>,
    ) -> Result<Payment>;

    /// One page of ledgers plus the total and summary over the whole filter
    async fn list(
        &self,
        filter: &PaymentFilter,
        sort: PaymentSort,
        page: PageRequest,
        now: DateTime<Utc>,
    ) -> Result<PaymentPage>;
}

pub struct MySqlPaymentRepository {
    pool: MySqlPool,
}

impl MySqlPaymentRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

const PAYMENT_COLUMNS: &str = "p.id, p.student_id, p.seat_id, p.shift_id, p.property_id, \
     p.assignment_id, p.total_amount, p.total_collected, p.balance_amount, p.status, p.fee_type, \
     p.due_date, p.period_start, p.period_end, p.description, p.notes, p.payment_date, \
     p.refund_reason, p.refunded_at, p.refunded_by, p.created_at, p.updated_at";

const INSTALLMENT_COLUMNS: &str = "id, payment_id, sequence, amount, payment_method, payment_date, \
     collected_by, description, receipt_number, transaction_id, notes";

#[derive(sqlx::FromRow)]
struct PaymentRow {
    id: String,
    student_id: String,
    seat_id: String,
    shift_id: Option<String>,
    property_id: String,
    assignment_id: String,
    total_amount: Decimal,
    total_collected: Decimal,
    balance_amount: Decimal,
    status: String,
    fee_type: String,
    due_date: DateTime<Utc>,
    period_start: NaiveDate,
    period_end: NaiveDate,
    description: Option<String>,
    notes: Option<String>,
    payment_date: Option<DateTime<Utc>>,
    refund_reason: Option<String>,
    refunded_at: Option<DateTime<Utc>>,
    refunded_by: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl PaymentRow {
    fn into_payment(self, installments: Vec<Installment>) -> Result<Payment> {
        let refund = match (self.refund_reason, self.refunded_at) {
            (Some(reason), Some(refunded_at)) => Some(RefundInfo {
                reason,
                refunded_at,
                refunded_by: self.refunded_by.unwrap_or_default(),
            }),
            _ => None,
        };

        Ok(Payment {
            id: self.id,
            student_id: self.student_id,
            seat_id: self.seat_id,
            shift_id: self.shift_id,
            property_id: self.property_id,
            assignment_id: self.assignment_id,
            total_amount: self.total_amount,
            installments,
            total_collected: self.total_collected,
            balance_amount: self.balance_amount,
            status: self.status.parse().map_err(AppError::Internal)?,
            fee_type: self.fee_type.parse().map_err(AppError::Internal)?,
            due_date: self.due_date,
            period: BillingPeriod {
                start: self.period_start,
                end: self.period_end,
            },
            description: self.description,
            notes: self.notes,
            payment_date: self.payment_date,
            refund,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct InstallmentRow {
    id: String,
    payment_id: String,
    sequence: i32,
    amount: Decimal,
    payment_method: String,
    payment_date: DateTime<Utc>,
    collected_by: String,
    description: Option<String>,
    receipt_number: String,
    transaction_id: Option<String>,
    notes: Option<String>,
}

impl From<InstallmentRow> for Installment {
    fn from(row: InstallmentRow) -> Self {
        Self {
            id: row.id,
            sequence: row.sequence,
            amount: row.amount,
            payment_method: PaymentMethod::from_storage(&row.payment_method),
            payment_date: row.payment_date,
            collected_by: row.collected_by,
            description: row.description,
            receipt_number: row.receipt_number,
            transaction_id: row.transaction_id,
            notes: row.notes,
        }
    }
}

#[derive(sqlx::FromRow)]
struct SummaryRow {
    payment_count: i64,
    total_amount: Decimal,
    total_collected: Decimal,
    total_pending: Decimal,
    total_balance: Decimal,
}

impl From<SummaryRow> for PaymentSummary {
    fn from(row: SummaryRow) -> Self {
        Self {
            total_amount: row.total_amount,
            total_collected: row.total_collected,
            total_pending: row.total_pending,
            total_balance: row.total_balance,
            payment_count: row.payment_count.max(0) as u64,
        }
    }
}

fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

/// Append the WHERE conditions for `filter` (the query must already contain `WHERE 1 = 1`)
fn push_filter(builder: &mut QueryBuilder<'_, MySql>, filter: &PaymentFilter, now: DateTime<Utc>) {
    match filter.status {
        Some(StatusFilter::Pending) => {
            builder
                .push(" AND (p.status = 'pending' OR (p.status = 'partial' AND p.due_date < ")
                .push_bind(now)
                .push("))");
        }
        Some(StatusFilter::Partial) => {
            builder.push(" AND p.status = 'partial'");
        }
        Some(StatusFilter::Completed) => {
            builder.push(" AND p.status = 'completed'");
        }
        Some(StatusFilter::Refunded) => {
            builder.push(" AND p.status = 'refunded'");
        }
        Some(StatusFilter::Overdue) => {
            builder
                .push(" AND p.status IN ('pending', 'partial') AND p.due_date < ")
                .push_bind(now);
        }
        None => {}
    }

    if let Some(method) = filter.payment_method {
        builder
            .push(
                " AND EXISTS (SELECT 1 FROM payment_installments mi \
                 WHERE mi.payment_id = p.id AND mi.payment_method = ",
            )
            .push_bind(method.as_str())
            .push(")");
    }

    if let Some(property_id) = &filter.property_id {
        builder.push(" AND p.property_id = ").push_bind(property_id.clone());
    }

    if let Some(student_id) = &filter.student_id {
        builder.push(" AND p.student_id = ").push_bind(student_id.clone());
    }

    if let Some(start) = filter.start_date {
        builder.push(" AND p.created_at >= ").push_bind(start_of_day(start));
    }

    if let Some(next) = filter.end_date.and_then(|end| end.succ_opt()) {
        builder.push(" AND p.created_at < ").push_bind(start_of_day(next));
    }

    if let Some(search) = &filter.search {
        builder
            .push(
                " AND (EXISTS (SELECT 1 FROM payment_installments si \
                 WHERE si.payment_id = p.id AND si.transaction_id LIKE ",
            )
            .push_bind(like_pattern(&search.term))
            .push(")");

        if !search.student_ids.is_empty() {
            builder.push(" OR p.student_id IN (");
            let mut ids = builder.separated(", ");
            for id in &search.student_ids {
                ids.push_bind(id.clone());
            }
            ids.push_unseparated(")");
        }
        builder.push(")");
    }
}

/// Installments for the given ledgers, grouped by payment id in sequence order
async fn load_installments(
    conn: &mut MySqlConnection,
    payment_ids: &[String],
) -> Result<HashMap<String, Vec<Installment>>> {
    let mut grouped: HashMap<String, Vec<Installment>> = HashMap::new();
    if payment_ids.is_empty() {
        return Ok(grouped);
    }

    let mut query = QueryBuilder::<MySql>::new(format!(
        "SELECT {} FROM payment_installments WHERE payment_id IN (",
        INSTALLMENT_COLUMNS
    ));
    let mut ids = query.separated(", ");
    for id in payment_ids {
        ids.push_bind(id.clone());
    }
    ids.push_unseparated(") ORDER BY payment_id ASC, sequence ASC");

    let rows = query
        .build_query_as::<InstallmentRow>()
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to fetch installments: {}", e)))?;

    for row in rows {
        grouped
            .entry(row.payment_id.clone())
            .or_default()
            .push(Installment::from(row));
    }

    Ok(grouped)
}

async fn hydrate(conn: &mut MySqlConnection, rows: Vec<PaymentRow>) -> Result<Vec<Payment>> {
    let ids: Vec<String> = rows.iter().map(|r| r.id.clone()).collect();
    let mut installments = load_installments(conn, &ids).await?;

    rows.into_iter()
        .map(|row| {
            let list = installments.remove(&row.id).unwrap_or_default();
            row.into_payment(list)
        })
        .collect()
}

async fn insert_installment(
    tx: &mut Transaction<'_, MySql>,
    payment_id: &str,
    installment: &Installment,
    now: DateTime<Utc>,
) -> Result<()> {
    sqlx::query(&format!(
        "INSERT INTO payment_installments ({}, created_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        INSTALLMENT_COLUMNS
    ))
    .bind(&installment.id)
    .bind(payment_id)
    .bind(installment.sequence)
    .bind(installment.amount)
    .bind(installment.payment_method.as_str())
    .bind(installment.payment_date)
    .bind(&installment.collected_by)
    .bind(&installment.description)
    .bind(&installment.receipt_number)
    .bind(&installment.transaction_id)
    .bind(&installment.notes)
    .bind(now)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

impl MySqlPaymentRepository {
    async fn find_one(&self, column: &'static str, value: &str) -> Result<Option<Payment>> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| AppError::Internal(format!("Failed to acquire connection: {}", e)))?;

        let row = sqlx::query_as::<_, PaymentRow>(&format!(
            "SELECT {} FROM payments p WHERE p.{} = ?",
            PAYMENT_COLUMNS, column
        ))
        .bind(value)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to fetch payment: {}", e)))?;

        match row {
            Some(row) => Ok(hydrate(&mut conn, vec![row]).await?.pop()),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl PaymentRepository for MySqlPaymentRepository {
    async fn find_by_id(&self, id: &str) -> Result<Option<Payment>> {
        self.find_one("id", id).await
    }

    async fn find_by_assignment(&self, assignment_id: &str) -> Result<Option<Payment>> {
        self.find_one("assignment_id", assignment_id).await
    }

    async fn find_by_student(&self, student_id: &str) -> Result<Vec<Payment>> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| AppError::Internal(format!("Failed to acquire connection: {}", e)))?;

        let rows = sqlx::query_as::<_, PaymentRow>(&format!(
            "SELECT {} FROM payments p WHERE p.student_id = ? ORDER BY p.created_at DESC",
            PAYMENT_COLUMNS
        ))
        .bind(student_id)
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to fetch payments: {}", e)))?;

        hydrate(&mut conn, rows).await
    }

    async fn find_or_create(&self, payment: &Payment) -> Result<Payment> {
        // The unique key on assignment_id turns a concurrent second insert into a no-op
        sqlx::query(
            r#"
            INSERT INTO payments (
                id, student_id, seat_id, shift_id, property_id, assignment_id,
                total_amount, total_collected, balance_amount, status, fee_type,
                due_date, period_start, period_end, description, notes,
                payment_date, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON DUPLICATE KEY UPDATE id = id
            "#,
        )
        .bind(&payment.id)
        .bind(&payment.student_id)
        .bind(&payment.seat_id)
        .bind(&payment.shift_id)
        .bind(&payment.property_id)
        .bind(&payment.assignment_id)
        .bind(payment.total_amount)
        .bind(payment.total_collected)
        .bind(payment.balance_amount)
        .bind(payment.status.as_str())
        .bind(payment.fee_type.as_str())
        .bind(payment.due_date)
        .bind(payment.period.start)
        .bind(payment.period.end)
        .bind(&payment.description)
        .bind(&payment.notes)
        .bind(payment.payment_date)
        .bind(payment.created_at)
        .bind(payment.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to create payment: {}", e)))?;

        self.find_by_assignment(&payment.assignment_id)
            .await?
            .ok_or_else(|| AppError::Internal("Payment was created but not found".to_string()))
    }

    async fn apply_change(
        &self,
        id: &str,
        change: LedgerChange,
        now: DateTime<Utc>,
    ) -> Result<Payment> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::Internal(format!("Failed to start transaction: {}", e)))?;

        let row = sqlx::query_as::<_, PaymentRow>(&format!(
            "SELECT {} FROM payments p WHERE p.id = ? FOR UPDATE",
            PAYMENT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to lock payment: {}", e)))?
        .ok_or_else(|| AppError::not_found(format!("Payment '{}' not found", id)))?;

        let mut payment = hydrate(&mut tx, vec![row])
            .await?
            .pop()
            .ok_or_else(|| AppError::internal("Locked payment could not be loaded"))?;

        // Errors here drop `tx`, which rolls back and releases the lock
        let existing = payment.installments.len();
        payment.apply(change, now)?;

        for installment in &payment.installments[existing..] {
            insert_installment(&mut tx, &payment.id, installment, now).await?;
        }

        sqlx::query(
            r#"
            UPDATE payments
            SET total_collected = ?, balance_amount = ?, status = ?, fee_type = ?,
                due_date = ?, period_start = ?, period_end = ?, description = ?, notes = ?,
                payment_date = ?, refund_reason = ?, refunded_at = ?, refunded_by = ?,
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(payment.total_collected)
        .bind(payment.balance_amount)
        .bind(payment.status.as_str())
        .bind(payment.fee_type.as_str())
        .bind(payment.due_date)
        .bind(payment.period.start)
        .bind(payment.period.end)
        .bind(&payment.description)
        .bind(&payment.notes)
        .bind(payment.payment_date)
        .bind(payment.refund.as_ref().map(|r| r.reason.clone()))
        .bind(payment.refund.as_ref().map(|r| r.refunded_at))
        .bind(payment.refund.as_ref().map(|r| r.refunded_by.clone()))
        .bind(payment.updated_at)
        .bind(&payment.id)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to update payment: {}", e)))?;

        tx.commit()
            .await
            .map_err(|e| AppError::Internal(format!("Failed to commit transaction: {}", e)))?;

        Ok(payment)
    }

    async fn list(
        &self,
        filter: &PaymentFilter,
        sort: PaymentSort,
        page: PageRequest,
        now: DateTime<Utc>,
    ) -> Result<PaymentPage> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| AppError::Internal(format!("Failed to acquire connection: {}", e)))?;

        let mut summary_query = QueryBuilder::<MySql>::new(
            r#"
            SELECT
                COUNT(*) AS payment_count,
                COALESCE(SUM(p.total_amount), 0) AS total_amount,
                COALESCE(SUM(p.total_collected), 0) AS total_collected,
                COALESCE(SUM(CASE WHEN p.status IN ('pending', 'partial')
                    THEN p.balance_amount ELSE 0 END), 0) AS total_pending,
                COALESCE(SUM(p.balance_amount), 0) AS total_balance
            FROM payments p
            WHERE 1 = 1
            "#,
        );
        push_filter(&mut summary_query, filter, now);

        let summary: PaymentSummary = summary_query
            .build_query_as::<SummaryRow>()
            .fetch_one(&mut *conn)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to summarize payments: {}", e)))?
            .into();

        let mut query = QueryBuilder::<MySql>::new(format!(
            "SELECT {} FROM payments p WHERE 1 = 1",
            PAYMENT_COLUMNS
        ));
        push_filter(&mut query, filter, now);
        query
            .push(format!(
                " ORDER BY p.{} {}, p.id {}",
                sort.field.column(),
                sort.order.as_sql(),
                sort.order.as_sql()
            ))
            .push(" LIMIT ")
            .push_bind(i64::from(page.limit))
            .push(" OFFSET ")
            .push_bind(page.offset() as i64);

        let rows = query
            .build_query_as::<PaymentRow>()
            .fetch_all(&mut *conn)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to list payments: {}", e)))?;

        let payments = hydrate(&mut conn, rows).await?;

        Ok(PaymentPage {
            payments,
            total: summary.payment_count,
            summary,
        })
    }
}
