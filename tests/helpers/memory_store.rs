// In-memory storage for service and HTTP tests
//
// One `MemoryStore` implements every repository trait over a single mutex, so
// each trait call is atomic the same way the MySQL implementations are under
// their row locks. Ordering and filtering reuse the model-level helpers the
// SQL queries mirror.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use tokio::sync::Mutex;

use smlekha::core::{AppError, PageRequest, Result};
use smlekha::middleware::{ApiKeyRecord, ApiKeyStore};
use smlekha::modules::bookings::models::{Booking, BookingFilter};
use smlekha::modules::bookings::repositories::BookingRepository;
use smlekha::modules::payments::models::{
    LedgerChange, Payment, PaymentFilter, PaymentMethod, PaymentPage, PaymentSort, PaymentStatus,
    PaymentSummary,
};
use smlekha::modules::payments::repositories::PaymentRepository;
use smlekha::modules::properties::models::Property;
use smlekha::modules::properties::repositories::PropertyRepository;
use smlekha::modules::reports::models::{
    DailyRevenue, DashboardCounts, MethodBreakdown, OverdueSummary, SeatStatusCount,
    StatusBreakdown,
};
use smlekha::modules::reports::ReportRepository;
use smlekha::modules::seats::models::{Assignment, Seat, SeatStatus, Shift};
use smlekha::modules::seats::repositories::{
    AssignmentRepository, SeatRepository, ShiftRepository,
};
use smlekha::modules::students::models::Student;
use smlekha::modules::students::repositories::StudentRepository;
use smlekha::Repositories;

#[derive(Default)]
struct State {
    properties: Vec<Property>,
    students: Vec<Student>,
    seats: Vec<Seat>,
    shifts: Vec<Shift>,
    assignments: Vec<Assignment>,
    bookings: Vec<Booking>,
    payments: Vec<Payment>,
    api_keys: Vec<ApiKeyRecord>,
    key_uses: HashMap<String, DateTime<Utc>>,
}

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// The same store behind every repository slot
    pub fn repositories(self: &Arc<Self>) -> Repositories {
        Repositories {
            properties: self.clone(),
            students: self.clone(),
            seats: self.clone(),
            shifts: self.clone(),
            assignments: self.clone(),
            bookings: self.clone(),
            payments: self.clone(),
            reports: self.clone(),
        }
    }

    /// Store a ledger as-is, bypassing the find-or-create path
    pub async fn insert_payment(&self, payment: Payment) {
        self.state.lock().await.payments.push(payment);
    }

    /// Rewrite a stored ledger in place (e.g. to move its due date into the past)
    pub async fn edit_payment(&self, id: &str, edit: impl FnOnce(&mut Payment)) {
        let mut state = self.state.lock().await;
        if let Some(payment) = state.payments.iter_mut().find(|p| p.id == id) {
            edit(payment);
        }
    }

    /// Rewrite a stored assignment in place (e.g. a row imported without rent)
    pub async fn edit_assignment(&self, id: &str, edit: impl FnOnce(&mut Assignment)) {
        let mut state = self.state.lock().await;
        if let Some(assignment) = state.assignments.iter_mut().find(|a| a.id == id) {
            edit(assignment);
        }
    }

    pub async fn insert_api_key(&self, record: ApiKeyRecord) {
        self.state.lock().await.api_keys.push(record);
    }

    pub async fn last_key_use(&self, id: &str) -> Option<DateTime<Utc>> {
        self.state.lock().await.key_uses.get(id).copied()
    }
}

fn page_of<T: Clone>(items: &[T], page: PageRequest) -> Vec<T> {
    items
        .iter()
        .skip(usize::try_from(page.offset()).unwrap_or(usize::MAX))
        .take(page.limit as usize)
        .cloned()
        .collect()
}

fn in_property(payment: &Payment, property_id: Option<&str>) -> bool {
    property_id.is_none_or(|id| payment.property_id == id)
}

#[async_trait]
impl PropertyRepository for MemoryStore {
    async fn create(&self, property: &Property) -> Result<()> {
        self.state.lock().await.properties.push(property.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Property>> {
        let state = self.state.lock().await;
        Ok(state.properties.iter().find(|p| p.id == id).cloned())
    }

    async fn list(&self, active_only: bool) -> Result<Vec<Property>> {
        let state = self.state.lock().await;
        let mut properties: Vec<Property> = state
            .properties
            .iter()
            .filter(|p| !active_only || p.is_active)
            .cloned()
            .collect();
        properties.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(properties)
    }
}

#[async_trait]
impl StudentRepository for MemoryStore {
    async fn create(&self, student: &Student) -> Result<()> {
        let mut state = self.state.lock().await;
        if student.email.is_some()
            && state.students.iter().any(|s| s.email == student.email)
        {
            return Err(AppError::conflict("A student with this email already exists"));
        }
        state.students.push(student.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Student>> {
        let state = self.state.lock().await;
        Ok(state.students.iter().find(|s| s.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Student>> {
        let state = self.state.lock().await;
        Ok(state
            .students
            .iter()
            .find(|s| s.email.as_deref() == Some(email))
            .cloned())
    }

    async fn update(&self, student: &Student) -> Result<()> {
        let mut state = self.state.lock().await;
        let stored = state
            .students
            .iter_mut()
            .find(|s| s.id == student.id)
            .ok_or_else(|| AppError::not_found(format!("Student '{}' not found", student.id)))?;
        *stored = student.clone();
        Ok(())
    }

    async fn list(&self, search: Option<&str>, page: PageRequest) -> Result<(Vec<Student>, u64)> {
        let state = self.state.lock().await;
        let mut students: Vec<Student> = state
            .students
            .iter()
            .filter(|s| search.is_none_or(|term| s.matches_search(term)))
            .cloned()
            .collect();
        students.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));

        let total = students.len() as u64;
        Ok((page_of(&students, page), total))
    }

    async fn search_ids(&self, term: &str) -> Result<Vec<String>> {
        let state = self.state.lock().await;
        Ok(state
            .students
            .iter()
            .filter(|s| s.matches_search(term))
            .map(|s| s.id.clone())
            .collect())
    }
}

#[async_trait]
impl SeatRepository for MemoryStore {
    async fn create(&self, seat: &Seat) -> Result<()> {
        let mut state = self.state.lock().await;
        if state
            .seats
            .iter()
            .any(|s| s.property_id == seat.property_id && s.seat_number == seat.seat_number)
        {
            return Err(AppError::conflict(format!(
                "Seat {} already exists",
                seat.seat_number
            )));
        }
        state.seats.push(seat.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Seat>> {
        let state = self.state.lock().await;
        Ok(state.seats.iter().find(|s| s.id == id).cloned())
    }

    async fn find_all_by_number(&self, seat_number: &str) -> Result<Vec<Seat>> {
        let number = seat_number.trim().to_uppercase();
        let state = self.state.lock().await;
        let mut seats: Vec<Seat> = state
            .seats
            .iter()
            .filter(|s| s.seat_number == number)
            .cloned()
            .collect();
        seats.sort_by(|a, b| a.property_id.cmp(&b.property_id));
        Ok(seats)
    }

    async fn list(&self, property_id: Option<&str>, status: Option<SeatStatus>) -> Result<Vec<Seat>> {
        let state = self.state.lock().await;
        let mut seats: Vec<Seat> = state
            .seats
            .iter()
            .filter(|s| property_id.is_none_or(|id| s.property_id == id))
            .filter(|s| status.is_none_or(|status| s.status == status))
            .cloned()
            .collect();
        seats.sort_by(|a, b| {
            a.property_id
                .cmp(&b.property_id)
                .then_with(|| a.seat_number.cmp(&b.seat_number))
        });
        Ok(seats)
    }

    async fn update(&self, seat: &Seat) -> Result<()> {
        let mut state = self.state.lock().await;
        let stored = state
            .seats
            .iter_mut()
            .find(|s| s.id == seat.id)
            .ok_or_else(|| AppError::not_found(format!("Seat '{}' not found", seat.id)))?;
        *stored = seat.clone();
        Ok(())
    }
}

#[async_trait]
impl ShiftRepository for MemoryStore {
    async fn create(&self, shift: &Shift) -> Result<()> {
        self.state.lock().await.shifts.push(shift.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Shift>> {
        let state = self.state.lock().await;
        Ok(state.shifts.iter().find(|s| s.id == id).cloned())
    }

    async fn list(&self, property_id: Option<&str>) -> Result<Vec<Shift>> {
        let state = self.state.lock().await;
        let mut shifts: Vec<Shift> = state
            .shifts
            .iter()
            .filter(|s| property_id.is_none_or(|id| s.property_id == id))
            .cloned()
            .collect();
        shifts.sort_by(|a, b| a.start_time.cmp(&b.start_time).then_with(|| a.name.cmp(&b.name)));
        Ok(shifts)
    }
}

#[async_trait]
impl AssignmentRepository for MemoryStore {
    async fn find_by_id(&self, id: &str) -> Result<Option<Assignment>> {
        let state = self.state.lock().await;
        Ok(state.assignments.iter().find(|a| a.id == id).cloned())
    }

    async fn find_active(&self, student_id: &str, seat_id: &str) -> Result<Option<Assignment>> {
        let state = self.state.lock().await;
        Ok(state
            .assignments
            .iter()
            .filter(|a| a.student_id == student_id && a.seat_id == seat_id && a.is_active())
            .max_by(|a, b| {
                a.start_date
                    .cmp(&b.start_date)
                    .then_with(|| a.created_at.cmp(&b.created_at))
            })
            .cloned())
    }

    async fn list_for_student(&self, student_id: &str) -> Result<Vec<Assignment>> {
        let state = self.state.lock().await;
        let mut assignments: Vec<Assignment> = state
            .assignments
            .iter()
            .filter(|a| a.student_id == student_id)
            .cloned()
            .collect();
        assignments.sort_by(|a, b| {
            b.start_date
                .cmp(&a.start_date)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });
        Ok(assignments)
    }

    async fn assign(&self, assignment: &Assignment, now: DateTime<Utc>) -> Result<Seat> {
        let mut state = self.state.lock().await;

        let seat_index = state
            .seats
            .iter()
            .position(|s| s.id == assignment.seat_id)
            .ok_or_else(|| {
                AppError::not_found(format!("Seat '{}' not found", assignment.seat_id))
            })?;
        state.seats[seat_index].accepts_assignment()?;

        let taken = state.assignments.iter().any(|a| {
            a.seat_id == assignment.seat_id && a.shift_id == assignment.shift_id && a.is_active()
        });
        if taken {
            return Err(AppError::conflict(format!(
                "Seat {} already has an active assignment for this shift",
                state.seats[seat_index].seat_number
            )));
        }

        state.assignments.push(assignment.clone());
        let seat = &mut state.seats[seat_index];
        seat.occupy(&assignment.student_id, now);
        Ok(seat.clone())
    }

    async fn release(
        &self,
        id: &str,
        end_date: Option<NaiveDate>,
        now: DateTime<Utc>,
    ) -> Result<Assignment> {
        let mut state = self.state.lock().await;

        let index = state
            .assignments
            .iter()
            .position(|a| a.id == id)
            .ok_or_else(|| AppError::not_found(format!("Assignment '{}' not found", id)))?;
        state.assignments[index].release(end_date, now)?;
        let released = state.assignments[index].clone();

        let remaining = state
            .assignments
            .iter()
            .filter(|a| a.seat_id == released.seat_id && a.is_active())
            .max_by(|a, b| a.start_date.cmp(&b.start_date))
            .map(|a| a.student_id.clone());

        if let Some(seat) = state.seats.iter_mut().find(|s| s.id == released.seat_id) {
            match remaining {
                Some(student_id) => seat.occupy(&student_id, now),
                None => seat.vacate(now),
            }
        }

        Ok(released)
    }
}

#[async_trait]
impl BookingRepository for MemoryStore {
    async fn create(&self, booking: &Booking) -> Result<()> {
        let mut state = self.state.lock().await;
        if state.bookings.iter().any(|b| booking.conflicts_with(b)) {
            return Err(AppError::conflict(
                "Seat is already booked for an overlapping period",
            ));
        }
        state.bookings.push(booking.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Booking>> {
        let state = self.state.lock().await;
        Ok(state.bookings.iter().find(|b| b.id == id).cloned())
    }

    async fn list(&self, filter: &BookingFilter, page: PageRequest) -> Result<(Vec<Booking>, u64)> {
        let state = self.state.lock().await;
        let mut bookings: Vec<Booking> = state
            .bookings
            .iter()
            .filter(|b| filter.matches(b))
            .cloned()
            .collect();
        bookings.sort_by(|a, b| {
            b.start_date
                .cmp(&a.start_date)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });

        let total = bookings.len() as u64;
        Ok((page_of(&bookings, page), total))
    }

    async fn update_status(&self, booking: &Booking) -> Result<()> {
        let mut state = self.state.lock().await;
        let stored = state
            .bookings
            .iter_mut()
            .find(|b| b.id == booking.id)
            .ok_or_else(|| AppError::not_found(format!("Booking '{}' not found", booking.id)))?;
        stored.status = booking.status;
        stored.updated_at = booking.updated_at;
        Ok(())
    }
}

#[async_trait]
impl PaymentRepository for MemoryStore {
    async fn find_by_id(&self, id: &str) -> Result<Option<Payment>> {
        let state = self.state.lock().await;
        Ok(state.payments.iter().find(|p| p.id == id).cloned())
    }

    async fn find_by_assignment(&self, assignment_id: &str) -> Result<Option<Payment>> {
        let state = self.state.lock().await;
        Ok(state
            .payments
            .iter()
            .find(|p| p.assignment_id == assignment_id)
            .cloned())
    }

    async fn find_by_student(&self, student_id: &str) -> Result<Vec<Payment>> {
        let state = self.state.lock().await;
        let mut payments: Vec<Payment> = state
            .payments
            .iter()
            .filter(|p| p.student_id == student_id)
            .cloned()
            .collect();
        payments.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(payments)
    }

    async fn find_or_create(&self, payment: &Payment) -> Result<Payment> {
        let mut state = self.state.lock().await;
        if let Some(existing) = state
            .payments
            .iter()
            .find(|p| p.assignment_id == payment.assignment_id)
        {
            return Ok(existing.clone());
        }
        state.payments.push(payment.clone());
        Ok(payment.clone())
    }

    async fn apply_change(
        &self,
        id: &str,
        change: LedgerChange,
        now: DateTime<Utc>,
    ) -> Result<Payment> {
        let mut state = self.state.lock().await;
        let stored = state
            .payments
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| AppError::not_found(format!("Payment '{}' not found", id)))?;

        // Work on a copy so a rejected change leaves the stored ledger untouched
        let mut payment = stored.clone();
        payment.apply(change, now)?;
        *stored = payment.clone();
        Ok(payment)
    }

    async fn list(
        &self,
        filter: &PaymentFilter,
        sort: PaymentSort,
        page: PageRequest,
        now: DateTime<Utc>,
    ) -> Result<PaymentPage> {
        let state = self.state.lock().await;
        let mut matching: Vec<Payment> = state
            .payments
            .iter()
            .filter(|p| filter.matches(p, now))
            .cloned()
            .collect();
        matching.sort_by(|a, b| sort.compare(a, b).then_with(|| a.id.cmp(&b.id)));

        Ok(PaymentPage {
            summary: PaymentSummary::from_payments(&matching),
            total: matching.len() as u64,
            payments: page_of(&matching, page),
        })
    }
}

#[async_trait]
impl ReportRepository for MemoryStore {
    async fn status_breakdown(&self, property_id: Option<&str>) -> Result<Vec<StatusBreakdown>> {
        let state = self.state.lock().await;
        let mut buckets: Vec<StatusBreakdown> = Vec::new();

        for payment in state.payments.iter().filter(|p| in_property(p, property_id)) {
            let index = match buckets.iter().position(|b| b.status == payment.status) {
                Some(index) => index,
                None => {
                    buckets.push(StatusBreakdown {
                        status: payment.status,
                        payment_count: 0,
                        total_amount: Decimal::ZERO,
                        total_collected: Decimal::ZERO,
                        balance_amount: Decimal::ZERO,
                    });
                    buckets.len() - 1
                }
            };
            let bucket = &mut buckets[index];
            bucket.payment_count += 1;
            bucket.total_amount += payment.total_amount;
            bucket.total_collected += payment.total_collected;
            bucket.balance_amount += payment.balance_amount;
        }

        buckets.sort_by(|a, b| a.status.as_str().cmp(b.status.as_str()));
        Ok(buckets)
    }

    async fn method_breakdown(&self, property_id: Option<&str>) -> Result<Vec<MethodBreakdown>> {
        let state = self.state.lock().await;
        let mut totals: Vec<(PaymentMethod, u64, Decimal)> = Vec::new();

        let installments = state
            .payments
            .iter()
            .filter(|p| p.status != PaymentStatus::Refunded && in_property(p, property_id))
            .flat_map(|p| p.installments.iter());

        for installment in installments {
            match totals.iter_mut().find(|(m, _, _)| *m == installment.payment_method) {
                Some((_, count, amount)) => {
                    *count += 1;
                    *amount += installment.amount;
                }
                None => totals.push((installment.payment_method, 1, installment.amount)),
            }
        }

        totals.sort_by(|a, b| b.2.cmp(&a.2));
        Ok(totals
            .into_iter()
            .map(|(method, installment_count, total_amount)| MethodBreakdown {
                payment_method: method.to_ui(),
                installment_count,
                total_amount,
            })
            .collect())
    }

    async fn overdue_summary(
        &self,
        property_id: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<OverdueSummary> {
        let state = self.state.lock().await;
        Ok(state
            .payments
            .iter()
            .filter(|p| in_property(p, property_id) && p.is_overdue_at(now))
            .fold(OverdueSummary::default(), |mut summary, p| {
                summary.payment_count += 1;
                summary.balance_amount += p.balance_amount;
                summary
            }))
    }

    async fn dashboard_counts(
        &self,
        property_id: Option<&str>,
        month_start: DateTime<Utc>,
    ) -> Result<DashboardCounts> {
        let state = self.state.lock().await;

        let mut seats_by_status: Vec<SeatStatusCount> = Vec::new();
        for seat in state
            .seats
            .iter()
            .filter(|s| property_id.is_none_or(|id| s.property_id == id))
        {
            match seats_by_status.iter_mut().find(|c| c.status == seat.status) {
                Some(count) => count.count += 1,
                None => seats_by_status.push(SeatStatusCount {
                    status: seat.status,
                    count: 1,
                }),
            }
        }
        seats_by_status.sort_by(|a, b| a.status.as_str().cmp(b.status.as_str()));

        let active_assignments = state
            .assignments
            .iter()
            .filter(|a| a.is_active())
            .filter(|a| {
                property_id.is_none_or(|id| {
                    state
                        .seats
                        .iter()
                        .any(|s| s.id == a.seat_id && s.property_id == id)
                })
            })
            .count() as u64;

        let live: Vec<&Payment> = state
            .payments
            .iter()
            .filter(|p| p.status != PaymentStatus::Refunded && in_property(p, property_id))
            .collect();

        Ok(DashboardCounts {
            total_students: state.students.len() as u64,
            active_students: state.students.iter().filter(|s| s.is_active).count() as u64,
            seats_by_status,
            active_assignments,
            total_collected: live.iter().map(|p| p.total_collected).sum(),
            collected_this_month: live
                .iter()
                .flat_map(|p| p.installments.iter())
                .filter(|i| i.payment_date >= month_start)
                .map(|i| i.amount)
                .sum(),
            outstanding_balance: live
                .iter()
                .filter(|p| p.status.is_open())
                .map(|p| p.balance_amount)
                .sum(),
        })
    }

    async fn daily_revenue(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        property_id: Option<&str>,
    ) -> Result<Vec<DailyRevenue>> {
        let state = self.state.lock().await;
        let mut days: Vec<DailyRevenue> = Vec::new();

        let installments = state
            .payments
            .iter()
            .filter(|p| p.status != PaymentStatus::Refunded && in_property(p, property_id))
            .flat_map(|p| p.installments.iter())
            .filter(|i| {
                let day = i.payment_date.date_naive();
                day >= start && day <= end
            });

        for installment in installments {
            let date = installment.payment_date.date_naive();
            match days.iter_mut().find(|d| d.date == date) {
                Some(day) => {
                    day.installment_count += 1;
                    day.total_amount += installment.amount;
                }
                None => days.push(DailyRevenue {
                    date,
                    installment_count: 1,
                    total_amount: installment.amount,
                }),
            }
        }

        days.sort_by_key(|d| d.date);
        Ok(days)
    }
}

#[async_trait]
impl ApiKeyStore for MemoryStore {
    async fn find_by_prefix(&self, prefix: &str) -> Result<Option<ApiKeyRecord>> {
        let state = self.state.lock().await;
        Ok(state
            .api_keys
            .iter()
            .find(|k| k.key_prefix == prefix)
            .cloned())
    }

    async fn touch(&self, id: &str, at: DateTime<Utc>) -> Result<()> {
        self.state.lock().await.key_uses.insert(id.to_string(), at);
        Ok(())
    }
}
