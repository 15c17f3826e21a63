// Application assembly: repositories, services and the route table shared by
// the server binary and the HTTP tests.

use std::sync::Arc;

use actix_web::{web, HttpResponse};
use rust_decimal::Decimal;
use sqlx::MySqlPool;

use crate::middleware::configure_extractors;
use crate::modules::bookings::repositories::{BookingRepository, MySqlBookingRepository};
use crate::modules::bookings::services::BookingService;
use crate::modules::payments::repositories::{MySqlPaymentRepository, PaymentRepository};
use crate::modules::payments::services::{LedgerSettings, PaymentService};
use crate::modules::properties::repositories::{MySqlPropertyRepository, PropertyRepository};
use crate::modules::properties::services::PropertyService;
use crate::modules::reports::{MySqlReportRepository, ReportRepository, ReportService};
use crate::modules::seats::repositories::{
    AssignmentRepository, MySqlAssignmentRepository, MySqlSeatRepository, MySqlShiftRepository,
    SeatRepository, ShiftRepository,
};
use crate::modules::seats::services::SeatService;
use crate::modules::students::repositories::{MySqlStudentRepository, StudentRepository};
use crate::modules::students::services::StudentService;
use crate::modules::{bookings, health, payments, properties, reports, seats, students};

/// Prefix of every authenticated API route
pub const API_SCOPE: &str = "/smlekha";

/// Storage behind the services
#[derive(Clone)]
pub struct Repositories {
    pub properties: Arc<dyn PropertyRepository>,
    pub students: Arc<dyn StudentRepository>,
    pub seats: Arc<dyn SeatRepository>,
    pub shifts: Arc<dyn ShiftRepository>,
    pub assignments: Arc<dyn AssignmentRepository>,
    pub bookings: Arc<dyn BookingRepository>,
    pub payments: Arc<dyn PaymentRepository>,
    pub reports: Arc<dyn ReportRepository>,
}

impl Repositories {
    pub fn mysql(pool: MySqlPool) -> Self {
        Self {
            properties: Arc::new(MySqlPropertyRepository::new(pool.clone())),
            students: Arc::new(MySqlStudentRepository::new(pool.clone())),
            seats: Arc::new(MySqlSeatRepository::new(pool.clone())),
            shifts: Arc::new(MySqlShiftRepository::new(pool.clone())),
            assignments: Arc::new(MySqlAssignmentRepository::new(pool.clone())),
            bookings: Arc::new(MySqlBookingRepository::new(pool.clone())),
            payments: Arc::new(MySqlPaymentRepository::new(pool.clone())),
            reports: Arc::new(MySqlReportRepository::new(pool)),
        }
    }
}

#[derive(Clone)]
pub struct AppServices {
    pub properties: Arc<PropertyService>,
    pub students: Arc<StudentService>,
    pub seats: Arc<SeatService>,
    pub bookings: Arc<BookingService>,
    pub payments: Arc<PaymentService>,
    pub reports: Arc<ReportService>,
}

impl AppServices {
    pub fn new(repos: &Repositories, settings: LedgerSettings) -> Self {
        Self {
            properties: Arc::new(PropertyService::new(repos.properties.clone())),
            students: Arc::new(StudentService::new(
                repos.students.clone(),
                repos.assignments.clone(),
            )),
            seats: Arc::new(SeatService::new(
                repos.seats.clone(),
                repos.shifts.clone(),
                repos.assignments.clone(),
                repos.properties.clone(),
                repos.students.clone(),
                settings.default_monthly_rent,
            )),
            bookings: Arc::new(BookingService::new(
                repos.bookings.clone(),
                repos.seats.clone(),
                repos.students.clone(),
            )),
            payments: Arc::new(PaymentService::new(
                repos.payments.clone(),
                repos.students.clone(),
                repos.seats.clone(),
                repos.shifts.clone(),
                repos.properties.clone(),
                repos.assignments.clone(),
                settings,
            )),
            reports: Arc::new(ReportService::new(repos.reports.clone())),
        }
    }

    /// Register every service as shared app data
    pub fn register(&self, cfg: &mut web::ServiceConfig) {
        cfg.app_data(web::Data::new(self.properties.clone()))
            .app_data(web::Data::new(self.students.clone()))
            .app_data(web::Data::new(self.seats.clone()))
            .app_data(web::Data::new(self.bookings.clone()))
            .app_data(web::Data::new(self.payments.clone()))
            .app_data(web::Data::new(self.reports.clone()));
    }
}

/// Ledger defaults from the configured rent and due period
pub fn ledger_settings(default_monthly_rent: Decimal, payment_due_days: i64) -> LedgerSettings {
    LedgerSettings {
        default_monthly_rent,
        payment_due_days,
    }
}

async fn index() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "service": "smlekha",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running"
    }))
}

/// Probes at the root, everything else under `/smlekha`
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    configure_extractors(cfg);

    cfg.route("/", web::get().to(index));
    health::configure(cfg);

    cfg.service(
        web::scope(API_SCOPE)
            .configure(properties::controllers::configure)
            .configure(students::controllers::configure)
            .configure(seats::controllers::configure)
            .configure(bookings::controllers::configure)
            .configure(payments::controllers::configure)
            .configure(reports::controllers::configure),
    );
}
