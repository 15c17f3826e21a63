//! smlekha: administration backend for a library / study-space seat business.
//!
//! Properties own seats and shifts; students are assigned to a seat for a
//! shift, and each assignment is billed through a payment ledger that
//! accumulates installments until the monthly fee is settled.

pub mod app;
pub mod config;
pub mod core;
pub mod middleware;
pub mod modules;

pub use app::{configure_routes, AppServices, Repositories, API_SCOPE};
