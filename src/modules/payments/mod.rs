//! Payment ledger: one fee obligation per seat assignment, settled by
//! append-only installments.

pub mod controllers;
pub mod models;
pub mod repositories;
pub mod services;
