//! Physical inventory: seats, the shifts they are let out for, and the
//! assignments that bind a student to a seat and shift.

pub mod controllers;
pub mod models;
pub mod repositories;
pub mod services;
