//! Properties: the branches that own seats and shifts

pub mod controllers;
pub mod models;
pub mod repositories;
pub mod services;
