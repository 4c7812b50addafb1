//! BDD step definitions for plantwatch service

pub mod dashboard_steps;
pub mod polling_steps;
pub mod reconcile_steps;
