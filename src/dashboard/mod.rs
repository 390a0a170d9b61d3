//! Dashboard module
//!
//! Provides an overview page with summary cards and charts of the records
//! in a chosen period.

mod cards;
mod charts;
mod handlers;

pub use handlers::get_dashboard_page;
