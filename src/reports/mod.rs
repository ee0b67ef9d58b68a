// Reports module - plain-text daily portfolio report

pub mod portfolio;

pub use portfolio::{render_error_report, render_report, REPORT_TIMESTAMP_FORMAT};
