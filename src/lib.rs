//! goldfolio - daily gold and equity portfolio report
//!
//! Consolidates recorded holdings, values them at live prices with a cost
//! basis fallback, and renders a plain-text report with optional charts and
//! email delivery.

pub mod app;
pub mod chart;
pub mod cli;
pub mod config;
pub mod error;
pub mod holdings;
pub mod mailer;
pub mod pricing;
pub mod reports;
pub mod utils;
pub mod valuation;
