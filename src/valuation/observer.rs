// Observability hooks for the valuation engine

use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use super::ClassSummary;
use crate::holdings::AssetClass;

/// Receives notable events while a class is being valued.
///
/// The engine itself never logs; callers inject an observer so the numeric
/// core stays free of global state.
pub trait ValuationObserver {
    fn price_resolved(&self, asset_class: AssetClass, identifier: &str, price: Decimal);

    /// No usable live price; the position is valued at cost basis
    fn price_unavailable(&self, asset_class: AssetClass, identifier: &str, reason: &str);

    fn class_valued(&self, _asset_class: AssetClass, _summary: &ClassSummary) {}
}

/// Forwards engine events to `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl ValuationObserver for TracingObserver {
    fn price_resolved(&self, asset_class: AssetClass, identifier: &str, price: Decimal) {
        debug!("{} {}: live price {}", asset_class, identifier, price);
    }

    fn price_unavailable(&self, asset_class: AssetClass, identifier: &str, reason: &str) {
        warn!(
            "{} {}: price unavailable ({}), valuing at cost basis",
            asset_class, identifier, reason
        );
    }

    fn class_valued(&self, asset_class: AssetClass, summary: &ClassSummary) {
        info!(
            "{} valued: cost {} value {} gain/loss {}",
            asset_class, summary.total_cost, summary.total_value, summary.total_gain_loss
        );
    }
}

/// Observer that keeps every event in memory
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct RecordingObserver {
    pub resolved: std::cell::RefCell<Vec<(String, Decimal)>>,
    pub unavailable: std::cell::RefCell<Vec<(String, String)>>,
}

#[cfg(test)]
impl ValuationObserver for RecordingObserver {
    fn price_resolved(&self, _asset_class: AssetClass, identifier: &str, price: Decimal) {
        self.resolved
            .borrow_mut()
            .push((identifier.to_string(), price));
    }

    fn price_unavailable(&self, _asset_class: AssetClass, identifier: &str, reason: &str) {
        self.unavailable
            .borrow_mut()
            .push((identifier.to_string(), reason.to_string()));
    }
}
