// Pricing module - live price sources for the valuation engine

pub mod gold;
pub mod yahoo;

use anyhow::Result;
use rust_decimal::Decimal;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::debug;

pub use gold::CustodianGoldPrices;
pub use yahoo::YahooEquityPrices;

/// A best-effort source of current unit prices.
///
/// `Ok(None)` means the source has no price for the identifier; `Err` means
/// the lookup itself failed. The valuation engine treats both the same way
/// (fall back to cost basis) but reports them differently.
pub trait PriceSource {
    fn fetch_price(&self, identifier: &str) -> Result<Option<Decimal>>;
}

impl<F> PriceSource for F
where
    F: Fn(&str) -> Option<Decimal>,
{
    fn fetch_price(&self, identifier: &str) -> Result<Option<Decimal>> {
        Ok(self(identifier))
    }
}

/// Source that never has a price (offline runs)
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPrices;

impl PriceSource for NoPrices {
    fn fetch_price(&self, _identifier: &str) -> Result<Option<Decimal>> {
        Ok(None)
    }
}

/// Enforces a minimum interval between successive upstream calls.
///
/// The first call passes immediately; later calls sleep until
/// `min_interval` has elapsed since the previous one started.
#[derive(Debug)]
pub struct RateGate {
    min_interval: Duration,
    last_call: Mutex<Option<Instant>>,
}

impl RateGate {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_call: Mutex::new(None),
        }
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Block until the next call is allowed, then record it
    pub fn wait(&self) {
        // A poisoned lock only means another caller panicked mid-wait
        let mut last_call = self
            .last_call
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if let Some(previous) = *last_call {
            let elapsed = previous.elapsed();
            if elapsed < self.min_interval {
                let remaining = self.min_interval - elapsed;
                debug!("Rate gate sleeping {}ms", remaining.as_millis());
                std::thread::sleep(remaining);
            }
        }

        *last_call = Some(Instant::now());
    }
}
