//! Valuation engine
//!
//! Turns canonical positions into valued positions using a best-effort
//! price source, and aggregates them per asset class and across the whole
//! portfolio. A missing live price never fails valuation: the position is
//! valued at its own cost basis and the observer is told why.

pub mod observer;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::ValuationError;
use crate::holdings::{validate_lot, AssetClass, Position};
use crate::pricing::PriceSource;

pub use observer::{TracingObserver, ValuationObserver};

/// Where a valued position's current price came from
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum PriceOrigin {
    Live,
    CostBasis,
}

/// A position valued at its current (or fallback) price
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ValuedPosition {
    pub identifier: String,
    pub quantity: Decimal,
    pub unit_cost: Decimal,
    pub current_price: Decimal,
    pub price_origin: PriceOrigin,
    pub cost_total: Decimal,
    pub value_total: Decimal,
    pub gain_loss: Decimal,
    pub gain_loss_pct: Decimal,
}

impl ValuedPosition {
    /// Value `position` at `current_price`, or `None` when an amount does
    /// not fit in a `Decimal`
    pub fn new(
        position: &Position,
        current_price: Decimal,
        price_origin: PriceOrigin,
    ) -> Option<Self> {
        let cost_total = position.quantity.checked_mul(position.unit_cost)?;
        let value_total = position.quantity.checked_mul(current_price)?;
        let gain_loss = value_total.checked_sub(cost_total)?;

        Some(Self {
            identifier: position.identifier.clone(),
            quantity: position.quantity,
            unit_cost: position.unit_cost,
            current_price,
            price_origin,
            cost_total,
            value_total,
            gain_loss,
            gain_loss_pct: percent_of(gain_loss, cost_total)?,
        })
    }
}

/// Totals for a group of valued positions
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Default)]
pub struct ClassSummary {
    pub total_cost: Decimal,
    pub total_value: Decimal,
    pub total_gain_loss: Decimal,
    pub gain_loss_pct: Decimal,
}

impl ClassSummary {
    fn from_totals(
        total_cost: Decimal,
        total_value: Decimal,
        total_gain_loss: Decimal,
    ) -> Option<Self> {
        Some(Self {
            total_cost,
            total_value,
            total_gain_loss,
            gain_loss_pct: percent_of(total_gain_loss, total_cost)?,
        })
    }

    /// `None` when a total overflows
    pub fn of_positions(positions: &[ValuedPosition]) -> Option<Self> {
        Self::from_totals(
            checked_sum(positions.iter().map(|p| p.cost_total))?,
            checked_sum(positions.iter().map(|p| p.value_total))?,
            checked_sum(positions.iter().map(|p| p.gain_loss))?,
        )
    }
}

/// Valued positions of one asset class with their totals
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ClassValuation {
    pub asset_class: AssetClass,
    pub positions: Vec<ValuedPosition>,
    pub summary: ClassSummary,
}

impl ClassValuation {
    /// Number of positions valued at cost basis because no live price was available
    pub fn fallback_count(&self) -> usize {
        self.positions
            .iter()
            .filter(|p| p.price_origin == PriceOrigin::CostBasis)
            .count()
    }
}

/// A class's totals and its share of the portfolio's current value
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct ClassBreakdown {
    pub asset_class: AssetClass,
    pub summary: ClassSummary,
    pub weight_pct: Decimal,
}

/// Portfolio-wide aggregate
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PortfolioSummary {
    pub classes: Vec<ClassBreakdown>,
    pub total: ClassSummary,
}

impl PortfolioSummary {
    pub fn class(&self, asset_class: AssetClass) -> Option<&ClassBreakdown> {
        self.classes.iter().find(|c| c.asset_class == asset_class)
    }
}

/// `part / whole * 100`, or zero when `whole` is zero
fn percent_of(part: Decimal, whole: Decimal) -> Option<Decimal> {
    if whole.is_zero() {
        Some(Decimal::ZERO)
    } else {
        part.checked_div(whole)?.checked_mul(Decimal::ONE_HUNDRED)
    }
}

fn checked_sum(values: impl IntoIterator<Item = Decimal>) -> Option<Decimal> {
    values
        .into_iter()
        .try_fold(Decimal::ZERO, |acc, v| acc.checked_add(v))
}

/// Resolve the current price of one position, falling back to its cost
fn resolve_price(
    asset_class: AssetClass,
    position: &Position,
    source: &dyn PriceSource,
    observer: &dyn ValuationObserver,
) -> (Decimal, PriceOrigin) {
    let unavailable = match source.fetch_price(&position.identifier) {
        Ok(Some(price)) if price > Decimal::ZERO => {
            observer.price_resolved(asset_class, &position.identifier, price);
            return (price, PriceOrigin::Live);
        }
        Ok(Some(price)) => format!("non-positive price {}", price),
        Ok(None) => "no price available".to_string(),
        Err(e) => format!("{:#}", e),
    };

    observer.price_unavailable(asset_class, &position.identifier, &unavailable);
    (position.unit_cost, PriceOrigin::CostBasis)
}

/// Value the positions of one asset class.
///
/// Every position is validated before any lookup so that invalid input never
/// triggers network calls. The price source is then queried exactly once per
/// position, in order. Amounts too large for a `Decimal` fail the class with
/// `InvalidPosition` instead of panicking.
pub fn valuate(
    asset_class: AssetClass,
    positions: &[Position],
    source: &dyn PriceSource,
    observer: &dyn ValuationObserver,
) -> Result<ClassValuation, ValuationError> {
    for position in positions {
        validate_lot(
            asset_class,
            &position.identifier,
            position.quantity,
            position.unit_cost,
        )?;
    }

    let valued = positions
        .iter()
        .map(|position| {
            let (price, origin) = resolve_price(asset_class, position, source, observer);
            ValuedPosition::new(position, price, origin).ok_or_else(|| {
                ValuationError::amount_out_of_range(asset_class, &position.identifier)
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let summary = ClassSummary::of_positions(&valued)
        .ok_or_else(|| ValuationError::TotalOutOfRange(asset_class.to_string()))?;
    observer.class_valued(asset_class, &summary);

    Ok(ClassValuation {
        asset_class,
        positions: valued,
        summary,
    })
}

/// Aggregate class valuations into the portfolio summary.
///
/// Fails with `EmptyPortfolio` when no class holds a position.
pub fn summarize(classes: &[ClassValuation]) -> Result<PortfolioSummary, ValuationError> {
    if classes.iter().all(|c| c.positions.is_empty()) {
        return Err(ValuationError::EmptyPortfolio);
    }

    let out_of_range = || ValuationError::TotalOutOfRange("portfolio".to_string());
    let total = ClassSummary::from_totals(
        checked_sum(classes.iter().map(|c| c.summary.total_cost)).ok_or_else(out_of_range)?,
        checked_sum(classes.iter().map(|c| c.summary.total_value)).ok_or_else(out_of_range)?,
        checked_sum(classes.iter().map(|c| c.summary.total_gain_loss))
            .ok_or_else(out_of_range)?,
    )
    .ok_or_else(out_of_range)?;

    let breakdown = classes
        .iter()
        .map(|c| {
            Ok(ClassBreakdown {
                asset_class: c.asset_class,
                summary: c.summary,
                weight_pct: percent_of(c.summary.total_value, total.total_value)
                    .ok_or_else(out_of_range)?,
            })
        })
        .collect::<Result<Vec<_>, ValuationError>>()?;

    Ok(PortfolioSummary {
        classes: breakdown,
        total,
    })
}
