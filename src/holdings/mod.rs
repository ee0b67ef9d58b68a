//! Holdings model and normalizer
//!
//! Raw holdings are purchase lots as recorded in the configuration. The
//! normalizer folds lots sharing an identifier into one canonical position
//! whose unit cost is the quantity-weighted mean of the lots.

pub mod defaults;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, info};

use crate::error::ValuationError;

/// Asset classes held in the portfolio
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum AssetClass {
    PreciousMetal, // Physical gold, keyed by custodian bank
    Equity,        // Listed shares, keyed by ticker
}

impl AssetClass {
    pub const ALL: [AssetClass; 2] = [AssetClass::PreciousMetal, AssetClass::Equity];

    pub fn as_str(&self) -> &'static str {
        match self {
            AssetClass::PreciousMetal => "precious-metal",
            AssetClass::Equity => "equity",
        }
    }

    /// Section title used by the report and charts
    pub fn title(&self) -> &'static str {
        match self {
            AssetClass::PreciousMetal => "GOLD",
            AssetClass::Equity => "EQUITY",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AssetClass::PreciousMetal => "Gold",
            AssetClass::Equity => "Equity",
        }
    }

    /// Decimal places shown for quantities of this class
    pub fn quantity_decimals(&self) -> u32 {
        match self {
            AssetClass::PreciousMetal => 1,
            AssetClass::Equity => 0,
        }
    }

    /// Unit a quantity of this class is counted in
    pub fn unit_label(&self) -> &'static str {
        match self {
            AssetClass::PreciousMetal => "gr",
            AssetClass::Equity => "shares",
        }
    }
}

impl fmt::Display for AssetClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single recorded purchase lot
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RawHolding {
    pub identifier: String,
    pub quantity: Decimal,
    pub unit_cost: Decimal,
}

impl RawHolding {
    pub fn new(identifier: impl Into<String>, quantity: Decimal, unit_cost: Decimal) -> Self {
        Self {
            identifier: identifier.into(),
            quantity,
            unit_cost,
        }
    }
}

impl From<&Position> for RawHolding {
    fn from(position: &Position) -> Self {
        RawHolding::new(
            position.identifier.clone(),
            position.quantity,
            position.unit_cost,
        )
    }
}

/// Consolidated holding of one identifier within an asset class
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Position {
    pub identifier: String,
    pub quantity: Decimal,
    pub unit_cost: Decimal,
}

impl Position {
    /// `None` when the product does not fit in a `Decimal`
    pub fn cost_total(&self) -> Option<Decimal> {
        self.quantity.checked_mul(self.unit_cost)
    }
}

/// Raw holdings of the whole portfolio, grouped by asset class
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Holdings {
    #[serde(default)]
    pub precious_metal: Vec<RawHolding>,
    #[serde(default)]
    pub equity: Vec<RawHolding>,
}

impl Holdings {
    pub fn for_class(&self, asset_class: AssetClass) -> &[RawHolding] {
        match asset_class {
            AssetClass::PreciousMetal => &self.precious_metal,
            AssetClass::Equity => &self.equity,
        }
    }

    /// Normalize every class, in `AssetClass::ALL` order
    pub fn normalized(&self) -> Result<Vec<(AssetClass, Vec<Position>)>, ValuationError> {
        AssetClass::ALL
            .iter()
            .map(|&class| -> Result<_, ValuationError> {
                let raw = self.for_class(class);
                let positions = normalize(class, raw)?;
                if positions.len() != raw.len() {
                    info!(
                        "Merged {} {} lots into {} positions",
                        raw.len(),
                        class,
                        positions.len()
                    );
                }
                Ok((class, positions))
            })
            .collect()
    }
}

/// Check the field constraints shared by raw lots and positions
pub(crate) fn validate_lot(
    asset_class: AssetClass,
    identifier: &str,
    quantity: Decimal,
    unit_cost: Decimal,
) -> Result<(), ValuationError> {
    if identifier.trim().is_empty() {
        return Err(ValuationError::InvalidPosition {
            asset_class,
            identifier: identifier.to_string(),
            reason: "identifier must not be empty".to_string(),
        });
    }
    if quantity <= Decimal::ZERO {
        return Err(ValuationError::invalid_quantity(
            asset_class,
            identifier,
            quantity,
        ));
    }
    if unit_cost < Decimal::ZERO {
        return Err(ValuationError::invalid_unit_cost(
            asset_class,
            identifier,
            unit_cost,
        ));
    }
    Ok(())
}

/// Running totals for one identifier while folding lots
struct LotAccumulator {
    identifier: String,
    quantity: Decimal,
    cost_total: Decimal,
    first_unit_cost: Decimal,
    lots: usize,
}

impl LotAccumulator {
    fn new(identifier: String) -> Self {
        Self {
            identifier,
            quantity: Decimal::ZERO,
            cost_total: Decimal::ZERO,
            first_unit_cost: Decimal::ZERO,
            lots: 0,
        }
    }

    /// `None` when a running total overflows
    fn add(&mut self, lot: &RawHolding) -> Option<()> {
        if self.lots == 0 {
            self.first_unit_cost = lot.unit_cost;
        }
        let lot_cost = lot.quantity.checked_mul(lot.unit_cost)?;
        self.quantity = self.quantity.checked_add(lot.quantity)?;
        self.cost_total = self.cost_total.checked_add(lot_cost)?;
        self.lots += 1;
        Some(())
    }

    fn into_position(self) -> Option<Position> {
        // A lone lot keeps its recorded cost untouched
        let unit_cost = if self.lots == 1 {
            self.first_unit_cost
        } else {
            self.cost_total.checked_div(self.quantity)?
        };

        Some(Position {
            identifier: self.identifier,
            quantity: self.quantity,
            unit_cost,
        })
    }
}

/// Fold raw lots into one position per identifier.
///
/// Quantities are summed and the unit cost becomes
/// `sum(quantity * unit_cost) / sum(quantity)`. Output follows the order in
/// which identifiers are first seen. Every lot must have a positive
/// quantity and a non-negative unit cost before it is merged; amounts that
/// do not fit in a `Decimal` are rejected rather than wrapped.
pub fn normalize(
    asset_class: AssetClass,
    raw: &[RawHolding],
) -> Result<Vec<Position>, ValuationError> {
    for lot in raw {
        validate_lot(asset_class, &lot.identifier, lot.quantity, lot.unit_cost)?;
    }

    let mut index: HashMap<String, usize> = HashMap::new();
    let mut accumulators: Vec<LotAccumulator> = Vec::new();

    for lot in raw {
        let key = lot.identifier.trim();
        let slot = match index.get(key) {
            Some(&slot) => slot,
            None => {
                accumulators.push(LotAccumulator::new(key.to_string()));
                index.insert(key.to_string(), accumulators.len() - 1);
                accumulators.len() - 1
            }
        };
        accumulators[slot]
            .add(lot)
            .ok_or_else(|| ValuationError::amount_out_of_range(asset_class, key))?;
    }

    debug!(
        "Normalized {} lots into {} positions",
        raw.len(),
        accumulators.len()
    );

    accumulators
        .into_iter()
        .map(|acc| {
            let identifier = acc.identifier.clone();
            acc.into_position()
                .ok_or_else(|| ValuationError::amount_out_of_range(asset_class, &identifier))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn lot(id: &str, qty: Decimal, cost: Decimal) -> RawHolding {
        RawHolding::new(id, qty, cost)
    }

    fn merge(raw: &[RawHolding]) -> Vec<Position> {
        normalize(AssetClass::Equity, raw).unwrap()
    }

    #[test]
    fn test_weighted_mean_of_duplicates() {
        let positions = merge(&[lot("X", dec!(2), dec!(10)), lot("X", dec!(2), dec!(20))]);

        assert_eq!(positions.len(), 1);
        assert_eq!(positions[0].identifier, "X");
        assert_eq!(positions[0].quantity, dec!(4));
        assert_eq!(positions[0].unit_cost, dec!(15));
    }

    #[test]
    fn test_weighted_mean_uses_quantities_not_arithmetic_mean() {
        // 1 @ 10 and 3 @ 30: arithmetic mean would be 20
        let positions = merge(&[lot("X", dec!(1), dec!(10)), lot("X", dec!(3), dec!(30))]);

        assert_eq!(positions[0].quantity, dec!(4));
        assert_eq!(positions[0].unit_cost, dec!(25));
        assert_eq!(positions[0].cost_total(), Some(dec!(100)));
    }

    #[test]
    fn test_single_holding_passes_through_unchanged() {
        let raw = [lot("Ziraat", dec!(4.0), dec!(4206.564554))];
        let positions = merge(&raw);

        assert_eq!(positions.len(), 1);
        assert_eq!(positions[0].identifier, "Ziraat");
        assert_eq!(positions[0].quantity, dec!(4.0));
        assert_eq!(positions[0].unit_cost, dec!(4206.564554));
    }

    #[test]
    fn test_first_seen_order_is_kept() {
        let raw = [
            lot("SISE", dec!(1), dec!(40)),
            lot("AKBNK", dec!(1), dec!(60)),
            lot("SISE", dec!(1), dec!(50)),
            lot("BIMAS", dec!(1), dec!(500)),
        ];
        let ids: Vec<_> = merge(&raw).into_iter().map(|p| p.identifier).collect();
        assert_eq!(ids, vec!["SISE", "AKBNK", "BIMAS"]);
    }

    #[test]
    fn test_merge_is_order_independent() {
        let forward = [
            lot("A", dec!(2), dec!(10)),
            lot("A", dec!(3), dec!(12)),
            lot("A", dec!(5), dec!(7)),
        ];
        let mut backward = forward.clone();
        backward.reverse();

        let a = merge(&forward);
        let b = merge(&backward);
        assert_eq!(a[0].quantity, b[0].quantity);
        assert_eq!(a[0].unit_cost, b[0].unit_cost);
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let raw = [
            lot("AKBNK", dec!(32), dec!(60.89)),
            lot("SASA", dec!(320), dec!(5.28)),
            lot("AKBNK", dec!(8), dec!(70)),
        ];
        let once = merge(&raw);
        let again_input: Vec<RawHolding> = once.iter().map(RawHolding::from).collect();
        let twice = merge(&again_input);

        assert_eq!(once, twice);
    }

    #[test]
    fn test_identifiers_are_trimmed() {
        let positions = merge(&[lot(" TCELL", dec!(10), dec!(80)), lot("TCELL ", dec!(10), dec!(90))]);
        assert_eq!(positions.len(), 1);
        assert_eq!(positions[0].identifier, "TCELL");
        assert_eq!(positions[0].unit_cost, dec!(85));
    }

    #[test]
    fn test_empty_input() {
        assert!(merge(&[]).is_empty());
    }

    #[test]
    fn test_negative_lot_is_rejected_before_merging() {
        // 10 @ 10 plus -5 @ 10 would otherwise fold into a valid 5 @ 10
        let err = normalize(
            AssetClass::Equity,
            &[lot("X", dec!(10), dec!(10)), lot("X", dec!(-5), dec!(10))],
        )
        .unwrap_err();

        assert_eq!(
            err,
            ValuationError::invalid_quantity(AssetClass::Equity, "X", dec!(-5))
        );
    }

    #[test]
    fn test_zero_quantity_and_negative_cost_lots_are_rejected() {
        let zero = normalize(
            AssetClass::PreciousMetal,
            &[lot("Ziraat", dec!(1), dec!(3000)), lot("Ziraat", dec!(0), dec!(3000))],
        );
        assert!(matches!(zero, Err(ValuationError::InvalidPosition { .. })));

        let negative_cost = normalize(
            AssetClass::Equity,
            &[lot("SISE", dec!(5), dec!(-1)), lot("SISE", dec!(5), dec!(50))],
        );
        assert_eq!(
            negative_cost.unwrap_err(),
            ValuationError::invalid_unit_cost(AssetClass::Equity, "SISE", dec!(-1))
        );
    }

    #[test]
    fn test_overflowing_lot_cost_is_an_error() {
        let err = normalize(
            AssetClass::Equity,
            &[lot("L", dec!(100000000000000000), dec!(1000000000000))],
        )
        .unwrap_err();
        assert_eq!(err, ValuationError::amount_out_of_range(AssetClass::Equity, "L"));
    }

    #[test]
    fn test_overflowing_merged_quantity_is_an_error() {
        let huge = Decimal::MAX;
        let result = normalize(
            AssetClass::Equity,
            &[lot("Q", huge, dec!(0)), lot("Q", huge, dec!(0))],
        );
        assert_eq!(
            result.unwrap_err(),
            ValuationError::amount_out_of_range(AssetClass::Equity, "Q")
        );
    }

    #[test]
    fn test_asset_class_names() {
        assert_eq!(AssetClass::PreciousMetal.as_str(), "precious-metal");
        assert_eq!(AssetClass::Equity.to_string(), "equity");
        assert_eq!(AssetClass::PreciousMetal.unit_label(), "gr");
    }

    #[test]
    fn test_holdings_normalized_covers_every_class() {
        let holdings = Holdings {
            precious_metal: vec![lot("Ziraat", dec!(1), dec!(3000))],
            equity: vec![lot("MAVI", dec!(20), dec!(40)), lot("MAVI", dec!(20), dec!(50))],
        };
        let normalized = holdings.normalized().unwrap();

        assert_eq!(normalized.len(), 2);
        assert_eq!(normalized[0].0, AssetClass::PreciousMetal);
        assert_eq!(normalized[1].0, AssetClass::Equity);
        assert_eq!(normalized[1].1[0].unit_cost, dec!(45));
    }

    #[test]
    fn test_holdings_normalized_reports_invalid_lot() {
        let holdings = Holdings {
            precious_metal: vec![lot("Ziraat", dec!(1), dec!(3000))],
            equity: vec![lot("  ", dec!(1), dec!(10))],
        };
        let err = holdings.normalized().unwrap_err();
        assert!(err.to_string().contains("identifier must not be empty"));
    }
}
