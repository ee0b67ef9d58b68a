//! Error handling for goldfolio
//!
//! Typed errors for the valuation core and configuration layer, plus the
//! anyhow-based Result alias used by the plumbing around them.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::holdings::AssetClass;

/// Errors raised by the valuation core.
///
/// Price-source failures are never reported through this type: they are
/// recovered by falling back to cost basis.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValuationError {
    #[error("invalid {asset_class} position '{identifier}': {reason}")]
    InvalidPosition {
        asset_class: AssetClass,
        identifier: String,
        reason: String,
    },

    #[error("portfolio has no positions to value")]
    EmptyPortfolio,

    #[error("amount out of range while totalling {0}")]
    TotalOutOfRange(String),
}

impl ValuationError {
    pub(crate) fn invalid_quantity(
        asset_class: AssetClass,
        identifier: &str,
        quantity: Decimal,
    ) -> Self {
        ValuationError::InvalidPosition {
            asset_class,
            identifier: identifier.to_string(),
            reason: format!("quantity must be positive, got {}", quantity),
        }
    }

    pub(crate) fn invalid_unit_cost(
        asset_class: AssetClass,
        identifier: &str,
        unit_cost: Decimal,
    ) -> Self {
        ValuationError::InvalidPosition {
            asset_class,
            identifier: identifier.to_string(),
            reason: format!("unit cost must not be negative, got {}", unit_cost),
        }
    }

    pub(crate) fn amount_out_of_range(asset_class: AssetClass, identifier: &str) -> Self {
        ValuationError::InvalidPosition {
            asset_class,
            identifier: identifier.to_string(),
            reason: "amount out of range".to_string(),
        }
    }
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    NotFound(String),

    #[error("config parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("config validation error: {0}")]
    Validation(String),

    #[error("io error")]
    Io(#[from] std::io::Error),
}

/// Result type alias for application plumbing
pub type Result<T> = anyhow::Result<T>;

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_invalid_position_message_names_identifier() {
        let err = ValuationError::invalid_quantity(AssetClass::Equity, "AKBNK", dec!(-3));
        let msg = err.to_string();
        assert!(msg.contains("equity"));
        assert!(msg.contains("AKBNK"));
        assert!(msg.contains("-3"));
    }

    #[test]
    fn test_empty_portfolio_message() {
        assert_eq!(
            ValuationError::EmptyPortfolio.to_string(),
            "portfolio has no positions to value"
        );
    }

    #[test]
    fn test_out_of_range_messages() {
        let err = ValuationError::amount_out_of_range(AssetClass::PreciousMetal, "Ziraat");
        assert_eq!(
            err.to_string(),
            "invalid precious-metal position 'Ziraat': amount out of range"
        );
        let err = ValuationError::TotalOutOfRange("portfolio".to_string());
        assert_eq!(err.to_string(), "amount out of range while totalling portfolio");
    }

    #[test]
    fn test_anyhow_context_chains_errors() {
        use anyhow::Context;
        let result: Result<()> = Err(anyhow::Error::new(ValuationError::EmptyPortfolio))
            .context("failed to value portfolio");
        let err = result.unwrap_err();
        assert!(err.to_string().contains("failed to value portfolio"));
        assert!(format!("{:?}", err).contains("no positions"));
    }

    #[test]
    fn test_config_error_variants() {
        let err = ConfigError::NotFound("/tmp/missing.toml".to_string());
        assert!(err.to_string().starts_with("config file not found"));

        let err = ConfigError::Validation("bad".to_string());
        assert!(err.to_string().starts_with("config validation error"));
    }
}
