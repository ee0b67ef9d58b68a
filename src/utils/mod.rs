//! Utility functions for formatting amounts
//!
//! Centralized number formatting so the report, charts and CLI tables show
//! amounts the same way: `,` groups thousands, `.` marks decimals.

use rust_decimal::{Decimal, RoundingStrategy};

/// Sign handling for formatted amounts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sign {
    /// Only negative values carry a sign
    Auto,
    /// Positive values (and zero) get a leading `+`
    Always,
}

/// Core formatting function with full control over output.
///
/// # Examples
/// ```
/// use goldfolio::utils::{format_amount_with, Sign};
/// use rust_decimal_macros::dec;
///
/// assert_eq!(format_amount_with(dec!(16826.258216), 0, Sign::Auto, 0), "16,826");
/// assert_eq!(format_amount_with(dec!(-1234.5), 2, Sign::Always, 12), "   -1,234.50");
/// ```
pub fn format_amount_with(value: Decimal, decimals: u32, sign: Sign, width: usize) -> String {
    let rounded = value.round_dp_with_strategy(decimals, RoundingStrategy::MidpointAwayFromZero);
    let is_negative = rounded < Decimal::ZERO;

    let formatted = format!("{:.*}", decimals as usize, rounded.abs());
    let (integer_part, decimal_part) = match formatted.split_once('.') {
        Some((int, dec)) => (int, Some(dec)),
        None => (formatted.as_str(), None),
    };

    let with_separators: String = integer_part
        .chars()
        .rev()
        .enumerate()
        .flat_map(|(i, c)| {
            if i > 0 && i % 3 == 0 {
                vec![',', c]
            } else {
                vec![c]
            }
        })
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();

    let sign_str = match (is_negative, sign) {
        (true, _) => "-",
        (false, Sign::Always) => "+",
        (false, Sign::Auto) => "",
    };

    let result = match decimal_part {
        Some(dec) => format!("{}{}.{}", sign_str, with_separators, dec),
        None => format!("{}{}", sign_str, with_separators),
    };

    if width > 0 && result.chars().count() < width {
        format!("{:>width$}", result, width = width)
    } else {
        result
    }
}

// ============ Convenience functions ============

/// Whole-lira amount with thousands separators: "16,826"
///
/// # Examples
/// ```
/// use goldfolio::utils::format_amount;
/// use rust_decimal_macros::dec;
///
/// assert_eq!(format_amount(dec!(1234567.49)), "1,234,567");
/// ```
pub fn format_amount(value: Decimal) -> String {
    format_amount_with(value, 0, Sign::Auto, 0)
}

/// Signed whole-lira amount: "+1,200" / "-85"
pub fn format_signed_amount(value: Decimal) -> String {
    format_amount_with(value, 0, Sign::Always, 0)
}

/// Unit price with two decimals: "4,206.56"
pub fn format_price(value: Decimal) -> String {
    format_amount_with(value, 2, Sign::Auto, 0)
}

/// Signed percentage with the given precision: "+20.00"
pub fn format_percent(value: Decimal, decimals: u32) -> String {
    format_amount_with(value, decimals, Sign::Always, 0)
}
