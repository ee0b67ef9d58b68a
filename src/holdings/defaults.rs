// Compiled-in portfolio used when no configuration file overrides it

use rust_decimal::Decimal;

use super::{Holdings, RawHolding};

/// `(identifier, quantity, unit_cost)`, amounts as `(mantissa, scale)`
type Lot = (&'static str, (i64, u32), (i64, u32));

const GOLD: &[Lot] = &[
    ("Ziraat", (40, 1), (4206564554, 6)),
    ("Yapıkredi", (10, 1), (295777, 2)),
];

const EQUITIES: &[Lot] = &[
    ("AKBNK", (32, 0), (6089, 2)),
    ("BIMAS", (2, 0), (5546, 1)),
    ("TCELL", (20, 0), (8470, 2)),
    ("SASA", (320, 0), (528, 2)),
    ("SISE", (20, 0), (4642, 2)),
    ("DOAS", (4, 0), (26848, 2)),
    ("MAVI", (40, 0), (4706, 2)),
    ("AEFES", (50, 0), (2479, 2)),
    ("AKCNS", (8, 0), (13768, 2)),
    ("TAVHL", (3, 0), (2410, 1)),
];

fn lots(table: &[Lot]) -> Vec<RawHolding> {
    table
        .iter()
        .map(|&(id, (qty, qty_scale), (cost, cost_scale))| {
            RawHolding::new(
                id,
                Decimal::new(qty, qty_scale),
                Decimal::new(cost, cost_scale),
            )
        })
        .collect()
}

/// The default gold and equity holdings
pub fn default_holdings() -> Holdings {
    Holdings {
        precious_metal: lots(GOLD),
        equity: lots(EQUITIES),
    }
}
