use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

/// Amounts are persisted as integer minor units so that a balance increment is an
/// exact integer addition inside the database. For EUR/USD/INR, 1 unit = 100 minor
/// units, so 50.00 is stored as 5000.
pub type MinorUnits = i64;

/// Number of decimal places kept by the ledger.
pub const AMOUNT_SCALE: u32 = 2;

/// Convert a decimal amount into minor units.
/// Returns `None` if the amount has more than `AMOUNT_SCALE` decimal places or does
/// not fit in an `i64`.
pub fn to_minor_units(amount: Decimal) -> Option<MinorUnits> {
    let scaled = amount.checked_mul(Decimal::from(10_i64.pow(AMOUNT_SCALE)))?;
    if !scaled.fract().is_zero() {
        return None;
    }
    scaled.to_i64()
}

/// Convert stored minor units back into a decimal amount.
/// Example: 5000 -> 50.00, -1234 -> -12.34
pub fn from_minor_units(units: MinorUnits) -> Decimal {
    Decimal::new(units, AMOUNT_SCALE)
}
