//! Fixed-point conversion arithmetic.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::ValidationError;

/// Fractional digits kept by conversion results.
pub const CONVERSION_SCALE: u32 = 20;

/// Multiplies a per-unit value by an amount, truncated to [`CONVERSION_SCALE`]
/// digits with trailing zeros removed.
pub fn multiply(per_unit: Decimal, amount: Decimal) -> Result<Decimal, ValidationError> {
    per_unit
        .checked_mul(amount)
        .map(|product| {
            product
                .round_dp_with_strategy(CONVERSION_SCALE, RoundingStrategy::ToZero)
                .normalize()
        })
        .ok_or(ValidationError::ConversionOverflow)
}

/// Renders a decimal without trailing fractional zeros; whole numbers carry
/// no decimal point.
pub fn format_decimal(value: Decimal) -> String {
    value.normalize().to_string()
}
