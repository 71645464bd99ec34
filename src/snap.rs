// ===========================================================================
// Coordinate Quantization
// ===========================================================================
//
// Floating-point endpoints that represent the same real-world vertex rarely
// compare equal bit-for-bit. Every graph key therefore goes through a
// deterministic decimal truncation: keep `number_decimals` fractional digits,
// truncated toward zero, sign re-applied to the combined result. Two
// coordinates are the same primal node iff their truncated forms are equal.
//
// Truncation (not rounding) keeps the operation idempotent and
// bit-reproducible across platforms.
// ===========================================================================

use crate::error::SimplifyError;
use geo::Coord;
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;

/// Default number of fractional digits kept when snapping (depthmap-era
/// convention, roughly millimetre precision in projected metres).
pub const DEFAULT_NUMBER_DECIMALS: u32 = 6;

/// Truncate `value` toward zero at `number_decimals` fractional digits.
///
/// Pure and deterministic; the only failure is non-finite input.
pub fn quantize(value: f64, number_decimals: u32) -> Result<Decimal, SimplifyError> {
    let decimal =
        Decimal::from_f64(value).ok_or(SimplifyError::InvalidCoordinate { value })?;
    Ok(decimal.trunc_with_scale(number_decimals))
}

/// A coordinate after quantization. Hash/Eq follow `Decimal`'s normalized
/// equality, so `1.5` and `1.50` key the same primal node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SnappedPoint {
    pub x: Decimal,
    pub y: Decimal,
}

pub fn snap_point(c: Coord, number_decimals: u32) -> Result<SnappedPoint, SimplifyError> {
    Ok(SnappedPoint {
        x: quantize(c.x, number_decimals)?,
        y: quantize(c.y, number_decimals)?,
    })
}
