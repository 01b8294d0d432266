//! Premium / discount classification within a swing range.

use crate::domain::{PriceBand, PriceZone};
use rust_decimal::Decimal;

/// Position of `price` within `range` as a fraction (0 = range low, 1 = range
/// high): above `premium_threshold` is premium, below `discount_threshold` is
/// discount. `None` for a zero-height range.
pub fn classify_price_zone(
    price: Decimal,
    range: PriceBand,
    premium_threshold: Decimal,
    discount_threshold: Decimal,
) -> Option<PriceZone> {
    let height = range.height();
    if height.is_zero() {
        return None;
    }
    let offset = price - range.low;
    let position = offset.checked_div(height).unwrap_or(if offset.is_sign_negative() {
        Decimal::MIN
    } else {
        Decimal::MAX
    });
    Some(if position > premium_threshold {
        PriceZone::Premium
    } else if position < discount_threshold {
        PriceZone::Discount
    } else {
        PriceZone::Equilibrium
    })
}
