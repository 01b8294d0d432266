//! Structural primitives shared by the structure-based detectors and replay:
//! break-of-structure / change-of-character, order blocks, fair-value gaps,
//! liquidity sweeps and premium/discount classification.
//!
//! All functions are pure over a bar slice; indices are relative to that slice.

pub mod fvg;
pub mod liquidity;
pub mod order_block;
pub mod premium_discount;
pub mod structure;

pub use fvg::{find_fair_value_gaps, latest_unfilled};
pub use liquidity::{find_liquidity_sweeps, LiquiditySweep};
pub use order_block::find_order_blocks;
pub use premium_discount::classify_price_zone;
pub use structure::{
    last_swing_range, market_structure, structure_breaks, trend_from_swings, BreakKind,
    StructureBreak,
};
