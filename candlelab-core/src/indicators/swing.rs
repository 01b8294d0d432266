//! Swing-high / swing-low detection.
//!
//! A bar is a swing high iff its high is strictly greater than every high in
//! the `left` bars before it and the `right` bars after it (swing low
//! symmetric on lows). A bar with fewer than `right` bars after it cannot be
//! classified yet and is reported as pending. Whether a swing has been broken
//! is always derived from the bars, never stored on the point.

use crate::domain::Bar;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwingKind {
    High,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwingPoint {
    pub index: usize,
    pub kind: SwingKind,
    pub price: Decimal,
}

impl SwingPoint {
    /// First index after the swing whose close trades through its level.
    pub fn broken_at(&self, bars: &[Bar]) -> Option<usize> {
        bars.iter()
            .enumerate()
            .skip(self.index + 1)
            .find(|(_, b)| match self.kind {
                SwingKind::High => b.close > self.price,
                SwingKind::Low => b.close < self.price,
            })
            .map(|(i, _)| i)
    }

    pub fn is_broken(&self, bars: &[Bar]) -> bool {
        self.broken_at(bars).is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwingStatus {
    Confirmed,
    NotSwing,
    /// Not enough bars after `index` to decide.
    Pending,
}

fn level(bar: &Bar, kind: SwingKind) -> Decimal {
    match kind {
        SwingKind::High => bar.high,
        SwingKind::Low => bar.low,
    }
}

fn dominates(candidate: Decimal, other: Decimal, kind: SwingKind) -> bool {
    match kind {
        SwingKind::High => candidate > other,
        SwingKind::Low => candidate < other,
    }
}

/// Classify bar `index` as a swing of `kind`.
pub fn classify_swing(
    bars: &[Bar],
    index: usize,
    kind: SwingKind,
    left: usize,
    right: usize,
) -> SwingStatus {
    if index >= bars.len() || index < left {
        return SwingStatus::NotSwing;
    }
    let value = level(&bars[index], kind);
    let left_ok = bars[index - left..index]
        .iter()
        .all(|b| dominates(value, level(b, kind), kind));
    if !left_ok {
        return SwingStatus::NotSwing;
    }
    let end = (index + right + 1).min(bars.len());
    let right_ok = bars[index + 1..end]
        .iter()
        .all(|b| dominates(value, level(b, kind), kind));
    if !right_ok {
        SwingStatus::NotSwing
    } else if end - index - 1 < right {
        SwingStatus::Pending
    } else {
        SwingStatus::Confirmed
    }
}

/// All confirmed swing points in index order (a high before a low on the same bar).
pub fn swing_points(bars: &[Bar], left: usize, right: usize) -> Vec<SwingPoint> {
    let mut points = Vec::new();
    for index in left..bars.len() {
        for kind in [SwingKind::High, SwingKind::Low] {
            if classify_swing(bars, index, kind, left, right) == SwingStatus::Confirmed {
                points.push(SwingPoint {
                    index,
                    kind,
                    price: level(&bars[index], kind),
                });
            }
        }
    }
    points
}

/// Confirmed swings of one kind, in index order.
pub fn swings_of(points: &[SwingPoint], kind: SwingKind) -> impl Iterator<Item = &SwingPoint> {
    points.iter().filter(move |p| p.kind == kind)
}
