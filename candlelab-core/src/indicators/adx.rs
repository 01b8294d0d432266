//! ADX — Average Directional Index (Wilder).
//!
//! 1. +DM / -DM from consecutive bars
//! 2. Wilder-smooth +DM, -DM and TR over `period`
//! 3. +DI = 100 * smoothed(+DM) / smoothed(TR), same for -DI
//! 4. DX = 100 * |+DI - -DI| / (+DI + -DI); bars where +DI + -DI == 0 carry no DX
//! 5. ADX = Wilder-smoothed DX
//!
//! Lookback: 2 * period - 1 (DI defined from `period`, then `period` DX values to seed).

use super::{true_range, wilder_smooth, Indicator};
use crate::domain::Bar;
use rust_decimal::Decimal;

/// Directional readings at one bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirectionalIndex {
    pub plus_di: Decimal,
    pub minus_di: Decimal,
    /// `None` until enough DX values have been smoothed.
    pub adx: Option<Decimal>,
}

#[derive(Debug, Clone)]
pub struct Adx {
    period: usize,
    name: String,
}

impl Adx {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "ADX period must be >= 1");
        Self {
            period,
            name: format!("adx_{period}"),
        }
    }

    /// +DI, -DI and ADX per bar. `None` where the DIs are undefined (warmup,
    /// or a zero smoothed true range).
    pub fn directional(&self, bars: &[Bar]) -> Vec<Option<DirectionalIndex>> {
        let n = bars.len();
        let mut plus_dm = vec![None; n];
        let mut minus_dm = vec![None; n];
        for i in 1..n {
            let up = bars[i].high - bars[i - 1].high;
            let down = bars[i - 1].low - bars[i].low;
            plus_dm[i] = Some(if up > down && up > Decimal::ZERO {
                up
            } else {
                Decimal::ZERO
            });
            minus_dm[i] = Some(if down > up && down > Decimal::ZERO {
                down
            } else {
                Decimal::ZERO
            });
        }

        let tr = wilder_smooth(&true_range(bars), self.period);
        let plus = wilder_smooth(&plus_dm, self.period);
        let minus = wilder_smooth(&minus_dm, self.period);

        let hundred = Decimal::ONE_HUNDRED;
        let dis: Vec<Option<(Decimal, Decimal)>> = (0..n)
            .map(|i| {
                let (tr, p, m) = (tr[i]?, plus[i]?, minus[i]?);
                if tr.is_zero() {
                    return None;
                }
                Some((hundred * p / tr, hundred * m / tr))
            })
            .collect();

        let dx: Vec<Option<Decimal>> = dis
            .iter()
            .map(|v| {
                let (p, m) = (*v)?;
                let sum = p + m;
                if sum.is_zero() {
                    None
                } else {
                    Some(hundred * (p - m).abs() / sum)
                }
            })
            .collect();

        let adx = smooth_skipping(&dx, self.period);

        dis.into_iter()
            .zip(adx)
            .map(|(di, adx)| {
                di.map(|(plus_di, minus_di)| DirectionalIndex {
                    plus_di,
                    minus_di,
                    adx,
                })
            })
            .collect()
    }
}

/// Wilder smoothing that seeds from the first `period` defined values, even
/// when they are not consecutive. Undefined values are skipped.
fn smooth_skipping(values: &[Option<Decimal>], period: usize) -> Vec<Option<Decimal>> {
    let divisor = Decimal::from(period);
    let mut result = vec![None; values.len()];
    let mut seed_sum = Decimal::ZERO;
    let mut seen = 0usize;
    let mut prev: Option<Decimal> = None;
    for (i, v) in values.iter().enumerate() {
        match (prev, v) {
            (Some(p), Some(v)) => prev = Some(p + (*v - p) / divisor),
            (None, Some(v)) => {
                seed_sum += *v;
                seen += 1;
                if seen == period {
                    prev = Some(seed_sum / divisor);
                }
            }
            _ => {}
        }
        result[i] = prev;
    }
    result
}

impl Indicator for Adx {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        2 * self.period - 1
    }

    fn compute(&self, bars: &[Bar]) -> Vec<Option<Decimal>> {
        self.directional(bars)
            .into_iter()
            .map(|d| d.and_then(|d| d.adx))
            .collect()
    }
}
