//! Conversions between ticks and human readable prices.
//!
//! A tick `t` corresponds to a raw price of `1.0001^t` token1 base units per
//! token0 base unit.

use std::fmt;

pub const MIN_TICK: i32 = -887_272;
pub const MAX_TICK: i32 = 887_272;

const TICK_BASE: f64 = 1.0001;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    #[error("range must be a positive percentage, got {0}")]
    InvalidRange(f64),
    #[error("tick spacing must be positive, got {0}")]
    InvalidSpacing(i32),
    #[error("lower tick {lower} must be below upper tick {upper}")]
    Inverted { lower: i32, upper: i32 },
    #[error("tick range [{lower}, {upper}] exceeds [{}, {}]", MIN_TICK, MAX_TICK)]
    OutOfBounds { lower: i32, upper: i32 },
}

/// Price of token0 in token1, adjusted for the tokens' decimals.
pub fn tick_to_price(tick: i32, decimals0: u8, decimals1: u8) -> f64 {
    TICK_BASE.powi(tick) * 10f64.powi(i32::from(decimals0) - i32::from(decimals1))
}

/// A position's tick bounds. Always `lower < upper`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TickRange {
    pub lower: i32,
    pub upper: i32,
}

impl TickRange {
    pub fn width(&self) -> i32 {
        self.upper - self.lower
    }

    pub fn contains(&self, tick: i32) -> bool {
        self.lower <= tick && tick < self.upper
    }
}

impl fmt::Display for TickRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.lower, self.upper)
    }
}

/// Computes a range of roughly `±range_pct` percent around the current
/// tick, rounded outward to the pool's tick spacing.
pub fn range_to_ticks(current_tick: i32, range_pct: f64, spacing: i32) -> Result<TickRange, Error> {
    if !range_pct.is_finite() || range_pct <= 0. {
        return Err(Error::InvalidRange(range_pct));
    }
    if spacing <= 0 {
        return Err(Error::InvalidSpacing(spacing));
    }
    let half_width = ((1. + range_pct / 100.).ln() / TICK_BASE.ln()).ceil();
    // Anything wider than the full tick domain fails the bounds check below.
    let half_width = half_width.clamp(1., f64::from(MAX_TICK - MIN_TICK)) as i64;

    let current = i64::from(current_tick);
    let spacing = i64::from(spacing);
    let lower = (current - half_width).div_euclid(spacing) * spacing;
    let upper = -(-(current + half_width)).div_euclid(spacing) * spacing;
    checked_range(lower, upper)
}

/// Rounds explicit bounds outward to the tick spacing.
pub fn align_ticks(lower: i32, upper: i32, spacing: i32) -> Result<TickRange, Error> {
    if spacing <= 0 {
        return Err(Error::InvalidSpacing(spacing));
    }
    if lower >= upper {
        return Err(Error::Inverted { lower, upper });
    }
    let spacing = i64::from(spacing);
    let lower = i64::from(lower).div_euclid(spacing) * spacing;
    let upper = -(-i64::from(upper)).div_euclid(spacing) * spacing;
    checked_range(lower, upper)
}

fn checked_range(lower: i64, upper: i64) -> Result<TickRange, Error> {
    match (i32::try_from(lower), i32::try_from(upper)) {
        (Ok(lower), Ok(upper)) if lower >= MIN_TICK && upper <= MAX_TICK => {
            Ok(TickRange { lower, upper })
        }
        _ => Err(Error::OutOfBounds {
            lower: lower.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32,
            upper: upper.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32,
        }),
    }
}

#[cfg(test)]
mod tests {
    use {super::*, rstest::rstest};

    #[test]
    fn price_at_tick_zero_is_one() {
        assert_eq!(tick_to_price(0, 18, 18), 1.);
        assert_eq!(tick_to_price(0, 6, 6), 1.);
    }

    #[test]
    fn price_is_monotonic_in_tick() {
        let prices: Vec<f64> = (-2000..2000)
            .step_by(37)
            .map(|tick| tick_to_price(tick, 18, 6))
            .collect();
        assert!(prices.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn price_adjusts_for_decimals() {
        let price = tick_to_price(0, 18, 6);
        assert!((price - 1e12).abs() < 1.);
    }

    #[rstest]
    #[case(0, 10., 60)]
    #[case(-201_234, 10., 60)]
    #[case(12_345, 0.5, 10)]
    #[case(7, 50., 200)]
    #[case(-1, 0.01, 1)]
    fn range_is_aligned_and_ordered(#[case] tick: i32, #[case] pct: f64, #[case] spacing: i32) {
        let range = range_to_ticks(tick, pct, spacing).unwrap();
        assert!(range.lower < range.upper);
        assert_eq!(range.lower % spacing, 0);
        assert_eq!(range.upper % spacing, 0);
        assert!(range.lower <= tick && tick <= range.upper);
    }

    #[test]
    fn ten_percent_range() {
        // ln(1.1) / ln(1.0001) = 953.1, so the half width is 954 ticks.
        assert_eq!(
            range_to_ticks(0, 10., 60).unwrap(),
            TickRange {
                lower: -960,
                upper: 960
            }
        );
        assert_eq!(
            range_to_ticks(100, 10., 1).unwrap(),
            TickRange {
                lower: -854,
                upper: 1054
            }
        );
    }

    #[test]
    fn width_is_non_decreasing_in_range() {
        let mut previous = 0;
        for pct in [0.01, 0.1, 0.5, 1., 2., 5., 10., 25., 50., 100., 400.] {
            let width = range_to_ticks(-5_000, pct, 10).unwrap().width();
            assert!(width >= previous);
            previous = width;
        }
    }

    #[test]
    fn tiny_range_still_has_width() {
        let range = range_to_ticks(600, 1e-12, 60).unwrap();
        assert!(range.lower < range.upper);
    }

    #[rstest]
    #[case(0.)]
    #[case(-5.)]
    #[case(f64::NAN)]
    #[case(f64::INFINITY)]
    fn rejects_invalid_ranges(#[case] pct: f64) {
        assert!(matches!(
            range_to_ticks(0, pct, 60),
            Err(Error::InvalidRange(_))
        ));
    }

    #[test]
    fn rejects_invalid_spacing_and_bounds() {
        assert_eq!(
            range_to_ticks(0, 10., 0),
            Err(Error::InvalidSpacing(0))
        );
        assert!(matches!(
            range_to_ticks(MAX_TICK - 10, 10., 60),
            Err(Error::OutOfBounds { .. })
        ));
        assert!(matches!(
            range_to_ticks(0, 1e300, 60),
            Err(Error::OutOfBounds { .. })
        ));
    }

    #[test]
    fn aligns_explicit_ticks_outward() {
        assert_eq!(
            align_ticks(-95, 95, 60).unwrap(),
            TickRange {
                lower: -120,
                upper: 120
            }
        );
        assert_eq!(
            align_ticks(60, 120, 60).unwrap(),
            TickRange {
                lower: 60,
                upper: 120
            }
        );
        assert_eq!(
            align_ticks(10, 10, 60),
            Err(Error::Inverted {
                lower: 10,
                upper: 10
            })
        );
    }

    #[test]
    fn range_contains_is_half_open() {
        let range = TickRange {
            lower: -60,
            upper: 60,
        };
        assert!(range.contains(-60));
        assert!(range.contains(59));
        assert!(!range.contains(60));
    }
}
