use {
    alloy::primitives::U256,
    std::{fmt, str::FromStr},
};

const MAX_BIPS: u16 = 10_000;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum Error {
    #[error("invalid percentage {0:?}, expected a number like 0.5")]
    Malformed(String),
    #[error("percentage {0:?} has more than two decimals")]
    TooPrecise(String),
    #[error("percentage {0:?} must be between 0 and 100")]
    OutOfRange(String),
}

/// A percentage with basis point precision, `0..=10000` bips.
///
/// Parsed without going through floating point so `"0.5"` is exactly 50
/// bips.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Slippage(u16);

/// Any other share expressed in percent, e.g. the part of a position to
/// withdraw.
pub type Percentage = Slippage;

impl Slippage {
    pub const ZERO: Self = Self(0);
    pub const FULL: Self = Self(MAX_BIPS);

    pub fn from_bips(bips: u16) -> Option<Self> {
        (bips <= MAX_BIPS).then_some(Self(bips))
    }

    pub fn bips(self) -> u16 {
        self.0
    }

    /// Applies the percentage to `value`, rounding down.
    pub fn of(self, value: U256) -> U256 {
        // `value * bips` can overflow for huge values, split the product.
        let bips = U256::from(self.0);
        let max = U256::from(MAX_BIPS);
        value / max * bips + value % max * bips / max
    }
}

impl FromStr for Slippage {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().trim_end_matches('%');
        let (whole, fraction) = trimmed.split_once('.').unwrap_or((trimmed, ""));
        let digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
        if (whole.is_empty() && fraction.is_empty()) || !digits(whole) || !digits(fraction) {
            return Err(Error::Malformed(s.to_string()));
        }
        if fraction.len() > 2 {
            return Err(Error::TooPrecise(s.to_string()));
        }
        let whole: u32 = if whole.is_empty() {
            0
        } else {
            whole
                .parse()
                .map_err(|_| Error::OutOfRange(s.to_string()))?
        };
        let fraction: u32 = format!("{fraction:0<2}")
            .parse()
            .map_err(|_| Error::Malformed(s.to_string()))?;
        let bips = whole
            .checked_mul(100)
            .and_then(|bips| bips.checked_add(fraction))
            .and_then(|bips| u16::try_from(bips).ok())
            .ok_or_else(|| Error::OutOfRange(s.to_string()))?;
        Self::from_bips(bips).ok_or_else(|| Error::OutOfRange(s.to_string()))
    }
}

impl fmt::Display for Slippage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}%", self.0 / 100, self.0 % 100)
    }
}

/// Minimum acceptable output for an expected output and a slippage
/// tolerance: `expected * (10000 - bips) / 10000`, rounded down. Never
/// exceeds `expected`.
pub fn min_out(expected: U256, slippage: Slippage) -> U256 {
    Slippage(MAX_BIPS - slippage.0).of(expected)
}
