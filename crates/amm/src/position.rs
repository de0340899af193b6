use {crate::tick::TickRange, std::fmt};

/// Positions closer to a bound than this share of their width are flagged.
const NEAR_EDGE_RATIO: f64 = 0.10;

/// Where the pool price sits relative to a liquidity position.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PositionHealth {
    /// The position holds no liquidity.
    Empty,
    /// The pool tick could not be read.
    Unknown,
    OutOfRange,
    NearEdge,
    InRange,
}

impl PositionHealth {
    pub fn assess(liquidity: u128, range: TickRange, tick: Option<i32>) -> Self {
        if liquidity == 0 {
            return Self::Empty;
        }
        let Some(tick) = tick else {
            return Self::Unknown;
        };
        if !range.contains(tick) {
            return Self::OutOfRange;
        }
        let distance = (tick - range.lower).min(range.upper - tick);
        if f64::from(distance) / f64::from(range.width()) < NEAR_EDGE_RATIO {
            Self::NearEdge
        } else {
            Self::InRange
        }
    }

    pub fn needs_attention(self) -> bool {
        matches!(self, Self::OutOfRange | Self::NearEdge)
    }
}

impl fmt::Display for PositionHealth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Empty => "EMPTY",
            Self::Unknown => "UNKNOWN",
            Self::OutOfRange => "OUT OF RANGE",
            Self::NearEdge => "NEAR EDGE",
            Self::InRange => "IN RANGE",
        })
    }
}
