//! Spot price quote used when the on-chain quoter is unavailable.

use {
    alloy::primitives::U256,
    number::U256Ext,
    std::fmt,
};

/// Printed next to every quote that came out of [`naive_quote`].
pub const NAIVE_QUOTE_WARNING: &str = "quoter unavailable, estimate uses the pool spot price and \
                                       ignores liquidity depth and tick crossings; actual output \
                                       may be lower";

/// Quotes crossing more than this many initialized ticks get a price impact
/// warning.
pub const MAX_TICKS_CROSSED: u32 = 10;

const FEE_DENOMINATOR: u64 = 1_000_000;

/// Where a quote came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Source {
    Quoter,
    /// Spot price estimate from [`naive_quote`].
    Naive,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Quoter => "quoter",
            Self::Naive => "spot price estimate",
        })
    }
}

/// Expected output of an exact input swap.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Quote {
    pub amount_in: U256,
    pub amount_out: U256,
    /// Pool fee in hundredths of a bip, added up over all hops of a
    /// multi-hop route. Dynamic fee pools report the fee at quote time.
    pub fee: u32,
    pub gas_estimate: Option<U256>,
    /// Initialized ticks crossed, summed over all hops.
    pub ticks_crossed: Option<u32>,
    pub source: Source,
    pub warning: Option<String>,
}

impl Quote {
    /// Quote reported by an on-chain quoter contract.
    pub fn from_quoter(
        amount_in: U256,
        amount_out: U256,
        fee: u32,
        ticks_crossed: u32,
        gas_estimate: U256,
    ) -> Self {
        Self {
            amount_in,
            amount_out,
            fee,
            gas_estimate: Some(gas_estimate),
            ticks_crossed: Some(ticks_crossed),
            source: Source::Quoter,
            warning: price_impact_warning(amount_out, ticks_crossed),
        }
    }

    /// Spot price estimate for when the quoter call failed. Always carries
    /// [`NAIVE_QUOTE_WARNING`].
    pub fn naive(
        amount_in: U256,
        sqrt_price_x96: U256,
        liquidity: u128,
        fee: u32,
        zero_for_one: bool,
    ) -> Option<Self> {
        Some(Self {
            amount_in,
            amount_out: naive_quote(amount_in, sqrt_price_x96, liquidity, fee, zero_for_one)?,
            fee,
            gas_estimate: None,
            ticks_crossed: None,
            source: Source::Naive,
            warning: Some(NAIVE_QUOTE_WARNING.to_string()),
        })
    }

    pub fn is_fallback(&self) -> bool {
        self.source == Source::Naive
    }
}

fn q96() -> U256 {
    U256::from(1) << 96
}

/// Output of a swap at the current spot price after deducting the pool fee
/// (in hundredths of a bip). Returns zero for pools without liquidity and
/// `None` only if the result does not fit in 256 bits.
///
/// `zero_for_one` is true when token0 is the input token.
pub fn naive_quote(
    amount_in: U256,
    sqrt_price_x96: U256,
    liquidity: u128,
    fee: u32,
    zero_for_one: bool,
) -> Option<U256> {
    if liquidity == 0 || sqrt_price_x96.is_zero() {
        return Some(U256::ZERO);
    }
    let fee = U256::from(FEE_DENOMINATOR.saturating_sub(u64::from(fee)));
    let after_fee = amount_in.checked_mul_div(&fee, &U256::from(FEE_DENOMINATOR))?;
    if zero_for_one {
        after_fee
            .checked_mul_div(&sqrt_price_x96, &q96())?
            .checked_mul_div(&sqrt_price_x96, &q96())
    } else {
        after_fee
            .checked_mul_div(&q96(), &sqrt_price_x96)?
            .checked_mul_div(&q96(), &sqrt_price_x96)
    }
}

/// Warning for a quoter result that looks suspicious.
pub fn price_impact_warning(amount_out: U256, ticks_crossed: u32) -> Option<String> {
    if amount_out.is_zero() {
        Some("quoter returned zero output, the pool may be empty".to_string())
    } else if ticks_crossed > MAX_TICKS_CROSSED {
        Some(format!(
            "swap crosses {ticks_crossed} initialized ticks, expect high price impact"
        ))
    } else {
        None
    }
}
