//! XRP amounts. The ledger counts in drops, one millionth of an XRP.

use {alloy::primitives::U256, anyhow::Context};

pub const DECIMALS: u8 = 6;
pub const DROPS_PER_XRP: u64 = 1_000_000;
/// Balance every account has to keep to stay activated.
pub const BASE_RESERVE_DROPS: u64 = DROPS_PER_XRP;
/// The protocol caps the XRP supply at 10^17 drops.
pub const MAX_DROPS: u64 = 100_000_000_000_000_000;

/// Parses a decimal XRP amount into drops.
pub fn parse_xrp(amount: &str) -> anyhow::Result<u64> {
    let drops = number::parse_positive_amount(amount, DECIMALS)?;
    let drops = u64::try_from(drops).context("XRP amount too large")?;
    anyhow::ensure!(drops <= MAX_DROPS, "XRP amount too large");
    Ok(drops)
}

pub fn format_xrp(drops: u64) -> String {
    number::format_amount(U256::from(drops), DECIMALS)
}

/// Spendable drops above the base reserve.
pub fn available(balance_drops: u64) -> u64 {
    balance_drops.saturating_sub(BASE_RESERVE_DROPS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_formats() {
        assert_eq!(parse_xrp("10.05").unwrap(), 10_050_000);
        assert_eq!(parse_xrp("0.000001").unwrap(), 1);
        assert_eq!(format_xrp(10_050_000), "10.05");
        assert_eq!(format_xrp(1_000_000), "1.0");
        assert!(parse_xrp("0.0000001").is_err());
        assert!(parse_xrp("0").is_err());
        assert!(parse_xrp("100000000001").is_err());
    }

    #[test]
    fn reserve_is_subtracted() {
        assert_eq!(available(25_000_000), 24_000_000);
        assert_eq!(available(500_000), 0);
    }
}
