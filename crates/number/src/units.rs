use {
    alloy::primitives::{
        U256,
        utils::{ParseUnits, Unit, format_units, parse_units},
    },
    anyhow::{Context, Result},
};

pub trait EthUnit: std::marker::Sized {
    /// Returns the current wei amount.
    fn wei(self) -> U256;

    /// Returns the current Gwei amount as wei (i.e. 1e9 wei).
    fn gwei(self) -> U256 {
        self.wei() * Unit::GWEI.wei()
    }

    /// Returns the current Eth amount as wei (i.e. 1e18 wei).
    fn eth(self) -> U256 {
        self.wei() * Unit::ETHER.wei()
    }
}

impl EthUnit for u64 {
    fn wei(self) -> U256 {
        U256::from(self)
    }
}

impl EthUnit for u128 {
    fn wei(self) -> U256 {
        U256::from(self)
    }
}

/// Parses a human readable decimal amount (`"1.5"`) into base units of a
/// token with the given number of decimals.
///
/// Negative amounts and amounts with more fractional digits than the token
/// supports are rejected.
pub fn parse_amount(amount: &str, decimals: u8) -> Result<U256> {
    let amount = amount.trim();
    anyhow::ensure!(!amount.is_empty(), "empty amount");
    anyhow::ensure!(!amount.starts_with('-'), "negative amount {amount:?}");
    if let Some((_, fraction)) = amount.split_once('.') {
        anyhow::ensure!(
            fraction.len() <= usize::from(decimals),
            "amount {amount:?} has more than {decimals} decimals"
        );
    }
    match parse_units(amount, decimals)
        .with_context(|| format!("invalid amount {amount:?} for {decimals} decimals"))?
    {
        ParseUnits::U256(value) => Ok(value),
        ParseUnits::I256(_) => anyhow::bail!("negative amount {amount:?}"),
    }
}

/// Parses an amount that must be strictly positive.
pub fn parse_positive_amount(amount: &str, decimals: u8) -> Result<U256> {
    let value = parse_amount(amount, decimals)?;
    anyhow::ensure!(!value.is_zero(), "amount must be greater than zero");
    Ok(value)
}

/// Formats base units as a decimal string with trailing zeros removed but at
/// least one fractional digit, e.g. `1.0` or `10.05`.
pub fn format_amount(value: U256, decimals: u8) -> String {
    let formatted = match format_units(value, decimals) {
        Ok(formatted) => formatted,
        Err(_) => return value.to_string(),
    };
    match formatted.split_once('.') {
        Some((whole, fraction)) => {
            let fraction = fraction.trim_end_matches('0');
            if fraction.is_empty() {
                format!("{whole}.0")
            } else {
                format!("{whole}.{fraction}")
            }
        }
        None => format!("{formatted}.0"),
    }
}

/// Formats base units truncated (not rounded) to `places` fractional digits.
/// Used for balance listings.
pub fn format_truncated(value: U256, decimals: u8, places: usize) -> String {
    let formatted = format_amount(value, decimals);
    let (whole, fraction) = formatted.split_once('.').unwrap_or((&formatted, ""));
    let fraction = &fraction[..fraction.len().min(places)];
    format!("{whole}.{fraction:0<places$}")
}

/// Lossy conversion of base units to a float for display of exchange rates
/// and prices.
pub fn to_f64(value: U256, decimals: u8) -> f64 {
    format_amount(value, decimals).parse().unwrap_or(f64::NAN)
}

/// Formats a float with `digits` significant digits, switching to
/// exponential notation for very large and very small magnitudes. Used for
/// tick prices which span many orders of magnitude.
pub fn format_significant(value: f64, digits: usize) -> String {
    if value == 0. || !value.is_finite() {
        return value.to_string();
    }
    let digits = digits.max(1);
    let magnitude = value.abs().log10().floor();
    let max_magnitude = digits as f64;
    if !(-7. ..max_magnitude).contains(&magnitude) {
        return format!("{value:.prec$e}", prec = digits - 1);
    }
    // Non-negative by the range check above.
    let decimals = (max_magnitude - 1. - magnitude) as usize;
    format!("{value:.decimals$}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_amounts() {
        assert_eq!(parse_amount("1.5", 18).unwrap(), 15u64.eth() / U256::from(10));
        assert_eq!(parse_amount("100", 6).unwrap(), U256::from(100_000_000));
        assert_eq!(parse_amount(" 0.000001 ", 6).unwrap(), U256::from(1));
        assert!(parse_amount("0.0000001", 6).is_err());
        assert!(parse_amount("-1", 6).is_err());
        assert!(parse_amount("abc", 6).is_err());
        assert!(parse_amount("", 6).is_err());
        assert!(parse_positive_amount("0", 6).is_err());
    }

    #[test]
    fn formats_amounts() {
        assert_eq!(format_amount(U256::from(10_050_000), 6), "10.05");
        assert_eq!(format_amount(1u64.eth(), 18), "1.0");
        assert_eq!(format_amount(U256::ZERO, 18), "0.0");
        assert_eq!(format_amount(U256::from(1), 18), "0.000000000000000001");
        assert_eq!(format_amount(U256::from(42), 0), "42.0");
    }

    #[test]
    fn truncates_balances() {
        assert_eq!(format_truncated(U256::from(1_234_567), 6, 4), "1.2345");
        assert_eq!(format_truncated(U256::from(1_999_999), 6, 4), "1.9999");
        assert_eq!(format_truncated(U256::from(2_000_000), 6, 4), "2.0000");
        assert_eq!(format_truncated(U256::from(1), 18, 4), "0.0000");
    }

    #[test]
    fn converts_to_float() {
        assert_eq!(to_f64(U256::from(2_500_000), 6), 2.5);
        assert_eq!(to_f64(5u64.gwei(), 9), 5.0);
    }

    #[test]
    fn formats_significant_digits() {
        assert_eq!(format_significant(1.23456789, 5), "1.2346");
        assert_eq!(format_significant(0.000012345, 5), "0.000012345");
        assert_eq!(format_significant(42.0, 5), "42.000");
        assert_eq!(format_significant(123456.7, 5), "1.2346e5");
        assert_eq!(format_significant(0., 5), "0");
    }
}
