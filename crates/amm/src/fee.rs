/// Formats a pool fee given in hundredths of a bip as a percentage,
/// `fee_to_percent(3000, 2) == "0.30%"`.
pub fn fee_to_percent(fee: u32, decimals: usize) -> String {
    format!("{:.decimals$}%", f64::from(fee) / 10_000.)
}
