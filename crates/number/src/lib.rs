pub mod u256_ext;
pub mod units;

pub use {
    u256_ext::U256Ext,
    units::{EthUnit, format_amount, format_significant, format_truncated, parse_amount, parse_positive_amount},
};
