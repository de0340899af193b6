//! Pure math shared by the Uniswap V3 and Algebra Integral tools.
//!
//! Nothing in this crate performs I/O. Callers read pool state from chain
//! and feed plain numbers in.

pub mod fee;
pub mod path;
pub mod position;
pub mod quote;
pub mod slippage;
pub mod tick;

pub use {
    fee::fee_to_percent,
    position::PositionHealth,
    quote::{Quote, naive_quote},
    slippage::{Percentage, Slippage, min_out},
    tick::{TickRange, align_ticks, range_to_ticks, tick_to_price},
};
