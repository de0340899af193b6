//! Plumbing shared by the command line tools: arguments, sessions,
//! transaction submission and exit handling.

pub mod arguments;
pub mod erc20;
pub mod exit;
pub mod session;
pub mod tx;
