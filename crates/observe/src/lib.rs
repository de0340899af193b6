//! Logging setup shared by all binaries.
//!
//! Command output goes to stdout while every log line goes to stderr, so the
//! reports printed by a command can be piped without being mixed with
//! diagnostics.
pub mod config;
pub mod panic_hook;
pub mod tracing;

pub use config::Config;
