pub mod alloy;
pub mod keystore;

use ::alloy::providers::DynProvider;

pub type AlloyProvider = DynProvider;
