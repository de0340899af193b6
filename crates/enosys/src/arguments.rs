use {
    alloy::primitives::{Address, U256},
    amm::{Percentage, Slippage},
    std::fmt::{self, Display, Formatter},
};

shared::logging_args_with_default_filter!(LoggingArguments, "warn,enosys=info,shared=info");

/// Swaps and liquidity positions on Enosys V3.
#[derive(clap::Parser)]
#[clap(version)]
pub struct Arguments {
    #[clap(flatten)]
    pub shared: shared::arguments::Arguments,

    #[clap(flatten)]
    pub logging: LoggingArguments,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(clap::Subcommand, Debug)]
pub enum Command {
    /// Quote an exact input swap. Without `--fee` every fee tier is quoted
    /// and compared.
    Quote {
        #[clap(flatten)]
        trade: Trade,

        /// Fee tier in hundredths of a bip, e.g. 3000 for 0.3%.
        #[clap(long)]
        fee: Option<u32>,
    },
    /// Best quoter result across all fee tiers.
    Best {
        #[clap(flatten)]
        trade: Trade,
    },
    /// Swap an exact input amount.
    Swap(Swap),
    /// Show the pools of a pair.
    Pool {
        #[clap(long)]
        from: String,

        #[clap(long)]
        to: String,

        #[clap(long)]
        fee: Option<u32>,
    },
    /// Scan the configured token pairs for pools.
    Pools,
    /// List the liquidity positions of an account.
    Positions {
        #[clap(flatten)]
        owner: Owner,
    },
    /// Check whether positions are still in range.
    Check {
        #[clap(flatten)]
        owner: Owner,
    },
    /// Open a new liquidity position.
    Mint(Mint),
    /// Add liquidity to an existing position.
    Add {
        #[clap(long)]
        token_id: U256,

        #[clap(long, required_unless_present = "amount1")]
        amount0: Option<String>,

        #[clap(long)]
        amount1: Option<String>,
    },
    /// Withdraw liquidity and collect the tokens. Burns the position when
    /// everything is withdrawn.
    Remove {
        #[clap(long)]
        token_id: U256,

        /// Share of the liquidity to withdraw in percent.
        #[clap(long, default_value = "100")]
        percent: Percentage,
    },
    /// Collect the fees owed to a position.
    Collect {
        #[clap(long)]
        token_id: U256,
    },
}

#[derive(clap::Args, Debug)]
pub struct Trade {
    /// Input token symbol or address.
    #[clap(long)]
    pub from: String,

    /// Output token symbol or address.
    #[clap(long)]
    pub to: String,

    /// Input amount in whole tokens, e.g. 1.5.
    #[clap(long)]
    pub amount: String,
}

#[derive(clap::Args, Debug)]
pub struct Swap {
    #[clap(flatten)]
    pub trade: Trade,

    /// Fee tier of the pool, also used for every hop of a route without
    /// `--fees`.
    #[clap(long, default_value = "3000")]
    pub fee: u32,

    /// Maximum accepted slippage in percent.
    #[clap(long, default_value = "0.5")]
    pub slippage: Slippage,

    /// Intermediate tokens of a multi-hop route.
    #[clap(long, use_value_delimiter = true)]
    pub via: Vec<String>,

    /// Fee tier of every hop of a multi-hop route.
    #[clap(long, use_value_delimiter = true, requires = "via")]
    pub fees: Vec<u32>,
}

#[derive(clap::Args, Debug)]
pub struct Owner {
    /// Account to inspect. Defaults to the keystore's address.
    #[clap(long, env = "AGENT_WALLET", value_parser = shared::arguments::address)]
    pub address: Option<Address>,
}

#[derive(clap::Args, Debug)]
pub struct Mint {
    #[clap(long)]
    pub token0: String,

    #[clap(long)]
    pub token1: String,

    #[clap(long)]
    pub amount0: String,

    #[clap(long)]
    pub amount1: String,

    #[clap(long, default_value = "3000")]
    pub fee: u32,

    /// Width of the range around the current price in percent.
    #[clap(long, conflicts_with = "tick_lower")]
    pub range: Option<f64>,

    #[clap(long, allow_negative_numbers = true, requires = "tick_upper")]
    pub tick_lower: Option<i32>,

    #[clap(long, allow_negative_numbers = true, requires = "tick_lower")]
    pub tick_upper: Option<i32>,
}

impl Mint {
    pub const DEFAULT_RANGE: f64 = 10.;
}

impl Display for Arguments {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let Self {
            shared,
            logging,
            command,
        } = self;

        write!(f, "{shared}")?;
        write!(f, "{logging}")?;
        writeln!(f, "command: {command:?}")?;
        Ok(())
    }
}
