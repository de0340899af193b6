use {
    alloy::primitives::Address,
    shared::arguments::XrplArguments,
    std::fmt::{self, Display, Formatter},
};

shared::logging_args_with_default_filter!(LoggingArguments, "warn,fassets=info,shared=info,xrpl=info");

/// Mint and redeem FXRP through the FAssets asset manager.
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
    /// Lot size, reservation fee and optionally an account's FXRP balance.
    Info {
        #[clap(long, env = "AGENT_WALLET", value_parser = shared::arguments::address)]
        address: Option<Address>,
    },
    /// Agents with free minting capacity.
    Agents,
    /// Reserve collateral, pay the agent on the XRP Ledger and wait for the
    /// FXRP to arrive.
    Mint(Mint),
    /// Burn FXRP and receive XRP on the given XRPL address.
    Redeem {
        #[clap(flatten)]
        size: Size,

        #[clap(long)]
        xrpl_address: String,
    },
    /// XRPL account state and recent transactions.
    Status {
        #[clap(long)]
        xrpl_address: String,

        /// Also show the FXRP balance of this Flare account.
        #[clap(long, value_parser = shared::arguments::address)]
        address: Option<Address>,

        #[clap(flatten)]
        xrpl: XrplArguments,
    },
}

/// Either a number of lots or an FXRP amount that is a whole number of
/// lots.
#[derive(clap::Args, Debug)]
#[group(required = true, multiple = false)]
pub struct Size {
    #[clap(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub lots: Option<u64>,

    /// FXRP amount, e.g. 20 for two lots of 10.
    #[clap(long)]
    pub amount: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct Mint {
    #[clap(flatten)]
    pub size: Size,

    /// Agent vault to mint with. Defaults to the first agent with enough
    /// free lots and an acceptable fee.
    #[clap(long, value_parser = shared::arguments::address)]
    pub agent: Option<Address>,

    /// Highest accepted minting fee in basis points.
    #[clap(long, default_value = "2500")]
    pub max_fee: u32,

    #[clap(flatten)]
    pub xrpl: XrplArguments,
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
