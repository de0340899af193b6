use {
    amm::Slippage,
    std::fmt::{self, Display, Formatter},
};

shared::logging_args_with_default_filter!(LoggingArguments, "warn,sparkdex=info,shared=info");

/// Swaps on SparkDex V4, an Algebra Integral deployment with dynamic fees.
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
    /// Quote an exact input swap, optionally routed through `--via`.
    Quote {
        #[clap(flatten)]
        trade: Trade,

        /// Intermediate tokens of a multi-hop route.
        #[clap(long, use_value_delimiter = true)]
        via: Vec<String>,
    },
    /// Swap an exact input amount.
    Swap {
        #[clap(flatten)]
        trade: Trade,

        /// Maximum accepted slippage in percent.
        #[clap(long, default_value = "0.5")]
        slippage: Slippage,

        #[clap(long, use_value_delimiter = true)]
        via: Vec<String>,
    },
    /// Show the pool of a pair and its current dynamic fee.
    Pool {
        #[clap(long)]
        from: String,

        #[clap(long)]
        to: String,
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

#[cfg(test)]
mod tests {
    use {super::*, clap::Parser};

    fn parse(args: &[&str]) -> Result<Arguments, clap::Error> {
        Arguments::try_parse_from(std::iter::once("sparkdex").chain(args.iter().copied()))
    }

    #[test]
    fn quote_routes() {
        let args = parse(&[
            "quote", "--from", "WFLR", "--to", "FXRP", "--amount", "100", "--via", "sFLR",
        ])
        .unwrap();
        let Command::Quote { trade, via } = args.command else {
            panic!("expected quote");
        };
        assert_eq!(trade.amount, "100");
        assert_eq!(via, vec!["sFLR"]);
    }

    #[test]
    fn swap_defaults_to_half_a_percent() {
        let args = parse(&["swap", "--from", "WFLR", "--to", "FXRP", "--amount", "1"]).unwrap();
        let Command::Swap { slippage, via, .. } = args.command else {
            panic!("expected swap");
        };
        assert_eq!(slippage.bips(), 50);
        assert!(via.is_empty());
    }

    #[test]
    fn pool_needs_both_tokens() {
        assert!(parse(&["pool", "--from", "WFLR"]).is_err());
        assert!(parse(&["pool", "--from", "WFLR", "--to", "FXRP"]).is_ok());
    }
}
