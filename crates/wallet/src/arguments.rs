use {
    alloy::primitives::Address,
    shared::arguments::XrplArguments,
    std::{
        fmt::{self, Display, Formatter},
        path::PathBuf,
    },
};

shared::logging_args_with_default_filter!(LoggingArguments, "warn,wallet=info,shared=info,xrpl=info");

/// Balances, transfers and keys on Flare and the XRP Ledger.
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
    /// List the known networks.
    Networks,
    /// Native and token balances of an account.
    Balance {
        /// Defaults to `AGENT_WALLET` or the keystore's address.
        #[clap(env = "AGENT_WALLET", value_parser = shared::arguments::address)]
        address: Option<Address>,

        /// Also list tokens with a zero balance.
        #[clap(long)]
        all: bool,
    },
    /// Send the native currency or a token.
    Send {
        amount: String,

        /// Token symbol or address, the native currency if omitted.
        token: Option<String>,

        #[clap(long, value_parser = shared::arguments::address)]
        to: Address,
    },
    /// Wrap the native currency.
    Wrap { amount: String },
    /// Unwrap to the native currency.
    Unwrap { amount: String },
    /// Approve a spender, unlimited unless `--amount` is given.
    Approve {
        token: String,

        #[clap(value_parser = shared::arguments::address)]
        spender: Address,

        #[clap(long)]
        amount: Option<String>,
    },
    /// Show how much a spender may move.
    Allowance {
        token: String,

        #[clap(value_parser = shared::arguments::address)]
        spender: Address,

        #[clap(long, env = "AGENT_WALLET", value_parser = shared::arguments::address)]
        owner: Option<Address>,
    },
    /// Current gas price, base fee and priority fee.
    Gas,
    /// Name, symbol, decimals and supply of a token.
    Info { token: String },
    /// Create a new key. With `--out` it is written as an encrypted keystore
    /// using the configured password instead of being printed.
    Generate {
        #[clap(long)]
        out: Option<PathBuf>,
    },
    /// XRP Ledger wallet operations.
    Xrpl {
        #[clap(flatten)]
        xrpl: XrplArguments,

        #[clap(subcommand)]
        command: XrplCommand,
    },
}

#[derive(clap::Subcommand, Debug)]
pub enum XrplCommand {
    /// Balance, reserve and spendable XRP.
    Balance,
    /// Recent transactions of the wallet.
    History {
        #[clap(long, default_value = "10")]
        limit: u32,
    },
    /// Send XRP.
    Send {
        #[clap(long)]
        to: String,

        /// XRP amount, e.g. 12.5.
        #[clap(long)]
        amount: String,

        #[clap(long)]
        memo: Option<String>,

        /// Destination tag.
        #[clap(long)]
        tag: Option<u32>,
    },
    /// Create a new wallet, optionally saving it as JSON.
    Generate {
        #[clap(long)]
        save: Option<PathBuf>,
    },
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
        Arguments::try_parse_from(std::iter::once("wallet").chain(args.iter().copied()))
    }

    #[test]
    fn send_takes_an_optional_token() {
        let to = "0x1D80c49BbBCd1C0911346656B529DF9E5c2F783d";
        let args = parse(&["send", "10", "--to", to]).unwrap();
        let Command::Send { amount, token, .. } = args.command else {
            panic!("expected send");
        };
        assert_eq!((amount.as_str(), token), ("10", None));

        let args = parse(&["send", "2.5", "FXRP", "--to", to]).unwrap();
        let Command::Send { token, .. } = args.command else {
            panic!("expected send");
        };
        assert_eq!(token.as_deref(), Some("FXRP"));

        assert!(parse(&["send", "10", "--to", "0x1234"]).is_err());
    }

    #[test]
    fn xrpl_subcommands() {
        let args = parse(&[
            "xrpl",
            "--xrpl-wallet",
            "/tmp/wallet.json",
            "send",
            "--to",
            "rHb9CJAWyB4rj91VRWn96DkukG4bwdtyTh",
            "--amount",
            "12.5",
            "--tag",
            "42",
        ])
        .unwrap();
        let Command::Xrpl { xrpl, command } = args.command else {
            panic!("expected xrpl");
        };
        assert_eq!(xrpl.xrpl_wallet, PathBuf::from("/tmp/wallet.json"));
        let XrplCommand::Send { amount, tag, memo, .. } = command else {
            panic!("expected xrpl send");
        };
        assert_eq!((amount.as_str(), tag, memo), ("12.5", Some(42), None));

        let args = parse(&["xrpl", "history"]).unwrap();
        let Command::Xrpl {
            command: XrplCommand::History { limit },
            ..
        } = args.command
        else {
            panic!("expected xrpl history");
        };
        assert_eq!(limit, 10);
    }
}
