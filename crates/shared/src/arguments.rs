//! Contains command line arguments and related helpers that are shared between
//! the binaries.

use {
    alloy::primitives::Address,
    anyhow::Result,
    chain::Network,
    ethrpc::keystore::Credentials,
    std::{
        fmt::{self, Display, Formatter},
        path::PathBuf,
    },
    url::Url,
};

#[macro_export]
macro_rules! logging_args_with_default_filter {
    ($struct_name:ident, $default_filter:literal) => {
        #[derive(clap::Parser)]
        pub struct $struct_name {
            /// Log filter in `EnvFilter` syntax. Logs go to stderr.
            #[clap(long, env, default_value = $default_filter)]
            pub log_filter: String,

            /// Emit logs as JSON lines.
            #[clap(long, env)]
            pub log_json: bool,
        }

        impl $struct_name {
            pub fn observe_config(&self) -> observe::Config {
                observe::Config::new(&self.log_filter, self.log_json)
            }
        }

        impl ::std::fmt::Display for $struct_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                let Self {
                    log_filter,
                    log_json,
                } = self;

                writeln!(f, "log_filter: {}", log_filter)?;
                writeln!(f, "log_json: {}", log_json)?;
                Ok(())
            }
        }
    };
}

#[derive(clap::Parser)]
#[group(skip)]
pub struct Arguments {
    /// Flare JSON-RPC endpoint. Defaults to the network's public RPC.
    #[clap(long, env = "FLARE_RPC")]
    pub node_url: Option<Url>,

    /// Network key or alias, e.g. `flare` or `flr`.
    #[clap(long, env, default_value = chain::DEFAULT_NETWORK)]
    pub network: String,

    /// TOML file with a network definition replacing the built-in table.
    #[clap(long, env = "NETWORK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Encrypted JSON keystore holding the signing key.
    #[clap(long, env = "AGENT_KEYSTORE", default_value = "./keystore.json")]
    pub keystore: PathBuf,

    /// Keystore password. Prefer a password file.
    #[clap(long, env = "KEYSTORE_PASSWORD", hide_env_values = true)]
    pub keystore_password: Option<String>,

    /// File containing the keystore password.
    #[clap(long, env = "AGENT_KEYSTORE_PASSWORD")]
    pub keystore_password_file: Option<PathBuf>,

    /// Alternative password file location.
    #[clap(long, env = "KEYSTORE_PASSWORD_PATH")]
    pub keystore_password_path: Option<PathBuf>,
}

impl Arguments {
    pub async fn network(&self) -> Result<Network> {
        Network::load(&self.network, self.config.as_deref()).await
    }

    pub fn node_url(&self, network: &Network) -> Url {
        self.node_url.clone().unwrap_or_else(|| network.rpc.clone())
    }

    pub fn credentials(&self) -> Credentials {
        Credentials {
            keystore: self.keystore.clone(),
            password: self.keystore_password.clone(),
            password_files: self
                .keystore_password_file
                .iter()
                .chain(&self.keystore_password_path)
                .cloned()
                .collect(),
        }
    }
}

impl Display for Arguments {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let Self {
            node_url,
            network,
            config,
            keystore,
            keystore_password,
            keystore_password_file,
            keystore_password_path,
        } = self;

        display_option(f, "node_url", node_url)?;
        writeln!(f, "network: {network}")?;
        display_option(f, "config", &config.as_ref().map(|path| path.display()))?;
        writeln!(f, "keystore: {}", keystore.display())?;
        display_secret_option(f, "keystore_password", keystore_password)?;
        display_option(
            f,
            "keystore_password_file",
            &keystore_password_file.as_ref().map(|path| path.display()),
        )?;
        display_option(
            f,
            "keystore_password_path",
            &keystore_password_path.as_ref().map(|path| path.display()),
        )?;
        Ok(())
    }
}

/// XRP Ledger connection and wallet.
#[derive(clap::Parser, Debug)]
#[group(skip)]
pub struct XrplArguments {
    /// XRPL websocket endpoint.
    #[clap(long, env = "XRPL_WSS", default_value = xrpl::DEFAULT_URL)]
    pub xrpl_url: Url,

    /// XRPL wallet JSON file with `address` and `secret`.
    #[clap(
        long,
        env = "XRPL_WALLET",
        alias = "xrpl-key",
        default_value = "~/.secrets/xrpl-wallet.json"
    )]
    pub xrpl_wallet: PathBuf,
}

impl XrplArguments {
    pub fn client(&self) -> xrpl::Client {
        xrpl::Client::new(self.xrpl_url.clone())
    }

    pub async fn wallet(&self) -> Result<xrpl::Wallet> {
        xrpl::Wallet::load(&self.xrpl_wallet).await
    }
}

impl Display for XrplArguments {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let Self {
            xrpl_url,
            xrpl_wallet,
        } = self;

        writeln!(f, "xrpl_url: {xrpl_url}")?;
        writeln!(f, "xrpl_wallet: {}", xrpl_wallet.display())?;
        Ok(())
    }
}

pub fn display_secret_option<T>(
    f: &mut Formatter<'_>,
    name: &str,
    option: &Option<T>,
) -> fmt::Result {
    display_option(f, name, &option.as_ref().map(|_| "SECRET"))
}

pub fn display_option(
    f: &mut Formatter<'_>,
    name: &str,
    option: &Option<impl Display>,
) -> fmt::Result {
    match option {
        Some(display) => writeln!(f, "{name}: {display}"),
        None => writeln!(f, "{name}: None"),
    }
}

/// Parses a comma separated list like `WFLR,USDT0`. Empty items are
/// rejected.
pub fn comma_list(value: &str) -> Result<Vec<String>> {
    let items: Vec<String> = value.split(',').map(|item| item.trim().to_string()).collect();
    anyhow::ensure!(
        items.iter().all(|item| !item.is_empty()),
        "empty item in list {value:?}"
    );
    Ok(items)
}

/// Parses an EVM address, used for `--address` style arguments.
pub fn address(value: &str) -> Result<Address> {
    value
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid address {value:?}"))
}
