//! Static per-network configuration: the token table, DEX and FAssets
//! contract addresses and the fee tiers used for quoting.
//!
//! A [`Network`] is loaded once at start-up and handed to every command by
//! reference. It never changes for the lifetime of the process.

mod flare;

use {
    alloy::primitives::Address,
    anyhow::{Context, anyhow},
    serde::{Deserialize, Serialize},
    std::{fmt, path::Path},
    url::Url,
};

/// Key of the network used when none is given on the command line.
pub const DEFAULT_NETWORK: &str = "flare";

/// Alternative names accepted for network keys.
const ALIASES: &[(&str, &str)] = &[("flr", "flare")];

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Token {
    pub symbol: String,
    pub address: Address,
    pub decimals: u8,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.symbol)
    }
}

/// Uniswap V3 deployment of Enosys.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Enosys {
    pub position_manager: Address,
    pub factory: Address,
    pub swap_router: Address,
    pub quoter: Address,
    /// Fee tiers in hundredths of a bip, e.g. `3000` for 0.3%.
    pub fee_tiers: Vec<u32>,
    /// Token pairs scanned by the `pools` command.
    #[serde(default)]
    pub pairs: Vec<(String, String)>,
}

/// Algebra Integral deployment of SparkDex V4.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Sparkdex {
    pub factory: Address,
    pub swap_router: Address,
    pub quoter: Address,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Fassets {
    pub asset_manager: Address,
    /// Symbol of the FAsset token in the token table.
    pub fasset: String,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Network {
    pub key: String,
    pub name: String,
    pub chain_id: u64,
    pub rpc: Url,
    pub explorer: Url,
    pub native_symbol: String,
    pub wrapped_native: Address,
    pub tokens: Vec<Token>,
    pub enosys: Enosys,
    pub sparkdex: Sparkdex,
    pub fassets: Fassets,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum Error {
    #[error("unknown network {0:?}, known networks: {1}")]
    UnknownNetwork(String, String),
    #[error("unknown token {0:?}, known tokens: {1}")]
    UnknownToken(String, String),
}

/// The result of looking up a user supplied token name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TokenRef<'a> {
    /// Token from the configured table.
    Known(&'a Token),
    /// A raw address not in the table. Its metadata has to be read from
    /// the token contract.
    Address(Address),
}

impl TokenRef<'_> {
    pub fn address(&self) -> Address {
        match self {
            TokenRef::Known(token) => token.address,
            TokenRef::Address(address) => *address,
        }
    }
}

impl Network {
    /// Returns all networks this binary ships with.
    pub fn builtin() -> Vec<Network> {
        vec![flare::network()]
    }

    /// Looks up a built-in network by key or alias (case-insensitive).
    pub fn by_key(key: &str) -> Result<Network, Error> {
        let key = key.to_lowercase();
        let key = ALIASES
            .iter()
            .find_map(|(alias, name)| (*alias == key).then_some(*name))
            .unwrap_or(key.as_str());
        let networks = Self::builtin();
        let known = networks
            .iter()
            .map(|network| network.key.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        networks
            .iter()
            .find(|network| network.key == key)
            .cloned()
            .ok_or_else(|| Error::UnknownNetwork(key.to_string(), known))
    }

    /// Reads a network definition from a TOML file. The file has the same
    /// shape as the built-in tables.
    pub async fn from_path<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let contents = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("failed to read {}", path.as_ref().display()))?;
        let network: Self = toml::from_str(&contents).map_err(|err| {
            anyhow!(
                "failed to parse network config at {}: {err}",
                path.as_ref().display()
            )
        })?;
        network.validate()
    }

    /// Resolves the network for a binary invocation: an explicit config file
    /// wins over the built-in table.
    pub async fn load(key: &str, config: Option<&Path>) -> anyhow::Result<Self> {
        match config {
            Some(path) => Self::from_path(path).await,
            None => Ok(Self::by_key(key)?),
        }
    }

    fn validate(self) -> anyhow::Result<Self> {
        anyhow::ensure!(
            !self.enosys.fee_tiers.is_empty(),
            "network {} has no fee tiers configured",
            self.key
        );
        anyhow::ensure!(
            self.enosys.fee_tiers.iter().all(|fee| *fee < 1_000_000),
            "fee tiers must be below 1000000"
        );
        self.wrapped_native()?;
        anyhow::ensure!(
            self.token(&self.fassets.fasset).is_ok(),
            "fasset {} is not in the token table",
            self.fassets.fasset
        );
        Ok(self)
    }

    /// Looks a token up by symbol (case-insensitive) or address. Addresses
    /// that are not in the table resolve to [`TokenRef::Address`].
    pub fn resolve(&self, name: &str) -> Result<TokenRef<'_>, Error> {
        if let Ok(token) = self.token(name) {
            return Ok(TokenRef::Known(token));
        }
        if name.starts_with("0x") {
            if let Ok(address) = name.parse::<Address>() {
                return Ok(self
                    .tokens
                    .iter()
                    .find(|token| token.address == address)
                    .map(TokenRef::Known)
                    .unwrap_or(TokenRef::Address(address)));
            }
        }
        Err(self.unknown_token(name))
    }

    /// Like [`Self::resolve`] but maps the native currency to its wrapped
    /// token, which is what DEX contracts trade.
    pub fn resolve_dex(&self, name: &str) -> Result<TokenRef<'_>, Error> {
        if name.eq_ignore_ascii_case(&self.native_symbol) {
            return Ok(TokenRef::Known(self.wrapped_native()?));
        }
        self.resolve(name)
    }

    /// Looks a token up by symbol only.
    pub fn token(&self, symbol: &str) -> Result<&Token, Error> {
        self.tokens
            .iter()
            .find(|token| token.symbol.eq_ignore_ascii_case(symbol))
            .ok_or_else(|| self.unknown_token(symbol))
    }

    pub fn token_by_address(&self, address: Address) -> Option<&Token> {
        self.tokens.iter().find(|token| token.address == address)
    }

    pub fn wrapped_native(&self) -> Result<&Token, Error> {
        self.token_by_address(self.wrapped_native)
            .ok_or_else(|| self.unknown_token(&self.wrapped_native.to_string()))
    }

    /// The FAsset token, e.g. FXRP.
    pub fn fasset(&self) -> Result<&Token, Error> {
        self.token(&self.fassets.fasset)
    }

    /// Explorer link for a transaction hash.
    pub fn tx_url(&self, hash: impl fmt::Display) -> String {
        format!("{}/tx/{hash}", self.explorer.as_str().trim_end_matches('/'))
    }

    fn unknown_token(&self, name: &str) -> Error {
        let known = self
            .tokens
            .iter()
            .map(|token| token.symbol.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        Error::UnknownToken(name.to_string(), known)
    }
}
