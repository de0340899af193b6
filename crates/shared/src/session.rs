use {
    crate::arguments::Arguments,
    alloy::primitives::Address,
    anyhow::{Context, Result},
    chain::Network,
    ethrpc::{AlloyProvider, keystore::Credentials},
    url::Url,
};

/// Everything a command needs to talk to the network: the immutable network
/// table, a read-only provider and the credentials for signing.
pub struct Session {
    pub network: Network,
    pub provider: AlloyProvider,
    node_url: Url,
    credentials: Credentials,
    label: String,
}

/// A provider that signs with the keystore key.
pub struct Signer {
    pub address: Address,
    pub provider: AlloyProvider,
}

impl Session {
    /// `label` names the binary in RPC traces.
    pub async fn new(args: &Arguments, label: &str) -> Result<Self> {
        let network = args.network().await?;
        let node_url = args.node_url(&network);
        tracing::debug!(network = %network.key, %node_url, "using network");
        Ok(Self {
            provider: ethrpc::alloy::provider(&node_url, label),
            network,
            node_url,
            credentials: args.credentials(),
            label: label.to_string(),
        })
    }

    /// The account to inspect: the explicit address, or the one of the
    /// configured keystore.
    pub fn owner(&self, explicit: Option<Address>) -> Result<Address> {
        match explicit {
            Some(address) => Ok(address),
            None => self
                .credentials
                .address()
                .context("no address given, pass --address, set AGENT_WALLET or configure a keystore"),
        }
    }

    /// Decrypts the keystore and returns a signing provider. The node's chain
    /// id is checked against the network table first.
    pub async fn signer(&self) -> Result<Signer> {
        let key = self.credentials.signer().await?;
        let address = key.address();
        let provider = ethrpc::alloy::provider_with_signer(&self.node_url, &self.label, key);
        ethrpc::alloy::verify_chain_id(&provider, self.network.chain_id).await?;
        tracing::info!(%address, network = %self.network.name, "signer ready");
        Ok(Signer { address, provider })
    }
}
