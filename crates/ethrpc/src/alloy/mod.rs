pub mod errors;
mod instrumentation;

use {
    crate::AlloyProvider,
    alloy::{
        network::EthereumWallet,
        providers::{Provider, ProviderBuilder},
        rpc::client::ClientBuilder,
        signers::local::PrivateKeySigner,
    },
    anyhow::Context,
    instrumentation::RpcLogLayer,
    url::Url,
};

/// Read-only provider for the given node. Every call is logged at debug
/// level under `label`.
pub fn provider(url: &Url, label: &str) -> AlloyProvider {
    let rpc = ClientBuilder::default()
        .layer(RpcLogLayer::new(label))
        .http(url.clone());
    ProviderBuilder::new().connect_client(rpc).erased()
}

/// Provider that fills nonce, gas and chain id and signs transactions with
/// the given key.
pub fn provider_with_signer(url: &Url, label: &str, signer: PrivateKeySigner) -> AlloyProvider {
    let rpc = ClientBuilder::default()
        .layer(RpcLogLayer::new(label))
        .http(url.clone());
    let wallet = EthereumWallet::new(signer);

    ProviderBuilder::new()
        .wallet(wallet)
        .connect_client(rpc)
        .erased()
}

/// Checks that the node serves the chain the network table was written for.
/// A mismatch is only logged since forks and local nodes are legitimate.
pub async fn verify_chain_id(provider: &AlloyProvider, expected: u64) -> anyhow::Result<()> {
    let actual = provider
        .get_chain_id()
        .await
        .context("failed to fetch chain id")?;
    if actual != expected {
        tracing::warn!(expected, actual, "node reports an unexpected chain id");
    }
    Ok(())
}
