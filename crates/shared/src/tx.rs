//! Transaction submission and reporting.

use {
    alloy::{
        contract::{CallBuilder, CallDecoder},
        network::TransactionBuilder,
        primitives::{Address, B256, U256},
        providers::Provider,
        rpc::types::{TransactionReceipt, TransactionRequest},
    },
    anyhow::{Context, Result},
    ethrpc::{AlloyProvider, alloy::errors::ContractErrorExt},
    std::{
        fmt,
        time::{Duration, SystemTime, UNIX_EPOCH},
    },
};

/// How long swaps and liquidity changes stay valid.
pub const DEADLINE: Duration = Duration::from_secs(5 * 60);

/// Unix timestamp `DEADLINE` from now.
pub fn deadline() -> U256 {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    U256::from((now + DEADLINE).as_secs())
}

/// The parts of a receipt the commands report.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Confirmation {
    pub hash: B256,
    pub block: Option<u64>,
    pub gas_used: u64,
}

impl From<&TransactionReceipt> for Confirmation {
    fn from(receipt: &TransactionReceipt) -> Self {
        Self {
            hash: receipt.transaction_hash,
            block: receipt.block_number,
            gas_used: receipt.gas_used,
        }
    }
}

impl fmt::Display for Confirmation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tx {}", self.hash)?;
        if let Some(block) = self.block {
            write!(f, " in block {block}")?;
        }
        write!(f, ", gas used {}", self.gas_used)
    }
}

/// Sends a contract call, waits for the receipt and fails if the
/// transaction reverted. `what` describes the call in logs and errors.
pub async fn send<D>(call: CallBuilder<&AlloyProvider, D>, what: &str) -> Result<TransactionReceipt>
where
    D: CallDecoder,
{
    let pending = call
        .send()
        .await
        .map_err(|err| anyhow::anyhow!("{what} failed: {}", err.revert_reason()))?;
    let hash = *pending.tx_hash();
    tracing::info!(%hash, "{what} submitted");
    let receipt = pending
        .get_receipt()
        .await
        .with_context(|| format!("failed to fetch receipt of {what} {hash}"))?;
    anyhow::ensure!(receipt.status(), "{what} reverted in transaction {hash}");
    tracing::debug!(%hash, block = ?receipt.block_number, gas_used = receipt.gas_used, "{what} confirmed");
    Ok(receipt)
}

/// Sends `value` of the native currency to `to` and waits for the receipt.
pub async fn transfer_native(
    provider: &AlloyProvider,
    to: Address,
    value: U256,
) -> Result<TransactionReceipt> {
    let request = TransactionRequest::default().with_to(to).with_value(value);
    let pending = provider
        .send_transaction(request)
        .await
        .context("native transfer failed")?;
    let hash = *pending.tx_hash();
    tracing::info!(%hash, %to, %value, "native transfer submitted");
    let receipt = pending
        .get_receipt()
        .await
        .with_context(|| format!("failed to fetch receipt of transfer {hash}"))?;
    anyhow::ensure!(receipt.status(), "transfer reverted in transaction {hash}");
    Ok(receipt)
}
