//! Websocket JSON-RPC client for rippled.
//!
//! A single connection is opened lazily and shared. Requests are serialized
//! over it and responses are matched to requests by id, anything else the
//! server sends in between is skipped.

use {
    crate::{address::ClassicAddress, amount},
    async_trait::async_trait,
    futures::{SinkExt, StreamExt},
    serde::{Deserialize, de::DeserializeOwned},
    serde_json::{Value, json},
    std::{
        fmt,
        sync::{
            Once,
            atomic::{AtomicU64, Ordering},
        },
        time::Instant,
    },
    tokio::{net::TcpStream, sync::Mutex},
    tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message},
    url::Url,
};

type Stream = WebSocketStream<MaybeTlsStream<TcpStream>>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("XRPL websocket error: {0}")]
    Transport(Box<tokio_tungstenite::tungstenite::Error>),
    #[error("XRPL connection closed")]
    Closed,
    #[error("malformed XRPL response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("XRPL account {0} not found: it is not activated, send it at least 1 XRP first")]
    AccountNotFound(String),
    #[error("XRPL request failed: {error}: {message}")]
    Rpc { error: String, message: String },
}

impl From<tokio_tungstenite::tungstenite::Error> for Error {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        Self::Transport(Box::new(err))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccountInfo {
    pub account: ClassicAddress,
    pub balance_drops: u64,
    pub sequence: u32,
}

impl AccountInfo {
    pub fn available_drops(&self) -> u64 {
        amount::available(self.balance_drops)
    }
}

/// An amount as the ledger reports it: XRP as a drops string, issued
/// currencies as an object.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum Amount {
    Drops(String),
    Issued { value: String, currency: String },
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Drops(drops) => match drops.parse() {
                Ok(drops) => write!(f, "{} XRP", amount::format_xrp(drops)),
                Err(_) => f.write_str(drops),
            },
            Self::Issued { value, currency } => write!(f, "{value} {currency}"),
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct TransactionJson {
    pub transaction_type: String,
    pub account: String,
    pub destination: Option<String>,
    pub amount: Option<Amount>,
    #[serde(rename = "hash")]
    pub hash: Option<String>,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct TransactionMeta {
    pub transaction_result: String,
    #[serde(rename = "delivered_amount")]
    pub delivered_amount: Option<Amount>,
}

/// One entry of an account's history.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct AccountTransaction {
    #[serde(alias = "tx_json")]
    pub tx: TransactionJson,
    pub meta: TransactionMeta,
    pub hash: Option<String>,
    #[serde(default)]
    pub validated: bool,
}

impl AccountTransaction {
    pub fn hash(&self) -> Option<&str> {
        self.hash.as_deref().or(self.tx.hash.as_deref())
    }

    /// Amount that actually arrived, falling back to the requested amount.
    pub fn delivered(&self) -> Option<&Amount> {
        self.meta.delivered_amount.as_ref().or(self.tx.amount.as_ref())
    }

    pub fn is_incoming(&self, account: &ClassicAddress) -> bool {
        self.tx.destination.as_deref() == Some(account.to_string().as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Fee {
    pub base_fee: u64,
    pub open_ledger_fee: u64,
}

impl Fee {
    pub fn recommended(&self) -> u64 {
        self.base_fee.max(self.open_ledger_fee)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubmitResult {
    pub engine_result: String,
    pub engine_result_message: String,
}

impl SubmitResult {
    /// Codes that mean the transaction will never make it into a ledger.
    pub fn is_final_failure(&self) -> bool {
        ["tem", "tef", "tel"]
            .iter()
            .any(|prefix| self.engine_result.starts_with(prefix))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransactionStatus {
    pub validated: bool,
    pub result: Option<String>,
}

#[cfg_attr(any(test, feature = "test-util"), mockall::automock)]
#[async_trait]
pub trait Ledger: Send + Sync {
    async fn account_info(&self, account: &ClassicAddress) -> Result<AccountInfo, Error>;
    async fn account_tx(
        &self,
        account: &ClassicAddress,
        limit: u32,
    ) -> Result<Vec<AccountTransaction>, Error>;
    async fn fee(&self) -> Result<Fee, Error>;
    async fn ledger_current(&self) -> Result<u32, Error>;
    async fn submit(&self, tx_blob: &[u8]) -> Result<SubmitResult, Error>;
    /// `None` while the server does not know the transaction.
    async fn tx(&self, hash: &str) -> Result<Option<TransactionStatus>, Error>;
}

pub struct Client {
    url: Url,
    stream: Mutex<Option<Stream>>,
    next_id: AtomicU64,
}

static INSTALL_PROVIDER: Once = Once::new();

/// TLS connections need a process wide crypto provider.
fn install_crypto_provider() {
    INSTALL_PROVIDER.call_once(|| {
        if rustls::crypto::CryptoProvider::get_default().is_none() {
            if let Err(err) = rustls::crypto::aws_lc_rs::default_provider().install_default() {
                tracing::debug!(?err, "failed to install crypto provider");
            }
        }
    });
}

impl Client {
    pub fn new(url: Url) -> Self {
        install_crypto_provider();
        Self {
            url,
            stream: Mutex::new(None),
            next_id: AtomicU64::new(1),
        }
    }

    async fn request<T: DeserializeOwned>(&self, command: &str, params: Value) -> Result<T, Error> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let mut request = match params {
            Value::Object(params) => params,
            _ => Default::default(),
        };
        request.insert("id".into(), id.into());
        request.insert("command".into(), command.into());

        let start = Instant::now();
        let mut guard = self.stream.lock().await;
        if guard.is_none() {
            let (stream, _) = connect_async(self.url.as_str()).await?;
            tracing::debug!(url = %self.url, "connected to XRPL node");
            *guard = Some(stream);
        }
        let result = match guard.as_mut() {
            Some(stream) => exchange(stream, id, Value::Object(request)).await,
            None => Err(Error::Closed),
        };
        if matches!(result, Err(Error::Transport(_) | Error::Closed)) {
            *guard = None;
        }
        drop(guard);
        tracing::debug!(command, id, elapsed = ?start.elapsed(), ok = result.is_ok(), "XRPL request");
        Ok(serde_json::from_value(result?)?)
    }
}

#[derive(Deserialize)]
struct Response {
    id: Option<u64>,
    result: Option<Value>,
    error: Option<String>,
    error_message: Option<String>,
}

async fn exchange(stream: &mut Stream, id: u64, request: Value) -> Result<Value, Error> {
    stream.send(Message::Text(request.to_string().into())).await?;
    loop {
        let text = match stream.next().await.ok_or(Error::Closed)?? {
            Message::Text(text) => text,
            Message::Close(_) => return Err(Error::Closed),
            _ => continue,
        };
        let response: Response = serde_json::from_str(&text)?;
        if response.id != Some(id) {
            tracing::trace!(?response.id, "skipping unrelated XRPL message");
            continue;
        }
        return into_result(response);
    }
}

fn into_result(response: Response) -> Result<Value, Error> {
    let result = response.result.unwrap_or_default();
    let error = response.error.or_else(|| {
        result
            .get("error")
            .and_then(Value::as_str)
            .map(str::to_string)
    });
    let Some(error) = error else {
        return Ok(result);
    };
    let message = response
        .error_message
        .or_else(|| {
            result
                .get("error_message")
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_default();
    Err(Error::Rpc { error, message })
}

/// rippled encodes most integers as strings.
fn parse_drops(value: &str) -> Result<u64, Error> {
    value.parse().map_err(|_| Error::Rpc {
        error: "invalidResponse".into(),
        message: format!("expected drops, got {value:?}"),
    })
}

#[derive(Deserialize)]
struct AccountInfoResult {
    account_data: AccountData,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AccountData {
    account: ClassicAddress,
    balance: String,
    sequence: u32,
}

#[derive(Deserialize)]
struct AccountTxResult {
    transactions: Vec<AccountTransaction>,
}

#[derive(Deserialize)]
struct FeeResult {
    drops: FeeDrops,
}

#[derive(Deserialize)]
struct FeeDrops {
    base_fee: String,
    open_ledger_fee: String,
}

#[derive(Deserialize)]
struct LedgerCurrentResult {
    ledger_current_index: u32,
}

#[derive(Deserialize)]
struct SubmitResponse {
    engine_result: String,
    #[serde(default)]
    engine_result_message: String,
}

#[derive(Deserialize)]
struct TxResult {
    #[serde(default)]
    validated: bool,
    meta: Option<TxMeta>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct TxMeta {
    transaction_result: String,
}

#[async_trait]
impl Ledger for Client {
    async fn account_info(&self, account: &ClassicAddress) -> Result<AccountInfo, Error> {
        let params = json!({
            "account": account.to_string(),
            "ledger_index": "validated",
        });
        let result: AccountInfoResult = match self.request("account_info", params).await {
            Err(Error::Rpc { error, .. }) if error == "actNotFound" => {
                return Err(Error::AccountNotFound(account.to_string()));
            }
            result => result?,
        };
        Ok(AccountInfo {
            account: result.account_data.account,
            balance_drops: parse_drops(&result.account_data.balance)?,
            sequence: result.account_data.sequence,
        })
    }

    async fn account_tx(
        &self,
        account: &ClassicAddress,
        limit: u32,
    ) -> Result<Vec<AccountTransaction>, Error> {
        let params = json!({
            "account": account.to_string(),
            "limit": limit,
            "ledger_index_min": -1,
            "ledger_index_max": -1,
        });
        match self.request::<AccountTxResult>("account_tx", params).await {
            Ok(result) => Ok(result.transactions),
            Err(Error::Rpc { error, .. }) if error == "actNotFound" => {
                Err(Error::AccountNotFound(account.to_string()))
            }
            Err(err) => Err(err),
        }
    }

    async fn fee(&self) -> Result<Fee, Error> {
        let result: FeeResult = self.request("fee", json!({})).await?;
        Ok(Fee {
            base_fee: parse_drops(&result.drops.base_fee)?,
            open_ledger_fee: parse_drops(&result.drops.open_ledger_fee)?,
        })
    }

    async fn ledger_current(&self) -> Result<u32, Error> {
        let result: LedgerCurrentResult = self.request("ledger_current", json!({})).await?;
        Ok(result.ledger_current_index)
    }

    async fn submit(&self, tx_blob: &[u8]) -> Result<SubmitResult, Error> {
        let params = json!({ "tx_blob": hex::encode_upper(tx_blob) });
        let result: SubmitResponse = self.request("submit", params).await?;
        Ok(SubmitResult {
            engine_result: result.engine_result,
            engine_result_message: result.engine_result_message,
        })
    }

    async fn tx(&self, hash: &str) -> Result<Option<TransactionStatus>, Error> {
        let params = json!({ "transaction": hash, "binary": false });
        match self.request::<TxResult>("tx", params).await {
            Ok(result) => Ok(Some(TransactionStatus {
                validated: result.validated,
                result: result.meta.map(|meta| meta.transaction_result),
            })),
            Err(Error::Rpc { error, .. }) if error == "txnNotFound" => Ok(None),
            Err(err) => Err(err),
        }
    }
}
