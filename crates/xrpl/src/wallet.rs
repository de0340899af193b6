//! Wallet file handling and payment submission.
//!
//! Wallet files are JSON objects with the classic `address` and the family
//! seed under `secret` (or `seed`), optionally with hex `publicKey` and
//! `privateKey`. A file with only a private key is accepted too.

use {
    crate::{
        address::ClassicAddress,
        client::Ledger,
        codec::{Memo, Payment},
        keys::{Keypair, Seed},
    },
    anyhow::{Context, Result},
    serde::{Deserialize, Serialize},
    std::{
        path::{Path, PathBuf},
        time::Duration,
    },
};

/// Ledgers a payment stays valid for after submission.
const LEDGER_OFFSET: u32 = 20;
/// Upper bound for network fees, 2 XRP.
const MAX_FEE_DROPS: u64 = 2_000_000;
const VALIDATION_POLL_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
struct WalletFile {
    #[serde(skip_serializing_if = "Option::is_none")]
    address: Option<ClassicAddress>,
    #[serde(alias = "seed", skip_serializing_if = "Option::is_none")]
    secret: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    public_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    private_key: Option<String>,
}

/// Replaces a leading `~` with the home directory.
pub fn expand_home(path: &Path) -> PathBuf {
    match (path.strip_prefix("~"), std::env::var_os("HOME")) {
        (Ok(rest), Some(home)) => PathBuf::from(home).join(rest),
        _ => path.to_path_buf(),
    }
}

#[derive(Debug)]
pub struct Wallet {
    keypair: Keypair,
    seed: Option<Seed>,
    address: ClassicAddress,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PaymentRequest {
    pub destination: ClassicAddress,
    pub amount_drops: u64,
    pub destination_tag: Option<u32>,
    pub memos: Vec<Memo>,
}

/// A payment that made it into a validated ledger.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Submitted {
    pub hash: String,
    pub result: String,
}

impl Submitted {
    pub fn is_success(&self) -> bool {
        self.result == "tesSUCCESS"
    }
}

impl Wallet {
    pub fn from_seed(seed: Seed) -> Result<Self> {
        let keypair = seed.keypair()?;
        Ok(Self {
            address: keypair.address(),
            keypair,
            seed: Some(seed),
        })
    }

    /// New wallet with a random ed25519 seed.
    pub fn generate() -> Result<Self> {
        Self::from_seed(Seed::random())
    }

    pub async fn load(path: &Path) -> Result<Self> {
        let path = expand_home(path);
        let contents = tokio::fs::read_to_string(&path).await.with_context(|| {
            format!(
                "failed to read XRPL wallet {} (set XRPL_WALLET or pass --xrpl-wallet)",
                path.display()
            )
        })?;
        let file: WalletFile = serde_json::from_str(&contents)
            .with_context(|| format!("invalid XRPL wallet file {}", path.display()))?;
        let wallet = match (&file.secret, &file.private_key) {
            (Some(secret), _) => Self::from_seed(secret.parse().context("invalid wallet secret")?)?,
            (None, Some(private_key)) => {
                let keypair = Keypair::from_private_hex(private_key)?;
                Self {
                    address: keypair.address(),
                    keypair,
                    seed: None,
                }
            }
            (None, None) => anyhow::bail!(
                "XRPL wallet {} contains neither a secret nor a private key",
                path.display()
            ),
        };
        if let Some(address) = file.address {
            anyhow::ensure!(
                address == wallet.address,
                "XRPL wallet {} lists address {address} but its key controls {}",
                path.display(),
                wallet.address
            );
        }
        tracing::debug!(address = %wallet.address, "loaded XRPL wallet");
        Ok(wallet)
    }

    /// Writes the wallet as a new file readable only by the owner. Existing
    /// files are never overwritten.
    pub async fn save(&self, path: &Path) -> Result<PathBuf> {
        let path = expand_home(path);
        if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(dir).await?;
        }
        let file = WalletFile {
            address: Some(self.address),
            secret: self.seed.as_ref().map(ToString::to_string),
            public_key: Some(hex::encode_upper(self.keypair.public_key())),
            private_key: Some(self.keypair.private_key_hex()),
        };
        let mut options = tokio::fs::OpenOptions::new();
        options.write(true).create_new(true);
        #[cfg(unix)]
        options.mode(0o600);
        let mut handle = options
            .open(&path)
            .await
            .with_context(|| format!("failed to create {}", path.display()))?;
        let contents = serde_json::to_vec_pretty(&file)?;
        tokio::io::AsyncWriteExt::write_all(&mut handle, &contents).await?;
        Ok(path)
    }

    pub fn address(&self) -> ClassicAddress {
        self.address
    }

    pub fn seed(&self) -> Option<&Seed> {
        self.seed.as_ref()
    }

    pub fn keypair(&self) -> &Keypair {
        &self.keypair
    }

    /// Fills in sequence, fee and expiry, signs, submits and waits until the
    /// payment is validated or can no longer be included.
    pub async fn send_payment(
        &self,
        ledger: &dyn Ledger,
        request: PaymentRequest,
    ) -> Result<Submitted> {
        let (info, fee, current) = futures::try_join!(
            ledger.account_info(&self.address),
            ledger.fee(),
            ledger.ledger_current(),
        )?;
        let fee = fee.recommended();
        anyhow::ensure!(
            fee <= MAX_FEE_DROPS,
            "XRPL network fee of {fee} drops is unusually high, try again later"
        );
        let last_ledger = current + LEDGER_OFFSET;
        let payment = Payment {
            account: self.address,
            destination: request.destination,
            amount_drops: request.amount_drops,
            fee_drops: fee,
            sequence: info.sequence,
            flags: 0,
            destination_tag: request.destination_tag,
            last_ledger_sequence: Some(last_ledger),
            memos: request.memos,
            signing_pub_key: Vec::new(),
            txn_signature: None,
        };
        let signed = payment.sign(&self.keypair)?;

        tracing::info!(hash = %signed.hash, to = %request.destination, drops = request.amount_drops, "submitting XRPL payment");
        let submitted = ledger.submit(&signed.blob).await?;
        anyhow::ensure!(
            !submitted.is_final_failure(),
            "XRPL payment rejected: {} ({})",
            submitted.engine_result,
            submitted.engine_result_message
        );
        tracing::debug!(result = %submitted.engine_result, "preliminary result");

        let result = wait_for_validation(ledger, &signed.hash, last_ledger).await?;
        Ok(Submitted {
            hash: signed.hash,
            result,
        })
    }
}

/// Polls until the transaction is validated and returns its result code.
async fn wait_for_validation(ledger: &dyn Ledger, hash: &str, last_ledger: u32) -> Result<String> {
    loop {
        tokio::time::sleep(VALIDATION_POLL_INTERVAL).await;
        if let Some(result) = validated_result(ledger, hash).await {
            return Ok(result);
        }
        let current = ledger.ledger_current().await?;
        if current > last_ledger {
            // It may have been validated in `last_ledger` after the lookup above.
            return validated_result(ledger, hash).await.with_context(|| {
                format!("XRPL payment {hash} was not validated before ledger {last_ledger}")
            });
        }
    }
}

/// Result code of a validated transaction, `None` while it is pending or
/// the lookup failed.
async fn validated_result(ledger: &dyn Ledger, hash: &str) -> Option<String> {
    match ledger.tx(hash).await {
        Ok(Some(status)) if status.validated => Some(status.result.unwrap_or_default()),
        Ok(_) => None,
        Err(err) => {
            tracing::debug!(?err, "failed to look up transaction");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::client::{AccountInfo, Fee, MockLedger, SubmitResult, TransactionStatus},
        std::sync::{
            Arc,
            atomic::{AtomicU32, Ordering},
        },
    };

    fn request() -> PaymentRequest {
        PaymentRequest {
            destination: ClassicAddress::from_account_id([7; 20]),
            amount_drops: 10_050_000,
            destination_tag: None,
            memos: vec![Memo::text("4642505266410001")],
        }
    }

    fn ledger(wallet: &Wallet, engine_result: &'static str) -> MockLedger {
        let address = wallet.address();
        let mut ledger = MockLedger::new();
        ledger.expect_account_info().returning(move |_| {
            Ok(AccountInfo {
                account: address,
                balance_drops: 50_000_000,
                sequence: 3,
            })
        });
        ledger.expect_fee().returning(|| {
            Ok(Fee {
                base_fee: 10,
                open_ledger_fee: 10,
            })
        });
        ledger.expect_submit().times(1).returning(move |_| {
            Ok(SubmitResult {
                engine_result: engine_result.into(),
                engine_result_message: String::new(),
            })
        });
        ledger
    }

    #[tokio::test(start_paused = true)]
    async fn waits_for_validation() {
        let wallet = Wallet::generate().unwrap();
        let mut ledger = ledger(&wallet, "tesSUCCESS");
        ledger.expect_ledger_current().returning(|| Ok(100));
        let lookups = Arc::new(AtomicU32::new(0));
        ledger.expect_tx().returning({
            let lookups = lookups.clone();
            move |_| {
                let validated = lookups.fetch_add(1, Ordering::SeqCst) >= 2;
                Ok(Some(TransactionStatus {
                    validated,
                    result: Some("tesSUCCESS".into()),
                }))
            }
        });

        let submitted = wallet.send_payment(&ledger, request()).await.unwrap();
        assert!(submitted.is_success());
        assert_eq!(submitted.hash.len(), 64);
        assert_eq!(lookups.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn rejected_payments_fail_immediately() {
        let wallet = Wallet::generate().unwrap();
        let mut ledger = ledger(&wallet, "temBAD_AMOUNT");
        ledger.expect_ledger_current().returning(|| Ok(100));
        ledger.expect_tx().never();

        let err = wallet.send_payment(&ledger, request()).await.unwrap_err();
        assert!(err.to_string().contains("temBAD_AMOUNT"));
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_last_ledger() {
        let wallet = Wallet::generate().unwrap();
        let mut ledger = ledger(&wallet, "tesSUCCESS");
        let ledgers = Arc::new(AtomicU32::new(100));
        ledger.expect_ledger_current().returning({
            let ledgers = ledgers.clone();
            move || Ok(ledgers.fetch_add(5, Ordering::SeqCst))
        });
        ledger.expect_tx().returning(|_| Ok(None));

        let err = wallet.send_payment(&ledger, request()).await.unwrap_err();
        assert!(err.to_string().contains("not validated before ledger 120"));
    }

    #[tokio::test(start_paused = true)]
    async fn validation_in_the_last_ledger_counts() {
        let wallet = Wallet::generate().unwrap();
        let mut ledger = ledger(&wallet, "tesSUCCESS");
        let ledgers = Arc::new(AtomicU32::new(100));
        ledger.expect_ledger_current().returning({
            let ledgers = ledgers.clone();
            move || Ok(ledgers.fetch_add(25, Ordering::SeqCst))
        });
        let lookups = Arc::new(AtomicU32::new(0));
        ledger.expect_tx().returning({
            let lookups = lookups.clone();
            move |_| {
                // Missed by the regular lookups, seen once the ledger passed.
                let validated = lookups.fetch_add(1, Ordering::SeqCst) >= 1;
                Ok(Some(TransactionStatus {
                    validated,
                    result: Some("tesSUCCESS".into()),
                }))
            }
        });

        let submitted = wallet.send_payment(&ledger, request()).await.unwrap();
        assert!(submitted.is_success());
        assert_eq!(lookups.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn refuses_excessive_fees() {
        let wallet = Wallet::generate().unwrap();
        let mut ledger = MockLedger::new();
        ledger.expect_account_info().returning(|_| {
            Ok(AccountInfo {
                account: ClassicAddress::from_account_id([1; 20]),
                balance_drops: 50_000_000,
                sequence: 3,
            })
        });
        ledger.expect_fee().returning(|| {
            Ok(Fee {
                base_fee: 10,
                open_ledger_fee: 5_000_000,
            })
        });
        ledger.expect_ledger_current().returning(|| Ok(100));
        ledger.expect_submit().never();

        assert!(wallet.send_payment(&ledger, request()).await.is_err());
    }

    #[tokio::test]
    async fn saves_and_loads_wallet_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("wallet.json");
        let wallet = Wallet::generate().unwrap();
        wallet.save(&path).await.unwrap();

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }

        let loaded = Wallet::load(&path).await.unwrap();
        assert_eq!(loaded.address(), wallet.address());
        assert_eq!(loaded.seed(), wallet.seed());
        assert!(wallet.save(&path).await.is_err());
    }

    #[tokio::test]
    async fn loads_seed_alias_and_checks_address() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wallet.json");
        std::fs::write(
            &path,
            r#"{"address": "rHb9CJAWyB4rj91VRWn96DkukG4bwdtyTh", "seed": "snoPBrXtMeMyMHUVTgbuqAfg1SUTb"}"#,
        )
        .unwrap();
        let wallet = Wallet::load(&path).await.unwrap();
        assert_eq!(
            wallet.address().to_string(),
            "rHb9CJAWyB4rj91VRWn96DkukG4bwdtyTh"
        );

        std::fs::write(
            &path,
            r#"{"address": "rrrrrrrrrrrrrrrrrrrrBZbvji", "secret": "snoPBrXtMeMyMHUVTgbuqAfg1SUTb"}"#,
        )
        .unwrap();
        let err = Wallet::load(&path).await.unwrap_err();
        assert!(err.to_string().contains("its key controls"));

        std::fs::write(&path, r#"{"address": "rrrrrrrrrrrrrrrrrrrrBZbvji"}"#).unwrap();
        assert!(Wallet::load(&path).await.is_err());
    }

    #[test]
    fn expands_home() {
        if let Some(home) = std::env::var_os("HOME") {
            assert_eq!(
                expand_home(Path::new("~/.secrets/xrpl-wallet.json")),
                PathBuf::from(home).join(".secrets/xrpl-wallet.json")
            );
        }
        assert_eq!(expand_home(Path::new("/tmp/w.json")), PathBuf::from("/tmp/w.json"));
    }
}
