//! XRP Ledger wallet commands.

use {
    crate::arguments::XrplCommand,
    anyhow::{Context, Result},
    shared::arguments::XrplArguments,
    std::fmt::Write,
    xrpl::{
        ClassicAddress,
        Ledger,
        Wallet,
        amount::{self, BASE_RESERVE_DROPS, format_xrp},
        client::{AccountInfo, AccountTransaction, Error as LedgerError},
        codec::Memo,
        wallet::PaymentRequest,
    },
};

pub async fn run(args: &XrplArguments, command: &XrplCommand) -> Result<()> {
    match command {
        XrplCommand::Generate { save } => generate(save.as_deref()).await,
        XrplCommand::Balance => {
            let wallet = args.wallet().await?;
            balance(&args.client(), &wallet.address()).await
        }
        XrplCommand::History { limit } => {
            let wallet = args.wallet().await?;
            history(&args.client(), &wallet.address(), *limit).await
        }
        XrplCommand::Send {
            to,
            amount,
            memo,
            tag,
        } => {
            let destination: ClassicAddress = to.parse()?;
            let drops = amount::parse_xrp(amount)?;
            let wallet = args.wallet().await?;
            let request = PaymentRequest {
                destination,
                amount_drops: drops,
                destination_tag: *tag,
                memos: memo.iter().map(|memo| Memo::text(memo.as_bytes())).collect(),
            };
            send(&args.client(), &wallet, request).await
        }
    }
}

/// `None` for accounts that were never activated.
async fn account(ledger: &dyn Ledger, address: &ClassicAddress) -> Result<Option<AccountInfo>> {
    match ledger.account_info(address).await {
        Ok(info) => Ok(Some(info)),
        Err(LedgerError::AccountNotFound(_)) => Ok(None),
        Err(err) => Err(err.into()),
    }
}

async fn balance(ledger: &dyn Ledger, address: &ClassicAddress) -> Result<()> {
    let balance = account(ledger, address)
        .await?
        .map(|info| info.balance_drops)
        .unwrap_or_default();
    println!("XRPL wallet {address}");
    println!("  Balance:   {} XRP", format_xrp(balance));
    println!("  Reserve:   {} XRP", format_xrp(BASE_RESERVE_DROPS));
    println!("  Available: {} XRP", format_xrp(amount::available(balance)));
    if balance == 0 {
        println!("  Not activated, send at least 1 XRP to this address.");
    }
    Ok(())
}

async fn history(ledger: &dyn Ledger, address: &ClassicAddress, limit: u32) -> Result<()> {
    let transactions = match ledger.account_tx(address, limit).await {
        Ok(transactions) => transactions,
        Err(LedgerError::AccountNotFound(_)) => Vec::new(),
        Err(err) => return Err(err.into()),
    };
    println!("XRPL history of {address} (last {limit})");
    if transactions.is_empty() {
        println!("  No transactions.");
    }
    for transaction in &transactions {
        print!("{}", render_transaction(transaction, address));
    }
    Ok(())
}

pub fn render_transaction(transaction: &AccountTransaction, address: &ClassicAddress) -> String {
    let incoming = transaction.is_incoming(address);
    let (direction, counterparty) = if incoming {
        ("RECV", Some(transaction.tx.account.as_str()))
    } else {
        ("SENT", transaction.tx.destination.as_deref())
    };
    let amount = transaction
        .delivered()
        .map(ToString::to_string)
        .unwrap_or_else(|| "?".to_string());
    let mut out = String::new();
    // Writing to a string never fails.
    let _ = writeln!(
        out,
        "  {direction} {amount} {} {}",
        if incoming { "from" } else { "to" },
        counterparty.unwrap_or("-")
    );
    let _ = writeln!(
        out,
        "    {} {} | {}",
        transaction.tx.transaction_type,
        transaction.hash().unwrap_or("-"),
        transaction.meta.transaction_result
    );
    out
}

/// Checks a payment before signing it: the sender keeps its reserve and new
/// accounts are only created with at least the reserve.
pub async fn preflight(
    ledger: &dyn Ledger,
    from: &ClassicAddress,
    request: &PaymentRequest,
) -> Result<AccountInfo> {
    let (sender, recipient) = futures::try_join!(
        account(ledger, from),
        account(ledger, &request.destination),
    )?;
    let sender = sender.with_context(|| {
        format!("XRPL account {from} is not activated, fund it with at least 1 XRP first")
    })?;
    anyhow::ensure!(
        request.amount_drops <= sender.available_drops(),
        "insufficient XRP: need {} XRP, only {} XRP available after the 1 XRP reserve",
        format_xrp(request.amount_drops),
        format_xrp(sender.available_drops())
    );
    anyhow::ensure!(
        recipient.is_some() || request.amount_drops >= BASE_RESERVE_DROPS,
        "destination {} is not activated, send at least 1 XRP to activate it",
        request.destination
    );
    Ok(sender)
}

async fn send(ledger: &dyn Ledger, wallet: &Wallet, request: PaymentRequest) -> Result<()> {
    let from = wallet.address();
    let sender = preflight(ledger, &from, &request).await?;
    println!("XRPL send");
    println!("  From:      {from}");
    println!("  To:        {}", request.destination);
    println!("  Amount:    {} XRP", format_xrp(request.amount_drops));
    println!("  Balance:   {} XRP", format_xrp(sender.balance_drops));
    if let Some(tag) = request.destination_tag {
        println!("  Dest tag:  {tag}");
    }

    let destination = request.destination;
    let drops = request.amount_drops;
    let submitted = wallet.send_payment(ledger, request).await?;
    println!("  Tx:        {}", submitted.hash);
    println!("  Result:    {}", submitted.result);
    anyhow::ensure!(
        submitted.is_success(),
        "payment {} failed with {}",
        submitted.hash,
        submitted.result
    );
    if let Some(info) = account(ledger, &from).await? {
        println!("  Remaining: {} XRP", format_xrp(info.balance_drops));
    }
    println!("Sent {} XRP to {destination}", format_xrp(drops));
    Ok(())
}

async fn generate(save: Option<&std::path::Path>) -> Result<()> {
    let wallet = Wallet::generate()?;
    println!("New XRPL wallet");
    println!("  Address: {}", wallet.address());
    match save {
        Some(path) => {
            let path = wallet.save(path).await?;
            println!("  Saved to {} (owner read/write only)", path.display());
        }
        None => {
            if let Some(seed) = wallet.seed() {
                println!("  Secret:  {seed}");
            }
            println!("Store the secret safely, it cannot be recovered. Pass --save PATH to write it");
            println!("to a file instead.");
        }
    }
    println!("Send at least 1 XRP to the address to activate it.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        xrpl::client::{Amount, MockLedger, TransactionJson, TransactionMeta},
    };

    const SENDER: [u8; 20] = [1; 20];
    const RECIPIENT: [u8; 20] = [2; 20];

    fn request(amount_drops: u64) -> PaymentRequest {
        PaymentRequest {
            destination: ClassicAddress::from_account_id(RECIPIENT),
            amount_drops,
            destination_tag: None,
            memos: Vec::new(),
        }
    }

    fn ledger(sender_drops: u64, recipient_active: bool) -> MockLedger {
        let mut ledger = MockLedger::new();
        ledger.expect_account_info().returning(move |account| {
            if *account.account_id() == SENDER {
                Ok(AccountInfo {
                    account: *account,
                    balance_drops: sender_drops,
                    sequence: 1,
                })
            } else if recipient_active {
                Ok(AccountInfo {
                    account: *account,
                    balance_drops: 50_000_000,
                    sequence: 9,
                })
            } else {
                Err(LedgerError::AccountNotFound(account.to_string()))
            }
        });
        ledger
    }

    #[tokio::test]
    async fn keeps_the_reserve() {
        let from = ClassicAddress::from_account_id(SENDER);
        let ledger = ledger(10_000_000, true);
        assert!(preflight(&ledger, &from, &request(9_000_000)).await.is_ok());
        let err = preflight(&ledger, &from, &request(9_000_001))
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "insufficient XRP: need 9.000001 XRP, only 9.0 XRP available after the 1 XRP reserve"
        );
    }

    #[tokio::test]
    async fn small_payments_cannot_activate_accounts() {
        let from = ClassicAddress::from_account_id(SENDER);
        let ledger = ledger(10_000_000, false);
        let err = preflight(&ledger, &from, &request(500_000))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("is not activated"));
        assert!(preflight(&ledger, &from, &request(1_000_000)).await.is_ok());
    }

    #[tokio::test]
    async fn unactivated_sender_cannot_pay() {
        let from = ClassicAddress::from_account_id([3; 20]);
        let ledger = ledger(0, false);
        let err = preflight(&ledger, &from, &request(1_000_000))
            .await
            .unwrap_err();
        assert!(err.to_string().contains(&format!("XRPL account {from} is not activated")));
    }

    #[test]
    fn renders_incoming_payments_with_delivered_amount() {
        let me = ClassicAddress::from_account_id(SENDER);
        let other = ClassicAddress::from_account_id(RECIPIENT);
        let transaction = AccountTransaction {
            tx: TransactionJson {
                transaction_type: "Payment".to_string(),
                account: other.to_string(),
                destination: Some(me.to_string()),
                amount: Some(Amount::Drops("20000000".to_string())),
                hash: None,
            },
            meta: TransactionMeta {
                transaction_result: "tesSUCCESS".to_string(),
                delivered_amount: Some(Amount::Drops("19500000".to_string())),
            },
            hash: Some("ABCD".to_string()),
            validated: true,
        };
        assert_eq!(
            render_transaction(&transaction, &me),
            format!("  RECV 19.5 XRP from {other}\n    Payment ABCD | tesSUCCESS\n")
        );
    }
}
