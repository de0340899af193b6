//! Read-only commands: parameters, agents and XRPL account status.

use {
    crate::asset_manager::{Agent, AssetManager, UNLIMITED_LOTS},
    alloy::primitives::{Address, U256},
    anyhow::Result,
    chain::Token,
    number::{format_amount, units::to_f64},
    shared::{erc20, session::Session},
    std::fmt::Write,
    xrpl::{
        ClassicAddress,
        Ledger,
        amount::format_xrp,
        client::{AccountTransaction, Error as LedgerError},
    },
};

/// Transactions shown by `status`.
const RECENT_TRANSACTIONS: u32 = 5;

pub async fn info(session: &Session, manager: &dyn AssetManager, owner: Option<Address>) -> Result<()> {
    let network = &session.network;
    let fasset = network.fasset()?;
    let (lot_size, decimals, fee) = futures::try_join!(
        manager.lot_size(),
        manager.minting_decimals(),
        manager.reservation_fee(1),
    )?;
    println!("FAssets");
    println!("  {fasset} token:       {}", fasset.address);
    println!("  Asset manager:    {}", network.fassets.asset_manager);
    println!(
        "  Lot size:         {} {fasset}",
        format_amount(lot_size, fasset.decimals)
    );
    println!("  Decimals:         {decimals}");
    println!(
        "  Reservation fee:  {} {} per lot",
        format_amount(fee, 18),
        network.native_symbol
    );
    if let Some(owner) = owner {
        let balance = erc20::balance(&session.provider, fasset.address, owner).await?;
        println!(
            "  {fasset} balance:     {}",
            format_amount(balance, fasset.decimals)
        );
        println!(
            "  Redeemable lots:  {}",
            redeemable_lots(balance, lot_size)
        );
    }
    Ok(())
}

/// Whole lots covered by `balance`.
pub fn redeemable_lots(balance: U256, lot_size: U256) -> U256 {
    balance.checked_div(lot_size).unwrap_or_default()
}

pub async fn agents(manager: &dyn AssetManager) -> Result<()> {
    let agents = manager.available_agents().await?;
    print!("{}", render_agents(&agents));
    Ok(())
}

pub fn render_agents(agents: &[Agent]) -> String {
    let mut out = String::new();
    // Writing to a string never fails.
    let _ = writeln!(out, "Available agents");
    let with_capacity: Vec<_> = agents.iter().filter(|agent| agent.can_mint(1)).collect();
    for agent in &with_capacity {
        let lots = if agent.free_lots > U256::from(UNLIMITED_LOTS) {
            "unlimited".to_string()
        } else {
            agent.free_lots.to_string()
        };
        let _ = writeln!(out, "  {}", agent.vault);
        let _ = writeln!(out, "    Free lots: {lots}");
        let _ = writeln!(out, "    Fee:       {:.2}%", to_f64(agent.fee_bips, 2));
    }
    let _ = writeln!(out, "  Total: {} agents with capacity", with_capacity.len());
    out
}

pub async fn status(
    session: &Session,
    ledger: &dyn Ledger,
    xrpl_address: &str,
    owner: Option<Address>,
) -> Result<()> {
    let account: ClassicAddress = xrpl_address.parse()?;
    println!("XRPL account {account}");
    match ledger.account_info(&account).await {
        Ok(info) => {
            println!("  Balance: {} XRP", format_xrp(info.balance_drops));
            println!("  Status:  active");
            let transactions = ledger.account_tx(&account, RECENT_TRANSACTIONS).await?;
            if !transactions.is_empty() {
                println!("  Recent transactions:");
                for transaction in &transactions {
                    println!("    {}", render_transaction(transaction, &account));
                }
            }
        }
        Err(LedgerError::AccountNotFound(_)) => {
            println!("  Balance: 0 XRP");
            println!("  Status:  not activated, needs at least 1 XRP");
        }
        Err(err) => return Err(err.into()),
    }

    if let Some(owner) = owner {
        let fasset: &Token = session.network.fasset()?;
        let balance = erc20::balance(&session.provider, fasset.address, owner).await?;
        println!(
            "  Flare {fasset}: {}",
            format_amount(balance, fasset.decimals)
        );
    }
    Ok(())
}

pub fn render_transaction(transaction: &AccountTransaction, account: &ClassicAddress) -> String {
    let direction = if transaction.is_incoming(account) {
        "IN "
    } else {
        "OUT"
    };
    let amount = transaction
        .delivered()
        .map(ToString::to_string)
        .unwrap_or_else(|| "-".to_string());
    let state = if transaction.validated {
        "validated"
    } else {
        "pending"
    };
    format!(
        "{direction} {amount} | {} | {state}",
        transaction.tx.transaction_type
    )
}
