//! Wallet commands for Flare networks and the XRP Ledger.

pub mod arguments;
pub mod evm;
pub mod ledger;

use {
    anyhow::Result,
    arguments::{Arguments, Command},
    shared::session::Session,
};

pub async fn run(args: Arguments) -> Result<()> {
    match &args.command {
        Command::Networks => return evm::networks(&args.shared.network().await?),
        Command::Generate { out } => return evm::generate(&args.shared, out.as_deref()).await,
        Command::Xrpl { xrpl, command } => return ledger::run(xrpl, command).await,
        _ => {}
    }

    let session = Session::new(&args.shared, "wallet").await?;
    match &args.command {
        Command::Balance { address, all } => {
            evm::balance(&session, session.owner(*address)?, *all).await
        }
        Command::Send { amount, token, to } => {
            evm::send(&session, amount, token.as_deref(), *to).await
        }
        Command::Wrap { amount } => evm::wrap(&session, amount).await,
        Command::Unwrap { amount } => evm::unwrap(&session, amount).await,
        Command::Approve {
            token,
            spender,
            amount,
        } => evm::approve(&session, token, *spender, amount.as_deref()).await,
        Command::Allowance {
            token,
            spender,
            owner,
        } => evm::allowance(&session, token, *spender, session.owner(*owner)?).await,
        Command::Gas => evm::gas(&session).await,
        Command::Info { token } => evm::info(&session, token).await,
        Command::Networks | Command::Generate { .. } | Command::Xrpl { .. } => Ok(()),
    }
}
