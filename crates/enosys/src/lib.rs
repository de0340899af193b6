//! Enosys V3 (Uniswap V3) swaps, quotes and liquidity positions on Flare.

pub mod arguments;
pub mod dex;
pub mod liquidity;
pub mod quote;
pub mod swap;

pub use {amm::Quote, liquidity::Position};

use {
    anyhow::Result,
    arguments::{Arguments, Command},
    shared::session::Session,
};

pub async fn run(args: Arguments) -> Result<()> {
    let session = Session::new(&args.shared, "enosys").await?;
    let dex = dex::Enosys::new(session.provider.clone(), &session.network.enosys);
    match &args.command {
        Command::Quote { trade, fee } => swap::quote(&session, &dex, trade, *fee).await,
        Command::Best { trade } => swap::best(&session, &dex, trade).await,
        Command::Swap(swap) => swap::swap(&session, &dex, swap).await,
        Command::Pool { from, to, fee } => swap::pool(&session, &dex, from, to, *fee).await,
        Command::Pools => swap::pools(&session, &dex).await,
        Command::Positions { owner } => {
            let owner = session.owner(owner.address)?;
            liquidity::positions(&session, &dex, owner).await
        }
        Command::Check { owner } => {
            let owner = session.owner(owner.address)?;
            liquidity::check(&session, &dex, owner).await
        }
        Command::Mint(mint) => liquidity::mint(&session, &dex, mint).await,
        Command::Add {
            token_id,
            amount0,
            amount1,
        } => {
            liquidity::add(
                &session,
                &dex,
                *token_id,
                amount0.as_deref(),
                amount1.as_deref(),
            )
            .await
        }
        Command::Remove { token_id, percent } => {
            liquidity::remove(&session, &dex, *token_id, *percent).await
        }
        Command::Collect { token_id } => liquidity::collect(&session, &dex, *token_id).await,
    }
}
