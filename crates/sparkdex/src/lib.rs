//! SparkDex V4 (Algebra Integral) quotes and swaps on Flare.

pub mod arguments;
pub mod dex;
pub mod quote;
pub mod swap;

use {
    anyhow::Result,
    arguments::{Arguments, Command},
    shared::session::Session,
};

pub async fn run(args: Arguments) -> Result<()> {
    let session = Session::new(&args.shared, "sparkdex").await?;
    let dex = dex::Sparkdex::new(session.provider.clone(), &session.network.sparkdex);
    match &args.command {
        Command::Quote { trade, via } => swap::quote(&session, &dex, trade, via).await,
        Command::Swap {
            trade,
            slippage,
            via,
        } => swap::swap(&session, &dex, trade, *slippage, via).await,
        Command::Pool { from, to } => swap::pool(&session, &dex, from, to).await,
    }
}
