//! FAssets on Flare: mint FXRP by paying an agent on the XRP Ledger, and
//! redeem FXRP back to XRP.

pub mod arguments;
pub mod asset_manager;
pub mod info;
pub mod lots;
pub mod mint;
pub mod redeem;

pub use mint::Reservation;

use {
    anyhow::Result,
    arguments::{Arguments, Command},
    asset_manager::Onchain,
    shared::session::Session,
};

pub async fn run(args: Arguments) -> Result<()> {
    let session = Session::new(&args.shared, "fassets").await?;
    let manager = Onchain::new(
        session.network.fassets.asset_manager,
        session.provider.clone(),
    );
    match &args.command {
        Command::Info { address } => info::info(&session, &manager, *address).await,
        Command::Agents => info::agents(&manager).await,
        Command::Mint(mint) => mint::mint(&session, mint).await,
        Command::Redeem { size, xrpl_address } => {
            redeem::redeem(&session, size, xrpl_address).await
        }
        Command::Status {
            xrpl_address,
            address,
            xrpl,
        } => info::status(&session, &xrpl.client(), xrpl_address, *address).await,
    }
}
