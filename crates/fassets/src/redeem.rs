use {
    crate::{
        arguments::Size,
        asset_manager::{AssetManager, Onchain},
        lots::Requested,
    },
    alloy::primitives::{Address, U256},
    anyhow::{Context, Result},
    contracts::alloy::AssetManager as Contract,
    number::format_amount,
    shared::{erc20, session::Session, tx},
    xrpl::ClassicAddress,
};

/// Checks the redemption destination without touching the network.
pub fn destination(address: &str) -> Result<ClassicAddress> {
    anyhow::ensure!(
        xrpl::address::is_valid_format(address),
        "invalid XRPL address format {address:?}"
    );
    address
        .parse()
        .with_context(|| format!("invalid XRPL address {address:?}"))
}

pub async fn redeem(session: &Session, size: &Size, xrpl_address: &str) -> Result<()> {
    let destination = destination(xrpl_address)?;
    let network = &session.network;
    let fasset = network.fasset()?.clone();
    let requested = Requested::parse(size, fasset.decimals)?;

    let signer = session.signer().await?;
    let manager_address = network.fassets.asset_manager;
    let lot_size = Onchain::new(manager_address, signer.provider.clone())
        .lot_size()
        .await?;
    let lots = requested.lots(lot_size, fasset.decimals)?;
    let required = lot_size * U256::from(lots);
    let balance = erc20::balance(&signer.provider, fasset.address, signer.address).await?;

    println!("FAssets redemption");
    println!("  Wallet:       {}", signer.address);
    println!(
        "  {fasset} balance: {}",
        format_amount(balance, fasset.decimals)
    );
    println!(
        "  Redeeming:    {lots} lot(s) = {} {fasset}",
        format_amount(required, fasset.decimals)
    );
    println!("  XRPL dest:    {destination}");
    erc20::check_balance(&fasset, balance, required)?;
    erc20::ensure_allowance(
        &signer.provider,
        &fasset,
        signer.address,
        manager_address,
        required,
    )
    .await?;

    let contract = Contract::Instance::new(manager_address, signer.provider.clone());
    let call = contract.redeem(U256::from(lots), destination.to_string(), Address::ZERO);
    let receipt = tx::send(call, "redeem").await?;
    let confirmation = tx::Confirmation::from(&receipt);
    println!("  Redeemed: {confirmation}");
    println!("  {}", network.tx_url(confirmation.hash));
    println!("The agent pays the XRP to {destination}, usually within a few minutes.");
    println!("  Monitor: fassets status --xrpl-address {destination}");

    let remaining = erc20::balance(&signer.provider, fasset.address, signer.address).await?;
    println!(
        "  {fasset} remaining: {}",
        format_amount(remaining, fasset.decimals)
    );
    Ok(())
}
