//! Flare account commands.

use {
    alloy::{
        primitives::{Address, U256},
        providers::Provider,
        rpc::types::{BlockNumberOrTag, TransactionReceipt},
    },
    anyhow::{Context, Result},
    chain::{Network, Token, TokenRef},
    contracts::alloy::{ERC20, WNat},
    futures::future,
    number::{format_amount, format_truncated},
    shared::{erc20, session::Session, tx},
    std::{fmt::Write, path::Path},
};

/// Balances are listed with this many fractional digits, truncated.
const BALANCE_PLACES: usize = 4;
const GWEI_DECIMALS: u8 = 9;
const NATIVE_DECIMALS: u8 = 18;

pub fn networks(selected: &Network) -> Result<()> {
    let mut networks = Network::builtin();
    if !networks.iter().any(|network| network.key == selected.key) {
        networks.push(selected.clone());
    }
    print!("{}", render_networks(&networks, &selected.key));
    Ok(())
}

pub fn render_networks(networks: &[Network], selected: &str) -> String {
    let mut out = String::new();
    // Writing to a string never fails.
    for network in networks {
        let marker = if network.key == selected { "*" } else { " " };
        let _ = writeln!(
            out,
            "{marker} {:<10}{:<10}chain {}",
            network.key, network.name, network.chain_id
        );
        let _ = writeln!(out, "    Native:   {}", network.native_symbol);
        let _ = writeln!(out, "    RPC:      {}", network.rpc);
        let _ = writeln!(out, "    Explorer: {}", network.explorer);
    }
    out
}

/// One line of a balance listing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Holding {
    pub symbol: String,
    pub amount: U256,
    pub decimals: u8,
}

pub async fn balance(session: &Session, owner: Address, all: bool) -> Result<()> {
    let network = &session.network;
    let provider = &session.provider;
    let native = provider
        .get_balance(owner)
        .await
        .context("failed to read the native balance")?;
    let tokens = future::try_join_all(network.tokens.iter().map(|token| async move {
        let amount = erc20::balance(provider, token.address, owner).await?;
        Ok::<_, anyhow::Error>(Holding {
            symbol: token.symbol.clone(),
            amount,
            decimals: token.decimals,
        })
    }))
    .await?;
    let native = Holding {
        symbol: network.native_symbol.clone(),
        amount: native,
        decimals: NATIVE_DECIMALS,
    };
    println!("{} (chain {}) {owner}", network.name, network.chain_id);
    print!("{}", render_holdings(&native, &tokens, all));
    Ok(())
}

/// The native balance is always listed, tokens only when non-zero unless
/// `all` is set.
pub fn render_holdings(native: &Holding, tokens: &[Holding], all: bool) -> String {
    let mut out = String::new();
    for holding in std::iter::once(native).chain(tokens.iter().filter(|token| all || !token.amount.is_zero())) {
        let _ = writeln!(
            out,
            "  {:<8} {}",
            holding.symbol,
            format_truncated(holding.amount, holding.decimals, BALANCE_PLACES)
        );
    }
    out
}

fn is_native(network: &Network, token: Option<&str>) -> bool {
    token.is_none_or(|token| token.eq_ignore_ascii_case(&network.native_symbol))
}

pub async fn send(session: &Session, amount: &str, token: Option<&str>, to: Address) -> Result<()> {
    let network = &session.network;
    if is_native(network, token) {
        let value = number::parse_positive_amount(amount, NATIVE_DECIMALS)?;
        let signer = session.signer().await?;
        let balance = signer
            .provider
            .get_balance(signer.address)
            .await
            .context("failed to read the native balance")?;
        let native = native_token(network);
        erc20::check_balance(&native, balance, value)?;
        println!(
            "Sending {} {} to {to}",
            format_amount(value, NATIVE_DECIMALS),
            network.native_symbol
        );
        let receipt = tx::transfer_native(&signer.provider, to, value).await?;
        report(network, &receipt);
        return Ok(());
    }

    let token = resolve(session, token.unwrap_or_default()).await?;
    let value = number::parse_positive_amount(amount, token.decimals)?;
    let signer = session.signer().await?;
    erc20::ensure_balance(&signer.provider, &token, signer.address, value).await?;
    println!(
        "Sending {} {token} to {to}",
        format_amount(value, token.decimals)
    );
    let erc20 = ERC20::Instance::new(token.address, signer.provider.clone());
    let receipt = tx::send(erc20.transfer(to, value), &format!("transfer {token}")).await?;
    report(network, &receipt);
    Ok(())
}

pub async fn wrap(session: &Session, amount: &str) -> Result<()> {
    let network = &session.network;
    let wrapped = network.wrapped_native()?;
    let value = number::parse_positive_amount(amount, NATIVE_DECIMALS)?;
    let signer = session.signer().await?;
    let balance = signer
        .provider
        .get_balance(signer.address)
        .await
        .context("failed to read the native balance")?;
    erc20::check_balance(&native_token(network), balance, value)?;
    println!(
        "Wrapping {} {} into {wrapped}",
        format_amount(value, NATIVE_DECIMALS),
        network.native_symbol
    );
    let contract = WNat::Instance::new(wrapped.address, signer.provider.clone());
    let receipt = tx::send(contract.deposit().value(value), "wrap").await?;
    report(network, &receipt);
    Ok(())
}

pub async fn unwrap(session: &Session, amount: &str) -> Result<()> {
    let network = &session.network;
    let wrapped = network.wrapped_native()?;
    let value = number::parse_positive_amount(amount, wrapped.decimals)?;
    let signer = session.signer().await?;
    erc20::ensure_balance(&signer.provider, wrapped, signer.address, value).await?;
    println!(
        "Unwrapping {} {wrapped} into {}",
        format_amount(value, wrapped.decimals),
        network.native_symbol
    );
    let contract = WNat::Instance::new(wrapped.address, signer.provider.clone());
    let receipt = tx::send(contract.withdraw(value), "unwrap").await?;
    report(network, &receipt);
    Ok(())
}

pub async fn approve(
    session: &Session,
    token: &str,
    spender: Address,
    amount: Option<&str>,
) -> Result<()> {
    let token = resolve(session, token).await?;
    let value = match amount {
        Some(amount) => number::parse_amount(amount, token.decimals)?,
        None => U256::MAX,
    };
    let signer = session.signer().await?;
    println!("Approving {spender} for {} {token}", describe_allowance(value, &token));
    let erc20 = ERC20::Instance::new(token.address, signer.provider.clone());
    let receipt = tx::send(erc20.approve(spender, value), &format!("approve {token}")).await?;
    report(&session.network, &receipt);
    Ok(())
}

pub async fn allowance(session: &Session, token: &str, spender: Address, owner: Address) -> Result<()> {
    let token = resolve(session, token).await?;
    let allowance = ERC20::Instance::new(token.address, session.provider.clone())
        .allowance(owner, spender)
        .call()
        .await
        .with_context(|| format!("failed to read {token} allowance"))?;
    println!("{token} allowance");
    println!("  Owner:     {owner}");
    println!("  Spender:   {spender}");
    println!("  Allowance: {}", describe_allowance(allowance, &token));
    Ok(())
}

/// Allowances at or near the maximum are shown as unlimited.
pub fn describe_allowance(value: U256, token: &Token) -> String {
    if value >= U256::MAX >> 1 {
        "unlimited".to_string()
    } else {
        format_amount(value, token.decimals)
    }
}

pub async fn gas(session: &Session) -> Result<()> {
    let provider = &session.provider;
    let gas_price = provider
        .get_gas_price()
        .await
        .context("failed to read the gas price")?;
    let block = provider
        .get_block_by_number(BlockNumberOrTag::Latest)
        .await
        .context("failed to read the latest block")?;
    let priority_fee = match provider.get_max_priority_fee_per_gas().await {
        Ok(fee) => Some(fee),
        Err(err) => {
            tracing::debug!(?err, "node does not report a priority fee");
            None
        }
    };
    let base_fee = block.and_then(|block| block.header.base_fee_per_gas);
    println!("{} gas", session.network.name);
    println!("  Gas price:    {} gwei", gwei(U256::from(gas_price)));
    match base_fee {
        Some(fee) => println!("  Base fee:     {} gwei", gwei(U256::from(fee))),
        None => println!("  Base fee:     unavailable"),
    }
    match priority_fee {
        Some(fee) => println!("  Priority fee: {} gwei", gwei(U256::from(fee))),
        None => println!("  Priority fee: unavailable"),
    }
    Ok(())
}

fn gwei(wei: U256) -> String {
    format_amount(wei, GWEI_DECIMALS)
}

pub async fn info(session: &Session, token: &str) -> Result<()> {
    let address = session.network.resolve(token)?.address();
    let erc20 = ERC20::Instance::new(address, session.provider.clone());
    let name = erc20.name();
    let symbol = erc20.symbol();
    let decimals = erc20.decimals();
    let supply = erc20.totalSupply();
    let (name, symbol, decimals, supply) = futures::try_join!(
        name.call().into_future(),
        symbol.call().into_future(),
        decimals.call().into_future(),
        supply.call().into_future(),
    )
    .with_context(|| format!("failed to read token {address}"))?;
    println!("{name}");
    println!("  Address:      {address}");
    println!("  Symbol:       {symbol}");
    println!("  Decimals:     {decimals}");
    println!("  Total supply: {}", format_amount(supply, decimals));
    println!("  Explorer:     {}", explorer_token_url(&session.network, address));
    Ok(())
}

fn explorer_token_url(network: &Network, address: Address) -> String {
    format!(
        "{}/token/{address}",
        network.explorer.as_str().trim_end_matches('/')
    )
}

/// Creates a key. It is printed unless `out` is given, in which case only the
/// encrypted keystore is written.
pub async fn generate(session_args: &shared::arguments::Arguments, out: Option<&Path>) -> Result<()> {
    match out {
        Some(dir) => {
            let password = session_args
                .credentials()
                .resolve_password()
                .context("a password is needed to encrypt the keystore")?;
            let (signer, path) = ethrpc::keystore::create(dir, password).await?;
            println!("New wallet");
            println!("  Address:  {}", signer.address());
            println!("  Keystore: {}", path.display());
        }
        None => {
            let signer = alloy::signers::local::PrivateKeySigner::random();
            println!("New wallet");
            println!("  Address:     {}", signer.address());
            println!("  Private key: 0x{}", hex::encode(signer.to_bytes()));
            println!("Store the private key safely, it cannot be recovered.");
            println!("Pass --out DIR to write an encrypted keystore instead.");
        }
    }
    Ok(())
}

async fn resolve(session: &Session, token: &str) -> Result<Token> {
    let token: TokenRef<'_> = session.network.resolve(token)?;
    erc20::token_info(&session.provider, token).await
}

fn native_token(network: &Network) -> Token {
    Token {
        symbol: network.native_symbol.clone(),
        address: Address::ZERO,
        decimals: NATIVE_DECIMALS,
    }
}

fn report(network: &Network, receipt: &TransactionReceipt) {
    let confirmation = tx::Confirmation::from(receipt);
    println!("  Confirmed: {confirmation}");
    println!("  {}", network.tx_url(confirmation.hash));
}
