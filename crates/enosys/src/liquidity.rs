//! Liquidity position management through the position manager NFT
//! contract.

use {
    crate::{
        arguments::Mint,
        dex::{Dex, fee_tier},
    },
    alloy::{
        primitives::{Address, U256, aliases::I24},
        rpc::types::Log,
    },
    amm::{Percentage, PositionHealth, TickRange, fee_to_percent, tick_to_price},
    anyhow::{Context, Result},
    chain::{Network, Token, TokenRef},
    contracts::alloy::NonfungiblePositionManager,
    ethrpc::AlloyProvider,
    futures::future,
    number::{format_amount, format_significant},
    shared::{erc20, session::Session, tx},
    std::fmt::Write,
};

/// Snapshot of a liquidity position and the pool it sits in.
#[derive(Clone, Debug)]
pub struct Position {
    pub token_id: U256,
    pub token0: Token,
    pub token1: Token,
    pub fee: u32,
    pub range: TickRange,
    pub liquidity: u128,
    pub tokens_owed0: u128,
    pub tokens_owed1: u128,
    /// `None` if the pool does not exist.
    pub pool: Option<Address>,
    pub tick: Option<i32>,
    pub tick_spacing: Option<i32>,
}

impl Position {
    pub fn health(&self) -> PositionHealth {
        PositionHealth::assess(self.liquidity, self.range, self.tick)
    }

    pub fn price(&self, tick: i32) -> f64 {
        tick_to_price(tick, self.token0.decimals, self.token1.decimals)
    }

    pub fn pair(&self) -> String {
        format!("{}/{}", self.token0, self.token1)
    }

    pub fn has_owed_tokens(&self) -> bool {
        self.tokens_owed0 > 0 || self.tokens_owed1 > 0
    }
}

const SIGNIFICANT_DIGITS: usize = 5;

fn manager(provider: &AlloyProvider, network: &Network) -> NonfungiblePositionManager::Instance {
    NonfungiblePositionManager::Instance::new(network.enosys.position_manager, provider.clone())
}

/// Token descriptor for an address found on chain. Tokens outside the
/// network table have their metadata read from the contract.
async fn describe(provider: &AlloyProvider, network: &Network, address: Address) -> Result<Token> {
    let token = network
        .token_by_address(address)
        .map(TokenRef::Known)
        .unwrap_or(TokenRef::Address(address));
    erc20::token_info(provider, token).await
}

/// Reads a position and the state of its pool.
pub async fn fetch_position(
    provider: &AlloyProvider,
    network: &Network,
    dex: &dyn Dex,
    token_id: U256,
) -> Result<Position> {
    // The manager reverts for ids that were never minted or are burned.
    let raw = ethrpc::alloy::errors::ignore_non_node_error(
        manager(provider, network).positions(token_id).call().await,
    )
    .with_context(|| format!("failed to read position #{token_id}"))?
    .with_context(|| format!("position #{token_id} does not exist"))?;
    let fee = raw.fee.to::<u32>();
    let (token0, token1, pool) = futures::try_join!(
        describe(provider, network, raw.token0),
        describe(provider, network, raw.token1),
        dex.pool(raw.token0, raw.token1, fee),
    )?;
    let state = match pool {
        Some(pool) => Some(dex.pool_state(pool).await?),
        None => None,
    };
    Ok(Position {
        token_id,
        token0,
        token1,
        fee,
        range: TickRange {
            lower: raw.tickLower.as_i32(),
            upper: raw.tickUpper.as_i32(),
        },
        liquidity: raw.liquidity,
        tokens_owed0: raw.tokensOwed0,
        tokens_owed1: raw.tokensOwed1,
        pool,
        tick: state.as_ref().map(|state| state.tick),
        tick_spacing: state.as_ref().map(|state| state.tick_spacing),
    })
}

/// All positions held by `owner`.
pub async fn fetch_positions(
    provider: &AlloyProvider,
    network: &Network,
    dex: &dyn Dex,
    owner: Address,
) -> Result<Vec<Position>> {
    let manager = manager(provider, network);
    let count = manager
        .balanceOf(owner)
        .call()
        .await
        .context("failed to count positions")?;
    let count = u64::try_from(count).context("position count out of range")?;
    tracing::debug!(%owner, count, "fetching positions");
    let positions = (0..count).map(|index| {
        let manager = &manager;
        async move {
            let token_id = manager
                .tokenOfOwnerByIndex(owner, U256::from(index))
                .call()
                .await
                .with_context(|| format!("failed to read position index {index}"))?;
            fetch_position(provider, network, dex, token_id).await
        }
    });
    future::try_join_all(positions).await
}

pub async fn positions(session: &Session, dex: &dyn Dex, owner: Address) -> Result<()> {
    let positions = fetch_positions(&session.provider, &session.network, dex, owner).await?;
    if positions.is_empty() {
        println!("No Enosys V3 positions found for {owner}");
        return Ok(());
    }
    print!("{}", render_positions(owner, &positions));
    Ok(())
}

pub async fn check(session: &Session, dex: &dyn Dex, owner: Address) -> Result<()> {
    let positions = fetch_positions(&session.provider, &session.network, dex, owner).await?;
    if positions.is_empty() {
        println!("No Enosys V3 positions found for {owner}");
        return Ok(());
    }
    print!("{}", render_check(&positions));
    Ok(())
}

pub fn render_positions(owner: Address, positions: &[Position]) -> String {
    let mut out = String::new();
    let rule = "-".repeat(95);
    // Writing to a string never fails.
    let _ = writeln!(out, "Enosys V3 positions of {owner}");
    let _ = writeln!(out, "{rule}");
    let _ = writeln!(
        out,
        "{:<8}{:<16}{:<8}{:<30}{:<18}Status",
        "ID", "Pair", "Fee", "Range", "Liquidity"
    );
    let _ = writeln!(out, "{rule}");
    for position in positions {
        let range = format!(
            "{} - {}",
            format_significant(position.price(position.range.lower), SIGNIFICANT_DIGITS),
            format_significant(position.price(position.range.upper), SIGNIFICANT_DIGITS),
        );
        let _ = writeln!(
            out,
            "{:<8}{:<16}{:<8}{:<30}{:<18}{}",
            position.token_id.to_string(),
            position.pair(),
            fee_to_percent(position.fee, 2),
            range,
            position.liquidity,
            position.health(),
        );
        if position.has_owed_tokens() {
            let _ = writeln!(
                out,
                "{:<8}  Uncollected: {} {}, {} {}",
                "",
                format_amount(U256::from(position.tokens_owed0), position.token0.decimals),
                position.token0,
                format_amount(U256::from(position.tokens_owed1), position.token1.decimals),
                position.token1,
            );
        }
    }
    let _ = writeln!(out, "{rule}");
    out
}

pub fn render_check(positions: &[Position]) -> String {
    let mut out = String::new();
    let rule = "-".repeat(70);
    let _ = writeln!(
        out,
        "Enosys V3 health check, {} position(s)",
        positions.len()
    );
    let _ = writeln!(out, "{rule}");
    for position in positions {
        let _ = writeln!(
            out,
            "  #{}  {} ({})  {}",
            position.token_id,
            position.pair(),
            fee_to_percent(position.fee, 2),
            position.health(),
        );
        if let Some(tick) = position.tick {
            let _ = writeln!(
                out,
                "    Price: {}  Range: [{}, {}]",
                format_significant(position.price(tick), SIGNIFICANT_DIGITS),
                format_significant(position.price(position.range.lower), SIGNIFICANT_DIGITS),
                format_significant(position.price(position.range.upper), SIGNIFICANT_DIGITS),
            );
        }
    }
    let _ = writeln!(out, "{rule}");
    let alerts = positions
        .iter()
        .filter(|position| position.health().needs_attention())
        .count();
    if alerts > 0 {
        let _ = writeln!(out, "  {alerts} position(s) need attention");
    } else {
        let _ = writeln!(out, "  All positions healthy");
    }
    out
}

/// Token id of a freshly minted position: the position manager's
/// `Transfer` from the zero address.
pub fn minted_token_id(logs: &[Log], manager: Address) -> Option<U256> {
    logs.iter()
        .filter(|log| log.address() == manager)
        .filter_map(|log| log.log_decode::<NonfungiblePositionManager::Transfer>().ok())
        .find(|transfer| transfer.inner.data.from.is_zero())
        .map(|transfer| transfer.inner.data.tokenId)
}

/// Amounts paid out by a `collect` call.
pub fn collected_amounts(logs: &[Log], manager: Address) -> Option<(U256, U256)> {
    logs.iter()
        .filter(|log| log.address() == manager)
        .find_map(|log| log.log_decode::<NonfungiblePositionManager::Collect>().ok())
        .map(|collect| (collect.inner.data.amount0, collect.inner.data.amount1))
}

fn tick(value: i32) -> Result<I24> {
    I24::try_from(value).map_err(|_| anyhow::anyhow!("tick {value} does not fit in 24 bits"))
}

pub async fn mint(session: &Session, dex: &dyn Dex, args: &Mint) -> Result<()> {
    let range_pct = args.range.unwrap_or(Mint::DEFAULT_RANGE);
    anyhow::ensure!(
        range_pct.is_finite() && range_pct > 0.,
        "range must be a positive percentage, got {range_pct}"
    );
    let network = &session.network;
    let a = network.resolve_dex(&args.token0)?;
    let b = network.resolve_dex(&args.token1)?;
    anyhow::ensure!(a.address() != b.address(), "the two tokens must differ");
    let (a, b) = futures::try_join!(
        erc20::token_info(&session.provider, a),
        erc20::token_info(&session.provider, b),
    )?;
    let amount_a = number::parse_amount(&args.amount0, a.decimals)?;
    let amount_b = number::parse_amount(&args.amount1, b.decimals)?;
    anyhow::ensure!(
        !(amount_a.is_zero() && amount_b.is_zero()),
        "at least one amount must be greater than zero"
    );
    // The pool orders its tokens by address.
    let ((token0, amount0), (token1, amount1)) = if a.address < b.address {
        ((a, amount_a), (b, amount_b))
    } else {
        ((b, amount_b), (a, amount_a))
    };

    let pool = dex
        .pool(token0.address, token1.address, args.fee)
        .await?
        .with_context(|| {
            format!(
                "no {token0}/{token1} pool with a {} fee",
                fee_to_percent(args.fee, 2)
            )
        })?;
    let state = dex.pool_state(pool).await?;
    let range = match (args.tick_lower, args.tick_upper) {
        (Some(lower), Some(upper)) => amm::align_ticks(lower, upper, state.tick_spacing)?,
        _ => amm::range_to_ticks(state.tick, range_pct, state.tick_spacing)?,
    };
    println!("Minting Enosys V3 position {token0}/{token1}");
    println!(
        "  Fee: {}, current tick: {}, range: [{}, {}]",
        fee_to_percent(args.fee, 2),
        state.tick,
        range.lower,
        range.upper
    );

    let signer = session.signer().await?;
    let manager_address = network.enosys.position_manager;
    for (token, amount) in [(&token0, amount0), (&token1, amount1)] {
        if amount.is_zero() {
            continue;
        }
        erc20::ensure_balance(&signer.provider, token, signer.address, amount).await?;
        erc20::ensure_allowance(&signer.provider, token, signer.address, manager_address, amount)
            .await?;
    }

    let manager = manager(&signer.provider, network);
    let params = NonfungiblePositionManager::MintParams {
        token0: token0.address,
        token1: token1.address,
        fee: fee_tier(args.fee)?,
        tickLower: tick(range.lower)?,
        tickUpper: tick(range.upper)?,
        amount0Desired: amount0,
        amount1Desired: amount1,
        amount0Min: U256::ZERO,
        amount1Min: U256::ZERO,
        recipient: signer.address,
        deadline: tx::deadline(),
    };
    let receipt = tx::send(manager.mint(params), "mint").await?;
    let confirmation = tx::Confirmation::from(&receipt);
    match minted_token_id(receipt.inner.logs(), manager_address) {
        Some(token_id) => println!("  Minted position #{token_id}: {confirmation}"),
        None => println!("  Minted position (token id not found in logs): {confirmation}"),
    }
    println!("  {}", network.tx_url(confirmation.hash));
    Ok(())
}

pub async fn add(
    session: &Session,
    dex: &dyn Dex,
    token_id: U256,
    amount0: Option<&str>,
    amount1: Option<&str>,
) -> Result<()> {
    let network = &session.network;
    let position = fetch_position(&session.provider, network, dex, token_id).await?;
    let parse = |amount: Option<&str>, token: &Token| {
        amount.map_or(Ok(U256::ZERO), |amount| {
            number::parse_amount(amount, token.decimals)
        })
    };
    let amount0 = parse(amount0, &position.token0)?;
    let amount1 = parse(amount1, &position.token1)?;
    anyhow::ensure!(
        !(amount0.is_zero() && amount1.is_zero()),
        "at least one amount must be greater than zero"
    );

    let signer = session.signer().await?;
    let manager_address = network.enosys.position_manager;
    for (token, amount) in [(&position.token0, amount0), (&position.token1, amount1)] {
        if amount.is_zero() {
            continue;
        }
        erc20::ensure_balance(&signer.provider, token, signer.address, amount).await?;
        erc20::ensure_allowance(&signer.provider, token, signer.address, manager_address, amount)
            .await?;
    }

    println!("Adding liquidity to position #{token_id} ({})", position.pair());
    let params = NonfungiblePositionManager::IncreaseLiquidityParams {
        tokenId: token_id,
        amount0Desired: amount0,
        amount1Desired: amount1,
        amount0Min: U256::ZERO,
        amount1Min: U256::ZERO,
        deadline: tx::deadline(),
    };
    let receipt = tx::send(
        manager(&signer.provider, network).increaseLiquidity(params),
        "increase liquidity",
    )
    .await?;
    println!("  Liquidity added: {}", tx::Confirmation::from(&receipt));
    Ok(())
}

/// Liquidity withdrawn for a share of a position, rounded down.
pub fn liquidity_share(liquidity: u128, percent: Percentage) -> u128 {
    // At most `liquidity`, so the conversion back cannot fail.
    u128::try_from(percent.of(U256::from(liquidity))).unwrap_or(liquidity)
}

pub async fn remove(
    session: &Session,
    dex: &dyn Dex,
    token_id: U256,
    percent: Percentage,
) -> Result<()> {
    anyhow::ensure!(percent.bips() > 0, "percent must be greater than zero");
    let network = &session.network;
    let position = fetch_position(&session.provider, network, dex, token_id).await?;
    if position.liquidity == 0 {
        println!("Position #{token_id} has no liquidity");
        return Ok(());
    }
    let liquidity = liquidity_share(position.liquidity, percent);
    let signer = session.signer().await?;
    let manager_address = network.enosys.position_manager;
    let manager = manager(&signer.provider, network);

    println!("Removing {percent} of the liquidity of position #{token_id}");
    let params = NonfungiblePositionManager::DecreaseLiquidityParams {
        tokenId: token_id,
        liquidity,
        amount0Min: U256::ZERO,
        amount1Min: U256::ZERO,
        deadline: tx::deadline(),
    };
    let receipt = tx::send(manager.decreaseLiquidity(params), "decrease liquidity").await?;
    println!("  Liquidity decreased: {}", tx::Confirmation::from(&receipt));

    let receipt = tx::send(
        manager.collect(collect_all(token_id, signer.address)),
        "collect",
    )
    .await?;
    print_collected(&position, &receipt, manager_address);

    if percent == Percentage::FULL {
        match tx::send(manager.burn(token_id), "burn").await {
            Ok(receipt) => println!("  Position burned: {}", tx::Confirmation::from(&receipt)),
            Err(err) => {
                tracing::warn!(?err, %token_id, "burn failed");
                println!("  Warning: could not burn position #{token_id}: {err:#}");
            }
        }
    }
    Ok(())
}

pub async fn collect(session: &Session, dex: &dyn Dex, token_id: U256) -> Result<()> {
    let network = &session.network;
    let position = fetch_position(&session.provider, network, dex, token_id).await?;
    let signer = session.signer().await?;
    println!(
        "Collecting fees of position #{token_id} ({})",
        position.pair()
    );
    let receipt = tx::send(
        manager(&signer.provider, network).collect(collect_all(token_id, signer.address)),
        "collect",
    )
    .await?;
    print_collected(&position, &receipt, network.enosys.position_manager);
    Ok(())
}

fn collect_all(token_id: U256, recipient: Address) -> NonfungiblePositionManager::CollectParams {
    NonfungiblePositionManager::CollectParams {
        tokenId: token_id,
        recipient,
        amount0Max: u128::MAX,
        amount1Max: u128::MAX,
    }
}

fn print_collected(
    position: &Position,
    receipt: &alloy::rpc::types::TransactionReceipt,
    manager: Address,
) {
    let confirmation = tx::Confirmation::from(receipt);
    match collected_amounts(receipt.inner.logs(), manager) {
        Some((amount0, amount1)) => println!(
            "  Collected {} {} and {} {}: {confirmation}",
            format_amount(amount0, position.token0.decimals),
            position.token0,
            format_amount(amount1, position.token1.decimals),
            position.token1,
        ),
        None => println!("  Collected: {confirmation}"),
    }
}
