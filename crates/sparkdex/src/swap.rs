//! Quote, swap and pool commands.

use {
    crate::{arguments::Trade, dex::Dex, quote},
    alloy::primitives::{Address, U256, aliases::U160},
    amm::{Quote, Slippage, fee_to_percent},
    anyhow::Result,
    chain::Token,
    contracts::alloy::AlgebraSwapRouter,
    futures::future,
    number::{format_amount, units::to_f64},
    shared::{erc20, session::Session, tx},
    std::fmt::Write,
};

/// Algebra fees are reported in hundredths of a bip and commonly sit between
/// tiers, so they are shown with four decimals.
const FEE_DECIMALS: usize = 4;

struct Resolved {
    from: Token,
    to: Token,
    via: Vec<Token>,
    amount_in: U256,
}

impl Resolved {
    fn route(&self) -> Vec<&Token> {
        std::iter::once(&self.from)
            .chain(&self.via)
            .chain(std::iter::once(&self.to))
            .collect()
    }
}

async fn resolve(session: &Session, trade: &Trade, via: &[String]) -> Result<Resolved> {
    let network = &session.network;
    let from = network.resolve_dex(&trade.from)?;
    let to = network.resolve_dex(&trade.to)?;
    anyhow::ensure!(
        from.address() != to.address(),
        "cannot swap {} for itself",
        trade.from
    );
    let via = via
        .iter()
        .map(|name| network.resolve_dex(name))
        .collect::<Result<Vec<_>, _>>()?;
    let (from, to, via) = futures::try_join!(
        erc20::token_info(&session.provider, from),
        erc20::token_info(&session.provider, to),
        future::try_join_all(
            via.into_iter()
                .map(|token| erc20::token_info(&session.provider, token))
        ),
    )?;
    let amount_in = number::parse_positive_amount(&trade.amount, from.decimals)?;
    Ok(Resolved {
        from,
        to,
        via,
        amount_in,
    })
}

async fn quote_resolved(dex: &dyn Dex, resolved: &Resolved) -> Result<Quote> {
    if resolved.via.is_empty() {
        quote::quote_single(dex, &resolved.from, &resolved.to, resolved.amount_in).await
    } else {
        quote::quote_route(dex, &resolved.route(), resolved.amount_in).await
    }
}

pub async fn quote(session: &Session, dex: &dyn Dex, trade: &Trade, via: &[String]) -> Result<()> {
    let resolved = resolve(session, trade, via).await?;
    let quote = quote_resolved(dex, &resolved).await?;
    let rendered = if resolved.via.is_empty() {
        render_quote(&resolved.from, &resolved.to, &quote)
    } else {
        render_route(&resolved.route(), &quote)
    };
    print!("{rendered}");
    Ok(())
}

pub async fn swap(
    session: &Session,
    dex: &dyn Dex,
    trade: &Trade,
    slippage: Slippage,
    via: &[String],
) -> Result<()> {
    let resolved = resolve(session, trade, via).await?;
    let Resolved {
        from,
        to,
        amount_in,
        ..
    } = &resolved;
    println!(
        "Getting quote for {} {from} -> {to}",
        format_amount(*amount_in, from.decimals)
    );
    let quote = quote_resolved(dex, &resolved).await?;
    anyhow::ensure!(
        !quote.is_fallback(),
        "the quoter is unavailable, refusing to swap on a spot price estimate"
    );
    if let Some(warning) = &quote.warning {
        println!("Warning: {warning}");
    }
    let min_out = amm::min_out(quote.amount_out, slippage);
    println!(
        "  Expected:  {} {to}",
        format_amount(quote.amount_out, to.decimals)
    );
    println!(
        "  Min out:   {} {to} ({slippage} slippage)",
        format_amount(min_out, to.decimals),
    );
    if resolved.via.is_empty() {
        println!("  Fee:       {}", fee_to_percent(quote.fee, FEE_DECIMALS));
    }

    let signer = session.signer().await?;
    let router_address = session.network.sparkdex.swap_router;
    erc20::ensure_balance(&signer.provider, from, signer.address, *amount_in).await?;
    erc20::ensure_allowance(&signer.provider, from, signer.address, router_address, *amount_in)
        .await?;

    let router = AlgebraSwapRouter::Instance::new(router_address, signer.provider.clone());
    let receipt = if resolved.via.is_empty() {
        let params = AlgebraSwapRouter::ExactInputSingleParams {
            tokenIn: from.address,
            tokenOut: to.address,
            deployer: Address::ZERO,
            recipient: signer.address,
            deadline: tx::deadline(),
            amountIn: *amount_in,
            amountOutMinimum: min_out,
            limitSqrtPrice: U160::ZERO,
        };
        tx::send(router.exactInputSingle(params), "swap").await?
    } else {
        let addresses: Vec<Address> = resolved.route().iter().map(|token| token.address).collect();
        let params = AlgebraSwapRouter::ExactInputParams {
            path: amm::path::encode_algebra_default(&addresses)?,
            recipient: signer.address,
            deadline: tx::deadline(),
            amountIn: *amount_in,
            amountOutMinimum: min_out,
        };
        tx::send(router.exactInput(params), "multi-hop swap").await?
    };
    let confirmation = tx::Confirmation::from(&receipt);
    println!("  Swapped: {confirmation}");
    println!("  {}", session.network.tx_url(confirmation.hash));
    Ok(())
}

pub async fn pool(session: &Session, dex: &dyn Dex, from: &str, to: &str) -> Result<()> {
    let token0 = session.network.resolve_dex(from)?;
    let token1 = session.network.resolve_dex(to)?;
    let (token0, token1) = futures::try_join!(
        erc20::token_info(&session.provider, token0),
        erc20::token_info(&session.provider, token1),
    )?;
    let Some(address) = dex.pool(token0.address, token1.address).await? else {
        println!("No pool found for {token0}/{token1}");
        return Ok(());
    };
    let state = dex.pool_state(address).await?;
    println!("SparkDex V4 pool");
    println!("  Pool:      {}", state.address);
    println!("  Pair:      {token0}/{token1}");
    println!("  Tick:      {}", state.tick);
    println!(
        "  Fee:       {}",
        fee_to_percent(u32::from(state.last_fee), FEE_DECIMALS)
    );
    println!("  Liquidity: {}", state.liquidity);
    println!("  Spacing:   {}", state.tick_spacing);
    Ok(())
}

pub fn render_quote(from: &Token, to: &Token, quote: &Quote) -> String {
    let amount_in = to_f64(quote.amount_in, from.decimals);
    let amount_out = to_f64(quote.amount_out, to.decimals);
    let rate = if amount_in > 0. { amount_out / amount_in } else { 0. };
    let mut out = String::new();
    // Writing to a string never fails.
    let _ = writeln!(out, "SparkDex V4 quote");
    let _ = writeln!(
        out,
        "  From:      {} {from}",
        format_amount(quote.amount_in, from.decimals)
    );
    let _ = writeln!(
        out,
        "  To:        {} {to}",
        format_amount(quote.amount_out, to.decimals)
    );
    let _ = writeln!(out, "  Rate:      1 {from} = {rate:.6} {to}");
    let _ = writeln!(out, "  Fee:       {}", fee_to_percent(quote.fee, FEE_DECIMALS));
    if let Some(gas) = quote.gas_estimate {
        let _ = writeln!(out, "  Gas est:   {gas}");
    }
    let _ = writeln!(out, "  Source:    {}", quote.source);
    if let Some(warning) = &quote.warning {
        let _ = writeln!(out, "Warning: {warning}");
    }
    out
}

pub fn render_route(route: &[&Token], quote: &Quote) -> String {
    let (Some(from), Some(to)) = (route.first(), route.last()) else {
        return String::new();
    };
    let path = route
        .iter()
        .map(|token| token.symbol.as_str())
        .collect::<Vec<_>>()
        .join(" -> ");
    let mut out = String::new();
    let _ = writeln!(out, "SparkDex V4 multi-hop quote");
    let _ = writeln!(out, "  Path:      {path}");
    let _ = writeln!(
        out,
        "  Input:     {} {from}",
        format_amount(quote.amount_in, from.decimals)
    );
    let _ = writeln!(
        out,
        "  Output:    {} {to}",
        format_amount(quote.amount_out, to.decimals)
    );
    if let Some(gas) = quote.gas_estimate {
        let _ = writeln!(out, "  Gas est:   {gas}");
    }
    if let Some(warning) = &quote.warning {
        let _ = writeln!(out, "Warning: {warning}");
    }
    out
}

#[cfg(test)]
mod tests {
    use {super::*, alloy::primitives::address, amm::quote::Source};

    fn token(symbol: &str, decimals: u8) -> Token {
        Token {
            symbol: symbol.to_string(),
            address: address!("0000000000000000000000000000000000000001"),
            decimals,
        }
    }

    #[test]
    fn renders_dynamic_fees_with_four_decimals() {
        let quote = Quote::from_quoter(
            U256::from(10u128.pow(20)),
            U256::from(2_500_000),
            2_345,
            0,
            U256::from(90_000),
        );
        let rendered = render_quote(&token("WFLR", 18), &token("FXRP", 6), &quote);
        assert_eq!(
            rendered,
            "SparkDex V4 quote\n  From:      100.0 WFLR\n  To:        2.5 FXRP\n  Rate:      1 WFLR = \
             0.025000 FXRP\n  Fee:       0.2345%\n  Gas est:   90000\n  Source:    quoter\n"
        );
    }

    #[test]
    fn renders_route_path() {
        let quote = Quote {
            amount_in: U256::from(10u128.pow(18)),
            amount_out: U256::from(25_000),
            fee: 0,
            gas_estimate: Some(U256::from(180_000)),
            ticks_crossed: Some(2),
            source: Source::Quoter,
            warning: None,
        };
        let (wflr, sflr, fxrp) = (token("WFLR", 18), token("sFLR", 18), token("FXRP", 6));
        let rendered = render_route(&[&wflr, &sflr, &fxrp], &quote);
        assert!(rendered.contains("  Path:      WFLR -> sFLR -> FXRP\n"));
        assert!(rendered.contains("  Input:     1.0 WFLR\n"));
        assert!(rendered.contains("  Output:    0.025 FXRP\n"));
        assert!(!rendered.contains("Fee"));
    }
}
