//! Quote, swap and pool inspection commands.

use {
    crate::{
        arguments::{Swap, Trade},
        dex::{Dex, PoolState, fee_tier},
        quote::{self, Comparison},
    },
    alloy::primitives::{
        U256,
        aliases::U160,
    },
    amm::{Quote, fee_to_percent},
    anyhow::{Context, Result},
    chain::Token,
    contracts::alloy::SwapRouter,
    futures::future,
    number::{format_amount, units::to_f64},
    shared::{erc20, session::Session, tx},
    std::fmt::Write,
};

/// Input and output token plus the parsed input amount.
pub struct Resolved {
    pub from: Token,
    pub to: Token,
    pub amount_in: U256,
}

pub async fn resolve(session: &Session, trade: &Trade) -> Result<Resolved> {
    let from = session.network.resolve_dex(&trade.from)?;
    let to = session.network.resolve_dex(&trade.to)?;
    anyhow::ensure!(
        from.address() != to.address(),
        "cannot swap {} for itself",
        trade.from
    );
    let (from, to) = futures::try_join!(
        erc20::token_info(&session.provider, from),
        erc20::token_info(&session.provider, to),
    )?;
    let amount_in = number::parse_positive_amount(&trade.amount, from.decimals)?;
    Ok(Resolved {
        from,
        to,
        amount_in,
    })
}

pub async fn quote(
    session: &Session,
    dex: &dyn Dex,
    trade: &Trade,
    fee: Option<u32>,
) -> Result<()> {
    let resolved = resolve(session, trade).await?;
    let Resolved { from, to, amount_in } = &resolved;
    match fee {
        Some(fee) => {
            let quote = quote::quote_tier(dex, from, to, *amount_in, fee).await?;
            print!("{}", render_quote("Enosys V3 quote", from, to, &quote));
        }
        None => {
            let tiers = &session.network.enosys.fee_tiers;
            let comparison = quote::compare_tiers(dex, from, to, *amount_in, tiers).await;
            let best = comparison
                .best()
                .with_context(|| format!("no {from}/{to} pools found"))?;
            print!("{}", render_quote("Enosys V3 quote", from, to, best));
            print!("{}", render_comparison(to, &comparison));
        }
    }
    Ok(())
}

pub async fn best(session: &Session, dex: &dyn Dex, trade: &Trade) -> Result<()> {
    let Resolved { from, to, amount_in } = resolve(session, trade).await?;
    let tiers = &session.network.enosys.fee_tiers;
    let best = quote::best_quote(dex, &from, &to, amount_in, tiers).await?;
    print!("{}", render_quote("Enosys V3 best quote", &from, &to, &best));
    Ok(())
}

pub async fn swap(session: &Session, dex: &dyn Dex, args: &Swap) -> Result<()> {
    let Resolved { from, to, amount_in } = resolve(session, &args.trade).await?;
    let via = args
        .via
        .iter()
        .map(|name| session.network.resolve_dex(name))
        .collect::<Result<Vec<_>, _>>()?;
    let hops = via.len() + 1;
    let fees = if args.fees.is_empty() {
        vec![args.fee; hops]
    } else {
        args.fees.clone()
    };
    anyhow::ensure!(
        fees.len() == hops,
        "a route with {hops} hops needs {hops} fees, got {}",
        fees.len()
    );

    println!(
        "Getting quote for {} {from} -> {to}",
        format_amount(amount_in, from.decimals)
    );
    let (quote, path) = if via.is_empty() {
        (quote::quote_tier(dex, &from, &to, amount_in, args.fee).await?, None)
    } else {
        let via = future::try_join_all(
            via.into_iter()
                .map(|token| erc20::token_info(&session.provider, token)),
        )
        .await?;
        let route: Vec<&Token> = std::iter::once(&from)
            .chain(&via)
            .chain(std::iter::once(&to))
            .collect();
        let addresses: Vec<_> = route.iter().map(|token| token.address).collect();
        let quote = quote::quote_route(dex, &route, &fees, amount_in).await?;
        (quote, Some(amm::path::encode_v3(&addresses, &fees)?))
    };
    anyhow::ensure!(
        !quote.is_fallback(),
        "the quoter is unavailable, refusing to swap on a spot price estimate"
    );
    if let Some(warning) = &quote.warning {
        println!("Warning: {warning}");
    }
    let min_out = amm::min_out(quote.amount_out, args.slippage);
    println!(
        "  Expected:  {} {to}",
        format_amount(quote.amount_out, to.decimals)
    );
    println!(
        "  Min out:   {} {to} ({} slippage)",
        format_amount(min_out, to.decimals),
        args.slippage
    );

    let signer = session.signer().await?;
    let router_address = session.network.enosys.swap_router;
    erc20::ensure_balance(&signer.provider, &from, signer.address, amount_in).await?;
    erc20::ensure_allowance(&signer.provider, &from, signer.address, router_address, amount_in)
        .await?;

    let router = SwapRouter::Instance::new(router_address, signer.provider.clone());
    let receipt = match path {
        None => {
            let params = SwapRouter::ExactInputSingleParams {
                tokenIn: from.address,
                tokenOut: to.address,
                fee: fee_tier(args.fee)?,
                recipient: signer.address,
                deadline: tx::deadline(),
                amountIn: amount_in,
                amountOutMinimum: min_out,
                sqrtPriceLimitX96: U160::ZERO,
            };
            tx::send(router.exactInputSingle(params), "swap").await?
        }
        Some(path) => {
            let params = SwapRouter::ExactInputParams {
                path,
                recipient: signer.address,
                deadline: tx::deadline(),
                amountIn: amount_in,
                amountOutMinimum: min_out,
            };
            tx::send(router.exactInput(params), "swap").await?
        }
    };
    let confirmation = tx::Confirmation::from(&receipt);
    println!("  Swapped: {confirmation}");
    println!("  {}", session.network.tx_url(confirmation.hash));
    Ok(())
}

pub async fn pool(
    session: &Session,
    dex: &dyn Dex,
    from: &str,
    to: &str,
    fee: Option<u32>,
) -> Result<()> {
    let token0 = session.network.resolve_dex(from)?;
    let token1 = session.network.resolve_dex(to)?;
    let (token0, token1) = futures::try_join!(
        erc20::token_info(&session.provider, token0),
        erc20::token_info(&session.provider, token1),
    )?;
    let tiers = match fee {
        Some(fee) => vec![fee],
        None => session.network.enosys.fee_tiers.clone(),
    };
    let pools = pool_states(dex, &token0, &token1, &tiers).await?;
    if pools.is_empty() {
        println!("No {token0}/{token1} pools found");
    }
    for (fee, state) in pools {
        println!("{token0}/{token1} {} fee", fee_to_percent(fee, 2));
        println!("  Pool:      {}", state.address);
        println!("  Tick:      {}", state.tick);
        println!("  Liquidity: {}", state.liquidity);
        println!("  Spacing:   {}", state.tick_spacing);
    }
    Ok(())
}

/// Scans every configured pair over every fee tier.
pub async fn pools(session: &Session, dex: &dyn Dex) -> Result<()> {
    let network = &session.network;
    let pairs = network
        .enosys
        .pairs
        .iter()
        .map(|(a, b)| Ok((network.token(a)?, network.token(b)?)))
        .collect::<Result<Vec<_>>>()?;
    let scans = pairs.iter().map(|(a, b)| async move {
        let pools = pool_states(dex, a, b, &network.enosys.fee_tiers).await?;
        Ok::<_, anyhow::Error>((*a, *b, pools))
    });
    println!("{:<16}{:<8}{:<44}Liquidity", "Pair", "Fee", "Pool");
    for (a, b, pools) in future::try_join_all(scans).await? {
        for (fee, state) in pools {
            println!(
                "{:<16}{:<8}{:<44}{}",
                format!("{a}/{b}"),
                fee_to_percent(fee, 2),
                state.address.to_string(),
                state.liquidity
            );
        }
    }
    Ok(())
}

/// States of the existing pools of a pair, in fee tier order.
async fn pool_states(
    dex: &dyn Dex,
    a: &Token,
    b: &Token,
    tiers: &[u32],
) -> Result<Vec<(u32, PoolState)>> {
    let lookups = tiers.iter().map(|fee| async move {
        match dex.pool(a.address, b.address, *fee).await? {
            Some(pool) => Ok(Some((*fee, dex.pool_state(pool).await?))),
            None => Ok::<_, anyhow::Error>(None),
        }
    });
    Ok(future::try_join_all(lookups)
        .await?
        .into_iter()
        .flatten()
        .collect())
}

pub fn render_quote(title: &str, from: &Token, to: &Token, quote: &Quote) -> String {
    let amount_in = to_f64(quote.amount_in, from.decimals);
    let amount_out = to_f64(quote.amount_out, to.decimals);
    let rate = if amount_in > 0. { amount_out / amount_in } else { 0. };
    let mut out = String::new();
    // Writing to a string never fails.
    let _ = writeln!(out, "{title}");
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
    let _ = writeln!(out, "  Fee:       {}", fee_to_percent(quote.fee, 2));
    if let Some(gas) = quote.gas_estimate {
        let _ = writeln!(out, "  Gas est:   {gas}");
    }
    let _ = writeln!(out, "  Source:    {}", quote.source);
    if let Some(warning) = &quote.warning {
        let _ = writeln!(out, "Warning: {warning}");
    }
    out
}

pub fn render_comparison(to: &Token, comparison: &Comparison) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "  Fee tiers:");
    for (fee, quote) in &comparison.tiers {
        let line = match quote {
            Ok(quote) if quote.is_fallback() => format!(
                "{} {to} (estimate)",
                format_amount(quote.amount_out, to.decimals)
            ),
            Ok(quote) => format!("{} {to}", format_amount(quote.amount_out, to.decimals)),
            Err(err) => format!("unavailable: {err}"),
        };
        let _ = writeln!(out, "    {:<8}{line}", fee_to_percent(*fee, 2));
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

    fn quote(amount_out: u64, source: Source) -> Quote {
        Quote {
            amount_in: U256::from(100_000_000_000_000_000_000u128),
            amount_out: U256::from(amount_out),
            fee: 3000,
            gas_estimate: (source == Source::Quoter).then(|| U256::from(90_000)),
            ticks_crossed: Some(1),
            source,
            warning: None,
        }
    }

    #[test]
    fn renders_quotes() {
        let rendered = render_quote(
            "Enosys V3 quote",
            &token("WFLR", 18),
            &token("FXRP", 6),
            &quote(2_500_000, Source::Quoter),
        );
        assert_eq!(
            rendered,
            "Enosys V3 quote\n  From:      100.0 WFLR\n  To:        2.5 FXRP\n  Rate:      1 WFLR = \
             0.025000 FXRP\n  Fee:       0.30%\n  Gas est:   90000\n  Source:    quoter\n"
        );
    }

    #[test]
    fn marks_estimates_in_comparison() {
        let comparison = Comparison {
            tiers: vec![
                (500, Err(anyhow::anyhow!("no pool"))),
                (3000, Ok(quote(1_000_000, Source::Naive))),
                (10_000, Ok(quote(900_000, Source::Quoter))),
            ],
        };
        let rendered = render_comparison(&token("FXRP", 6), &comparison);
        assert!(rendered.contains("0.05%   unavailable: no pool"));
        assert!(rendered.contains("0.30%   1.0 FXRP (estimate)"));
        assert!(rendered.contains("1.00%   0.9 FXRP\n"));
    }
}
