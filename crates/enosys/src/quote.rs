//! Quoting across fee tiers with a spot price fallback.

use {
    crate::dex::Dex,
    alloy::primitives::{Address, U256},
    amm::{Quote, fee_to_percent},
    anyhow::{Context, Result},
    chain::Token,
    futures::future,
};

/// Quotes a single pool. If the quoter call fails the output is estimated
/// from the pool's spot price instead and the quote is marked as a
/// fallback.
pub async fn quote_tier(
    dex: &dyn Dex,
    from: &Token,
    to: &Token,
    amount_in: U256,
    fee: u32,
) -> Result<Quote> {
    let err = match dex
        .quote_single(from.address, to.address, amount_in, fee)
        .await
    {
        Ok(output) => {
            return Ok(Quote::from_quoter(
                amount_in,
                output.amount_out,
                fee,
                output.ticks_crossed,
                output.gas_estimate,
            ));
        }
        Err(err) => err,
    };
    tracing::debug!(?err, fee, "quoter call failed, estimating from spot price");
    let quote = spot_price_quote(dex, from, to, amount_in, fee)
        .await
        .with_context(|| format!("{err:#}"))?;
    if let Some(warning) = &quote.warning {
        tracing::warn!(fee, "{warning}");
    }
    Ok(quote)
}

async fn spot_price_quote(
    dex: &dyn Dex,
    from: &Token,
    to: &Token,
    amount_in: U256,
    fee: u32,
) -> Result<Quote> {
    let pool = dex
        .pool(from.address, to.address, fee)
        .await?
        .with_context(|| {
            format!(
                "no {from}/{to} pool with a {} fee",
                fee_to_percent(fee, 2)
            )
        })?;
    let state = dex.pool_state(pool).await?;
    Quote::naive(
        amount_in,
        state.sqrt_price_x96,
        state.liquidity,
        fee,
        state.token0 == from.address,
    )
    .context("spot price estimate overflows")
}

/// Outcome of quoting every fee tier.
#[derive(Debug)]
pub struct Comparison {
    pub tiers: Vec<(u32, Result<Quote>)>,
}

impl Comparison {
    /// The highest output, preferring real quoter results over spot price
    /// estimates.
    pub fn best(&self) -> Option<&Quote> {
        let quotes = || self.tiers.iter().filter_map(|(_, quote)| quote.as_ref().ok());
        quotes()
            .filter(|quote| !quote.is_fallback())
            .max_by_key(|quote| quote.amount_out)
            .or_else(|| quotes().max_by_key(|quote| quote.amount_out))
    }
}

/// Quotes all fee tiers concurrently, each with the spot price fallback.
pub async fn compare_tiers(
    dex: &dyn Dex,
    from: &Token,
    to: &Token,
    amount_in: U256,
    tiers: &[u32],
) -> Comparison {
    let quotes = tiers
        .iter()
        .map(|fee| quote_tier(dex, from, to, amount_in, *fee));
    let results = future::join_all(quotes).await;
    Comparison {
        tiers: tiers.iter().copied().zip(results).collect(),
    }
}

/// Best quoter result across the fee tiers. Tiers where the quoter fails
/// (usually because the pool does not exist) are skipped.
pub async fn best_quote(
    dex: &dyn Dex,
    from: &Token,
    to: &Token,
    amount_in: U256,
    tiers: &[u32],
) -> Result<Quote> {
    let quotes = tiers.iter().map(|fee| async move {
        match dex
            .quote_single(from.address, to.address, amount_in, *fee)
            .await
        {
            Ok(output) => Some(Quote::from_quoter(
                amount_in,
                output.amount_out,
                *fee,
                output.ticks_crossed,
                output.gas_estimate,
            )),
            Err(err) => {
                tracing::debug!(?err, fee, "skipping fee tier");
                None
            }
        }
    });
    future::join_all(quotes)
        .await
        .into_iter()
        .flatten()
        .max_by_key(|quote| quote.amount_out)
        .with_context(|| format!("no {from}/{to} pools found"))
}

/// Quotes a multi-hop route. There is no spot price fallback for routes.
pub async fn quote_route(
    dex: &dyn Dex,
    route: &[&Token],
    fees: &[u32],
    amount_in: U256,
) -> Result<Quote> {
    let addresses: Vec<Address> = route.iter().map(|token| token.address).collect();
    let path = amm::path::encode_v3(&addresses, fees)?;
    let output = dex.quote_path(path, amount_in).await?;
    Ok(Quote::from_quoter(
        amount_in,
        output.amount_out,
        fees.iter().sum(),
        output.ticks_crossed,
        output.gas_estimate,
    ))
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::dex::{MockDex, PoolState, QuoterOutput},
        alloy::primitives::address,
        mockall::predicate::eq,
    };

    fn token(symbol: &str, address: Address, decimals: u8) -> Token {
        Token {
            symbol: symbol.to_string(),
            address,
            decimals,
        }
    }

    fn wflr() -> Token {
        token("WFLR", address!("1D80c49BbBCd1C0911346656B529DF9E5c2F783d"), 18)
    }

    fn usdt() -> Token {
        token("USDT0", address!("e7cd86e13AC4309349F30B3435a9d337750fC82D"), 18)
    }

    fn output(amount_out: u64) -> QuoterOutput {
        QuoterOutput {
            amount_out: U256::from(amount_out),
            ticks_crossed: 1,
            gas_estimate: U256::from(80_000),
        }
    }

    const POOL: Address = address!("00000000000000000000000000000000000000aa");

    fn pool_state(token0: Address) -> PoolState {
        PoolState {
            address: POOL,
            token0,
            // sqrt price 2.0, a price of 4 token1 per token0
            sqrt_price_x96: U256::from(2) << 96,
            tick: 13_863,
            liquidity: 1_000_000,
            tick_spacing: 60,
        }
    }

    #[tokio::test]
    async fn uses_quoter_when_it_succeeds() {
        let mut dex = MockDex::new();
        dex.expect_quote_single()
            .returning(|_, _, _, _| Ok(output(3_900)));
        dex.expect_pool().never();
        dex.expect_pool_state().never();

        let quote = quote_tier(&dex, &wflr(), &usdt(), U256::from(1_000), 3000)
            .await
            .unwrap();
        assert!(!quote.is_fallback());
        assert_eq!(quote.amount_out, U256::from(3_900));
        assert_eq!(quote.warning, None);
    }

    #[tokio::test]
    async fn falls_back_to_spot_price_when_quoter_fails() {
        let mut dex = MockDex::new();
        dex.expect_quote_single()
            .returning(|_, _, _, _| Err(anyhow::anyhow!("execution reverted")));
        dex.expect_pool()
            .with(eq(wflr().address), eq(usdt().address), eq(3000))
            .returning(|_, _, _| Ok(Some(POOL)));
        dex.expect_pool_state()
            .with(eq(POOL))
            .returning(|_| Ok(pool_state(wflr().address)));

        let quote = quote_tier(&dex, &wflr(), &usdt(), U256::from(1_000_000), 3000)
            .await
            .unwrap();
        assert!(quote.is_fallback());
        assert_eq!(quote.amount_out, U256::from(3_988_000));
        assert_eq!(
            quote.warning.as_deref(),
            Some(amm::quote::NAIVE_QUOTE_WARNING)
        );
    }

    #[tokio::test]
    async fn fallback_needs_a_pool() {
        let mut dex = MockDex::new();
        dex.expect_quote_single()
            .returning(|_, _, _, _| Err(anyhow::anyhow!("execution reverted")));
        dex.expect_pool().returning(|_, _, _| Ok(None));

        let err = quote_tier(&dex, &wflr(), &usdt(), U256::from(1), 500)
            .await
            .unwrap_err();
        assert!(format!("{err:#}").contains("no WFLR/USDT0 pool with a 0.05% fee"));
        assert!(format!("{err:#}").contains("execution reverted"));
    }

    #[tokio::test]
    async fn comparison_prefers_quoter_results() {
        let mut dex = MockDex::new();
        dex.expect_quote_single()
            .returning(|_, _, _, fee| match fee {
                500 => Ok(output(3_000)),
                3000 => Err(anyhow::anyhow!("reverted")),
                _ => Ok(output(3_500)),
            });
        dex.expect_pool().returning(|_, _, _| Ok(Some(POOL)));
        dex.expect_pool_state()
            .returning(|_| Ok(pool_state(wflr().address)));

        let comparison =
            compare_tiers(&dex, &wflr(), &usdt(), U256::from(1_000), &[500, 3000, 10_000]).await;
        assert_eq!(comparison.tiers.len(), 3);
        // The spot price estimate for 3000 is higher but only an estimate.
        let fallback = comparison.tiers[1].1.as_ref().unwrap();
        assert!(fallback.is_fallback());
        assert!(fallback.amount_out > U256::from(3_500));
        let best = comparison.best().unwrap();
        assert_eq!(best.fee, 10_000);
        assert_eq!(best.amount_out, U256::from(3_500));
    }

    #[tokio::test]
    async fn best_quote_skips_failing_tiers() {
        let mut dex = MockDex::new();
        dex.expect_quote_single()
            .returning(|_, _, _, fee| match fee {
                3000 => Ok(output(2_000)),
                _ => Err(anyhow::anyhow!("no pool")),
            });
        dex.expect_pool().never();

        let best = best_quote(&dex, &wflr(), &usdt(), U256::from(1_000), &[500, 3000, 10_000])
            .await
            .unwrap();
        assert_eq!(best.fee, 3000);

        let mut dex = MockDex::new();
        dex.expect_quote_single()
            .returning(|_, _, _, _| Err(anyhow::anyhow!("no pool")));
        let err = best_quote(&dex, &wflr(), &usdt(), U256::from(1_000), &[500])
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "no WFLR/USDT0 pools found");
    }

    #[tokio::test]
    async fn routes_sum_fees_and_encode_paths() {
        let fxrp = token("FXRP", address!("Ad552A648C74D49E10027AB8a618A3ad4901c5bE"), 6);
        let mut dex = MockDex::new();
        dex.expect_quote_path()
            .withf(|path, amount| path.len() == 66 && *amount == U256::from(5))
            .returning(|_, _| Ok(output(7)));

        let quote = quote_route(&dex, &[&wflr(), &fxrp, &usdt()], &[3000, 500], U256::from(5))
            .await
            .unwrap();
        assert_eq!(quote.fee, 3500);
        assert_eq!(quote.amount_out, U256::from(7));
    }
}
