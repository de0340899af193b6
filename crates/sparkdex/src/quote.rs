use {
    crate::dex::Dex,
    alloy::primitives::{Address, U256},
    amm::Quote,
    anyhow::{Context, Result},
    chain::Token,
};

/// Quotes the pair's pool. When the quoter call fails the output is
/// estimated from `globalState` and the quote carries a warning.
pub async fn quote_single(dex: &dyn Dex, from: &Token, to: &Token, amount_in: U256) -> Result<Quote> {
    let err = match dex.quote_single(from.address, to.address, amount_in).await {
        Ok(output) => {
            return Ok(Quote::from_quoter(
                amount_in,
                output.amount_out,
                output.fee,
                output.ticks_crossed,
                output.gas_estimate,
            ));
        }
        Err(err) => err,
    };
    tracing::debug!(?err, "quoter call failed, estimating from spot price");
    let pool = dex
        .pool(from.address, to.address)
        .await?
        .with_context(|| format!("{err:#}; no {from}/{to} pool to estimate from"))?;
    let state = dex.pool_state(pool).await?;
    let quote = Quote::naive(
        amount_in,
        state.sqrt_price_x96,
        state.liquidity,
        u32::from(state.last_fee),
        state.token0 == from.address,
    )
    .context("spot price estimate overflows")?;
    if let Some(warning) = &quote.warning {
        tracing::warn!("{warning}");
    }
    Ok(quote)
}

/// Quotes a route through the default deployer of every hop.
pub async fn quote_route(dex: &dyn Dex, route: &[&Token], amount_in: U256) -> Result<Quote> {
    let addresses: Vec<Address> = route.iter().map(|token| token.address).collect();
    let path = amm::path::encode_algebra_default(&addresses)?;
    let output = dex.quote_path(path, amount_in).await?;
    Ok(Quote::from_quoter(
        amount_in,
        output.amount_out,
        output.fee,
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
    };

    const POOL: Address = address!("00000000000000000000000000000000000000aa");

    fn token(symbol: &str, address: Address) -> Token {
        Token {
            symbol: symbol.to_string(),
            address,
            decimals: 18,
        }
    }

    fn wflr() -> Token {
        token("WFLR", address!("1D80c49BbBCd1C0911346656B529DF9E5c2F783d"))
    }

    fn fxrp() -> Token {
        token("FXRP", address!("Ad552A648C74D49E10027AB8a618A3ad4901c5bE"))
    }

    #[tokio::test]
    async fn reports_dynamic_fee_from_quoter() {
        let mut dex = MockDex::new();
        dex.expect_quote_single().returning(|_, _, _| {
            Ok(QuoterOutput {
                amount_out: U256::from(990),
                fee: 2_345,
                ticks_crossed: 0,
                gas_estimate: U256::from(100_000),
            })
        });
        dex.expect_pool().never();

        let quote = quote_single(&dex, &wflr(), &fxrp(), U256::from(1_000))
            .await
            .unwrap();
        assert_eq!(quote.fee, 2_345);
        assert_eq!(amm::fee_to_percent(quote.fee, 4), "0.2345%");
        assert!(!quote.is_fallback());
    }

    #[tokio::test]
    async fn estimates_from_global_state_when_quoter_fails() {
        let mut dex = MockDex::new();
        dex.expect_quote_single()
            .returning(|_, _, _| Err(anyhow::anyhow!("execution reverted")));
        dex.expect_pool().returning(|_, _| Ok(Some(POOL)));
        dex.expect_pool_state().returning(|_| {
            Ok(PoolState {
                address: POOL,
                // WFLR is token1 of this pool.
                token0: fxrp().address,
                sqrt_price_x96: U256::from(2) << 96,
                tick: 13_863,
                last_fee: 3_000,
                liquidity: 1,
                tick_spacing: 60,
            })
        });

        let quote = quote_single(&dex, &wflr(), &fxrp(), U256::from(4_000_000))
            .await
            .unwrap();
        assert!(quote.is_fallback());
        assert_eq!(quote.fee, 3_000);
        // token1 in: divided by the price of 4 after the 0.3% fee
        assert_eq!(quote.amount_out, U256::from(997_000));
        assert!(quote.warning.is_some());
    }

    #[tokio::test]
    async fn missing_pool_reports_both_failures() {
        let mut dex = MockDex::new();
        dex.expect_quote_single()
            .returning(|_, _, _| Err(anyhow::anyhow!("execution reverted")));
        dex.expect_pool().returning(|_, _| Ok(None));

        let err = quote_single(&dex, &wflr(), &fxrp(), U256::from(1))
            .await
            .unwrap_err()
            .to_string();
        assert_eq!(
            err,
            "execution reverted; no WFLR/FXRP pool to estimate from"
        );
    }

    #[tokio::test]
    async fn routes_use_algebra_paths() {
        let sflr = token("sFLR", address!("12e605bc104e93B45e1aD99F9e555f659051c2BB"));
        let mut dex = MockDex::new();
        dex.expect_quote_path()
            .withf(|path, _| {
                let (tokens, deployers) = amm::path::decode_algebra(path).unwrap();
                tokens.len() == 3 && deployers.iter().all(|deployer| deployer.is_zero())
            })
            .returning(|_, _| {
                Ok(QuoterOutput {
                    amount_out: U256::from(12),
                    fee: 0,
                    ticks_crossed: 14,
                    gas_estimate: U256::from(200_000),
                })
            });
        dex.expect_quote_single().never();

        let quote = quote_route(&dex, &[&wflr(), &sflr, &fxrp()], U256::from(100))
            .await
            .unwrap();
        assert_eq!(quote.amount_out, U256::from(12));
        // crossing more than ten ticks triggers the price impact warning
        assert!(quote.warning.unwrap().contains("14 initialized ticks"));
    }
}
