//! Read access to the Enosys V3 quoter, factory and pools.

use {
    alloy::primitives::{
        Address,
        Bytes,
        U256,
        aliases::{U24, U160},
    },
    anyhow::{Context, Result},
    async_trait::async_trait,
    contracts::alloy::{QuoterV2, UniswapV3Factory, UniswapV3Pool},
    ethrpc::AlloyProvider,
};

/// What the quoter reports for a simulated exact input swap.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuoterOutput {
    pub amount_out: U256,
    pub ticks_crossed: u32,
    pub gas_estimate: U256,
}

/// Snapshot of a pool's price and liquidity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PoolState {
    pub address: Address,
    pub token0: Address,
    pub sqrt_price_x96: U256,
    pub tick: i32,
    pub liquidity: u128,
    pub tick_spacing: i32,
}

#[cfg_attr(any(test, feature = "test-util"), mockall::automock)]
#[async_trait]
pub trait Dex: Send + Sync {
    /// Simulates a single pool swap through `quoteExactInputSingle`.
    async fn quote_single(
        &self,
        token_in: Address,
        token_out: Address,
        amount_in: U256,
        fee: u32,
    ) -> Result<QuoterOutput>;

    /// Simulates a swap along an encoded V3 path.
    async fn quote_path(&self, path: Bytes, amount_in: U256) -> Result<QuoterOutput>;

    /// The pool for a pair and fee tier, `None` if it was never created.
    async fn pool(&self, token_a: Address, token_b: Address, fee: u32) -> Result<Option<Address>>;

    async fn pool_state(&self, pool: Address) -> Result<PoolState>;
}

/// [`Dex`] backed by the deployed contracts.
pub struct Enosys {
    quoter: QuoterV2::Instance,
    factory: UniswapV3Factory::Instance,
    provider: AlloyProvider,
}

impl Enosys {
    pub fn new(provider: AlloyProvider, contracts: &chain::Enosys) -> Self {
        Self {
            quoter: QuoterV2::Instance::new(contracts.quoter, provider.clone()),
            factory: UniswapV3Factory::Instance::new(contracts.factory, provider.clone()),
            provider,
        }
    }
}

pub(crate) fn fee_tier(fee: u32) -> Result<U24> {
    U24::try_from(fee).map_err(|_| anyhow::anyhow!("fee tier {fee} does not fit in 24 bits"))
}

#[async_trait]
impl Dex for Enosys {
    async fn quote_single(
        &self,
        token_in: Address,
        token_out: Address,
        amount_in: U256,
        fee: u32,
    ) -> Result<QuoterOutput> {
        let params = QuoterV2::QuoteExactInputSingleParams {
            tokenIn: token_in,
            tokenOut: token_out,
            amountIn: amount_in,
            fee: fee_tier(fee)?,
            sqrtPriceLimitX96: U160::ZERO,
        };
        let result = self
            .quoter
            .quoteExactInputSingle(params)
            .call()
            .await
            .with_context(|| format!("quoter failed for fee tier {fee}"))?;
        Ok(QuoterOutput {
            amount_out: result.amountOut,
            ticks_crossed: result.initializedTicksCrossed,
            gas_estimate: result.gasEstimate,
        })
    }

    async fn quote_path(&self, path: Bytes, amount_in: U256) -> Result<QuoterOutput> {
        let result = self
            .quoter
            .quoteExactInput(path, amount_in)
            .call()
            .await
            .context("quoter failed for multi-hop path")?;
        Ok(QuoterOutput {
            amount_out: result.amountOut,
            ticks_crossed: result.initializedTicksCrossedList.iter().sum(),
            gas_estimate: result.gasEstimate,
        })
    }

    async fn pool(&self, token_a: Address, token_b: Address, fee: u32) -> Result<Option<Address>> {
        let pool = self
            .factory
            .getPool(token_a, token_b, fee_tier(fee)?)
            .call()
            .await
            .context("factory getPool failed")?;
        Ok((!pool.is_zero()).then_some(pool))
    }

    async fn pool_state(&self, address: Address) -> Result<PoolState> {
        let pool = UniswapV3Pool::Instance::new(address, self.provider.clone());
        let slot0 = pool.slot0();
        let liquidity = pool.liquidity();
        let tick_spacing = pool.tickSpacing();
        let token0 = pool.token0();
        let (slot0, liquidity, tick_spacing, token0) = futures::try_join!(
            slot0.call().into_future(),
            liquidity.call().into_future(),
            tick_spacing.call().into_future(),
            token0.call().into_future(),
        )
        .with_context(|| format!("failed to read pool {address}"))?;
        Ok(PoolState {
            address,
            token0,
            sqrt_price_x96: U256::from(slot0.sqrtPriceX96),
            tick: slot0.tick.as_i32(),
            liquidity,
            tick_spacing: tick_spacing.as_i32(),
        })
    }
}
