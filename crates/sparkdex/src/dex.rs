//! Read access to the SparkDex V4 quoter, factory and pools.

use {
    alloy::primitives::{Address, Bytes, U256, aliases::U160},
    anyhow::{Context, Result},
    async_trait::async_trait,
    contracts::alloy::{AlgebraFactory, AlgebraPool, AlgebraQuoterV2},
    ethrpc::AlloyProvider,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuoterOutput {
    pub amount_out: U256,
    /// Fee charged by the pool at quote time, hundredths of a bip. Summed
    /// over all hops for routes.
    pub fee: u32,
    pub ticks_crossed: u32,
    pub gas_estimate: U256,
}

/// Pool state as reported by `globalState`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PoolState {
    pub address: Address,
    pub token0: Address,
    pub sqrt_price_x96: U256,
    pub tick: i32,
    /// Current dynamic fee in hundredths of a bip.
    pub last_fee: u16,
    pub liquidity: u128,
    pub tick_spacing: i32,
}

#[cfg_attr(any(test, feature = "test-util"), mockall::automock)]
#[async_trait]
pub trait Dex: Send + Sync {
    /// Simulates a swap through the default deployer's pool.
    async fn quote_single(
        &self,
        token_in: Address,
        token_out: Address,
        amount_in: U256,
    ) -> Result<QuoterOutput>;

    /// Simulates a swap along an encoded Algebra path. The quoter does not
    /// report fees for routes, so `fee` is zero.
    async fn quote_path(&self, path: Bytes, amount_in: U256) -> Result<QuoterOutput>;

    /// There is at most one pool per pair, `None` if it was never created.
    async fn pool(&self, token_a: Address, token_b: Address) -> Result<Option<Address>>;

    async fn pool_state(&self, pool: Address) -> Result<PoolState>;
}

pub struct Sparkdex {
    quoter: AlgebraQuoterV2::Instance,
    factory: AlgebraFactory::Instance,
    provider: AlloyProvider,
}

impl Sparkdex {
    pub fn new(provider: AlloyProvider, contracts: &chain::Sparkdex) -> Self {
        Self {
            quoter: AlgebraQuoterV2::Instance::new(contracts.quoter, provider.clone()),
            factory: AlgebraFactory::Instance::new(contracts.factory, provider.clone()),
            provider,
        }
    }
}

#[async_trait]
impl Dex for Sparkdex {
    async fn quote_single(
        &self,
        token_in: Address,
        token_out: Address,
        amount_in: U256,
    ) -> Result<QuoterOutput> {
        let params = AlgebraQuoterV2::QuoteExactInputSingleParams {
            tokenIn: token_in,
            tokenOut: token_out,
            deployer: Address::ZERO,
            amountIn: amount_in,
            limitSqrtPrice: U160::ZERO,
        };
        let result = self
            .quoter
            .quoteExactInputSingle(params)
            .call()
            .await
            .context("quoter failed")?;
        Ok(QuoterOutput {
            amount_out: result.amountOut,
            fee: u32::from(result.fee),
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
            fee: 0,
            ticks_crossed: result.initializedTicksCrossedList.iter().sum(),
            gas_estimate: result.gasEstimate,
        })
    }

    async fn pool(&self, token_a: Address, token_b: Address) -> Result<Option<Address>> {
        let pool = self
            .factory
            .poolByPair(token_a, token_b)
            .call()
            .await
            .context("factory poolByPair failed")?;
        Ok((!pool.is_zero()).then_some(pool))
    }

    async fn pool_state(&self, address: Address) -> Result<PoolState> {
        let pool = AlgebraPool::Instance::new(address, self.provider.clone());
        let global_state = pool.globalState();
        let liquidity = pool.liquidity();
        let tick_spacing = pool.tickSpacing();
        let token0 = pool.token0();
        let (global_state, liquidity, tick_spacing, token0) = futures::try_join!(
            global_state.call().into_future(),
            liquidity.call().into_future(),
            tick_spacing.call().into_future(),
            token0.call().into_future(),
        )
        .with_context(|| format!("failed to read pool {address}"))?;
        Ok(PoolState {
            address,
            token0,
            sqrt_price_x96: U256::from(global_state.price),
            tick: global_state.tick.as_i32(),
            last_fee: global_state.lastFee,
            liquidity,
            tick_spacing: tick_spacing.as_i32(),
        })
    }
}
