//! ERC-20 reads and the approve-if-short flow used before swaps, mints and
//! redemptions.

use {
    crate::tx,
    alloy::primitives::{Address, U256},
    anyhow::{Context, Result},
    chain::{Token, TokenRef},
    contracts::alloy::ERC20,
    ethrpc::AlloyProvider,
};

/// Turns a resolved token name into a full descriptor. Tokens outside the
/// network table have their symbol and decimals read from the contract.
pub async fn token_info(provider: &AlloyProvider, token: TokenRef<'_>) -> Result<Token> {
    let address = match token {
        TokenRef::Known(token) => return Ok(token.clone()),
        TokenRef::Address(address) => address,
    };
    let erc20 = ERC20::Instance::new(address, provider.clone());
    let symbol = erc20.symbol();
    let decimals = erc20.decimals();
    let (symbol, decimals) = futures::try_join!(
        symbol.call().into_future(),
        decimals.call().into_future()
    )
    .with_context(|| format!("{address} does not look like an ERC-20 token"))?;
    tracing::debug!(%address, %symbol, decimals, "read token metadata");
    Ok(Token {
        symbol,
        address,
        decimals,
    })
}

pub async fn balance(provider: &AlloyProvider, token: Address, owner: Address) -> Result<U256> {
    ERC20::Instance::new(token, provider.clone())
        .balanceOf(owner)
        .call()
        .await
        .with_context(|| format!("failed to read balance of {owner} in {token}"))
}

/// Fails with a readable message when `balance` does not cover `required`.
pub fn check_balance(token: &Token, balance: U256, required: U256) -> Result<()> {
    anyhow::ensure!(
        balance >= required,
        "insufficient {symbol} balance: have {have}, need {need}",
        symbol = token.symbol,
        have = number::format_amount(balance, token.decimals),
        need = number::format_amount(required, token.decimals),
    );
    Ok(())
}

/// Reads the owner's balance and checks it covers `required`.
pub async fn ensure_balance(
    provider: &AlloyProvider,
    token: &Token,
    owner: Address,
    required: U256,
) -> Result<U256> {
    let balance = balance(provider, token.address, owner).await?;
    check_balance(token, balance, required)?;
    Ok(balance)
}

/// Approves `spender` for an unlimited amount if the current allowance does
/// not cover `amount`. Returns whether an approval was sent.
pub async fn ensure_allowance(
    provider: &AlloyProvider,
    token: &Token,
    owner: Address,
    spender: Address,
    amount: U256,
) -> Result<bool> {
    let erc20 = ERC20::Instance::new(token.address, provider.clone());
    let allowance = erc20
        .allowance(owner, spender)
        .call()
        .await
        .with_context(|| format!("failed to read {} allowance", token.symbol))?;
    if allowance >= amount {
        tracing::debug!(token = %token.symbol, %spender, %allowance, "allowance sufficient");
        return Ok(false);
    }
    tracing::info!(token = %token.symbol, %spender, "approving");
    let receipt = tx::send(
        erc20.approve(spender, U256::MAX),
        &format!("approve {}", token.symbol),
    )
    .await?;
    println!("Approved {} for {spender} (tx {})", token.symbol, receipt.transaction_hash);
    Ok(true)
}

#[cfg(test)]
mod tests {
    use {super::*, alloy::primitives::address};

    fn fxrp() -> Token {
        Token {
            symbol: "FXRP".to_string(),
            address: address!("Ad552A648C74D49E10027AB8a618A3ad4901c5bE"),
            decimals: 6,
        }
    }

    #[test]
    fn balance_check() {
        check_balance(&fxrp(), U256::from(10_000_000), U256::from(10_000_000)).unwrap();
        let err = check_balance(&fxrp(), U256::from(9_500_000), U256::from(10_050_000))
            .unwrap_err()
            .to_string();
        assert_eq!(err, "insufficient FXRP balance: have 9.5, need 10.05");
    }

    #[tokio::test]
    async fn known_tokens_need_no_rpc() {
        let provider = ethrpc::alloy::provider(&"http://localhost:1".parse().unwrap(), "test");
        let token = fxrp();
        assert_eq!(
            token_info(&provider, TokenRef::Known(&token)).await.unwrap(),
            token
        );
    }
}
