//! Typed bindings for every contract the tools talk to.
//!
//! Addresses are not part of the bindings, they come from the network
//! configuration so the same bindings work against forks and test
//! deployments.

pub use alloy::providers::DynProvider as Provider;

/// Generates `sol!` bindings for an interface inside a module named after
/// the contract, plus an `Instance` alias bound to the dynamic provider.
#[macro_export]
macro_rules! bindings {
    ($contract:ident { $($body:tt)* }) => {
        paste::paste! {
            // Generate the main bindings in a private module. That allows
            // us to re-export all items in our own module while also adding
            // some items ourselves.
            #[allow(non_snake_case)]
            mod [<$contract Private>] {
                alloy::sol!(
                    #[allow(missing_docs)]
                    #[sol(rpc)]
                    interface $contract {
                        $($body)*
                    }
                );
            }

            #[allow(non_snake_case)]
            pub mod $contract {
                use alloy::providers::DynProvider;

                pub use super::[<$contract Private>]::$contract::*;
                pub type Instance = [<$contract Instance>]<DynProvider>;
            }
        }
    };
}

crate::bindings!(ERC20 {
    event Transfer(address indexed from, address indexed to, uint256 value);
    event Approval(address indexed owner, address indexed spender, uint256 value);

    function name() external view returns (string);
    function symbol() external view returns (string);
    function decimals() external view returns (uint8);
    function totalSupply() external view returns (uint256);
    function balanceOf(address owner) external view returns (uint256);
    function allowance(address owner, address spender) external view returns (uint256);
    function approve(address spender, uint256 amount) external returns (bool);
    function transfer(address to, uint256 amount) external returns (bool);
});

// Wrapped native token (WFLR).
crate::bindings!(WNat {
    function deposit() external payable;
    function withdraw(uint256 amount) external;
    function balanceOf(address owner) external view returns (uint256);
});

crate::bindings!(UniswapV3Factory {
    function getPool(address tokenA, address tokenB, uint24 fee) external view returns (address pool);
});

crate::bindings!(UniswapV3Pool {
    function slot0() external view returns (
        uint160 sqrtPriceX96,
        int24 tick,
        uint16 observationIndex,
        uint16 observationCardinality,
        uint16 observationCardinalityNext,
        uint8 feeProtocol,
        bool unlocked
    );
    function liquidity() external view returns (uint128);
    function tickSpacing() external view returns (int24);
    function token0() external view returns (address);
    function token1() external view returns (address);
    function fee() external view returns (uint24);
});

crate::bindings!(NonfungiblePositionManager {
    struct MintParams {
        address token0;
        address token1;
        uint24 fee;
        int24 tickLower;
        int24 tickUpper;
        uint256 amount0Desired;
        uint256 amount1Desired;
        uint256 amount0Min;
        uint256 amount1Min;
        address recipient;
        uint256 deadline;
    }

    struct IncreaseLiquidityParams {
        uint256 tokenId;
        uint256 amount0Desired;
        uint256 amount1Desired;
        uint256 amount0Min;
        uint256 amount1Min;
        uint256 deadline;
    }

    struct DecreaseLiquidityParams {
        uint256 tokenId;
        uint128 liquidity;
        uint256 amount0Min;
        uint256 amount1Min;
        uint256 deadline;
    }

    struct CollectParams {
        uint256 tokenId;
        address recipient;
        uint128 amount0Max;
        uint128 amount1Max;
    }

    event Transfer(address indexed from, address indexed to, uint256 indexed tokenId);
    event IncreaseLiquidity(uint256 indexed tokenId, uint128 liquidity, uint256 amount0, uint256 amount1);
    event DecreaseLiquidity(uint256 indexed tokenId, uint128 liquidity, uint256 amount0, uint256 amount1);
    event Collect(uint256 indexed tokenId, address recipient, uint256 amount0, uint256 amount1);

    function balanceOf(address owner) external view returns (uint256);
    function tokenOfOwnerByIndex(address owner, uint256 index) external view returns (uint256);
    function positions(uint256 tokenId) external view returns (
        uint96 nonce,
        address operator,
        address token0,
        address token1,
        uint24 fee,
        int24 tickLower,
        int24 tickUpper,
        uint128 liquidity,
        uint256 feeGrowthInside0LastX128,
        uint256 feeGrowthInside1LastX128,
        uint128 tokensOwed0,
        uint128 tokensOwed1
    );
    function mint(MintParams params) external payable returns (
        uint256 tokenId,
        uint128 liquidity,
        uint256 amount0,
        uint256 amount1
    );
    function increaseLiquidity(IncreaseLiquidityParams params) external payable returns (
        uint128 liquidity,
        uint256 amount0,
        uint256 amount1
    );
    function decreaseLiquidity(DecreaseLiquidityParams params) external payable returns (
        uint256 amount0,
        uint256 amount1
    );
    function collect(CollectParams params) external payable returns (uint256 amount0, uint256 amount1);
    function burn(uint256 tokenId) external payable;
});

crate::bindings!(SwapRouter {
    struct ExactInputSingleParams {
        address tokenIn;
        address tokenOut;
        uint24 fee;
        address recipient;
        uint256 deadline;
        uint256 amountIn;
        uint256 amountOutMinimum;
        uint160 sqrtPriceLimitX96;
    }

    struct ExactInputParams {
        bytes path;
        address recipient;
        uint256 deadline;
        uint256 amountIn;
        uint256 amountOutMinimum;
    }

    function exactInputSingle(ExactInputSingleParams params) external payable returns (uint256 amountOut);
    function exactInput(ExactInputParams params) external payable returns (uint256 amountOut);
});

crate::bindings!(QuoterV2 {
    struct QuoteExactInputSingleParams {
        address tokenIn;
        address tokenOut;
        uint256 amountIn;
        uint24 fee;
        uint160 sqrtPriceLimitX96;
    }

    function quoteExactInputSingle(QuoteExactInputSingleParams params) external returns (
        uint256 amountOut,
        uint160 sqrtPriceX96After,
        uint32 initializedTicksCrossed,
        uint256 gasEstimate
    );
    function quoteExactInput(bytes path, uint256 amountIn) external returns (
        uint256 amountOut,
        uint160[] sqrtPriceX96AfterList,
        uint32[] initializedTicksCrossedList,
        uint256 gasEstimate
    );
});

crate::bindings!(AlgebraFactory {
    function poolByPair(address tokenA, address tokenB) external view returns (address pool);
});

crate::bindings!(AlgebraPool {
    function globalState() external view returns (
        uint160 price,
        int24 tick,
        uint16 lastFee,
        uint8 pluginConfig,
        uint16 communityFee,
        bool unlocked
    );
    function liquidity() external view returns (uint128);
    function tickSpacing() external view returns (int24);
    function token0() external view returns (address);
    function token1() external view returns (address);
});

crate::bindings!(AlgebraQuoterV2 {
    struct QuoteExactInputSingleParams {
        address tokenIn;
        address tokenOut;
        address deployer;
        uint256 amountIn;
        uint160 limitSqrtPrice;
    }

    function quoteExactInputSingle(QuoteExactInputSingleParams params) external returns (
        uint256 amountOut,
        uint16 fee,
        uint160 sqrtPriceX96After,
        uint32 initializedTicksCrossed,
        uint256 gasEstimate
    );
    function quoteExactInput(bytes path, uint256 amountIn) external returns (
        uint256 amountOut,
        uint160[] sqrtPriceX96AfterList,
        uint32[] initializedTicksCrossedList,
        uint256 gasEstimate
    );
});

crate::bindings!(AlgebraSwapRouter {
    struct ExactInputSingleParams {
        address tokenIn;
        address tokenOut;
        address deployer;
        address recipient;
        uint256 deadline;
        uint256 amountIn;
        uint256 amountOutMinimum;
        uint160 limitSqrtPrice;
    }

    struct ExactInputParams {
        bytes path;
        address recipient;
        uint256 deadline;
        uint256 amountIn;
        uint256 amountOutMinimum;
    }

    function exactInputSingle(ExactInputSingleParams params) external payable returns (uint256 amountOut);
    function exactInput(ExactInputParams params) external payable returns (uint256 amountOut);
});

crate::bindings!(AssetManager {
    struct AvailableAgentInfo {
        address agentVault;
        address ownerManagementAddress;
        uint256 feeBIPS;
        uint256 mintingVaultCollateralRatioBIPS;
        uint256 mintingPoolCollateralRatioBIPS;
        uint256 freeCollateralLots;
        uint8 status;
    }

    event CollateralReserved(
        address indexed agentVault,
        address indexed minter,
        uint256 indexed collateralReservationId,
        uint256 valueUBA,
        uint256 feeUBA,
        uint256 firstUnderlyingBlock,
        uint256 lastUnderlyingBlock,
        uint256 lastUnderlyingTimestamp,
        string paymentAddress,
        bytes32 paymentReference,
        address executor,
        uint256 executorFeeNatWei
    );

    function lotSize() external view returns (uint256);
    function assetMintingDecimals() external view returns (uint256);
    function collateralReservationFee(uint256 lots) external view returns (uint256);
    function getAvailableAgentsDetailedList(uint256 start, uint256 end) external view returns (
        AvailableAgentInfo[] agents,
        uint256 totalLength
    );
    function reserveCollateral(
        address agentVault,
        uint256 lots,
        uint256 maxMintingFeeBIPS,
        address executor
    ) external payable returns (uint256);
    function redeem(uint256 lots, string redeemerUnderlyingAddressString, address executor)
        external payable returns (uint256 redeemedAmountUBA);
});

#[cfg(test)]
mod tests {
    use {
        super::*,
        alloy::{
            primitives::{Address, B256, LogData, U256, address},
            sol_types::{SolCall, SolEvent},
        },
    };

    #[test]
    fn selectors_match_deployed_contracts() {
        assert_eq!(ERC20::approveCall::SELECTOR, hex_literal::hex!("095ea7b3"));
        assert_eq!(
            SwapRouter::exactInputSingleCall::SELECTOR,
            hex_literal::hex!("414bf389")
        );
        assert_eq!(
            QuoterV2::quoteExactInputSingleCall::SELECTOR,
            hex_literal::hex!("c6a5026a")
        );
        assert_eq!(
            NonfungiblePositionManager::mintCall::SELECTOR,
            hex_literal::hex!("88316456")
        );
    }

    #[test]
    fn decodes_collateral_reserved_events() {
        let event = AssetManager::CollateralReserved {
            agentVault: address!("00000000000000000000000000000000000000aa"),
            minter: address!("00000000000000000000000000000000000000bb"),
            collateralReservationId: U256::from(7),
            valueUBA: U256::from(10_000_000),
            feeUBA: U256::from(50_000),
            firstUnderlyingBlock: U256::from(1),
            lastUnderlyingBlock: U256::from(2),
            lastUnderlyingTimestamp: U256::from(1_700_000_000),
            paymentAddress: "rPEPPER7kfTD9w2To4CQk6UCfuHM9c6GDY".to_string(),
            paymentReference: B256::repeat_byte(0x46),
            executor: Address::ZERO,
            executorFeeNatWei: U256::ZERO,
        };
        let data: LogData = event.encode_log_data();

        let decoded = AssetManager::CollateralReserved::decode_log_data(&data).unwrap();
        assert_eq!(decoded.collateralReservationId, U256::from(7));
        assert_eq!(decoded.paymentAddress, "rPEPPER7kfTD9w2To4CQk6UCfuHM9c6GDY");
        assert_eq!(decoded.valueUBA + decoded.feeUBA, U256::from(10_050_000));
    }
}
