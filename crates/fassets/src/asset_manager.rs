//! Read access to the asset manager and the FAsset token.

use {
    alloy::primitives::{Address, U256},
    anyhow::{Context, Result},
    async_trait::async_trait,
    contracts::alloy::{AssetManager as Contract, ERC20},
    ethrpc::AlloyProvider,
};

/// Agents are listed in pages of this size.
const AGENT_PAGE: u64 = 20;

/// Agents reporting more free lots than this are shown as unlimited.
pub const UNLIMITED_LOTS: u64 = 1_000_000;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Agent {
    pub vault: Address,
    pub fee_bips: U256,
    pub free_lots: U256,
}

impl Agent {
    pub fn can_mint(&self, lots: u64) -> bool {
        !self.vault.is_zero() && self.free_lots >= U256::from(lots)
    }
}

impl From<Contract::AvailableAgentInfo> for Agent {
    fn from(info: Contract::AvailableAgentInfo) -> Self {
        Self {
            vault: info.agentVault,
            fee_bips: info.feeBIPS,
            free_lots: info.freeCollateralLots,
        }
    }
}

#[cfg_attr(any(test, feature = "test-util"), mockall::automock)]
#[async_trait]
pub trait AssetManager: Send + Sync {
    /// Lot size in UBA.
    async fn lot_size(&self) -> Result<U256>;
    async fn minting_decimals(&self) -> Result<U256>;
    /// Native tokens to pay for reserving `lots`.
    async fn reservation_fee(&self, lots: u64) -> Result<U256>;
    async fn available_agents(&self) -> Result<Vec<Agent>>;
}

/// Balance of the minted token, polled while waiting for a mint.
#[cfg_attr(any(test, feature = "test-util"), mockall::automock)]
#[async_trait]
pub trait Balances: Send + Sync {
    async fn balance_of(&self, owner: Address) -> Result<U256>;
}

pub struct Onchain {
    contract: Contract::Instance,
}

impl Onchain {
    pub fn new(address: Address, provider: AlloyProvider) -> Self {
        Self {
            contract: Contract::Instance::new(address, provider),
        }
    }
}

#[async_trait]
impl AssetManager for Onchain {
    async fn lot_size(&self) -> Result<U256> {
        self.contract
            .lotSize()
            .call()
            .await
            .context("failed to read the lot size")
    }

    async fn minting_decimals(&self) -> Result<U256> {
        self.contract
            .assetMintingDecimals()
            .call()
            .await
            .context("failed to read the minting decimals")
    }

    async fn reservation_fee(&self, lots: u64) -> Result<U256> {
        self.contract
            .collateralReservationFee(U256::from(lots))
            .call()
            .await
            .context("failed to read the collateral reservation fee")
    }

    async fn available_agents(&self) -> Result<Vec<Agent>> {
        let mut agents = Vec::new();
        let mut start = 0;
        loop {
            let page = self
                .contract
                .getAvailableAgentsDetailedList(U256::from(start), U256::from(start + AGENT_PAGE))
                .call()
                .await
                .context("failed to list available agents")?;
            let fetched = page.agents.len();
            agents.extend(page.agents.into_iter().map(Agent::from));
            start += AGENT_PAGE;
            if fetched == 0 || U256::from(start) >= page.totalLength {
                break;
            }
        }
        Ok(agents)
    }
}

pub struct TokenBalances {
    token: ERC20::Instance,
}

impl TokenBalances {
    pub fn new(token: Address, provider: AlloyProvider) -> Self {
        Self {
            token: ERC20::Instance::new(token, provider),
        }
    }
}

#[async_trait]
impl Balances for TokenBalances {
    async fn balance_of(&self, owner: Address) -> Result<U256> {
        self.token
            .balanceOf(owner)
            .call()
            .await
            .context("failed to read the FXRP balance")
    }
}

/// First agent able to mint `lots` at a fee of at most `max_fee_bips`.
pub fn pick_agent(agents: &[Agent], lots: u64, max_fee_bips: u32) -> Option<&Agent> {
    agents
        .iter()
        .find(|agent| agent.can_mint(lots) && agent.fee_bips <= U256::from(max_fee_bips))
}

#[cfg(test)]
mod tests {
    use {super::*, alloy::primitives::address};

    fn agent(vault: Address, fee_bips: u64, free_lots: u64) -> Agent {
        Agent {
            vault,
            fee_bips: U256::from(fee_bips),
            free_lots: U256::from(free_lots),
        }
    }

    #[test]
    fn picks_first_agent_with_capacity_and_acceptable_fee() {
        let agents = [
            agent(Address::ZERO, 0, 100),
            agent(address!("00000000000000000000000000000000000000a1"), 25, 1),
            agent(address!("00000000000000000000000000000000000000a2"), 3000, 50),
            agent(address!("00000000000000000000000000000000000000a3"), 25, 50),
            agent(address!("00000000000000000000000000000000000000a4"), 10, 50),
        ];
        let picked = pick_agent(&agents, 2, 2500).unwrap();
        assert_eq!(picked.vault, address!("00000000000000000000000000000000000000a3"));
        assert!(pick_agent(&agents, 100, 2500).is_none());
    }
}
