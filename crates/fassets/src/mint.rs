//! Minting: reserve collateral with an agent, pay the agent on the XRP
//! Ledger and wait until the agent's proof mints the FXRP.

use {
    crate::{
        arguments::Mint,
        asset_manager::{Agent, AssetManager, Balances, Onchain, TokenBalances, pick_agent},
        lots::Requested,
    },
    alloy::{
        primitives::{Address, B256, U256},
        rpc::types::Log,
    },
    anyhow::{Context, Result},
    contracts::alloy::AssetManager as Contract,
    number::format_amount,
    shared::{session::Session, tx},
    std::time::Duration,
    time::{OffsetDateTime, format_description::well_known::Rfc3339},
    xrpl::{
        ClassicAddress,
        Ledger,
        amount::format_xrp,
        client::{AccountInfo, Error as LedgerError},
        codec::Memo,
        wallet::PaymentRequest,
    },
};

/// How often and how long to watch the FXRP balance after paying.
#[derive(Clone, Copy, Debug)]
pub struct Poll {
    pub interval: Duration,
    pub attempts: u32,
}

pub const MINT_POLL: Poll = Poll {
    interval: Duration::from_secs(30),
    attempts: 40,
};

/// Progress is printed every this many polls.
const PROGRESS_EVERY: u32 = 4;

/// A collateral reservation as announced by `CollateralReserved`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Reservation {
    pub id: U256,
    pub agent_vault: Address,
    pub payment_address: String,
    pub payment_reference: B256,
    pub value_uba: U256,
    pub fee_uba: U256,
    pub last_underlying_timestamp: U256,
}

impl Reservation {
    pub fn from_logs(logs: &[Log], asset_manager: Address) -> Result<Self> {
        logs.iter()
            .filter(|log| log.address() == asset_manager)
            .find_map(|log| log.log_decode::<Contract::CollateralReserved>().ok())
            .map(|log| Self::from(log.inner.data))
            .context("reservation receipt carries no CollateralReserved event")
    }

    /// XRP the agent expects: the minted value plus its fee, in drops.
    pub fn payment_drops(&self) -> Result<u64> {
        self.value_uba
            .checked_add(self.fee_uba)
            .and_then(|total| u64::try_from(total).ok())
            .context("reservation payment does not fit in an XRP amount")
    }

    /// Latest time the payment is accepted, RFC 3339 when representable.
    pub fn deadline(&self) -> String {
        u64::try_from(self.last_underlying_timestamp)
            .ok()
            .and_then(|seconds| i64::try_from(seconds).ok())
            .and_then(|seconds| OffsetDateTime::from_unix_timestamp(seconds).ok())
            .and_then(|moment| moment.format(&Rfc3339).ok())
            .unwrap_or_else(|| self.last_underlying_timestamp.to_string())
    }
}

impl From<Contract::CollateralReserved> for Reservation {
    fn from(event: Contract::CollateralReserved) -> Self {
        Self {
            id: event.collateralReservationId,
            agent_vault: event.agentVault,
            payment_address: event.paymentAddress,
            payment_reference: event.paymentReference,
            value_uba: event.valueUBA,
            fee_uba: event.feeUBA,
            last_underlying_timestamp: event.lastUnderlyingTimestamp,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Minted { increase: U256, balance: U256 },
    /// The payment went out but no FXRP arrived within the poll window.
    Pending,
}

/// Agent for the mint: the requested one if it can take the lots, otherwise
/// the first suitable agent.
pub fn select_agent(
    agents: &[Agent],
    requested: Option<Address>,
    lots: u64,
    max_fee_bips: u32,
) -> Result<Agent> {
    let Some(vault) = requested else {
        return pick_agent(agents, lots, max_fee_bips).cloned().with_context(|| {
            format!("no agent with {lots} free lots and a fee of at most {max_fee_bips} bips")
        });
    };
    let agent = agents
        .iter()
        .find(|agent| agent.vault == vault)
        .with_context(|| format!("agent {vault} is not available for minting"))?;
    anyhow::ensure!(
        agent.can_mint(lots),
        "agent {vault} has {} free lots, {lots} requested",
        agent.free_lots
    );
    anyhow::ensure!(
        agent.fee_bips <= U256::from(max_fee_bips),
        "agent {vault} charges {} bips, above the maximum of {max_fee_bips}",
        agent.fee_bips
    );
    Ok(agent.clone())
}

/// Makes sure the XRPL account is activated and can pay `drops` without
/// touching its reserve.
pub async fn check_xrpl_funds(
    ledger: &dyn Ledger,
    account: &ClassicAddress,
    drops: u64,
) -> Result<AccountInfo> {
    let info = match ledger.account_info(account).await {
        Ok(info) => info,
        Err(LedgerError::AccountNotFound(_)) => anyhow::bail!(
            "XRPL account {account} is not activated, fund it with at least 1 XRP for the reserve \
             plus {} XRP for the payment",
            format_xrp(drops)
        ),
        Err(err) => return Err(err.into()),
    };
    anyhow::ensure!(
        info.available_drops() >= drops,
        "insufficient XRP: need {} XRP, have {} XRP available after the 1 XRP reserve",
        format_xrp(drops),
        format_xrp(info.available_drops())
    );
    Ok(info)
}

/// Polls the balance until it rises above `start` or the attempts run out.
/// Failed reads count as attempts without an increase.
pub async fn wait_for_mint(
    balances: &dyn Balances,
    owner: Address,
    start: U256,
    poll: Poll,
) -> Outcome {
    for attempt in 1..=poll.attempts {
        tokio::time::sleep(poll.interval).await;
        match balances.balance_of(owner).await {
            Ok(balance) if balance > start => {
                return Outcome::Minted {
                    increase: balance - start,
                    balance,
                };
            }
            Ok(_) => (),
            Err(err) => tracing::debug!(?err, attempt, "failed to poll the FXRP balance"),
        }
        if attempt % PROGRESS_EVERY == 0 {
            println!(
                "  Still waiting... ({}s elapsed)",
                u64::from(attempt) * poll.interval.as_secs()
            );
        }
    }
    Outcome::Pending
}

pub async fn mint(session: &Session, args: &Mint) -> Result<()> {
    let network = &session.network;
    let fasset = network.fasset()?.clone();
    let requested = Requested::parse(&args.size, fasset.decimals)?;
    let wallet = args.xrpl.wallet().await?;
    let ledger = args.xrpl.client();
    let signer = session.signer().await?;
    let manager_address = network.fassets.asset_manager;
    let manager = Onchain::new(manager_address, signer.provider.clone());
    let balances = TokenBalances::new(fasset.address, signer.provider.clone());

    let lot_size = manager.lot_size().await?;
    let lots = requested.lots(lot_size, fasset.decimals)?;
    let value_uba = lot_size * U256::from(lots);
    println!("FAssets minting");
    println!("  Flare wallet:  {}", signer.address);
    println!("  XRPL wallet:   {}", wallet.address());
    println!(
        "  Lots:          {lots} ({} {fasset})",
        format_amount(value_uba, fasset.decimals)
    );

    let agents = manager.available_agents().await?;
    let agent = select_agent(&agents, args.agent, lots, args.max_fee)?;
    println!("  Agent:         {} (fee {} bips)", agent.vault, agent.fee_bips);

    // Catch an unfunded XRPL account before paying the reservation fee.
    let estimate = value_uba + value_uba * agent.fee_bips / U256::from(10_000);
    let estimate = u64::try_from(estimate).context("mint too large for an XRP payment")?;
    check_xrpl_funds(&ledger, &wallet.address(), estimate).await?;

    let reservation_fee = manager.reservation_fee(lots).await?;
    println!(
        "  Reservation:   {} {}",
        format_amount(reservation_fee, 18),
        network.native_symbol
    );

    println!("Step 1: reserving collateral");
    let contract = Contract::Instance::new(manager_address, signer.provider.clone());
    let call = contract
        .reserveCollateral(
            agent.vault,
            U256::from(lots),
            U256::from(args.max_fee),
            Address::ZERO,
        )
        .value(reservation_fee);
    let receipt = tx::send(call, "reserve collateral").await?;
    let reserved = tx::Confirmation::from(&receipt);
    println!("  Reserved: {reserved}");
    let reservation = Reservation::from_logs(receipt.inner.logs(), manager_address)?;
    let drops = reservation.payment_drops()?;
    println!("  Reservation id: {}", reservation.id);
    println!(
        "  Send {} XRP to {}",
        format_xrp(drops),
        reservation.payment_address
    );
    println!("  Payment reference: {}", reservation.payment_reference);
    println!("  Deadline: {}", reservation.deadline());

    let destination: ClassicAddress = reservation
        .payment_address
        .parse()
        .context("the agent's payment address is not a valid XRPL address")?;
    check_xrpl_funds(&ledger, &wallet.address(), drops).await?;
    let start_balance = balances.balance_of(signer.address).await?;

    println!("Step 2: sending the XRP payment");
    let request = PaymentRequest {
        destination,
        amount_drops: drops,
        destination_tag: None,
        memos: vec![Memo::text(reservation.payment_reference.to_vec())],
    };
    let payment = wallet.send_payment(&ledger, request).await?;
    println!("  XRPL tx: {}", payment.hash);
    println!("  Result:  {}", payment.result);
    anyhow::ensure!(
        payment.is_success(),
        "XRPL payment {} failed with {}",
        payment.hash,
        payment.result
    );
    match ledger.account_info(&wallet.address()).await {
        Ok(info) => println!("  Remaining XRP: {}", format_xrp(info.balance_drops)),
        Err(err) => tracing::debug!(?err, "failed to read the remaining XRP balance"),
    }

    println!("Step 3: waiting for the agent to prove the payment and mint");
    println!("  This usually takes 5 to 20 minutes.");
    let outcome = wait_for_mint(&balances, signer.address, start_balance, MINT_POLL).await;
    match outcome {
        Outcome::Minted { increase, balance } => {
            println!(
                "  Minted {} {fasset}, balance now {}",
                format_amount(increase, fasset.decimals),
                format_amount(balance, fasset.decimals)
            );
        }
        Outcome::Pending => {
            println!("  Not minted yet. The XRP payment succeeded, the FXRP arrives once the");
            println!("  payment proof is submitted. Check later with:");
            println!("    fassets info --address {}", signer.address);
        }
    }

    println!("Summary");
    println!("  Reservation: #{}", reservation.id);
    println!(
        "  XRP sent:    {} to {}",
        format_xrp(drops),
        reservation.payment_address
    );
    println!("  XRPL tx:     {}", payment.hash);
    println!("  Flare tx:    {}", reserved.hash);
    println!(
        "  Minted:      {}",
        match outcome {
            Outcome::Minted { .. } => "yes",
            Outcome::Pending => "pending",
        }
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::asset_manager::MockBalances,
        alloy::{primitives::address, sol_types::SolEvent},
        std::sync::{
            Arc,
            atomic::{AtomicU32, Ordering},
        },
        xrpl::client::MockLedger,
    };

    const MANAGER: Address = address!("2a3Fe068cD92178554cabcf7c95ADf49B4B0B6A8");
    const OWNER: Address = address!("00000000000000000000000000000000000000bb");

    fn reserved() -> Contract::CollateralReserved {
        Contract::CollateralReserved {
            agentVault: address!("00000000000000000000000000000000000000a1"),
            minter: OWNER,
            collateralReservationId: U256::from(8_812),
            valueUBA: U256::from(10_000_000),
            feeUBA: U256::from(50_000),
            firstUnderlyingBlock: U256::from(1),
            lastUnderlyingBlock: U256::from(2),
            lastUnderlyingTimestamp: U256::from(1_700_000_000),
            paymentAddress: "rHb9CJAWyB4rj91VRWn96DkukG4bwdtyTh".to_string(),
            paymentReference: B256::repeat_byte(0x46),
            executor: Address::ZERO,
            executorFeeNatWei: U256::ZERO,
        }
    }

    fn log<E: SolEvent>(emitter: Address, event: &E) -> Log {
        Log {
            inner: alloy::primitives::Log {
                address: emitter,
                data: event.encode_log_data(),
            },
            ..Default::default()
        }
    }

    #[test]
    fn decodes_reservation_from_receipt_logs() {
        let logs = [
            log(address!("00000000000000000000000000000000000000dd"), &reserved()),
            log(MANAGER, &reserved()),
        ];
        let reservation = Reservation::from_logs(&logs, MANAGER).unwrap();
        assert_eq!(reservation.id, U256::from(8_812));
        assert_eq!(reservation.payment_address, "rHb9CJAWyB4rj91VRWn96DkukG4bwdtyTh");
        assert_eq!(reservation.payment_drops().unwrap(), 10_050_000);
        assert_eq!(format_xrp(reservation.payment_drops().unwrap()), "10.05");
        assert_eq!(reservation.deadline(), "2023-11-14T22:13:20Z");

        assert!(Reservation::from_logs(&logs[..1], MANAGER).is_err());
    }

    #[test]
    fn explicit_agent_must_have_capacity() {
        let agents = [Agent {
            vault: address!("00000000000000000000000000000000000000a1"),
            fee_bips: U256::from(25),
            free_lots: U256::from(3),
        }];
        let vault = agents[0].vault;
        assert_eq!(select_agent(&agents, Some(vault), 3, 2500).unwrap(), agents[0]);
        assert!(select_agent(&agents, Some(vault), 4, 2500).is_err());
        assert!(select_agent(&agents, Some(vault), 1, 10).is_err());
        assert!(select_agent(&agents, Some(OWNER), 1, 2500).is_err());
        assert_eq!(select_agent(&agents, None, 2, 2500).unwrap().vault, vault);
    }

    fn account(balance_drops: u64) -> AccountInfo {
        AccountInfo {
            account: ClassicAddress::from_account_id([1; 20]),
            balance_drops,
            sequence: 5,
        }
    }

    #[tokio::test]
    async fn xrpl_funds_respect_the_reserve() {
        let address = ClassicAddress::from_account_id([1; 20]);
        let mut ledger = MockLedger::new();
        ledger
            .expect_account_info()
            .returning(|_| Ok(account(11_000_000)));
        assert!(check_xrpl_funds(&ledger, &address, 10_000_000).await.is_ok());
        let err = check_xrpl_funds(&ledger, &address, 10_050_000)
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "insufficient XRP: need 10.05 XRP, have 10.0 XRP available after the 1 XRP reserve"
        );
    }

    #[tokio::test]
    async fn unactivated_xrpl_account_is_reported() {
        let address = ClassicAddress::from_account_id([1; 20]);
        let mut ledger = MockLedger::new();
        ledger
            .expect_account_info()
            .returning(|account| Err(LedgerError::AccountNotFound(account.to_string())));
        let err = check_xrpl_funds(&ledger, &address, 10_050_000)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("is not activated"));
        assert!(err.to_string().contains("10.05 XRP for the payment"));
    }

    #[tokio::test(start_paused = true)]
    async fn stops_polling_on_first_increase() {
        let calls = Arc::new(AtomicU32::new(0));
        let mut balances = MockBalances::new();
        balances.expect_balance_of().returning({
            let calls = calls.clone();
            move |_| {
                let call = calls.fetch_add(1, Ordering::SeqCst) + 1;
                match call {
                    1 => Err(anyhow::anyhow!("node unavailable")),
                    2 | 3 => Ok(U256::from(5)),
                    _ => Ok(U256::from(10_000_005)),
                }
            }
        });

        let started = tokio::time::Instant::now();
        let outcome = wait_for_mint(&balances, OWNER, U256::from(5), MINT_POLL).await;
        assert_eq!(
            outcome,
            Outcome::Minted {
                increase: U256::from(10_000_000),
                balance: U256::from(10_000_005),
            }
        );
        assert_eq!(calls.load(Ordering::SeqCst), 4);
        assert_eq!(started.elapsed(), Duration::from_secs(120));
    }

    #[tokio::test(start_paused = true)]
    async fn reports_pending_after_the_poll_window() {
        let mut balances = MockBalances::new();
        balances
            .expect_balance_of()
            .times(40)
            .returning(|_| Ok(U256::from(5)));

        let started = tokio::time::Instant::now();
        let outcome = wait_for_mint(&balances, OWNER, U256::from(5), MINT_POLL).await;
        assert_eq!(outcome, Outcome::Pending);
        assert_eq!(started.elapsed(), Duration::from_secs(20 * 60));
    }
}
