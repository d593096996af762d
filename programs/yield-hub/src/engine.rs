//! Vault core operations.
//!
//! Every operation runs against staged copies of the pool, strategy and
//! position and commits only when it succeeds, so an error leaves no partial
//! state behind. The pool's reentrancy flag is held for the duration, and the
//! order inside is always accrue -> settle -> mutate.

use anchor_lang::prelude::*;

use crate::{
    command::StrategyCommand,
    constants::MAX_STREAMS,
    errors::HubError,
    integrations::{Farm, Router},
    math::{add, sub},
    state::*,
};

/// The pool-side accounts every pool operation works on
pub struct PoolAccounts<'a> {
    pub hub: &'a HubConfig,
    pub pool: &'a mut PoolState,
    pub strategy: &'a mut StrategyState,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DepositReceipt {
    pub amount: u64,
    pub net_amount: u64,
    pub shares_minted: u64,
    pub settled: [u64; MAX_STREAMS],
    pub total_shares: u64,
    pub total_locked: u64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WithdrawReceipt {
    pub shares_burned: u64,
    pub outcome: WithdrawOutcome,
    pub settled: [u64; MAX_STREAMS],
    pub forfeited: [u64; MAX_STREAMS],
    pub total_shares: u64,
    pub total_locked: u64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EarnReceipt {
    pub outcome: EarnOutcome,
    /// Reward folded into the accumulators by this round
    pub distributed_now: [u64; MAX_STREAMS],
    pub total_locked: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExecuteReceipt {
    Deposit(DepositReceipt),
    Compound(EarnReceipt),
}

/// Read-side view of a pool
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct PoolInfo {
    pub pool_id: u32,
    pub want_mint: Pubkey,
    pub strategy: Pubkey,
    pub alloc_weights: [u64; MAX_STREAMS],
    pub total_shares: u64,
    pub total_locked: u64,
    pub acc_reward_per_share: [u128; MAX_STREAMS],
    pub last_accrual_slot: u64,
    pub paused: bool,
}

/// Read-side view of a position
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct UserInfo {
    pub shares: u64,
    pub principal: u64,
    pub reward_debt: [u128; MAX_STREAMS],
    pub claimable: [u64; MAX_STREAMS],
}

/// Want value of a position next to the principal that built it
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct StakedWant {
    pub total: u64,
    pub principal: u64,
}

/// Run `op` on a copy of the pool while holding its reentrancy flag
fn guarded<T>(pool: &mut PoolState, op: impl FnOnce(&mut PoolState) -> Result<T>) -> Result<T> {
    pool.enter()?;
    let mut next = pool.clone();

    match op(&mut next) {
        Ok(value) => {
            next.leave();
            *pool = next;
            Ok(value)
        }
        Err(err) => {
            pool.leave();
            Err(err)
        }
    }
}

/// Stage pool, strategy and position together and commit them atomically
fn staged<T>(
    pool: &mut PoolState,
    strategy: &mut StrategyState,
    position: &mut UserPosition,
    op: impl FnOnce(&mut PoolState, &mut StrategyState, &mut UserPosition) -> Result<T>,
) -> Result<T> {
    let mut next_strategy = strategy.clone();
    let mut next_position = position.clone();

    let value = guarded(pool, |pool| {
        let value = op(pool, &mut next_strategy, &mut next_position)?;
        pool.check_share_invariant(&next_strategy)?;
        Ok(value)
    })?;

    *strategy = next_strategy;
    *position = next_position;
    Ok(value)
}

/// Stake want on behalf of `position` and mint its shares
///
/// Shares are priced against the locked total before this deposit; any
/// rounding loss stays with existing holders.
fn credit_want<F: Farm>(
    pool: &mut PoolState,
    strategy: &mut StrategyState,
    position: &mut UserPosition,
    farm: &mut F,
    amount: u64,
    settled: [u64; MAX_STREAMS],
) -> Result<DepositReceipt> {
    pool.sync_locked(strategy);

    let net_amount = strategy.stake_want(farm, amount)?;
    let shares_minted = pool.shares_for_deposit(net_amount)?;
    require!(shares_minted > 0, HubError::InsufficientAmount);

    strategy.issue_shares(shares_minted)?;
    pool.total_shares = add(pool.total_shares, shares_minted)?;
    position.add_shares(shares_minted, net_amount)?;
    position.sync_debt(&pool.acc_reward_per_share)?;
    pool.sync_locked(strategy);

    Ok(DepositReceipt {
        amount,
        net_amount,
        shares_minted,
        settled,
        total_shares: pool.total_shares,
        total_locked: pool.total_locked,
    })
}

/// Burn `shares` of `position` and unstake their proportional want
fn release_shares<F: Farm>(
    pool: &mut PoolState,
    strategy: &mut StrategyState,
    position: &mut UserPosition,
    farm: &mut F,
    shares: u64,
) -> Result<(u64, WithdrawOutcome)> {
    pool.sync_locked(strategy);

    let amount = pool.want_for_shares(shares)?;
    require!(amount > 0, HubError::InsufficientAmount);

    let outcome = strategy.unstake_want(farm, amount)?;
    strategy.burn_shares(shares)?;
    pool.total_shares = sub(pool.total_shares, shares)?;
    position.remove_shares(shares)?;
    position.sync_debt(&pool.acc_reward_per_share)?;
    pool.sync_locked(strategy);

    Ok((shares, outcome))
}

fn settle_for_deposit(
    hub: &HubConfig,
    pool: &mut PoolState,
    strategy: &StrategyState,
    position: &mut UserPosition,
    slot: u64,
) -> Result<[u64; MAX_STREAMS]> {
    pool.require_accepting_deposits()?;
    strategy.require_active()?;
    pool.accrue(hub, slot)?;
    position.settle(&pool.acc_reward_per_share)
}

pub fn deposit<F: Farm>(
    accounts: PoolAccounts,
    position: &mut UserPosition,
    farm: &mut F,
    amount: u64,
    slot: u64,
) -> Result<DepositReceipt> {
    let hub = accounts.hub;
    staged(accounts.pool, accounts.strategy, position, |pool, strategy, position| {
        require!(amount > 0, HubError::InsufficientAmount);
        let settled = settle_for_deposit(hub, pool, strategy, position, slot)?;
        credit_want(pool, strategy, position, farm, amount, settled)
    })
}

pub fn withdraw<F: Farm>(
    accounts: PoolAccounts,
    position: &mut UserPosition,
    farm: &mut F,
    shares: u64,
    slot: u64,
) -> Result<WithdrawReceipt> {
    let hub = accounts.hub;
    staged(accounts.pool, accounts.strategy, position, |pool, strategy, position| {
        require!(
            shares > 0 && shares <= position.shares,
            HubError::InsufficientAmount
        );

        pool.accrue(hub, slot)?;
        let settled = position.settle(&pool.acc_reward_per_share)?;
        let (shares_burned, outcome) = release_shares(pool, strategy, position, farm, shares)?;

        Ok(WithdrawReceipt {
            shares_burned,
            outcome,
            settled,
            forfeited: [0; MAX_STREAMS],
            total_shares: pool.total_shares,
            total_locked: pool.total_locked,
        })
    })
}

/// Withdraw every share; settled reward stays claimable
pub fn withdraw_all<F: Farm>(
    accounts: PoolAccounts,
    position: &mut UserPosition,
    farm: &mut F,
    slot: u64,
) -> Result<WithdrawReceipt> {
    let shares = position.shares;
    let receipt = withdraw(accounts, position, farm, shares, slot)?;
    position.reward_debt = [0; MAX_STREAMS];
    Ok(receipt)
}

/// Withdraw every share and forfeit all unclaimed reward
///
/// Works on paused pools and strategies.
pub fn emergency_withdraw<F: Farm>(
    accounts: PoolAccounts,
    position: &mut UserPosition,
    farm: &mut F,
    slot: u64,
) -> Result<WithdrawReceipt> {
    let hub = accounts.hub;
    staged(accounts.pool, accounts.strategy, position, |pool, strategy, position| {
        let shares = position.shares;
        require!(shares > 0, HubError::InsufficientAmount);

        pool.accrue(hub, slot)?;
        let forfeited = position.forfeit(&pool.acc_reward_per_share)?;
        let (shares_burned, outcome) = release_shares(pool, strategy, position, farm, shares)?;

        Ok(WithdrawReceipt {
            shares_burned,
            outcome,
            settled: [0; MAX_STREAMS],
            forfeited,
            total_shares: pool.total_shares,
            total_locked: pool.total_locked,
        })
    })
}

fn claim_staged(
    hub: &HubConfig,
    pool: &mut PoolState,
    position: &mut UserPosition,
    slot: u64,
) -> Result<[u64; MAX_STREAMS]> {
    let mut next_position = position.clone();
    let claimed = guarded(pool, |pool| {
        pool.accrue(hub, slot)?;
        next_position.settle(&pool.acc_reward_per_share)?;
        Ok(next_position.take_claimable())
    })?;

    *position = next_position;
    Ok(claimed)
}

/// Settle and pay out everything owed to `position`
pub fn claim(
    hub: &HubConfig,
    pool: &mut PoolState,
    position: &mut UserPosition,
    slot: u64,
) -> Result<[u64; MAX_STREAMS]> {
    claim_staged(hub, pool, position, slot)
}

/// Claim across several pools; either every claim commits or none does
pub fn claim_all(
    hub: &HubConfig,
    entries: &mut [(&mut PoolState, &mut UserPosition)],
    slot: u64,
) -> Result<Vec<[u64; MAX_STREAMS]>> {
    let mut staged_entries = Vec::with_capacity(entries.len());
    for (pool, position) in entries.iter() {
        let mut next_pool = (**pool).clone();
        let mut next_position = (**position).clone();
        let claimed = claim_staged(hub, &mut next_pool, &mut next_position, slot)?;
        staged_entries.push((next_pool, next_position, claimed));
    }

    let mut claimed_all = Vec::with_capacity(entries.len());
    for ((pool, position), (next_pool, next_position, claimed)) in
        entries.iter_mut().zip(staged_entries)
    {
        **pool = next_pool;
        **position = next_position;
        claimed_all.push(claimed);
    }
    Ok(claimed_all)
}

/// Compound the pool's strategy; callable by anyone
pub fn earn<F: Farm, R: Router>(
    accounts: PoolAccounts,
    farm: &mut F,
    router: &mut R,
    min_want_out: u64,
    slot: u64,
) -> Result<EarnReceipt> {
    let hub = accounts.hub;
    let mut next_strategy = accounts.strategy.clone();

    let receipt = guarded(accounts.pool, |pool| {
        pool.accrue(hub, slot)?;
        pool.sync_locked(&next_strategy);

        let outcome = next_strategy.earn(farm, router, min_want_out, slot)?;
        pool.queue_distribution(&outcome.distributed)?;
        let distributed_now = pool.accrue(hub, slot)?;

        pool.sync_locked(&next_strategy);
        pool.check_share_invariant(&next_strategy)?;

        Ok(EarnReceipt {
            outcome,
            distributed_now,
            total_locked: pool.total_locked,
        })
    })?;

    *accounts.strategy = next_strategy;
    Ok(receipt)
}

/// Hub dispatcher: forward an encoded strategy command to the pool's strategy
pub fn execute<F: Farm, R: Router>(
    accounts: PoolAccounts,
    position: &mut UserPosition,
    farm: &mut F,
    router: &mut R,
    payload: &[u8],
    slot: u64,
) -> Result<(StrategyCommand, ExecuteReceipt)> {
    let command = admit(accounts.pool, accounts.strategy, payload)?;
    let receipt = dispatch(accounts, Some(position), farm, router, &command, slot)?;
    Ok((command, receipt))
}

/// Gate a dispatcher payload
///
/// The hub only checks that the pool has a strategy and is not paused; the
/// payload is decoded once and validated against the strategy family.
pub fn admit(
    pool: &PoolState,
    strategy: &StrategyState,
    payload: &[u8],
) -> Result<StrategyCommand> {
    require!(
        pool.strategy != Pubkey::default(),
        HubError::StrategyMismatch
    );
    pool.require_accepting_deposits()?;

    let command = StrategyCommand::decode(payload)?;
    command.validate_for(strategy.kind)?;
    Ok(command)
}

/// Run an admitted command against the pool's strategy
///
/// Depositing commands need the caller's position; `Compound` does not.
pub fn dispatch<F: Farm, R: Router>(
    accounts: PoolAccounts,
    position: Option<&mut UserPosition>,
    farm: &mut F,
    router: &mut R,
    command: &StrategyCommand,
    slot: u64,
) -> Result<ExecuteReceipt> {
    let missing_position = || error!(HubError::InvalidRemainingAccounts);
    let receipt = match command {
        StrategyCommand::DepositWant { amount } => {
            let position = position.ok_or_else(missing_position)?;
            ExecuteReceipt::Deposit(deposit(accounts, position, farm, *amount, slot)?)
        }
        StrategyCommand::AddLiquiditySplit { amounts } => {
            let position = position.ok_or_else(missing_position)?;
            let hub = accounts.hub;
            let receipt = staged(
                accounts.pool,
                accounts.strategy,
                position,
                |pool, strategy, position| {
                    let settled = settle_for_deposit(hub, pool, strategy, position, slot)?;
                    let liquidity = strategy.zap_in(router, amounts)?;
                    credit_want(pool, strategy, position, farm, liquidity, settled)
                },
            )?;
            ExecuteReceipt::Deposit(receipt)
        }
        StrategyCommand::Compound { min_want_out } => {
            ExecuteReceipt::Compound(earn(accounts, farm, router, *min_want_out, slot)?)
        }
    };
    Ok(receipt)
}

/// Reward owed to `position` as of `slot`, without mutating anything
pub fn pending(
    hub: &HubConfig,
    pool: &PoolState,
    position: &UserPosition,
    slot: u64,
) -> Result<[u64; MAX_STREAMS]> {
    let mut preview = pool.clone();
    preview.accrue(hub, slot)?;
    position.pending(&preview.acc_reward_per_share)
}

pub fn staked_want_tokens(pool: &PoolState, position: &UserPosition) -> Result<StakedWant> {
    Ok(StakedWant {
        total: pool.want_for_shares(position.shares)?,
        principal: position.principal,
    })
}

pub fn pool_info(pool: &PoolState) -> PoolInfo {
    PoolInfo {
        pool_id: pool.pool_id,
        want_mint: pool.want_mint,
        strategy: pool.strategy,
        alloc_weights: pool.alloc_weights,
        total_shares: pool.total_shares,
        total_locked: pool.total_locked,
        acc_reward_per_share: pool.acc_reward_per_share,
        last_accrual_slot: pool.last_accrual_slot,
        paused: pool.paused,
    }
}

pub fn user_info(position: &UserPosition) -> UserInfo {
    UserInfo {
        shares: position.shares,
        principal: position.principal,
        reward_debt: position.reward_debt,
        claimable: position.claimable,
    }
}

// ---------------------------------------------------------------------------
// Governance
// ---------------------------------------------------------------------------

/// Register a new pool and return it with its id assigned
pub fn add_pool(
    hub: &mut HubConfig,
    caller: &Pubkey,
    hub_key: Pubkey,
    want_mint: Pubkey,
    alloc_weights: [u64; MAX_STREAMS],
    slot: u64,
) -> Result<PoolState> {
    hub.require_authorized(ActionClass::Registry, caller)?;

    let mut next_hub = hub.clone();
    let pool_id = next_hub.next_pool_id()?;
    next_hub.apply_weight_change(&[0; MAX_STREAMS], &alloc_weights)?;

    *hub = next_hub;
    Ok(PoolState::new(hub_key, pool_id, want_mint, alloc_weights, slot))
}

/// Bring several pools up to `slot` before a global rate change
pub fn mass_accrue(hub: &HubConfig, pools: &mut [&mut PoolState], slot: u64) -> Result<()> {
    let mut staged_pools = Vec::with_capacity(pools.len());
    for pool in pools.iter() {
        let mut next = (**pool).clone();
        next.accrue(hub, slot)?;
        staged_pools.push(next);
    }
    for (pool, next) in pools.iter_mut().zip(staged_pools) {
        **pool = next;
    }
    Ok(())
}

/// Change a pool's weights, accruing at the old weights first
pub fn set_pool_weights(
    hub: &mut HubConfig,
    caller: &Pubkey,
    pool: &mut PoolState,
    alloc_weights: [u64; MAX_STREAMS],
    slot: u64,
) -> Result<()> {
    hub.require_authorized(ActionClass::Registry, caller)?;

    let mut next_hub = hub.clone();
    guarded(pool, |pool| {
        pool.accrue(&next_hub, slot)?;
        next_hub.apply_weight_change(&pool.alloc_weights, &alloc_weights)?;
        pool.alloc_weights = alloc_weights;
        Ok(())
    })?;

    *hub = next_hub;
    Ok(())
}

pub fn set_emission(
    hub: &mut HubConfig,
    caller: &Pubkey,
    reward_per_slot: [u64; MAX_STREAMS],
) -> Result<()> {
    hub.require_authorized(ActionClass::Registry, caller)?;
    hub.reward_per_slot = reward_per_slot;
    Ok(())
}

pub fn set_pool_paused(
    hub: &HubConfig,
    caller: &Pubkey,
    pool: &mut PoolState,
    paused: bool,
) -> Result<()> {
    hub.require_authorized(ActionClass::Pause, caller)?;
    pool.paused = paused;
    Ok(())
}

/// Attach a strategy to a pool; replacing one requires an empty pool
pub fn attach_strategy(
    hub: &HubConfig,
    caller: &Pubkey,
    pool: &mut PoolState,
    strategy_key: Pubkey,
    strategy: &StrategyState,
) -> Result<()> {
    hub.require_authorized(ActionClass::Registry, caller)?;
    require!(pool.total_shares == 0, HubError::PoolNotEmpty);
    require!(strategy.want_mint == pool.want_mint, HubError::InvalidMint);
    require!(
        strategy.earned_mint == hub.reward_mints[crate::constants::FARM_STREAM],
        HubError::InvalidMint
    );

    pool.strategy = strategy_key;
    pool.sync_locked(strategy);
    Ok(())
}

pub fn set_harvest_fees(
    hub: &HubConfig,
    caller: &Pubkey,
    strategy: &mut StrategyState,
    controller_fee_bps: u16,
    buyback_bps: u16,
) -> Result<()> {
    hub.require_authorized(ActionClass::Fees, caller)?;
    strategy.set_harvest_fees(controller_fee_bps, buyback_bps, hub.max_harvest_fee_bps)
}

pub fn set_withdraw_fee(
    hub: &HubConfig,
    caller: &Pubkey,
    strategy: &mut StrategyState,
    withdraw_fee_bps: u16,
) -> Result<()> {
    hub.require_authorized(ActionClass::Fees, caller)?;
    strategy.set_withdraw_fee(withdraw_fee_bps, hub.max_withdraw_fee_bps)
}

pub fn set_reinvest_rate(
    hub: &HubConfig,
    caller: &Pubkey,
    strategy: &mut StrategyState,
    reinvest_bps: u16,
) -> Result<()> {
    hub.require_authorized(ActionClass::Fees, caller)?;
    strategy.set_reinvest_rate(reinvest_bps)
}

pub fn set_funds_account(
    hub: &HubConfig,
    caller: &Pubkey,
    strategy: &mut StrategyState,
    funds_account: Pubkey,
    custodian_account: Pubkey,
) -> Result<()> {
    hub.require_authorized(ActionClass::Fees, caller)?;
    require!(
        funds_account != Pubkey::default() && custodian_account != Pubkey::default(),
        HubError::InvalidParameter
    );
    strategy.funds_account = funds_account;
    strategy.custodian_account = custodian_account;
    Ok(())
}

pub fn set_strategy_paused(
    hub: &HubConfig,
    caller: &Pubkey,
    strategy: &mut StrategyState,
    paused: bool,
) -> Result<()> {
    hub.require_authorized(ActionClass::Pause, caller)?;
    if paused {
        strategy.pause()
    } else {
        strategy.unpause()
    }
}
