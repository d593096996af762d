// Yield Hub - auto-compounding yield vaults on Solana
// Pools hold shares of want staked at external farms; a per-pool strategy
// harvests and compounds, and up to three reward streams are distributed
// through per-share accumulators.

use anchor_lang::prelude::*;

pub mod command;
pub mod constants;
pub mod engine;
pub mod errors;
pub mod events;
pub mod instructions;
pub mod integrations;
pub mod math;
pub mod state;

use constants::MAX_STREAMS;
use engine::{PoolInfo, StakedWant, UserInfo};
use instructions::*;
use state::StrategyParams;

declare_id!("6XYAndq4ExpPazTFhPLcXQntxfeajsQrDVzFGnnFPPrL");

#[program]
pub mod yield_hub {
    use super::*;

    /// Initialize the hub, its governance principals and reward streams
    ///
    /// Security considerations:
    /// - Fee ceilings validated before they are stored
    /// - Hub and hub authority PDAs derived from fixed seeds
    pub fn initialize_hub(ctx: Context<InitializeHub>, args: InitializeHubArgs) -> Result<()> {
        instructions::initialize_hub::handler(ctx, args)
    }

    /// Rotate the admin, fee governor and guardian (admin only)
    pub fn set_governance(
        ctx: Context<ConfigureHub>,
        admin: Pubkey,
        fee_governor: Pubkey,
        guardian: Pubkey,
    ) -> Result<()> {
        instructions::configure_hub::set_governance(ctx, admin, fee_governor, guardian)
    }

    /// Change the per-slot emission of every stream (admin only)
    pub fn set_emission<'info>(
        ctx: Context<'_, '_, 'info, 'info, ConfigureHub<'info>>,
        reward_per_slot: [u64; MAX_STREAMS],
    ) -> Result<()> {
        instructions::configure_hub::set_emission(ctx, reward_per_slot)
    }

    /// Register a new pool (admin only)
    pub fn add_pool(ctx: Context<AddPool>, alloc_weights: [u64; MAX_STREAMS]) -> Result<()> {
        instructions::add_pool::handler(ctx, alloc_weights)
    }

    /// Change a pool's allocation weights, accruing first (admin only)
    pub fn set_pool_weights<'info>(
        ctx: Context<'_, '_, 'info, 'info, ConfigurePool<'info>>,
        alloc_weights: [u64; MAX_STREAMS],
    ) -> Result<()> {
        instructions::configure_pool::set_pool_weights(ctx, alloc_weights)
    }

    /// Pause or resume deposits and commands on a pool (guardian only)
    pub fn set_pool_paused(ctx: Context<ConfigurePool>, paused: bool) -> Result<()> {
        instructions::configure_pool::set_pool_paused(ctx, paused)
    }

    /// Attach a strategy to a pool, or replace it while the pool is empty
    ///
    /// Security considerations:
    /// - Admin only
    /// - Want mint must match the pool, earned mint the farm stream
    pub fn register_strategy(ctx: Context<RegisterStrategy>, params: StrategyParams) -> Result<()> {
        instructions::register_strategy::handler(ctx, params)
    }

    /// Set the controller and buyback cuts of a strategy (fee governor only)
    pub fn set_harvest_fees(
        ctx: Context<ConfigureStrategy>,
        controller_fee_bps: u16,
        buyback_bps: u16,
    ) -> Result<()> {
        instructions::configure_strategy::set_harvest_fees(ctx, controller_fee_bps, buyback_bps)
    }

    /// Set the withdrawal fee of a strategy (fee governor only)
    pub fn set_withdraw_fee(ctx: Context<ConfigureStrategy>, withdraw_fee_bps: u16) -> Result<()> {
        instructions::configure_strategy::set_withdraw_fee(ctx, withdraw_fee_bps)
    }

    /// Set the compounded share of each harvest (fee governor only)
    pub fn set_reinvest_rate(ctx: Context<ConfigureStrategy>, reinvest_bps: u16) -> Result<()> {
        instructions::configure_strategy::set_reinvest_rate(ctx, reinvest_bps)
    }

    /// Set the fee and buyback recipients of a strategy (fee governor only)
    pub fn set_funds_account(
        ctx: Context<ConfigureStrategy>,
        funds_account: Pubkey,
        custodian_account: Pubkey,
    ) -> Result<()> {
        instructions::configure_strategy::set_funds_account(ctx, funds_account, custodian_account)
    }

    /// Stop deposits and compounding on a strategy (guardian only)
    pub fn pause_strategy(ctx: Context<ConfigureStrategy>) -> Result<()> {
        instructions::configure_strategy::set_strategy_paused(ctx, true)
    }

    pub fn unpause_strategy(ctx: Context<ConfigureStrategy>) -> Result<()> {
        instructions::configure_strategy::set_strategy_paused(ctx, false)
    }

    /// Top up the reward vault of a stream
    pub fn fund_stream(ctx: Context<FundStream>, stream: u8, amount: u64) -> Result<()> {
        instructions::fund_stream::handler(ctx, stream, amount)
    }

    /// Deposit want into a pool and receive shares
    ///
    /// Security considerations:
    /// - Validates owner token accounts (mint, owner)
    /// - Settles rewards before the share change
    /// - Pool locked across the farm CPI
    pub fn deposit<'info>(
        ctx: Context<'_, '_, 'info, 'info, Deposit<'info>>,
        amount: u64,
    ) -> Result<()> {
        instructions::deposit::handler(ctx, amount)
    }

    /// Redeem `shares`; settled rewards stay claimable
    pub fn withdraw<'info>(
        ctx: Context<'_, '_, 'info, 'info, Withdraw<'info>>,
        shares: u64,
    ) -> Result<()> {
        instructions::withdraw::withdraw(ctx, shares)
    }

    /// Redeem every share; settled rewards stay claimable
    pub fn withdraw_all<'info>(ctx: Context<'_, '_, 'info, 'info, Withdraw<'info>>) -> Result<()> {
        instructions::withdraw::withdraw_all(ctx)
    }

    /// Redeem every share and forfeit unclaimed rewards; works while paused
    pub fn emergency_withdraw<'info>(
        ctx: Context<'_, '_, 'info, 'info, Withdraw<'info>>,
    ) -> Result<()> {
        instructions::withdraw::emergency_withdraw(ctx)
    }

    /// Claim settled rewards from one pool
    pub fn claim<'info>(ctx: Context<'_, '_, 'info, 'info, Claim<'info>>) -> Result<()> {
        instructions::claim::claim(ctx)
    }

    /// Claim from several pools; all or nothing
    pub fn claim_all<'info>(
        ctx: Context<'_, '_, 'info, 'info, ClaimAll<'info>>,
        pool_count: u8,
    ) -> Result<()> {
        instructions::claim::claim_all(ctx, pool_count)
    }

    /// Harvest and compound a pool's strategy; callable by anyone
    pub fn earn<'info>(
        ctx: Context<'_, '_, 'info, 'info, Earn<'info>>,
        min_want_out: u64,
        farm_accounts: u8,
    ) -> Result<()> {
        instructions::earn::handler(ctx, min_want_out, farm_accounts)
    }

    /// Forward a Borsh-encoded strategy command to the pool's strategy
    ///
    /// Security considerations:
    /// - Rejected on paused pools
    /// - Payload decoded once and validated before any token moves
    pub fn execute<'info>(
        ctx: Context<'_, '_, 'info, 'info, Execute<'info>>,
        payload: Vec<u8>,
        farm_accounts: u8,
    ) -> Result<()> {
        instructions::execute::handler(ctx, payload, farm_accounts)
    }

    /// Reward owed to a position as of the current slot
    pub fn pending(ctx: Context<ViewPosition>) -> Result<[u64; MAX_STREAMS]> {
        instructions::views::pending(ctx)
    }

    pub fn pool_info(ctx: Context<ViewPool>) -> Result<PoolInfo> {
        instructions::views::pool_info(ctx)
    }

    pub fn user_info(ctx: Context<ViewPosition>) -> Result<UserInfo> {
        instructions::views::user_info(ctx)
    }

    /// Want value of a position next to its deposited principal
    pub fn staked_want_tokens(ctx: Context<ViewPosition>) -> Result<StakedWant> {
        instructions::views::staked_want_tokens(ctx)
    }
}
