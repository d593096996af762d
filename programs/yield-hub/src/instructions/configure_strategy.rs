use anchor_lang::prelude::*;

use crate::{constants::*, engine, errors::HubError, events::*, state::*};

/// Strategy-level governance: fee rates, fee recipients and pause
#[derive(Accounts)]
pub struct ConfigureStrategy<'info> {
    /// Security: checked against the hub's principal for the action
    pub authority: Signer<'info>,

    #[account(
        seeds = [HUB_SEED],
        bump = hub.bump,
    )]
    pub hub: Account<'info, HubConfig>,

    #[account(
        seeds = [POOL_SEED, hub.key().as_ref(), &pool.pool_id.to_le_bytes()],
        bump = pool.bump,
        has_one = hub @ HubError::PoolMismatch,
        has_one = strategy @ HubError::StrategyMismatch,
    )]
    pub pool: Account<'info, PoolState>,

    #[account(
        mut,
        seeds = [STRATEGY_SEED, pool.key().as_ref()],
        bump = strategy.bump,
    )]
    pub strategy: Account<'info, StrategyState>,
}

fn emit_fees(strategy: &Account<StrategyState>) -> Result<()> {
    emit!(StrategyFeesUpdated {
        strategy: strategy.key(),
        controller_fee_bps: strategy.controller_fee_bps,
        buyback_bps: strategy.buyback_bps,
        withdraw_fee_bps: strategy.withdraw_fee_bps,
        reinvest_bps: strategy.reinvest_bps,
        funds_account: strategy.funds_account,
        custodian_account: strategy.custodian_account,
        timestamp: Clock::get()?.unix_timestamp,
    });
    Ok(())
}

pub fn set_harvest_fees(
    ctx: Context<ConfigureStrategy>,
    controller_fee_bps: u16,
    buyback_bps: u16,
) -> Result<()> {
    let strategy = &mut ctx.accounts.strategy;
    engine::set_harvest_fees(
        &ctx.accounts.hub,
        &ctx.accounts.authority.key(),
        strategy,
        controller_fee_bps,
        buyback_bps,
    )?;
    emit_fees(strategy)
}

pub fn set_withdraw_fee(ctx: Context<ConfigureStrategy>, withdraw_fee_bps: u16) -> Result<()> {
    let strategy = &mut ctx.accounts.strategy;
    engine::set_withdraw_fee(
        &ctx.accounts.hub,
        &ctx.accounts.authority.key(),
        strategy,
        withdraw_fee_bps,
    )?;
    emit_fees(strategy)
}

pub fn set_reinvest_rate(ctx: Context<ConfigureStrategy>, reinvest_bps: u16) -> Result<()> {
    let strategy = &mut ctx.accounts.strategy;
    engine::set_reinvest_rate(
        &ctx.accounts.hub,
        &ctx.accounts.authority.key(),
        strategy,
        reinvest_bps,
    )?;
    emit_fees(strategy)
}

pub fn set_funds_account(
    ctx: Context<ConfigureStrategy>,
    funds_account: Pubkey,
    custodian_account: Pubkey,
) -> Result<()> {
    let strategy = &mut ctx.accounts.strategy;
    engine::set_funds_account(
        &ctx.accounts.hub,
        &ctx.accounts.authority.key(),
        strategy,
        funds_account,
        custodian_account,
    )?;
    emit_fees(strategy)
}

pub fn set_strategy_paused(ctx: Context<ConfigureStrategy>, paused: bool) -> Result<()> {
    let strategy = &mut ctx.accounts.strategy;
    engine::set_strategy_paused(
        &ctx.accounts.hub,
        &ctx.accounts.authority.key(),
        strategy,
        paused,
    )?;

    emit!(StrategyPausedChanged {
        strategy: strategy.key(),
        paused,
        timestamp: Clock::get()?.unix_timestamp,
    });

    Ok(())
}
