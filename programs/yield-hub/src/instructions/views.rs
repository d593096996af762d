use anchor_lang::prelude::*;

use crate::{
    constants::*,
    engine::{self, PoolInfo, StakedWant, UserInfo},
    errors::HubError,
    state::*,
};

/// Read-only access to a pool
#[derive(Accounts)]
pub struct ViewPool<'info> {
    #[account(
        seeds = [HUB_SEED],
        bump = hub.bump,
    )]
    pub hub: Account<'info, HubConfig>,

    #[account(
        seeds = [POOL_SEED, hub.key().as_ref(), &pool.pool_id.to_le_bytes()],
        bump = pool.bump,
        has_one = hub @ HubError::PoolMismatch,
    )]
    pub pool: Account<'info, PoolState>,
}

/// Read-only access to a position
#[derive(Accounts)]
pub struct ViewPosition<'info> {
    #[account(
        seeds = [HUB_SEED],
        bump = hub.bump,
    )]
    pub hub: Account<'info, HubConfig>,

    #[account(
        seeds = [POOL_SEED, hub.key().as_ref(), &pool.pool_id.to_le_bytes()],
        bump = pool.bump,
        has_one = hub @ HubError::PoolMismatch,
    )]
    pub pool: Account<'info, PoolState>,

    #[account(
        seeds = [POSITION_SEED, pool.key().as_ref(), position.owner.as_ref()],
        bump = position.bump,
        has_one = pool @ HubError::PoolMismatch,
    )]
    pub position: Account<'info, UserPosition>,
}

pub fn pool_info(ctx: Context<ViewPool>) -> Result<PoolInfo> {
    Ok(engine::pool_info(&ctx.accounts.pool))
}

pub fn user_info(ctx: Context<ViewPosition>) -> Result<UserInfo> {
    Ok(engine::user_info(&ctx.accounts.position))
}

pub fn pending(ctx: Context<ViewPosition>) -> Result<[u64; MAX_STREAMS]> {
    let slot = Clock::get()?.slot;
    engine::pending(
        &ctx.accounts.hub,
        &ctx.accounts.pool,
        &ctx.accounts.position,
        slot,
    )
}

pub fn staked_want_tokens(ctx: Context<ViewPosition>) -> Result<StakedWant> {
    engine::staked_want_tokens(&ctx.accounts.pool, &ctx.accounts.position)
}
