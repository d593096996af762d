use anchor_lang::prelude::*;

use crate::{constants::*, engine, errors::HubError, events::*, instructions::common::*, state::*};

/// Pool-level governance: weights and pause
#[derive(Accounts)]
pub struct ConfigurePool<'info> {
    /// Security: checked against the hub's principal for the action
    pub authority: Signer<'info>,

    #[account(
        mut,
        seeds = [HUB_SEED],
        bump = hub.bump,
    )]
    pub hub: Account<'info, HubConfig>,

    #[account(
        mut,
        seeds = [POOL_SEED, hub.key().as_ref(), &pool.pool_id.to_le_bytes()],
        bump = pool.bump,
        has_one = hub @ HubError::PoolMismatch,
    )]
    pub pool: Account<'info, PoolState>,
}

/// Change a pool's allocation weights
///
/// Other pools passed as remaining accounts are accrued at the old totals
/// first.
pub fn set_pool_weights<'info>(
    ctx: Context<'_, '_, 'info, 'info, ConfigurePool<'info>>,
    alloc_weights: [u64; MAX_STREAMS],
) -> Result<()> {
    let caller = ctx.accounts.authority.key();
    let hub = &mut ctx.accounts.hub;
    let pool = &mut ctx.accounts.pool;
    let slot = Clock::get()?.slot;

    hub.require_authorized(ActionClass::Registry, &caller)?;

    let mut others = load_pools(&hub.key(), ctx.remaining_accounts)?;
    require!(
        others.iter().all(|other| other.key() != pool.key()),
        HubError::InvalidRemainingAccounts
    );
    {
        let mut entries: Vec<&mut PoolState> = others.iter_mut().map(|other| &mut **other).collect();
        engine::mass_accrue(hub, &mut entries, slot)?;
    }
    persist(&others)?;

    engine::set_pool_weights(hub, &caller, pool, alloc_weights, slot)?;

    emit!(PoolWeightsUpdated {
        pool: pool.key(),
        alloc_weights,
        total_alloc_weight: hub.total_alloc_weight,
        timestamp: Clock::get()?.unix_timestamp,
    });

    Ok(())
}

pub fn set_pool_paused(ctx: Context<ConfigurePool>, paused: bool) -> Result<()> {
    let pool = &mut ctx.accounts.pool;
    engine::set_pool_paused(&ctx.accounts.hub, &ctx.accounts.authority.key(), pool, paused)?;

    emit!(PoolPausedChanged {
        pool: pool.key(),
        paused,
        timestamp: Clock::get()?.unix_timestamp,
    });

    Ok(())
}
