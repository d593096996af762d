use anchor_lang::prelude::*;
use anchor_spl::token::Mint;

use crate::{constants::*, engine, events::*, state::*};

/// Register a new pool for a want asset
#[derive(Accounts)]
pub struct AddPool<'info> {
    /// Security: must be the hub admin (checked in handler)
    #[account(mut)]
    pub admin: Signer<'info>,

    #[account(
        mut,
        seeds = [HUB_SEED],
        bump = hub.bump,
    )]
    pub hub: Account<'info, HubConfig>,

    /// Pool PDA, keyed by the next pool id
    #[account(
        init,
        payer = admin,
        space = 8 + PoolState::INIT_SPACE,
        seeds = [POOL_SEED, hub.key().as_ref(), &hub.pool_count.to_le_bytes()],
        bump
    )]
    pub pool: Account<'info, PoolState>,

    pub want_mint: Account<'info, Mint>,

    pub system_program: Program<'info, System>,
}

pub fn handler(ctx: Context<AddPool>, alloc_weights: [u64; MAX_STREAMS]) -> Result<()> {
    let hub = &mut ctx.accounts.hub;
    let hub_key = hub.key();
    let slot = Clock::get()?.slot;

    let mut state = engine::add_pool(
        hub,
        &ctx.accounts.admin.key(),
        hub_key,
        ctx.accounts.want_mint.key(),
        alloc_weights,
        slot,
    )?;
    state.bump = ctx.bumps.pool;

    let pool = &mut ctx.accounts.pool;
    pool.set_inner(state);

    emit!(PoolAdded {
        hub: hub_key,
        pool: pool.key(),
        pool_id: pool.pool_id,
        want_mint: pool.want_mint,
        alloc_weights,
        timestamp: Clock::get()?.unix_timestamp,
    });

    msg!("pool {} added", pool.pool_id);

    Ok(())
}
