use anchor_lang::prelude::*;
use anchor_spl::token::Token;

use crate::{
    constants::*, engine, errors::HubError, events::*, instructions::common::*, state::*,
};

/// Claim settled rewards from one pool
///
/// Remaining accounts: one `(reward vault, owner reward account)` pair per
/// configured stream, in stream order.
#[derive(Accounts)]
pub struct Claim<'info> {
    pub owner: Signer<'info>,

    #[account(
        seeds = [HUB_SEED],
        bump = hub.bump,
    )]
    pub hub: Account<'info, HubConfig>,

    /// CHECK: PDA used as token authority, validated by seeds
    #[account(
        seeds = [HUB_AUTHORITY_SEED, hub.key().as_ref()],
        bump = hub.authority_bump,
    )]
    pub hub_authority: UncheckedAccount<'info>,

    #[account(
        mut,
        seeds = [POOL_SEED, hub.key().as_ref(), &pool.pool_id.to_le_bytes()],
        bump = pool.bump,
        has_one = hub @ HubError::PoolMismatch,
    )]
    pub pool: Account<'info, PoolState>,

    #[account(
        mut,
        seeds = [POSITION_SEED, pool.key().as_ref(), owner.key().as_ref()],
        bump = position.bump,
        has_one = owner @ HubError::InvalidOwner,
        has_one = pool @ HubError::PoolMismatch,
    )]
    pub position: Account<'info, UserPosition>,

    pub token_program: Program<'info, Token>,
}

pub fn claim<'info>(mut ctx: Context<'_, '_, 'info, 'info, Claim<'info>>) -> Result<()> {
    let owner = ctx.accounts.owner.key();
    let slot = Clock::get()?.slot;

    // EFFECTS
    let accounts = &mut ctx.accounts;
    let amounts = engine::claim(&accounts.hub, &mut accounts.pool, &mut accounts.position, slot)?;

    // INTERACTIONS
    pay_rewards(
        &accounts.hub,
        &accounts.hub_authority.to_account_info(),
        &accounts.token_program.to_account_info(),
        ctx.remaining_accounts,
        &owner,
        &amounts,
    )?;

    emit!(RewardsClaimed {
        pool: accounts.pool.key(),
        owner,
        amounts,
        timestamp: Clock::get()?.unix_timestamp,
    });

    Ok(())
}

/// Claim from several pools at once
#[derive(Accounts)]
pub struct ClaimAll<'info> {
    pub owner: Signer<'info>,

    #[account(
        seeds = [HUB_SEED],
        bump = hub.bump,
    )]
    pub hub: Account<'info, HubConfig>,

    /// CHECK: PDA used as token authority, validated by seeds
    #[account(
        seeds = [HUB_AUTHORITY_SEED, hub.key().as_ref()],
        bump = hub.authority_bump,
    )]
    pub hub_authority: UncheckedAccount<'info>,

    pub token_program: Program<'info, Token>,
}

/// Remaining accounts: `pool_count` `(pool, position)` pairs, then the reward
/// account pairs as in `claim`. Either every pool pays out or none does.
pub fn claim_all<'info>(
    ctx: Context<'_, '_, 'info, 'info, ClaimAll<'info>>,
    pool_count: u8,
) -> Result<()> {
    let owner = ctx.accounts.owner.key();
    let hub_key = ctx.accounts.hub.key();
    let slot = Clock::get()?.slot;

    // CHECKS: split and load the (pool, position) pairs
    let entry_accounts = pool_count as usize * 2;
    require!(
        pool_count > 0 && entry_accounts <= ctx.remaining_accounts.len(),
        HubError::InvalidRemainingAccounts
    );
    let (entry_infos, reward_accounts) = ctx.remaining_accounts.split_at(entry_accounts);

    let mut pools: Vec<Account<'info, PoolState>> = Vec::with_capacity(pool_count as usize);
    let mut positions: Vec<Account<'info, UserPosition>> = Vec::with_capacity(pool_count as usize);
    for pair in entry_infos.chunks_exact(2) {
        let pool = load_pool(&hub_key, &pair[0])?;
        require!(
            pools.iter().all(|other| other.key() != pool.key()),
            HubError::InvalidRemainingAccounts
        );

        require!(pair[1].is_writable, HubError::InvalidRemainingAccounts);
        let position = Account::<UserPosition>::try_from(&pair[1])?;
        require_keys_eq!(position.pool, pool.key(), HubError::PoolMismatch);
        require_keys_eq!(position.owner, owner, HubError::InvalidOwner);

        pools.push(pool);
        positions.push(position);
    }

    // EFFECTS: all-or-nothing across the batch
    let claimed = {
        let mut entries: Vec<(&mut PoolState, &mut UserPosition)> = pools
            .iter_mut()
            .zip(positions.iter_mut())
            .map(|(pool, position)| (&mut **pool, &mut **position))
            .collect();
        engine::claim_all(&ctx.accounts.hub, &mut entries, slot)?
    };
    persist(&pools)?;
    persist(&positions)?;

    // INTERACTIONS: one transfer per stream for the whole batch
    let mut totals = [0u64; MAX_STREAMS];
    for amounts in &claimed {
        for stream in 0..MAX_STREAMS {
            totals[stream] = totals[stream]
                .checked_add(amounts[stream])
                .ok_or(error!(HubError::MathOverflow))?;
        }
    }
    pay_rewards(
        &ctx.accounts.hub,
        &ctx.accounts.hub_authority.to_account_info(),
        &ctx.accounts.token_program.to_account_info(),
        reward_accounts,
        &owner,
        &totals,
    )?;

    for (pool, amounts) in pools.iter().zip(claimed) {
        emit!(RewardsClaimed {
            pool: pool.key(),
            owner,
            amounts,
            timestamp: Clock::get()?.unix_timestamp,
        });
    }

    Ok(())
}
