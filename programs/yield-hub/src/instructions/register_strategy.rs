use anchor_lang::prelude::*;
use anchor_spl::{
    associated_token::AssociatedToken,
    token::{Mint, Token, TokenAccount},
};

use crate::{constants::*, engine, errors::HubError, events::*, state::*};

/// Attach (or replace) the strategy of a pool
///
/// Security checklist:
/// ✅ 1. SIGNER VALIDATION: admin must sign, checked against the hub
/// ✅ 2. ACCOUNT OWNERSHIP: pool and strategy PDAs validated with seeds
/// ✅ 7. TOKEN ACCOUNT VALIDATION: vaults are ATAs of the strategy authority
/// ✅ 8. BUSINESS LOGIC: replacing a strategy requires an empty pool
#[derive(Accounts)]
pub struct RegisterStrategy<'info> {
    #[account(mut)]
    pub admin: Signer<'info>,

    #[account(
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

    /// Strategy PDA, one per pool
    #[account(
        init_if_needed,
        payer = admin,
        space = 8 + StrategyState::INIT_SPACE,
        seeds = [STRATEGY_SEED, pool.key().as_ref()],
        bump
    )]
    pub strategy: Account<'info, StrategyState>,

    /// Strategy authority PDA - custodian of the strategy vaults
    /// CHECK: PDA used as token authority, validated by seeds
    #[account(
        seeds = [STRATEGY_AUTHORITY_SEED, strategy.key().as_ref()],
        bump
    )]
    pub strategy_authority: UncheckedAccount<'info>,

    #[account(address = pool.want_mint @ HubError::InvalidMint)]
    pub want_mint: Account<'info, Mint>,

    pub earned_mint: Account<'info, Mint>,

    /// Idle want buffer
    #[account(
        init_if_needed,
        payer = admin,
        associated_token::mint = want_mint,
        associated_token::authority = strategy_authority,
    )]
    pub want_vault: Account<'info, TokenAccount>,

    /// Harvested farm reward awaiting fees, conversion or distribution
    #[account(
        init_if_needed,
        payer = admin,
        associated_token::mint = earned_mint,
        associated_token::authority = strategy_authority,
    )]
    pub earned_vault: Account<'info, TokenAccount>,

    pub token_program: Program<'info, Token>,
    pub associated_token_program: Program<'info, AssociatedToken>,
    pub system_program: Program<'info, System>,
}

pub fn handler(ctx: Context<RegisterStrategy>, params: StrategyParams) -> Result<()> {
    let pool = &mut ctx.accounts.pool;
    let strategy = &mut ctx.accounts.strategy;

    // CHECKS
    require_keys_eq!(
        params.earned_mint,
        ctx.accounts.earned_mint.key(),
        HubError::InvalidMint
    );
    if params.kind.compounds() {
        require!(
            params.router_program != Pubkey::default(),
            HubError::InvalidParameter
        );
    }
    if params.kind == StrategyKind::PairedLiquidity {
        require!(
            params.base_mints.iter().all(|mint| *mint != Pubkey::default()),
            HubError::InvalidParameter
        );
    }
    require!(
        params.farm_program != Pubkey::default(),
        HubError::InvalidParameter
    );
    // an existing strategy may only be replaced once it holds nothing
    require!(strategy.want_locked_total == 0, HubError::PoolNotEmpty);

    // EFFECTS
    let mut state = StrategyState::new(
        ctx.accounts.hub.key(),
        pool.key(),
        pool.want_mint,
        &params,
    );
    state.bump = ctx.bumps.strategy;
    state.authority_bump = ctx.bumps.strategy_authority;

    engine::attach_strategy(
        &ctx.accounts.hub,
        &ctx.accounts.admin.key(),
        pool,
        strategy.key(),
        &state,
    )?;
    strategy.set_inner(state);

    emit!(StrategyRegistered {
        pool: pool.key(),
        strategy: strategy.key(),
        kind: strategy.kind as u8,
        want_mint: strategy.want_mint,
        earned_mint: strategy.earned_mint,
        timestamp: Clock::get()?.unix_timestamp,
    });

    Ok(())
}
