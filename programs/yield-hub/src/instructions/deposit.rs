use anchor_lang::prelude::*;
use anchor_spl::token::{self, Token, TokenAccount, Transfer};

use crate::{
    constants::*,
    engine::{self, PoolAccounts},
    errors::HubError,
    events::*,
    instructions::common::*,
    integrations::{cpi::CpiTarget, CpiFarm},
    state::*,
};

/// Deposit want into a pool and receive shares
///
/// Security checklist:
/// ✅ 1. SIGNER VALIDATION: Owner must be signer
/// ✅ 2. ACCOUNT OWNERSHIP: Hub, pool, strategy and position PDAs validated with seeds
/// ✅ 6. MATH SAFETY: Checked share math in the engine
/// ✅ 7. TOKEN ACCOUNT VALIDATION: Validates mint and owner
/// ✅ 8. BUSINESS LOGIC: Rewards settled before the share change, pool locked across CPIs
/// ✅ 10. EVENTS: Emits Deposited event
#[derive(Accounts)]
pub struct Deposit<'info> {
    /// Position owner
    /// Security: Must be signer
    #[account(mut)]
    pub owner: Signer<'info>,

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
        has_one = strategy @ HubError::StrategyMismatch,
    )]
    pub pool: Account<'info, PoolState>,

    #[account(
        mut,
        seeds = [STRATEGY_SEED, pool.key().as_ref()],
        bump = strategy.bump,
    )]
    pub strategy: Account<'info, StrategyState>,

    /// CHECK: PDA used as token and CPI authority, validated by seeds
    #[account(
        seeds = [STRATEGY_AUTHORITY_SEED, strategy.key().as_ref()],
        bump = strategy.authority_bump,
    )]
    pub strategy_authority: UncheckedAccount<'info>,

    /// Position PDA, created on first deposit
    #[account(
        init_if_needed,
        payer = owner,
        space = 8 + UserPosition::INIT_SPACE,
        seeds = [POSITION_SEED, pool.key().as_ref(), owner.key().as_ref()],
        bump
    )]
    pub position: Account<'info, UserPosition>,

    /// Owner's want account (source)
    #[account(
        mut,
        constraint = owner_want_account.mint == pool.want_mint @ HubError::InvalidMint,
        constraint = owner_want_account.owner == owner.key() @ HubError::InvalidOwner,
    )]
    pub owner_want_account: Account<'info, TokenAccount>,

    /// Strategy want buffer, staked from by the farm
    #[account(
        mut,
        constraint = want_vault.mint == pool.want_mint @ HubError::InvalidMint,
        constraint = want_vault.owner == strategy_authority.key() @ HubError::InvalidOwner,
    )]
    pub want_vault: Account<'info, TokenAccount>,

    /// CHECK: must be the strategy's farm program
    #[account(address = strategy.farm_program @ HubError::ExternalCallFailed)]
    pub farm_program: UncheckedAccount<'info>,

    pub token_program: Program<'info, Token>,
    pub system_program: Program<'info, System>,
}

/// Fill in a freshly created position
pub fn open_position(
    position: &mut Account<UserPosition>,
    pool: Pubkey,
    owner: Pubkey,
    bump: u8,
) {
    if position.owner == Pubkey::default() {
        let mut fresh = UserPosition::new(pool, owner);
        fresh.bump = bump;
        position.set_inner(fresh);
    }
}

pub fn handler<'info>(
    mut ctx: Context<'_, '_, 'info, 'info, Deposit<'info>>,
    amount: u64,
) -> Result<()> {
    // CHECKS: Validate amount
    require!(amount > 0, HubError::InsufficientAmount);

    let pool_key = ctx.accounts.pool.key();
    let owner_key = ctx.accounts.owner.key();
    open_position(
        &mut ctx.accounts.position,
        pool_key,
        owner_key,
        ctx.bumps.position,
    );
    hold_lock(&ctx.accounts.pool)?;

    // INTERACTIONS: want moves into the strategy buffer before it is staked
    let transfer_ctx = CpiContext::new(
        ctx.accounts.token_program.to_account_info(),
        Transfer {
            from: ctx.accounts.owner_want_account.to_account_info(),
            to: ctx.accounts.want_vault.to_account_info(),
            authority: ctx.accounts.owner.to_account_info(),
        },
    );
    token::transfer(transfer_ctx, amount)?;

    let strategy_key = ctx.accounts.strategy.key();
    let authority_seeds: &[&[u8]] = &[
        STRATEGY_AUTHORITY_SEED,
        strategy_key.as_ref(),
        &[ctx.accounts.strategy.authority_bump],
    ];
    let farm_program = ctx.accounts.farm_program.to_account_info();
    let strategy_authority = ctx.accounts.strategy_authority.to_account_info();
    let want_vault = ctx.accounts.want_vault.to_account_info();
    let mut farm = CpiFarm::new(
        CpiTarget::new(
            &farm_program,
            &ctx.accounts.strategy.farm_program,
            ctx.remaining_accounts,
            &strategy_authority,
            authority_seeds,
        )?,
        &want_vault,
        [None; MAX_STREAMS],
    );

    // EFFECTS: accrue, settle, stake and mint through the engine
    let slot = Clock::get()?.slot;
    let accounts = &mut ctx.accounts;
    let receipt = engine::deposit(
        PoolAccounts {
            hub: &accounts.hub,
            pool: &mut accounts.pool,
            strategy: &mut accounts.strategy,
        },
        &mut accounts.position,
        &mut farm,
        amount,
        slot,
    )?;

    emit!(Deposited {
        pool: pool_key,
        owner: owner_key,
        amount,
        net_amount: receipt.net_amount,
        shares_minted: receipt.shares_minted,
        total_shares: receipt.total_shares,
        total_locked: receipt.total_locked,
        timestamp: Clock::get()?.unix_timestamp,
    });

    Ok(())
}
