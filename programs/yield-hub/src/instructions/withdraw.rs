use anchor_lang::prelude::*;
use anchor_spl::token::{Token, TokenAccount};

use crate::{
    constants::*,
    engine::{self, PoolAccounts, WithdrawReceipt},
    errors::HubError,
    events::*,
    instructions::common::*,
    integrations::{cpi::CpiTarget, CpiFarm},
    state::*,
};

/// Redeem shares for want
///
/// Shared by `withdraw`, `withdraw_all` and `emergency_withdraw`. None of
/// them is blocked by a paused pool or strategy.
#[derive(Accounts)]
pub struct Withdraw<'info> {
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

    #[account(
        mut,
        seeds = [POSITION_SEED, pool.key().as_ref(), owner.key().as_ref()],
        bump = position.bump,
        has_one = owner @ HubError::InvalidOwner,
        has_one = pool @ HubError::PoolMismatch,
    )]
    pub position: Account<'info, UserPosition>,

    /// Owner's want account (destination)
    #[account(
        mut,
        constraint = owner_want_account.mint == pool.want_mint @ HubError::InvalidMint,
        constraint = owner_want_account.owner == owner.key() @ HubError::InvalidOwner,
    )]
    pub owner_want_account: Account<'info, TokenAccount>,

    /// Strategy want buffer, unstaked into by the farm
    #[account(
        mut,
        constraint = want_vault.mint == pool.want_mint @ HubError::InvalidMint,
        constraint = want_vault.owner == strategy_authority.key() @ HubError::InvalidOwner,
    )]
    pub want_vault: Account<'info, TokenAccount>,

    /// Withdrawal fee destination
    #[account(
        mut,
        constraint = funds_want_account.mint == pool.want_mint @ HubError::InvalidMint,
        constraint = funds_want_account.owner == strategy.funds_account @ HubError::InvalidOwner,
    )]
    pub funds_want_account: Account<'info, TokenAccount>,

    /// CHECK: must be the strategy's farm program
    #[account(address = strategy.farm_program @ HubError::ExternalCallFailed)]
    pub farm_program: UncheckedAccount<'info>,

    pub token_program: Program<'info, Token>,
}

#[derive(Clone, Copy)]
enum Exit {
    Shares(u64),
    All,
    Emergency,
}

fn process<'info>(
    mut ctx: Context<'_, '_, 'info, 'info, Withdraw<'info>>,
    exit: Exit,
) -> Result<WithdrawReceipt> {
    hold_lock(&ctx.accounts.pool)?;

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

    // EFFECTS: accrue, settle, unstake and burn through the engine
    let slot = Clock::get()?.slot;
    let accounts = &mut ctx.accounts;
    let pool_accounts = PoolAccounts {
        hub: &accounts.hub,
        pool: &mut accounts.pool,
        strategy: &mut accounts.strategy,
    };
    let position = &mut accounts.position;
    let receipt = match exit {
        Exit::Shares(shares) => engine::withdraw(pool_accounts, position, &mut farm, shares, slot)?,
        Exit::All => engine::withdraw_all(pool_accounts, position, &mut farm, slot)?,
        Exit::Emergency => engine::emergency_withdraw(pool_accounts, position, &mut farm, slot)?,
    };

    // INTERACTIONS: pay out of the buffer the farm just refilled
    let token_program = accounts.token_program.to_account_info();
    transfer_signed(
        &token_program,
        &want_vault,
        &accounts.owner_want_account.to_account_info(),
        &strategy_authority,
        authority_seeds,
        receipt.outcome.payout,
    )?;
    transfer_signed(
        &token_program,
        &want_vault,
        &accounts.funds_want_account.to_account_info(),
        &strategy_authority,
        authority_seeds,
        receipt.outcome.fee,
    )?;

    Ok(receipt)
}

fn emit_withdrawn(pool: Pubkey, owner: Pubkey, receipt: &WithdrawReceipt) -> Result<()> {
    emit!(Withdrawn {
        pool,
        owner,
        shares_burned: receipt.shares_burned,
        payout: receipt.outcome.payout,
        fee: receipt.outcome.fee,
        total_shares: receipt.total_shares,
        total_locked: receipt.total_locked,
        timestamp: Clock::get()?.unix_timestamp,
    });
    Ok(())
}

pub fn withdraw<'info>(
    ctx: Context<'_, '_, 'info, 'info, Withdraw<'info>>,
    shares: u64,
) -> Result<()> {
    let (pool, owner) = (ctx.accounts.pool.key(), ctx.accounts.owner.key());
    let receipt = process(ctx, Exit::Shares(shares))?;
    emit_withdrawn(pool, owner, &receipt)
}

pub fn withdraw_all<'info>(ctx: Context<'_, '_, 'info, 'info, Withdraw<'info>>) -> Result<()> {
    let (pool, owner) = (ctx.accounts.pool.key(), ctx.accounts.owner.key());
    let receipt = process(ctx, Exit::All)?;
    emit_withdrawn(pool, owner, &receipt)
}

/// Exit without rewards; works while paused
pub fn emergency_withdraw<'info>(
    ctx: Context<'_, '_, 'info, 'info, Withdraw<'info>>,
) -> Result<()> {
    let (pool, owner) = (ctx.accounts.pool.key(), ctx.accounts.owner.key());
    let receipt = process(ctx, Exit::Emergency)?;

    msg!("emergency withdraw from pool {}", pool);
    emit!(EmergencyWithdrawn {
        pool,
        owner,
        shares_burned: receipt.shares_burned,
        payout: receipt.outcome.payout,
        forfeited: receipt.forfeited,
        timestamp: Clock::get()?.unix_timestamp,
    });

    Ok(())
}
