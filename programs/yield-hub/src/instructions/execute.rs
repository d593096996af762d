use anchor_lang::prelude::*;
use anchor_spl::token::{self, Token, TokenAccount, Transfer};

use crate::{
    command::StrategyCommand,
    constants::*,
    engine::{self, ExecuteReceipt, PoolAccounts},
    errors::HubError,
    events::*,
    instructions::{common::*, deposit::open_position, earn::*},
    integrations::{cpi::CpiTarget, CpiFarm, CpiRouter},
    state::*,
};

/// Hub dispatcher: forward an encoded strategy command to a pool's strategy
///
/// Which optional accounts are needed depends on the command:
/// - `DepositWant`: `position` and `owner_want_account`
/// - `AddLiquiditySplit`: `position`, the owner's and the strategy's base
///   asset accounts
/// - `Compound`: the harvest accounts of every configured stream as in `earn`
///
/// Remaining accounts: the farm's accounts (`farm_accounts` of them)
/// followed by the router's.
#[derive(Accounts)]
pub struct Execute<'info> {
    #[account(mut)]
    pub owner: Signer<'info>,

    #[account(
        seeds = [HUB_SEED],
        bump = hub.bump,
    )]
    pub hub: Account<'info, HubConfig>,

    /// CHECK: PDA owning the reward vaults, validated by seeds
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

    /// Only opened by commands that deposit
    #[account(
        init_if_needed,
        payer = owner,
        space = 8 + UserPosition::INIT_SPACE,
        seeds = [POSITION_SEED, pool.key().as_ref(), owner.key().as_ref()],
        bump
    )]
    pub position: Option<Account<'info, UserPosition>>,

    #[account(
        mut,
        constraint = want_vault.mint == pool.want_mint @ HubError::InvalidMint,
        constraint = want_vault.owner == strategy_authority.key() @ HubError::InvalidOwner,
    )]
    pub want_vault: Account<'info, TokenAccount>,

    #[account(mut)]
    pub owner_want_account: Option<Account<'info, TokenAccount>>,

    #[account(mut)]
    pub owner_base_a: Option<Account<'info, TokenAccount>>,
    #[account(mut)]
    pub owner_base_b: Option<Account<'info, TokenAccount>>,
    #[account(mut)]
    pub base_vault_a: Option<Account<'info, TokenAccount>>,
    #[account(mut)]
    pub base_vault_b: Option<Account<'info, TokenAccount>>,

    #[account(mut)]
    pub earned_vault: Option<Account<'info, TokenAccount>>,
    #[account(mut)]
    pub reward_vault: Option<Account<'info, TokenAccount>>,
    #[account(mut)]
    pub funds_earned_account: Option<Account<'info, TokenAccount>>,
    #[account(mut)]
    pub custodian_earned_account: Option<Account<'info, TokenAccount>>,

    #[account(mut)]
    pub bonus_vault_1: Option<Account<'info, TokenAccount>>,
    #[account(mut)]
    pub bonus_reward_vault_1: Option<Account<'info, TokenAccount>>,
    #[account(mut)]
    pub bonus_vault_2: Option<Account<'info, TokenAccount>>,
    #[account(mut)]
    pub bonus_reward_vault_2: Option<Account<'info, TokenAccount>>,

    /// CHECK: must be the strategy's farm program
    #[account(address = strategy.farm_program @ HubError::ExternalCallFailed)]
    pub farm_program: UncheckedAccount<'info>,

    /// CHECK: must be the strategy's router program
    #[account(address = strategy.router_program @ HubError::ExternalCallFailed)]
    pub router_program: UncheckedAccount<'info>,

    pub token_program: Program<'info, Token>,
    pub system_program: Program<'info, System>,
}

/// Move `amount` from an owner account into a strategy vault
fn fund<'info>(
    token_program: &Program<'info, Token>,
    owner: &Signer<'info>,
    source: Option<&Account<'info, TokenAccount>>,
    vault: Option<&Account<'info, TokenAccount>>,
    mint: &Pubkey,
    vault_owner: &Pubkey,
    amount: u64,
) -> Result<()> {
    if amount == 0 {
        return Ok(());
    }

    let missing = || error!(HubError::InvalidRemainingAccounts);
    let source = source.ok_or_else(missing)?;
    let vault = vault.ok_or_else(missing)?;
    require_token_account(source, mint, &owner.key())?;
    require_token_account(vault, mint, vault_owner)?;

    let transfer_ctx = CpiContext::new(
        token_program.to_account_info(),
        Transfer {
            from: source.to_account_info(),
            to: vault.to_account_info(),
            authority: owner.to_account_info(),
        },
    );
    token::transfer(transfer_ctx, amount)
}

pub fn handler<'info>(
    mut ctx: Context<'_, '_, 'info, 'info, Execute<'info>>,
    payload: Vec<u8>,
    farm_accounts: u8,
) -> Result<()> {
    // CHECKS: pool gate, decode and family validation before anything moves
    let command = engine::admit(&ctx.accounts.pool, &ctx.accounts.strategy, &payload)?;

    let pool_key = ctx.accounts.pool.key();
    let owner_key = ctx.accounts.owner.key();
    if command.deposits() {
        let position = ctx
            .accounts
            .position
            .as_mut()
            .ok_or(error!(HubError::InvalidRemainingAccounts))?;
        let (_, bump) = Pubkey::find_program_address(
            &[POSITION_SEED, pool_key.as_ref(), owner_key.as_ref()],
            &crate::ID,
        );
        open_position(position, pool_key, owner_key, bump);
    }

    let accounts = &ctx.accounts;
    let authority_key = accounts.strategy_authority.key();
    hold_lock(&accounts.pool)?;

    // INTERACTIONS: user funds move into strategy custody first
    match &command {
        StrategyCommand::DepositWant { amount } => fund(
            &accounts.token_program,
            &accounts.owner,
            accounts.owner_want_account.as_ref(),
            Some(&accounts.want_vault),
            &accounts.pool.want_mint,
            &authority_key,
            *amount,
        )?,
        StrategyCommand::AddLiquiditySplit { amounts } => {
            let [base_a, base_b] = accounts.strategy.base_mints;
            fund(
                &accounts.token_program,
                &accounts.owner,
                accounts.owner_base_a.as_ref(),
                accounts.base_vault_a.as_ref(),
                &base_a,
                &authority_key,
                amounts[0],
            )?;
            fund(
                &accounts.token_program,
                &accounts.owner,
                accounts.owner_base_b.as_ref(),
                accounts.base_vault_b.as_ref(),
                &base_b,
                &authority_key,
                amounts[1],
            )?;
        }
        StrategyCommand::Compound { .. } => {}
    }

    let routes = match &command {
        StrategyCommand::Compound { .. } => {
            let earned_vault = resolve_earned_vault(
                accounts.earned_vault.as_ref(),
                &accounts.want_vault,
                &accounts.strategy,
                &authority_key,
            )?;
            let streams = harvest_streams(
                &accounts.hub,
                &accounts.hub_authority.key(),
                &authority_key,
                &earned_vault,
                accounts.reward_vault.as_ref(),
                [
                    (accounts.bonus_vault_1.as_ref(), accounts.bonus_reward_vault_1.as_ref()),
                    (accounts.bonus_vault_2.as_ref(), accounts.bonus_reward_vault_2.as_ref()),
                ],
            )?;

            Some(HarvestRoutes {
                earned_vault,
                funds_account: accounts
                    .funds_earned_account
                    .as_ref()
                    .map(|account| account.to_account_info()),
                custodian_account: accounts
                    .custodian_earned_account
                    .as_ref()
                    .map(|account| account.to_account_info()),
                streams,
            })
        }
        _ => None,
    };

    let strategy_key = accounts.strategy.key();
    let authority_seeds: &[&[u8]] = &[
        STRATEGY_AUTHORITY_SEED,
        strategy_key.as_ref(),
        &[accounts.strategy.authority_bump],
    ];
    let (farm_infos, router_infos) = split_remaining(ctx.remaining_accounts, farm_accounts)?;
    let farm_program = accounts.farm_program.to_account_info();
    let router_program = accounts.router_program.to_account_info();
    let strategy_authority = accounts.strategy_authority.to_account_info();
    let want_vault = accounts.want_vault.to_account_info();
    let harvest_vaults: [Option<AccountInfo<'info>>; MAX_STREAMS] = match &routes {
        Some(routes) => std::array::from_fn(|stream| {
            routes.streams[stream]
                .as_ref()
                .map(|(vault, _)| vault.clone())
        }),
        None => [None, None, None],
    };

    let mut farm = CpiFarm::new(
        CpiTarget::new(
            &farm_program,
            &accounts.strategy.farm_program,
            farm_infos,
            &strategy_authority,
            authority_seeds,
        )?,
        &want_vault,
        [
            harvest_vaults[0].as_ref(),
            harvest_vaults[1].as_ref(),
            harvest_vaults[2].as_ref(),
        ],
    );
    let mut router = CpiRouter::new(
        CpiTarget::new(
            &router_program,
            &accounts.strategy.router_program,
            router_infos,
            &strategy_authority,
            authority_seeds,
        )?,
        &want_vault,
    );
    let hub_authority = accounts.hub_authority.key();
    let token_program = accounts.token_program.to_account_info();

    // EFFECTS: accrue, settle and run the command through the engine
    let slot = Clock::get()?.slot;
    let accounts = &mut ctx.accounts;
    let receipt = engine::dispatch(
        PoolAccounts {
            hub: &accounts.hub,
            pool: &mut accounts.pool,
            strategy: &mut accounts.strategy,
        },
        accounts.position.as_deref_mut(),
        &mut farm,
        &mut router,
        &command,
        slot,
    )?;

    match &receipt {
        ExecuteReceipt::Deposit(deposit) => {
            emit!(Deposited {
                pool: pool_key,
                owner: owner_key,
                amount: deposit.amount,
                net_amount: deposit.net_amount,
                shares_minted: deposit.shares_minted,
                total_shares: deposit.total_shares,
                total_locked: deposit.total_locked,
                timestamp: Clock::get()?.unix_timestamp,
            });
        }
        ExecuteReceipt::Compound(earned) => {
            let routes = routes.as_ref().ok_or(error!(HubError::InvalidRemainingAccounts))?;
            route_harvest(
                &accounts.hub,
                &hub_authority,
                &accounts.strategy,
                &strategy_authority,
                authority_seeds,
                &token_program,
                routes,
                earned,
            )?;
            emit_earned(pool_key, strategy_key, owner_key, earned)?;
        }
    }

    emit!(CommandExecuted {
        pool: pool_key,
        caller: owner_key,
        command: command.name().to_string(),
        timestamp: Clock::get()?.unix_timestamp,
    });

    Ok(())
}
