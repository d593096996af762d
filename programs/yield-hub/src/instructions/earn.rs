use anchor_lang::prelude::*;
use anchor_spl::token::{Token, TokenAccount};

use crate::{
    constants::*,
    engine::{self, EarnReceipt, PoolAccounts},
    errors::HubError,
    events::*,
    instructions::common::*,
    integrations::{cpi::read_token_account, cpi::CpiTarget, CpiFarm, CpiRouter},
    state::*,
};

/// Run a compounding round for a pool; anyone may call it
///
/// Remaining accounts: the farm's accounts (`farm_accounts` of them)
/// followed by the router's.
#[derive(Accounts)]
pub struct Earn<'info> {
    pub caller: Signer<'info>,

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

    #[account(
        mut,
        constraint = want_vault.mint == pool.want_mint @ HubError::InvalidMint,
        constraint = want_vault.owner == strategy_authority.key() @ HubError::InvalidOwner,
    )]
    pub want_vault: Account<'info, TokenAccount>,

    /// Earned-asset vault; omitted when the earned asset is the want asset
    #[account(mut)]
    pub earned_vault: Option<Account<'info, TokenAccount>>,

    /// Hub reward vault of the farm stream
    #[account(mut)]
    pub reward_vault: Account<'info, TokenAccount>,

    /// Controller fee destination
    #[account(mut)]
    pub funds_earned_account: Account<'info, TokenAccount>,

    /// Buyback destination
    #[account(mut)]
    pub custodian_earned_account: Account<'info, TokenAccount>,

    /// Strategy vaults and hub reward vaults of the bonus streams; required
    /// for every bonus stream with a reward mint
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
}

/// Where the proceeds of a harvest go
pub struct HarvestRoutes<'info> {
    /// Holds the harvested earned asset
    pub earned_vault: AccountInfo<'info>,
    pub funds_account: Option<AccountInfo<'info>>,
    pub custodian_account: Option<AccountInfo<'info>>,
    /// Per stream: strategy vault the harvest landed in, hub reward vault
    pub streams: [Option<StreamRoute<'info>>; MAX_STREAMS],
}

/// The strategy vault holding the earned asset
///
/// Without a dedicated vault the earned asset must be the want asset.
pub fn resolve_earned_vault<'info>(
    earned_vault: Option<&Account<'info, TokenAccount>>,
    want_vault: &Account<'info, TokenAccount>,
    strategy: &StrategyState,
    authority: &Pubkey,
) -> Result<AccountInfo<'info>> {
    match earned_vault {
        Some(vault) => {
            require_token_account(vault, &strategy.earned_mint, authority)?;
            Ok(vault.to_account_info())
        }
        None => {
            require_keys_eq!(strategy.earned_mint, strategy.want_mint, HubError::InvalidMint);
            Ok(want_vault.to_account_info())
        }
    }
}

/// Strategy vault and hub reward vault a stream's harvest moves between
pub type StreamRoute<'info> = (AccountInfo<'info>, AccountInfo<'info>);

type BonusPair<'a, 'info> = (
    Option<&'a Account<'info, TokenAccount>>,
    Option<&'a Account<'info, TokenAccount>>,
);

/// Collect the harvest routes of every stream
///
/// The farm stream harvests into `earned_vault`; each bonus stream needs its
/// strategy vault and hub reward vault together. Every stream with a reward
/// mint must be routed, otherwise its harvest would go unmeasured.
pub fn harvest_streams<'info>(
    hub: &HubConfig,
    hub_authority: &Pubkey,
    strategy_authority: &Pubkey,
    earned_vault: &AccountInfo<'info>,
    reward_vault: Option<&Account<'info, TokenAccount>>,
    bonus: [BonusPair<'_, 'info>; MAX_STREAMS - 1],
) -> Result<[Option<StreamRoute<'info>>; MAX_STREAMS]> {
    let mut streams: [Option<StreamRoute<'info>>; MAX_STREAMS] = [None, None, None];

    if let Some(reward_vault) = reward_vault {
        require_token_account(reward_vault, &hub.reward_mints[FARM_STREAM], hub_authority)?;
        streams[FARM_STREAM] = Some((earned_vault.clone(), reward_vault.to_account_info()));
    }

    for (index, pair) in bonus.into_iter().enumerate() {
        let stream = index + 1;
        match pair {
            (Some(vault), Some(reward_vault)) => {
                let mint = &hub.reward_mints[stream];
                require_token_account(vault, mint, strategy_authority)?;
                require_token_account(reward_vault, mint, hub_authority)?;
                streams[stream] = Some((vault.to_account_info(), reward_vault.to_account_info()));
            }
            (None, None) => {}
            _ => return err!(HubError::InvalidRemainingAccounts),
        }
    }

    let mut routed = [false; MAX_STREAMS];
    for (stream, route) in streams.iter().enumerate() {
        routed[stream] = route.is_some();
    }
    hub.require_stream_routes(&routed)?;
    Ok(streams)
}

fn check_account(account: &AccountInfo, mint: &Pubkey, owner: &Pubkey) -> Result<()> {
    require_token_account(&read_token_account(account)?, mint, owner)
}

/// Move fees and distributed reward out of the strategy vaults
#[allow(clippy::too_many_arguments)]
pub fn route_harvest<'info>(
    hub: &HubConfig,
    hub_authority: &Pubkey,
    strategy: &StrategyState,
    strategy_authority: &AccountInfo<'info>,
    authority_seeds: &[&[u8]],
    token_program: &AccountInfo<'info>,
    routes: &HarvestRoutes<'info>,
    receipt: &EarnReceipt,
) -> Result<()> {
    let outcome = &receipt.outcome;
    let missing = || error!(HubError::InvalidRemainingAccounts);

    if outcome.controller_fee > 0 {
        let funds = routes.funds_account.as_ref().ok_or_else(missing)?;
        check_account(funds, &strategy.earned_mint, &strategy.funds_account)?;
        transfer_signed(
            token_program,
            &routes.earned_vault,
            funds,
            strategy_authority,
            authority_seeds,
            outcome.controller_fee,
        )?;
    }

    if outcome.buyback > 0 {
        let custodian = routes.custodian_account.as_ref().ok_or_else(missing)?;
        check_account(custodian, &strategy.earned_mint, &strategy.custodian_account)?;
        transfer_signed(
            token_program,
            &routes.earned_vault,
            custodian,
            strategy_authority,
            authority_seeds,
            outcome.buyback,
        )?;
    }

    for stream in 0..MAX_STREAMS {
        let amount = outcome.distributed[stream];
        if amount == 0 {
            continue;
        }
        let (source, reward_vault) = routes.streams[stream].as_ref().ok_or_else(missing)?;
        check_account(reward_vault, &hub.reward_mints[stream], hub_authority)?;
        transfer_signed(
            token_program,
            source,
            reward_vault,
            strategy_authority,
            authority_seeds,
            amount,
        )?;
    }
    Ok(())
}

pub fn handler<'info>(
    mut ctx: Context<'_, '_, 'info, 'info, Earn<'info>>,
    min_want_out: u64,
    farm_accounts: u8,
) -> Result<()> {
    // CHECKS: every vault the harvest is measured on belongs to the strategy
    let accounts = &ctx.accounts;
    let authority_key = accounts.strategy_authority.key();
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
        Some(&accounts.reward_vault),
        [
            (accounts.bonus_vault_1.as_ref(), accounts.bonus_reward_vault_1.as_ref()),
            (accounts.bonus_vault_2.as_ref(), accounts.bonus_reward_vault_2.as_ref()),
        ],
    )?;

    hold_lock(&accounts.pool)?;

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
    let bonus_vaults: Vec<Option<AccountInfo<'info>>> = streams
        .iter()
        .map(|route| route.as_ref().map(|(vault, _)| vault.clone()))
        .collect();

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
            bonus_vaults[0].as_ref(),
            bonus_vaults[1].as_ref(),
            bonus_vaults[2].as_ref(),
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

    let routes = HarvestRoutes {
        earned_vault,
        funds_account: Some(accounts.funds_earned_account.to_account_info()),
        custodian_account: Some(accounts.custodian_earned_account.to_account_info()),
        streams,
    };
    let hub_authority = accounts.hub_authority.key();
    let token_program = accounts.token_program.to_account_info();
    let (pool_key, caller) = (accounts.pool.key(), accounts.caller.key());

    // EFFECTS: harvest, fees, compound and queue distribution
    let slot = Clock::get()?.slot;
    let accounts = &mut ctx.accounts;
    let receipt = engine::earn(
        PoolAccounts {
            hub: &accounts.hub,
            pool: &mut accounts.pool,
            strategy: &mut accounts.strategy,
        },
        &mut farm,
        &mut router,
        min_want_out,
        slot,
    )?;

    // INTERACTIONS
    route_harvest(
        &accounts.hub,
        &hub_authority,
        &accounts.strategy,
        &strategy_authority,
        authority_seeds,
        &token_program,
        &routes,
        &receipt,
    )?;

    emit_earned(pool_key, strategy_key, caller, &receipt)
}

pub fn emit_earned(
    pool: Pubkey,
    strategy: Pubkey,
    caller: Pubkey,
    receipt: &EarnReceipt,
) -> Result<()> {
    let outcome = &receipt.outcome;
    if outcome.is_noop() {
        msg!("nothing to harvest");
    }

    emit!(Earned {
        pool,
        strategy,
        caller,
        harvested: outcome.harvested,
        controller_fee: outcome.controller_fee,
        buyback: outcome.buyback,
        compounded: outcome.compounded,
        distributed: outcome.distributed,
        total_locked: receipt.total_locked,
        timestamp: Clock::get()?.unix_timestamp,
    });
    Ok(())
}
