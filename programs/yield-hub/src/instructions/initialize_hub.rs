use anchor_lang::prelude::*;
use anchor_spl::token::Mint;

use crate::{constants::*, events::*, state::*};

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug)]
pub struct InitializeHubArgs {
    pub fee_governor: Pubkey,
    pub guardian: Pubkey,
    pub reward_per_slot: [u64; MAX_STREAMS],
    pub max_harvest_fee_bps: u16,
    pub max_withdraw_fee_bps: u16,
}

/// Initialize the hub and its reward streams
#[derive(Accounts)]
pub struct InitializeHub<'info> {
    /// Hub admin, principal for registry actions
    /// Security: Must be signer, stored in state
    #[account(mut)]
    pub admin: Signer<'info>,

    /// Hub configuration PDA
    #[account(
        init,
        payer = admin,
        space = 8 + HubConfig::INIT_SPACE,
        seeds = [HUB_SEED],
        bump
    )]
    pub hub: Account<'info, HubConfig>,

    /// Hub authority PDA - owner of the reward vaults
    /// CHECK: PDA used as token authority, validated by seeds
    #[account(
        seeds = [HUB_AUTHORITY_SEED, hub.key().as_ref()],
        bump
    )]
    pub hub_authority: UncheckedAccount<'info>,

    /// Reward mint of the farm stream (stream 0)
    pub reward_mint: Account<'info, Mint>,

    /// Bonus stream mints, streams 1 and 2
    pub bonus_mint_1: Option<Account<'info, Mint>>,
    pub bonus_mint_2: Option<Account<'info, Mint>>,

    pub system_program: Program<'info, System>,
}

pub fn handler(ctx: Context<InitializeHub>, args: InitializeHubArgs) -> Result<()> {
    // CHECKS: fee ceilings
    HubConfig::validate_ceilings(args.max_harvest_fee_bps, args.max_withdraw_fee_bps)?;

    let reward_mints = [
        ctx.accounts.reward_mint.key(),
        ctx.accounts
            .bonus_mint_1
            .as_ref()
            .map_or_else(Pubkey::default, |mint| mint.key()),
        ctx.accounts
            .bonus_mint_2
            .as_ref()
            .map_or_else(Pubkey::default, |mint| mint.key()),
    ];

    // EFFECTS
    let hub = &mut ctx.accounts.hub;
    hub.set_inner(HubConfig {
        admin: ctx.accounts.admin.key(),
        fee_governor: args.fee_governor,
        guardian: args.guardian,
        pool_count: 0,
        reward_mints,
        reward_per_slot: args.reward_per_slot,
        total_alloc_weight: [0; MAX_STREAMS],
        max_harvest_fee_bps: args.max_harvest_fee_bps,
        max_withdraw_fee_bps: args.max_withdraw_fee_bps,
        bump: ctx.bumps.hub,
        authority_bump: ctx.bumps.hub_authority,
    });

    emit!(HubInitialized {
        hub: hub.key(),
        admin: hub.admin,
        fee_governor: hub.fee_governor,
        guardian: hub.guardian,
        reward_mints,
        timestamp: Clock::get()?.unix_timestamp,
    });

    Ok(())
}
