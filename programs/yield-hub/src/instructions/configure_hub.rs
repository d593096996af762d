use anchor_lang::prelude::*;

use crate::{constants::*, engine, events::*, instructions::common::*, state::*};

/// Hub-level governance: principals and the emission schedule
#[derive(Accounts)]
pub struct ConfigureHub<'info> {
    /// Security: checked against the hub's principal for the action
    pub authority: Signer<'info>,

    #[account(
        mut,
        seeds = [HUB_SEED],
        bump = hub.bump,
    )]
    pub hub: Account<'info, HubConfig>,
}

fn emit_config(hub: &Account<HubConfig>) -> Result<()> {
    emit!(HubConfigUpdated {
        hub: hub.key(),
        admin: hub.admin,
        fee_governor: hub.fee_governor,
        guardian: hub.guardian,
        reward_per_slot: hub.reward_per_slot,
        timestamp: Clock::get()?.unix_timestamp,
    });
    Ok(())
}

pub fn set_governance(
    ctx: Context<ConfigureHub>,
    admin: Pubkey,
    fee_governor: Pubkey,
    guardian: Pubkey,
) -> Result<()> {
    let hub = &mut ctx.accounts.hub;
    hub.require_authorized(ActionClass::Registry, &ctx.accounts.authority.key())?;

    hub.admin = admin;
    hub.fee_governor = fee_governor;
    hub.guardian = guardian;

    emit_config(hub)
}

/// Change the emission schedule
///
/// Pools passed as remaining accounts are accrued at the old rate first;
/// pools left out accrue their pending slots at the new rate.
pub fn set_emission<'info>(
    ctx: Context<'_, '_, 'info, 'info, ConfigureHub<'info>>,
    reward_per_slot: [u64; MAX_STREAMS],
) -> Result<()> {
    let caller = ctx.accounts.authority.key();
    let hub = &mut ctx.accounts.hub;
    hub.require_authorized(ActionClass::Registry, &caller)?;

    let slot = Clock::get()?.slot;
    let mut pools = load_pools(&hub.key(), ctx.remaining_accounts)?;
    {
        let mut entries: Vec<&mut PoolState> = pools.iter_mut().map(|pool| &mut **pool).collect();
        engine::mass_accrue(hub, &mut entries, slot)?;
    }
    persist(&pools)?;

    engine::set_emission(hub, &caller, reward_per_slot)?;
    emit_config(hub)
}
