use anchor_lang::prelude::*;
use anchor_spl::{
    associated_token::AssociatedToken,
    token::{self, Mint, Token, TokenAccount, Transfer},
};

use crate::{constants::*, errors::HubError, events::*, state::*};

/// Top up the reward vault of one stream
///
/// Anyone may fund a stream; emission only pays out what the vault holds.
#[derive(Accounts)]
pub struct FundStream<'info> {
    #[account(mut)]
    pub funder: Signer<'info>,

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

    /// Reward mint of the funded stream (checked in handler)
    pub reward_mint: Account<'info, Mint>,

    #[account(
        init_if_needed,
        payer = funder,
        associated_token::mint = reward_mint,
        associated_token::authority = hub_authority,
    )]
    pub reward_vault: Account<'info, TokenAccount>,

    #[account(
        mut,
        constraint = funder_account.mint == reward_mint.key() @ HubError::InvalidMint,
        constraint = funder_account.owner == funder.key() @ HubError::InvalidOwner,
    )]
    pub funder_account: Account<'info, TokenAccount>,

    pub token_program: Program<'info, Token>,
    pub associated_token_program: Program<'info, AssociatedToken>,
    pub system_program: Program<'info, System>,
}

pub fn handler(ctx: Context<FundStream>, stream: u8, amount: u64) -> Result<()> {
    // CHECKS
    let index = stream as usize;
    require!(index < MAX_STREAMS, HubError::InvalidStream);
    require!(amount > 0, HubError::InsufficientAmount);
    require_keys_eq!(
        ctx.accounts.reward_mint.key(),
        ctx.accounts.hub.reward_mints[index],
        HubError::InvalidMint
    );

    // INTERACTIONS
    let transfer_ctx = CpiContext::new(
        ctx.accounts.token_program.to_account_info(),
        Transfer {
            from: ctx.accounts.funder_account.to_account_info(),
            to: ctx.accounts.reward_vault.to_account_info(),
            authority: ctx.accounts.funder.to_account_info(),
        },
    );
    token::transfer(transfer_ctx, amount)?;

    ctx.accounts.reward_vault.reload()?;

    emit!(StreamFunded {
        hub: ctx.accounts.hub.key(),
        funder: ctx.accounts.funder.key(),
        stream,
        amount,
        vault_balance: ctx.accounts.reward_vault.amount,
        timestamp: Clock::get()?.unix_timestamp,
    });

    Ok(())
}
