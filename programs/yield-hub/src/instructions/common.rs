//! Helpers shared by the instruction handlers.

use anchor_lang::prelude::*;
use anchor_spl::token::{self, TokenAccount, Transfer};

use crate::{
    constants::*, errors::HubError, integrations::cpi::read_token_account, state::*,
};

/// Persist the pool's reentrancy flag before any external call
///
/// Only the serialized copy is marked; the in-memory state is written back
/// unlocked when the instruction exits.
pub fn hold_lock(pool: &Account<PoolState>) -> Result<()> {
    require!(!pool.locked, HubError::Reentrancy);

    let mut marked = (**pool).clone();
    marked.locked = true;

    let info = pool.to_account_info();
    let mut data = info.try_borrow_mut_data()?;
    marked.try_serialize(&mut &mut data[..])?;
    Ok(())
}

/// Split `remaining` into the farm and router account slices
pub fn split_remaining<'a, 'info>(
    remaining: &'a [AccountInfo<'info>],
    farm_accounts: u8,
) -> Result<(&'a [AccountInfo<'info>], &'a [AccountInfo<'info>])> {
    let split = farm_accounts as usize;
    require!(split <= remaining.len(), HubError::InvalidRemainingAccounts);
    Ok(remaining.split_at(split))
}

/// Token transfer signed by a program authority; zero amounts are skipped
pub fn transfer_signed<'info>(
    token_program: &AccountInfo<'info>,
    from: &AccountInfo<'info>,
    to: &AccountInfo<'info>,
    authority: &AccountInfo<'info>,
    signer_seeds: &[&[u8]],
    amount: u64,
) -> Result<()> {
    if amount == 0 {
        return Ok(());
    }

    let signer = &[signer_seeds];
    let transfer_ctx = CpiContext::new_with_signer(
        token_program.clone(),
        Transfer {
            from: from.clone(),
            to: to.clone(),
            authority: authority.clone(),
        },
        signer,
    );
    token::transfer(transfer_ctx, amount)
}

/// Check a token account's mint and owner
pub fn require_token_account(
    account: &TokenAccount,
    mint: &Pubkey,
    owner: &Pubkey,
) -> Result<()> {
    require_keys_eq!(account.mint, *mint, HubError::InvalidMint);
    require_keys_eq!(account.owner, *owner, HubError::InvalidOwner);
    Ok(())
}

/// Pay claimed rewards out of the hub's reward vaults
///
/// `reward_accounts` holds one `(vault, destination)` pair for every stream
/// with a configured reward mint, in stream order.
pub fn pay_rewards<'info>(
    hub: &Account<'info, HubConfig>,
    hub_authority: &AccountInfo<'info>,
    token_program: &AccountInfo<'info>,
    reward_accounts: &[AccountInfo<'info>],
    owner: &Pubkey,
    amounts: &[u64; MAX_STREAMS],
) -> Result<()> {
    let hub_key = hub.key();
    let authority_seeds: &[&[u8]] = &[
        HUB_AUTHORITY_SEED,
        hub_key.as_ref(),
        &[hub.authority_bump],
    ];

    let mut pairs = reward_accounts.chunks_exact(2);
    for stream in 0..MAX_STREAMS {
        let mint = hub.reward_mints[stream];
        if mint == Pubkey::default() {
            require!(amounts[stream] == 0, HubError::InvalidStream);
            continue;
        }

        let [vault, destination] = pairs
            .next()
            .ok_or(error!(HubError::InvalidRemainingAccounts))?
        else {
            return err!(HubError::InvalidRemainingAccounts);
        };
        if amounts[stream] == 0 {
            continue;
        }

        require_token_account(&read_token_account(vault)?, &mint, hub_authority.key)?;
        require_token_account(&read_token_account(destination)?, &mint, owner)?;

        transfer_signed(
            token_program,
            vault,
            destination,
            hub_authority,
            authority_seeds,
            amounts[stream],
        )?;
    }
    Ok(())
}

/// Load a pool passed as a remaining account and check it belongs to `hub`
pub fn load_pool<'info>(
    hub: &Pubkey,
    info: &'info AccountInfo<'info>,
) -> Result<Account<'info, PoolState>> {
    require!(info.is_writable, HubError::InvalidRemainingAccounts);
    let pool = Account::<PoolState>::try_from(info)?;
    require_keys_eq!(pool.hub, *hub, HubError::PoolMismatch);
    Ok(pool)
}

/// Load distinct pools passed as remaining accounts
pub fn load_pools<'info>(
    hub: &Pubkey,
    accounts: &'info [AccountInfo<'info>],
) -> Result<Vec<Account<'info, PoolState>>> {
    let mut pools: Vec<Account<'info, PoolState>> = Vec::with_capacity(accounts.len());
    for info in accounts {
        let pool = load_pool(hub, info)?;
        require!(
            pools.iter().all(|loaded| loaded.key() != pool.key()),
            HubError::InvalidRemainingAccounts
        );
        pools.push(pool);
    }
    Ok(pools)
}

/// Write loaded remaining accounts back
pub fn persist<'info, T>(accounts: &[Account<'info, T>]) -> Result<()>
where
    T: AccountSerialize + AccountDeserialize + Owner + Clone,
{
    for account in accounts {
        account.exit(&crate::ID)?;
    }
    Ok(())
}
