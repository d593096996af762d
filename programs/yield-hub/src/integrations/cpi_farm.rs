use anchor_lang::prelude::*;

use super::{
    cpi::{balance_gain, discriminator, token_balance, CpiTarget},
    Farm,
};
use crate::{constants::MAX_STREAMS, errors::HubError};

/// `Farm` backed by CPIs into the strategy's farm program
///
/// Staked and unstaked amounts are read off the strategy's want vault;
/// harvested amounts off the reward vaults supplied for each stream.
pub struct CpiFarm<'a, 'info> {
    target: CpiTarget<'a, 'info>,
    want_vault: &'a AccountInfo<'info>,
    reward_vaults: [Option<&'a AccountInfo<'info>>; MAX_STREAMS],
}

impl<'a, 'info> CpiFarm<'a, 'info> {
    pub fn new(
        target: CpiTarget<'a, 'info>,
        want_vault: &'a AccountInfo<'info>,
        reward_vaults: [Option<&'a AccountInfo<'info>>; MAX_STREAMS],
    ) -> Self {
        Self {
            target,
            want_vault,
            reward_vaults,
        }
    }

    fn reward_balances(&self) -> Result<[u64; MAX_STREAMS]> {
        let mut balances = [0u64; MAX_STREAMS];
        for (balance, vault) in balances.iter_mut().zip(self.reward_vaults.iter()) {
            if let Some(vault) = vault {
                *balance = token_balance(vault)?;
            }
        }
        Ok(balances)
    }
}

impl Farm for CpiFarm<'_, '_> {
    fn stake(&mut self, amount: u64) -> Result<u64> {
        let before = token_balance(self.want_vault)?;
        self.target.invoke(discriminator::STAKE, &amount)?;
        let after = token_balance(self.want_vault)?;

        let moved = before
            .checked_sub(after)
            .ok_or(error!(HubError::ExternalCallFailed))?;
        require!(moved <= amount, HubError::ExternalCallFailed);
        Ok(moved)
    }

    fn unstake(&mut self, amount: u64) -> Result<u64> {
        let before = token_balance(self.want_vault)?;
        self.target.invoke(discriminator::UNSTAKE, &amount)?;
        balance_gain(before, token_balance(self.want_vault)?)
    }

    fn pending_rewards(&self) -> Result<[u64; MAX_STREAMS]> {
        self.target
            .invoke_with_return(discriminator::PENDING_REWARDS, &())
    }

    fn harvest(&mut self) -> Result<[u64; MAX_STREAMS]> {
        let before = self.reward_balances()?;
        self.target.invoke(discriminator::HARVEST, &())?;
        let after = self.reward_balances()?;

        let mut harvested = [0u64; MAX_STREAMS];
        for stream in 0..MAX_STREAMS {
            harvested[stream] = balance_gain(before[stream], after[stream])?;
        }
        Ok(harvested)
    }
}
