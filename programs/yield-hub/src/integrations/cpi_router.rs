use anchor_lang::prelude::*;

use super::{
    cpi::{balance_gain, discriminator, is_custody_account, token_balance, CpiTarget},
    Router,
};
use crate::errors::HubError;

/// `Router` backed by CPIs into the strategy's router program
///
/// Outputs are measured on the strategy authority's token account for the
/// output mint, which must be among the forwarded accounts. Liquidity lands
/// in the want vault.
pub struct CpiRouter<'a, 'info> {
    target: CpiTarget<'a, 'info>,
    liquidity_vault: &'a AccountInfo<'info>,
}

impl<'a, 'info> CpiRouter<'a, 'info> {
    pub fn new(target: CpiTarget<'a, 'info>, liquidity_vault: &'a AccountInfo<'info>) -> Self {
        Self {
            target,
            liquidity_vault,
        }
    }

    fn vault_for(&self, mint: &Pubkey) -> Result<&'a AccountInfo<'info>> {
        let authority = *self.target.authority();
        self.target
            .accounts()
            .iter()
            .find(|account| is_custody_account(account, mint, &authority))
            .ok_or(error!(HubError::InvalidRemainingAccounts))
    }
}

impl Router for CpiRouter<'_, '_> {
    fn swap(&mut self, from: &Pubkey, to: &Pubkey, amount_in: u64, min_out: u64) -> Result<u64> {
        if amount_in == 0 {
            return Ok(0);
        }

        let output_vault = self.vault_for(to)?;
        let before = token_balance(output_vault)?;
        self.target
            .invoke(discriminator::SWAP, &(*from, *to, amount_in, min_out))?;
        let received = balance_gain(before, token_balance(output_vault)?)?;

        require!(received >= min_out, HubError::ExternalCallFailed);
        Ok(received)
    }

    fn add_liquidity(&mut self, amount_a: u64, amount_b: u64, min_out: u64) -> Result<u64> {
        let before = token_balance(self.liquidity_vault)?;
        self.target
            .invoke(discriminator::ADD_LIQUIDITY, &(amount_a, amount_b, min_out))?;
        let received = balance_gain(before, token_balance(self.liquidity_vault)?)?;

        require!(received >= min_out, HubError::ExternalCallFailed);
        Ok(received)
    }
}
