//! Shared plumbing for the farm and router adapters.

use anchor_lang::{
    prelude::*,
    solana_program::{
        instruction::{AccountMeta, Instruction},
        program::{get_return_data, invoke_signed},
    },
};
use anchor_spl::token::{self, TokenAccount};

use crate::errors::HubError;

/// Instruction discriminators of the external programs (`sha256("global:<name>")[..8]`)
pub mod discriminator {
    pub const STAKE: [u8; 8] = [206, 176, 202, 18, 200, 209, 179, 108];
    pub const UNSTAKE: [u8; 8] = [90, 95, 107, 42, 205, 124, 50, 225];
    pub const PENDING_REWARDS: [u8; 8] = [114, 17, 202, 20, 98, 103, 131, 55];
    pub const HARVEST: [u8; 8] = [228, 241, 31, 182, 53, 169, 59, 199];
    pub const SWAP: [u8; 8] = [248, 198, 158, 145, 225, 117, 135, 200];
    pub const ADD_LIQUIDITY: [u8; 8] = [181, 157, 89, 67, 143, 182, 52, 72];
}

/// An external program plus the accounts forwarded to it
///
/// Calls are signed by the strategy authority PDA, which is always passed
/// as the first account.
pub struct CpiTarget<'a, 'info> {
    program: &'a AccountInfo<'info>,
    accounts: &'a [AccountInfo<'info>],
    authority: &'a AccountInfo<'info>,
    signer_seeds: &'a [&'a [u8]],
}

impl<'a, 'info> CpiTarget<'a, 'info> {
    pub fn new(
        program: &'a AccountInfo<'info>,
        expected_program: &Pubkey,
        accounts: &'a [AccountInfo<'info>],
        authority: &'a AccountInfo<'info>,
        signer_seeds: &'a [&'a [u8]],
    ) -> Result<Self> {
        require_keys_eq!(*program.key, *expected_program, HubError::ExternalCallFailed);
        require!(program.executable, HubError::ExternalCallFailed);

        Ok(Self {
            program,
            accounts,
            authority,
            signer_seeds,
        })
    }

    pub fn accounts(&self) -> &'a [AccountInfo<'info>] {
        self.accounts
    }

    pub fn authority(&self) -> &Pubkey {
        self.authority.key
    }

    pub fn invoke<A: AnchorSerialize>(&self, discriminator: [u8; 8], args: &A) -> Result<()> {
        let mut data = discriminator.to_vec();
        args.serialize(&mut data)
            .map_err(|_| error!(HubError::InvalidPayload))?;

        let mut metas = Vec::with_capacity(self.accounts.len() + 1);
        let mut infos = Vec::with_capacity(self.accounts.len() + 2);
        metas.push(AccountMeta::new_readonly(*self.authority.key, true));
        infos.push(self.authority.clone());

        for account in self.accounts {
            let meta = if account.is_writable {
                AccountMeta::new(*account.key, account.is_signer)
            } else {
                AccountMeta::new_readonly(*account.key, account.is_signer)
            };
            metas.push(meta);
            infos.push(account.clone());
        }
        infos.push(self.program.clone());

        let instruction = Instruction {
            program_id: *self.program.key,
            accounts: metas,
            data,
        };

        invoke_signed(&instruction, &infos, &[self.signer_seeds]).map_err(|err| {
            msg!("external call to {} failed: {:?}", self.program.key, err);
            error!(HubError::ExternalCallFailed)
        })
    }

    /// Invoke and decode the program's return data
    pub fn invoke_with_return<A: AnchorSerialize, T: AnchorDeserialize>(
        &self,
        discriminator: [u8; 8],
        args: &A,
    ) -> Result<T> {
        self.invoke(discriminator, args)?;

        let (program_id, data) =
            get_return_data().ok_or(error!(HubError::ExternalCallFailed))?;
        require_keys_eq!(program_id, *self.program.key, HubError::ExternalCallFailed);

        T::try_from_slice(&data).map_err(|_| error!(HubError::ExternalCallFailed))
    }
}

/// Deserialize an SPL token account from a raw account
pub fn read_token_account(account: &AccountInfo) -> Result<TokenAccount> {
    require_keys_eq!(*account.owner, token::ID, HubError::InvalidOwner);
    let data = account.try_borrow_data()?;
    TokenAccount::try_deserialize(&mut &data[..])
}

/// Current balance of an SPL token account
pub fn token_balance(account: &AccountInfo) -> Result<u64> {
    Ok(read_token_account(account)?.amount)
}

/// Whether `account` is a token account of `mint` held by `owner`
pub fn is_custody_account(account: &AccountInfo, mint: &Pubkey, owner: &Pubkey) -> bool {
    match read_token_account(account) {
        Ok(token_account) => token_account.mint == *mint && token_account.owner == *owner,
        Err(_) => false,
    }
}

/// Balance increase between two reads
pub fn balance_gain(before: u64, after: u64) -> Result<u64> {
    after
        .checked_sub(before)
        .ok_or(error!(HubError::ExternalCallFailed))
}
