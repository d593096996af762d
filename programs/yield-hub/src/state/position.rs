use anchor_lang::prelude::*;

use crate::{
    constants::MAX_STREAMS,
    errors::HubError,
    math::{accumulated, add, mul_div, sub, to_u64},
};

/// A user's stake in one pool
///
/// `reward_debt[i]` is the part of `shares * acc_reward_per_share[i]` that
/// has already been credited; `claimable[i]` holds settled but unpaid reward.
#[account]
#[derive(InitSpace, Debug, Default)]
pub struct UserPosition {
    pub pool: Pubkey,
    pub owner: Pubkey,

    /// Shares of the pool's locked total
    pub shares: u64,

    /// Net want deposited and not yet withdrawn
    pub principal: u64,

    pub reward_debt: [u128; MAX_STREAMS],
    pub claimable: [u64; MAX_STREAMS],

    pub bump: u8,
}

impl UserPosition {
    pub fn new(pool: Pubkey, owner: Pubkey) -> Self {
        Self {
            pool,
            owner,
            ..Default::default()
        }
    }

    /// Reward accrued since the last settlement, without mutating anything
    fn accrued_since_debt(&self, acc: &[u128; MAX_STREAMS]) -> Result<[u64; MAX_STREAMS]> {
        let mut owed = [0u64; MAX_STREAMS];
        for stream in 0..MAX_STREAMS {
            let total = accumulated(self.shares, acc[stream])?;
            let delta = total
                .checked_sub(self.reward_debt[stream])
                .ok_or(error!(HubError::MathOverflow))?;
            owed[stream] = to_u64(delta)?;
        }
        Ok(owed)
    }

    /// Credit everything accrued so far into `claimable`
    ///
    /// Must run before any change to `shares`.
    pub fn settle(&mut self, acc: &[u128; MAX_STREAMS]) -> Result<[u64; MAX_STREAMS]> {
        let owed = self.accrued_since_debt(acc)?;
        for stream in 0..MAX_STREAMS {
            self.claimable[stream] = add(self.claimable[stream], owed[stream])?;
        }
        self.sync_debt(acc)?;
        Ok(owed)
    }

    /// Reset the debt snapshot for the current share count
    pub fn sync_debt(&mut self, acc: &[u128; MAX_STREAMS]) -> Result<()> {
        for stream in 0..MAX_STREAMS {
            self.reward_debt[stream] = accumulated(self.shares, acc[stream])?;
        }
        Ok(())
    }

    /// Claimable plus not-yet-settled reward
    pub fn pending(&self, acc: &[u128; MAX_STREAMS]) -> Result<[u64; MAX_STREAMS]> {
        let owed = self.accrued_since_debt(acc)?;
        let mut pending = [0u64; MAX_STREAMS];
        for stream in 0..MAX_STREAMS {
            pending[stream] = add(self.claimable[stream], owed[stream])?;
        }
        Ok(pending)
    }

    /// Drop all unclaimed and unsettled reward
    pub fn forfeit(&mut self, acc: &[u128; MAX_STREAMS]) -> Result<[u64; MAX_STREAMS]> {
        let forfeited = self.pending(acc)?;
        self.claimable = [0; MAX_STREAMS];
        self.sync_debt(acc)?;
        Ok(forfeited)
    }

    /// Return and zero the claimable balance
    pub fn take_claimable(&mut self) -> [u64; MAX_STREAMS] {
        std::mem::take(&mut self.claimable)
    }

    pub fn add_shares(&mut self, shares: u64, principal: u64) -> Result<()> {
        self.shares = add(self.shares, shares)?;
        self.principal = add(self.principal, principal)?;
        Ok(())
    }

    /// Burn `shares`, releasing the same fraction of principal
    pub fn remove_shares(&mut self, shares: u64) -> Result<()> {
        require!(shares <= self.shares, HubError::InsufficientAmount);

        let released = if shares == self.shares {
            self.principal
        } else {
            mul_div(self.principal, shares, self.shares)?
        };
        self.principal = sub(self.principal, released)?;
        self.shares = sub(self.shares, shares)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::ACC_PRECISION;

    fn acc(per_share: [u128; MAX_STREAMS]) -> [u128; MAX_STREAMS] {
        per_share.map(|value| value * ACC_PRECISION)
    }

    #[test]
    fn test_settle_credits_and_advances_debt() {
        let mut position = UserPosition::new(Pubkey::default(), Pubkey::default());
        position.shares = 10;

        let owed = position.settle(&acc([2, 0, 1])).unwrap();
        assert_eq!(owed, [20, 0, 10]);
        assert_eq!(position.claimable, [20, 0, 10]);

        // nothing new accrued
        assert_eq!(position.settle(&acc([2, 0, 1])).unwrap(), [0, 0, 0]);
        assert_eq!(position.pending(&acc([3, 0, 1])).unwrap(), [30, 0, 10]);
    }

    #[test]
    fn test_pending_does_not_mutate() {
        let mut position = UserPosition::new(Pubkey::default(), Pubkey::default());
        position.shares = 5;
        let before = position.clone();

        assert_eq!(position.pending(&acc([4, 4, 4])).unwrap(), [20, 20, 20]);
        assert_eq!(position.pending(&acc([4, 4, 4])).unwrap(), [20, 20, 20]);
        assert_eq!(position.reward_debt, before.reward_debt);
        assert_eq!(position.claimable, before.claimable);
    }

    #[test]
    fn test_forfeit_drops_rewards() {
        let mut position = UserPosition::new(Pubkey::default(), Pubkey::default());
        position.shares = 10;
        position.settle(&acc([1, 0, 0])).unwrap();

        let forfeited = position.forfeit(&acc([5, 0, 0])).unwrap();
        assert_eq!(forfeited, [50, 0, 0]);
        assert_eq!(position.pending(&acc([5, 0, 0])).unwrap(), [0, 0, 0]);
    }

    #[test]
    fn test_remove_shares_releases_principal_proportionally() {
        let mut position = UserPosition::new(Pubkey::default(), Pubkey::default());
        position.add_shares(300, 600).unwrap();

        position.remove_shares(100).unwrap();
        assert_eq!(position.shares, 200);
        assert_eq!(position.principal, 400);

        position.remove_shares(200).unwrap();
        assert_eq!(position.principal, 0);
        assert!(position.remove_shares(1).is_err());
    }

    #[test]
    fn test_take_claimable() {
        let mut position = UserPosition::new(Pubkey::default(), Pubkey::default());
        position.claimable = [1, 2, 3];
        assert_eq!(position.take_claimable(), [1, 2, 3]);
        assert_eq!(position.claimable, [0, 0, 0]);
    }
}
