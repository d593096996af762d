use anchor_lang::prelude::*;

use crate::{
    constants::*,
    errors::HubError,
    math::{acc_increment, add, mul_div},
    state::{HubConfig, StrategyState},
};

/// One numbered pool in the registry
///
/// The pool owns the share ledger totals and the per-stream reward
/// accumulators; custody of the want asset belongs to its strategy.
///
/// Invariant: `total_shares == 0` if and only if `total_locked == 0`.
#[account]
#[derive(InitSpace, Debug)]
pub struct PoolState {
    /// Hub this pool is registered in
    pub hub: Pubkey,

    /// Stable pool id (index in the registry)
    pub pool_id: u32,

    /// Mint of the want asset
    pub want_mint: Pubkey,

    /// Strategy holding this pool's funds (default until registered)
    pub strategy: Pubkey,

    /// Allocation weight per reward stream, 0 disables the stream's emission
    pub alloc_weights: [u64; MAX_STREAMS],

    /// Shares issued to depositors
    pub total_shares: u64,

    /// Want locked by the strategy, mirrored after every operation
    pub total_locked: u64,

    /// Reward per share accumulated so far, scaled by ACC_PRECISION
    pub acc_reward_per_share: [u128; MAX_STREAMS],

    /// Reward waiting to be folded into the accumulator
    pub undistributed: [u64; MAX_STREAMS],

    /// Slot of the last accrual
    pub last_accrual_slot: u64,

    /// Paused pools accept no deposits or commands
    pub paused: bool,

    /// Reentrancy flag, set while a mutation is in flight
    pub locked: bool,

    pub bump: u8,
}

impl PoolState {
    pub fn new(
        hub: Pubkey,
        pool_id: u32,
        want_mint: Pubkey,
        alloc_weights: [u64; MAX_STREAMS],
        slot: u64,
    ) -> Self {
        Self {
            hub,
            pool_id,
            want_mint,
            strategy: Pubkey::default(),
            alloc_weights,
            total_shares: 0,
            total_locked: 0,
            acc_reward_per_share: [0; MAX_STREAMS],
            undistributed: [0; MAX_STREAMS],
            last_accrual_slot: slot,
            paused: false,
            locked: false,
            bump: 0,
        }
    }

    /// Bring the accumulators up to `slot`
    ///
    /// Emission for elapsed slots is added to `undistributed` for each stream
    /// with a non-zero weight. With shares outstanding, everything
    /// undistributed is folded into the accumulator; with no shares it is
    /// carried until shares exist.
    pub fn accrue(&mut self, hub: &HubConfig, slot: u64) -> Result<[u64; MAX_STREAMS]> {
        let mut distributed = [0u64; MAX_STREAMS];
        let elapsed = slot.saturating_sub(self.last_accrual_slot);

        for stream in 0..MAX_STREAMS {
            let emitted = hub.emission_for(stream, self.alloc_weights[stream], elapsed)?;
            self.undistributed[stream] = add(self.undistributed[stream], emitted)?;

            if self.total_shares == 0 || self.undistributed[stream] == 0 {
                continue;
            }

            let increment = acc_increment(self.undistributed[stream], self.total_shares)?;
            self.acc_reward_per_share[stream] = self.acc_reward_per_share[stream]
                .checked_add(increment)
                .ok_or(error!(HubError::MathOverflow))?;

            distributed[stream] = self.undistributed[stream];
            self.undistributed[stream] = 0;
        }

        if slot > self.last_accrual_slot {
            self.last_accrual_slot = slot;
        }
        Ok(distributed)
    }

    /// Queue harvest-sourced reward for distribution at the next accrual
    pub fn queue_distribution(&mut self, amounts: &[u64; MAX_STREAMS]) -> Result<()> {
        for stream in 0..MAX_STREAMS {
            self.undistributed[stream] = add(self.undistributed[stream], amounts[stream])?;
        }
        Ok(())
    }

    /// Shares minted for `net_amount` of want, against the pre-deposit totals
    pub fn shares_for_deposit(&self, net_amount: u64) -> Result<u64> {
        if self.total_shares == 0 || self.total_locked == 0 {
            return Ok(net_amount);
        }
        mul_div(net_amount, self.total_shares, self.total_locked)
    }

    /// Proportional want owed for `shares`
    pub fn want_for_shares(&self, shares: u64) -> Result<u64> {
        if self.total_shares == 0 {
            return Ok(0);
        }
        mul_div(shares, self.total_locked, self.total_shares)
    }

    pub fn enter(&mut self) -> Result<()> {
        require!(!self.locked, HubError::Reentrancy);
        self.locked = true;
        Ok(())
    }

    pub fn leave(&mut self) {
        self.locked = false;
    }

    pub fn require_accepting_deposits(&self) -> Result<()> {
        require!(!self.paused, HubError::PoolPaused);
        Ok(())
    }

    /// Mirror the strategy's locked total
    pub fn sync_locked(&mut self, strategy: &StrategyState) {
        self.total_locked = strategy.want_locked_total;
    }

    /// Share conservation between pool and strategy
    pub fn check_share_invariant(&self, strategy: &StrategyState) -> Result<()> {
        require!(
            self.total_shares == strategy.shares_total,
            HubError::AccountingMismatch
        );
        require!(
            (self.total_shares == 0) == (self.total_locked == 0),
            HubError::AccountingMismatch
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mock_hub(
        reward_per_slot: [u64; MAX_STREAMS],
        total_alloc_weight: [u64; MAX_STREAMS],
    ) -> HubConfig {
        HubConfig {
            admin: Pubkey::default(),
            fee_governor: Pubkey::default(),
            guardian: Pubkey::default(),
            pool_count: 1,
            reward_mints: [Pubkey::default(); MAX_STREAMS],
            reward_per_slot,
            total_alloc_weight,
            max_harvest_fee_bps: 10_000,
            max_withdraw_fee_bps: 100,
            bump: 0,
            authority_bump: 0,
        }
    }

    fn mock_pool(total_locked: u64, total_shares: u64) -> PoolState {
        let mut pool = PoolState::new(Pubkey::default(), 0, Pubkey::default(), [100, 0, 0], 0);
        pool.total_locked = total_locked;
        pool.total_shares = total_shares;
        pool
    }

    #[test]
    fn test_first_deposit_is_one_to_one() {
        assert_eq!(mock_pool(0, 0).shares_for_deposit(500).unwrap(), 500);
    }

    #[test]
    fn test_deposit_after_compounding_gain() {
        // 500 shares backed by 600 want after a 100 unit gain
        assert_eq!(mock_pool(600, 500).shares_for_deposit(500).unwrap(), 416);
    }

    #[test]
    fn test_want_for_shares() {
        let pool = mock_pool(1_100, 916);
        assert_eq!(pool.want_for_shares(500).unwrap(), 600);
        assert_eq!(pool.want_for_shares(916).unwrap(), 1_100);
        assert_eq!(mock_pool(0, 0).want_for_shares(10).unwrap(), 0);
    }

    #[test]
    fn test_accrue_distributes_emission_over_shares() {
        let hub = mock_hub([10, 0, 0], [100, 0, 0]);
        let mut pool = mock_pool(1_000, 1_000);

        let distributed = pool.accrue(&hub, 5).unwrap();
        assert_eq!(distributed, [50, 0, 0]);
        assert_eq!(pool.acc_reward_per_share[0], 50 * ACC_PRECISION / 1_000);
        assert_eq!(pool.last_accrual_slot, 5);

        // same slot again accrues nothing
        assert_eq!(pool.accrue(&hub, 5).unwrap(), [0, 0, 0]);
    }

    #[test]
    fn test_accrue_defers_without_shares() {
        let hub = mock_hub([10, 0, 0], [100, 0, 0]);
        let mut pool = mock_pool(0, 0);

        assert_eq!(pool.accrue(&hub, 3).unwrap(), [0, 0, 0]);
        assert_eq!(pool.undistributed[0], 30);
        assert_eq!(pool.acc_reward_per_share[0], 0);

        pool.total_shares = 10;
        pool.total_locked = 10;
        assert_eq!(pool.accrue(&hub, 4).unwrap(), [40, 0, 0]);
        assert_eq!(pool.undistributed[0], 0);
    }

    #[test]
    fn test_queued_distribution_ignores_weight() {
        let hub = mock_hub([0, 0, 0], [0, 0, 0]);
        let mut pool = mock_pool(100, 100);
        pool.queue_distribution(&[0, 0, 7]).unwrap();
        assert_eq!(pool.accrue(&hub, 0).unwrap(), [0, 0, 7]);
    }

    #[test]
    fn test_reentrancy_flag() {
        let mut pool = mock_pool(0, 0);
        pool.enter().unwrap();
        assert!(pool.enter().is_err());
        pool.leave();
        assert!(pool.enter().is_ok());
    }
}
