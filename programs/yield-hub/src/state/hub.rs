use anchor_lang::prelude::*;

use crate::{
    constants::*,
    errors::HubError,
    math::{add, mul_div, sub},
};

/// Classes of governance-gated actions, each owned by a single principal
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActionClass {
    /// Pool registration, weights, strategy registration, emission schedule
    Registry,
    /// Strategy fee rates, reinvest rate and fee recipients
    Fees,
    /// Pausing and unpausing pools and strategies
    Pause,
}

/// Global hub configuration
///
/// Holds the governance principals, the reward emission schedule for the
/// three streams and the fee ceilings every strategy is checked against.
#[account]
#[derive(InitSpace, Debug)]
pub struct HubConfig {
    /// Principal for `ActionClass::Registry`
    pub admin: Pubkey,

    /// Principal for `ActionClass::Fees`
    pub fee_governor: Pubkey,

    /// Principal for `ActionClass::Pause`
    pub guardian: Pubkey,

    /// Number of pools registered so far (next pool id)
    pub pool_count: u32,

    /// Reward token mint of each stream
    pub reward_mints: [Pubkey; MAX_STREAMS],

    /// Globally emitted reward per slot, per stream
    pub reward_per_slot: [u64; MAX_STREAMS],

    /// Sum of all pools' allocation weights, per stream
    pub total_alloc_weight: [u64; MAX_STREAMS],

    /// Ceiling for controller + buyback cut at harvest
    pub max_harvest_fee_bps: u16,

    /// Ceiling for the withdrawal fee
    pub max_withdraw_fee_bps: u16,

    pub bump: u8,
    pub authority_bump: u8,
}

impl HubConfig {
    /// Capability check used by every gated entry point
    pub fn authorized(&self, class: ActionClass, caller: &Pubkey) -> bool {
        let principal = match class {
            ActionClass::Registry => &self.admin,
            ActionClass::Fees => &self.fee_governor,
            ActionClass::Pause => &self.guardian,
        };
        principal == caller
    }

    pub fn require_authorized(&self, class: ActionClass, caller: &Pubkey) -> Result<()> {
        require!(self.authorized(class, caller), HubError::Unauthorized);
        Ok(())
    }

    /// Validate fee ceilings before they are stored
    pub fn validate_ceilings(max_harvest_fee_bps: u16, max_withdraw_fee_bps: u16) -> Result<()> {
        require!(
            max_harvest_fee_bps <= MAX_HARVEST_FEE_CEILING_BPS,
            HubError::InvalidParameter
        );
        require!(
            max_withdraw_fee_bps <= MAX_WITHDRAW_FEE_CEILING_BPS,
            HubError::InvalidParameter
        );
        Ok(())
    }

    /// Reward emitted to a pool with `weight` over `slots` for one stream
    pub fn emission_for(&self, stream: usize, weight: u64, slots: u64) -> Result<u64> {
        require!(stream < MAX_STREAMS, HubError::InvalidStream);

        let total_weight = self.total_alloc_weight[stream];
        if weight == 0 || slots == 0 || total_weight == 0 {
            return Ok(0);
        }

        let emitted = self.reward_per_slot[stream]
            .checked_mul(slots)
            .ok_or(error!(HubError::MathOverflow))?;

        mul_div(emitted, weight, total_weight)
    }

    /// Keep `total_alloc_weight` equal to the sum over all pools
    pub fn apply_weight_change(
        &mut self,
        old: &[u64; MAX_STREAMS],
        new: &[u64; MAX_STREAMS],
    ) -> Result<()> {
        for stream in 0..MAX_STREAMS {
            let total = sub(self.total_alloc_weight[stream], old[stream])?;
            self.total_alloc_weight[stream] = add(total, new[stream])?;
        }
        Ok(())
    }

    /// Every stream with a reward mint needs somewhere for its harvest to go
    pub fn require_stream_routes(&self, routed: &[bool; MAX_STREAMS]) -> Result<()> {
        for stream in 0..MAX_STREAMS {
            if self.reward_mints[stream] != Pubkey::default() {
                require!(routed[stream], HubError::InvalidRemainingAccounts);
            }
        }
        Ok(())
    }

    /// Hand out the next pool id
    pub fn next_pool_id(&mut self) -> Result<u32> {
        let id = self.pool_count;
        self.pool_count = id.checked_add(1).ok_or(error!(HubError::MathOverflow))?;
        Ok(id)
    }
}
