use anchor_lang::prelude::*;

use crate::constants::MAX_STREAMS;

/// Event emitted when the hub is initialized
#[event]
pub struct HubInitialized {
    pub hub: Pubkey,
    pub admin: Pubkey,
    pub fee_governor: Pubkey,
    pub guardian: Pubkey,
    pub reward_mints: [Pubkey; MAX_STREAMS],
    pub timestamp: i64,
}

/// Event emitted when governance principals or the emission schedule change
#[event]
pub struct HubConfigUpdated {
    pub hub: Pubkey,
    pub admin: Pubkey,
    pub fee_governor: Pubkey,
    pub guardian: Pubkey,
    pub reward_per_slot: [u64; MAX_STREAMS],
    pub timestamp: i64,
}

/// Event emitted when a pool is registered
#[event]
pub struct PoolAdded {
    pub hub: Pubkey,
    pub pool: Pubkey,
    pub pool_id: u32,
    pub want_mint: Pubkey,
    pub alloc_weights: [u64; MAX_STREAMS],
    pub timestamp: i64,
}

#[event]
pub struct PoolWeightsUpdated {
    pub pool: Pubkey,
    pub alloc_weights: [u64; MAX_STREAMS],
    pub total_alloc_weight: [u64; MAX_STREAMS],
    pub timestamp: i64,
}

#[event]
pub struct PoolPausedChanged {
    pub pool: Pubkey,
    pub paused: bool,
    pub timestamp: i64,
}

/// Event emitted when a strategy is attached to a pool
#[event]
pub struct StrategyRegistered {
    pub pool: Pubkey,
    pub strategy: Pubkey,
    pub kind: u8,
    pub want_mint: Pubkey,
    pub earned_mint: Pubkey,
    pub timestamp: i64,
}

/// Event emitted when any strategy fee or fee destination changes
#[event]
pub struct StrategyFeesUpdated {
    pub strategy: Pubkey,
    pub controller_fee_bps: u16,
    pub buyback_bps: u16,
    pub withdraw_fee_bps: u16,
    pub reinvest_bps: u16,
    pub funds_account: Pubkey,
    pub custodian_account: Pubkey,
    pub timestamp: i64,
}

#[event]
pub struct StrategyPausedChanged {
    pub strategy: Pubkey,
    pub paused: bool,
    pub timestamp: i64,
}

/// Event emitted when a reward vault is topped up
#[event]
pub struct StreamFunded {
    pub hub: Pubkey,
    pub funder: Pubkey,
    pub stream: u8,
    pub amount: u64,
    pub vault_balance: u64,
    pub timestamp: i64,
}

/// Event emitted when want is deposited
#[event]
pub struct Deposited {
    pub pool: Pubkey,
    pub owner: Pubkey,
    pub amount: u64,
    pub net_amount: u64,
    pub shares_minted: u64,
    pub total_shares: u64,
    pub total_locked: u64,
    pub timestamp: i64,
}

/// Event emitted when shares are redeemed
#[event]
pub struct Withdrawn {
    pub pool: Pubkey,
    pub owner: Pubkey,
    pub shares_burned: u64,
    pub payout: u64,
    pub fee: u64,
    pub total_shares: u64,
    pub total_locked: u64,
    pub timestamp: i64,
}

/// Event emitted when a position is exited without its rewards
#[event]
pub struct EmergencyWithdrawn {
    pub pool: Pubkey,
    pub owner: Pubkey,
    pub shares_burned: u64,
    pub payout: u64,
    pub forfeited: [u64; MAX_STREAMS],
    pub timestamp: i64,
}

#[event]
pub struct RewardsClaimed {
    pub pool: Pubkey,
    pub owner: Pubkey,
    pub amounts: [u64; MAX_STREAMS],
    pub timestamp: i64,
}

/// Event emitted after a compounding round
#[event]
pub struct Earned {
    pub pool: Pubkey,
    pub strategy: Pubkey,
    pub caller: Pubkey,
    pub harvested: [u64; MAX_STREAMS],
    pub controller_fee: u64,
    pub buyback: u64,
    pub compounded: u64,
    pub distributed: [u64; MAX_STREAMS],
    pub total_locked: u64,
    pub timestamp: i64,
}

/// Event emitted when the hub dispatches a strategy command
#[event]
pub struct CommandExecuted {
    pub pool: Pubkey,
    pub caller: Pubkey,
    pub command: String,
    pub timestamp: i64,
}
