//! External collaborators of a strategy.
//!
//! The accounting core only sees these traits. On-chain they are backed by
//! CPI adapters (`cpi_farm`, `cpi_router`); tests back them with in-memory
//! fakes. Every call either returns an amount or fails, and a failure aborts
//! the whole operation.

use anchor_lang::prelude::*;

use crate::constants::MAX_STREAMS;

pub mod cpi;
pub mod cpi_farm;
pub mod cpi_router;

pub use cpi_farm::*;
pub use cpi_router::*;

/// Yield farm a strategy stakes its want asset into
pub trait Farm {
    /// Stake `amount` of want, returning what the farm actually credited
    fn stake(&mut self, amount: u64) -> Result<u64>;

    /// Unstake `amount` of want, returning what actually came back
    fn unstake(&mut self, amount: u64) -> Result<u64>;

    /// Rewards claimable right now, indexed by reward stream
    fn pending_rewards(&self) -> Result<[u64; MAX_STREAMS]>;

    /// Collect rewards, indexed by reward stream
    fn harvest(&mut self) -> Result<[u64; MAX_STREAMS]>;
}

/// Swap router / liquidity provider
pub trait Router {
    /// Swap `amount_in` of `from` into `to`; must fail below `min_out`
    fn swap(&mut self, from: &Pubkey, to: &Pubkey, amount_in: u64, min_out: u64) -> Result<u64>;

    /// Provide both sides of a pair and return the liquidity received
    fn add_liquidity(&mut self, amount_a: u64, amount_b: u64, min_out: u64) -> Result<u64>;
}
