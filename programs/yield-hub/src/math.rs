//! Checked fixed-point helpers shared by the accounting core.
//!
//! Every division truncates toward zero; intermediates are widened to u128.

use anchor_lang::prelude::*;

use crate::{
    constants::{ACC_PRECISION, BPS_DENOMINATOR},
    errors::HubError,
};

/// floor(a * b / c)
pub fn mul_div(a: u64, b: u64, c: u64) -> Result<u64> {
    let value = (a as u128)
        .checked_mul(b as u128)
        .ok_or(error!(HubError::MathOverflow))?
        .checked_div(c as u128)
        .ok_or(error!(HubError::DivisionByZero))?;

    u64::try_from(value).map_err(|_| error!(HubError::MathOverflow))
}

/// Basis-point cut of `amount`
pub fn apply_bps(amount: u64, bps: u16) -> Result<u64> {
    mul_div(amount, bps as u64, BPS_DENOMINATOR)
}

/// Accumulator increase for distributing `amount` over `total_shares`
pub fn acc_increment(amount: u64, total_shares: u64) -> Result<u128> {
    (amount as u128)
        .checked_mul(ACC_PRECISION)
        .ok_or(error!(HubError::MathOverflow))?
        .checked_div(total_shares as u128)
        .ok_or(error!(HubError::DivisionByZero))
}

/// Reward accumulated by `shares` at accumulator value `acc`
///
/// Exactly `floor(shares * acc / ACC_PRECISION)`, split into whole and
/// fractional parts of `acc` so the product never exceeds the result.
pub fn accumulated(shares: u64, acc: u128) -> Result<u128> {
    let shares = shares as u128;
    let whole = shares
        .checked_mul(acc / ACC_PRECISION)
        .ok_or(error!(HubError::MathOverflow))?;
    // shares < 2^64 and the remainder < 2^40, so this cannot overflow
    let fraction = shares * (acc % ACC_PRECISION) / ACC_PRECISION;

    whole
        .checked_add(fraction)
        .ok_or(error!(HubError::MathOverflow))
}

pub fn to_u64(value: u128) -> Result<u64> {
    u64::try_from(value).map_err(|_| error!(HubError::MathOverflow))
}

pub fn add(a: u64, b: u64) -> Result<u64> {
    a.checked_add(b).ok_or(error!(HubError::MathOverflow))
}

pub fn sub(a: u64, b: u64) -> Result<u64> {
    a.checked_sub(b).ok_or(error!(HubError::MathOverflow))
}
