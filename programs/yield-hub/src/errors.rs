use anchor_lang::prelude::*;

/// Custom error codes for the Yield Hub program
#[error_code]
pub enum HubError {
    #[msg("Parameter out of bounds")]
    InvalidParameter,

    #[msg("Amount too small - would mint or withdraw nothing")]
    InsufficientAmount,

    #[msg("Unauthorized - caller is not the principal for this action")]
    Unauthorized,

    #[msg("Pool is paused")]
    PoolPaused,

    #[msg("Strategy is paused")]
    StrategyPaused,

    #[msg("Strategy command payload could not be decoded for this strategy")]
    InvalidPayload,

    #[msg("External farm or router call failed")]
    ExternalCallFailed,

    #[msg("Reentrant call into a pool mutation path")]
    Reentrancy,

    #[msg("Math overflow occurred during calculation")]
    MathOverflow,

    #[msg("Cannot divide by zero")]
    DivisionByZero,

    #[msg("Invalid token mint for this pool or strategy")]
    InvalidMint,

    #[msg("Invalid token account owner")]
    InvalidOwner,

    #[msg("Account does not belong to this pool")]
    PoolMismatch,

    #[msg("Strategy account does not match the pool's strategy")]
    StrategyMismatch,

    #[msg("Reward stream index out of range")]
    InvalidStream,

    #[msg("Remaining accounts do not match the expected layout")]
    InvalidRemainingAccounts,

    #[msg("Pool already holds shares - strategy cannot be replaced")]
    PoolNotEmpty,

    #[msg("Share accounting out of sync between pool and strategy")]
    AccountingMismatch,
}
