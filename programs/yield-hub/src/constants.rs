// Constants for the Yield Hub program

/// Seed for the hub configuration PDA
pub const HUB_SEED: &[u8] = b"hub";

/// Seed for the hub authority PDA (owner of every pool reward vault)
pub const HUB_AUTHORITY_SEED: &[u8] = b"hub_authority";

/// Seed for pool state PDAs
pub const POOL_SEED: &[u8] = b"pool";

/// Seed for strategy state PDAs
pub const STRATEGY_SEED: &[u8] = b"strategy";

/// Seed for the strategy authority PDA (custodian of want and earned vaults)
pub const STRATEGY_AUTHORITY_SEED: &[u8] = b"strategy_authority";

/// Seed for user position PDAs
pub const POSITION_SEED: &[u8] = b"position";

/// Number of independently accruing reward streams per pool
pub const MAX_STREAMS: usize = 3;

/// Stream fed by the farm-native reward token
pub const FARM_STREAM: usize = 0;

/// Slots in the liquidity zap command payload
pub const ZAP_SLOTS: usize = 5;

/// Fixed-point scale of `acc_reward_per_share`
pub const ACC_PRECISION: u128 = 1_000_000_000_000;

/// 100% in basis points
pub const BPS_DENOMINATOR: u64 = 10_000;

/// Hard upper bound for the combined controller + buyback cut
pub const MAX_HARVEST_FEE_CEILING_BPS: u16 = 10_000;

/// Hard upper bound for the withdrawal fee (1%)
pub const MAX_WITHDRAW_FEE_CEILING_BPS: u16 = 100;

pub const DEFAULT_CONTROLLER_FEE_BPS: u16 = 0;
pub const DEFAULT_BUYBACK_BPS: u16 = 0;

/// 0.02% charged on withdrawals unless governance changes it
pub const DEFAULT_WITHDRAW_FEE_BPS: u16 = 2;
