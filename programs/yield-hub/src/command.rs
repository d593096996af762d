//! Strategy commands accepted by the hub dispatcher.
//!
//! The dispatcher forwards a Borsh-encoded `StrategyCommand` without looking
//! at it; the pool's strategy decodes it once and checks it against its
//! family before anything is mutated.

use anchor_lang::prelude::*;

use crate::{
    constants::ZAP_SLOTS,
    errors::HubError,
    state::StrategyKind,
};

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq, Eq)]
pub enum StrategyCommand {
    /// Deposit the want asset directly
    DepositWant { amount: u64 },

    /// Provide one or both base assets of a pair, auto-balanced into liquidity
    ///
    /// Slots: 0 = base A, 1 = base B, 2 = minimum liquidity out, 3..5 reserved.
    AddLiquiditySplit { amounts: [u64; ZAP_SLOTS] },

    /// Run a compounding round
    Compound { min_want_out: u64 },
}

impl StrategyCommand {
    /// Decode a dispatcher payload, rejecting trailing bytes
    pub fn decode(payload: &[u8]) -> Result<Self> {
        Self::try_from_slice(payload).map_err(|_| error!(HubError::InvalidPayload))
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut payload = Vec::new();
        self.serialize(&mut payload)
            .map_err(|_| error!(HubError::InvalidPayload))?;
        Ok(payload)
    }

    /// Check the command is meaningful for a strategy family
    pub fn validate_for(&self, kind: StrategyKind) -> Result<()> {
        match self {
            Self::DepositWant { amount } => {
                require!(*amount > 0, HubError::InsufficientAmount);
            }
            Self::AddLiquiditySplit { amounts } => {
                require!(
                    kind == StrategyKind::PairedLiquidity,
                    HubError::InvalidPayload
                );
                require!(
                    amounts[3..].iter().all(|reserved| *reserved == 0),
                    HubError::InvalidPayload
                );
            }
            Self::Compound { .. } => {}
        }
        Ok(())
    }

    /// Whether the command credits want to the caller's position
    pub fn deposits(&self) -> bool {
        !matches!(self, Self::Compound { .. })
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::DepositWant { .. } => "deposit_want",
            Self::AddLiquiditySplit { .. } => "add_liquidity_split",
            Self::Compound { .. } => "compound",
        }
    }
}
