use anchor_lang::prelude::*;

use crate::{
    constants::*,
    errors::HubError,
    integrations::{Farm, Router},
    math::{add, apply_bps, sub},
};

/// Farm integration family
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq, InitSpace)]
pub enum StrategyKind {
    /// Single-asset farm; harvest is swapped back into the want asset
    SingleAsset,
    /// Liquidity-pair farm; harvest is split across both sides and re-added
    PairedLiquidity,
    /// No compounding; harvest is distributed to holders as reward stream 0
    StakeOnly,
}

impl StrategyKind {
    /// Whether harvests can be turned back into want
    pub fn compounds(&self) -> bool {
        *self != StrategyKind::StakeOnly
    }
}

/// Construction parameters supplied at registration
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq)]
pub struct StrategyParams {
    pub kind: StrategyKind,
    pub earned_mint: Pubkey,
    pub base_mints: [Pubkey; 2],
    pub farm_program: Pubkey,
    pub router_program: Pubkey,
    pub funds_account: Pubkey,
    pub custodian_account: Pubkey,
}

/// Strategy custody and compounding state for one pool
///
/// Invariant: `shares_total` equals the pool's `total_shares`.
#[account]
#[derive(InitSpace, Debug)]
pub struct StrategyState {
    pub hub: Pubkey,
    pub pool: Pubkey,
    pub kind: StrategyKind,

    /// Asset accepted by the pool and staked at the farm
    pub want_mint: Pubkey,

    /// Farm-native reward asset
    pub earned_mint: Pubkey,

    /// Pair constituents for `PairedLiquidity`, unused otherwise
    pub base_mints: [Pubkey; 2],

    pub farm_program: Pubkey,
    pub router_program: Pubkey,

    /// Want staked at the farm plus idle buffer
    pub want_locked_total: u64,

    /// Shares issued to the pool
    pub shares_total: u64,

    /// Harvest cut sent to the funds account
    pub controller_fee_bps: u16,

    /// Harvest cut sent to the custodian account for buyback
    pub buyback_bps: u16,

    /// Cut of every withdrawal paid to the funds account
    pub withdraw_fee_bps: u16,

    /// Part of the post-fee harvest that is compounded, the rest is distributed
    pub reinvest_bps: u16,

    pub paused: bool,

    /// Owner of the fee-receiving token accounts
    pub funds_account: Pubkey,

    /// Owner of the buyback token accounts
    pub custodian_account: Pubkey,

    pub last_earn_slot: u64,

    pub bump: u8,
    pub authority_bump: u8,
}

/// Result of unstaking want for a withdrawal
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WithdrawOutcome {
    /// Proportional want removed from the locked total
    pub requested: u64,
    /// Want the farm returned
    pub returned: u64,
    pub fee: u64,
    pub payout: u64,
}

/// Result of one compounding round
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EarnOutcome {
    pub harvested: [u64; MAX_STREAMS],
    pub controller_fee: u64,
    pub buyback: u64,
    /// Earned asset routed into want
    pub reinvested: u64,
    /// Want re-staked at the farm
    pub compounded: u64,
    /// Reward handed to the pool's streams
    pub distributed: [u64; MAX_STREAMS],
}

impl EarnOutcome {
    pub fn is_noop(&self) -> bool {
        self.harvested.iter().all(|amount| *amount == 0)
    }
}

impl StrategyState {
    pub fn new(hub: Pubkey, pool: Pubkey, want_mint: Pubkey, params: &StrategyParams) -> Self {
        let reinvest_bps = if params.kind.compounds() {
            BPS_DENOMINATOR as u16
        } else {
            0
        };

        Self {
            hub,
            pool,
            kind: params.kind,
            want_mint,
            earned_mint: params.earned_mint,
            base_mints: params.base_mints,
            farm_program: params.farm_program,
            router_program: params.router_program,
            want_locked_total: 0,
            shares_total: 0,
            controller_fee_bps: DEFAULT_CONTROLLER_FEE_BPS,
            buyback_bps: DEFAULT_BUYBACK_BPS,
            withdraw_fee_bps: DEFAULT_WITHDRAW_FEE_BPS,
            reinvest_bps,
            paused: false,
            funds_account: params.funds_account,
            custodian_account: params.custodian_account,
            last_earn_slot: 0,
            bump: 0,
            authority_bump: 0,
        }
    }

    pub fn require_active(&self) -> Result<()> {
        require!(!self.paused, HubError::StrategyPaused);
        Ok(())
    }

    pub fn pause(&mut self) -> Result<()> {
        require!(!self.paused, HubError::InvalidParameter);
        self.paused = true;
        Ok(())
    }

    pub fn unpause(&mut self) -> Result<()> {
        require!(self.paused, HubError::InvalidParameter);
        self.paused = false;
        Ok(())
    }

    pub fn set_harvest_fees(
        &mut self,
        controller_fee_bps: u16,
        buyback_bps: u16,
        ceiling: u16,
    ) -> Result<()> {
        let combined = controller_fee_bps
            .checked_add(buyback_bps)
            .ok_or(error!(HubError::InvalidParameter))?;
        require!(combined <= ceiling, HubError::InvalidParameter);

        self.controller_fee_bps = controller_fee_bps;
        self.buyback_bps = buyback_bps;
        Ok(())
    }

    pub fn set_withdraw_fee(&mut self, withdraw_fee_bps: u16, ceiling: u16) -> Result<()> {
        require!(withdraw_fee_bps <= ceiling, HubError::InvalidParameter);
        self.withdraw_fee_bps = withdraw_fee_bps;
        Ok(())
    }

    pub fn set_reinvest_rate(&mut self, reinvest_bps: u16) -> Result<()> {
        require!(
            reinvest_bps as u64 <= BPS_DENOMINATOR,
            HubError::InvalidParameter
        );
        // stake-only farms have nothing to compound into
        require!(
            self.kind != StrategyKind::StakeOnly || reinvest_bps == 0,
            HubError::InvalidParameter
        );
        self.reinvest_bps = reinvest_bps;
        Ok(())
    }

    /// Stake freshly deposited want, returning the net amount credited
    pub fn stake_want<F: Farm>(&mut self, farm: &mut F, amount: u64) -> Result<u64> {
        self.require_active()?;
        require!(amount > 0, HubError::InsufficientAmount);

        let net = farm.stake(amount)?;
        require!(net <= amount, HubError::ExternalCallFailed);
        require!(net > 0, HubError::InsufficientAmount);

        self.want_locked_total = add(self.want_locked_total, net)?;
        Ok(net)
    }

    /// Unstake `amount` of want for a withdrawal and apply the withdrawal fee
    ///
    /// Allowed while paused.
    pub fn unstake_want<F: Farm>(&mut self, farm: &mut F, amount: u64) -> Result<WithdrawOutcome> {
        require!(amount > 0, HubError::InsufficientAmount);

        let returned = farm.unstake(amount)?;
        require!(returned <= amount, HubError::ExternalCallFailed);

        self.want_locked_total = sub(self.want_locked_total, amount)?;

        let fee = apply_bps(returned, self.withdraw_fee_bps)?;
        Ok(WithdrawOutcome {
            requested: amount,
            returned,
            fee,
            payout: sub(returned, fee)?,
        })
    }

    pub fn issue_shares(&mut self, shares: u64) -> Result<()> {
        self.shares_total = add(self.shares_total, shares)?;
        Ok(())
    }

    pub fn burn_shares(&mut self, shares: u64) -> Result<()> {
        self.shares_total = sub(self.shares_total, shares)?;
        Ok(())
    }

    /// Harvest, take fees, compound and hand the rest to the reward streams
    ///
    /// Nothing to harvest, or no shares outstanding, is a no-op.
    pub fn earn<F: Farm, R: Router>(
        &mut self,
        farm: &mut F,
        router: &mut R,
        min_want_out: u64,
        slot: u64,
    ) -> Result<EarnOutcome> {
        self.require_active()?;

        let mut outcome = EarnOutcome::default();
        if self.shares_total == 0 {
            return Ok(outcome);
        }
        if farm.pending_rewards()?.iter().all(|amount| *amount == 0) {
            return Ok(outcome);
        }

        let harvested = farm.harvest()?;
        self.last_earn_slot = slot;
        outcome.harvested = harvested;
        outcome.distributed = harvested;
        if outcome.is_noop() {
            return Ok(outcome);
        }

        let earned = harvested[FARM_STREAM];
        outcome.controller_fee = apply_bps(earned, self.controller_fee_bps)?;
        outcome.buyback = apply_bps(earned, self.buyback_bps)?;

        let remainder = sub(sub(earned, outcome.controller_fee)?, outcome.buyback)?;
        outcome.reinvested = apply_bps(remainder, self.reinvest_bps)?;
        outcome.distributed[FARM_STREAM] = sub(remainder, outcome.reinvested)?;

        if outcome.reinvested > 0 {
            let want = self.convert_to_want(router, outcome.reinvested, min_want_out)?;
            if want > 0 {
                let staked = farm.stake(want)?;
                require!(staked <= want, HubError::ExternalCallFailed);
                self.want_locked_total = add(self.want_locked_total, staked)?;
                outcome.compounded = staked;
            }
        }

        Ok(outcome)
    }

    /// Turn base assets into the pair's liquidity token
    ///
    /// `amounts` follows the zap layout: 0 = base A, 1 = base B,
    /// 2 = minimum liquidity out. A one-sided amount is half-swapped first.
    pub fn zap_in<R: Router>(&self, router: &mut R, amounts: &[u64; ZAP_SLOTS]) -> Result<u64> {
        require!(
            self.kind == StrategyKind::PairedLiquidity,
            HubError::InvalidPayload
        );
        self.require_active()?;

        let [base_a, base_b] = self.base_mints;
        let (mut amount_a, mut amount_b, min_out) = (amounts[0], amounts[1], amounts[2]);
        require!(amount_a > 0 || amount_b > 0, HubError::InsufficientAmount);

        if amount_b == 0 {
            let half = amount_a / 2;
            amount_b = router.swap(&base_a, &base_b, half, 0)?;
            amount_a = sub(amount_a, half)?;
        } else if amount_a == 0 {
            let half = amount_b / 2;
            amount_a = router.swap(&base_b, &base_a, half, 0)?;
            amount_b = sub(amount_b, half)?;
        }

        let liquidity = router.add_liquidity(amount_a, amount_b, min_out)?;
        check_min_out(liquidity, min_out)
    }

    fn convert_to_want<R: Router>(
        &self,
        router: &mut R,
        amount: u64,
        min_out: u64,
    ) -> Result<u64> {
        let want = match self.kind {
            StrategyKind::SingleAsset => {
                if self.earned_mint == self.want_mint {
                    amount
                } else {
                    router.swap(&self.earned_mint, &self.want_mint, amount, min_out)?
                }
            }
            StrategyKind::PairedLiquidity => {
                let [base_a, base_b] = self.base_mints;
                let half = amount / 2;
                let rest = sub(amount, half)?;

                let amount_a = if self.earned_mint == base_a {
                    half
                } else {
                    router.swap(&self.earned_mint, &base_a, half, 0)?
                };
                let amount_b = if self.earned_mint == base_b {
                    rest
                } else {
                    router.swap(&self.earned_mint, &base_b, rest, 0)?
                };
                router.add_liquidity(amount_a, amount_b, min_out)?
            }
            StrategyKind::StakeOnly => return err!(HubError::InvalidParameter),
        };

        check_min_out(want, min_out)
    }
}

fn check_min_out(amount_out: u64, min_out: u64) -> Result<u64> {
    require!(amount_out >= min_out, HubError::ExternalCallFailed);
    Ok(amount_out)
}
