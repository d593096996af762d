use anchor_lang::{error::Error, prelude::*};
use yield_hub::{
    command::StrategyCommand,
    constants::MAX_STREAMS,
    engine::{self, DepositReceipt, EarnReceipt, ExecuteReceipt, PoolAccounts, WithdrawReceipt},
    errors::HubError,
    integrations::{Farm, Router},
    state::*,
};

#[derive(Default)]
struct MockFarm {
    staked: u64,
    rewards: [u64; MAX_STREAMS],
    fail: bool,
}

impl MockFarm {
    fn check(&self) -> Result<()> {
        require!(!self.fail, HubError::ExternalCallFailed);
        Ok(())
    }
}

impl Farm for MockFarm {
    fn stake(&mut self, amount: u64) -> Result<u64> {
        self.check()?;
        self.staked += amount;
        Ok(amount)
    }

    fn unstake(&mut self, amount: u64) -> Result<u64> {
        self.check()?;
        self.staked -= amount;
        Ok(amount)
    }

    fn pending_rewards(&self) -> Result<[u64; MAX_STREAMS]> {
        Ok(self.rewards)
    }

    fn harvest(&mut self) -> Result<[u64; MAX_STREAMS]> {
        self.check()?;
        Ok(std::mem::take(&mut self.rewards))
    }
}

/// Swaps at `rate_bps / 10_000`; liquidity is the smaller side
struct MockRouter {
    rate_bps: u64,
}

impl Router for MockRouter {
    fn swap(&mut self, _from: &Pubkey, _to: &Pubkey, amount_in: u64, min_out: u64) -> Result<u64> {
        let out = amount_in * self.rate_bps / 10_000;
        require!(out >= min_out, HubError::ExternalCallFailed);
        Ok(out)
    }

    fn add_liquidity(&mut self, amount_a: u64, amount_b: u64, min_out: u64) -> Result<u64> {
        let out = amount_a.min(amount_b);
        require!(out >= min_out, HubError::ExternalCallFailed);
        Ok(out)
    }
}

struct Hub {
    config: HubConfig,
    key: Pubkey,
    admin: Pubkey,
    fee_governor: Pubkey,
    guardian: Pubkey,
}

struct Vault {
    key: Pubkey,
    pool: PoolState,
    strategy: StrategyState,
    farm: MockFarm,
    router: MockRouter,
}

impl Hub {
    fn new(reward_per_slot: [u64; MAX_STREAMS]) -> Self {
        let (admin, fee_governor, guardian) =
            (Pubkey::new_unique(), Pubkey::new_unique(), Pubkey::new_unique());
        let config = HubConfig {
            admin,
            fee_governor,
            guardian,
            pool_count: 0,
            reward_mints: [Pubkey::new_unique(), Pubkey::new_unique(), Pubkey::new_unique()],
            reward_per_slot,
            total_alloc_weight: [0; MAX_STREAMS],
            max_harvest_fee_bps: 1_000,
            max_withdraw_fee_bps: 100,
            bump: 255,
            authority_bump: 254,
        };

        Self {
            config,
            key: Pubkey::new_unique(),
            admin,
            fee_governor,
            guardian,
        }
    }

    /// Register a pool with an attached strategy and no withdrawal fee
    fn add_vault(&mut self, kind: StrategyKind, alloc_weights: [u64; MAX_STREAMS]) -> Vault {
        let want_mint = Pubkey::new_unique();
        let mut pool = engine::add_pool(
            &mut self.config,
            &self.admin,
            self.key,
            want_mint,
            alloc_weights,
            0,
        )
        .unwrap();

        let key = Pubkey::new_unique();
        let params = StrategyParams {
            kind,
            earned_mint: self.config.reward_mints[0],
            base_mints: [Pubkey::new_unique(), Pubkey::new_unique()],
            farm_program: Pubkey::new_unique(),
            router_program: Pubkey::new_unique(),
            funds_account: Pubkey::new_unique(),
            custodian_account: Pubkey::new_unique(),
        };
        let mut strategy = StrategyState::new(self.key, key, want_mint, &params);
        engine::set_withdraw_fee(&self.config, &self.fee_governor, &mut strategy, 0).unwrap();
        engine::attach_strategy(
            &self.config,
            &self.admin,
            &mut pool,
            Pubkey::new_unique(),
            &strategy,
        )
        .unwrap();

        Vault {
            key,
            pool,
            strategy,
            farm: MockFarm::default(),
            router: MockRouter { rate_bps: 10_000 },
        }
    }
}

impl Vault {
    fn position(&self) -> UserPosition {
        UserPosition::new(self.key, Pubkey::new_unique())
    }

    fn deposit(
        &mut self,
        hub: &Hub,
        position: &mut UserPosition,
        amount: u64,
        slot: u64,
    ) -> Result<DepositReceipt> {
        let accounts = PoolAccounts {
            hub: &hub.config,
            pool: &mut self.pool,
            strategy: &mut self.strategy,
        };
        engine::deposit(accounts, position, &mut self.farm, amount, slot)
    }

    fn withdraw(
        &mut self,
        hub: &Hub,
        position: &mut UserPosition,
        shares: u64,
        slot: u64,
    ) -> Result<WithdrawReceipt> {
        let accounts = PoolAccounts {
            hub: &hub.config,
            pool: &mut self.pool,
            strategy: &mut self.strategy,
        };
        engine::withdraw(accounts, position, &mut self.farm, shares, slot)
    }

    fn withdraw_all(
        &mut self,
        hub: &Hub,
        position: &mut UserPosition,
        slot: u64,
    ) -> Result<WithdrawReceipt> {
        let accounts = PoolAccounts {
            hub: &hub.config,
            pool: &mut self.pool,
            strategy: &mut self.strategy,
        };
        engine::withdraw_all(accounts, position, &mut self.farm, slot)
    }

    fn emergency_withdraw(
        &mut self,
        hub: &Hub,
        position: &mut UserPosition,
        slot: u64,
    ) -> Result<WithdrawReceipt> {
        let accounts = PoolAccounts {
            hub: &hub.config,
            pool: &mut self.pool,
            strategy: &mut self.strategy,
        };
        engine::emergency_withdraw(accounts, position, &mut self.farm, slot)
    }

    fn earn(&mut self, hub: &Hub, min_want_out: u64, slot: u64) -> Result<EarnReceipt> {
        let accounts = PoolAccounts {
            hub: &hub.config,
            pool: &mut self.pool,
            strategy: &mut self.strategy,
        };
        engine::earn(accounts, &mut self.farm, &mut self.router, min_want_out, slot)
    }

    fn execute(
        &mut self,
        hub: &Hub,
        position: &mut UserPosition,
        payload: &[u8],
        slot: u64,
    ) -> Result<(StrategyCommand, ExecuteReceipt)> {
        let accounts = PoolAccounts {
            hub: &hub.config,
            pool: &mut self.pool,
            strategy: &mut self.strategy,
        };
        engine::execute(
            accounts,
            position,
            &mut self.farm,
            &mut self.router,
            payload,
            slot,
        )
    }

    fn claim(&mut self, hub: &Hub, position: &mut UserPosition, slot: u64) -> Result<[u64; MAX_STREAMS]> {
        engine::claim(&hub.config, &mut self.pool, position, slot)
    }

    fn pending(&self, hub: &Hub, position: &UserPosition, slot: u64) -> [u64; MAX_STREAMS] {
        engine::pending(&hub.config, &self.pool, position, slot).unwrap()
    }

    /// Debug snapshot of everything an operation may touch
    fn snapshot(&self, position: &UserPosition) -> String {
        format!("{:?} {:?} {:?}", self.pool, self.strategy, position)
    }

    fn assert_conserved(&self, positions: &[&UserPosition]) {
        let held: u64 = positions.iter().map(|position| position.shares).sum();
        assert_eq!(held, self.pool.total_shares);
        assert_eq!(self.pool.total_shares, self.strategy.shares_total);
        assert_eq!(self.pool.total_locked, self.strategy.want_locked_total);
        assert_eq!(self.pool.total_shares == 0, self.pool.total_locked == 0);
    }
}

fn error_code<T: std::fmt::Debug>(result: Result<T>) -> u32 {
    match result.expect_err("operation should fail") {
        Error::AnchorError(err) => err.error_code_number,
        Error::ProgramError(err) => panic!("unexpected program error: {:?}", err),
    }
}

fn code(error: HubError) -> u32 {
    u32::from(error)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compounding_reprices_later_deposits() {
        let mut hub = Hub::new([0; MAX_STREAMS]);
        let mut vault = hub.add_vault(StrategyKind::SingleAsset, [1, 0, 0]);
        let mut alice = vault.position();
        let mut bob = vault.position();

        // First deposit is 1:1
        let receipt = vault.deposit(&hub, &mut alice, 500, 0).unwrap();
        assert_eq!(receipt.shares_minted, 500);

        // 100 of harvest compounded back into want
        vault.farm.rewards = [100, 0, 0];
        let earned = vault.earn(&hub, 0, 1).unwrap();
        assert_eq!(earned.outcome.compounded, 100);
        assert_eq!(vault.pool.total_locked, 600);

        // 500 * 500 / 600 = 416.67, floored
        let receipt = vault.deposit(&hub, &mut bob, 500, 2).unwrap();
        assert_eq!(receipt.shares_minted, 416);
        assert_eq!(vault.pool.total_shares, 916);
        assert_eq!(vault.pool.total_locked, 1100);

        // rounding stays with the earlier holder
        let alice_stake = engine::staked_want_tokens(&vault.pool, &alice).unwrap();
        assert_eq!(alice_stake.total, 600);
        assert_eq!(alice_stake.principal, 500);
        let bob_stake = engine::staked_want_tokens(&vault.pool, &bob).unwrap();
        assert_eq!(bob_stake.total, 499);
        assert_eq!(bob_stake.principal, 500);

        vault.assert_conserved(&[&alice, &bob]);
    }

    #[test]
    fn test_deposit_minting_zero_shares_fails_without_change() {
        let mut hub = Hub::new([0; MAX_STREAMS]);
        let mut vault = hub.add_vault(StrategyKind::SingleAsset, [1, 0, 0]);
        let mut alice = vault.position();
        vault.deposit(&hub, &mut alice, 500, 0).unwrap();
        vault.farm.rewards = [100, 0, 0];
        vault.earn(&hub, 0, 1).unwrap();

        let mut bob = vault.position();
        let before = vault.snapshot(&bob);
        let result = vault.deposit(&hub, &mut bob, 1, 2);
        assert_eq!(error_code(result), code(HubError::InsufficientAmount));
        assert_eq!(vault.snapshot(&bob), before);

        let result = vault.deposit(&hub, &mut bob, 0, 2);
        assert_eq!(error_code(result), code(HubError::InsufficientAmount));
    }

    #[test]
    fn test_shares_conserved_across_operations() {
        let mut hub = Hub::new([5, 0, 0]);
        let mut vault = hub.add_vault(StrategyKind::SingleAsset, [1, 0, 0]);
        let (mut a, mut b, mut c) = (vault.position(), vault.position(), vault.position());

        vault.deposit(&hub, &mut a, 1_000, 0).unwrap();
        vault.deposit(&hub, &mut b, 333, 1).unwrap();
        vault.assert_conserved(&[&a, &b, &c]);

        vault.farm.rewards = [77, 0, 0];
        vault.earn(&hub, 0, 2).unwrap();
        vault.deposit(&hub, &mut c, 250, 3).unwrap();
        vault.assert_conserved(&[&a, &b, &c]);

        vault.withdraw(&hub, &mut a, 400, 4).unwrap();
        vault.withdraw_all(&hub, &mut b, 5).unwrap();
        vault.assert_conserved(&[&a, &b, &c]);

        vault.emergency_withdraw(&hub, &mut c, 6).unwrap();
        vault.withdraw_all(&hub, &mut a, 7).unwrap();
        vault.assert_conserved(&[&a, &b, &c]);
        assert_eq!(vault.pool.total_shares, 0);
        assert_eq!(vault.pool.total_locked, 0);
    }

    #[test]
    fn test_rewards_split_by_share() {
        let mut hub = Hub::new([40, 0, 0]);
        let mut vault = hub.add_vault(StrategyKind::SingleAsset, [1, 0, 0]);
        let (mut a, mut b) = (vault.position(), vault.position());

        vault.deposit(&hub, &mut a, 100, 0).unwrap();
        vault.deposit(&hub, &mut b, 300, 0).unwrap();

        assert_eq!(vault.pending(&hub, &a, 10), [100, 0, 0]);
        assert_eq!(vault.pending(&hub, &b, 10), [300, 0, 0]);
    }

    #[test]
    fn test_late_depositor_earns_nothing_from_the_past() {
        let mut hub = Hub::new([10, 0, 0]);
        let mut vault = hub.add_vault(StrategyKind::SingleAsset, [1, 0, 0]);
        let (mut a, mut b) = (vault.position(), vault.position());

        vault.deposit(&hub, &mut a, 100, 0).unwrap();
        vault.deposit(&hub, &mut b, 100, 10).unwrap();

        assert_eq!(vault.pending(&hub, &b, 10), [0, 0, 0]);
        assert_eq!(vault.pending(&hub, &a, 10), [100, 0, 0]);

        assert_eq!(vault.pending(&hub, &a, 20), [150, 0, 0]);
        assert_eq!(vault.pending(&hub, &b, 20), [50, 0, 0]);
    }

    #[test]
    fn test_pending_is_a_pure_read() {
        let mut hub = Hub::new([10, 0, 0]);
        let mut vault = hub.add_vault(StrategyKind::SingleAsset, [1, 0, 0]);
        let mut a = vault.position();
        vault.deposit(&hub, &mut a, 100, 0).unwrap();

        let before = vault.snapshot(&a);
        assert_eq!(vault.pending(&hub, &a, 7), [70, 0, 0]);
        assert_eq!(vault.snapshot(&a), before);
    }

    #[test]
    fn test_claim_is_idempotent() {
        let mut hub = Hub::new([10, 0, 0]);
        let mut vault = hub.add_vault(StrategyKind::SingleAsset, [1, 0, 0]);
        let mut a = vault.position();
        vault.deposit(&hub, &mut a, 100, 0).unwrap();

        assert_eq!(vault.claim(&hub, &mut a, 10).unwrap(), [100, 0, 0]);
        assert_eq!(vault.claim(&hub, &mut a, 10).unwrap(), [0, 0, 0]);
        assert_eq!(a.claimable, [0, 0, 0]);
    }

    #[test]
    fn test_withdraw_returns_proportional_want_minus_fee() {
        let mut hub = Hub::new([0; MAX_STREAMS]);
        let mut vault = hub.add_vault(StrategyKind::SingleAsset, [1, 0, 0]);
        let mut a = vault.position();

        vault.deposit(&hub, &mut a, 10_000, 0).unwrap();
        let receipt = vault.withdraw(&hub, &mut a, 4_000, 1).unwrap();
        assert_eq!(receipt.outcome.requested, 4_000);
        assert_eq!(receipt.outcome.payout, 4_000);
        assert_eq!(receipt.outcome.fee, 0);
        assert_eq!(a.principal, 6_000);

        engine::set_withdraw_fee(&hub.config, &hub.fee_governor, &mut vault.strategy, 100).unwrap();
        let receipt = vault.withdraw_all(&hub, &mut a, 2).unwrap();
        assert_eq!(receipt.outcome.fee, 60);
        assert_eq!(receipt.outcome.payout, 5_940);
        assert_eq!(a.principal, 0);

        // withdrawing more than held
        let mut b = vault.position();
        vault.deposit(&hub, &mut b, 10, 3).unwrap();
        let result = vault.withdraw(&hub, &mut b, 11, 4);
        assert_eq!(error_code(result), code(HubError::InsufficientAmount));
    }

    #[test]
    fn test_zero_harvest_changes_nothing() {
        let mut hub = Hub::new([0; MAX_STREAMS]);
        let mut vault = hub.add_vault(StrategyKind::SingleAsset, [1, 0, 0]);
        let mut a = vault.position();
        vault.deposit(&hub, &mut a, 100, 0).unwrap();

        let receipt = vault.earn(&hub, 0, 1).unwrap();
        assert!(receipt.outcome.is_noop());
        assert_eq!(receipt.distributed_now, [0, 0, 0]);
        assert_eq!(vault.pool.total_locked, 100);
        assert_eq!(vault.pool.acc_reward_per_share, [0, 0, 0]);
    }

    #[test]
    fn test_emergency_withdraw_forfeits_rewards() {
        let mut hub = Hub::new([10, 0, 0]);
        let mut vault = hub.add_vault(StrategyKind::SingleAsset, [1, 0, 0]);
        let mut a = vault.position();
        vault.deposit(&hub, &mut a, 100, 0).unwrap();
        assert_eq!(vault.pending(&hub, &a, 5), [50, 0, 0]);

        let receipt = vault.emergency_withdraw(&hub, &mut a, 5).unwrap();
        assert_eq!(receipt.forfeited, [50, 0, 0]);
        assert_eq!(receipt.outcome.payout, 100);
        assert_eq!(a.shares, 0);
        assert_eq!(a.claimable, [0, 0, 0]);
        assert_eq!(vault.pending(&hub, &a, 9), [0, 0, 0]);
        assert_eq!(vault.claim(&hub, &mut a, 9).unwrap(), [0, 0, 0]);
    }

    #[test]
    fn test_withdraw_all_keeps_rewards_claimable() {
        let mut hub = Hub::new([10, 0, 0]);
        let mut vault = hub.add_vault(StrategyKind::SingleAsset, [1, 0, 0]);
        let mut a = vault.position();
        vault.deposit(&hub, &mut a, 100, 0).unwrap();

        let receipt = vault.withdraw_all(&hub, &mut a, 5).unwrap();
        assert_eq!(receipt.settled, [50, 0, 0]);
        assert_eq!(receipt.outcome.payout, 100);
        assert_eq!(a.reward_debt, [0, 0, 0]);
        assert_eq!(a.claimable, [50, 0, 0]);

        assert_eq!(vault.claim(&hub, &mut a, 9).unwrap(), [50, 0, 0]);
    }

    #[test]
    fn test_paused_pool_blocks_deposits_not_exits() {
        let mut hub = Hub::new([0; MAX_STREAMS]);
        let mut vault = hub.add_vault(StrategyKind::SingleAsset, [1, 0, 0]);
        let (mut a, mut b) = (vault.position(), vault.position());
        vault.deposit(&hub, &mut a, 100, 0).unwrap();
        vault.deposit(&hub, &mut b, 100, 0).unwrap();

        let result = engine::set_pool_paused(&hub.config, &hub.admin, &mut vault.pool, true);
        assert_eq!(error_code(result), code(HubError::Unauthorized));
        engine::set_pool_paused(&hub.config, &hub.guardian, &mut vault.pool, true).unwrap();

        let result = vault.deposit(&hub, &mut a, 100, 1);
        assert_eq!(error_code(result), code(HubError::PoolPaused));
        let payload = StrategyCommand::DepositWant { amount: 100 }.encode().unwrap();
        let result = vault.execute(&hub, &mut a, &payload, 1);
        assert_eq!(error_code(result), code(HubError::PoolPaused));

        vault.withdraw(&hub, &mut a, 50, 1).unwrap();
        vault.emergency_withdraw(&hub, &mut b, 1).unwrap();
        vault.assert_conserved(&[&a, &b]);
    }

    #[test]
    fn test_paused_strategy_blocks_deposit_and_earn() {
        let mut hub = Hub::new([0; MAX_STREAMS]);
        let mut vault = hub.add_vault(StrategyKind::SingleAsset, [1, 0, 0]);
        let mut a = vault.position();
        vault.deposit(&hub, &mut a, 100, 0).unwrap();

        engine::set_strategy_paused(&hub.config, &hub.guardian, &mut vault.strategy, true).unwrap();
        let result = engine::set_strategy_paused(&hub.config, &hub.guardian, &mut vault.strategy, true);
        assert_eq!(error_code(result), code(HubError::InvalidParameter));

        let result = vault.deposit(&hub, &mut a, 100, 1);
        assert_eq!(error_code(result), code(HubError::StrategyPaused));

        vault.farm.rewards = [10, 0, 0];
        let result = vault.earn(&hub, 0, 1);
        assert_eq!(error_code(result), code(HubError::StrategyPaused));

        vault.withdraw_all(&hub, &mut a, 2).unwrap();

        engine::set_strategy_paused(&hub.config, &hub.guardian, &mut vault.strategy, false).unwrap();
        vault.deposit(&hub, &mut a, 100, 3).unwrap();
    }

    #[test]
    fn test_execute_rejects_bad_payload_without_change() {
        let mut hub = Hub::new([10, 0, 0]);
        let mut vault = hub.add_vault(StrategyKind::SingleAsset, [1, 0, 0]);
        let mut a = vault.position();
        vault.deposit(&hub, &mut a, 100, 0).unwrap();
        let before = vault.snapshot(&a);

        let result = vault.execute(&hub, &mut a, &[0xff, 1, 2], 5);
        assert_eq!(error_code(result), code(HubError::InvalidPayload));

        let mut trailing = StrategyCommand::DepositWant { amount: 10 }.encode().unwrap();
        trailing.push(0);
        let result = vault.execute(&hub, &mut a, &trailing, 5);
        assert_eq!(error_code(result), code(HubError::InvalidPayload));

        // zap commands only make sense for paired-liquidity strategies
        let zap = StrategyCommand::AddLiquiditySplit { amounts: [10, 10, 0, 0, 0] }
            .encode()
            .unwrap();
        let result = vault.execute(&hub, &mut a, &zap, 5);
        assert_eq!(error_code(result), code(HubError::InvalidPayload));

        assert_eq!(vault.snapshot(&a), before);
    }

    #[test]
    fn test_execute_dispatches_deposit_and_compound() {
        let mut hub = Hub::new([0; MAX_STREAMS]);
        let mut vault = hub.add_vault(StrategyKind::SingleAsset, [1, 0, 0]);
        let mut a = vault.position();

        let payload = StrategyCommand::DepositWant { amount: 250 }.encode().unwrap();
        let (command, receipt) = vault.execute(&hub, &mut a, &payload, 0).unwrap();
        assert_eq!(command.name(), "deposit_want");
        match receipt {
            ExecuteReceipt::Deposit(deposit) => assert_eq!(deposit.shares_minted, 250),
            other => panic!("unexpected receipt {:?}", other),
        }
        assert_eq!(a.shares, 250);

        vault.farm.rewards = [50, 0, 0];
        let payload = StrategyCommand::Compound { min_want_out: 50 }.encode().unwrap();
        let (_, receipt) = vault.execute(&hub, &mut a, &payload, 1).unwrap();
        match receipt {
            ExecuteReceipt::Compound(earned) => assert_eq!(earned.outcome.compounded, 50),
            other => panic!("unexpected receipt {:?}", other),
        }
        assert_eq!(vault.pool.total_locked, 300);
    }

    #[test]
    fn test_execute_zaps_one_sided_liquidity() {
        let mut hub = Hub::new([0; MAX_STREAMS]);
        let mut vault = hub.add_vault(StrategyKind::PairedLiquidity, [1, 0, 0]);
        let mut a = vault.position();

        let payload = StrategyCommand::AddLiquiditySplit { amounts: [100, 0, 0, 0, 0] }
            .encode()
            .unwrap();
        let (_, receipt) = vault.execute(&hub, &mut a, &payload, 0).unwrap();
        match receipt {
            ExecuteReceipt::Deposit(deposit) => {
                assert_eq!(deposit.net_amount, 50);
                assert_eq!(deposit.shares_minted, 50);
            }
            other => panic!("unexpected receipt {:?}", other),
        }

        let reserved = StrategyCommand::AddLiquiditySplit { amounts: [10, 10, 0, 1, 0] }
            .encode()
            .unwrap();
        let result = vault.execute(&hub, &mut a, &reserved, 1);
        assert_eq!(error_code(result), code(HubError::InvalidPayload));

        // minimum liquidity out is enforced
        let greedy = StrategyCommand::AddLiquiditySplit { amounts: [10, 10, 11, 0, 0] }
            .encode()
            .unwrap();
        let result = vault.execute(&hub, &mut a, &greedy, 1);
        assert_eq!(error_code(result), code(HubError::ExternalCallFailed));
        assert_eq!(a.shares, 50);
    }

    #[test]
    fn test_locked_pool_rejects_reentry() {
        let mut hub = Hub::new([10, 0, 0]);
        let mut vault = hub.add_vault(StrategyKind::SingleAsset, [1, 0, 0]);
        let mut a = vault.position();
        vault.deposit(&hub, &mut a, 100, 0).unwrap();

        vault.pool.locked = true;
        let result = vault.deposit(&hub, &mut a, 100, 1);
        assert_eq!(error_code(result), code(HubError::Reentrancy));
        let result = vault.withdraw(&hub, &mut a, 10, 1);
        assert_eq!(error_code(result), code(HubError::Reentrancy));
        let result = vault.claim(&hub, &mut a, 1);
        assert_eq!(error_code(result), code(HubError::Reentrancy));
        let result = vault.earn(&hub, 0, 1);
        assert_eq!(error_code(result), code(HubError::Reentrancy));

        assert!(vault.pool.locked);
        assert_eq!(a.shares, 100);
    }

    #[test]
    fn test_failed_farm_call_rolls_back() {
        let mut hub = Hub::new([10, 0, 0]);
        let mut vault = hub.add_vault(StrategyKind::SingleAsset, [1, 0, 0]);
        let mut a = vault.position();
        vault.deposit(&hub, &mut a, 100, 0).unwrap();
        let before = vault.snapshot(&a);

        vault.farm.fail = true;
        let result = vault.withdraw(&hub, &mut a, 50, 5);
        assert_eq!(error_code(result), code(HubError::ExternalCallFailed));
        assert_eq!(vault.snapshot(&a), before);
        assert!(!vault.pool.locked);

        vault.farm.fail = false;
        vault.withdraw(&hub, &mut a, 50, 5).unwrap();
        assert_eq!(a.claimable, [50, 0, 0]);
    }

    #[test]
    fn test_slippage_aborts_compound() {
        let mut hub = Hub::new([0; MAX_STREAMS]);
        let mut vault = hub.add_vault(StrategyKind::SingleAsset, [1, 0, 0]);
        let mut a = vault.position();
        vault.deposit(&hub, &mut a, 100, 0).unwrap();
        let before = vault.snapshot(&a);

        vault.farm.rewards = [100, 0, 0];
        let result = vault.earn(&hub, 101, 1);
        assert_eq!(error_code(result), code(HubError::ExternalCallFailed));
        assert_eq!(vault.snapshot(&a), before);
    }

    #[test]
    fn test_harvest_fees_and_partial_reinvest() {
        let mut hub = Hub::new([0; MAX_STREAMS]);
        let mut vault = hub.add_vault(StrategyKind::SingleAsset, [1, 0, 0]);
        let mut a = vault.position();
        vault.deposit(&hub, &mut a, 1_000, 0).unwrap();

        let result = engine::set_harvest_fees(&hub.config, &hub.admin, &mut vault.strategy, 500, 300);
        assert_eq!(error_code(result), code(HubError::Unauthorized));
        let result =
            engine::set_harvest_fees(&hub.config, &hub.fee_governor, &mut vault.strategy, 800, 300);
        assert_eq!(error_code(result), code(HubError::InvalidParameter));
        engine::set_harvest_fees(&hub.config, &hub.fee_governor, &mut vault.strategy, 500, 300)
            .unwrap();
        engine::set_reinvest_rate(&hub.config, &hub.fee_governor, &mut vault.strategy, 5_000)
            .unwrap();

        vault.farm.rewards = [1_000, 0, 0];
        let receipt = vault.earn(&hub, 0, 1).unwrap();
        assert_eq!(receipt.outcome.controller_fee, 50);
        assert_eq!(receipt.outcome.buyback, 30);
        assert_eq!(receipt.outcome.reinvested, 460);
        assert_eq!(receipt.outcome.compounded, 460);
        assert_eq!(receipt.outcome.distributed, [460, 0, 0]);
        assert_eq!(receipt.distributed_now, [460, 0, 0]);

        assert_eq!(vault.pool.total_locked, 1_460);
        assert_eq!(vault.pending(&hub, &a, 1), [460, 0, 0]);
    }

    #[test]
    fn test_stake_only_distributes_every_stream() {
        let mut hub = Hub::new([0; MAX_STREAMS]);
        let mut vault = hub.add_vault(StrategyKind::StakeOnly, [1, 0, 0]);
        let (mut a, mut b) = (vault.position(), vault.position());
        vault.deposit(&hub, &mut a, 30, 0).unwrap();
        vault.deposit(&hub, &mut b, 60, 0).unwrap();

        let result = engine::set_reinvest_rate(&hub.config, &hub.fee_governor, &mut vault.strategy, 1);
        assert_eq!(error_code(result), code(HubError::InvalidParameter));

        vault.farm.rewards = [90, 9, 0];
        let receipt = vault.earn(&hub, 0, 1).unwrap();
        assert_eq!(receipt.outcome.compounded, 0);
        assert_eq!(receipt.outcome.distributed, [90, 9, 0]);
        assert_eq!(vault.pool.total_locked, 90);

        assert_eq!(vault.pending(&hub, &a, 1), [30, 3, 0]);
        assert_eq!(vault.pending(&hub, &b, 1), [60, 6, 0]);
    }

    #[test]
    fn test_weight_change_accrues_at_old_rate_first() {
        let mut hub = Hub::new([10, 0, 0]);
        let mut first = hub.add_vault(StrategyKind::SingleAsset, [1, 0, 0]);
        let mut second = hub.add_vault(StrategyKind::SingleAsset, [1, 0, 0]);
        assert_eq!(hub.config.total_alloc_weight, [2, 0, 0]);
        assert_eq!(second.pool.pool_id, 1);

        let (mut a, mut b) = (first.position(), second.position());
        first.deposit(&hub, &mut a, 100, 0).unwrap();
        second.deposit(&hub, &mut b, 100, 0).unwrap();

        engine::mass_accrue(&hub.config, &mut [&mut second.pool], 10).unwrap();
        engine::set_pool_weights(&mut hub.config, &hub.admin, &mut first.pool, [3, 0, 0], 10)
            .unwrap();
        assert_eq!(hub.config.total_alloc_weight, [4, 0, 0]);

        // 50 at 1/2 of the emission, then 75 at 3/4
        assert_eq!(first.pending(&hub, &a, 20), [125, 0, 0]);
        // 50 at 1/2, then 25 at 1/4
        assert_eq!(second.pending(&hub, &b, 20), [75, 0, 0]);

        let guardian = hub.guardian;
        let result = engine::set_pool_weights(&mut hub.config, &guardian, &mut first.pool, [1, 0, 0], 20);
        assert_eq!(error_code(result), code(HubError::Unauthorized));
    }

    #[test]
    fn test_emission_waits_for_first_depositor() {
        let mut hub = Hub::new([10, 0, 0]);
        let mut vault = hub.add_vault(StrategyKind::SingleAsset, [1, 0, 0]);
        let mut a = vault.position();

        vault.deposit(&hub, &mut a, 100, 10).unwrap();
        assert_eq!(vault.pool.undistributed, [100, 0, 0]);

        // carried emission lands on the first shares at the next accrual
        assert_eq!(vault.pending(&hub, &a, 10), [100, 0, 0]);
        assert_eq!(vault.pending(&hub, &a, 12), [120, 0, 0]);
    }

    #[test]
    fn test_claim_all_is_all_or_nothing() {
        let mut hub = Hub::new([10, 0, 0]);
        let mut first = hub.add_vault(StrategyKind::SingleAsset, [1, 0, 0]);
        let mut second = hub.add_vault(StrategyKind::SingleAsset, [1, 0, 0]);
        let (mut a1, mut a2) = (first.position(), second.position());
        first.deposit(&hub, &mut a1, 100, 0).unwrap();
        second.deposit(&hub, &mut a2, 100, 0).unwrap();

        second.pool.locked = true;
        let before = first.snapshot(&a1);
        {
            let mut entries = [(&mut first.pool, &mut a1), (&mut second.pool, &mut a2)];
            let result = engine::claim_all(&hub.config, &mut entries, 10);
            assert_eq!(error_code(result), code(HubError::Reentrancy));
        }
        assert_eq!(first.snapshot(&a1), before);

        second.pool.locked = false;
        let claimed = {
            let mut entries = [(&mut first.pool, &mut a1), (&mut second.pool, &mut a2)];
            engine::claim_all(&hub.config, &mut entries, 10).unwrap()
        };
        assert_eq!(claimed, vec![[50, 0, 0], [50, 0, 0]]);
        assert_eq!(first.claim(&hub, &mut a1, 10).unwrap(), [0, 0, 0]);
    }

    #[test]
    fn test_strategy_cannot_be_replaced_while_pool_holds_shares() {
        let mut hub = Hub::new([0; MAX_STREAMS]);
        let mut vault = hub.add_vault(StrategyKind::SingleAsset, [1, 0, 0]);
        let mut a = vault.position();
        vault.deposit(&hub, &mut a, 100, 0).unwrap();

        let replacement = vault.strategy.clone();
        let result = engine::attach_strategy(
            &hub.config,
            &hub.admin,
            &mut vault.pool,
            Pubkey::new_unique(),
            &replacement,
        );
        assert_eq!(error_code(result), code(HubError::PoolNotEmpty));
    }

    #[test]
    fn test_held_back_emission_released_onto_one_share() {
        // one token (9 decimals) per slot, pool left empty for a day of slots
        let mut hub = Hub::new([1_000_000_000, 0, 0]);
        let mut vault = hub.add_vault(StrategyKind::SingleAsset, [1, 0, 0]);
        let (mut dust, mut whale) = (vault.position(), vault.position());

        vault.deposit(&hub, &mut dust, 1, 216_000).unwrap();
        assert_eq!(
            vault.claim(&hub, &mut dust, 216_001).unwrap(),
            [216_001_000_000_000, 0, 0]
        );
        assert_eq!(
            vault.pool.acc_reward_per_share[0],
            216_001_000_000_000_000_000_000_000
        );

        // a large deposit after the accumulator jumped still goes through
        let receipt = vault.deposit(&hub, &mut whale, 5_000_000_000_000, 216_001).unwrap();
        assert_eq!(receipt.shares_minted, 5_000_000_000_000);

        // 1e10 emitted over 5e12 + 1 shares
        assert_eq!(vault.pending(&hub, &whale, 216_011), [9_999_999_995, 0, 0]);
        assert_eq!(vault.pending(&hub, &dust, 216_011), [0, 0, 0]);

        let receipt = vault.withdraw_all(&hub, &mut whale, 216_011).unwrap();
        assert_eq!(receipt.outcome.payout, 5_000_000_000_000);
        assert_eq!(whale.claimable, [9_999_999_995, 0, 0]);
        vault.assert_conserved(&[&dust, &whale]);
    }

    #[test]
    fn test_accumulator_at_production_scale() {
        // 5 tokens per slot, 9-decimal amounts
        let mut hub = Hub::new([5_000_000_000, 0, 0]);
        let mut vault = hub.add_vault(StrategyKind::SingleAsset, [1, 0, 0]);
        let (mut a, mut b) = (vault.position(), vault.position());

        vault.deposit(&hub, &mut a, 1_000_000_000_000, 0).unwrap();
        vault.deposit(&hub, &mut b, 3_000_000_000_000, 0).unwrap();
        assert_eq!(vault.pending(&hub, &a, 1_000_000), [1_250_000_000_000_000, 0, 0]);
        assert_eq!(vault.pending(&hub, &b, 1_000_000), [3_750_000_000_000_000, 0, 0]);

        vault.withdraw_all(&hub, &mut a, 1_000_000).unwrap();
        vault.withdraw_all(&hub, &mut b, 1_000_000).unwrap();
        assert_eq!(vault.pool.total_shares, 0);

        // empty for 500k slots, then reopened by a tiny and a large depositor
        let (mut c, mut d) = (vault.position(), vault.position());
        vault.deposit(&hub, &mut c, 1, 1_500_000).unwrap();
        vault.deposit(&hub, &mut d, 10_000_000_000_000, 1_500_000).unwrap();

        assert_eq!(vault.pending(&hub, &c, 1_500_000), [2_500_000_000_000_000, 0, 0]);
        assert_eq!(vault.pending(&hub, &d, 1_500_000), [0, 0, 0]);
        assert_eq!(vault.pending(&hub, &d, 1_500_010), [49_999_999_990, 0, 0]);

        assert_eq!(
            vault.claim(&hub, &mut a, 1_500_010).unwrap(),
            [1_250_000_000_000_000, 0, 0]
        );
        vault.withdraw(&hub, &mut d, 4_000_000_000_000, 1_500_010).unwrap();
        vault.assert_conserved(&[&a, &b, &c, &d]);
    }

    #[test]
    fn test_bonus_stream_harvest_is_distributed() {
        let mut hub = Hub::new([0; MAX_STREAMS]);
        let mut vault = hub.add_vault(StrategyKind::SingleAsset, [1, 0, 0]);
        let (mut a, mut b) = (vault.position(), vault.position());
        vault.deposit(&hub, &mut a, 100, 0).unwrap();
        vault.deposit(&hub, &mut b, 300, 0).unwrap();

        vault.farm.rewards = [100, 40, 8];
        let receipt = vault.earn(&hub, 0, 1).unwrap();
        assert_eq!(receipt.outcome.compounded, 100);
        assert_eq!(receipt.outcome.distributed, [0, 40, 8]);
        assert_eq!(receipt.distributed_now, [0, 40, 8]);

        assert_eq!(vault.pending(&hub, &a, 1), [0, 10, 2]);
        assert_eq!(vault.pending(&hub, &b, 1), [0, 30, 6]);
    }

    #[test]
    fn test_compound_dispatch_needs_no_position() {
        let mut hub = Hub::new([0; MAX_STREAMS]);
        let mut vault = hub.add_vault(StrategyKind::SingleAsset, [1, 0, 0]);
        let mut a = vault.position();
        vault.deposit(&hub, &mut a, 100, 0).unwrap();
        vault.farm.rewards = [20, 0, 0];

        let compound = StrategyCommand::Compound { min_want_out: 0 };
        let accounts = PoolAccounts {
            hub: &hub.config,
            pool: &mut vault.pool,
            strategy: &mut vault.strategy,
        };
        let receipt = engine::dispatch(
            accounts,
            None,
            &mut vault.farm,
            &mut vault.router,
            &compound,
            1,
        )
        .unwrap();
        assert!(matches!(
            receipt,
            ExecuteReceipt::Compound(earned) if earned.outcome.compounded == 20
        ));

        let deposit = StrategyCommand::DepositWant { amount: 10 };
        let accounts = PoolAccounts {
            hub: &hub.config,
            pool: &mut vault.pool,
            strategy: &mut vault.strategy,
        };
        let result = engine::dispatch(
            accounts,
            None,
            &mut vault.farm,
            &mut vault.router,
            &deposit,
            2,
        );
        assert_eq!(error_code(result), code(HubError::InvalidRemainingAccounts));
        assert_eq!(vault.pool.total_locked, 120);
    }
}
