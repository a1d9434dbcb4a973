//! # Derivation Pass
//!
//! Computes derived node fields from fully populated raw fields. Pure integer
//! math, no RPC, and by construction no failure path: the pass only runs on
//! records whose raw-fetch phase completed without error.

use ethers::types::U256;
use once_cell::sync::Lazy;

use crate::node_details::NodeDetails;

/// Fixed-point unit of one: fee fractions are scaled by 1e18.
pub static ONE_ETHER: Lazy<U256> = Lazy::new(|| U256::exp10(18));

/// Applies the derivation pass to one record, in place.
///
/// - Effective stake below the minimum is clamped to zero (a clamp, not an error).
/// - The distributor's pooled balance is split into a node share and a user
///   share. The node share is computed first; the user share is the exact
///   remainder, so the two always sum to the original balance under integer
///   truncation.
pub fn fixup_node_details(details: &mut NodeDetails) {
    if details.effective_stake < details.minimum_stake {
        details.effective_stake = U256::zero();
    }

    let balance = details.distributor_balance;
    if balance.is_zero() {
        details.distributor_balance_node_eth = U256::zero();
        details.distributor_balance_user_eth = U256::zero();
        return;
    }

    let half = balance / 2;
    let node_share = if details.staking_pool_count.is_zero() {
        // No staking pools: split 50/50, odd wei goes to the user side.
        half
    } else {
        // Node gets half plus its average commission on the other half.
        half + half * details.average_fee / *ONE_ETHER
    };
    details.distributor_balance_node_eth = node_share;
    details.distributor_balance_user_eth = balance - node_share;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(
        effective_stake: u64,
        minimum_stake: u64,
        distributor_balance: u64,
        average_fee: U256,
        staking_pool_count: u64,
    ) -> NodeDetails {
        NodeDetails {
            effective_stake: U256::from(effective_stake),
            minimum_stake: U256::from(minimum_stake),
            distributor_balance: U256::from(distributor_balance),
            average_fee,
            staking_pool_count: U256::from(staking_pool_count),
            ..Default::default()
        }
    }

    #[test]
    fn test_effective_stake_below_minimum_clamps_to_zero() {
        let mut d = record(99, 100, 0, U256::zero(), 0);
        fixup_node_details(&mut d);
        assert_eq!(d.effective_stake, U256::zero());
    }

    #[test]
    fn test_effective_stake_at_minimum_unchanged() {
        let mut d = record(100, 100, 0, U256::zero(), 0);
        fixup_node_details(&mut d);
        assert_eq!(d.effective_stake, U256::from(100));
    }

    #[test]
    fn test_zero_balance_yields_zero_shares() {
        let mut d = record(0, 0, 0, *ONE_ETHER, 5);
        fixup_node_details(&mut d);
        assert_eq!(d.distributor_balance_node_eth, U256::zero());
        assert_eq!(d.distributor_balance_user_eth, U256::zero());
    }

    #[test]
    fn test_no_pools_splits_odd_remainder_to_user() {
        let mut d = record(0, 0, 1_000_001, U256::zero(), 0);
        fixup_node_details(&mut d);
        assert_eq!(d.distributor_balance_node_eth, U256::from(500_000));
        assert_eq!(d.distributor_balance_user_eth, U256::from(500_001));
    }

    #[test]
    fn test_ten_percent_fee_worked_example() {
        // B = 1_000_000, fee = 10%, 5 pools:
        // half = 500_000; node = 500_000 + 50_000 = 550_000; user = 450_000.
        let fee = *ONE_ETHER / 10;
        let mut d = record(0, 0, 1_000_000, fee, 5);
        fixup_node_details(&mut d);
        assert_eq!(d.distributor_balance_node_eth, U256::from(550_000));
        assert_eq!(d.distributor_balance_user_eth, U256::from(450_000));
    }

    #[test]
    fn test_shares_always_sum_to_balance() {
        for balance in [1u64, 2, 3, 999, 1_000_000, 1_000_001, u64::MAX] {
            for fee_tenths in 0..=10u64 {
                for pools in [0u64, 1, 5] {
                    let fee = *ONE_ETHER * fee_tenths / 10;
                    let mut d = record(0, 0, balance, fee, pools);
                    fixup_node_details(&mut d);
                    assert_eq!(
                        d.distributor_balance_node_eth + d.distributor_balance_user_eth,
                        U256::from(balance),
                        "balance={balance} fee_tenths={fee_tenths} pools={pools}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_full_fee_gives_whole_balance_to_node_side() {
        // fee == unit of one: node share = half + half = 2*half <= B.
        let mut d = record(0, 0, 1_000_001, *ONE_ETHER, 3);
        fixup_node_details(&mut d);
        assert_eq!(d.distributor_balance_node_eth, U256::from(1_000_000));
        assert_eq!(d.distributor_balance_user_eth, U256::from(1));
    }
}
