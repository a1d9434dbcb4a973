//! # Node Details
//!
//! The per-node snapshot record and the attribute fetch plan that populates it.
//! The plan is pure data: an ordered list of (target, calldata, decoder) bindings
//! assembled fresh per chunk and consumed by one multicall run.

use anyhow::{anyhow, Result};
use ethers::prelude::*;
use std::sync::Arc;

use crate::multicall::{
    decode_address, decode_bool, decode_string, decode_uint, Call, Multicall,
};
use crate::network_contracts::NetworkContracts;

/// Protocol upgrade switches that change which attributes exist on-chain.
///
/// When a flag is off the corresponding field is simply not fetched and stays at
/// its zero value, meaning "not yet available" rather than "fetched and empty".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpgradeFlags {
    /// Deposit-credit accounting exists only after the deposit-pool upgrade.
    pub deposit_credit: bool,
}

/// Complete details for a node, fetched in one batched snapshot.
///
/// Raw fields are copied verbatim from chain reads. Derived fields
/// (`effective_stake` clamping, the distributor balance split) are written once by
/// the derivation pass after every raw field of the record is populated.
#[derive(Debug, Clone, Default)]
pub struct NodeDetails {
    pub node_address: Address,
    pub exists: bool,
    pub registration_time: U256,
    pub timezone_location: String,
    pub fee_distributor_initialised: bool,
    pub fee_distributor_address: Address,
    pub average_fee: U256,
    pub reward_network: U256,
    pub stake: U256,
    pub effective_stake: U256,
    pub minimum_stake: U256,
    pub maximum_stake: U256,
    pub eth_matched: U256,
    pub eth_matched_limit: U256,
    pub staking_pool_count: U256,
    pub balance_eth: U256,
    pub balance_lst: U256,
    pub balance_gov: U256,
    pub balance_gov_legacy: U256,
    /// Only populated when `UpgradeFlags::deposit_credit` is set.
    pub deposit_credit_balance: U256,
    /// Raw pooled balance of the node's fee distributor sub-account.
    pub distributor_balance: U256,
    pub withdrawal_address: Address,
    pub pending_withdrawal_address: Address,
    pub smoothing_pool_registration_state: bool,
    pub smoothing_pool_registration_changed: U256,
    /// Derived: node's share of `distributor_balance`.
    pub distributor_balance_node_eth: U256,
    /// Derived: everyone else's share of `distributor_balance`.
    pub distributor_balance_user_eth: U256,
}

impl NodeDetails {
    pub fn at(node_address: Address) -> Self {
        Self {
            node_address,
            ..Default::default()
        }
    }
}

/// Writes one decoded multicall result into its record slot.
pub type Decoder = Box<dyn FnOnce(&mut NodeDetails, &Bytes) -> Result<()> + Send>;

/// Ordered list of (call, target-slot) bindings for one or more records.
///
/// Built per chunk, executed by one multicall run, then discarded. Result i of the
/// run is decoded into the record slot named by binding i.
#[derive(Default)]
pub struct FetchPlan {
    calls: Vec<Call>,
    bindings: Vec<(usize, Decoder)>,
}

impl FetchPlan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.calls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    pub fn calls(&self) -> &[Call] {
        &self.calls
    }

    /// Binds one read to one record slot. `call_data` comes straight from an
    /// abigen `ContractCall::calldata()`, which is `None` only for misconstructed
    /// calls.
    pub fn bind(
        &mut self,
        record: usize,
        target: Address,
        call_data: Option<Bytes>,
        decode: Decoder,
    ) -> Result<()> {
        let call_data =
            call_data.ok_or_else(|| anyhow!("missing calldata for call to {target:?}"))?;
        self.calls.push(Call { target, call_data });
        self.bindings.push((record, decode));
        Ok(())
    }

    /// Executes the plan as one multicall run and decodes each result into its
    /// bound record slot. Fails as a unit; on error the records must be treated as
    /// unpopulated.
    pub async fn execute<M: Middleware + 'static>(
        self,
        multicall: &Multicall<M>,
        block: Option<BlockId>,
        records: &mut [NodeDetails],
    ) -> Result<()> {
        let results = multicall.run(self.calls, block).await?;
        for ((record, decode), raw) in self.bindings.into_iter().zip(results.iter()) {
            decode(&mut records[record], raw)?;
        }
        Ok(())
    }
}

/// Adds every attribute read for one node to the plan, bound to record slot
/// `record`. The deposit-credit read is appended only when the upgrade flag is
/// set; otherwise the field stays zero and is understood as "not yet available".
pub fn add_node_detail_calls<M: Middleware + 'static>(
    contracts: &Arc<NetworkContracts<M>>,
    plan: &mut FetchPlan,
    record: usize,
    address: Address,
    flags: UpgradeFlags,
) -> Result<()> {
    let nm = &contracts.node_manager;
    let ns = &contracts.node_staking;
    let st = &contracts.protocol_storage;

    plan.bind(
        record,
        nm.address(),
        nm.get_node_exists(address).calldata(),
        Box::new(|d, raw| {
            d.exists = decode_bool(raw)?;
            Ok(())
        }),
    )?;
    plan.bind(
        record,
        nm.address(),
        nm.get_node_registration_time(address).calldata(),
        Box::new(|d, raw| {
            d.registration_time = decode_uint(raw)?;
            Ok(())
        }),
    )?;
    plan.bind(
        record,
        nm.address(),
        nm.get_node_timezone_location(address).calldata(),
        Box::new(|d, raw| {
            d.timezone_location = decode_string(raw)?;
            Ok(())
        }),
    )?;
    plan.bind(
        record,
        nm.address(),
        nm.get_fee_distributor_initialised(address).calldata(),
        Box::new(|d, raw| {
            d.fee_distributor_initialised = decode_bool(raw)?;
            Ok(())
        }),
    )?;
    plan.bind(
        record,
        contracts.distributor_factory.address(),
        contracts
            .distributor_factory
            .get_proxy_address(address)
            .calldata(),
        Box::new(|d, raw| {
            d.fee_distributor_address = decode_address(raw)?;
            Ok(())
        }),
    )?;
    plan.bind(
        record,
        nm.address(),
        nm.get_average_node_fee(address).calldata(),
        Box::new(|d, raw| {
            d.average_fee = decode_uint(raw)?;
            Ok(())
        }),
    )?;
    plan.bind(
        record,
        nm.address(),
        nm.get_reward_network(address).calldata(),
        Box::new(|d, raw| {
            d.reward_network = decode_uint(raw)?;
            Ok(())
        }),
    )?;
    plan.bind(
        record,
        ns.address(),
        ns.get_node_stake(address).calldata(),
        Box::new(|d, raw| {
            d.stake = decode_uint(raw)?;
            Ok(())
        }),
    )?;
    plan.bind(
        record,
        ns.address(),
        ns.get_node_effective_stake(address).calldata(),
        Box::new(|d, raw| {
            d.effective_stake = decode_uint(raw)?;
            Ok(())
        }),
    )?;
    plan.bind(
        record,
        ns.address(),
        ns.get_node_minimum_stake(address).calldata(),
        Box::new(|d, raw| {
            d.minimum_stake = decode_uint(raw)?;
            Ok(())
        }),
    )?;
    plan.bind(
        record,
        ns.address(),
        ns.get_node_maximum_stake(address).calldata(),
        Box::new(|d, raw| {
            d.maximum_stake = decode_uint(raw)?;
            Ok(())
        }),
    )?;
    plan.bind(
        record,
        ns.address(),
        ns.get_node_eth_matched(address).calldata(),
        Box::new(|d, raw| {
            d.eth_matched = decode_uint(raw)?;
            Ok(())
        }),
    )?;
    plan.bind(
        record,
        ns.address(),
        ns.get_node_eth_matched_limit(address).calldata(),
        Box::new(|d, raw| {
            d.eth_matched_limit = decode_uint(raw)?;
            Ok(())
        }),
    )?;
    plan.bind(
        record,
        contracts.staking_pool_manager.address(),
        contracts
            .staking_pool_manager
            .get_node_staking_pool_count(address)
            .calldata(),
        Box::new(|d, raw| {
            d.staking_pool_count = decode_uint(raw)?;
            Ok(())
        }),
    )?;
    plan.bind(
        record,
        contracts.token_lst.address(),
        contracts.token_lst.balance_of(address).calldata(),
        Box::new(|d, raw| {
            d.balance_lst = decode_uint(raw)?;
            Ok(())
        }),
    )?;
    plan.bind(
        record,
        contracts.token_gov.address(),
        contracts.token_gov.balance_of(address).calldata(),
        Box::new(|d, raw| {
            d.balance_gov = decode_uint(raw)?;
            Ok(())
        }),
    )?;
    plan.bind(
        record,
        contracts.token_gov_legacy.address(),
        contracts.token_gov_legacy.balance_of(address).calldata(),
        Box::new(|d, raw| {
            d.balance_gov_legacy = decode_uint(raw)?;
            Ok(())
        }),
    )?;
    plan.bind(
        record,
        st.address(),
        st.get_node_withdrawal_address(address).calldata(),
        Box::new(|d, raw| {
            d.withdrawal_address = decode_address(raw)?;
            Ok(())
        }),
    )?;
    plan.bind(
        record,
        st.address(),
        st.get_node_pending_withdrawal_address(address).calldata(),
        Box::new(|d, raw| {
            d.pending_withdrawal_address = decode_address(raw)?;
            Ok(())
        }),
    )?;
    plan.bind(
        record,
        nm.address(),
        nm.get_smoothing_pool_registration_state(address).calldata(),
        Box::new(|d, raw| {
            d.smoothing_pool_registration_state = decode_bool(raw)?;
            Ok(())
        }),
    )?;
    plan.bind(
        record,
        nm.address(),
        nm.get_smoothing_pool_registration_changed(address)
            .calldata(),
        Box::new(|d, raw| {
            d.smoothing_pool_registration_changed = decode_uint(raw)?;
            Ok(())
        }),
    )?;

    if flags.deposit_credit {
        plan.bind(
            record,
            contracts.node_deposit.address(),
            contracts
                .node_deposit
                .get_node_deposit_credit(address)
                .calldata(),
            Box::new(|d, raw| {
                d.deposit_credit_balance = decode_uint(raw)?;
                Ok(())
            }),
        )?;
    }

    Ok(())
}

/// Number of attribute reads per node without upgrade-gated extras.
pub const BASE_CALLS_PER_NODE: usize = 21;
