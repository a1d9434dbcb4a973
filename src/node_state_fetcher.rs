//! # Node State Fetcher
//!
//! The snapshot aggregator: resolves the full node address list, fans per-chunk
//! detail plans out to bounded concurrent workers, batches native balances, and
//! finishes with the in-place derivation pass. A snapshot is all-or-nothing; any
//! failed batch aborts the whole operation.

use anyhow::anyhow;
use ethers::prelude::*;
use std::sync::Arc;
use tracing::{debug, info};

use crate::derivation::fixup_node_details;
use crate::error::SnapshotError;
use crate::multicall::{decode_address, Call};
use crate::network_contracts::NetworkContracts;
use crate::node_details::{add_node_detail_calls, FetchPlan, NodeDetails, UpgradeFlags};
use crate::scheduler::run_chunked;
use crate::settings::StateFetchSettings;

/// Batched node snapshot fetcher bound to one reference block.
pub struct NodeStateFetcher<M: Middleware> {
    contracts: Arc<NetworkContracts<M>>,
    /// Nodes per detail-phase chunk (~20 reads per node).
    node_batch_size: usize,
    /// Indices per address-resolution chunk (one read per index).
    address_batch_size: usize,
    /// Global cap on concurrently running chunk workers.
    concurrency: usize,
}

impl<M: Middleware + 'static> NodeStateFetcher<M> {
    pub fn new(contracts: Arc<NetworkContracts<M>>, settings: &StateFetchSettings) -> Self {
        Self {
            contracts,
            node_batch_size: settings.node_batch_size.max(1),
            address_batch_size: settings.address_batch_size.max(1),
            concurrency: settings.concurrency.max(1),
        }
    }

    /// Fetches the full detail snapshot for a single node.
    pub async fn get_node_details(
        &self,
        address: Address,
        flags: UpgradeFlags,
    ) -> Result<NodeDetails, SnapshotError> {
        let block = Some(self.contracts.block_id());
        let mut records = vec![NodeDetails::at(address)];

        let mut plan = FetchPlan::new();
        add_node_detail_calls(&self.contracts, &mut plan, 0, address, flags)
            .map_err(|e| SnapshotError::batch("node details", e))?;
        plan.execute(&self.contracts.multicall, block, &mut records)
            .await
            .map_err(|e| SnapshotError::batch("node details", e))?;
        let mut details = records.swap_remove(0);

        let client = self.contracts.client();
        details.balance_eth = client
            .get_balance(address, block)
            .await
            .map_err(|e| SnapshotError::balance("node", anyhow!("{e}")))?;
        details.distributor_balance = client
            .get_balance(details.fee_distributor_address, block)
            .await
            .map_err(|e| SnapshotError::balance("distributor", anyhow!("{e}")))?;

        fixup_node_details(&mut details);
        Ok(details)
    }

    /// Fetches the full detail snapshot for every registered node.
    ///
    /// Phases run strictly in order: address resolution, then chunked detail
    /// fetch, then the two balance batches (concurrent with each other), then the
    /// derivation pass. `records[i].node_address` is the address at index `i` of
    /// the on-chain node set.
    pub async fn get_all_node_details(
        &self,
        flags: UpgradeFlags,
    ) -> Result<Vec<NodeDetails>, SnapshotError> {
        let block = self.contracts.block_id();
        let addresses = Arc::new(self.get_node_addresses_fast().await?);
        let count = addresses.len();
        info!(
            "Fetching details for {} nodes at block {}",
            count, self.contracts.el_block
        );

        let contracts = Arc::clone(&self.contracts);
        let chunk_addresses = Arc::clone(&addresses);
        let mut details = run_chunked(count, self.node_batch_size, self.concurrency, move |range| {
            let contracts = Arc::clone(&contracts);
            let addresses = Arc::clone(&chunk_addresses);
            async move {
                let multicall = contracts.fresh_multicall();
                let mut records: Vec<NodeDetails> = range
                    .clone()
                    .map(|j| NodeDetails::at(addresses[j]))
                    .collect();
                let mut plan = FetchPlan::new();
                for (slot, j) in range.enumerate() {
                    add_node_detail_calls(&contracts, &mut plan, slot, addresses[j], flags)?;
                }
                plan.execute(&multicall, Some(contracts.block_id()), &mut records)
                    .await?;
                Ok(records)
            }
        })
        .await
        .map_err(|e| SnapshotError::batch("node details", e))?;

        // Both balance batches need the detail phase (distributor addresses come
        // from it) but are independent of each other.
        let distributor_addresses: Vec<Address> =
            details.iter().map(|d| d.fee_distributor_address).collect();
        let batcher = &self.contracts.balance_batcher;
        let node_balances_fut = async {
            batcher
                .get_eth_balances(&addresses, Some(block))
                .await
                .map_err(|e| SnapshotError::balance("node", e))
        };
        let distributor_balances_fut = async {
            batcher
                .get_eth_balances(&distributor_addresses, Some(block))
                .await
                .map_err(|e| SnapshotError::balance("distributor", e))
        };
        let (node_balances, distributor_balances) =
            futures::try_join!(node_balances_fut, distributor_balances_fut)?;

        for (i, d) in details.iter_mut().enumerate() {
            d.balance_eth = node_balances[i];
            d.distributor_balance = distributor_balances[i];
            fixup_node_details(d);
        }

        info!("Snapshot complete: {} node records", details.len());
        Ok(details)
    }

    /// Resolves the dense index range `[0, count)` to node addresses using large
    /// resolution chunks (one read per index, so chunks can be much bigger than
    /// detail chunks).
    async fn get_node_addresses_fast(&self) -> Result<Vec<Address>, SnapshotError> {
        let block = self.contracts.block_id();
        let raw_count = self
            .contracts
            .node_manager
            .get_node_count()
            .block(block)
            .call()
            .await
            .map_err(|e| SnapshotError::resolution(anyhow!("getNodeCount failed: {e}")))?;
        if raw_count > U256::from(u64::MAX) {
            return Err(SnapshotError::resolution(anyhow!(
                "node count {raw_count} exceeds addressable range"
            )));
        }
        let count = raw_count.as_u64() as usize;
        debug!(
            "Resolving {} node addresses at block {}",
            count, self.contracts.el_block
        );

        let contracts = Arc::clone(&self.contracts);
        run_chunked(count, self.address_batch_size, self.concurrency, move |range| {
            let contracts = Arc::clone(&contracts);
            async move {
                let multicall = contracts.fresh_multicall();
                let node_manager = &contracts.node_manager;
                let mut calls = Vec::with_capacity(range.len());
                for j in range {
                    let call_data = node_manager
                        .get_node_at(U256::from(j))
                        .calldata()
                        .ok_or_else(|| anyhow!("missing calldata for getNodeAt"))?;
                    calls.push(Call {
                        target: node_manager.address(),
                        call_data,
                    });
                }
                let results = multicall.run(calls, Some(contracts.block_id())).await?;
                results.iter().map(decode_address).collect()
            }
        })
        .await
        .map_err(SnapshotError::resolution)
    }
}
