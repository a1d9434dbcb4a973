//! # Balance Batch Fetcher
//!
//! Fetches native-currency balances for a list of addresses in one batched
//! operation, via `IMulticall3.getEthBalance` self-calls. Results come back in
//! input order; oversized lists are chunked by the underlying multicall.

use anyhow::{anyhow, Result};
use ethers::prelude::*;
use log::debug;
use std::sync::Arc;

use crate::contracts::IMulticall3;
use crate::multicall::{decode_uint, Call, Multicall};

/// Batched native-balance reader.
#[derive(Clone)]
pub struct BalanceBatcher<M: Middleware> {
    helper: IMulticall3<M>,
    multicall: Multicall<M>,
}

impl<M: Middleware + 'static> BalanceBatcher<M> {
    pub fn new(client: Arc<M>, multicall_address: Address, batch_size: usize) -> Self {
        Self {
            helper: IMulticall3::new(multicall_address, client.clone()),
            multicall: Multicall::new(client, multicall_address, batch_size),
        }
    }

    /// Returns `balances[i]` = native balance of `addresses[i]` at `block`.
    ///
    /// One batched operation; fails as a unit if any balance cannot be read.
    pub async fn get_eth_balances(
        &self,
        addresses: &[Address],
        block: Option<BlockId>,
    ) -> Result<Vec<U256>> {
        if addresses.is_empty() {
            return Ok(Vec::new());
        }

        let mut calls = Vec::with_capacity(addresses.len());
        for address in addresses {
            let call_data = self
                .helper
                .get_eth_balance(*address)
                .calldata()
                .ok_or_else(|| anyhow!("missing calldata for getEthBalance"))?;
            calls.push(Call {
                target: self.multicall.address(),
                call_data,
            });
        }

        debug!("Fetching {} native balances", addresses.len());
        let results = self.multicall.run(calls, block).await?;
        results.iter().map(decode_uint).collect()
    }
}
