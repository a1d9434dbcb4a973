//! # Network Contracts
//!
//! One-per-snapshot bundle of bound contract handles, the multicall executor, and
//! the reference block. Everything a snapshot reads goes through this bundle, so
//! every sub-fetch is pinned to the same block.

use anyhow::Result;
use ethers::prelude::*;
use std::sync::Arc;

use crate::balance_fetcher::BalanceBatcher;
use crate::contracts::{
    Erc20, IDistributorFactory, INodeDeposit, INodeManager, INodeStaking, IProtocolStorage,
    IStakingPoolManager,
};
use crate::multicall::Multicall;
use crate::registry::ContractRegistry;

/// Logical contract names as registered in protocol storage.
pub mod contract_names {
    pub const NODE_MANAGER: &str = "nodeManager";
    pub const NODE_STAKING: &str = "nodeStaking";
    pub const STAKING_POOL_MANAGER: &str = "stakingPoolManager";
    pub const DISTRIBUTOR_FACTORY: &str = "nodeDistributorFactory";
    pub const NODE_DEPOSIT: &str = "nodeDeposit";
    pub const TOKEN_LST: &str = "tokenLST";
    pub const TOKEN_GOV: &str = "tokenGov";
    pub const TOKEN_GOV_LEGACY: &str = "tokenGovLegacy";
}

/// Resolved deployment addresses for one snapshot.
#[derive(Debug, Clone)]
pub struct ContractAddresses {
    pub multicall: Address,
    pub node_manager: Address,
    pub node_staking: Address,
    pub staking_pool_manager: Address,
    pub distributor_factory: Address,
    pub node_deposit: Address,
    pub protocol_storage: Address,
    pub token_lst: Address,
    pub token_gov: Address,
    pub token_gov_legacy: Address,
}

/// Bound contract handles plus batching infrastructure for one snapshot, all
/// referencing the same execution-layer block.
pub struct NetworkContracts<M: Middleware> {
    /// Reference block every read in this snapshot is pinned to.
    pub el_block: U64,
    pub multicall: Multicall<M>,
    pub balance_batcher: BalanceBatcher<M>,
    pub node_manager: INodeManager<M>,
    pub node_staking: INodeStaking<M>,
    pub staking_pool_manager: IStakingPoolManager<M>,
    pub distributor_factory: IDistributorFactory<M>,
    pub node_deposit: INodeDeposit<M>,
    pub protocol_storage: IProtocolStorage<M>,
    pub token_lst: Erc20<M>,
    pub token_gov: Erc20<M>,
    pub token_gov_legacy: Erc20<M>,
    client: Arc<M>,
    multicall_batch_size: usize,
}

impl<M: Middleware + 'static> NetworkContracts<M> {
    /// Builds the bundle by resolving every logical name through the registry at
    /// the reference block. Lookups run concurrently; the registry caches them.
    pub async fn resolve(
        client: Arc<M>,
        registry: &ContractRegistry<M>,
        multicall_address: Address,
        protocol_storage_address: Address,
        el_block: U64,
        multicall_batch_size: usize,
    ) -> Result<Self> {
        let (
            node_manager,
            node_staking,
            staking_pool_manager,
            distributor_factory,
            node_deposit,
            token_lst,
            token_gov,
            token_gov_legacy,
        ) = futures::try_join!(
            registry.get_address(contract_names::NODE_MANAGER),
            registry.get_address(contract_names::NODE_STAKING),
            registry.get_address(contract_names::STAKING_POOL_MANAGER),
            registry.get_address(contract_names::DISTRIBUTOR_FACTORY),
            registry.get_address(contract_names::NODE_DEPOSIT),
            registry.get_address(contract_names::TOKEN_LST),
            registry.get_address(contract_names::TOKEN_GOV),
            registry.get_address(contract_names::TOKEN_GOV_LEGACY),
        )?;

        let addresses = ContractAddresses {
            multicall: multicall_address,
            node_manager,
            node_staking,
            staking_pool_manager,
            distributor_factory,
            node_deposit,
            protocol_storage: protocol_storage_address,
            token_lst,
            token_gov,
            token_gov_legacy,
        };
        Ok(Self::from_addresses(
            client,
            &addresses,
            el_block,
            multicall_batch_size,
        ))
    }

    /// Builds the bundle from known addresses, with no resolution RPCs.
    pub fn from_addresses(
        client: Arc<M>,
        addresses: &ContractAddresses,
        el_block: U64,
        multicall_batch_size: usize,
    ) -> Self {
        Self {
            el_block,
            multicall: Multicall::new(client.clone(), addresses.multicall, multicall_batch_size),
            balance_batcher: BalanceBatcher::new(
                client.clone(),
                addresses.multicall,
                multicall_batch_size,
            ),
            node_manager: INodeManager::new(addresses.node_manager, client.clone()),
            node_staking: INodeStaking::new(addresses.node_staking, client.clone()),
            staking_pool_manager: IStakingPoolManager::new(
                addresses.staking_pool_manager,
                client.clone(),
            ),
            distributor_factory: IDistributorFactory::new(
                addresses.distributor_factory,
                client.clone(),
            ),
            node_deposit: INodeDeposit::new(addresses.node_deposit, client.clone()),
            protocol_storage: IProtocolStorage::new(addresses.protocol_storage, client.clone()),
            token_lst: Erc20::new(addresses.token_lst, client.clone()),
            token_gov: Erc20::new(addresses.token_gov, client.clone()),
            token_gov_legacy: Erc20::new(addresses.token_gov_legacy, client.clone()),
            client,
            multicall_batch_size,
        }
    }

    pub fn client(&self) -> Arc<M> {
        self.client.clone()
    }

    /// Reference block as a `BlockId` for contract calls.
    pub fn block_id(&self) -> BlockId {
        BlockId::from(self.el_block.as_u64())
    }

    /// A fresh multicall executor for one worker. Executors accumulate no state
    /// here, but each concurrent chunk still gets its own instance so batching
    /// decisions stay isolated per worker.
    pub fn fresh_multicall(&self) -> Multicall<M> {
        Multicall::new(
            self.client.clone(),
            self.multicall.address(),
            self.multicall_batch_size,
        )
    }
}
