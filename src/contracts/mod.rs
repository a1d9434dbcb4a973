// Contracts Module - Public ABIs Only

pub mod erc20;
pub mod i_distributor_factory;
pub mod i_multicall3;
pub mod i_node_deposit;
pub mod i_node_manager;
pub mod i_node_staking;
pub mod i_protocol_storage;
pub mod i_staking_pool_manager;

// Public exports
pub use erc20::Erc20;
pub use i_distributor_factory::IDistributorFactory;
pub use i_multicall3::IMulticall3;
pub use i_node_deposit::INodeDeposit;
pub use i_node_manager::INodeManager;
pub use i_node_staking::INodeStaking;
pub use i_protocol_storage::IProtocolStorage;
pub use i_staking_pool_manager::IStakingPoolManager;
