use ethers::prelude::abigen;

abigen!(
    IStakingPoolManager,
    r#"[
        function getStakingPoolCount() external view returns (uint256)
        function getNodeStakingPoolCount(address nodeAddress) external view returns (uint256)
    ]"#
);
