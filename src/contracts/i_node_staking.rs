use ethers::prelude::abigen;

abigen!(
    INodeStaking,
    r#"[
        function getNodeStake(address nodeAddress) external view returns (uint256)
        function getNodeEffectiveStake(address nodeAddress) external view returns (uint256)
        function getNodeMinimumStake(address nodeAddress) external view returns (uint256)
        function getNodeMaximumStake(address nodeAddress) external view returns (uint256)
        function getNodeEthMatched(address nodeAddress) external view returns (uint256)
        function getNodeEthMatchedLimit(address nodeAddress) external view returns (uint256)
    ]"#
);
