use ethers::prelude::abigen;

abigen!(
    INodeManager,
    r#"[
        function getNodeCount() external view returns (uint256)
        function getNodeAt(uint256 index) external view returns (address)
        function getNodeExists(address nodeAddress) external view returns (bool)
        function getNodeRegistrationTime(address nodeAddress) external view returns (uint256)
        function getNodeTimezoneLocation(address nodeAddress) external view returns (string)
        function getFeeDistributorInitialised(address nodeAddress) external view returns (bool)
        function getAverageNodeFee(address nodeAddress) external view returns (uint256)
        function getRewardNetwork(address nodeAddress) external view returns (uint256)
        function getSmoothingPoolRegistrationState(address nodeAddress) external view returns (bool)
        function getSmoothingPoolRegistrationChanged(address nodeAddress) external view returns (uint256)
    ]"#
);
