use ethers::prelude::abigen;

abigen!(
    IProtocolStorage,
    r#"[
        function getAddress(bytes32 key) external view returns (address)
        function getUint(bytes32 key) external view returns (uint256)
        function getBool(bytes32 key) external view returns (bool)
        function getNodeWithdrawalAddress(address nodeAddress) external view returns (address)
        function getNodePendingWithdrawalAddress(address nodeAddress) external view returns (address)
    ]"#
);
