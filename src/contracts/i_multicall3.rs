use ethers::prelude::abigen;

// Only the helper views are bound here; `aggregate3` itself is encoded manually
// in the multicall module so the batch layout stays under our control.
abigen!(
    IMulticall3,
    r#"[
        function getEthBalance(address addr) external view returns (uint256 balance)
        function getBlockNumber() external view returns (uint256 blockNumber)
        function getCurrentBlockTimestamp() external view returns (uint256 timestamp)
    ]"#
);
