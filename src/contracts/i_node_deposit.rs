use ethers::prelude::abigen;

abigen!(
    INodeDeposit,
    r#"[
        function getNodeDepositCredit(address nodeAddress) external view returns (uint256)
    ]"#
);
