use ethers::prelude::abigen;

abigen!(
    IDistributorFactory,
    r#"[
        function getProxyAddress(address nodeAddress) external view returns (address)
    ]"#
);
