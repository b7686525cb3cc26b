//! Constants used in the integration tests

/// The default hostport that the Anvil devnet node runs on
pub(crate) const DEFAULT_DEVNET_HOSTPORT: &str = "http://127.0.0.1:8545";

/// The default private key for the tests, the first default account in an Anvil node
pub(crate) const DEFAULT_DEVNET_PKEY: &str =
    "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

/// The default path of the deployments file written by the tests
pub(crate) const DEFAULT_DEPLOYMENTS_PATH: &str = "deployments.devnet.json";

/// The number of confirmations to wait for in the tests
pub(crate) const TEST_CONFIRMATIONS: u64 = 1;
