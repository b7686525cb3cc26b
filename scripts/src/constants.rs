//! Constants used in the deploy scripts

use std::time::Duration;

use alloy::primitives::{address, Address};

// ------------------------
// | Published Deployments |
// ------------------------

/// The address of the published `USDCoin` contract
pub const USDC_ADDRESS: Address = address!("424aa621EeCf2d5A4C5171750Eb2a6407A02fE21");

/// The address of the published `MiPrimerToken` contract
pub const MI_PRIMER_TOKEN_ADDRESS: Address = address!("fE865B499AADF5643E6a68a2E4Fe3D61ad1F9d64");

/// The address of the published `MiPrimerNft` contract
pub const MI_PRIMER_NFT_ADDRESS: Address = address!("7721DD243f638bA2751dA6c8112076cDdbe44f2F");

/// The address of the published `PublicSale` proxy contract
pub const PUBLIC_SALE_PROXY_ADDRESS: Address =
    address!("1D83FE68F02500380EF108f1a03b3F5e4B9865DD");

/// The address of the published `PublicSale` implementation contract
pub const PUBLIC_SALE_IMPLEMENTATION_ADDRESS: Address =
    address!("3d6B5610A0cf28B8Eab43D7B30440b7A8b9c8c0C");

// -----------------
// | Confirmations |
// -----------------

/// The number of confirmations to wait for a plain contract deployment
pub const NUM_DEPLOY_CONFIRMATIONS: u64 = 5;

/// The number of confirmations to wait for a proxy deployment
pub const NUM_PROXY_DEPLOY_CONFIRMATIONS: u64 = 5;

/// The number of confirmations to wait for a proxy upgrade
pub const NUM_UPGRADE_CONFIRMATIONS: u64 = 2;

/// The number of confirmations to wait for setup transactions, e.g. role grants
pub const NUM_SETUP_CONFIRMATIONS: u64 = 1;

/// Chain IDs of local development nodes, on which blocks are only mined
/// when transactions arrive
pub const LOCAL_CHAIN_IDS: [u64; 2] = [31337, 1337];

// ---------
// | Roles |
// ---------

/// The name of the minter role in the token contracts
pub const MINTER_ROLE_NAME: &str = "MINTER_ROLE";

/// The name of the burner role in the token contracts
pub const BURNER_ROLE_NAME: &str = "BURNER_ROLE";

// ---------
// | Proxy |
// ---------

/// The storage slot containing the implementation address in an ERC1967 proxy.
///
/// This is specified in EIP1967: https://eips.ethereum.org/EIPS/eip-1967#logic-contract-address
pub const IMPLEMENTATION_STORAGE_SLOT: &str =
    "0x360894a13ba1a3210667c828492db98dca3e2076cc3735a920a3ca505d382bbc";

/// The number of bytes stored in a single storage slot
pub const NUM_BYTES_STORAGE_SLOT: usize = 32;

/// The number of bytes in an Ethereum address
pub const NUM_BYTES_ADDRESS: usize = 20;

/// The name of the initializer function invoked through the proxy on deployment
pub const INITIALIZER_FUNCTION: &str = "initialize";

/// The `UPGRADE_INTERFACE_VERSION` reported by OpenZeppelin v5 UUPS contracts,
/// which only expose `upgradeToAndCall`
pub const UPGRADE_INTERFACE_VERSION_V5: &str = "5.0.0";

// -------------
// | Artifacts |
// -------------

/// The default directory holding the Hardhat compilation artifacts
pub const DEFAULT_ARTIFACTS_DIR: &str = "artifacts";

/// The default path of the ERC1967 proxy artifact, as shipped by the
/// OpenZeppelin upgrades tooling
pub const DEFAULT_PROXY_ARTIFACT: &str = "node_modules/@openzeppelin/upgrades-core/artifacts/@openzeppelin/contracts/proxy/ERC1967/ERC1967Proxy.sol/ERC1967Proxy.json";

/// The name of the directory holding build info within the artifacts directory
pub const BUILD_INFO_DIR: &str = "build-info";

/// The extension of artifact files
pub const ARTIFACT_EXTENSION: &str = "json";

/// The suffix of the debug files pointing at an artifact's build info
pub const DBG_SUFFIX: &str = ".dbg.json";

/// The separator between source name and contract name in a fully qualified name
pub const FQN_SEPARATOR: char = ':';

// ---------------
// | Deployments |
// ---------------

/// The default path of the deployments file
pub const DEFAULT_DEPLOYMENTS_PATH: &str = "deployments.json";

/// The suffix appended to a contract name to key its implementation
/// in the deployments file
pub const IMPLEMENTATION_KEY_SUFFIX: &str = "Implementation";

// ----------------
// | Verification |
// ----------------

/// The default Etherscan API endpoint, the v2 multichain API
pub const DEFAULT_ETHERSCAN_API_URL: &str = "https://api.etherscan.io/v2/api";

/// The code format used when submitting a verification request
pub const STANDARD_JSON_CODE_FORMAT: &str = "solidity-standard-json-input";

/// The number of times to submit a verification request while the explorer
/// has not yet indexed the contract bytecode
pub const VERIFY_SUBMIT_ATTEMPTS: usize = 5;

/// The number of times to poll the status of a verification request
pub const VERIFY_POLL_ATTEMPTS: usize = 20;

/// The delay between verification API requests
pub const VERIFY_RETRY_DELAY: Duration = Duration::from_secs(5);

/// The timeout of a single request to the explorer API
pub const VERIFY_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
