//! Solidity ABI definitions for the contracts used in integration tests

use alloy::sol;

sol! {
    #[sol(rpc)]
    interface IAccessControl {
        function hasRole(bytes32 role, address account) external view returns (bool);
    }
}
