//! Definitions of Solidity interfaces called during deployment

use alloy::sol;

sol! {
    /// The upgrade interface of OpenZeppelin's `UUPSUpgradeable`
    #[sol(rpc)]
    interface IUUPSUpgradeable {
        function UPGRADE_INTERFACE_VERSION() external view returns (string memory);
        function proxiableUUID() external view returns (bytes32);
        function upgradeTo(address newImplementation) external;
        function upgradeToAndCall(address newImplementation, bytes memory data) external payable;
    }

    /// OpenZeppelin's `AccessControl`
    #[sol(rpc)]
    interface IAccessControl {
        function hasRole(bytes32 role, address account) external view returns (bool);
        function grantRole(bytes32 role, address account) external;
    }
}
