//! Type definitions used throughout the scripts

use std::fmt::{self, Display};

use alloy::primitives::{keccak256, Address, B256};
use clap::ValueEnum;

use crate::constants::{
    BURNER_ROLE_NAME, MINTER_ROLE_NAME, MI_PRIMER_NFT_ADDRESS, MI_PRIMER_TOKEN_ADDRESS,
    NUM_DEPLOY_CONFIRMATIONS, NUM_PROXY_DEPLOY_CONFIRMATIONS, PUBLIC_SALE_IMPLEMENTATION_ADDRESS,
    PUBLIC_SALE_PROXY_ADDRESS, USDC_ADDRESS,
};

/// The contracts managed by the scripts
#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
pub enum DeployableContract {
    /// The public sale contract, deployed behind a UUPS proxy
    PublicSale,
    /// The NFT collection sold in the public sale
    MiPrimerNft,
    /// The ERC20 token used to pay in the public sale
    MiPrimerToken,
    /// The mock USDC stablecoin
    UsdCoin,
}

impl DeployableContract {
    /// The name of the contract as it appears in the compilation artifacts
    pub fn artifact_name(&self) -> &'static str {
        match self {
            DeployableContract::PublicSale => "PublicSale",
            DeployableContract::MiPrimerNft => "MiPrimerNft",
            DeployableContract::MiPrimerToken => "MiPrimerToken",
            DeployableContract::UsdCoin => "USDCoin",
        }
    }

    /// Whether the contract is deployed behind an upgradeable proxy
    pub fn is_upgradeable(&self) -> bool {
        matches!(self, DeployableContract::PublicSale)
    }

    /// The number of confirmations to wait for when deploying the contract
    pub fn deploy_confirmations(&self) -> u64 {
        if self.is_upgradeable() {
            NUM_PROXY_DEPLOY_CONFIRMATIONS
        } else {
            NUM_DEPLOY_CONFIRMATIONS
        }
    }

    /// The address of the contract's published code.
    ///
    /// For a contract deployed behind a proxy this is the implementation.
    pub fn published_address(&self) -> Address {
        match self {
            DeployableContract::PublicSale => PUBLIC_SALE_IMPLEMENTATION_ADDRESS,
            DeployableContract::MiPrimerNft => MI_PRIMER_NFT_ADDRESS,
            DeployableContract::MiPrimerToken => MI_PRIMER_TOKEN_ADDRESS,
            DeployableContract::UsdCoin => USDC_ADDRESS,
        }
    }

    /// The address of the contract's published proxy, if it has one
    pub fn published_proxy_address(&self) -> Option<Address> {
        self.is_upgradeable().then_some(PUBLIC_SALE_PROXY_ADDRESS)
    }
}

impl Display for DeployableContract {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.artifact_name())
    }
}

/// The access control roles granted by the scripts
#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
pub enum Role {
    /// The role allowed to mint tokens
    Minter,
    /// The role allowed to burn tokens
    Burner,
    /// The admin role, which can grant and revoke every other role
    Admin,
}

impl Role {
    /// The role identifier used on-chain
    pub fn id(&self) -> B256 {
        match self {
            Role::Minter => get_role(MINTER_ROLE_NAME),
            Role::Burner => get_role(BURNER_ROLE_NAME),
            // `DEFAULT_ADMIN_ROLE` is the zero word in OpenZeppelin's `AccessControl`
            Role::Admin => B256::ZERO,
        }
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Minter => write!(f, "{MINTER_ROLE_NAME}"),
            Role::Burner => write!(f, "{BURNER_ROLE_NAME}"),
            Role::Admin => write!(f, "DEFAULT_ADMIN_ROLE"),
        }
    }
}

/// Derive a role identifier from its name, as `AccessControl` contracts do
pub fn get_role(name: &str) -> B256 {
    keccak256(name.as_bytes())
}
