//! Utilities for the deploy scripts.

use std::{fs, path::Path, str::FromStr};

use alloy::{
    contract::{CallBuilder, CallDecoder},
    network::{Ethereum, TransactionBuilder},
    primitives::{Address, Bytes, U256},
    providers::{DynProvider, Provider, ProviderBuilder},
    rpc::types::{TransactionReceipt, TransactionRequest},
    signers::local::PrivateKeySigner,
    transports::http::reqwest::Url,
};
use serde_json::{Map, Value};
use tracing::debug;

use crate::{
    constants::{LOCAL_CHAIN_IDS, NUM_BYTES_ADDRESS, NUM_BYTES_STORAGE_SLOT},
    errors::ScriptError,
};

/// The provider type used by the scripts, carrying the deployer's wallet
pub type Client = DynProvider<Ethereum>;

/// The call builder type used by the scripts
pub type ScriptCallBuilder<'a, C> = CallBuilder<&'a Client, C, Ethereum>;

// ----------
// | Client |
// ----------

/// Sets up the client with which to deploy and interact with contracts,
/// returning it along with the address of the deployer
pub fn setup_client(priv_key: &str, rpc_url: &str) -> Result<(Client, Address), ScriptError> {
    let signer = PrivateKeySigner::from_str(priv_key)
        .map_err(|e| ScriptError::ClientInitialization(e.to_string()))?;
    let deployer = signer.address();

    let url = Url::parse(rpc_url).map_err(|e| ScriptError::ClientInitialization(e.to_string()))?;
    let provider = ProviderBuilder::new().wallet(signer).connect_http(url);

    Ok((DynProvider::new(provider), deployer))
}

/// Whether the chain is a local development node
pub fn is_local_chain(chain_id: u64) -> bool {
    LOCAL_CHAIN_IDS.contains(&chain_id)
}

/// The number of confirmations to actually wait for on the given chain.
///
/// Local nodes only mine blocks when transactions arrive, so waiting
/// for more than one confirmation there would never complete.
pub fn confirmations_for_chain(chain_id: u64, requested: u64) -> u64 {
    if is_local_chain(chain_id) {
        1
    } else {
        requested.max(1)
    }
}

// ----------------
// | Transactions |
// ----------------

/// Deploy the given creation code, wait for the given number of confirmations,
/// and return the address of the new contract
pub async fn deploy_code(
    client: &Client,
    code: Bytes,
    confirmations: u64,
) -> Result<Address, ScriptError> {
    let tx = TransactionRequest::default().with_deploy_code(code);

    let pending_tx = client
        .send_transaction(tx)
        .await
        .map_err(|e| ScriptError::ContractDeployment(e.to_string()))?;
    debug!(
        "Deployment transaction {:#x} sent, waiting for {} confirmations",
        pending_tx.tx_hash(),
        confirmations
    );

    let receipt = pending_tx
        .with_required_confirmations(confirmations)
        .get_receipt()
        .await
        .map_err(|e| ScriptError::ContractDeployment(e.to_string()))?;

    if !receipt.status() {
        return Err(ScriptError::ContractDeployment(format!(
            "deployment transaction {:#x} reverted",
            receipt.transaction_hash
        )));
    }

    let address = receipt.contract_address.ok_or_else(|| {
        ScriptError::ContractDeployment(format!(
            "no contract address in receipt of {:#x}",
            receipt.transaction_hash
        ))
    })?;

    let code = client
        .get_code_at(address)
        .await
        .map_err(|e| ScriptError::ContractDeployment(e.to_string()))?;
    if code.is_empty() {
        return Err(ScriptError::ContractDeployment(format!(
            "no code found at {address:#x} after deployment"
        )));
    }

    Ok(address)
}

/// Send a contract call as a transaction, wait for the given number of
/// confirmations, and ensure it succeeded
pub async fn send_tx<C: CallDecoder>(
    call: ScriptCallBuilder<'_, C>,
    confirmations: u64,
) -> Result<TransactionReceipt, ScriptError> {
    let receipt = call
        .send()
        .await
        .map_err(|e| ScriptError::ContractInteraction(e.to_string()))?
        .with_required_confirmations(confirmations)
        .get_receipt()
        .await
        .map_err(|e| ScriptError::ContractInteraction(e.to_string()))?;

    if !receipt.status() {
        return Err(ScriptError::ContractInteraction(format!(
            "transaction {:#x} reverted",
            receipt.transaction_hash
        )));
    }

    Ok(receipt)
}

// -----------
// | Storage |
// -----------

/// Read an address stored in the given slot of a contract's storage
pub async fn read_address_slot(
    client: &Client,
    contract: Address,
    slot: &str,
) -> Result<Address, ScriptError> {
    let slot =
        U256::from_str(slot).map_err(|e| ScriptError::ContractInteraction(e.to_string()))?;

    let word = client
        .get_storage_at(contract, slot)
        .await
        .map_err(|e| ScriptError::ContractInteraction(e.to_string()))?;

    Ok(address_from_word(word))
}

/// Extract an address from a storage word, in which it occupies the low-order bytes
pub fn address_from_word(word: U256) -> Address {
    Address::from_slice(
        &word.to_be_bytes::<NUM_BYTES_STORAGE_SLOT>()
            [NUM_BYTES_STORAGE_SLOT - NUM_BYTES_ADDRESS..NUM_BYTES_STORAGE_SLOT],
    )
}

// ---------------
// | Deployments |
// ---------------

/// Read the deployments file as a JSON object, treating a missing file as empty
fn read_deployments_file(deployments_path: &Path) -> Result<Map<String, Value>, ScriptError> {
    if !deployments_path.exists() {
        return Ok(Map::new());
    }

    let contents = fs::read_to_string(deployments_path).map_err(|e| {
        ScriptError::ReadDeployments(format!("{}: {}", deployments_path.display(), e))
    })?;

    serde_json::from_str(&contents).map_err(|e| {
        ScriptError::ReadDeployments(format!("{}: {}", deployments_path.display(), e))
    })
}

/// Read an address from the deployments file, if one is recorded for the given key
pub fn try_read_deployment(
    key: &str,
    deployments_path: &Path,
) -> Result<Option<Address>, ScriptError> {
    let deployments = read_deployments_file(deployments_path)?;

    deployments
        .get(key)
        .map(|value| {
            let addr_str = value.as_str().ok_or_else(|| {
                ScriptError::ReadDeployments(format!("value for {key} is not a string"))
            })?;

            Address::from_str(addr_str)
                .map_err(|e| ScriptError::ReadDeployments(format!("{addr_str}: {e}")))
        })
        .transpose()
}

/// Read an address from the deployments file, failing if none is recorded
pub fn read_deployment(key: &str, deployments_path: &Path) -> Result<Address, ScriptError> {
    try_read_deployment(key, deployments_path)?.ok_or_else(|| {
        ScriptError::ReadDeployments(format!(
            "key {} not found in {}",
            key,
            deployments_path.display()
        ))
    })
}

/// Record a deployed address in the deployments file, creating it if needed
pub fn write_deployment(
    key: &str,
    address: Address,
    deployments_path: &Path,
) -> Result<(), ScriptError> {
    let mut deployments = read_deployments_file(deployments_path)?;
    deployments.insert(key.to_string(), Value::String(format!("{address:#x}")));

    let contents = serde_json::to_string_pretty(&deployments)
        .map_err(|e| ScriptError::WriteDeployments(e.to_string()))?;
    fs::write(deployments_path, contents).map_err(|e| {
        ScriptError::WriteDeployments(format!("{}: {}", deployments_path.display(), e))
    })
}
