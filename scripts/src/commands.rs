//! Implementations of the various deploy scripts

use std::{path::Path, str::FromStr};

use alloy::{
    primitives::{Address, Bytes, B256},
    sol_types::SolValue,
};
use tracing::{info, warn};

use crate::{
    artifacts::{load_artifact, ContractArtifact},
    calldata::{constructor_calldata, initializer_calldata},
    constants::{
        IMPLEMENTATION_KEY_SUFFIX, IMPLEMENTATION_STORAGE_SLOT, NUM_SETUP_CONFIRMATIONS,
        NUM_UPGRADE_CONFIRMATIONS, UPGRADE_INTERFACE_VERSION_V5,
    },
    context::ScriptContext,
    errors::ScriptError,
    solidity::{IAccessControl, IUUPSUpgradeable},
    types::{DeployableContract, Role},
    utils::{
        confirmations_for_chain, deploy_code, read_address_slot, send_tx, try_read_deployment,
        write_deployment, Client,
    },
    verify::VerificationRequest,
};

// -------------------
// | Generic Scripts |
// -------------------

/// Deploy a contract directly, without a proxy, returning its address
pub async fn deploy_contract(
    ctx: &ScriptContext,
    contract: DeployableContract,
    args: &[String],
    confirmations: u64,
    verify: bool,
) -> Result<Address, ScriptError> {
    if contract.is_upgradeable() {
        return Err(ScriptError::ContractDeployment(format!(
            "{contract} is deployed behind a proxy, use `deploy-proxy`"
        )));
    }

    let artifact = load_artifact(&ctx.artifacts_dir, contract.artifact_name())?;
    let constructor_args = Bytes::from(constructor_calldata(&artifact.abi, args)?);
    let creation_code = artifact.creation_code(args)?;

    let confirmations = confirmations_for_chain(ctx.chain_id, confirmations);
    let address = deploy_code(&ctx.client, creation_code, confirmations).await?;

    info!("{} deployed at {:#x}", contract, address);
    write_deployment(contract.artifact_name(), address, &ctx.deployments_path)?;

    if verify {
        verify_or_log(ctx, &artifact, address, constructor_args).await;
    }

    Ok(address)
}

/// Deploy a contract behind an ERC1967 proxy, in the UUPS pattern,
/// returning the addresses of the proxy and the implementation.
///
/// The proxy calls the implementation's `initialize` method with the given
/// arguments upon construction.
pub async fn deploy_proxy(
    ctx: &ScriptContext,
    contract: DeployableContract,
    init_args: &[String],
    confirmations: u64,
    verify: bool,
) -> Result<(Address, Address), ScriptError> {
    if !contract.is_upgradeable() {
        return Err(ScriptError::ContractDeployment(format!(
            "{contract} is not upgradeable, use `deploy`"
        )));
    }

    let artifact = load_artifact(&ctx.artifacts_dir, contract.artifact_name())?;
    let proxy_artifact = ContractArtifact::from_file(&ctx.proxy_artifact)?;
    let confirmations = confirmations_for_chain(ctx.chain_id, confirmations);

    // Deploy the implementation, initializers replace constructors in upgradeable contracts
    let implementation_code = artifact.creation_code(&[])?;
    let implementation = deploy_code(&ctx.client, implementation_code, confirmations).await?;
    ensure_uups_implementation(ctx, implementation).await?;

    // Deploy the proxy pointing at the implementation
    let init_data = initializer_calldata(&artifact.abi, init_args)?;
    let proxy_args = (implementation, init_data).abi_encode_params();
    let mut proxy_code = proxy_artifact.bytecode()?.to_vec();
    proxy_code.extend(proxy_args);

    let proxy = deploy_code(&ctx.client, proxy_code.into(), confirmations).await?;

    let recorded = print_implementation(ctx, &contract.to_string(), proxy).await?;
    if recorded != implementation {
        return Err(ScriptError::ContractDeployment(format!(
            "proxy {proxy:#x} points at {recorded:#x}, expected {implementation:#x}"
        )));
    }

    write_deployment(contract.artifact_name(), proxy, &ctx.deployments_path)?;
    write_deployment(
        &implementation_key(contract),
        implementation,
        &ctx.deployments_path,
    )?;

    if verify {
        verify_or_log(ctx, &artifact, implementation, Bytes::new()).await;
    }

    Ok((proxy, implementation))
}

/// Upgrade a UUPS proxy to a freshly deployed implementation of the contract,
/// returning the address of the new implementation
pub async fn upgrade_proxy(
    ctx: &ScriptContext,
    contract: DeployableContract,
    proxy: Option<Address>,
    calldata: Bytes,
    confirmations: u64,
    verify: bool,
) -> Result<Address, ScriptError> {
    if !contract.is_upgradeable() {
        return Err(ScriptError::ContractInteraction(format!(
            "{contract} is not deployed behind a proxy"
        )));
    }

    let proxy = resolve_proxy(&ctx.deployments_path, contract, proxy)?;
    let artifact = load_artifact(&ctx.artifacts_dir, contract.artifact_name())?;
    let confirmations = confirmations_for_chain(ctx.chain_id, confirmations);

    let implementation_code = artifact.creation_code(&[])?;
    let implementation = deploy_code(&ctx.client, implementation_code, confirmations).await?;
    ensure_uups_implementation(ctx, implementation).await?;

    let proxy_contract = IUUPSUpgradeable::new(proxy, ctx.client.clone());

    // OpenZeppelin v5 only exposes `upgradeToAndCall`. Earlier versions force a call
    // into the new implementation from `upgradeToAndCall`, so `upgradeTo` is used
    // whenever there is nothing to call.
    let interface_version = proxy_contract.UPGRADE_INTERFACE_VERSION().call().await.ok();
    if interface_version.as_deref() == Some(UPGRADE_INTERFACE_VERSION_V5) || !calldata.is_empty()
    {
        send_tx(
            proxy_contract.upgradeToAndCall(implementation, calldata),
            confirmations,
        )
        .await?;
    } else {
        send_tx(proxy_contract.upgradeTo(implementation), confirmations).await?;
    }

    let recorded = print_implementation(ctx, &contract.to_string(), proxy).await?;
    if recorded != implementation {
        return Err(ScriptError::ContractInteraction(format!(
            "proxy {proxy:#x} still points at {recorded:#x} after upgrade"
        )));
    }

    write_deployment(
        &implementation_key(contract),
        implementation,
        &ctx.deployments_path,
    )?;

    if verify {
        verify_or_log(ctx, &artifact, implementation, Bytes::new()).await;
    }

    Ok(implementation)
}

/// Log the addresses of a proxy and its implementation, returning the latter
pub async fn print_implementation(
    ctx: &ScriptContext,
    name: &str,
    proxy: Address,
) -> Result<Address, ScriptError> {
    info!("{name} Proxy Address: {proxy:#x}");

    let implementation =
        read_address_slot(&ctx.client, proxy, IMPLEMENTATION_STORAGE_SLOT).await?;
    if implementation.is_zero() {
        return Err(ScriptError::ContractInteraction(format!(
            "{proxy:#x} is not an ERC1967 proxy"
        )));
    }

    info!("{name} Impl Address: {implementation:#x}");
    Ok(implementation)
}

/// Grant a role on an `AccessControl` contract to the given account
pub async fn grant_role(
    ctx: &ScriptContext,
    contract: Address,
    role: Role,
    account: Address,
) -> Result<(), ScriptError> {
    let access_control = IAccessControl::new(contract, ctx.client.clone());

    if has_role(&access_control, role, account).await? {
        info!("{account:#x} already has {role} on {contract:#x}");
        return Ok(());
    }

    let confirmations = confirmations_for_chain(ctx.chain_id, NUM_SETUP_CONFIRMATIONS);
    send_tx(access_control.grantRole(role.id(), account), confirmations).await?;

    if !has_role(&access_control, role, account).await? {
        return Err(ScriptError::ContractInteraction(format!(
            "{account:#x} does not have {role} on {contract:#x} after granting it"
        )));
    }

    info!("Granted {role} on {contract:#x} to {account:#x}");
    Ok(())
}

/// Verify the source code of a deployed contract, failing if the explorer rejects it
pub async fn verify_contract(
    ctx: &ScriptContext,
    artifact: &ContractArtifact,
    address: Address,
    constructor_args: Bytes,
) -> Result<(), ScriptError> {
    let verifier = match &ctx.verifier {
        Some(verifier) => verifier,
        None => {
            warn!(
                "Skipping verification of {} at {:#x}",
                artifact.contract_name, address
            );
            return Ok(());
        }
    };

    let build_info = artifact.build_info()?;
    let request = VerificationRequest {
        address,
        contract_name: artifact.fully_qualified_name(),
        compiler_version: build_info.solc_long_version,
        standard_json_input: build_info.input,
        constructor_args,
    };

    verifier.verify(&request).await?;
    Ok(())
}

/// Verify a contract as the last step of a deployment, in which case the
/// contract is already on chain and a failure is only reported
async fn verify_or_log(
    ctx: &ScriptContext,
    artifact: &ContractArtifact,
    address: Address,
    constructor_args: Bytes,
) {
    if let Err(e) = verify_contract(ctx, artifact, address, constructor_args).await {
        warn!("Error verifying {}: {}", artifact.contract_name, e);
    }
}

// -----------------
// | Named Scripts |
// -----------------

/// Deploy the public sale behind a proxy, optionally allowing it to mint the
/// given token
pub async fn deploy_public_sale(
    ctx: &ScriptContext,
    token: Option<Address>,
) -> Result<(), ScriptError> {
    let contract = DeployableContract::PublicSale;
    let (proxy, _) =
        deploy_proxy(ctx, contract, &[], contract.deploy_confirmations(), true).await?;

    // Set up
    if let Some(token) = token {
        grant_role(ctx, token, Role::Minter, proxy).await?;
    }

    Ok(())
}

/// Upgrade the published public sale proxy to the current implementation
pub async fn update_public_sale(ctx: &ScriptContext) -> Result<(), ScriptError> {
    upgrade_proxy(
        ctx,
        DeployableContract::PublicSale,
        None, /* proxy */
        Bytes::new(),
        NUM_UPGRADE_CONFIRMATIONS,
        true,
    )
    .await?;

    Ok(())
}

/// Deploy one of the contracts without constructor arguments and verify it
pub async fn deploy_simple(
    ctx: &ScriptContext,
    contract: DeployableContract,
) -> Result<(), ScriptError> {
    deploy_contract(ctx, contract, &[], contract.deploy_confirmations(), true).await?;
    Ok(())
}

// -----------
// | Helpers |
// -----------

/// The deployments file key of a proxied contract's implementation
pub fn implementation_key(contract: DeployableContract) -> String {
    format!("{}{}", contract.artifact_name(), IMPLEMENTATION_KEY_SUFFIX)
}

/// The deployments file key of the contract's code, i.e. the implementation
/// for a proxied contract
pub fn code_key(contract: DeployableContract) -> String {
    if contract.is_upgradeable() {
        implementation_key(contract)
    } else {
        contract.artifact_name().to_string()
    }
}

/// Determine the address of a contract's code: the given address, the one
/// recorded in the deployments file, or the published one
pub fn resolve_deployed_code(
    deployments_path: &Path,
    contract: DeployableContract,
    address: Option<Address>,
) -> Result<Address, ScriptError> {
    if let Some(address) = address {
        return Ok(address);
    }

    if let Some(address) = try_read_deployment(&code_key(contract), deployments_path)? {
        return Ok(address);
    }

    let published = contract.published_address();
    warn!("No {contract} deployment recorded, using the published one at {published:#x}");
    Ok(published)
}

/// Determine which proxy to upgrade: the given address, the one recorded in the
/// deployments file, or the published one
fn resolve_proxy(
    deployments_path: &Path,
    contract: DeployableContract,
    proxy: Option<Address>,
) -> Result<Address, ScriptError> {
    if let Some(proxy) = proxy {
        return Ok(proxy);
    }

    if let Some(proxy) = try_read_deployment(contract.artifact_name(), deployments_path)? {
        return Ok(proxy);
    }

    let published = contract.published_proxy_address().ok_or_else(|| {
        ScriptError::ReadDeployments(format!("no proxy recorded for {contract}"))
    })?;
    warn!("No {contract} proxy recorded, using the published one at {published:#x}");

    Ok(published)
}

/// Ensure a new implementation can be installed behind a UUPS proxy, i.e. that it
/// reports the ERC1967 implementation slot through `proxiableUUID`
async fn ensure_uups_implementation(
    ctx: &ScriptContext,
    implementation: Address,
) -> Result<(), ScriptError> {
    let expected = B256::from_str(IMPLEMENTATION_STORAGE_SLOT)
        .map_err(|e| ScriptError::ContractInteraction(e.to_string()))?;

    let uuid = IUUPSUpgradeable::new(implementation, ctx.client.clone())
        .proxiableUUID()
        .call()
        .await
        .map_err(|e| {
            ScriptError::ContractInteraction(format!(
                "{implementation:#x} is not a UUPS implementation: {e}"
            ))
        })?;

    if uuid != expected {
        return Err(ScriptError::ContractInteraction(format!(
            "{implementation:#x} reports an unsupported proxiable UUID {uuid:#x}"
        )));
    }

    Ok(())
}

/// Check whether an account holds a role
async fn has_role(
    access_control: &IAccessControl::IAccessControlInstance<Client>,
    role: Role,
    account: Address,
) -> Result<bool, ScriptError> {
    access_control
        .hasRole(role.id(), account)
        .call()
        .await
        .map_err(|e| ScriptError::ContractInteraction(e.to_string()))
}
