//! Integration tests for the deploy scripts

use alloy::{
    primitives::{Address, Bytes},
    providers::Provider,
};
use eyre::{ensure, Result};
use scripts::{
    commands::{
        deploy_contract, deploy_proxy, deploy_public_sale, grant_role, implementation_key,
        print_implementation, upgrade_proxy,
    },
    types::{DeployableContract, Role},
    utils::read_deployment,
};

use crate::{
    abis::IAccessControl, constants::TEST_CONFIRMATIONS, integration_test,
    test_inventory::TestArgs,
};

/// Test deploying a contract without a proxy
async fn test_deploy_plain_contract(args: TestArgs) -> Result<()> {
    let ctx = &args.ctx;
    let contract = DeployableContract::UsdCoin;

    let address = deploy_contract(ctx, contract, &[], TEST_CONFIRMATIONS, false).await?;

    let code = ctx.client.get_code_at(address).await?;
    ensure!(!code.is_empty(), "no code at {address:#x}");

    let recorded = read_deployment(contract.artifact_name(), &ctx.deployments_path)?;
    ensure!(recorded == address, "deployment recorded at {recorded:#x}, expected {address:#x}");

    Ok(())
}
integration_test!(test_deploy_plain_contract);

/// Test deploying the public sale behind a proxy and upgrading it
async fn test_deploy_and_upgrade_proxy(args: TestArgs) -> Result<()> {
    let ctx = &args.ctx;
    let contract = DeployableContract::PublicSale;

    let (proxy, implementation) =
        deploy_proxy(ctx, contract, &[], TEST_CONFIRMATIONS, false).await?;
    ensure!(proxy != implementation, "proxy and implementation coincide");

    let new_implementation = upgrade_proxy(
        ctx,
        contract,
        Some(proxy),
        Bytes::new(),
        TEST_CONFIRMATIONS,
        false,
    )
    .await?;
    ensure!(
        new_implementation != implementation,
        "upgrade did not deploy a new implementation"
    );

    let recorded = print_implementation(ctx, &contract.to_string(), proxy).await?;
    ensure!(recorded == new_implementation, "proxy points at {recorded:#x}");

    let recorded_proxy = read_deployment(contract.artifact_name(), &ctx.deployments_path)?;
    let recorded_implementation =
        read_deployment(&implementation_key(contract), &ctx.deployments_path)?;
    ensure!(recorded_proxy == proxy, "proxy address changed in deployments");
    ensure!(
        recorded_implementation == new_implementation,
        "implementation not updated in deployments"
    );

    Ok(())
}
integration_test!(test_deploy_and_upgrade_proxy);

/// Test that a contract not behind a proxy can neither be inspected nor upgraded as one
async fn test_upgrade_non_proxy(args: TestArgs) -> Result<()> {
    let ctx = &args.ctx;

    let plain = deploy_contract(
        ctx,
        DeployableContract::MiPrimerNft,
        &[],
        TEST_CONFIRMATIONS,
        false,
    )
    .await?;

    let inspected = print_implementation(ctx, "MiPrimerNft", plain).await;
    ensure!(inspected.is_err(), "inspected a plain contract as a proxy");

    let upgraded = upgrade_proxy(
        ctx,
        DeployableContract::PublicSale,
        Some(plain),
        Bytes::new(),
        TEST_CONFIRMATIONS,
        false,
    )
    .await;
    ensure!(upgraded.is_err(), "upgraded a plain contract");

    Ok(())
}
integration_test!(test_upgrade_non_proxy);

/// Test granting the minter role on the token
async fn test_grant_minter_role(args: TestArgs) -> Result<()> {
    let ctx = &args.ctx;

    let token = deploy_contract(
        ctx,
        DeployableContract::MiPrimerToken,
        &[],
        TEST_CONFIRMATIONS,
        false,
    )
    .await?;
    let minter = Address::random();

    grant_role(ctx, token, Role::Minter, minter).await?;
    // Granting a role that is already held is a no-op
    grant_role(ctx, token, Role::Minter, minter).await?;

    let access_control = IAccessControl::new(token, ctx.client.clone());
    let is_minter = access_control.hasRole(Role::Minter.id(), minter).call().await?;
    let is_burner = access_control.hasRole(Role::Burner.id(), minter).call().await?;

    ensure!(is_minter, "minter role not granted");
    ensure!(!is_burner, "burner role granted unexpectedly");

    Ok(())
}
integration_test!(test_grant_minter_role);

/// Test upgrading the public sale through the proxy recorded in the deployments file
async fn test_upgrade_recorded_proxy(args: TestArgs) -> Result<()> {
    let ctx = &args.ctx;
    let contract = DeployableContract::PublicSale;

    let (proxy, implementation) =
        deploy_proxy(ctx, contract, &[], TEST_CONFIRMATIONS, false).await?;

    let new_implementation = upgrade_proxy(
        ctx,
        contract,
        None, /* proxy */
        Bytes::new(),
        TEST_CONFIRMATIONS,
        false,
    )
    .await?;
    ensure!(
        new_implementation != implementation,
        "upgrade did not deploy a new implementation"
    );

    let recorded = print_implementation(ctx, &contract.to_string(), proxy).await?;
    ensure!(
        recorded == new_implementation,
        "recorded proxy {proxy:#x} was not upgraded, it points at {recorded:#x}"
    );

    Ok(())
}
integration_test!(test_upgrade_recorded_proxy);

/// Test that deploying the public sale lets it mint the given token
async fn test_deploy_public_sale_grants_minter(args: TestArgs) -> Result<()> {
    let ctx = &args.ctx;

    let token = deploy_contract(
        ctx,
        DeployableContract::MiPrimerToken,
        &[],
        TEST_CONFIRMATIONS,
        false,
    )
    .await?;

    deploy_public_sale(ctx, Some(token)).await?;
    let sale = read_deployment(
        DeployableContract::PublicSale.artifact_name(),
        &ctx.deployments_path,
    )?;

    let access_control = IAccessControl::new(token, ctx.client.clone());
    let is_minter = access_control.hasRole(Role::Minter.id(), sale).call().await?;
    ensure!(is_minter, "public sale {sale:#x} cannot mint {token:#x}");

    Ok(())
}
integration_test!(test_deploy_public_sale_grants_minter);
