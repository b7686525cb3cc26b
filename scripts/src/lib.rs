//! Scripts for deploying, upgrading, and verifying the public sale contracts.

#![deny(missing_docs)]
#![deny(clippy::missing_docs_in_private_items)]

pub mod artifacts;
pub mod calldata;
pub mod cli;
pub mod commands;
pub mod constants;
pub mod context;
pub mod errors;
mod solidity;
pub mod types;
pub mod utils;
pub mod verify;
