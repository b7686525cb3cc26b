//! Lookup and parsing of Hardhat compilation artifacts, which act as the
//! contract factories for the deploy scripts

use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use alloy::{json_abi::JsonAbi, primitives::Bytes};
use itertools::Itertools;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::{
    calldata::constructor_calldata,
    constants::{ARTIFACT_EXTENSION, BUILD_INFO_DIR, DBG_SUFFIX, FQN_SEPARATOR},
    errors::ScriptError,
};

/// A compiled contract, as emitted by Hardhat under `artifacts/`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractArtifact {
    /// The name of the contract
    pub contract_name: String,
    /// The path of the source file declaring the contract,
    /// relative to the project root
    pub source_name: String,
    /// The contract ABI
    pub abi: JsonAbi,
    /// The hex-encoded creation bytecode, which may contain
    /// unlinked library placeholders
    bytecode: String,
    /// Library placeholders in the creation bytecode, keyed by source name
    #[serde(default)]
    link_references: Map<String, Value>,
    /// The path the artifact was read from
    #[serde(skip)]
    path: PathBuf,
}

/// The debug file emitted next to each artifact, pointing at the
/// build info for the compilation that produced it
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DebugFile {
    /// The path of the build info file, relative to the debug file
    build_info: String,
}

/// The compiler input and version that produced a set of artifacts
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildInfo {
    /// The full solc version, e.g. `0.8.9+commit.e5eed63a`
    pub solc_long_version: String,
    /// The solc standard JSON input
    pub input: Value,
}

impl ContractArtifact {
    /// Read an artifact from the given path
    pub fn from_file(path: &Path) -> Result<Self, ScriptError> {
        let contents = fs::read_to_string(path).map_err(|e| {
            ScriptError::ArtifactParsing(format!("reading {}: {}", path.display(), e))
        })?;

        let mut artifact: ContractArtifact = serde_json::from_str(&contents).map_err(|e| {
            ScriptError::ArtifactParsing(format!("parsing {}: {}", path.display(), e))
        })?;
        artifact.path = path.to_path_buf();

        Ok(artifact)
    }

    /// The fully qualified name of the contract, `<source>:<contract>`
    pub fn fully_qualified_name(&self) -> String {
        format!("{}{}{}", self.source_name, FQN_SEPARATOR, self.contract_name)
    }

    /// The creation bytecode of the contract
    pub fn bytecode(&self) -> Result<Bytes, ScriptError> {
        if !self.link_references.is_empty() {
            let libraries = self
                .link_references
                .values()
                .filter_map(Value::as_object)
                .flat_map(|libs| libs.keys())
                .join(", ");

            return Err(ScriptError::ArtifactParsing(format!(
                "{} requires linking libraries: {}",
                self.contract_name, libraries
            )));
        }

        let bytecode = Bytes::from_str(&self.bytecode)
            .map_err(|e| ScriptError::ArtifactParsing(e.to_string()))?;

        if bytecode.is_empty() {
            return Err(ScriptError::ArtifactParsing(format!(
                "{} is abstract or an interface, it has no bytecode",
                self.contract_name
            )));
        }

        Ok(bytecode)
    }

    /// The code of a creation transaction for the contract:
    /// its bytecode followed by the ABI-encoded constructor arguments
    pub fn creation_code(&self, args: &[String]) -> Result<Bytes, ScriptError> {
        let mut code = self.bytecode()?.to_vec();
        code.extend(constructor_calldata(&self.abi, args)?);
        Ok(code.into())
    }

    /// Read the build info referenced by the artifact's debug file
    pub fn build_info(&self) -> Result<BuildInfo, ScriptError> {
        let dbg_path = self
            .path
            .with_file_name(format!("{}{}", self.contract_name, DBG_SUFFIX));
        let dbg_contents = fs::read_to_string(&dbg_path).map_err(|e| {
            ScriptError::ArtifactNotFound(format!("reading {}: {}", dbg_path.display(), e))
        })?;
        let dbg: DebugFile = serde_json::from_str(&dbg_contents)
            .map_err(|e| ScriptError::ArtifactParsing(e.to_string()))?;

        let build_info_path = dbg_path
            .parent()
            .map(|dir| dir.join(&dbg.build_info))
            .unwrap_or_else(|| PathBuf::from(&dbg.build_info));
        let build_info_contents = fs::read_to_string(&build_info_path).map_err(|e| {
            ScriptError::ArtifactNotFound(format!("reading {}: {}", build_info_path.display(), e))
        })?;

        serde_json::from_str(&build_info_contents)
            .map_err(|e| ScriptError::ArtifactParsing(e.to_string()))
    }
}

/// Read the artifact for the given contract from the artifacts directory
pub fn load_artifact(artifacts_dir: &Path, name: &str) -> Result<ContractArtifact, ScriptError> {
    let path = find_artifact(artifacts_dir, name)?;
    ContractArtifact::from_file(&path)
}

/// Resolve the path of a contract's artifact.
///
/// The name is either a bare contract name, which must be unique across the
/// project, or a fully qualified `path/to/Source.sol:Contract` name.
pub fn find_artifact(artifacts_dir: &Path, name: &str) -> Result<PathBuf, ScriptError> {
    if let Some((source_name, contract_name)) = name.split_once(FQN_SEPARATOR) {
        let path = artifacts_dir
            .join(source_name)
            .join(contract_name)
            .with_extension(ARTIFACT_EXTENSION);

        return if path.is_file() {
            Ok(path)
        } else {
            Err(ScriptError::ArtifactNotFound(name.to_string()))
        };
    }

    let file_name = format!("{name}.{ARTIFACT_EXTENSION}");
    let mut candidates = Vec::new();
    collect_artifacts(artifacts_dir, &file_name, &mut candidates)?;

    match candidates.len() {
        0 => Err(ScriptError::ArtifactNotFound(format!(
            "{} in {}",
            name,
            artifacts_dir.display()
        ))),
        1 => Ok(candidates.remove(0)),
        _ => Err(ScriptError::ArtifactNotFound(format!(
            "{} is ambiguous, use a fully qualified name: {}",
            name,
            candidates.iter().map(|p| p.display()).join(", ")
        ))),
    }
}

/// Recursively collect the files under `dir` named `file_name`,
/// skipping build info
fn collect_artifacts(
    dir: &Path,
    file_name: &str,
    candidates: &mut Vec<PathBuf>,
) -> Result<(), ScriptError> {
    let entries = fs::read_dir(dir)
        .map_err(|e| ScriptError::ArtifactNotFound(format!("{}: {}", dir.display(), e)))?;

    for entry in entries {
        let path = entry
            .map_err(|e| ScriptError::ArtifactNotFound(e.to_string()))?
            .path();

        if path.is_dir() {
            if !path.ends_with(BUILD_INFO_DIR) {
                collect_artifacts(&path, file_name, candidates)?;
            }
        } else if path.file_name().is_some_and(|f| f == file_name) {
            candidates.push(path);
        }
    }

    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use std::fs;

    use serde_json::json;
    use tempfile::TempDir;

    use super::*;

    /// Write an artifact for a contract declared in `source_name` into
    /// a Hardhat-like directory tree
    pub(crate) fn write_artifact(
        root: &Path,
        source_name: &str,
        contract_name: &str,
        abi: Value,
        bytecode: &str,
    ) -> PathBuf {
        let dir = root.join(source_name);
        fs::create_dir_all(&dir).unwrap();

        let artifact = json!({
            "_format": "hh-sol-artifact-1",
            "contractName": contract_name,
            "sourceName": source_name,
            "abi": abi,
            "bytecode": bytecode,
            "deployedBytecode": bytecode,
            "linkReferences": {},
            "deployedLinkReferences": {},
        });
        let path = dir.join(format!("{contract_name}.json"));
        fs::write(&path, artifact.to_string()).unwrap();

        let dbg = json!({
            "_format": "hh-sol-dbg-1",
            "buildInfo": "../../build-info/abc123.json",
        });
        fs::write(dir.join(format!("{contract_name}.dbg.json")), dbg.to_string()).unwrap();

        path
    }

    #[test]
    fn test_find_by_bare_name() {
        let root = TempDir::new().unwrap();
        let expected = write_artifact(
            root.path(),
            "contracts/USDCoin.sol",
            "USDCoin",
            json!([]),
            "0x6080",
        );

        let found = find_artifact(root.path(), "USDCoin").unwrap();
        assert_eq!(found, expected);

        let artifact = load_artifact(root.path(), "USDCoin").unwrap();
        assert_eq!(artifact.fully_qualified_name(), "contracts/USDCoin.sol:USDCoin");
        assert_eq!(artifact.creation_code(&[]).unwrap(), Bytes::from(vec![0x60, 0x80]));
    }

    #[test]
    fn test_ambiguous_name_requires_qualification() {
        let root = TempDir::new().unwrap();
        write_artifact(root.path(), "contracts/A.sol", "Token", json!([]), "0x60");
        write_artifact(root.path(), "contracts/B.sol", "Token", json!([]), "0x61");

        let err = find_artifact(root.path(), "Token").unwrap_err();
        assert!(err.to_string().contains("ambiguous"));

        let found = find_artifact(root.path(), "contracts/B.sol:Token").unwrap();
        assert!(found.ends_with("contracts/B.sol/Token.json"));
    }

    #[test]
    fn test_missing_artifact() {
        let root = TempDir::new().unwrap();
        write_artifact(root.path(), "contracts/A.sol", "A", json!([]), "0x60");

        assert!(matches!(
            find_artifact(root.path(), "PublicSale"),
            Err(ScriptError::ArtifactNotFound(_))
        ));
        assert!(matches!(
            find_artifact(root.path(), "contracts/A.sol:B"),
            Err(ScriptError::ArtifactNotFound(_))
        ));
    }

    #[test]
    fn test_interface_has_no_bytecode() {
        let root = TempDir::new().unwrap();
        write_artifact(root.path(), "contracts/IToken.sol", "IToken", json!([]), "0x");

        let artifact = load_artifact(root.path(), "IToken").unwrap();
        assert!(artifact.bytecode().unwrap_err().to_string().contains("no bytecode"));
    }

    #[test]
    fn test_unlinked_libraries_are_rejected() {
        let root = TempDir::new().unwrap();
        let path = write_artifact(root.path(), "contracts/Sale.sol", "Sale", json!([]), "0x60");

        let contents = fs::read_to_string(&path).unwrap();
        let mut artifact: Value = serde_json::from_str(&contents).unwrap();
        artifact["linkReferences"] = json!({
            "contracts/Pricing.sol": {
                "Pricing": [{ "length": 20, "start": 1 }],
            },
        });
        fs::write(&path, artifact.to_string()).unwrap();

        let artifact = load_artifact(root.path(), "Sale").unwrap();
        let err = artifact.creation_code(&[]).unwrap_err();
        assert!(matches!(err, ScriptError::ArtifactParsing(_)));
        assert!(err.to_string().contains("requires linking libraries: Pricing"));
    }

    #[test]
    fn test_build_info_is_resolved_relative_to_artifact() {
        let root = TempDir::new().unwrap();
        write_artifact(root.path(), "contracts/Nft.sol", "MiPrimerNft", json!([]), "0x60");

        let build_info_dir = root.path().join(BUILD_INFO_DIR);
        fs::create_dir_all(&build_info_dir).unwrap();
        let build_info = json!({
            "_format": "hh-sol-build-info-1",
            "solcVersion": "0.8.9",
            "solcLongVersion": "0.8.9+commit.e5eed63a",
            "input": { "language": "Solidity", "sources": {} },
            "output": {},
        });
        fs::write(build_info_dir.join("abc123.json"), build_info.to_string()).unwrap();

        let artifact = load_artifact(root.path(), "MiPrimerNft").unwrap();
        let info = artifact.build_info().unwrap();
        assert_eq!(info.solc_long_version, "0.8.9+commit.e5eed63a");
        assert_eq!(info.input["language"], "Solidity");
    }
}
