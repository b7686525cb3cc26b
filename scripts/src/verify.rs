//! A client for Etherscan-compatible block explorer APIs, used to verify the
//! source code of deployed contracts

use std::{
    fmt::{self, Display, Formatter},
    time::Duration,
};

use alloy::primitives::{hex, Address, Bytes};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::{
    constants::{
        STANDARD_JSON_CODE_FORMAT, VERIFY_POLL_ATTEMPTS, VERIFY_REQUEST_TIMEOUT,
        VERIFY_RETRY_DELAY, VERIFY_SUBMIT_ATTEMPTS,
    },
    errors::ScriptError,
};

/// Errors that can occur while verifying a contract
#[derive(Debug)]
pub enum VerificationError {
    /// The HTTP request to the explorer failed
    Request(String),
    /// The explorer returned an error response
    Api(String),
    /// The explorer rejected the submitted source code
    Rejected(String),
    /// The explorer did not reach a verdict in time
    Timeout(String),
}

impl Display for VerificationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            VerificationError::Request(s) => write!(f, "explorer request failed: {}", s),
            VerificationError::Api(s) => write!(f, "explorer error: {}", s),
            VerificationError::Rejected(s) => write!(f, "verification rejected: {}", s),
            VerificationError::Timeout(s) => write!(f, "verification timed out: {}", s),
        }
    }
}

impl std::error::Error for VerificationError {}

impl From<VerificationError> for ScriptError {
    fn from(e: VerificationError) -> Self {
        ScriptError::Verification(e.to_string())
    }
}

/// The envelope of every Etherscan API response
#[derive(Debug, Deserialize)]
pub struct EtherscanResponse {
    /// `"1"` on success, `"0"` otherwise
    pub status: String,
    /// A short status message
    pub message: String,
    /// The payload, or an error description
    pub result: Value,
}

impl EtherscanResponse {
    /// The result as a string, or an empty string if it is structured
    fn result_str(&self) -> &str {
        self.result.as_str().unwrap_or_default()
    }
}

/// The outcome of submitting source code for verification
#[derive(Debug, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The submission was accepted and is identified by the given GUID
    Submitted(String),
    /// The contract was verified before
    AlreadyVerified,
    /// The explorer has not indexed the contract's bytecode yet
    NotIndexed,
}

/// The status of a verification request
#[derive(Debug, PartialEq, Eq)]
pub enum VerificationStatus {
    /// The request is still queued
    Pending,
    /// The source code matches the deployed bytecode
    Verified,
    /// The contract was verified by an earlier request
    AlreadyVerified,
    /// The source code does not match, with the explorer's explanation
    Failed(String),
}

/// The data needed to verify a deployed contract
#[derive(Debug, Clone)]
pub struct VerificationRequest {
    /// The address of the deployed contract
    pub address: Address,
    /// The fully qualified name of the contract, `<source>:<contract>`
    pub contract_name: String,
    /// The full solc version that compiled the contract
    pub compiler_version: String,
    /// The solc standard JSON input of the compilation
    pub standard_json_input: Value,
    /// The ABI-encoded constructor arguments of the deployment
    pub constructor_args: Bytes,
}

impl VerificationRequest {
    /// The form fields of a `verifysourcecode` request
    pub fn form_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("module", "contract".to_string()),
            ("action", "verifysourcecode".to_string()),
            ("contractaddress", format!("{:#x}", self.address)),
            ("sourceCode", self.standard_json_input.to_string()),
            ("codeformat", STANDARD_JSON_CODE_FORMAT.to_string()),
            ("contractname", self.contract_name.clone()),
            ("compilerversion", format!("v{}", self.compiler_version)),
            // The misspelling is part of the API
            ("constructorArguements", hex::encode(&self.constructor_args)),
        ]
    }
}

/// Interpret the response to a `verifysourcecode` request
pub fn classify_submission(
    response: &EtherscanResponse,
) -> Result<SubmitOutcome, VerificationError> {
    let result = response.result_str();
    if response.status == "1" {
        return Ok(SubmitOutcome::Submitted(result.to_string()));
    }

    let lower = result.to_lowercase();
    if lower.contains("already verified") {
        Ok(SubmitOutcome::AlreadyVerified)
    } else if lower.contains("unable to locate contractcode")
        || lower.contains("does not have bytecode")
    {
        Ok(SubmitOutcome::NotIndexed)
    } else {
        Err(VerificationError::Api(format!("{}: {}", response.message, result)))
    }
}

/// Interpret the response to a `checkverifystatus` request
pub fn classify_status(response: &EtherscanResponse) -> VerificationStatus {
    let result = response.result_str();
    if result == "Pending in queue" {
        VerificationStatus::Pending
    } else if result == "Pass - Verified" {
        VerificationStatus::Verified
    } else if result == "Already Verified" {
        VerificationStatus::AlreadyVerified
    } else {
        VerificationStatus::Failed(result.to_string())
    }
}

/// The delay before resubmitting after the given 1-based attempt found the
/// bytecode unindexed, `None` once the attempts are exhausted
pub fn submit_retry_delay(attempt: usize) -> Option<Duration> {
    (attempt < VERIFY_SUBMIT_ATTEMPTS).then_some(VERIFY_RETRY_DELAY)
}

/// Interpret the response to a `getsourcecode` request
pub fn has_source_code(response: &EtherscanResponse) -> bool {
    response
        .result
        .as_array()
        .and_then(|entries| entries.first())
        .and_then(|entry| entry.get("SourceCode"))
        .and_then(Value::as_str)
        .is_some_and(|source| !source.is_empty())
}

/// A client for an Etherscan-compatible explorer API
pub struct EtherscanVerifier {
    /// The HTTP client
    client: reqwest::Client,
    /// The API endpoint
    api_url: String,
    /// The API key
    api_key: String,
    /// The chain on which the contracts are deployed
    chain_id: u64,
}

impl EtherscanVerifier {
    /// Create a client for the given API endpoint
    pub fn new(api_url: &str, api_key: &str, chain_id: u64) -> Result<Self, VerificationError> {
        let client = reqwest::Client::builder()
            .timeout(VERIFY_REQUEST_TIMEOUT)
            .build()
            .map_err(|e| VerificationError::Request(e.to_string()))?;

        Ok(Self {
            client,
            api_url: api_url.to_string(),
            api_key: api_key.to_string(),
            chain_id,
        })
    }

    /// The query parameters attached to every request
    fn base_query(&self) -> [(&'static str, String); 2] {
        [
            ("chainid", self.chain_id.to_string()),
            ("apikey", self.api_key.clone()),
        ]
    }

    /// Execute a GET request against the API
    async fn get(
        &self,
        params: &[(&str, String)],
    ) -> Result<EtherscanResponse, VerificationError> {
        self.client
            .get(&self.api_url)
            .query(&self.base_query())
            .query(params)
            .send()
            .await
            .map_err(|e| VerificationError::Request(e.to_string()))?
            .json()
            .await
            .map_err(|e| VerificationError::Request(e.to_string()))
    }

    /// Whether the contract at the given address already has verified source code
    pub async fn is_verified(&self, address: Address) -> Result<bool, VerificationError> {
        let response = self
            .get(&[
                ("module", "contract".to_string()),
                ("action", "getsourcecode".to_string()),
                ("address", format!("{address:#x}")),
            ])
            .await?;

        Ok(has_source_code(&response))
    }

    /// Submit the source code, retrying while the explorer has not indexed the bytecode
    async fn submit(
        &self,
        request: &VerificationRequest,
    ) -> Result<SubmitOutcome, VerificationError> {
        let form = request.form_fields();

        for attempt in 1..=VERIFY_SUBMIT_ATTEMPTS {
            let response: EtherscanResponse = self
                .client
                .post(&self.api_url)
                .query(&self.base_query())
                .form(&form)
                .send()
                .await
                .map_err(|e| VerificationError::Request(e.to_string()))?
                .json()
                .await
                .map_err(|e| VerificationError::Request(e.to_string()))?;

            match classify_submission(&response)? {
                SubmitOutcome::NotIndexed => {
                    debug!(
                        "Explorer has not indexed {:#x} yet (attempt {}/{})",
                        request.address, attempt, VERIFY_SUBMIT_ATTEMPTS
                    );
                    if let Some(delay) = submit_retry_delay(attempt) {
                        tokio::time::sleep(delay).await;
                    }
                }
                outcome => return Ok(outcome),
            }
        }

        Err(VerificationError::Timeout(format!(
            "explorer never indexed the bytecode at {:#x}",
            request.address
        )))
    }

    /// Poll the status of a submission until the explorer reaches a verdict
    async fn poll(&self, guid: &str) -> Result<VerificationStatus, VerificationError> {
        for _ in 0..VERIFY_POLL_ATTEMPTS {
            tokio::time::sleep(VERIFY_RETRY_DELAY).await;

            let response = self
                .get(&[
                    ("module", "contract".to_string()),
                    ("action", "checkverifystatus".to_string()),
                    ("guid", guid.to_string()),
                ])
                .await?;

            match classify_status(&response) {
                VerificationStatus::Pending => debug!("Verification {guid} pending"),
                status => return Ok(status),
            }
        }

        Err(VerificationError::Timeout(format!("verification {guid} still pending")))
    }

    /// Verify the source code of a deployed contract
    pub async fn verify(&self, request: &VerificationRequest) -> Result<(), VerificationError> {
        if self.is_verified(request.address).await? {
            info!("{} is verified already", request.contract_name);
            return Ok(());
        }

        info!("Verifying {} at {:#x}", request.contract_name, request.address);
        let guid = match self.submit(request).await? {
            SubmitOutcome::Submitted(guid) => guid,
            SubmitOutcome::AlreadyVerified => {
                info!("{} is verified already", request.contract_name);
                return Ok(());
            }
            SubmitOutcome::NotIndexed => {
                return Err(VerificationError::Timeout(format!(
                    "explorer never indexed the bytecode at {:#x}",
                    request.address
                )))
            }
        };

        match self.poll(&guid).await? {
            VerificationStatus::Verified | VerificationStatus::AlreadyVerified => {
                info!("{} verified at {:#x}", request.contract_name, request.address);
                Ok(())
            }
            VerificationStatus::Failed(reason) => Err(VerificationError::Rejected(reason)),
            VerificationStatus::Pending => {
                Err(VerificationError::Timeout(format!("verification {guid} still pending")))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use alloy::primitives::address;
    use serde_json::json;

    use super::*;

    #[test]
    fn test_no_delay_after_last_submission() {
        assert_eq!(submit_retry_delay(1), Some(VERIFY_RETRY_DELAY));
        assert_eq!(submit_retry_delay(VERIFY_SUBMIT_ATTEMPTS - 1), Some(VERIFY_RETRY_DELAY));
        assert_eq!(submit_retry_delay(VERIFY_SUBMIT_ATTEMPTS), None);
    }

    /// Build a response envelope
    fn response(status: &str, result: Value) -> EtherscanResponse {
        serde_json::from_value(json!({
            "status": status,
            "message": if status == "1" { "OK" } else { "NOTOK" },
            "result": result,
        }))
        .unwrap()
    }

    #[test]
    fn test_classify_submission() {
        assert_eq!(
            classify_submission(&response("1", json!("abcd1234"))).unwrap(),
            SubmitOutcome::Submitted("abcd1234".to_string())
        );
        assert_eq!(
            classify_submission(&response("0", json!("Contract source code already verified")))
                .unwrap(),
            SubmitOutcome::AlreadyVerified
        );
        assert_eq!(
            classify_submission(&response(
                "0",
                json!("Unable to locate ContractCode at 0x1d83fe68f02500380ef108f1a03b3f5e4b9865dd")
            ))
            .unwrap(),
            SubmitOutcome::NotIndexed
        );
        assert!(matches!(
            classify_submission(&response("0", json!("Invalid API Key"))),
            Err(VerificationError::Api(_))
        ));
    }

    #[test]
    fn test_classify_status() {
        assert_eq!(
            classify_status(&response("0", json!("Pending in queue"))),
            VerificationStatus::Pending
        );
        assert_eq!(
            classify_status(&response("1", json!("Pass - Verified"))),
            VerificationStatus::Verified
        );
        assert_eq!(
            classify_status(&response("0", json!("Already Verified"))),
            VerificationStatus::AlreadyVerified
        );
        assert_eq!(
            classify_status(&response("0", json!("Fail - Unable to verify"))),
            VerificationStatus::Failed("Fail - Unable to verify".to_string())
        );
    }

    #[test]
    fn test_has_source_code() {
        let verified = response("1", json!([{ "SourceCode": "pragma solidity ^0.8.0;" }]));
        let unverified = response("1", json!([{ "SourceCode": "" }]));
        let error = response("0", json!("Invalid address format"));

        assert!(has_source_code(&verified));
        assert!(!has_source_code(&unverified));
        assert!(!has_source_code(&error));
    }

    #[test]
    fn test_form_fields() {
        let request = VerificationRequest {
            address: address!("7721DD243f638bA2751dA6c8112076cDdbe44f2F"),
            contract_name: "contracts/MiPrimerNft.sol:MiPrimerNft".to_string(),
            compiler_version: "0.8.9+commit.e5eed63a".to_string(),
            standard_json_input: json!({ "language": "Solidity" }),
            constructor_args: Bytes::from(vec![0xab, 0xcd]),
        };

        let fields = request.form_fields();
        let field = |name: &str| {
            fields
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| value.clone())
                .unwrap()
        };

        assert_eq!(field("compilerversion"), "v0.8.9+commit.e5eed63a");
        assert_eq!(field("constructorArguements"), "abcd");
        assert_eq!(
            field("contractaddress"),
            "0x7721dd243f638ba2751da6c8112076cddbe44f2f"
        );
        assert_eq!(field("codeformat"), STANDARD_JSON_CODE_FORMAT);
    }
}
