//! Construction of constructor and initializer calldata from command-line arguments

use std::str::FromStr;

use alloy::{
    dyn_abi::{DynSolValue, JsonAbiExt, Specifier},
    json_abi::{JsonAbi, Param},
    primitives::Bytes,
};
use itertools::Itertools;

use crate::{constants::INITIALIZER_FUNCTION, errors::ScriptError};

/// Coerce string arguments into ABI values according to the given parameter types
pub fn coerce_args(params: &[Param], args: &[String]) -> Result<Vec<DynSolValue>, ScriptError> {
    if params.len() != args.len() {
        return Err(ScriptError::CalldataConstruction(format!(
            "expected {} arguments ({}), got {}",
            params.len(),
            params.iter().map(|p| &p.ty).join(", "),
            args.len()
        )));
    }

    params
        .iter()
        .zip(args)
        .map(|(param, arg)| {
            let ty = param
                .resolve()
                .map_err(|e| ScriptError::CalldataConstruction(e.to_string()))?;

            ty.coerce_str(arg).map_err(|e| {
                ScriptError::CalldataConstruction(format!(
                    "invalid value `{}` for parameter `{}` of type {}: {}",
                    arg, param.name, param.ty, e
                ))
            })
        })
        .collect()
}

/// ABI-encode the constructor arguments of a contract, without a selector
pub fn constructor_calldata(abi: &JsonAbi, args: &[String]) -> Result<Vec<u8>, ScriptError> {
    match abi.constructor() {
        Some(constructor) => {
            let values = coerce_args(&constructor.inputs, args)?;
            constructor
                .abi_encode_input(&values)
                .map_err(|e| ScriptError::CalldataConstruction(e.to_string()))
        }
        None if args.is_empty() => Ok(Vec::new()),
        None => Err(ScriptError::CalldataConstruction(format!(
            "contract has no constructor but {} arguments were given",
            args.len()
        ))),
    }
}

/// Prepare calldata for the implementation's `initialize` method, executed by
/// the proxy on deployment.
///
/// Contracts without an initializer get empty calldata, in which case the proxy
/// performs no call.
pub fn initializer_calldata(abi: &JsonAbi, args: &[String]) -> Result<Bytes, ScriptError> {
    let overloads = match abi.function(INITIALIZER_FUNCTION) {
        Some(overloads) => overloads,
        None if args.is_empty() => return Ok(Bytes::new()),
        None => {
            return Err(ScriptError::CalldataConstruction(format!(
                "contract has no `{INITIALIZER_FUNCTION}` function but {} arguments were given",
                args.len()
            )))
        }
    };

    let initializer = overloads
        .iter()
        .find(|f| f.inputs.len() == args.len())
        .ok_or_else(|| {
            ScriptError::CalldataConstruction(format!(
                "no `{INITIALIZER_FUNCTION}` overload takes {} arguments, candidates: {}",
                args.len(),
                overloads.iter().map(|f| f.signature()).join(", ")
            ))
        })?;

    let values = coerce_args(&initializer.inputs, args)?;
    initializer
        .abi_encode_input(&values)
        .map(Bytes::from)
        .map_err(|e| ScriptError::CalldataConstruction(e.to_string()))
}

/// Parse optional hex calldata given on the command line
pub fn parse_calldata(calldata: Option<&str>) -> Result<Bytes, ScriptError> {
    match calldata {
        Some(calldata) => Bytes::from_str(calldata)
            .map_err(|e| ScriptError::CalldataConstruction(e.to_string())),
        None => Ok(Bytes::new()),
    }
}

#[cfg(test)]
mod tests {
    use alloy::{
        primitives::{address, U256},
        sol_types::SolValue,
    };
    use serde_json::json;

    use super::*;

    /// An ABI with a two-argument constructor and two `initialize` overloads
    fn test_abi() -> JsonAbi {
        serde_json::from_value(json!([
            {
                "type": "constructor",
                "stateMutability": "nonpayable",
                "inputs": [
                    { "name": "owner", "type": "address", "internalType": "address" },
                    { "name": "supply", "type": "uint256", "internalType": "uint256" }
                ]
            },
            {
                "type": "function",
                "name": "initialize",
                "stateMutability": "nonpayable",
                "inputs": [],
                "outputs": []
            },
            {
                "type": "function",
                "name": "initialize",
                "stateMutability": "nonpayable",
                "inputs": [
                    { "name": "token", "type": "address", "internalType": "address" }
                ],
                "outputs": []
            }
        ]))
        .unwrap()
    }

    #[test]
    fn test_constructor_args_are_abi_encoded() {
        let owner = address!("424aa621EeCf2d5A4C5171750Eb2a6407A02fE21");
        let args = vec![owner.to_string(), "1000".to_string()];

        let encoded = constructor_calldata(&test_abi(), &args).unwrap();
        assert_eq!(encoded, (owner, U256::from(1000)).abi_encode_params());
    }

    #[test]
    fn test_constructor_arity_and_types_are_checked() {
        let abi = test_abi();

        let too_few = constructor_calldata(&abi, &["0x00".to_string()]);
        assert!(matches!(too_few, Err(ScriptError::CalldataConstruction(_))));

        let bad_address = constructor_calldata(&abi, &["owner".to_string(), "1".to_string()]);
        assert!(bad_address.unwrap_err().to_string().contains("owner"));

        let no_constructor = JsonAbi::default();
        assert!(constructor_calldata(&no_constructor, &[]).unwrap().is_empty());
        assert!(constructor_calldata(&no_constructor, &["1".to_string()]).is_err());
    }

    #[test]
    fn test_initializer_overload_is_selected_by_arity() {
        let abi = test_abi();

        let no_args = initializer_calldata(&abi, &[]).unwrap();
        assert_eq!(no_args.as_ref(), &abi.function("initialize").unwrap()[0].selector()[..]);

        let token = address!("fE865B499AADF5643E6a68a2E4Fe3D61ad1F9d64");
        let with_token = initializer_calldata(&abi, &[token.to_string()]).unwrap();
        assert_eq!(with_token.len(), 4 + 32);
        assert_eq!(&with_token[4 + 12..], token.as_slice());

        assert!(initializer_calldata(&abi, &["1".to_string(), "2".to_string()]).is_err());
    }

    #[test]
    fn test_missing_initializer() {
        let abi = JsonAbi::default();
        assert!(initializer_calldata(&abi, &[]).unwrap().is_empty());
        assert!(initializer_calldata(&abi, &["1".to_string()]).is_err());
    }

    #[test]
    fn test_parse_calldata() {
        assert!(parse_calldata(None).unwrap().is_empty());
        assert_eq!(
            parse_calldata(Some("0xdeadbeef")).unwrap(),
            Bytes::from(vec![0xde, 0xad, 0xbe, 0xef])
        );
        assert!(parse_calldata(Some("0xnothex")).is_err());
    }
}
