//! # Multicall Batch Executor
//!
//! Packs many independent `eth_call` reads into single Multicall3 `aggregate3`
//! invocations, all pinned to one block. Used by the state fetchers to avoid one
//! round trip per attribute per node.

use anyhow::{anyhow, bail, Context, Result};
use ethers::abi::{Function, Param, ParamType, StateMutability, Token};
use ethers::prelude::*;
use log::{debug, warn};
use std::sync::Arc;

/// A single RPC call to be batched in a multicall.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Call {
    /// Target contract address
    pub target: Address,
    /// Encoded function call data
    pub call_data: Bytes,
}

/// Multicall batch executor for optimized RPC reads.
///
/// Batches multiple contract calls into one or a few RPC requests. All chunks of a
/// run are executed against the same block, so every result in a batch reflects the
/// same point-in-time view of chain state.
///
/// Unlike lenient multicall wrappers, this executor fails a run as a unit: if the
/// aggregate call itself errors, or any inner call reports `success == false`, the
/// whole run returns an error and no partial results are surfaced.
#[derive(Clone)]
pub struct Multicall<M: Middleware> {
    pub provider: Arc<M>,
    multicall_address: Address,
    batch_size: usize,
}

impl<M: Middleware + 'static> Multicall<M> {
    pub fn new(provider: Arc<M>, multicall_address: Address, batch_size: usize) -> Self {
        Self {
            provider,
            multicall_address,
            batch_size: batch_size.max(1),
        }
    }

    /// Address of the Multicall3 deployment this executor targets.
    pub fn address(&self) -> Address {
        self.multicall_address
    }

    /// Runs a batch of calls, optionally at a specific block.
    ///
    /// Results come back in submission order. Internal chunking (by `batch_size`)
    /// keeps each `aggregate3` payload under RPC provider limits; every chunk is
    /// pinned to the same `block`, so chunking never breaks snapshot consistency.
    pub async fn run(&self, calls: Vec<Call>, block: Option<BlockId>) -> Result<Vec<Bytes>> {
        if calls.is_empty() {
            return Ok(Vec::new());
        }

        debug!(
            "Multicall run: {} calls in {} chunk(s) of up to {}",
            calls.len(),
            (calls.len() + self.batch_size - 1) / self.batch_size,
            self.batch_size
        );

        let mut all_results: Vec<Bytes> = Vec::with_capacity(calls.len());
        for (chunk_index, call_chunk) in calls.chunks(self.batch_size).enumerate() {
            let return_data = self
                .execute_aggregate3(call_chunk, block)
                .await
                .with_context(|| format!("multicall chunk {} failed", chunk_index))?;
            all_results.extend(return_data);
        }

        Ok(all_results)
    }

    /// Executes one Multicall3 `aggregate3` invocation and enforces per-call success.
    async fn execute_aggregate3(&self, calls: &[Call], block: Option<BlockId>) -> Result<Vec<Bytes>> {
        // aggregate3(Call3[] calldata calls) returns (Result[] memory returnData)
        // Call3 struct: { target, allowFailure, callData }
        // Result struct: { success, returnData }
        let mut call_tokens = Vec::with_capacity(calls.len());
        for call in calls {
            // allowFailure = true so the aggregate itself never reverts; success
            // flags are checked below, which gives a far more actionable error than
            // an opaque top-level revert.
            call_tokens.push(Token::Tuple(vec![
                Token::Address(call.target),
                Token::Bool(true),
                Token::Bytes(call.call_data.to_vec()),
            ]));
        }

        #[allow(deprecated)]
        let function = Function {
            name: "aggregate3".to_string(),
            inputs: vec![Param {
                name: "calls".to_string(),
                kind: ParamType::Array(Box::new(ParamType::Tuple(vec![
                    ParamType::Address,
                    ParamType::Bool,
                    ParamType::Bytes,
                ]))),
                internal_type: None,
            }],
            outputs: vec![Param {
                name: "returnData".to_string(),
                kind: ParamType::Array(Box::new(ParamType::Tuple(vec![
                    ParamType::Bool,
                    ParamType::Bytes,
                ]))),
                internal_type: None,
            }],
            constant: None,
            state_mutability: StateMutability::Payable,
        };

        let calldata = function.encode_input(&[Token::Array(call_tokens)])?;

        let tx_request = ethers::types::TransactionRequest::new()
            .to(self.multicall_address)
            .data(calldata);
        let typed_tx: ethers::types::transaction::eip2718::TypedTransaction = tx_request.into();
        let response = self
            .provider
            .call(&typed_tx, block)
            .await
            .map_err(|e| anyhow!("aggregate3 call failed: {e}"))?;

        let decoded = ethers::abi::decode(
            &[ParamType::Array(Box::new(ParamType::Tuple(vec![
                ParamType::Bool,
                ParamType::Bytes,
            ])))],
            &response,
        )?;

        let results_array = decoded
            .into_iter()
            .next()
            .and_then(|t| t.into_array())
            .ok_or_else(|| anyhow!("invalid multicall response format"))?;

        if results_array.len() != calls.len() {
            bail!(
                "multicall returned {} results for {} calls",
                results_array.len(),
                calls.len()
            );
        }

        let mut return_data = Vec::with_capacity(calls.len());
        for (i, result_token) in results_array.into_iter().enumerate() {
            let mut tuple = result_token
                .into_tuple()
                .ok_or_else(|| anyhow!("malformed multicall result at index {i}"))?;
            if tuple.len() != 2 {
                bail!("malformed multicall result tuple at index {i}");
            }
            let data = tuple
                .remove(1)
                .into_bytes()
                .ok_or_else(|| anyhow!("malformed multicall return data at index {i}"))?;
            let success = tuple
                .remove(0)
                .into_bool()
                .ok_or_else(|| anyhow!("malformed multicall success flag at index {i}"))?;
            if !success {
                let call = &calls[i];
                warn!(
                    "Multicall inner call {} to {:?} reverted",
                    i, call.target
                );
                bail!(
                    "inner call {} to {:?} reverted (selector 0x{})",
                    i,
                    call.target,
                    hex::encode(&call.call_data[..call.call_data.len().min(4)])
                );
            }
            return_data.push(Bytes::from(data));
        }

        Ok(return_data)
    }
}

/// Decodes a single `uint256` return value.
pub fn decode_uint(data: &Bytes) -> Result<U256> {
    single_token(data, ParamType::Uint(256))?
        .into_uint()
        .ok_or_else(|| anyhow!("return data is not a uint256"))
}

/// Decodes a single `bool` return value.
pub fn decode_bool(data: &Bytes) -> Result<bool> {
    single_token(data, ParamType::Bool)?
        .into_bool()
        .ok_or_else(|| anyhow!("return data is not a bool"))
}

/// Decodes a single `address` return value.
pub fn decode_address(data: &Bytes) -> Result<Address> {
    single_token(data, ParamType::Address)?
        .into_address()
        .ok_or_else(|| anyhow!("return data is not an address"))
}

/// Decodes a single `string` return value.
pub fn decode_string(data: &Bytes) -> Result<String> {
    single_token(data, ParamType::String)?
        .into_string()
        .ok_or_else(|| anyhow!("return data is not a string"))
}

fn single_token(data: &Bytes, kind: ParamType) -> Result<Token> {
    let mut tokens = ethers::abi::decode(&[kind], data)
        .with_context(|| format!("failed to decode return data 0x{}", hex::encode(data)))?;
    tokens
        .pop()
        .ok_or_else(|| anyhow!("empty return data"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethers::abi::encode;

    #[test]
    fn test_decode_uint_roundtrip() {
        let value = U256::from(123_456_789u64);
        let data = Bytes::from(encode(&[Token::Uint(value)]));
        assert_eq!(decode_uint(&data).unwrap(), value);
    }

    #[test]
    fn test_decode_bool_roundtrip() {
        let data = Bytes::from(encode(&[Token::Bool(true)]));
        assert!(decode_bool(&data).unwrap());
    }

    #[test]
    fn test_decode_address_roundtrip() {
        let addr: Address = "0x1111111111111111111111111111111111111111"
            .parse()
            .unwrap();
        let data = Bytes::from(encode(&[Token::Address(addr)]));
        assert_eq!(decode_address(&data).unwrap(), addr);
    }

    #[test]
    fn test_decode_string_roundtrip() {
        let data = Bytes::from(encode(&[Token::String("Etc/UTC".to_string())]));
        assert_eq!(decode_string(&data).unwrap(), "Etc/UTC");
    }

    #[test]
    fn test_decode_rejects_malformed_payload() {
        // Reverted calls come back with empty return data; decoding must fail
        // rather than produce a zero value that looks legitimate.
        let empty = Bytes::new();
        assert!(decode_uint(&empty).is_err());
        assert!(decode_address(&empty).is_err());
        assert!(decode_string(&empty).is_err());
    }
}
