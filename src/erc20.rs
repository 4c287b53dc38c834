//! Minimal ERC-20 call encoding for balance reads and transfers.

use crate::ledger::LedgerError;
use ethers::abi::{Function, Param, ParamType, StateMutability, Token};
use ethers::prelude::*;
use ethers::providers::{Http, Provider};
use std::sync::Arc;

/// Function selector for transfer(address,uint256)
/// keccak256("transfer(address,uint256)") = 0xa9059cbb...
pub const TRANSFER_SELECTOR: [u8; 4] = [0xa9, 0x05, 0x9c, 0xbb];

/// Function selector for balanceOf(address)
pub const BALANCE_OF_SELECTOR: [u8; 4] = [0x70, 0xa0, 0x82, 0x31];

/// balanceOf(address owner) view returns (uint256)
#[allow(deprecated)]
fn balance_of_function() -> Function {
    Function {
        name: "balanceOf".to_string(),
        inputs: vec![Param {
            name: "owner".to_string(),
            kind: ParamType::Address,
            internal_type: None,
        }],
        outputs: vec![Param {
            name: "".to_string(),
            kind: ParamType::Uint(256),
            internal_type: None,
        }],
        constant: None,
        state_mutability: StateMutability::View,
    }
}

/// transfer(address to, uint256 amount) returns (bool)
#[allow(deprecated)]
fn transfer_function() -> Function {
    Function {
        name: "transfer".to_string(),
        inputs: vec![
            Param {
                name: "to".to_string(),
                kind: ParamType::Address,
                internal_type: None,
            },
            Param {
                name: "amount".to_string(),
                kind: ParamType::Uint(256),
                internal_type: None,
            },
        ],
        outputs: vec![Param {
            name: "".to_string(),
            kind: ParamType::Bool,
            internal_type: None,
        }],
        constant: None,
        state_mutability: StateMutability::NonPayable,
    }
}

pub fn encode_balance_of(owner: Address) -> Result<Bytes, LedgerError> {
    balance_of_function()
        .encode_input(&[Token::Address(owner)])
        .map(Bytes::from)
        .map_err(|e| LedgerError::Abi(e.to_string()))
}

pub fn encode_transfer(to: Address, amount: U256) -> Result<Bytes, LedgerError> {
    transfer_function()
        .encode_input(&[Token::Address(to), Token::Uint(amount)])
        .map(Bytes::from)
        .map_err(|e| LedgerError::Abi(e.to_string()))
}

/// Decode the uint256 returned by balanceOf.
pub fn decode_balance(output: &[u8]) -> Result<U256, LedgerError> {
    let tokens = balance_of_function()
        .decode_output(output)
        .map_err(|e| LedgerError::Abi(e.to_string()))?;
    match tokens.first() {
        Some(Token::Uint(amount)) => Ok(*amount),
        other => Err(LedgerError::Abi(format!("unexpected balanceOf output: {:?}", other))),
    }
}

/// Read `owner`'s balance of `token`.
pub async fn balance_of(
    provider: Arc<Provider<Http>>,
    token: Address,
    owner: Address,
) -> Result<U256, LedgerError> {
    let tx = TransactionRequest::new().to(token).data(encode_balance_of(owner)?);
    let result = provider.call(&tx.into(), None).await?;
    decode_balance(result.as_ref())
}
