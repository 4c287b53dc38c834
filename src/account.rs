//! Signing accounts: create a fresh one or restore it from a mnemonic or a
//! private key.

use ethers::signers::coins_bip39::{English, Mnemonic};
use ethers::signers::{LocalWallet, MnemonicBuilder, Signer, WalletError};
use ethers::types::Address;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// BIP-44 coin type for Ethereum.
pub const COIN_TYPE: u32 = 60;

/// Word count of freshly generated mnemonics.
pub const MNEMONIC_WORDS: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DerivationMode {
    /// m/44'/60'/i'/0/0 (MetaMask default, Ledger Live)
    #[default]
    AccountIndex,
    /// m/44'/60'/0'/0/i
    AddressIndex,
}

impl DerivationMode {
    pub fn get_path(&self, index: u32) -> String {
        match self {
            DerivationMode::AccountIndex => format!("m/44'/{}'/{}'/0/0", COIN_TYPE, index),
            DerivationMode::AddressIndex => format!("m/44'/{}'/0'/0/{}", COIN_TYPE, index),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DerivationMode::AccountIndex => "Account index",
            DerivationMode::AddressIndex => "Address index",
        }
    }
}

#[derive(Error, Debug)]
pub enum AccountError {
    #[error("Mnemonic is empty")]
    EmptyMnemonic,

    #[error("Invalid mnemonic: {0}")]
    InvalidMnemonic(String),

    #[error("Invalid private key: {0}")]
    InvalidPrivateKey(String),

    #[error("Invalid derivation path {path}: {reason}")]
    Derivation { path: String, reason: String },
}

/// How the user asked to restore an account.
#[derive(Clone, PartialEq, Eq)]
pub enum AccountRestoreForm {
    Mnemonic {
        phrase: String,
        index: u32,
        mode: DerivationMode,
    },
    PrivateKey(String),
}

/// The signing account of a session. `phrase` is only set for accounts created
/// in this session so the user can back it up.
#[derive(Clone)]
pub struct AccountInfo {
    pub signer: LocalWallet,
    pub address: Address,
    pub phrase: Option<String>,
}

impl AccountInfo {
    fn from_signer(signer: LocalWallet, phrase: Option<String>) -> Self {
        Self {
            address: signer.address(),
            signer,
            phrase,
        }
    }

    /// Lowercase 0x-prefixed hex, as entered in the wallet field.
    pub fn address_string(&self) -> String {
        format!("{:?}", self.address)
    }
}

impl fmt::Debug for AccountInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccountInfo")
            .field("address", &self.address)
            .field("has_phrase", &self.phrase.is_some())
            .finish()
    }
}

fn wallet_from_phrase(phrase: &str, path: &str) -> Result<LocalWallet, AccountError> {
    MnemonicBuilder::<English>::default()
        .phrase(phrase)
        .derivation_path(path)
        .map_err(|e| AccountError::Derivation {
            path: path.to_string(),
            reason: e.to_string(),
        })?
        .build()
        .map_err(|e: WalletError| AccountError::InvalidMnemonic(e.to_string()))
}

/// Generate a new mnemonic and derive its first account.
pub fn create() -> Result<AccountInfo, AccountError> {
    let mut rng = rand::thread_rng();
    let mnemonic = Mnemonic::<English>::new_with_count(&mut rng, MNEMONIC_WORDS)
        .map_err(|e| AccountError::InvalidMnemonic(e.to_string()))?;
    let phrase = mnemonic.to_phrase();
    let signer = wallet_from_phrase(&phrase, &DerivationMode::default().get_path(0))?;
    tracing::info!("Created account {:?}", signer.address());
    Ok(AccountInfo::from_signer(signer, Some(phrase)))
}

pub fn restore(form: &AccountRestoreForm) -> Result<AccountInfo, AccountError> {
    let signer = match form {
        AccountRestoreForm::Mnemonic { phrase, index, mode } => {
            let normalized = phrase.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase();
            if normalized.is_empty() {
                return Err(AccountError::EmptyMnemonic);
            }
            wallet_from_phrase(&normalized, &mode.get_path(*index))?
        }
        AccountRestoreForm::PrivateKey(key) => {
            let cleaned = key.trim().trim_start_matches("0x");
            let bytes = hex::decode(cleaned).map_err(|e| AccountError::InvalidPrivateKey(e.to_string()))?;
            if bytes.len() != 32 {
                return Err(AccountError::InvalidPrivateKey(format!(
                    "expected 32 bytes, got {}",
                    bytes.len()
                )));
            }
            LocalWallet::from_bytes(&bytes).map_err(|e| AccountError::InvalidPrivateKey(e.to_string()))?
        }
    };
    tracing::info!("Restored account {:?}", signer.address());
    Ok(AccountInfo::from_signer(signer, None))
}
