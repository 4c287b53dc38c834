//! `Ledger` implementation backed by an EVM JSON-RPC node via ethers-rs.

use crate::config::{find_token, Cluster, Config};
use crate::erc20;
use crate::format;
use crate::ledger::{DropOutcome, Ledger, LedgerError};
use crate::types::{
    BalanceRecord, BalanceSnapshot, DropAccount, DropAccountBalance, DropMode, PopulatedDropAccount,
    TokenHolding, WalletBalance,
};
use async_trait::async_trait;
use ethers::prelude::*;
use ethers::providers::{Http, Provider};
use std::sync::Arc;
use tracing::{info, warn};

/// Amount `drop_dev` adds to the signer on a development node (1 ETH).
pub const DEV_FUNDING_WEI: u128 = 1_000_000_000_000_000_000;

/// Whole tokens `mint_dev` credits.
pub const DEV_MINT_TOKENS: u64 = 1_000;
const DEFAULT_MINT_DECIMALS: u32 = 18;
const MAX_BALANCE_SLOT: u64 = 10;

pub struct EthersLedger {
    config: Config,
}

impl EthersLedger {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    fn provider(&self, cluster: Cluster) -> Result<Arc<Provider<Http>>, LedgerError> {
        self.config
            .get_provider(cluster)
            .map_err(|e| LedgerError::Config(e.to_string()))
    }
}

pub fn parse_address(input: &str) -> Result<Address, LedgerError> {
    input
        .trim()
        .parse::<Address>()
        .map_err(|_| LedgerError::InvalidAddress(input.trim().to_string()))
}

/// Broadcast one transfer and wait for its receipt.
async fn send_transfer(
    client: &SignerMiddleware<Provider<Http>, LocalWallet>,
    tx: TransactionRequest,
    wallet: &str,
    amount: U256,
) -> Result<TxHash, LedgerError> {
    let failed = |reason: String| LedgerError::Transaction {
        recipient: wallet.to_string(),
        reason,
    };
    let pending = client
        .send_transaction(tx, None)
        .await
        .map_err(|e| failed(e.to_string()))?;
    let tx_hash = pending.tx_hash();
    let receipt = pending.await.map_err(|e| failed(e.to_string()))?;

    match receipt {
        Some(receipt) if receipt.status == Some(U64::from(0u64)) => {
            Err(failed(format!("reverted in tx {:?}", tx_hash)))
        }
        Some(receipt) => {
            info!(
                "Sent {} to {} in {:?} (block {:?})",
                amount, wallet, tx_hash, receipt.block_number
            );
            Ok(tx_hash)
        }
        None => {
            warn!("No receipt for {:?}; transaction was dropped from the mempool", tx_hash);
            Ok(tx_hash)
        }
    }
}

/// Storage position of `holder` in a Solidity `mapping(address => uint256)`
/// declared at `slot`.
fn balance_slot(holder: Address, slot: u64) -> H256 {
    let encoded = ethers::abi::encode(&[
        ethers::abi::Token::Address(holder),
        ethers::abi::Token::Uint(U256::from(slot)),
    ]);
    H256::from(ethers::utils::keccak256(encoded))
}

fn word(value: U256) -> H256 {
    let mut bytes = [0u8; 32];
    value.to_big_endian(&mut bytes);
    H256::from(bytes)
}

#[async_trait]
impl Ledger for EthersLedger {
    async fn get_wallet_balance(&self, cluster: Cluster, wallet: &str) -> Result<WalletBalance, LedgerError> {
        let owner = parse_address(wallet)?;
        let provider = self.provider(cluster)?;
        let native_amount = provider.get_balance(owner, None).await?;

        let mut token_holdings = Vec::new();
        for token in self.config.tokens(cluster) {
            let token_address = match parse_address(&token.address) {
                Ok(addr) => addr,
                Err(e) => {
                    warn!("Skipping token {}: {}", token.symbol, e);
                    continue;
                }
            };
            match erc20::balance_of(provider.clone(), token_address, owner).await {
                Ok(amount) if !amount.is_zero() => token_holdings.push(TokenHolding {
                    token_address: token.address.clone(),
                    amount,
                }),
                Ok(_) => {}
                Err(e) => warn!("balanceOf {} for {:?} failed: {}", token.symbol, owner, e),
            }
        }

        Ok(WalletBalance {
            id: wallet.to_string(),
            native_amount,
            token_holdings,
        })
    }

    async fn get_drop_account_balance(
        &self,
        cluster: Cluster,
        account: &DropAccount,
        _signer: Address,
        mode: DropMode,
        token_address: &str,
    ) -> Result<DropAccountBalance, LedgerError> {
        let owner = parse_address(&account.wallet)?;
        let provider = self.provider(cluster)?;

        let snapshot = match mode {
            DropMode::Native => {
                let amount = provider.get_balance(owner, None).await?;
                BalanceSnapshot::Found(BalanceRecord {
                    address: format!("{:?}", owner),
                    amount,
                })
            }
            DropMode::Token => {
                if token_address.trim().is_empty() {
                    return Err(LedgerError::NoTokenSelected);
                }
                let token = parse_address(token_address)?;
                let amount = erc20::balance_of(provider, token, owner).await?;
                if amount.is_zero() {
                    BalanceSnapshot::Missing
                } else {
                    BalanceSnapshot::Found(BalanceRecord {
                        address: format!("{:?}", owner),
                        amount,
                    })
                }
            }
        };

        Ok(DropAccountBalance {
            wallet: account.wallet.clone(),
            snapshot,
        })
    }

    async fn distribute(
        &self,
        cluster: Cluster,
        signer: &LocalWallet,
        accounts: &[PopulatedDropAccount],
        mode: DropMode,
        token_address: &str,
    ) -> Result<DropOutcome, LedgerError> {
        let provider = self.provider(cluster)?;
        let chain_id = cluster.chain_id();
        let client = SignerMiddleware::new(
            provider.as_ref().clone(),
            signer.clone().with_chain_id(chain_id),
        );

        let token = match mode {
            DropMode::Native => None,
            DropMode::Token => {
                if token_address.trim().is_empty() {
                    return Err(LedgerError::NoTokenSelected);
                }
                Some(parse_address(token_address)?)
            }
        };

        // Validate and encode every transfer before anything is broadcast
        let mut transfers = Vec::new();
        for account in accounts.iter().filter(|a| !a.drop.is_zero()) {
            let recipient = parse_address(&account.wallet)?;
            let tx = match token {
                None => TransactionRequest::new().to(recipient).value(account.drop),
                Some(token) => TransactionRequest::new()
                    .to(token)
                    .data(erc20::encode_transfer(recipient, account.drop)?),
            };
            transfers.push((account.wallet.as_str(), tx, account.drop));
        }
        if transfers.is_empty() {
            return Err(LedgerError::NothingToDrop);
        }

        info!(
            "Dropping to {} recipients on {} ({} mode) from {:?}",
            transfers.len(),
            cluster,
            mode,
            signer.address()
        );

        let mut hashes = Vec::with_capacity(transfers.len());
        for (wallet, tx, amount) in transfers {
            match send_transfer(&client, tx, wallet, amount).await {
                Ok(tx_hash) => hashes.push(tx_hash),
                Err(e) if hashes.is_empty() => return Err(e),
                Err(e) => {
                    warn!("Drop stopped after {} transfers: {}", hashes.len(), e);
                    return Ok(DropOutcome::stopped(hashes, e));
                }
            }
        }

        Ok(DropOutcome::complete(hashes))
    }

    async fn drop_dev(&self, cluster: Cluster, signer: Address) -> Result<U256, LedgerError> {
        if !cluster.supports_dev_funding() {
            return Err(LedgerError::FundingUnavailable(cluster));
        }
        let provider = self.provider(cluster)?;
        let grant = U256::from(DEV_FUNDING_WEI);
        let current = provider.get_balance(signer, None).await?;
        let target = current.saturating_add(grant);
        let _: serde_json::Value = provider
            .request("anvil_setBalance", (signer, target))
            .await?;
        info!("Funded {:?} with {} ETH on {}", signer, format::format_native(grant), cluster);
        Ok(grant)
    }

    async fn mint_dev(&self, cluster: Cluster, signer: Address, token_address: &str) -> Result<U256, LedgerError> {
        if !cluster.supports_dev_funding() {
            return Err(LedgerError::FundingUnavailable(cluster));
        }
        if token_address.trim().is_empty() {
            return Err(LedgerError::NoTokenSelected);
        }
        let token = parse_address(token_address)?;
        let provider = self.provider(cluster)?;
        let decimals = find_token(cluster, token_address, &self.config.custom_tokens)
            .map(|t| t.decimals)
            .unwrap_or(DEFAULT_MINT_DECIMALS);
        let amount = U256::from(DEV_MINT_TOKENS).saturating_mul(U256::exp10(decimals as usize));

        let current = erc20::balance_of(provider.clone(), token, signer).await?;
        let target = current.saturating_add(amount);

        // Find the balances mapping by writing each candidate slot and reading back
        for slot in 0..MAX_BALANCE_SLOT {
            let position = balance_slot(signer, slot);
            let previous = provider.get_storage_at(token, position, None).await?;
            let _: serde_json::Value = provider
                .request("anvil_setStorageAt", (token, position, word(target)))
                .await?;
            if erc20::balance_of(provider.clone(), token, signer).await? == target {
                info!("Minted {} units of {:?} to {:?} on {} (slot {})", amount, token, signer, cluster, slot);
                return Ok(amount);
            }
            let _: serde_json::Value = provider
                .request("anvil_setStorageAt", (token, position, previous))
                .await?;
        }

        Err(LedgerError::MintUnavailable {
            token: token_address.trim().to_string(),
            reason: format!("no balances mapping in the first {} storage slots", MAX_BALANCE_SLOT),
        })
    }
}
