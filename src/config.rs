use anyhow::{anyhow, Result};
use ethers::providers::{Http, Provider};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Decimals of the native coin on every supported cluster (wei).
pub const NATIVE_DECIMALS: u32 = 18;

/// Delay between a wallet/cluster change and the balance fetch it triggers.
pub const DEFAULT_BALANCE_DEBOUNCE_MS: u64 = 1000;

/// Network a drop runs against.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cluster {
    Mainnet,
    Sepolia,
    Hoodi,
    Localhost,
}

/// Static facts about a cluster: label, chain ID, native coin, default RPC and explorer.
#[derive(Clone, Debug)]
pub struct ClusterInfo {
    pub cluster: Cluster,
    pub label: &'static str,
    pub slug: &'static str,
    pub chain_id: u64,
    pub native_token: &'static str,
    pub default_rpc: &'static str,
    pub explorer: Option<&'static str>,
    /// Whether `drop_dev` can fund accounts here
    pub dev_funding: bool,
}

impl ClusterInfo {
    pub const fn new(
        cluster: Cluster,
        label: &'static str,
        slug: &'static str,
        chain_id: u64,
        native_token: &'static str,
        default_rpc: &'static str,
        explorer: Option<&'static str>,
        dev_funding: bool,
    ) -> Self {
        Self {
            cluster,
            label,
            slug,
            chain_id,
            native_token,
            default_rpc,
            explorer,
            dev_funding,
        }
    }
}

use Cluster::*;

/// Every cluster the tool can target, in selector order.
pub const CLUSTERS: &[ClusterInfo] = &[
    ClusterInfo::new(Mainnet, "Ethereum", "mainnet", 1, "ETH", "https://ethereum-rpc.publicnode.com", Some("https://etherscan.io"), false),
    ClusterInfo::new(Sepolia, "Sepolia", "sepolia", 11155111, "ETH", "https://ethereum-sepolia-rpc.publicnode.com", Some("https://sepolia.etherscan.io"), false),
    ClusterInfo::new(Hoodi, "Hoodi", "hoodi", 560048, "ETH", "https://rpc.hoodi.ethpandaops.io", Some("https://hoodi.ethpandaops.io"), false),
    ClusterInfo::new(Localhost, "Localhost", "localhost", 31337, "ETH", "http://127.0.0.1:8545", None, true),
];

impl Cluster {
    pub fn info(self) -> &'static ClusterInfo {
        // CLUSTERS holds one entry per variant, in declaration order
        &CLUSTERS[self as usize]
    }

    pub fn label(self) -> &'static str {
        self.info().label
    }

    pub fn slug(self) -> &'static str {
        self.info().slug
    }

    pub fn chain_id(self) -> u64 {
        self.info().chain_id
    }

    pub fn native_token(self) -> &'static str {
        self.info().native_token
    }

    pub fn supports_dev_funding(self) -> bool {
        self.info().dev_funding
    }

    pub fn all() -> impl Iterator<Item = Cluster> {
        CLUSTERS.iter().map(|c| c.cluster)
    }
}

impl Default for Cluster {
    fn default() -> Self {
        Cluster::Sepolia
    }
}

impl fmt::Display for Cluster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Find a cluster by chain ID
pub fn find_cluster_by_chain_id(chain_id: u64) -> Option<Cluster> {
    CLUSTERS.iter().find(|c| c.chain_id == chain_id).map(|c| c.cluster)
}

/// Get the full URL to view an address on the block explorer
pub fn get_address_explorer_url(cluster: Cluster, address: &str) -> Option<String> {
    cluster
        .info()
        .explorer
        .map(|base| format!("{}/address/{}", base, address))
}

/// Get the full URL to view a transaction on the block explorer
pub fn get_tx_explorer_url(cluster: Cluster, tx_hash: &str) -> Option<String> {
    cluster
        .info()
        .explorer
        .map(|base| format!("{}/tx/{}", base, tx_hash))
}

/// A token the picker can offer for a cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenInfo {
    pub cluster: Cluster,
    pub address: String,
    pub symbol: String,
    pub name: String,
    pub decimals: u32,
}

impl TokenInfo {
    pub fn new(cluster: Cluster, address: &str, symbol: &str, name: &str, decimals: u32) -> Self {
        Self {
            cluster,
            address: address.to_string(),
            symbol: symbol.to_string(),
            name: name.to_string(),
            decimals,
        }
    }
}

/// Well-known ERC-20 tokens shipped with the app.
fn builtin_tokens() -> Vec<TokenInfo> {
    vec![
        TokenInfo::new(Mainnet, "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48", "USDC", "USD Coin", 6),
        TokenInfo::new(Mainnet, "0xdAC17F958D2ee523a2206206994597C13D831ec7", "USDT", "Tether USD", 6),
        TokenInfo::new(Mainnet, "0x6B175474E89094C44Da98b954EedeAC495271d0F", "DAI", "Dai Stablecoin", 18),
        TokenInfo::new(Mainnet, "0x514910771AF9Ca656af840dff83E8264EcF986CA", "LINK", "ChainLink Token", 18),
        TokenInfo::new(Sepolia, "0x1c7D4B196Cb0C7B01d743Fbc6116a902379C7238", "USDC", "USD Coin", 6),
        TokenInfo::new(Sepolia, "0x779877A7B0D9E8603169DdbD7836e478b4624789", "LINK", "ChainLink Token", 18),
    ]
}

/// Tokens available on `cluster`: built-ins plus user-defined ones, without
/// zero-decimal tokens, sorted by name.
pub fn tokens_for_cluster(cluster: Cluster, custom: &[TokenInfo]) -> Vec<TokenInfo> {
    let mut tokens: Vec<TokenInfo> = builtin_tokens()
        .into_iter()
        .chain(custom.iter().cloned())
        .filter(|t| t.cluster == cluster && t.decimals > 0)
        .collect();
    tokens.sort_by(|a, b| a.name.cmp(&b.name));
    tokens.dedup_by(|a, b| a.address.eq_ignore_ascii_case(&b.address));
    tokens
}

/// Look up a token on `cluster` by address (case-insensitive).
pub fn find_token(cluster: Cluster, address: &str, custom: &[TokenInfo]) -> Option<TokenInfo> {
    tokens_for_cluster(cluster, custom)
        .into_iter()
        .find(|t| t.address.eq_ignore_ascii_case(address.trim()))
}

#[derive(Clone, Debug)]
pub struct Config {
    pub cluster: Cluster,
    pub rpc_overrides: HashMap<Cluster, String>,
    pub balance_debounce: Duration,
    pub custom_tokens: Vec<TokenInfo>,
}

impl Config {
    pub fn new(cluster: Cluster) -> Self {
        let balance_debounce_ms = env::var("TOKENDROP_BALANCE_DEBOUNCE_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_BALANCE_DEBOUNCE_MS);

        let mut rpc_overrides = HashMap::new();
        if let Ok(rpc) = env::var("TOKENDROP_RPC_URL") {
            if !rpc.trim().is_empty() {
                rpc_overrides.insert(cluster, rpc.trim().to_string());
            }
        }

        Self {
            cluster,
            rpc_overrides,
            balance_debounce: Duration::from_millis(balance_debounce_ms),
            custom_tokens: Vec::new(),
        }
    }

    /// Build a config from persisted settings; environment overrides win.
    pub fn from_settings(settings: &crate::user_settings::UserSettings) -> Self {
        let mut config = Self::new(settings.selected_cluster);
        for (cluster, rpc) in &settings.custom_rpcs {
            config.rpc_overrides.entry(*cluster).or_insert_with(|| rpc.clone());
        }
        if env::var("TOKENDROP_BALANCE_DEBOUNCE_MS").is_err() {
            config.balance_debounce = Duration::from_millis(settings.balance_debounce_ms);
        }
        config.custom_tokens = settings.custom_tokens.clone();
        config
    }

    pub fn rpc_url(&self, cluster: Cluster) -> &str {
        self.rpc_overrides
            .get(&cluster)
            .map(|s| s.as_str())
            .unwrap_or(cluster.info().default_rpc)
    }

    pub fn tokens(&self, cluster: Cluster) -> Vec<TokenInfo> {
        tokens_for_cluster(cluster, &self.custom_tokens)
    }

    pub fn get_provider(&self, cluster: Cluster) -> Result<Arc<Provider<Http>>> {
        let url = Url::parse(self.rpc_url(cluster))
            .map_err(|e| anyhow!("Invalid RPC URL for {}: {}", cluster, e))?;
        let provider = Provider::<Http>::try_from(url.as_str())?;
        Ok(Arc::new(provider))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(Cluster::default())
    }
}
