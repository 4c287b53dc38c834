use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use crate::config::{Cluster, TokenInfo, DEFAULT_BALANCE_DEBOUNCE_MS};

const APP_DIR: &str = "tokendrop";
const SETTINGS_FILE: &str = "tokendrop_settings.json";

/// Directory for settings and the operation log, created on first use.
/// Falls back to the current directory when no config dir is known.
pub fn app_data_dir() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        let app_dir = config_dir.join(APP_DIR);
        if !app_dir.exists() {
            let _ = fs::create_dir_all(&app_dir);
        }
        app_dir
    } else {
        PathBuf::from(".")
    }
}

fn default_balance_debounce_ms() -> u64 {
    DEFAULT_BALANCE_DEBOUNCE_MS
}

/// User settings that persist between sessions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSettings {
    #[serde(default)]
    pub selected_cluster: Cluster,
    /// Wallet the drop is funded from, as last entered
    #[serde(default)]
    pub wallet_id: String,
    /// Custom RPC overrides per cluster
    #[serde(default)]
    pub custom_rpcs: HashMap<Cluster, String>,
    /// User-defined ERC-20 tokens
    #[serde(default)]
    pub custom_tokens: Vec<TokenInfo>,
    #[serde(default = "default_balance_debounce_ms")]
    pub balance_debounce_ms: u64,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            selected_cluster: Cluster::default(),
            wallet_id: String::new(),
            custom_rpcs: HashMap::new(),
            custom_tokens: Vec::new(),
            balance_debounce_ms: default_balance_debounce_ms(),
        }
    }
}

impl UserSettings {
    fn settings_path() -> PathBuf {
        app_data_dir().join(SETTINGS_FILE)
    }

    /// Load settings from disk, or return defaults if not found
    pub fn load() -> Self {
        let path = Self::settings_path();
        if path.exists() {
            match fs::read_to_string(&path) {
                Ok(content) => match serde_json::from_str(&content) {
                    Ok(settings) => {
                        tracing::info!("Loaded settings from {:?}", path);
                        return settings;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to parse settings file: {}", e);
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read settings file: {}", e);
                }
            }
        }
        tracing::info!("Using default settings");
        Self::default()
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::settings_path();
        let content = serde_json::to_string_pretty(self)?;
        fs::write(&path, content)?;
        tracing::info!("Saved settings to {:?}", path);
        Ok(())
    }

    pub fn settings_path_display() -> String {
        Self::settings_path().display().to_string()
    }

    /// Get custom RPC for a cluster, or None if using default
    pub fn get_custom_rpc(&self, cluster: Cluster) -> Option<&String> {
        self.custom_rpcs.get(&cluster).filter(|s| !s.is_empty())
    }

    /// Set custom RPC for a cluster (empty string removes the override)
    pub fn set_custom_rpc(&mut self, cluster: Cluster, rpc: String) {
        if rpc.trim().is_empty() {
            self.custom_rpcs.remove(&cluster);
        } else {
            self.custom_rpcs.insert(cluster, rpc.trim().to_string());
        }
    }

    /// Add a custom token (returns false if the address is already known on that cluster)
    pub fn add_custom_token(&mut self, token: TokenInfo) -> bool {
        let exists = crate::config::tokens_for_cluster(token.cluster, &self.custom_tokens)
            .iter()
            .any(|t| t.address.eq_ignore_ascii_case(&token.address));
        if exists {
            return false;
        }
        self.custom_tokens.push(token);
        true
    }

    pub fn remove_custom_token(&mut self, cluster: Cluster, address: &str) -> bool {
        let initial_len = self.custom_tokens.len();
        self.custom_tokens
            .retain(|t| !(t.cluster == cluster && t.address.eq_ignore_ascii_case(address)));
        self.custom_tokens.len() < initial_len
    }
}
