use super::{clamp_to, SettingsShape, REFRESH_INTERVAL_RANGE};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

// Legacy base58 (1..., 3...) and bech32 (bc1...) mainnet addresses.
static WALLET: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(bc1[02-9ac-hj-np-z]{11,71}|[13][1-9A-HJ-NP-Za-km-z]{25,34})$").unwrap());

fn default_refresh_interval() -> u32 {
    10
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BitcoinMiningSettings {
    #[serde(default)]
    pub wallet_address: String,
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval: u32,
}

impl Default for BitcoinMiningSettings {
    fn default() -> Self {
        Self {
            wallet_address: String::new(),
            refresh_interval: default_refresh_interval(),
        }
    }
}

impl SettingsShape for BitcoinMiningSettings {
    fn sanitize(&mut self) {
        self.wallet_address = self.wallet_address.trim().to_string();
        self.refresh_interval = clamp_to(self.refresh_interval, &REFRESH_INTERVAL_RANGE);
    }

    fn validate(&self, warnings: &mut Vec<String>) {
        if self.wallet_address.is_empty() {
            warnings.push("bitcoin mining widget has no wallet address".into());
        } else if !WALLET.is_match(&self.wallet_address) {
            warnings.push(format!(
                "'{}' does not look like a bitcoin address",
                self.wallet_address
            ));
        }
    }

    fn summary(&self) -> String {
        if self.wallet_address.is_empty() {
            "No wallet configured".into()
        } else {
            format!("Mining stats for {}", self.wallet_address)
        }
    }
}
