use super::{clamp_to, SettingsShape, REFRESH_INTERVAL_RANGE};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

static TICKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Z][A-Z0-9.\-]{0,9}$").unwrap());

fn default_symbols() -> Vec<String> {
    vec!["AAPL".into(), "MSFT".into(), "GOOGL".into()]
}

fn default_refresh_interval() -> u32 {
    15
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StocksSettings {
    #[serde(default = "default_symbols")]
    pub symbols: Vec<String>,
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval: u32,
}

impl Default for StocksSettings {
    fn default() -> Self {
        Self {
            symbols: default_symbols(),
            refresh_interval: default_refresh_interval(),
        }
    }
}

impl SettingsShape for StocksSettings {
    fn sanitize(&mut self) {
        let mut seen = HashSet::new();
        self.symbols = self
            .symbols
            .iter()
            .map(|s| s.trim().to_ascii_uppercase())
            .filter(|s| !s.is_empty() && seen.insert(s.clone()))
            .collect();
        self.refresh_interval = clamp_to(self.refresh_interval, &REFRESH_INTERVAL_RANGE);
    }

    fn validate(&self, warnings: &mut Vec<String>) {
        if self.symbols.is_empty() {
            warnings.push("stocks widget has no ticker symbols".into());
        }
        for symbol in &self.symbols {
            if !TICKER.is_match(symbol) {
                warnings.push(format!("'{symbol}' is not a valid ticker symbol"));
            }
        }
    }

    fn summary(&self) -> String {
        self.symbols.join(", ")
    }
}
