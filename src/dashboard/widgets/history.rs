use super::{clamp_to, SettingsShape, MAX_ITEMS_RANGE};
use serde::{Deserialize, Serialize};

fn default_max_items() -> u32 {
    5
}

/// "On this day" events.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HistorySettings {
    #[serde(default = "default_max_items")]
    pub max_items: u32,
}

impl Default for HistorySettings {
    fn default() -> Self {
        Self {
            max_items: default_max_items(),
        }
    }
}

impl SettingsShape for HistorySettings {
    fn sanitize(&mut self) {
        self.max_items = clamp_to(self.max_items, &MAX_ITEMS_RANGE);
    }

    fn summary(&self) -> String {
        format!("{} events from this day in history", self.max_items)
    }
}
