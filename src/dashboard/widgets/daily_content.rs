use super::SettingsShape;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum DailyContentKind {
    Quote,
    Word,
    Fact,
    Joke,
}

impl DailyContentKind {
    pub const ALL: [DailyContentKind; 4] = [
        DailyContentKind::Quote,
        DailyContentKind::Word,
        DailyContentKind::Fact,
        DailyContentKind::Joke,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            DailyContentKind::Quote => "Quote of the day",
            DailyContentKind::Word => "Word of the day",
            DailyContentKind::Fact => "Fact of the day",
            DailyContentKind::Joke => "Joke of the day",
        }
    }
}

fn default_enabled() -> Vec<DailyContentKind> {
    vec![DailyContentKind::Quote]
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DailyContentSettings {
    #[serde(default = "default_enabled")]
    pub enabled: Vec<DailyContentKind>,
}

impl Default for DailyContentSettings {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
        }
    }
}

impl DailyContentSettings {
    pub fn is_enabled(&self, kind: DailyContentKind) -> bool {
        self.enabled.contains(&kind)
    }

    /// Enable or disable one kind, keeping the canonical display order.
    pub fn set_enabled(&mut self, kind: DailyContentKind, on: bool) {
        self.enabled.retain(|k| *k != kind);
        if on {
            self.enabled.push(kind);
        }
        self.sanitize();
    }
}

impl SettingsShape for DailyContentSettings {
    fn sanitize(&mut self) {
        let enabled = std::mem::take(&mut self.enabled);
        self.enabled = DailyContentKind::ALL
            .iter()
            .copied()
            .filter(|k| enabled.contains(k))
            .collect();
    }

    fn validate(&self, warnings: &mut Vec<String>) {
        if self.enabled.is_empty() {
            warnings.push("daily content widget has nothing enabled".into());
        }
    }

    fn summary(&self) -> String {
        let labels: Vec<&str> = self.enabled.iter().map(|k| k.label()).collect();
        labels.join(" · ")
    }
}
