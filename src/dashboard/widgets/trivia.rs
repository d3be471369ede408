use super::SettingsShape;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TriviaDifficulty {
    Easy,
    Medium,
    Hard,
}

impl Default for TriviaDifficulty {
    fn default() -> Self {
        TriviaDifficulty::Easy
    }
}

impl TriviaDifficulty {
    pub const ALL: [TriviaDifficulty; 3] = [
        TriviaDifficulty::Easy,
        TriviaDifficulty::Medium,
        TriviaDifficulty::Hard,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TriviaDifficulty::Easy => "easy",
            TriviaDifficulty::Medium => "medium",
            TriviaDifficulty::Hard => "hard",
        }
    }
}

fn default_category() -> String {
    "general".into()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TriviaSettings {
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default)]
    pub difficulty: TriviaDifficulty,
}

impl Default for TriviaSettings {
    fn default() -> Self {
        Self {
            category: default_category(),
            difficulty: TriviaDifficulty::default(),
        }
    }
}

impl SettingsShape for TriviaSettings {
    fn sanitize(&mut self) {
        let category = self.category.trim().to_lowercase();
        self.category = if category.is_empty() {
            default_category()
        } else {
            category
        };
    }

    fn summary(&self) -> String {
        format!("{} trivia ({})", self.category, self.difficulty.as_str())
    }
}
