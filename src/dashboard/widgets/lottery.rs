use super::SettingsShape;
use serde::{Deserialize, Serialize};

fn default_games() -> Vec<String> {
    vec!["powerball".into(), "mega-millions".into()]
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LotterySettings {
    #[serde(default = "default_games")]
    pub games: Vec<String>,
}

impl Default for LotterySettings {
    fn default() -> Self {
        Self {
            games: default_games(),
        }
    }
}

impl SettingsShape for LotterySettings {
    fn sanitize(&mut self) {
        let mut games: Vec<String> = Vec::with_capacity(self.games.len());
        for game in &self.games {
            let game = game.trim().to_lowercase();
            if !game.is_empty() && !games.contains(&game) {
                games.push(game);
            }
        }
        self.games = games;
    }

    fn validate(&self, warnings: &mut Vec<String>) {
        if self.games.is_empty() {
            warnings.push("lottery widget has no games selected".into());
        }
    }

    fn summary(&self) -> String {
        format!("Results for {}", self.games.join(", "))
    }
}
