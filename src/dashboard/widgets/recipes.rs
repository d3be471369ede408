use super::{clamp_to, SettingsShape, RECIPE_COUNT_RANGE};
use serde::{Deserialize, Serialize};

fn default_category() -> String {
    "dinner".into()
}

fn default_count() -> u32 {
    3
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RecipesSettings {
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default = "default_count")]
    pub count: u32,
}

impl Default for RecipesSettings {
    fn default() -> Self {
        Self {
            category: default_category(),
            count: default_count(),
        }
    }
}

impl SettingsShape for RecipesSettings {
    fn sanitize(&mut self) {
        self.category = self.category.trim().to_lowercase();
        self.count = clamp_to(self.count, &RECIPE_COUNT_RANGE);
    }

    fn validate(&self, warnings: &mut Vec<String>) {
        if self.category.is_empty() {
            warnings.push("recipes widget has no category".into());
        }
    }

    fn summary(&self) -> String {
        format!("{} {} recipes", self.count, self.category)
    }
}
