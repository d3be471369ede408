use super::{clamp_to, is_http_url, SettingsShape, MAX_ITEMS_RANGE};
use serde::{Deserialize, Serialize};

fn default_feed_url() -> String {
    "https://blog.rust-lang.org/feed.xml".into()
}

fn default_max_items() -> u32 {
    5
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BlogSettings {
    #[serde(default = "default_feed_url")]
    pub feed_url: String,
    #[serde(default = "default_max_items")]
    pub max_items: u32,
}

impl Default for BlogSettings {
    fn default() -> Self {
        Self {
            feed_url: default_feed_url(),
            max_items: default_max_items(),
        }
    }
}

impl SettingsShape for BlogSettings {
    fn sanitize(&mut self) {
        self.feed_url = self.feed_url.trim().to_string();
        self.max_items = clamp_to(self.max_items, &MAX_ITEMS_RANGE);
    }

    fn validate(&self, warnings: &mut Vec<String>) {
        if !is_http_url(&self.feed_url) {
            warnings.push(format!("blog feed URL '{}' is not a valid http(s) URL", self.feed_url));
        }
    }

    fn summary(&self) -> String {
        format!("Latest {} posts from {}", self.max_items, self.feed_url)
    }
}
