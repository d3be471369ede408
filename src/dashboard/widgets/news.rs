use super::{clamp_to, is_http_url, SettingsShape, MAX_ITEMS_RANGE, REFRESH_INTERVAL_RANGE};
use serde::{Deserialize, Serialize};

// Example widget:
// {"id":"tech-news-1a2b3c4d","type":"tech-news","title":"Tech","order":2,
//  "settings":{"feedUrl":"https://...","maxItems":5,"refreshInterval":30,"showImages":true}}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NewsCategory {
    General,
    Tech,
    Business,
    Science,
    Sports,
    World,
}

impl NewsCategory {
    pub fn type_tag(&self) -> &'static str {
        match self {
            NewsCategory::General => "news",
            NewsCategory::Tech => "tech-news",
            NewsCategory::Business => "business-news",
            NewsCategory::Science => "science-news",
            NewsCategory::Sports => "sports-news",
            NewsCategory::World => "world-news",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            NewsCategory::General => "Top News",
            NewsCategory::Tech => "Tech News",
            NewsCategory::Business => "Business News",
            NewsCategory::Science => "Science News",
            NewsCategory::Sports => "Sports News",
            NewsCategory::World => "World News",
        }
    }

    pub fn default_feed_url(&self) -> &'static str {
        match self {
            NewsCategory::General => "https://feeds.bbci.co.uk/news/rss.xml",
            NewsCategory::Tech => "https://feeds.bbci.co.uk/news/technology/rss.xml",
            NewsCategory::Business => "https://feeds.bbci.co.uk/news/business/rss.xml",
            NewsCategory::Science => {
                "https://feeds.bbci.co.uk/news/science_and_environment/rss.xml"
            }
            NewsCategory::Sports => "https://feeds.bbci.co.uk/sport/rss.xml",
            NewsCategory::World => "https://feeds.bbci.co.uk/news/world/rss.xml",
        }
    }
}

fn default_max_items() -> u32 {
    5
}

fn default_refresh_interval() -> u32 {
    30
}

fn default_show_images() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NewsSettings {
    #[serde(default)]
    pub feed_url: String,
    #[serde(default = "default_max_items")]
    pub max_items: u32,
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval: u32,
    #[serde(default = "default_show_images")]
    pub show_images: bool,
}

impl NewsSettings {
    pub fn for_category(category: NewsCategory) -> Self {
        Self {
            feed_url: category.default_feed_url().to_string(),
            ..Self::default()
        }
    }
}

impl Default for NewsSettings {
    fn default() -> Self {
        Self {
            feed_url: NewsCategory::General.default_feed_url().to_string(),
            max_items: default_max_items(),
            refresh_interval: default_refresh_interval(),
            show_images: default_show_images(),
        }
    }
}

impl SettingsShape for NewsSettings {
    fn sanitize(&mut self) {
        self.feed_url = self.feed_url.trim().to_string();
        self.max_items = clamp_to(self.max_items, &MAX_ITEMS_RANGE);
        self.refresh_interval = clamp_to(self.refresh_interval, &REFRESH_INTERVAL_RANGE);
    }

    fn validate(&self, warnings: &mut Vec<String>) {
        if !is_http_url(&self.feed_url) {
            warnings.push(format!("news feed URL '{}' is not a valid http(s) URL", self.feed_url));
        }
    }

    fn summary(&self) -> String {
        format!("{} headlines from {}", self.max_items, self.feed_url)
    }
}
