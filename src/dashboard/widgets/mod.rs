use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

mod bitcoin_mining;
mod blog;
mod calendar;
mod daily_content;
mod history;
mod lottery;
mod news;
mod recipes;
mod stocks;
mod trivia;
mod weather;

pub use bitcoin_mining::BitcoinMiningSettings;
pub use blog::BlogSettings;
pub use calendar::{CalendarSettings, CalendarSource, DEFAULT_CALENDAR_COLOR};
pub use daily_content::{DailyContentKind, DailyContentSettings};
pub use history::HistorySettings;
pub use lottery::LotterySettings;
pub use news::{NewsCategory, NewsSettings};
pub use recipes::RecipesSettings;
pub use stocks::StocksSettings;
pub use trivia::{TriviaDifficulty, TriviaSettings};
pub use weather::{Coordinates, TemperatureUnits, WeatherSettings};

/// Refresh interval in minutes.
pub const REFRESH_INTERVAL_RANGE: RangeInclusive<u32> = 1..=1440;
pub const MAX_ITEMS_RANGE: RangeInclusive<u32> = 1..=20;
pub const DAYS_TO_SHOW_RANGE: RangeInclusive<u32> = 1..=30;
pub const RECIPE_COUNT_RANGE: RangeInclusive<u32> = 1..=10;

pub(crate) fn clamp_to(value: u32, range: &RangeInclusive<u32>) -> u32 {
    value.clamp(*range.start(), *range.end())
}

/// Behaviour shared by every concrete settings payload.
pub trait SettingsShape: Serialize + DeserializeOwned + Default + Clone {
    /// Pull values back into their documented ranges and canonical forms.
    fn sanitize(&mut self) {}

    fn validate(&self, _warnings: &mut Vec<String>) {}

    /// One-line description used by placeholder rendering.
    fn summary(&self) -> String;
}

/// Closed set of widget kinds a dashboard can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WidgetType {
    News(NewsCategory),
    Weather,
    Calendar,
    Stocks,
    Lottery,
    DailyContent,
    History,
    Trivia,
    BitcoinMining,
    Recipes,
    Blog,
}

impl WidgetType {
    pub const ALL: [WidgetType; 16] = [
        WidgetType::News(NewsCategory::General),
        WidgetType::News(NewsCategory::Tech),
        WidgetType::News(NewsCategory::Business),
        WidgetType::News(NewsCategory::Science),
        WidgetType::News(NewsCategory::Sports),
        WidgetType::News(NewsCategory::World),
        WidgetType::Weather,
        WidgetType::Calendar,
        WidgetType::Stocks,
        WidgetType::Lottery,
        WidgetType::DailyContent,
        WidgetType::History,
        WidgetType::Trivia,
        WidgetType::BitcoinMining,
        WidgetType::Recipes,
        WidgetType::Blog,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            WidgetType::News(category) => category.type_tag(),
            WidgetType::Weather => "weather",
            WidgetType::Calendar => "calendar",
            WidgetType::Stocks => "stocks",
            WidgetType::Lottery => "lottery",
            WidgetType::DailyContent => "daily-content",
            WidgetType::History => "history",
            WidgetType::Trivia => "trivia",
            WidgetType::BitcoinMining => "bitcoin-mining",
            WidgetType::Recipes => "recipes",
            WidgetType::Blog => "blog",
        }
    }

    /// Human readable name used as the initial title of a new widget.
    pub fn label(&self) -> &'static str {
        match self {
            WidgetType::News(category) => category.label(),
            WidgetType::Weather => "Weather",
            WidgetType::Calendar => "Calendar",
            WidgetType::Stocks => "Stocks",
            WidgetType::Lottery => "Lottery Results",
            WidgetType::DailyContent => "Daily Content",
            WidgetType::History => "This Day in History",
            WidgetType::Trivia => "Trivia",
            WidgetType::BitcoinMining => "Bitcoin Mining",
            WidgetType::Recipes => "Recipes",
            WidgetType::Blog => "Blog",
        }
    }

    /// Grid size `(w, h)` used when the widget is first placed.
    pub fn default_size(&self) -> (u32, u32) {
        match self {
            WidgetType::Calendar => (4, 6),
            WidgetType::News(_) | WidgetType::Blog => (4, 5),
            _ => (4, 4),
        }
    }
}

impl fmt::Display for WidgetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WidgetType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        WidgetType::ALL
            .iter()
            .copied()
            .find(|ty| ty.as_str() == s)
            .ok_or_else(|| format!("unknown widget type '{s}'"))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsPatchError {
    #[error("settings update must be a JSON object")]
    NotAnObject,
    #[error("settings update does not fit a '{widget}' widget: {source}")]
    Shape {
        widget: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Settings payload of a widget. The variant is the widget's type.
#[derive(Debug, Clone, PartialEq)]
pub enum WidgetSettings {
    News(NewsCategory, NewsSettings),
    Weather(WeatherSettings),
    Calendar(CalendarSettings),
    Stocks(StocksSettings),
    Lottery(LotterySettings),
    DailyContent(DailyContentSettings),
    History(HistorySettings),
    Trivia(TriviaSettings),
    BitcoinMining(BitcoinMiningSettings),
    Recipes(RecipesSettings),
    Blog(BlogSettings),
    /// A type this build does not know. Kept verbatim so it survives a save.
    Unknown {
        widget_type: String,
        settings: Map<String, Value>,
    },
}

impl WidgetSettings {
    /// Fully populated defaults so a new widget renders without further input.
    pub fn defaults(ty: WidgetType) -> Self {
        match ty {
            WidgetType::News(category) => {
                WidgetSettings::News(category, NewsSettings::for_category(category))
            }
            WidgetType::Weather => WidgetSettings::Weather(WeatherSettings::default()),
            WidgetType::Calendar => WidgetSettings::Calendar(CalendarSettings::default()),
            WidgetType::Stocks => WidgetSettings::Stocks(StocksSettings::default()),
            WidgetType::Lottery => WidgetSettings::Lottery(LotterySettings::default()),
            WidgetType::DailyContent => {
                WidgetSettings::DailyContent(DailyContentSettings::default())
            }
            WidgetType::History => WidgetSettings::History(HistorySettings::default()),
            WidgetType::Trivia => WidgetSettings::Trivia(TriviaSettings::default()),
            WidgetType::BitcoinMining => {
                WidgetSettings::BitcoinMining(BitcoinMiningSettings::default())
            }
            WidgetType::Recipes => WidgetSettings::Recipes(RecipesSettings::default()),
            WidgetType::Blog => WidgetSettings::Blog(BlogSettings::default()),
        }
    }

    /// Defaults for a raw type tag. Unrecognised tags yield an empty object.
    pub fn defaults_for_tag(tag: &str) -> Self {
        match tag.parse::<WidgetType>() {
            Ok(ty) => Self::defaults(ty),
            Err(_) => WidgetSettings::Unknown {
                widget_type: tag.to_string(),
                settings: Map::new(),
            },
        }
    }

    /// Interpret a stored settings object according to its type tag.
    ///
    /// Missing fields take their defaults. The second value holds stored keys
    /// the typed view does not carry: keys this build does not know and
    /// values it cannot read. They are written back untouched until the
    /// matching field is edited.
    pub fn from_parts(tag: &str, raw: Value) -> (Self, Map<String, Value>) {
        let raw = match raw {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                tracing::warn!(
                    widget_type = %tag,
                    settings = %other,
                    "widget settings are not an object; using defaults"
                );
                Map::new()
            }
        };
        let mut settings = Self::defaults_for_tag(tag);
        if let WidgetSettings::Unknown { widget_type, .. } = settings {
            return (
                WidgetSettings::Unknown {
                    widget_type,
                    settings: raw,
                },
                Map::new(),
            );
        }

        let mut retained = Map::new();
        if settings.merge(&Value::Object(raw.clone())).is_err() {
            // Read field by field so one bad value does not cost the rest.
            for (key, value) in &raw {
                let single: Map<String, Value> =
                    [(key.clone(), value.clone())].into_iter().collect();
                if let Err(err) = settings.merge(&Value::Object(single)) {
                    tracing::warn!(
                        widget_type = %tag,
                        %key,
                        error = %err,
                        "unreadable widget setting kept as stored"
                    );
                    retained.insert(key.clone(), value.clone());
                }
            }
        }
        let typed = settings.to_value();
        for (key, value) in raw {
            if typed.get(&key).is_none() {
                retained.insert(key, value);
            }
        }
        (settings, retained)
    }

    pub fn widget_type(&self) -> Option<WidgetType> {
        Some(match self {
            WidgetSettings::News(category, _) => WidgetType::News(*category),
            WidgetSettings::Weather(_) => WidgetType::Weather,
            WidgetSettings::Calendar(_) => WidgetType::Calendar,
            WidgetSettings::Stocks(_) => WidgetType::Stocks,
            WidgetSettings::Lottery(_) => WidgetType::Lottery,
            WidgetSettings::DailyContent(_) => WidgetType::DailyContent,
            WidgetSettings::History(_) => WidgetType::History,
            WidgetSettings::Trivia(_) => WidgetType::Trivia,
            WidgetSettings::BitcoinMining(_) => WidgetType::BitcoinMining,
            WidgetSettings::Recipes(_) => WidgetType::Recipes,
            WidgetSettings::Blog(_) => WidgetType::Blog,
            WidgetSettings::Unknown { .. } => return None,
        })
    }

    /// The `type` tag written next to these settings.
    pub fn type_tag(&self) -> &str {
        match self {
            WidgetSettings::Unknown { widget_type, .. } => widget_type,
            other => other.widget_type().map(|ty| ty.as_str()).unwrap_or_default(),
        }
    }

    pub fn to_value(&self) -> Value {
        let value = match self {
            WidgetSettings::News(_, s) => serde_json::to_value(s),
            WidgetSettings::Weather(s) => serde_json::to_value(s),
            WidgetSettings::Calendar(s) => serde_json::to_value(s),
            WidgetSettings::Stocks(s) => serde_json::to_value(s),
            WidgetSettings::Lottery(s) => serde_json::to_value(s),
            WidgetSettings::DailyContent(s) => serde_json::to_value(s),
            WidgetSettings::History(s) => serde_json::to_value(s),
            WidgetSettings::Trivia(s) => serde_json::to_value(s),
            WidgetSettings::BitcoinMining(s) => serde_json::to_value(s),
            WidgetSettings::Recipes(s) => serde_json::to_value(s),
            WidgetSettings::Blog(s) => serde_json::to_value(s),
            WidgetSettings::Unknown { settings, .. } => return Value::Object(settings.clone()),
        };
        value.unwrap_or_else(|_| Value::Object(Map::new()))
    }

    /// Shallow merge of a partial update. Keys absent from `patch` keep their
    /// current values; numeric fields are clamped afterwards.
    pub fn merge(&mut self, patch: &Value) -> Result<(), SettingsPatchError> {
        let Value::Object(patch) = patch else {
            return Err(SettingsPatchError::NotAnObject);
        };
        let tag = self.type_tag().to_string();
        let shape_err = |source| SettingsPatchError::Shape {
            widget: tag.clone(),
            source,
        };
        match self {
            WidgetSettings::News(_, s) => *s = merge_shape(s, patch).map_err(shape_err)?,
            WidgetSettings::Weather(s) => *s = merge_shape(s, patch).map_err(shape_err)?,
            WidgetSettings::Calendar(s) => *s = merge_shape(s, patch).map_err(shape_err)?,
            WidgetSettings::Stocks(s) => *s = merge_shape(s, patch).map_err(shape_err)?,
            WidgetSettings::Lottery(s) => *s = merge_shape(s, patch).map_err(shape_err)?,
            WidgetSettings::DailyContent(s) => *s = merge_shape(s, patch).map_err(shape_err)?,
            WidgetSettings::History(s) => *s = merge_shape(s, patch).map_err(shape_err)?,
            WidgetSettings::Trivia(s) => *s = merge_shape(s, patch).map_err(shape_err)?,
            WidgetSettings::BitcoinMining(s) => *s = merge_shape(s, patch).map_err(shape_err)?,
            WidgetSettings::Recipes(s) => *s = merge_shape(s, patch).map_err(shape_err)?,
            WidgetSettings::Blog(s) => *s = merge_shape(s, patch).map_err(shape_err)?,
            WidgetSettings::Unknown { settings, .. } => {
                for (k, v) in patch {
                    settings.insert(k.clone(), v.clone());
                }
            }
        }
        Ok(())
    }

    pub fn sanitize(&mut self) {
        match self {
            WidgetSettings::News(_, s) => s.sanitize(),
            WidgetSettings::Weather(s) => s.sanitize(),
            WidgetSettings::Calendar(s) => s.sanitize(),
            WidgetSettings::Stocks(s) => s.sanitize(),
            WidgetSettings::Lottery(s) => s.sanitize(),
            WidgetSettings::DailyContent(s) => s.sanitize(),
            WidgetSettings::History(s) => s.sanitize(),
            WidgetSettings::Trivia(s) => s.sanitize(),
            WidgetSettings::BitcoinMining(s) => s.sanitize(),
            WidgetSettings::Recipes(s) => s.sanitize(),
            WidgetSettings::Blog(s) => s.sanitize(),
            WidgetSettings::Unknown { .. } => {}
        }
    }

    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        match self {
            WidgetSettings::News(_, s) => s.validate(&mut warnings),
            WidgetSettings::Weather(s) => s.validate(&mut warnings),
            WidgetSettings::Calendar(s) => s.validate(&mut warnings),
            WidgetSettings::Stocks(s) => s.validate(&mut warnings),
            WidgetSettings::Lottery(s) => s.validate(&mut warnings),
            WidgetSettings::DailyContent(s) => s.validate(&mut warnings),
            WidgetSettings::History(s) => s.validate(&mut warnings),
            WidgetSettings::Trivia(s) => s.validate(&mut warnings),
            WidgetSettings::BitcoinMining(s) => s.validate(&mut warnings),
            WidgetSettings::Recipes(s) => s.validate(&mut warnings),
            WidgetSettings::Blog(s) => s.validate(&mut warnings),
            WidgetSettings::Unknown { widget_type, .. } => {
                warnings.push(format!("unknown widget type '{widget_type}'"));
            }
        }
        warnings
    }

    pub fn summary(&self) -> String {
        match self {
            WidgetSettings::News(_, s) => s.summary(),
            WidgetSettings::Weather(s) => s.summary(),
            WidgetSettings::Calendar(s) => s.summary(),
            WidgetSettings::Stocks(s) => s.summary(),
            WidgetSettings::Lottery(s) => s.summary(),
            WidgetSettings::DailyContent(s) => s.summary(),
            WidgetSettings::History(s) => s.summary(),
            WidgetSettings::Trivia(s) => s.summary(),
            WidgetSettings::BitcoinMining(s) => s.summary(),
            WidgetSettings::Recipes(s) => s.summary(),
            WidgetSettings::Blog(s) => s.summary(),
            WidgetSettings::Unknown { widget_type, .. } => {
                format!("Unknown widget '{widget_type}'")
            }
        }
    }
}

fn merge_shape<T: SettingsShape>(
    current: &T,
    patch: &Map<String, Value>,
) -> Result<T, serde_json::Error> {
    let base = serde_json::to_value(current)?;
    let mut merged = merge_json(&base, &Value::Object(patch.clone()));
    coerce_unsigned(&mut merged, &base);
    let mut next: T = serde_json::from_value(merged)?;
    next.sanitize();
    Ok(next)
}

pub(crate) fn merge_json(base: &Value, updates: &Value) -> Value {
    match (base, updates) {
        (Value::Object(a), Value::Object(b)) => {
            let mut merged = a.clone();
            for (k, v) in b {
                merged.insert(k.clone(), v.clone());
            }
            Value::Object(merged)
        }
        _ => updates.clone(),
    }
}

/// Negative and fractional numbers in fields that are unsigned in `base`
/// become the nearest `u32` so the clamp step sees them instead of a
/// deserialisation error. Other fields are left alone.
fn coerce_unsigned(value: &mut Value, base: &Value) {
    let (Value::Object(map), Value::Object(base)) = (value, base) else {
        return;
    };
    for (key, v) in map.iter_mut() {
        if !base.get(key).is_some_and(Value::is_u64) {
            continue;
        }
        let Value::Number(n) = v else {
            continue;
        };
        if n.as_u64().is_some_and(|u| u <= u32::MAX as u64) {
            continue;
        }
        if let Some(f) = n.as_f64() {
            let coerced = f.round().clamp(0.0, u32::MAX as f64) as u32;
            *v = Value::from(coerced);
        }
    }
}

pub(crate) fn is_http_url(raw: &str) -> bool {
    url::Url::parse(raw)
        .map(|u| matches!(u.scheme(), "http" | "https") && u.host().is_some())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn every_type_tag_round_trips() {
        for ty in WidgetType::ALL {
            assert_eq!(ty.as_str().parse::<WidgetType>(), Ok(ty));
        }
    }

    #[test]
    fn unknown_tag_defaults_to_empty_object() {
        let settings = WidgetSettings::defaults_for_tag("horoscope");
        assert_eq!(settings.widget_type(), None);
        assert_eq!(settings.type_tag(), "horoscope");
        assert_eq!(settings.to_value(), json!({}));
    }

    #[test]
    fn weather_defaults_match_documented_shape() {
        let settings = WidgetSettings::defaults(WidgetType::Weather);
        assert_eq!(
            settings.to_value(),
            json!({ "location": "New York", "units": "imperial", "showForecast": true })
        );
    }

    #[test]
    fn merge_preserves_sibling_fields() {
        let mut settings = WidgetSettings::defaults(WidgetType::News(NewsCategory::Tech));
        let before = settings.to_value();
        settings.merge(&json!({ "refreshInterval": 45 })).unwrap();
        let after = settings.to_value();
        assert_eq!(after["refreshInterval"], json!(45));
        assert_eq!(after["feedUrl"], before["feedUrl"]);
        assert_eq!(after["maxItems"], before["maxItems"]);
    }

    #[test]
    fn merge_clamps_out_of_range_numbers() {
        let mut settings = WidgetSettings::defaults(WidgetType::Recipes);
        settings.merge(&json!({ "count": 500 })).unwrap();
        assert_eq!(settings.to_value()["count"], json!(10));
        settings.merge(&json!({ "count": -3 })).unwrap();
        assert_eq!(settings.to_value()["count"], json!(1));
        settings.merge(&json!({ "count": 2.6 })).unwrap();
        assert_eq!(settings.to_value()["count"], json!(3));
    }

    #[test]
    fn merge_rejects_non_object_patch() {
        let mut settings = WidgetSettings::defaults(WidgetType::Stocks);
        let before = settings.clone();
        assert!(matches!(
            settings.merge(&json!(["AAPL"])),
            Err(SettingsPatchError::NotAnObject)
        ));
        assert_eq!(settings, before);
    }

    #[test]
    fn merge_with_wrong_field_type_leaves_settings_unchanged() {
        let mut settings = WidgetSettings::defaults(WidgetType::Weather);
        let before = settings.clone();
        let err = settings.merge(&json!({ "showForecast": "sometimes" }));
        assert!(matches!(err, Err(SettingsPatchError::Shape { .. })));
        assert_eq!(settings, before);
    }

    #[test]
    fn unreadable_field_is_retained_and_siblings_survive() {
        let (settings, retained) = WidgetSettings::from_parts(
            "weather",
            json!({ "location": "Oslo", "units": "standard", "zip": "0150" }),
        );
        let value = settings.to_value();
        assert_eq!(value["location"], json!("Oslo"));
        assert_eq!(value["units"], json!("imperial"));
        assert_eq!(retained.get("units"), Some(&json!("standard")));
        assert_eq!(retained.get("zip"), Some(&json!("0150")));
        assert_eq!(retained.len(), 2);
    }

    #[test]
    fn readable_payload_retains_nothing_known() {
        let (settings, retained) =
            WidgetSettings::from_parts("stocks", json!({ "symbols": ["IBM"], "refreshInterval": 5 }));
        assert!(retained.is_empty());
        assert_eq!(settings.to_value()["symbols"], json!(["IBM"]));
    }

    #[test]
    fn merge_preserves_unknown_fields() {
        let base = json!({ "known": 1, "extra": { "keep": true } });
        let merged = merge_json(&base, &json!({ "known": 2 }));
        assert_eq!(merged["known"], json!(2));
        assert_eq!(merged["extra"], json!({ "keep": true }));
    }

    #[test]
    fn unknown_payload_is_kept_verbatim() {
        let raw = json!({ "sign": "leo", "nested": { "a": [1, 2] } });
        let (settings, retained) = WidgetSettings::from_parts("horoscope", raw.clone());
        assert!(retained.is_empty());
        assert_eq!(settings.to_value(), raw);
        assert_eq!(settings.summary(), "Unknown widget 'horoscope'");
    }
}
