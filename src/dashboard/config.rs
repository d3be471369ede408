use crate::dashboard::layout::Breakpoint;
use crate::dashboard::widgets::{merge_json, SettingsPatchError, WidgetSettings, WidgetType};
use crate::theme::{Background, ThemeMode};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;

/// Row value meaning "below everything else"; resolved by
/// [`BreakpointLayouts::settle`].
pub const BOTTOM_ROW: u32 = u32::MAX;

/// One configured widget instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawWidgetConfig", into = "RawWidgetConfig")]
pub struct WidgetConfig {
    pub id: String,
    pub title: String,
    pub settings: WidgetSettings,
    pub order: u32,
    /// Stored settings keys outside the typed view. They win over the typed
    /// value on save until the field is edited.
    pub retained_settings: Map<String, Value>,
    /// Widget-level keys this build does not know.
    pub extra: Map<String, Value>,
}

impl WidgetConfig {
    pub fn new(id: impl Into<String>, ty: WidgetType, order: u32) -> Self {
        Self {
            id: id.into(),
            title: ty.label().to_string(),
            settings: WidgetSettings::defaults(ty),
            order,
            retained_settings: Map::new(),
            extra: Map::new(),
        }
    }

    pub fn widget_type(&self) -> Option<WidgetType> {
        self.settings.widget_type()
    }

    pub fn type_tag(&self) -> &str {
        self.settings.type_tag()
    }

    /// Settings object as written to storage.
    pub fn settings_value(&self) -> Value {
        merge_json(
            &self.settings.to_value(),
            &Value::Object(self.retained_settings.clone()),
        )
    }

    /// Shallow-merge a partial update. Keys the typed view does not carry
    /// are kept alongside it; `null` removes them.
    pub fn merge_settings(&mut self, patch: &Value) -> Result<(), SettingsPatchError> {
        self.settings.merge(patch)?;
        let (Value::Object(patch), Value::Object(typed)) = (patch, self.settings.to_value())
        else {
            return Ok(());
        };
        for (key, value) in patch {
            self.retained_settings.remove(key);
            if self.widget_type().is_some() && !typed.contains_key(key) && !value.is_null() {
                self.retained_settings.insert(key.clone(), value.clone());
            }
        }
        Ok(())
    }

    /// Edit the typed settings in place, then clamp. Retained values of
    /// fields the edit changed are dropped.
    pub fn edit_settings<R>(&mut self, f: impl FnOnce(&mut WidgetSettings) -> R) -> R {
        let before = self.settings.to_value();
        let result = f(&mut self.settings);
        self.settings.sanitize();
        let after = self.settings.to_value();
        if let (Value::Object(before), Value::Object(after)) = (before, after) {
            self.retained_settings
                .retain(|key, _| before.get(key) == after.get(key));
        }
        result
    }
}

// On-disk shape: the `type` tag sits next to `settings`, not inside it.
#[derive(Serialize, Deserialize)]
struct RawWidgetConfig {
    #[serde(default)]
    id: String,
    #[serde(rename = "type")]
    widget_type: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    settings: Value,
    #[serde(default, deserialize_with = "deserialize_order")]
    order: u32,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl From<RawWidgetConfig> for WidgetConfig {
    fn from(raw: RawWidgetConfig) -> Self {
        let (settings, retained_settings) =
            WidgetSettings::from_parts(&raw.widget_type, raw.settings);
        Self {
            settings,
            retained_settings,
            id: raw.id,
            title: raw.title,
            order: raw.order,
            extra: raw.extra,
        }
    }
}

impl From<WidgetConfig> for RawWidgetConfig {
    fn from(cfg: WidgetConfig) -> Self {
        Self {
            widget_type: cfg.type_tag().to_string(),
            settings: cfg.settings_value(),
            id: cfg.id,
            title: cfg.title,
            order: cfg.order,
            extra: cfg.extra,
        }
    }
}

// Numbers written by other clients may be floats or numeric strings.
fn read_u32(value: &Value) -> Option<u32> {
    value
        .as_f64()
        .or_else(|| value.as_str().and_then(|s| s.trim().parse().ok()))
        .filter(|n: &f64| n.is_finite())
        .map(|n| n.round().clamp(0.0, u32::MAX as f64) as u32)
}

fn read_u32_or<'de, D>(deserializer: D, field: &str, fallback: u32) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(read_u32(&value).unwrap_or_else(|| {
        tracing::warn!(field, value = %value, "unreadable number, using {fallback}");
        fallback
    }))
}

// Unusable orders sort first and are renumbered by the next edit.
fn deserialize_order<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    read_u32_or(deserializer, "order", 0)
}

fn deserialize_column<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    read_u32_or(deserializer, "x", 0)
}

fn deserialize_span<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    read_u32_or(deserializer, "span", 1)
}

/// Placement of one widget within one breakpoint's grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutItem {
    #[serde(alias = "i")]
    pub id: String,
    #[serde(default, deserialize_with = "deserialize_column")]
    pub x: u32,
    #[serde(default = "bottom_row", deserialize_with = "deserialize_row")]
    pub y: u32,
    #[serde(default = "default_span", deserialize_with = "deserialize_span")]
    pub w: u32,
    #[serde(default = "default_span", deserialize_with = "deserialize_span")]
    pub h: u32,
    /// Grid options this build does not use (`minW`, `static`, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn bottom_row() -> u32 {
    BOTTOM_ROW
}

fn default_span() -> u32 {
    1
}

// `null` (how an infinite row survives JSON) and out-of-range numbers both
// mean "place at the bottom".
fn deserialize_row<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<f64>::deserialize(deserializer)?;
    Ok(match value {
        Some(v) if v.is_finite() && v >= 0.0 && v < BOTTOM_ROW as f64 => v as u32,
        _ => BOTTOM_ROW,
    })
}

impl LayoutItem {
    pub fn new(id: impl Into<String>, x: u32, y: u32, w: u32, h: u32) -> Self {
        Self {
            id: id.into(),
            x,
            y,
            w,
            h,
            extra: Map::new(),
        }
    }

    fn bottom(&self) -> u32 {
        self.y.saturating_add(self.h)
    }
}

/// Independent placements for each breakpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakpointLayouts {
    #[serde(default)]
    pub lg: Vec<LayoutItem>,
    #[serde(default)]
    pub md: Vec<LayoutItem>,
    #[serde(default)]
    pub sm: Vec<LayoutItem>,
}

impl BreakpointLayouts {
    pub fn get(&self, bp: Breakpoint) -> &Vec<LayoutItem> {
        match bp {
            Breakpoint::Lg => &self.lg,
            Breakpoint::Md => &self.md,
            Breakpoint::Sm => &self.sm,
        }
    }

    pub fn get_mut(&mut self, bp: Breakpoint) -> &mut Vec<LayoutItem> {
        match bp {
            Breakpoint::Lg => &mut self.lg,
            Breakpoint::Md => &mut self.md,
            Breakpoint::Sm => &mut self.sm,
        }
    }

    /// Append a widget below all existing content in every breakpoint.
    pub fn append(&mut self, id: &str, (w, h): (u32, u32)) {
        for bp in Breakpoint::ALL {
            self.get_mut(bp)
                .push(LayoutItem::new(id, 0, BOTTOM_ROW, w, h));
            self.settle(bp);
        }
    }

    /// Drop `id` from all three breakpoints.
    pub fn remove(&mut self, id: &str) {
        for bp in Breakpoint::ALL {
            self.get_mut(bp).retain(|item| item.id != id);
        }
    }

    /// Give every item parked at [`BOTTOM_ROW`] the first row below the
    /// rest of the breakpoint's content.
    pub fn settle(&mut self, bp: Breakpoint) {
        let items = self.get_mut(bp);
        let mut floor = items
            .iter()
            .filter(|item| item.y != BOTTOM_ROW)
            .map(LayoutItem::bottom)
            .max()
            .unwrap_or(0);
        for item in items.iter_mut().filter(|item| item.y == BOTTOM_ROW) {
            item.y = floor;
            floor = item.bottom();
        }
    }
}

/// Widget list plus, for the grid variant, per-breakpoint placements.
///
/// The widget list decides which widgets exist; the layouts decide where
/// they sit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardLayout {
    #[serde(default)]
    pub widgets: Vec<WidgetConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layouts: Option<BreakpointLayouts>,
}

impl DashboardLayout {
    pub fn is_grid(&self) -> bool {
        self.layouts.is_some()
    }

    pub fn widget(&self, id: &str) -> Option<&WidgetConfig> {
        self.widgets.iter().find(|w| w.id == id)
    }

    pub fn widget_mut(&mut self, id: &str) -> Option<&mut WidgetConfig> {
        self.widgets.iter_mut().find(|w| w.id == id)
    }

    /// A fresh id of the form `<type>-<8 hex digits>`, unique in this layout.
    pub fn generate_widget_id(&self, type_tag: &str) -> String {
        loop {
            let candidate = format!("{type_tag}-{:08x}", rand::random::<u32>());
            if self.widget(&candidate).is_none() {
                return candidate;
            }
        }
    }
}

/// Root settings document, loaded and saved as a whole.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortalSettings {
    #[serde(default)]
    pub dashboard_layout: DashboardLayout,
    #[serde(default, deserialize_with = "ThemeMode::deserialize_lenient")]
    pub theme: ThemeMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<Background>,
    /// Fields added by the storage side (owner ids, timestamps); carried
    /// through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for PortalSettings {
    fn default() -> Self {
        Self {
            dashboard_layout: DashboardLayout {
                widgets: vec![
                    WidgetConfig::new("weather-default", WidgetType::Weather, 1),
                    WidgetConfig::new(
                        "news-default",
                        WidgetType::News(crate::dashboard::widgets::NewsCategory::General),
                        2,
                    ),
                    WidgetConfig::new("stocks-default", WidgetType::Stocks, 3),
                ],
                layouts: None,
            },
            theme: ThemeMode::System,
            background: None,
            extra: Map::new(),
        }
    }
}

impl PortalSettings {
    pub fn from_json(content: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn to_json_pretty(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Bring a freshly loaded document into shape.
    ///
    /// Numeric settings are clamped, blank ids are filled in, repeated ids
    /// are dropped and parked layout rows are settled. Layout entries that do
    /// not match the widget list are only reported; rendering filters them.
    pub fn sanitize(&mut self) -> Vec<String> {
        let mut warnings = Vec::new();
        let layout = &mut self.dashboard_layout;

        for idx in 0..layout.widgets.len() {
            if layout.widgets[idx].id.trim().is_empty() {
                let id = layout.generate_widget_id(layout.widgets[idx].type_tag());
                warnings.push(format!("widget without id assigned '{id}'"));
                layout.widgets[idx].id = id;
            }
        }

        let mut seen = HashSet::new();
        layout.widgets.retain(|w| {
            if seen.insert(w.id.clone()) {
                true
            } else {
                tracing::warn!(id = %w.id, "duplicate widget id dropped");
                warnings.push(format!("duplicate widget id '{}' dropped", w.id));
                false
            }
        });

        for widget in &mut layout.widgets {
            widget.settings.sanitize();
        }

        if let Some(layouts) = &mut layout.layouts {
            for bp in Breakpoint::ALL {
                layouts.settle(bp);
                let placed: HashSet<&str> =
                    layouts.get(bp).iter().map(|item| item.id.as_str()).collect();
                for id in &placed {
                    if !seen.contains(*id) {
                        warnings.push(format!(
                            "{} layout references missing widget '{id}'",
                            bp.as_str()
                        ));
                    }
                }
                for widget in &layout.widgets {
                    if !placed.contains(widget.id.as_str()) {
                        warnings.push(format!(
                            "widget '{}' has no {} placement",
                            widget.id,
                            bp.as_str()
                        ));
                    }
                }
            }
        }

        for w in &warnings {
            tracing::debug!("{w}");
        }
        warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn widget_json_keeps_type_outside_settings() {
        let cfg = WidgetConfig::new("w1", WidgetType::Weather, 1);
        let value = serde_json::to_value(&cfg).unwrap();
        assert_eq!(value["type"], json!("weather"));
        assert_eq!(value["settings"]["location"], json!("New York"));
        assert!(value["settings"].get("type").is_none());
    }

    #[test]
    fn layout_item_accepts_legacy_key_and_null_row() {
        let item: LayoutItem =
            serde_json::from_value(json!({ "i": "a", "x": 4, "y": null, "w": 4, "h": 2 }))
                .unwrap();
        assert_eq!(item.id, "a");
        assert_eq!(item.y, BOTTOM_ROW);
    }

    #[test]
    fn loose_numbers_are_rounded_instead_of_rejected() {
        let widget: WidgetConfig = serde_json::from_value(
            json!({ "id": "s", "type": "stocks", "order": 1.5 }),
        )
        .unwrap();
        assert_eq!(widget.order, 2);
        let widget: WidgetConfig =
            serde_json::from_value(json!({ "id": "s", "type": "stocks", "order": "3" })).unwrap();
        assert_eq!(widget.order, 3);
        let widget: WidgetConfig =
            serde_json::from_value(json!({ "id": "s", "type": "stocks", "order": [] })).unwrap();
        assert_eq!(widget.order, 0);

        let item: LayoutItem =
            serde_json::from_value(json!({ "id": "a", "x": 3.6, "y": 1, "w": "4", "h": false }))
                .unwrap();
        assert_eq!((item.x, item.y, item.w, item.h), (4, 1, 4, 1));
    }

    #[test]
    fn unknown_keys_round_trip_at_every_level() {
        let raw = json!({
            "id": "w",
            "type": "weather",
            "title": "Home",
            "order": 1,
            "pinned": true,
            "settings": {
                "location": "Oslo",
                "units": "metric",
                "showForecast": true,
                "zip": "0150"
            }
        });
        let widget: WidgetConfig = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(widget.extra.get("pinned"), Some(&json!(true)));
        assert_eq!(widget.retained_settings.get("zip"), Some(&json!("0150")));
        assert_eq!(serde_json::to_value(&widget).unwrap(), raw);

        let item = json!({ "id": "w", "x": 0, "y": 0, "w": 4, "h": 2, "minW": 2, "static": true });
        let parsed: LayoutItem = serde_json::from_value(item.clone()).unwrap();
        assert_eq!(serde_json::to_value(&parsed).unwrap(), item);
    }

    #[test]
    fn unreadable_field_is_kept_until_edited() {
        let mut widget: WidgetConfig = serde_json::from_value(json!({
            "id": "w",
            "type": "weather",
            "order": 1,
            "settings": { "location": "Oslo", "units": "standard" }
        }))
        .unwrap();
        assert_eq!(widget.settings_value()["units"], json!("standard"));
        assert_eq!(widget.settings_value()["location"], json!("Oslo"));

        widget.edit_settings(|settings| {
            if let WidgetSettings::Weather(weather) = settings {
                weather.location = "Bergen".into();
            }
        });
        assert_eq!(widget.settings_value()["units"], json!("standard"));

        widget.merge_settings(&json!({ "units": "imperial" })).unwrap();
        assert!(widget.retained_settings.is_empty());
        assert_eq!(widget.settings_value()["units"], json!("imperial"));
    }

    #[test]
    fn patch_keeps_unknown_keys_and_null_drops_them() {
        let mut widget = WidgetConfig::new("n", WidgetType::Stocks, 1);
        widget
            .merge_settings(&json!({ "chartStyle": "candles", "refreshInterval": 10 }))
            .unwrap();
        assert_eq!(widget.settings_value()["chartStyle"], json!("candles"));
        assert_eq!(widget.settings_value()["refreshInterval"], json!(10));

        widget.merge_settings(&json!({ "chartStyle": null })).unwrap();
        assert!(widget.settings_value().get("chartStyle").is_none());
    }

    #[test]
    fn append_places_below_existing_content_per_breakpoint() {
        let mut layouts = BreakpointLayouts {
            lg: vec![LayoutItem::new("a", 0, 0, 4, 3), LayoutItem::new("b", 4, 1, 4, 4)],
            md: vec![LayoutItem::new("a", 0, 0, 4, 2)],
            sm: Vec::new(),
        };
        layouts.append("c", (4, 4));
        assert_eq!(layouts.lg.last().unwrap().y, 5);
        assert_eq!(layouts.md.last().unwrap().y, 2);
        assert_eq!(layouts.sm.last().unwrap().y, 0);
    }

    #[test]
    fn sanitize_reports_orphans_without_removing_them() {
        let mut settings = PortalSettings::default();
        settings.dashboard_layout.layouts = Some(BreakpointLayouts {
            lg: vec![LayoutItem::new("ghost", 0, 0, 4, 4)],
            ..BreakpointLayouts::default()
        });
        let warnings = settings.sanitize();
        assert!(warnings.iter().any(|w| w.contains("ghost")));
        assert_eq!(settings.dashboard_layout.layouts.as_ref().unwrap().lg.len(), 1);
    }

    #[test]
    fn sanitize_drops_duplicate_ids_and_fills_blank_ones() {
        let mut settings = PortalSettings::default();
        let mut dup = settings.dashboard_layout.widgets[0].clone();
        dup.order = 9;
        settings.dashboard_layout.widgets.push(dup);
        let mut blank = WidgetConfig::new("", WidgetType::Trivia, 10);
        blank.title = "Quiz".into();
        settings.dashboard_layout.widgets.push(blank);

        let warnings = settings.sanitize();
        assert_eq!(warnings.len(), 2);
        let widgets = &settings.dashboard_layout.widgets;
        assert_eq!(widgets.len(), 4);
        assert!(widgets[3].id.starts_with("trivia-"));
    }

    #[test]
    fn storage_metadata_survives_round_trip() {
        let raw = json!({
            "dashboardLayout": { "widgets": [] },
            "theme": "dark",
            "userId": "u-42"
        });
        let settings: PortalSettings = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(settings.extra.get("userId"), Some(&json!("u-42")));
        assert_eq!(serde_json::to_value(&settings).unwrap(), raw);
    }
}
