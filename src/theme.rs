use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Value};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    Light,
    Dark,
    System,
}

impl Default for ThemeMode {
    fn default() -> Self {
        ThemeMode::System
    }
}

impl ThemeMode {
    pub const ALL: [ThemeMode; 3] = [ThemeMode::Light, ThemeMode::Dark, ThemeMode::System];

    pub fn as_str(&self) -> &'static str {
        match self {
            ThemeMode::Light => "light",
            ThemeMode::Dark => "dark",
            ThemeMode::System => "system",
        }
    }

    /// Field deserializer that reads unknown modes as `System` instead of
    /// failing the surrounding document.
    pub fn deserialize_lenient<'de, D>(deserializer: D) -> Result<ThemeMode, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(ThemeMode::deserialize(&value).unwrap_or_else(|_| {
            tracing::warn!(theme = %value, "unknown theme mode, using system");
            ThemeMode::System
        }))
    }
}

/// What the environment reports about its own colour scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemPreference {
    Light,
    Dark,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppliedTheme {
    Light,
    Dark,
}

/// Theme that should actually be painted. `System` follows the environment
/// and falls back to light when it has no opinion.
pub fn resolve_theme(mode: ThemeMode, system: SystemPreference) -> AppliedTheme {
    match (mode, system) {
        (ThemeMode::Light, _) => AppliedTheme::Light,
        (ThemeMode::Dark, _) => AppliedTheme::Dark,
        (ThemeMode::System, SystemPreference::Dark) => AppliedTheme::Dark,
        (ThemeMode::System, _) => AppliedTheme::Light,
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum HolidayTheme {
    NewYear,
    Valentines,
    StPatricks,
    Easter,
    Halloween,
    Thanksgiving,
    Christmas,
}

impl HolidayTheme {
    pub const ALL: [HolidayTheme; 7] = [
        HolidayTheme::NewYear,
        HolidayTheme::Valentines,
        HolidayTheme::StPatricks,
        HolidayTheme::Easter,
        HolidayTheme::Halloween,
        HolidayTheme::Thanksgiving,
        HolidayTheme::Christmas,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            HolidayTheme::NewYear => "New Year",
            HolidayTheme::Valentines => "Valentine's Day",
            HolidayTheme::StPatricks => "St. Patrick's Day",
            HolidayTheme::Easter => "Easter",
            HolidayTheme::Halloween => "Halloween",
            HolidayTheme::Thanksgiving => "Thanksgiving",
            HolidayTheme::Christmas => "Christmas",
        }
    }

    /// Base colour painted behind the dashboard for this theme.
    pub fn base_color(&self) -> [u8; 3] {
        match self {
            HolidayTheme::NewYear => [18, 24, 56],
            HolidayTheme::Valentines => [120, 20, 60],
            HolidayTheme::StPatricks => [16, 96, 48],
            HolidayTheme::Easter => [186, 170, 220],
            HolidayTheme::Halloween => [40, 20, 8],
            HolidayTheme::Thanksgiving => [120, 64, 16],
            HolidayTheme::Christmas => [110, 16, 20],
        }
    }
}

/// Dashboard backdrop. Absent in the document means no background.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(from = "Value", into = "Value")]
pub enum Background {
    None,
    Solid { color: String },
    Holiday { theme: HolidayTheme },
    /// A backdrop this build cannot paint (newer holiday, new kind). Written
    /// back exactly as it was read.
    Unrecognised(Value),
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
enum KnownBackground {
    None,
    Solid { color: String },
    Holiday { theme: HolidayTheme },
}

impl From<Value> for Background {
    fn from(value: Value) -> Self {
        match KnownBackground::deserialize(&value) {
            Ok(KnownBackground::None) => Background::None,
            Ok(KnownBackground::Solid { color }) => Background::Solid { color },
            Ok(KnownBackground::Holiday { theme }) => Background::Holiday { theme },
            Err(err) => {
                tracing::warn!(
                    background = %value,
                    error = %err,
                    "unrecognised background kept as stored"
                );
                Background::Unrecognised(value)
            }
        }
    }
}

impl From<Background> for Value {
    fn from(background: Background) -> Self {
        match background {
            Background::None => json!({ "type": "none" }),
            Background::Solid { color } => json!({ "type": "solid", "color": color }),
            Background::Holiday { theme } => json!({ "type": "holiday", "theme": theme }),
            Background::Unrecognised(value) => value,
        }
    }
}

impl Background {
    /// RGB fill for the backdrop, if any. Malformed colours and unrecognised
    /// backdrops yield `None`.
    pub fn fill_rgb(&self) -> Option<[u8; 3]> {
        match self {
            Background::None | Background::Unrecognised(_) => None,
            Background::Solid { color } => parse_hex_rgb(color),
            Background::Holiday { theme } => Some(theme.base_color()),
        }
    }
}

pub fn parse_hex_rgb(raw: &str) -> Option<[u8; 3]> {
    let hex = raw.trim().strip_prefix('#')?;
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    Some([channel(0)?, channel(2)?, channel(4)?])
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn explicit_modes_ignore_environment() {
        assert_eq!(
            resolve_theme(ThemeMode::Light, SystemPreference::Dark),
            AppliedTheme::Light
        );
        assert_eq!(
            resolve_theme(ThemeMode::Dark, SystemPreference::Light),
            AppliedTheme::Dark
        );
    }

    #[test]
    fn system_mode_follows_environment() {
        assert_eq!(
            resolve_theme(ThemeMode::System, SystemPreference::Dark),
            AppliedTheme::Dark
        );
        assert_eq!(
            resolve_theme(ThemeMode::System, SystemPreference::Unknown),
            AppliedTheme::Light
        );
    }

    #[test]
    fn background_json_shape() {
        let bg = Background::Holiday {
            theme: HolidayTheme::StPatricks,
        };
        assert_eq!(
            serde_json::to_value(&bg).unwrap(),
            json!({ "type": "holiday", "theme": "st-patricks" })
        );
        let solid: Background =
            serde_json::from_value(json!({ "type": "solid", "color": "#1e293b" })).unwrap();
        assert_eq!(solid.fill_rgb(), Some([0x1e, 0x29, 0x3b]));
    }

    #[test]
    fn unrecognised_background_is_written_back_verbatim() {
        let stored = json!({ "type": "holiday", "theme": "independence-day", "sparkle": true });
        let bg: Background = serde_json::from_value(stored.clone()).unwrap();
        assert_eq!(bg, Background::Unrecognised(stored.clone()));
        assert_eq!(bg.fill_rgb(), None);
        assert_eq!(serde_json::to_value(&bg).unwrap(), stored);
    }

    #[derive(Deserialize)]
    struct Doc {
        #[serde(default, deserialize_with = "ThemeMode::deserialize_lenient")]
        theme: ThemeMode,
    }

    #[test]
    fn unknown_theme_mode_reads_as_system() {
        let doc: Doc = serde_json::from_value(json!({ "theme": "solarized" })).unwrap();
        assert_eq!(doc.theme, ThemeMode::System);
        let doc: Doc = serde_json::from_value(json!({ "theme": "dark" })).unwrap();
        assert_eq!(doc.theme, ThemeMode::Dark);
        let doc: Doc = serde_json::from_value(json!({})).unwrap();
        assert_eq!(doc.theme, ThemeMode::System);
    }

    #[test]
    fn malformed_hex_is_rejected() {
        assert_eq!(parse_hex_rgb("1e293b"), None);
        assert_eq!(parse_hex_rgb("#12345"), None);
        assert_eq!(parse_hex_rgb("#zzzzzz"), None);
    }
}
