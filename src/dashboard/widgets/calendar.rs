use super::{
    clamp_to, is_http_url, SettingsShape, DAYS_TO_SHOW_RANGE, REFRESH_INTERVAL_RANGE,
};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

// Older documents carry a single `calendarUrl` instead of the `calendars`
// array:
// {"type":"calendar","settings":{"calendarUrl":"https://.../basic.ics","daysToShow":7}}

pub const DEFAULT_CALENDAR_COLOR: &str = "#3b82f6";

static HEX_COLOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"^#[0-9a-fA-F]{6}$").unwrap());

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CalendarSource {
    pub url: String,
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_color")]
    pub color: String,
}

impl CalendarSource {
    pub fn new(url: &str, name: &str, color: &str) -> Self {
        Self {
            url: url.trim().to_string(),
            name: name.trim().to_string(),
            color: color.trim().to_string(),
        }
    }
}

fn default_color() -> String {
    DEFAULT_CALENDAR_COLOR.into()
}

fn default_days_to_show() -> u32 {
    7
}

fn default_refresh_interval() -> u32 {
    15
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CalendarSettings {
    #[serde(default)]
    pub calendars: Vec<CalendarSource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calendar_url: Option<String>,
    #[serde(default = "default_days_to_show")]
    pub days_to_show: u32,
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval: u32,
}

impl Default for CalendarSettings {
    fn default() -> Self {
        Self {
            calendars: Vec::new(),
            calendar_url: None,
            days_to_show: default_days_to_show(),
            refresh_interval: default_refresh_interval(),
        }
    }
}

impl CalendarSettings {
    /// Canonical list of calendar sources.
    ///
    /// This is the only place the legacy single-URL form is recognised.
    pub fn sources(&self) -> Vec<CalendarSource> {
        if !self.calendars.is_empty() {
            return self.calendars.clone();
        }
        match self.calendar_url.as_deref().map(str::trim) {
            Some(url) if !url.is_empty() => {
                vec![CalendarSource::new(url, "Calendar", DEFAULT_CALENDAR_COLOR)]
            }
            _ => Vec::new(),
        }
    }

    /// Rewrite the settings into the array form.
    pub fn migrate(&mut self) {
        self.calendars = self.sources();
        self.calendar_url = None;
    }

    pub fn add_source(&mut self, source: CalendarSource) {
        self.migrate();
        self.calendars.push(source);
    }

    pub fn remove_source(&mut self, index: usize) -> Option<CalendarSource> {
        self.migrate();
        if index < self.calendars.len() {
            Some(self.calendars.remove(index))
        } else {
            None
        }
    }
}

impl SettingsShape for CalendarSettings {
    fn sanitize(&mut self) {
        self.days_to_show = clamp_to(self.days_to_show, &DAYS_TO_SHOW_RANGE);
        self.refresh_interval = clamp_to(self.refresh_interval, &REFRESH_INTERVAL_RANGE);
        for source in &mut self.calendars {
            source.url = source.url.trim().to_string();
            if source.color.trim().is_empty() {
                source.color = default_color();
            }
        }
    }

    fn validate(&self, warnings: &mut Vec<String>) {
        let sources = self.sources();
        if sources.is_empty() {
            warnings.push("calendar widget has no calendar sources".into());
        }
        for source in &sources {
            if !is_http_url(&source.url) {
                warnings.push(format!(
                    "calendar URL '{}' is not a valid http(s) URL",
                    source.url
                ));
            }
            if !HEX_COLOR.is_match(&source.color) {
                warnings.push(format!(
                    "calendar color '{}' is not a #rrggbb value",
                    source.color
                ));
            }
        }
    }

    fn summary(&self) -> String {
        format!(
            "{} calendar(s), next {} days",
            self.sources().len(),
            self.days_to_show
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn legacy() -> CalendarSettings {
        CalendarSettings {
            calendar_url: Some("https://example.com/basic.ics".into()),
            ..CalendarSettings::default()
        }
    }

    #[test]
    fn legacy_url_becomes_single_source() {
        let sources = legacy().sources();
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].url, "https://example.com/basic.ics");
        assert_eq!(sources[0].color, DEFAULT_CALENDAR_COLOR);
    }

    #[test]
    fn array_form_wins_over_legacy_field() {
        let mut settings = legacy();
        settings.calendars = vec![CalendarSource::new(
            "https://example.com/work.ics",
            "Work",
            "#ff0000",
        )];
        let sources = settings.sources();
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].name, "Work");
    }

    #[test]
    fn adding_a_source_migrates_the_legacy_url() {
        let mut settings = legacy();
        settings.add_source(CalendarSource::new(
            "https://example.com/home.ics",
            "Home",
            "#00ff00",
        ));
        assert_eq!(settings.calendar_url, None);
        let urls: Vec<_> = settings.calendars.iter().map(|c| c.url.as_str()).collect();
        assert_eq!(
            urls,
            vec!["https://example.com/basic.ics", "https://example.com/home.ics"]
        );
    }

    #[test]
    fn bad_color_is_reported() {
        let mut settings = CalendarSettings::default();
        settings.add_source(CalendarSource::new("https://example.com/a.ics", "A", "red"));
        let mut warnings = Vec::new();
        settings.validate(&mut warnings);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("red"));
    }
}
