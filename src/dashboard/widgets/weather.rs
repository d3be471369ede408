use super::SettingsShape;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TemperatureUnits {
    Imperial,
    Metric,
}

impl Default for TemperatureUnits {
    fn default() -> Self {
        TemperatureUnits::Imperial
    }
}

impl TemperatureUnits {
    pub fn as_str(&self) -> &'static str {
        match self {
            TemperatureUnits::Imperial => "imperial",
            TemperatureUnits::Metric => "metric",
        }
    }
}

/// Optional explicit position; the weather fetch falls back to geocoding
/// `location` when absent.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

fn default_location() -> String {
    "New York".into()
}

fn default_show_forecast() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WeatherSettings {
    #[serde(default = "default_location")]
    pub location: String,
    #[serde(default)]
    pub units: TemperatureUnits,
    #[serde(default = "default_show_forecast")]
    pub show_forecast: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinates>,
}

impl Default for WeatherSettings {
    fn default() -> Self {
        Self {
            location: default_location(),
            units: TemperatureUnits::default(),
            show_forecast: default_show_forecast(),
            coordinates: None,
        }
    }
}

impl SettingsShape for WeatherSettings {
    fn sanitize(&mut self) {
        self.location = self.location.trim().to_string();
        if let Some(coords) = &mut self.coordinates {
            coords.latitude = coords.latitude.clamp(-90.0, 90.0);
            coords.longitude = coords.longitude.clamp(-180.0, 180.0);
        }
    }

    fn validate(&self, warnings: &mut Vec<String>) {
        if self.location.is_empty() && self.coordinates.is_none() {
            warnings.push("weather widget needs a location or coordinates".into());
        }
    }

    fn summary(&self) -> String {
        let forecast = if self.show_forecast { ", with forecast" } else { "" };
        format!("{} ({}{})", self.location, self.units.as_str(), forecast)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coordinates_are_clamped_to_the_globe() {
        let mut settings = WeatherSettings {
            coordinates: Some(Coordinates {
                latitude: 123.0,
                longitude: -400.0,
            }),
            ..WeatherSettings::default()
        };
        settings.sanitize();
        assert_eq!(
            settings.coordinates,
            Some(Coordinates {
                latitude: 90.0,
                longitude: -180.0
            })
        );
    }
}
