//! Weather input hook.
//!
//! Local weather samples arrive from a weather-station node through the
//! command surface. The monitor derives a simplified daily
//! evapotranspiration figure and a duration factor the runner applies to
//! scheduled run lengths. This is strictly an input hook: no forecast or
//! adjustment *logic* lives here beyond the precipitation scale-down.

use log::info;
use serde::{Deserialize, Serialize};

use crate::config::IrrigationConfig;

/// One local weather observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeatherSample {
    pub temperature_c: f32,
    pub humidity_pct: f32,
    pub wind_mps: f32,
    pub precipitation_inches: f32,
}

/// Tracks the latest observation and the derived adjustment factor.
#[derive(Debug)]
pub struct WeatherMonitor {
    last: Option<WeatherSample>,
    daily_et: f32,
    rain_threshold_inches: f32,
    rain_duration_factor: f32,
}

impl WeatherMonitor {
    pub fn new(config: &IrrigationConfig) -> Self {
        Self {
            last: None,
            daily_et: 0.0,
            rain_threshold_inches: config.rain_threshold_inches,
            rain_duration_factor: config.rain_duration_factor,
        }
    }

    /// Ingest a fresh observation and update the derived figures.
    pub fn update(&mut self, sample: WeatherSample) {
        self.daily_et =
            calculate_et(sample.temperature_c, sample.humidity_pct, sample.wind_mps);
        info!(
            "Weather update: {:.1}C {:.0}% RH, {:.2}in rain, ET {:.3}",
            sample.temperature_c, sample.humidity_pct, sample.precipitation_inches, self.daily_et
        );
        self.last = Some(sample);
    }

    /// Latest derived evapotranspiration figure.
    pub fn daily_et(&self) -> f32 {
        self.daily_et
    }

    pub fn last_sample(&self) -> Option<&WeatherSample> {
        self.last.as_ref()
    }

    /// Multiplier the runner applies to scheduled run durations.
    /// Recent precipitation above the threshold scales runs down;
    /// otherwise durations pass through unchanged.
    pub fn duration_factor(&self) -> f32 {
        match &self.last {
            Some(s) if s.precipitation_inches > self.rain_threshold_inches => {
                self.rain_duration_factor
            }
            _ => 1.0,
        }
    }
}

/// Simplified ET estimate from temperature, humidity, and wind.
pub fn calculate_et(temperature_c: f32, humidity_pct: f32, wind_mps: f32) -> f32 {
    0.0023 * temperature_c * (100.0 - humidity_pct) + 0.1 * wind_mps
}
