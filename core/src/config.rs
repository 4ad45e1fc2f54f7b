//! Client configuration.

use std::{env, time::Duration};

use crate::error::ApiError;

/// Production endpoint of the Places API.
pub const DEFAULT_BASE_URL: &str = "https://maps.googleapis.com/maps/api/place/";

pub const API_KEY_ENV: &str = "GOOGLE_PLACES_API_KEY";
pub const BASE_URL_ENV: &str = "GOOGLE_PLACES_BASE_URL";
pub const SENSOR_ENV: &str = "GOOGLE_PLACES_SENSOR";
pub const TIMEOUT_ENV: &str = "GOOGLE_PLACES_TIMEOUT_SECS";

#[derive(Debug, Clone, PartialEq)]
pub struct PlacesConfig {
    pub api_key: String,
    pub base_url: String,
    /// Value of the legacy `sensor` parameter sent with every request.
    pub sensor: bool,
    /// Bound on a whole exchange. `None` leaves it to the transport.
    pub timeout: Option<Duration>,
}

impl PlacesConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            sensor: false,
            timeout: None,
        }
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn sensor(mut self, sensor: bool) -> Self {
        self.sensor = sensor;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Read configuration from `GOOGLE_PLACES_*` environment variables.
    /// Only the API key is required.
    pub fn from_env() -> Result<Self, ApiError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ApiError> {
        let api_key = lookup(API_KEY_ENV)
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| ApiError::InvalidArgument(format!("{API_KEY_ENV} is not set")))?;
        let mut config = Self::new(api_key);

        if let Some(base_url) = lookup(BASE_URL_ENV) {
            config.base_url = base_url;
        }
        if let Some(sensor) = lookup(SENSOR_ENV) {
            config.sensor = match sensor.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => true,
                "0" | "false" | "no" | "" => false,
                other => {
                    return Err(ApiError::InvalidArgument(format!(
                        "{SENSOR_ENV} must be true or false, got `{other}`"
                    )))
                }
            };
        }
        if let Some(secs) = lookup(TIMEOUT_ENV) {
            let secs: u64 = secs.trim().parse().map_err(|_| {
                ApiError::InvalidArgument(format!(
                    "{TIMEOUT_ENV} must be a whole number of seconds, got `{secs}`"
                ))
            })?;
            config.timeout = Some(Duration::from_secs(secs));
        }
        Ok(config)
    }
}
