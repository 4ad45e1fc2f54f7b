//! Caller-facing request inputs.
//!
//! These carry parameters exactly as the caller gave them. Validation
//! happens in `PlacesClient::build_*`, so an invalid input is reported as
//! `ApiError::InvalidArgument` before any request exists.

use rust_decimal::Decimal;

use crate::error::ApiError;
use crate::types::parse_decimal;

/// A location argument as supplied by the caller.
///
/// Only a two-element numeric value is a valid location. Free text (an
/// address, or `"40.0,-70.0"` as a single string) is representable so it can
/// be rejected with a clear error instead of being guessed at.
#[derive(Debug, Clone, PartialEq)]
pub enum LocationQuery {
    LatLng(Decimal, Decimal),
    Sequence(Vec<Decimal>),
    Text(String),
    /// A float that has no decimal form (NaN, infinity).
    NotFinite,
}

impl LocationQuery {
    /// The `(lat, lng)` pair, or `InvalidArgument` for every other shape.
    pub fn lat_lng(&self) -> Result<(Decimal, Decimal), ApiError> {
        match self {
            LocationQuery::LatLng(lat, lng) => Ok((*lat, *lng)),
            LocationQuery::Sequence(values) if values.len() == 2 => Ok((values[0], values[1])),
            _ => Err(ApiError::InvalidArgument(
                "location must be a lat/lng pair".to_string(),
            )),
        }
    }
}

/// Converts through the shortest text that round-trips, so `51.5_f64`
/// becomes `51.5` rather than its full binary expansion.
fn decimal_from_f64(value: f64) -> Option<Decimal> {
    if !value.is_finite() {
        return None;
    }
    parse_decimal(&value.to_string())
}

fn from_floats(values: &[f64]) -> LocationQuery {
    values
        .iter()
        .map(|v| decimal_from_f64(*v))
        .collect::<Option<Vec<_>>>()
        .map_or(LocationQuery::NotFinite, LocationQuery::Sequence)
}

impl From<(Decimal, Decimal)> for LocationQuery {
    fn from((lat, lng): (Decimal, Decimal)) -> Self {
        LocationQuery::LatLng(lat, lng)
    }
}

impl From<(f64, f64)> for LocationQuery {
    fn from((lat, lng): (f64, f64)) -> Self {
        match (decimal_from_f64(lat), decimal_from_f64(lng)) {
            (Some(lat), Some(lng)) => LocationQuery::LatLng(lat, lng),
            _ => LocationQuery::NotFinite,
        }
    }
}

impl From<[f64; 2]> for LocationQuery {
    fn from([lat, lng]: [f64; 2]) -> Self {
        (lat, lng).into()
    }
}

impl From<&[f64]> for LocationQuery {
    fn from(values: &[f64]) -> Self {
        from_floats(values)
    }
}

impl From<Vec<f64>> for LocationQuery {
    fn from(values: Vec<f64>) -> Self {
        from_floats(&values)
    }
}

impl From<Vec<Decimal>> for LocationQuery {
    fn from(values: Vec<Decimal>) -> Self {
        LocationQuery::Sequence(values)
    }
}

impl From<&str> for LocationQuery {
    fn from(text: &str) -> Self {
        LocationQuery::Text(text.to_string())
    }
}

impl From<String> for LocationQuery {
    fn from(text: String) -> Self {
        LocationQuery::Text(text)
    }
}

impl From<crate::types::Coordinates> for LocationQuery {
    fn from(c: crate::types::Coordinates) -> Self {
        LocationQuery::LatLng(c.lat, c.lng)
    }
}

/// Parameters of a nearby search.
#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub location: LocationQuery,
    /// Meters. Must be greater than zero when set.
    pub radius: Option<f64>,
    /// Category filter; empty means no filter.
    pub types: Vec<String>,
    pub language: Option<String>,
    pub name: Option<String>,
}

impl SearchRequest {
    pub fn new(location: impl Into<LocationQuery>, radius: Option<f64>) -> Self {
        Self {
            location: location.into(),
            radius,
            types: Vec::new(),
            language: None,
            name: None,
        }
    }

    pub fn types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.types = types.into_iter().map(Into::into).collect();
        self
    }

    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// A new place to submit.
///
/// The service accepts a single category on submission, so this carries
/// `place_type` rather than a list.
#[derive(Debug, Clone)]
pub struct AddPlace {
    pub location: LocationQuery,
    /// Accuracy of the location signal, in meters.
    pub accuracy: f64,
    pub name: String,
    pub place_type: Option<String>,
    pub language: Option<String>,
}

impl AddPlace {
    pub fn new(location: impl Into<LocationQuery>, accuracy: f64, name: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            accuracy,
            name: name.into(),
            place_type: None,
            language: None,
        }
    }

    pub fn place_type(mut self, place_type: impl Into<String>) -> Self {
        self.place_type = Some(place_type.into());
        self
    }

    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }
}
