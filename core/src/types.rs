//! Decoded value objects returned by the Places API.
//!
//! # Design
//! Each record is built once from the raw JSON mapping of a response. The
//! promoted fields (`geometry`, `location`, `viewport`, `address_components`,
//! ...) are removed from the mapping and decoded into typed values; whatever
//! remains is kept untouched in `extra`, so fields this crate does not model
//! are still reachable.
//!
//! Coordinates are decoded from the number's original text into a `Decimal`
//! and never pass through `f64`.

use std::{fmt, str::FromStr};

use rust_decimal::Decimal;
use serde_json::{Map, Value};

use crate::error::ApiError;

/// JSON object as decoded by `serde_json`.
pub type Object = Map<String, Value>;

/// A latitude/longitude pair.
#[derive(Debug, Clone, PartialEq)]
pub struct Coordinates {
    pub lat: Decimal,
    pub lng: Decimal,
    pub extra: Object,
}

impl Coordinates {
    pub fn new(lat: Decimal, lng: Decimal) -> Self {
        Self {
            lat,
            lng,
            extra: Object::new(),
        }
    }

    pub fn from_value(value: Value) -> Result<Self, ApiError> {
        Self::decode(value, "coordinates")
    }

    fn decode(value: Value, path: &str) -> Result<Self, ApiError> {
        let mut map = into_object(value, path)?;
        let lat = take_decimal(&mut map, "lat", path)?;
        let lng = take_decimal(&mut map, "lng", path)?;
        Ok(Self {
            lat,
            lng,
            extra: map,
        })
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.lat, self.lng)
    }
}

/// A bounding rectangle given by its south-west and north-east corners.
#[derive(Debug, Clone, PartialEq)]
pub struct Bounds {
    pub southwest: Coordinates,
    pub northeast: Coordinates,
    pub extra: Object,
}

impl Bounds {
    pub fn from_value(value: Value) -> Result<Self, ApiError> {
        Self::decode(value, "bounds")
    }

    fn decode(value: Value, path: &str) -> Result<Self, ApiError> {
        let mut map = into_object(value, path)?;
        let southwest = take_field(&mut map, "southwest", path)?;
        let southwest = Coordinates::decode(southwest, &format!("{path}.southwest"))?;
        let northeast = take_field(&mut map, "northeast", path)?;
        let northeast = Coordinates::decode(northeast, &format!("{path}.northeast"))?;
        Ok(Self {
            southwest,
            northeast,
            extra: map,
        })
    }
}

impl fmt::Display for Bounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.southwest, self.northeast)
    }
}

/// Spatial facts about a place.
///
/// `viewport` is `None` when the response carried no viewport.
#[derive(Debug, Clone, PartialEq)]
pub struct Geometry {
    pub location: Coordinates,
    pub viewport: Option<Bounds>,
    pub extra: Object,
}

impl Geometry {
    pub fn from_value(value: Value) -> Result<Self, ApiError> {
        Self::decode(value, "geometry")
    }

    fn decode(value: Value, path: &str) -> Result<Self, ApiError> {
        let mut map = into_object(value, path)?;
        let viewport = match map.remove("viewport") {
            Some(Value::Null) | None => None,
            Some(v) => Some(Bounds::decode(v, &format!("{path}.viewport"))?),
        };
        let location = take_field(&mut map, "location", path)?;
        let location = Coordinates::decode(location, &format!("{path}.location"))?;
        Ok(Self {
            location,
            viewport,
            extra: map,
        })
    }
}

impl fmt::Display for Geometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Geometry")
    }
}

/// One token of a formatted address.
#[derive(Debug, Clone, PartialEq)]
pub struct AddressComponent {
    /// Full text, e.g. "Alaska".
    pub long_name: String,
    /// Abbreviated text, e.g. "AK".
    pub short_name: String,
    pub types: Vec<String>,
    pub extra: Object,
}

impl AddressComponent {
    pub fn from_value(value: Value) -> Result<Self, ApiError> {
        Self::decode(value, "address_component")
    }

    fn decode(value: Value, path: &str) -> Result<Self, ApiError> {
        let mut map = into_object(value, path)?;
        let long_name = take_string(&mut map, "long_name", path)?;
        let short_name = take_string(&mut map, "short_name", path)?;
        let types = match map.remove("types") {
            Some(v) => string_list(v, &format!("{path}.types"))?,
            None => Vec::new(),
        };
        Ok(Self {
            long_name,
            short_name,
            types,
            extra: map,
        })
    }
}

impl fmt::Display for AddressComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.long_name)
    }
}

/// Fields shared by search and details results.
///
/// The provided accessors read passthrough fields from `extra` and return
/// `None` when a field is absent or has an unexpected shape.
pub trait Place {
    fn name(&self) -> &str;
    fn geometry(&self) -> &Geometry;
    fn extra(&self) -> &Object;

    fn field(&self, key: &str) -> Option<&Value> {
        self.extra().get(key)
    }

    fn id(&self) -> Option<&str> {
        self.field("id").and_then(Value::as_str)
    }

    /// Opaque token used for details, check-in and delete calls.
    fn reference(&self) -> Option<&str> {
        self.field("reference").and_then(Value::as_str)
    }

    fn types(&self) -> Vec<&str> {
        self.field("types")
            .and_then(Value::as_array)
            .map(|types| types.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }

    fn vicinity(&self) -> Option<&str> {
        self.field("vicinity").and_then(Value::as_str)
    }

    fn icon(&self) -> Option<&str> {
        self.field("icon").and_then(Value::as_str)
    }

    fn rating(&self) -> Option<Decimal> {
        self.field("rating").and_then(value_to_decimal)
    }
}

/// One hit of a place search.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaceSearchResult {
    /// Empty when the response omits it.
    pub name: String,
    pub geometry: Geometry,
    pub extra: Object,
}

impl PlaceSearchResult {
    pub fn from_value(value: Value) -> Result<Self, ApiError> {
        Self::decode(value, "result")
    }

    fn decode(value: Value, path: &str) -> Result<Self, ApiError> {
        let map = into_object(value, path)?;
        Self::from_object(map, path)
    }

    fn from_object(mut map: Object, path: &str) -> Result<Self, ApiError> {
        let name = match map.get("name") {
            None | Some(Value::Null) => {
                map.remove("name");
                String::new()
            }
            Some(_) => take_string(&mut map, "name", path)?,
        };
        let geometry = take_field(&mut map, "geometry", path)?;
        let geometry = Geometry::decode(geometry, &format!("{path}.geometry"))?;
        Ok(Self {
            name,
            geometry,
            extra: map,
        })
    }

    /// Decode the `results` array of a search response.
    pub(crate) fn decode_list(value: Value) -> Result<Vec<Self>, ApiError> {
        let items = match value {
            Value::Array(items) => items,
            other => {
                return Err(ApiError::DeserializationError(format!(
                    "results: expected an array, got {}",
                    kind(&other)
                )))
            }
        };
        items
            .into_iter()
            .enumerate()
            .map(|(i, item)| Self::decode(item, &format!("results[{i}]")))
            .collect()
    }
}

impl Place for PlaceSearchResult {
    fn name(&self) -> &str {
        &self.name
    }

    fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    fn extra(&self) -> &Object {
        &self.extra
    }
}

impl fmt::Display for PlaceSearchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// A fully resolved place: every search-result field plus the address.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaceDetailsResult {
    pub place: PlaceSearchResult,
    pub address_components: Vec<AddressComponent>,
}

impl PlaceDetailsResult {
    pub fn from_value(value: Value) -> Result<Self, ApiError> {
        let path = "result";
        let mut map = into_object(value, path)?;
        let address_components = match map.remove("address_components") {
            Some(Value::Array(items)) => items
                .into_iter()
                .enumerate()
                .map(|(i, item)| {
                    AddressComponent::decode(item, &format!("{path}.address_components[{i}]"))
                })
                .collect::<Result<Vec<_>, _>>()?,
            Some(Value::Null) | None => Vec::new(),
            Some(other) => {
                return Err(ApiError::DeserializationError(format!(
                    "{path}.address_components: expected an array, got {}",
                    kind(&other)
                )))
            }
        };
        let place = PlaceSearchResult::from_object(map, path)?;
        Ok(Self {
            place,
            address_components,
        })
    }

    pub fn formatted_address(&self) -> Option<&str> {
        self.field("formatted_address").and_then(Value::as_str)
    }

    pub fn formatted_phone_number(&self) -> Option<&str> {
        self.field("formatted_phone_number").and_then(Value::as_str)
    }

    pub fn international_phone_number(&self) -> Option<&str> {
        self.field("international_phone_number")
            .and_then(Value::as_str)
    }

    pub fn website(&self) -> Option<&str> {
        self.field("website").and_then(Value::as_str)
    }

    /// Google-hosted page for the place.
    pub fn url(&self) -> Option<&str> {
        self.field("url").and_then(Value::as_str)
    }
}

impl Place for PlaceDetailsResult {
    fn name(&self) -> &str {
        &self.place.name
    }

    fn geometry(&self) -> &Geometry {
        &self.place.geometry
    }

    fn extra(&self) -> &Object {
        &self.place.extra
    }
}

impl fmt::Display for PlaceDetailsResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.place.name)
    }
}

/// Confirmation of a submitted place. `extra` holds the rest of the
/// envelope (`status`, `reference`, `scope`).
#[derive(Debug, Clone, PartialEq)]
pub struct PlaceAddResult {
    pub id: String,
    pub extra: Object,
}

impl PlaceAddResult {
    pub fn from_value(value: Value) -> Result<Self, ApiError> {
        let path = "add response";
        let mut map = into_object(value, path)?;
        let id = take_string(&mut map, "id", path)?;
        Ok(Self { id, extra: map })
    }

    pub fn reference(&self) -> Option<&str> {
        self.extra.get("reference").and_then(Value::as_str)
    }

    /// `APP` until the place passes moderation.
    pub fn scope(&self) -> Option<&str> {
        self.extra.get("scope").and_then(Value::as_str)
    }

    pub fn status(&self) -> Option<&str> {
        self.extra.get("status").and_then(Value::as_str)
    }
}

impl fmt::Display for PlaceAddResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

/// Parse decimal text, accepting scientific notation.
pub(crate) fn parse_decimal(text: &str) -> Option<Decimal> {
    let text = text.trim();
    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .ok()
}

fn value_to_decimal(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => parse_decimal(&n.to_string()),
        Value::String(s) => parse_decimal(s),
        _ => None,
    }
}

pub(crate) fn into_object(value: Value, path: &str) -> Result<Object, ApiError> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(ApiError::DeserializationError(format!(
            "{path}: expected an object, got {}",
            kind(&other)
        ))),
    }
}

fn take_field(map: &mut Object, key: &str, path: &str) -> Result<Value, ApiError> {
    map.remove(key)
        .ok_or_else(|| ApiError::DeserializationError(format!("{path}: missing field `{key}`")))
}

fn take_string(map: &mut Object, key: &str, path: &str) -> Result<String, ApiError> {
    match take_field(map, key, path)? {
        Value::String(s) => Ok(s),
        other => Err(ApiError::DeserializationError(format!(
            "{path}.{key}: expected a string, got {}",
            kind(&other)
        ))),
    }
}

fn take_decimal(map: &mut Object, key: &str, path: &str) -> Result<Decimal, ApiError> {
    let value = take_field(map, key, path)?;
    value_to_decimal(&value).ok_or_else(|| {
        ApiError::DeserializationError(format!("{path}.{key}: `{value}` is not a decimal number"))
    })
}

fn string_list(value: Value, path: &str) -> Result<Vec<String>, ApiError> {
    let Value::Array(items) = value else {
        return Err(ApiError::DeserializationError(format!(
            "{path}: expected an array of strings"
        )));
    };
    items
        .into_iter()
        .map(|item| match item {
            Value::String(s) => Ok(s),
            other => Err(ApiError::DeserializationError(format!(
                "{path}: expected a string, got {}",
                kind(&other)
            ))),
        })
        .collect()
}

pub(crate) fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
