//! Stateless HTTP request builder and response parser for the Places API.
//!
//! # Design
//! `PlacesClient` holds the API key, base URL and sensor flag and carries no
//! mutable state between calls. Each operation is split into a `build_*`
//! method that validates the inputs and produces an `HttpRequest`, and a
//! `parse_*` method that consumes an `HttpResponse`. `GooglePlaces` joins the
//! two halves with a `Transport`; callers that run their own I/O can use this
//! type directly.
//!
//! Every request goes through `build_request`, which appends `key` and
//! `sensor` to the query string. Every response goes through
//! `decode_response`; the `status` field is checked afterwards, per
//! operation.

use std::fmt;

use serde::Serialize;
use serde_json::{Number, Value};
use tracing::{debug, warn};

use crate::config::{PlacesConfig, DEFAULT_BASE_URL};
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::request::{AddPlace, SearchRequest};
use crate::types::{into_object, kind, Object, PlaceAddResult, PlaceDetailsResult, PlaceSearchResult};
use crate::vocabulary::{is_add_type, is_search_type};

/// The five endpoints of the Places API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Search,
    Details,
    CheckIn,
    Add,
    Delete,
}

impl Operation {
    /// Path segment of the endpoint, as in `<base>/<segment>/json`.
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::Search => "search",
            Operation::Details => "details",
            Operation::CheckIn => "check-in",
            Operation::Add => "add",
            Operation::Delete => "delete",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Serialize)]
struct ReferenceBody<'a> {
    reference: &'a str,
}

#[derive(Serialize)]
struct LatLngBody {
    lat: Number,
    lng: Number,
}

#[derive(Serialize)]
struct AddBody<'a> {
    location: LatLngBody,
    accuracy: Number,
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    types: Option<[&'a str; 1]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    language: Option<&'a str>,
}

/// Synchronous, stateless client for the Places API.
///
/// Builds `HttpRequest` values and parses `HttpResponse` values without
/// touching the network.
#[derive(Clone)]
pub struct PlacesClient {
    api_key: String,
    base_url: String,
    sensor: bool,
}

impl fmt::Debug for PlacesClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlacesClient")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("sensor", &self.sensor)
            .finish()
    }
}

impl PlacesClient {
    pub fn new(api_key: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            base_url: DEFAULT_BASE_URL.trim_end_matches('/').to_string(),
            sensor: false,
        }
    }

    pub fn from_config(config: &PlacesConfig) -> Self {
        Self::new(&config.api_key)
            .with_base_url(&config.base_url)
            .with_sensor(config.sensor)
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_sensor(mut self, sensor: bool) -> Self {
        self.sensor = sensor;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn sensor(&self) -> bool {
        self.sensor
    }

    /// Build the request for `operation`.
    ///
    /// `key` and `sensor` are appended after `query`. A `body` makes the
    /// request a JSON POST; without one it is a GET.
    pub fn build_request(
        &self,
        operation: Operation,
        mut query: Vec<(String, String)>,
        body: Option<String>,
    ) -> HttpRequest {
        query.push(("key".to_string(), self.api_key.clone()));
        query.push(("sensor".to_string(), self.sensor.to_string()));

        let query_string = query
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");
        let url = format!("{}/{}/json?{}", self.base_url, operation, query_string);

        let (method, headers) = if body.is_some() {
            (
                HttpMethod::Post,
                vec![("content-type".to_string(), "application/json".to_string())],
            )
        } else {
            (HttpMethod::Get, Vec::new())
        };
        debug!(%operation, ?method, base_url = %self.base_url, "built Places request");

        HttpRequest {
            method,
            url,
            query,
            headers,
            body,
        }
    }

    pub fn build_search(&self, request: &SearchRequest) -> Result<HttpRequest, ApiError> {
        let mut query = Vec::new();

        let (lat, lng) = request.location.lat_lng()?;
        query.push(("location".to_string(), format!("{lat},{lng}")));

        if let Some(radius) = request.radius {
            if !radius.is_finite() || radius <= 0.0 {
                return Err(ApiError::InvalidArgument(
                    "radius must be greater than zero".to_string(),
                ));
            }
            query.push(("radius".to_string(), radius.to_string()));
        }

        if !request.types.is_empty() {
            if let Some(unknown) = request.types.iter().find(|t| !is_search_type(t)) {
                return Err(ApiError::InvalidArgument(format!(
                    "invalid types list supplied: `{unknown}` is not a known category"
                )));
            }
            query.push(("types".to_string(), request.types.join("|")));
        }

        if let Some(language) = non_empty(request.language.as_deref()) {
            query.push(("language".to_string(), language.to_string()));
        }
        if let Some(name) = non_empty(request.name.as_deref()) {
            query.push(("name".to_string(), name.to_string()));
        }

        Ok(self.build_request(Operation::Search, query, None))
    }

    pub fn build_details(
        &self,
        reference: &str,
        language: Option<&str>,
    ) -> Result<HttpRequest, ApiError> {
        let reference = require_reference(reference)?;
        let mut query = vec![("reference".to_string(), reference.to_string())];
        if let Some(language) = non_empty(language) {
            query.push(("language".to_string(), language.to_string()));
        }
        Ok(self.build_request(Operation::Details, query, None))
    }

    pub fn build_check_in(&self, reference: &str) -> Result<HttpRequest, ApiError> {
        self.build_reference_write(Operation::CheckIn, reference)
    }

    pub fn build_add(&self, place: &AddPlace) -> Result<HttpRequest, ApiError> {
        let (lat, lng) = place.location.lat_lng()?;
        if !place.accuracy.is_finite() {
            return Err(ApiError::InvalidArgument(
                "accuracy must be a finite number".to_string(),
            ));
        }
        if place.name.trim().is_empty() {
            return Err(ApiError::InvalidArgument("name must be provided".to_string()));
        }

        let types = match non_empty(place.place_type.as_deref()) {
            Some(place_type) if is_add_type(place_type) => Some([place_type]),
            Some(place_type) => {
                return Err(ApiError::InvalidArgument(format!(
                    "`{place_type}` is not a supported place type"
                )))
            }
            None => None,
        };

        let body = AddBody {
            location: LatLngBody {
                lat: decimal_number(&lat.to_string())?,
                lng: decimal_number(&lng.to_string())?,
            },
            accuracy: decimal_number(&place.accuracy.to_string())?,
            name: &place.name,
            types,
            language: non_empty(place.language.as_deref()),
        };
        let body = serde_json::to_string(&body)
            .map_err(|e| ApiError::SerializationError(e.to_string()))?;

        Ok(self.build_request(Operation::Add, Vec::new(), Some(body)))
    }

    pub fn build_delete(&self, reference: &str) -> Result<HttpRequest, ApiError> {
        self.build_reference_write(Operation::Delete, reference)
    }

    fn build_reference_write(
        &self,
        operation: Operation,
        reference: &str,
    ) -> Result<HttpRequest, ApiError> {
        let reference = require_reference(reference)?;
        let body = serde_json::to_string(&ReferenceBody { reference })
            .map_err(|e| ApiError::SerializationError(e.to_string()))?;
        Ok(self.build_request(operation, Vec::new(), Some(body)))
    }

    pub fn parse_search(&self, response: HttpResponse) -> Result<Vec<PlaceSearchResult>, ApiError> {
        let mut envelope = decode_response(response)?;
        check_status(&envelope, Operation::Search)?;
        match envelope.remove("results") {
            Some(results) => PlaceSearchResult::decode_list(results),
            None => Ok(Vec::new()),
        }
    }

    pub fn parse_details(&self, response: HttpResponse) -> Result<PlaceDetailsResult, ApiError> {
        let mut envelope = decode_response(response)?;
        check_status(&envelope, Operation::Details)?;
        let result = envelope.remove("result").ok_or_else(|| {
            ApiError::DeserializationError("details response: missing field `result`".to_string())
        })?;
        PlaceDetailsResult::from_value(result)
    }

    pub fn parse_check_in(&self, response: HttpResponse) -> Result<(), ApiError> {
        let envelope = decode_response(response)?;
        check_status(&envelope, Operation::CheckIn)
    }

    pub fn parse_add(&self, response: HttpResponse) -> Result<PlaceAddResult, ApiError> {
        let envelope = decode_response(response)?;
        check_status(&envelope, Operation::Add)?;
        PlaceAddResult::from_value(Value::Object(envelope))
    }

    pub fn parse_delete(&self, response: HttpResponse) -> Result<(), ApiError> {
        let envelope = decode_response(response)?;
        check_status(&envelope, Operation::Delete)
    }
}

/// Decode a response body into its JSON envelope.
///
/// A non-2xx status is an `HttpError`. The `status` field is not inspected.
pub fn decode_response(response: HttpResponse) -> Result<Object, ApiError> {
    if !(200..300).contains(&response.status) {
        return Err(ApiError::HttpError {
            status: response.status,
            body: response.body,
        });
    }
    let value: Value = serde_json::from_str(&response.body)
        .map_err(|e| ApiError::DeserializationError(e.to_string()))?;
    into_object(value, "response")
}

/// `RemoteRejected` unless the envelope's `status` is exactly `OK`.
fn check_status(envelope: &Object, operation: Operation) -> Result<(), ApiError> {
    match envelope.get("status") {
        Some(Value::String(status)) if status == "OK" => Ok(()),
        Some(Value::String(status)) => {
            warn!(%operation, %status, "Places request rejected");
            Err(ApiError::RemoteRejected {
                status: status.clone(),
            })
        }
        Some(other) => Err(ApiError::DeserializationError(format!(
            "response.status: expected a string, got {}",
            kind(other)
        ))),
        None => Err(ApiError::DeserializationError(
            "response: missing field `status`".to_string(),
        )),
    }
}

fn require_reference(reference: &str) -> Result<&str, ApiError> {
    if reference.trim().is_empty() {
        return Err(ApiError::InvalidArgument(
            "reference must be provided".to_string(),
        ));
    }
    Ok(reference)
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

fn decimal_number(text: &str) -> Result<Number, ApiError> {
    text.parse::<Number>()
        .map_err(|e| ApiError::SerializationError(format!("`{text}` is not a JSON number: {e}")))
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;
    use crate::types::{Coordinates, Place};

    fn client() -> PlacesClient {
        PlacesClient::new("test-key").with_base_url("http://localhost:3000/")
    }

    fn body_json(req: &HttpRequest) -> Value {
        serde_json::from_str(req.body.as_deref().unwrap()).unwrap()
    }

    #[test]
    fn operation_segments() {
        assert_eq!(Operation::Search.as_str(), "search");
        assert_eq!(Operation::Details.as_str(), "details");
        assert_eq!(Operation::CheckIn.as_str(), "check-in");
        assert_eq!(Operation::Add.as_str(), "add");
        assert_eq!(Operation::Delete.as_str(), "delete");
    }

    #[test]
    fn default_base_url_is_production() {
        let req = PlacesClient::new("k").build_request(Operation::Search, Vec::new(), None);
        assert_eq!(
            req.url,
            "https://maps.googleapis.com/maps/api/place/search/json?key=k&sensor=false"
        );
    }

    #[test]
    fn build_request_appends_key_and_sensor_last() {
        let req = client().with_sensor(true).build_request(
            Operation::Details,
            vec![("reference".to_string(), "abc".to_string())],
            None,
        );
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(
            req.url,
            "http://localhost:3000/details/json?reference=abc&key=test-key&sensor=true"
        );
        assert!(req.headers.is_empty());
        assert!(req.body.is_none());
    }

    #[test]
    fn build_request_with_body_is_a_json_post() {
        let req = client().build_request(Operation::CheckIn, Vec::new(), Some("{}".to_string()));
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(
            req.headers,
            vec![("content-type".to_string(), "application/json".to_string())]
        );
        assert_eq!(req.query_param("key"), Some("test-key"));
        assert_eq!(req.query_param("sensor"), Some("false"));
    }

    #[test]
    fn build_search_encodes_location_and_radius() {
        let req = client()
            .build_search(&SearchRequest::new((51.5150228, -0.1082299), Some(500.0)))
            .unwrap();
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.query_param("location"), Some("51.5150228,-0.1082299"));
        assert_eq!(req.query_param("radius"), Some("500"));
        assert!(req
            .url
            .starts_with("http://localhost:3000/search/json?location=51.5150228%2C-0.1082299&radius=500"));
    }

    #[test]
    fn build_search_without_radius_omits_it() {
        let req = client()
            .build_search(&SearchRequest::new((1.0, 2.0), None))
            .unwrap();
        assert!(req.query_param("radius").is_none());
    }

    #[test]
    fn build_search_rejects_text_location() {
        let err = client()
            .build_search(&SearchRequest::new("40.0,-70.0", Some(100.0)))
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidArgument(msg) if msg.contains("lat/lng pair")));
    }

    #[test]
    fn build_search_rejects_non_positive_radius() {
        for radius in [0.0, -5.0, f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let err = client()
                .build_search(&SearchRequest::new((1.0, 2.0), Some(radius)))
                .unwrap_err();
            assert!(matches!(err, ApiError::InvalidArgument(_)), "radius {radius}");
        }
    }

    #[test]
    fn build_search_joins_types_with_pipes() {
        let req = client()
            .build_search(&SearchRequest::new((1.0, 2.0), Some(10.0)).types(["restaurant", "cafe"]))
            .unwrap();
        assert_eq!(req.query_param("types"), Some("restaurant|cafe"));
        assert!(req.url.contains("types=restaurant%7Ccafe"));
    }

    #[test]
    fn build_search_accepts_geographic_types() {
        let req = client()
            .build_search(&SearchRequest::new((1.0, 2.0), Some(10.0)).types(["locality"]))
            .unwrap();
        assert_eq!(req.query_param("types"), Some("locality"));
    }

    #[test]
    fn build_search_rejects_unknown_types() {
        let err = client()
            .build_search(
                &SearchRequest::new((1.0, 2.0), Some(10.0)).types(["restaurant", "not_a_real_type"]),
            )
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidArgument(msg) if msg.contains("not_a_real_type")));
    }

    #[test]
    fn build_search_passes_language_and_name() {
        let req = client()
            .build_search(
                &SearchRequest::new((1.0, 2.0), Some(10.0))
                    .language("fr")
                    .name("Café & Bar"),
            )
            .unwrap();
        assert_eq!(req.query_param("language"), Some("fr"));
        assert_eq!(req.query_param("name"), Some("Café & Bar"));
        assert!(req.url.contains("name=Caf%C3%A9%20%26%20Bar"));
    }

    #[test]
    fn build_details_requires_reference() {
        let err = client().build_details(" ", None).unwrap_err();
        assert!(matches!(err, ApiError::InvalidArgument(_)));

        let req = client().build_details("ref-1", Some("de")).unwrap();
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.query_param("reference"), Some("ref-1"));
        assert_eq!(req.query_param("language"), Some("de"));
    }

    #[test]
    fn build_check_in_and_delete_send_reference_body() {
        let c = client();
        for (req, segment) in [
            (c.build_check_in("ref-1").unwrap(), "check-in"),
            (c.build_delete("ref-1").unwrap(), "delete"),
        ] {
            assert_eq!(req.method, HttpMethod::Post);
            assert!(req.url.starts_with(&format!("http://localhost:3000/{segment}/json?key=")));
            assert_eq!(body_json(&req), serde_json::json!({"reference": "ref-1"}));
        }
    }

    #[test]
    fn build_add_produces_body() {
        let place = AddPlace::new((51.5150228, -0.1082299), 50.0, "Test Cafe")
            .place_type("cafe")
            .language("en-AU");
        let req = client().build_add(&place).unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        assert!(req.url.starts_with("http://localhost:3000/add/json?"));
        let body = body_json(&req);
        assert_eq!(body["types"], serde_json::json!(["cafe"]));
        assert_eq!(body["name"], "Test Cafe");
        assert_eq!(body["accuracy"], 50.0);
        assert_eq!(body["language"], "en-AU");
    }

    #[test]
    fn build_add_writes_accuracy_as_given() {
        for (accuracy, text) in [(50.0, r#""accuracy":50,"#), (12.5, r#""accuracy":12.5,"#)] {
            let req = client()
                .build_add(&AddPlace::new((1.0, 2.0), accuracy, "Somewhere"))
                .unwrap();
            assert!(req.body.as_deref().unwrap().contains(text), "accuracy {accuracy}");
        }
    }

    #[test]
    fn build_add_without_type_omits_types() {
        let req = client()
            .build_add(&AddPlace::new((1.0, 2.0), 10.0, "Somewhere"))
            .unwrap();
        let body = body_json(&req);
        assert!(body.get("types").is_none());
        assert!(body.get("language").is_none());
    }

    #[test]
    fn build_add_location_round_trips_in_order() {
        let place = AddPlace::new((dec!(-33.8669710), dec!(151.1958750)), 50.0, "Opera");
        let req = client().build_add(&place).unwrap();
        let body = body_json(&req);
        let decoded = Coordinates::from_value(body["location"].clone()).unwrap();
        assert_eq!(decoded.lat, dec!(-33.8669710));
        assert_eq!(decoded.lng, dec!(151.1958750));
    }

    #[test]
    fn build_add_rejects_unknown_or_search_only_type() {
        for place_type in ["not_a_category", "locality"] {
            let err = client()
                .build_add(&AddPlace::new((1.0, 2.0), 10.0, "X").place_type(place_type))
                .unwrap_err();
            assert!(matches!(err, ApiError::InvalidArgument(msg) if msg.contains(place_type)));
        }
    }

    #[test]
    fn build_add_rejects_bad_location_and_name() {
        let err = client()
            .build_add(&AddPlace::new("somewhere", 10.0, "X"))
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidArgument(_)));

        let err = client()
            .build_add(&AddPlace::new((1.0, 2.0), 10.0, ""))
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidArgument(_)));

        let err = client()
            .build_add(&AddPlace::new((1.0, 2.0), f64::INFINITY, "X"))
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidArgument(_)));
    }

    #[test]
    fn parse_search_success() {
        let response = HttpResponse::ok(
            r#"{"status":"OK","results":[{"name":"Cafe X","geometry":{"location":{"lat":"1.5","lng":"2.5"}}}]}"#,
        );
        let results = client().parse_search(response).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].name(), "Cafe X");
        assert_eq!(results[0].geometry.location.lat, dec!(1.5));
        assert_eq!(results[0].geometry.location.lat.to_string(), "1.5");
        assert!(results[0].geometry.viewport.is_none());
    }

    #[test]
    fn parse_search_ok_without_results_is_empty() {
        let results = client()
            .parse_search(HttpResponse::ok(r#"{"status":"OK","results":[]}"#))
            .unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn parse_search_rejected_status() {
        for status in ["OVER_QUERY_LIMIT", "ZERO_RESULTS", "REQUEST_DENIED", "INVALID_REQUEST"] {
            let body = format!(r#"{{"status":"{status}"}}"#);
            let err = client().parse_search(HttpResponse::ok(body)).unwrap_err();
            assert!(
                matches!(&err, ApiError::RemoteRejected { status: s } if s == status),
                "{status}"
            );
        }
    }

    #[test]
    fn parse_rejects_missing_status() {
        let err = client()
            .parse_check_in(HttpResponse::ok(r#"{"results":[]}"#))
            .unwrap_err();
        assert!(matches!(err, ApiError::DeserializationError(_)));
    }

    #[test]
    fn parse_rejects_http_errors_before_status() {
        let response = HttpResponse {
            status: 500,
            headers: Vec::new(),
            body: "internal error".to_string(),
        };
        let err = client().parse_search(response).unwrap_err();
        assert!(matches!(err, ApiError::HttpError { status: 500, .. }));
    }

    #[test]
    fn parse_rejects_bad_json() {
        let err = client()
            .parse_details(HttpResponse::ok("not json"))
            .unwrap_err();
        assert!(matches!(err, ApiError::DeserializationError(_)));
    }

    #[test]
    fn parse_details_success() {
        let response = HttpResponse::ok(
            r#"{"status":"OK","result":{"name":"Capitol","geometry":{"location":{"lat":38.57,"lng":-121.49}},
                "address_components":[{"long_name":"CA","short_name":"CA","types":["administrative_area_level_1"]}]}}"#,
        );
        let details = client().parse_details(response).unwrap();
        assert_eq!(details.address_components.len(), 1);
        assert_eq!(details.address_components[0].long_name, "CA");
    }

    #[test]
    fn parse_details_requires_result() {
        let err = client()
            .parse_details(HttpResponse::ok(r#"{"status":"OK"}"#))
            .unwrap_err();
        assert!(matches!(err, ApiError::DeserializationError(msg) if msg.contains("`result`")));
    }

    #[test]
    fn parse_add_keeps_envelope() {
        let result = client()
            .parse_add(HttpResponse::ok(
                r#"{"status":"OK","id":"abc","reference":"ref-abc","scope":"APP"}"#,
            ))
            .unwrap();
        assert_eq!(result.id, "abc");
        assert_eq!(result.status(), Some("OK"));
        assert_eq!(result.scope(), Some("APP"));
    }

    #[test]
    fn parse_delete_denied() {
        let err = client()
            .parse_delete(HttpResponse::ok(r#"{"status":"REQUEST_DENIED"}"#))
            .unwrap_err();
        assert!(matches!(err, ApiError::RemoteRejected { status } if status == "REQUEST_DENIED"));
    }

    #[test]
    fn parse_check_in_success() {
        assert!(client()
            .parse_check_in(HttpResponse::ok(r#"{"status":"OK"}"#))
            .is_ok());
    }

    #[test]
    fn debug_redacts_api_key() {
        let debug = format!("{:?}", client());
        assert!(!debug.contains("test-key"));
        assert!(debug.contains("<redacted>"));
    }
}
