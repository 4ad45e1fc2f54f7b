//! Synchronous client core for the Google Places API.
//!
//! # Overview
//! Validates search, details, check-in, add and delete parameters, builds
//! `HttpRequest` values for them, and decodes the JSON responses into typed
//! value objects (`PlaceSearchResult`, `PlaceDetailsResult`, `Geometry`,
//! `Bounds`, `Coordinates`, `AddressComponent`, `PlaceAddResult`).
//!
//! # Design
//! - `PlacesClient` never touches the network: `build_*` produces a request
//!   and `parse_*` consumes a response (host-does-IO).
//! - `GooglePlaces` runs build, transport and parse in one blocking call. The
//!   `Transport` trait is the seam for tests and custom HTTP stacks;
//!   `UreqTransport` is the default.
//! - Decoded records keep unmodelled response fields in an `extra` map, and
//!   coordinates are exact `Decimal`s.

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod places;
pub mod request;
pub mod types;
pub mod vocabulary;

pub use client::{decode_response, Operation, PlacesClient};
pub use config::PlacesConfig;
pub use error::{ApiError, RemoteStatus};
pub use http::{HttpMethod, HttpRequest, HttpResponse, Transport, TransportError, UreqTransport};
pub use places::GooglePlaces;
pub use request::{AddPlace, LocationQuery, SearchRequest};
pub use types::{
    AddressComponent, Bounds, Coordinates, Geometry, Place, PlaceAddResult, PlaceDetailsResult,
    PlaceSearchResult,
};
pub use rust_decimal::Decimal;
