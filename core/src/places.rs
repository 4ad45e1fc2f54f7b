//! Blocking facade that runs each operation as one round trip.

use tracing::debug;

use crate::client::{Operation, PlacesClient};
use crate::config::PlacesConfig;
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse, Transport, UreqTransport};
use crate::request::{AddPlace, SearchRequest};
use crate::types::{PlaceAddResult, PlaceDetailsResult, PlaceSearchResult};

/// A `PlacesClient` paired with the transport that executes its requests.
///
/// Each call validates, performs exactly one exchange, and decodes the
/// result. Nothing is retried or cached. Sharing across threads is safe when
/// `T` is.
#[derive(Debug, Clone)]
pub struct GooglePlaces<T = UreqTransport> {
    client: PlacesClient,
    transport: T,
}

impl GooglePlaces<UreqTransport> {
    pub fn new(api_key: &str) -> Self {
        Self::with_transport(PlacesClient::new(api_key), UreqTransport::new())
    }

    pub fn from_config(config: &PlacesConfig) -> Self {
        Self::with_transport(
            PlacesClient::from_config(config),
            UreqTransport::with_timeout(config.timeout),
        )
    }
}

impl<T: Transport> GooglePlaces<T> {
    pub fn with_transport(client: PlacesClient, transport: T) -> Self {
        Self { client, transport }
    }

    /// Change the `sensor` flag sent with every later request.
    pub fn with_sensor(mut self, sensor: bool) -> Self {
        self.client = self.client.with_sensor(sensor);
        self
    }

    pub fn client(&self) -> &PlacesClient {
        &self.client
    }

    /// Nearby search. `ZERO_RESULTS` surfaces as `RemoteRejected`.
    pub fn search(&self, request: &SearchRequest) -> Result<Vec<PlaceSearchResult>, ApiError> {
        let req = self.client.build_search(request)?;
        self.client.parse_search(self.execute(Operation::Search, &req)?)
    }

    pub fn details(
        &self,
        reference: &str,
        language: Option<&str>,
    ) -> Result<PlaceDetailsResult, ApiError> {
        let req = self.client.build_details(reference, language)?;
        self.client.parse_details(self.execute(Operation::Details, &req)?)
    }

    pub fn check_in(&self, reference: &str) -> Result<(), ApiError> {
        let req = self.client.build_check_in(reference)?;
        self.client.parse_check_in(self.execute(Operation::CheckIn, &req)?)
    }

    /// Submit a new place. It is visible to this key at once and to other
    /// applications only after moderation.
    pub fn add(&self, place: &AddPlace) -> Result<PlaceAddResult, ApiError> {
        let req = self.client.build_add(place)?;
        self.client.parse_add(self.execute(Operation::Add, &req)?)
    }

    /// Delete a place. The service only honors this for unmoderated places
    /// added with the same key; anything else comes back as
    /// `REQUEST_DENIED`.
    pub fn delete(&self, reference: &str) -> Result<(), ApiError> {
        let req = self.client.build_delete(reference)?;
        self.client.parse_delete(self.execute(Operation::Delete, &req)?)
    }

    fn execute(&self, operation: Operation, req: &HttpRequest) -> Result<HttpResponse, ApiError> {
        let response = self.transport.perform(req)?;
        debug!(%operation, status = response.status, "Places exchange complete");
        Ok(response)
    }
}
