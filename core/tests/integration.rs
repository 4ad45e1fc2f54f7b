//! Full Places lifecycle against the live mock server.
//!
//! # Design
//! Starts the mock server on a random port, then exercises every operation
//! over real HTTP through `GooglePlaces` and `UreqTransport`.

use std::net::SocketAddr;
use std::time::Duration;

use places_core::{
    AddPlace, ApiError, GooglePlaces, Place, PlacesClient, PlacesConfig, RemoteStatus,
    SearchRequest, UreqTransport,
};

const SYDNEY: (f64, f64) = (-33.8670, 151.1957);

fn start_mock_server() -> SocketAddr {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener).await
        })
        .unwrap();
    });

    addr
}

fn places(addr: SocketAddr, key: &str) -> GooglePlaces {
    let config = PlacesConfig::new(key)
        .base_url(format!("http://{addr}/"))
        .timeout(Duration::from_secs(10));
    GooglePlaces::from_config(&config)
}

#[test]
fn places_lifecycle() {
    let addr = start_mock_server();
    let owner = places(addr, "owner-key");
    let stranger = places(addr, "stranger-key");

    // Step 1: search finds the seeded place, with its viewport.
    let results = owner
        .search(&SearchRequest::new(SYDNEY, Some(500.0)).types(["establishment"]))
        .unwrap();
    assert_eq!(results.len(), 1);
    let seed = &results[0];
    assert_eq!(seed.name(), "Google Sydney");
    assert_eq!(seed.geometry.location.lat.to_string(), "-33.866651");
    assert!(seed.geometry.viewport.is_some());
    assert_eq!(seed.vicinity(), Some("48 Pirrama Road, Pyrmont"));
    let seed_reference = seed.reference().unwrap().to_string();

    // Step 2: details resolve the address.
    let details = owner.details(&seed_reference, Some("en")).unwrap();
    assert_eq!(details.name(), "Google Sydney");
    assert_eq!(details.address_components.len(), 2);
    assert_eq!(details.address_components[1].short_name, "NSW");
    assert!(details.url().is_some());

    // Step 3: check in.
    owner.check_in(&seed_reference).unwrap();

    // Step 4: add a place; it is visible to its owner only.
    let added = owner
        .add(&AddPlace::new((-33.8669710, 151.1958750), 50.0, "Test Cafe").place_type("cafe"))
        .unwrap();
    assert_eq!(added.scope(), Some("APP"));
    let reference = added.reference().unwrap().to_string();

    let mine = owner
        .search(&SearchRequest::new(SYDNEY, Some(500.0)).types(["cafe"]))
        .unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].name(), "Test Cafe");
    assert_eq!(mine[0].geometry.location.lat.to_string(), "-33.866971");
    assert!(mine[0].geometry.viewport.is_none());

    let err = stranger
        .search(&SearchRequest::new(SYDNEY, Some(500.0)).types(["cafe"]))
        .unwrap_err();
    assert_eq!(err.status(), Some(RemoteStatus::ZeroResults));

    // Step 5: only the owner may delete it.
    let err = stranger.delete(&reference).unwrap_err();
    assert!(matches!(err, ApiError::RemoteRejected { status } if status == "REQUEST_DENIED"));
    owner.delete(&reference).unwrap();

    let err = owner.details(&reference, None).unwrap_err();
    assert_eq!(err.status(), Some(RemoteStatus::NotFound));

    // Step 6: moderated places cannot be deleted.
    let err = owner.delete(&seed_reference).unwrap_err();
    assert_eq!(err.status(), Some(RemoteStatus::RequestDenied));
}

#[test]
fn over_quota_is_reported() {
    let addr = start_mock_server();
    let err = places(addr, mock_server::OVER_QUOTA_KEY)
        .search(&SearchRequest::new(SYDNEY, Some(500.0)))
        .unwrap_err();
    assert!(matches!(err, ApiError::RemoteRejected { status } if status == "OVER_QUERY_LIMIT"));
}

#[test]
fn unknown_endpoint_surfaces_http_error() {
    let addr = start_mock_server();
    let client = PlacesClient::new("k").with_base_url(&format!("http://{addr}/nowhere"));
    let p = GooglePlaces::with_transport(client, UreqTransport::new());
    let err = p.check_in("ref").unwrap_err();
    assert!(matches!(err, ApiError::HttpError { status: 404, .. }));
}

#[test]
fn connection_refused_is_transport_error() {
    // Bind then drop to get a port with nothing listening.
    let addr = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap();
    let err = places(addr, "k").details("ref", None).unwrap_err();
    assert!(matches!(err, ApiError::Transport(_)));
}
