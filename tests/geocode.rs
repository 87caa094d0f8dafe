//! Integration tests for `GeocodeProvider` and `LocationResolver` using
//! wiremock HTTP mocks.

use basket_tui::api::GeocodeProvider;
use basket_tui::error::LocationError;
use basket_tui::location::{CoordinateSource, LocationResolver, PositionOptions};
use basket_tui::models::{Coordinates, DetectedLocation};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const BENGALURU: Coordinates = Coordinates {
    latitude: 12.9716,
    longitude: 77.5946,
};

fn test_provider(base_url: &str) -> GeocodeProvider {
    GeocodeProvider::with_base_url(base_url, "basket-tui-tests", 5)
        .expect("provider construction should not fail")
}

#[tokio::test]
async fn reverse_geocode_extracts_address() {
    let server = MockServer::start().await;

    let body = serde_json::json!({
        "place_id": 123,
        "display_name": "Cubbon Park, Bengaluru",
        "address": {
            "amenity": "Cubbon Park",
            "road": "Kasturba Road",
            "suburb": "Shivajinagar",
            "city": "Bengaluru",
            "postcode": "560001",
            "country": "India"
        }
    });

    Mock::given(method("GET"))
        .and(path("/reverse"))
        .and(query_param("format", "json"))
        .and(query_param("lat", "12.9716"))
        .and(query_param("lon", "77.5946"))
        .and(query_param("addressdetails", "1"))
        .and(header("user-agent", "basket-tui-tests"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let loc = test_provider(&server.uri())
        .fetch_address(BENGALURU)
        .await
        .expect("should parse address");

    assert_eq!(
        loc,
        DetectedLocation {
            city: "Bengaluru".into(),
            area: "Shivajinagar".into(),
            landmark: "Cubbon Park".into(),
            pincode: "560001".into(),
        }
    );
}

#[tokio::test]
async fn response_without_address_gives_empty_fields() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/reverse"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "address": {} })),
        )
        .mount(&server)
        .await;

    let loc = test_provider(&server.uri())
        .fetch_address(BENGALURU)
        .await
        .expect("empty address is still a success");

    assert_eq!(loc, DetectedLocation::default());
}

#[tokio::test]
async fn server_error_is_geocode_failure() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = test_provider(&server.uri())
        .fetch_address(BENGALURU)
        .await
        .unwrap_err();

    assert!(matches!(err, LocationError::GeocodeFailure(_)), "got {err:?}");
}

#[tokio::test]
async fn malformed_body_is_geocode_failure() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>rate limited</html>"))
        .mount(&server)
        .await;

    let err = test_provider(&server.uri())
        .fetch_address(BENGALURU)
        .await
        .unwrap_err();

    assert!(matches!(err, LocationError::GeocodeFailure(_)), "got {err:?}");
}

#[tokio::test]
async fn resolver_with_manual_coordinates_hits_geocoder() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/reverse"))
        .and(query_param("lat", "19.076"))
        .and(query_param("lon", "72.8777"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "address": { "town": "Mumbai", "neighbourhood": "Colaba", "postcode": "400005" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let resolver = LocationResolver::new(
        Some(CoordinateSource::Manual(Coordinates {
            latitude: 19.076,
            longitude: 72.8777,
        })),
        test_provider(&server.uri()),
        PositionOptions::default(),
    );

    let loc = resolver.detect_location().await.expect("should resolve");

    assert_eq!(loc.city, "Mumbai");
    assert_eq!(loc.area, "Colaba");
    assert_eq!(loc.landmark, "");
    assert_eq!(loc.label(), "Mumbai");
}
