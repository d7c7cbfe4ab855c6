use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use serde_json::json;
use tower::ServiceExt;
use voyage_api::build_app;

const API_KEY: &str = "dev-voyage-key";

#[tokio::test]
async fn health_is_public() {
    let app = build_app().await.expect("app should build");

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn search_requires_api_key() {
    let app = build_app().await.expect("app should build");

    let request = Request::builder()
        .method("POST")
        .uri("/v1/search")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({
                "query": "family trip to goa"
            })
            .to_string(),
        ))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn search_returns_parsed_parameters() {
    let app = build_app().await.expect("app should build");

    let request = Request::builder()
        .method("POST")
        .uri("/v1/search")
        .header("content-type", "application/json")
        .header("x-api-key", API_KEY)
        .body(Body::from(
            json!({
                "query": "Plan a 5 day trip to Bali for 2 people with a budget of 2000 dollars"
            })
            .to_string(),
        ))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let parsed: serde_json::Value = serde_json::from_slice(&body).unwrap();

    assert_eq!(parsed["parsed"]["destination"], "bali");
    assert_eq!(parsed["parsed"]["duration_days"], 5);
    assert_eq!(parsed["parsed"]["people"], 2);
    assert_eq!(parsed["parsed"]["budget"], 2000);
    assert_eq!(parsed["group_type"], "couple");
    assert!(parsed["restaurants"].as_array().is_some());
}

#[tokio::test]
async fn quote_endpoint_computes_totals() {
    let app = build_app().await.expect("app should build");

    let request = Request::builder()
        .method("POST")
        .uri("/v1/quote")
        .header("content-type", "application/json")
        .header("x-api-key", API_KEY)
        .body(Body::from(
            json!({
                "items": [
                    { "name": "Sunscreen", "base_unit_price": 100.0, "quantity": 10 }
                ],
                "margin_percent": 20.0
            })
            .to_string(),
        ))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let quote: serde_json::Value = serde_json::from_slice(&body).unwrap();

    let grand_total = quote["grand_total"].as_f64().unwrap();
    assert!((grand_total - 1475.0).abs() < 1e-6);
    let margin_value = quote["margin_value"].as_f64().unwrap();
    assert!((margin_value - 250.0).abs() < 1e-6);
}

#[tokio::test]
async fn quote_endpoint_rejects_negative_prices() {
    let app = build_app().await.expect("app should build");

    let request = Request::builder()
        .method("POST")
        .uri("/v1/quote")
        .header("content-type", "application/json")
        .header("x-api-key", API_KEY)
        .body(Body::from(
            json!({
                "items": [
                    { "name": "Refund voucher", "base_unit_price": -10.0, "quantity": 1 }
                ],
                "margin_percent": 20.0
            })
            .to_string(),
        ))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn itinerary_grouping_partitions_activities() {
    let app = build_app().await.expect("app should build");

    let request = Request::builder()
        .method("POST")
        .uri("/v1/itinerary/group")
        .header("content-type", "application/json")
        .header("x-api-key", API_KEY)
        .body(Body::from(
            json!({
                "activities": [
                    { "id": "a1", "name": "Uluwatu Temple" },
                    { "id": "a2", "name": "Single Fin" },
                    { "id": "a3", "name": "Ubud Art Market" }
                ]
            })
            .to_string(),
        ))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let grouped: serde_json::Value = serde_json::from_slice(&body).unwrap();

    let groups = grouped["groups"].as_array().unwrap();
    assert_eq!(groups.len(), 2);
    let total: usize = groups
        .iter()
        .map(|group| group["activities"].as_array().unwrap().len())
        .sum();
    assert_eq!(total, 3);
}

#[tokio::test]
async fn favorites_toggle_roundtrip() {
    let app = build_app().await.expect("app should build");

    let toggle = Request::builder()
        .method("POST")
        .uri("/v1/favorites/toggle")
        .header("content-type", "application/json")
        .header("x-api-key", API_KEY)
        .body(Body::from(json!({ "id": "r3" }).to_string()))
        .unwrap();

    let response = app.clone().oneshot(toggle).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let list = Request::builder()
        .method("GET")
        .uri("/v1/favorites")
        .header("x-api-key", API_KEY)
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(list).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let parsed: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(parsed["favorites"], json!(["r3"]));
}

#[tokio::test]
async fn trip_update_recomputes_the_total() {
    let app = build_app().await.expect("app should build");

    let request = Request::builder()
        .method("POST")
        .uri("/v1/trip")
        .header("content-type", "application/json")
        .header("x-api-key", API_KEY)
        .body(Body::from(
            json!({
                "destination": "bali",
                "travelers": { "adults": 2, "children": 0 },
                "activities": [
                    { "id": "a1", "name": "Surf lesson", "price": 30.0 }
                ]
            })
            .to_string(),
        ))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let draft: serde_json::Value = serde_json::from_slice(&body).unwrap();
    let total = draft["total_price"].as_f64().unwrap();
    assert!((total - 60.0).abs() < 1e-6);
}
