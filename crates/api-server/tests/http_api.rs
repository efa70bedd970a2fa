//! Wire-level tests for the HTTP surface: route matching, status codes, and
//! error payloads, driven through the router without a listener.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use spotserve_api::ApiServer;
use spotserve_core::config::AppConfig;
use spotserve_core::types::Dimensions;
use spotserve_management::models::{CreateCampaignRequest, CreateClientRequest, CreateSpotRequest};
use spotserve_management::CampaignStore;
use std::sync::Arc;
use tower::ServiceExt;

fn app_with_header_banner() -> (Router, Arc<CampaignStore>, u64, Vec<u64>) {
    let config = AppConfig::default();
    let store = Arc::new(CampaignStore::new(config.scheduling.clone()));
    let today = Utc::now().date_naive();

    let spot = store
        .create_spot(CreateSpotRequest {
            technical_id: "header-banner".into(),
            name: "Header Banner".into(),
            dimensions: Some(Dimensions { width: 728, height: 90 }),
            rotation_interval_ms: Some(45_000),
            max_slots: Some(5),
            active: true,
        })
        .expect("spot");
    let client = store
        .create_client(CreateClientRequest {
            name: "Northwind Traders".into(),
            contact_email: None,
            contact_phone: None,
        })
        .expect("client");

    let mut ids = Vec::new();
    for priority in 1..=2u32 {
        let campaign = store
            .create_campaign(CreateCampaignRequest {
                spot_id: spot.id,
                client_id: client.id,
                name: format!("Header slot {}", priority),
                priority,
                start_date: today - Duration::days(3),
                end_date: today + Duration::days(10),
                media_url: format!("https://cdn.spotserve.example/header/{}.png", priority),
                mobile_media_url: None,
                destination_url: "https://example.com/offers".into(),
            })
            .expect("campaign");
        store.activate_campaign(campaign.id).expect("activate");
        ids.push(campaign.id);
    }

    let app = ApiServer::new(config, store.clone()).router();
    (app, store, spot.id, ids)
}

async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    // Rejections (bad query strings) come back as plain text, not JSON.
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

#[tokio::test]
async fn test_get_ad_by_technical_id() {
    let (app, _store, _spot_id, campaign_ids) = app_with_header_banner();

    let (status, body) = get(app, "/api/v1/ad-spots/header-banner/ad").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["rotation_interval_ms"], 45_000);
    assert_eq!(body["total_campaigns"], 2);
    let campaigns = body["campaigns"].as_array().expect("campaigns array");
    assert_eq!(campaigns.len(), 2);
    assert_eq!(campaigns[0]["id"], campaign_ids[0]);
    assert_eq!(campaigns[1]["id"], campaign_ids[1]);
}

#[tokio::test]
async fn test_get_ad_unknown_spot_is_404() {
    let (app, _store, _spot_id, _ids) = app_with_header_banner();
    let (status, body) = get(app, "/api/v1/ad-spots/no-such-spot/ad").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn test_track_view_returns_no_content_and_counts() {
    let (app, store, _spot_id, campaign_ids) = app_with_header_banner();
    let id = campaign_ids[0];

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/api/v1/campaigns/{}/track-view", id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let stats = store.campaign_stats(id).expect("stats");
    assert_eq!(stats.views, 1);
}

#[tokio::test]
async fn test_management_routes_capture_path_params() {
    let (app, _store, _spot_id, campaign_ids) = app_with_header_banner();
    let id = campaign_ids[0];

    let (status, body) = get(app.clone(), &format!("/api/v1/management/campaigns/{}", id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], id);
    assert_eq!(body["status"], "active");

    let (status, body) = get(app, &format!("/api/v1/management/campaigns/{}/stats", id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["campaign_id"], id);
    assert_eq!(body["views"], 0);
}

#[tokio::test]
async fn test_create_conflict_returns_409_with_availability() {
    let (app, store, spot_id, _ids) = app_with_header_banner();
    let today = Utc::now().date_naive();
    let client_id = store.list_clients()[0].id;

    let payload = json!({
        "spot_id": spot_id,
        "client_id": client_id,
        "name": "Conflicting",
        "priority": 1,
        "start_date": today,
        "end_date": today + Duration::days(5),
        "media_url": "https://cdn.spotserve.example/x.png",
        "destination_url": "https://example.com",
    });
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/management/campaigns")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(payload.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["availability"]["is_available"], false);
    assert_eq!(body["availability"]["priority_taken"], true);
    assert!(body["availability"]["available_priorities"]
        .as_array()
        .expect("priorities")
        .iter()
        .all(|p| p != 1));
}

#[tokio::test]
async fn test_check_availability_rejects_malformed_params() {
    let (app, _store, spot_id, _ids) = app_with_header_banner();

    let (status, _body) = get(
        app.clone(),
        "/api/v1/campaigns/check-availability?ad_spot_id=not-a-number&start_date=2025-06-01&end_date=2025-06-30&priority=1",
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = get(
        app,
        &format!(
            "/api/v1/campaigns/check-availability?ad_spot_id={}&start_date=2025-06-01&end_date=2025-06-30&priority=3",
            spot_id
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_available"], true);
}
