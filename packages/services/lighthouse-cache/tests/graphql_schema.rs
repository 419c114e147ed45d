mod common;

use common::{tenant, Harness};
use lighthouse_cache_service::schema::{build_schema, RequestTenant};
use lighthouse_cache_service::{SessionLookup, StaticSession};
use serde_json::json;

#[tokio::test]
async fn initialize_then_read_summary_for_request_tenant() {
    let h = Harness::new();
    h.inventory.set_scans(&["s1", "s2"]);
    let schema = build_schema(h.cache.clone());

    let session = StaticSession(Some(tenant("acme")));
    let req = async_graphql::Request::new("mutation { initializeTenantCache { success data scanSummary } }")
        .data(RequestTenant(session.current_tenant().await));
    let resp = schema.execute(req).await;
    assert!(resp.errors.is_empty(), "errors: {:?}", resp.errors);
    let data = resp.data.into_json().unwrap();
    assert_eq!(
        data,
        json!({"initializeTenantCache": {
            "success": true,
            "data": "3 critical findings across 2 scans",
            "scanSummary": "3 critical findings across 2 scans"
        }})
    );

    h.cache.wait_for_background().await;

    let req = async_graphql::Request::new(
        "{ scanSummary processedScanIds recommendations { success data } recommendationProcessing bannerState(configured: true) { kind message } }",
    )
    .data(RequestTenant(Some(tenant("acme"))));
    let resp = schema.execute(req).await;
    assert!(resp.errors.is_empty(), "errors: {:?}", resp.errors);
    let data = resp.data.into_json().unwrap();
    assert_eq!(data["scanSummary"], json!("3 critical findings across 2 scans"));
    assert_eq!(data["processedScanIds"], json!(["s1", "s2"]));
    assert_eq!(data["recommendations"], json!({"success": true, "data": "Rotate the exposed access keys"}));
    assert_eq!(data["recommendationProcessing"], json!(false));
    assert_eq!(data["bannerState"], json!({"kind": "RECOMMENDATION", "message": "Rotate the exposed access keys"}));
}

#[tokio::test]
async fn anonymous_request_gets_neutral_values() {
    let h = Harness::new();
    let schema = build_schema(h.cache.clone());

    let req = async_graphql::Request::new(
        "mutation { initializeTenantCache { success data } generateRecommendations(summary: \"x\") { success data } }",
    )
    .data(RequestTenant(StaticSession::default().current_tenant().await));
    let resp = schema.execute(req).await;
    assert!(resp.errors.is_empty(), "errors: {:?}", resp.errors);
    let data = resp.data.into_json().unwrap();
    assert_eq!(data["initializeTenantCache"], json!({"success": false, "data": null}));
    assert_eq!(data["generateRecommendations"], json!({"success": false, "data": null}));
    assert_eq!(h.backend.operation_count(), 0);
}
