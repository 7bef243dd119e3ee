//! Endpoint fallback and content guards against real local listeners.

use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;

use leadsync_cli::{ClientError, EndpointResolver, SourceAdapter, StatusSource};
use leadsync_core::SourceLead;

async fn serve(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

/// An address nothing listens on.
async fn dead_address() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

fn discovery_app() -> Router {
    Router::new().route(
        "/api/source/leads",
        get(|| async {
            Json(json!({
                "saleLeads": [{ "id": "132511", "name": "ACME", "listId": "998" }],
                "allListsSummary": [{ "listId": "998", "listName": "Hunter", "leadCount": 1, "active": true }],
                "totalLeads": 1,
                "success": true,
                "message": "Fetched 1 leads for selection"
            }))
        }),
    )
}

#[tokio::test]
async fn falls_back_to_second_candidate() {
    let dead = dead_address().await;
    let live = serve(discovery_app()).await;
    let adapter = SourceAdapter::new(EndpointResolver::new(vec![dead, live]));

    let resp = adapter.discover().await.unwrap();
    assert_eq!(resp.total_leads, 1);
    assert_eq!(resp.sale_leads[0].id, "132511");
}

#[tokio::test]
async fn non_success_status_moves_to_next_candidate() {
    let broken = serve(Router::new().route(
        "/api/source/leads",
        get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "maintenance") }),
    ))
    .await;
    let live = serve(discovery_app()).await;
    let adapter = SourceAdapter::new(EndpointResolver::new(vec![broken, live]));
    assert!(adapter.discover().await.is_ok());
}

#[tokio::test]
async fn exhaustion_reports_last_cause() {
    let first = dead_address().await;
    let second = serve(Router::new().route(
        "/api/source/leads",
        get(|| async { (StatusCode::BAD_GATEWAY, "upstream timeout") }),
    ))
    .await;
    let adapter = SourceAdapter::new(EndpointResolver::new(vec![first, second]));

    match adapter.discover().await.unwrap_err() {
        ClientError::Connectivity { attempts, last } => {
            assert_eq!(attempts, 2);
            assert!(last.contains("502"), "{}", last);
            assert!(last.contains("upstream timeout"), "{}", last);
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[tokio::test]
async fn markup_body_is_unexpected_content_type() {
    let html = serve(Router::new().route(
        "/api/source/leads",
        get(|| async { "<!DOCTYPE html><html><head><title>CRM</title></head></html>" }),
    ))
    .await;
    let adapter = SourceAdapter::new(EndpointResolver::new(vec![html]));
    assert!(matches!(
        adapter.discover().await,
        Err(ClientError::UnexpectedContentType { .. })
    ));
}

#[tokio::test]
async fn server_error_message_becomes_application_error() {
    let busy = serve(Router::new().route(
        "/api/source/sync",
        post(|| async {
            (
                StatusCode::CONFLICT,
                Json(json!({ "success": false, "error": "A sync job is already running" })),
            )
        }),
    ))
    .await;
    let adapter = SourceAdapter::new(EndpointResolver::new(vec![busy]));
    let err = adapter
        .start_full_import(&[SourceLead::new("1")])
        .await
        .unwrap_err();
    match err {
        ClientError::ApplicationError { message } => {
            assert_eq!(message, "A sync job is already running")
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[tokio::test]
async fn quick_import_failure_flag_is_application_error() {
    let app = Router::new().route(
        "/api/source/quick-import",
        post(|Json(body): Json<Value>| async move {
            assert_eq!(body["selective"], true);
            assert_eq!(body["selectedLeads"][0]["id"], "9");
            Json(json!({ "success": false, "imported": 0, "message": "store offline" }))
        }),
    );
    let adapter = SourceAdapter::new(EndpointResolver::new(vec![serve(app).await]));
    match adapter.quick_import(&[SourceLead::new("9")]).await.unwrap_err() {
        ClientError::ApplicationError { message } => assert_eq!(message, "store offline"),
        other => panic!("unexpected {:?}", other),
    }
}

#[tokio::test]
async fn status_is_read_through_resolver() {
    let app = Router::new().route(
        "/api/source/sync-status",
        get(|| async {
            Json(json!({
                "status": "running",
                "percentage": 40,
                "message": "Processed 2 of 5 leads",
                "totalLeads": 5,
                "processedLeads": 2
            }))
        }),
    );
    let adapter = SourceAdapter::new(EndpointResolver::new(vec![dead_address().await, serve(app).await]));
    let snap = adapter.sync_status().await.unwrap();
    assert_eq!(snap.percentage, 40);
    assert_eq!(snap.processed_leads, 2);
}
