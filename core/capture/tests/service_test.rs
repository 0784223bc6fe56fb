use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};
use snapmark_capture::server::{router, AppState};
use snapmark_capture::store::SNAPSHOTS_KEY;
use snapmark_capture::{
    CapturePipeline, FixedProbe, KeyValueStore, SnapmarkService, SnapshotStore,
    SqliteKeyValueStore, StoreHandle, SubmittedPage,
};
use snapmark_schemas::{Action, MessageRequest, MessageResponse, PageContent, Snapshot, TabInfo};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

const TEXT: &str = "Hooks let function components hold state and side effects. \
    The useEffect hook synchronizes a component with an external system. \
    Custom hooks share stateful logic between components without wrappers.";

fn service(dir: &TempDir) -> SnapmarkService {
    let kv = SqliteKeyValueStore::new(dir.path().join("snapmark.db")).unwrap();
    let store = StoreHandle::spawn(SnapshotStore::new(Arc::new(kv)));
    let pipeline = CapturePipeline::new(Arc::new(FixedProbe(false)), None);
    SnapmarkService::new(Arc::new(pipeline), store)
}

fn capture_request(url: &str) -> MessageRequest {
    MessageRequest {
        tab: Some(TabInfo {
            id: Some(42),
            title: Some("React Hooks Tutorial".to_string()),
            url: Some(url.to_string()),
        }),
        content: Some(PageContent {
            title: "React Hooks Tutorial".to_string(),
            text: TEXT.to_string(),
            url: url.to_string(),
            word_count: None,
        }),
        ..MessageRequest::new(Action::CaptureCurrentTab)
    }
}

async fn send(service: &SnapmarkService, request: MessageRequest) -> MessageResponse {
    let pages = SubmittedPage::from_request(&request);
    service.handle(request, &pages).await
}

fn snapshots(response: &MessageResponse) -> Vec<Snapshot> {
    serde_json::from_value(response.data.clone().unwrap()).unwrap()
}

#[tokio::test]
async fn test_capture_then_duplicate_is_suppressed() {
    let dir = TempDir::new().unwrap();
    let service = service(&dir);

    let first = send(&service, capture_request("https://react.dev/learn")).await;
    assert!(first.success, "{:?}", first.error);
    let first: Snapshot = serde_json::from_value(first.data.unwrap()).unwrap();
    assert_eq!(first.title, "React Hooks Tutorial");
    assert!(first.tags.contains(&"tutorial".to_string()));
    assert_eq!(first.summary.len(), 3);

    let second = send(&service, capture_request("https://react.dev/learn")).await;
    let second: Snapshot = serde_json::from_value(second.data.unwrap()).unwrap();
    assert_eq!(second.id, first.id);

    let list = send(&service, MessageRequest::new(Action::GetSnapshots)).await;
    assert_eq!(snapshots(&list).len(), 1);
}

#[tokio::test]
async fn test_edit_search_delete_export() {
    let dir = TempDir::new().unwrap();
    let service = service(&dir);

    let captured = send(&service, capture_request("https://react.dev/learn")).await;
    let snapshot: Snapshot = serde_json::from_value(captured.data.unwrap()).unwrap();
    send(&service, capture_request("https://react.dev/reference")).await;

    let updated = send(
        &service,
        MessageRequest {
            id: Some(snapshot.id.0.clone()),
            new_intent: Some("  Build a custom hook ".to_string()),
            ..MessageRequest::new(Action::UpdateSnapshotIntent)
        },
    )
    .await;
    let updated = snapshots(&updated);
    let edited = updated.iter().find(|s| s.id == snapshot.id).unwrap();
    assert_eq!(edited.intent, "Build a custom hook");
    assert_eq!(edited.summary, snapshot.summary);

    let found = send(
        &service,
        MessageRequest {
            query: Some("custom HOOK".to_string()),
            ..MessageRequest::new(Action::SearchSnapshots)
        },
    )
    .await;
    assert_eq!(snapshots(&found).len(), 2);

    let exported = send(&service, MessageRequest::new(Action::ExportMarkdown)).await;
    let markdown = exported.data.unwrap();
    let markdown = markdown.as_str().unwrap();
    assert!(markdown.starts_with("# Snapmark Export (2 snapshots)"));
    assert!(markdown.contains("**Intent:** Build a custom hook"));

    let deleted = send(
        &service,
        MessageRequest {
            id: Some(snapshot.id.0.clone()),
            ..MessageRequest::new(Action::DeleteSnapshot)
        },
    )
    .await;
    assert_eq!(snapshots(&deleted).len(), 1);
}

#[tokio::test]
async fn test_invalid_requests() {
    let dir = TempDir::new().unwrap();
    let service = service(&dir);

    let cases = [
        (MessageRequest::default(), "No action specified"),
        (
            MessageRequest {
                action: Some("launch_rocket".to_string()),
                ..Default::default()
            },
            "Unknown action: launch_rocket",
        ),
        (MessageRequest::new(Action::DeleteSnapshot), "Missing snapshot ID"),
        (
            MessageRequest {
                id: Some("snap_1".to_string()),
                ..MessageRequest::new(Action::UpdateSnapshotIntent)
            },
            "Missing ID or intent",
        ),
        (MessageRequest::new(Action::CaptureCurrentTab), "No active tab found"),
    ];

    for (request, error) in cases {
        let response = send(&service, request).await;
        assert!(!response.success);
        assert_eq!(response.error.as_deref(), Some(error));
        assert!(response.data.is_none());
    }

    let list = send(&service, MessageRequest::new(Action::GetSnapshots)).await;
    assert!(snapshots(&list).is_empty());
}

#[tokio::test]
async fn test_snapshots_persist_across_restart() {
    let dir = TempDir::new().unwrap();
    {
        let service = service(&dir);
        send(&service, capture_request("https://react.dev/learn")).await;
    }

    let reopened = service(&dir);
    let list = send(&reopened, MessageRequest::new(Action::GetSnapshots)).await;
    assert_eq!(snapshots(&list)[0].url, "https://react.dev/learn");
}

#[tokio::test]
async fn test_http_message_endpoint() {
    let dir = TempDir::new().unwrap();
    let app = router(AppState {
        service: service(&dir),
    });

    let health = app
        .clone()
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(health.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(
            Request::post("/message")
                .header("content-type", "application/json")
                .body(Body::from(json!({"action": "teleport"}).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value =
        serde_json::from_slice(&to_bytes(response.into_body(), usize::MAX).await.unwrap()).unwrap();
    assert_eq!(body, json!({"success": false, "error": "Unknown action: teleport"}));

    let capture = serde_json::to_string(&capture_request("https://react.dev/learn")).unwrap();
    let response = app
        .clone()
        .oneshot(
            Request::post("/message")
                .header("content-type", "application/json")
                .body(Body::from(capture))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let listed = app
        .oneshot(Request::get("/snapshots").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let body: Value =
        serde_json::from_slice(&to_bytes(listed.into_body(), usize::MAX).await.unwrap()).unwrap();
    assert_eq!(body.as_array().unwrap().len(), 1);
}

async fn post_message(app: axum::Router, body: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(
            Request::post("/message")
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn test_http_malformed_bodies_get_envelope() {
    let dir = TempDir::new().unwrap();
    let app = router(AppState {
        service: service(&dir),
    });

    for body in [r#"{"action": 5}"#, "not json", ""] {
        let (status, envelope) = post_message(app.clone(), body).await;
        assert_eq!(status, StatusCode::OK, "body {:?}", body);
        assert_eq!(envelope["success"], json!(false));
        assert!(envelope["error"].as_str().is_some_and(|e| !e.is_empty()));
        assert!(envelope.get("data").is_none());
    }
}

#[tokio::test]
async fn test_unreadable_store_fails_requests_and_keeps_data() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("snapmark.db");
    let corrupt = json!([{"title": "record without id", "url": "https://old"}]);
    SqliteKeyValueStore::new(&path)
        .unwrap()
        .set(SNAPSHOTS_KEY, corrupt.clone())
        .await
        .unwrap();

    let service = service(&dir);
    let list = send(&service, MessageRequest::new(Action::GetSnapshots)).await;
    assert!(!list.success);
    assert!(list.error.is_some());

    let capture = send(&service, capture_request("https://react.dev/learn")).await;
    assert!(!capture.success);

    let kv = SqliteKeyValueStore::new(&path).unwrap();
    assert_eq!(kv.get(SNAPSHOTS_KEY).await.unwrap(), Some(corrupt));
}
