#![cfg(feature = "web")]

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use review_sheet::app::{AppState, SESSION_COOKIE, router};
use review_sheet::config::AppConfig;
use review_sheet::{Reviewer, SessionMode};
use std::sync::Arc;
use tower::ServiceExt;

const BOUNDARY: &str = "review-sheet-test-boundary";

fn app(mode: SessionMode) -> Router {
    let config = AppConfig {
        mode,
        ..AppConfig::default()
    };
    app_with_state(config).1
}

fn app_with_state(config: AppConfig) -> (Arc<AppState>, Router) {
    let state = Arc::new(AppState::new(config, Reviewer::default()));
    (state.clone(), router(state))
}

fn transactions_csv(n: usize) -> String {
    let mut csv = String::from("id,payee,amount\n");
    for i in 0..n {
        csv.push_str(&format!("{},payee {},{}.5\n", i, i, i));
    }
    csv
}

fn upload_request(cookie: Option<&str>, file_name: &str, contents: &str) -> Request<Body> {
    let body = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{f}\"\r\n\
         Content-Type: application/octet-stream\r\n\r\n{c}\r\n--{b}--\r\n",
        b = BOUNDARY,
        f = file_name,
        c = contents
    );
    let mut builder = Request::post("/api/upload").header(
        header::CONTENT_TYPE,
        format!("multipart/form-data; boundary={}", BOUNDARY),
    );
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body)).unwrap()
}

fn action_request(cookie: &str, action: serde_json::Value) -> Request<Body> {
    Request::post("/api/action")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::COOKIE, cookie)
        .body(Body::from(action.to_string()))
        .unwrap()
}

fn session_cookie(response: &axum::response::Response) -> String {
    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .expect("session cookie")
        .to_str()
        .unwrap();
    let pair = set_cookie.split(';').next().unwrap().to_string();
    assert!(pair.starts_with(SESSION_COOKIE));
    pair
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn upload_select_mark_and_export() {
    let app = app(SessionMode::Finalize);

    let response = app
        .clone()
        .oneshot(upload_request(None, "transactions.csv", &transactions_csv(12)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let cookie = session_cookie(&response);
    let view = json_body(response).await;
    assert_eq!(view["state"], "loaded");
    assert_eq!(view["grid"]["columns"][0], "select");
    assert_eq!(view["grid"]["total_rows"], 12);

    for row in [0, 5] {
        let response = app
            .clone()
            .oneshot(action_request(
                &cookie,
                serde_json::json!({ "action": "select", "row": row, "value": true }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app
        .clone()
        .oneshot(action_request(&cookie, serde_json::json!({ "action": "mark_final" })))
        .await
        .unwrap();
    let body = json_body(response).await;
    assert_eq!(body["outcome"], "applied");
    assert_eq!(body["session"]["grid"]["rows"][5]["values"][4], true);

    let response = app
        .clone()
        .oneshot(
            Request::get("/api/export/final?format=csv")
                .header(header::COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "text/csv");
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(
        String::from_utf8(bytes.to_vec()).unwrap(),
        "id,payee,amount\n0,payee 0,0.5\n5,payee 5,5.5\n"
    );
}

#[tokio::test]
async fn remove_without_selection_reports_notice() {
    let app = app(SessionMode::Finalize);
    let response = app
        .clone()
        .oneshot(upload_request(None, "t.csv", &transactions_csv(3)))
        .await
        .unwrap();
    let cookie = session_cookie(&response);

    let response = app
        .clone()
        .oneshot(action_request(
            &cookie,
            serde_json::json!({ "action": "remove_selected" }),
        ))
        .await
        .unwrap();
    let body = json_body(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["outcome"]["notice"], "nothing_selected");
    assert_eq!(body["session"]["grid"]["total_rows"], 3);
}

#[tokio::test]
async fn rejected_upload_keeps_session() {
    let app = app(SessionMode::Finalize);
    let response = app
        .clone()
        .oneshot(upload_request(None, "t.csv", &transactions_csv(3)))
        .await
        .unwrap();
    let cookie = session_cookie(&response);

    let response = app
        .clone()
        .oneshot(upload_request(Some(&cookie), "t.pdf", "whatever"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["message"], "Unsupported file extension: pdf");

    let response = app
        .clone()
        .oneshot(
            Request::get("/api/session")
                .header(header::COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let view = json_body(response).await;
    assert_eq!(view["grid"]["total_rows"], 3);
}

#[tokio::test]
async fn reconcile_pages_and_exports_fraud() {
    let app = app(SessionMode::Reconcile);
    let response = app
        .clone()
        .oneshot(upload_request(None, "t.csv", &transactions_csv(25)))
        .await
        .unwrap();
    let cookie = session_cookie(&response);
    let view = json_body(response).await;
    assert_eq!(view["page"]["page_count"], 3);
    assert_eq!(view["grid"]["rows"].as_array().unwrap().len(), 10);

    let mut last = serde_json::Value::Null;
    for _ in 0..3 {
        let response = app
            .clone()
            .oneshot(action_request(&cookie, serde_json::json!({ "action": "next_page" })))
            .await
            .unwrap();
        last = json_body(response).await;
    }
    assert_eq!(last["outcome"], "unchanged");
    assert_eq!(last["session"]["page"]["page_number"], 2);
    assert_eq!(last["session"]["grid"]["rows"][0]["index"], 20);

    let response = app
        .clone()
        .oneshot(
            Request::get("/api/export/fraud?format=csv")
                .header(header::COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    for action in [
        serde_json::json!({ "action": "run_engine" }),
        serde_json::json!({ "action": "select_result", "row": 3, "value": true }),
        serde_json::json!({ "action": "mark_fraud" }),
    ] {
        let response = app.clone().oneshot(action_request(&cookie, action)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app
        .clone()
        .oneshot(
            Request::get("/api/export/fraud?format=xlsx")
                .header(header::COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"fraudulent_transactions.xlsx\""
    );
}

#[tokio::test]
async fn export_with_nothing_flagged_is_a_notice() {
    let app = app(SessionMode::Finalize);
    let response = app
        .clone()
        .oneshot(upload_request(None, "t.csv", &transactions_csv(2)))
        .await
        .unwrap();
    let cookie = session_cookie(&response);

    let response = app
        .clone()
        .oneshot(
            Request::get("/api/export/final")
                .header(header::COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "notice");
}

#[tokio::test]
async fn actions_without_a_session_store_nothing() {
    let (state, app) = app_with_state(AppConfig::default());

    for _ in 0..5 {
        let response = app
            .clone()
            .oneshot(
                Request::post("/api/action")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"action":"remove_selected"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["status"], "error");
        assert_eq!(body["session"]["state"], "empty");
    }
    assert_eq!(state.session_count(), 0);

    let response = app
        .clone()
        .oneshot(upload_request(None, "t.pdf", "whatever"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(state.session_count(), 0);

    let response = app
        .clone()
        .oneshot(upload_request(None, "t.csv", &transactions_csv(2)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(state.session_count(), 1);
}

#[tokio::test]
async fn session_store_is_capped() {
    let (state, app) = app_with_state(AppConfig {
        max_sessions: 2,
        ..AppConfig::default()
    });

    let mut cookies = Vec::new();
    for _ in 0..3 {
        let response = app
            .clone()
            .oneshot(upload_request(None, "t.csv", &transactions_csv(2)))
            .await
            .unwrap();
        cookies.push(session_cookie(&response));
    }
    assert_eq!(state.session_count(), 2);

    let response = app
        .clone()
        .oneshot(
            Request::get("/api/session")
                .header(header::COOKIE, &cookies[0])
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(json_body(response).await["state"], "empty");

    let response = app
        .clone()
        .oneshot(
            Request::get("/api/session")
                .header(header::COOKIE, &cookies[2])
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(json_body(response).await["state"], "loaded");
}

#[tokio::test]
async fn text_edits_keep_their_type() {
    let app = app(SessionMode::Finalize);
    let response = app
        .clone()
        .oneshot(upload_request(None, "t.csv", &transactions_csv(2)))
        .await
        .unwrap();
    let cookie = session_cookie(&response);

    let response = app
        .clone()
        .oneshot(action_request(
            &cookie,
            serde_json::json!({ "action": "edit", "row": 0, "column": "payee", "value": "00123" }),
        ))
        .await
        .unwrap();
    let body = json_body(response).await;
    assert_eq!(body["session"]["grid"]["rows"][0]["values"][2], "00123");
}

#[tokio::test]
async fn append_row_and_export_preview() {
    let app = app(SessionMode::Finalize);
    let response = app
        .clone()
        .oneshot(upload_request(None, "t.csv", &transactions_csv(2)))
        .await
        .unwrap();
    let cookie = session_cookie(&response);
    assert!(json_body(response).await["export_preview"].is_null());

    let response = app
        .clone()
        .oneshot(action_request(&cookie, serde_json::json!({ "action": "append_row" })))
        .await
        .unwrap();
    let body = json_body(response).await;
    assert_eq!(body["outcome"], "applied");
    assert_eq!(body["session"]["grid"]["total_rows"], 3);
    assert_eq!(
        body["session"]["grid"]["rows"][2]["values"],
        serde_json::json!([false, null, null, null, false])
    );

    for action in [
        serde_json::json!({ "action": "select", "row": 1, "value": true }),
        serde_json::json!({ "action": "mark_final" }),
    ] {
        app.clone().oneshot(action_request(&cookie, action)).await.unwrap();
    }

    let response = app
        .clone()
        .oneshot(
            Request::get("/api/session")
                .header(header::COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let view = json_body(response).await;
    let preview = &view["export_preview"];
    assert_eq!(preview["columns"], serde_json::json!(["id", "payee", "amount"]));
    assert_eq!(preview["total_rows"], 1);
    assert_eq!(
        preview["rows"][0]["values"],
        serde_json::json!([1, "payee 1", 1.5])
    );
}

#[tokio::test]
async fn index_page_is_served() {
    let response = app(SessionMode::Finalize)
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let page = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(page.contains(r#"data-action="append_row""#));
    assert!(page.contains("export_preview"));
}
