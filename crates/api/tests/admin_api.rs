//! Integration tests for the gated admin endpoints.

mod common;

use axum::http::StatusCode;
use common::{body_json, get, post_empty, post_json};
use serde_json::json;

#[tokio::test]
async fn truncate_is_forbidden_by_default() {
    let (app, _store) = common::build_test_app(common::test_config());

    let response = post_empty(app, "/admin/truncate").await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let json = body_json(response).await;
    assert_eq!(json["code"], "FORBIDDEN");
}

#[tokio::test]
async fn truncate_refuses_even_an_empty_table_when_disabled() {
    let (app, _store) = common::build_test_app(common::test_config());

    // Nothing was ever inserted; the gate still applies.
    let response = post_empty(app, "/admin/truncate").await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn truncate_empties_the_table_when_enabled() {
    let mut config = common::test_config();
    config.enable_db_admin = true;
    let (app, _store) = common::build_test_app(config);

    post_json(
        app.clone(),
        "/tasks/",
        json!({ "task_type": "CPU_INTENSIVE", "complexity": 1 }),
    )
    .await;

    let response = post_empty(app.clone(), "/admin/truncate").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["ok"], true);

    let tasks = body_json(get(app, "/tasks/").await).await;
    assert_eq!(tasks.as_array().unwrap().len(), 0);
}
