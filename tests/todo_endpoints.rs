//! Integration tests for the to-do endpoints.

mod common;

use std::time::Duration;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use rstest::rstest;
use serde_json::{Value, json};

use common::{FUTURE, PAST, TestApp, titles, values};

// =============================================================================
// Create
// =============================================================================

#[rstest]
#[tokio::test]
async fn test_create_with_title_only_uses_defaults() {
    let app = TestApp::new();
    let token = app.register("alice").await;

    let todo = app.create_todo(&token, json!({"title": "Buy milk"})).await;

    assert!(todo["id"].is_i64());
    assert_eq!(todo["title"], "Buy milk");
    assert_eq!(todo["description"], "");
    assert_eq!(todo["completed"], false);
    assert_eq!(todo["priority"], 1);
    assert_eq!(todo["due_date"], Value::Null);
    assert_eq!(todo["status"], "pending");
    assert_eq!(todo["created_at"], todo["updated_at"]);
}

#[rstest]
#[tokio::test]
async fn test_create_with_every_field() {
    let app = TestApp::new();
    let token = app.register("alice").await;

    let todo = app
        .create_todo(
            &token,
            json!({
                "title": "Report",
                "description": "Quarterly numbers",
                "completed": false,
                "priority": 3,
                "due_date": PAST
            }),
        )
        .await;

    assert_eq!(todo["description"], "Quarterly numbers");
    assert_eq!(todo["priority"], 3);
    assert_eq!(todo["status"], "overdue");
    assert!(todo["due_date"].as_str().unwrap().starts_with("2000-01-01T00:00:00"));
}

#[rstest]
#[case(json!({}), "title", "This field is required.")]
#[case(json!({"title": ""}), "title", "This field may not be blank.")]
#[case(json!({"title": null}), "title", "This field may not be null.")]
#[case(json!({"title": "x".repeat(101)}), "title", "Ensure this field has no more than 100 characters.")]
#[case(json!({"title": "ok", "priority": 7}), "priority", "\"7\" is not a valid choice.")]
#[tokio::test]
async fn test_create_validation_errors(
    #[case] body: Value,
    #[case] field: &str,
    #[case] message: &str,
) {
    let app = TestApp::new();
    let token = app.register("alice").await;

    let response = app.post("/todos", &token, body).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["code"], "VALIDATION_ERROR");
    assert_eq!(response.body["details"][0]["field"], field);
    assert_eq!(response.body["details"][0]["message"], message);
}

#[rstest]
#[tokio::test]
async fn test_create_with_unparseable_due_date() {
    let app = TestApp::new();
    let token = app.register("alice").await;

    let response = app
        .post("/todos", &token, json!({"title": "ok", "due_date": "next tuesday"}))
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["details"][0]["field"], "due_date");
}

#[rstest]
#[tokio::test]
async fn test_malformed_body_is_invalid_json() {
    let app = TestApp::new();
    let token = app.register("alice").await;

    let request = Request::builder()
        .method(Method::POST)
        .uri("/todos")
        .header(header::AUTHORIZATION, format!("Token {token}"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"title\": "))
        .unwrap();
    let response = app.send_request(request).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["code"], "INVALID_JSON");
}

// =============================================================================
// Ownership
// =============================================================================

#[rstest]
#[tokio::test]
async fn test_other_users_items_are_invisible() {
    let app = TestApp::new();
    let alice = app.register("alice").await;
    let bob = app.register("bob").await;
    let id = app.create_titled(&alice, "Private").await;
    let uri = format!("/todos/{id}");

    let listed = app.get("/todos", &bob).await;
    assert_eq!(listed.status, StatusCode::OK);
    assert_eq!(listed.body, json!([]));

    assert_eq!(app.get(&uri, &bob).await.status, StatusCode::NOT_FOUND);
    assert_eq!(
        app.patch(&uri, &bob, json!({"title": "Mine"})).await.status,
        StatusCode::NOT_FOUND
    );
    assert_eq!(
        app.put(&uri, &bob, json!({"title": "Mine"})).await.status,
        StatusCode::NOT_FOUND
    );
    assert_eq!(app.delete(&uri, &bob).await.status, StatusCode::NOT_FOUND);

    let own = app.get(&uri, &alice).await;
    assert_eq!(own.status, StatusCode::OK);
    assert_eq!(own.body["title"], "Private");
}

#[rstest]
#[case("/todos/abc")]
#[case("/todos/999999")]
#[tokio::test]
async fn test_unknown_item_is_not_found(#[case] uri: &str) {
    let app = TestApp::new();
    let token = app.register("alice").await;

    let response = app.get(uri, &token).await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.body["code"], "NOT_FOUND");
    assert_eq!(response.body["message"], "No Todo matches the given query.");
}

// =============================================================================
// Update, Replace, Delete
// =============================================================================

#[rstest]
#[tokio::test]
async fn test_patch_changes_only_given_fields() {
    let app = TestApp::new();
    let token = app.register("alice").await;
    let created = app
        .create_todo(
            &token,
            json!({"title": "Draft", "description": "notes", "priority": 2, "due_date": FUTURE}),
        )
        .await;
    let uri = format!("/todos/{}", created["id"]);
    tokio::time::sleep(Duration::from_millis(5)).await;

    let response = app.patch(&uri, &token, json!({"title": "Final"})).await;

    assert_eq!(response.status, StatusCode::OK);
    let updated = response.body;
    assert_eq!(updated["title"], "Final");
    assert_eq!(updated["description"], "notes");
    assert_eq!(updated["priority"], 2);
    assert_eq!(updated["due_date"], created["due_date"]);
    assert_eq!(updated["created_at"], created["created_at"]);
    assert_ne!(updated["updated_at"], created["updated_at"]);
}

#[rstest]
#[tokio::test]
async fn test_patch_null_due_date_clears_it() {
    let app = TestApp::new();
    let token = app.register("alice").await;
    let created = app
        .create_todo(&token, json!({"title": "Late", "due_date": PAST}))
        .await;
    assert_eq!(created["status"], "overdue");

    let response = app
        .patch(
            &format!("/todos/{}", created["id"]),
            &token,
            json!({"due_date": null}),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["due_date"], Value::Null);
    assert_eq!(response.body["status"], "pending");
}

#[rstest]
#[tokio::test]
async fn test_patch_completed_marks_status_completed() {
    let app = TestApp::new();
    let token = app.register("alice").await;
    let created = app
        .create_todo(&token, json!({"title": "Late", "due_date": PAST}))
        .await;

    let response = app
        .patch(
            &format!("/todos/{}", created["id"]),
            &token,
            json!({"completed": true}),
        )
        .await;

    assert_eq!(response.body["completed"], true);
    assert_eq!(response.body["status"], "completed");
}

#[rstest]
#[tokio::test]
async fn test_patch_blank_title_is_rejected() {
    let app = TestApp::new();
    let token = app.register("alice").await;
    let id = app.create_titled(&token, "Keep").await;

    let response = app
        .patch(&format!("/todos/{id}"), &token, json!({"title": "  "}))
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    let stored = app.get(&format!("/todos/{id}"), &token).await;
    assert_eq!(stored.body["title"], "Keep");
}

#[rstest]
#[tokio::test]
async fn test_put_resets_omitted_fields() {
    let app = TestApp::new();
    let token = app.register("alice").await;
    let created = app
        .create_todo(
            &token,
            json!({"title": "Full", "description": "text", "priority": 3, "completed": true, "due_date": FUTURE}),
        )
        .await;
    let uri = format!("/todos/{}", created["id"]);

    let response = app.put(&uri, &token, json!({"title": "Bare"})).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["id"], created["id"]);
    assert_eq!(response.body["title"], "Bare");
    assert_eq!(response.body["description"], "");
    assert_eq!(response.body["priority"], 1);
    assert_eq!(response.body["completed"], false);
    assert_eq!(response.body["due_date"], Value::Null);
}

#[rstest]
#[tokio::test]
async fn test_put_requires_title() {
    let app = TestApp::new();
    let token = app.register("alice").await;
    let id = app.create_titled(&token, "Keep").await;

    let response = app
        .put(&format!("/todos/{id}"), &token, json!({"completed": true}))
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["details"][0]["field"], "title");
}

#[rstest]
#[tokio::test]
async fn test_delete_then_get_is_not_found() {
    let app = TestApp::new();
    let token = app.register("alice").await;
    let id = app.create_titled(&token, "Gone").await;
    let uri = format!("/todos/{id}");

    let response = app.delete(&uri, &token).await;
    assert_eq!(response.status, StatusCode::NO_CONTENT);
    assert_eq!(response.body, Value::Null);

    assert_eq!(app.get(&uri, &token).await.status, StatusCode::NOT_FOUND);
    assert_eq!(app.delete(&uri, &token).await.status, StatusCode::NOT_FOUND);
}

// =============================================================================
// Statistics and Bulk Delete
// =============================================================================

async fn seed_three_states(app: &TestApp, token: &str) {
    app.create_todo(token, json!({"title": "Done", "completed": true}))
        .await;
    app.create_todo(token, json!({"title": "Open", "due_date": FUTURE}))
        .await;
    app.create_todo(token, json!({"title": "Late", "due_date": PAST}))
        .await;
}

#[rstest]
#[tokio::test]
async fn test_statistics_counts_each_state() {
    let app = TestApp::new();
    let token = app.register("alice").await;
    seed_three_states(&app, &token).await;

    let response = app.get("/todos/statistics", &token).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        response.body,
        json!({"total": 3, "completed": 1, "pending": 1, "overdue": 1})
    );
}

#[rstest]
#[tokio::test]
async fn test_statistics_for_empty_user() {
    let app = TestApp::new();
    let alice = app.register("alice").await;
    seed_three_states(&app, &alice).await;
    let bob = app.register("bob").await;

    let response = app.get("/todos/statistics", &bob).await;

    assert_eq!(
        response.body,
        json!({"total": 0, "completed": 0, "pending": 0, "overdue": 0})
    );
}

#[rstest]
#[tokio::test]
async fn test_clear_completed_deletes_only_own_completed_items() {
    let app = TestApp::new();
    let alice = app.register("alice").await;
    let bob = app.register("bob").await;
    seed_three_states(&app, &alice).await;
    app.create_todo(&bob, json!({"title": "Bob done", "completed": true}))
        .await;

    let response = app.delete("/todos/clear_completed", &alice).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        response.body,
        json!({"message": "Deleted 1 completed todos", "count": 1})
    );

    let again = app.delete("/todos/clear_completed", &alice).await;
    assert_eq!(again.body["count"], 0);

    let mut remaining = titles(&app.get("/todos", &alice).await.body)
        .into_iter()
        .map(str::to_string)
        .collect::<Vec<_>>();
    remaining.sort();
    assert_eq!(remaining, vec!["Late", "Open"]);

    let bob_items = app.get("/todos", &bob).await;
    assert_eq!(titles(&bob_items.body), vec!["Bob done"]);
}

// =============================================================================
// Listing
// =============================================================================

#[rstest]
#[case("", vec!["Late", "Open", "Done"])]
#[case("?status=completed", vec!["Done"])]
#[case("?status=pending", vec!["Late", "Open"])]
#[case("?status=overdue", vec!["Late"])]
#[case("?status=bogus", vec!["Late", "Open", "Done"])]
#[case("?status=completed&status=pending", vec!["Late", "Open"])]
#[case("?status=pending&search=zzz&status=completed&search=", vec!["Done"])]
#[tokio::test]
async fn test_list_status_filter(#[case] query: &str, #[case] expected: Vec<&str>) {
    let app = TestApp::new();
    let token = app.register("alice").await;
    seed_three_states(&app, &token).await;

    let response = app.get(&format!("/todos{query}"), &token).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(titles(&response.body), expected);
}

#[rstest]
#[tokio::test]
async fn test_list_search_matches_title_or_description() {
    let app = TestApp::new();
    let token = app.register("alice").await;
    app.create_todo(&token, json!({"title": "Buy milk"})).await;
    app.create_todo(&token, json!({"title": "Call mom", "description": "About MILK delivery"}))
        .await;
    app.create_todo(&token, json!({"title": "Walk dog"})).await;

    let response = app.get("/todos?search=milk", &token).await;
    assert_eq!(titles(&response.body), vec!["Call mom", "Buy milk"]);

    let response = app.get("/todos?search=milk%20delivery", &token).await;
    assert_eq!(titles(&response.body), vec!["Call mom"]);
}

#[rstest]
#[tokio::test]
async fn test_list_ordering() {
    let app = TestApp::new();
    let token = app.register("alice").await;
    app.create_todo(&token, json!({"title": "Low", "priority": 1, "due_date": FUTURE}))
        .await;
    app.create_todo(&token, json!({"title": "High", "priority": 3}))
        .await;
    app.create_todo(&token, json!({"title": "Medium", "priority": 2, "due_date": PAST}))
        .await;

    let response = app.get("/todos?ordering=-priority", &token).await;
    assert_eq!(titles(&response.body), vec!["High", "Medium", "Low"]);

    let response = app.get("/todos?ordering=priority", &token).await;
    assert_eq!(
        values(&response.body, "priority"),
        vec![&json!(1), &json!(2), &json!(3)]
    );

    let response = app.get("/todos?ordering=due_date", &token).await;
    assert_eq!(titles(&response.body), vec!["Medium", "Low", "High"]);

    let response = app.get("/todos?ordering=created_at", &token).await;
    assert_eq!(titles(&response.body), vec!["Low", "High", "Medium"]);

    let response = app.get("/todos?ordering=unknown", &token).await;
    assert_eq!(titles(&response.body), vec!["Medium", "High", "Low"]);
}

// =============================================================================
// Service Surface
// =============================================================================

#[rstest]
#[tokio::test]
async fn test_health_check() {
    let app = TestApp::new();

    let response = app.send(Method::GET, "/health", None, None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "healthy");
}

#[rstest]
#[tokio::test]
async fn test_unknown_route_is_json_not_found() {
    let app = TestApp::new();

    let response = app.send(Method::GET, "/nowhere", None, None).await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.body["code"], "NOT_FOUND");
}

#[rstest]
#[tokio::test]
async fn test_wrong_method_is_method_not_allowed() {
    let app = TestApp::new();
    let token = app.register("alice").await;

    let response = app
        .patch("/todos/statistics", &token, json!({"title": "x"}))
        .await;

    assert_eq!(response.status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(response.body["code"], "METHOD_NOT_ALLOWED");
}

#[rstest]
#[tokio::test]
async fn test_responses_carry_request_id() {
    let app = TestApp::new();

    let response = app.send(Method::GET, "/health", None, None).await;

    assert!(response.headers.contains_key("x-request-id"));
}
