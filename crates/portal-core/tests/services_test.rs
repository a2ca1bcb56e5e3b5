mod common;

use axum::extract::{Path, Query};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::IntoResponse;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use common::{client_with_notices, empty_session, serve, user_json};
use portal_core::api::Notice;
use portal_core::services::Services;
use portal_core::services::posts::{PostQuery, PostSort, SortOrder};
use portal_core::store::NotificationStore;
use serde_json::{Value, json};
use std::collections::HashMap;

const TOKEN: &str = "issued-token";

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == format!("Bearer {TOKEN}"))
}

async fn login(Json(body): Json<Value>) -> impl IntoResponse {
    if body["password"] == "hunter2" {
        (
            StatusCode::OK,
            Json(json!({"access_token": TOKEN, "token_type": "bearer"})),
        )
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({"detail": "Incorrect username or password"})),
        )
    }
}

async fn me(headers: HeaderMap) -> impl IntoResponse {
    if authorized(&headers) {
        (StatusCode::OK, Json(user_json("ren")))
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({"detail": "Could not validate credentials"})),
        )
    }
}

fn post_item(id: i64) -> Value {
    json!({
        "id": id,
        "title": format!("Post {id}"),
        "slug": format!("post-{id}"),
        "status": "published",
        "created_at": "2024-04-01T00:00:00",
        "user": {"id": 11, "username": "ren", "nickname": null, "avatar": null}
    })
}

fn app() -> Router {
    Router::new()
        .route("/api/v1/auth/login/json", post(login))
        .route(
            "/api/v1/auth/logout",
            post(|| async { Json(json!({"message": "Logged out"})) }),
        )
        .route("/api/v1/users/me", get(me))
        .route(
            "/api/v1/posts",
            get(|Query(q): Query<HashMap<String, String>>| async move {
                let expected = [("q", "rust"), ("sort_by", "view_count"), ("sort_order", "desc")];
                if expected
                    .iter()
                    .any(|(k, v)| q.get(*k).map(String::as_str) != Some(*v))
                {
                    return (
                        StatusCode::UNPROCESSABLE_ENTITY,
                        Json(json!({"detail": [{"msg": "unexpected filters"}]})),
                    );
                }
                (
                    StatusCode::OK,
                    Json(json!({
                        "items": [post_item(1), post_item(2)],
                        "total": 3,
                        "page": 1,
                        "size": 2,
                        "pages": 2
                    })),
                )
            }),
        )
        .route(
            "/api/v1/notifications/unread-count",
            get(|| async { Json(json!({"count": 6})) }),
        )
        .route(
            "/api/v1/messages/unread-count",
            get(|| async { Json(json!({"count": 2})) }),
        )
        .route(
            "/api/v1/uploads/image/{year}/{month}/{file}",
            delete(|Path((year, month, file)): Path<(String, String, String)>| async move {
                Json(json!({"message": format!("deleted {year}/{month}/{file}")}))
            }),
        )
}

#[tokio::test]
async fn login_establishes_the_session() {
    let addr = serve(app()).await;
    let session = empty_session();
    let (client, notices) = client_with_notices(&addr, session.clone());
    let services = Services::new(&client);

    let user = services.auth.login("ren", "hunter2").await.unwrap();
    assert_eq!(user.username, "ren");

    let state = session.snapshot();
    assert!(state.is_authenticated);
    assert_eq!(state.token.as_deref(), Some(TOKEN));
    assert_eq!(state.user.unwrap().email, "ren@example.com");
    assert!(services.auth.check_auth().await);

    services.auth.logout().await;
    assert!(!session.is_authenticated());
    assert!(session.token().is_none());
    assert!(notices.taken().is_empty());
}

#[tokio::test]
async fn wrong_password_leaves_the_session_empty() {
    let addr = serve(app()).await;
    let session = empty_session();
    let (client, notices) = client_with_notices(&addr, session.clone());
    let services = Services::new(&client);

    let err = services.auth.login("ren", "guess").await.unwrap_err();
    assert_eq!(err.status(), Some(401));
    assert!(!session.is_authenticated());
    assert_eq!(
        notices.taken(),
        vec![Notice::RequestFailed("Incorrect username or password".into())]
    );
}

#[tokio::test]
async fn stale_persisted_token_fails_the_startup_check() {
    let addr = serve(app()).await;
    let session = empty_session();
    session.set_token(Some("expired".into()));
    let (client, notices) = client_with_notices(&addr, session.clone());
    let services = Services::new(&client);

    assert!(!services.auth.check_auth().await);
    assert!(session.token().is_none());
    assert!(!session.is_loading());
    assert_eq!(notices.taken(), vec![Notice::SessionExpired]);
}

#[tokio::test]
async fn post_listing_sends_filters_as_query() {
    let addr = serve(app()).await;
    let (client, notices) = client_with_notices(&addr, empty_session());
    let services = Services::new(&client);

    let page = services
        .posts
        .list(&PostQuery {
            q: Some("rust".into()),
            sort_by: Some(PostSort::ViewCount),
            sort_order: Some(SortOrder::Desc),
            ..PostQuery::default()
        })
        .await
        .unwrap();
    assert_eq!(page.items.len(), 2);
    assert!(page.has_next());
    assert_eq!(page.items[1].slug, "post-2");
    assert!(notices.taken().is_empty());
}

#[tokio::test]
async fn counters_sync_into_the_store() {
    let addr = serve(app()).await;
    let (client, _) = client_with_notices(&addr, empty_session());
    let services = Services::new(&client);
    let store = NotificationStore::new();

    services.notifications.sync_counters(&store).await.unwrap();
    let counters = store.snapshot();
    assert_eq!(counters.unread_notifications, 6);
    assert_eq!(counters.unread_messages, 2);
}

#[tokio::test]
async fn image_deletion_targets_the_stored_path() {
    let addr = serve(app()).await;
    let (client, notices) = client_with_notices(&addr, empty_session());
    let services = Services::new(&client);

    services
        .uploads
        .delete_image(&format!("http://{addr}/uploads/images/2024/06/cat.png"))
        .await
        .unwrap();

    let err = services
        .uploads
        .delete_image("https://cdn.example.com/cat.png")
        .await
        .unwrap_err();
    assert!(err.to_string().contains("Invalid image URL"));
    assert!(notices.taken().is_empty());
}
