//! End-to-end page flow tests.
//!
//! Drives the real router over an in-memory database and an in-memory
//! session store, following redirects by hand with the session cookie.

use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response, StatusCode, header};
use http_body_util::BodyExt;
use secrecy::SecretString;
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;
use tower::ServiceExt;
use tower_sessions::{MemoryStore, SessionManagerLayer};

use storeroom_admin::config::AdminConfig;
use storeroom_admin::db::MIGRATOR;
use storeroom_admin::routes;
use storeroom_admin::services::hash_password;
use storeroom_admin::state::AppState;

async fn test_app() -> (Router, SqlitePool) {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("connect in-memory sqlite");
    MIGRATOR.run(&pool).await.expect("run migrations");

    let config = AdminConfig {
        database_url: SecretString::from("sqlite::memory:"),
        host: "127.0.0.1".parse().expect("ip"),
        port: 0,
        base_url: "http://localhost".to_owned(),
        upload_dir: std::env::temp_dir().join("storeroom-test-uploads"),
    };
    let state = AppState::new(config, pool.clone());

    let session_layer = SessionManagerLayer::new(MemoryStore::default());
    let app = Router::new()
        .merge(routes::routes())
        .layer(session_layer)
        .with_state(state);

    (app, pool)
}

async fn seed_admin(pool: &SqlitePool) {
    sqlx::query(
        "INSERT INTO user_groups (group_name, group_level, group_status) VALUES ('admin', 1, 1)",
    )
    .execute(pool)
    .await
    .expect("insert group");

    let hash = hash_password("secret-pw").expect("hash");
    sqlx::query(
        "INSERT INTO users (name, username, password_hash, user_level) VALUES ('Alex', 'alex', ?, 1)",
    )
    .bind(hash)
    .execute(pool)
    .await
    .expect("insert user");
}

fn session_cookie(response: &Response<Body>) -> String {
    response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .expect("session cookie present")
        .to_owned()
}

fn location(response: &Response<Body>) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .expect("location header present")
}

async fn body_text(response: Response<Body>) -> String {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("read body")
        .to_bytes();
    String::from_utf8(bytes.to_vec()).expect("utf-8 body")
}

fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).expect("build request")
}

fn post_form(uri: &str, body: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_owned())).expect("build request")
}

/// Sign in as the seeded admin and return the session cookie.
async fn sign_in(app: &Router) -> String {
    let response = app
        .clone()
        .oneshot(post_form("/login", "username=alex&password=secret-pw", None))
        .await
        .expect("response");
    assert!(response.status().is_redirection());
    assert_eq!(location(&response), "/admin");
    session_cookie(&response)
}

async fn count(pool: &SqlitePool, table: &str) -> i64 {
    sqlx::query_scalar(&format!("SELECT COUNT(id) FROM {table}"))
        .fetch_one(pool)
        .await
        .expect("count")
}

#[tokio::test]
async fn test_anonymous_visitor_is_sent_to_login() {
    let (app, _pool) = test_app().await;

    for uri in ["/groups", "/products", "/sales", "/admin"] {
        let response = app.clone().oneshot(get(uri, None)).await.expect("response");
        assert!(response.status().is_redirection(), "{uri} must redirect");
        assert_eq!(location(&response), "/login");
    }
}

#[tokio::test]
async fn test_login_and_dashboard() {
    let (app, pool) = test_app().await;
    seed_admin(&pool).await;

    let cookie = sign_in(&app).await;

    let response = app
        .clone()
        .oneshot(get("/admin", Some(&cookie)))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains("Alex"), "dashboard greets the user");
    assert!(body.contains("welcome to Storeroom"), "login flash shown once");

    // The flash is gone on the next render.
    let response = app
        .clone()
        .oneshot(get("/admin", Some(&cookie)))
        .await
        .expect("response");
    let body = body_text(response).await;
    assert!(!body.contains("welcome to Storeroom"), "flash is one-shot");
}

#[tokio::test]
async fn test_bad_password_flashes_danger() {
    let (app, pool) = test_app().await;
    seed_admin(&pool).await;

    let response = app
        .clone()
        .oneshot(post_form("/login", "username=alex&password=wrong", None))
        .await
        .expect("response");
    assert!(response.status().is_redirection());
    assert_eq!(location(&response), "/login");
    let cookie = session_cookie(&response);

    let response = app
        .clone()
        .oneshot(get("/login", Some(&cookie)))
        .await
        .expect("response");
    let body = body_text(response).await;
    assert!(body.contains("username/password is incorrect"));
}

#[tokio::test]
async fn test_duplicate_group_name_is_refused_before_insert() {
    let (app, pool) = test_app().await;
    seed_admin(&pool).await;
    let cookie = sign_in(&app).await;

    let response = app
        .clone()
        .oneshot(post_form(
            "/groups/add",
            "group-name=Managers&group-level=2&status=1",
            Some(&cookie),
        ))
        .await
        .expect("response");
    assert_eq!(location(&response), "/groups");
    assert_eq!(count(&pool, "user_groups").await, 2);

    // Same name at a new level: denied, count unchanged.
    let response = app
        .clone()
        .oneshot(post_form(
            "/groups/add",
            "group-name=Managers&group-level=3&status=1",
            Some(&cookie),
        ))
        .await
        .expect("response");
    assert_eq!(location(&response), "/groups/add");
    assert_eq!(count(&pool, "user_groups").await, 2);

    let response = app
        .clone()
        .oneshot(get("/groups/add", Some(&cookie)))
        .await
        .expect("response");
    let body = body_text(response).await;
    assert!(body.contains("That group name already exists."));
}

#[tokio::test]
async fn test_blank_required_field_never_reaches_the_mutation() {
    let (app, pool) = test_app().await;
    seed_admin(&pool).await;
    let cookie = sign_in(&app).await;

    // The seeded admin group has id 1.
    let response = app
        .clone()
        .oneshot(post_form(
            "/groups/1/edit",
            "group-name=&group-level=9&status=1",
            Some(&cookie),
        ))
        .await
        .expect("response");
    assert!(response.status().is_redirection());
    assert_eq!(location(&response), "/groups/1/edit");

    // The group is untouched.
    let level: i64 = sqlx::query_scalar("SELECT group_level FROM user_groups WHERE id = 1")
        .fetch_one(&pool)
        .await
        .expect("query");
    assert_eq!(level, 1);

    let response = app
        .clone()
        .oneshot(get("/groups/1/edit", Some(&cookie)))
        .await
        .expect("response");
    let body = body_text(response).await;
    assert!(
        body.contains("group-name can&#x27;t be blank.")
            || body.contains("group-name can't be blank.")
    );
}

#[tokio::test]
async fn test_deleting_missing_product_reports_missing_id() {
    let (app, pool) = test_app().await;
    seed_admin(&pool).await;
    let cookie = sign_in(&app).await;

    let before = count(&pool, "products").await;

    // Twice: the second call behaves exactly like the first.
    for _ in 0..2 {
        let response = app
            .clone()
            .oneshot(get("/products/999/delete", Some(&cookie)))
            .await
            .expect("response");
        assert!(response.status().is_redirection());
        assert_eq!(location(&response), "/products");

        let response = app
            .clone()
            .oneshot(get("/products", Some(&cookie)))
            .await
            .expect("response");
        let body = body_text(response).await;
        assert!(body.contains("Missing Product id."));
    }

    assert_eq!(count(&pool, "products").await, before);
}

#[tokio::test]
async fn test_insufficient_level_lands_on_home_with_message() {
    let (app, pool) = test_app().await;
    seed_admin(&pool).await;
    sqlx::query(
        "INSERT INTO user_groups (group_name, group_level, group_status) VALUES ('user', 3, 1)",
    )
    .execute(&pool)
    .await
    .expect("insert group");
    let hash = hash_password("clerk-pw").expect("hash");
    sqlx::query(
        "INSERT INTO users (name, username, password_hash, user_level) VALUES ('Pat', 'pat', ?, 3)",
    )
    .bind(hash)
    .execute(&pool)
    .await
    .expect("insert user");

    let response = app
        .clone()
        .oneshot(post_form("/login", "username=pat&password=clerk-pw", None))
        .await
        .expect("response");
    let cookie = session_cookie(&response);

    // A clerk may not open the group admin.
    let response = app
        .clone()
        .oneshot(get("/groups", Some(&cookie)))
        .await
        .expect("response");
    assert!(response.status().is_redirection());
    assert_eq!(location(&response), "/home");

    let response = app
        .clone()
        .oneshot(get("/home", Some(&cookie)))
        .await
        .expect("response");
    let body = body_text(response).await;
    assert!(body.contains("permission to view that page"));
}

#[tokio::test]
async fn test_logout_destroys_the_session() {
    let (app, pool) = test_app().await;
    seed_admin(&pool).await;
    let cookie = sign_in(&app).await;

    let response = app
        .clone()
        .oneshot(get("/logout", Some(&cookie)))
        .await
        .expect("response");
    assert!(response.status().is_redirection());
    assert_eq!(location(&response), "/login");

    // The old cookie no longer opens gated pages.
    let response = app
        .clone()
        .oneshot(get("/admin", Some(&cookie)))
        .await
        .expect("response");
    assert!(response.status().is_redirection());
    assert_eq!(location(&response), "/login");
}
