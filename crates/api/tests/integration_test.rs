//! Integration tests for the Vidly Rental API

use axum::{
    body::Body,
    http::{Request, StatusCode},
    response::Response,
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt; // for `oneshot`
use uuid::Uuid;
use vidly_api::{auth::Identity, create_router, AppState, MemoryStore, TokenManager};

const SECRET: &str = "integration-secret";

/// Helper to create a test app over in-memory storage
fn create_test_app() -> Router {
    let tokens = TokenManager::new(SECRET, 3600);
    create_router(AppState::new(Arc::new(MemoryStore::new()), tokens))
}

fn token(is_admin: bool) -> String {
    let identity = Identity {
        id: Uuid::new_v4(),
        name: "Tester".to_string(),
        is_admin,
    };
    TokenManager::new(SECRET, 3600).issue(&identity).unwrap()
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Response {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("x-auth-token", token);
    }

    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    app.clone().oneshot(request).await.unwrap()
}

async fn json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

async fn create_genre(app: &Router, name: &str) -> Value {
    let response = send(app, "POST", "/api/genres", Some(token(false).as_str()), Some(json!({ "name": name }))).await;
    assert_eq!(response.status(), StatusCode::OK);
    json_body(response).await
}

#[tokio::test]
async fn test_health_check() {
    let app = create_test_app();

    let response = send(&app, "GET", "/health", None, None).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["service"], "vidly-api");
}

#[tokio::test]
async fn test_create_genre_with_user_token() {
    let app = create_test_app();

    let genre = create_genre(&app, "Action").await;

    assert_eq!(genre["name"], "Action");
    assert!(Uuid::parse_str(genre["_id"].as_str().unwrap()).is_ok());

    let response = send(&app, "GET", "/api/genres", None, None).await;
    let genres = json_body(response).await;
    assert_eq!(genres.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_create_genre_without_token_is_unauthorized() {
    let app = create_test_app();

    let response = send(&app, "POST", "/api/genres", None, Some(json!({ "name": "Action" }))).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = json_body(response).await;
    assert_eq!(json["error"], "Access denied. No token provided.");
}

#[tokio::test]
async fn test_create_genre_with_bad_token_is_unauthorized() {
    let app = create_test_app();

    let response = send(
        &app,
        "POST",
        "/api/genres",
        Some("not-a-token"),
        Some(json!({ "name": "Action" })),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_create_genre_short_name_is_rejected() {
    let app = create_test_app();

    let response = send(&app, "POST", "/api/genres", Some(token(false).as_str()), Some(json!({ "name": "abc" }))).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = json_body(response).await;
    assert!(json["error"].as_str().unwrap().contains("\"name\""));
}

#[tokio::test]
async fn test_create_genre_unknown_field_is_rejected() {
    let app = create_test_app();

    let response = send(
        &app,
        "POST",
        "/api/genres",
        Some(token(false).as_str()),
        Some(json!({ "name": "Action", "rating": 5 })),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_delete_genre_requires_admin() {
    let app = create_test_app();
    let genre = create_genre(&app, "Action").await;
    let uri = format!("/api/genres/{}", genre["_id"].as_str().unwrap());

    let response = send(&app, "DELETE", &uri, Some(token(false).as_str()), None).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = send(&app, "GET", &uri, None, None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(&app, "DELETE", &uri, Some(token(true).as_str()), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["name"], "Action");

    let response = send(&app, "GET", &uri, None, None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_update_genre_as_admin() {
    let app = create_test_app();
    let genre = create_genre(&app, "Action").await;
    let uri = format!("/api/genres/{}", genre["_id"].as_str().unwrap());

    let response = send(&app, "PUT", &uri, Some(token(true).as_str()), Some(json!({ "name": "Adventure" }))).await;

    assert_eq!(response.status(), StatusCode::OK);
    let updated = json_body(response).await;
    assert_eq!(updated["name"], "Adventure");
    assert_eq!(updated["_id"], genre["_id"]);
}

#[tokio::test]
async fn test_genre_unknown_and_malformed_ids_are_not_found() {
    let app = create_test_app();
    let unknown = format!("/api/genres/{}", Uuid::new_v4());

    let response = send(&app, "GET", &unknown, None, None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        json_body(response).await["error"],
        "The genre with the given ID was not found."
    );

    let response = send(&app, "GET", "/api/genres/1", None, None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = send(&app, "PUT", &unknown, Some(token(true).as_str()), Some(json!({ "name": "Drama!" }))).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = send(&app, "DELETE", &unknown, Some(token(true).as_str()), None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_customer_crud() {
    let app = create_test_app();

    let response = send(
        &app,
        "POST",
        "/api/customers",
        None,
        Some(json!({ "name": "Ada Lovelace", "phone": "555-123-4567" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let customer = json_body(response).await;
    assert_eq!(customer["isGold"], false);

    let uri = format!("/api/customers/{}", customer["_id"].as_str().unwrap());
    let response = send(
        &app,
        "PUT",
        &uri,
        None,
        Some(json!({ "name": "Ada L.", "phone": "(555) 123-4567", "isGold": true })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["isGold"], true);

    let response = send(&app, "DELETE", &uri, None, None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(&app, "GET", &uri, None, None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_customer_with_bad_phone_is_rejected() {
    let app = create_test_app();

    let response = send(
        &app,
        "POST",
        "/api/customers",
        None,
        Some(json!({ "name": "Ada Lovelace", "phone": "12345" })),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_movie_with_unknown_genre_is_rejected() {
    let app = create_test_app();

    let response = send(
        &app,
        "POST",
        "/api/movies",
        None,
        Some(json!({
            "name": "Heat",
            "genreId": Uuid::new_v4().to_string(),
            "numberInStock": 3,
            "dailyRentalRate": 2.5
        })),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"], "Invalid genre.");
}

#[tokio::test]
async fn test_rental_flow_decrements_stock() {
    let app = create_test_app();
    let genre = create_genre(&app, "Crime").await;

    let response = send(
        &app,
        "POST",
        "/api/customers",
        None,
        Some(json!({ "name": "Ada Lovelace", "phone": "555-123-4567", "isGold": true })),
    )
    .await;
    let customer = json_body(response).await;

    let response = send(
        &app,
        "POST",
        "/api/movies",
        None,
        Some(json!({
            "name": "Heat",
            "genreId": genre["_id"],
            "numberInStock": 1,
            "dailyRentalRate": 2.5
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let movie = json_body(response).await;
    assert_eq!(movie["genre"]["name"], "Crime");

    let rental_body = json!({ "customerId": customer["_id"], "movieId": movie["_id"] });
    let response = send(&app, "POST", "/api/rentals", None, Some(rental_body.clone())).await;
    assert_eq!(response.status(), StatusCode::OK);
    let rental = json_body(response).await;
    assert_eq!(rental["customer"]["name"], "Ada Lovelace");
    assert_eq!(rental["movie"]["title"], "Heat");
    assert_eq!(rental["movie"]["dailyRentalRate"], 2.5);

    let movie_uri = format!("/api/movies/{}", movie["_id"].as_str().unwrap());
    let response = send(&app, "GET", &movie_uri, None, None).await;
    assert_eq!(json_body(response).await["numberInStock"], 0);

    let response = send(&app, "POST", "/api/rentals", None, Some(rental_body)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"], "Movie not in stock.");

    let rental_uri = format!("/api/rentals/{}", rental["_id"].as_str().unwrap());
    let first = json_body(send(&app, "GET", &rental_uri, None, None).await).await;
    let second = json_body(send(&app, "GET", &rental_uri, None, None).await).await;
    assert_eq!(first, rental);
    assert_eq!(first, second);

    let response = send(&app, "GET", "/api/rentals", None, None).await;
    assert_eq!(json_body(response).await.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_rental_for_unknown_customer_is_rejected() {
    let app = create_test_app();

    let response = send(
        &app,
        "POST",
        "/api/rentals",
        None,
        Some(json!({
            "customerId": Uuid::new_v4().to_string(),
            "movieId": Uuid::new_v4().to_string()
        })),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"], "Invalid customer.");
}

#[tokio::test]
async fn test_register_login_and_me() {
    let app = create_test_app();
    let user = json!({ "name": "Grace Hopper", "email": "grace@example.com", "password": "cobol123" });

    let response = send(&app, "POST", "/api/users", None, Some(user.clone())).await;
    assert_eq!(response.status(), StatusCode::OK);
    let header_token = response
        .headers()
        .get("x-auth-token")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    let profile = json_body(response).await;
    assert_eq!(profile["email"], "grace@example.com");
    assert!(profile.get("password").is_none());

    let response = send(&app, "POST", "/api/users", None, Some(user)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"], "Email already registered.");

    let response = send(
        &app,
        "POST",
        "/api/auth",
        None,
        Some(json!({ "email": "grace@example.com", "password": "wrong-password" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"], "Invalid email or password.");

    let response = send(
        &app,
        "POST",
        "/api/auth",
        None,
        Some(json!({ "email": "grace@example.com", "password": "cobol123" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let login_token = json_body(response).await["token"].as_str().unwrap().to_string();

    for issued in [&header_token, &login_token] {
        let response = send(&app, "GET", "/api/users/me", Some(issued.as_str()), None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["_id"], profile["_id"]);
    }

    let response = send(&app, "POST", "/api/auth/refresh", Some(login_token.as_str()), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(json_body(response).await["token"].is_string());
}

#[tokio::test]
async fn test_user_update_requires_self_or_admin() {
    let app = create_test_app();
    let response = send(
        &app,
        "POST",
        "/api/users",
        None,
        Some(json!({ "name": "Grace Hopper", "email": "grace@example.com", "password": "cobol123" })),
    )
    .await;
    let profile = json_body(response).await;
    let uri = format!("/api/users/{}", profile["_id"].as_str().unwrap());
    let update = json!({ "name": "Grace B. Hopper", "email": "grace@navy.mil", "password": "cobol456" });

    let response = send(&app, "PUT", &uri, Some(token(false).as_str()), Some(update.clone())).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = send(&app, "PUT", &uri, Some(token(true).as_str()), Some(update)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["email"], "grace@navy.mil");

    let response = send(&app, "GET", "/api/users", Some(token(false).as_str()), None).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = send(&app, "DELETE", &uri, Some(token(true).as_str()), None).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_expired_token_is_unauthorized() {
    let app = create_test_app();
    let expired = TokenManager::new(SECRET, -60)
        .issue(&Identity {
            id: Uuid::new_v4(),
            name: "Tester".to_string(),
            is_admin: true,
        })
        .unwrap();

    let response = send(&app, "POST", "/api/genres", Some(expired.as_str()), Some(json!({ "name": "Action" }))).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(response).await["error"], "Token expired.");
}
