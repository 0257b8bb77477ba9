//! API routes

use crate::api::handlers::{
    create_contact, delete_contact, get_contact, list_contacts, update_contact, update_favorite,
    AppState,
};
use crate::auth::handlers::{current_user, login, logout, signup, update_avatar, verify_email};
use crate::auth::middleware::authenticate;
use axum::{
    middleware,
    routing::{get, patch, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::services::ServeDir;

/// Build the API routes
pub fn build_api_routes(state: AppState) -> Router {
    // Public routes (no authentication required)
    let public_routes = Router::new()
        .route("/api/auth/signup", post(signup))
        .route("/api/auth/login", post(login))
        .route("/api/auth/verify/:token", get(verify_email))
        .route("/api/health", get(health_check))
        .with_state(state.clone());

    // Protected routes (session guard required)
    let protected_routes = Router::new()
        .route("/api/auth/logout", get(logout))
        .route("/api/auth/current", get(current_user))
        .route("/api/auth/avatars", patch(update_avatar))
        .route("/api/contacts", get(list_contacts).post(create_contact))
        .route(
            "/api/contacts/:id",
            get(get_contact).put(update_contact).delete(delete_contact),
        )
        .route("/api/contacts/:id/favorite", patch(update_favorite))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            authenticate,
        ))
        .with_state(state.clone());

    // Resized avatars are served statically
    let avatars = ServeDir::new(state.avatar_store.avatars_dir());

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .nest_service("/avatars", avatars)
}

/// Health check endpoint handler
async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().timestamp(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::verify_token;
    use crate::avatar::AvatarStore;
    use crate::core::config::EmailConfig;
    use crate::db::manager::DatabaseManager;
    use crate::db::repository::{ContactRepository, UserRepository};
    use crate::email::Mailer;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Method, Request, StatusCode};
    use std::sync::Arc;
    use tempfile::TempDir;
    use tower::ServiceExt;

    const TEST_SECRET: &str = "test-secret";

    struct TestApp {
        router: Router,
        state: AppState,
        _dirs: (TempDir, TempDir),
    }

    fn test_app() -> TestApp {
        let db = Arc::new(DatabaseManager::new_in_memory().unwrap());
        let temp = TempDir::new().unwrap();
        let public = TempDir::new().unwrap();

        let email_config = EmailConfig {
            enabled: false,
            smtp_host: String::new(),
            smtp_port: 587,
            username: String::new(),
            password: String::new(),
            from: "Phonebook <noreply@phonebook.local>".into(),
            base_url: "http://localhost:3000".into(),
        };

        let state = AppState {
            user_repo: Arc::new(UserRepository::new(db.clone())),
            contact_repo: Arc::new(ContactRepository::new(db)),
            mailer: Arc::new(Mailer::from_config(&email_config).unwrap()),
            avatar_store: Arc::new(AvatarStore::new(temp.path(), public.path()).unwrap()),
            jwt_secret: Arc::new(TEST_SECRET.to_string()),
        };

        TestApp {
            router: build_api_routes(state.clone()),
            state,
            _dirs: (temp, public),
        }
    }

    async fn send(router: &Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    fn json_request(
        method: Method,
        uri: &str,
        body: serde_json::Value,
        token: Option<&str>,
    ) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    fn bare_request(method: Method, uri: &str, token: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        builder.body(Body::empty()).unwrap()
    }

    async fn signup(app: &TestApp, email: &str, password: &str) {
        let (status, body) = send(
            &app.router,
            json_request(
                Method::POST,
                "/api/auth/signup",
                serde_json::json!({"email": email, "password": password}),
                None,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "signup failed: {}", body);
    }

    async fn login(app: &TestApp, email: &str, password: &str) -> String {
        let (status, body) = send(
            &app.router,
            json_request(
                Method::POST,
                "/api/auth/login",
                serde_json::json!({"email": email, "password": password}),
                None,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "login failed: {}", body);
        body["token"].as_str().unwrap().to_string()
    }

    async fn create_contact(app: &TestApp, token: &str, name: &str) -> String {
        let (status, body) = send(
            &app.router,
            json_request(
                Method::POST,
                "/api/contacts",
                serde_json::json!({
                    "name": name,
                    "email": format!("{}@example.com", name.to_lowercase()),
                    "phone": "0501234567",
                }),
                Some(token),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "create contact failed: {}", body);
        body["id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_signup_then_login_roundtrip() {
        let app = test_app();

        let (status, body) = send(
            &app.router,
            json_request(
                Method::POST,
                "/api/auth/signup",
                serde_json::json!({"email": "new@example.com", "password": "hello12345"}),
                None,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["message"], "Registration successful");
        assert_eq!(body["user"]["email"], "new@example.com");
        assert_eq!(body["user"]["subscription"], "starter");
        let avatar = body["user"]["avatarURL"].as_str().unwrap();
        assert!(avatar.starts_with("https://www.gravatar.com/avatar/"));
        assert!(body["user"].get("password").is_none());

        let token = login(&app, "new@example.com", "hello12345").await;

        // Token claims carry the created identity
        let claims = verify_token(&token, TEST_SECRET).unwrap();
        assert_eq!(claims.email, "new@example.com");
        assert_eq!(claims.subscription, "starter");
        let user = app
            .state
            .user_repo
            .find_by_email("new@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(claims.sub, user.id);

        let (status, body) = send(
            &app.router,
            bare_request(Method::GET, "/api/auth/current", Some(&token)),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            serde_json::json!({"email": "new@example.com", "subscription": "starter"})
        );
    }

    #[tokio::test]
    async fn test_signup_validation_and_conflict() {
        let app = test_app();

        let (status, body) = send(
            &app.router,
            json_request(
                Method::POST,
                "/api/auth/signup",
                serde_json::json!({"email": "only@example.com"}),
                None,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["message"],
            "Validation Error: Email and password are required."
        );

        signup(&app, "taken@example.com", "hello12345").await;
        let (status, body) = send(
            &app.router,
            json_request(
                Method::POST,
                "/api/auth/signup",
                serde_json::json!({"email": "taken@example.com", "password": "other12345"}),
                None,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["message"], "Conflict Error: Email in use.");
    }

    #[tokio::test]
    async fn test_login_does_not_leak_which_check_failed() {
        let app = test_app();
        signup(&app, "hello@example.com", "hello12345").await;

        let (wrong_password_status, wrong_password_body) = send(
            &app.router,
            json_request(
                Method::POST,
                "/api/auth/login",
                serde_json::json!({"email": "hello@example.com", "password": "hello"}),
                None,
            ),
        )
        .await;
        let (unknown_email_status, unknown_email_body) = send(
            &app.router,
            json_request(
                Method::POST,
                "/api/auth/login",
                serde_json::json!({"email": "nobody@example.com", "password": "hello12345"}),
                None,
            ),
        )
        .await;

        assert_eq!(wrong_password_status, StatusCode::UNAUTHORIZED);
        assert_eq!(unknown_email_status, StatusCode::UNAUTHORIZED);
        assert_eq!(wrong_password_body, unknown_email_body);
        assert_eq!(wrong_password_body["message"], "Email or password is wrong");
    }

    #[tokio::test]
    async fn test_login_scenario_hello_example() {
        let app = test_app();
        signup(&app, "hello@example.com", "hello12345").await;

        let (status, body) = send(
            &app.router,
            json_request(
                Method::POST,
                "/api/auth/login",
                serde_json::json!({"email": "hello@example.com", "password": "hello12345"}),
                None,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["token"].is_string());
        assert_eq!(body["user"]["email"], "hello@example.com");
        assert_eq!(body["user"]["subscription"], "starter");
    }

    #[tokio::test]
    async fn test_protected_routes_reject_missing_or_garbage_tokens() {
        let app = test_app();

        for request in [
            bare_request(Method::GET, "/api/auth/current", None),
            bare_request(Method::GET, "/api/auth/current", Some("garbage")),
            bare_request(Method::GET, "/api/contacts", None),
            bare_request(Method::GET, "/api/auth/logout", Some("garbage")),
        ] {
            let (status, body) = send(&app.router, request).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED);
            assert_eq!(body, serde_json::json!({"message": "Not authorized"}));
        }

        // A non-Bearer scheme is also rejected
        let request = Request::builder()
            .method(Method::GET)
            .uri("/api/auth/current")
            .header(header::AUTHORIZATION, "Basic aGVsbG8=")
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(&app.router, request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_logout_invalidates_token() {
        let app = test_app();
        signup(&app, "bye@example.com", "hello12345").await;
        let token = login(&app, "bye@example.com", "hello12345").await;

        let (status, _) = send(
            &app.router,
            bare_request(Method::GET, "/api/auth/logout", Some(&token)),
        )
        .await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        // The signed, unexpired token no longer matches the stored slot
        let (status, body) = send(
            &app.router,
            bare_request(Method::GET, "/api/auth/current", Some(&token)),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Not authorized");
    }

    #[tokio::test]
    async fn test_relogin_invalidates_previous_token() {
        let app = test_app();
        signup(&app, "again@example.com", "hello12345").await;

        let first = login(&app, "again@example.com", "hello12345").await;
        // Issued tokens embed the second-resolution iat; make sure the
        // second login lands on a different one
        tokio::time::sleep(std::time::Duration::from_millis(1100)).await;
        let second = login(&app, "again@example.com", "hello12345").await;
        assert_ne!(first, second);

        let (status, _) = send(
            &app.router,
            bare_request(Method::GET, "/api/auth/current", Some(&first)),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = send(
            &app.router,
            bare_request(Method::GET, "/api/auth/current", Some(&second)),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_verification_link_is_single_use() {
        let app = test_app();
        signup(&app, "verify@example.com", "hello12345").await;

        let user = app
            .state
            .user_repo
            .find_by_email("verify@example.com")
            .await
            .unwrap()
            .unwrap();
        assert!(!user.verified);
        let verification_token = user.verification_token.unwrap();

        let uri = format!("/api/auth/verify/{}", verification_token);
        let (status, body) = send(&app.router, bare_request(Method::GET, &uri, None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Verification successful");

        let user = app
            .state
            .user_repo
            .find_by_email("verify@example.com")
            .await
            .unwrap()
            .unwrap();
        assert!(user.verified);
        assert!(user.verification_token.is_none());

        // Replay with the consumed token
        let (status, _) = send(&app.router, bare_request(Method::GET, &uri, None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_unverified_account_can_log_in() {
        let app = test_app();
        signup(&app, "lazy@example.com", "hello12345").await;
        // No verification visit; login stays permissive
        let token = login(&app, "lazy@example.com", "hello12345").await;
        let (status, _) = send(
            &app.router,
            bare_request(Method::GET, "/api/auth/current", Some(&token)),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_contact_crud_flow() {
        let app = test_app();
        signup(&app, "crud@example.com", "hello12345").await;
        let token = login(&app, "crud@example.com", "hello12345").await;

        // Missing phone
        let (status, body) = send(
            &app.router,
            json_request(
                Method::POST,
                "/api/contacts",
                serde_json::json!({"name": "Ada", "email": "ada@example.com"}),
                Some(&token),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "missing required phone field");

        // Non-digit phone
        let (status, _) = send(
            &app.router,
            json_request(
                Method::POST,
                "/api/contacts",
                serde_json::json!({"name": "Ada", "email": "ada@example.com", "phone": "050-123"}),
                Some(&token),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let id = create_contact(&app, &token, "Ada").await;

        let (status, body) = send(
            &app.router,
            bare_request(Method::GET, &format!("/api/contacts/{}", id), Some(&token)),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "Ada");
        assert_eq!(body["favorite"], false);
        assert!(body.get("owner_id").is_none());

        // Empty update body
        let (status, body) = send(
            &app.router,
            json_request(
                Method::PUT,
                &format!("/api/contacts/{}", id),
                serde_json::json!({}),
                Some(&token),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "missing fields");

        let (status, body) = send(
            &app.router,
            json_request(
                Method::PUT,
                &format!("/api/contacts/{}", id),
                serde_json::json!({"name": "Ada Lovelace"}),
                Some(&token),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "Ada Lovelace");
        assert_eq!(body["phone"], "0501234567");

        let (status, body) = send(
            &app.router,
            bare_request(Method::DELETE, &format!("/api/contacts/{}", id), Some(&token)),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "contact deleted");

        let (status, _) = send(
            &app.router,
            bare_request(Method::GET, &format!("/api/contacts/{}", id), Some(&token)),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_favorite_validation_and_idempotence() {
        let app = test_app();
        signup(&app, "fav@example.com", "hello12345").await;
        let token = login(&app, "fav@example.com", "hello12345").await;
        let id = create_contact(&app, &token, "Grace").await;

        // Non-boolean favorite is rejected at the body layer
        let (status, _) = send(
            &app.router,
            json_request(
                Method::PATCH,
                &format!("/api/contacts/{}/favorite", id),
                serde_json::json!({"favorite": "yes"}),
                Some(&token),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        // Missing favorite field
        let (status, body) = send(
            &app.router,
            json_request(
                Method::PATCH,
                &format!("/api/contacts/{}/favorite", id),
                serde_json::json!({}),
                Some(&token),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "missing field favorite");

        // Repeating the same boolean value yields the same state both times
        for _ in 0..2 {
            let (status, body) = send(
                &app.router,
                json_request(
                    Method::PATCH,
                    &format!("/api/contacts/{}/favorite", id),
                    serde_json::json!({"favorite": true}),
                    Some(&token),
                ),
            )
            .await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body["favorite"], true);
        }

        let (status, body) = send(
            &app.router,
            bare_request(Method::GET, "/api/contacts?favorite=true", Some(&token)),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_contacts_are_owner_scoped() {
        let app = test_app();
        signup(&app, "alice@example.com", "hello12345").await;
        signup(&app, "bob@example.com", "hello12345").await;
        let alice = login(&app, "alice@example.com", "hello12345").await;
        let bob = login(&app, "bob@example.com", "hello12345").await;

        let id = create_contact(&app, &alice, "Ada").await;

        // Bob sees nothing of Alice's contact, whatever the verb
        let (status, _) = send(
            &app.router,
            bare_request(Method::GET, &format!("/api/contacts/{}", id), Some(&bob)),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(
            &app.router,
            json_request(
                Method::PUT,
                &format!("/api/contacts/{}", id),
                serde_json::json!({"name": "Hijacked"}),
                Some(&bob),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(
            &app.router,
            bare_request(Method::DELETE, &format!("/api/contacts/{}", id), Some(&bob)),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (_, body) = send(
            &app.router,
            bare_request(Method::GET, "/api/contacts", Some(&bob)),
        )
        .await;
        assert_eq!(body.as_array().unwrap().len(), 0);

        let (_, body) = send(
            &app.router,
            bare_request(Method::GET, "/api/contacts", Some(&alice)),
        )
        .await;
        let contacts = body.as_array().unwrap();
        assert_eq!(contacts.len(), 1);
        assert_eq!(contacts[0]["name"], "Ada");
    }

    #[tokio::test]
    async fn test_avatar_upload_resizes_and_persists_url() {
        let app = test_app();
        signup(&app, "ava@example.com", "hello12345").await;
        let token = login(&app, "ava@example.com", "hello12345").await;

        let png = {
            use std::io::Cursor;
            let img = image::RgbImage::from_pixel(16, 16, image::Rgb([10, 200, 30]));
            let mut buf = Cursor::new(Vec::new());
            image::DynamicImage::ImageRgb8(img)
                .write_to(&mut buf, image::ImageFormat::Png)
                .unwrap();
            buf.into_inner()
        };

        let boundary = "test-boundary";
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"avatar\"; \
                 filename=\"me.png\"\r\nContent-Type: image/png\r\n\r\n",
                boundary
            )
            .as_bytes(),
        );
        body.extend_from_slice(&png);
        body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());

        let request = Request::builder()
            .method(Method::PATCH)
            .uri("/api/auth/avatars")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", boundary),
            )
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .body(Body::from(body))
            .unwrap();

        let (status, body) = send(&app.router, request).await;
        assert_eq!(status, StatusCode::OK, "avatar upload failed: {}", body);

        let avatar_url = body["avatarURL"].as_str().unwrap();
        assert!(avatar_url.starts_with("/avatars/"));
        assert!(avatar_url.ends_with("_me.png"));

        let user = app
            .state
            .user_repo
            .find_by_email("ava@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(user.avatar_url, avatar_url);

        let file_name = avatar_url.strip_prefix("/avatars/").unwrap();
        let saved = image::open(app.state.avatar_store.avatars_dir().join(file_name)).unwrap();
        assert_eq!(saved.width(), crate::avatar::AVATAR_SIZE);
        assert_eq!(saved.height(), crate::avatar::AVATAR_SIZE);
    }

    #[tokio::test]
    async fn test_health_check_is_public() {
        let app = test_app();
        let (status, body) = send(&app.router, bare_request(Method::GET, "/api/health", None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }
}
