use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use chrono::{Duration, Utc};
use orgsync_core::auth::{AuthEvent, IdentityProvider, Session, UserRef};
use orgsync_infrastructure::{SessionFile, SupabaseIdentityProvider};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

const ANON_KEY: &str = "anon-key";

/// In-process stand-in for the GoTrue auth API.
#[derive(Default)]
struct FakeAuth {
    confirm_email: bool,
    logouts: Mutex<Vec<Option<String>>>,
    refreshes: Mutex<u32>,
}

type Shared = Arc<FakeAuth>;
type AuthResult = Result<Json<Value>, (StatusCode, Json<Value>)>;

fn token_body(access_token: &str, email: &str) -> Value {
    json!({
        "access_token": access_token,
        "token_type": "bearer",
        "expires_in": 3600,
        "refresh_token": format!("refresh-{}", access_token),
        "user": {"id": "user-1", "email": email}
    })
}

fn require_apikey(headers: &HeaderMap) -> Result<(), (StatusCode, Json<Value>)> {
    if headers.get("apikey").and_then(|v| v.to_str().ok()) == Some(ANON_KEY) {
        Ok(())
    } else {
        Err((
            StatusCode::UNAUTHORIZED,
            Json(json!({"message": "No API key found in request"})),
        ))
    }
}

async fn token(
    State(auth): State<Shared>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> AuthResult {
    require_apikey(&headers)?;
    match params.get("grant_type").map(String::as_str) {
        Some("password") => {
            if body["password"] == json!("secret") {
                Ok(Json(token_body("access-1", body["email"].as_str().unwrap_or(""))))
            } else {
                Err((
                    StatusCode::BAD_REQUEST,
                    Json(json!({
                        "error": "invalid_grant",
                        "error_description": "Invalid login credentials"
                    })),
                ))
            }
        }
        Some("refresh_token") => {
            *auth.refreshes.lock().unwrap() += 1;
            Ok(Json(token_body("access-refreshed", "a@example.com")))
        }
        _ => Err((
            StatusCode::BAD_REQUEST,
            Json(json!({"msg": "unsupported grant type"})),
        )),
    }
}

async fn signup(State(auth): State<Shared>, headers: HeaderMap, Json(body): Json<Value>) -> AuthResult {
    require_apikey(&headers)?;
    if auth.confirm_email {
        Ok(Json(json!({
            "id": "user-2",
            "email": body["email"],
            "confirmation_sent_at": "2024-03-01T10:00:00Z"
        })))
    } else {
        Ok(Json(token_body("access-new", body["email"].as_str().unwrap_or(""))))
    }
}

async fn logout(State(auth): State<Shared>, headers: HeaderMap) -> StatusCode {
    let bearer = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    auth.logouts.lock().unwrap().push(bearer);
    StatusCode::NO_CONTENT
}

async fn spawn_auth(confirm_email: bool) -> (String, Shared) {
    let auth: Shared = Arc::new(FakeAuth {
        confirm_email,
        ..FakeAuth::default()
    });
    let router = Router::new()
        .route("/auth/v1/token", post(token))
        .route("/auth/v1/signup", post(signup))
        .route("/auth/v1/logout", post(logout))
        .with_state(auth.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    (format!("http://{}", addr), auth)
}

#[tokio::test]
async fn test_sign_in_publishes_and_persists_session() {
    let (url, _auth) = spawn_auth(false).await;
    let dir = tempfile::tempdir().unwrap();
    let file = SessionFile::new(dir.path().join("session.json"));

    let provider = SupabaseIdentityProvider::new(url, ANON_KEY)
        .with_session_file(file.clone())
        .await
        .unwrap();
    let mut feed = provider.on_auth_state_change();

    let session = provider
        .sign_in_with_password("a@example.com", "secret")
        .await
        .unwrap();
    assert_eq!(session.access_token, "access-1");
    assert_eq!(session.user.email.as_deref(), Some("a@example.com"));
    assert!(session.expires_at.is_some());

    let change = feed.recv().await.unwrap();
    assert_eq!(change.event, AuthEvent::SignedIn);
    assert_eq!(change.session.as_ref(), Some(&session));

    assert_eq!(file.load().await.unwrap(), Some(session.clone()));
    assert_eq!(provider.get_session().await.unwrap(), Some(session));
}

#[tokio::test]
async fn test_wrong_password_surfaces_provider_message() {
    let (url, _auth) = spawn_auth(false).await;
    let provider = SupabaseIdentityProvider::new(url, ANON_KEY);

    let err = provider
        .sign_in_with_password("a@example.com", "wrong")
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Invalid login credentials");
    assert_eq!(provider.get_session().await.unwrap(), None);
}

#[tokio::test]
async fn test_sign_up_pending_confirmation_has_no_session() {
    let (url, _auth) = spawn_auth(true).await;
    let provider = SupabaseIdentityProvider::new(url, ANON_KEY);
    let mut feed = provider.on_auth_state_change();

    let outcome = provider.sign_up("b@example.com", "secret").await.unwrap();
    assert!(outcome.requires_confirmation());
    assert_eq!(outcome.user.as_ref().map(|u| u.id.as_str()), Some("user-2"));
    assert!(feed.try_recv().is_err());
    assert_eq!(provider.get_session().await.unwrap(), None);
}

#[tokio::test]
async fn test_sign_up_with_autoconfirm_signs_in() {
    let (url, _auth) = spawn_auth(false).await;
    let provider = SupabaseIdentityProvider::new(url, ANON_KEY);
    let mut feed = provider.on_auth_state_change();

    let outcome = provider.sign_up("c@example.com", "secret").await.unwrap();
    assert!(!outcome.requires_confirmation());
    assert_eq!(feed.recv().await.unwrap().event, AuthEvent::SignedIn);
}

#[tokio::test]
async fn test_sign_out_revokes_and_clears() {
    let (url, auth) = spawn_auth(false).await;
    let dir = tempfile::tempdir().unwrap();
    let file = SessionFile::new(dir.path().join("session.json"));
    let provider = SupabaseIdentityProvider::new(url, ANON_KEY)
        .with_session_file(file.clone())
        .await
        .unwrap();

    provider
        .sign_in_with_password("a@example.com", "secret")
        .await
        .unwrap();
    let mut feed = provider.on_auth_state_change();

    provider.sign_out().await.unwrap();

    assert_eq!(
        *auth.logouts.lock().unwrap(),
        vec![Some("Bearer access-1".to_string())]
    );
    let change = feed.recv().await.unwrap();
    assert_eq!(change.event, AuthEvent::SignedOut);
    assert_eq!(change.session, None);
    assert_eq!(provider.get_session().await.unwrap(), None);
    assert_eq!(file.load().await.unwrap(), None);
}

#[tokio::test]
async fn test_expired_persisted_session_is_refreshed() {
    let (url, auth) = spawn_auth(false).await;
    let dir = tempfile::tempdir().unwrap();
    let file = SessionFile::new(dir.path().join("session.json"));
    file.save(&Session {
        user: UserRef {
            id: "user-1".to_string(),
            email: Some("a@example.com".to_string()),
        },
        access_token: "stale".to_string(),
        refresh_token: Some("refresh-stale".to_string()),
        expires_at: Some(Utc::now() - Duration::minutes(5)),
    })
    .await
    .unwrap();

    let provider = SupabaseIdentityProvider::new(url, ANON_KEY)
        .with_session_file(file.clone())
        .await
        .unwrap();
    let mut feed = provider.on_auth_state_change();

    let session = provider.get_session().await.unwrap().unwrap();
    assert_eq!(session.access_token, "access-refreshed");
    assert_eq!(*auth.refreshes.lock().unwrap(), 1);
    assert_eq!(feed.recv().await.unwrap().event, AuthEvent::TokenRefreshed);
    assert_eq!(
        file.load().await.unwrap().map(|s| s.access_token),
        Some("access-refreshed".to_string())
    );
}

#[tokio::test]
async fn test_auto_refresh_runs_before_expiry() {
    let (url, auth) = spawn_auth(false).await;
    let dir = tempfile::tempdir().unwrap();
    let file = SessionFile::new(dir.path().join("session.json"));
    // Due for refresh 200ms from now (expiry minus the 60s leeway).
    file.save(&Session {
        user: UserRef {
            id: "user-1".to_string(),
            email: Some("a@example.com".to_string()),
        },
        access_token: "aging".to_string(),
        refresh_token: Some("refresh-aging".to_string()),
        expires_at: Some(Utc::now() + Duration::seconds(60) + Duration::milliseconds(200)),
    })
    .await
    .unwrap();

    let provider = Arc::new(
        SupabaseIdentityProvider::new(url, ANON_KEY)
            .with_session_file(file)
            .await
            .unwrap(),
    );
    let mut feed = provider.on_auth_state_change();
    let refresher = provider.spawn_auto_refresh();

    let change = tokio::time::timeout(std::time::Duration::from_secs(5), feed.recv())
        .await
        .expect("no refresh within 5s")
        .unwrap();
    assert_eq!(change.event, AuthEvent::TokenRefreshed);
    assert_eq!(
        change.session.map(|s| s.access_token).as_deref(),
        Some("access-refreshed")
    );
    assert_eq!(*auth.refreshes.lock().unwrap(), 1);

    // The refreshed session lasts an hour; nothing else is due.
    tokio::time::sleep(std::time::Duration::from_millis(300)).await;
    assert_eq!(*auth.refreshes.lock().unwrap(), 1);

    refresher.abort();
}

#[tokio::test]
async fn test_auto_refresh_stops_with_provider() {
    let (url, _auth) = spawn_auth(false).await;
    let provider = Arc::new(SupabaseIdentityProvider::new(url, ANON_KEY));
    let refresher = provider.spawn_auto_refresh();

    drop(provider);

    tokio::time::timeout(std::time::Duration::from_secs(5), refresher)
        .await
        .expect("refresh task outlived its provider")
        .unwrap();
}
