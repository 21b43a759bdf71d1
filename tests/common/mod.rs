#![allow(dead_code)]

use actix_http::Request;
use actix_web::body::MessageBody;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::StatusCode;
use actix_web::test;
use chrono::Duration;
use serde_json::Value;
use std::sync::Arc;

use todoforge::auth::{PasswordHasher, TokenService};
use todoforge::models::{NewUser, Role, User};
use todoforge::state::AppState;
use todoforge::store::{MemoryStore, UserStore};

pub const TEST_SECRET: &str = "integration_test_secret";

/// State backed by an in-memory store, with the cheapest bcrypt cost.
pub fn test_state() -> AppState {
    AppState::new(
        Arc::new(MemoryStore::new()),
        TokenService::new(TEST_SECRET, Duration::hours(1)),
        PasswordHasher::new(4),
    )
}

/// Creates an account directly in the store and returns it with a fresh token.
pub async fn seed_user(state: &AppState, name: &str, email: &str, role: Role) -> (User, String) {
    let password_hash = state.hasher.hash("secret123").unwrap();
    let user = state
        .store
        .create_user(NewUser {
            name: name.to_string(),
            email: email.to_string(),
            password_hash,
            role,
        })
        .await
        .unwrap();
    let token = state.tokens.issue(user.id, user.role).unwrap();
    (user, token)
}

pub fn bearer(token: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {}", token))
}

/// Sends `req` and returns the status with the decoded JSON body.
pub async fn send<S, B>(app: &S, req: Request) -> (StatusCode, Value)
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let (status, body) = match test::try_call_service(app, req).await {
        Ok(resp) => {
            let status = resp.status();
            (status, test::read_body(resp).await)
        }
        Err(err) => {
            let resp = err.error_response();
            let status = resp.status();
            let body = actix_web::body::to_bytes(resp.into_body())
                .await
                .unwrap_or_default();
            (status, body)
        }
    };
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}
