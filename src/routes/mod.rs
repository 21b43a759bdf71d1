//! HTTP surface of the service.
//!
//! Everything except `/health` is mounted under `/api/v1`. Protected scopes are wrapped
//! with [`AuthGate`], the admin scope additionally with [`RoleGate`].

pub mod admin;
pub mod health;
pub mod todos;
pub mod users;

use actix_web::{error, middleware::DefaultHeaders, web, HttpRequest, HttpResponse};

use crate::auth::{AuthGate, RoleGate};
use crate::error::AppError;
use crate::models::Role;

pub const API_PREFIX: &str = "/api/v1";

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .app_data(query_config())
        .service(health::health)
        .service(
            web::scope(API_PREFIX)
                .service(
                    web::scope("/users")
                        .service(users::register)
                        .service(users::login)
                        .service(
                            web::scope("/profile")
                                .wrap(AuthGate)
                                .service(users::get_profile)
                                .service(users::update_profile),
                        ),
                )
                .service(
                    // Fixed paths go before `/{id}`.
                    web::scope("/todos")
                        .wrap(AuthGate)
                        .app_data(path_config("Todo not found"))
                        .service(todos::list_todos)
                        .service(todos::create_todo)
                        .service(todos::list_completed_todos)
                        .service(todos::list_todos_by_date_range)
                        .service(todos::get_todo)
                        .service(todos::update_todo)
                        .service(todos::delete_todo)
                        .service(todos::toggle_todo),
                )
                .service(
                    web::scope("/admin")
                        .wrap(RoleGate::new(Role::Admin))
                        .wrap(AuthGate)
                        .app_data(path_config("User not found"))
                        .service(admin::list_all_todos)
                        .service(admin::stats)
                        .service(admin::list_users)
                        .service(admin::get_user)
                        .service(admin::update_user),
                ),
        )
        .default_service(web::to(not_found));
}

/// Headers added to every response.
pub fn security_headers() -> DefaultHeaders {
    DefaultHeaders::new()
        .add(("X-Content-Type-Options", "nosniff"))
        .add(("X-Frame-Options", "DENY"))
        .add(("Referrer-Policy", "no-referrer"))
}

fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req: &HttpRequest| {
        let message = match err {
            error::JsonPayloadError::ContentType => {
                "Content-Type must be application/json".to_string()
            }
            other => format!("Invalid JSON payload: {}", other),
        };
        AppError::BadRequest(message).into()
    })
}

fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, _req: &HttpRequest| {
        AppError::BadRequest(format!("Invalid query parameters: {}", err)).into()
    })
}

/// Malformed ids can never match a stored record, so they answer like a missing one.
fn path_config(message: &'static str) -> web::PathConfig {
    web::PathConfig::default()
        .error_handler(move |_err, _req: &HttpRequest| AppError::NotFound(message.into()).into())
}

async fn not_found(req: HttpRequest) -> HttpResponse {
    log::debug!("no route for {} {}", req.method(), req.path());
    HttpResponse::NotFound().json(serde_json::json!({
        "status": "error",
        "message": "Route not found",
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{PasswordHasher, TokenService};
    use crate::state::AppState;
    use crate::store::MemoryStore;
    use actix_web::{http::StatusCode, test, App};
    use chrono::Duration;
    use std::sync::Arc;

    fn state() -> AppState {
        AppState::new(
            Arc::new(MemoryStore::new()),
            TokenService::new("routes_test_secret", Duration::hours(1)),
            PasswordHasher::new(4),
        )
    }

    #[actix_web::test]
    async fn test_unknown_route_is_json_404() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state()))
                .wrap(security_headers())
                .configure(config),
        )
        .await;

        let req = test::TestRequest::get().uri("/nowhere").to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            resp.headers().get("X-Content-Type-Options").unwrap(),
            "nosniff"
        );
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["status"], "error");
        assert_eq!(body["message"], "Route not found");
    }

    #[actix_web::test]
    async fn test_malformed_json_is_400() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state()))
                .configure(config),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/v1/users/login")
            .insert_header(("Content-Type", "application/json"))
            .set_payload("{not json")
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["status"], "error");
        assert!(body["message"]
            .as_str()
            .unwrap()
            .starts_with("Invalid JSON payload"));
    }
}
