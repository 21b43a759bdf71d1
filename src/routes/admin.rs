//! Administrator views. The whole scope sits behind `AuthGate` and `RoleGate(Admin)`.

use crate::{
    error::AppError,
    models::{AdminUserUpdateRequest, Stats},
    response::ApiResponse,
    state::AppState,
    store::{TodoStore, UserStore},
    validation::Valid,
};
use actix_web::{get, put, web, HttpResponse, Responder};
use uuid::Uuid;

fn user_not_found() -> AppError {
    AppError::NotFound("User not found".into())
}

/// Every todo in the system, each with its owner's id, name and email.
#[get("/todos")]
pub async fn list_all_todos(state: web::Data<AppState>) -> Result<impl Responder, AppError> {
    let todos = state.store.list_all_todos().await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success("Todos retrieved successfully", todos)))
}

#[get("/stats")]
pub async fn stats(state: web::Data<AppState>) -> Result<impl Responder, AppError> {
    let stats = Stats {
        users: state.store.count_users().await?,
        todos: state.store.count_todos(None).await?,
        completed_todos: state.store.count_todos(Some(true)).await?,
    };
    Ok(HttpResponse::Ok().json(ApiResponse::success("Statistics retrieved successfully", stats)))
}

#[get("/users")]
pub async fn list_users(state: web::Data<AppState>) -> Result<impl Responder, AppError> {
    let users = state.store.list_users().await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success("Users retrieved successfully", users)))
}

#[get("/users/{id}")]
pub async fn get_user(
    state: web::Data<AppState>,
    user_id: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    let user = state
        .store
        .find_user(user_id.into_inner())
        .await?
        .ok_or_else(user_not_found)?;
    Ok(HttpResponse::Ok().json(ApiResponse::success("User retrieved successfully", user)))
}

/// Sets name, email and optionally role of any user.
#[put("/users/{id}")]
pub async fn update_user(
    state: web::Data<AppState>,
    user_id: web::Path<Uuid>,
    form: Valid<AdminUserUpdateRequest>,
) -> Result<impl Responder, AppError> {
    let user = state
        .store
        .update_user(user_id.into_inner(), form.into_inner().into())
        .await?
        .ok_or_else(user_not_found)?;
    Ok(HttpResponse::Ok().json(ApiResponse::success("User updated successfully", user)))
}
