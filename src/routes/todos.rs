use crate::{
    auth::Identity,
    error::AppError,
    models::{DateRangeQuery, TodoFilter, TodoListQuery, TodoRequest},
    response::ApiResponse,
    state::AppState,
    store::TodoStore,
    validation::{rules::parse_calendar_date, Valid},
};
use actix_web::{delete, get, patch, post, put, web, HttpResponse, Responder};
use uuid::Uuid;

fn todo_not_found() -> AppError {
    AppError::NotFound("Todo not found".into())
}

/// Lists the caller's todos.
///
/// ## Query Parameters:
/// - `completed` (optional): `true` for completed todos, any other value for open ones.
/// - `sortBy` (optional): `dueDate` (default), `createdAt`, `updatedAt`, `title` or `completed`.
///   Ties are broken by creation date, newest first.
///
/// ## Responses:
/// - `200 OK`: The envelope with a JSON array of `Todo` objects.
/// - `400 Bad Request`: If `sortBy` names an unknown field.
/// - `401 Unauthorized`: If the request lacks a valid authentication token.
#[get("")]
pub async fn list_todos(
    state: web::Data<AppState>,
    identity: Identity,
    query: web::Query<TodoListQuery>,
) -> Result<impl Responder, AppError> {
    let todos = state
        .store
        .list_todos(identity.id, query.into_inner().into_filter())
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success("Todos retrieved successfully", todos)))
}

#[post("")]
pub async fn create_todo(
    state: web::Data<AppState>,
    identity: Identity,
    form: Valid<TodoRequest>,
) -> Result<impl Responder, AppError> {
    let todo = state
        .store
        .create_todo(form.into_inner().into_new_todo(identity.id))
        .await?;

    Ok(HttpResponse::Created().json(ApiResponse::success("Todo created successfully", todo)))
}

#[get("/completed")]
pub async fn list_completed_todos(
    state: web::Data<AppState>,
    identity: Identity,
) -> Result<impl Responder, AppError> {
    let filter = TodoFilter {
        completed: Some(true),
        ..Default::default()
    };
    let todos = state.store.list_todos(identity.id, filter).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        "Completed todos retrieved successfully",
        todos,
    )))
}

/// Lists the caller's todos due within `[startDate, endDate]`, earliest first.
#[get("/date-range")]
pub async fn list_todos_by_date_range(
    state: web::Data<AppState>,
    identity: Identity,
    query: web::Query<DateRangeQuery>,
) -> Result<impl Responder, AppError> {
    let start = query.start_date.as_deref().and_then(parse_calendar_date);
    let end = query.end_date.as_deref().and_then(parse_calendar_date);

    let (start, end) = match (start, end) {
        (Some(start), Some(end)) => (start, end),
        _ => {
            return Err(AppError::BadRequest(
                "startDate and endDate must be valid ISO 8601 dates".into(),
            ))
        }
    };

    let todos = state
        .store
        .list_todos_due_between(identity.id, start, end)
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success("Todos retrieved successfully", todos)))
}

#[get("/{id}")]
pub async fn get_todo(
    state: web::Data<AppState>,
    identity: Identity,
    todo_id: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    let todo = state
        .store
        .find_todo(identity.id, todo_id.into_inner())
        .await?
        .ok_or_else(todo_not_found)?;

    Ok(HttpResponse::Ok().json(ApiResponse::success("Todo retrieved successfully", todo)))
}

/// Updates a todo the caller owns. Empty strings leave the stored values untouched.
#[put("/{id}")]
pub async fn update_todo(
    state: web::Data<AppState>,
    identity: Identity,
    todo_id: web::Path<Uuid>,
    form: Valid<TodoRequest>,
) -> Result<impl Responder, AppError> {
    let todo = state
        .store
        .update_todo(
            identity.id,
            todo_id.into_inner(),
            form.into_inner().into_changes(),
        )
        .await?
        .ok_or_else(todo_not_found)?;

    Ok(HttpResponse::Ok().json(ApiResponse::success("Todo updated successfully", todo)))
}

#[delete("/{id}")]
pub async fn delete_todo(
    state: web::Data<AppState>,
    identity: Identity,
    todo_id: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    if !state
        .store
        .delete_todo(identity.id, todo_id.into_inner())
        .await?
    {
        return Err(todo_not_found());
    }

    Ok(HttpResponse::Ok().json(ApiResponse::message("Todo deleted successfully")))
}

#[patch("/{id}/toggle")]
pub async fn toggle_todo(
    state: web::Data<AppState>,
    identity: Identity,
    todo_id: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    let todo = state
        .store
        .toggle_todo(identity.id, todo_id.into_inner())
        .await?
        .ok_or_else(todo_not_found)?;

    Ok(HttpResponse::Ok().json(ApiResponse::success("Todo status updated successfully", todo)))
}
