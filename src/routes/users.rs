use crate::{
    auth::{AuthResponse, Identity, LoginRequest, ProfileUpdateRequest, RegisterRequest},
    error::AppError,
    models::{NewUser, Role, UserChanges},
    response::ApiResponse,
    state::AppState,
    store::{UserStore, DUPLICATE_EMAIL},
    validation::Valid,
};
use actix_web::{get, post, put, web, HttpResponse, Responder};

const INVALID_CREDENTIALS: &str = "Invalid email or password";

/// Register a new user
///
/// Creates a `user`-role account and returns it together with an authentication token.
/// A `role` field in the body is ignored.
///
/// ## Responses:
/// - `201 Created`: The new account and its token.
/// - `400 Bad Request`: Validation report, or the email is already registered.
#[post("/register")]
pub async fn register(
    state: web::Data<AppState>,
    form: Valid<RegisterRequest>,
) -> Result<impl Responder, AppError> {
    let form = form.into_inner();

    if state.store.find_credentials(&form.email).await?.is_some() {
        return Err(AppError::Conflict(DUPLICATE_EMAIL.into()));
    }

    let hasher = state.hasher;
    let password = form.password;
    let password_hash = web::block(move || hasher.hash(&password)).await??;

    let user = state
        .store
        .create_user(NewUser {
            name: form.name,
            email: form.email,
            password_hash,
            role: Role::User,
        })
        .await?;

    let token = state.tokens.issue(user.id, user.role)?;
    log::info!("registered user {}", user.id);

    Ok(HttpResponse::Created().json(ApiResponse::success(
        "User registered successfully",
        AuthResponse::new(user, token),
    )))
}

/// Login user
///
/// Unknown email and wrong password produce the same 401 response.
#[post("/login")]
pub async fn login(
    state: web::Data<AppState>,
    form: Valid<LoginRequest>,
) -> Result<impl Responder, AppError> {
    let form = form.into_inner();

    let credentials = match state.store.find_credentials(&form.email).await? {
        Some(credentials) => credentials,
        None => {
            log::debug!("login for unknown email");
            return Err(AppError::Unauthenticated(INVALID_CREDENTIALS.into()));
        }
    };

    let hasher = state.hasher;
    let password = form.password;
    let digest = credentials.password_hash;
    if !web::block(move || hasher.verify(&password, &digest)).await? {
        log::debug!("wrong password for user {}", credentials.user.id);
        return Err(AppError::Unauthenticated(INVALID_CREDENTIALS.into()));
    }

    let user = credentials.user;
    let token = state.tokens.issue(user.id, user.role)?;
    log::info!("user {} logged in", user.id);

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        "Login successful",
        AuthResponse::new(user, token),
    )))
}

#[get("")]
pub async fn get_profile(identity: Identity) -> Result<impl Responder, AppError> {
    Ok(HttpResponse::Ok().json(ApiResponse::success(
        "Profile retrieved successfully",
        identity.0,
    )))
}

/// Update the caller's name and/or email. The password cannot be changed here.
#[put("")]
pub async fn update_profile(
    state: web::Data<AppState>,
    identity: Identity,
    form: Valid<ProfileUpdateRequest>,
) -> Result<impl Responder, AppError> {
    let form = form.into_inner();
    let changes = UserChanges {
        name: form.name,
        email: form.email,
        role: None,
    };

    let user = state
        .store
        .update_user(identity.id, changes)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        "Profile updated successfully",
        user,
    )))
}
