//! Request gates for protected scopes.
//!
//! [`AuthGate`] authenticates the bearer token and attaches the resolved [`Identity`] to
//! the request extensions. [`RoleGate`] then authorizes that identity against a role and
//! must be wrapped so that it runs after the auth gate:
//!
//! ```ignore
//! web::scope("/admin")
//!     .wrap(RoleGate::new(Role::Admin))
//!     .wrap(AuthGate) // registered last, runs first
//! ```

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::{HeaderMap, AUTHORIZATION},
    web, Error, HttpMessage,
};
use futures::future::{ready, LocalBoxFuture, Ready};
use std::rc::Rc;

use crate::auth::extractors::Identity;
use crate::auth::token::TokenService;
use crate::error::AppError;
use crate::models::Role;
use crate::state::AppState;
use crate::store::UserStore;

/// Returns the token of an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Resolves the identity behind the request's bearer token.
///
/// Every failure is `Unauthenticated`; expired and forged tokens get the same message.
pub async fn authenticate<S>(
    headers: &HeaderMap,
    tokens: &TokenService,
    store: &S,
) -> Result<Identity, AppError>
where
    S: UserStore + ?Sized,
{
    let token = bearer_token(headers)
        .ok_or_else(|| AppError::Unauthenticated("No token provided".into()))?;

    let claims = tokens.verify(token).map_err(|e| {
        log::debug!("rejected bearer token: {}", e);
        AppError::Unauthenticated("Invalid token".into())
    })?;

    match store.find_user(claims.sub).await? {
        Some(user) => Ok(Identity(user)),
        None => {
            log::debug!("token subject {} no longer exists", claims.sub);
            Err(AppError::Unauthenticated("User not found".into()))
        }
    }
}

/// Fails with `Forbidden` unless the identity holds `required`.
pub fn authorize(identity: &Identity, required: Role) -> Result<(), AppError> {
    if identity.role == required {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!(
            "Access denied. {} role required",
            required
        )))
    }
}

fn app_state(req: &ServiceRequest) -> Result<web::Data<AppState>, AppError> {
    req.app_data::<web::Data<AppState>>()
        .cloned()
        .ok_or_else(|| AppError::Internal("application state is not registered".into()))
}

pub struct AuthGate;

impl<S, B> Transform<S, ServiceRequest> for AuthGate
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = AuthGateService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthGateService {
            service: Rc::new(service),
        }))
    }
}

pub struct AuthGateService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for AuthGateService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);

        Box::pin(async move {
            let state = app_state(&req)?;
            let identity = authenticate(req.headers(), &state.tokens, state.store.as_ref()).await?;
            req.extensions_mut().insert(identity);
            service.call(req).await
        })
    }
}

pub struct RoleGate {
    required: Role,
}

impl RoleGate {
    pub fn new(required: Role) -> Self {
        Self { required }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RoleGate
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = RoleGateService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RoleGateService {
            service,
            required: self.required,
        }))
    }
}

pub struct RoleGateService<S> {
    service: S,
    required: Role,
}

impl<S, B> Service<ServiceRequest> for RoleGateService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let verdict = match req.extensions().get::<Identity>() {
            Some(identity) => authorize(identity, self.required),
            None => Err(AppError::Unauthenticated(
                "Authentication required".into(),
            )),
        };

        match verdict {
            Ok(()) => Box::pin(self.service.call(req)),
            Err(app_err) => {
                log::debug!("{} {} refused: {}", req.method(), req.path(), app_err);
                Box::pin(async move { Err(app_err.into()) })
            }
        }
    }
}
