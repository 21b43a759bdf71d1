use actix_web::dev::Payload;
use actix_web::{web, Error as ActixError, FromRequest, HttpRequest};
use futures::future::LocalBoxFuture;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use validator::Validate;

use super::{check, trim_strings};
use crate::error::AppError;

/// A request body type with declarative `#[validate(...)]` checks.
pub trait Form: DeserializeOwned + Validate {
    /// Canonicalizes accepted values, e.g. lower-cases emails. Runs only on valid forms.
    fn normalize(&mut self) {}
}

/// Extracts a JSON body that has passed its validation checks.
///
/// String values are trimmed before the body is deserialized into `T`. A non-empty
/// report short-circuits the request with `AppError::ValidationFailed`, so the handler
/// never runs.
#[derive(Debug)]
pub struct Valid<T>(pub T);

impl<T> Valid<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T: Form + 'static> FromRequest for Valid<T> {
    type Error = ActixError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let body = web::Json::<Value>::from_request(req, payload);
        Box::pin(async move {
            let mut fields = match body.await?.into_inner() {
                Value::Object(map) => map,
                _ => Map::new(),
            };
            trim_strings(&mut fields);

            let mut form = serde_json::from_value::<T>(Value::Object(fields))
                .map_err(|e| AppError::BadRequest(format!("Invalid request body: {}", e)))?;
            check(&form).into_result()?;
            form.normalize();

            Ok::<Self, ActixError>(Valid(form))
        })
    }
}
