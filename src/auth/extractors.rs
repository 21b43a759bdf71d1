use actix_web::dev::Payload;
use actix_web::{Error as ActixError, FromRequest, HttpMessage, HttpRequest};
use std::future::{ready, Ready};
use std::ops::Deref;

use crate::error::AppError;
use crate::models::User;

/// The authenticated, password-stripped user of the current request.
///
/// `AuthGate` inserts it into the request extensions; handlers on protected scopes take
/// it as an argument. Extraction fails with `AppError::Unauthenticated` when the gate did
/// not run.
#[derive(Debug, Clone, PartialEq)]
pub struct Identity(pub User);

impl Deref for Identity {
    type Target = User;

    fn deref(&self) -> &User {
        &self.0
    }
}

impl FromRequest for Identity {
    type Error = ActixError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        match req.extensions().get::<Identity>().cloned() {
            Some(identity) => ready(Ok(identity)),
            None => {
                let err = AppError::Unauthenticated("Authentication required".to_string());
                ready(Err(err.into()))
            }
        }
    }
}
