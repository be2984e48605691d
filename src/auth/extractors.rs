use actix_web::dev::Payload;
use actix_web::{Error as ActixError, FromRequest, HttpMessage, HttpRequest};
use std::future::{ready, Ready};
use std::ops::Deref;

use crate::error::AppError;
use crate::models::{Account, AccountProfile, DeveloperProfile, EmployerProfile};

/// The account resolved by `AuthMiddleware<P>` for the current request.
///
/// Only usable on routes inside a scope wrapped by the matching middleware. If the
/// account is missing from the request extensions the extractor fails with
/// `AppError::Unauthorized`.
#[derive(Debug, Clone)]
pub struct Authenticated<P>(pub Account<P>);

pub type CurrentDeveloper = Authenticated<DeveloperProfile>;
pub type CurrentEmployer = Authenticated<EmployerProfile>;

impl<P> Authenticated<P> {
    pub fn into_inner(self) -> Account<P> {
        self.0
    }
}

impl<P> Deref for Authenticated<P> {
    type Target = Account<P>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<P: AccountProfile> FromRequest for Authenticated<P> {
    type Error = ActixError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        match req.extensions().get::<Account<P>>().cloned() {
            Some(account) => ready(Ok(Authenticated(account))),
            None => {
                let err = AppError::Unauthorized("Could not validate credentials".to_string());
                ready(Err(err.into()))
            }
        }
    }
}
