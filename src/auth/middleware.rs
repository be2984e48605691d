use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::{HeaderMap, AUTHORIZATION},
    web, Error, HttpMessage,
};
use futures::future::{ready, LocalBoxFuture, Ready};
use std::marker::PhantomData;
use std::rc::Rc;

use crate::auth::AuthSettings;
use crate::db::{AccountLookup, Store};
use crate::error::AppError;
use crate::models::{Account, AccountProfile};

/// Paths inside each account scope that are reachable without a token.
const PUBLIC_PATHS: [&str; 2] = ["/register/", "/token"];

/// Resolves the bearer token of every request in an account scope to an
/// `Account<P>` and stores it in the request extensions.
///
/// Any failure along the way (missing header, bad token, wrong account kind,
/// unknown username, failed lookup) is answered with the same `Unauthorized`
/// response without reaching the wrapped service.
pub struct AuthMiddleware<P> {
    _kind: PhantomData<fn() -> P>,
}

impl<P> AuthMiddleware<P> {
    pub fn new() -> Self {
        Self { _kind: PhantomData }
    }
}

impl<P> Default for AuthMiddleware<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S, B, P> Transform<S, ServiceRequest> for AuthMiddleware<P>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
    P: AccountProfile,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = AuthMiddlewareService<S, P>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService {
            service: Rc::new(service),
            _kind: PhantomData,
        }))
    }
}

pub struct AuthMiddlewareService<S, P> {
    service: Rc<S>,
    _kind: PhantomData<fn() -> P>,
}

impl<S, B, P> Service<ServiceRequest> for AuthMiddlewareService<S, P>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
    P: AccountProfile,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        if is_public::<P>(req.path()) {
            let fut = self.service.call(req);
            return Box::pin(async move { fut.await.map(ServiceResponse::map_into_left_body) });
        }

        let service = Rc::clone(&self.service);
        Box::pin(async move {
            match authenticate::<P>(&req).await {
                Ok(account) => {
                    req.extensions_mut().insert(account);
                    service
                        .call(req)
                        .await
                        .map(ServiceResponse::map_into_left_body)
                }
                Err(err) => Ok(req.error_response(err).map_into_right_body()),
            }
        })
    }
}

fn is_public<P: AccountProfile>(path: &str) -> bool {
    let scope = P::KIND.scope();
    path.strip_prefix(scope)
        .map_or(false, |rest| PUBLIC_PATHS.contains(&rest))
}

/// Extracts the token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

fn credentials_error() -> AppError {
    AppError::Unauthorized("Could not validate credentials".into())
}

async fn authenticate<P: AccountProfile>(req: &ServiceRequest) -> Result<Account<P>, AppError> {
    let store = req
        .app_data::<web::Data<dyn Store>>()
        .cloned()
        .ok_or_else(|| AppError::InternalServerError("Store is not configured".into()))?;
    let settings = req
        .app_data::<web::Data<AuthSettings>>()
        .cloned()
        .ok_or_else(|| AppError::InternalServerError("Auth settings are not configured".into()))?;

    let token = bearer_token(req.headers()).ok_or_else(|| {
        log::debug!("{} request without bearer token", P::KIND);
        credentials_error()
    })?;

    let claims = settings.tokens.decode_token(token, P::KIND).map_err(|e| {
        log::debug!("Rejected {} token: {}", P::KIND, e);
        credentials_error()
    })?;

    match P::find(store.get_ref(), AccountLookup::Username(&claims.sub)).await {
        Ok(Some(account)) => Ok(account),
        Ok(None) => {
            log::debug!("Token subject {} has no {} account", claims.sub, P::KIND);
            Err(credentials_error())
        }
        Err(e) => {
            log::warn!("Account lookup failed during authentication: {}", e);
            Err(credentials_error())
        }
    }
}
