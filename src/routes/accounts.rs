//! Registration and login, shared by both account kinds.
//!
//! The handlers are generic over the profile type and are mounted by
//! `developer::config` and `employer::config` with the concrete profile.

use actix_web::{web, HttpResponse, Responder};
use validator::Validate;

use crate::auth::{verify_password, AuthSettings, LoginForm, RegisterRequest, TokenResponse};
use crate::db::{AccountLookup, Store, StoreError};
use crate::error::AppError;
use crate::models::{AccountProfile, NewAccount};

/// Creates an account of kind `P` and returns a bearer token for it.
///
/// ## Responses:
/// - `201 Created`: `{"access_token": "...", "token_type": "bearer"}`.
/// - `400 Bad Request`: the username or email is already registered.
/// - `422 Unprocessable Entity`: credentials or profile fields failed validation.
pub async fn register<P: AccountProfile>(
    store: web::Data<dyn Store>,
    settings: web::Data<AuthSettings>,
    body: web::Json<RegisterRequest<P>>,
) -> Result<impl Responder, AppError> {
    let RegisterRequest {
        credentials,
        profile,
    } = body.into_inner();
    credentials.validate()?;
    profile.validate()?;

    let store = store.get_ref();
    if P::find(store, AccountLookup::Username(&credentials.username))
        .await?
        .is_some()
    {
        return Err(AppError::Conflict(format!(
            "Username '{}' is already registered",
            credentials.username
        )));
    }
    if P::find(store, AccountLookup::Email(&credentials.email))
        .await?
        .is_some()
    {
        return Err(AppError::Conflict(format!(
            "Email '{}' is already registered",
            credentials.email
        )));
    }

    let password_hash = settings.hash_password(&credentials.password)?;
    let account = P::create(
        store,
        NewAccount {
            username: credentials.username,
            email: credentials.email,
            password_hash,
            profile,
        },
    )
    .await
    .map_err(|e| match e {
        // lost a race with a concurrent registration
        StoreError::Conflict(_) => {
            AppError::Conflict("Username or email is already registered".to_string())
        }
        other => other.into(),
    })?;

    log::info!("Registered {} '{}'", P::KIND, account.username);
    let token = settings.tokens.issue_token(&account.username, P::KIND)?;
    Ok(HttpResponse::Created().json(TokenResponse::bearer(token)))
}

/// OAuth2 password flow: exchanges a form-encoded username and password for a
/// bearer token.
///
/// Unknown usernames and wrong passwords get the same `401` response.
pub async fn login<P: AccountProfile>(
    store: web::Data<dyn Store>,
    settings: web::Data<AuthSettings>,
    form: web::Form<LoginForm>,
) -> Result<impl Responder, AppError> {
    let invalid = || AppError::Unauthorized("Incorrect username or password".to_string());

    let account = P::find(store.get_ref(), AccountLookup::Username(&form.username))
        .await?
        .ok_or_else(|| {
            log::debug!("Login for unknown {} '{}'", P::KIND, form.username);
            invalid()
        })?;

    if !verify_password(&form.password, &account.password_hash)? {
        log::debug!("Wrong password for {} '{}'", P::KIND, account.username);
        return Err(invalid());
    }

    log::info!("{} '{}' logged in", P::KIND, account.username);
    let token = settings.tokens.issue_token(&account.username, P::KIND)?;
    Ok(HttpResponse::Ok().json(TokenResponse::bearer(token)))
}

/// Mounts `POST /register/` and `POST /token` for account kind `P`.
pub fn config<P: AccountProfile>(cfg: &mut web::ServiceConfig) {
    cfg.route("/register/", web::post().to(register::<P>))
        .route("/token", web::post().to(login::<P>));
}
