pub mod accounts;
pub mod developer;
pub mod employer;
pub mod health;

use actix_web::{error::Error as ActixError, web, HttpRequest};

use crate::auth::AuthMiddleware;
use crate::error::AppError;
use crate::models::{AccountKind, DeveloperProfile, EmployerProfile};

/// Mounts the health check and both account groups.
///
/// Extractor failures are turned into `AppError` so malformed bodies, queries and
/// path ids produce the same JSON error shape as handler failures.
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _| bad_request(err)))
        .app_data(web::FormConfig::default().error_handler(|err, _| bad_request(err)))
        .app_data(web::QueryConfig::default().error_handler(|err, _| bad_request(err)))
        .app_data(web::PathConfig::default().error_handler(path_not_found))
        .service(health::health)
        .service(
            web::scope(AccountKind::Developer.scope())
                .wrap(AuthMiddleware::<DeveloperProfile>::new())
                .configure(developer::config),
        )
        .service(
            web::scope(AccountKind::Employer.scope())
                .wrap(AuthMiddleware::<EmployerProfile>::new())
                .configure(employer::config),
        );
}

fn bad_request(err: impl std::fmt::Display) -> ActixError {
    AppError::BadRequest(err.to_string()).into()
}

fn path_not_found(err: actix_web::error::PathError, req: &HttpRequest) -> ActixError {
    log::debug!("Unparsable path {}: {}", req.path(), err);
    AppError::NotFound("Resource not found".to_string()).into()
}
