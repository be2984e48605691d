use actix_web::{get, HttpResponse, Responder};
use chrono::Utc;
use serde_json::json;

/// Uptime check for load balancers and container orchestrators.
///
/// Mounted next to the `/developer` and `/employer` groups rather than inside
/// them, so it never passes through `AuthMiddleware` and never touches the store.
#[get("/health")]
pub async fn health() -> impl Responder {
    HttpResponse::Ok().json(json!({
        "status": "ok",
        "timestamp": Utc::now()
    }))
}
