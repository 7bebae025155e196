pub mod admin;
pub mod course;
pub mod recharge_card;
pub mod wallet;

pub use admin::admin_config;
pub use course::course_config;
pub use recharge_card::recharge_card_config;
pub use wallet::wallet_config;

use crate::error::AppResult;
use crate::models::ApiResponse;
use actix_web::{HttpResponse, ResponseError, web};
use serde::Serialize;
use serde_json::json;

/// Wrap a service result in the `{"success": .., "data": ..}` envelope.
pub(crate) fn respond<T: Serialize>(result: AppResult<T>) -> HttpResponse {
    match result {
        Ok(data) => HttpResponse::Ok().json(ApiResponse::success(data)),
        Err(e) => e.error_response(),
    }
}

#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses((status = 200, description = "Service is up"))
)]
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "status": "ok" }))
}

pub fn health_config(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health));
}

/// All `/api/v1` routes.
pub fn api_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .configure(wallet_config)
            .configure(recharge_card_config)
            .configure(course_config)
            .configure(admin_config),
    );
}
