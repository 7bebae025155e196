use actix_web::{HttpRequest, HttpResponse, Result, ResponseError, web};

use super::respond;
use crate::middlewares::current_user;
use crate::models::*;
use crate::services::WalletService;

#[utoipa::path(
    get,
    path = "/wallet",
    tag = "wallet",
    params(PaginationParams),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Balance, totals and the latest transactions", body = WalletOverviewResponse),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn get_wallet(
    wallet_service: web::Data<WalletService>,
    req: HttpRequest,
    query: web::Query<PaginationParams>,
) -> Result<HttpResponse> {
    let user = match current_user(&req) {
        Ok(user) => user,
        Err(e) => return Ok(e.error_response()),
    };

    Ok(respond(
        wallet_service
            .get_overview(&user, user.user_id, &query)
            .await,
    ))
}

#[utoipa::path(
    get,
    path = "/wallet/transactions",
    tag = "wallet",
    params(PaginationParams),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Transaction history, newest first"),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn get_transactions(
    wallet_service: web::Data<WalletService>,
    req: HttpRequest,
    query: web::Query<PaginationParams>,
) -> Result<HttpResponse> {
    let user = match current_user(&req) {
        Ok(user) => user,
        Err(e) => return Ok(e.error_response()),
    };

    Ok(respond(
        wallet_service
            .list_transactions(&user, user.user_id, &query)
            .await,
    ))
}

pub fn wallet_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/wallet")
            .route("", web::get().to(get_wallet))
            .route("/transactions", web::get().to(get_transactions)),
    );
}
