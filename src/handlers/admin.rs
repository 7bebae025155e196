use actix_web::{HttpRequest, HttpResponse, Result, ResponseError, web};
use uuid::Uuid;

use super::respond;
use crate::middlewares::current_user;
use crate::models::*;
use crate::services::{CourseService, RechargeCardService, WalletService};

#[utoipa::path(
    post,
    path = "/admin/cards",
    tag = "admin",
    request_body = GenerateCardsRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Cards generated", body = GenerateCardsResponse),
        (status = 400, description = "Invalid quantity, amount or expiry"),
        (status = 403, description = "Caller is not an admin")
    )
)]
pub async fn generate_cards(
    card_service: web::Data<RechargeCardService>,
    req: HttpRequest,
    request: web::Json<GenerateCardsRequest>,
) -> Result<HttpResponse> {
    let user = match current_user(&req) {
        Ok(user) => user,
        Err(e) => return Ok(e.error_response()),
    };

    Ok(respond(
        card_service
            .generate_cards(&user, request.into_inner())
            .await,
    ))
}

#[utoipa::path(
    get,
    path = "/admin/cards",
    tag = "admin",
    params(CardQuery),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Recharge cards, newest first"),
        (status = 403, description = "Caller is not an admin")
    )
)]
pub async fn list_cards(
    card_service: web::Data<RechargeCardService>,
    req: HttpRequest,
    query: web::Query<CardQuery>,
) -> Result<HttpResponse> {
    let user = match current_user(&req) {
        Ok(user) => user,
        Err(e) => return Ok(e.error_response()),
    };

    Ok(respond(card_service.list_cards(&user, &query).await))
}

#[utoipa::path(
    get,
    path = "/admin/wallets/{user_id}",
    tag = "admin",
    params(
        ("user_id" = Uuid, Path, description = "Wallet owner"),
        PaginationParams
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Wallet of any user", body = WalletOverviewResponse),
        (status = 403, description = "Caller is not an admin")
    )
)]
pub async fn get_user_wallet(
    wallet_service: web::Data<WalletService>,
    req: HttpRequest,
    path: web::Path<Uuid>,
    query: web::Query<PaginationParams>,
) -> Result<HttpResponse> {
    let user = match current_user(&req) {
        Ok(user) => user,
        Err(e) => return Ok(e.error_response()),
    };
    if let Err(e) = user.require_admin() {
        return Ok(e.error_response());
    }

    Ok(respond(
        wallet_service
            .get_overview(&user, path.into_inner(), &query)
            .await,
    ))
}

#[utoipa::path(
    get,
    path = "/admin/wallets/{user_id}/audit",
    tag = "admin",
    params(
        ("user_id" = Uuid, Path, description = "Wallet owner")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Ledger consistency report", body = LedgerAuditResponse),
        (status = 403, description = "Caller is not an admin"),
        (status = 404, description = "Wallet not found")
    )
)]
pub async fn audit_wallet(
    wallet_service: web::Data<WalletService>,
    req: HttpRequest,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let user = match current_user(&req) {
        Ok(user) => user,
        Err(e) => return Ok(e.error_response()),
    };

    Ok(respond(wallet_service.audit(&user, path.into_inner()).await))
}

#[utoipa::path(
    post,
    path = "/admin/wallets/{user_id}/adjust",
    tag = "admin",
    params(
        ("user_id" = Uuid, Path, description = "Wallet owner")
    ),
    request_body = AdjustBalanceRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Balance adjusted", body = BalanceChangeResponse),
        (status = 402, description = "Adjustment would overdraw the wallet"),
        (status = 403, description = "Caller is not an admin")
    )
)]
pub async fn adjust_wallet(
    wallet_service: web::Data<WalletService>,
    req: HttpRequest,
    path: web::Path<Uuid>,
    request: web::Json<AdjustBalanceRequest>,
) -> Result<HttpResponse> {
    let user = match current_user(&req) {
        Ok(user) => user,
        Err(e) => return Ok(e.error_response()),
    };

    Ok(respond(
        wallet_service
            .adjust_balance(&user, path.into_inner(), request.into_inner())
            .await,
    ))
}

#[utoipa::path(
    post,
    path = "/admin/enrollments/refund",
    tag = "admin",
    request_body = RefundEnrollmentRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Enrollment revoked and credits returned", body = RefundEnrollmentResponse),
        (status = 403, description = "Caller is not an admin"),
        (status = 404, description = "Enrollment not found")
    )
)]
pub async fn refund_enrollment(
    course_service: web::Data<CourseService>,
    req: HttpRequest,
    request: web::Json<RefundEnrollmentRequest>,
) -> Result<HttpResponse> {
    let user = match current_user(&req) {
        Ok(user) => user,
        Err(e) => return Ok(e.error_response()),
    };

    Ok(respond(
        course_service.refund(&user, request.into_inner()).await,
    ))
}

pub fn admin_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/admin")
            .route("/cards", web::post().to(generate_cards))
            .route("/cards", web::get().to(list_cards))
            .route("/wallets/{user_id}", web::get().to(get_user_wallet))
            .route("/wallets/{user_id}/audit", web::get().to(audit_wallet))
            .route("/wallets/{user_id}/adjust", web::post().to(adjust_wallet))
            .route("/enrollments/refund", web::post().to(refund_enrollment)),
    );
}
