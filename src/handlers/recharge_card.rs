use actix_web::{HttpRequest, HttpResponse, Result, ResponseError, web};

use super::respond;
use crate::middlewares::current_user;
use crate::models::*;
use crate::services::RechargeCardService;

#[utoipa::path(
    post,
    path = "/cards/redeem",
    tag = "cards",
    request_body = RedeemCardRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Card redeemed", body = RedeemCardResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Card not found"),
        (status = 409, description = "Card already used"),
        (status = 410, description = "Card expired")
    )
)]
pub async fn redeem_card(
    card_service: web::Data<RechargeCardService>,
    req: HttpRequest,
    request: web::Json<RedeemCardRequest>,
) -> Result<HttpResponse> {
    let user = match current_user(&req) {
        Ok(user) => user,
        Err(e) => return Ok(e.error_response()),
    };

    Ok(respond(card_service.redeem(&user, &request.code).await))
}

pub fn recharge_card_config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/cards").route("/redeem", web::post().to(redeem_card)));
}
