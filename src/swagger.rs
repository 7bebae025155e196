use actix_web::web;
use utoipa::OpenApi;
use utoipa::{
    Modify,
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use crate::entities::{CardStatus, TransactionKind};
use crate::handlers;
use crate::models::*;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            )
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health,
        handlers::wallet::get_wallet,
        handlers::wallet::get_transactions,
        handlers::recharge_card::redeem_card,
        handlers::course::list_courses,
        handlers::course::purchase_course,
        handlers::course::list_enrollments,
        handlers::admin::generate_cards,
        handlers::admin::list_cards,
        handlers::admin::get_user_wallet,
        handlers::admin::audit_wallet,
        handlers::admin::adjust_wallet,
        handlers::admin::refund_enrollment,
    ),
    components(
        schemas(
            ApiError,
            WalletResponse,
            WalletOverviewResponse,
            TransactionResponse,
            TransactionKind,
            AdjustBalanceRequest,
            BalanceChangeResponse,
            LedgerAuditResponse,
            RedeemCardRequest,
            RedeemCardResponse,
            RechargeCardResponse,
            GenerateCardsRequest,
            GenerateCardsResponse,
            CardStatus,
            CourseResponse,
            EnrollmentResponse,
            PurchaseCourseResponse,
            RefundEnrollmentRequest,
            RefundEnrollmentResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "wallet", description = "Credit wallet API"),
        (name = "cards", description = "Recharge card API"),
        (name = "courses", description = "Course purchase API"),
        (name = "admin", description = "Administrative API"),
        (name = "health", description = "Liveness check"),
    ),
    info(
        title = "Course Credits API",
        version = "0.1.0",
        description = "Credit wallet ledger for the course platform"
    ),
    servers(
        (url = "/api/v1", description = "Local server")
    )
)]
pub struct ApiDoc;

pub fn swagger_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
    )
    .route(
        "/swagger-ui",
        web::get().to(|| async {
            actix_web::HttpResponse::Found()
                .append_header(("Location", "/swagger-ui/"))
                .finish()
        }),
    );
}
