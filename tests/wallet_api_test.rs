mod common;

use actix_web::http::StatusCode;
use actix_web::test;
use anyhow::Result;
use common::TestContext;
use course_credits::utils::Role;
use serde_json::{Value, json};
use uuid::Uuid;

#[actix_web::test]
async fn test_health_is_public() -> Result<()> {
    let ctx = TestContext::new().await?;
    let app = test::init_service(ctx.app()).await;

    let resp = test::call_service(&app, test::TestRequest::get().uri("/health").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    Ok(())
}

#[actix_web::test]
async fn test_wallet_requires_token() -> Result<()> {
    let ctx = TestContext::new().await?;
    let app = test::init_service(ctx.app()).await;

    let req = test::TestRequest::get().uri("/api/v1/wallet").to_request();
    let err = test::try_call_service(&app, req).await.err().unwrap();
    assert_eq!(err.as_response_error().status_code(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::get()
        .uri("/api/v1/wallet")
        .insert_header(("Authorization", "Bearer not-a-jwt"))
        .to_request();
    let err = test::try_call_service(&app, req).await.err().unwrap();
    assert_eq!(err.as_response_error().status_code(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[actix_web::test]
async fn test_redeem_then_purchase_flow() -> Result<()> {
    let ctx = TestContext::new().await?;
    let app = test::init_service(ctx.app()).await;
    let user = Uuid::new_v4();
    let auth = ctx.token(user, Role::Student);

    ctx.seed_card("WELCOMEPACK2", 100, 30).await?;
    ctx.seed_card("TOPUPFIFTY23", 50, 30).await?;
    let course_id = ctx.seed_course("Arabic for Beginners", 200).await?;

    // first access creates an empty wallet
    let req = test::TestRequest::get()
        .uri("/api/v1/wallet")
        .insert_header(("Authorization", auth.as_str()))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["wallet"]["current_balance"], 0);

    for code in ["welcome-pack2", "TOPUP-FIFTY-23"] {
        let req = test::TestRequest::post()
            .uri("/api/v1/cards/redeem")
            .insert_header(("Authorization", auth.as_str()))
            .set_json(json!({ "code": code }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    // 150 < 200
    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/courses/{course_id}/purchase"))
        .insert_header(("Authorization", auth.as_str()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::PAYMENT_REQUIRED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"]["code"], "INSUFFICIENT_CREDITS");
    assert_eq!(body["error"]["details"]["shortage"], 50);

    let req = test::TestRequest::get()
        .uri("/api/v1/wallet/transactions?per_page=10")
        .insert_header(("Authorization", auth.as_str()))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let data = body["data"]["data"].as_array().unwrap();
    assert_eq!(data.len(), 2);
    assert_eq!(data[0]["kind"], "RECHARGE");
    assert_eq!(data[0]["balance_before"], 100);
    assert_eq!(data[0]["balance_after"], 150);
    Ok(())
}

#[actix_web::test]
async fn test_redeem_errors_are_reported() -> Result<()> {
    let ctx = TestContext::new().await?;
    let app = test::init_service(ctx.app()).await;
    let auth = ctx.token(Uuid::new_v4(), Role::Student);
    ctx.seed_card("USEDONCE2345", 10, 30).await?;
    ctx.seed_card("LONGGONE2345", 10, -1).await?;

    let redeem = |code: &str| {
        test::TestRequest::post()
            .uri("/api/v1/cards/redeem")
            .insert_header(("Authorization", auth.as_str()))
            .set_json(json!({ "code": code }))
            .to_request()
    };

    let resp = test::call_service(&app, redeem("USEDONCE2345")).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = test::call_service(&app, redeem("USEDONCE2345")).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"]["code"], "CARD_ALREADY_USED");

    let resp = test::call_service(&app, redeem("LONGGONE2345")).await;
    assert_eq!(resp.status(), StatusCode::GONE);

    let resp = test::call_service(&app, redeem("MISSING23456")).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    Ok(())
}
