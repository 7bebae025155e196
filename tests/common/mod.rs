// Helpers shared by the integration test files, each compiled separately
#![allow(dead_code)]

use actix_web::body::MessageBody;
use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, web};
use anyhow::Result;
use chrono::{Duration, Utc};
use course_credits::config::CardConfig;
use course_credits::database::{DbPool, run_migrations};
use course_credits::entities::{CardStatus, course_entity, recharge_card_entity};
use course_credits::handlers;
use course_credits::middlewares::AuthMiddleware;
use course_credits::services::{CourseService, RechargeCardService, WalletService};
use course_credits::utils::{JwtService, Role};
use sea_orm::{ActiveModelTrait, ConnectOptions, Database, Set};
use uuid::Uuid;

pub const SECRET: &str = "integration-secret";

pub struct TestContext {
    pub pool: DbPool,
    pub jwt: JwtService,
}

impl TestContext {
    pub async fn new() -> Result<Self> {
        let mut options = ConnectOptions::new("sqlite::memory:".to_string());
        options
            .max_connections(1)
            .min_connections(1)
            .sqlx_logging(false);
        let pool = Database::connect(options).await?;
        run_migrations(&pool).await?;

        Ok(Self {
            pool,
            jwt: JwtService::new(SECRET, None),
        })
    }

    pub fn token(&self, user_id: Uuid, role: Role) -> String {
        let token = self.jwt.issue(user_id, role, 3600).unwrap();
        format!("Bearer {token}")
    }

    pub fn app(
        &self,
    ) -> App<
        impl ServiceFactory<
            ServiceRequest,
            Config = (),
            Response = ServiceResponse<impl MessageBody + use<>>,
            Error = actix_web::Error,
            InitError = (),
        > + use<>,
    > {
        App::new()
            .wrap(AuthMiddleware::new(self.jwt.clone()))
            .app_data(web::Data::new(WalletService::new(self.pool.clone())))
            .app_data(web::Data::new(RechargeCardService::new(
                self.pool.clone(),
                CardConfig::default(),
            )))
            .app_data(web::Data::new(CourseService::new(self.pool.clone())))
            .configure(handlers::health_config)
            .configure(handlers::api_config)
    }

    pub async fn seed_course(&self, title: &str, price: i64) -> Result<i64> {
        let course = course_entity::ActiveModel {
            title: Set(title.to_string()),
            credit_price: Set(price),
            is_published: Set(true),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&self.pool)
        .await?;
        Ok(course.id)
    }

    pub async fn seed_card(&self, code: &str, amount: i64, expires_in_days: i64) -> Result<i64> {
        let card = recharge_card_entity::ActiveModel {
            code: Set(code.to_string()),
            credit_amount: Set(amount),
            status: Set(CardStatus::Unused),
            expires_at: Set(Utc::now() + Duration::days(expires_in_days)),
            batch_label: Set(None),
            redeemed_by: Set(None),
            redeemed_at: Set(None),
            created_by: Set(None),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&self.pool)
        .await?;
        Ok(card.id)
    }
}
