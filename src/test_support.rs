//! Shared fixtures for service tests: an in-memory SQLite store with the real
//! migrations applied.

use crate::database::{DbPool, run_migrations};
use crate::entities::{CardStatus, course_entity as courses, recharge_card_entity as cards};
use crate::models::AdjustBalanceRequest;
use crate::services::WalletService;
use crate::utils::{AuthUser, Role};
use chrono::{DateTime, Duration, Utc};
use sea_orm::{ActiveModelTrait, ConnectOptions, Database, Set};
use uuid::Uuid;

pub async fn test_pool() -> DbPool {
    let mut options = ConnectOptions::new("sqlite::memory:".to_string());
    // a single connection, otherwise every connection sees its own empty database
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);
    let pool = Database::connect(options).await.unwrap();
    run_migrations(&pool).await.unwrap();
    pool
}

pub fn student() -> AuthUser {
    AuthUser {
        user_id: Uuid::new_v4(),
        role: Role::Student,
    }
}

pub fn admin() -> AuthUser {
    AuthUser {
        user_id: Uuid::new_v4(),
        role: Role::Admin,
    }
}

pub async fn seed_course(pool: &DbPool, title: &str, price: i64, published: bool) -> courses::Model {
    courses::ActiveModel {
        title: Set(title.to_string()),
        credit_price: Set(price),
        is_published: Set(published),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(pool)
    .await
    .unwrap()
}

pub async fn seed_card_expiring(
    pool: &DbPool,
    code: &str,
    amount: i64,
    expires_at: DateTime<Utc>,
) -> cards::Model {
    cards::ActiveModel {
        code: Set(code.to_string()),
        credit_amount: Set(amount),
        status: Set(CardStatus::Unused),
        expires_at: Set(expires_at),
        batch_label: Set(None),
        redeemed_by: Set(None),
        redeemed_at: Set(None),
        created_by: Set(None),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(pool)
    .await
    .unwrap()
}

pub async fn seed_card(pool: &DbPool, code: &str, amount: i64) -> cards::Model {
    seed_card_expiring(pool, code, amount, Utc::now() + Duration::days(30)).await
}

/// Put `amount` credits into the user's wallet through an admin adjustment.
pub async fn fund(pool: &DbPool, user: &AuthUser, amount: i64) {
    WalletService::new(pool.clone())
        .adjust_balance(
            &admin(),
            user.user_id,
            AdjustBalanceRequest {
                amount,
                reason: "test funding".to_string(),
            },
        )
        .await
        .unwrap();
}
