use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema, DeriveActiveEnum, EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "String(Some(32))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionKind {
    #[sea_orm(string_value = "recharge")]
    Recharge,
    #[sea_orm(string_value = "course_purchase")]
    CoursePurchase,
    #[sea_orm(string_value = "refund")]
    Refund,
    #[sea_orm(string_value = "admin_adjustment")]
    AdminAdjustment,
}

impl std::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionKind::Recharge => write!(f, "recharge"),
            TransactionKind::CoursePurchase => write!(f, "course_purchase"),
            TransactionKind::Refund => write!(f, "refund"),
            TransactionKind::AdminAdjustment => write!(f, "admin_adjustment"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "wallet_transactions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub wallet_id: i64,
    pub user_id: Uuid,
    pub kind: TransactionKind,
    /// signed: positive credits the wallet, negative debits it
    pub amount: i64,
    pub balance_before: i64,
    pub balance_after: i64,
    pub description: Option<String>,
    pub course_id: Option<i64>,
    pub card_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
