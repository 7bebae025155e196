use crate::entities::{CardStatus, recharge_card_entity};
use crate::utils::format_card_code;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use super::TransactionResponse;

#[derive(Debug, Deserialize, ToSchema)]
pub struct RedeemCardRequest {
    pub code: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RedeemCardResponse {
    pub card: RechargeCardResponse,
    pub new_balance: i64,
    pub transaction: TransactionResponse,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct GenerateCardsRequest {
    pub quantity: u32,
    pub credit_amount: i64,
    pub expires_in_days: i64,
    #[serde(default)]
    pub batch_label: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct GenerateCardsResponse {
    pub batch_label: Option<String>,
    pub credit_amount: i64,
    pub expires_at: DateTime<Utc>,
    /// formatted as XXXX-XXXX-XXXX
    pub codes: Vec<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RechargeCardResponse {
    pub id: i64,
    pub code: String,
    pub credit_amount: i64,
    pub status: CardStatus,
    pub expires_at: DateTime<Utc>,
    pub batch_label: Option<String>,
    pub redeemed_by: Option<Uuid>,
    pub redeemed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<recharge_card_entity::Model> for RechargeCardResponse {
    fn from(m: recharge_card_entity::Model) -> Self {
        Self {
            id: m.id,
            code: format_card_code(&m.code),
            credit_amount: m.credit_amount,
            status: m.status,
            expires_at: m.expires_at,
            batch_label: m.batch_label,
            redeemed_by: m.redeemed_by,
            redeemed_at: m.redeemed_at,
            created_at: m.created_at,
        }
    }
}

#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CardQuery {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
    pub status: Option<CardStatus>,
    pub batch_label: Option<String>,
}
