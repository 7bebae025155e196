use crate::entities::{TransactionKind, wallet_entity, wallet_transaction_entity};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::PaginatedResponse;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WalletResponse {
    pub user_id: Uuid,
    pub current_balance: i64,
    pub total_earned: i64,
    pub total_spent: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<wallet_entity::Model> for WalletResponse {
    fn from(m: wallet_entity::Model) -> Self {
        Self {
            user_id: m.user_id,
            current_balance: m.current_balance,
            total_earned: m.total_earned,
            total_spent: m.total_spent,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TransactionResponse {
    pub id: i64,
    pub kind: TransactionKind,
    pub amount: i64,
    pub balance_before: i64,
    pub balance_after: i64,
    pub description: Option<String>,
    pub course_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl From<wallet_transaction_entity::Model> for TransactionResponse {
    fn from(m: wallet_transaction_entity::Model) -> Self {
        Self {
            id: m.id,
            kind: m.kind,
            amount: m.amount,
            balance_before: m.balance_before,
            balance_after: m.balance_after,
            description: m.description,
            course_id: m.course_id,
            created_at: m.created_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct WalletOverviewResponse {
    pub wallet: WalletResponse,
    #[schema(value_type = Object)]
    pub transactions: PaginatedResponse<TransactionResponse>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AdjustBalanceRequest {
    /// signed, non-zero
    pub amount: i64,
    pub reason: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BalanceChangeResponse {
    pub new_balance: i64,
    pub transaction: TransactionResponse,
}

/// Result of re-walking a wallet's transaction chain.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LedgerAuditResponse {
    pub user_id: Uuid,
    pub transaction_count: u64,
    pub totals_consistent: bool,
    pub chain_consistent: bool,
    /// first transaction id whose balance_before does not follow its predecessor
    pub first_broken_transaction_id: Option<i64>,
}

impl LedgerAuditResponse {
    pub fn is_consistent(&self) -> bool {
        self.totals_consistent && self.chain_consistent
    }
}
