use crate::entities::{TransactionKind, wallet_transaction_entity as wtx};
use crate::error::{AppError, AppResult};
use crate::models::{
    AdjustBalanceRequest, BalanceChangeResponse, LedgerAuditResponse, PaginatedResponse,
    PaginationParams, TransactionResponse, WalletOverviewResponse, WalletResponse,
};
use crate::services::ledger::{self, MAX_CREDIT_AMOUNT, NewEntry};
use crate::utils::AuthUser;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, TransactionTrait,
};
use uuid::Uuid;

const MAX_REASON_LEN: usize = 255;

#[derive(Clone)]
pub struct WalletService {
    pool: DatabaseConnection,
}

impl WalletService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    /// Current balance and totals; an empty wallet is created on first access.
    pub async fn get_wallet(&self, actor: &AuthUser, user_id: Uuid) -> AppResult<WalletResponse> {
        actor.require_self_or_admin(user_id)?;
        let wallet = ledger::ensure_wallet(&self.pool, user_id).await?;
        Ok(wallet.into())
    }

    /// Transaction history, newest first.
    pub async fn list_transactions(
        &self,
        actor: &AuthUser,
        user_id: Uuid,
        params: &PaginationParams,
    ) -> AppResult<PaginatedResponse<TransactionResponse>> {
        actor.require_self_or_admin(user_id)?;

        let base_query = wtx::Entity::find().filter(wtx::Column::UserId.eq(user_id));
        let total = base_query.clone().count(&self.pool).await?;

        let items = base_query
            .order_by_desc(wtx::Column::Id)
            .limit(params.get_limit())
            .offset(params.get_offset())
            .all(&self.pool)
            .await?;

        Ok(PaginatedResponse::new(
            items.into_iter().map(Into::into).collect(),
            params,
            total,
        ))
    }

    pub async fn get_overview(
        &self,
        actor: &AuthUser,
        user_id: Uuid,
        params: &PaginationParams,
    ) -> AppResult<WalletOverviewResponse> {
        let wallet = self.get_wallet(actor, user_id).await?;
        let transactions = self.list_transactions(actor, user_id, params).await?;
        Ok(WalletOverviewResponse {
            wallet,
            transactions,
        })
    }

    /// Manual correction by an administrator. Positive amounts count as earned,
    /// negative ones as spent and may not overdraw the wallet.
    pub async fn adjust_balance(
        &self,
        actor: &AuthUser,
        user_id: Uuid,
        request: AdjustBalanceRequest,
    ) -> AppResult<BalanceChangeResponse> {
        actor.require_admin()?;

        if request.amount == 0 || request.amount.unsigned_abs() > MAX_CREDIT_AMOUNT as u64 {
            return Err(AppError::ValidationError(format!(
                "Adjustment amount must be non-zero and at most {MAX_CREDIT_AMOUNT} in magnitude"
            )));
        }
        let reason = request.reason.trim();
        if reason.is_empty() || reason.len() > MAX_REASON_LEN {
            return Err(AppError::ValidationError(format!(
                "Reason must be between 1 and {MAX_REASON_LEN} characters"
            )));
        }

        let txn = self.pool.begin().await?;

        let change = if request.amount > 0 {
            ledger::credit(&txn, user_id, request.amount).await?
        } else {
            ledger::debit(&txn, user_id, request.amount.unsigned_abs() as i64).await?
        };

        let entry = ledger::append_entry(
            &txn,
            &change,
            NewEntry {
                kind: TransactionKind::AdminAdjustment,
                amount: request.amount,
                description: Some(reason.to_string()),
                course_id: None,
                card_id: None,
            },
        )
        .await?;

        txn.commit().await?;

        log::info!(
            "Admin {} adjusted wallet of user {} by {} (balance {} -> {})",
            actor.user_id,
            user_id,
            request.amount,
            change.balance_before,
            change.balance_after()
        );

        Ok(BalanceChangeResponse {
            new_balance: change.balance_after(),
            transaction: entry.into(),
        })
    }

    /// Re-walk the wallet's ledger and check both balance invariants.
    pub async fn audit(&self, actor: &AuthUser, user_id: Uuid) -> AppResult<LedgerAuditResponse> {
        actor.require_admin()?;

        let wallet = ledger::find_wallet(&self.pool, user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Wallet not found".to_string()))?;

        let entries = wtx::Entity::find()
            .filter(wtx::Column::WalletId.eq(wallet.id))
            .order_by_asc(wtx::Column::Id)
            .all(&self.pool)
            .await?;

        let mut expected_before = 0;
        let mut first_broken = None;
        for entry in &entries {
            if entry.balance_before != expected_before
                || entry.balance_after != entry.balance_before + entry.amount
            {
                first_broken = Some(entry.id);
                break;
            }
            expected_before = entry.balance_after;
        }
        let chain_consistent = first_broken.is_none() && expected_before == wallet.current_balance;

        if !chain_consistent || !wallet.is_balanced() {
            log::error!(
                "Ledger inconsistency for user {user_id}: chain_ok={chain_consistent}, totals_ok={}",
                wallet.is_balanced()
            );
        }

        Ok(LedgerAuditResponse {
            user_id,
            transaction_count: entries.len() as u64,
            totals_consistent: wallet.is_balanced(),
            chain_consistent,
            first_broken_transaction_id: first_broken,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CardConfig;
    use crate::services::{CourseService, RechargeCardService};
    use crate::test_support::*;
    use sea_orm::sea_query::Expr;

    #[tokio::test]
    async fn test_first_access_creates_empty_wallet() {
        let pool = test_pool().await;
        let svc = WalletService::new(pool.clone());
        let user = student();

        let wallet = svc.get_wallet(&user, user.user_id).await.unwrap();
        assert_eq!(wallet.user_id, user.user_id);
        assert_eq!(wallet.current_balance, 0);
        assert_eq!(wallet.total_earned, 0);
        assert_eq!(wallet.total_spent, 0);

        // idempotent
        svc.get_wallet(&user, user.user_id).await.unwrap();
        let rows = crate::entities::wallet_entity::Entity::find()
            .count(&pool)
            .await
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[tokio::test]
    async fn test_students_only_see_their_own_wallet() {
        let pool = test_pool().await;
        let svc = WalletService::new(pool.clone());
        let (me, other) = (student(), student());

        assert!(matches!(
            svc.get_wallet(&me, other.user_id).await.unwrap_err(),
            AppError::Forbidden
        ));
        assert!(matches!(
            svc.list_transactions(&me, other.user_id, &PaginationParams::default())
                .await
                .unwrap_err(),
            AppError::Forbidden
        ));
        assert!(svc.get_wallet(&admin(), other.user_id).await.is_ok());
    }

    #[tokio::test]
    async fn test_adjustments() {
        let pool = test_pool().await;
        let svc = WalletService::new(pool.clone());
        let admin = admin();
        let user = student();
        let adjust = |amount: i64| AdjustBalanceRequest {
            amount,
            reason: "support ticket".to_string(),
        };

        assert!(matches!(
            svc.adjust_balance(&user, user.user_id, adjust(10))
                .await
                .unwrap_err(),
            AppError::Forbidden
        ));
        for bad in [0, i64::MIN, i64::MAX, MAX_CREDIT_AMOUNT + 1, -MAX_CREDIT_AMOUNT - 1] {
            assert!(matches!(
                svc.adjust_balance(&admin, user.user_id, adjust(bad))
                    .await
                    .unwrap_err(),
                AppError::ValidationError(_)
            ));
        }

        let up = svc
            .adjust_balance(&admin, user.user_id, adjust(80))
            .await
            .unwrap();
        assert_eq!(up.new_balance, 80);
        assert_eq!(up.transaction.kind, TransactionKind::AdminAdjustment);

        let err = svc
            .adjust_balance(&admin, user.user_id, adjust(-100))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InsufficientCredits { shortage: 20, .. }));

        let down = svc
            .adjust_balance(&admin, user.user_id, adjust(-30))
            .await
            .unwrap();
        assert_eq!(down.new_balance, 50);
        assert_eq!(down.transaction.balance_before, 80);

        let wallet = svc.get_wallet(&user, user.user_id).await.unwrap();
        assert_eq!(wallet.total_earned, 80);
        assert_eq!(wallet.total_spent, 30);
    }

    #[tokio::test]
    async fn test_history_is_newest_first_and_chained() {
        let pool = test_pool().await;
        let svc = WalletService::new(pool.clone());
        let cards = RechargeCardService::new(pool.clone(), CardConfig::default());
        let courses = CourseService::new(pool.clone());
        let user = student();

        seed_card(&pool, "CHAINCARD234", 100).await;
        seed_card(&pool, "CHAINCARD567", 60).await;
        let course = seed_course(&pool, "Poetry", 70, true).await;

        cards.redeem(&user, "CHAINCARD234").await.unwrap();
        courses.purchase(&user, course.id).await.unwrap();
        cards.redeem(&user, "CHAINCARD567").await.unwrap();

        let page = svc
            .list_transactions(&user, user.user_id, &PaginationParams::new(Some(1), Some(2)))
            .await
            .unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.total_pages, 2);
        assert_eq!(page.data.len(), 2);
        assert_eq!(page.data[0].kind, TransactionKind::Recharge);
        assert_eq!(page.data[1].kind, TransactionKind::CoursePurchase);

        let all = svc
            .list_transactions(&user, user.user_id, &PaginationParams::default())
            .await
            .unwrap();
        // newest first: each entry starts where the next (older) one ended
        for pair in all.data.windows(2) {
            assert_eq!(pair[0].balance_before, pair[1].balance_after);
            assert!(pair[0].id > pair[1].id);
        }
        for tx in &all.data {
            assert_eq!(tx.balance_after, tx.balance_before + tx.amount);
        }

        let overview = svc
            .get_overview(&user, user.user_id, &PaginationParams::default())
            .await
            .unwrap();
        assert_eq!(overview.wallet.current_balance, 90);
        assert_eq!(overview.transactions.data[0].balance_after, 90);
    }

    #[tokio::test]
    async fn test_page_far_past_the_end_is_empty() {
        let pool = test_pool().await;
        let svc = WalletService::new(pool.clone());
        let user = student();
        fund(&pool, &user, 40).await;

        let page = svc
            .list_transactions(&user, user.user_id, &PaginationParams::new(Some(u64::MAX), Some(100)))
            .await
            .unwrap();
        assert!(page.data.is_empty());
        assert_eq!(page.total, 1);
    }

    #[tokio::test]
    async fn test_audit_detects_tampering() {
        let pool = test_pool().await;
        let svc = WalletService::new(pool.clone());
        let admin = admin();
        let user = student();
        fund(&pool, &user, 100).await;
        fund(&pool, &user, 25).await;

        let audit = svc.audit(&admin, user.user_id).await.unwrap();
        assert!(audit.is_consistent());
        assert_eq!(audit.transaction_count, 2);

        let first = wtx::Entity::find()
            .order_by_asc(wtx::Column::Id)
            .one(&pool)
            .await
            .unwrap()
            .unwrap();
        wtx::Entity::update_many()
            .col_expr(wtx::Column::BalanceAfter, Expr::value(99i64))
            .filter(wtx::Column::Id.eq(first.id))
            .exec(&pool)
            .await
            .unwrap();

        let audit = svc.audit(&admin, user.user_id).await.unwrap();
        assert!(!audit.chain_consistent);
        assert!(audit.totals_consistent);
        assert_eq!(audit.first_broken_transaction_id, Some(first.id));

        assert!(matches!(
            svc.audit(&admin, student().user_id).await.unwrap_err(),
            AppError::NotFound(_)
        ));
        assert!(matches!(
            svc.audit(&user, user.user_id).await.unwrap_err(),
            AppError::Forbidden
        ));
    }
}
