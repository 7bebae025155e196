//! Balance mutation primitives shared by every path that moves credits.
//!
//! All functions take the caller's open transaction. A wallet row is only
//! ever changed through `credit`/`debit`, which update it with a single
//! conditional statement and then read the row back inside the same
//! transaction, so the snapshot used for `balance_before`/`balance_after`
//! is the one this transaction holds the write lock on.

use crate::entities::{TransactionKind, wallet_entity as wallet, wallet_transaction_entity as wtx};
use crate::error::{AppError, AppResult};
use chrono::Utc;
use sea_orm::sea_query::{Expr, OnConflict, Query};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, Set,
};
use uuid::Uuid;

/// Largest single movement of credits (card value, adjustment, purchase).
pub const MAX_CREDIT_AMOUNT: i64 = 1_000_000_000;

/// Ceiling for `current_balance` and `total_earned`; keeps both columns far
/// away from the 64-bit limit of the store.
pub const MAX_WALLET_BALANCE: i64 = 1_000_000_000_000_000;

/// Wallet state right after a mutation.
#[derive(Debug, Clone)]
pub(crate) struct BalanceChange {
    pub wallet: wallet::Model,
    pub balance_before: i64,
}

impl BalanceChange {
    pub fn balance_after(&self) -> i64 {
        self.wallet.current_balance
    }
}

/// Ledger entry to append for a `BalanceChange`.
pub(crate) struct NewEntry {
    pub kind: TransactionKind,
    pub amount: i64,
    pub description: Option<String>,
    pub course_id: Option<i64>,
    pub card_id: Option<i64>,
}

pub(crate) async fn find_wallet<C: ConnectionTrait>(
    db: &C,
    user_id: Uuid,
) -> Result<Option<wallet::Model>, DbErr> {
    wallet::Entity::find()
        .filter(wallet::Column::UserId.eq(user_id))
        .one(db)
        .await
}

/// Fetch the user's wallet, creating an empty one on first access.
pub(crate) async fn ensure_wallet<C: ConnectionTrait>(
    db: &C,
    user_id: Uuid,
) -> Result<wallet::Model, DbErr> {
    if let Some(m) = find_wallet(db, user_id).await? {
        return Ok(m);
    }

    // concurrent first access: whoever loses the insert simply reads the winner's row
    let now = Utc::now();
    let insert = Query::insert()
        .into_table(wallet::Entity)
        .columns([
            wallet::Column::UserId,
            wallet::Column::CurrentBalance,
            wallet::Column::TotalEarned,
            wallet::Column::TotalSpent,
            wallet::Column::CreatedAt,
            wallet::Column::UpdatedAt,
        ])
        .values_panic([
            user_id.into(),
            0i64.into(),
            0i64.into(),
            0i64.into(),
            now.into(),
            now.into(),
        ])
        .on_conflict(
            OnConflict::column(wallet::Column::UserId)
                .do_nothing()
                .to_owned(),
        )
        .to_owned();
    let backend = db.get_database_backend();
    db.execute(backend.build(&insert)).await?;

    if let Some(m) = find_wallet(db, user_id).await? {
        log::info!("Created wallet for user {user_id}");
        return Ok(m);
    }
    Err(DbErr::RecordNotFound(format!("wallet for user {user_id}")))
}

/// Add `amount` (> 0) to the balance and to `total_earned`.
///
/// Refused with a validation error when the wallet would pass
/// `MAX_WALLET_BALANCE`.
pub(crate) async fn credit<C: ConnectionTrait>(
    db: &C,
    user_id: Uuid,
    amount: i64,
) -> AppResult<BalanceChange> {
    if amount <= 0 || amount > MAX_CREDIT_AMOUNT {
        return Err(AppError::InternalError(format!(
            "credit amount out of range: {amount}"
        )));
    }
    ensure_wallet(db, user_id).await?;
    let headroom = MAX_WALLET_BALANCE - amount;

    let result = wallet::Entity::update_many()
        .col_expr(
            wallet::Column::CurrentBalance,
            Expr::col(wallet::Column::CurrentBalance).add(amount),
        )
        .col_expr(
            wallet::Column::TotalEarned,
            Expr::col(wallet::Column::TotalEarned).add(amount),
        )
        .col_expr(wallet::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(wallet::Column::UserId.eq(user_id))
        .filter(wallet::Column::CurrentBalance.lte(headroom))
        .filter(wallet::Column::TotalEarned.lte(headroom))
        .exec(db)
        .await?;

    if result.rows_affected != 1 {
        log::warn!("Credit of {amount} would push wallet of user {user_id} over the limit");
        return Err(AppError::ValidationError(format!(
            "Wallet balance may not exceed {MAX_WALLET_BALANCE} credits"
        )));
    }

    reload(db, user_id, amount).await
}

/// Remove `amount` (> 0) from the balance and add it to `total_spent`.
///
/// The balance check is part of the UPDATE itself, so two concurrent debits
/// can never both pass it against the same stale balance.
pub(crate) async fn debit<C: ConnectionTrait>(
    db: &C,
    user_id: Uuid,
    amount: i64,
) -> AppResult<BalanceChange> {
    if amount <= 0 || amount > MAX_CREDIT_AMOUNT {
        return Err(AppError::InternalError(format!(
            "debit amount out of range: {amount}"
        )));
    }
    ensure_wallet(db, user_id).await?;

    let result = wallet::Entity::update_many()
        .col_expr(
            wallet::Column::CurrentBalance,
            Expr::col(wallet::Column::CurrentBalance).sub(amount),
        )
        .col_expr(
            wallet::Column::TotalSpent,
            Expr::col(wallet::Column::TotalSpent).add(amount),
        )
        .col_expr(wallet::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(wallet::Column::UserId.eq(user_id))
        .filter(wallet::Column::CurrentBalance.gte(amount))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        let available = find_wallet(db, user_id)
            .await?
            .map(|w| w.current_balance)
            .unwrap_or(0);
        return Err(AppError::insufficient_credits(amount, available));
    }

    reload(db, user_id, -amount).await
}

async fn reload<C: ConnectionTrait>(
    db: &C,
    user_id: Uuid,
    delta: i64,
) -> AppResult<BalanceChange> {
    let wallet = find_wallet(db, user_id).await?.ok_or_else(|| {
        AppError::InternalError(format!("wallet for user {user_id} not found after update"))
    })?;
    Ok(BalanceChange {
        balance_before: wallet.current_balance - delta,
        wallet,
    })
}

/// Append the immutable ledger record for a balance change.
pub(crate) async fn append_entry<C: ConnectionTrait>(
    db: &C,
    change: &BalanceChange,
    entry: NewEntry,
) -> Result<wtx::Model, DbErr> {
    debug_assert_eq!(change.balance_before + entry.amount, change.balance_after());

    wtx::ActiveModel {
        wallet_id: Set(change.wallet.id),
        user_id: Set(change.wallet.user_id),
        kind: Set(entry.kind),
        amount: Set(entry.amount),
        balance_before: Set(change.balance_before),
        balance_after: Set(change.balance_after()),
        description: Set(entry.description),
        course_id: Set(entry.course_id),
        card_id: Set(entry.card_id),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_pool;
    use sea_orm::TransactionTrait;

    async fn set_balance<C: ConnectionTrait>(db: &C, user_id: Uuid, balance: i64) {
        wallet::Entity::update_many()
            .col_expr(wallet::Column::CurrentBalance, Expr::value(balance))
            .col_expr(wallet::Column::TotalEarned, Expr::value(balance))
            .filter(wallet::Column::UserId.eq(user_id))
            .exec(db)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_credit_stops_at_wallet_ceiling() {
        let pool = test_pool().await;
        let user_id = Uuid::new_v4();
        let txn = pool.begin().await.unwrap();

        ensure_wallet(&txn, user_id).await.unwrap();
        set_balance(&txn, user_id, MAX_WALLET_BALANCE - 10).await;

        let err = credit(&txn, user_id, 20).await.unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));

        // exactly reaching the ceiling is fine
        let change = credit(&txn, user_id, 10).await.unwrap();
        assert_eq!(change.balance_before, MAX_WALLET_BALANCE - 10);
        assert_eq!(change.balance_after(), MAX_WALLET_BALANCE);
        assert!(change.wallet.is_balanced());
    }

    #[tokio::test]
    async fn test_amounts_above_single_movement_cap_are_refused() {
        let pool = test_pool().await;
        let user_id = Uuid::new_v4();

        assert!(credit(&pool, user_id, MAX_CREDIT_AMOUNT + 1).await.is_err());
        assert!(debit(&pool, user_id, i64::MAX).await.is_err());
        assert_eq!(find_wallet(&pool, user_id).await.unwrap(), None);
    }
}
