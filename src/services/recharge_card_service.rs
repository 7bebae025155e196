use crate::config::CardConfig;
use crate::entities::{CardStatus, TransactionKind, recharge_card_entity as cards};
use crate::error::{AppError, AppResult};
use crate::models::{
    CardQuery, GenerateCardsRequest, GenerateCardsResponse, PaginatedResponse, PaginationParams,
    RechargeCardResponse, RedeemCardResponse,
};
use crate::services::ledger::{self, MAX_CREDIT_AMOUNT, NewEntry};
use crate::utils::{AuthUser, format_card_code, generate_card_codes, normalize_card_code};
use chrono::{DateTime, Duration, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};
use std::collections::HashSet;
use uuid::Uuid;

const MAX_BATCH_LABEL_LEN: usize = 64;
const MIN_CODE_LEN: usize = 8;
const MAX_CODE_LEN: usize = 32;

#[derive(Clone)]
pub struct RechargeCardService {
    pool: DatabaseConnection,
    config: CardConfig,
}

impl RechargeCardService {
    pub fn new(pool: DatabaseConnection, mut config: CardConfig) -> Self {
        config.code_length = config.code_length.clamp(MIN_CODE_LEN, MAX_CODE_LEN);
        Self { pool, config }
    }

    /// Redeem a recharge card into the caller's own wallet.
    ///
    /// The card's UNUSED -> USED transition is a conditional update; of two
    /// concurrent redemptions only one matches a row, the other gets
    /// `CardAlreadyUsed`. Card, wallet and ledger writes share one transaction.
    pub async fn redeem(&self, actor: &AuthUser, raw_code: &str) -> AppResult<RedeemCardResponse> {
        let code = normalize_card_code(raw_code);
        if code.is_empty() || code.len() > MAX_CODE_LEN {
            return Err(AppError::ValidationError("Invalid card code".to_string()));
        }
        let user_id = actor.user_id;

        let txn = self.pool.begin().await?;

        let card = cards::Entity::find()
            .filter(cards::Column::Code.eq(code.as_str()))
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound("Recharge card not found".to_string()))?;

        match card.status {
            CardStatus::Used => {
                log::warn!("User {user_id} tried to redeem used card #{}", card.id);
                return Err(AppError::CardAlreadyUsed);
            }
            CardStatus::Expired => return Err(AppError::CardExpired),
            CardStatus::Unused => {}
        }

        let now = Utc::now();
        if card.is_expired_at(now) {
            // remember the expiry; the balance is untouched
            cards::Entity::update_many()
                .col_expr(cards::Column::Status, Expr::value(CardStatus::Expired))
                .filter(cards::Column::Id.eq(card.id))
                .filter(cards::Column::Status.eq(CardStatus::Unused))
                .exec(&txn)
                .await?;
            txn.commit().await?;
            log::warn!("User {user_id} tried to redeem expired card #{}", card.id);
            return Err(AppError::CardExpired);
        }

        claim_card(&txn, card.id, user_id, now).await?;

        let change = ledger::credit(&txn, user_id, card.credit_amount).await?;
        let entry = ledger::append_entry(
            &txn,
            &change,
            NewEntry {
                kind: TransactionKind::Recharge,
                amount: card.credit_amount,
                description: Some(format!("Recharge card {}", format_card_code(&card.code))),
                course_id: None,
                card_id: Some(card.id),
            },
        )
        .await?;

        txn.commit().await?;

        log::info!(
            "User {} redeemed card #{} for {} credits (balance {} -> {})",
            user_id,
            card.id,
            card.credit_amount,
            change.balance_before,
            change.balance_after()
        );

        let mut card = card;
        card.status = CardStatus::Used;
        card.redeemed_by = Some(user_id);
        card.redeemed_at = Some(now);

        Ok(RedeemCardResponse {
            card: card.into(),
            new_balance: change.balance_after(),
            transaction: entry.into(),
        })
    }

    /// Generate a batch of recharge cards (admin).
    pub async fn generate_cards(
        &self,
        actor: &AuthUser,
        request: GenerateCardsRequest,
    ) -> AppResult<GenerateCardsResponse> {
        actor.require_admin()?;

        if request.quantity == 0 || request.quantity > self.config.max_batch_size {
            return Err(AppError::ValidationError(format!(
                "Quantity must be between 1 and {}",
                self.config.max_batch_size
            )));
        }
        if request.credit_amount <= 0 || request.credit_amount > MAX_CREDIT_AMOUNT {
            return Err(AppError::ValidationError(format!(
                "Credit amount must be between 1 and {MAX_CREDIT_AMOUNT}"
            )));
        }
        if request.expires_in_days < 1 || request.expires_in_days > self.config.max_expiry_days {
            return Err(AppError::ValidationError(format!(
                "Expiry must be between 1 and {} days",
                self.config.max_expiry_days
            )));
        }
        let batch_label = request
            .batch_label
            .as_deref()
            .map(str::trim)
            .filter(|label| !label.is_empty())
            .map(str::to_string);
        if batch_label
            .as_ref()
            .is_some_and(|label| label.len() > MAX_BATCH_LABEL_LEN)
        {
            return Err(AppError::ValidationError(format!(
                "Batch label must be at most {MAX_BATCH_LABEL_LEN} characters"
            )));
        }

        let now = Utc::now();
        let expires_at = now + Duration::days(request.expires_in_days);
        let quantity = request.quantity as usize;

        let txn = self.pool.begin().await?;

        // draw until we have enough codes that exist neither in this batch nor in the store
        let mut taken: HashSet<String> = HashSet::new();
        let mut codes: Vec<String> = Vec::with_capacity(quantity);
        while codes.len() < quantity {
            let candidates =
                generate_card_codes(quantity - codes.len(), self.config.code_length, &taken);
            let clashes: HashSet<String> = cards::Entity::find()
                .filter(cards::Column::Code.is_in(candidates.clone()))
                .all(&txn)
                .await?
                .into_iter()
                .map(|m| m.code)
                .collect();
            for code in candidates {
                taken.insert(code.clone());
                if !clashes.contains(&code) {
                    codes.push(code);
                }
            }
        }

        let models = codes.iter().map(|code| cards::ActiveModel {
            code: Set(code.clone()),
            credit_amount: Set(request.credit_amount),
            status: Set(CardStatus::Unused),
            expires_at: Set(expires_at),
            batch_label: Set(batch_label.clone()),
            redeemed_by: Set(None),
            redeemed_at: Set(None),
            created_by: Set(Some(actor.user_id)),
            created_at: Set(now),
            ..Default::default()
        });
        cards::Entity::insert_many(models).exec(&txn).await?;

        txn.commit().await?;

        log::info!(
            "Admin {} generated {} cards of {} credits (batch {:?})",
            actor.user_id,
            codes.len(),
            request.credit_amount,
            batch_label
        );

        Ok(GenerateCardsResponse {
            batch_label,
            credit_amount: request.credit_amount,
            expires_at,
            codes: codes.iter().map(|c| format_card_code(c)).collect(),
        })
    }

    pub async fn list_cards(
        &self,
        actor: &AuthUser,
        query: &CardQuery,
    ) -> AppResult<PaginatedResponse<RechargeCardResponse>> {
        actor.require_admin()?;
        let params = PaginationParams::new(query.page, query.per_page);

        let mut base_query = cards::Entity::find();
        if let Some(status) = query.status {
            base_query = base_query.filter(cards::Column::Status.eq(status));
        }
        if let Some(label) = query.batch_label.as_deref() {
            base_query = base_query.filter(cards::Column::BatchLabel.eq(label));
        }

        let total = base_query.clone().count(&self.pool).await?;
        let items = base_query
            .order_by_desc(cards::Column::Id)
            .limit(params.get_limit())
            .offset(params.get_offset())
            .all(&self.pool)
            .await?;

        Ok(PaginatedResponse::new(
            items.into_iter().map(Into::into).collect(),
            &params,
            total,
        ))
    }
}

/// Flip a card from UNUSED to USED for `user_id`.
///
/// Only matches while the card is still unused, so when two redemptions both
/// read the card as unused the second claim touches no row.
async fn claim_card<C: ConnectionTrait>(
    db: &C,
    card_id: i64,
    user_id: Uuid,
    now: DateTime<Utc>,
) -> AppResult<()> {
    let claimed = cards::Entity::update_many()
        .col_expr(cards::Column::Status, Expr::value(CardStatus::Used))
        .col_expr(cards::Column::RedeemedBy, Expr::value(Some(user_id)))
        .col_expr(cards::Column::RedeemedAt, Expr::value(Some(now)))
        .filter(cards::Column::Id.eq(card_id))
        .filter(cards::Column::Status.eq(CardStatus::Unused))
        .exec(db)
        .await?;

    if claimed.rows_affected != 1 {
        log::warn!("Card #{card_id} was redeemed concurrently");
        return Err(AppError::CardAlreadyUsed);
    }
    Ok(())
}
