use crate::entities::{
    TransactionKind, course_entity as courses, enrollment_entity as enrollments,
    wallet_transaction_entity as wtx,
};
use crate::error::{AppError, AppResult};
use crate::models::{
    CourseResponse, EnrollmentResponse, PurchaseCourseResponse, RefundEnrollmentRequest,
    RefundEnrollmentResponse,
};
use crate::services::ledger::{self, NewEntry};
use crate::utils::AuthUser;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder, Set, SqlErr, TransactionTrait,
};
use uuid::Uuid;

#[derive(Clone)]
pub struct CourseService {
    pool: DatabaseConnection,
}

impl CourseService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    pub async fn list_courses(&self) -> AppResult<Vec<CourseResponse>> {
        let list = courses::Entity::find()
            .filter(courses::Column::IsPublished.eq(true))
            .order_by_asc(courses::Column::Id)
            .all(&self.pool)
            .await?;
        Ok(list.into_iter().map(Into::into).collect())
    }

    pub async fn list_enrollments(&self, actor: &AuthUser) -> AppResult<Vec<EnrollmentResponse>> {
        let list = enrollments::Entity::find()
            .filter(enrollments::Column::UserId.eq(actor.user_id))
            .order_by_desc(enrollments::Column::Id)
            .all(&self.pool)
            .await?;
        Ok(list.into_iter().map(Into::into).collect())
    }

    /// Buy a course with wallet credits.
    ///
    /// Deduction, ledger entry and enrollment are written in one transaction,
    /// so neither an enrollment without payment nor a payment without
    /// enrollment can be observed.
    pub async fn purchase(
        &self,
        actor: &AuthUser,
        course_id: i64,
    ) -> AppResult<PurchaseCourseResponse> {
        let user_id = actor.user_id;
        let txn = self.pool.begin().await?;

        let course = courses::Entity::find_by_id(course_id)
            .filter(courses::Column::IsPublished.eq(true))
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound("Course not found".to_string()))?;

        if find_enrollment(&txn, user_id, course.id).await?.is_some() {
            return Err(AppError::AlreadyEnrolled);
        }

        if course.credit_price <= 0 {
            let enrollment = insert_enrollment(&txn, user_id, course.id, None).await?;
            let wallet = ledger::ensure_wallet(&txn, user_id).await?;
            txn.commit().await?;

            log::info!("User {user_id} enrolled in free course #{}", course.id);
            return Ok(PurchaseCourseResponse {
                enrollment: enrollment.into(),
                new_balance: wallet.current_balance,
                transaction: None,
            });
        }

        let change = match ledger::debit(&txn, user_id, course.credit_price).await {
            Ok(change) => change,
            Err(e) => {
                if let AppError::InsufficientCredits { shortage, .. } = &e {
                    log::warn!(
                        "User {user_id} is {shortage} credits short for course #{}",
                        course.id
                    );
                }
                return Err(e);
            }
        };

        let entry = ledger::append_entry(
            &txn,
            &change,
            NewEntry {
                kind: TransactionKind::CoursePurchase,
                amount: -course.credit_price,
                description: Some(format!("Course purchase: {}", course.title)),
                course_id: Some(course.id),
                card_id: None,
            },
        )
        .await?;

        let enrollment = insert_enrollment(&txn, user_id, course.id, Some(entry.id)).await?;

        txn.commit().await?;

        log::info!(
            "User {} bought course #{} for {} credits (balance {} -> {})",
            user_id,
            course.id,
            course.credit_price,
            change.balance_before,
            change.balance_after()
        );

        Ok(PurchaseCourseResponse {
            enrollment: enrollment.into(),
            new_balance: change.balance_after(),
            transaction: Some(entry.into()),
        })
    }

    /// Revoke an enrollment and return what was paid for it (admin).
    ///
    /// Deleting the enrollment row is the serialization point: a second
    /// refund of the same enrollment finds nothing to delete.
    pub async fn refund(
        &self,
        actor: &AuthUser,
        request: RefundEnrollmentRequest,
    ) -> AppResult<RefundEnrollmentResponse> {
        actor.require_admin()?;
        let user_id = request.user_id;

        let txn = self.pool.begin().await?;

        let enrollment = find_enrollment(&txn, user_id, request.course_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Enrollment not found".to_string()))?;

        let deleted = enrollments::Entity::delete_many()
            .filter(enrollments::Column::Id.eq(enrollment.id))
            .exec(&txn)
            .await?;
        if deleted.rows_affected != 1 {
            return Err(AppError::NotFound("Enrollment not found".to_string()));
        }

        let Some(purchase_id) = enrollment.transaction_id else {
            let wallet = ledger::ensure_wallet(&txn, user_id).await?;
            txn.commit().await?;
            log::info!(
                "Admin {} revoked free enrollment of user {} in course #{}",
                actor.user_id,
                user_id,
                request.course_id
            );
            return Ok(RefundEnrollmentResponse {
                refunded_amount: 0,
                new_balance: wallet.current_balance,
                transaction: None,
            });
        };

        let purchase = wtx::Entity::find_by_id(purchase_id)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                AppError::InternalError(format!(
                    "purchase transaction #{purchase_id} missing for enrollment #{}",
                    enrollment.id
                ))
            })?;
        let amount = -purchase.amount;

        let description = request
            .reason
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("Refund for course #{}", request.course_id));

        let change = ledger::credit(&txn, user_id, amount).await?;
        let entry = ledger::append_entry(
            &txn,
            &change,
            NewEntry {
                kind: TransactionKind::Refund,
                amount,
                description: Some(description),
                course_id: Some(request.course_id),
                card_id: None,
            },
        )
        .await?;

        txn.commit().await?;

        log::info!(
            "Admin {} refunded {} credits to user {} for course #{}",
            actor.user_id,
            amount,
            user_id,
            request.course_id
        );

        Ok(RefundEnrollmentResponse {
            refunded_amount: amount,
            new_balance: change.balance_after(),
            transaction: Some(entry.into()),
        })
    }
}

async fn find_enrollment<C: ConnectionTrait>(
    db: &C,
    user_id: Uuid,
    course_id: i64,
) -> Result<Option<enrollments::Model>, DbErr> {
    enrollments::Entity::find()
        .filter(enrollments::Column::UserId.eq(user_id))
        .filter(enrollments::Column::CourseId.eq(course_id))
        .one(db)
        .await
}

async fn insert_enrollment<C: ConnectionTrait>(
    db: &C,
    user_id: Uuid,
    course_id: i64,
    transaction_id: Option<i64>,
) -> AppResult<enrollments::Model> {
    let result = enrollments::ActiveModel {
        user_id: Set(user_id),
        course_id: Set(course_id),
        transaction_id: Set(transaction_id),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await;

    match result {
        Ok(m) => Ok(m),
        // lost a race against a parallel purchase of the same course
        Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
            Err(AppError::AlreadyEnrolled)
        }
        Err(e) => Err(e.into()),
    }
}
