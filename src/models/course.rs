use crate::entities::{course_entity, enrollment_entity};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::TransactionResponse;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CourseResponse {
    pub id: i64,
    pub title: String,
    pub credit_price: i64,
}

impl From<course_entity::Model> for CourseResponse {
    fn from(m: course_entity::Model) -> Self {
        Self {
            id: m.id,
            title: m.title,
            credit_price: m.credit_price,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct EnrollmentResponse {
    pub id: i64,
    pub course_id: i64,
    pub transaction_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl From<enrollment_entity::Model> for EnrollmentResponse {
    fn from(m: enrollment_entity::Model) -> Self {
        Self {
            id: m.id,
            course_id: m.course_id,
            transaction_id: m.transaction_id,
            created_at: m.created_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PurchaseCourseResponse {
    pub enrollment: EnrollmentResponse,
    pub new_balance: i64,
    /// None for free courses
    pub transaction: Option<TransactionResponse>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RefundEnrollmentRequest {
    pub user_id: Uuid,
    pub course_id: i64,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RefundEnrollmentResponse {
    pub refunded_amount: i64,
    pub new_balance: i64,
    pub transaction: Option<TransactionResponse>,
}
