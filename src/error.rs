use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sea_orm::DbErr),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Auth error: {0}")]
    AuthError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Forbidden")]
    Forbidden,

    #[error("Recharge card has already been used")]
    CardAlreadyUsed,

    #[error("Recharge card has expired")]
    CardExpired,

    #[error("Insufficient credits: {shortage} more credits required")]
    InsufficientCredits {
        required: i64,
        available: i64,
        shortage: i64,
    },

    #[error("Already enrolled in this course")]
    AlreadyEnrolled,

    #[error("Internal server error: {0}")]
    InternalError(String),

    #[error("JWT error: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

impl AppError {
    pub fn insufficient_credits(required: i64, available: i64) -> Self {
        AppError::InsufficientCredits {
            required,
            available,
            shortage: required - available,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::ValidationError(_) => "VALIDATION_ERROR",
            AppError::AuthError(_) | AppError::JwtError(_) => "AUTH_ERROR",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Forbidden => "FORBIDDEN",
            AppError::CardAlreadyUsed => "CARD_ALREADY_USED",
            AppError::CardExpired => "CARD_EXPIRED",
            AppError::InsufficientCredits { .. } => "INSUFFICIENT_CREDITS",
            AppError::AlreadyEnrolled => "ALREADY_ENROLLED",
            AppError::DatabaseError(_) => "DATABASE_ERROR",
            AppError::InternalError(_) => "INTERNAL_ERROR",
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::AuthError(_) | AppError::JwtError(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::CardAlreadyUsed | AppError::AlreadyEnrolled => StatusCode::CONFLICT,
            AppError::CardExpired => StatusCode::GONE,
            AppError::InsufficientCredits { .. } => StatusCode::PAYMENT_REQUIRED,
            AppError::DatabaseError(_) | AppError::InternalError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            AppError::ValidationError(msg) => {
                log::warn!("Validation error: {msg}");
                msg.clone()
            }
            AppError::AuthError(msg) => {
                log::warn!("Authentication error: {msg}");
                msg.clone()
            }
            AppError::JwtError(err) => {
                log::warn!("Token rejected: {err}");
                "Invalid access token".to_string()
            }
            AppError::NotFound(msg) => msg.clone(),
            AppError::Forbidden => {
                log::warn!("Forbidden access");
                "Forbidden".to_string()
            }
            AppError::DatabaseError(err) => {
                log::error!("Database error: {err}");
                "Database error".to_string()
            }
            AppError::InternalError(msg) => {
                log::error!("Internal error: {msg}");
                "Internal server error".to_string()
            }
            // business rule violations are shown to the user as-is
            _ => self.to_string(),
        };

        let mut error = json!({
            "code": self.error_code(),
            "message": message,
        });
        if let AppError::InsufficientCredits {
            required,
            available,
            shortage,
        } = self
        {
            error["details"] = json!({
                "required": required,
                "available": available,
                "shortage": shortage,
            });
        }

        HttpResponse::build(self.status_code()).json(json!({
            "success": false,
            "error": error
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    async fn body_json(err: AppError) -> (StatusCode, serde_json::Value) {
        let resp = err.error_response();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body()).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[actix_web::test]
    async fn test_insufficient_credits_carries_shortage() {
        let (status, body) = body_json(AppError::insufficient_credits(200, 150)).await;
        assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"]["code"], "INSUFFICIENT_CREDITS");
        assert_eq!(body["error"]["details"]["shortage"], 50);
        assert_eq!(body["error"]["details"]["available"], 150);
    }

    #[actix_web::test]
    async fn test_internal_errors_are_masked() {
        let (status, body) =
            body_json(AppError::InternalError("pool exhausted at 10.0.0.3".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"]["message"], "Internal server error");

        let (_, body) = body_json(AppError::DatabaseError(sea_orm::DbErr::Custom(
            "relation wallets does not exist".into(),
        )))
        .await;
        assert_eq!(body["error"]["message"], "Database error");
    }

    #[actix_web::test]
    async fn test_card_errors_map_to_distinct_codes() {
        let (status, body) = body_json(AppError::CardAlreadyUsed).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["code"], "CARD_ALREADY_USED");

        let (status, body) = body_json(AppError::CardExpired).await;
        assert_eq!(status, StatusCode::GONE);
        assert_eq!(body["error"]["code"], "CARD_EXPIRED");
        assert!(body["error"].get("details").is_none());
    }
}
