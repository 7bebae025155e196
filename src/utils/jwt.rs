use crate::error::{AppError, AppResult};
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    Student,
    Admin,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // user uuid
    #[serde(default)]
    pub role: Role,
    pub exp: i64,
    pub iat: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,
}

/// The authenticated caller, stored in request extensions by the auth middleware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub role: Role,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn require_admin(&self) -> AppResult<()> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::Forbidden)
        }
    }

    /// Callers may only act on their own wallet unless they are admins.
    pub fn require_self_or_admin(&self, user_id: Uuid) -> AppResult<()> {
        if self.user_id == user_id || self.is_admin() {
            Ok(())
        } else {
            Err(AppError::Forbidden)
        }
    }
}

#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    audience: Option<String>,
}

impl JwtService {
    pub fn new(secret: &str, audience: Option<String>) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            audience,
        }
    }

    /// Tokens normally come from the auth provider; this is for tooling and tests.
    pub fn issue(&self, user_id: Uuid, role: Role, expires_in: i64) -> AppResult<String> {
        let now = Utc::now();
        let exp = now + Duration::seconds(expires_in);

        let claims = Claims {
            sub: user_id.to_string(),
            role,
            exp: exp.timestamp(),
            iat: now.timestamp(),
            aud: self.audience.clone(),
        };

        encode(&Header::default(), &claims, &self.encoding_key).map_err(AppError::JwtError)
    }

    pub fn verify_token(&self, token: &str) -> AppResult<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        match &self.audience {
            Some(aud) => validation.set_audience(&[aud]),
            None => validation.validate_aud = false,
        }
        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(AppError::JwtError)
    }

    pub fn authenticate(&self, token: &str) -> AppResult<AuthUser> {
        let claims = self.verify_token(token)?;
        let user_id = Uuid::parse_str(&claims.sub)
            .map_err(|_| AppError::AuthError("Invalid subject in access token".to_string()))?;

        Ok(AuthUser {
            user_id,
            role: claims.role,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_and_authenticate() {
        let jwt = JwtService::new("secret", None);
        let user_id = Uuid::new_v4();
        let token = jwt.issue(user_id, Role::Admin, 60).unwrap();

        let user = jwt.authenticate(&token).unwrap();
        assert_eq!(user.user_id, user_id);
        assert!(user.is_admin());
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let issuer = JwtService::new("secret", None);
        let verifier = JwtService::new("other", None);
        let token = issuer.issue(Uuid::new_v4(), Role::Student, 60).unwrap();
        assert!(matches!(
            verifier.authenticate(&token),
            Err(AppError::JwtError(_))
        ));
    }

    #[test]
    fn test_audience_must_match() {
        let issuer = JwtService::new("secret", Some("mobile".into()));
        let verifier = JwtService::new("secret", Some("authenticated".into()));
        let token = issuer.issue(Uuid::new_v4(), Role::Student, 60).unwrap();
        assert!(verifier.authenticate(&token).is_err());

        let same = JwtService::new("secret", Some("mobile".into()));
        assert!(same.authenticate(&token).is_ok());
    }

    #[test]
    fn test_role_defaults_to_student() {
        let claims: Claims =
            serde_json::from_str(r#"{"sub":"x","exp":1,"iat":0}"#).unwrap();
        assert_eq!(claims.role, Role::Student);
    }

    #[test]
    fn test_capability_checks() {
        let me = Uuid::new_v4();
        let student = AuthUser {
            user_id: me,
            role: Role::Student,
        };
        assert!(student.require_self_or_admin(me).is_ok());
        assert!(matches!(
            student.require_self_or_admin(Uuid::new_v4()),
            Err(AppError::Forbidden)
        ));
        assert!(student.require_admin().is_err());
    }
}
