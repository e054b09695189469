//! Authentication and authorization
//!
//! JWT issuance/verification and the authenticated principal handlers use
//! for role and ownership checks. Invoice creation and overdue-marking
//! require the admin role; settling an invoice or reporting a payment is
//! allowed to the owning customer or an admin.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use core_kernel::CustomerId;
use domain_customer::Role;

use crate::error::ApiError;

/// JWT claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (customer ID)
    pub sub: String,
    /// Account role
    pub role: String,
    /// Expiration timestamp
    pub exp: i64,
    /// Issued at timestamp
    pub iat: i64,
}

/// Auth errors
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid token")]
    InvalidToken,
    #[error("Token expired")]
    TokenExpired,
    #[error("Invalid credentials")]
    InvalidCredentials,
}

/// The authenticated caller, extracted from validated claims
#[derive(Debug, Clone, Copy)]
pub struct Principal {
    pub customer_id: CustomerId,
    pub role: Role,
}

impl Principal {
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    /// Fails with 403 unless the caller is an administrator
    pub fn require_admin(&self) -> Result<(), ApiError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(ApiError::Forbidden(
                "administrator role required".to_string(),
            ))
        }
    }

    /// Fails with 403 unless the caller is the given customer or an admin
    pub fn require_self_or_admin(&self, customer_id: CustomerId) -> Result<(), ApiError> {
        if self.is_admin() || self.customer_id == customer_id {
            Ok(())
        } else {
            Err(ApiError::Forbidden(
                "not allowed to act on another customer's records".to_string(),
            ))
        }
    }
}

impl TryFrom<&Claims> for Principal {
    type Error = AuthError;

    fn try_from(claims: &Claims) -> Result<Self, Self::Error> {
        let customer_id = claims.sub.parse().map_err(|_| AuthError::InvalidToken)?;
        let role = claims.role.parse().map_err(|_| AuthError::InvalidToken)?;
        Ok(Principal { customer_id, role })
    }
}

/// Creates a new JWT token for a customer account
pub fn create_token(
    customer_id: CustomerId,
    role: Role,
    secret: &str,
    expiration_secs: u64,
) -> Result<String, AuthError> {
    let now = Utc::now();
    let exp = now + Duration::seconds(expiration_secs as i64);

    let claims = Claims {
        sub: customer_id.as_uuid().to_string(),
        role: role.to_string(),
        exp: exp.timestamp(),
        iat: now.timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|_| AuthError::InvalidToken)
}

/// Validates a JWT token
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, AuthError> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| {
        if e.to_string().contains("ExpiredSignature") {
            AuthError::TokenExpired
        } else {
            AuthError::InvalidToken
        }
    })?;

    Ok(token_data.claims)
}

/// Credential hashing
pub mod password {
    use argon2::password_hash::{rand_core::OsRng, SaltString};
    use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};

    use super::AuthError;

    /// Hashes a plaintext password with Argon2id
    pub fn hash(plaintext: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(plaintext.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(|_| AuthError::InvalidCredentials)
    }

    /// Verifies a plaintext password against a stored hash
    pub fn verify(plaintext: &str, stored_hash: &str) -> bool {
        PasswordHash::new(stored_hash)
            .map(|parsed| {
                Argon2::default()
                    .verify_password(plaintext.as_bytes(), &parsed)
                    .is_ok()
            })
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_round_trip() {
        let id = CustomerId::new_v7();
        let token = create_token(id, Role::Admin, "secret", 3600).unwrap();
        let claims = validate_token(&token, "secret").unwrap();

        let principal = Principal::try_from(&claims).unwrap();
        assert_eq!(principal.customer_id, id);
        assert!(principal.is_admin());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = create_token(CustomerId::new_v7(), Role::Customer, "secret", 3600).unwrap();
        assert!(validate_token(&token, "other-secret").is_err());
    }

    #[test]
    fn test_ownership_checks() {
        let id = CustomerId::new_v7();
        let customer = Principal {
            customer_id: id,
            role: Role::Customer,
        };

        assert!(customer.require_self_or_admin(id).is_ok());
        assert!(customer.require_self_or_admin(CustomerId::new_v7()).is_err());
        assert!(customer.require_admin().is_err());

        let admin = Principal {
            customer_id: CustomerId::new_v7(),
            role: Role::Admin,
        };
        assert!(admin.require_self_or_admin(id).is_ok());
        assert!(admin.require_admin().is_ok());
    }

    #[test]
    fn test_password_hash_and_verify() {
        let hash = password::hash("hunter2-but-longer").unwrap();
        assert!(password::verify("hunter2-but-longer", &hash));
        assert!(!password::verify("wrong", &hash));
    }
}
