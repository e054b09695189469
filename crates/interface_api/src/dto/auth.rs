//! Authentication DTOs

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::dto::customer::{AddressDto, CustomerResponse};

/// Registration request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// National identity document, 7-9 digits
    #[validate(length(min = 7, max = 9, message = "cedula must be 7-9 digits"))]
    pub cedula: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8, message = "password must be at least 8 characters"))]
    pub password: String,
    #[validate(length(min = 2))]
    pub first_name: String,
    #[validate(length(min = 1))]
    pub last_name: String,
    #[validate(length(equal = 11, message = "phone must be 11 digits"))]
    pub phone: Option<String>,
    pub address: Option<AddressDto>,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

/// Issued-token response, returned by register and login
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub customer: CustomerResponse,
}
