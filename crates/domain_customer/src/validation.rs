//! Customer validation rules
//!
//! Field validation for customer records, consolidated in one place rather
//! than scattered across request handlers.
//!
//! # Validation Rules
//!
//! - Cedula: required, 7-9 digits
//! - Email: required, must look like an address
//! - Names: required, at least 2 characters
//! - Phone: optional, exactly 11 digits when present

use crate::customer::Customer;

/// Result of customer validation
#[derive(Debug, Clone)]
pub struct ValidationResult {
    /// Whether the customer is valid
    pub is_valid: bool,
    /// List of validation errors
    pub errors: Vec<String>,
}

impl ValidationResult {
    /// Creates a successful validation result
    pub fn ok() -> Self {
        Self {
            is_valid: true,
            errors: Vec::new(),
        }
    }

    /// Adds an error to the result
    pub fn add_error(&mut self, error: impl Into<String>) {
        self.errors.push(error.into());
        self.is_valid = false;
    }
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::ok()
    }
}

/// Validator for customer entities
pub struct CustomerValidator;

impl CustomerValidator {
    /// Validates a customer record
    pub fn validate(customer: &Customer) -> ValidationResult {
        let mut result = ValidationResult::ok();

        Self::validate_cedula(&customer.cedula, &mut result);
        Self::validate_email(&customer.email, &mut result);

        if customer.first_name.trim().len() < 2 {
            result.add_error("First name must be at least 2 characters");
        }
        if customer.last_name.trim().is_empty() {
            result.add_error("Last name is required");
        }

        if let Some(ref phone) = customer.phone {
            if !Self::is_valid_phone(phone) {
                result.add_error(format!("Invalid phone format (11 digits expected): {phone}"));
            }
        }

        result
    }

    /// Validates a cedula: 7 to 9 digits, nothing else
    pub fn is_valid_cedula(cedula: &str) -> bool {
        (7..=9).contains(&cedula.len()) && cedula.chars().all(|c| c.is_ascii_digit())
    }

    /// Validates a phone number: exactly 11 digits
    pub fn is_valid_phone(phone: &str) -> bool {
        phone.len() == 11 && phone.chars().all(|c| c.is_ascii_digit())
    }

    /// Minimal email shape check; full RFC validation is not the goal
    pub fn is_valid_email(email: &str) -> bool {
        let Some((local, domain)) = email.split_once('@') else {
            return false;
        };
        !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
    }

    fn validate_cedula(cedula: &str, result: &mut ValidationResult) {
        if !Self::is_valid_cedula(cedula) {
            result.add_error(format!("Invalid cedula format (7-9 digits expected): {cedula}"));
        }
    }

    fn validate_email(email: &str, result: &mut ValidationResult) {
        if !Self::is_valid_email(email) {
            result.add_error(format!("Invalid email format: {email}"));
        }
    }
}
