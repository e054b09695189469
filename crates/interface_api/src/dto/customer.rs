//! Customer DTOs

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use domain_customer::{Address, Customer};

/// Service address payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddressDto {
    pub city: String,
    pub neighborhood: String,
    pub street: String,
    pub unit: Option<String>,
}

impl From<AddressDto> for Address {
    fn from(dto: AddressDto) -> Self {
        Address {
            city: dto.city,
            neighborhood: dto.neighborhood,
            street: dto.street,
            unit: dto.unit,
        }
    }
}

impl From<Address> for AddressDto {
    fn from(address: Address) -> Self {
        AddressDto {
            city: address.city,
            neighborhood: address.neighborhood,
            street: address.street,
            unit: address.unit,
        }
    }
}

/// Customer update request; absent fields are left unchanged
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCustomerRequest {
    #[validate(length(min = 2))]
    pub first_name: Option<String>,
    #[validate(length(min = 1))]
    pub last_name: Option<String>,
    #[validate(length(equal = 11, message = "phone must be 11 digits"))]
    pub phone: Option<String>,
    pub address: Option<AddressDto>,
}

/// Customer representation returned by the API; never the credential hash
#[derive(Debug, Serialize)]
pub struct CustomerResponse {
    pub id: Uuid,
    pub cedula: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub address: Option<AddressDto>,
    pub role: String,
    pub balance_usd: Decimal,
    pub deleted: bool,
}

impl From<Customer> for CustomerResponse {
    fn from(customer: Customer) -> Self {
        CustomerResponse {
            id: *customer.id.as_uuid(),
            cedula: customer.cedula,
            email: customer.email,
            first_name: customer.first_name,
            last_name: customer.last_name,
            phone: customer.phone,
            address: customer.address.map(AddressDto::from),
            role: customer.role.to_string(),
            balance_usd: customer.balance_usd.amount(),
            deleted: customer.deleted,
        }
    }
}
