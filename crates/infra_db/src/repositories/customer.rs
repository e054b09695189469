//! Customer repository
//!
//! Balance adjustments are applied as a single atomic UPDATE so that
//! concurrent invoice issuance and payment application on the same
//! customer cannot lose an increment.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use core_kernel::{CustomerId, DomainPort, Money, PortError};
use domain_customer::{Address, Customer, CustomerStore, Role};

use crate::error::map_sqlx_error;

/// PostgreSQL adapter for `CustomerStore`
#[derive(Debug, Clone)]
pub struct PgCustomerStore {
    pool: PgPool,
}

impl PgCustomerStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct CustomerRow {
    id: Uuid,
    cedula: String,
    email: String,
    password_hash: String,
    first_name: String,
    last_name: String,
    phone: Option<String>,
    address: Option<serde_json::Value>,
    role: String,
    balance_usd: Decimal,
    deleted: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl CustomerRow {
    fn into_entity(self) -> Result<Customer, PortError> {
        let role: Role = self
            .role
            .parse()
            .map_err(|_| PortError::internal(format!("unknown role in row: {}", self.role)))?;
        let address: Option<Address> = match self.address {
            Some(value) => Some(
                serde_json::from_value(value)
                    .map_err(|e| PortError::internal(format!("bad address json: {e}")))?,
            ),
            None => None,
        };

        Ok(Customer {
            id: CustomerId::from_uuid(self.id),
            cedula: self.cedula,
            email: self.email,
            password_hash: self.password_hash,
            first_name: self.first_name,
            last_name: self.last_name,
            phone: self.phone,
            address,
            role,
            balance_usd: Money::usd(self.balance_usd),
            deleted: self.deleted,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

const SELECT_CUSTOMER: &str = r#"
    SELECT id, cedula, email, password_hash, first_name, last_name,
           phone, address, role, balance_usd, deleted, created_at, updated_at
    FROM customers
"#;

impl DomainPort for PgCustomerStore {}

#[async_trait]
impl CustomerStore for PgCustomerStore {
    async fn get(&self, id: CustomerId) -> Result<Customer, PortError> {
        let row: CustomerRow =
            sqlx::query_as(&format!("{SELECT_CUSTOMER} WHERE id = $1"))
                .bind(id.as_uuid())
                .fetch_one(&self.pool)
                .await
                .map_err(|e| map_sqlx_error(e, "Customer", id))?;
        row.into_entity()
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Customer>, PortError> {
        let row: Option<CustomerRow> =
            sqlx::query_as(&format!("{SELECT_CUSTOMER} WHERE email = $1"))
                .bind(email)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| map_sqlx_error(e, "Customer", email))?;
        row.map(CustomerRow::into_entity).transpose()
    }

    async fn find_by_cedula(&self, cedula: &str) -> Result<Option<Customer>, PortError> {
        let row: Option<CustomerRow> =
            sqlx::query_as(&format!("{SELECT_CUSTOMER} WHERE cedula = $1"))
                .bind(cedula)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| map_sqlx_error(e, "Customer", cedula))?;
        row.map(CustomerRow::into_entity).transpose()
    }

    async fn list(&self) -> Result<Vec<Customer>, PortError> {
        let rows: Vec<CustomerRow> =
            sqlx::query_as(&format!("{SELECT_CUSTOMER} ORDER BY created_at"))
                .fetch_all(&self.pool)
                .await
                .map_err(|e| map_sqlx_error(e, "Customer", "all"))?;
        rows.into_iter().map(CustomerRow::into_entity).collect()
    }

    async fn create(&self, customer: &Customer) -> Result<(), PortError> {
        let address = customer
            .address
            .as_ref()
            .map(serde_json::to_value)
            .transpose()
            .map_err(|e| PortError::internal(format!("address serialization failed: {e}")))?;

        sqlx::query(
            r#"
            INSERT INTO customers (
                id, cedula, email, password_hash, first_name, last_name,
                phone, address, role, balance_usd, deleted, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(customer.id.as_uuid())
        .bind(&customer.cedula)
        .bind(&customer.email)
        .bind(&customer.password_hash)
        .bind(&customer.first_name)
        .bind(&customer.last_name)
        .bind(&customer.phone)
        .bind(address)
        .bind(customer.role.to_string())
        .bind(customer.balance_usd.amount())
        .bind(customer.deleted)
        .bind(customer.created_at)
        .bind(customer.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error(e, "Customer", customer.id))?;

        Ok(())
    }

    async fn update(&self, customer: &Customer) -> Result<(), PortError> {
        let address = customer
            .address
            .as_ref()
            .map(serde_json::to_value)
            .transpose()
            .map_err(|e| PortError::internal(format!("address serialization failed: {e}")))?;

        let result = sqlx::query(
            r#"
            UPDATE customers SET
                cedula = $2, email = $3, password_hash = $4, first_name = $5,
                last_name = $6, phone = $7, address = $8, role = $9,
                deleted = $10, updated_at = $11
            WHERE id = $1
            "#,
        )
        .bind(customer.id.as_uuid())
        .bind(&customer.cedula)
        .bind(&customer.email)
        .bind(&customer.password_hash)
        .bind(&customer.first_name)
        .bind(&customer.last_name)
        .bind(&customer.phone)
        .bind(address)
        .bind(customer.role.to_string())
        .bind(customer.deleted)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error(e, "Customer", customer.id))?;

        if result.rows_affected() == 0 {
            return Err(PortError::not_found("Customer", customer.id));
        }
        Ok(())
    }

    async fn adjust_balance(&self, id: CustomerId, delta: Money) -> Result<Money, PortError> {
        // Atomic increment; no read-modify-write window
        let balance: Decimal = sqlx::query_scalar(
            r#"
            UPDATE customers
            SET balance_usd = balance_usd + $2, updated_at = NOW()
            WHERE id = $1
            RETURNING balance_usd
            "#,
        )
        .bind(id.as_uuid())
        .bind(delta.amount())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx_error(e, "Customer", id))?;

        Ok(Money::usd(balance))
    }

    async fn soft_delete(&self, id: CustomerId) -> Result<(), PortError> {
        let result = sqlx::query(
            "UPDATE customers SET deleted = TRUE, updated_at = NOW() WHERE id = $1",
        )
        .bind(id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error(e, "Customer", id))?;

        if result.rows_affected() == 0 {
            return Err(PortError::not_found("Customer", id));
        }
        Ok(())
    }
}
