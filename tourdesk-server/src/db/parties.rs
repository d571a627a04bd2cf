//! Customers, suppliers, associate partners and operational staff

use shared::error::{AppError, ErrorCode};
use shared::models::{
    AssociatePartner, AssociatePartnerCreate, AssociatePartnerUpdate, Customer, CustomerCreate,
    CustomerUpdate, OperationalStaff, OperationalStaffCreate, OperationalStaffUpdate, Supplier,
    SupplierCreate, SupplierUpdate,
};
use shared::tds::{DeducteeKind, find_section, is_valid_pan};
use shared::util::{now_millis, snowflake_id};
use sqlx::PgPool;

use super::BoxError;
use crate::error::{ServiceError, ServiceResult, is_foreign_key_violation, is_unique_violation};

/// Delete by id, mapping "still referenced" to PartyInUse
async fn delete_party(pool: &PgPool, table: &str, id: i64) -> ServiceResult<bool> {
    match sqlx::query(&format!("DELETE FROM {table} WHERE id = $1"))
        .bind(id)
        .execute(pool)
        .await
    {
        Ok(r) => Ok(r.rows_affected() > 0),
        Err(e) if is_foreign_key_violation(&e) => Err(AppError::new(ErrorCode::PartyInUse)
            .with_detail("id", id)
            .into()),
        Err(e) => Err(e.into()),
    }
}

fn check_pan(pan: Option<&str>) -> Result<(), AppError> {
    match pan {
        Some(p) if !is_valid_pan(p) => {
            Err(AppError::validation(format!("Invalid PAN: {p}")).with_detail("field", "pan"))
        }
        _ => Ok(()),
    }
}

fn partner_fk(e: sqlx::Error) -> ServiceError {
    if is_foreign_key_violation(&e) {
        AppError::new(ErrorCode::PartnerNotFound).into()
    } else {
        e.into()
    }
}

// ── Customers ──

const CUSTOMER_COLUMNS: &str = "id, name, phone, email, address, state_code, gstin, pan, \
                                associate_partner_id, opening_balance, created_at, updated_at";

pub async fn list_customers(pool: &PgPool, search: Option<&str>) -> Result<Vec<Customer>, BoxError> {
    let pattern = search.map(|s| format!("%{}%", s.trim()));
    let rows = sqlx::query_as(&format!(
        r#"
        SELECT {CUSTOMER_COLUMNS} FROM customers
        WHERE ($1::TEXT IS NULL OR name ILIKE $1 OR phone ILIKE $1 OR email ILIKE $1)
        ORDER BY name
        "#
    ))
    .bind(pattern)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn get_customer(pool: &PgPool, id: i64) -> Result<Option<Customer>, BoxError> {
    let row = sqlx::query_as(&format!("SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn create_customer(pool: &PgPool, data: &CustomerCreate) -> ServiceResult<Customer> {
    if data.name.trim().is_empty() {
        return Err(AppError::required("name").into());
    }
    check_pan(data.pan.as_deref())?;
    let now = now_millis();
    let row = sqlx::query_as(&format!(
        r#"
        INSERT INTO customers (id, name, phone, email, address, state_code, gstin, pan,
                               associate_partner_id, opening_balance, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $11)
        RETURNING {CUSTOMER_COLUMNS}
        "#
    ))
    .bind(snowflake_id())
    .bind(data.name.trim())
    .bind(&data.phone)
    .bind(&data.email)
    .bind(&data.address)
    .bind(&data.state_code)
    .bind(&data.gstin)
    .bind(&data.pan)
    .bind(data.associate_partner_id)
    .bind(data.opening_balance)
    .bind(now)
    .fetch_one(pool)
    .await
    .map_err(partner_fk)?;
    Ok(row)
}

pub async fn update_customer(
    pool: &PgPool,
    id: i64,
    data: &CustomerUpdate,
) -> ServiceResult<Option<Customer>> {
    check_pan(data.pan.as_deref())?;
    let row = sqlx::query_as(&format!(
        r#"
        UPDATE customers SET
            name = COALESCE($1, name),
            phone = COALESCE($2, phone),
            email = COALESCE($3, email),
            address = COALESCE($4, address),
            state_code = COALESCE($5, state_code),
            gstin = COALESCE($6, gstin),
            pan = COALESCE($7, pan),
            associate_partner_id = COALESCE($8, associate_partner_id),
            opening_balance = COALESCE($9, opening_balance),
            updated_at = $10
        WHERE id = $11
        RETURNING {CUSTOMER_COLUMNS}
        "#
    ))
    .bind(&data.name)
    .bind(&data.phone)
    .bind(&data.email)
    .bind(&data.address)
    .bind(&data.state_code)
    .bind(&data.gstin)
    .bind(&data.pan)
    .bind(data.associate_partner_id)
    .bind(data.opening_balance)
    .bind(now_millis())
    .bind(id)
    .fetch_optional(pool)
    .await
    .map_err(partner_fk)?;
    Ok(row)
}

pub async fn delete_customer(pool: &PgPool, id: i64) -> ServiceResult<bool> {
    delete_party(pool, "customers", id).await
}

// ── Suppliers ──

pub(crate) const SUPPLIER_COLUMNS: &str = "id, name, contact_person, phone, email, address, state_code, gstin, pan, \
                                deductee_kind, default_tds_section, opening_balance, created_at, updated_at";

fn check_section(section: Option<&str>) -> Result<Option<String>, AppError> {
    match section.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(code) => find_section(code)
            .map(|s| Some(s.code.to_string()))
            .ok_or_else(|| {
                AppError::new(ErrorCode::TdsSectionUnknown).with_detail("section", code)
            }),
    }
}

pub async fn list_suppliers(pool: &PgPool, search: Option<&str>) -> Result<Vec<Supplier>, BoxError> {
    let pattern = search.map(|s| format!("%{}%", s.trim()));
    let rows = sqlx::query_as(&format!(
        r#"
        SELECT {SUPPLIER_COLUMNS} FROM suppliers
        WHERE ($1::TEXT IS NULL OR name ILIKE $1 OR contact_person ILIKE $1 OR phone ILIKE $1)
        ORDER BY name
        "#
    ))
    .bind(pattern)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn get_supplier(pool: &PgPool, id: i64) -> Result<Option<Supplier>, BoxError> {
    let row = sqlx::query_as(&format!("SELECT {SUPPLIER_COLUMNS} FROM suppliers WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn create_supplier(pool: &PgPool, data: &SupplierCreate) -> ServiceResult<Supplier> {
    if data.name.trim().is_empty() {
        return Err(AppError::required("name").into());
    }
    check_pan(data.pan.as_deref())?;
    let section = check_section(data.default_tds_section.as_deref())?;
    let now = now_millis();
    let row = sqlx::query_as(&format!(
        r#"
        INSERT INTO suppliers (id, name, contact_person, phone, email, address, state_code, gstin, pan,
                               deductee_kind, default_tds_section, opening_balance, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $13)
        RETURNING {SUPPLIER_COLUMNS}
        "#
    ))
    .bind(snowflake_id())
    .bind(data.name.trim())
    .bind(&data.contact_person)
    .bind(&data.phone)
    .bind(&data.email)
    .bind(&data.address)
    .bind(&data.state_code)
    .bind(&data.gstin)
    .bind(&data.pan)
    .bind(data.deductee_kind.unwrap_or(DeducteeKind::Other).as_str())
    .bind(section)
    .bind(data.opening_balance)
    .bind(now)
    .fetch_one(pool)
    .await?;
    Ok(row)
}

pub async fn update_supplier(
    pool: &PgPool,
    id: i64,
    data: &SupplierUpdate,
) -> ServiceResult<Option<Supplier>> {
    check_pan(data.pan.as_deref())?;
    let section = check_section(data.default_tds_section.as_deref())?;
    let row = sqlx::query_as(&format!(
        r#"
        UPDATE suppliers SET
            name = COALESCE($1, name),
            contact_person = COALESCE($2, contact_person),
            phone = COALESCE($3, phone),
            email = COALESCE($4, email),
            address = COALESCE($5, address),
            state_code = COALESCE($6, state_code),
            gstin = COALESCE($7, gstin),
            pan = COALESCE($8, pan),
            deductee_kind = COALESCE($9, deductee_kind),
            default_tds_section = COALESCE($10, default_tds_section),
            opening_balance = COALESCE($11, opening_balance),
            updated_at = $12
        WHERE id = $13
        RETURNING {SUPPLIER_COLUMNS}
        "#
    ))
    .bind(&data.name)
    .bind(&data.contact_person)
    .bind(&data.phone)
    .bind(&data.email)
    .bind(&data.address)
    .bind(&data.state_code)
    .bind(&data.gstin)
    .bind(&data.pan)
    .bind(data.deductee_kind.map(|k| k.as_str()))
    .bind(section)
    .bind(data.opening_balance)
    .bind(now_millis())
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn delete_supplier(pool: &PgPool, id: i64) -> ServiceResult<bool> {
    delete_party(pool, "suppliers", id).await
}

// ── Associate partners ──

const PARTNER_COLUMNS: &str = "id, name, company, phone, email, commission_percent, gstin, pan, \
                               is_active, created_at, updated_at";

fn check_commission(percent: Option<f64>) -> Result<(), AppError> {
    match percent {
        Some(p) if !p.is_finite() || !(0.0..=100.0).contains(&p) => Err(AppError::with_message(
            ErrorCode::ValueOutOfRange,
            "commission_percent must be between 0 and 100",
        )),
        _ => Ok(()),
    }
}

pub async fn list_partners(pool: &PgPool) -> Result<Vec<AssociatePartner>, BoxError> {
    let rows = sqlx::query_as(&format!(
        "SELECT {PARTNER_COLUMNS} FROM associate_partners ORDER BY name"
    ))
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn get_partner(pool: &PgPool, id: i64) -> Result<Option<AssociatePartner>, BoxError> {
    let row = sqlx::query_as(&format!(
        "SELECT {PARTNER_COLUMNS} FROM associate_partners WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn create_partner(
    pool: &PgPool,
    data: &AssociatePartnerCreate,
) -> ServiceResult<AssociatePartner> {
    if data.name.trim().is_empty() {
        return Err(AppError::required("name").into());
    }
    check_commission(Some(data.commission_percent))?;
    check_pan(data.pan.as_deref())?;
    let now = now_millis();
    let row = sqlx::query_as(&format!(
        r#"
        INSERT INTO associate_partners (id, name, company, phone, email, commission_percent, gstin, pan,
                                        is_active, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, TRUE, $9, $9)
        RETURNING {PARTNER_COLUMNS}
        "#
    ))
    .bind(snowflake_id())
    .bind(data.name.trim())
    .bind(&data.company)
    .bind(&data.phone)
    .bind(&data.email)
    .bind(data.commission_percent)
    .bind(&data.gstin)
    .bind(&data.pan)
    .bind(now)
    .fetch_one(pool)
    .await?;
    Ok(row)
}

pub async fn update_partner(
    pool: &PgPool,
    id: i64,
    data: &AssociatePartnerUpdate,
) -> ServiceResult<Option<AssociatePartner>> {
    check_commission(data.commission_percent)?;
    check_pan(data.pan.as_deref())?;
    let row = sqlx::query_as(&format!(
        r#"
        UPDATE associate_partners SET
            name = COALESCE($1, name),
            company = COALESCE($2, company),
            phone = COALESCE($3, phone),
            email = COALESCE($4, email),
            commission_percent = COALESCE($5, commission_percent),
            gstin = COALESCE($6, gstin),
            pan = COALESCE($7, pan),
            is_active = COALESCE($8, is_active),
            updated_at = $9
        WHERE id = $10
        RETURNING {PARTNER_COLUMNS}
        "#
    ))
    .bind(&data.name)
    .bind(&data.company)
    .bind(&data.phone)
    .bind(&data.email)
    .bind(data.commission_percent)
    .bind(&data.gstin)
    .bind(&data.pan)
    .bind(data.is_active)
    .bind(now_millis())
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn delete_partner(pool: &PgPool, id: i64) -> ServiceResult<bool> {
    delete_party(pool, "associate_partners", id).await
}

// ── Operational staff ──

const STAFF_COLUMNS: &str = "id, name, email, phone, role, is_active, created_at, updated_at";

fn staff_email_error(e: sqlx::Error, email: &str) -> ServiceError {
    if is_unique_violation(&e) {
        AppError::new(ErrorCode::StaffEmailExists)
            .with_detail("email", email)
            .into()
    } else {
        e.into()
    }
}

pub async fn list_staff(pool: &PgPool, active_only: bool) -> Result<Vec<OperationalStaff>, BoxError> {
    let rows = sqlx::query_as(&format!(
        "SELECT {STAFF_COLUMNS} FROM operational_staff WHERE ($1 = FALSE OR is_active) ORDER BY name"
    ))
    .bind(active_only)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn get_staff(pool: &PgPool, id: i64) -> Result<Option<OperationalStaff>, BoxError> {
    let row = sqlx::query_as(&format!(
        "SELECT {STAFF_COLUMNS} FROM operational_staff WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn create_staff(
    pool: &PgPool,
    data: &OperationalStaffCreate,
) -> ServiceResult<OperationalStaff> {
    if data.name.trim().is_empty() {
        return Err(AppError::required("name").into());
    }
    let email = data.email.trim().to_lowercase();
    if !email.contains('@') {
        return Err(AppError::with_message(ErrorCode::InvalidFormat, "Invalid email address")
            .with_detail("field", "email")
            .into());
    }
    let now = now_millis();
    let row = sqlx::query_as(&format!(
        r#"
        INSERT INTO operational_staff (id, name, email, phone, role, is_active, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, TRUE, $6, $6)
        RETURNING {STAFF_COLUMNS}
        "#
    ))
    .bind(snowflake_id())
    .bind(data.name.trim())
    .bind(&email)
    .bind(&data.phone)
    .bind(data.role.as_str())
    .bind(now)
    .fetch_one(pool)
    .await
    .map_err(|e| staff_email_error(e, &email))?;
    Ok(row)
}

pub async fn update_staff(
    pool: &PgPool,
    id: i64,
    data: &OperationalStaffUpdate,
) -> ServiceResult<Option<OperationalStaff>> {
    let email = data.email.as_deref().map(|e| e.trim().to_lowercase());
    let row = sqlx::query_as(&format!(
        r#"
        UPDATE operational_staff SET
            name = COALESCE($1, name),
            email = COALESCE($2, email),
            phone = COALESCE($3, phone),
            role = COALESCE($4, role),
            is_active = COALESCE($5, is_active),
            updated_at = $6
        WHERE id = $7
        RETURNING {STAFF_COLUMNS}
        "#
    ))
    .bind(&data.name)
    .bind(&email)
    .bind(&data.phone)
    .bind(data.role.map(|r| r.as_str()))
    .bind(data.is_active)
    .bind(now_millis())
    .bind(id)
    .fetch_optional(pool)
    .await
    .map_err(|e| staff_email_error(e, email.as_deref().unwrap_or_default()))?;
    Ok(row)
}

pub async fn delete_staff(pool: &PgPool, id: i64) -> ServiceResult<bool> {
    delete_party(pool, "operational_staff", id).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_section_canonicalizes() {
        assert_eq!(check_section(Some("194c")).unwrap().as_deref(), Some("194C"));
        assert_eq!(check_section(Some(" 194i(b) ")).unwrap().as_deref(), Some("194I(b)"));
        assert_eq!(check_section(Some("")).unwrap(), None);
        assert_eq!(check_section(None).unwrap(), None);
        assert_eq!(
            check_section(Some("194Z")).unwrap_err().code,
            ErrorCode::TdsSectionUnknown
        );
    }
}
