//! Bank and cash accounts and their entry history
//!
//! `current_balance` is a cache: every write that adds or removes entries
//! calls [`recompute`] for the touched account inside the same transaction.

use serde::Serialize;
use shared::error::{AppError, ErrorCode};
use shared::ledger::{self, Direction, LedgerEntry, Statement, recompute_balance};
use shared::models::{
    AccountRef, BankAccount, BankAccountCreate, BankAccountUpdate, CashAccount, CashAccountCreate,
    CashAccountUpdate, LedgerAccountKind,
};
use shared::util::{now_millis, snowflake_id};
use sqlx::{PgConnection, PgPool};

use super::{BoxError, require_date};
use crate::error::{ServiceError, ServiceResult, is_foreign_key_violation, is_unique_violation};

fn table(kind: LedgerAccountKind) -> &'static str {
    match kind {
        LedgerAccountKind::Bank => "bank_accounts",
        LedgerAccountKind::Cash => "cash_accounts",
    }
}

fn not_found(account: AccountRef) -> AppError {
    let code = match account.kind {
        LedgerAccountKind::Bank => ErrorCode::BankAccountNotFound,
        LedgerAccountKind::Cash => ErrorCode::CashAccountNotFound,
    };
    AppError::new(code).with_detail("account_id", account.id)
}

// ── Entries ──

#[derive(sqlx::FromRow)]
struct EntryRow {
    id: i64,
    entry_date: String,
    direction: String,
    amount: f64,
    source: String,
    source_id: i64,
    description: Option<String>,
}

impl TryFrom<EntryRow> for LedgerEntry {
    type Error = BoxError;

    fn try_from(row: EntryRow) -> Result<Self, Self::Error> {
        let direction = Direction::parse(&row.direction)
            .ok_or_else(|| format!("ledger entry {} has direction '{}'", row.id, row.direction))?;
        Ok(LedgerEntry {
            id: row.id,
            entry_date: row.entry_date,
            direction,
            amount: row.amount,
            source: row.source,
            source_id: row.source_id,
            description: row.description,
        })
    }
}

pub async fn load_entries(
    conn: &mut PgConnection,
    account: AccountRef,
) -> Result<Vec<LedgerEntry>, BoxError> {
    let rows: Vec<EntryRow> = sqlx::query_as(
        r#"
        SELECT id, entry_date, direction, amount, source, source_id, description
        FROM ledger_entries
        WHERE account_kind = $1 AND account_id = $2
        ORDER BY entry_date, id
        "#,
    )
    .bind(account.kind.as_str())
    .bind(account.id)
    .fetch_all(conn)
    .await?;
    rows.into_iter().map(LedgerEntry::try_from).collect()
}

/// New entry for a voucher movement
pub struct NewEntry<'a> {
    pub account: AccountRef,
    pub entry_date: &'a str,
    pub direction: Direction,
    pub amount: f64,
    pub source: &'a str,
    pub source_id: i64,
    pub description: Option<&'a str>,
}

pub async fn insert_entry(conn: &mut PgConnection, entry: &NewEntry<'_>) -> Result<i64, BoxError> {
    let id = snowflake_id();
    sqlx::query(
        r#"
        INSERT INTO ledger_entries (id, account_kind, account_id, entry_date, direction, amount, source, source_id, description)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        "#,
    )
    .bind(id)
    .bind(entry.account.kind.as_str())
    .bind(entry.account.id)
    .bind(entry.entry_date)
    .bind(entry.direction.as_str())
    .bind(entry.amount)
    .bind(entry.source)
    .bind(entry.source_id)
    .bind(entry.description)
    .execute(conn)
    .await?;
    Ok(id)
}

/// Remove the entries a voucher produced; returns the accounts they touched
pub async fn delete_entries(
    conn: &mut PgConnection,
    source: &str,
    source_id: i64,
) -> Result<Vec<AccountRef>, BoxError> {
    let rows: Vec<(String, i64)> = sqlx::query_as(
        "DELETE FROM ledger_entries WHERE source = $1 AND source_id = $2 RETURNING account_kind, account_id",
    )
    .bind(source)
    .bind(source_id)
    .fetch_all(conn)
    .await?;
    let mut accounts: Vec<AccountRef> = rows
        .into_iter()
        .map(|(kind, id)| match kind.as_str() {
            "cash" => AccountRef::cash(id),
            _ => AccountRef::bank(id),
        })
        .collect();
    accounts.dedup();
    Ok(accounts)
}

/// Lock an active account row; returns its opening balance
pub async fn lock_account(conn: &mut PgConnection, account: AccountRef) -> ServiceResult<f64> {
    let row: Option<(f64, bool)> = sqlx::query_as(&format!(
        "SELECT opening_balance, is_active FROM {} WHERE id = $1 FOR UPDATE",
        table(account.kind)
    ))
    .bind(account.id)
    .fetch_optional(conn)
    .await?;
    match row {
        None => Err(not_found(account).into()),
        Some((_, false)) => Err(AppError::validation("Account is inactive")
            .with_detail("account_id", account.id)
            .into()),
        Some((opening, true)) => Ok(opening),
    }
}

/// Recompute `current_balance` as opening + Σ inflows − Σ outflows
pub async fn recompute(conn: &mut PgConnection, account: AccountRef) -> ServiceResult<f64> {
    let opening: Option<f64> = sqlx::query_scalar(&format!(
        "SELECT opening_balance FROM {} WHERE id = $1 FOR UPDATE",
        table(account.kind)
    ))
    .bind(account.id)
    .fetch_optional(&mut *conn)
    .await?;
    let opening = opening.ok_or_else(|| not_found(account))?;

    let entries = load_entries(conn, account).await?;
    let balance = recompute_balance(opening, &entries).map_err(AppError::from)?;
    sqlx::query(&format!(
        "UPDATE {} SET current_balance = $1, updated_at = $2 WHERE id = $3",
        table(account.kind)
    ))
    .bind(balance)
    .bind(now_millis())
    .bind(account.id)
    .execute(&mut *conn)
    .await?;
    Ok(balance)
}

/// Standalone recalculation (repairs a drifted cache)
pub async fn recalculate(pool: &PgPool, account: AccountRef) -> ServiceResult<f64> {
    let mut tx = pool.begin().await?;
    let cached: Option<f64> = sqlx::query_scalar(&format!(
        "SELECT current_balance FROM {} WHERE id = $1",
        table(account.kind)
    ))
    .bind(account.id)
    .fetch_optional(&mut *tx)
    .await?;
    let cached = cached.ok_or_else(|| not_found(account))?;
    let balance = recompute(&mut tx, account).await?;
    tx.commit().await?;

    if (cached - balance).abs() >= 0.005 {
        tracing::warn!(
            kind = account.kind.as_str(),
            account_id = account.id,
            cached,
            balance,
            "Ledger balance drift corrected"
        );
    }
    Ok(balance)
}

#[derive(Debug, Serialize)]
pub struct AccountStatement {
    pub account: AccountRef,
    pub from: Option<String>,
    pub to: Option<String>,
    #[serde(flatten)]
    pub statement: Statement,
}

/// Statement for a date range; the opening line carries everything before `from`
pub async fn statement(
    pool: &PgPool,
    account: AccountRef,
    from: Option<&str>,
    to: Option<&str>,
) -> ServiceResult<AccountStatement> {
    if let Some(d) = from {
        require_date("from", d)?;
    }
    if let Some(d) = to {
        require_date("to", d)?;
    }
    let mut conn = pool.acquire().await?;
    let opening: Option<f64> = sqlx::query_scalar(&format!(
        "SELECT opening_balance FROM {} WHERE id = $1",
        table(account.kind)
    ))
    .bind(account.id)
    .fetch_optional(&mut *conn)
    .await?;
    let opening = opening.ok_or_else(|| not_found(account))?;

    let entries = load_entries(&mut conn, account).await?;
    let (before, rest): (Vec<LedgerEntry>, Vec<LedgerEntry>) = entries
        .into_iter()
        .partition(|e| from.is_some_and(|f| e.entry_date.as_str() < f));
    let in_range: Vec<LedgerEntry> = rest
        .into_iter()
        .filter(|e| to.is_none_or(|t| e.entry_date.as_str() <= t))
        .collect();

    let opening_at_from = recompute_balance(opening, &before).map_err(AppError::from)?;
    let statement = ledger::statement(opening_at_from, &in_range).map_err(AppError::from)?;
    Ok(AccountStatement {
        account,
        from: from.map(String::from),
        to: to.map(String::from),
        statement,
    })
}

/// Refuse to delete an account with history
async fn delete_account(pool: &PgPool, account: AccountRef) -> ServiceResult<bool> {
    let mut tx = pool.begin().await?;
    let used: bool = sqlx::query_scalar(
        "SELECT EXISTS (SELECT 1 FROM ledger_entries WHERE account_kind = $1 AND account_id = $2)",
    )
    .bind(account.kind.as_str())
    .bind(account.id)
    .fetch_one(&mut *tx)
    .await?;
    if used {
        return Err(AppError::new(ErrorCode::LedgerAccountInUse)
            .with_detail("account_id", account.id)
            .into());
    }
    let rows = sqlx::query(&format!("DELETE FROM {} WHERE id = $1", table(account.kind)))
        .bind(account.id)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                AppError::new(ErrorCode::LedgerAccountInUse)
                    .with_detail("account_id", account.id)
                    .into()
            } else {
                ServiceError::from(e)
            }
        })?;
    tx.commit().await?;
    Ok(rows.rows_affected() > 0)
}

// ── Bank accounts ──

const BANK_COLUMNS: &str = "id, account_name, bank_name, account_number, ifsc, branch, opening_balance, \
                            current_balance, is_active, created_at, updated_at";

pub async fn list_bank_accounts(pool: &PgPool) -> Result<Vec<BankAccount>, BoxError> {
    let rows = sqlx::query_as(&format!(
        "SELECT {BANK_COLUMNS} FROM bank_accounts ORDER BY account_name"
    ))
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn get_bank_account(pool: &PgPool, id: i64) -> Result<Option<BankAccount>, BoxError> {
    let row = sqlx::query_as(&format!("SELECT {BANK_COLUMNS} FROM bank_accounts WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

fn account_number_error(e: sqlx::Error, number: &str) -> ServiceError {
    if is_unique_violation(&e) {
        AppError::already_exists(format!("Bank account {number}")).into()
    } else {
        e.into()
    }
}

pub async fn create_bank_account(pool: &PgPool, data: &BankAccountCreate) -> ServiceResult<BankAccount> {
    if data.account_name.trim().is_empty() {
        return Err(AppError::required("account_name").into());
    }
    let number = data.account_number.trim();
    if number.is_empty() {
        return Err(AppError::required("account_number").into());
    }
    if !data.opening_balance.is_finite() {
        return Err(AppError::validation("opening_balance must be a number").into());
    }
    let now = now_millis();
    let row = sqlx::query_as(&format!(
        r#"
        INSERT INTO bank_accounts (id, account_name, bank_name, account_number, ifsc, branch,
                                   opening_balance, current_balance, is_active, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $7, TRUE, $8, $8)
        RETURNING {BANK_COLUMNS}
        "#
    ))
    .bind(snowflake_id())
    .bind(data.account_name.trim())
    .bind(data.bank_name.trim())
    .bind(number)
    .bind(&data.ifsc)
    .bind(&data.branch)
    .bind(data.opening_balance)
    .bind(now)
    .fetch_one(pool)
    .await
    .map_err(|e| account_number_error(e, number))?;
    Ok(row)
}

pub async fn update_bank_account(
    pool: &PgPool,
    id: i64,
    data: &BankAccountUpdate,
) -> ServiceResult<Option<BankAccount>> {
    let mut tx = pool.begin().await?;
    let updated = sqlx::query(
        r#"
        UPDATE bank_accounts SET
            account_name = COALESCE($1, account_name),
            bank_name = COALESCE($2, bank_name),
            account_number = COALESCE($3, account_number),
            ifsc = COALESCE($4, ifsc),
            branch = COALESCE($5, branch),
            opening_balance = COALESCE($6, opening_balance),
            is_active = COALESCE($7, is_active),
            updated_at = $8
        WHERE id = $9
        "#,
    )
    .bind(&data.account_name)
    .bind(&data.bank_name)
    .bind(&data.account_number)
    .bind(&data.ifsc)
    .bind(&data.branch)
    .bind(data.opening_balance)
    .bind(data.is_active)
    .bind(now_millis())
    .bind(id)
    .execute(&mut *tx)
    .await
    .map_err(|e| account_number_error(e, data.account_number.as_deref().unwrap_or_default()))?;
    if updated.rows_affected() == 0 {
        return Ok(None);
    }
    if data.opening_balance.is_some() {
        recompute(&mut tx, AccountRef::bank(id)).await?;
    }
    tx.commit().await?;
    Ok(get_bank_account(pool, id).await?)
}

pub async fn delete_bank_account(pool: &PgPool, id: i64) -> ServiceResult<bool> {
    delete_account(pool, AccountRef::bank(id)).await
}

// ── Cash accounts ──

const CASH_COLUMNS: &str = "id, name, opening_balance, current_balance, is_active, created_at, updated_at";

pub async fn list_cash_accounts(pool: &PgPool) -> Result<Vec<CashAccount>, BoxError> {
    let rows = sqlx::query_as(&format!("SELECT {CASH_COLUMNS} FROM cash_accounts ORDER BY name"))
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

pub async fn get_cash_account(pool: &PgPool, id: i64) -> Result<Option<CashAccount>, BoxError> {
    let row = sqlx::query_as(&format!("SELECT {CASH_COLUMNS} FROM cash_accounts WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

fn cash_name_error(e: sqlx::Error, name: &str) -> ServiceError {
    if is_unique_violation(&e) {
        AppError::already_exists(format!("Cash account '{name}'")).into()
    } else {
        e.into()
    }
}

pub async fn create_cash_account(pool: &PgPool, data: &CashAccountCreate) -> ServiceResult<CashAccount> {
    let name = data.name.trim();
    if name.is_empty() {
        return Err(AppError::required("name").into());
    }
    if !data.opening_balance.is_finite() {
        return Err(AppError::validation("opening_balance must be a number").into());
    }
    let now = now_millis();
    let row = sqlx::query_as(&format!(
        r#"
        INSERT INTO cash_accounts (id, name, opening_balance, current_balance, is_active, created_at, updated_at)
        VALUES ($1, $2, $3, $3, TRUE, $4, $4)
        RETURNING {CASH_COLUMNS}
        "#
    ))
    .bind(snowflake_id())
    .bind(name)
    .bind(data.opening_balance)
    .bind(now)
    .fetch_one(pool)
    .await
    .map_err(|e| cash_name_error(e, name))?;
    Ok(row)
}

pub async fn update_cash_account(
    pool: &PgPool,
    id: i64,
    data: &CashAccountUpdate,
) -> ServiceResult<Option<CashAccount>> {
    let mut tx = pool.begin().await?;
    let updated = sqlx::query(
        r#"
        UPDATE cash_accounts SET
            name = COALESCE($1, name),
            opening_balance = COALESCE($2, opening_balance),
            is_active = COALESCE($3, is_active),
            updated_at = $4
        WHERE id = $5
        "#,
    )
    .bind(&data.name)
    .bind(data.opening_balance)
    .bind(data.is_active)
    .bind(now_millis())
    .bind(id)
    .execute(&mut *tx)
    .await
    .map_err(|e| cash_name_error(e, data.name.as_deref().unwrap_or_default()))?;
    if updated.rows_affected() == 0 {
        return Ok(None);
    }
    if data.opening_balance.is_some() {
        recompute(&mut tx, AccountRef::cash(id)).await?;
    }
    tx.commit().await?;
    Ok(get_cash_account(pool, id).await?)
}

pub async fn delete_cash_account(pool: &PgPool, id: i64) -> ServiceResult<bool> {
    delete_account(pool, AccountRef::cash(id)).await
}
