//! Bank / cash ledger arithmetic
//!
//! A balance is never edited directly: it is the opening balance plus every
//! inflow minus every outflow recorded against the account.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, ErrorCode};
use crate::money::{to_decimal, to_f64};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Inflow,
    Outflow,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Inflow => "inflow",
            Direction::Outflow => "outflow",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "inflow" => Some(Direction::Inflow),
            "outflow" => Some(Direction::Outflow),
            _ => None,
        }
    }
}

/// One money movement against a bank or cash account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: i64,
    /// YYYY-MM-DD
    pub entry_date: String,
    pub direction: Direction,
    pub amount: f64,
    /// Voucher kind that produced the entry (receipt, payment, expense, income, transfer, opening)
    pub source: String,
    pub source_id: i64,
    pub description: Option<String>,
}

/// Statement row with the running balance after the entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementLine {
    pub id: i64,
    pub entry_date: String,
    pub source: String,
    pub source_id: i64,
    pub description: Option<String>,
    pub inflow: f64,
    pub outflow: f64,
    pub balance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statement {
    pub opening_balance: f64,
    pub total_inflow: f64,
    pub total_outflow: f64,
    pub closing_balance: f64,
    pub lines: Vec<StatementLine>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("ledger entry {id} has non-positive amount {amount}")]
    NonPositiveAmount { id: i64, amount: String },
}

fn signed(entry: &LedgerEntry) -> Result<Decimal, LedgerError> {
    let amount = to_decimal(entry.amount);
    if !entry.amount.is_finite() || amount <= Decimal::ZERO {
        return Err(LedgerError::NonPositiveAmount {
            id: entry.id,
            amount: entry.amount.to_string(),
        });
    }
    Ok(match entry.direction {
        Direction::Inflow => amount,
        Direction::Outflow => -amount,
    })
}

/// Opening balance + Σ inflows − Σ outflows
pub fn recompute_balance(opening: f64, entries: &[LedgerEntry]) -> Result<f64, LedgerError> {
    let mut balance = to_decimal(opening);
    for entry in entries {
        balance += signed(entry)?;
    }
    Ok(to_f64(balance))
}

/// Chronological statement ordered by (date, id) with running balances
pub fn statement(opening: f64, entries: &[LedgerEntry]) -> Result<Statement, LedgerError> {
    let mut sorted: Vec<&LedgerEntry> = entries.iter().collect();
    sorted.sort_by(|a, b| a.entry_date.cmp(&b.entry_date).then(a.id.cmp(&b.id)));

    let mut running = to_decimal(opening);
    let mut total_in = Decimal::ZERO;
    let mut total_out = Decimal::ZERO;
    let mut lines = Vec::with_capacity(sorted.len());

    for entry in sorted {
        let delta = signed(entry)?;
        running += delta;
        let (inflow, outflow) = if delta > Decimal::ZERO {
            total_in += delta;
            (delta, Decimal::ZERO)
        } else {
            total_out -= delta;
            (Decimal::ZERO, -delta)
        };
        lines.push(StatementLine {
            id: entry.id,
            entry_date: entry.entry_date.clone(),
            source: entry.source.clone(),
            source_id: entry.source_id,
            description: entry.description.clone(),
            inflow: to_f64(inflow),
            outflow: to_f64(outflow),
            balance: to_f64(running),
        });
    }

    Ok(Statement {
        opening_balance: to_f64(to_decimal(opening)),
        total_inflow: to_f64(total_in),
        total_outflow: to_f64(total_out),
        closing_balance: to_f64(running),
        lines,
    })
}

/// Outstanding balance of a customer or supplier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartyBalance {
    pub party_id: i64,
    pub party_name: String,
    pub invoiced: f64,
    pub settled: f64,
    pub returned: f64,
    pub tds_deducted: f64,
    pub outstanding: f64,
}

/// invoiced − settled − returned − TDS withheld
///
/// For a supplier, TDS withheld on payments settles the bill as well; for a
/// customer it is zero.
pub fn party_outstanding(
    party_id: i64,
    party_name: impl Into<String>,
    invoiced: f64,
    settled: f64,
    returned: f64,
    tds_deducted: f64,
) -> PartyBalance {
    let outstanding =
        to_decimal(invoiced) - to_decimal(settled) - to_decimal(returned) - to_decimal(tds_deducted);
    PartyBalance {
        party_id,
        party_name: party_name.into(),
        invoiced: to_f64(to_decimal(invoiced)),
        settled: to_f64(to_decimal(settled)),
        returned: to_f64(to_decimal(returned)),
        tds_deducted: to_f64(to_decimal(tds_deducted)),
        outstanding: to_f64(outstanding),
    }
}

impl From<LedgerError> for AppError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::NonPositiveAmount { id, .. } => {
                AppError::with_message(ErrorCode::AmountNotPositive, e.to_string())
                    .with_detail("entry_id", id)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: i64, date: &str, direction: Direction, amount: f64) -> LedgerEntry {
        LedgerEntry {
            id,
            entry_date: date.to_string(),
            direction,
            amount,
            source: "receipt".to_string(),
            source_id: id * 10,
            description: None,
        }
    }

    #[test]
    fn test_recompute_balance() {
        let entries = vec![
            entry(1, "2025-04-01", Direction::Inflow, 10_000.0),
            entry(2, "2025-04-02", Direction::Outflow, 2_500.50),
            entry(3, "2025-04-03", Direction::Inflow, 0.1),
            entry(4, "2025-04-03", Direction::Inflow, 0.2),
        ];
        assert_eq!(recompute_balance(1_000.0, &entries).unwrap(), 8_499.8);
    }

    #[test]
    fn test_recompute_empty_returns_opening() {
        assert_eq!(recompute_balance(1234.56, &[]).unwrap(), 1234.56);
    }

    #[test]
    fn test_balance_may_go_negative() {
        let entries = vec![entry(1, "2025-04-01", Direction::Outflow, 500.0)];
        assert_eq!(recompute_balance(100.0, &entries).unwrap(), -400.0);
    }

    #[test]
    fn test_rejects_non_positive_amounts() {
        let entries = vec![entry(7, "2025-04-01", Direction::Inflow, 0.0)];
        assert_eq!(
            recompute_balance(0.0, &entries),
            Err(LedgerError::NonPositiveAmount {
                id: 7,
                amount: "0".to_string()
            })
        );
        let entries = vec![entry(8, "2025-04-01", Direction::Outflow, f64::NAN)];
        assert!(recompute_balance(0.0, &entries).is_err());
    }

    #[test]
    fn test_statement_sorted_with_running_balance() {
        let entries = vec![
            entry(3, "2025-04-05", Direction::Outflow, 300.0),
            entry(2, "2025-04-01", Direction::Inflow, 1_000.0),
            entry(1, "2025-04-01", Direction::Outflow, 200.0),
        ];
        let stmt = statement(500.0, &entries).unwrap();
        let ids: Vec<i64> = stmt.lines.iter().map(|l| l.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        let balances: Vec<f64> = stmt.lines.iter().map(|l| l.balance).collect();
        assert_eq!(balances, vec![300.0, 1_300.0, 1_000.0]);
        assert_eq!(stmt.total_inflow, 1_000.0);
        assert_eq!(stmt.total_outflow, 500.0);
        assert_eq!(stmt.closing_balance, 1_000.0);
        assert_eq!(
            stmt.closing_balance,
            recompute_balance(500.0, &entries).unwrap()
        );
    }

    #[test]
    fn test_party_outstanding() {
        let b = party_outstanding(1, "Hotel Sea View", 100_000.0, 60_000.0, 5_000.0, 1_000.0);
        assert_eq!(b.outstanding, 34_000.0);

        let b = party_outstanding(2, "Overpaid", 1_000.0, 1_500.0, 0.0, 0.0);
        assert_eq!(b.outstanding, -500.0);
    }
}
