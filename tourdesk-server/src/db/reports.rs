//! Outstanding balances per customer and supplier

use shared::ledger::{PartyBalance, party_outstanding};
use sqlx::PgPool;

use super::BoxError;

#[derive(sqlx::FromRow)]
struct PartyTotals {
    id: i64,
    name: String,
    invoiced: f64,
    settled: f64,
    returned: f64,
    tds_deducted: f64,
}

impl From<PartyTotals> for PartyBalance {
    fn from(t: PartyTotals) -> Self {
        party_outstanding(t.id, t.name, t.invoiced, t.settled, t.returned, t.tds_deducted)
    }
}

/// Whether to drop parties that are fully settled
fn keep(balance: &PartyBalance, include_settled: bool) -> bool {
    include_settled || balance.outstanding.abs() >= 0.005
}

/// Opening balance + invoices − receipts − sale returns
pub async fn customer_outstanding(pool: &PgPool, include_settled: bool) -> Result<Vec<PartyBalance>, BoxError> {
    let rows: Vec<PartyTotals> = sqlx::query_as(
        r#"
        SELECT c.id,
               c.name,
               (c.opening_balance + COALESCE(s.total, 0))::DOUBLE PRECISION AS invoiced,
               COALESCE(v.total, 0)::DOUBLE PRECISION AS settled,
               COALESCE(r.total, 0)::DOUBLE PRECISION AS returned,
               0::DOUBLE PRECISION AS tds_deducted
        FROM customers c
        LEFT JOIN (SELECT customer_id, SUM(total_amount) AS total FROM sales GROUP BY customer_id) s
               ON s.customer_id = c.id
        LEFT JOIN (SELECT customer_id, SUM(amount) AS total FROM vouchers
                   WHERE kind = 'receipt' GROUP BY customer_id) v
               ON v.customer_id = c.id
        LEFT JOIN (SELECT customer_id, SUM(total_amount) AS total FROM sale_returns GROUP BY customer_id) r
               ON r.customer_id = c.id
        ORDER BY c.name
        "#,
    )
    .fetch_all(pool)
    .await?;
    Ok(rows
        .into_iter()
        .map(PartyBalance::from)
        .filter(|b| keep(b, include_settled))
        .collect())
}

/// Opening balance + bills − net payments − TDS withheld − purchase returns
pub async fn supplier_outstanding(pool: &PgPool, include_settled: bool) -> Result<Vec<PartyBalance>, BoxError> {
    let rows: Vec<PartyTotals> = sqlx::query_as(
        r#"
        SELECT sp.id,
               sp.name,
               (sp.opening_balance + COALESCE(p.total, 0))::DOUBLE PRECISION AS invoiced,
               COALESCE(v.paid, 0)::DOUBLE PRECISION AS settled,
               COALESCE(r.total, 0)::DOUBLE PRECISION AS returned,
               COALESCE(v.tds, 0)::DOUBLE PRECISION AS tds_deducted
        FROM suppliers sp
        LEFT JOIN (SELECT supplier_id, SUM(total_amount) AS total FROM purchases GROUP BY supplier_id) p
               ON p.supplier_id = sp.id
        LEFT JOIN (SELECT supplier_id, SUM(amount) AS paid, SUM(tds_amount) AS tds FROM vouchers
                   WHERE kind = 'payment' GROUP BY supplier_id) v
               ON v.supplier_id = sp.id
        LEFT JOIN (SELECT supplier_id, SUM(total_amount) AS total FROM purchase_returns GROUP BY supplier_id) r
               ON r.supplier_id = sp.id
        ORDER BY sp.name
        "#,
    )
    .fetch_all(pool)
    .await?;
    Ok(rows
        .into_iter()
        .map(PartyBalance::from)
        .filter(|b| keep(b, include_settled))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supplier_totals_net_of_tds() {
        let balance = PartyBalance::from(PartyTotals {
            id: 3,
            name: "Hill View Cabs".into(),
            invoiced: 50_000.0,
            settled: 29_400.0,
            returned: 0.0,
            tds_deducted: 600.0,
        });
        assert_eq!(balance.outstanding, 20_000.0);
        assert!(keep(&balance, false));
    }

    #[test]
    fn test_keep_drops_settled_parties() {
        let settled = party_outstanding(1, "Anita", 1000.0, 1000.0, 0.0, 0.0);
        assert!(!keep(&settled, false));
        assert!(keep(&settled, true));
    }
}
