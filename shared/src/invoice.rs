//! Purchase / sale document totals and GST split

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, ErrorCode};
use crate::money::{percent_of, require_non_negative, require_positive, round_paise, to_decimal, to_f64};

/// One line of a purchase, sale or return
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineItem {
    pub description: String,
    pub quantity: f64,
    pub rate: f64,
    #[serde(default)]
    pub tax_percent: f64,
}

/// Intra-state supplies split GST into CGST + SGST; inter-state supplies use IGST
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SupplyKind {
    IntraState,
    InterState,
}

/// Compare the two-digit GST state codes; a missing place of supply is intra-state
pub fn supply_kind(company_state: &str, place_of_supply: Option<&str>) -> SupplyKind {
    match place_of_supply.map(str::trim).filter(|s| !s.is_empty()) {
        Some(pos) if !pos.eq_ignore_ascii_case(company_state.trim()) => SupplyKind::InterState,
        _ => SupplyKind::IntraState,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineTotals {
    pub taxable: f64,
    pub tax: f64,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentTotals {
    pub supply_kind: SupplyKind,
    pub taxable: f64,
    pub cgst: f64,
    pub sgst: f64,
    pub igst: f64,
    pub tax: f64,
    pub total: f64,
    pub lines: Vec<LineTotals>,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InvoiceError {
    #[error("document has no line items")]
    Empty,
    #[error("line {index}: {reason}")]
    InvalidLine { index: usize, reason: String },
    #[error("return of {requested} exceeds returnable amount {returnable}")]
    ReturnExceedsOriginal { returnable: f64, requested: f64 },
}

/// Compute per-line and document totals
pub fn document_totals(
    items: &[LineItem],
    supply_kind: SupplyKind,
) -> Result<DocumentTotals, InvoiceError> {
    if items.is_empty() {
        return Err(InvoiceError::Empty);
    }

    let mut taxable_sum = Decimal::ZERO;
    let mut tax_sum = Decimal::ZERO;
    let mut lines = Vec::with_capacity(items.len());

    for (index, item) in items.iter().enumerate() {
        let invalid = |reason: String| InvoiceError::InvalidLine { index, reason };
        if item.description.trim().is_empty() {
            return Err(invalid("description is required".to_string()));
        }
        let quantity = require_positive(item.quantity, "quantity").map_err(invalid)?;
        let rate = require_non_negative(item.rate, "rate").map_err(invalid)?;
        let tax_percent = require_non_negative(item.tax_percent, "tax_percent").map_err(invalid)?;
        if tax_percent > Decimal::ONE_HUNDRED {
            return Err(invalid(format!("tax_percent must be at most 100, got {}", item.tax_percent)));
        }

        let out_of_range = || invalid("amount is out of range".to_string());
        let taxable = round_paise(quantity.checked_mul(rate).ok_or_else(out_of_range)?);
        let tax = round_paise(percent_of(taxable, tax_percent).ok_or_else(out_of_range)?);
        let total = taxable.checked_add(tax).ok_or_else(out_of_range)?;
        taxable_sum = taxable_sum.checked_add(taxable).ok_or_else(out_of_range)?;
        tax_sum = tax_sum.checked_add(tax).ok_or_else(out_of_range)?;
        lines.push(LineTotals {
            taxable: to_f64(taxable),
            tax: to_f64(tax),
            total: to_f64(total),
        });
    }

    let total = taxable_sum
        .checked_add(tax_sum)
        .ok_or_else(|| InvoiceError::InvalidLine {
            index: items.len() - 1,
            reason: "document total is out of range".to_string(),
        })?;

    let (cgst, sgst, igst) = match supply_kind {
        SupplyKind::IntraState => {
            let cgst = round_paise(tax_sum / Decimal::TWO);
            (cgst, tax_sum - cgst, Decimal::ZERO)
        }
        SupplyKind::InterState => (Decimal::ZERO, Decimal::ZERO, tax_sum),
    };

    Ok(DocumentTotals {
        supply_kind,
        taxable: to_f64(taxable_sum),
        cgst: to_f64(cgst),
        sgst: to_f64(sgst),
        igst: to_f64(igst),
        tax: to_f64(tax_sum),
        total: to_f64(total),
        lines,
    })
}

/// Check a return against what is still returnable on the original document.
///
/// Returns the amount still returnable after this return.
pub fn check_return(
    original_total: f64,
    already_returned: f64,
    requested: f64,
) -> Result<f64, InvoiceError> {
    let returnable = (to_decimal(original_total) - to_decimal(already_returned)).max(Decimal::ZERO);
    let requested_dec = to_decimal(requested);
    if requested_dec > returnable {
        return Err(InvoiceError::ReturnExceedsOriginal {
            returnable: to_f64(returnable),
            requested: to_f64(requested_dec),
        });
    }
    Ok(to_f64(returnable - requested_dec))
}

impl From<InvoiceError> for AppError {
    fn from(e: InvoiceError) -> Self {
        match e {
            InvoiceError::Empty => AppError::new(ErrorCode::DocumentEmpty),
            InvoiceError::InvalidLine { index, ref reason } => {
                AppError::with_message(ErrorCode::ValidationFailed, reason.clone())
                    .with_detail("line", index)
            }
            InvoiceError::ReturnExceedsOriginal {
                returnable,
                requested,
            } => AppError::with_message(ErrorCode::ReturnExceedsOriginal, e.to_string())
                .with_detail("returnable", returnable)
                .with_detail("requested", requested),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(description: &str, quantity: f64, rate: f64, tax_percent: f64) -> LineItem {
        LineItem {
            description: description.to_string(),
            quantity,
            rate,
            tax_percent,
        }
    }

    #[test]
    fn test_supply_kind() {
        assert_eq!(supply_kind("32", None), SupplyKind::IntraState);
        assert_eq!(supply_kind("32", Some("")), SupplyKind::IntraState);
        assert_eq!(supply_kind("32", Some("32")), SupplyKind::IntraState);
        assert_eq!(supply_kind("32", Some("29")), SupplyKind::InterState);
    }

    #[test]
    fn test_intra_state_split() {
        let items = vec![
            item("Deluxe room x 3 nights", 3.0, 4_500.0, 12.0),
            item("Airport transfer", 1.0, 1_999.0, 5.0),
        ];
        let totals = document_totals(&items, SupplyKind::IntraState).unwrap();
        assert_eq!(totals.taxable, 15_499.0);
        // 1620 + 99.95
        assert_eq!(totals.tax, 1_719.95);
        assert_eq!(totals.cgst, 859.98);
        assert_eq!(totals.sgst, 859.97);
        assert_eq!(totals.igst, 0.0);
        assert_eq!(totals.total, 17_218.95);
        assert_eq!(totals.lines[1].tax, 99.95);
    }

    #[test]
    fn test_inter_state_uses_igst() {
        let items = vec![item("Houseboat", 1.0, 10_000.0, 18.0)];
        let totals = document_totals(&items, SupplyKind::InterState).unwrap();
        assert_eq!(totals.igst, 1_800.0);
        assert_eq!(totals.cgst, 0.0);
        assert_eq!(totals.total, 11_800.0);
    }

    #[test]
    fn test_invalid_documents() {
        assert_eq!(
            document_totals(&[], SupplyKind::IntraState),
            Err(InvoiceError::Empty)
        );
        let err = document_totals(&[item("x", 0.0, 10.0, 0.0)], SupplyKind::IntraState).unwrap_err();
        assert!(matches!(err, InvoiceError::InvalidLine { index: 0, .. }));
        let err = document_totals(
            &[item("ok", 1.0, 10.0, 5.0), item(" ", 1.0, 10.0, 5.0)],
            SupplyKind::IntraState,
        )
        .unwrap_err();
        assert!(matches!(err, InvoiceError::InvalidLine { index: 1, .. }));
    }

    #[test]
    fn test_out_of_range_lines_are_rejected() {
        let err = document_totals(&[item("Charter", 1e15, 1e15, 5.0)], SupplyKind::IntraState)
            .unwrap_err();
        assert!(matches!(err, InvoiceError::InvalidLine { index: 0, .. }));
        let err = document_totals(&[item("Charter", 1.0, 1e30, 5.0)], SupplyKind::InterState)
            .unwrap_err();
        assert!(matches!(err, InvoiceError::InvalidLine { index: 0, .. }));
    }

    #[test]
    fn test_check_return() {
        assert_eq!(check_return(10_000.0, 2_000.0, 3_000.0).unwrap(), 5_000.0);
        assert_eq!(check_return(10_000.0, 2_000.0, 8_000.0).unwrap(), 0.0);
        assert_eq!(
            check_return(10_000.0, 2_000.0, 8_000.01),
            Err(InvoiceError::ReturnExceedsOriginal {
                returnable: 8_000.0,
                requested: 8_000.01
            })
        );
    }
}
