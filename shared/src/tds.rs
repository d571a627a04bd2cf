//! TDS (Tax Deducted at Source) computation
//!
//! Rate table lookup plus threshold rules, applied per supplier payment.
//! Rates and thresholds follow the FY 2025-26 schedule.
//!
//! Threshold handling:
//! - A deduction applies when the payment exceeds the single-payment threshold
//!   or pushes the financial-year aggregate past the aggregate threshold.
//! - Crossing the aggregate threshold also catches up earlier payments of the
//!   year on which nothing was deducted.
//! - `excess_only` sections (194Q) tax only the part of the aggregate above
//!   the threshold.
//! - Without a PAN the rate is `max(2 × rate, no_pan_floor)` (section 206AA).

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, ErrorCode};
use crate::money::{percent_of, require_non_negative, require_positive, round_rupee, to_f64};

/// Who is being paid; picks between the two rate columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeducteeKind {
    Individual,
    Huf,
    Company,
    Firm,
    Other,
}

impl DeducteeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeducteeKind::Individual => "individual",
            DeducteeKind::Huf => "huf",
            DeducteeKind::Company => "company",
            DeducteeKind::Firm => "firm",
            DeducteeKind::Other => "other",
        }
    }

    fn is_individual_or_huf(&self) -> bool {
        matches!(self, DeducteeKind::Individual | DeducteeKind::Huf)
    }
}

impl std::str::FromStr for DeducteeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "individual" => Ok(DeducteeKind::Individual),
            "huf" => Ok(DeducteeKind::Huf),
            "company" => Ok(DeducteeKind::Company),
            "firm" => Ok(DeducteeKind::Firm),
            "other" => Ok(DeducteeKind::Other),
            other => Err(format!("unknown deductee kind: {other}")),
        }
    }
}

/// A row of the TDS rate master
#[derive(Debug, Clone, Serialize)]
pub struct TdsSection {
    pub code: &'static str,
    pub nature: &'static str,
    /// Percent for individuals / HUF
    pub rate_individual: Decimal,
    /// Percent for everyone else
    pub rate_other: Decimal,
    pub single_threshold: Option<Decimal>,
    pub aggregate_threshold: Option<Decimal>,
    pub excess_only: bool,
    /// Minimum percent when the deductee has no PAN
    pub no_pan_floor: Decimal,
}

impl TdsSection {
    pub fn rate_for(&self, kind: DeducteeKind) -> Decimal {
        if kind.is_individual_or_huf() {
            self.rate_individual
        } else {
            self.rate_other
        }
    }
}

const fn pct(units: i64, scale: u32) -> Decimal {
    Decimal::from_parts(units as u32, 0, 0, false, scale)
}

const fn rupees(units: i64) -> Decimal {
    Decimal::from_parts(units as u32, 0, 0, false, 0)
}

const TWENTY_PERCENT: Decimal = pct(20, 0);
const FIVE_PERCENT: Decimal = pct(5, 0);

/// The rate master
pub const SECTIONS: &[TdsSection] = &[
    TdsSection {
        code: "194C",
        nature: "Payment to contractors (transport, hotels on contract)",
        rate_individual: pct(1, 0),
        rate_other: pct(2, 0),
        single_threshold: Some(rupees(30_000)),
        aggregate_threshold: Some(rupees(100_000)),
        excess_only: false,
        no_pan_floor: TWENTY_PERCENT,
    },
    TdsSection {
        code: "194H",
        nature: "Commission or brokerage (agents, associate partners)",
        rate_individual: pct(2, 0),
        rate_other: pct(2, 0),
        single_threshold: None,
        aggregate_threshold: Some(rupees(20_000)),
        excess_only: false,
        no_pan_floor: TWENTY_PERCENT,
    },
    TdsSection {
        code: "194I(a)",
        nature: "Rent of plant, machinery or equipment (vehicles)",
        rate_individual: pct(2, 0),
        rate_other: pct(2, 0),
        single_threshold: Some(rupees(50_000)),
        aggregate_threshold: None,
        excess_only: false,
        no_pan_floor: TWENTY_PERCENT,
    },
    TdsSection {
        code: "194I(b)",
        nature: "Rent of land, building or furniture",
        rate_individual: pct(10, 0),
        rate_other: pct(10, 0),
        single_threshold: Some(rupees(50_000)),
        aggregate_threshold: None,
        excess_only: false,
        no_pan_floor: TWENTY_PERCENT,
    },
    TdsSection {
        code: "194J(a)",
        nature: "Fees for technical services",
        rate_individual: pct(2, 0),
        rate_other: pct(2, 0),
        single_threshold: None,
        aggregate_threshold: Some(rupees(50_000)),
        excess_only: false,
        no_pan_floor: TWENTY_PERCENT,
    },
    TdsSection {
        code: "194J(b)",
        nature: "Fees for professional services (guides, consultants)",
        rate_individual: pct(10, 0),
        rate_other: pct(10, 0),
        single_threshold: None,
        aggregate_threshold: Some(rupees(50_000)),
        excess_only: false,
        no_pan_floor: TWENTY_PERCENT,
    },
    TdsSection {
        code: "194Q",
        nature: "Purchase of goods",
        rate_individual: pct(1, 1),
        rate_other: pct(1, 1),
        single_threshold: None,
        aggregate_threshold: Some(rupees(5_000_000)),
        excess_only: true,
        no_pan_floor: FIVE_PERCENT,
    },
    TdsSection {
        code: "194O",
        nature: "E-commerce operator payments (booking platforms)",
        rate_individual: pct(1, 1),
        rate_other: pct(1, 1),
        single_threshold: None,
        aggregate_threshold: Some(rupees(500_000)),
        excess_only: false,
        no_pan_floor: FIVE_PERCENT,
    },
];

/// Look up a section by code (case-insensitive)
pub fn find_section(code: &str) -> Option<&'static TdsSection> {
    SECTIONS.iter().find(|s| s.code.eq_ignore_ascii_case(code.trim()))
}

/// Input for a single TDS computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TdsInput {
    pub section: String,
    pub deductee_kind: DeducteeKind,
    #[serde(default)]
    pub pan: Option<String>,
    /// Gross amount of this payment/credit
    pub amount: f64,
    /// Amount already paid to this deductee under this section in the financial year
    #[serde(default)]
    pub prior_aggregate: f64,
    /// Portion of `prior_aggregate` on which TDS was already deducted
    #[serde(default)]
    pub prior_taxed_base: f64,
}

/// Result of a TDS computation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TdsComputation {
    pub section: String,
    pub applicable: bool,
    pub taxable_base: f64,
    pub rate: f64,
    pub tds_amount: f64,
    pub net_payable: f64,
    pub no_pan_rate_applied: bool,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TdsError {
    #[error("unknown TDS section: {0}")]
    UnknownSection(String),
    #[error("invalid PAN: {0}")]
    InvalidPan(String),
    #[error("{0}")]
    InvalidAmount(String),
}

/// `AAAAA9999A`: five letters, four digits, one letter
pub fn is_valid_pan(pan: &str) -> bool {
    let bytes = pan.as_bytes();
    bytes.len() == 10
        && bytes[..5].iter().all(u8::is_ascii_uppercase)
        && bytes[5..9].iter().all(u8::is_ascii_digit)
        && bytes[9].is_ascii_uppercase()
}

/// Compute TDS for one payment
pub fn compute_tds(input: &TdsInput) -> Result<TdsComputation, TdsError> {
    let section =
        find_section(&input.section).ok_or_else(|| TdsError::UnknownSection(input.section.clone()))?;

    let amount = require_positive(input.amount, "amount").map_err(TdsError::InvalidAmount)?;
    let prior =
        require_non_negative(input.prior_aggregate, "prior_aggregate").map_err(TdsError::InvalidAmount)?;
    let prior_taxed = require_non_negative(input.prior_taxed_base, "prior_taxed_base")
        .map_err(TdsError::InvalidAmount)?;
    if prior_taxed > prior {
        return Err(TdsError::InvalidAmount(
            "prior_taxed_base cannot exceed prior_aggregate".to_string(),
        ));
    }

    let pan = match input.pan.as_deref().map(str::trim).filter(|p| !p.is_empty()) {
        Some(p) => {
            let upper = p.to_ascii_uppercase();
            if !is_valid_pan(&upper) {
                return Err(TdsError::InvalidPan(p.to_string()));
            }
            Some(upper)
        }
        None => None,
    };

    let overflow = || TdsError::InvalidAmount("amount is out of range".to_string());
    let new_aggregate = prior.checked_add(amount).ok_or_else(overflow)?;
    let crosses_single = section.single_threshold.is_some_and(|t| amount > t);
    let crosses_aggregate = section.aggregate_threshold.is_some_and(|t| new_aggregate > t);

    let (taxable_base, reason) = if section.excess_only {
        let threshold = section.aggregate_threshold.unwrap_or(Decimal::ZERO);
        let above_now = (new_aggregate - threshold).max(Decimal::ZERO);
        let above_before = (prior - threshold).max(Decimal::ZERO);
        let base = above_now - above_before;
        let reason = if base > Decimal::ZERO {
            format!("aggregate exceeds {threshold}; only the excess is taxable")
        } else {
            format!("aggregate within {threshold}")
        };
        (base, reason)
    } else if crosses_aggregate {
        // Catch up earlier untaxed payments of the year
        let untaxed_prior = prior - prior_taxed;
        (
            amount.checked_add(untaxed_prior).ok_or_else(overflow)?,
            "aggregate threshold exceeded".to_string(),
        )
    } else if crosses_single {
        (amount, "single payment threshold exceeded".to_string())
    } else {
        (Decimal::ZERO, "below thresholds".to_string())
    };

    let base_rate = section.rate_for(input.deductee_kind);
    let (rate, no_pan_rate_applied) = if pan.is_none() {
        ((base_rate * Decimal::TWO).max(section.no_pan_floor), true)
    } else {
        (base_rate, false)
    };

    let applicable = taxable_base > Decimal::ZERO;
    let tds = if applicable {
        round_rupee(percent_of(taxable_base, rate).ok_or_else(overflow)?).min(amount)
    } else {
        Decimal::ZERO
    };

    Ok(TdsComputation {
        section: section.code.to_string(),
        applicable,
        taxable_base: to_f64(taxable_base),
        rate: to_f64(rate),
        tds_amount: to_f64(tds),
        net_payable: to_f64(amount - tds),
        no_pan_rate_applied: applicable && no_pan_rate_applied,
        reason,
    })
}

/// Indian financial year label ("2025-26") for a date; the year starts 1 April
pub fn financial_year(date: NaiveDate) -> String {
    let start = if date.month() >= 4 {
        date.year()
    } else {
        date.year() - 1
    };
    format!("{}-{:02}", start, (start + 1) % 100)
}

/// First and last day of a financial year label ("2025-26")
pub fn financial_year_bounds(label: &str) -> Option<(NaiveDate, NaiveDate)> {
    let (start, end) = label.split_once('-')?;
    let start: i32 = start.parse().ok()?;
    let end: i32 = end.parse().ok()?;
    if (start + 1) % 100 != end {
        return None;
    }
    Some((
        NaiveDate::from_ymd_opt(start, 4, 1)?,
        NaiveDate::from_ymd_opt(start + 1, 3, 31)?,
    ))
}

/// TDS return quarter (1 = Apr-Jun ... 4 = Jan-Mar)
pub fn quarter(date: NaiveDate) -> u8 {
    match date.month() {
        4..=6 => 1,
        7..=9 => 2,
        10..=12 => 3,
        _ => 4,
    }
}

/// Government deposit due date: 7th of the following month, 30 April for March
pub fn deposit_due_date(deducted_on: NaiveDate) -> NaiveDate {
    if deducted_on.month() == 3 {
        return NaiveDate::from_ymd_opt(deducted_on.year(), 4, 30).unwrap_or(deducted_on);
    }
    let (year, month) = if deducted_on.month() == 12 {
        (deducted_on.year() + 1, 1)
    } else {
        (deducted_on.year(), deducted_on.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 7).unwrap_or(deducted_on)
}

impl From<TdsError> for AppError {
    fn from(e: TdsError) -> Self {
        match e {
            TdsError::UnknownSection(code) => AppError::new(ErrorCode::TdsSectionUnknown)
                .with_detail("section", code),
            TdsError::InvalidPan(pan) => AppError::with_message(
                ErrorCode::ValidationFailed,
                format!("Invalid PAN: {pan}"),
            )
            .with_detail("field", "pan"),
            TdsError::InvalidAmount(msg) => AppError::with_message(ErrorCode::AmountNotPositive, msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(section: &str, kind: DeducteeKind, amount: f64) -> TdsInput {
        TdsInput {
            section: section.to_string(),
            deductee_kind: kind,
            pan: Some("ABCDE1234F".to_string()),
            amount,
            prior_aggregate: 0.0,
            prior_taxed_base: 0.0,
        }
    }

    #[test]
    fn test_find_section_case_insensitive() {
        assert_eq!(find_section("194c").unwrap().code, "194C");
        assert_eq!(find_section(" 194J(b) ").unwrap().code, "194J(b)");
        assert!(find_section("195").is_none());
    }

    #[test]
    fn test_194c_below_thresholds() {
        let r = compute_tds(&input("194C", DeducteeKind::Company, 25_000.0)).unwrap();
        assert!(!r.applicable);
        assert_eq!(r.tds_amount, 0.0);
        assert_eq!(r.net_payable, 25_000.0);
    }

    #[test]
    fn test_194c_single_payment_over_threshold() {
        let r = compute_tds(&input("194C", DeducteeKind::Company, 45_000.0)).unwrap();
        assert!(r.applicable);
        assert_eq!(r.rate, 2.0);
        assert_eq!(r.tds_amount, 900.0);
        assert_eq!(r.net_payable, 44_100.0);

        let r = compute_tds(&input("194C", DeducteeKind::Individual, 45_000.0)).unwrap();
        assert_eq!(r.rate, 1.0);
        assert_eq!(r.tds_amount, 450.0);
    }

    #[test]
    fn test_194c_aggregate_crossing_catches_up_prior_payments() {
        let mut i = input("194C", DeducteeKind::Firm, 20_000.0);
        i.prior_aggregate = 90_000.0;
        i.prior_taxed_base = 0.0;
        let r = compute_tds(&i).unwrap();
        assert!(r.applicable);
        assert_eq!(r.taxable_base, 110_000.0);
        assert_eq!(r.tds_amount, 2_200.0);
        assert_eq!(r.net_payable, 17_800.0);
    }

    #[test]
    fn test_194c_after_crossing_only_new_amount_taxed() {
        let mut i = input("194C", DeducteeKind::Firm, 10_000.0);
        i.prior_aggregate = 110_000.0;
        i.prior_taxed_base = 110_000.0;
        let r = compute_tds(&i).unwrap();
        assert_eq!(r.taxable_base, 10_000.0);
        assert_eq!(r.tds_amount, 200.0);
    }

    #[test]
    fn test_no_pan_uses_higher_rate() {
        let mut i = input("194C", DeducteeKind::Individual, 50_000.0);
        i.pan = None;
        let r = compute_tds(&i).unwrap();
        assert!(r.no_pan_rate_applied);
        assert_eq!(r.rate, 20.0);
        assert_eq!(r.tds_amount, 10_000.0);

        let mut i = input("194J(b)", DeducteeKind::Individual, 60_000.0);
        i.pan = Some("   ".to_string());
        let r = compute_tds(&i).unwrap();
        // max(2 × 10%, 20%) = 20%
        assert_eq!(r.rate, 20.0);
    }

    #[test]
    fn test_invalid_pan_rejected() {
        let mut i = input("194C", DeducteeKind::Company, 50_000.0);
        i.pan = Some("ABC123".to_string());
        assert!(matches!(compute_tds(&i), Err(TdsError::InvalidPan(_))));

        i.pan = Some("abcde1234f".to_string());
        assert!(compute_tds(&i).is_ok());
    }

    #[test]
    fn test_194q_taxes_only_excess() {
        let mut i = input("194Q", DeducteeKind::Company, 1_000_000.0);
        i.prior_aggregate = 4_500_000.0;
        let r = compute_tds(&i).unwrap();
        assert_eq!(r.taxable_base, 500_000.0);
        assert_eq!(r.rate, 0.1);
        assert_eq!(r.tds_amount, 500.0);

        let mut i = input("194Q", DeducteeKind::Company, 1_000_000.0);
        i.prior_aggregate = 6_000_000.0;
        let r = compute_tds(&i).unwrap();
        assert_eq!(r.taxable_base, 1_000_000.0);
        assert_eq!(r.tds_amount, 1_000.0);
    }

    #[test]
    fn test_194q_no_pan_floor_is_five_percent() {
        let mut i = input("194Q", DeducteeKind::Company, 100_000.0);
        i.prior_aggregate = 5_000_000.0;
        i.pan = None;
        let r = compute_tds(&i).unwrap();
        assert_eq!(r.rate, 5.0);
        assert_eq!(r.tds_amount, 5_000.0);
    }

    #[test]
    fn test_rounding_to_nearest_rupee() {
        // 2% of 50,025 = 1,000.50 → 1,001
        let r = compute_tds(&input("194I(a)", DeducteeKind::Company, 50_025.0)).unwrap();
        assert_eq!(r.tds_amount, 1_001.0);
    }

    #[test]
    fn test_rejects_bad_amounts() {
        assert!(matches!(
            compute_tds(&input("194C", DeducteeKind::Company, 0.0)),
            Err(TdsError::InvalidAmount(_))
        ));
        let mut i = input("194C", DeducteeKind::Company, 10.0);
        i.prior_aggregate = 10.0;
        i.prior_taxed_base = 20.0;
        assert!(matches!(compute_tds(&i), Err(TdsError::InvalidAmount(_))));
        assert!(matches!(
            compute_tds(&input("999Z", DeducteeKind::Company, 10.0)),
            Err(TdsError::UnknownSection(_))
        ));
    }

    #[test]
    fn test_aggregate_overflow_is_an_error() {
        let mut i = input("194C", DeducteeKind::Company, 7e28);
        i.prior_aggregate = 7e28;
        assert!(matches!(compute_tds(&i), Err(TdsError::InvalidAmount(_))));
        assert!(matches!(
            compute_tds(&input("194C", DeducteeKind::Company, 1e30)),
            Err(TdsError::InvalidAmount(_))
        ));
    }

    #[test]
    fn test_financial_year_and_quarter() {
        let d = |y, m, day| NaiveDate::from_ymd_opt(y, m, day).unwrap();
        assert_eq!(financial_year(d(2025, 4, 1)), "2025-26");
        assert_eq!(financial_year(d(2026, 3, 31)), "2025-26");
        assert_eq!(financial_year(d(2099, 6, 1)), "2099-00");
        assert_eq!(quarter(d(2025, 4, 15)), 1);
        assert_eq!(quarter(d(2025, 9, 30)), 2);
        assert_eq!(quarter(d(2025, 12, 1)), 3);
        assert_eq!(quarter(d(2026, 2, 1)), 4);

        let (start, end) = financial_year_bounds("2025-26").unwrap();
        assert_eq!(start, d(2025, 4, 1));
        assert_eq!(end, d(2026, 3, 31));
        assert!(financial_year_bounds("2025-27").is_none());
        assert!(financial_year_bounds("garbage").is_none());
    }

    #[test]
    fn test_deposit_due_date() {
        let d = |y, m, day| NaiveDate::from_ymd_opt(y, m, day).unwrap();
        assert_eq!(deposit_due_date(d(2025, 5, 20)), d(2025, 6, 7));
        assert_eq!(deposit_due_date(d(2025, 12, 31)), d(2026, 1, 7));
        assert_eq!(deposit_due_date(d(2026, 3, 10)), d(2026, 4, 30));
    }
}
