//! Tour package query pricing
//!
//! Cost build-up: accommodation + per-person components + transport +
//! activities = subtotal; markup on subtotal; flat discount; GST on the
//! taxable value; TCS (international packages) on the GST-inclusive value.
//! The grand total is rounded to the nearest rupee.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, ErrorCode};
use crate::money::{percent_of, require_non_negative, round_paise, round_rupee, to_f64};

/// Default GST on tour operator services
pub const DEFAULT_GST_PERCENT: f64 = 5.0;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Travellers {
    pub adults: u32,
    #[serde(default)]
    pub children_with_bed: u32,
    #[serde(default)]
    pub children_without_bed: u32,
    #[serde(default)]
    pub infants: u32,
}

impl Travellers {
    pub fn total(&self) -> u32 {
        self.adults + self.children_with_bed + self.children_without_bed + self.infants
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomLine {
    pub room_type: String,
    pub rooms: u32,
    pub nights: u32,
    pub rate_per_night: f64,
    #[serde(default)]
    pub extra_beds: u32,
    #[serde(default)]
    pub extra_bed_rate: f64,
}

/// Per-head rates (meal plans, entry fees, permits)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PerPersonRates {
    #[serde(default)]
    pub adult: f64,
    #[serde(default)]
    pub child_with_bed: f64,
    #[serde(default)]
    pub child_without_bed: f64,
    #[serde(default)]
    pub infant: f64,
}

fn one() -> u32 {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChargeLine {
    pub description: String,
    pub amount: f64,
    #[serde(default = "one")]
    pub quantity: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QuotePricing {
    pub travellers: Travellers,
    #[serde(default)]
    pub rooms: Vec<RoomLine>,
    #[serde(default)]
    pub per_person: PerPersonRates,
    #[serde(default)]
    pub transport: Vec<ChargeLine>,
    #[serde(default)]
    pub activities: Vec<ChargeLine>,
    #[serde(default)]
    pub markup_percent: f64,
    /// Flat discount in rupees
    #[serde(default)]
    pub discount: f64,
    /// Defaults to [`DEFAULT_GST_PERCENT`]
    #[serde(default)]
    pub gst_percent: Option<f64>,
    #[serde(default)]
    pub tcs_percent: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBreakdown {
    pub accommodation: f64,
    pub per_person: f64,
    pub transport: f64,
    pub activities: f64,
    pub subtotal: f64,
    pub markup: f64,
    pub discount: f64,
    pub taxable: f64,
    pub gst_percent: f64,
    pub gst: f64,
    pub tcs_percent: f64,
    pub tcs: f64,
    pub grand_total: f64,
    pub per_adult: f64,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PricingError {
    #[error("at least one adult is required")]
    NoAdults,
    #[error("{0}")]
    Invalid(String),
    #[error("discount {discount} exceeds subtotal plus markup {limit}")]
    DiscountTooLarge { discount: f64, limit: f64 },
}

fn overflow(what: &str) -> PricingError {
    PricingError::Invalid(format!("{what} is out of range"))
}

/// Product of `factors`, failing instead of overflowing
fn product(factors: &[Decimal], what: &str) -> Result<Decimal, PricingError> {
    factors
        .iter()
        .try_fold(Decimal::ONE, |acc, f| acc.checked_mul(*f))
        .ok_or_else(|| overflow(what))
}

fn add(a: Decimal, b: Decimal, what: &str) -> Result<Decimal, PricingError> {
    a.checked_add(b).ok_or_else(|| overflow(what))
}

fn charge_total(lines: &[ChargeLine], what: &str) -> Result<Decimal, PricingError> {
    let mut total = Decimal::ZERO;
    for line in lines {
        let amount = require_non_negative(line.amount, &format!("{what} amount"))
            .map_err(PricingError::Invalid)?;
        let line_total = product(&[amount, Decimal::from(line.quantity)], what)?;
        total = add(total, line_total, what)?;
    }
    Ok(total)
}

fn non_negative(value: f64, field: &str) -> Result<Decimal, PricingError> {
    require_non_negative(value, field).map_err(PricingError::Invalid)
}

fn percent(amount: Decimal, rate: Decimal, what: &str) -> Result<Decimal, PricingError> {
    percent_of(amount, rate).map(round_paise).ok_or_else(|| overflow(what))
}

/// Price a quotation
pub fn price(input: &QuotePricing) -> Result<PriceBreakdown, PricingError> {
    let t = &input.travellers;
    if t.adults == 0 {
        return Err(PricingError::NoAdults);
    }

    let mut accommodation = Decimal::ZERO;
    for room in &input.rooms {
        let rate = non_negative(room.rate_per_night, "rate_per_night")?;
        let extra = non_negative(room.extra_bed_rate, "extra_bed_rate")?;
        let nights = Decimal::from(room.nights);
        let rooms = product(&[rate, Decimal::from(room.rooms), nights], "accommodation")?;
        let extra_beds = product(&[extra, Decimal::from(room.extra_beds), nights], "accommodation")?;
        accommodation = add(accommodation, add(rooms, extra_beds, "accommodation")?, "accommodation")?;
    }

    let rates = &input.per_person;
    let heads = [
        (non_negative(rates.adult, "adult rate")?, t.adults),
        (non_negative(rates.child_with_bed, "child_with_bed rate")?, t.children_with_bed),
        (non_negative(rates.child_without_bed, "child_without_bed rate")?, t.children_without_bed),
        (non_negative(rates.infant, "infant rate")?, t.infants),
    ];
    let mut per_person = Decimal::ZERO;
    for (rate, count) in heads {
        per_person = add(per_person, product(&[rate, Decimal::from(count)], "per_person")?, "per_person")?;
    }

    let transport = charge_total(&input.transport, "transport")?;
    let activities = charge_total(&input.activities, "activity")?;

    let subtotal = [per_person, transport, activities]
        .into_iter()
        .try_fold(accommodation, |acc, part| add(acc, part, "subtotal"))?;
    let markup = percent(subtotal, non_negative(input.markup_percent, "markup_percent")?, "markup")?;
    let discount = non_negative(input.discount, "discount")?;
    let limit = add(subtotal, markup, "subtotal")?;
    if discount > limit {
        return Err(PricingError::DiscountTooLarge {
            discount: to_f64(discount),
            limit: to_f64(limit),
        });
    }

    let taxable = limit - discount;
    let gst_percent = non_negative(input.gst_percent.unwrap_or(DEFAULT_GST_PERCENT), "gst_percent")?;
    let gst = percent(taxable, gst_percent, "gst")?;
    let tcs_percent = non_negative(input.tcs_percent.unwrap_or(0.0), "tcs_percent")?;
    let with_gst = add(taxable, gst, "grand_total")?;
    let tcs = percent(with_gst, tcs_percent, "tcs")?;
    let grand_total = round_rupee(add(with_gst, tcs, "grand_total")?);
    let per_adult = round_paise(grand_total / Decimal::from(t.adults));

    Ok(PriceBreakdown {
        accommodation: to_f64(accommodation),
        per_person: to_f64(per_person),
        transport: to_f64(transport),
        activities: to_f64(activities),
        subtotal: to_f64(subtotal),
        markup: to_f64(markup),
        discount: to_f64(discount),
        taxable: to_f64(taxable),
        gst_percent: to_f64(gst_percent),
        gst: to_f64(gst),
        tcs_percent: to_f64(tcs_percent),
        tcs: to_f64(tcs),
        grand_total: to_f64(grand_total),
        per_adult: to_f64(per_adult),
    })
}

impl From<PricingError> for AppError {
    fn from(e: PricingError) -> Self {
        match e {
            PricingError::NoAdults => {
                AppError::with_message(ErrorCode::ValidationFailed, e.to_string())
                    .with_detail("field", "adults")
            }
            PricingError::Invalid(msg) => AppError::validation(msg),
            PricingError::DiscountTooLarge { discount, limit } => {
                AppError::with_message(ErrorCode::QueryDiscountTooLarge, e.to_string())
                    .with_detail("discount", discount)
                    .with_detail("limit", limit)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> QuotePricing {
        QuotePricing {
            travellers: Travellers {
                adults: 2,
                children_with_bed: 1,
                children_without_bed: 0,
                infants: 1,
            },
            rooms: vec![RoomLine {
                room_type: "Deluxe".to_string(),
                rooms: 1,
                nights: 3,
                rate_per_night: 5_000.0,
                extra_beds: 1,
                extra_bed_rate: 1_000.0,
            }],
            per_person: PerPersonRates {
                adult: 1_500.0,
                child_with_bed: 1_000.0,
                child_without_bed: 0.0,
                infant: 0.0,
            },
            transport: vec![ChargeLine {
                description: "Innova, 4 days".to_string(),
                amount: 3_000.0,
                quantity: 4,
            }],
            activities: vec![ChargeLine {
                description: "Houseboat day cruise".to_string(),
                amount: 2_500.0,
                quantity: 1,
            }],
            markup_percent: 10.0,
            discount: 1_000.0,
            gst_percent: None,
            tcs_percent: None,
        }
    }

    #[test]
    fn test_price_breakdown() {
        let b = price(&base()).unwrap();
        assert_eq!(b.accommodation, 18_000.0);
        assert_eq!(b.per_person, 4_000.0);
        assert_eq!(b.transport, 12_000.0);
        assert_eq!(b.activities, 2_500.0);
        assert_eq!(b.subtotal, 36_500.0);
        assert_eq!(b.markup, 3_650.0);
        assert_eq!(b.taxable, 39_150.0);
        assert_eq!(b.gst_percent, 5.0);
        assert_eq!(b.gst, 1_957.5);
        assert_eq!(b.tcs, 0.0);
        // 41,107.50 rounds up
        assert_eq!(b.grand_total, 41_108.0);
        assert_eq!(b.per_adult, 20_554.0);
    }

    #[test]
    fn test_tcs_on_gst_inclusive_value() {
        let mut input = base();
        input.tcs_percent = Some(5.0);
        let b = price(&input).unwrap();
        // 5% of 41,107.50 = 2,055.375 → 2,055.38
        assert_eq!(b.tcs, 2_055.38);
        assert_eq!(b.grand_total, 43_163.0);
    }

    #[test]
    fn test_discount_limit() {
        let mut input = base();
        input.discount = 40_150.0;
        assert_eq!(price(&input).unwrap().taxable, 0.0);

        input.discount = 40_150.01;
        assert_eq!(
            price(&input),
            Err(PricingError::DiscountTooLarge {
                discount: 40_150.01,
                limit: 40_150.0
            })
        );
    }

    #[test]
    fn test_requires_adult() {
        let mut input = base();
        input.travellers.adults = 0;
        assert_eq!(price(&input), Err(PricingError::NoAdults));
    }

    #[test]
    fn test_rejects_negative_rates() {
        let mut input = base();
        input.transport[0].amount = -1.0;
        assert!(matches!(price(&input), Err(PricingError::Invalid(_))));
    }

    #[test]
    fn test_huge_values_are_rejected_not_zeroed() {
        let mut input = base();
        input.rooms[0].rooms = 4_000_000_000;
        input.rooms[0].nights = 4_000_000_000;
        input.rooms[0].rate_per_night = 1e20;
        assert!(matches!(price(&input), Err(PricingError::Invalid(_))));

        let mut input = base();
        input.activities[0].amount = 1e30;
        assert!(matches!(price(&input), Err(PricingError::Invalid(_))));

        let mut input = base();
        input.markup_percent = 1e28;
        assert!(matches!(price(&input), Err(PricingError::Invalid(_))));
    }

    #[test]
    fn test_deserialize_defaults() {
        let input: QuotePricing = serde_json::from_str(
            r#"{"travellers":{"adults":1},"activities":[{"description":"Safari","amount":1200}]}"#,
        )
        .unwrap();
        assert_eq!(input.activities[0].quantity, 1);
        let b = price(&input).unwrap();
        assert_eq!(b.grand_total, 1_260.0);
    }
}
