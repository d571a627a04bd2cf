//! Quotation HTML (printed to PDF by the renderer)

use std::collections::HashMap;

use askama::Template;
use shared::models::{Activity, DayPlan, Hotel, TourPackageQueryDetail};
use shared::pricing::PriceBreakdown;
use sqlx::PgPool;

use crate::BoxError;
use crate::config::CompanyProfile;
use crate::db::catalog;

pub struct DayView {
    pub number: i32,
    pub title: String,
    pub description: Option<String>,
    pub hotel: Option<String>,
    pub meals: Option<String>,
    pub activities: Vec<String>,
}

pub struct PriceRow {
    pub label: String,
    pub amount: String,
}

#[derive(Template)]
#[template(path = "quote.html")]
pub struct QuoteTemplate {
    pub company_name: String,
    pub company_address: Option<String>,
    pub company_phone: Option<String>,
    pub company_email: Option<String>,
    pub company_gstin: Option<String>,
    pub query_number: String,
    pub title: String,
    pub customer_name: String,
    pub location: Option<String>,
    pub travel_date: Option<String>,
    pub travellers: String,
    pub days: Vec<DayView>,
    pub inclusions: Vec<String>,
    pub exclusions: Vec<String>,
    pub terms: Option<String>,
    pub price_rows: Vec<PriceRow>,
    pub grand_total: Option<String>,
    pub per_adult: Option<String>,
}

/// Indian digit grouping: 1234567.5 → "₹12,34,567.50"
pub fn format_inr(amount: f64) -> String {
    let negative = amount < 0.0;
    let paise = (amount.abs() * 100.0).round() as u64;
    let rupees = (paise / 100).to_string();
    let fraction = paise % 100;

    let grouped = if rupees.len() <= 3 {
        rupees
    } else {
        let (head, tail) = rupees.split_at(rupees.len() - 3);
        let mut parts: Vec<&str> = Vec::new();
        let mut end = head.len();
        while end > 0 {
            let start = end.saturating_sub(2);
            parts.push(&head[start..end]);
            end = start;
        }
        parts.reverse();
        format!("{},{tail}", parts.join(","))
    };
    format!("{}₹{grouped}.{fraction:02}", if negative { "-" } else { "" })
}

fn travellers_line(adults: i32, with_bed: i32, without_bed: i32, infants: i32) -> String {
    let mut parts = vec![format!("{adults} adult{}", if adults == 1 { "" } else { "s" })];
    let children = with_bed + without_bed;
    if children > 0 {
        parts.push(format!("{children} child{}", if children == 1 { "" } else { "ren" }));
    }
    if infants > 0 {
        parts.push(format!("{infants} infant{}", if infants == 1 { "" } else { "s" }));
    }
    parts.join(", ")
}

fn price_rows(b: &PriceBreakdown) -> Vec<PriceRow> {
    let mut rows = Vec::new();
    let mut push = |label: String, amount: f64| {
        if amount != 0.0 {
            rows.push(PriceRow {
                label,
                amount: format_inr(amount),
            });
        }
    };
    push("Accommodation".into(), b.accommodation);
    push("Meals & per-person services".into(), b.per_person);
    push("Transport".into(), b.transport);
    push("Activities".into(), b.activities);
    push("Service charge".into(), b.markup);
    push("Discount".into(), -b.discount);
    push(format!("GST @ {}%", b.gst_percent), b.gst);
    push(format!("TCS @ {}%", b.tcs_percent), b.tcs);
    rows
}

impl QuoteTemplate {
    pub fn build(
        company: &CompanyProfile,
        detail: &TourPackageQueryDetail,
        location: Option<String>,
        hotels: &HashMap<i64, String>,
        activities: &HashMap<i64, String>,
    ) -> Self {
        let q = &detail.query;
        let breakdown = q.price_breakdown();
        let days = detail
            .days
            .iter()
            .map(|d: &DayPlan| DayView {
                number: d.day_number,
                title: d.title.clone(),
                description: d.description.clone(),
                hotel: d.hotel_id.and_then(|id| hotels.get(&id).cloned()),
                meals: d.meals.clone(),
                activities: d
                    .activity_ids
                    .iter()
                    .filter_map(|id| activities.get(id).cloned())
                    .collect(),
            })
            .collect();

        Self {
            company_name: company.name.clone(),
            company_address: company.address.clone(),
            company_phone: company.phone.clone(),
            company_email: company.email.clone(),
            company_gstin: company.gstin.clone(),
            query_number: q.query_number.clone(),
            title: q.title.clone(),
            customer_name: q.customer_name.clone(),
            location,
            travel_date: q.travel_date.clone(),
            travellers: travellers_line(q.adults, q.children_with_bed, q.children_without_bed, q.infants),
            days,
            inclusions: q.inclusions.clone(),
            exclusions: q.exclusions.clone(),
            terms: q.terms.clone(),
            price_rows: breakdown.as_ref().map(price_rows).unwrap_or_default(),
            grand_total: breakdown.as_ref().map(|b| format_inr(b.grand_total)),
            per_adult: breakdown.as_ref().map(|b| format_inr(b.per_adult)),
        }
    }
}

/// Resolve hotel, activity and location names, then render the quotation
pub async fn render_html(
    pool: &PgPool,
    company: &CompanyProfile,
    detail: &TourPackageQueryDetail,
) -> Result<String, BoxError> {
    let mut hotels = HashMap::new();
    for id in detail.days.iter().filter_map(|d| d.hotel_id) {
        if hotels.contains_key(&id) {
            continue;
        }
        if let Some(Hotel { name, .. }) = catalog::get_hotel(pool, id).await? {
            hotels.insert(id, name);
        }
    }

    let mut activity_ids: Vec<i64> = detail.days.iter().flat_map(|d| d.activity_ids.iter().copied()).collect();
    activity_ids.sort_unstable();
    activity_ids.dedup();
    let activities: HashMap<i64, String> = catalog::activities_by_ids(pool, &activity_ids)
        .await?
        .into_iter()
        .map(|Activity { id, title, .. }| (id, title))
        .collect();

    let location = match detail.query.location_id {
        Some(id) => catalog::get_location(pool, id).await?.map(|l| l.name),
        None => None,
    };

    let html = QuoteTemplate::build(company, detail, location, &hotels, &activities).render()?;
    Ok(html)
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::TourPackageQuery;

    #[test]
    fn test_format_inr() {
        assert_eq!(format_inr(0.0), "₹0.00");
        assert_eq!(format_inr(999.5), "₹999.50");
        assert_eq!(format_inr(1000.0), "₹1,000.00");
        assert_eq!(format_inr(123456.0), "₹1,23,456.00");
        assert_eq!(format_inr(1234567.891), "₹12,34,567.89");
        assert_eq!(format_inr(-2500.0), "-₹2,500.00");
    }

    #[test]
    fn test_travellers_line() {
        assert_eq!(travellers_line(1, 0, 0, 0), "1 adult");
        assert_eq!(travellers_line(2, 1, 1, 1), "2 adults, 2 children, 1 infant");
    }

    fn company() -> CompanyProfile {
        CompanyProfile {
            name: "Kerala Trails".into(),
            state_code: "32".into(),
            gstin: Some("32ABCDE1234F1Z5".into()),
            address: Some("MG Road, Kochi".into()),
            phone: None,
            email: None,
        }
    }

    fn detail() -> TourPackageQueryDetail {
        TourPackageQueryDetail {
            query: TourPackageQuery {
                id: 1,
                query_number: "TPQ-2025-000042".into(),
                inquiry_id: None,
                tour_package_id: None,
                customer_id: None,
                associate_partner_id: None,
                title: "Munnar & Alleppey <Honeymoon>".into(),
                customer_name: "Anita Menon".into(),
                phone: None,
                email: None,
                location_id: None,
                travel_date: Some("2025-12-20".into()),
                adults: 2,
                children_with_bed: 0,
                children_without_bed: 0,
                infants: 0,
                inclusions: vec!["Breakfast".into()],
                exclusions: vec!["Airfare".into()],
                terms: None,
                pricing: None,
                breakdown: None,
                grand_total: None,
                status: "draft".into(),
                created_by: None,
                confirmed_at: None,
                created_at: 0,
                updated_at: 0,
            },
            days: vec![DayPlan {
                id: 10,
                day_number: 1,
                title: "Arrive Kochi, drive to Munnar".into(),
                description: None,
                hotel_id: Some(5),
                meals: Some("Dinner".into()),
                activity_ids: vec![7, 8],
            }],
        }
    }

    #[test]
    fn test_render_escapes_and_resolves_names() {
        let hotels = HashMap::from([(5, "Tea County".to_string())]);
        let activities = HashMap::from([(7, "Tea museum".to_string())]);
        let html = QuoteTemplate::build(&company(), &detail(), Some("Munnar".into()), &hotels, &activities)
            .render()
            .unwrap();

        assert!(html.contains("TPQ-2025-000042"));
        assert!(html.contains("Munnar &amp; Alleppey &lt;Honeymoon&gt;"));
        assert!(html.contains("Tea County"));
        assert!(html.contains("Tea museum"));
        assert!(html.contains("2 adults"));
        // Unpriced drafts carry no total
        assert!(!html.contains("Grand total"));
    }
}
