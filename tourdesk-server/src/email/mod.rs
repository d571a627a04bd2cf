use aws_sdk_sesv2::Client as SesClient;
use aws_sdk_sesv2::types::{Body, Content, Destination, EmailContent, Message};
use shared::models::{Inquiry, OperationalStaff};

use crate::BoxError;

fn assignment_body(staff: &OperationalStaff, inquiry: &Inquiry, back_office_url: &str) -> String {
    let mut lines = vec![
        format!("Hi {},", staff.name),
        String::new(),
        "A new inquiry has been assigned to you.".to_string(),
        String::new(),
        format!("Customer: {}", inquiry.customer_name),
        format!("Phone: {}", inquiry.phone),
    ];
    if let Some(date) = &inquiry.travel_date {
        lines.push(format!("Travel date: {date}"));
    }
    lines.push(format!(
        "Travellers: {} adult(s), {} child(ren)",
        inquiry.adults, inquiry.children
    ));
    if let Some(notes) = inquiry.notes.as_deref().filter(|n| !n.trim().is_empty()) {
        lines.push(format!("Notes: {notes}"));
    }
    lines.push(String::new());
    lines.push(format!(
        "Open it: {}/inquiries/{}",
        back_office_url.trim_end_matches('/'),
        inquiry.id
    ));
    lines.join("\n")
}

pub async fn send_inquiry_assigned(
    ses: &SesClient,
    from: &str,
    staff: &OperationalStaff,
    inquiry: &Inquiry,
    back_office_url: &str,
) -> Result<(), BoxError> {
    let subject = Content::builder()
        .data(format!("New inquiry: {}", inquiry.customer_name))
        .build()?;

    let body = Body::builder()
        .text(
            Content::builder()
                .data(assignment_body(staff, inquiry, back_office_url))
                .build()?,
        )
        .build();

    let message = Message::builder().subject(subject).body(body).build();

    ses.send_email()
        .from_email_address(from)
        .destination(Destination::builder().to_addresses(&staff.email).build())
        .content(EmailContent::builder().simple(message).build())
        .send()
        .await?;

    tracing::info!(to = %staff.email, inquiry_id = inquiry.id, "Inquiry assignment email sent");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assignment_body() {
        let staff = OperationalStaff {
            id: 4,
            name: "Rahul".into(),
            email: "rahul@example.in".into(),
            phone: None,
            role: "operations".into(),
            is_active: true,
            created_at: 0,
            updated_at: 0,
        };
        let inquiry = Inquiry {
            id: 77,
            customer_name: "Anita Menon".into(),
            phone: "919847012345".into(),
            email: None,
            location_id: None,
            travel_date: Some("2025-12-20".into()),
            adults: 2,
            children: 1,
            budget: None,
            source: Some("website".into()),
            status: "new".into(),
            notes: Some("  ".into()),
            associate_partner_id: None,
            assigned_staff_id: Some(4),
            created_at: 0,
            updated_at: 0,
        };
        let body = assignment_body(&staff, &inquiry, "https://desk.example.in/");
        assert!(body.starts_with("Hi Rahul,"));
        assert!(body.contains("Travel date: 2025-12-20"));
        assert!(!body.contains("Notes:"));
        assert!(body.ends_with("https://desk.example.in/inquiries/77"));
    }
}
