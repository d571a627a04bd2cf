//! Phone number normalization
//!
//! WhatsApp addresses recipients by E.164 digits without the leading `+`.
//! Local 10-digit numbers are assumed to be Indian.

use super::WhatsAppError;

pub const DEFAULT_COUNTRY_CODE: &str = "91";

/// Normalize user input ("+91 98470-12345", "098470 12345", "9847012345")
/// to WhatsApp digits ("919847012345").
pub fn normalize_phone(input: &str) -> Result<String, WhatsAppError> {
    let trimmed = input.trim();
    let mut digits = String::with_capacity(trimmed.len());
    for (i, c) in trimmed.chars().enumerate() {
        match c {
            '0'..='9' => digits.push(c),
            '+' if i == 0 => {}
            ' ' | '-' | '(' | ')' | '.' => {}
            _ => return Err(WhatsAppError::InvalidPhone(input.to_string())),
        }
    }

    // International dialing prefix
    if let Some(rest) = digits.strip_prefix("00") {
        digits = rest.to_string();
    }

    let normalized = match digits.len() {
        10 => format!("{DEFAULT_COUNTRY_CODE}{digits}"),
        11 if digits.starts_with('0') => format!("{DEFAULT_COUNTRY_CODE}{}", &digits[1..]),
        11..=15 => digits,
        _ => return Err(WhatsAppError::InvalidPhone(input.to_string())),
    };

    if normalized.starts_with('0') {
        return Err(WhatsAppError::InvalidPhone(input.to_string()));
    }
    Ok(normalized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_indian_numbers() {
        assert_eq!(normalize_phone("9847012345").unwrap(), "919847012345");
        assert_eq!(normalize_phone("09847012345").unwrap(), "919847012345");
        assert_eq!(normalize_phone("+91 98470-12345").unwrap(), "919847012345");
        assert!(normalize_phone("(+91) 98470 12345").is_err());
        assert_eq!(normalize_phone("0091 9847012345").unwrap(), "919847012345");
    }

    #[test]
    fn test_normalize_international() {
        assert_eq!(normalize_phone("+971 50 123 4567").unwrap(), "971501234567");
        assert_eq!(normalize_phone("+44 7700 900123").unwrap(), "447700900123");
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(normalize_phone("").is_err());
        assert!(normalize_phone("12345").is_err());
        assert!(normalize_phone("98470abc45").is_err());
        assert!(normalize_phone("1234567890123456").is_err());
    }
}
