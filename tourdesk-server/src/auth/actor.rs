//! Caller identity extractor
//!
//! The gateway sets `x-staff-id` + `x-staff-role` for back-office staff or
//! `x-partner-id` for associate partners.

use axum::extract::FromRequestParts;
use http::request::Parts;
use shared::error::{AppError, ErrorCode};
use shared::roles::{self, Permission, Role};

pub const STAFF_ID_HEADER: &str = "x-staff-id";
pub const STAFF_ROLE_HEADER: &str = "x-staff-role";
pub const PARTNER_ID_HEADER: &str = "x-partner-id";

/// Authenticated caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actor {
    Staff { id: i64, role: Role },
    Partner { id: i64 },
}

impl Actor {
    /// Staff member holding `permission`; partners are always refused
    pub fn require(&self, permission: Permission) -> Result<(), AppError> {
        match self {
            Actor::Staff { role, .. } => roles::require(*role, permission),
            Actor::Partner { .. } => Err(AppError::new(ErrorCode::PartnerScopeViolation)
                .with_detail("permission", permission.name())),
        }
    }

    pub fn staff_id(&self) -> Option<i64> {
        match self {
            Actor::Staff { id, .. } => Some(*id),
            Actor::Partner { .. } => None,
        }
    }

    pub fn partner_id(&self) -> Option<i64> {
        match self {
            Actor::Partner { id } => Some(*id),
            Actor::Staff { .. } => None,
        }
    }

    /// Key for per-caller limits (PDF renders)
    pub fn client_key(&self) -> String {
        match self {
            Actor::Staff { id, .. } => format!("staff:{id}"),
            Actor::Partner { id } => format!("partner:{id}"),
        }
    }

    /// Resolve identity from request headers
    pub fn from_headers(headers: &http::HeaderMap) -> Result<Self, AppError> {
        let staff_id = header(headers, STAFF_ID_HEADER)?;
        let partner_id = header(headers, PARTNER_ID_HEADER)?;

        match (staff_id, partner_id) {
            (Some(_), Some(_)) => Err(AppError::with_message(
                ErrorCode::IdentityInvalid,
                "Caller cannot be both staff and partner",
            )),
            (Some(id), None) => {
                let id = parse_id(STAFF_ID_HEADER, id)?;
                let role = header(headers, STAFF_ROLE_HEADER)?
                    .ok_or_else(|| {
                        AppError::with_message(ErrorCode::IdentityInvalid, "x-staff-role is required")
                            .with_detail("header", STAFF_ROLE_HEADER)
                    })?
                    .parse::<Role>()?;
                Ok(Actor::Staff { id, role })
            }
            (None, Some(id)) => Ok(Actor::Partner {
                id: parse_id(PARTNER_ID_HEADER, id)?,
            }),
            (None, None) => Err(AppError::not_authenticated()),
        }
    }
}

fn header<'a>(headers: &'a http::HeaderMap, name: &str) -> Result<Option<&'a str>, AppError> {
    match headers.get(name) {
        None => Ok(None),
        Some(v) => v.to_str().map(|s| Some(s.trim())).map_err(|_| {
            AppError::with_message(ErrorCode::IdentityInvalid, format!("{name} is not valid text"))
        }),
    }
}

fn parse_id(name: &str, value: &str) -> Result<i64, AppError> {
    value.parse::<i64>().map_err(|_| {
        AppError::with_message(ErrorCode::IdentityInvalid, format!("{name} must be an integer"))
            .with_detail("header", name)
    })
}

impl<S: Send + Sync> FromRequestParts<S> for Actor {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(actor) = parts.extensions.get::<Actor>() {
            return Ok(*actor);
        }

        let actor = Actor::from_headers(&parts.headers).inspect_err(|e| {
            tracing::debug!(uri = %parts.uri, code = %e.code, "Caller identity rejected");
        })?;
        parts.extensions.insert(actor);
        Ok(actor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderMap;

    fn headers(pairs: &[(&'static str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (k, v) in pairs {
            map.insert(*k, v.parse().unwrap());
        }
        map
    }

    #[test]
    fn test_staff_identity() {
        let actor = Actor::from_headers(&headers(&[
            (STAFF_ID_HEADER, "42"),
            (STAFF_ROLE_HEADER, "Finance"),
        ]))
        .unwrap();
        assert_eq!(actor, Actor::Staff { id: 42, role: Role::Finance });
        assert_eq!(actor.staff_id(), Some(42));
        assert!(actor.require(Permission::AccountingWrite).is_ok());
        assert_eq!(
            actor.require(Permission::StaffManage).unwrap_err().code,
            ErrorCode::AdminRequired
        );
    }

    #[test]
    fn test_partner_identity() {
        let actor = Actor::from_headers(&headers(&[(PARTNER_ID_HEADER, "7")])).unwrap();
        assert_eq!(actor.partner_id(), Some(7));
        assert_eq!(actor.client_key(), "partner:7");
        assert_eq!(
            actor.require(Permission::Read).unwrap_err().code,
            ErrorCode::PartnerScopeViolation
        );
    }

    #[test]
    fn test_missing_identity() {
        let err = Actor::from_headers(&HeaderMap::new()).unwrap_err();
        assert_eq!(err.code, ErrorCode::NotAuthenticated);
    }

    #[test]
    fn test_malformed_identity() {
        let err = Actor::from_headers(&headers(&[(STAFF_ID_HEADER, "abc"), (STAFF_ROLE_HEADER, "admin")]))
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::IdentityInvalid);

        let err = Actor::from_headers(&headers(&[(STAFF_ID_HEADER, "1")])).unwrap_err();
        assert_eq!(err.code, ErrorCode::IdentityInvalid);

        let err = Actor::from_headers(&headers(&[(STAFF_ID_HEADER, "1"), (STAFF_ROLE_HEADER, "root")]))
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::IdentityInvalid);

        let err = Actor::from_headers(&headers(&[
            (STAFF_ID_HEADER, "1"),
            (STAFF_ROLE_HEADER, "admin"),
            (PARTNER_ID_HEADER, "2"),
        ]))
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::IdentityInvalid);
    }
}
