//! Bearer token authentication.

use std::sync::{Arc, Mutex, PoisonError};

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use crate::backend::domain::models::user::User;
use crate::backend::error::AppError;
use crate::backend::AppState;

/// The user owning the request's API token
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

/// Filled in by [`AuthUser`] so the request-context middleware can report
/// who made a failing request
#[derive(Debug, Clone, Default)]
pub struct UserSlot(Arc<Mutex<Option<String>>>);

impl UserSlot {
    pub fn set(&self, user_id: &str) {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner) = Some(user_id.to_string());
    }

    pub fn get(&self) -> Option<String> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

pub fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    scheme.eq_ignore_ascii_case("bearer").then(|| token.trim())
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or(AppError::Unauthenticated)?;
        let user = state.user_service.authenticate(token).await?;

        if let Some(slot) = parts.extensions.get::<UserSlot>() {
            slot.set(&user.id);
        }
        Ok(AuthUser(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts_with(header: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/api/me");
        if let Some(value) = header {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_bearer_token() {
        assert_eq!(bearer_token(&parts_with(Some("Bearer abc123"))), Some("abc123"));
        assert_eq!(bearer_token(&parts_with(Some("bearer abc123"))), Some("abc123"));
        assert_eq!(bearer_token(&parts_with(Some("Basic dXNlcg=="))), None);
        assert_eq!(bearer_token(&parts_with(Some("Bearer"))), None);
        assert_eq!(bearer_token(&parts_with(None)), None);
    }

    #[test]
    fn test_user_slot_is_shared_between_clones() {
        let slot = UserSlot::default();
        let clone = slot.clone();
        clone.set("u1");
        assert_eq!(slot.get().as_deref(), Some("u1"));
    }
}
