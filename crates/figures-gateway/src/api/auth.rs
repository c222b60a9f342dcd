//! Token authentication (`Authorization: Token <key>`).

use axum::http::{header::AUTHORIZATION, HeaderMap};

use figures_core::error::{FiguresError, Result};
use figures_core::model::User;
use figures_core::repo::MetricsRepository;

const SCHEME: &str = "Token";

/// Extract the token key from an `Authorization` header value.
pub fn parse_authorization(value: &str) -> Result<&str> {
    let (scheme, key) = value
        .trim()
        .split_once(char::is_whitespace)
        .ok_or(FiguresError::AuthFailed)?;
    if !scheme.eq_ignore_ascii_case(SCHEME) {
        return Err(FiguresError::AuthFailed);
    }
    let key = key.trim();
    if key.is_empty() || key.contains(char::is_whitespace) {
        return Err(FiguresError::AuthFailed);
    }
    Ok(key)
}

/// Resolve the caller from request headers.
///
/// Missing header -> `AuthRequired`; anything else that fails -> `AuthFailed`.
pub fn authenticate(repo: &dyn MetricsRepository, headers: &HeaderMap) -> Result<User> {
    let value = headers.get(AUTHORIZATION).ok_or(FiguresError::AuthRequired)?;
    let value = value.to_str().map_err(|_| FiguresError::AuthFailed)?;
    let key = parse_authorization(value)?;

    let user = repo.user_by_token(key)?.ok_or(FiguresError::AuthFailed)?;
    if !user.is_active {
        return Err(FiguresError::AuthFailed);
    }
    Ok(user)
}
